//! grextor-query: embed a query and print the nearest documents.

use std::process::ExitCode;

use clap::Parser;

use grextor_app::cli::QueryArgs;
use grextor_app::{build_backends, ctrl_c_context, init_tracing, render_results};

#[tokio::main]
async fn main() -> ExitCode {
    let args = QueryArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let query = args.query_text()?.to_string();
    let config = args.backend.load_config()?;
    init_tracing(&config.general.log_level);

    let backends = build_backends(&config)?;
    let ctx = ctrl_c_context();

    let results = backends.engine.search(&ctx, &query, args.limit).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", render_results(&query, &results));
    }
    Ok(())
}

