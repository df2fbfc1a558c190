//! grextor-ingest: embed one document and write it to Qdrant and Neo4j.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use grextor_app::cli::IngestArgs;
use grextor_app::{build_backends, ctrl_c_context, init_tracing};
use grextor_graph::GraphStore;
use grextor_vector::VectorStore;

#[tokio::main]
async fn main() -> ExitCode {
    let args = IngestArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: IngestArgs) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = args.backend.load_config()?;
    init_tracing(&config.general.log_level);

    let content = args.read_content()?;
    let metadata = args.build_metadata(chrono::Utc::now())?;

    let backends = build_backends(&config)?;
    let ctx = ctrl_c_context();

    backends.vectors.ensure_collection(&ctx).await?;
    backends.graph.verify_connectivity(&ctx).await?;

    let started = Instant::now();
    let id = backends
        .engine
        .ingest_document(&ctx, args.id.clone(), &content, metadata)
        .await?;

    println!("Ingested document {}", id);
    println!("Elapsed: {:.2?}", started.elapsed());
    Ok(())
}
