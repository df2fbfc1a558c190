pub mod config;
pub mod context;
pub mod error;
pub mod value;

pub use config::GrextorConfig;
pub use context::RequestContext;
pub use error::{GrextorError, Result};
pub use value::{metadata_from_json, Metadata, MetadataValue, ValueKind};
