pub mod cache;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod mcp;
pub mod metadata;
pub mod transport;

pub use cache::{CacheStore, MetadataCache};
pub use config::RedmineConfig;
pub use error::{RedmineError, Result};
pub use mcp::RedmineServer;
pub use metadata::MetadataResolver;
