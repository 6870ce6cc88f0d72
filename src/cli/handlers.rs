use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::cache::CacheStore;
use crate::config::RedmineConfig;
use crate::error::{RedmineError, Result};
use crate::mcp::tools::format_metadata;
use crate::mcp::RedmineServer;
use crate::metadata::MetadataResolver;
use crate::transport::{HttpTransport, Transport};

/// Log to stderr; stdout belongs to the MCP stdio stream.
///
/// `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_resolver(config: &RedmineConfig) -> Result<(Arc<dyn Transport>, MetadataResolver)> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.clone())?);
    let resolver = MetadataResolver::new(transport.clone(), CacheStore::new(&config.cache_file));
    Ok((transport, resolver))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

pub fn handle_serve(config: RedmineConfig) -> Result<()> {
    if config.base_url.is_none() || config.api_key.is_none() {
        tracing::warn!("REDMINE_URL or REDMINE_API_KEY is not set; tools will report a configuration error");
    }
    let (transport, resolver) = build_resolver(&config)?;
    tracing::info!(cache = %config.cache_file.display(), "starting redmine MCP server on stdio");

    runtime()?.block_on(async move {
        RedmineServer::new(transport, resolver)
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| RedmineError::Server(e.to_string()))
    })
}

pub fn handle_clear_cache(config: RedmineConfig) -> Result<()> {
    let store = CacheStore::new(&config.cache_file);
    if store.clear()? {
        println!("Removed metadata cache {}", store.path().display());
    } else {
        println!("No metadata cache at {}", store.path().display());
    }
    Ok(())
}

pub fn handle_metadata(config: RedmineConfig, refresh: bool, json: bool) -> Result<()> {
    let (_transport, resolver) = build_resolver(&config)?;
    if refresh {
        resolver.clear()?;
    }

    let cache = runtime()?.block_on(resolver.ensure_metadata())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cache)?);
    } else {
        println!("{}", format_metadata(&cache));
        println!("\nCache file: {}", resolver.store().path().display());
    }
    Ok(())
}
