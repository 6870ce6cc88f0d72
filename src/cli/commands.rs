use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{default_cache_file, RedmineConfig};

#[derive(Parser, Debug)]
#[command(name = "redmine-mcp")]
#[command(version, about = "An MCP server that lets AI agents work with Redmine")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the Redmine instance
    #[arg(long, env = "REDMINE_URL", global = true)]
    pub url: Option<String>,

    /// Redmine API key
    #[arg(long, env = "REDMINE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Metadata cache file [default: ~/.cache/redmine_mcp/cache.json]
    #[arg(long, env = "REDMINE_MCP_CACHE", global = true)]
    pub cache_file: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REDMINE_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification (self-signed internal trackers)
    #[arg(long, env = "REDMINE_INSECURE", global = true)]
    pub insecure: bool,
}

impl ConnectionArgs {
    pub fn to_config(&self) -> RedmineConfig {
        RedmineConfig::new(self.url.clone(), self.api_key.clone())
            .with_cache_file(self.cache_file.clone().unwrap_or_else(default_cache_file))
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_insecure(self.insecure)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the MCP server on stdio
    Serve,

    /// Delete the metadata cache so it is rebuilt on next use
    ClearCache,

    /// Print the resolved statuses, activities and custom fields
    Metadata {
        /// Discard the cache and fetch fresh metadata first
        #[arg(long)]
        refresh: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
