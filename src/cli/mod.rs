mod commands;
mod handlers;

pub use commands::{Cli, Commands, ConnectionArgs};
pub use handlers::{handle_clear_cache, handle_metadata, handle_serve, init_tracing};
