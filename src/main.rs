use clap::Parser;
use redmine_mcp::cli::{handle_clear_cache, handle_metadata, handle_serve, init_tracing, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let config = cli.connection.to_config();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            init_tracing("info");
            handle_serve(config)
        }
        Commands::ClearCache => {
            init_tracing("warn");
            handle_clear_cache(config)
        }
        Commands::Metadata { refresh, json } => {
            init_tracing("warn");
            handle_metadata(config, refresh, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
