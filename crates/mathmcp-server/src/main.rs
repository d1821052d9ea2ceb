//! mathmcp-server binary entry point.

use mathmcp::cli::{init_tracing, ServerCli};

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = ServerCli::parse_args();

    let result = match cli.load_server_config() {
        Ok(config) => {
            tracing::info!(
                name = config.name.as_str(),
                transport = %config.transport,
                "Starting MCP server"
            );
            mathmcp::server::serve(&config).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
