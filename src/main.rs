//! mathmcp-client binary entry point.

use mathmcp::cli::{init_tracing, split_command, ClientCli};
use mathmcp::error::Result;
use mathmcp::mcp::SessionManager;
use mathmcp::orchestrator::{OrchestratorConfig, QueryOrchestrator};

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = ClientCli::parse_args();

    let mut sessions = SessionManager::new();
    let result = run(&cli, &mut sessions).await;
    sessions.close().await;

    match result {
        Ok(answer) => println!("{answer}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: &ClientCli, sessions: &mut SessionManager) -> Result<String> {
    cli.ensure_servers()?;
    let config = cli.load_client_config()?;
    let provider = config.create_provider()?;

    for script in &cli.stdio {
        sessions.connect_stdio(script).await?;
    }
    for raw in &cli.stdio_command {
        let (program, args) = split_command(raw)?;
        sessions.connect_stdio_command(program, args).await?;
    }
    for url in &cli.sse {
        sessions.connect_sse(url.as_str()).await?;
    }

    let catalog = sessions.build_catalog().await?;
    tracing::info!(tools = ?catalog.names().collect::<Vec<_>>(), "Connected to server with tools");

    let orchestrator = QueryOrchestrator::new(provider, OrchestratorConfig::from(&config));
    let outcome = orchestrator
        .process_query(sessions, &catalog, &cli.query)
        .await?;
    tracing::debug!(
        rounds = outcome.rounds,
        tool_invocations = outcome.tool_invocations,
        "Query complete"
    );
    Ok(outcome.text)
}
