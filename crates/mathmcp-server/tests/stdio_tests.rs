//! The server binary driven over stdio by the library's session manager.

use mathmcp::error::MathMcpError;
use mathmcp::mcp::SessionManager;
use pretty_assertions::assert_eq;
use serde_json::json;

const SERVER_BIN: &str = env!("CARGO_BIN_EXE_mathmcp-server");

async fn connect(args: &[&str]) -> (SessionManager, mathmcp::mcp::SessionId) {
    let mut sessions = SessionManager::new();
    let id = sessions
        .connect_stdio_command(SERVER_BIN, args.iter().map(|a| a.to_string()).collect())
        .await
        .expect("stdio handshake with mathmcp-server");
    (sessions, id)
}

#[tokio::test]
async fn stdio_session_lists_calls_and_closes() {
    let (mut sessions, id) = connect(&["--transport", "stdio"]).await;
    assert!(sessions.is_connected(id).await);
    assert_eq!(sessions.len(), 1);

    let catalog = sessions.build_catalog().await.unwrap();
    assert_eq!(
        catalog.names().collect::<Vec<_>>(),
        vec!["calculate_geometric_mean"]
    );
    assert_eq!(catalog.route("calculate_geometric_mean"), Some(id));

    let result = sessions
        .call_tool(id, "calculate_geometric_mean", json!({"values": [4, 9]}))
        .await
        .unwrap();
    assert_eq!(result.text_content.as_deref(), Some("6.0"));

    sessions.close().await;
    assert!(!sessions.is_connected(id).await);
    assert!(sessions.is_closed());
}

#[tokio::test]
async fn stdio_session_surfaces_domain_errors() {
    let (mut sessions, id) = connect(&["--transport", "stdio", "--name", "Math"]).await;

    let err = sessions
        .call_tool(id, "calculate_geometric_mean", json!({"values": []}))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, MathMcpError::ToolExecution { tool_name, message }
            if tool_name == "calculate_geometric_mean" && message.contains("empty")),
        "unexpected error: {err}"
    );

    sessions.close().await;
}
