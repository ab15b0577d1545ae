// Tool server protocol tests - JSON-RPC lines through an in-memory pipe

use async_trait::async_trait;
use landscape_agent::backend::BackendError;
use landscape_agent::landscape::{
    CockpitSource, InventorySearch, LandscapeToolHost, OutputFormat, SearchResponse,
};
use landscape_agent::rpc::ToolServer;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

struct Inventory;

#[async_trait]
impl InventorySearch for Inventory {
    async fn search(
        &self,
        query: &str,
        _format: OutputFormat,
    ) -> Result<SearchResponse, BackendError> {
        if query.contains("sid|ADL") {
            return Ok(SearchResponse::Json(json!({
                "data": {"Entries": [
                    {"ID": "100", "SID": "ADL", "Status": "Canceled"},
                    {"ID": "101", "SID": "ADL", "Status": "Parked", "SystemType": "ABAPSystem"}
                ]}
            })));
        }
        Ok(SearchResponse::Json(json!([])))
    }
}

struct Cockpit;

#[async_trait]
impl CockpitSource for Cockpit {
    async fn fetch(&self, _objectid: &str, systype: &str) -> Result<Value, BackendError> {
        Ok(json!({
            "SID": "ADL",
            "Availability Tooltip": "Green",
            "Main System Info": {"System Type": systype},
        }))
    }
}

/// Writes every request, then reads one reply per request carrying an id.
async fn exchange(requests: &[Value]) -> Vec<Value> {
    let server = ToolServer::new(LandscapeToolHost::new(
        Arc::new(Inventory),
        Arc::new(Cockpit),
    ));
    let (client, server_io) = duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let serving = tokio::spawn(async move {
        server
            .serve(BufReader::new(server_read), server_write)
            .await
            .expect("serve");
    });

    let (client_read, mut client_write) = tokio::io::split(client);
    let expected = requests.iter().filter(|r| r.get("id").is_some()).count();
    for request in requests {
        let mut line = request.to_string();
        line.push('\n');
        client_write.write_all(line.as_bytes()).await.unwrap();
    }

    let mut lines = BufReader::new(client_read).lines();
    let mut replies = Vec::new();
    while replies.len() < expected {
        let line = lines.next_line().await.unwrap().expect("reply");
        replies.push(serde_json::from_str(&line).unwrap());
    }
    client_write.shutdown().await.unwrap();
    serving.await.unwrap();
    replies
}

#[tokio::test]
async fn handshake_and_tool_listing() {
    let replies = exchange(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2025-06-18"}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"}),
    ])
    .await;

    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["id"], json!(1));
    assert_eq!(
        replies[0]["result"]["serverInfo"]["name"],
        json!("landscape-tool-server")
    );

    let tools = replies[1]["result"]["tools"].as_array().unwrap();
    let names: Vec<_> = tools
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["search_system_flexi", "cockpit_get_view_by_sid"]);
    assert_eq!(tools[1]["inputSchema"]["required"], json!(["sid"]));

    assert_eq!(replies[2]["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn view_skips_canceled_records() {
    let replies = exchange(&[json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "tools/call",
        "params": {
            "name": "cockpit_get_view_by_sid",
            "arguments": {"sid": "ADL", "sections": ["system_details"]}
        }
    })])
    .await;

    let result = &replies[0]["result"];
    assert_eq!(result["isError"], json!(false));
    let view = &result["structuredContent"];
    assert_eq!(view["_resolved"]["objectid"], json!("101"));
    assert_eq!(view["system_details"]["sid"], json!("ADL"));
    assert_eq!(view["system_details"]["status"], json!("Green"));
    assert_eq!(view["system_details"]["type"], json!("ABAPSystem"));

    let text = result["content"][0]["text"].as_str().unwrap();
    assert_eq!(serde_json::from_str::<Value>(text).unwrap(), *view);
}

#[tokio::test]
async fn unknown_sid_is_an_error_envelope() {
    let replies = exchange(&[json!({
        "jsonrpc": "2.0",
        "id": "q",
        "method": "tools/call",
        "params": {"name": "cockpit_get_view_by_sid", "arguments": {"sid": "ZZZ"}}
    })])
    .await;

    let result = &replies[0]["result"];
    assert_eq!(result["isError"], json!(true));
    assert_eq!(result["structuredContent"]["kind"], json!("not_found"));
    assert_eq!(result["structuredContent"]["step"], json!("resolve"));
}
