use axum::Router;
use axum::extract::RawQuery;
use axum::routing::get;
use serde_json::{Value, json};
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;
use thetadata_mcp::{
    FormatPolicy, ServerOptions, ServerSettings, TransformConfig, create_mcp_server,
};
use thetadata_openapi_tools::document::SpecDocument;
use tokio::net::TcpListener;

const SPEC: &str = r#"
openapi: "3.0.3"
info:
  title: Theta Data REST API
  version: "3"
paths:
  /stock/history/eod:
    x-min-subscription: value
    get:
      operationId: stock_history_eod
      parameters:
        - name: symbol
          in: query
          required: true
          schema: { type: string }
        - name: start_date
          in: query
          schema: { type: string }
        - name: end_date
          in: query
          schema: { type: string }
        - name: format
          in: query
          schema: { type: string }
      responses:
        "200":
          description: ok
  /stock/list/symbols:
    x-min-subscription: free
    get:
      operationId: stock_list_symbols
      responses:
        "200":
          description: ok
"#;

async fn spawn_upstream() -> (String, tokio::sync::oneshot::Sender<()>) {
    // Echoes the received query inside the terminal's envelope.
    async fn eod(RawQuery(query): RawQuery) -> axum::Json<Value> {
        axum::Json(json!({ "response": { "query": query.unwrap_or_default() } }))
    }
    async fn symbols() -> (axum::http::StatusCode, &'static str) {
        (axum::http::StatusCode::FORBIDDEN, "subscription too low")
    }

    let app = Router::new()
        .route("/v3/stock/history/eod", get(eod))
        .route("/v3/stock/list/symbols", get(symbols));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move { server.await });
    (format!("http://{addr}/v3"), shutdown_tx)
}

fn spec_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("tempfile");
    f.write_all(SPEC.as_bytes()).expect("write spec");
    f
}

fn query_of(text: &str) -> String {
    let body: Value = serde_json::from_str(text).expect("json body");
    body["query"].as_str().expect("query").to_string()
}

#[tokio::test]
async fn transform_applies_end_to_end() {
    let (base_url, shutdown) = spawn_upstream().await;
    let spec = spec_file();
    let document = Arc::new(SpecDocument::load(spec.path()).expect("load spec"));
    let settings = ServerSettings {
        base_url,
        timeout: Duration::from_secs(5),
    };
    let server = create_mcp_server(document, &settings, ServerOptions::default()).expect("server");

    let args = json!({"symbol": "AAPL", "start_date": "2024-01-05", "format": "json"});
    let result = server
        .call("stock_history_eod", args.as_object().cloned().unwrap_or_default())
        .await
        .expect("call");
    assert_ne!(result.is_error, Some(true));
    let text = result.content[0].as_text().expect("text").text.clone();
    assert_eq!(
        query_of(&text),
        "symbol=AAPL&start_date=2024-01-05&format=ndjson&end_date=2024-01-05"
    );

    let yesterday = (chrono::Local::now().date_naive() - chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    let args = json!({"symbol": "MSFT"});
    let result = server
        .call("stock_history_eod", args.as_object().cloned().unwrap_or_default())
        .await
        .expect("call");
    let text = result.content[0].as_text().expect("text").text.clone();
    assert_eq!(
        query_of(&text),
        format!("symbol=MSFT&start_date={yesterday}&end_date={yesterday}&format=ndjson")
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn force_policy_and_upstream_errors() {
    let (base_url, shutdown) = spawn_upstream().await;
    let document = Arc::new(SpecDocument::parse("inline", SPEC).expect("parse spec"));
    let settings = ServerSettings {
        base_url,
        timeout: Duration::from_secs(5),
    };
    let options = ServerOptions {
        transform: TransformConfig {
            format_policy: FormatPolicy::Force,
            ..TransformConfig::default()
        },
        ..ServerOptions::default()
    };
    let server = create_mcp_server(document, &settings, options).expect("server");

    let args = json!({
        "symbol": "SPY",
        "start_date": "2024-01-02",
        "end_date": "2024-01-31",
        "format": "csv"
    });
    let result = server
        .call("stock_history_eod", args.as_object().cloned().unwrap_or_default())
        .await
        .expect("call");
    let text = result.content[0].as_text().expect("text").text.clone();
    assert_eq!(
        query_of(&text),
        "symbol=SPY&start_date=2024-01-02&end_date=2024-01-31&format=ndjson"
    );

    let result = server
        .call("stock_list_symbols", serde_json::Map::new())
        .await
        .expect("call");
    assert_eq!(result.is_error, Some(true));
    let text = result.content[0].as_text().expect("text").text.clone();
    assert!(text.contains("403"), "{text}");
    assert!(text.contains("subscription too low"), "{text}");

    let _ = shutdown.send(());
}
