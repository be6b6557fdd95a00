//! Lumen bridge demo.
//!
//! Runs the bridge facade against an in-process loopback host with a stub
//! engine, exercising the lifecycle, request and push paths end to end.
//!
//! Usage: `lumen-bridge [config.yaml]` (defaults apply without a file).

use std::sync::Arc;

use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

use lumen_bridge::{config, Bridge, BridgeConfig, LoopbackHost, RequestOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => config::load_from_file(&path)?,
        None => BridgeConfig::default(),
    };

    let host = Arc::new(LoopbackHost::new());
    install_stub_engine(&host, &cfg);

    let bridge = Bridge::new(host.clone(), cfg.clone());

    let _status = bridge.on_status(|s| tracing::info!(state = %s.state, "engine status"));
    let _logs = bridge
        .logs()
        .subscribe(|entry| tracing::info!(message = %entry.message, "engine log"));

    let started = bridge.start().await?;
    tracing::info!(%started, "engine started");
    host.emit(&cfg.channels.status, json!({ "state": "ready" }));
    host.emit(&cfg.channels.log, json!({ "level": "info", "message": "index warm" }));

    let reply = bridge
        .request(RequestOptions::post("/search", json!({ "q": "sunset" })))
        .await;
    tracing::info!(ok = reply.ok(), status = ?reply.status(), data = ?reply.data(), "search reply");

    let bad = bridge.request(RequestOptions::get("search")).await;
    tracing::info!(ok = bad.ok(), code = ?bad.code(), "relative path reply");

    let recent = bridge.logs().recent(Some(10)).await?;
    tracing::info!(count = recent.len(), "recent logs");

    bridge.stop().await?;
    bridge.shutdown();
    Ok(())
}

fn install_stub_engine(host: &LoopbackHost, cfg: &BridgeConfig) {
    host.register_fn(cfg.channels.start.clone(), |_| async {
        Ok(json!({ "ok": true, "status": 200, "data": { "state": "starting" } }))
    });
    host.register_fn(cfg.channels.stop.clone(), |_| async {
        Ok(json!({ "ok": true, "status": 200 }))
    });
    host.register_fn(cfg.channels.request.clone(), |envelope: Value| async move {
        Ok(json!({
            "ok": true,
            "status": 200,
            "data": {
                "path": envelope["path"],
                "method": envelope["method"],
                "results": []
            }
        }))
    });
    host.register_fn(cfg.channels.logs_recent.clone(), |_| async {
        Ok(json!([{ "level": "info", "message": "index warm" }]))
    });
}
