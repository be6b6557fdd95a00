//! Lifecycle, log, queue and raw listener surface of the bridge.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use lumen_bridge::{Bridge, Channel, IpcEvent};
use lumen_core::protocol::{HealthStatus, LogEntry, QueueProgress};
use lumen_core::BridgeError;

use common::{counter, hits, CountingChannel};

#[tokio::test(start_paused = true)]
async fn start_retries_until_the_engine_reports_ok() {
    let chan = CountingChannel::new();
    let calls = counter();
    let c = Arc::clone(&calls);
    chan.host.register_fn("engine:start", move |_| {
        let n = c.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n < 3 {
                Ok(json!({"ok": false, "error": "engine warming up", "code": "BUSY"}))
            } else {
                Ok(json!({"ok": true, "data": {"pid": 4242}}))
            }
        }
    });
    let bridge = Bridge::with_defaults(chan.clone());

    let started = bridge.start().await.unwrap();
    assert_eq!(started, json!({"pid": 4242}));
    assert_eq!(hits(&calls), 3);
}

#[tokio::test]
async fn start_accepts_a_textual_status() {
    let chan = CountingChannel::new();
    chan.host.register_fn("engine:start", |_| async {
        Ok(json!({"ok": true, "status": "running", "data": {"pid": 1}, "version": "2.3.0"}))
    });
    let bridge = Bridge::with_defaults(chan.clone());

    assert_eq!(bridge.start().await.unwrap(), json!({"pid": 1}));
    assert_eq!(chan.invokes(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_gives_up_after_the_configured_attempts() {
    let chan = CountingChannel::new();
    chan.host.register_fn("engine:stop", |_| async {
        Ok(json!({"ok": false, "error": "engine wedged"}))
    });
    let bridge = Bridge::with_defaults(chan.clone());

    let err = bridge.stop().await.unwrap_err();
    match &err {
        BridgeError::Remote { channel, message, code } => {
            assert_eq!(channel, "engine:stop");
            assert_eq!(message, "engine wedged");
            assert!(code.is_none());
        }
        other => panic!("expected a remote failure, got {other:?}"),
    }
    assert_eq!(chan.invokes(), 3);
}

#[tokio::test(start_paused = true)]
async fn missing_lifecycle_handler_is_an_ipc_failure() {
    let chan = CountingChannel::new();
    let bridge = Bridge::with_defaults(chan.clone());

    let err = bridge.start().await.unwrap_err();
    assert!(matches!(err, BridgeError::Ipc { .. }));
    assert_eq!(err.channel(), Some("engine:start"));
    assert_eq!(chan.invokes(), 3);
}

#[tokio::test]
async fn recent_logs_use_the_configured_default_limit() {
    let chan = CountingChannel::new();
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    chan.host.register_fn("engine:logs:recent", move |payload| {
        *sink.lock().unwrap() = Some(payload);
        async {
            Ok(json!([
                {"ts": "2026-10-18T09:00:00Z", "level": "info", "message": "index warm"},
                {"level": "warn", "message": "thumbnail cache miss", "photo": "p1"}
            ]))
        }
    });
    let bridge = Bridge::with_defaults(chan.clone());

    let entries = bridge.logs().recent(None).await.unwrap();
    assert_eq!(seen.lock().unwrap().clone(), Some(json!({"limit": 200})));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "index warm");
    assert_eq!(entries[1].level.as_deref(), Some("warn"));

    bridge.logs().recent(Some(5)).await.unwrap();
    assert_eq!(seen.lock().unwrap().clone(), Some(json!({"limit": 5})));
}

#[tokio::test]
async fn malformed_recent_logs_are_a_bad_response() {
    let chan = CountingChannel::new();
    chan.host
        .register_fn("engine:logs:recent", |_| async { Ok(json!("not a list")) });
    let bridge = Bridge::with_defaults(chan.clone());

    let err = bridge.logs().recent(None).await.unwrap_err();
    assert!(matches!(err, BridgeError::BadResponse { .. }));
    assert!(!err.is_retryable());
    assert_eq!(chan.invokes(), 1);
}

#[tokio::test]
async fn status_and_queue_pushes_are_decoded() {
    let chan = CountingChannel::new();
    let bridge = Bridge::with_defaults(chan.clone());

    let statuses: Arc<Mutex<Vec<HealthStatus>>> = Arc::default();
    let s = Arc::clone(&statuses);
    let _status = bridge.on_status(move |st| s.lock().unwrap().push(st));

    let progress: Arc<Mutex<Vec<QueueProgress>>> = Arc::default();
    let p = Arc::clone(&progress);
    let _queue = bridge.queue().subscribe(move |q| p.lock().unwrap().push(q));

    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::default();
    let l = Arc::clone(&logs);
    let _logs = bridge.logs().subscribe(move |e| l.lock().unwrap().push(e));

    chan.host.emit("engine:status", json!({"state": "ready", "uptime": 12}));
    chan.host.emit("engine:queue", json!({"pending": 4, "active": 1}));
    chan.host.emit("engine:queue", json!({"active": 1}));
    chan.host.emit("engine:log", json!({"level": "info", "message": "indexed p1"}));

    let statuses = statuses.lock().unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state, "ready");
    assert_eq!(statuses[0].extra.get("uptime"), Some(&json!(12)));

    let progress = progress.lock().unwrap();
    assert_eq!(progress.len(), 1, "payload without `pending` is dropped");
    assert_eq!(progress[0].pending, 4);
    assert_eq!(progress[0].completed, 0);

    assert_eq!(logs.lock().unwrap()[0].message, "indexed p1");
}

#[test]
fn raw_listeners_see_the_whole_event() {
    let chan = CountingChannel::new();
    let bridge = Bridge::with_defaults(chan.clone());

    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let s = Arc::clone(&seen);
    let id = bridge.on("engine:custom", move |ev: &IpcEvent| {
        s.lock().unwrap().push(format!("{}={}", ev.channel, ev.payload));
    });

    chan.host.emit("engine:custom", json!(1));
    assert!(bridge.off("engine:custom", id));
    assert!(!bridge.off("engine:custom", id));
    chan.host.emit("engine:custom", json!(2));

    assert_eq!(*seen.lock().unwrap(), vec!["engine:custom=1".to_owned()]);
}

#[test]
fn remove_all_listeners_clears_one_channel_only() {
    let chan = CountingChannel::new();
    let bridge = Bridge::with_defaults(chan.clone());

    let _a = bridge.on("engine:custom", |_: &IpcEvent| {});
    let _b = bridge.on("engine:custom", |_: &IpcEvent| {});
    let _c = bridge.on("engine:other", |_: &IpcEvent| {});

    assert_eq!(bridge.remove_all_listeners("engine:custom"), 2);
    assert_eq!(chan.listener_count("engine:custom"), 0);
    assert_eq!(chan.listener_count("engine:other"), 1);
}

#[test]
fn shutdown_disposes_every_subscription() {
    let chan = CountingChannel::new();
    let bridge = Bridge::with_defaults(chan.clone());

    let status = bridge.on_status(|_| {});
    let logs = bridge.logs().subscribe(|_| {});
    let _queue = bridge.queue().subscribe(|_| {});
    assert_eq!(bridge.subscriptions().len(), 3);

    assert_eq!(bridge.shutdown(), 3);
    assert!(bridge.subscriptions().is_empty());
    assert!(status.is_disposed());
    assert!(logs.is_disposed());
    for name in ["engine:status", "engine:log", "engine:queue"] {
        assert_eq!(chan.listener_count(name), 0);
    }

    drop(status);
    drop(logs);
    assert_eq!(chan.removals(), 3);
}
