use std::time::Duration;

use anyhow::Result;
use jsonpeer::{
    ErrorCode, HandlerError, HandlerResult, MethodError, Params, Peer, PeerOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{test, time::sleep};

fn channel() -> (Peer, Peer) {
    Peer::new_channel(&PeerOptions::default())
}

#[derive(Debug, Serialize, Deserialize)]
struct HelloRequest {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct HelloResponse {
    message: String,
}

#[test]
async fn echo() -> Result<()> {
    let (server, client) = channel();
    server.bind_sync("echo", |p: Params| {
        let (s,): (String,) = p.to()?;
        Ok(s)
    });
    assert_eq!(client.call("echo", vec![json!("World")]).await?, json!("World"));
    Ok(())
}

#[test]
async fn typed_request() -> Result<()> {
    let (server, client) = channel();
    server.bind("hello", |p: Params| async move {
        let r: HelloRequest = p.to()?;
        Ok::<_, HandlerError>(HelloResponse {
            message: format!("Hello, {}!", r.name),
        })
    });
    let response: HelloResponse = client
        .request(
            "hello",
            &HelloRequest {
                name: "Alice".to_string(),
            },
        )
        .await?;
    assert_eq!(response.message, "Hello, Alice!");
    Ok(())
}

#[test]
async fn method_not_found() {
    let (_server, client) = channel();
    let e = client.call("missing", ()).await.unwrap_err();
    let e = e.method_error().unwrap();
    assert_eq!(e.code, ErrorCode::METHOD_NOT_FOUND);
    assert_eq!(e.message, "Method not found");
}

#[test]
async fn method_error_reaches_caller() {
    let (server, client) = channel();
    server.bind_sync("fail", |_| -> HandlerResult<()> {
        Err(MethodError::new(69, "custom").with_data(json!({"x": 1})).into())
    });
    let e = client.call("fail", ()).await.unwrap_err();
    assert_eq!(
        e.method_error(),
        Some(&MethodError::new(69, "custom").with_data(json!({"x": 1})))
    );
}

#[test]
async fn generic_error_is_internal() {
    let (server, client) = channel();
    server.bind_sync("boom", |_| -> HandlerResult<()> {
        Err(HandlerError::msg("boom"))
    });
    let e = client.call("boom", ()).await.unwrap_err();
    let e = e.method_error().unwrap();
    assert_eq!(e.code, ErrorCode::INTERNAL_ERROR);
    assert!(e.message.contains("boom"), "{}", e.message);
}

#[test]
async fn notify_runs_handler_without_response() -> Result<()> {
    let (server, client) = channel();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    server.bind_sync("log", move |p: Params| {
        let (s,): (String,) = p.to()?;
        tx.send(s)?;
        Ok(())
    });
    let mut diagnostics = client.diagnostics();
    client.notify("log", vec![json!("hi")]).await?;
    assert_eq!(rx.recv().await.as_deref(), Some("hi"));
    assert_eq!(client.correlator().pending_requests(), 0);

    // A response to the notification would show up as an unmatched response.
    assert_eq!(client.call("missing", ()).await.ok(), None);
    assert!(diagnostics.try_recv().is_err());
    Ok(())
}

#[test]
async fn both_sides_call_each_other() -> Result<()> {
    let (a, b) = channel();
    a.bind_sync("name", |_| Ok("a"));
    b.bind_sync("name", |_| Ok("b"));
    assert_eq!(a.call("name", ()).await?, json!("b"));
    assert_eq!(b.call("name", ()).await?, json!("a"));
    Ok(())
}

#[test]
async fn reentrant_call() -> Result<()> {
    let (server, client) = channel();
    client.bind_sync("base", |_| Ok(40));

    let cx = server.context();
    server.bind("add_to_base", move |p: Params| {
        let cx = cx.clone();
        async move {
            let (n,): (i64,) = p.to()?;
            let base: i64 = cx.request("base", &()).await?;
            Ok::<_, HandlerError>(base + n)
        }
    });
    assert_eq!(client.call("add_to_base", vec![json!(2)]).await?, json!(42));
    Ok(())
}

#[test]
async fn reentrant_method_error_is_forwarded() {
    let (server, client) = channel();
    client.bind_sync("deny", |_| -> HandlerResult<()> {
        Err(MethodError::new(7, "denied").into())
    });
    let cx = server.context();
    server.bind("proxy", move |_| {
        let cx = cx.clone();
        async move { Ok::<_, HandlerError>(cx.call("deny", ()).await?) }
    });
    let e = client.call("proxy", ()).await.unwrap_err();
    assert_eq!(e.method_error().unwrap().code, ErrorCode(7));
}

#[test]
async fn responses_out_of_order() -> Result<()> {
    let (server, client) = channel();
    server.bind("sleep", |p: Params| async move {
        let (ms,): (u64,) = p.to()?;
        sleep(Duration::from_millis(ms)).await;
        Ok::<_, HandlerError>(ms)
    });
    let (slow, fast) = tokio::join!(
        client.call("sleep", vec![json!(100)]),
        client.call("sleep", vec![json!(1)]),
    );
    assert_eq!(slow?, json!(100));
    assert_eq!(fast?, json!(1));
    assert_eq!(client.correlator().pending_requests(), 0);
    Ok(())
}

#[test]
async fn slow_handler_does_not_block_others() -> Result<()> {
    let (server, client) = channel();
    server.bind("hang", |_| async {
        sleep(Duration::from_secs(3600)).await;
        Ok::<_, HandlerError>(())
    });
    server.bind_sync("ping", |_| Ok("pong"));
    let hang = tokio::spawn({
        let client = client.clone();
        async move { client.call("hang", ()).await }
    });
    assert_eq!(client.call("ping", ()).await?, json!("pong"));
    hang.abort();
    Ok(())
}

#[test]
async fn panic_in_handler_is_isolated() -> Result<()> {
    let (server, client) = channel();
    server.bind_sync("panic", |_| -> HandlerResult<()> { panic!("oops") });
    server.bind_sync("ok", |_| Ok(1));
    let e = client.call("panic", ()).await.unwrap_err();
    let e = e.method_error().unwrap();
    assert_eq!(e.code, ErrorCode::INTERNAL_ERROR);
    assert!(e.message.starts_with("Panic: "), "{}", e.message);
    assert_eq!(client.call("ok", ()).await?, json!(1));
    Ok(())
}

#[test]
async fn context_after_drop_is_shutdown() {
    let (a, _b) = channel();
    let cx = a.context();
    drop(a);
    let e = cx.call("x", ()).await.unwrap_err();
    assert!(matches!(e, jsonpeer::Error::Shutdown));
}
