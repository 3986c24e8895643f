mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::setup;
use futures_util::{SinkExt, StreamExt};
use skillswap_core::ServerEvent;
use skillswap_server::routes::router;
use skillswap_server::AppState;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}

async fn next_event(ws: &mut Client) -> ServerEvent {
    loop {
        let frame = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("server event");
        }
    }
}

async fn open(addr: SocketAddr, token: &str) -> Client {
    let (mut ws, _) = connect_async(format!("ws://{}/ws?token={}", addr, token))
        .await
        .expect("handshake");
    match next_event(&mut ws).await {
        ServerEvent::Connected(_) => ws,
        other => panic!("expected connected, got {:?}", other),
    }
}

#[tokio::test]
async fn send_over_socket_reaches_receiver_and_acks_sender() {
    let t = setup().await;
    let addr = serve(t.state.clone()).await;

    let mut alice = open(addr, &t.token("alice")).await;
    let mut bob = open(addr, &t.token("bob")).await;

    alice
        .send(Message::Text(
            r#"{"type":"send_message","payload":{"receiverId":"bob","content":"hi"}}"#.to_string(),
        ))
        .await
        .unwrap();

    let ack = match next_event(&mut alice).await {
        ServerEvent::MessageSent(m) => m,
        other => panic!("expected message_sent, got {:?}", other),
    };
    let pushed = match next_event(&mut bob).await {
        ServerEvent::NewMessage(m) => m,
        other => panic!("expected new_message, got {:?}", other),
    };
    assert_eq!(ack, pushed);
    assert_eq!(pushed.content, "hi");
    assert_eq!(t.state.store.count_messages().await.unwrap(), 1);
}

#[tokio::test]
async fn typing_is_forwarded_to_the_partner() {
    let t = setup().await;
    let addr = serve(t.state.clone()).await;
    let mut alice = open(addr, &t.token("alice")).await;
    let mut bob = open(addr, &t.token("bob")).await;

    alice
        .send(Message::Text(r#"{"type":"typing","payload":{"receiverId":"bob"}}"#.to_string()))
        .await
        .unwrap();

    match next_event(&mut bob).await {
        ServerEvent::UserTyping(n) => assert_eq!(n.user_id, "alice"),
        other => panic!("expected user_typing, got {:?}", other),
    }
}

#[tokio::test]
async fn handshake_without_valid_credential_is_refused() {
    let t = setup().await;
    let addr = serve(t.state.clone()).await;
    let expired = t.state.tokens.issue_until("bob", 1).expect("token");

    for url in [
        format!("ws://{}/ws", addr),
        format!("ws://{}/ws?token=garbage", addr),
        format!("ws://{}/ws?token={}", addr, expired),
    ] {
        match connect_async(url.as_str()).await {
            Err(WsError::Http(resp)) => assert_eq!(resp.status(), 401),
            Err(other) => panic!("unexpected error for {}: {:?}", url, other),
            Ok(_) => panic!("handshake should be refused for {}", url),
        }
    }
    assert_eq!(t.state.hub.connection_count("bob"), 0);
    assert_eq!(t.state.hub.group_count(), 0);
}

#[tokio::test]
async fn closing_the_socket_releases_group_membership() {
    let t = setup().await;
    let addr = serve(t.state.clone()).await;

    let mut bob = open(addr, &t.token("bob")).await;
    assert_eq!(t.state.hub.connection_count("bob"), 1);

    bob.close(None).await.unwrap();
    drop(bob);

    let released = timeout(Duration::from_secs(5), async {
        while t.state.hub.connection_count("bob") > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(released.is_ok(), "membership was not released");
}
