//! WebSocket bridge to the sync-progress hub
//!
//! Each session registers one hub subscription and runs two halves:
//! - writer: subscription -> socket
//! - reader: socket -> hub broadcast (when relaying is enabled)
//!
//! When either half finishes the other is aborted and the subscription
//! is released.

use crate::routes::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use enslite_core::{Subscription, SyncProgressHub};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

pub async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        match state.hub.register() {
            Ok(subscription) => {
                session(socket, subscription, state.hub, state.relay_client_messages).await
            }
            Err(e) => {
                debug!("Refusing stream session: {}", e);
                let _ = socket.close().await;
            }
        }
    })
}

async fn session(
    socket: WebSocket,
    mut subscription: Subscription,
    hub: Arc<SyncProgressHub>,
    relay: bool,
) {
    let id = subscription.id();
    info!("Stream session {} opened", id);

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            if sink.send(Message::Text(event)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let relay_hub = hub.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) if relay => {
                    relay_hub.broadcast(&text);
                }
                Message::Binary(bytes) if relay => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        relay_hub.broadcast(text);
                    }
                    Err(_) => debug!("Stream session {} sent non-UTF-8 binary frame, ignored", id),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    hub.unregister(id);
    info!("Stream session {} closed", id);
}
