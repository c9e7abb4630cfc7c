use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use gallery_types::events::{ClientCommand, SyncEvent};
use gallery_types::models::UserIdentity;

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// What a single gateway client wants to hear about.
#[derive(Debug, Default)]
struct Subscriptions {
    images: HashSet<String>,
    feed: bool,
}

impl Subscriptions {
    fn wants(&self, event: &SyncEvent) -> bool {
        if self.feed {
            return true;
        }
        event.image_id().is_some_and(|id| self.images.contains(id))
    }
}

enum Outgoing {
    Send(SyncEvent),
    Skip,
    Stop,
}

/// Decide what a change-feed receive turns into for this client. A lagged
/// receiver has lost changes it cannot recover, so the client is told to
/// reload instead; live queries handle the same case by re-querying.
fn outgoing(
    result: Result<SyncEvent, broadcast::error::RecvError>,
    subscriptions: &Subscriptions,
) -> Outgoing {
    match result {
        Ok(event) if subscriptions.wants(&event) => Outgoing::Send(event),
        Ok(_) => Outgoing::Skip,
        Err(broadcast::error::RecvError::Lagged(missed)) => {
            warn!("Gateway receiver lagged by {} changes, asking client to resync", missed);
            Outgoing::Send(SyncEvent::Resync { missed })
        }
        Err(broadcast::error::RecvError::Closed) => Outgoing::Stop,
    }
}

/// Handle a single WebSocket connection for the local user.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, identity: UserIdentity) {
    let (mut sender, mut receiver) = socket.split();

    info!("{} ({}) connected to gateway", identity.user_name, identity.user_id);

    let ready = SyncEvent::Ready {
        user_id: identity.user_id,
        user_name: identity.user_name.clone(),
    };
    let Ok(text) = serde_json::to_string(&ready) else {
        return;
    };
    if sender.send(Message::Text(text.into())).await.is_err() {
        return;
    }

    let mut broadcast_rx = dispatcher.subscribe();

    // Per-connection subscriptions (shared between send and recv tasks).
    let subscriptions: Arc<std::sync::RwLock<Subscriptions>> = Arc::default();
    let send_subscriptions = subscriptions.clone();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward changes -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let step = {
                        let subs = send_subscriptions.read().expect("subscription lock poisoned");
                        outgoing(result, &subs)
                    };
                    let event = match step {
                        Outgoing::Send(event) => event,
                        Outgoing::Skip => continue,
                        Outgoing::Stop => break,
                    };

                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode change event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let user_name = identity.user_name.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientCommand>(text.as_str()) {
                    Ok(cmd) => handle_command(&user_name, cmd, &subscriptions),
                    Err(e) => {
                        let raw = text.as_str();
                        let cut = raw.char_indices().nth(200).map_or(raw.len(), |(i, _)| i);
                        warn!("{} bad command: {} -- raw: {}", user_name, e, &raw[..cut]);
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("{} ({}) disconnected from gateway", identity.user_name, identity.user_id);
}

fn handle_command(
    user_name: &str,
    cmd: ClientCommand,
    subscriptions: &Arc<std::sync::RwLock<Subscriptions>>,
) {
    let mut subs = subscriptions.write().expect("subscription lock poisoned");
    match cmd {
        ClientCommand::Subscribe { image_ids } => {
            debug!("{} subscribing to {} images", user_name, image_ids.len());
            subs.images.extend(image_ids);
        }
        ClientCommand::Unsubscribe { image_ids } => {
            debug!("{} unsubscribing from {} images", user_name, image_ids.len());
            for id in &image_ids {
                subs.images.remove(id);
            }
        }
        ClientCommand::FeedSubscribe { enabled } => {
            debug!("{} feed subscription: {}", user_name, enabled);
            subs.feed = enabled;
        }
    }
}
