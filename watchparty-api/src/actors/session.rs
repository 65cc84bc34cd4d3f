/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Per-client WebSocket session actor.
//!
//! The actor is both halves of the connection: actix serializes inbound
//! frames, outbound envelopes and the heartbeat onto one mailbox, so
//! exactly one task writes to the socket and no two handlers run
//! concurrently for the same client.

use std::sync::Arc;

use actix::{
    clock::Instant, fut, Actor, ActorContext, ActorFutureExt, Addr, AsyncContext,
    ContextFutureSpawner, Handler, Running, StreamHandler, WrapFuture,
};
use actix_web_actors::ws::{self, WebsocketContext};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use watchparty_types::{
    events, CommandPayload, CommandType, Envelope, JoinChannelRequest, Media, PlaybackStateUpdate,
    QueueMediaRequest, QueueRemoveRequest, SendMessageRequest,
};

use crate::actors::channel::Channel;
use crate::actors::registry::ChannelRegistry;
use crate::constants::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use crate::media_duration::DurationProvider;
use crate::messages::channel::{
    Leave, QueueInsert, QueueRemove, RunCommand, SendChat, UpdatePlayerState,
};
use crate::messages::registry::JoinChannel;
use crate::messages::session::Outbound;
use crate::wire;

pub type SessionId = String;
pub type ChannelId = String;

/// Guest usernames must be 3 to 16 characters.
const GUEST_USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=16;

struct JoinedChannel {
    id: ChannelId,
    addr: Addr<Channel>,
}

pub struct WsSession {
    pub id: SessionId,
    username: String,
    registry: Addr<ChannelRegistry>,
    durations: Arc<dyn DurationProvider>,
    channel: Option<JoinedChannel>,
    heartbeat: Instant,
}

impl WsSession {
    pub fn new(registry: Addr<ChannelRegistry>, durations: Arc<dyn DurationProvider>) -> Self {
        let id = Uuid::new_v4().to_string();
        WsSession {
            username: format!("Guest_{id}"),
            id,
            registry,
            durations,
            channel: None,
            heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.heartbeat) > CLIENT_TIMEOUT {
                warn!(session = %act.id, "client heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send_envelope<T: serde::Serialize>(
        &self,
        ctx: &mut WebsocketContext<Self>,
        event: &str,
        data: &T,
    ) {
        if let Some(text) = wire::encode(event, data) {
            ctx.text((*text).clone());
        }
    }

    /// Project the schema-less `data` into a concrete payload; mismatches
    /// drop the envelope and keep the connection.
    fn parse<T: DeserializeOwned>(&self, event: &str, data: Value) -> Option<T> {
        match serde_json::from_value(data) {
            Ok(payload) => Some(payload),
            Err(err) => {
                debug!(session = %self.id, event, error = %err, "dropping ill-typed payload");
                None
            }
        }
    }

    fn joined(&self) -> Option<&JoinedChannel> {
        if self.channel.is_none() {
            debug!(session = %self.id, "event before join_channel, dropping");
        }
        self.channel.as_ref()
    }

    fn dispatch(&mut self, envelope: Envelope, ctx: &mut WebsocketContext<Self>) {
        let Envelope { event, data } = envelope;
        match event.as_str() {
            events::JOIN_CHANNEL => self.handle_join_channel(data, ctx),
            events::SEND_MESSAGE => self.handle_send_message(data),
            events::QUEUE_MEDIA => self.handle_queue_media(data, ctx),
            events::QUEUE_REMOVE => self.handle_queue_remove(data),
            events::PLAYER_STATE => self.handle_player_state(data),
            events::RUN_COMMAND => self.handle_run_command(data),
            other => debug!(session = %self.id, event = other, "unknown event, dropping"),
        }
    }

    fn handle_join_channel(&mut self, data: Value, ctx: &mut WebsocketContext<Self>) {
        if self.channel.is_some() {
            debug!(session = %self.id, "already joined a channel, dropping");
            return;
        }
        let Some(request) = self.parse::<JoinChannelRequest>(events::JOIN_CHANNEL, data) else {
            return;
        };
        if let Some(guest) = request.guest_username {
            if GUEST_USERNAME_LEN.contains(&guest.chars().count()) {
                self.username = guest;
            }
        }

        let channel_id = request.channel_id;
        self.registry
            .send(JoinChannel {
                channel_id: channel_id.clone(),
                session: self.id.clone(),
                username: self.username.clone(),
                addr: ctx.address().recipient(),
            })
            .into_actor(self)
            .then(move |response, act, ctx| {
                match response {
                    Ok(addr) => {
                        info!(session = %act.id, channel = %channel_id, "joined channel");
                        act.channel = Some(JoinedChannel {
                            id: channel_id,
                            addr,
                        });
                    }
                    Err(err) => {
                        error!(session = %act.id, error = ?err, "failed to join channel");
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn handle_send_message(&mut self, data: Value) {
        let Some(request) = self.parse::<SendMessageRequest>(events::SEND_MESSAGE, data) else {
            return;
        };
        let Some(joined) = self.joined() else {
            return;
        };
        joined.addr.do_send(SendChat {
            session: self.id.clone(),
            message: request.message,
        });
    }

    fn handle_queue_media(&mut self, data: Value, ctx: &mut WebsocketContext<Self>) {
        let Some(request) = self.parse::<QueueMediaRequest>(events::QUEUE_MEDIA, data) else {
            return;
        };
        let Some(joined) = self.joined() else {
            return;
        };
        let channel = joined.addr.clone();
        let fetch = self.durations.duration(&request.url);
        let resolve = async move { (fetch.await, request) };
        resolve
            .into_actor(self)
            .map(move |(result, request), act, _ctx| match result {
                Ok(duration) => {
                    channel.do_send(QueueInsert {
                        media: Media {
                            id: request.id,
                            url: request.url,
                            duration,
                            title: request.title,
                            series: request.series,
                            episode: request.episode,
                            poster_image_url: request.poster_image_url,
                        },
                    });
                }
                Err(err) => {
                    debug!(session = %act.id, error = %err, "media not queued, duration lookup failed");
                }
            })
            .spawn(ctx);
    }

    fn handle_queue_remove(&mut self, data: Value) {
        let Some(request) = self.parse::<QueueRemoveRequest>(events::QUEUE_REMOVE, data) else {
            return;
        };
        let Some(joined) = self.joined() else {
            return;
        };
        joined.addr.do_send(QueueRemove {
            media_id: request.id,
        });
    }

    fn handle_player_state(&mut self, data: Value) {
        let Some(update) = self.parse::<PlaybackStateUpdate>(events::PLAYER_STATE, data) else {
            return;
        };
        let Some(joined) = self.joined() else {
            return;
        };
        joined.addr.do_send(UpdatePlayerState {
            session: self.id.clone(),
            update,
        });
    }

    fn handle_run_command(&mut self, data: Value) {
        let Some(payload) = self.parse::<CommandPayload>(events::RUN_COMMAND, data) else {
            return;
        };
        let Some(command) = CommandType::from_code(payload.code) else {
            debug!(session = %self.id, code = payload.code, "unknown command, dropping");
            return;
        };
        let Some(joined) = self.joined() else {
            return;
        };
        joined.addr.do_send(RunCommand {
            session: self.id.clone(),
            command,
        });
    }
}

impl Actor for WsSession {
    type Context = WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(session = %self.id, "session connected");
        self.start_heartbeat(ctx);
        self.send_envelope(ctx, events::CONNECTED, &Value::Null);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        info!(session = %self.id, "session stopping");
        if let Some(joined) = &self.channel {
            debug!(session = %self.id, channel = %joined.id, "leaving channel");
            joined.addr.do_send(Leave {
                session: self.id.clone(),
            });
        }
        Running::Stop
    }
}

/// Outbound envelopes fanned out by the channel.
impl Handler<Outbound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) -> Self::Result {
        ctx.text((*msg.0).clone());
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, item: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match item {
            Ok(msg) => msg,
            Err(err) => {
                warn!(session = %self.id, error = ?err, "websocket protocol error");
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Text(text) => {
                if let Some(envelope) = wire::decode(&text) {
                    self.dispatch(envelope, ctx);
                }
            }
            ws::Message::Ping(payload) => {
                self.heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            ws::Message::Pong(_) => {
                self.heartbeat = Instant::now();
            }
            ws::Message::Close(reason) => {
                info!(session = %self.id, "close received");
                ctx.close(reason);
                ctx.stop();
            }
            _ => (),
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        ctx.stop()
    }
}

// ==========================================================================
// Wire-level integration tests
// ==========================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::registry::ChannelRegistry;
    use crate::api::configure_api_routes;
    use crate::media_duration::FixedDuration;
    use crate::models::AppState;
    use actix::Actor;
    use actix_web::{web, App, HttpServer};
    use anyhow::{anyhow, bail};
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use serial_test::serial;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as WsFrame;
    use watchparty_types::{ChannelMessage, MessageType, NowPlayingMedia, PlaybackState, RoomData};

    type WsClient = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start_server(port: u16, duration: f64) {
        let registry = ChannelRegistry::new().start();
        let durations: Arc<dyn DurationProvider> = Arc::new(FixedDuration(duration));
        let state = web::Data::new(AppState {
            registry,
            durations,
        });

        actix_rt::spawn(async move {
            let _ = HttpServer::new(move || {
                App::new()
                    .app_data(state.clone())
                    .configure(configure_api_routes)
            })
            .bind(format!("127.0.0.1:{port}"))
            .expect("failed to bind test server")
            .run()
            .await;
        });

        for _ in 0..50 {
            if tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{port}/ws"))
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("server not ready after 5 seconds");
    }

    async fn connect(port: u16) -> WsClient {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .expect("connect");
        ws
    }

    async fn send(ws: &mut WsClient, event: &str, data: serde_json::Value) {
        let frame = json!({"event": event, "data": data}).to_string();
        ws.send(WsFrame::Text(frame)).await.expect("send frame");
    }

    /// Read frames until the named event arrives; other events are
    /// discarded along the way.
    async fn next_event(ws: &mut WsClient, event: &str, timeout: Duration) -> anyhow::Result<Envelope> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .ok_or_else(|| anyhow!("timed out waiting for {event}"))?;
            match tokio::time::timeout(remaining, ws.next()).await {
                Ok(Some(Ok(WsFrame::Text(text)))) => {
                    if let Ok(envelope) = serde_json::from_str::<Envelope>(&text) {
                        if envelope.event == event {
                            return Ok(envelope);
                        }
                    }
                }
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(err))) => bail!("websocket error: {err}"),
                Ok(None) => bail!("connection closed waiting for {event}"),
                Err(_) => bail!("timed out waiting for {event}"),
            }
        }
    }

    async fn expect_silence(ws: &mut WsClient, event: &str, window: Duration) {
        let deadline = tokio::time::Instant::now() + window;
        loop {
            let Some(remaining) =
                deadline.checked_duration_since(tokio::time::Instant::now())
            else {
                return;
            };
            match tokio::time::timeout(remaining, ws.next()).await {
                Ok(Some(Ok(WsFrame::Text(text)))) => {
                    if let Ok(envelope) = serde_json::from_str::<Envelope>(&text) {
                        assert_ne!(envelope.event, event, "unexpected {event}: {text}");
                    }
                }
                Ok(Some(Ok(_))) => {}
                _ => return,
            }
        }
    }

    async fn join(ws: &mut WsClient, channel: &str, guest: &str) -> RoomData {
        send(
            ws,
            events::JOIN_CHANNEL,
            json!({"channel_id": channel, "guest_username": guest}),
        )
        .await;
        let envelope = next_event(ws, events::ROOM_DATA, Duration::from_secs(2))
            .await
            .expect("room_data");
        serde_json::from_value(envelope.data).expect("room_data payload")
    }

    #[actix_rt::test]
    #[serial]
    async fn join_and_chat_flow() {
        let port = 18090;
        start_server(port, 42.0).await;

        let mut alice = connect(port).await;
        next_event(&mut alice, events::CONNECTED, Duration::from_secs(2))
            .await
            .expect("connected");

        let room = join(&mut alice, "movies", "alice").await;
        assert!(room.now_playing.is_none());
        assert!(room.queue.is_empty());
        assert!(room.messages.is_empty());

        let envelope = next_event(&mut alice, events::CHANNEL_MESSAGE, Duration::from_secs(2))
            .await
            .expect("join announcement");
        let message: ChannelMessage = serde_json::from_value(envelope.data).unwrap();
        assert_eq!(message.message_type, MessageType::UserJoin);
        assert_eq!(message.content, "alice has joined the room.");

        let mut bob = connect(port).await;
        let room = join(&mut bob, "movies", "bob").await;
        assert_eq!(room.messages.len(), 1, "bob sees alice's join in history");

        send(&mut bob, events::SEND_MESSAGE, json!({"message": "hello"})).await;
        for ws in [&mut alice, &mut bob] {
            let envelope = loop {
                let envelope = next_event(ws, events::CHANNEL_MESSAGE, Duration::from_secs(2))
                    .await
                    .expect("chat message");
                let message: ChannelMessage =
                    serde_json::from_value(envelope.data.clone()).unwrap();
                if message.message_type == MessageType::UserMessage {
                    break envelope;
                }
            };
            let message: ChannelMessage = serde_json::from_value(envelope.data).unwrap();
            assert_eq!(message.username, "bob");
            assert_eq!(message.content, "hello");
        }
    }

    #[actix_rt::test]
    #[serial]
    async fn queueing_starts_playback_and_controller_rules_hold() {
        let port = 18091;
        start_server(port, 42.0).await;

        let mut alice = connect(port).await;
        join(&mut alice, "theater", "alice").await;

        send(
            &mut alice,
            events::QUEUE_MEDIA,
            json!({"id": "a", "url": "https://cdn.example/a/index.m3u8"}),
        )
        .await;
        let envelope = next_event(&mut alice, events::MEDIA_CHANGED, Duration::from_secs(2))
            .await
            .expect("media_changed");
        let playing: NowPlayingMedia = serde_json::from_value(envelope.data).unwrap();
        assert_eq!(playing.media.id, "a");
        assert!(!playing.paused);
        assert!(playing.current_time < 0.5);

        // A later joiner sees the running clock in its snapshot.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let mut bob = connect(port).await;
        let room = join(&mut bob, "theater", "bob").await;
        let now_playing = room.now_playing.expect("now_playing in snapshot");
        assert_eq!(now_playing.media.id, "a");
        assert!(
            now_playing.current_time > 0.9 && now_playing.current_time < 2.5,
            "snapshot clock should be about a second in, got {}",
            now_playing.current_time
        );

        // A non-controller cannot pause; it only gets corrected.
        send(&mut bob, events::PLAYER_STATE, json!({"paused": true})).await;
        let envelope = next_event(&mut bob, events::STATE_SYNC, Duration::from_secs(2))
            .await
            .expect("state_sync");
        let state: PlaybackState = serde_json::from_value(envelope.data).unwrap();
        assert!(!state.paused);
        expect_silence(&mut alice, events::STATE_UPDATED, Duration::from_millis(300)).await;

        // The controller can; everyone else hears about it.
        send(&mut alice, events::PLAYER_STATE, json!({"paused": true})).await;
        let envelope = next_event(&mut bob, events::STATE_UPDATED, Duration::from_secs(2))
            .await
            .expect("state_updated");
        let state: PlaybackState = serde_json::from_value(envelope.data).unwrap();
        assert!(state.paused);
        expect_silence(&mut alice, events::STATE_UPDATED, Duration::from_millis(300)).await;
    }

    #[actix_rt::test]
    #[serial]
    async fn short_guest_names_keep_the_default() {
        let port = 18092;
        start_server(port, 42.0).await;

        let mut ws = connect(port).await;
        join(&mut ws, "lobby", "ab").await;
        let envelope = next_event(&mut ws, events::CHANNEL_MESSAGE, Duration::from_secs(2))
            .await
            .expect("join announcement");
        let message: ChannelMessage = serde_json::from_value(envelope.data).unwrap();
        assert!(
            message.content.starts_with("Guest_"),
            "short guest name must be ignored: {}",
            message.content
        );
    }

    #[actix_rt::test]
    #[serial]
    async fn bad_payloads_do_not_kill_the_connection() {
        let port = 18093;
        start_server(port, 42.0).await;

        let mut ws = connect(port).await;
        next_event(&mut ws, events::CONNECTED, Duration::from_secs(2))
            .await
            .expect("connected");

        // Events before joining, unknown events and ill-typed payloads
        // are all dropped without closing the socket.
        send(&mut ws, events::SEND_MESSAGE, json!({"message": "into the void"})).await;
        send(&mut ws, "no_such_event", json!(1)).await;
        send(&mut ws, events::JOIN_CHANNEL, json!(42)).await;
        ws.send(WsFrame::Text("not json at all".to_owned()))
            .await
            .expect("send");

        let room = join(&mut ws, "resilient", "carol").await;
        assert!(room.messages.is_empty());
    }
}
