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

//! The per-channel event loop.
//!
//! Each channel is one actor; its mailbox serializes every mutation —
//! joins, leaves, chat, queue edits, controller handoff, player state and
//! the 1 Hz playback tick — so none of them can interleave.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use actix::{
    Actor, ActorContext, AsyncContext, Context, Handler, Recipient, SpawnHandle,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use watchparty_types::{
    events, ChannelMessage, CommandPayload, CommandType, Media, MediaRemoved, MessageType,
    PlaybackState, RoomData,
};

use crate::actors::registry::ChannelRegistry;
use crate::actors::session::{ChannelId, SessionId};
use crate::constants::{
    MAX_STORED_MESSAGES, MEDIA_END_EPSILON, STATE_SYNC_INTERVAL_SECS, SYSTEM_USERNAME,
};
use crate::messages::channel::{
    Join, Leave, QueueInsert, QueueRemove, RunCommand, SendChat, UpdatePlayerState,
};
use crate::messages::registry::ChannelClosed;
use crate::messages::session::Outbound;
use crate::playback::NowPlaying;
use crate::wire;

struct Member {
    username: String,
    addr: Recipient<Outbound>,
}

pub struct Channel {
    id: ChannelId,
    registry: actix::Addr<ChannelRegistry>,
    controller: Option<SessionId>,
    connections: HashMap<SessionId, Member>,
    playing: Option<NowPlaying>,
    queued: Vec<Media>,
    messages: VecDeque<ChannelMessage>,
    playback: Option<SpawnHandle>,
}

impl Channel {
    pub fn new(id: ChannelId, registry: actix::Addr<ChannelRegistry>) -> Self {
        Channel {
            id,
            registry,
            controller: None,
            connections: HashMap::new(),
            playing: None,
            queued: Vec::new(),
            messages: VecDeque::with_capacity(MAX_STORED_MESSAGES),
            playback: None,
        }
    }

    /// Fan an event out to every member. Encoded once; a member whose
    /// outbound queue is full misses this message and reconverges on the
    /// next `state_sync`.
    fn emit_all<T: Serialize>(&self, event: &str, data: &T) {
        let Some(text) = wire::encode(event, data) else {
            return;
        };
        for (session, member) in &self.connections {
            if member.addr.try_send(Outbound(text.clone())).is_err() {
                debug!(channel = %self.id, %session, event, "outbound queue full, dropping");
            }
        }
    }

    /// Fan an event out to every member except `sender`.
    fn broadcast<T: Serialize>(&self, event: &str, data: &T, sender: &SessionId) {
        let Some(text) = wire::encode(event, data) else {
            return;
        };
        for (session, member) in &self.connections {
            if session == sender {
                continue;
            }
            if member.addr.try_send(Outbound(text.clone())).is_err() {
                debug!(channel = %self.id, %session, event, "outbound queue full, dropping");
            }
        }
    }

    fn emit_to<T: Serialize>(&self, session: &SessionId, event: &str, data: &T) {
        let Some(member) = self.connections.get(session) else {
            return;
        };
        let Some(text) = wire::encode(event, data) else {
            return;
        };
        if member.addr.try_send(Outbound(text)).is_err() {
            debug!(channel = %self.id, %session, event, "outbound queue full, dropping");
        }
    }

    /// Store a message in the ring, evicting the oldest past capacity,
    /// and fan it out.
    fn push_message(&mut self, message: ChannelMessage) {
        if self.messages.len() == MAX_STORED_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(message.clone());
        self.emit_all(events::CHANNEL_MESSAGE, &message);
    }

    fn system_message(&mut self, message_type: MessageType, content: String) {
        self.push_message(ChannelMessage {
            message_type,
            utc_epoch: Utc::now().timestamp(),
            username: SYSTEM_USERNAME.to_owned(),
            content,
        });
    }

    /// Promote a media item to now-playing and make sure the 1 Hz clock
    /// is running.
    fn start_playback(&mut self, media: Media, ctx: &mut Context<Self>) {
        let playing = NowPlaying::start(media);
        self.emit_all(events::MEDIA_CHANGED, &playing.snapshot());
        self.system_message(
            MessageType::MediaChanged,
            format!("Now playing: {}.", display_title(&playing.media)),
        );
        self.playing = Some(playing);
        if self.playback.is_none() {
            self.playback = Some(ctx.run_interval(Duration::from_secs(1), Self::playback_tick));
        }
    }

    fn stop_playback(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.playback.take() {
            ctx.cancel_future(handle);
        }
    }

    /// Pop the queue head into a fresh now-playing item. No-op when the
    /// queue is empty, which makes `skip` on an empty queue harmless.
    fn advance_queue(&mut self, ctx: &mut Context<Self>) {
        if self.queued.is_empty() {
            return;
        }
        let next = self.queued.remove(0);
        self.start_playback(next, ctx);
    }

    fn playback_tick(&mut self, ctx: &mut Context<Self>) {
        let Some(playing) = self.playing.as_ref() else {
            warn!(channel = %self.id, "playback tick with nothing playing");
            self.stop_playback(ctx);
            return;
        };
        let current_time = playing.current_playback_time();
        let media_id = playing.media.id.clone();
        let action = tick_action(
            current_time,
            playing.media.duration,
            playing.paused(),
            self.queued.is_empty(),
        );
        match action {
            TickAction::AdvanceQueue => self.advance_queue(ctx),
            TickAction::FinishPlayback => {
                info!(channel = %self.id, media = %media_id, "playback finished");
                self.stop_playback(ctx);
                self.playing = None;
            }
            TickAction::EmitSync => {
                self.emit_all(
                    events::STATE_SYNC,
                    &PlaybackState {
                        paused: false,
                        current_time,
                    },
                );
            }
            TickAction::Nothing => {}
        }
    }

    fn grant_control(&mut self, session: SessionId) {
        if self.controller.as_ref() == Some(&session) {
            return;
        }
        let Some(member) = self.connections.get(&session) else {
            return;
        };
        let username = member.username.clone();
        debug!(channel = %self.id, %session, "controller changed");
        self.controller = Some(session);
        self.system_message(
            MessageType::Notification,
            format!("{username} has taken control of the room."),
        );
    }

    fn purge_messages(&mut self, session: &SessionId) {
        let Some(member) = self.connections.get(session) else {
            return;
        };
        let username = member.username.clone();
        self.messages.clear();
        self.emit_all(
            events::COMMAND,
            &CommandPayload {
                code: CommandType::PurgeMessages.code(),
            },
        );
        self.system_message(
            MessageType::Notification,
            format!("{username} has purged channel messages."),
        );
    }

    fn room_data(&self) -> RoomData {
        RoomData {
            now_playing: self.playing.as_ref().map(NowPlaying::snapshot),
            queue: self.queued.clone(),
            messages: self.messages.iter().cloned().collect(),
        }
    }
}

fn display_title(media: &Media) -> &str {
    media.title.as_deref().unwrap_or(&media.id)
}

enum TickAction {
    AdvanceQueue,
    FinishPlayback,
    EmitSync,
    Nothing,
}

fn tick_action(current_time: f64, duration: f64, paused: bool, queue_empty: bool) -> TickAction {
    if current_time >= duration - MEDIA_END_EPSILON {
        if queue_empty {
            TickAction::FinishPlayback
        } else {
            TickAction::AdvanceQueue
        }
    } else if !paused && (current_time.floor() as i64) % STATE_SYNC_INTERVAL_SECS == 0 {
        TickAction::EmitSync
    } else {
        TickAction::Nothing
    }
}

impl Actor for Channel {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(channel = %self.id, "channel opened");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(channel = %self.id, "channel closed");
    }
}

impl Handler<Join> for Channel {
    type Result = ();

    fn handle(&mut self, msg: Join, _ctx: &mut Self::Context) -> Self::Result {
        let Join {
            session,
            username,
            addr,
        } = msg;

        // Snapshot before the join is announced so the joiner does not
        // see its own announcement twice.
        if let Some(text) = wire::encode(events::ROOM_DATA, &self.room_data()) {
            let _ = addr.try_send(Outbound(text));
        }

        self.connections.insert(
            session.clone(),
            Member {
                username: username.clone(),
                addr,
            },
        );
        if self.controller.is_none() {
            self.controller = Some(session);
        }
        self.system_message(
            MessageType::UserJoin,
            format!("{username} has joined the room."),
        );
    }
}

impl Handler<Leave> for Channel {
    type Result = ();

    fn handle(&mut self, msg: Leave, ctx: &mut Self::Context) -> Self::Result {
        let Some(member) = self.connections.remove(&msg.session) else {
            debug!(channel = %self.id, session = %msg.session, "leave from unknown session");
            return;
        };
        self.system_message(
            MessageType::UserLeave,
            format!("{} has left the room.", member.username),
        );

        if self.connections.is_empty() {
            self.registry.do_send(ChannelClosed {
                channel_id: self.id.clone(),
                addr: ctx.address(),
            });
            ctx.stop();
            return;
        }

        if self.controller.as_ref() == Some(&msg.session) {
            self.controller = self.connections.keys().next().cloned();
            debug!(channel = %self.id, controller = ?self.controller, "controller re-elected");
        }
    }
}

impl Handler<SendChat> for Channel {
    type Result = ();

    fn handle(&mut self, msg: SendChat, _ctx: &mut Self::Context) -> Self::Result {
        let Some(member) = self.connections.get(&msg.session) else {
            return;
        };
        let username = member.username.clone();
        self.push_message(ChannelMessage {
            message_type: MessageType::UserMessage,
            utc_epoch: Utc::now().timestamp(),
            username,
            content: msg.message,
        });
    }
}

impl Handler<QueueInsert> for Channel {
    type Result = ();

    fn handle(&mut self, msg: QueueInsert, ctx: &mut Self::Context) -> Self::Result {
        let media = msg.media;
        if self.playing.is_some() {
            self.emit_all(events::QUEUE_UPDATED, &media);
            self.system_message(
                MessageType::MediaQueued,
                format!("{} has been added to the queue.", display_title(&media)),
            );
            self.queued.push(media);
            return;
        }
        self.start_playback(media, ctx);
    }
}

impl Handler<QueueRemove> for Channel {
    type Result = ();

    fn handle(&mut self, msg: QueueRemove, _ctx: &mut Self::Context) -> Self::Result {
        // Every matching entry goes, not just the first.
        let queued = std::mem::take(&mut self.queued);
        for media in queued {
            if media.id != msg.media_id {
                self.queued.push(media);
                continue;
            }
            self.emit_all(
                events::MEDIA_REMOVED,
                &MediaRemoved {
                    id: media.id.clone(),
                },
            );
            self.system_message(
                MessageType::MediaRemoved,
                format!("{} has been removed from the queue.", display_title(&media)),
            );
        }
    }
}

impl Handler<UpdatePlayerState> for Channel {
    type Result = ();

    fn handle(&mut self, msg: UpdatePlayerState, _ctx: &mut Self::Context) -> Self::Result {
        let UpdatePlayerState { session, update } = msg;

        // A non-controller cannot steer; it gets the authoritative state
        // back and nothing else happens.
        if self.controller.as_ref() != Some(&session) {
            if let Some(playing) = self.playing.as_ref() {
                let state = PlaybackState {
                    paused: playing.paused(),
                    current_time: playing.current_playback_time(),
                };
                self.emit_to(&session, events::STATE_SYNC, &state);
            }
            return;
        }

        let state = {
            let Some(playing) = self.playing.as_mut() else {
                return;
            };
            if let Some(paused) = update.paused {
                playing.set_paused(paused);
            }
            if let Some(seconds) = update.current_time {
                if seconds != playing.position() {
                    playing.seek(seconds);
                }
            }
            PlaybackState {
                paused: playing.paused(),
                current_time: playing.position(),
            }
        };
        self.broadcast(events::STATE_UPDATED, &state, &session);
    }
}

impl Handler<RunCommand> for Channel {
    type Result = ();

    fn handle(&mut self, msg: RunCommand, ctx: &mut Self::Context) -> Self::Result {
        match msg.command {
            CommandType::TakeRemote => self.grant_control(msg.session),
            CommandType::PurgeMessages => self.purge_messages(&msg.session),
            CommandType::Skip => self.advance_queue(ctx),
        }
    }
}
