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

//! The process-wide channel map.
//!
//! Both lookup-or-create and delete-on-empty run on this actor's mailbox,
//! so the empty check and the removal cannot be separated by a concurrent
//! join.

use std::collections::HashMap;

use actix::{Actor, Addr, AsyncContext, Context, Handler, MessageResult};
use tracing::{debug, warn};

use crate::actors::channel::Channel;
use crate::actors::session::ChannelId;
use crate::messages::channel::Join;
use crate::messages::registry::{ChannelClosed, JoinChannel};

#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelId, Addr<Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        ChannelRegistry::default()
    }
}

impl Actor for ChannelRegistry {
    type Context = Context<Self>;
}

impl Handler<JoinChannel> for ChannelRegistry {
    type Result = MessageResult<JoinChannel>;

    fn handle(&mut self, msg: JoinChannel, ctx: &mut Self::Context) -> Self::Result {
        let JoinChannel {
            channel_id,
            session,
            username,
            addr,
        } = msg;

        // Register before the first join send so concurrent joins
        // converge on the same channel.
        let registry = ctx.address();
        let channel = self
            .channels
            .entry(channel_id.clone())
            .or_insert_with(|| {
                debug!(channel = %channel_id, "creating channel");
                Channel::new(channel_id.clone(), registry).start()
            })
            .clone();

        if channel
            .try_send(Join {
                session,
                username,
                addr,
            })
            .is_err()
        {
            warn!(channel = %channel_id, "join raced channel shutdown");
        }

        MessageResult(channel)
    }
}

impl Handler<ChannelClosed> for ChannelRegistry {
    type Result = ();

    fn handle(&mut self, msg: ChannelClosed, _ctx: &mut Self::Context) -> Self::Result {
        // Only drop the entry if it still points at the closing channel;
        // a newer channel may already have taken the id.
        if self.channels.get(&msg.channel_id) == Some(&msg.addr) {
            self.channels.remove(&msg.channel_id);
            debug!(channel = %msg.channel_id, "channel removed from registry");
        }
    }
}
