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

//! Operations handled by the process-wide channel registry.

use actix::{Addr, Message as ActixMessage, Recipient};

use super::session::Outbound;
use crate::actors::channel::Channel;
use crate::actors::session::{ChannelId, SessionId};

/// Look up or create the channel and forward the join. Replies with the
/// channel's address so the session can send follow-up operations.
#[derive(ActixMessage)]
#[rtype(result = "Addr<Channel>")]
pub struct JoinChannel {
    pub channel_id: ChannelId,
    pub session: SessionId,
    pub username: String,
    pub addr: Recipient<Outbound>,
}

/// Sent by a channel that emptied out, just before it stops.
#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct ChannelClosed {
    pub channel_id: ChannelId,
    pub addr: Addr<Channel>,
}
