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

//! Operations handled on a channel's serialized mailbox.

use actix::{Message as ActixMessage, Recipient};
use watchparty_types::{CommandType, Media, PlaybackStateUpdate};

use super::session::Outbound;
use crate::actors::session::SessionId;

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct Join {
    pub session: SessionId,
    pub username: String,
    pub addr: Recipient<Outbound>,
}

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct Leave {
    pub session: SessionId,
}

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct SendChat {
    pub session: SessionId,
    pub message: String,
}

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct QueueInsert {
    pub media: Media,
}

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct QueueRemove {
    pub media_id: String,
}

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct UpdatePlayerState {
    pub session: SessionId,
    pub update: PlaybackStateUpdate,
}

#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct RunCommand {
    pub session: SessionId,
    pub command: CommandType,
}
