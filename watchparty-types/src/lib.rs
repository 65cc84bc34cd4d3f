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

//! Wire protocol types for the watch-party coordination server.
//!
//! Everything that crosses a WebSocket in either direction is defined here
//! so that server and client builds agree on the shapes.

pub mod chat;
pub mod command;
pub mod envelope;
pub mod events;
pub mod media;
pub mod room;

pub use chat::{ChannelMessage, MessageType, SendMessageRequest};
pub use command::{CommandPayload, CommandType};
pub use envelope::Envelope;
pub use media::{
    Media, MediaRemoved, NowPlayingMedia, PlaybackState, PlaybackStateUpdate, QueueMediaRequest,
    QueueRemoveRequest,
};
pub use room::{JoinChannelRequest, RoomData};
