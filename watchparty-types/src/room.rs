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

use serde::{Deserialize, Serialize};

use crate::chat::ChannelMessage;
use crate::media::{Media, NowPlayingMedia};

/// Payload of the inbound `join_channel` event.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinChannelRequest {
    pub channel_id: String,
    #[serde(default)]
    pub guest_username: Option<String>,
}

/// Room snapshot sent to a client right after it joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomData {
    pub now_playing: Option<NowPlayingMedia>,
    pub queue: Vec<Media>,
    pub messages: Vec<ChannelMessage>,
}
