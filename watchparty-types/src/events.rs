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

//! Envelope event names.

// Client -> server.
pub const JOIN_CHANNEL: &str = "join_channel";
pub const SEND_MESSAGE: &str = "send_message";
pub const QUEUE_MEDIA: &str = "queue_media";
pub const QUEUE_REMOVE: &str = "queue_remove";
pub const PLAYER_STATE: &str = "player_state";
pub const RUN_COMMAND: &str = "run_command";

// Server -> client.
pub const CONNECTED: &str = "connected";
pub const ROOM_DATA: &str = "room_data";
pub const CHANNEL_MESSAGE: &str = "channel_message";
pub const QUEUE_UPDATED: &str = "queue_updated";
pub const MEDIA_REMOVED: &str = "media_removed";
pub const MEDIA_CHANGED: &str = "media_changed";
pub const STATE_SYNC: &str = "state_sync";
pub const STATE_UPDATED: &str = "state_updated";
pub const COMMAND: &str = "command";
