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

use std::time::Duration;

/// How often the server pings each client.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// How long a client may go without ping/pong traffic before it is dropped.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum size of a single inbound frame, in bytes.
pub const MAX_BUFFER_SIZE: usize = 1024;

/// Capacity of a channel's stored-message ring.
pub const MAX_STORED_MESSAGES: usize = 100;

/// Seconds between periodic playback resync hints.
pub const STATE_SYNC_INTERVAL_SECS: i64 = 10;

/// Playback counts as finished this close to the end of the item.
pub const MEDIA_END_EPSILON: f64 = 0.5;

/// Username attached to server-generated channel messages.
pub const SYSTEM_USERNAME: &str = "System";
