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

//! Envelope encode/decode for the WebSocket wire.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use watchparty_types::Envelope;

#[derive(Serialize)]
struct WireEnvelope<'a, T> {
    event: &'a str,
    data: &'a T,
}

/// Encode one outbound envelope. Values that cannot be encoded are
/// dropped; the session continues.
pub fn encode<T: Serialize>(event: &str, data: &T) -> Option<Arc<String>> {
    match serde_json::to_string(&WireEnvelope { event, data }) {
        Ok(text) => Some(Arc::new(text)),
        Err(err) => {
            debug!(event, error = %err, "dropping unencodable outbound envelope");
            None
        }
    }
}

/// Decode one inbound frame. A frame that is not an envelope is dropped;
/// the connection is retained.
pub fn decode(text: &str) -> Option<Envelope> {
    match serde_json::from_str(text) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            debug!(error = %err, "dropping undecodable inbound frame");
            None
        }
    }
}
