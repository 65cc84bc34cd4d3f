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

use std::sync::Arc;

use actix::Message as ActixMessage;

/// A fully encoded outbound envelope. Encoded once per fan-out and shared
/// across every recipient.
#[derive(ActixMessage, Clone, Debug)]
#[rtype(result = "()")]
pub struct Outbound(pub Arc<String>);
