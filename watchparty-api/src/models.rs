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

use actix::Addr;

use crate::actors::registry::ChannelRegistry;
use crate::media_duration::DurationProvider;

pub struct AppState {
    pub registry: Addr<ChannelRegistry>,
    pub durations: Arc<dyn DurationProvider>,
}
