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

//! WebSocket upgrade endpoint.

use actix::prelude::Stream;
use actix::{Actor, StreamHandler};
use actix_http::error::PayloadError;
use actix_http::ws::{Codec, Message, ProtocolError};
use actix_web::web::Bytes;
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws::{handshake, WebsocketContext};
use tracing::debug;

use crate::actors::session::WsSession;
use crate::constants::MAX_BUFFER_SIZE;
use crate::models::AppState;

/// Start a WebSocket connection with a custom codec.
fn start_with_codec<A, S>(
    actor: A,
    req: &HttpRequest,
    stream: S,
    codec: Codec,
) -> Result<HttpResponse, Error>
where
    A: Actor<Context = WebsocketContext<A>> + StreamHandler<Result<Message, ProtocolError>>,
    S: Stream<Item = Result<Bytes, PayloadError>> + 'static,
{
    let mut res = handshake(req)?;
    Ok(res.streaming(WebsocketContext::with_codec(actor, stream, codec)))
}

#[get("/ws")]
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    debug!("socket upgrade requested");
    let session = WsSession::new(state.registry.clone(), state.durations.clone());
    // Frames past MAX_BUFFER_SIZE are a protocol error that drops the
    // connection.
    let codec = Codec::new().max_size(MAX_BUFFER_SIZE);
    start_with_codec(session, &req, stream, codec)
}
