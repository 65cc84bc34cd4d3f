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

//! Legacy HLS pass-through proxy and playlist rewriter.
//!
//! `/m3u8/{url}` fetches a playlist and rewrites every key, variant and
//! segment URI to go through `/proxied/{url}`, so a browser only ever
//! talks to this origin.

use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse};
use anyhow::{anyhow, Result};
use m3u8_rs::Playlist;
use serde_json::json;
use tracing::debug;

const M3U8_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": message }))
}

fn decode_target(raw: &str) -> Result<String> {
    let url = urlencoding::decode(raw)?;
    if url.is_empty() {
        return Err(anyhow!("empty URL"));
    }
    Ok(url.into_owned())
}

#[get("/proxied/{url:.*}")]
pub async fn proxied(path: web::Path<String>) -> HttpResponse {
    let Ok(target) = decode_target(&path) else {
        return bad_request("Invalid URL.");
    };
    let upstream = match reqwest::get(&target).await {
        Ok(response) => response,
        Err(err) => {
            debug!(error = %err, "proxy fetch failed");
            return bad_request("Failed to fetch URL.");
        }
    };

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_owned();

    match upstream.bytes().await {
        Ok(body) => HttpResponse::build(status)
            .content_type(content_type)
            .body(body.to_vec()),
        Err(err) => {
            debug!(error = %err, "proxy body read failed");
            bad_request("Failed to fetch URL.")
        }
    }
}

#[get("/m3u8/{url:.*}")]
pub async fn playlist(path: web::Path<String>) -> HttpResponse {
    let Ok(target) = decode_target(&path) else {
        return bad_request("Invalid URL.");
    };
    let body = match reqwest::get(&target).await {
        Ok(response) => match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                debug!(error = %err, "playlist body read failed");
                return bad_request("Failed to fetch URL.");
            }
        },
        Err(err) => {
            debug!(error = %err, "playlist fetch failed");
            return bad_request("Failed to fetch URL.");
        }
    };

    match rewrite_playlist(&body) {
        Ok(rewritten) => HttpResponse::Ok()
            .content_type(M3U8_CONTENT_TYPE)
            .body(rewritten),
        Err(err) => {
            debug!(error = %err, "playlist rewrite failed");
            bad_request("Failed to parse M3U8 playlist.")
        }
    }
}

fn proxied_uri(uri: &str) -> String {
    format!("/proxied/{}", urlencoding::encode(uri))
}

fn rewrite_playlist(input: &[u8]) -> Result<Vec<u8>> {
    let parsed_playlist = m3u8_rs::parse_playlist_res(input)
        .map_err(|err| anyhow!("not a valid playlist: {err:?}"))?;
    let mut out = Vec::new();
    match parsed_playlist {
        Playlist::MasterPlaylist(mut master) => {
            for variant in &mut master.variants {
                variant.uri = proxied_uri(&variant.uri);
            }
            master.write_to(&mut out)?;
        }
        Playlist::MediaPlaylist(mut media) => {
            for segment in &mut media.segments {
                segment.uri = proxied_uri(&segment.uri);
                if let Some(key) = segment.key.as_mut() {
                    if let Some(uri) = key.uri.as_mut() {
                        *uri = proxied_uri(uri);
                    }
                }
            }
            media.write_to(&mut out)?;
        }
    }
    Ok(out)
}
