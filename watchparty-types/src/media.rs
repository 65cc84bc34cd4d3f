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

/// A queued media item.
///
/// `duration` is filled in server-side from the playlist and never leaves
/// the process; clients read item lengths out of their own player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub url: String,
    #[serde(skip)]
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_image_url: Option<String>,
}

/// Snapshot of the item currently playing, taken with the server clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingMedia {
    #[serde(flatten)]
    pub media: Media,
    pub paused: bool,
    pub current_time: f64,
}

/// Authoritative playback state, carried by `state_sync` and
/// `state_updated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub paused: bool,
    pub current_time: f64,
}

/// A controller's requested change; both fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStateUpdate {
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(default)]
    pub current_time: Option<f64>,
}

/// Payload of the inbound `queue_media` event.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueMediaRequest {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub episode: Option<i64>,
    #[serde(default)]
    pub poster_image_url: Option<String>,
}

/// Payload of the inbound `queue_remove` event.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueRemoveRequest {
    pub id: String,
}

/// Payload of the outbound `media_removed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRemoved {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn media() -> Media {
        Media {
            id: "m1".to_owned(),
            url: "https://cdn.example/m1/index.m3u8".to_owned(),
            duration: 1432.5,
            title: Some("Episode One".to_owned()),
            series: None,
            episode: Some(1),
            poster_image_url: None,
        }
    }

    #[test]
    fn duration_never_serializes() {
        let value = serde_json::to_value(media()).unwrap();
        assert!(value.get("duration").is_none());
        assert_eq!(value["id"], "m1");
        assert_eq!(value["episode"], 1);
        assert!(value.get("series").is_none());
    }

    #[test]
    fn now_playing_flattens_media_fields() {
        let snapshot = NowPlayingMedia {
            media: media(),
            paused: false,
            current_time: 12.25,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["id"], "m1");
        assert_eq!(value["paused"], false);
        assert_eq!(value["current_time"], 12.25);
    }

    #[test]
    fn state_update_accepts_partial_payloads() {
        let update: PlaybackStateUpdate =
            serde_json::from_value(json!({"paused": true})).unwrap();
        assert_eq!(update.paused, Some(true));
        assert_eq!(update.current_time, None);

        let update: PlaybackStateUpdate = serde_json::from_value(json!({})).unwrap();
        assert_eq!(update, PlaybackStateUpdate::default());
    }

    #[test]
    fn queue_request_requires_id_and_url() {
        let request: QueueMediaRequest =
            serde_json::from_value(json!({"id": "a", "url": "u"})).unwrap();
        assert_eq!(request.id, "a");
        assert!(request.title.is_none());

        assert!(serde_json::from_value::<QueueMediaRequest>(json!({"id": "a"})).is_err());
    }
}
