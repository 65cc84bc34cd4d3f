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

//! The duration oracle consulted while queueing media.

use anyhow::{anyhow, bail, Result};
use futures::future::BoxFuture;
use m3u8_rs::{MediaPlaylist, Playlist};

/// Master playlists may point at further playlists; stop following after
/// this many hops.
const MAX_PLAYLIST_HOPS: usize = 4;

/// Resolves the total duration of an HLS playlist, in seconds.
///
/// Failure rejects the queue request silently; the queue is unchanged.
pub trait DurationProvider: Send + Sync {
    fn duration(&self, url: &str) -> BoxFuture<'static, Result<f64>>;
}

/// Fetches playlists over HTTP, following master-playlist indirection to
/// the first variant.
pub struct HlsDurationFetcher {
    client: reqwest::Client,
}

impl HlsDurationFetcher {
    pub fn new() -> Self {
        HlsDurationFetcher {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HlsDurationFetcher {
    fn default() -> Self {
        HlsDurationFetcher::new()
    }
}

impl DurationProvider for HlsDurationFetcher {
    fn duration(&self, url: &str) -> BoxFuture<'static, Result<f64>> {
        let client = self.client.clone();
        let url = url.to_owned();
        Box::pin(async move { fetch_duration(&client, &url).await })
    }
}

async fn fetch_duration(client: &reqwest::Client, url: &str) -> Result<f64> {
    let mut target = url.to_owned();
    for _ in 0..MAX_PLAYLIST_HOPS {
        let body = client
            .get(&target)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        match m3u8_rs::parse_playlist_res(&body) {
            Ok(Playlist::MediaPlaylist(playlist)) => return Ok(playlist_duration(&playlist)),
            Ok(Playlist::MasterPlaylist(master)) => {
                let variant = master
                    .variants
                    .first()
                    .ok_or_else(|| anyhow!("master playlist has no variants"))?;
                target = resolve_variant_url(&target, &variant.uri)?;
            }
            Err(err) => bail!("failed to parse playlist at {target}: {err:?}"),
        }
    }
    bail!("too many levels of master playlist indirection")
}

fn playlist_duration(playlist: &MediaPlaylist) -> f64 {
    playlist
        .segments
        .iter()
        .map(|segment| f64::from(segment.duration))
        .sum()
}

fn resolve_variant_url(base: &str, variant: &str) -> Result<String> {
    let base = reqwest::Url::parse(base)?;
    Ok(base.join(variant)?.to_string())
}

/// Fixed-duration oracle for tests; no network involved.
#[cfg(test)]
pub(crate) struct FixedDuration(pub f64);

#[cfg(test)]
impl DurationProvider for FixedDuration {
    fn duration(&self, _url: &str) -> BoxFuture<'static, Result<f64>> {
        let duration = self.0;
        Box::pin(async move { Ok(duration) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDIA_PLAYLIST: &str = "#EXTM3U\n\
        #EXT-X-VERSION:3\n\
        #EXT-X-TARGETDURATION:10\n\
        #EXTINF:9.009,\n\
        seg0.ts\n\
        #EXTINF:9.009,\n\
        seg1.ts\n\
        #EXTINF:3.003,\n\
        seg2.ts\n\
        #EXT-X-ENDLIST\n";

    #[test]
    fn media_playlist_duration_sums_segments() {
        let Ok(Playlist::MediaPlaylist(playlist)) =
            m3u8_rs::parse_playlist_res(MEDIA_PLAYLIST.as_bytes())
        else {
            panic!("expected a media playlist");
        };
        let total = playlist_duration(&playlist);
        assert!((total - 21.021).abs() < 1e-6, "got {total}");
    }

    #[test]
    fn variant_urls_resolve_against_the_playlist_directory() {
        let resolved =
            resolve_variant_url("https://cdn.example/show/master.m3u8", "720p/index.m3u8")
                .unwrap();
        assert_eq!(resolved, "https://cdn.example/show/720p/index.m3u8");

        let absolute = resolve_variant_url(
            "https://cdn.example/show/master.m3u8",
            "https://other.example/index.m3u8",
        )
        .unwrap();
        assert_eq!(absolute, "https://other.example/index.m3u8");
    }
}
