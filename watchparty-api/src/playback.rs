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

use std::time::Instant;

use watchparty_types::{Media, NowPlayingMedia};

/// The promoted, clock-bearing queue item.
///
/// `current_time` is only rewritten on pause transitions and seeks. The
/// effective playhead is always derived from the wall clock; accumulating
/// one-second ticks drifts under timer jitter.
pub struct NowPlaying {
    pub media: Media,
    paused: bool,
    current_time: f64,
    last_resume: Instant,
}

impl NowPlaying {
    pub fn start(media: Media) -> Self {
        NowPlaying {
            media,
            paused: false,
            current_time: 0.0,
            last_resume: Instant::now(),
        }
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// The frozen position, as last written by a pause or seek.
    pub fn position(&self) -> f64 {
        self.current_time
    }

    /// Server-authoritative playhead, derived on demand.
    pub fn current_playback_time(&self) -> f64 {
        if self.paused {
            self.current_time
        } else {
            self.current_time + self.last_resume.elapsed().as_secs_f64()
        }
    }

    /// Pause freezes the clock; resume restarts it from the frozen spot.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        if paused {
            self.current_time = self.current_playback_time();
        } else {
            self.last_resume = Instant::now();
        }
        self.paused = paused;
    }

    pub fn seek(&mut self, seconds: f64) {
        self.current_time = seconds;
        self.last_resume = Instant::now();
    }

    pub fn snapshot(&self) -> NowPlayingMedia {
        NowPlayingMedia {
            media: self.media.clone(),
            paused: self.paused,
            current_time: self.current_playback_time(),
        }
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, seconds: f64) {
        self.last_resume -= std::time::Duration::from_secs_f64(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(duration: f64) -> Media {
        Media {
            id: "m".to_owned(),
            url: "u".to_owned(),
            duration,
            title: None,
            series: None,
            episode: None,
            poster_image_url: None,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.05,
            "expected ~{expected}, got {actual}"
        );
    }

    #[test]
    fn playhead_tracks_wall_clock_while_unpaused() {
        let mut playing = NowPlaying::start(media(42.0));
        playing.backdate(5.0);
        assert_close(playing.current_playback_time(), 5.0);
    }

    #[test]
    fn pause_freezes_and_resume_restarts() {
        let mut playing = NowPlaying::start(media(42.0));
        playing.backdate(5.0);
        playing.set_paused(true);
        assert_close(playing.current_playback_time(), 5.0);

        // Frozen: wall-clock time no longer counts.
        playing.backdate(30.0);
        assert_close(playing.current_playback_time(), 5.0);

        playing.set_paused(false);
        assert_close(playing.current_playback_time(), 5.0);
        playing.backdate(2.0);
        assert_close(playing.current_playback_time(), 7.0);
    }

    #[test]
    fn redundant_pause_is_a_no_op() {
        let mut playing = NowPlaying::start(media(42.0));
        playing.backdate(5.0);
        playing.set_paused(false);
        assert_close(playing.current_playback_time(), 5.0);
    }

    #[test]
    fn seek_restarts_the_clock_from_the_target() {
        let mut playing = NowPlaying::start(media(42.0));
        playing.backdate(5.0);
        playing.seek(20.0);
        assert_close(playing.current_playback_time(), 20.0);
        playing.backdate(3.0);
        assert_close(playing.current_playback_time(), 23.0);
    }

    #[test]
    fn snapshot_carries_the_effective_playhead() {
        let mut playing = NowPlaying::start(media(42.0));
        playing.backdate(5.0);
        let snapshot = playing.snapshot();
        assert!(!snapshot.paused);
        assert_close(snapshot.current_time, 5.0);
        assert_eq!(snapshot.media.id, "m");
    }
}
