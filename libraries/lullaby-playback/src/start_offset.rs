//! Randomized start position
//!
//! When a looping track is started from position 0, pick one of its start
//! offsets uniformly at random so restarts don't sound identical. Anything
//! unusable falls back to the beginning; a bad offset is never an error.

use lullaby_core::StartOffset;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Outcome of choosing a start position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartChoice {
    /// Track has no start offsets
    NoOffsets,

    /// Chosen offset is usable
    Offset(StartOffset),

    /// Chosen offset string is not `mm:ss`
    Malformed(String),

    /// Chosen offset lies past the end of the track
    BeyondDuration { offset: StartOffset, duration_ms: u64 },
}

impl StartChoice {
    /// Position to seek to, in milliseconds
    pub fn position_ms(&self) -> u64 {
        match self {
            StartChoice::Offset(offset) => offset.as_millis(),
            _ => 0,
        }
    }
}

/// Choose a start position using the thread-local RNG
pub fn choose_start(offsets: &[String], duration_ms: Option<u64>) -> StartChoice {
    choose_start_with(offsets, duration_ms, &mut thread_rng())
}

/// Choose a start position with a caller-supplied RNG.
///
/// An unknown duration does not reject an offset.
pub fn choose_start_with<R: Rng + ?Sized>(
    offsets: &[String],
    duration_ms: Option<u64>,
    rng: &mut R,
) -> StartChoice {
    let Some(raw) = offsets.choose(rng) else {
        return StartChoice::NoOffsets;
    };

    let Ok(offset) = StartOffset::parse(raw) else {
        return StartChoice::Malformed(raw.clone());
    };

    match duration_ms {
        Some(duration_ms) if offset.as_millis() > duration_ms => StartChoice::BeyondDuration {
            offset,
            duration_ms,
        },
        _ => StartChoice::Offset(offset),
    }
}
