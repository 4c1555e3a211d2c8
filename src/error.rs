//! Playback error taxonomy.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The caller is not inside a voice channel we could join.
    #[error("you must be in a voice channel to use this command")]
    NoJoinTarget,
    #[error("could not join voice channel: {0}")]
    JoinFailed(String),
    #[error("could not start playback: {0}")]
    PlaybackFailed(String),
    #[error("could not leave voice channel: {0}")]
    Disconnect(String),
    /// Terminal: the stream kept stalling after every restart attempt.
    #[error("stream did not recover after {attempts} restart attempts")]
    RestartsExhausted { attempts: u32 },
}

pub type Result<T, E = PlaybackError> = std::result::Result<T, E>;

/// Outcome of a stop request. Neither variant is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NothingToStop,
}
