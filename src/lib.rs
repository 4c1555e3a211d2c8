pub mod config;
pub mod discord;
pub mod error;
pub mod player;
pub mod station;

pub use config::Config;
pub use error::{PlaybackError, StopOutcome};
pub use player::{Destination, ResilientStreamPlayer, RestartPolicy, SessionHandle, SessionState};
pub use station::Station;
