//! Per-session state machine and restart policy.

use std::{fmt, time::Duration};

use exponential_backoff::Backoff;

use super::backend::PlayerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Playing,
    Restarting { attempt: u32 },
    Stopped,
    Failed { attempts: u32 },
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Failed { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Starting => f.write_str("starting"),
            SessionState::Playing => f.write_str("playing"),
            SessionState::Restarting { attempt } => write!(f, "restarting (attempt {attempt})"),
            SessionState::Stopped => f.write_str("stopped"),
            SessionState::Failed { attempts } => {
                write!(f, "failed after {attempts} restart attempts")
            }
        }
    }
}

/// How hard a session tries to bring a stalled stream back.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// Consecutive restarts allowed before the session gives up.
    pub max_restarts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: 5,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RestartPolicy {
    fn backoff(&self) -> Backoff {
        // Yields `max_restarts` delays.
        Backoff::new(
            self.max_restarts.saturating_add(1),
            self.min_delay,
            self.max_delay.max(self.min_delay),
        )
    }
}

/// What the session actor has to do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Nothing,
    Restart(Duration),
    Fail { attempts: u32 },
    Stop,
}

pub(crate) struct Lifecycle {
    state: SessionState,
    policy: RestartPolicy,
    backoff: Backoff,
    attempts: u32,
}

impl Lifecycle {
    pub(crate) fn new(policy: RestartPolicy) -> Self {
        let backoff = policy.backoff();
        Self {
            state: SessionState::Starting,
            policy,
            backoff,
            attempts: 0,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn on_event(&mut self, event: &PlayerEvent) -> Step {
        if self.state.is_terminal() {
            return Step::Nothing;
        }

        match event {
            PlayerEvent::Playing => {
                if self.attempts > 0 {
                    log::info!("Stream recovered after {} restart attempts", self.attempts);
                    self.attempts = 0;
                }
                self.state = SessionState::Playing;
                Step::Nothing
            }
            PlayerEvent::Idle | PlayerEvent::Errored(_) => self.schedule_restart(),
            PlayerEvent::Disconnected => {
                self.state = SessionState::Stopped;
                Step::Stop
            }
        }
    }

    pub(crate) fn stop(&mut self) {
        self.state = SessionState::Stopped;
    }

    fn schedule_restart(&mut self) -> Step {
        if self.attempts >= self.policy.max_restarts {
            return self.fail();
        }
        match (&self.backoff).into_iter().nth(self.attempts as usize) {
            Some(Some(delay)) => {
                self.attempts += 1;
                self.state = SessionState::Restarting {
                    attempt: self.attempts,
                };
                Step::Restart(delay)
            }
            _ => self.fail(),
        }
    }

    fn fail(&mut self) -> Step {
        self.state = SessionState::Failed {
            attempts: self.attempts,
        };
        Step::Fail {
            attempts: self.attempts,
        }
    }
}
