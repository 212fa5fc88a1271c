use crate::clock::Clock;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} a timer that is {state}")]
pub struct InvalidTransition {
    pub action: TimerAction,
    pub state: RunState,
}

/// Point-in-time view of a timer, as handed to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerSnapshot {
    pub state: RunState,
    pub elapsed_secs: u64,
}

impl TimerSnapshot {
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }
}

/// Stopwatch state machine: Idle -> Running <-> Paused -> (stop) -> Idle.
///
/// Elapsed time is the sum of finished running intervals plus the interval in
/// progress, always derived from the clock at read time.
#[derive(Debug)]
pub struct Timer<C: Clock> {
    clock: C,
    state: RunState,
    accumulated: Duration,
    resumed_at: Option<Duration>,
}

impl<C: Clock> Timer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: RunState::Idle,
            accumulated: Duration::ZERO,
            resumed_at: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            RunState::Idle => {
                self.accumulated = Duration::ZERO;
            }
            RunState::Paused => {}
            RunState::Running => return Err(self.reject(TimerAction::Start)),
        }
        self.resumed_at = Some(self.clock.now());
        self.state = RunState::Running;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), InvalidTransition> {
        if self.state != RunState::Running {
            return Err(self.reject(TimerAction::Pause));
        }
        self.flush();
        self.state = RunState::Paused;
        Ok(())
    }

    /// Finish the current run and return its whole elapsed seconds. The
    /// accumulator keeps that value until the next `start`.
    pub fn stop(&mut self) -> Result<u64, InvalidTransition> {
        if self.state == RunState::Idle {
            return Err(self.reject(TimerAction::Stop));
        }
        self.flush();
        self.state = RunState::Idle;
        Ok(self.accumulated.as_secs())
    }

    pub fn elapsed(&self) -> Duration {
        match self.resumed_at {
            Some(resumed_at) => self.accumulated + self.clock.now().saturating_sub(resumed_at),
            None => self.accumulated,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            elapsed_secs: self.elapsed_secs(),
        }
    }

    fn flush(&mut self) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.accumulated += self.clock.now().saturating_sub(resumed_at);
        }
    }

    fn reject(&self, action: TimerAction) -> InvalidTransition {
        InvalidTransition {
            action,
            state: self.state,
        }
    }
}
