//! The interactive stopwatch: key presses in, a finished or discarded run out.
//!
//! `space` pauses and resumes, `enter` finishes, `esc` and `ctrl-c` throw the
//! run away. Everything else is ignored.

use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;
use tracing::debug;

use crate::runtime::{Runner, Ticker, TrackEvent, TrackEventSource};
use crate::service::{ServiceError, Subscription, TimerHandle};
use crate::timer::TimerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackCommand {
    Toggle,
    Finish,
    Discard,
}

impl TrackCommand {
    pub fn for_key(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return (key.code == KeyCode::Char('c')).then_some(TrackCommand::Discard);
        }
        match key.code {
            KeyCode::Char(' ') => Some(TrackCommand::Toggle),
            KeyCode::Enter => Some(TrackCommand::Finish),
            KeyCode::Esc => Some(TrackCommand::Discard),
            _ => None,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// Keep the session; elapsed seconds
    Save(u64),
    Discard,
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

pub struct TrackSession {
    timer: TimerHandle,
    watch: Subscription,
    shown: TimerSnapshot,
}

impl TrackSession {
    /// Attach to the timer and start it.
    pub fn begin(timer: TimerHandle) -> Result<Self, ServiceError> {
        let watch = timer.subscribe()?;
        let shown = timer.start()?;
        Ok(Self {
            timer,
            watch,
            shown,
        })
    }

    /// What the display should show right now
    pub fn shown(&self) -> TimerSnapshot {
        self.shown
    }

    /// Apply one event. Returns the outcome once the run is over.
    pub fn step(&mut self, event: TrackEvent) -> Result<Option<Finish>, ServiceError> {
        let command = match event {
            TrackEvent::Key(key) => TrackCommand::for_key(&key),
            TrackEvent::Tick => None,
        };

        match command {
            Some(TrackCommand::Toggle) => {
                self.shown = if self.timer.snapshot()?.is_running() {
                    self.timer.pause()?
                } else {
                    self.timer.start()?
                };
            }
            Some(TrackCommand::Finish) => {
                let elapsed = self.timer.stop()?.unwrap_or_default();
                debug!(elapsed, "run finished");
                return Ok(Some(Finish::Save(elapsed)));
            }
            Some(TrackCommand::Discard) => {
                self.timer.stop()?;
                debug!("run discarded");
                return Ok(Some(Finish::Discard));
            }
            None => {
                if let Some(latest) = self.watch.latest() {
                    self.shown = latest;
                }
            }
        }
        Ok(None)
    }

    /// Drive the run from `runner` until it ends, calling `draw` after every
    /// event that leaves it going.
    pub fn run<E, T, F>(
        mut self,
        runner: &Runner<E, T>,
        mut draw: F,
    ) -> Result<Finish, TrackError>
    where
        E: TrackEventSource,
        T: Ticker,
        F: FnMut(&TimerSnapshot) -> io::Result<()>,
    {
        draw(&self.shown)?;
        loop {
            if let Some(finish) = self.step(runner.step())? {
                return Ok(finish);
            }
            draw(&self.shown)?;
        }
    }
}
