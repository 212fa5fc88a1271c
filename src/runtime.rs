//! Input plumbing for the interactive stopwatch.
//!
//! Terminal keys are read on a background thread and handed to the `track`
//! loop through a channel. When no key arrives within one redraw interval
//! the loop gets a [`TrackEvent::Tick`] instead.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug)]
pub enum TrackEvent {
    Key(KeyEvent),
    Tick,
}

/// Where key presses come from
pub trait TrackEventSource: Send + 'static {
    fn next_key(&self, timeout: Duration) -> Result<KeyEvent, RecvTimeoutError>;
}

/// Key presses from the controlling terminal
pub struct CrosstermEventSource {
    rx: Receiver<KeyEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            match event::read() {
                // Windows reports releases too
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(key).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackEventSource for CrosstermEventSource {
    fn next_key(&self, timeout: Duration) -> Result<KeyEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Keys pushed by hand, for headless runs
pub struct TestEventSource {
    rx: Receiver<KeyEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<KeyEvent>) -> Self {
        Self { rx }
    }
}

impl TrackEventSource for TestEventSource {
    fn next_key(&self, timeout: Duration) -> Result<KeyEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How often idle loops wake up
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Constant interval, never shorter than one millisecond
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Merges key presses and redraw ticks into one stream
pub struct Runner<E: TrackEventSource, T: Ticker> {
    keys: E,
    ticker: T,
}

impl<E: TrackEventSource, T: Ticker> Runner<E, T> {
    pub fn new(keys: E, ticker: T) -> Self {
        Self { keys, ticker }
    }

    /// Wait at most one interval for a key. A closed source behaves like an
    /// idle one.
    pub fn step(&self) -> TrackEvent {
        self.keys
            .next_key(self.ticker.interval())
            .map_or(TrackEvent::Tick, TrackEvent::Key)
    }
}
