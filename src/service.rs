//! Long-lived owner of the session timer.
//!
//! The timer lives on its own thread and is the only thing that mutates it.
//! Front ends talk to it through a cloneable [`TimerHandle`] and watch it
//! through [`Subscription`]s, which can come and go without disturbing the
//! run in progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::runtime::Ticker;
use crate::timer::{Timer, TimerSnapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("timer service is no longer running")]
    Disconnected,
}

enum Command {
    Start(Sender<TimerSnapshot>),
    Pause(Sender<TimerSnapshot>),
    Stop(Sender<Option<u64>>),
    Snapshot(Sender<TimerSnapshot>),
    Subscribe(u64, Sender<TimerSnapshot>),
    Unsubscribe(u64),
}

pub struct TimerService;

impl TimerService {
    /// Spawn the timer thread. It runs until every handle and subscription
    /// has been dropped.
    pub fn spawn<C: Clock, T: Ticker>(clock: C, ticker: T) -> TimerHandle {
        let (tx, rx) = mpsc::channel();
        let tick = ticker.interval();
        thread::spawn(move || Actor::new(Timer::new(clock)).run(rx, tick));
        TimerHandle {
            tx,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

struct Actor<C: Clock> {
    timer: Timer<C>,
    subscribers: Vec<(u64, Sender<TimerSnapshot>)>,
}

impl<C: Clock> Actor<C> {
    fn new(timer: Timer<C>) -> Self {
        Self {
            timer,
            subscribers: Vec::new(),
        }
    }

    fn run(mut self, rx: Receiver<Command>, tick: Duration) {
        loop {
            match rx.recv_timeout(tick) {
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {
                    // ticks only prompt observers to re-read the clock
                    if self.timer.snapshot().is_running() {
                        self.broadcast();
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("timer service stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start(reply) => {
                match self.timer.start() {
                    Ok(()) => self.broadcast(),
                    Err(e) => debug!("ignored: {e}"),
                }
                let _ = reply.send(self.timer.snapshot());
            }
            Command::Pause(reply) => {
                match self.timer.pause() {
                    Ok(()) => self.broadcast(),
                    Err(e) => debug!("ignored: {e}"),
                }
                let _ = reply.send(self.timer.snapshot());
            }
            Command::Stop(reply) => {
                let elapsed = match self.timer.stop() {
                    Ok(secs) => {
                        self.broadcast();
                        Some(secs)
                    }
                    Err(e) => {
                        debug!("ignored: {e}");
                        None
                    }
                };
                let _ = reply.send(elapsed);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.timer.snapshot());
            }
            Command::Subscribe(id, sink) => {
                if sink.send(self.timer.snapshot()).is_ok() {
                    debug!(id, "observer attached");
                    self.subscribers.push((id, sink));
                }
            }
            Command::Unsubscribe(id) => {
                self.subscribers.retain(|(sid, _)| *sid != id);
                debug!(id, "observer detached");
            }
        }
    }

    fn broadcast(&mut self) {
        let snapshot = self.timer.snapshot();
        self.subscribers
            .retain(|(_, sink)| sink.send(snapshot).is_ok());
    }
}

/// Cloneable command side of the timer service
#[derive(Clone)]
pub struct TimerHandle {
    tx: Sender<Command>,
    next_id: Arc<AtomicU64>,
}

impl TimerHandle {
    /// Start a fresh run from idle, or resume a paused one. A no-op while
    /// already running. Returns the state after the command.
    pub fn start(&self) -> Result<TimerSnapshot, ServiceError> {
        self.request(Command::Start)
    }

    /// Pause a running timer. A no-op in any other state.
    pub fn pause(&self) -> Result<TimerSnapshot, ServiceError> {
        self.request(Command::Pause)
    }

    /// Finish the run and return its elapsed seconds, or `None` if the timer
    /// was idle.
    pub fn stop(&self) -> Result<Option<u64>, ServiceError> {
        self.request(Command::Stop)
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot, ServiceError> {
        self.request(Command::Snapshot)
    }

    /// Attach an observer. The first value it receives is the current state.
    pub fn subscribe(&self) -> Result<Subscription, ServiceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sink, rx) = mpsc::channel();
        self.tx
            .send(Command::Subscribe(id, sink))
            .map_err(|_| ServiceError::Disconnected)?;
        Ok(Subscription {
            id,
            rx,
            tx: self.tx.clone(),
        })
    }

    fn request<R>(&self, make: impl FnOnce(Sender<R>) -> Command) -> Result<R, ServiceError> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| ServiceError::Disconnected)?;
        rx.recv().map_err(|_| ServiceError::Disconnected)
    }
}

/// Detachable observer of the timer. Dropping it detaches.
pub struct Subscription {
    id: u64,
    rx: Receiver<TimerSnapshot>,
    tx: Sender<Command>,
}

impl Subscription {
    pub fn recv_timeout(&self, timeout: Duration) -> Option<TimerSnapshot> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain everything pushed so far and return the newest value.
    pub fn latest(&self) -> Option<TimerSnapshot> {
        self.rx.try_iter().last()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Unsubscribe(self.id));
    }
}
