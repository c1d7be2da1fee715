use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use shop_core::Msg;
use shop_logging::shop_debug;

use super::clock;

/// The single periodic trigger behind auto-update and auto-bump.
pub trait Scheduler {
    /// Starts ticking every `interval`, replacing any running trigger.
    fn arm(&mut self, interval: Duration);
    fn disarm(&mut self);
}

/// Runs the trigger on a background thread that posts `Msg::TimerFired`.
pub struct ThreadScheduler {
    msg_tx: mpsc::Sender<Msg>,
    ticker: Option<Ticker>,
}

/// Dropping the ticker stops its thread.
struct Ticker {
    _stop: mpsc::Sender<()>,
}

impl ThreadScheduler {
    pub fn new(msg_tx: mpsc::Sender<Msg>) -> Self {
        Self {
            msg_tx,
            ticker: None,
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn arm(&mut self, interval: Duration) {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if msg_tx.send(Msg::TimerFired { now: clock::now() }).is_err() {
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        shop_debug!("Timer armed every {:?}", interval);
        self.ticker = Some(Ticker { _stop: stop_tx });
    }

    fn disarm(&mut self) {
        if self.ticker.take().is_some() {
            shop_debug!("Timer disarmed");
        }
    }
}
