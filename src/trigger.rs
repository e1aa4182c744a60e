//! A background thread that ticks at a fixed period, for driving display
//! refreshes without a windowing toolkit.

use log::{debug, warn};
use std::{
    sync::mpsc::{self, TryRecvError},
    thread,
    time::{Duration, Instant},
};

/// One beat of a [ScheduledTrigger].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Counts up from 0
    pub index: u64,
    /// When the tick was sent
    pub at: Instant,
}

enum Signal {
    Stop,
}

/// Sends a [Tick] down a channel every `period` until stopped.
///
/// Ticks are scheduled against the start time, so a slow receiver delays
/// ticks but doesn't make the schedule drift. The thread also stops on its own
/// once the receiving end of the tick channel is dropped.
pub struct ScheduledTrigger {
    handle: Option<thread::JoinHandle<u64>>,
    tx: mpsc::Sender<Signal>,
    period: Duration,
}

impl ScheduledTrigger {
    /// Spawns the ticking thread. The first tick is sent immediately.
    pub fn start(period: Duration, ticks: mpsc::Sender<Tick>) -> Self {
        let (tx, rx) = mpsc::channel::<Signal>();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let mut index = 0;

            loop {
                match rx.try_recv() {
                    Ok(Signal::Stop) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                let tick = Tick {
                    index,
                    at: Instant::now(),
                };
                if ticks.send(tick).is_err() {
                    debug!("Tick receiver dropped after {} ticks", index);
                    break;
                }
                index += 1;

                let next = start + period.saturating_mul(index.min(u64::from(u32::MAX)) as u32);
                spin_sleep::sleep(next.saturating_duration_since(Instant::now()));
            }

            index
        });

        ScheduledTrigger {
            handle: Some(handle),
            tx,
            period,
        }
    }

    #[allow(missing_docs)]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stops the thread and waits for it. Returns the number of ticks sent,
    /// or `None` if the trigger was already stopped.
    pub fn stop(&mut self) -> Option<u64> {
        let handle = self.handle.take()?;
        // a send error means the thread has already exited
        let _ = self.tx.send(Signal::Stop);
        match handle.join() {
            Ok(count) => Some(count),
            Err(_) => {
                warn!("Trigger thread panicked");
                None
            }
        }
    }
}

impl Drop for ScheduledTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_in_order_until_stopped() {
        let (tx, rx) = mpsc::channel();
        let mut trigger = ScheduledTrigger::start(Duration::from_millis(2), tx);

        let ticks: Vec<Tick> = rx.iter().take(5).collect();
        let indices: Vec<u64> = ticks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(ticks.windows(2).all(|w| w[0].at <= w[1].at));

        let sent = trigger.stop().unwrap();
        assert!(sent >= 5);
        assert_eq!(trigger.stop(), None);
    }

    #[test]
    fn keeps_to_the_period() {
        let (tx, rx) = mpsc::channel();
        let trigger = ScheduledTrigger::start(Duration::from_millis(10), tx);
        let ticks: Vec<Tick> = rx.iter().take(4).collect();
        drop(trigger);

        let elapsed = ticks[3].at - ticks[0].at;
        assert!(elapsed >= Duration::from_millis(29), "{:?}", elapsed);
    }

    #[test]
    fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel();
        let mut trigger = ScheduledTrigger::start(Duration::from_millis(1), tx);
        assert_eq!(rx.recv().unwrap().index, 0);
        drop(rx);
        assert!(trigger.stop().is_some());
    }
}
