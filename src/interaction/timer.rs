// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A scheduled task that delivers a signal back to its owner. Dropping the timer
/// cancels it, so a timer can never outlive the state that owns it.
#[derive(Debug)]
pub struct Timer {
    handle: JoinHandle<()>,
}

impl Timer {
    /// Sends the value once after the delay.
    pub fn once<T>(delay: Duration, tx: UnboundedSender<T>, value: T) -> Timer
    where
        T: Send + 'static,
    {
        Timer {
            handle: tokio::spawn(async move {
                time::sleep(delay).await;
                let _ = tx.send(value);
            }),
        }
    }

    /// Sends a copy of the value every period, starting one period from now.
    pub fn every<T>(period: Duration, tx: UnboundedSender<T>, value: T) -> Timer
    where
        T: Clone + Send + 'static,
    {
        Timer {
            handle: tokio::spawn(async move {
                let mut interval = time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    if tx.send(value.clone()).is_err() {
                        return;
                    }
                }
            }),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _timer = Timer::once(Duration::from_millis(300), tx, 7);

        time::sleep(Duration::from_millis(299)).await;
        assert!(rx.try_recv().is_err());
        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv().unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = Timer::every(Duration::from_millis(37), tx, "tick");

        time::sleep(Duration::from_millis(120)).await;
        let mut ticks = 0;
        while rx.try_recv().is_ok() {
            ticks += 1;
        }
        assert_eq!(ticks, 3);

        drop(timer);
        time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = Timer::once(Duration::from_millis(300), tx, 1);
        drop(timer);

        time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
