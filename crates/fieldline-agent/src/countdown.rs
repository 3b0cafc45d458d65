use fieldline_core::time::{now_ms, EpochMs};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};

/// Handle to a running ETA countdown. Dropping it without calling
/// [`cancel`](Countdown::cancel) aborts the task as well, so a torn-down
/// screen cannot leak the timer.
pub struct Countdown {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Stop ticking. Called when the visit starts or the view goes away.
    pub async fn cancel(mut self) {
        let _ = self.stop.send(true);
        // Await by reference: the handle cannot be moved out of a type with
        // a Drop impl. Drop then aborts a task that has already finished.
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Re-evaluate the remaining seconds to `target_ms` once per second, handing
/// each value to `on_tick`. The deadline is anchored to the monotonic clock
/// at spawn, so a wall-clock jump cannot make the countdown run backwards.
/// The value floors at zero and keeps reporting zero until cancelled.
pub fn spawn_countdown<F>(target_ms: EpochMs, mut on_tick: F) -> Countdown
where
    F: FnMut(u64) + Send + 'static,
{
    let remaining_ms = (target_ms - now_ms()).max(0) as u64;
    let deadline = Instant::now() + Duration::from_millis(remaining_ms);
    let (stop, mut stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    on_tick((left.as_millis() as u64).div_ceil(1000));
                }
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    Countdown { stop, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn ticks_decrease_and_floor_at_zero() {
        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let target = now_ms() + 3_000;
        let countdown = spawn_countdown(target, move |r| sink.lock().unwrap().push(r));

        tokio::time::sleep(Duration::from_secs(6)).await;
        countdown.cancel().await;

        let ticks = seen.lock().unwrap().clone();
        assert!(ticks.len() >= 4);
        for pair in ticks.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(*ticks.last().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_consumes_the_handle_cleanly() {
        // Cancelling must join the task even when the countdown already
        // bottomed out at zero.
        let countdown = spawn_countdown(now_ms() + 1_000, |_| {});
        tokio::time::sleep(Duration::from_secs(3)).await;
        countdown.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticking() {
        let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let countdown = spawn_countdown(now_ms() + 60_000, move |r| sink.lock().unwrap().push(r));
        tokio::time::sleep(Duration::from_secs(2)).await;
        countdown.cancel().await;

        let after_cancel = seen.lock().unwrap().len();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(seen.lock().unwrap().len(), after_cancel);
    }
}
