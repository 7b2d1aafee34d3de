use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};

/// Countdown that reports the remaining count once per `period` and calls
/// `on_expire` after the count reaches zero. Dropping the handle cancels it.
pub struct VerificationTimer {
    task: JoinHandle<()>,
}

impl VerificationTimer {
    /// Must be called from within a tokio runtime.
    pub fn start<T, E>(seconds: u32, period: Duration, mut on_tick: T, on_expire: E) -> Self
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            let mut remaining = seconds;
            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                on_tick(remaining);
            }
            on_expire();
        });
        Self { task }
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for VerificationTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use tokio::sync::mpsc;

    use super::*;

    fn recording_timer(
        seconds: u32,
    ) -> (
        VerificationTimer,
        mpsc::UnboundedReceiver<u32>,
        Arc<AtomicBool>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let expired = Arc::new(AtomicBool::new(false));
        let expired_flag = expired.clone();
        let timer = VerificationTimer::start(
            seconds,
            Duration::from_secs(1),
            move |remaining| {
                let _ = tx.send(remaining);
            },
            move || expired_flag.store(true, Ordering::SeqCst),
        );
        (timer, rx, expired)
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_period_then_expires() {
        let (timer, mut rx, expired) = recording_timer(3);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(rx.try_recv().ok(), Some(2));
        assert!(rx.try_recv().is_err());
        assert!(!expired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv().ok(), Some(1));
        assert_eq!(rx.try_recv().ok(), Some(0));
        assert!(expired.load(Ordering::SeqCst));
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_ticks() {
        let (timer, mut rx, expired) = recording_timer(180);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let mut ticks = Vec::new();
        while let Ok(remaining) = rx.try_recv() {
            ticks.push(remaining);
        }
        assert_eq!(ticks, vec![179, 178]);
        assert!(!expired.load(Ordering::SeqCst));
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_countdown() {
        let (timer, mut rx, _expired) = recording_timer(5);
        drop(timer);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_expires_without_ticking() {
        let (_timer, mut rx, expired) = recording_timer(0);
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(expired.load(Ordering::SeqCst));
        assert!(rx.recv().await.is_none());
    }
}
