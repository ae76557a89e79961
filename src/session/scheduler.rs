//! Recurring refresh timer with cancel-before-start semantics

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Owns the background refresh task.
///
/// At most one task is live at a time: `start` aborts any previous task
/// before spawning the next one, under a single lock acquisition, so a burst
/// of starts cannot stack timers. Dropping the timer aborts whatever is still
/// running.
#[derive(Debug, Default)]
pub(crate) struct RefreshTimer {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshTimer {
    /// Spawn a task that waits `period`, calls `tick`, and repeats.
    ///
    /// `tick` resolving to `false` ends the task; the first wait happens
    /// before the first call, so nothing fires at start time.
    pub fn start<F, Fut>(&self, period: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send,
    {
        let mut slot = self.task.lock().unwrap();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if !tick().await {
                    break;
                }
            }
        }));
    }

    /// Abort the running task, if any, and clear the handle
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_tick(counter: &Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<bool> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(true)
        }
    }

    #[test]
    fn test_restart_aborts_previous_task() {
        tokio_test::block_on(async {
            let timer = RefreshTimer::default();
            let first = Arc::new(AtomicUsize::new(0));
            let second = Arc::new(AtomicUsize::new(0));

            timer.start(Duration::from_millis(40), counting_tick(&first));
            timer.start(Duration::from_millis(40), counting_tick(&second));

            tokio::time::sleep(Duration::from_millis(110)).await;

            assert_eq!(first.load(Ordering::SeqCst), 0);
            assert!(second.load(Ordering::SeqCst) >= 1);
        });
    }

    #[test]
    fn test_stop_prevents_further_ticks() {
        tokio_test::block_on(async {
            let timer = RefreshTimer::default();
            let counter = Arc::new(AtomicUsize::new(0));

            timer.start(Duration::from_millis(30), counting_tick(&counter));
            timer.stop();

            tokio::time::sleep(Duration::from_millis(100)).await;

            assert_eq!(counter.load(Ordering::SeqCst), 0);
        });
    }

    #[test]
    fn test_tick_returning_false_ends_task() {
        tokio_test::block_on(async {
            let timer = RefreshTimer::default();
            let counter = Arc::new(AtomicUsize::new(0));
            let tick_counter = Arc::clone(&counter);

            timer.start(Duration::from_millis(20), move || {
                tick_counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(false)
            });

            tokio::time::sleep(Duration::from_millis(120)).await;

            assert_eq!(counter.load(Ordering::SeqCst), 1);
            timer.stop();
        });
    }
}
