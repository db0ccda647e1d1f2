//! Trailing-edge debounce keyed by path.
//!
//! Every event pushes the path's deadline out by the window; a path is due
//! once it has been quiet for the whole window.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub(crate) struct Debouncer {
    window: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    pub(crate) fn touch(&mut self, path: &Path, now: Instant) {
        self.pending.insert(path.to_path_buf(), now + self.window);
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every path whose deadline has passed.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut due: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &due {
            self.pending.remove(path);
        }
        due.sort();
        due
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub(crate) async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::advance;

    use super::*;

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn rapid_saves_collapse_into_one_publish() {
        let mut debounce = Debouncer::new(Duration::from_millis(100));
        let path = PathBuf::from("/tmp/catalog.json");
        let mut publishes = 0usize;

        for _ in 0..5 {
            debounce.touch(&path, Instant::now());
            publishes += debounce.take_due(Instant::now()).len();
            advance(Duration::from_millis(10)).await;
        }
        assert_eq!(publishes, 0, "nothing is due while saves keep arriving");

        sleep_until(debounce.next_deadline()).await;
        publishes += debounce.take_due(Instant::now()).len();
        assert_eq!(publishes, 1, "rapid saves should collapse to one publish");
        assert!(debounce.next_deadline().is_none());
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn paths_are_debounced_independently() {
        let mut debounce = Debouncer::new(Duration::from_millis(100));
        let a = PathBuf::from("/tmp/a.json");
        let b = PathBuf::from("/tmp/b.json");

        debounce.touch(&a, Instant::now());
        advance(Duration::from_millis(60)).await;
        debounce.touch(&b, Instant::now());
        advance(Duration::from_millis(50)).await;

        assert_eq!(debounce.take_due(Instant::now()), vec![a]);
        advance(Duration::from_millis(60)).await;
        assert_eq!(debounce.take_due(Instant::now()), vec![b]);
    }
}
