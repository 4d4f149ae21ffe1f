use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Set whose members expire a fixed time after they were last inserted.
#[derive(Debug, Clone)]
pub struct TimeWindowedSet<T> {
    window: Duration,
    entries: HashMap<T, Instant>,
}

impl<T: Eq + Hash> TimeWindowedSet<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records `item` now, refreshing its timestamp if already present.
    pub fn insert(&mut self, item: T) {
        self.insert_at(item, Instant::now());
    }

    pub fn insert_at(&mut self, item: T, at: Instant) {
        self.entries.insert(item, at);
    }

    pub fn contains(&self, item: &T) -> bool {
        self.contains_at(item, Instant::now())
    }

    pub fn contains_at(&self, item: &T, now: Instant) -> bool {
        self.entries
            .get(item)
            .map(|at| now.saturating_duration_since(*at) < self.window)
            .unwrap_or(false)
    }

    /// Drops expired members.
    pub fn prune(&mut self) {
        let now = Instant::now();
        let window = self.window;
        self.entries
            .retain(|_, at| now.saturating_duration_since(*at) < window);
    }

    /// Live members.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .values()
            .filter(|at| now.saturating_duration_since(**at) < self.window)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries held, expired ones included until the next [`prune`](Self::prune).
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn members_expire_after_the_window() {
        let mut set = TimeWindowedSet::new(Duration::from_millis(7000));
        set.insert("click #a");
        assert!(set.contains(&"click #a"));
        assert!(!set.contains(&"click #b"));

        tokio::time::advance(Duration::from_millis(6999)).await;
        assert!(set.contains(&"click #a"));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!set.contains(&"click #a"));
        assert!(set.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reinsert_slides_the_window() {
        let mut set = TimeWindowedSet::new(Duration::from_secs(5));
        set.insert(1);
        tokio::time::advance(Duration::from_secs(4)).await;
        set.insert(1);
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(set.contains(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn prune_forgets_expired_entries() {
        let mut set = TimeWindowedSet::new(Duration::from_secs(1));
        set.insert(1);
        tokio::time::advance(Duration::from_secs(2)).await;
        set.insert(2);
        set.prune();
        assert_eq!(set.tracked(), 1);
        assert_eq!(set.len(), 1);
    }
}
