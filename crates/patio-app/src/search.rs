// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

pub const DEFAULT_MIN_QUERY_LENGTH: usize = 2;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_RECENT_SEARCHES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub min_query_length: usize,
    pub debounce: Duration,
    pub max_recent: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            debounce: DEFAULT_SEARCH_DEBOUNCE,
            max_recent: DEFAULT_MAX_RECENT_SEARCHES,
        }
    }
}

impl SearchSettings {
    pub fn accepts(&self, input: &str) -> bool {
        input.trim().chars().count() >= self.min_query_length
    }
}

/// Most-recent-first list of submitted searches. Re-submitting a query that
/// is already present leaves the list untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSearches {
    entries: Vec<String>,
    cap: usize,
}

impl Default for RecentSearches {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECENT_SEARCHES)
    }
}

impl RecentSearches {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap: cap.max(1),
        }
    }

    pub fn from_stored(stored: Vec<String>, cap: usize) -> Self {
        let mut recent = Self::new(cap);
        for entry in stored {
            let entry = entry.trim().to_owned();
            if entry.is_empty() || recent.entries.contains(&entry) {
                continue;
            }
            if recent.entries.len() == recent.cap {
                break;
            }
            recent.entries.push(entry);
        }
        recent
    }

    /// Returns `true` when the list changed.
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() || self.entries.iter().any(|entry| entry == query) {
            return false;
        }
        self.entries.insert(0, query.to_owned());
        self.entries.truncate(self.cap);
        true
    }

    pub fn remove(&mut self, query: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != query);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trailing-edge debounce driven by explicit instants. Each `call` pushes
/// the deadline out; `poll` hands back the latest value once it passes.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    wait: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    pub fn call(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.wait, value));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => {
                self.pending.take().map(|(_, value)| value)
            }
            _ => None,
        }
    }
}

/// Feeds keystrokes into a debouncer, cancelling when the input is too short.
pub fn schedule_autocomplete(
    debouncer: &mut Debouncer<String>,
    settings: &SearchSettings,
    input: &str,
    now: Instant,
) -> bool {
    if settings.accepts(input) {
        debouncer.call(input.trim().to_owned(), now);
        true
    } else {
        debouncer.cancel();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{Debouncer, RecentSearches, SearchSettings, schedule_autocomplete};
    use std::time::{Duration, Instant};

    #[test]
    fn debounce_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.call("ab", start);
        debouncer.call("abc", start + Duration::from_millis(100));
        debouncer.call("abcd", start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(450)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(500)),
            Some("abcd")
        );
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn short_input_cancels_pending_call() {
        let start = Instant::now();
        let settings = SearchSettings::default();
        let mut debouncer = Debouncer::new(settings.debounce);

        assert!(schedule_autocomplete(&mut debouncer, &settings, "gol", start));
        assert!(debouncer.is_pending());
        assert!(!schedule_autocomplete(&mut debouncer, &settings, " g ", start));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn recent_searches_do_not_promote_duplicates() {
        let mut recent = RecentSearches::new(5);
        assert!(recent.record("a"));
        assert!(recent.record("b"));
        assert!(!recent.record("a"));
        assert_eq!(recent.entries(), ["b", "a"]);
    }

    #[test]
    fn recent_searches_are_capped() {
        let mut recent = RecentSearches::new(3);
        for query in ["1", "2", "3", "4"] {
            recent.record(query);
        }
        assert_eq!(recent.entries(), ["4", "3", "2"]);
        assert!(recent.remove("3"));
        assert!(!recent.remove("3"));
        assert_eq!(recent.entries(), ["4", "2"]);
    }

    #[test]
    fn stored_recent_searches_are_cleaned() {
        let recent = RecentSearches::from_stored(
            vec![
                "x".to_owned(),
                " ".to_owned(),
                "x".to_owned(),
                "y".to_owned(),
                "z".to_owned(),
            ],
            2,
        );
        assert_eq!(recent.entries(), ["x", "y"]);
    }
}
