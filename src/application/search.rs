//! Debounced search input.
//!
//! Keystrokes go into a [`SearchInput`]; a [`DebouncedSearch`] yields the
//! trimmed term once the input has been quiet for [`SEARCH_DEBOUNCE`], and
//! never yields the same term twice in a row.

use std::time::Duration;
use tokio::sync::watch;

/// Quiet period before a search term is emitted
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Raw search box contents
#[derive(Debug)]
pub struct SearchInput {
    raw: watch::Sender<String>,
}

impl Default for SearchInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchInput {
    pub fn new() -> Self {
        let (raw, _) = watch::channel(String::new());
        Self { raw }
    }

    /// Replace the raw contents; every call counts as a keystroke.
    pub fn set(&self, raw: impl Into<String>) {
        self.raw.send_replace(raw.into());
    }

    pub fn clear(&self) {
        self.set(String::new());
    }

    pub fn current(&self) -> String {
        self.raw.borrow().clone()
    }

    /// Debounced view of this input, using [`SEARCH_DEBOUNCE`]
    pub fn debounced(&self) -> DebouncedSearch {
        self.debounced_with(SEARCH_DEBOUNCE)
    }

    pub fn debounced_with(&self, delay: Duration) -> DebouncedSearch {
        DebouncedSearch {
            rx: self.raw.subscribe(),
            delay,
            last: None,
        }
    }
}

/// Stream of settled, trimmed, de-duplicated search terms
#[derive(Debug)]
pub struct DebouncedSearch {
    rx: watch::Receiver<String>,
    delay: Duration,
    last: Option<String>,
}

impl DebouncedSearch {
    /// Wait for the next settled term.
    ///
    /// Returns `None` once the input has been dropped and everything typed
    /// before that has been delivered.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            self.rx.changed().await.ok()?;

            loop {
                tokio::select! {
                    changed = self.rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(self.delay) => break,
                }
            }

            let term = self.rx.borrow_and_update().trim().to_string();
            if self.last.as_deref() == Some(term.as_str()) {
                continue;
            }
            self.last = Some(term.clone());
            return Some(term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_emits_once_typing_settles() {
        let input = std::sync::Arc::new(SearchInput::new());
        let mut search = input.debounced();
        let typist = input.clone();
        let started = Instant::now();

        tokio::spawn(async move {
            typist.set("s");
            tokio::time::sleep(Duration::from_millis(50)).await;
            typist.set("sa");
            tokio::time::sleep(Duration::from_millis(50)).await;
            typist.set("sam ");
        });

        assert_eq!(search.next().await.as_deref(), Some("sam"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "emitted after {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(350), "emitted after {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_duplicates_are_suppressed() {
        let input = SearchInput::new();
        let mut search = input.debounced();

        input.set("apple");
        assert_eq!(search.next().await.as_deref(), Some("apple"));

        input.set("  apple ");
        let repeated = tokio::time::timeout(Duration::from_secs(1), search.next()).await;
        assert!(repeated.is_err());

        input.set("acer");
        assert_eq!(search.next().await.as_deref(), Some("acer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_emits_empty_term() {
        let input = SearchInput::new();
        let mut search = input.debounced();

        input.set("xiaomi");
        assert_eq!(search.next().await.as_deref(), Some("xiaomi"));

        input.clear();
        assert_eq!(search.next().await.as_deref(), Some(""));
        assert_eq!(input.current(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ends_when_input_is_dropped() {
        let input = SearchInput::new();
        let mut search = input.debounced_with(Duration::from_millis(10));

        input.set("last");
        drop(input);

        assert_eq!(search.next().await.as_deref(), Some("last"));
        assert_eq!(search.next().await, None);
    }
}
