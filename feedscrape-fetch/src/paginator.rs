//! Cursor-based pagination loop.
//!
//! The paginator walks a timeline from the start cursor until the source
//! returns an empty cursor:
//!
//! 1. fetch one page with the current cursor
//! 2. hand every post to the sink, then flush it
//! 3. count the request; pause via the governor once the budget is used up
//! 4. stop if the next cursor is empty
//!
//! A fetch error ends the run; everything written before it stays written.
//! A failed record write only loses that record.

use feedscrape_core::{Cursor, PostRecord, RecordSink};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::governor::{RateLimitGovernor, RateLimitPolicy};
use crate::source::{DEFAULT_PAGE_SIZE, PostSource};

// ============================================================================
// Pagination State
// ============================================================================

/// Mutable counters of a running pagination loop.
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Cursor sent with the next request.
    pub cursor: Cursor,
    /// Requests since the last governor pause.
    pub requests_made: u32,
    /// Posts received so far.
    pub total_fetched: u64,
    /// Pages received so far.
    pub pages: u64,
    /// Records the sink accepted.
    pub rows_written: u64,
    /// Records the sink rejected.
    pub rows_failed: u64,
}

// ============================================================================
// Pagination Report
// ============================================================================

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The source returned an empty cursor.
    Exhausted,
    /// A page fetch failed; the message is the error's display form.
    FetchFailed(String),
}

/// Outcome of a pagination run.
#[derive(Debug, Clone)]
pub struct PaginationReport {
    /// Posts received from the source.
    pub total_fetched: u64,
    /// Records the sink accepted.
    pub rows_written: u64,
    /// Records the sink rejected.
    pub rows_failed: u64,
    /// Successful page fetches.
    pub pages: u64,
    /// Governor pauses taken.
    pub pauses: u32,
    /// Cursor of the page that would have come next.
    pub last_cursor: Cursor,
    /// Why the loop stopped.
    pub stop: StopReason,
    /// Wall time of the run.
    pub duration: Duration,
}

impl PaginationReport {
    /// Returns true if the whole timeline was read.
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Exhausted
    }
}

// ============================================================================
// Paginator
// ============================================================================

/// Drives a [`PostSource`] until its timeline is exhausted.
pub struct Paginator<'a, S: ?Sized> {
    source: &'a S,
    governor: RateLimitGovernor,
    page_size: u32,
}

impl<'a, S: PostSource + ?Sized> Paginator<'a, S> {
    /// Creates a paginator with the default page size and rate-limit policy.
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            governor: RateLimitGovernor::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the number of posts requested per page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the rate-limit policy.
    pub fn with_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.governor = RateLimitGovernor::new(policy);
        self
    }

    /// Fetches `handle`'s timeline page by page into `sink`.
    #[instrument(skip(self, sink), fields(page_size = self.page_size))]
    pub async fn run<K: RecordSink>(&mut self, handle: &str, sink: &mut K) -> PaginationReport {
        let start = Instant::now();
        let mut state = PaginationState::default();

        let stop = loop {
            debug!(cursor = %state.cursor, "Fetching page");

            let page = match self
                .source
                .fetch_page(handle, self.page_size, state.cursor.clone())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, page = state.pages + 1, "Fetching page failed, stopping");
                    break StopReason::FetchFailed(e.to_string());
                }
            };

            write_page(sink, &page.posts, &mut state);

            state.total_fetched += page.posts.len() as u64;
            state.requests_made += 1;
            state.pages += 1;
            state.cursor = page.next_cursor;

            info!(
                page = state.pages,
                count = page.posts.len(),
                total = state.total_fetched,
                "Page saved"
            );

            if self.governor.should_pause(state.requests_made) {
                self.governor.pause(state.total_fetched).await;
                state.requests_made = 0;
            }

            if state.cursor.is_end() {
                info!("No more posts to fetch");
                break StopReason::Exhausted;
            }
        };

        PaginationReport {
            total_fetched: state.total_fetched,
            rows_written: state.rows_written,
            rows_failed: state.rows_failed,
            pages: state.pages,
            pauses: self.governor.pauses(),
            last_cursor: state.cursor,
            stop,
            duration: start.elapsed(),
        }
    }
}

/// Writes one page and flushes the sink.
fn write_page<K: RecordSink>(sink: &mut K, posts: &[PostRecord], state: &mut PaginationState) {
    for post in posts {
        match sink.write_record(post) {
            Ok(()) => state.rows_written += 1,
            Err(e) => {
                warn!(id = %post.id, error = %e, "Failed to write record, skipping");
                state.rows_failed += 1;
            }
        }
    }

    if let Err(e) = sink.flush() {
        warn!(error = %e, "Failed to flush records");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::source::Credentials;
    use async_trait::async_trait;
    use feedscrape_core::Page;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves scripted pages and records every call.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<Page, FetchError>>>,
        calls: Mutex<Vec<(Cursor, tokio::time::Instant)>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page, FetchError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn cursors(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(c, _)| c.as_str().to_string())
                .collect()
        }

        fn call_times(&self) -> Vec<tokio::time::Instant> {
            self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    #[async_trait]
    impl PostSource for ScriptedSource {
        async fn login(&self, _credentials: &Credentials) -> Result<(), FetchError> {
            Ok(())
        }

        async fn fetch_page(
            &self,
            _handle: &str,
            _page_size: u32,
            cursor: Cursor,
        ) -> Result<Page, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((cursor, tokio::time::Instant::now()));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::InvalidResponse("script exhausted".into())))
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("rejected {0}")]
    struct Rejected(String);

    /// Collects records; rejects ids listed in `reject`.
    #[derive(Default)]
    struct MemorySink {
        records: Vec<PostRecord>,
        flushes: usize,
        reject: Vec<String>,
    }

    impl RecordSink for MemorySink {
        type Error = Rejected;

        fn write_record(&mut self, record: &PostRecord) -> Result<(), Self::Error> {
            if self.reject.contains(&record.id) {
                return Err(Rejected(record.id.clone()));
            }
            self.records.push(record.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn post(id: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn page(ids: &[&str], next: &str) -> Result<Page, FetchError> {
        Ok(Page::new(ids.iter().map(|id| post(id)).collect(), next))
    }

    #[tokio::test]
    async fn test_single_post_then_empty_cursor() {
        let source = ScriptedSource::new(vec![
            Ok(Page::new(
                vec![PostRecord {
                    id: "1".to_string(),
                    likes: 5,
                    ..Default::default()
                }],
                "c2",
            )),
            page(&[], ""),
        ]);
        let mut sink = MemorySink::default();

        let report = Paginator::new(&source).run("someone", &mut sink).await;

        assert_eq!(source.cursors(), vec!["", "c2"]);
        assert_eq!(report.total_fetched, 1);
        assert_eq!(report.pages, 2);
        assert!(report.is_complete());
        assert_eq!(sink.records[0].likes, 5);
    }

    #[tokio::test]
    async fn test_n_pages_write_every_record() {
        let source = ScriptedSource::new(vec![
            page(&["1", "2", "3"], "a"),
            page(&["4", "5"], "b"),
            page(&["6"], "c"),
            page(&["7", "8"], ""),
        ]);
        let mut sink = MemorySink::default();

        let report = Paginator::new(&source).run("someone", &mut sink).await;

        assert_eq!(source.cursors(), vec!["", "a", "b", "c"]);
        assert_eq!(report.pages, 4);
        assert_eq!(report.total_fetched, 8);
        assert_eq!(report.rows_written, 8);
        assert_eq!(sink.records.len(), 8);
        assert_eq!(sink.flushes, 4, "sink must be flushed once per page");
        assert_eq!(report.last_cursor, Cursor::start());
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_earlier_pages() {
        let source = ScriptedSource::new(vec![
            page(&["1", "2"], "a"),
            page(&["3"], "b"),
            Err(FetchError::RateLimited { retry_after: None }),
            page(&["never"], ""),
        ]);
        let mut sink = MemorySink::default();

        let report = Paginator::new(&source).run("someone", &mut sink).await;

        assert_eq!(source.cursors().len(), 3, "no request after the failure");
        let ids: Vec<_> = sink.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(report.total_fetched, 3);
        assert!(matches!(report.stop, StopReason::FetchFailed(_)));
        assert_eq!(report.last_cursor, Cursor::from("b"));
    }

    #[tokio::test]
    async fn test_error_on_first_page_writes_nothing() {
        let source = ScriptedSource::new(vec![Err(FetchError::UserNotFound("ghost".into()))]);
        let mut sink = MemorySink::default();

        let report = Paginator::new(&source).run("ghost", &mut sink).await;

        assert!(sink.records.is_empty());
        assert_eq!(sink.flushes, 0);
        assert_eq!(report.pages, 0);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_failed_record_is_skipped() {
        let source = ScriptedSource::new(vec![page(&["1", "2", "3"], "a"), page(&["4"], "")]);
        let mut sink = MemorySink {
            reject: vec!["2".to_string()],
            ..Default::default()
        };

        let report = Paginator::new(&source).run("someone", &mut sink).await;

        assert_eq!(report.total_fetched, 4);
        assert_eq!(report.rows_written, 3);
        assert_eq!(report.rows_failed, 1);
        assert_eq!(source.cursors().len(), 2);
        assert!(report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_governor_pauses_once_before_request_141() {
        let mut pages: Vec<_> = (0..141).map(|i| page(&["x"], &format!("c{}", i + 1))).collect();
        pages.push(page(&[], ""));
        let source = ScriptedSource::new(pages);
        let mut sink = MemorySink::default();

        let report = Paginator::new(&source).run("someone", &mut sink).await;

        assert_eq!(report.pauses, 1);
        assert_eq!(report.pages, 142);

        let times = source.call_times();
        let pause = crate::governor::DEFAULT_PAUSE;
        // Calls 1..=140 happen back to back, call 141 only after the pause.
        assert!(times[139] - times[0] < pause);
        assert!(times[140] - times[139] >= pause);
        assert!(times[141] - times[140] < pause);
    }

    #[tokio::test(start_paused = true)]
    async fn test_governor_resets_counter_after_pause() {
        let policy = RateLimitPolicy::new(2, Duration::from_secs(60));
        let mut pages: Vec<_> = (0..5).map(|i| page(&["x"], &format!("c{i}"))).collect();
        pages.push(page(&["x"], ""));
        let source = ScriptedSource::new(pages);
        let mut sink = MemorySink::default();

        let report = Paginator::new(&source)
            .with_policy(policy)
            .run("someone", &mut sink)
            .await;

        // 6 requests with a budget of 2: pauses after requests 2, 4 and 6.
        assert_eq!(report.pages, 6);
        assert_eq!(report.pauses, 3);
    }
}
