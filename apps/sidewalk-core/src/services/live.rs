use chrono::{DateTime, Utc};
use futures::future::ready;
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{FetchError, SubscriptionError};
use crate::services::readings::{Reading, ReadingSource, RecentQuery};
use crate::views::cards::{reading_cards, ReadingCard};
use crate::views::stats::BatchSummary;

/// Channel the `sidewalk_data` insert trigger notifies on.
pub const NOTIFY_CHANNEL: &str = "sidewalk_data_inserts";

/// One step applied to a live working set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum WorkingSetEvent {
    /// Bulk load result; replaces the whole set.
    Replace(Vec<Reading>),
    /// A single newly inserted reading.
    Prepend(Reading),
}

/// Bounded most-recent-first sequence of readings.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    cap: usize,
    dedupe_by_id: bool,
    rows: Vec<Reading>,
}

impl WorkingSet {
    pub fn new(cap: usize, dedupe_by_id: bool) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            dedupe_by_id,
            rows: Vec::with_capacity(cap),
        }
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn replace(&mut self, mut rows: Vec<Reading>) {
        rows.truncate(self.cap);
        self.rows = rows;
    }

    pub fn prepend(&mut self, reading: Reading) {
        if self.dedupe_by_id {
            self.rows.retain(|row| row.id != reading.id);
        }
        self.rows.insert(0, reading);
        self.rows.truncate(self.cap);
    }

    pub fn apply(&mut self, event: WorkingSetEvent) {
        match event {
            WorkingSetEvent::Replace(rows) => self.replace(rows),
            WorkingSetEvent::Prepend(reading) => self.prepend(reading),
        }
    }
}

/// Process-wide fan-out of insert notifications.
#[derive(Clone)]
pub struct LiveFeed {
    sender: broadcast::Sender<Reading>,
}

impl LiveFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers that will see the reading.
    pub fn publish(&self, reading: Reading) -> usize {
        self.sender.send(reading).unwrap_or(0)
    }

    pub fn subscribe(&self) -> LiveSubscription {
        LiveSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Forwards `NOTIFY sidewalk_data_inserts` payloads into the feed until
    /// cancelled. A listener that fails is logged and not restarted.
    pub fn start_listener(&self, pool: PgPool, cancel: CancellationToken) {
        let feed = self.clone();
        tokio::spawn(async move {
            if let Err(err) = run_listener(&feed, &pool, cancel).await {
                tracing::error!(error = %err, "live feed listener stopped");
            }
        });
    }

    fn publish_payload(&self, payload: &str) {
        match serde_json::from_str::<Reading>(payload) {
            Ok(reading) => {
                let delivered = self.publish(reading);
                tracing::debug!(delivered, "forwarded sidewalk insert");
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unparseable insert notification");
            }
        }
    }
}

async fn run_listener(
    feed: &LiveFeed,
    pool: &PgPool,
    cancel: CancellationToken,
) -> Result<(), SubscriptionError> {
    let listen_error = |source: sqlx::Error| SubscriptionError::Listen {
        channel: NOTIFY_CHANNEL.to_string(),
        source,
    };
    let mut listener = PgListener::connect_with(pool).await.map_err(listen_error)?;
    listener.listen(NOTIFY_CHANNEL).await.map_err(listen_error)?;
    tracing::info!(channel = NOTIFY_CHANNEL, "listening for sidewalk inserts");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(());
            }
            notification = listener.recv() => {
                let notification = notification.map_err(SubscriptionError::Stream)?;
                feed.publish_payload(notification.payload());
            }
        }
    }
}

/// One registered receiver on the live feed. Dropping or unsubscribing
/// unregisters it.
pub struct LiveSubscription {
    receiver: broadcast::Receiver<Reading>,
}

impl LiveSubscription {
    /// Next delivered reading, or `None` once the feed is gone. Lagging
    /// receivers skip what they missed and keep going.
    pub async fn recv(&mut self) -> Option<Reading> {
        loop {
            match self.receiver.recv().await {
                Ok(reading) => return Some(reading),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "live subscriber lagged; readings skipped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Reading> + Send + 'static {
        BroadcastStream::new(self.receiver).filter_map(|item| {
            ready(match item {
                Ok(reading) => Some(reading),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "live subscriber lagged; readings skipped");
                    None
                }
            })
        })
    }

    pub fn unsubscribe(self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    Loading,
    Empty,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub phase: ViewPhase,
    pub connected: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cards: Vec<ReadingCard>,
    pub summary: BatchSummary,
}

/// The live panel: a working set fed by one bulk load and then by inserts.
pub struct LiveView<S> {
    source: Arc<S>,
    feed: LiveFeed,
    query: RecentQuery,
    working: WorkingSet,
    phase: ViewPhase,
    connected: bool,
    last_update: Option<DateTime<Utc>>,
    last_error: Option<String>,
    /// Ids of the last bulk batch; inserts notified while it was loading
    /// are already in it.
    batch_ids: HashSet<Uuid>,
    disposed: CancellationToken,
}

impl<S: ReadingSource> LiveView<S> {
    pub fn new(source: Arc<S>, feed: LiveFeed, query: RecentQuery, working: WorkingSet) -> Self {
        Self {
            source,
            feed,
            query,
            working,
            phase: ViewPhase::Loading,
            connected: false,
            last_update: None,
            last_error: None,
            batch_ids: HashSet::new(),
            disposed: CancellationToken::new(),
        }
    }

    /// Subscribes, then yields one `Replace` from a fresh fetch followed by a
    /// `Prepend` per matching insert in delivery order. Inserts that land
    /// during the fetch are buffered by the subscription, not lost; `handle`
    /// skips the ones the fetch already returned. The stream ends when the
    /// view is disposed.
    pub fn events(
        &self,
    ) -> impl Stream<Item = Result<WorkingSetEvent, FetchError>> + Send + 'static {
        let inserts = self.feed.subscribe().into_stream();
        let source = self.source.clone();
        let fetch_query = self.query.clone();
        let filter_query = self.query.clone();

        let bulk = stream::once(async move {
            source
                .fetch_recent(&fetch_query)
                .await
                .map(WorkingSetEvent::Replace)
        });
        let inserts = inserts
            .filter(move |reading| ready(filter_query.matches(reading)))
            .map(|reading| Ok(WorkingSetEvent::Prepend(reading)));

        bulk.chain(inserts)
            .take_until(self.disposed.clone().cancelled_owned())
    }

    /// Applies one stream item and returns its kind: `replace`, `prepend`,
    /// `duplicate`, `error` or `discarded`.
    pub fn handle(&mut self, item: Result<WorkingSetEvent, FetchError>) -> &'static str {
        if self.is_disposed() {
            return "discarded";
        }
        match item {
            Ok(event) => {
                let kind = match &event {
                    WorkingSetEvent::Replace(rows) => {
                        self.batch_ids = rows.iter().map(|row| row.id).collect();
                        self.last_error = None;
                        "replace"
                    }
                    WorkingSetEvent::Prepend(reading) if self.batch_ids.contains(&reading.id) => {
                        tracing::debug!(id = %reading.id, "insert already in the loaded batch");
                        return "duplicate";
                    }
                    WorkingSetEvent::Prepend(_) => "prepend",
                };
                self.working.apply(event);
                self.connected = !self.working.is_empty();
                self.phase = if self.working.is_empty() {
                    ViewPhase::Empty
                } else {
                    ViewPhase::Ready
                };
                self.last_update = Some(Utc::now());
                kind
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load recent readings");
                if self.phase == ViewPhase::Loading {
                    self.phase = ViewPhase::Empty;
                }
                self.last_error = Some(err.to_string());
                "error"
            }
        }
    }

    /// Manual re-fetch; replaces the working set on success.
    pub async fn refresh(&mut self) -> &'static str {
        if self.is_disposed() {
            return "discarded";
        }
        let result = self
            .source
            .fetch_recent(&self.query)
            .await
            .map(WorkingSetEvent::Replace);
        self.handle(result)
    }

    /// Ends every stream from `events()`. Later results are ignored.
    pub fn dispose(&self) {
        if !self.disposed.is_cancelled() {
            tracing::debug!("live view disposed");
            self.disposed.cancel();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_cancelled()
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        let rows = self.working.rows();
        LiveSnapshot {
            phase: self.phase,
            connected: self.connected,
            last_update: self.last_update,
            last_error: self.last_error.clone(),
            cards: reading_cards(rows),
            summary: BatchSummary::from_readings(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{reading, MemoryReadingSource};
    use std::time::Duration;
    use tokio::time::timeout;

    fn ids(rows: &[Reading]) -> Vec<String> {
        rows.iter().map(|r| r.location.clone()).collect()
    }

    #[test]
    fn working_set_keeps_the_newest_cap_entries() {
        let mut set = WorkingSet::new(10, false);
        for n in 0..15 {
            set.prepend(reading(&format!("site-{n}"), 0.1, 80.0, 10, n));
        }
        assert_eq!(set.len(), 10);
        let expected: Vec<String> = (5..15).rev().map(|n| format!("site-{n}")).collect();
        assert_eq!(ids(set.rows()), expected);
    }

    #[test]
    fn replace_truncates_to_cap() {
        let mut set = WorkingSet::new(3, false);
        set.replace((0..5).map(|n| reading("a", 0.1, 80.0, 1, n)).collect());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn duplicates_are_kept_unless_dedupe_is_enabled() {
        let duplicate = reading("Jl. Veteran", 0.4, 85.0, 580, 0);

        let mut plain = WorkingSet::new(10, false);
        plain.prepend(duplicate.clone());
        plain.prepend(duplicate.clone());
        assert_eq!(plain.len(), 2);

        let mut deduped = WorkingSet::new(10, true);
        deduped.prepend(duplicate.clone());
        deduped.prepend(reading("Jl. Kartini", 0.4, 80.0, 460, 1));
        deduped.prepend(duplicate.clone());
        assert_eq!(ids(deduped.rows()), vec!["Jl. Veteran", "Jl. Kartini"]);
    }

    #[tokio::test]
    async fn subscription_skips_lagged_readings() {
        let feed = LiveFeed::new(2);
        let mut sub = feed.subscribe();
        for n in 0..5 {
            feed.publish(reading(&format!("site-{n}"), 0.1, 80.0, 1, n));
        }
        let first = sub.recv().await.expect("reading");
        assert_eq!(first.location, "site-3");
    }

    #[tokio::test]
    async fn events_replace_then_prepend_in_delivery_order() {
        let source = Arc::new(MemoryReadingSource::new(vec![
            reading("old-a", 0.5, 90.0, 100, 0),
            reading("old-b", 0.5, 90.0, 100, 1),
        ]));
        let feed = LiveFeed::new(16);
        let mut view = LiveView::new(
            source,
            feed.clone(),
            RecentQuery::latest(10),
            WorkingSet::new(3, false),
        );
        let mut events = Box::pin(view.events());

        // Published before the stream is polled; the early subscription keeps it.
        feed.publish(reading("new-1", 0.2, 75.0, 50, 10));

        let first = events.next().await.expect("bulk").expect("fetch ok");
        assert!(matches!(first, WorkingSetEvent::Replace(ref rows) if rows.len() == 2));
        assert_eq!(view.handle(Ok(first)), "replace");
        assert_eq!(view.phase(), ViewPhase::Ready);

        feed.publish(reading("new-2", 0.2, 75.0, 50, 11));
        for _ in 0..2 {
            let next = events.next().await.expect("insert");
            assert_eq!(view.handle(next), "prepend");
        }

        assert_eq!(
            ids(view.working_set().rows()),
            vec!["new-2", "new-1", "old-b"]
        );
        let snapshot = view.snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.cards.len(), 3);
    }

    #[tokio::test]
    async fn insert_notified_during_the_bulk_load_is_applied_once() {
        let row = reading("Jl. Ahmad Yani", 0.6, 90.0, 700, 0);
        let source = Arc::new(MemoryReadingSource::new(vec![row.clone()]));
        let feed = LiveFeed::new(16);
        let mut view = LiveView::new(
            source,
            feed.clone(),
            RecentQuery::latest(10),
            WorkingSet::new(10, false),
        );
        let mut events = Box::pin(view.events());

        // Committed before the fetch ran, so the batch already holds it.
        feed.publish(row.clone());

        let bulk = events.next().await.expect("bulk");
        assert_eq!(view.handle(bulk), "replace");
        let buffered = events.next().await.expect("insert");
        assert_eq!(view.handle(buffered), "duplicate");

        let later = reading("Jl. Ahmad Yani", 0.7, 91.0, 720, 1);
        feed.publish(later.clone());
        let next = events.next().await.expect("insert");
        assert_eq!(view.handle(next), "prepend");

        let ids: Vec<Uuid> = view.working_set().rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![later.id, row.id]);
    }

    #[test]
    fn apply_dispatches_replace_and_prepend() {
        let mut set = WorkingSet::new(2, false);
        set.apply(WorkingSetEvent::Replace(vec![
            reading("a", 0.1, 80.0, 1, 0),
            reading("b", 0.1, 80.0, 1, 1),
            reading("c", 0.1, 80.0, 1, 2),
        ]));
        assert_eq!(ids(set.rows()), vec!["a", "b"]);
        set.apply(WorkingSetEvent::Prepend(reading("d", 0.1, 80.0, 1, 3)));
        assert_eq!(ids(set.rows()), vec!["d", "a"]);
    }

    #[tokio::test]
    async fn notification_payloads_reach_subscribers() {
        let feed = LiveFeed::new(4);
        let mut sub = feed.subscribe();

        feed.publish_payload("not json at all");
        feed.publish_payload(
            r#"{"id":"6f1c2b1e-8a4d-4c5e-9f0a-2b3c4d5e6f70","lokasi":"Jl. Sudirman","kota":"Balikpapan","energi_harian":0.7,"efisiensi":88.5,"pejalan_kaki_per_hari":720,"latitude":-1.2654,"longitude":116.8312,"created_at":"2025-03-01T08:15:30.123456+00:00"}"#,
        );

        let received = timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("delivered")
            .expect("reading");
        assert_eq!(received.location, "Jl. Sudirman");
        assert_eq!(received.pedestrians_per_day, 720);
        assert_eq!(
            received.created_at.to_rfc3339(),
            "2025-03-01T08:15:30.123456+00:00"
        );
        assert!(timeout(Duration::from_millis(50), sub.recv()).await.is_err());
    }

    #[tokio::test]
    async fn location_filter_drops_other_sites() {
        let source = Arc::new(MemoryReadingSource::new(Vec::new()));
        let feed = LiveFeed::new(16);
        let view = LiveView::new(
            source,
            feed.clone(),
            RecentQuery::latest(10).at_location(Some("Jl. Mawar".to_string())),
            WorkingSet::new(10, false),
        );
        let mut events = Box::pin(view.events());
        let _ = events.next().await;

        feed.publish(reading("Jl. Kenanga", 0.5, 72.0, 410, 0));
        feed.publish(reading("Jl. Mawar", 0.4, 68.0, 340, 1));
        let next = events.next().await.expect("insert").expect("ok");
        assert!(matches!(next, WorkingSetEvent::Prepend(ref r) if r.location == "Jl. Mawar"));
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previous_set_and_marks_empty() {
        let source = Arc::new(MemoryReadingSource::new(vec![reading("a", 1.0, 90.0, 1, 0)]));
        let feed = LiveFeed::new(16);
        let mut view = LiveView::new(
            source.clone(),
            feed,
            RecentQuery::latest(10),
            WorkingSet::new(10, false),
        );

        source.set_failing(true);
        assert_eq!(view.refresh().await, "error");
        assert_eq!(view.phase(), ViewPhase::Empty);
        assert!(view.snapshot().last_error.is_some());

        source.set_failing(false);
        assert_eq!(view.refresh().await, "replace");
        assert_eq!(view.working_set().len(), 1);

        source.set_failing(true);
        assert_eq!(view.refresh().await, "error");
        assert_eq!(view.working_set().len(), 1);
        assert_eq!(view.phase(), ViewPhase::Ready);
    }

    #[tokio::test]
    async fn dispose_ends_the_stream_and_unregisters() {
        let source = Arc::new(MemoryReadingSource::new(Vec::new()));
        let feed = LiveFeed::new(16);
        let mut view = LiveView::new(
            source,
            feed.clone(),
            RecentQuery::latest(10),
            WorkingSet::new(10, false),
        );
        let mut events = Box::pin(view.events());
        let first = events.next().await.expect("bulk");
        view.handle(first);
        assert_eq!(feed.subscriber_count(), 1);

        view.dispose();
        view.dispose();
        let ended = timeout(Duration::from_secs(1), events.next())
            .await
            .expect("stream should end promptly");
        assert!(ended.is_none());
        drop(events);
        assert_eq!(feed.subscriber_count(), 0);

        assert_eq!(view.handle(Ok(WorkingSetEvent::Replace(Vec::new()))), "discarded");
        assert_eq!(view.refresh().await, "discarded");
    }

    #[tokio::test]
    async fn unsubscribe_releases_the_receiver() {
        let feed = LiveFeed::new(4);
        let sub = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.publish(reading("a", 0.1, 1.0, 1, 0)), 0);
    }
}
