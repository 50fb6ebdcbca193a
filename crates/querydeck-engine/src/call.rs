//! One query execution attempt and its lifecycle
//!
//! ```text
//! Unknown -> Executing -> Retrieving -> Archived
//!                |             |
//!                |             +--> Failed | ArchiveFailed
//!                +--> Failed
//!                +--> Canceled
//! ```
//!
//! `Failed`, `ArchiveFailed` and `Canceled` are sticky: once reached, later
//! transitions are ignored. Every accepted transition invokes the event
//! callback synchronously and is published on a watch channel.

use crate::archive::Archive;
use crate::config::EngineConfig;
use crate::result::CallResult;
use chrono::{DateTime, SubsecRound, Utc};
use querydeck_core::{DataError, Result, ResultStream};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle state of a call
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Unknown,
    /// The driver is running the query
    Executing,
    /// Rows are streaming into the result buffer
    Retrieving,
    /// Result is complete and persisted
    Archived,
    Failed,
    /// Result is complete in memory but could not be persisted
    ArchiveFailed,
    Canceled,
}

impl CallState {
    /// No further transitions are expected
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Archived
                | CallState::Failed
                | CallState::ArchiveFailed
                | CallState::Canceled
        )
    }

    fn is_sticky(&self) -> bool {
        matches!(
            self,
            CallState::Failed | CallState::ArchiveFailed | CallState::Canceled
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Unknown => write!(f, "unknown"),
            CallState::Executing => write!(f, "executing"),
            CallState::Retrieving => write!(f, "retrieving"),
            CallState::Archived => write!(f, "archived"),
            CallState::Failed => write!(f, "failed"),
            CallState::ArchiveFailed => write!(f, "archive_failed"),
            CallState::Canceled => write!(f, "canceled"),
        }
    }
}

/// Callback invoked on every state transition
pub type OnEvent = Arc<dyn Fn(CallState, &Call) + Send + Sync>;

/// Persistent form of a call
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub query: String,
    pub state: CallState,
    pub time_taken_us: i64,
    pub timestamp_us: i64,
}

/// One query execution attempt
pub struct Call {
    id: String,
    query: String,
    state: watch::Sender<CallState>,
    timestamp: DateTime<Utc>,
    time_taken: Mutex<Option<Duration>>,
    result: Arc<CallResult>,
    archive: Archive,
    cancel: CancellationToken,
    error: Mutex<Option<Arc<DataError>>>,
    on_event: Option<OnEvent>,
    load_lock: tokio::sync::Mutex<()>,
    /// True once no background task touches the result or the archive
    finished: watch::Sender<bool>,
}

impl Call {
    fn build(
        id: String,
        query: String,
        timestamp: DateTime<Utc>,
        archive: Archive,
        config: &EngineConfig,
        on_event: Option<OnEvent>,
    ) -> Self {
        let (state, _) = watch::channel(CallState::Unknown);
        let (finished, _) = watch::channel(false);

        Self {
            id,
            query,
            state,
            timestamp,
            time_taken: Mutex::new(None),
            result: Arc::new(CallResult::new(
                config.rows_poll_interval(),
                config.rows_timeout(),
            )),
            archive,
            cancel: CancellationToken::new(),
            error: Mutex::new(None),
            on_event,
            load_lock: tokio::sync::Mutex::new(()),
            finished,
        }
    }

    /// Start a call whose stream is produced by `executor`.
    ///
    /// The call is `Executing` when this returns; the rest of the lifecycle
    /// runs on a background task.
    pub fn from_executor<F, Fut>(
        executor: F,
        query: impl Into<String>,
        config: &EngineConfig,
        on_event: Option<OnEvent>,
    ) -> Arc<Call>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Box<dyn ResultStream>>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        // records keep microseconds, so reloads compare equal
        let call = Arc::new(Self::build(
            id.to_string(),
            query.into(),
            Utc::now().trunc_subsecs(6),
            Archive::for_call(config, id),
            config,
            on_event,
        ));

        call.set_state(CallState::Executing);

        let task = call.clone();
        tokio::spawn(async move {
            task.clone().run(executor).await;
            task.finished.send_replace(true);
        });

        call
    }

    async fn run<F, Fut>(self: Arc<Self>, executor: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<Box<dyn ResultStream>>>,
    {
        let started = Instant::now();
        let cancel = self.cancel.clone();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = executor(cancel.clone()) => Some(outcome),
        };

        let mut stream = match outcome {
            Some(Ok(stream)) => stream,
            Some(Err(e)) => {
                self.finish(started, Some(e), CallState::Failed);
                self.result.finish_empty();
                return;
            }
            None => {
                debug!("Call {} abandoned its query after cancellation", self.id);
                self.finish(started, None, CallState::Canceled);
                self.result.finish_empty();
                return;
            }
        };

        if self.cancel.is_cancelled() {
            stream.close().await;
            self.finish(started, None, CallState::Canceled);
            self.result.finish_empty();
            return;
        }

        // a cancel that lands before the hand-off wins; the drain still
        // closes the stream but nothing is archived
        let retrieving = Arc::new(AtomicBool::new(false));
        let on_fill = self.clone();
        let handed_off = retrieving.clone();
        let filled = self
            .result
            .set_stream(stream, move || {
                handed_off.store(on_fill.set_state(CallState::Retrieving), Ordering::SeqCst);
            })
            .await;

        if !retrieving.load(Ordering::SeqCst) {
            debug!("Call {} was canceled before its rows streamed", self.id);
            self.record_time_taken(started.elapsed());
            return;
        }
        if let Err(e) = filled {
            self.finish(started, Some(e), CallState::Failed);
            return;
        }
        self.record_time_taken(started.elapsed());

        match self.archive.set_result(&self.result).await {
            Ok(()) => {
                info!(
                    "Call {} archived {} rows in {:?}",
                    self.id,
                    self.result.len(),
                    self.time_taken()
                );
                self.set_state(CallState::Archived);
            }
            Err(e) => self.finish(started, Some(e), CallState::ArchiveFailed),
        }
    }

    fn finish(&self, started: Instant, error: Option<DataError>, state: CallState) {
        self.record_time_taken(started.elapsed());
        if let Some(e) = error {
            warn!("Call {} failed: {}", self.id, e);
            *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(e));
        }
        self.set_state(state);
    }

    fn record_time_taken(&self, elapsed: Duration) {
        *self
            .time_taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(elapsed);
    }

    /// Apply a transition unless the current state is sticky.
    /// Returns true when the state changed.
    fn set_state(&self, new: CallState) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if current.is_sticky() || *current == new {
                return false;
            }
            *current = new;
            true
        });

        if changed {
            debug!("Call {} -> {}", self.id, new);
            self.emit(new);
        }
        changed
    }

    fn emit(&self, state: CallState) {
        if let Some(on_event) = &self.on_event {
            on_event(state, self);
        }
    }

    /// Abort the query. Only honoured while the call is still `Executing`;
    /// once rows stream the drain runs to completion.
    pub fn cancel(&self) {
        let canceled = self.state.send_if_modified(|current| {
            if *current != CallState::Executing {
                return false;
            }
            *current = CallState::Canceled;
            true
        });

        if canceled {
            info!("Call {} canceled", self.id);
            self.cancel.cancel();
            self.emit(CallState::Canceled);
        }
    }

    /// The result buffer, re-hydrated from the archive when it was never
    /// filled in this process
    pub async fn get_result(&self) -> Result<Arc<CallResult>> {
        if self.result.is_empty() && self.archive.is_filled() {
            let _load = self.load_lock.lock().await;
            if self.result.is_empty() {
                debug!("Loading result of call {} from archive", self.id);
                let stream = self.archive.get_result().await?;
                self.result.set_stream(stream, || {}).await?;
            }
        }
        Ok(self.result.clone())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn state(&self) -> CallState {
        *self.state.borrow()
    }

    /// Receiver observing every state change
    pub fn subscribe(&self) -> watch::Receiver<CallState> {
        self.state.subscribe()
    }

    /// Wait until the call reaches a terminal state
    pub async fn wait(&self) -> CallState {
        let mut receiver = self.state.subscribe();
        let state = match receiver.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }

    /// Wait until the background task is done with the result and the
    /// archive. A canceled call can reach its terminal state while the
    /// task is still draining, so this may return later than `wait`.
    pub async fn finished(&self) {
        let mut receiver = self.finished.subscribe();
        let _ = receiver.wait_for(|done| *done).await;
    }

    /// When the call was started
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Execution time so far, or the final execution time once finished
    pub fn time_taken(&self) -> Duration {
        let recorded = *self
            .time_taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        recorded.unwrap_or_else(|| (Utc::now() - self.timestamp).to_std().unwrap_or_default())
    }

    /// Terminal error, if the call failed
    pub fn error(&self) -> Option<Arc<DataError>> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Persistent record of this call
    pub fn to_record(&self) -> CallRecord {
        CallRecord {
            id: self.id.clone(),
            query: self.query.clone(),
            state: self.state(),
            time_taken_us: self.time_taken().as_micros() as i64,
            timestamp_us: self.timestamp.timestamp_micros(),
        }
    }

    /// Rebuild a call from its record.
    ///
    /// `Failed`, `ArchiveFailed` and `Canceled` are kept as recorded. Any
    /// other state is re-derived from disk: a complete archive means
    /// `Archived`, otherwise the call becomes `Unknown`. Fails when the
    /// record's id cannot name an archive.
    pub fn from_record(
        record: CallRecord,
        config: &EngineConfig,
        on_event: Option<OnEvent>,
    ) -> Result<Arc<Call>> {
        let archive = Archive::new(config, &record.id)?;
        let timestamp = DateTime::from_timestamp_micros(record.timestamp_us).unwrap_or_default();
        let call = Self::build(record.id, record.query, timestamp, archive, config, on_event);

        let state = if record.state.is_sticky() {
            record.state
        } else if call.archive.is_filled() {
            CallState::Archived
        } else {
            CallState::Unknown
        };
        if !call.archive.is_filled() {
            call.result.finish_empty();
        }

        call.state.send_replace(state);
        call.finished.send_replace(true);
        call.record_time_taken(Duration::from_micros(record.time_taken_us.max(0) as u64));

        Ok(Arc::new(call))
    }
}

impl Serialize for Call {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("id", &self.id)
            .field("query", &self.query)
            .field("state", &self.state())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use querydeck_core::{ChannelStream, Header, Meta, Row, VecStream};
    use serde_json::json;
    use std::sync::{OnceLock, Weak};
    use tempfile::TempDir;

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| vec![json!(i)]).collect()
    }

    fn stream(n: usize) -> Box<dyn ResultStream> {
        Box::new(VecStream::new(vec!["n".into()], Meta::default(), rows(n)))
    }

    fn recorder() -> (OnEvent, Arc<Mutex<Vec<CallState>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let on_event: OnEvent = Arc::new(move |state: CallState, _call: &Call| {
            sink.lock().unwrap().push(state)
        });
        (on_event, seen)
    }

    #[tokio::test]
    async fn test_success_path() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());
        let (on_event, seen) = recorder();

        let call = Call::from_executor(
            |_cancel| async { Ok(stream(4)) },
            "select n",
            &config,
            Some(on_event),
        );

        assert_eq!(call.wait().await, CallState::Archived);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                CallState::Executing,
                CallState::Retrieving,
                CallState::Archived
            ]
        );
        assert!(call.error().is_none());
        assert_eq!(call.query(), "select n");

        let result = call.get_result().await.unwrap();
        assert_eq!(result.rows(0, -1).await.unwrap(), rows(4));
    }

    #[tokio::test]
    async fn test_executor_error_fails_call() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());
        let (on_event, seen) = recorder();

        let call = Call::from_executor(
            |_cancel| async { Err(DataError::QueryFailed("syntax error".into())) },
            "selec",
            &config,
            Some(on_event),
        );

        assert_eq!(call.wait().await, CallState::Failed);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![CallState::Executing, CallState::Failed]
        );
        assert!(matches!(
            call.error().as_deref(),
            Some(DataError::QueryFailed(_))
        ));

        let result = call.get_result().await.unwrap();
        assert!(result.is_empty());
        assert!(result.rows(0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_while_executing() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());
        let (on_event, seen) = recorder();

        let call = Call::from_executor(
            move |cancel: CancellationToken| async move {
                cancel.cancelled().await;
                Err(DataError::QueryFailed("context canceled".into()))
            },
            "select pg_sleep(60)",
            &config,
            Some(on_event),
        );

        tokio::task::yield_now().await;
        call.cancel();

        assert_eq!(call.wait().await, CallState::Canceled);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![CallState::Executing, CallState::Canceled]
        );
        assert!(call.cancel.is_cancelled());
        assert!(call.error().is_none());
    }

    #[tokio::test]
    async fn test_driver_observes_cancellation() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (observed_tx, observed_rx) = tokio::sync::oneshot::channel();

        let call = Call::from_executor(
            move |cancel: CancellationToken| async move {
                // a driver typically hands the token to its own worker
                tokio::spawn(async move {
                    cancel.cancelled().await;
                    let _ = observed_tx.send(());
                });
                let _ = started_tx.send(());
                std::future::pending::<Result<Box<dyn ResultStream>>>().await
            },
            "select 1",
            &config,
            None,
        );

        started_rx.await.unwrap();
        assert_eq!(call.state(), CallState::Executing);
        call.cancel();

        tokio::time::timeout(Duration::from_secs(5), observed_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.wait().await, CallState::Canceled);
    }

    #[tokio::test]
    async fn test_cancel_ignored_after_completion() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());

        let call = Call::from_executor(|_| async { Ok(stream(1)) }, "q", &config, None);
        assert_eq!(call.wait().await, CallState::Archived);

        call.cancel();
        assert_eq!(call.state(), CallState::Archived);
    }

    #[test]
    fn test_sticky_states_ignore_transitions() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());
        let archive = Archive::new(&config, "id").unwrap();
        let call = Call::build("id".into(), "q".into(), Utc::now(), archive, &config, None);

        assert!(call.set_state(CallState::Executing));
        assert!(call.set_state(CallState::Canceled));
        assert!(!call.set_state(CallState::Archived));
        assert!(!call.set_state(CallState::Failed));
        assert_eq!(call.state(), CallState::Canceled);
    }

    #[tokio::test]
    async fn test_record_round_trip_after_restart() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());

        let call = Call::from_executor(|_| async { Ok(stream(7)) }, "select n", &config, None);
        assert_eq!(call.wait().await, CallState::Archived);
        let original = call.get_result().await.unwrap().rows(0, -1).await.unwrap();

        let json = serde_json::to_string(&*call).unwrap();
        let record: CallRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.id, call.id());
        assert_eq!(record.state, CallState::Archived);
        assert_eq!(record.timestamp_us, call.timestamp().timestamp_micros());

        let cold = Call::from_record(record, &config, None).unwrap();
        assert_eq!(cold.state(), CallState::Archived);
        assert_eq!(cold.query(), "select n");
        assert_eq!(cold.timestamp(), call.timestamp());

        let reloaded = cold.get_result().await.unwrap();
        assert_eq!(reloaded.rows(0, -1).await.unwrap(), original);
        assert_eq!(reloaded.header(), vec!["n".to_string()]);
    }

    #[tokio::test]
    async fn test_record_without_archive_becomes_unknown() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());

        for state in [
            CallState::Archived,
            CallState::Executing,
            CallState::Retrieving,
        ] {
            let record = CallRecord {
                id: Uuid::new_v4().to_string(),
                query: "q".into(),
                state,
                time_taken_us: 1500,
                timestamp_us: 1_700_000_000_000_000,
            };
            let cold = Call::from_record(record, &config, None).unwrap();
            assert_eq!(cold.state(), CallState::Unknown);
            assert_eq!(cold.time_taken(), Duration::from_micros(1500));

            let result = cold.get_result().await.unwrap();
            assert!(result.is_empty());
            assert!(result.rows(0, -1).await.unwrap().is_empty());
        }

        let failed = CallRecord {
            id: "f".into(),
            query: "q".into(),
            state: CallState::Failed,
            time_taken_us: 0,
            timestamp_us: 0,
        };
        assert_eq!(
            Call::from_record(failed, &config, None).unwrap().state(),
            CallState::Failed
        );
    }

    #[tokio::test]
    async fn test_archive_failure_keeps_rows_in_memory() {
        let dir = TempDir::new().unwrap();
        // a plain file where the archive directory should go
        let blocked = dir.path().join("archive");
        std::fs::write(&blocked, b"not a directory").unwrap();
        let config = EngineConfig::with_state_dir(dir.path());

        let call = Call::from_executor(|_| async { Ok(stream(3)) }, "q", &config, None);
        assert_eq!(call.wait().await, CallState::ArchiveFailed);
        assert!(matches!(call.error().as_deref(), Some(DataError::Io(_))));

        let result = call.get_result().await.unwrap();
        assert_eq!(result.rows(0, -1).await.unwrap(), rows(3));
    }

    #[tokio::test]
    async fn test_cancel_ignored_while_retrieving() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());
        let (tx, rows_stream) =
            ChannelStream::channel(vec!["n".into()], Meta::default(), 4, Duration::from_secs(5));

        let call = Call::from_executor(
            move |_| async move { Ok(Box::new(rows_stream) as Box<dyn ResultStream>) },
            "select n",
            &config,
            None,
        );

        call.subscribe()
            .wait_for(|state| *state == CallState::Retrieving)
            .await
            .unwrap();
        tx.send(Ok(vec![json!(0)])).await.unwrap();

        call.cancel();
        assert_eq!(call.state(), CallState::Retrieving);
        assert!(!call.cancel.is_cancelled());

        for i in 1..5 {
            tx.send(Ok(vec![json!(i)])).await.unwrap();
        }
        drop(tx);

        assert_eq!(call.wait().await, CallState::Archived);
        assert!(call.archive.is_filled());
        let result = call.get_result().await.unwrap();
        assert_eq!(result.rows(0, -1).await.unwrap(), rows(5));
    }

    /// Cancels its call from `header()`, which runs after the executor
    /// returned but before the drain reports `Retrieving`
    struct CancelOnHeader {
        call: Arc<OnceLock<Weak<Call>>>,
        rows: VecStream,
    }

    #[async_trait]
    impl ResultStream for CancelOnHeader {
        fn meta(&self) -> Meta {
            self.rows.meta()
        }

        fn header(&self) -> Header {
            if let Some(call) = self.call.get().and_then(Weak::upgrade) {
                call.cancel();
            }
            self.rows.header()
        }

        async fn next(&mut self) -> Result<Option<Row>> {
            self.rows.next().await
        }

        async fn close(&mut self) {
            self.rows.close().await
        }
    }

    #[tokio::test]
    async fn test_cancel_during_handoff_skips_archive() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());
        let (on_event, seen) = recorder();
        let slot = Arc::new(OnceLock::new());

        let handle = slot.clone();
        let call = Call::from_executor(
            move |_| async move {
                let stream = CancelOnHeader {
                    call: handle,
                    rows: VecStream::new(vec!["n".into()], Meta::default(), rows(3)),
                };
                Ok(Box::new(stream) as Box<dyn ResultStream>)
            },
            "select n",
            &config,
            Some(on_event),
        );
        slot.set(Arc::downgrade(&call)).unwrap();

        assert_eq!(call.wait().await, CallState::Canceled);
        call.finished().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![CallState::Executing, CallState::Canceled]
        );
        assert_eq!(call.state(), CallState::Canceled);
        assert!(!call.archive.is_filled());
        assert!(!config.archive_dir().join(call.id()).exists());
    }

    #[tokio::test]
    async fn test_sticky_record_state_survives_archive() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());

        let call = Call::from_executor(|_| async { Ok(stream(2)) }, "q", &config, None);
        assert_eq!(call.wait().await, CallState::Archived);

        for (recorded, expected) in [
            (CallState::Canceled, CallState::Canceled),
            (CallState::Failed, CallState::Failed),
            (CallState::Retrieving, CallState::Archived),
        ] {
            let record = CallRecord {
                state: recorded,
                ..call.to_record()
            };
            let cold = Call::from_record(record, &config, None).unwrap();
            assert_eq!(cold.state(), expected);
            cold.finished().await;
        }
    }

    #[test]
    fn test_record_with_unsafe_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::with_state_dir(dir.path());

        for id in ["", "..", "../calls", "a/b"] {
            let record = CallRecord {
                id: id.into(),
                query: "q".into(),
                state: CallState::Archived,
                time_taken_us: 0,
                timestamp_us: 0,
            };
            assert!(matches!(
                Call::from_record(record, &config, None),
                Err(DataError::InvalidConfiguration(_))
            ));
        }
    }
}
