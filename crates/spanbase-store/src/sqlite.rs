use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use spanbase_types::{ObjectMeta, SpanSeq, Target};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::{SpanStore, StoreStats};
use crate::writer::write_spans;

/// Schema version recorded in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS objects (
    target INTEGER PRIMARY KEY,
    text   TEXT    NOT NULL,
    len    INTEGER NOT NULL CHECK (len >= 0)
);
CREATE TABLE IF NOT EXISTS spans (
    target INTEGER NOT NULL REFERENCES objects(target),
    seq    INTEGER NOT NULL CHECK (seq >= 0),
    data   BLOB    NOT NULL,
    PRIMARY KEY (target, seq)
);";

const ALLOCATE_SQL: &str = "
INSERT INTO objects (target, text, len)
SELECT COALESCE(MAX(target), 0) + 1, ?1, ?2 FROM objects
RETURNING target";

const APPEND_SPAN_SQL: &str = "
INSERT INTO spans (target, seq, data)
SELECT ?1, COALESCE(MAX(seq), -1) + 1, ?2 FROM spans WHERE target = ?1
RETURNING seq";

const LIST_RECENT_SQL: &str = "
SELECT text, len, target FROM (
    SELECT text, len, target FROM objects ORDER BY target DESC LIMIT ?1
) ORDER BY target ASC";

/// SQLite-backed span store.
///
/// One connection is shared behind a mutex and every statement runs on the
/// blocking thread pool. The mutex serializes the read-max-then-insert of
/// target allocation; the schema's primary keys reject duplicates regardless.
pub struct SqliteSpanStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl SqliteSpanStore {
    /// Open (or create) the database described by `config`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let mut conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        apply_pragmas(&conn, &config)?;
        initialize_schema(&mut conn)?;

        match &config.path {
            Some(path) => info!(path = %path.display(), span_size = config.span_size, "span store opened"),
            None => info!(span_size = config.span_size, "in-memory span store opened"),
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Private in-memory database with the given span size.
    pub fn open_in_memory(span_size: usize) -> StoreResult<Self> {
        Self::open(StoreConfig::in_memory(span_size))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Task("connection lock poisoned".into()))?;
            f(&mut guard)
        })
        .await?
    }
}

fn apply_pragmas(conn: &Connection, config: &StoreConfig) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    if config.path.is_some() {
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(%mode, "journal mode set");
    }
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}

fn initialize_schema(conn: &mut Connection) -> StoreResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(StoreError::Config(format!(
            "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

fn insert_object(conn: &Connection, text: &str, len: u64) -> StoreResult<Target> {
    let target: u64 = conn.query_row(ALLOCATE_SQL, params![text, len], |row| row.get(0))?;
    Ok(Target::new(target))
}

fn insert_span(conn: &Connection, target: Target, seq: SpanSeq, data: &[u8]) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO spans (target, seq, data) VALUES (?1, ?2, ?3)",
        params![target.get(), seq, data],
    )?;
    Ok(())
}

/// The object's recorded length and the span bytes already persisted for it,
/// or `None` if the object does not exist.
fn object_fill(conn: &Connection, target: Target) -> StoreResult<Option<(u64, u64)>> {
    let fill = conn
        .query_row(
            "SELECT len, (SELECT COALESCE(SUM(LENGTH(data)), 0) FROM spans WHERE target = ?1)
             FROM objects WHERE target = ?1",
            params![target.get()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(fill)
}

fn meta_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ObjectMeta> {
    Ok(ObjectMeta {
        text: row.get(0)?,
        len: row.get(1)?,
        target: Target::new(row.get(2)?),
    })
}

#[async_trait]
impl SpanStore for SqliteSpanStore {
    fn span_size(&self) -> usize {
        self.config.span_size
    }

    async fn allocate(&self, text: &str, len: u64) -> StoreResult<Target> {
        let text = text.to_owned();
        let target = self.with_conn(move |conn| insert_object(conn, &text, len)).await?;
        debug!(%target, len, "allocated target");
        Ok(target)
    }

    async fn write_span(&self, target: Target, data: Bytes) -> StoreResult<SpanSeq> {
        let max = self.config.span_size;
        if data.len() > max {
            return Err(StoreError::SpanTooLarge {
                size: data.len(),
                max,
            });
        }
        let size = data.len();
        let seq = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let (len, persisted) =
                    object_fill(&tx, target)?.ok_or(StoreError::UnknownTarget(target))?;
                let attempted = persisted + size as u64;
                if attempted > len {
                    return Err(StoreError::SpanOverrun {
                        target,
                        len,
                        attempted,
                    });
                }
                let seq: SpanSeq =
                    tx.query_row(APPEND_SPAN_SQL, params![target.get(), &data[..]], |row| {
                        row.get(0)
                    })?;
                tx.commit()?;
                Ok(seq)
            })
            .await?;
        debug!(%target, seq, size, "span written");
        Ok(seq)
    }

    async fn object(&self, target: Target) -> StoreResult<Option<ObjectMeta>> {
        self.with_conn(move |conn| {
            let meta = conn
                .query_row(
                    "SELECT text, len, target FROM objects WHERE target = ?1",
                    params![target.get()],
                    meta_from_row,
                )
                .optional()?;
            Ok(meta)
        })
        .await
    }

    async fn spans(&self, target: Target) -> StoreResult<Vec<Bytes>> {
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT data FROM spans WHERE target = ?1 ORDER BY seq ASC")?;
            let rows = stmt.query_map(params![target.get()], |row| row.get::<_, Vec<u8>>(0))?;
            let mut spans = Vec::new();
            for row in rows {
                spans.push(Bytes::from(row?));
            }
            Ok(spans)
        })
        .await
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ObjectMeta>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(LIST_RECENT_SQL)?;
            let rows = stmt.query_map(params![limit], meta_from_row)?;
            let recent = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(recent)
        })
        .await
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM objects), COUNT(*), COALESCE(SUM(LENGTH(data)), 0)
                 FROM spans",
                [],
                |row| {
                    Ok(StoreStats {
                        objects: row.get(0)?,
                        spans: row.get(1)?,
                        span_bytes: row.get(2)?,
                    })
                },
            )?;
            Ok(stats)
        })
        .await
    }

    /// Allocation and every span insert share one transaction. Any failure
    /// drops the transaction, which rolls back the object row with it.
    async fn put_object(&self, text: &str, payload: Bytes) -> StoreResult<Target> {
        let text = text.to_owned();
        let span_size = self.config.span_size;
        let len = payload.len();
        let (target, spans) = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let target = insert_object(&tx, &text, payload.len() as u64)?;
                let spans = write_spans::<StoreError, _>(target, &payload, span_size, |seq, chunk| {
                    insert_span(&tx, target, seq, chunk)
                })?;
                tx.commit()?;
                Ok((target, spans))
            })
            .await?;
        info!(%target, len, spans, "object stored");
        Ok(target)
    }
}

impl std::fmt::Debug for SqliteSpanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSpanStore")
            .field("path", &self.config.path)
            .field("span_size", &self.config.span_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_object;

    fn pattern(len: usize) -> Bytes {
        (0..len).map(|i| (i * 7 % 256) as u8).collect::<Vec<u8>>().into()
    }

    fn fail_on_second_span(store: &SqliteSpanStore) {
        let conn = store.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TRIGGER fail_second_span BEFORE INSERT ON spans
             WHEN NEW.seq = 1
             BEGIN SELECT RAISE(ABORT, 'injected span failure'); END;",
        )
        .unwrap();
    }

    /// Delegates the primitive calls and keeps the trait's span-by-span upload.
    struct SpanBySpan(SqliteSpanStore);

    #[async_trait]
    impl SpanStore for SpanBySpan {
        fn span_size(&self) -> usize {
            self.0.span_size()
        }
        async fn allocate(&self, text: &str, len: u64) -> StoreResult<Target> {
            self.0.allocate(text, len).await
        }
        async fn write_span(&self, target: Target, data: Bytes) -> StoreResult<SpanSeq> {
            self.0.write_span(target, data).await
        }
        async fn object(&self, target: Target) -> StoreResult<Option<ObjectMeta>> {
            self.0.object(target).await
        }
        async fn spans(&self, target: Target) -> StoreResult<Vec<Bytes>> {
            self.0.spans(target).await
        }
        async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ObjectMeta>> {
            self.0.list_recent(limit).await
        }
        async fn stats(&self) -> StoreResult<StoreStats> {
            self.0.stats().await
        }
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn allocate_without_payload_reads_empty() {
        let store = SqliteSpanStore::open_in_memory(16).unwrap();
        let target = store.allocate("doc", 0).await.unwrap();
        assert_eq!(target, Target::FIRST);

        let payload = read_object(&store, target).await.unwrap();
        assert!(payload.is_empty());
        assert_eq!(payload.meta, ObjectMeta::new(Target::FIRST, "doc", 0));
    }

    #[tokio::test]
    async fn concurrent_allocations_are_distinct_and_gapless() {
        let store = Arc::new(SqliteSpanStore::open_in_memory(16).unwrap());
        let handles: Vec<_> = (0..24)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.allocate(&format!("obj-{i}"), 0).await.unwrap() })
            })
            .collect();
        let mut targets = Vec::new();
        for handle in handles {
            targets.push(handle.await.unwrap().get());
        }
        targets.sort_unstable();
        assert_eq!(targets, (1..=24).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn never_allocated_is_not_found() {
        let store = SqliteSpanStore::open_in_memory(16).unwrap();
        store.allocate("doc", 0).await.unwrap();
        let err = read_object(&store, Target::new(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    // -----------------------------------------------------------------------
    // Span writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn two_span_upload_reassembles_exactly() {
        let store = SqliteSpanStore::open_in_memory(1_500_000).unwrap();
        let source = pattern(3_000_000);
        let target = store.allocate("img", 3_000_000).await.unwrap();
        assert_eq!(target, Target::FIRST);

        let seq0 = store.write_span(target, source.slice(0..1_500_000)).await.unwrap();
        let seq1 = store.write_span(target, source.slice(1_500_000..3_000_000)).await.unwrap();
        assert_eq!((seq0, seq1), (0, 1));

        let payload = read_object(&store, target).await.unwrap();
        assert_eq!(payload.content_length(), 3_000_000);
        assert_eq!(payload.data, source);
    }

    #[tokio::test]
    async fn write_span_to_unknown_target_fails() {
        let store = SqliteSpanStore::open_in_memory(16).unwrap();
        let err = store
            .write_span(Target::new(4), Bytes::from_static(b"abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownTarget(t) if t == Target::new(4)));
        assert_eq!(store.stats().await.unwrap().spans, 0);
    }

    #[tokio::test]
    async fn oversized_span_rejected() {
        let store = SqliteSpanStore::open_in_memory(4).unwrap();
        let target = store.allocate("x", 5).await.unwrap();
        let err = store.write_span(target, pattern(5)).await.unwrap_err();
        assert!(matches!(err, StoreError::SpanTooLarge { size: 5, max: 4 }));
    }

    #[tokio::test]
    async fn span_past_object_length_rejected() {
        let store = SqliteSpanStore::open_in_memory(4).unwrap();
        let target = store.allocate("x", 2).await.unwrap();
        let err = store
            .write_span(target, Bytes::from_static(b"abcd"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::SpanOverrun { len: 2, attempted: 4, .. }
        ));
        assert_eq!(store.stats().await.unwrap().spans, 0);

        assert_eq!(store.write_span(target, Bytes::from_static(b"ab")).await.unwrap(), 0);
        assert_eq!(read_object(&store, target).await.unwrap().data.as_ref(), b"ab");
    }

    #[tokio::test]
    async fn foreign_key_enforced_by_schema() {
        let store = SqliteSpanStore::open_in_memory(16).unwrap();
        let conn = store.conn.lock().unwrap();
        let err = conn
            .execute("INSERT INTO spans (target, seq, data) VALUES (99, 0, x'00')", [])
            .unwrap_err();
        assert_eq!(err.sqlite_error_code(), Some(rusqlite::ErrorCode::ConstraintViolation));
    }

    // -----------------------------------------------------------------------
    // Whole-object uploads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_object_roundtrip_boundary_sizes() {
        let k = 32;
        let store = SqliteSpanStore::open_in_memory(k).unwrap();
        for n in [0, 1, k - 1, k, k + 1, 3 * k] {
            let source = pattern(n);
            let target = store.put_object("obj", source.clone()).await.unwrap();
            let payload = read_object(&store, target).await.unwrap();
            assert_eq!(payload.data, source, "n = {n}");
            assert_eq!(store.spans(target).await.unwrap().len(), n.div_ceil(k));
        }
    }

    #[tokio::test]
    async fn failed_put_object_leaves_nothing_behind() {
        let store = SqliteSpanStore::open_in_memory(4).unwrap();
        fail_on_second_span(&store);

        let err = store.put_object("img", pattern(10)).await.unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert_eq!(store.object(Target::FIRST).await.unwrap(), None);
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());

        // The rolled-back target is handed out again.
        assert_eq!(store.allocate("next", 0).await.unwrap(), Target::FIRST);
    }

    #[tokio::test]
    async fn span_by_span_failure_is_a_partial_write() {
        let inner = SqliteSpanStore::open_in_memory(4).unwrap();
        fail_on_second_span(&inner);
        let store = SpanBySpan(inner);

        let err = store.put_object("img", pattern(10)).await.unwrap_err();
        let StoreError::PartialWrite {
            expected: 10,
            persisted: 4,
            source: Some(cause),
            ..
        } = &err
        else {
            panic!("expected a partial write with a cause, got {err:?}");
        };
        assert!(matches!(**cause, StoreError::Sqlite(_)));
        assert!(cause.to_string().contains("injected span failure"));

        let err = read_object(&store, Target::FIRST).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::PartialWrite { expected: 10, persisted: 4, source: None, .. }
        ));
    }

    // -----------------------------------------------------------------------
    // Listing and persistence
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_recent_window() {
        let store = SqliteSpanStore::open_in_memory(16).unwrap();
        for i in 0..6u64 {
            store.allocate(&format!("obj-{i}"), i).await.unwrap();
        }
        let recent = store.list_recent(4).await.unwrap();
        let targets: Vec<u64> = recent.iter().map(|m| m.target.get()).collect();
        assert_eq!(targets, vec![3, 4, 5, 6]);
        assert_eq!(recent[3], ObjectMeta::new(Target::new(6), "obj-5", 5));
    }

    #[tokio::test]
    async fn reopen_keeps_objects_and_continues_targets() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::in_memory(8).with_path(dir.path().join("spans.db"));

        let source = pattern(20);
        {
            let store = SqliteSpanStore::open(config.clone()).unwrap();
            assert_eq!(store.put_object("a", source.clone()).await.unwrap(), Target::FIRST);
        }

        let store = SqliteSpanStore::open(config).unwrap();
        let payload = read_object(&store, Target::FIRST).await.unwrap();
        assert_eq!(payload.data, source);
        assert_eq!(store.allocate("b", 0).await.unwrap(), Target::new(2));
        assert_eq!(
            store.stats().await.unwrap(),
            StoreStats {
                objects: 2,
                spans: 3,
                span_bytes: 20
            }
        );
    }

    #[test]
    fn invalid_config_rejected() {
        let err = SqliteSpanStore::open(StoreConfig::in_memory(0)).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
