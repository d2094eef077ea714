use std::collections::HashMap;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, IntoActiveModel};
use serde_json::Value;

use super::document::{Document, FromPayload};
use super::errors::{Result, StoreError};

/// Rows per `INSERT .. ON CONFLICT` statement.
pub const UPSERT_CHUNK_SIZE: usize = 50;

/// Retry attempts for a chunk that hit a transient database error.
pub const DEFAULT_UPSERT_RETRIES: usize = 3;

const MIN_RETRY_DELAY: Duration = Duration::from_millis(100);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Insert or refresh `docs` by natural key, stamping them with the current time.
///
/// Returns one key per distinct document, in first-seen order. When a key occurs
/// more than once, the last occurrence is the one written.
///
/// Chunks are written independently. A failure leaves earlier chunks committed,
/// and re-running the same batch converges to the same end state.
pub async fn upsert_many<D>(db: &DatabaseConnection, docs: Vec<D>) -> Result<Vec<D::Key>>
where
    D: Document,
    <D::Entity as EntityTrait>::Model: IntoActiveModel<D::ActiveModel>,
{
    upsert_many_at(db, docs, Utc::now().fixed_offset()).await
}

/// [`upsert_many`] with an explicit `collected_at`.
///
/// A row whose stored `collected_at` is newer than `collected_at` is left untouched.
pub async fn upsert_many_at<D>(
    db: &DatabaseConnection,
    docs: Vec<D>,
    collected_at: DateTimeWithTimeZone,
) -> Result<Vec<D::Key>>
where
    D: Document,
    <D::Entity as EntityTrait>::Model: IntoActiveModel<D::ActiveModel>,
{
    if docs.is_empty() {
        return Ok(Vec::new());
    }

    let (keys, docs) = dedupe_last_wins(docs);
    let models: Vec<D::ActiveModel> = docs
        .into_iter()
        .map(|doc| doc.into_active_model(collected_at))
        .collect();

    tracing::debug!(
        collection = D::COLLECTION,
        count = models.len(),
        "Starting upsert"
    );

    for chunk in models.chunks(UPSERT_CHUNK_SIZE) {
        upsert_chunk_with_retry::<D>(db, chunk).await?;
    }

    Ok(keys)
}

/// Map each payload through `D::from_payload` and upsert the results.
///
/// Payloads that `from_payload` skips are neither written nor returned.
pub async fn upsert_payloads<D>(
    db: &DatabaseConnection,
    context: D::Context,
    payloads: Vec<Value>,
) -> Result<Vec<D::Key>>
where
    D: FromPayload,
    <D::Entity as EntityTrait>::Model: IntoActiveModel<D::ActiveModel>,
{
    let mut docs = Vec::with_capacity(payloads.len());
    for payload in payloads {
        if let Some(doc) = D::from_payload(context, payload)? {
            docs.push(doc);
        }
    }
    upsert_many(db, docs).await
}

fn dedupe_last_wins<D: Document>(docs: Vec<D>) -> (Vec<D::Key>, Vec<D>) {
    let mut order: Vec<D::Key> = Vec::with_capacity(docs.len());
    let mut latest: HashMap<D::Key, D> = HashMap::with_capacity(docs.len());

    for doc in docs {
        let key = doc.key();
        if latest.insert(key.clone(), doc).is_none() {
            order.push(key);
        }
    }

    let docs = order.iter().filter_map(|key| latest.remove(key)).collect();
    (order, docs)
}

async fn upsert_chunk_with_retry<D>(db: &DatabaseConnection, chunk: &[D::ActiveModel]) -> Result<()>
where
    D: Document,
    <D::Entity as EntityTrait>::Model: IntoActiveModel<D::ActiveModel>,
{
    let backoff = ExponentialBuilder::default()
        .with_min_delay(MIN_RETRY_DELAY)
        .with_max_delay(MAX_RETRY_DELAY)
        .with_max_times(DEFAULT_UPSERT_RETRIES)
        .with_jitter();

    (|| async {
        <D::Entity as EntityTrait>::insert_many(chunk.to_vec())
            .on_conflict(D::on_conflict())
            .exec_without_returning(db)
            .await
    })
    .retry(backoff)
    .when(is_retryable_db_error)
    .notify(|err, dur| {
        tracing::warn!(
            collection = D::COLLECTION,
            backoff_ms = dur.as_millis() as u64,
            error = %err,
            "Upsert failed, retrying"
        );
    })
    .await
    .map(|_| ())
    .map_err(StoreError::from)
}

/// Whether a database error is transient (lock contention, dropped connection).
pub(crate) fn is_retryable_db_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let err_str = err.to_string().to_lowercase();
            err_str.contains("locked")
                || err_str.contains("busy")
                || err_str.contains("timeout")
                || err_str.contains("connection")
                || err_str.contains("temporarily unavailable")
        }
        _ => false,
    }
}
