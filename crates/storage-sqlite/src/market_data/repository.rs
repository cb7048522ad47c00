use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;
use tickerline_core::{PriceHistoryStore, PriceRow, QuoteRow, QuoteStore, StoreError};

use super::model::{format_date, PriceHistoryDB, QuoteDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoStore, StorageError};
use crate::schema::price_history::dsl as price_history_dsl;
use crate::schema::quotes::dsl as quotes_dsl;

/// SQLite's default bound-parameter limit is 32766; seven columns per row.
const UPSERT_CHUNK: usize = 1_000;

/// Quote and price history storage. Reads go through the pool on a blocking
/// thread; writes are serialized through the writer actor.
pub struct MarketDataRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl MarketDataRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    async fn read<F, T>(&self, query: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            query(&mut *conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("read task failed: {}", e)))
        .and_then(|result| result)
        .into_store()
    }
}

// =============================================================================
// QuoteStore Implementation
// =============================================================================

#[async_trait]
impl QuoteStore for MarketDataRepository {
    async fn latest_quote(&self, symbol: &str) -> Result<Option<QuoteRow>, StoreError> {
        let symbol = symbol.to_string();
        self.read(move |conn| {
            quotes_dsl::quotes
                .filter(quotes_dsl::symbol.eq(&symbol))
                .order(quotes_dsl::timestamp.desc())
                .select(QuoteDB::as_select())
                .first::<QuoteDB>(conn)
                .optional()?
                .map(QuoteRow::try_from)
                .transpose()
        })
        .await
    }

    async fn upsert_quote(&self, row: QuoteRow) -> Result<(), StoreError> {
        let db_row = QuoteDB::from(&row);
        self.writer
            .exec(move |conn| {
                diesel::replace_into(quotes_dsl::quotes)
                    .values(&db_row)
                    .execute(conn)?;
                Ok(())
            })
            .await
            .into_store()
    }
}

// =============================================================================
// PriceHistoryStore Implementation
// =============================================================================

#[async_trait]
impl PriceHistoryStore for MarketDataRepository {
    async fn price_range(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>, StoreError> {
        let symbol = symbol.to_string();
        let (from, to) = (format_date(from), format_date(to));
        self.read(move |conn| {
            price_history_dsl::price_history
                .filter(price_history_dsl::symbol.eq(&symbol))
                .filter(price_history_dsl::date.ge(&from))
                .filter(price_history_dsl::date.le(&to))
                .order(price_history_dsl::date.asc())
                .select(PriceHistoryDB::as_select())
                .load::<PriceHistoryDB>(conn)?
                .into_iter()
                .map(PriceRow::try_from)
                .collect()
        })
        .await
    }

    async fn upsert_prices(&self, rows: Vec<PriceRow>) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let db_rows: Vec<PriceHistoryDB> = rows.iter().map(PriceHistoryDB::from).collect();
        let written = self
            .writer
            .exec(move |conn| {
                let mut total = 0;
                for chunk in db_rows.chunks(UPSERT_CHUNK) {
                    total += diesel::replace_into(price_history_dsl::price_history)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(total)
            })
            .await
            .into_store()?;

        debug!("Upserted {} price rows", written);
        Ok(written)
    }
}
