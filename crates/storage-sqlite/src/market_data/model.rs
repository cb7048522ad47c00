//! Database models for quotes and daily price history.
//!
//! Decimals are stored as TEXT to keep exact precision; dates as `YYYY-MM-DD`
//! so they sort lexically.

use std::str::FromStr;

use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tickerline_core::{PriceRow, QuoteRow};

use crate::errors::StorageError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database model for quotes
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::quotes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuoteDB {
    pub symbol: String,
    pub timestamp: i64,
    pub price: String,
    pub day_low: Option<String>,
    pub day_high: Option<String>,
    pub volume: Option<String>,
}

/// Database model for daily prices
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::price_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceHistoryDB {
    pub symbol: String,
    pub date: String,
    pub price: String,
    pub volume: Option<String>,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value).map_err(|e| {
        StorageError::SerializationError(format!("invalid {} '{}': {}", column, value, e))
    })
}

fn parse_optional(column: &str, value: Option<&str>) -> Result<Option<Decimal>, StorageError> {
    value.map(|v| parse_decimal(column, v)).transpose()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl From<&QuoteRow> for QuoteDB {
    fn from(row: &QuoteRow) -> Self {
        QuoteDB {
            symbol: row.symbol.clone(),
            timestamp: row.timestamp,
            price: row.price.to_string(),
            day_low: row.day_low.map(|d| d.to_string()),
            day_high: row.day_high.map(|d| d.to_string()),
            volume: row.volume.map(|d| d.to_string()),
        }
    }
}

impl TryFrom<QuoteDB> for QuoteRow {
    type Error = StorageError;

    fn try_from(db: QuoteDB) -> Result<Self, Self::Error> {
        Ok(QuoteRow {
            price: parse_decimal("price", &db.price)?,
            day_low: parse_optional("day_low", db.day_low.as_deref())?,
            day_high: parse_optional("day_high", db.day_high.as_deref())?,
            volume: parse_optional("volume", db.volume.as_deref())?,
            symbol: db.symbol,
            timestamp: db.timestamp,
        })
    }
}

impl From<&PriceRow> for PriceHistoryDB {
    fn from(row: &PriceRow) -> Self {
        PriceHistoryDB {
            symbol: row.symbol.clone(),
            date: format_date(row.date),
            price: row.price.to_string(),
            volume: row.volume.map(|d| d.to_string()),
            open: row.open.map(|d| d.to_string()),
            high: row.high.map(|d| d.to_string()),
            low: row.low.map(|d| d.to_string()),
        }
    }
}

impl TryFrom<PriceHistoryDB> for PriceRow {
    type Error = StorageError;

    fn try_from(db: PriceHistoryDB) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&db.date, DATE_FORMAT).map_err(|e| {
            StorageError::SerializationError(format!("invalid date '{}': {}", db.date, e))
        })?;

        Ok(PriceRow {
            date,
            price: parse_decimal("price", &db.price)?,
            volume: parse_optional("volume", db.volume.as_deref())?,
            open: parse_optional("open", db.open.as_deref())?,
            high: parse_optional("high", db.high.as_deref())?,
            low: parse_optional("low", db.low.as_deref())?,
            symbol: db.symbol,
        })
    }
}
