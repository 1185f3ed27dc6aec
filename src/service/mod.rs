//! Client contract for the hosted data service.
//!
//! Rows travel as JSON objects. Related rows requested through [`Embed`] come
//! back nested under the related table's name, e.g. a `courses` row carries a
//! `course_skills` array.

use axum::async_trait;
use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub mod postgres;
pub mod rest;

pub use postgres::PgService;
pub use rest::RestClient;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data service responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("no matching row")]
    NoRows,
    #[error("data service unavailable")]
    Unavailable,
}

/// A relation to include with each selected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub embeds: Vec<Embed>,
}

impl Embed {
    pub fn new(table: &'static str, foreign_key: &'static str) -> Self {
        Self { table, foreign_key, embeds: Vec::new() }
    }

    pub fn embed(mut self, child: Embed) -> Self {
        self.embeds.push(child);
        self
    }
}

/// Query-by-table with equality filters and relation inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: &'static str,
    filters: Vec<(&'static str, String)>,
    embeds: Vec<Embed>,
    order: Option<&'static str>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self { table, filters: Vec::new(), embeds: Vec::new(), order: None }
    }

    pub fn eq(mut self, column: &'static str, value: impl ToString) -> Self {
        self.filters.push((column, value.to_string()));
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order = Some(column);
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn filters(&self) -> &[(&'static str, String)] {
        &self.filters
    }

    pub fn embeds(&self) -> &[Embed] {
        &self.embeds
    }

    pub fn order(&self) -> Option<&'static str> {
        self.order
    }
}

#[async_trait]
pub trait DataService: Send + Sync + 'static {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, ServiceError>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, ServiceError>;

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, ServiceError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), ServiceError>;
}

/// A service that is never reachable; every read is served from the fallback dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl DataService for Offline {
    async fn select(&self, _query: &Select) -> Result<Vec<Value>, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn insert(&self, _table: &str, _row: Value) -> Result<Value, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn update(&self, _table: &str, _id: &str, _patch: Value) -> Result<Value, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn delete(&self, _table: &str, _id: &str) -> Result<(), ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

/// Table and column names are interpolated into queries, so only plain
/// lowercase identifiers are accepted.
pub fn validate_identifier(ident: &str) -> Result<&str, ServiceError> {
    let mut chars = ident.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(ident)
    } else {
        Err(ServiceError::InvalidIdentifier(ident.to_string()))
    }
}

/// Text form of a key column, matching how Postgres renders `col::text`.
pub fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
