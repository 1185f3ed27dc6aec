//! PostgREST-style HTTP client, as exposed by hosted Supabase projects.

use axum::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, Url};
use serde_json::Value;
use std::time::Duration;

use super::{validate_identifier, DataService, Embed, Select, ServiceError};

const REST_PREFIX: &str = "rest/v1/";

#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl RestClient {
    pub fn new(base_url: &Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(timeout).gzip(true).build()?;
        // `Url::join` replaces the last segment unless the base ends with a slash
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base, api_key: api_key.into() })
    }

    fn table_url(&self, table: &str) -> Result<Url, ServiceError> {
        let table = validate_identifier(table)?;
        self.base
            .join(REST_PREFIX)
            .and_then(|u| u.join(table))
            .map_err(|e| ServiceError::InvalidUrl(e.to_string()))
    }

    pub fn select_url(&self, query: &Select) -> Result<Url, ServiceError> {
        let mut url = self.table_url(query.table())?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &render_columns(query.embeds()));
            for (column, value) in query.filters() {
                pairs.append_pair(validate_identifier(column)?, &format!("eq.{value}"));
            }
            if let Some(column) = query.order() {
                pairs.append_pair("order", &format!("{}.asc", validate_identifier(column)?));
            }
        }
        Ok(url)
    }

    fn row_url(&self, table: &str, id: &str) -> Result<Url, ServiceError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ServiceError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "data service request failed");
            return Err(ServiceError::Status { status, body });
        }
        Ok(response)
    }

    /// Writes ask for `return=representation`, which yields a one-element array.
    async fn single_row(response: Response) -> Result<Value, ServiceError> {
        let rows: Vec<Value> = response.json().await?;
        rows.into_iter().next().ok_or(ServiceError::NoRows)
    }
}

/// `*,course_skills(*),course_modules(*,module_details(*))`
fn render_columns(embeds: &[Embed]) -> String {
    let mut out = String::from("*");
    for embed in embeds {
        out.push(',');
        out.push_str(embed.table);
        out.push('(');
        out.push_str(&render_columns(&embed.embeds));
        out.push(')');
    }
    out
}

#[async_trait]
impl DataService for RestClient {
    #[tracing::instrument(level = "debug", skip(self), fields(table = query.table()))]
    async fn select(&self, query: &Select) -> Result<Vec<Value>, ServiceError> {
        let url = self.select_url(query)?;
        let response = Self::send(self.request(Method::GET, url)).await?;
        Ok(response.json().await?)
    }

    #[tracing::instrument(level = "debug", skip(self, row))]
    async fn insert(&self, table: &str, row: Value) -> Result<Value, ServiceError> {
        if !row.is_object() {
            return Err(ServiceError::NotAnObject);
        }
        let url = self.table_url(table)?;
        let builder = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .header(header::CONTENT_TYPE, "application/json")
            .json(&row);
        Self::single_row(Self::send(builder).await?).await
    }

    #[tracing::instrument(level = "debug", skip(self, patch))]
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, ServiceError> {
        if !patch.is_object() {
            return Err(ServiceError::NotAnObject);
        }
        let url = self.row_url(table, id)?;
        let builder = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&patch);
        Self::single_row(Self::send(builder).await?).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, table: &str, id: &str) -> Result<(), ServiceError> {
        let url = self.row_url(table, id)?;
        Self::send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
