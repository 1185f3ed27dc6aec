//! Direct Postgres access to the same schema the hosted service exposes.
//!
//! Embedded relations are resolved with one extra query per relation, keyed on
//! the relation's foreign key.

use axum::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::{collections::HashMap, future::Future, pin::Pin};

use super::{key_text, validate_identifier, DataService, Embed, Select, ServiceError};

pub type Db = Pool<Postgres>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct PgService {
    pool: Db,
}

impl PgService {
    pub async fn connect(url: &str) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    fn attach<'a>(&'a self, rows: &'a mut [Value], embeds: &'a [Embed]) -> BoxFuture<'a, Result<(), ServiceError>> {
        Box::pin(async move {
            for embed in embeds {
                let table = validate_identifier(embed.table)?;
                let fk = validate_identifier(embed.foreign_key)?;
                let ids: Vec<String> = rows.iter().filter_map(|r| r.get("id")).map(key_text).collect();

                let mut children: Vec<Value> = if ids.is_empty() {
                    Vec::new()
                } else {
                    let sql = format!("SELECT to_jsonb(t) FROM {table} t WHERE t.{fk}::text = ANY($1)");
                    sqlx::query_scalar::<_, Value>(&sql).bind(&ids).fetch_all(&self.pool).await?
                };
                self.attach(&mut children, &embed.embeds).await?;

                let mut by_parent: HashMap<String, Vec<Value>> = HashMap::new();
                for child in children {
                    if let Some(key) = child.get(fk).map(key_text) {
                        by_parent.entry(key).or_default().push(child);
                    }
                }
                for row in rows.iter_mut() {
                    let key = row.get("id").map(key_text);
                    let related = key.and_then(|k| by_parent.remove(&k)).unwrap_or_default();
                    if let Some(obj) = row.as_object_mut() {
                        obj.insert(table.to_string(), Value::Array(related));
                    }
                }
            }
            Ok(())
        })
    }
}

fn column_list(row: &Map<String, Value>) -> Result<String, ServiceError> {
    let columns = row
        .keys()
        .map(|k| validate_identifier(k))
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(ServiceError::NotAnObject);
    }
    Ok(columns.join(", "))
}

fn select_sql(query: &Select) -> Result<String, ServiceError> {
    let table = validate_identifier(query.table())?;
    let mut sql = format!("SELECT to_jsonb(t) FROM {table} t");
    for (i, (column, _)) in query.filters().iter().enumerate() {
        let column = validate_identifier(column)?;
        let joiner = if i == 0 { " WHERE" } else { " AND" };
        sql.push_str(&format!("{joiner} t.{column}::text = ${}", i + 1));
    }
    if let Some(column) = query.order() {
        sql.push_str(&format!(" ORDER BY t.{}", validate_identifier(column)?));
    }
    Ok(sql)
}

#[async_trait]
impl DataService for PgService {
    #[tracing::instrument(level = "debug", skip(self), fields(table = query.table()))]
    async fn select(&self, query: &Select) -> Result<Vec<Value>, ServiceError> {
        let sql = select_sql(query)?;
        let mut q = sqlx::query_scalar::<_, Value>(&sql);
        for (_, value) in query.filters() {
            q = q.bind(value);
        }
        let mut rows = q.fetch_all(&self.pool).await?;
        self.attach(&mut rows, query.embeds()).await?;
        Ok(rows)
    }

    #[tracing::instrument(level = "debug", skip(self, row))]
    async fn insert(&self, table: &str, row: Value) -> Result<Value, ServiceError> {
        let table = validate_identifier(table)?;
        let columns = column_list(row.as_object().ok_or(ServiceError::NotAnObject)?)?;
        let sql = format!(
            "INSERT INTO {table} AS t ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING to_jsonb(t)"
        );
        Ok(sqlx::query_scalar::<_, Value>(&sql).bind(&row).fetch_one(&self.pool).await?)
    }

    #[tracing::instrument(level = "debug", skip(self, patch))]
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, ServiceError> {
        let table = validate_identifier(table)?;
        let columns = column_list(patch.as_object().ok_or(ServiceError::NotAnObject)?)?;
        let sql = format!(
            "UPDATE {table} AS t SET ({columns}) = \
             (SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)) \
             WHERE t.id::text = $2 RETURNING to_jsonb(t)"
        );
        sqlx::query_scalar::<_, Value>(&sql)
            .bind(&patch)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NoRows)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, table: &str, id: &str) -> Result<(), ServiceError> {
        let table = validate_identifier(table)?;
        let sql = format!("DELETE FROM {table} t WHERE t.id::text = $1");
        let done = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if done.rows_affected() == 0 {
            return Err(ServiceError::NoRows);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_sql_binds_filters_in_order() {
        let query = Select::from("courses").eq("category", "Technology").eq("id", 3).order_by("id");
        assert_eq!(
            select_sql(&query).unwrap(),
            "SELECT to_jsonb(t) FROM courses t WHERE t.category::text = $1 AND t.id::text = $2 ORDER BY t.id"
        );
    }

    #[test]
    fn select_sql_rejects_injected_columns() {
        let query = Select::from("courses").eq("id = id OR 1", "1");
        assert!(matches!(select_sql(&query), Err(ServiceError::InvalidIdentifier(_))));
    }

    #[test]
    fn column_list_requires_fields() {
        let row = json!({"title": "Intro", "price": "₹0"});
        let cols = column_list(row.as_object().unwrap()).unwrap();
        assert!(cols == "price, title" || cols == "title, price");
        assert!(column_list(json!({}).as_object().unwrap()).is_err());
    }
}
