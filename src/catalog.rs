//! Remote-first reads with fallback to the static dataset.
//!
//! Every read goes through [`fetch_with_fallback`] or [`fetch_one_with_fallback`]:
//! a failed query is logged and replaced by fallback data, so callers always
//! receive normalized entities and never an error.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::fallback::FallbackDataset;
use crate::models::{Category, Course, CourseId, Trainer, TrainerId};
use crate::rows::{self, RowError};
use crate::service::{DataService, Select, ServiceError};

/// Constraint applied by the data service itself, not client-side.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseFilter {
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Clone)]
pub struct Catalog {
    service: Arc<dyn DataService>,
    fallback: Arc<FallbackDataset>,
}

impl Catalog {
    pub fn new(service: Arc<dyn DataService>, fallback: Arc<FallbackDataset>) -> Self {
        Self { service, fallback }
    }

    /// Write access for enquiry capture and the admin surface.
    pub fn service(&self) -> &dyn DataService {
        self.service.as_ref()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_courses(&self, filter: &CourseFilter) -> Vec<Course> {
        let mut query = rows::course_select();
        if let Some(category) = filter.category {
            query = query.eq("category", category.as_str());
        }
        fetch_with_fallback(self.service(), &query, rows::normalize_course, || {
            self.fallback.courses(filter)
        })
        .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_course_by_id(&self, id: CourseId) -> Option<Course> {
        let query = rows::course_select().eq("id", id);
        fetch_one_with_fallback(self.service(), &query, rows::normalize_course, || {
            self.fallback.course(id)
        })
        .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_trainers(&self) -> Vec<Trainer> {
        fetch_with_fallback(self.service(), &rows::trainer_select(), rows::normalize_trainer, || {
            self.fallback.trainers()
        })
        .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_trainer_by_id(&self, id: TrainerId) -> Option<Trainer> {
        let query = rows::trainer_select().eq("id", id);
        fetch_one_with_fallback(self.service(), &query, rows::normalize_trainer, || {
            self.fallback.trainer(id)
        })
        .await
    }
}

/// Runs `query` and normalizes each row. Rows that fail normalization are
/// dropped with a warning; only a failed query is an error.
pub async fn fetch_normalized<T, N>(
    service: &dyn DataService,
    query: &Select,
    normalize: N,
) -> Result<Vec<T>, ServiceError>
where
    N: Fn(Value) -> Result<T, RowError>,
{
    let rows = service.select(query).await?;
    let total = rows.len();
    let entities: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match normalize(row) {
            Ok(entity) => Some(entity),
            Err(error) => {
                tracing::warn!(%error, table = query.table(), "dropping malformed row");
                None
            }
        })
        .collect();
    tracing::debug!(table = query.table(), total, kept = entities.len(), "fetched rows");
    Ok(entities)
}

pub async fn fetch_with_fallback<T, N, F>(
    service: &dyn DataService,
    query: &Select,
    normalize: N,
    fallback: F,
) -> Vec<T>
where
    N: Fn(Value) -> Result<T, RowError>,
    F: FnOnce() -> Vec<T>,
{
    match fetch_normalized(service, query, normalize).await {
        Ok(entities) => entities,
        Err(error) => {
            tracing::warn!(%error, table = query.table(), "data service failed, serving fallback dataset");
            fallback()
        }
    }
}

/// Single-entity variant: a remote miss also consults the fallback.
pub async fn fetch_one_with_fallback<T, N, F>(
    service: &dyn DataService,
    query: &Select,
    normalize: N,
    fallback: F,
) -> Option<T>
where
    N: Fn(Value) -> Result<T, RowError>,
    F: FnOnce() -> Option<T>,
{
    match fetch_normalized(service, query, normalize).await {
        Ok(entities) => entities.into_iter().next().or_else(fallback),
        Err(error) => {
            tracing::warn!(%error, table = query.table(), "data service failed, serving fallback dataset");
            fallback()
        }
    }
}
