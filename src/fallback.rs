//! Static dataset served when the data service cannot be reached.
//!
//! The built-in document uses the same row shape the data service returns and
//! goes through the same normalization, so both paths yield identical entities.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::CourseFilter;
use crate::models::{Course, CourseId, Trainer, TrainerId};
use crate::rows::{self, RowError};

const BUILTIN: &str = include_str!("../data/fallback.json");

#[derive(Error, Debug)]
pub enum FallbackError {
    #[error("failed to parse fallback document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fallback {kind} #{index} is invalid: {source}")]
    Row {
        kind: &'static str,
        index: usize,
        source: RowError,
    },
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    courses: Vec<Value>,
    #[serde(default)]
    trainers: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackDataset {
    courses: Vec<Course>,
    trainers: Vec<Trainer>,
}

impl FallbackDataset {
    pub fn new(courses: Vec<Course>, trainers: Vec<Trainer>) -> Self {
        Self { courses, trainers }
    }

    /// No fallback data: a failed fetch yields an empty list.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self, FallbackError> {
        Self::from_json(BUILTIN)
    }

    /// Unlike remote rows, an invalid row here is an error rather than skipped.
    pub fn from_json(json: &str) -> Result<Self, FallbackError> {
        let doc: Document = serde_json::from_str(json)?;
        let courses = normalize_all("course", doc.courses, rows::normalize_course)?;
        let trainers = normalize_all("trainer", doc.trainers, rows::normalize_trainer)?;
        Ok(Self { courses, trainers })
    }

    pub fn courses(&self, filter: &CourseFilter) -> Vec<Course> {
        self.courses
            .iter()
            .filter(|c| filter.category.map_or(true, |cat| c.category == cat))
            .cloned()
            .collect()
    }

    pub fn course(&self, id: CourseId) -> Option<Course> {
        self.courses.iter().find(|c| c.id == id).cloned()
    }

    pub fn trainers(&self) -> Vec<Trainer> {
        self.trainers.clone()
    }

    pub fn trainer(&self, id: TrainerId) -> Option<Trainer> {
        self.trainers.iter().find(|t| t.id == id).cloned()
    }
}

fn normalize_all<T>(
    kind: &'static str,
    rows: Vec<Value>,
    normalize: fn(Value) -> Result<T, RowError>,
) -> Result<Vec<T>, FallbackError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| normalize(row).map_err(|source| FallbackError::Row { kind, index, source }))
        .collect()
}
