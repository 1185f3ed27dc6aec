//! Row shapes returned by the data service and their mapping onto the flat
//! entities in [`crate::models`].
//!
//! Relation tables name their text column inconsistently (`skill_name` vs
//! `skill`), so each row type lists the accepted aliases explicitly. A `null`
//! or missing relation array becomes an empty sequence, and a relation element
//! that does not fit its row type is skipped. Only an invalid id, title/name,
//! category or skill level rejects the entity itself.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError, DisplayFromStr, PickFirst};
use thiserror::Error;

use crate::models::{
    Category, Contact, Course, CourseId, CourseModule, Education, ParseError, Project, SkillLevel,
    TaughtCourse, Testimonial, Trainer, TrainerId,
};
use crate::price::Price;
use crate::service::{Embed, Select};

pub const COURSES_TABLE: &str = "courses";
pub const TRAINERS_TABLE: &str = "trainers";

#[derive(Error, Debug)]
pub enum RowError {
    #[error("row does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ParseError),
}

/// Text or number, as loosely-typed columns come back either way.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }

    fn into_price(self) -> Option<Price> {
        match self {
            Scalar::Text(s) => Price::parse(&s),
            Scalar::Number(n) => n.as_f64().map(Price::from_amount),
        }
    }
}

trait Positioned {
    fn position(&self) -> Option<i32>;
}

/// Stable-sorts by `position`; rows without one keep source order after the rest.
fn ordered<R: Positioned, T>(mut rows: Vec<R>, map: impl FnMut(R) -> T) -> Vec<T> {
    rows.sort_by_key(|r| r.position().unwrap_or(i32::MAX));
    rows.into_iter().map(map).collect()
}

macro_rules! positioned {
    ($($row:ty),* $(,)?) => {
        $(impl Positioned for $row {
            fn position(&self) -> Option<i32> {
                self.position
            }
        })*
    };
}

fn clamp_rating(rating: Option<f64>) -> f64 {
    rating.filter(|r| r.is_finite()).map_or(0.0, |r| r.clamp(0.0, 5.0))
}

/// Relation arrays: anything but an array reads as empty, and elements that
/// fail to deserialize are skipped with a warning.
fn lenient_rows<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(value = %other, "relation is not an array, treating as empty");
            Vec::new()
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(row) => Some(row),
            Err(error) => {
                tracing::warn!(%error, row = std::any::type_name::<T>(), "skipping malformed relation row");
                None
            }
        })
        .collect())
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

// ------------- courses -------------

#[serde_as]
#[derive(Deserialize, Debug)]
pub struct CourseRow {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,
    pub title: String,
    pub category: String,
    #[serde(alias = "level")]
    pub skill_level: String,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub price: Option<Scalar>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, alias = "negotiated_price")]
    pub original_price: Option<Scalar>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, alias = "image_url")]
    pub image: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, alias = "is_active")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub course_skills: Vec<SkillRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub course_tools: Vec<ToolRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub course_modules: Vec<ModuleRow>,
}

#[derive(Deserialize, Debug)]
pub struct SkillRow {
    #[serde(alias = "skill")]
    pub skill_name: String,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct ToolRow {
    #[serde(alias = "tool")]
    pub tool_name: String,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct ModuleRow {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub module_details: Vec<ModuleDetailRow>,
}

#[derive(Deserialize, Debug)]
pub struct ModuleDetailRow {
    #[serde(alias = "detail_text")]
    pub detail: String,
    #[serde(default)]
    pub position: Option<i32>,
}

positioned!(SkillRow, ToolRow, ModuleRow, ModuleDetailRow);

pub fn course_select() -> Select {
    Select::from(COURSES_TABLE)
        .embed(Embed::new("course_skills", "course_id"))
        .embed(Embed::new("course_tools", "course_id"))
        .embed(Embed::new("course_modules", "course_id").embed(Embed::new("module_details", "module_id")))
        .order_by("id")
}

impl TryFrom<CourseRow> for Course {
    type Error = ParseError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: CourseId(row.id),
            title: row.title,
            category: row.category.parse::<Category>()?,
            skill_level: row.skill_level.parse::<SkillLevel>()?,
            price: row.price.and_then(Scalar::into_price),
            original_price: row.original_price.and_then(Scalar::into_price),
            duration: text(row.duration),
            rating: clamp_rating(row.rating),
            image: text(row.image),
            active: row.active.unwrap_or(true),
            skills: ordered(row.course_skills, |s| s.skill_name),
            tools: ordered(row.course_tools, |t| t.tool_name),
            modules: ordered(row.course_modules, |m| CourseModule {
                title: m.title,
                description: text(m.description),
                details: ordered(m.module_details, |d| d.detail),
            }),
        })
    }
}

pub fn normalize_course(row: Value) -> Result<Course, RowError> {
    let row: CourseRow = serde_json::from_value(row)?;
    Ok(Course::try_from(row)?)
}

// ------------- trainers -------------

#[serde_as]
#[derive(Deserialize, Debug)]
pub struct TrainerRow {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "profile_title")]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub fee: Option<Scalar>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default, alias = "reviews")]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_skills: Vec<SkillRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_expertise: Vec<ExpertiseRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_certifications: Vec<CertificationRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_achievements: Vec<AchievementRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_projects: Vec<ProjectRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_courses: Vec<TaughtCourseRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_education: Vec<EducationRow>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub trainer_testimonials: Vec<TestimonialRow>,
}

#[derive(Deserialize, Debug)]
pub struct ExpertiseRow {
    #[serde(alias = "expertise", alias = "expertise_area")]
    pub area: String,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct CertificationRow {
    #[serde(alias = "certification_name", alias = "name")]
    pub certification: String,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct AchievementRow {
    #[serde(alias = "title")]
    pub achievement: String,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct ProjectRow {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[serde_as]
#[derive(Deserialize, Debug)]
pub struct TaughtCourseRow {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[serde_as]
#[derive(Deserialize, Debug)]
pub struct EducationRow {
    pub degree: String,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub year: Option<Scalar>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[serde_as]
#[derive(Deserialize, Debug)]
pub struct TestimonialRow {
    pub name: String,
    // `position` here is the reviewer's job title; ordering uses `sort_order`
    #[serde(default, rename = "position", alias = "role")]
    pub position_title: Option<String>,
    #[serde(alias = "content")]
    pub text: String,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, rename = "sort_order")]
    pub position: Option<i32>,
}

positioned!(
    ExpertiseRow,
    CertificationRow,
    AchievementRow,
    ProjectRow,
    TaughtCourseRow,
    EducationRow,
    TestimonialRow,
);

pub fn trainer_select() -> Select {
    [
        "trainer_skills",
        "trainer_expertise",
        "trainer_certifications",
        "trainer_achievements",
        "trainer_projects",
        "trainer_courses",
        "trainer_education",
        "trainer_testimonials",
    ]
    .into_iter()
    .fold(Select::from(TRAINERS_TABLE), |q, table| q.embed(Embed::new(table, "trainer_id")))
    .order_by("id")
}

impl From<TrainerRow> for Trainer {
    fn from(row: TrainerRow) -> Self {
        Trainer {
            id: TrainerId(row.id),
            name: row.name,
            title: text(row.title),
            bio: text(row.bio),
            contact: Contact {
                email: text(row.email),
                phone: text(row.phone),
                website: text(row.website),
                linkedin: text(row.linkedin),
            },
            location: text(row.location),
            fee: row.fee.and_then(Scalar::into_price),
            rating: clamp_rating(row.rating),
            review_count: row.review_count.map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX)),
            availability: text(row.availability),
            industry: text(row.industry),
            skills: ordered(row.trainer_skills, |s| s.skill_name),
            expertise: ordered(row.trainer_expertise, |e| e.area),
            certifications: ordered(row.trainer_certifications, |c| c.certification),
            achievements: ordered(row.trainer_achievements, |a| a.achievement),
            projects: ordered(row.trainer_projects, |p| Project {
                title: p.title,
                description: text(p.description),
                technologies: p.technologies,
                impact: p.impact.filter(|i| !i.trim().is_empty()),
            }),
            courses: ordered(row.trainer_courses, |c| TaughtCourse {
                title: c.title,
                description: text(c.description),
                mode: text(c.mode),
                rating: c.rating.map(|r| clamp_rating(Some(r))),
            }),
            education: ordered(row.trainer_education, |e| Education {
                degree: e.degree,
                institution: text(e.institution),
                year: e.year.map(Scalar::into_text).unwrap_or_default(),
            }),
            testimonials: ordered(row.trainer_testimonials, |t| Testimonial {
                name: t.name,
                position: text(t.position_title),
                text: t.text,
                rating: t.rating.map(|r| clamp_rating(Some(r))),
            }),
        }
    }
}

pub fn normalize_trainer(row: Value) -> Result<Trainer, RowError> {
    let row: TrainerRow = serde_json::from_value(row)?;
    Ok(Trainer::from(row))
}
