use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::price::Price;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CourseId(pub i64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TrainerId(pub i64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for TrainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown category `{0}`")]
    Category(String),
    #[error("unknown skill level `{0}`")]
    SkillLevel(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "Content Creation")]
    ContentCreation,
    Marketing,
    Technology,
    Counselling,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::ContentCreation,
        Category::Marketing,
        Category::Technology,
        Category::Counselling,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::ContentCreation => "Content Creation",
            Category::Marketing => "Marketing",
            Category::Technology => "Technology",
            Category::Counselling => "Counselling",
        }
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::Category(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 3] = [SkillLevel::Beginner, SkillLevel::Intermediate, SkillLevel::Expert];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Expert => "Expert",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SkillLevel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::SkillLevel(s.to_string()))
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub category: Category,
    pub skill_level: SkillLevel,
    pub price: Option<Price>,
    pub original_price: Option<Price>,
    pub duration: String,
    pub rating: f64,
    pub image: String,
    pub active: bool,
    pub skills: Vec<String>,
    pub tools: Vec<String>,
    pub modules: Vec<CourseModule>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CourseModule {
    pub title: String,
    pub description: String,
    pub details: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Trainer {
    pub id: TrainerId,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub contact: Contact,
    pub location: String,
    pub fee: Option<Price>,
    pub rating: f64,
    pub review_count: u32,
    pub availability: String,
    pub industry: String,
    pub skills: Vec<String>,
    pub expertise: Vec<String>,
    pub certifications: Vec<String>,
    pub achievements: Vec<String>,
    pub projects: Vec<Project>,
    pub courses: Vec<TaughtCourse>,
    pub education: Vec<Education>,
    pub testimonials: Vec<Testimonial>,
}

/// Every field is present; absent source values become empty strings.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub website: String,
    pub linkedin: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub impact: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaughtCourse {
    pub title: String,
    pub description: String,
    pub mode: String,
    pub rating: Option<f64>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Testimonial {
    pub name: String,
    pub position: String,
    pub text: String,
    pub rating: Option<f64>,
}
