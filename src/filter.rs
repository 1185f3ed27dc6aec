//! Facet filtering over an already-fetched entity list.
//!
//! Options inside one group are OR'd, groups are AND'd, and a group with no
//! selected options does not constrain anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{Course, Trainer};
use crate::price::{Price, PriceTier};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FilterGroup {
    Category,
    Skill,
    Price,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    #[serde(default)]
    pub category: BTreeSet<String>,
    #[serde(default)]
    pub skill: BTreeSet<String>,
    #[serde(default)]
    pub price: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_mut(&mut self, group: FilterGroup) -> &mut BTreeSet<String> {
        match group {
            FilterGroup::Category => &mut self.category,
            FilterGroup::Skill => &mut self.skill,
            FilterGroup::Price => &mut self.price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_empty() && self.skill.is_empty() && self.price.is_empty()
    }

    pub fn matches<E: Filterable + ?Sized>(&self, entity: &E) -> bool {
        group_passes(&self.category, entity.category())
            && group_passes(&self.skill, entity.skill_level())
            && price_passes(&self.price, entity.price())
    }
}

/// The facets an entity exposes to filtering. `None` means the entity has no
/// value on that dimension and fails any non-empty group for it.
pub trait Filterable {
    fn category(&self) -> Option<&str>;
    fn skill_level(&self) -> Option<&str>;
    fn price(&self) -> Option<&Price>;
}

impl Filterable for Course {
    fn category(&self) -> Option<&str> {
        Some(self.category.as_str())
    }

    fn skill_level(&self) -> Option<&str> {
        Some(self.skill_level.as_str())
    }

    fn price(&self) -> Option<&Price> {
        self.price.as_ref()
    }
}

/// Trainers are grouped by industry and priced by fee; they carry no skill level.
impl Filterable for Trainer {
    fn category(&self) -> Option<&str> {
        Some(self.industry.as_str()).filter(|s| !s.is_empty())
    }

    fn skill_level(&self) -> Option<&str> {
        None
    }

    fn price(&self) -> Option<&Price> {
        self.fee.as_ref()
    }
}

fn group_passes(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    selected.is_empty() || value.is_some_and(|v| selected.contains(v))
}

fn price_passes(selected: &BTreeSet<String>, price: Option<&Price>) -> bool {
    if selected.is_empty() {
        return true;
    }
    let Some(tier) = price.map(Price::tier) else {
        return false;
    };
    selected
        .iter()
        .filter_map(|option| option.parse::<PriceTier>().ok())
        .any(|wanted| wanted == tier)
}

/// Entities passing every group, in input order.
pub fn apply_filters<E: Filterable + Clone>(entities: &[E], selection: &FilterSelection) -> Vec<E> {
    entities.iter().filter(|e| selection.matches(*e)).cloned().collect()
}

/// Adds `option` to `group` if absent, removes it if present.
pub fn toggle_option(selection: &FilterSelection, group: FilterGroup, option: &str) -> FilterSelection {
    let mut next = selection.clone();
    let options = next.group_mut(group);
    if !options.remove(option) {
        options.insert(option.to_string());
    }
    next
}

pub fn clear_all(_selection: &FilterSelection) -> FilterSelection {
    FilterSelection::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Contact, CourseId, SkillLevel, TrainerId};

    fn course(id: i64, category: Category, skill: SkillLevel, price: &str) -> Course {
        Course {
            id: CourseId(id),
            title: format!("Course {id}"),
            category,
            skill_level: skill,
            price: Price::parse(price),
            original_price: None,
            duration: "4 weeks".into(),
            rating: 4.5,
            image: String::new(),
            active: true,
            skills: vec![],
            tools: vec![],
            modules: vec![],
        }
    }

    fn selection(category: &[&str], skill: &[&str], price: &[&str]) -> FilterSelection {
        let set = |xs: &[&str]| -> BTreeSet<String> { xs.iter().map(|s| s.to_string()).collect() };
        FilterSelection { category: set(category), skill: set(skill), price: set(price) }
    }

    fn ids(courses: &[Course]) -> Vec<i64> {
        courses.iter().map(|c| c.id.0).collect()
    }

    fn scenario() -> Vec<Course> {
        vec![
            course(1, Category::Technology, SkillLevel::Beginner, "₹7500"),
            course(2, Category::Technology, SkillLevel::Expert, "₹0"),
            course(3, Category::Marketing, SkillLevel::Beginner, "₹3500"),
        ]
    }

    #[test]
    fn empty_selection_keeps_everything_in_order() {
        let list = scenario();
        assert_eq!(apply_filters(&list, &FilterSelection::new()), list);
    }

    #[test]
    fn options_or_within_a_group() {
        let list = vec![
            course(1, Category::Technology, SkillLevel::Beginner, "₹100"),
            course(2, Category::Marketing, SkillLevel::Expert, "₹100"),
        ];
        assert_eq!(ids(&apply_filters(&list, &selection(&["Technology"], &[], &[]))), [1]);
        assert_eq!(
            ids(&apply_filters(&list, &selection(&["Technology", "Marketing"], &[], &[]))),
            [1, 2]
        );
    }

    #[test]
    fn groups_and_together() {
        let result = apply_filters(&scenario(), &selection(&["Technology"], &["Beginner"], &[]));
        assert_eq!(ids(&result), [1]);
    }

    #[test]
    fn price_tiers_classify_zero_as_free() {
        let free = vec![course(1, Category::Marketing, SkillLevel::Beginner, "₹0")];
        let paid = vec![course(2, Category::Marketing, SkillLevel::Beginner, "₹3500")];

        assert_eq!(apply_filters(&free, &selection(&[], &[], &["Free"])).len(), 1);
        assert!(apply_filters(&free, &selection(&[], &[], &["Paid"])).is_empty());
        assert_eq!(apply_filters(&paid, &selection(&[], &[], &["Paid"])).len(), 1);
        assert!(apply_filters(&paid, &selection(&[], &[], &["Free"])).is_empty());
        assert_eq!(ids(&apply_filters(&scenario(), &selection(&[], &[], &["Free", "Paid"]))), [1, 2, 3]);
    }

    #[test]
    fn missing_price_matches_no_tier() {
        let mut c = course(1, Category::Marketing, SkillLevel::Beginner, "₹0");
        c.price = None;
        let list = vec![c];
        assert!(apply_filters(&list, &selection(&[], &[], &["Free", "Paid"])).is_empty());
        assert_eq!(apply_filters(&list, &FilterSelection::new()).len(), 1);
    }

    #[test]
    fn unknown_options_match_nothing() {
        assert!(apply_filters(&scenario(), &selection(&["Cooking"], &[], &[])).is_empty());
        assert!(apply_filters(&scenario(), &selection(&[], &[], &["Cheap"])).is_empty());
    }

    #[test]
    fn filtering_is_pure() {
        let list = scenario();
        let before = list.clone();
        let sel = selection(&["Technology"], &[], &["Paid"]);
        let first = apply_filters(&list, &sel);
        let second = apply_filters(&list, &sel);
        assert_eq!(first, second);
        assert_eq!(list, before);
        assert_eq!(sel, selection(&["Technology"], &[], &["Paid"]));
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let start = selection(&["Marketing"], &["Expert"], &[]);
        let once = toggle_option(&start, FilterGroup::Category, "Technology");
        assert!(once.category.contains("Technology"));
        assert_eq!(start.category.len(), 1, "input is not mutated");
        let twice = toggle_option(&once, FilterGroup::Category, "Technology");
        assert_eq!(twice, start);

        let removed = toggle_option(&start, FilterGroup::Skill, "Expert");
        assert!(removed.skill.is_empty());
    }

    #[test]
    fn clear_resets_every_group() {
        let sel = selection(&["Marketing"], &["Expert"], &["Free"]);
        let cleared = clear_all(&sel);
        assert!(cleared.is_empty());
        assert!(!sel.is_empty());
        assert!(cleared.category.is_empty() && cleared.skill.is_empty() && cleared.price.is_empty());
    }

    #[test]
    fn trainers_filter_on_industry_and_fee() {
        let trainer = |id, industry: &str, fee: &str| Trainer {
            id: TrainerId(id),
            name: format!("Trainer {id}"),
            title: String::new(),
            bio: String::new(),
            contact: Contact::default(),
            location: String::new(),
            fee: Price::parse(fee),
            rating: 0.0,
            review_count: 0,
            availability: String::new(),
            industry: industry.to_string(),
            skills: vec![],
            expertise: vec![],
            certifications: vec![],
            achievements: vec![],
            projects: vec![],
            courses: vec![],
            education: vec![],
            testimonials: vec![],
        };
        let list = vec![trainer(1, "Marketing", "₹0"), trainer(2, "Technology", "₹2500")];

        let free: Vec<_> = apply_filters(&list, &selection(&[], &[], &["Free"])).into_iter().map(|t| t.id.0).collect();
        assert_eq!(free, [1]);
        let tech: Vec<_> = apply_filters(&list, &selection(&["Technology"], &[], &[])).into_iter().map(|t| t.id.0).collect();
        assert_eq!(tech, [2]);
        assert!(apply_filters(&list, &selection(&[], &["Beginner"], &[])).is_empty());
    }

    #[test]
    fn selection_deserializes_with_missing_groups() {
        let sel: FilterSelection = serde_json::from_str(r#"{"category": ["Technology"]}"#).unwrap();
        assert_eq!(sel, selection(&["Technology"], &[], &[]));
    }
}
