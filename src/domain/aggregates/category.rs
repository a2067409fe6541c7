//! Catalogue categories and their URL slugs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

const SLUG_OVERRIDES: [(&str, &str); 5] = [
    ("Home & Garden", "home-garden"),
    ("Electronics", "electronics"),
    ("Fashion", "fashion"),
    ("Sports", "sports"),
    ("Books", "books"),
];

impl Category {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), description, image_url: None, created_at: Utc::now() }
    }

    pub fn slug(&self) -> String { slug_for(&self.name) }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&term))
    }
}

pub fn slug_for(name: &str) -> String {
    if let Some((_, slug)) = SLUG_OVERRIDES.iter().find(|(n, _)| *n == name) {
        return slug.to_string();
    }
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// Inverse of [`slug_for`] for everything but names with punctuation outside the overrides.
pub fn name_from_slug(slug: &str) -> String {
    if let Some((name, _)) = SLUG_OVERRIDES.iter().find(|(_, s)| *s == slug) {
        return name.to_string();
    }
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs() {
        assert_eq!(slug_for("Home & Garden"), "home-garden");
        assert_eq!(slug_for("Baby & Kids"), "baby-&-kids");
        assert_eq!(slug_for("Pet  Supplies"), "pet-supplies");
        assert_eq!(name_from_slug("home-garden"), "Home & Garden");
        assert_eq!(name_from_slug("pet-supplies"), "Pet Supplies");
        assert_eq!(name_from_slug("electronics"), "Electronics");
    }

    #[test]
    fn test_search() {
        let c = Category::new("Electronics", Some("Phones and laptops".into()));
        assert!(c.matches_search("LAPTOP"));
        assert!(c.matches_search(""));
        assert!(!c.matches_search("shoes"));
    }
}
