// File: gkey-common/src/models/catalog.rs

use std::collections::HashSet;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::Error;

/// One entry of the category catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefinition {
    pub category: String,
    pub display_name: String,
    pub description: String,
    pub color: String,
    pub default_cooloff_hours: i32,
    /// Reserved. Carried through configuration but never enforced.
    #[serde(default = "default_max_usage_per_day")]
    pub max_usage_per_day: i32,
}

fn default_max_usage_per_day() -> i32 {
    1
}

/// Ordered, validated and immutable list of categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCatalog {
    categories: Vec<CategoryDefinition>,
}

/// Lowercase + trim. Campaign data uses arbitrary casing, catalog slugs do not.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalizes a campaign's category list, dropping blanks and duplicates
/// while keeping first-seen order.
pub fn normalize_categories<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|c| normalize_category(c.as_ref()))
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

impl CategoryCatalog {
    pub fn new(categories: Vec<CategoryDefinition>) -> Result<Self, Error> {
        if categories.is_empty() {
            return Err(Error::Config("category catalog is empty".into()));
        }

        let mut seen = HashSet::new();
        for def in &categories {
            if def.category.is_empty() || def.category != normalize_category(&def.category) {
                return Err(Error::Config(format!(
                    "category slug '{}' must be non-empty, lowercase and trimmed",
                    def.category
                )));
            }
            if !seen.insert(def.category.as_str()) {
                return Err(Error::Config(format!("duplicate category slug '{}'", def.category)));
            }
            if def.default_cooloff_hours <= 0 {
                return Err(Error::Config(format!(
                    "category '{}' has non-positive default_cooloff_hours {}",
                    def.category, def.default_cooloff_hours
                )));
            }
            if def.max_usage_per_day <= 0 {
                return Err(Error::Config(format!(
                    "category '{}' has non-positive max_usage_per_day {}",
                    def.category, def.max_usage_per_day
                )));
            }
        }

        Ok(Self { categories })
    }

    /// Parses a JSON array of category definitions.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let categories: Vec<CategoryDefinition> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn get(&self, category: &str) -> Option<&CategoryDefinition> {
        let slug = normalize_category(category);
        self.categories.iter().find(|d| d.category == slug)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// Catalog index of a slug, used to keep listings in catalog order.
    pub fn position(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|d| d.category == category)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|d| d.category.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryDefinition> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
