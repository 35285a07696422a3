// File: gkey-core/src/catalog.rs
//
// Built-in category catalog. Adding a category is a deploy-time change and
// needs a backfill pass (`KeyLeaseManager::backfill_catalog`) for existing users.

use std::path::Path;
use tracing::info;
use gkey_common::models::{CategoryCatalog, CategoryDefinition};
use crate::Error;

/// Release cooloff used when neither the caller nor the catalog supplies one.
pub const DEFAULT_COOLOFF_HOURS: i32 = 720;

fn def(
    category: &str,
    display_name: &str,
    description: &str,
    color: &str,
    default_cooloff_hours: i32,
) -> CategoryDefinition {
    CategoryDefinition {
        category: category.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        color: color.to_string(),
        default_cooloff_hours,
        max_usage_per_day: 1,
    }
}

fn default_definitions() -> Vec<CategoryDefinition> {
    vec![
        def("gaming", "Gaming", "Video game streams, playthroughs and reviews", "#8B5CF6", 360),
        def("irl", "IRL", "Just chatting, vlogs and real-life streams", "#F59E0B", 720),
        def("music", "Music", "Live music, production and DJ sets", "#EC4899", 720),
        def("creative", "Creative", "Art, design and maker streams", "#10B981", 720),
        def("tech", "Tech", "Software, hardware and gadget content", "#3B82F6", 720),
        def("sports", "Sports", "Sports commentary and fitness", "#EF4444", 720),
        def("education", "Education", "Tutorials, courses and science", "#6366F1", 720),
        def("lifestyle", "Lifestyle", "Fashion, travel and everyday living", "#F97316", 720),
        def("food", "Food", "Cooking and food reviews", "#84CC16", 720),
        def("beauty", "Beauty", "Makeup, skincare and grooming", "#DB2777", 720),
        def("esports", "Esports", "Competitive gaming and tournaments", "#0EA5E9", 360),
    ]
}

pub fn default_catalog() -> CategoryCatalog {
    // The built-in list is covered by `default_catalog_is_valid`.
    match CategoryCatalog::new(default_definitions()) {
        Ok(catalog) => catalog,
        Err(e) => panic!("built-in category catalog is invalid: {}", e),
    }
}

/// Loads the catalog from a JSON file when one is given, else the built-in one.
pub fn load_catalog(path: Option<&Path>) -> Result<CategoryCatalog, Error> {
    match path {
        Some(p) => {
            let catalog = CategoryCatalog::from_path(p)?;
            info!("Loaded {} categories from {}", catalog.len(), p.display());
            Ok(catalog)
        }
        None => {
            let catalog = default_catalog();
            info!("Using built-in catalog with {} categories", catalog.len());
            Ok(catalog)
        }
    }
}
