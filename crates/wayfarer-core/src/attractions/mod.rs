//! Grouping of attraction lists for display.

use wayfarer_store::models::{Attraction, AttractionCategory};

use crate::i18n::Translate;

/// Attractions sharing one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: AttractionCategory,
    pub attractions: Vec<Attraction>,
}

/// Group attractions by category in taxonomy order.
///
/// Unrecognized categories follow the known ones in the order they first
/// appear; a blank category is filed under `Other`. Within a group the
/// model's order is kept. A name seen earlier in the list is skipped.
pub fn group_by_category(attractions: &[Attraction]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut seen_names: Vec<&str> = Vec::new();

    for attraction in attractions {
        if seen_names.contains(&attraction.name.as_str()) {
            continue;
        }
        seen_names.push(&attraction.name);

        let category = match &attraction.category {
            AttractionCategory::Other(label) if label.trim().is_empty() => {
                AttractionCategory::Other("Other".to_string())
            }
            other => other.clone(),
        };
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.attractions.push(attraction.clone()),
            None => groups.push(CategoryGroup {
                category,
                attractions: vec![attraction.clone()],
            }),
        }
    }

    // Stable sort keeps first-seen order among unknown categories.
    groups.sort_by_key(|g| g.category.rank());
    groups
}

/// Translated heading for a category; unknown categories show as given.
pub fn category_heading(category: &AttractionCategory, tr: &dyn Translate) -> String {
    let key = match category {
        AttractionCategory::Landmarks => "categoryLandmarks",
        AttractionCategory::Museums => "categoryMuseums",
        AttractionCategory::Nature => "categoryNature",
        AttractionCategory::Shopping => "categoryShopping",
        AttractionCategory::Entertainment => "categoryEntertainment",
        AttractionCategory::Other(label) if label == "Other" => "categoryOther",
        AttractionCategory::Other(label) => return label.clone(),
    };
    tr.t(key)
}
