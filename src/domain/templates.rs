//! Built-in project templates that seed an empty category skeleton.

use crate::errors::{BudgetError, Result};

use super::budget::{Category, Subcategory};

/// A named skeleton of categories and subcategories.
#[derive(Debug, Clone, Copy)]
pub struct ProjectTemplate {
    pub key: &'static str,
    pub label: &'static str,
    sections: &'static [(&'static str, &'static [&'static str])],
}

const TEMPLATES: &[ProjectTemplate] = &[
    ProjectTemplate {
        key: "blank",
        label: "Blank project",
        sections: &[],
    },
    ProjectTemplate {
        key: "wedding",
        label: "Wedding",
        sections: &[
            ("Reception", &["Venue", "Catering", "Drinks"]),
            ("Attire", &["Dress", "Suit", "Accessories"]),
            ("Decoration", &["Flowers", "Table settings"]),
            ("Entertainment", &["Music", "Photographer"]),
            ("Stationery", &["Invitations", "Thank-you cards"]),
        ],
    },
    ProjectTemplate {
        key: "birthday",
        label: "Birthday party",
        sections: &[
            ("Food", &["Cake", "Snacks", "Drinks"]),
            ("Decoration", &["Balloons", "Tableware"]),
            ("Activities", &["Games", "Entertainment"]),
            ("Gifts", &["Party favours"]),
        ],
    },
    ProjectTemplate {
        key: "travel",
        label: "Trip",
        sections: &[
            ("Transport", &["Flights", "Local transport", "Car rental"]),
            ("Accommodation", &["Hotel"]),
            ("Food", &["Restaurants", "Groceries"]),
            ("Activities", &["Tours", "Tickets"]),
            ("Miscellaneous", &["Insurance", "Souvenirs"]),
        ],
    },
    ProjectTemplate {
        key: "renovation",
        label: "Home renovation",
        sections: &[
            ("Materials", &["Paint", "Flooring", "Fixtures"]),
            ("Labour", &["Contractors", "Electrician", "Plumber"]),
            ("Tools", &["Purchase", "Rental"]),
            ("Permits", &["Fees"]),
        ],
    },
    ProjectTemplate {
        key: "moving",
        label: "Moving house",
        sections: &[
            ("Removal", &["Movers", "Van rental", "Packing supplies"]),
            ("New home", &["Deposit", "Utilities setup", "Furniture"]),
            ("Administration", &["Address change", "Insurance"]),
        ],
    },
];

impl ProjectTemplate {
    pub fn all() -> &'static [ProjectTemplate] {
        TEMPLATES
    }

    pub fn find(key: &str) -> Result<&'static ProjectTemplate> {
        let needle = key.trim();
        TEMPLATES
            .iter()
            .find(|template| {
                template.key.eq_ignore_ascii_case(needle)
                    || template.label.eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| {
                BudgetError::InvalidInput(format!(
                    "unknown template `{}` (available: {})",
                    key,
                    TEMPLATES
                        .iter()
                        .map(|t| t.key)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    /// Builds the category skeleton with zero amounts.
    pub fn categories(&self) -> Vec<Category> {
        self.sections
            .iter()
            .map(|(name, subcategories)| {
                let mut category = Category::new(*name, 0.0);
                category.subcategories = subcategories
                    .iter()
                    .map(|sub| Subcategory::new(*sub, 0.0))
                    .collect();
                category
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_resolve_by_key_or_label() {
        assert_eq!(ProjectTemplate::find("Wedding").unwrap().key, "wedding");
        assert_eq!(ProjectTemplate::find("trip").unwrap().key, "travel");
        assert!(ProjectTemplate::find("spaceship").is_err());
    }

    #[test]
    fn template_skeleton_has_zero_amounts() {
        let categories = ProjectTemplate::find("travel").unwrap().categories();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0].subcategories.len(), 3);
        assert!(categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .all(|s| s.amount == 0.0 && s.lines.is_empty()));
        assert!(ProjectTemplate::find("blank").unwrap().categories().is_empty());
    }
}
