use std::collections::HashSet;
use std::fs;
use std::path::Path;

use moa_core::Severity;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Layout tree
// ---------------------------------------------------------------------------

/// Static navigation taxonomy of one module: category → sub-category → filter.
///
/// Declaration order matters everywhere: the first category is the initial
/// one, and a category's first sub-category is selected when entering it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleLayout {
    pub module: String,
    pub label: String,
    pub categories: Vec<CategoryDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub sub_categories: Vec<SubCategoryDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCategoryDef {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub filters: Vec<FilterDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDef {
    pub id: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ModuleLayout {
    /// Parse and validate a layout from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let layout: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Read, parse and validate a layout file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module.trim().is_empty() {
            return Err(ConfigError::Validation("module id is empty".into()));
        }
        if self.categories.is_empty() {
            return Err(ConfigError::Validation(format!(
                "module '{}' declares no categories",
                self.module
            )));
        }

        let mut seen = HashSet::new();
        for cat in &self.categories {
            if !seen.insert(cat.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category '{}'",
                    cat.id
                )));
            }

            let mut subs = HashSet::new();
            for sub in &cat.sub_categories {
                if !subs.insert(sub.id.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "category '{}': duplicate sub-category '{}'",
                        cat.id, sub.id
                    )));
                }

                let mut filters = HashSet::new();
                for filter in &sub.filters {
                    if !filters.insert(filter.id.as_str()) {
                        return Err(ConfigError::Validation(format!(
                            "sub-category '{}.{}': duplicate filter '{}'",
                            cat.id, sub.id, filter.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn first_category(&self) -> Option<&CategoryDef> {
        self.categories.first()
    }

    pub fn category(&self, id: &str) -> Option<&CategoryDef> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn sub_category(&self, category: &str, sub: &str) -> Option<&SubCategoryDef> {
        self.category(category)?.sub_category(sub)
    }

    pub fn filter(&self, category: &str, sub: &str, filter: &str) -> Option<&FilterDef> {
        self.sub_category(category, sub)?.filter(filter)
    }
}

impl CategoryDef {
    pub fn sub_category(&self, id: &str) -> Option<&SubCategoryDef> {
        self.sub_categories.iter().find(|s| s.id == id)
    }

    /// Sub-category selected when entering this category.
    pub fn default_sub_category(&self) -> Option<&SubCategoryDef> {
        self.sub_categories.first()
    }
}

impl SubCategoryDef {
    pub fn filter(&self, id: &str) -> Option<&FilterDef> {
        self.filters.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
module = "audit"
label = "Audit"

[[categories]]
id = "pending"
label = "En attente"

[[categories.sub_categories]]
id = "to-review"
label = "À revoir"
severity = "warning"

[[categories.sub_categories.filters]]
id = "unresolved"
label = "Non résolus"

[[categories.sub_categories]]
id = "assigned"
label = "Assignés"

[[categories]]
id = "urgent"
label = "Urgent"

[[categories.sub_categories]]
id = "critical"
label = "Critiques"
severity = "critical"
"#;

    #[test]
    fn parses_nested_tree() {
        let layout = ModuleLayout::from_toml(SAMPLE).unwrap();
        assert_eq!(layout.module, "audit");
        assert_eq!(layout.first_category().unwrap().id, "pending");

        let pending = layout.category("pending").unwrap();
        assert_eq!(pending.default_sub_category().unwrap().id, "to-review");
        assert_eq!(pending.sub_categories[1].severity, Severity::Neutral);

        let filter = layout.filter("pending", "to-review", "unresolved").unwrap();
        assert_eq!(filter.label, "Non résolus");
        assert!(layout.filter("pending", "assigned", "unresolved").is_none());
        assert_eq!(
            layout.sub_category("urgent", "critical").unwrap().severity,
            Severity::Critical
        );
    }

    #[test]
    fn rejects_duplicate_category() {
        let text = r#"
module = "m"
label = "M"
[[categories]]
id = "a"
label = "A"
[[categories]]
id = "a"
label = "A bis"
"#;
        let err = ModuleLayout::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate category")));
    }

    #[test]
    fn rejects_duplicate_filter() {
        let text = r#"
module = "m"
label = "M"
[[categories]]
id = "a"
label = "A"
[[categories.sub_categories]]
id = "s"
label = "S"
[[categories.sub_categories.filters]]
id = "f"
label = "F"
[[categories.sub_categories.filters]]
id = "f"
label = "F"
"#;
        assert!(matches!(
            ModuleLayout::from_toml(text),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_layout() {
        let err = ModuleLayout::from_toml("module = \"m\"\nlabel = \"M\"\ncategories = []\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = ModuleLayout::from_toml("label = \"M\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn category_without_sub_categories_is_valid() {
        let text = r#"
module = "m"
label = "M"
[[categories]]
id = "overview"
label = "Vue d'ensemble"
"#;
        let layout = ModuleLayout::from_toml(text).unwrap();
        assert!(layout.category("overview").unwrap().default_sub_category().is_none());
    }

    #[test]
    fn load_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModuleLayout::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
