//! Read-only checklist catalog: category name → ordered checklist items.
//!
//! The catalog is built once at startup and shared behind an `Arc`; nothing
//! mutates it afterwards, so concurrent readers need no locking. Tests build
//! fixtures with [`ChecklistCatalog::from_categories`].

use crate::error::DocReviewError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// One evaluation criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub section: String,
    pub item: String,
}

impl ChecklistItem {
    pub fn new(section: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            item: item.into(),
        }
    }
}

/// A named, ordered list of checklist items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<ChecklistItem>,
}

/// The process-wide checklist table.
#[derive(Debug, Clone, Default)]
pub struct ChecklistCatalog {
    order: Vec<String>,
    by_name: HashMap<String, Vec<ChecklistItem>>,
}

/// On-disk layout written by the spreadsheet conversion script.
#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    sheets: Option<Vec<String>>,
    #[serde(default)]
    data: BTreeMap<String, Vec<serde_json::Value>>,
}

/// A spreadsheet row; column headers vary between checklist workbooks.
#[derive(Deserialize)]
struct CatalogRecord {
    #[serde(default, alias = "Section", alias = "SECTION", alias = "Area")]
    section: Option<serde_json::Value>,
    #[serde(
        default,
        alias = "Item",
        alias = "Checklist Item",
        alias = "Checklist",
        alias = "Description"
    )]
    item: Option<serde_json::Value>,
}

impl ChecklistCatalog {
    /// A catalog with no categories; every lookup yields an empty list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from in-memory categories, preserving their order.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut catalog = Self::default();
        for cat in categories {
            if !catalog.by_name.contains_key(&cat.name) {
                catalog.order.push(cat.name.clone());
            }
            catalog.by_name.insert(cat.name, cat.items);
        }
        catalog
    }

    /// Parse the `{"sheets": [...], "data": {...}}` JSON layout.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let order = file
            .sheets
            .unwrap_or_else(|| file.data.keys().cloned().collect());

        let categories = order.into_iter().map(|name| {
            let items = file
                .data
                .get(&name)
                .map(|rows| rows.iter().filter_map(record_to_item).collect())
                .unwrap_or_default();
            Category { name, items }
        });

        Ok(Self::from_categories(categories))
    }

    /// Load the catalog from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocReviewError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| DocReviewError::CatalogLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let catalog = Self::from_json_str(&raw).map_err(|e| DocReviewError::CatalogLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        info!(
            "Loaded {} checklist categories from {}",
            catalog.order.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Category names in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Items for `category`; empty when the category is unknown.
    pub fn items_for(&self, category: &str) -> &[ChecklistItem] {
        self.by_name
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn record_to_item(row: &serde_json::Value) -> Option<ChecklistItem> {
    let record: CatalogRecord = serde_json::from_value(row.clone()).ok()?;
    let item = record.item.as_ref().and_then(cell_text)?;
    let section = record.section.as_ref().and_then(cell_text).unwrap_or_default();
    if item.is_empty() {
        debug!("Skipping checklist row without item text");
        return None;
    }
    Some(ChecklistItem { section, item })
}

/// Render a JSON cell as trimmed text; `null`/NaN cells count as empty.
fn cell_text(v: &serde_json::Value) -> Option<String> {
    let text = match v {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "sheets": ["Functional Spec", "Test Plan", "Empty"],
        "data": {
            "Test Plan": [
                {"Section": "Scope", "Checklist Item": "In-scope features are listed"}
            ],
            "Functional Spec": [
                {"Section": "General", "Checklist Item": "Document has a version history"},
                {"Section": "General", "Checklist Item": null},
                {"Section": null, "Checklist Item": "Glossary defines acronyms"},
                {"section": "Design", "item": "Interfaces are described", "Owner": "QA"}
            ]
        }
    }"#;

    #[test]
    fn loads_categories_in_sheet_order() {
        let catalog = ChecklistCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            catalog.categories(),
            vec!["Functional Spec", "Test Plan", "Empty"]
        );
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn items_keep_order_and_skip_blank_rows() {
        let catalog = ChecklistCatalog::from_json_str(SAMPLE).unwrap();
        let items = catalog.items_for("Functional Spec");
        assert_eq!(
            items,
            &[
                ChecklistItem::new("General", "Document has a version history"),
                ChecklistItem::new("", "Glossary defines acronyms"),
                ChecklistItem::new("Design", "Interfaces are described"),
            ]
        );
        assert!(catalog.items_for("Empty").is_empty());
    }

    #[test]
    fn unknown_category_is_empty_not_error() {
        let catalog = ChecklistCatalog::from_json_str(SAMPLE).unwrap();
        assert!(catalog.items_for("No Such Sheet").is_empty());
        assert!(ChecklistCatalog::empty().items_for("anything").is_empty());
    }

    #[test]
    fn missing_sheets_list_falls_back_to_sorted_keys() {
        let catalog = ChecklistCatalog::from_json_str(
            r#"{"data": {"b": [{"item": "x"}], "a": [{"item": "y"}]}}"#,
        )
        .unwrap();
        assert_eq!(catalog.categories(), vec!["a", "b"]);
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = ChecklistCatalog::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DocReviewError::CatalogLoad { .. }));
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checklists.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let catalog = ChecklistCatalog::from_path(&path).unwrap();
        assert_eq!(catalog.items_for("Test Plan").len(), 1);
    }

    #[test]
    fn fixture_catalog() {
        let catalog = ChecklistCatalog::from_categories([Category {
            name: "Fixture".into(),
            items: vec![ChecklistItem::new("S", "I")],
        }]);
        assert_eq!(catalog.categories(), vec!["Fixture"]);
        assert_eq!(catalog.items_for("Fixture")[0].item, "I");
    }
}
