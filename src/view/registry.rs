//! View Registry - Load view definitions from JSON
//!
//! This module loads all view definitions from embedded JSON files and
//! provides lookup functions for the rest of the application. New screens
//! can be added without code changes as long as the generic list/detail
//! rendering covers them.

use crate::controller::ResourceSpec;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded view JSON files (compiled into the binary)
const VIEW_FILES: &[&str] = &[
    include_str!("../views/overview.json"),
    include_str!("../views/files.json"),
    include_str!("../views/releases.json"),
];

/// How a column value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnFormat {
    #[default]
    Text,
    /// Byte count -> human readable size.
    Bytes,
    /// RFC3339 timestamp -> short date.
    Date,
}

/// Column definition for a list view
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
    #[serde(default)]
    pub format: ColumnFormat,
}

/// Labeled field on a detail view, read from one resource's payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub label: String,
    /// Resource name the value comes from.
    pub resource: String,
    pub json_path: String,
    #[serde(default)]
    pub format: ColumnFormat,
}

/// Confirmation config for actions
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfirmConfig {
    /// Message to show in confirmation dialog
    #[serde(default)]
    pub message: Option<String>,
    /// If true, default selection is Yes; if false, default is No
    #[serde(default)]
    pub default_yes: bool,
    /// If true, action is destructive (shown in red)
    #[serde(default)]
    pub destructive: bool,
}

/// Mutation action a view offers on its list items
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub shortcut: Option<String>,
    /// HTTP method of the write request ("DELETE", "PUT", "POST").
    pub method: String,
    /// Query parameter carrying the selected item's id.
    pub id_param: String,
    #[serde(default)]
    pub confirm: Option<ConfirmConfig>,
}

/// View definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ViewDef {
    pub title: String,
    /// Resources this view depends on, in store order.
    pub resources: Vec<ResourceSpec>,
    /// Resource rendered as the list table, when the view has one.
    #[serde(default)]
    pub list_resource: Option<String>,
    /// Dot path to the item array inside the list resource's payload;
    /// empty means the payload itself is the array.
    #[serde(default)]
    pub items_path: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// Labeled fields for detail-style views.
    #[serde(default)]
    pub detail_fields: Vec<FieldDef>,
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub name_field: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub empty_message: Option<String>,
    /// Shown instead of `empty_message` while a search is active.
    #[serde(default)]
    pub empty_search_message: Option<String>,
}

impl ViewDef {
    /// Whether this view renders a searchable list.
    pub fn is_list(&self) -> bool {
        self.list_resource.is_some()
    }

    pub fn action_by_shortcut(&self, shortcut: char) -> Option<&ActionDef> {
        self.actions
            .iter()
            .find(|a| a.shortcut.as_deref() == Some(shortcut.to_string().as_str()))
    }
}

/// Root structure of views/*.json
#[derive(Debug, Clone, Deserialize)]
struct ViewConfig {
    #[serde(default)]
    views: HashMap<String, ViewDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<HashMap<String, ViewDef>> = OnceLock::new();

fn get_registry() -> &'static HashMap<String, ViewDef> {
    REGISTRY.get_or_init(|| {
        let mut views = HashMap::new();

        for content in VIEW_FILES {
            let partial: ViewConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded view JSON: {}", e));
            views.extend(partial.views);
        }

        views
    })
}

/// Get a view definition by key
pub fn get_view(key: &str) -> Option<&'static ViewDef> {
    get_registry().get(key)
}

/// Get all view keys (for autocomplete), sorted
pub fn get_all_view_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry().keys().map(|s| s.as_str()).collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_loads_successfully() {
        assert!(!get_registry().is_empty(), "Registry should have views");
    }

    #[test]
    fn files_view_exists_with_delete_action() {
        let view = get_view("files").expect("files view should exist");
        assert_eq!(view.list_resource.as_deref(), Some("files"));
        assert!(view.is_list());

        let action = view.action_by_shortcut('x').expect("delete shortcut");
        assert_eq!(action.method, "DELETE");
        assert!(action.confirm.as_ref().unwrap().destructive);
    }

    #[test]
    fn overview_view_is_detail_only() {
        let view = get_view("overview").expect("overview view should exist");
        assert!(!view.is_list());
        assert!(!view.detail_fields.is_empty());
    }

    #[test]
    fn list_views_bind_search() {
        for key in ["files", "releases"] {
            let view = get_view(key).unwrap();
            let list = view.list_resource.as_deref().unwrap();
            let spec = view
                .resources
                .iter()
                .find(|r| r.name == list)
                .expect("list resource is declared");
            assert!(spec.search_param.is_some(), "{} should be searchable", key);
        }
    }

    #[test]
    fn get_all_view_keys_is_sorted() {
        let keys = get_all_view_keys();
        assert!(keys.contains(&"files"));
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }
}
