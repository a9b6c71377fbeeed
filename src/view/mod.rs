//! Declarative view definitions
//!
//! Views are configuration, not code: each screen declares its resources,
//! list columns, and actions in JSON compiled into the binary. The registry
//! loads them once; the app resolves the active view's resources through the
//! controller and renders whatever comes back.
//!
//! - [`registry`] - loads and caches view definitions from embedded JSON
//! - [`display`] - JSON field extraction and column formatting helpers

mod display;
mod registry;

pub use display::{extract_json_value, format_bytes, format_timestamp_short};
pub use registry::{
    get_all_view_keys, get_view, ActionDef, ColumnDef, ColumnFormat, ConfirmConfig, FieldDef,
    ViewDef,
};
