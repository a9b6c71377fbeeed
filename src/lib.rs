//! Core library for remoteview.
//!
//! The load-bearing piece is the asynchronous multi-resource controller in
//! [`controller`]: it resolves a view's declarative resource list into
//! concrete requests, fetches them concurrently through an injected
//! [`api::Transport`], tracks per-resource state with stale-response
//! suppression, and exposes mutation helpers that refetch the mutated
//! resource without disturbing the rest.
//!
//! - [`api`] - HTTP transport seam and the reqwest-backed implementation
//! - [`controller`] - descriptor resolution, fetch coordination, result store
//! - [`route`] - explicit route/query state views are resolved against
//! - [`view`] - declarative view definitions loaded from embedded JSON

pub mod api;
pub mod controller;
pub mod route;
pub mod view;
