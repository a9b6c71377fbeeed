//! Per-resource result store
//!
//! Holds one slot per declared resource: the last settled payload, the last
//! error, pagination links, and the epoch of the fetch generation that
//! currently owns the slot. The store is owned by exactly one controller;
//! the epoch comparison in [`ResultStore::apply`] is the only concurrency
//! control it needs.

use super::pagination::{parse_link_header, PageLinks};
use crate::api::{ApiError, ApiResponse};
use serde_json::Value;
use std::collections::HashMap;

/// Epoch stamp no in-flight request can ever carry; set on close.
pub(crate) const SEALED_EPOCH: u64 = u64::MAX;

/// Lifecycle of a single resource fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    Success,
    Failure,
}

/// Normalized error description surfaced to views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub status: Option<u16>,
    pub message: String,
}

impl From<&ApiError> for ErrorInfo {
    fn from(error: &ApiError) -> Self {
        Self {
            status: error.status(),
            message: error.to_string(),
        }
    }
}

/// Current state of one named resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState {
    pub status: FetchStatus,
    /// Last successful payload. A failed refetch leaves this in place so the
    /// view keeps showing last-known-good data.
    pub payload: Option<Value>,
    pub error: Option<ErrorInfo>,
    pub page_links: Option<PageLinks>,
    pub total: Option<u64>,
}

impl FetchState {
    fn pending() -> Self {
        Self {
            status: FetchStatus::Pending,
            payload: None,
            error: None,
            page_links: None,
            total: None,
        }
    }
}

/// Loading/error/ready summary across all of a view's resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStatus {
    Loading,
    Error,
    Ready,
}

/// Slot ordering follows descriptor declaration order.
#[derive(Debug, Default)]
pub struct ResultStore {
    order: Vec<String>,
    slots: HashMap<String, Slot>,
}

#[derive(Debug)]
struct Slot {
    epoch: u64,
    state: FetchState,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch generation over `names`. Existing slots keep their
    /// last payload so failures don't clobber displayed data; slots for
    /// resources no longer declared are dropped.
    pub(crate) fn begin(&mut self, names: &[String], epoch: u64) {
        self.slots.retain(|name, _| names.contains(name));
        self.order = names.to_vec();

        for name in names {
            self.begin_one(name, epoch);
        }
    }

    /// Re-arm a single slot under a fresh epoch, leaving the rest untouched.
    pub(crate) fn begin_one(&mut self, name: &str, epoch: u64) {
        let slot = self.slots.entry(name.to_string()).or_insert(Slot {
            epoch,
            state: FetchState::pending(),
        });
        slot.epoch = epoch;
        slot.state.status = FetchStatus::Pending;
        slot.state.error = None;
    }

    /// Apply a settled request. Returns whether the store changed; a stale
    /// or unknown settlement is discarded silently.
    pub(crate) fn apply(
        &mut self,
        name: &str,
        epoch: u64,
        outcome: Result<ApiResponse, ApiError>,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(name) else {
            return false;
        };
        if slot.epoch != epoch {
            return false;
        }

        match outcome {
            Ok(response) => {
                slot.state.status = FetchStatus::Success;
                slot.state.payload = Some(response.payload);
                slot.state.error = None;
                slot.state.page_links = response
                    .link_header
                    .as_deref()
                    .and_then(parse_link_header);
                slot.state.total = response.total;
            }
            Err(error) => {
                slot.state.status = FetchStatus::Failure;
                slot.state.error = Some(ErrorInfo::from(&error));
            }
        }

        true
    }

    /// Current state of a resource, or `None` if it was never declared.
    pub fn read(&self, name: &str) -> Option<&FetchState> {
        self.slots.get(name).map(|slot| &slot.state)
    }

    pub fn page_links(&self, name: &str) -> Option<&PageLinks> {
        self.read(name).and_then(|state| state.page_links.as_ref())
    }

    pub fn total(&self, name: &str) -> Option<u64> {
        self.read(name).and_then(|state| state.total)
    }

    /// Declared resource names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Derived summary; computed on demand, never cached.
    pub fn aggregate(&self) -> AggregateStatus {
        let mut failed = false;
        for slot in self.slots.values() {
            match slot.state.status {
                FetchStatus::Pending => return AggregateStatus::Loading,
                FetchStatus::Failure => failed = true,
                FetchStatus::Success => {}
            }
        }
        if failed {
            AggregateStatus::Error
        } else {
            AggregateStatus::Ready
        }
    }

    /// Stamp every slot with the sentinel so no in-flight settlement can
    /// match again.
    pub(crate) fn seal(&mut self) {
        for slot in self.slots.values_mut() {
            slot.epoch = SEALED_EPOCH;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn ok(payload: Value) -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse::ok(payload))
    }

    fn server_error(status: u16) -> Result<ApiResponse, ApiError> {
        Err(ApiError::Server {
            status,
            message: "boom".to_string(),
        })
    }

    #[test]
    fn empty_store_is_ready() {
        assert_eq!(ResultStore::new().aggregate(), AggregateStatus::Ready);
    }

    #[test]
    fn aggregate_transitions() {
        let mut store = ResultStore::new();
        store.begin(&names(&["project", "files"]), 1);
        assert_eq!(store.aggregate(), AggregateStatus::Loading);

        assert!(store.apply("project", 1, ok(json!({"slug": "web"}))));
        // One resource still pending: aggregate stays loading.
        assert_eq!(store.aggregate(), AggregateStatus::Loading);

        assert!(store.apply("files", 1, ok(json!([]))));
        assert_eq!(store.aggregate(), AggregateStatus::Ready);
    }

    #[test]
    fn any_failure_after_settle_is_error() {
        let mut store = ResultStore::new();
        store.begin(&names(&["project", "files"]), 1);
        store.apply("project", 1, ok(json!({})));
        store.apply("files", 1, server_error(500));

        assert_eq!(store.aggregate(), AggregateStatus::Error);
        assert_eq!(
            store.read("project").unwrap().status,
            FetchStatus::Success
        );
        let files = store.read("files").unwrap();
        assert_eq!(files.status, FetchStatus::Failure);
        assert_eq!(files.error.as_ref().unwrap().status, Some(500));
        assert!(files.payload.is_none());
    }

    #[test]
    fn stale_epoch_is_discarded() {
        let mut store = ResultStore::new();
        store.begin(&names(&["files"]), 1);
        store.begin(&names(&["files"]), 2);

        assert!(!store.apply("files", 1, ok(json!(["old"]))));
        assert_eq!(store.read("files").unwrap().status, FetchStatus::Pending);

        assert!(store.apply("files", 2, ok(json!(["new"]))));
        assert_eq!(
            store.read("files").unwrap().payload,
            Some(json!(["new"]))
        );
    }

    #[test]
    fn failure_preserves_last_good_payload() {
        let mut store = ResultStore::new();
        store.begin(&names(&["files"]), 1);
        store.apply("files", 1, ok(json!(["a", "b"])));

        store.begin_one("files", 2);
        store.apply("files", 2, server_error(502));

        let state = store.read("files").unwrap();
        assert_eq!(state.status, FetchStatus::Failure);
        assert_eq!(state.payload, Some(json!(["a", "b"])));
    }

    #[test]
    fn scoped_begin_leaves_others_alone() {
        let mut store = ResultStore::new();
        store.begin(&names(&["project", "files"]), 1);
        store.apply("project", 1, ok(json!({"slug": "web"})));
        store.apply("files", 1, ok(json!(["a"])));

        store.begin_one("files", 2);
        assert_eq!(
            store.read("project").unwrap().status,
            FetchStatus::Success
        );
        assert_eq!(store.read("files").unwrap().status, FetchStatus::Pending);

        // The untouched slot still answers to its original epoch.
        assert!(store.apply("project", 1, ok(json!({"slug": "web2"}))));
    }

    #[test]
    fn sealed_store_discards_everything() {
        let mut store = ResultStore::new();
        store.begin(&names(&["files"]), 1);
        store.seal();

        assert!(!store.apply("files", 1, ok(json!(["late"]))));
        assert_eq!(store.read("files").unwrap().status, FetchStatus::Pending);
    }

    #[test]
    fn undeclared_resource_is_dropped_on_begin() {
        let mut store = ResultStore::new();
        store.begin(&names(&["project", "files"]), 1);
        store.begin(&names(&["project"]), 2);

        assert!(store.read("files").is_none());
        assert!(!store.apply("files", 1, ok(json!([]))));
    }

    #[test]
    fn pagination_metadata_is_captured() {
        let mut store = ResultStore::new();
        store.begin(&names(&["files"]), 1);

        let response = ApiResponse {
            status: 200,
            payload: json!([]),
            link_header: Some(
                "<https://example.com/f/?cursor=0:100:0>; rel=\"next\"; \
                 results=\"true\"; cursor=\"0:100:0\""
                    .to_string(),
            ),
            total: Some(250),
        };
        store.apply("files", 1, Ok(response));

        assert!(store.page_links("files").unwrap().has_next());
        assert_eq!(store.total("files"), Some(250));
    }

    #[test]
    fn malformed_link_header_degrades_to_no_pages() {
        let mut store = ResultStore::new();
        store.begin(&names(&["files"]), 1);

        let response = ApiResponse {
            status: 200,
            payload: json!([]),
            link_header: Some("definitely not a link header".to_string()),
            total: None,
        };
        store.apply("files", 1, Ok(response));

        let state = store.read("files").unwrap();
        assert_eq!(state.status, FetchStatus::Success);
        assert!(state.page_links.is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_outcome() -> impl Strategy<Value = Result<ApiResponse, ApiError>> {
        prop_oneof![
            any::<u32>().prop_map(|n| Ok(ApiResponse::ok(json!({ "n": n })))),
            (400u16..600, "[a-z]{1,12}").prop_map(|(status, message)| {
                Err(ApiError::Server { status, message })
            }),
        ]
    }

    proptest! {
        /// A settlement carrying any epoch but the current one is an
        /// idempotent discard.
        #[test]
        fn stale_epoch_never_mutates(
            current in 1u64..1000,
            stale in 1u64..1000,
            outcome in arb_outcome()
        ) {
            prop_assume!(stale != current);

            let mut store = ResultStore::new();
            store.begin(&["files".to_string()], current);
            let before = store.read("files").cloned();

            prop_assert!(!store.apply("files", stale, outcome));
            prop_assert_eq!(store.read("files").cloned(), before);
        }

        /// Applying to resource A never alters resource B.
        #[test]
        fn application_is_disjoint_by_name(
            outcome_a in arb_outcome(),
            outcome_b in arb_outcome()
        ) {
            let mut store = ResultStore::new();
            store.begin(&["a".to_string(), "b".to_string()], 1);
            store.apply("b", 1, outcome_b);
            let b_before = store.read("b").cloned();

            store.apply("a", 1, outcome_a);
            prop_assert_eq!(store.read("b").cloned(), b_before);
        }

        /// The aggregate is a pure function of the slot states: recomputing
        /// it from `read` always agrees with `aggregate`.
        #[test]
        fn aggregate_matches_recomputation(
            outcomes in prop::collection::vec(prop::option::of(arb_outcome()), 0..6)
        ) {
            let names: Vec<String> = (0..outcomes.len()).map(|i| format!("r{}", i)).collect();
            let mut store = ResultStore::new();
            store.begin(&names, 1);

            for (name, outcome) in names.iter().zip(outcomes) {
                // `None` leaves the resource in flight.
                if let Some(outcome) = outcome {
                    store.apply(name, 1, outcome);
                }
            }

            let statuses: Vec<FetchStatus> = names
                .iter()
                .map(|n| store.read(n).unwrap().status)
                .collect();
            let expected = if statuses.iter().any(|s| *s == FetchStatus::Pending) {
                AggregateStatus::Loading
            } else if statuses.iter().any(|s| *s == FetchStatus::Failure) {
                AggregateStatus::Error
            } else {
                AggregateStatus::Ready
            };

            prop_assert_eq!(store.aggregate(), expected);
            prop_assert_eq!(store.aggregate(), expected); // and it is stable
        }
    }
}
