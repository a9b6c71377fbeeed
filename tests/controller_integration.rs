//! Integration tests for the multi-resource controller using wiremock
//!
//! These drive the full pipeline - descriptor resolution, the reqwest
//! transport, parallel dispatch, and the result store - against mocked
//! endpoints, covering aggregation, partial failure, scoped refetch after
//! mutations, stale-response discard, and pagination metadata.

use remoteview::api::HttpTransport;
use remoteview::controller::{
    resolve, AggregateStatus, Controller, ControllerEvent, FetchStatus, MutateError,
    MutationRequest, ResourceDescriptor, ResourceSpec,
};
use remoteview::route::Location;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn descriptor(name: &str, path: &str) -> ResourceDescriptor {
    ResourceDescriptor {
        name: name.to_string(),
        path: path.to_string(),
        query: Vec::new(),
    }
}

fn project_location() -> Location {
    let mut params = HashMap::new();
    params.insert("org".to_string(), "acme".to_string());
    params.insert("project".to_string(), "web".to_string());
    Location::new(params)
}

fn file_specs() -> Vec<ResourceSpec> {
    serde_json::from_value(json!([
        {"name": "project", "path": "/projects/{org}/{project}/"},
        {
            "name": "files",
            "path": "/projects/{org}/{project}/files/",
            "search_param": "query"
        }
    ]))
    .unwrap()
}

async fn controller_for(server: &MockServer) -> Controller<HttpTransport> {
    let transport = Arc::new(HttpTransport::new(&server.uri(), None).unwrap());
    Controller::new(transport)
}

/// Drain settlements until nothing is in flight.
async fn settle(controller: &mut Controller<HttpTransport>) {
    while controller.aggregate() == AggregateStatus::Loading {
        controller.next_settlement().await;
    }
}

#[tokio::test]
async fn all_resources_ready_when_both_succeed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/acme/web/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slug": "web"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/acme/web/files/"))
        .and(query_param("query", ""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "1", "name": "app.dSYM"}])),
        )
        .mount(&server)
        .await;

    let mut controller = controller_for(&server).await;
    let descriptors = resolve(&file_specs(), &project_location()).unwrap();
    controller.run_all(descriptors);
    settle(&mut controller).await;

    assert_eq!(controller.aggregate(), AggregateStatus::Ready);
    assert_eq!(
        controller.read("project").unwrap().status,
        FetchStatus::Success
    );
    assert_eq!(
        controller.read("files").unwrap().status,
        FetchStatus::Success
    );
    assert_eq!(
        controller.read("files").unwrap().payload,
        Some(json!([{"id": "1", "name": "app.dSYM"}]))
    );
}

#[tokio::test]
async fn one_failure_yields_error_without_poisoning_the_rest() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/p/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slug": "web"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/f/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "internal failure"})),
        )
        .mount(&server)
        .await;

    let mut controller = controller_for(&server).await;
    controller.run_all(vec![descriptor("project", "/p/"), descriptor("files", "/f/")]);
    settle(&mut controller).await;

    assert_eq!(controller.aggregate(), AggregateStatus::Error);

    let project = controller.read("project").unwrap();
    assert_eq!(project.status, FetchStatus::Success);
    assert_eq!(project.payload, Some(json!({"slug": "web"})));

    let files = controller.read("files").unwrap();
    assert_eq!(files.status, FetchStatus::Failure);
    let error = files.error.as_ref().unwrap();
    assert_eq!(error.status, Some(500));
    assert!(error.message.contains("internal failure"));
}

#[tokio::test]
async fn delete_refetches_only_the_mutated_resource() {
    let server = MockServer::start().await;

    // The project endpoint must be hit exactly once: by the initial run,
    // never by the scoped refetch after the delete.
    Mock::given(method("GET"))
        .and(path("/projects/acme/web/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slug": "web"})))
        .expect(1)
        .mount(&server)
        .await;

    // First fetch returns two files, the refetch one.
    Mock::given(method("GET"))
        .and(path("/projects/acme/web/files/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "abc"}, {"id": "def"}])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/acme/web/files/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "def"}])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/projects/acme/web/files/"))
        .and(query_param("id", "abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server).await;
    controller.run_all(vec![
        descriptor("project", "/projects/acme/web/"),
        descriptor("files", "/projects/acme/web/files/"),
    ]);
    settle(&mut controller).await;

    let project_before = controller.read("project").unwrap().clone();

    controller
        .mutate("files", MutationRequest::delete_by_id("id", "abc"))
        .unwrap();

    let event = controller.next_settlement().await.unwrap();
    assert!(matches!(
        event,
        ControllerEvent::MutationSucceeded { ref name } if name == "files"
    ));
    settle(&mut controller).await;

    assert_eq!(
        controller.read("files").unwrap().payload,
        Some(json!([{"id": "def"}]))
    );
    // Untouched resource: same state, no refetch.
    assert_eq!(controller.read("project").unwrap(), &project_before);
}

#[tokio::test]
async fn failed_mutation_reports_and_preserves_displayed_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/f/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "abc"}])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/f/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "permission denied"})),
        )
        .mount(&server)
        .await;

    let mut controller = controller_for(&server).await;
    controller.run_all(vec![descriptor("files", "/f/")]);
    settle(&mut controller).await;

    controller
        .mutate("files", MutationRequest::delete_by_id("id", "abc"))
        .unwrap();

    match controller.next_settlement().await.unwrap() {
        ControllerEvent::MutationFailed { name, error } => {
            assert_eq!(name, "files");
            assert_eq!(error.status, Some(403));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Last-known-good data stays visible.
    let files = controller.read("files").unwrap();
    assert_eq!(files.status, FetchStatus::Success);
    assert_eq!(files.payload, Some(json!([{"id": "abc"}])));
}

#[tokio::test]
async fn search_change_discards_the_stale_in_flight_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/acme/web/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slug": "web"})))
        .mount(&server)
        .await;
    // The empty-search fetch is slow; the "foo" fetch is instant.
    Mock::given(method("GET"))
        .and(path("/projects/acme/web/files/"))
        .and(query_param("query", ""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "stale"}]))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/acme/web/files/"))
        .and(query_param("query", "foo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "fresh"}])))
        .mount(&server)
        .await;

    let mut controller = controller_for(&server).await;
    let mut location = project_location();

    controller.run_all(resolve(&file_specs(), &location).unwrap());

    // Search text changes before the first files response lands: the
    // descriptors re-resolve and a new epoch supersedes the old one.
    location.set_search("foo");
    controller.run_all(resolve(&file_specs(), &location).unwrap());
    settle(&mut controller).await;

    assert_eq!(
        controller.read("files").unwrap().payload,
        Some(json!([{"id": "fresh"}]))
    );

    // Let the slow epoch-one response arrive; it must be a no-op.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(controller.poll_settlement().is_none());
    assert_eq!(
        controller.read("files").unwrap().payload,
        Some(json!([{"id": "fresh"}]))
    );
}

#[tokio::test]
async fn pagination_metadata_flows_through() {
    let server = MockServer::start().await;

    let link = format!(
        "<{0}/f/?cursor=0:0:1>; rel=\"previous\"; results=\"false\"; cursor=\"0:0:1\", \
         <{0}/f/?cursor=0:100:0>; rel=\"next\"; results=\"true\"; cursor=\"0:100:0\"",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/f/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "1"}]))
                .insert_header("link", link.as_str())
                .insert_header("x-total-count", "250"),
        )
        .mount(&server)
        .await;

    let mut controller = controller_for(&server).await;
    controller.run_all(vec![descriptor("files", "/f/")]);
    settle(&mut controller).await;

    let store = controller.store();
    let links = store.page_links("files").unwrap();
    assert!(links.has_next());
    assert!(!links.has_previous());
    assert_eq!(
        links.next.as_ref().unwrap().cursor.as_deref(),
        Some("0:100:0")
    );
    assert_eq!(store.total("files"), Some(250));
}

#[tokio::test]
async fn closing_mid_fetch_suppresses_every_late_settlement() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/f/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "late"}]))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let mut controller = controller_for(&server).await;
    controller.run_all(vec![descriptor("files", "/f/")]);
    controller.close();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(controller.poll_settlement().is_none());
    assert_eq!(
        controller.read("files").unwrap().status,
        FetchStatus::Pending
    );
}

#[tokio::test]
async fn mutating_an_undeclared_resource_is_rejected_up_front() {
    let server = MockServer::start().await;
    let mut controller = controller_for(&server).await;
    controller.run_all(vec![descriptor("files", "/f/")]);

    let err = controller
        .mutate("tombstones", MutationRequest::delete_by_id("id", "1"))
        .unwrap_err();
    assert!(matches!(err, MutateError::UnknownResource(_)));
}

#[tokio::test]
async fn empty_descriptor_list_is_ready_without_any_request() {
    let server = MockServer::start().await;
    let mut controller = controller_for(&server).await;

    controller.run_all(Vec::new());
    assert_eq!(controller.aggregate(), AggregateStatus::Ready);
    assert!(controller.poll_settlement().is_none());
    // MockServer verifies no unexpected requests on drop.
}
