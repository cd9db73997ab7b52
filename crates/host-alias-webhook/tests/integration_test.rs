mod common;

use axum::{
    body::Body,
    http::{self, Request, header},
};
use http_body_util::BodyExt;
use host_alias_webhook::{
    admission_response::{AdmissionResponse, PatchType},
    api::admission_review::AdmissionReviewResponse,
    mutator::LOOPBACK,
};
use k8s_openapi::api::core::v1::Pod;
use rstest::*;
use serde_json::Value;
use tower::ServiceExt;

use crate::common::{app, default_test_config};

fn mutate_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri("/host-alias-mutator")
        .body(body.into())
        .unwrap()
}

async fn review(payload: &str) -> AdmissionReviewResponse {
    let app = app(default_test_config()).await;

    let response = app.oneshot(mutate_request(payload.to_owned())).await.unwrap();

    assert_eq!(response.status(), 200);

    serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap()
}

/// Apply the patch returned by the webhook to the pod sent by the API server
fn patched_pod(payload: &str, response: &AdmissionResponse) -> Pod {
    let review_request: Value = serde_json::from_str(payload).unwrap();
    let mut object = review_request["request"]["object"].clone();

    let patch = response
        .json_patch()
        .unwrap()
        .expect("a patch should be returned");
    json_patch::patch(&mut object, &patch).unwrap();

    serde_json::from_value(object).unwrap()
}

fn host_aliases(pod: &Pod) -> Vec<(String, Vec<String>)> {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.host_aliases.clone())
        .unwrap_or_default()
        .into_iter()
        .map(|alias| (alias.ip, alias.hostnames.unwrap_or_default()))
        .collect()
}

#[tokio::test]
async fn test_mutate_new_alias() {
    let payload = include_str!("data/pod_with_dns_zone.json");

    let admission_review_response = review(payload).await;

    assert_eq!(admission_review_response.api_version, "admission.k8s.io/v1");
    assert_eq!(admission_review_response.kind, "AdmissionReview");

    let response = admission_review_response.response;
    assert_eq!(response.uid, "0df28fbd-5f5f-11e8-bc74-36e6bb280816");
    assert!(response.allowed);
    assert_eq!(response.patch_type, Some(PatchType::JSONPatch));
    assert_eq!(response.json_patch().unwrap().unwrap().0.len(), 1);

    let pod = patched_pod(payload, &response);
    assert_eq!(
        host_aliases(&pod),
        vec![(
            LOOPBACK.to_owned(),
            vec!["my-cluster-name-rs0-0.mongo.example.com".to_owned()]
        )]
    );
    // the rest of the pod is untouched
    let spec = pod.spec.unwrap();
    assert_eq!(spec.containers.len(), 1);
    assert_eq!(spec.restart_policy.as_deref(), Some("Always"));
}

#[tokio::test]
async fn test_mutate_existing_loopback_alias() {
    let payload = include_str!("data/pod_with_loopback_alias.json");

    let response = review(payload).await.response;

    assert!(response.allowed);
    assert_eq!(response.json_patch().unwrap().unwrap().0.len(), 1);
    assert_eq!(
        host_aliases(&patched_pod(payload, &response)),
        vec![
            ("10.0.0.10".to_owned(), vec!["backup.local".to_owned()]),
            (
                LOOPBACK.to_owned(),
                vec![
                    "localhost".to_owned(),
                    "my-cluster-name-rs0-0.mongo.example.com".to_owned()
                ]
            ),
        ]
    );
}

#[tokio::test]
async fn test_mutate_without_dns_zone() {
    let response = review(include_str!("data/pod_without_dns_zone.json"))
        .await
        .response;

    assert!(response.allowed);
    assert!(response.patch.is_none());
    assert!(response.patch_type.is_none());
    assert_eq!(response.status.unwrap().reason.as_deref(), Some("nop"));
}

#[tokio::test]
#[rstest]
#[case::host_network(
    include_str!("data/pod_with_host_network.json"),
    "host network and DNS annotation are mutually exclusive",
)]
#[case::malformed_pod(include_str!("data/pod_malformed.json"), "cannot decode object")]
async fn test_mutate_denied(#[case] payload: &str, #[case] expected_message: &str) {
    let response = review(payload).await.response;

    assert!(!response.allowed);
    assert!(response.patch.is_none());

    let status = response.status.expect("status should be filled");
    assert_eq!(status.code, Some(400));
    assert!(
        status
            .message
            .expect("message should be filled")
            .starts_with(expected_message)
    );
}

#[tokio::test]
async fn test_mutate_v1beta1_review() {
    let mut payload: Value =
        serde_json::from_str(include_str!("data/pod_with_dns_zone.json")).unwrap();
    payload["apiVersion"] = "admission.k8s.io/v1beta1".into();

    let admission_review_response = review(&payload.to_string()).await;

    assert_eq!(
        admission_review_response.api_version,
        "admission.k8s.io/v1beta1"
    );
    assert!(admission_review_response.response.allowed);
}

#[tokio::test]
#[rstest]
#[case::missing_request("{}", 422)]
#[case::not_json("this isn't valid", 400)]
async fn test_mutate_invalid_payload(#[case] payload: &str, #[case] expected_status: u16) {
    let app = app(default_test_config()).await;

    let response = app
        .oneshot(mutate_request(payload.to_owned()))
        .await
        .unwrap();

    assert_eq!(response.status(), expected_status);

    let body: Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    assert_eq!(body["status"], expected_status);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_mutate_wrong_content_type() {
    let app = app(default_test_config()).await;

    let request = Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "text/plain")
        .uri("/host-alias-mutator")
        .body(Body::from(include_str!("data/pod_with_dns_zone.json")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 415);
}

#[tokio::test]
async fn test_mutate_wrong_method() {
    let app = app(default_test_config()).await;

    let request = Request::builder()
        .method(http::Method::GET)
        .uri("/host-alias-mutator")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_unknown_path() {
    let app = app(default_test_config()).await;

    let request = Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri("/validate/host-alias-mutator")
        .body(Body::from(include_str!("data/pod_with_dns_zone.json")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_readiness() {
    let app = app(default_test_config()).await;

    let request = Request::builder()
        .uri("/readiness")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 200);
}
