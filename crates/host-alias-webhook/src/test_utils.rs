use serde_json::{Value, json};

use crate::api::admission_review::AdmissionReviewRequest;

/// A pod as sent by the API server on CREATE.
pub(crate) fn pod(annotations: Value, host_aliases: Option<Value>) -> Value {
    let mut pod = json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": "some-pod",
            "namespace": "some-namespace",
            "annotations": annotations
        },
        "spec": {
            "containers": [{"name": "mongod", "image": "percona/percona-server-mongodb:7.0"}]
        }
    });
    if let Some(host_aliases) = host_aliases {
        pod["spec"]["hostAliases"] = host_aliases;
    }
    pod
}

pub(crate) fn build_admission_review_request(object: Value) -> AdmissionReviewRequest {
    let input = json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "hello",
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "requestKind": {"group": "", "version": "v1", "kind": "Pod"},
            "requestResource": {"group": "", "version": "v1", "resource": "pods"},
            "namespace": "some-namespace",
            "operation": "CREATE",
            "userInfo": {
                "username": "system:serviceaccount:kube-system:replicaset-controller",
                "uid": "014fbff9a07c",
                "groups": ["system:serviceaccounts", "system:authenticated"]
            },
            "object": object,
            "oldObject": null,
            "options": {"apiVersion": "meta.k8s.io/v1", "kind": "CreateOptions"},
            "dryRun": false
        }
    });

    serde_json::from_value(input).expect("deserialization should work")
}
