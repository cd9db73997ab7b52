use k8s_openapi::apimachinery::pkg::runtime::RawExtension;

/// This models the admission/v1/AdmissionRequest object of Kubernetes.
/// Only the object under review is consulted by the mutator, the remaining
/// fields are kept so they can be logged and echoed back.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    #[serde(default)]
    pub kind: GroupVersionKind,
    #[serde(default)]
    pub resource: GroupVersionResource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<k8s_openapi::api::authentication::v1::UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RawExtension>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_pod_create_request() {
        let input = json!({
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "namespace": "default",
            "operation": "CREATE",
            "userInfo": {"username": "admin", "groups": ["system:authenticated"]},
            "object": {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "some-pod"}},
            "dryRun": false
        });

        let request: AdmissionRequest = serde_json::from_value(input).unwrap();

        assert_eq!(request.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(request.kind.kind, "Pod");
        assert_eq!(request.resource.resource, "pods");
        assert_eq!(request.namespace.as_deref(), Some("default"));
        assert_eq!(request.operation, "CREATE");
        assert!(request.name.is_none());
        assert!(request.old_object.is_none());

        let object = request.object.expect("object should be set");
        assert_eq!(object.0["metadata"]["name"], "some-pod");
    }

    #[test]
    fn only_uid_is_required() {
        let request: AdmissionRequest = serde_json::from_value(json!({"uid": "hello"})).unwrap();

        assert_eq!(request.uid, "hello");
        assert!(request.object.is_none());
        assert!(request.user_info.is_none());
    }
}
