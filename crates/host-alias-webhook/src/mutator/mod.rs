mod decoder;

pub use decoder::{Decoder, JsonDecoder};

use k8s_openapi::api::core::v1::{HostAlias, Pod};
use serde_json::{Value, json};
use tracing::{Span, error, info, info_span, warn};

use crate::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    errors::{DecodeError, MutationError},
};

/// Pods carrying this annotation get `<pod name>.<annotation value>`
/// resolved to the loopback address.
pub const DNS_ANNOTATION_KEY: &str = "percona.com/dns-zone";
pub const LOOPBACK: &str = "127.0.0.1";

/// Reason reported when a pod is admitted untouched.
const NOP: &str = "nop";

/// How the host aliases of a pod have been changed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AliasUpdate {
    /// The hostname has been appended to the loopback alias at this index.
    Extended(usize),
    /// A new loopback alias has been appended to the list.
    Appended,
}

/// Injects a loopback host alias into pods annotated with [`DNS_ANNOTATION_KEY`].
///
/// The mutator holds no per-request state: a single instance can be shared by
/// all the request handlers.
pub struct HostAliasMutator<D: Decoder = JsonDecoder> {
    decoder: D,
    span: Span,
}

impl<D: Decoder> HostAliasMutator<D> {
    pub fn new(decoder: D) -> Self {
        HostAliasMutator {
            decoder,
            span: info_span!("host_alias_mutator"),
        }
    }

    /// Review the pod carried by `request`. Failures are never propagated,
    /// they are turned into a denial instead.
    ///
    /// Events are emitted inside a child of the mutator span carrying the
    /// request uid, linked to the span that was current when called.
    pub fn handle(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let span = info_span!(
            parent: &self.span,
            "mutate",
            request_uid = request.uid.as_str()
        );
        span.follows_from(&Span::current());
        let _enter = span.enter();

        match self.mutate(request) {
            Ok(response) => response,
            Err(error) => AdmissionResponse::reject(
                request.uid.clone(),
                error.to_string(),
                error.status_code(),
            ),
        }
    }

    fn mutate(&self, request: &AdmissionRequest) -> Result<AdmissionResponse, MutationError> {
        let mut pod = self.decoder.decode::<Pod>(request).inspect_err(|e| {
            error!(error = %e, "failed to decode request");
        })?;

        let name = pod.metadata.name.clone().unwrap_or_default();
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();

        let Some(dns_zone) = dns_zone(&pod) else {
            info!(annotation = DNS_ANNOTATION_KEY, "annotation not found, skipping");
            return Ok(AdmissionResponse::allow(request.uid.clone(), NOP));
        };

        let spec = pod.spec.get_or_insert_with(Default::default);
        if spec.host_network == Some(true) {
            warn!(
                pod = name.as_str(),
                namespace = namespace.as_str(),
                "pod uses host network which excludes host alias usage"
            );
            return Err(MutationError::HostNetworkConflict);
        }

        let external_fqdn = format!("{name}.{dns_zone}");
        let update = add_host_alias(
            spec.host_aliases.get_or_insert_with(Vec::new),
            &external_fqdn,
        );
        match update {
            AliasUpdate::Extended(index) => info!(
                hostname = external_fqdn.as_str(),
                pod = name.as_str(),
                namespace = namespace.as_str(),
                alias_index = index,
                "adding hostname to existing loopback host alias"
            ),
            AliasUpdate::Appended => info!(
                hostname = external_fqdn.as_str(),
                pod = name.as_str(),
                namespace = namespace.as_str(),
                "appending new host alias"
            ),
        }

        let original = request
            .object
            .as_ref()
            .map(|object| &object.0)
            .ok_or(DecodeError::MissingObject)?;
        let mutated = with_host_alias(original, &update, &external_fqdn)
            .inspect_err(|e| error!(error = %e, "error marshaling pod"))?;

        let patch = json_patch::diff(original, &mutated);
        if patch.0.is_empty() {
            return Ok(AdmissionResponse::allow(request.uid.clone(), NOP));
        }

        AdmissionResponse::from_patch(request.uid.clone(), &patch)
            .map_err(MutationError::from)
            .inspect_err(|e| error!(error = %e, "error encoding patch"))
    }
}

/// The DNS zone requested by the pod. Empty values count as missing.
fn dns_zone(pod: &Pod) -> Option<String> {
    pod.metadata
        .annotations
        .as_ref()?
        .get(DNS_ANNOTATION_KEY)
        .filter(|zone| !zone.is_empty())
        .cloned()
}

/// Resolve `hostname` to the loopback address, reusing the first loopback
/// alias when there's one. Existing aliases are never removed or reordered.
pub(crate) fn add_host_alias(aliases: &mut Vec<HostAlias>, hostname: &str) -> AliasUpdate {
    match aliases.iter_mut().enumerate().find(|(_, alias)| alias.ip == LOOPBACK) {
        Some((index, alias)) => {
            alias
                .hostnames
                .get_or_insert_with(Vec::new)
                .push(hostname.to_owned());
            AliasUpdate::Extended(index)
        }
        None => {
            aliases.push(HostAlias {
                ip: LOOPBACK.to_owned(),
                hostnames: Some(vec![hostname.to_owned()]),
            });
            AliasUpdate::Appended
        }
    }
}

/// Copy of `original` with `update` applied to the raw `spec.hostAliases`.
///
/// The typed aliases keep the order of the raw array, so the index of an
/// extended alias is valid in both. Only the touched array grows: every
/// other member of the document, known to the typed Pod or not, is kept
/// as it is.
fn with_host_alias(
    original: &Value,
    update: &AliasUpdate,
    hostname: &str,
) -> Result<Value, MutationError> {
    let mut mutated = original.clone();
    let spec = member_or_insert(&mut mutated, "pod", "spec", json!({}))?;
    let aliases = member_or_insert(spec, "spec", "hostAliases", json!([]))?
        .as_array_mut()
        .ok_or_else(|| unexpected_shape("spec.hostAliases", "array"))?;

    match *update {
        AliasUpdate::Extended(index) => {
            let path = format!("spec.hostAliases[{index}]");
            let alias = aliases
                .get_mut(index)
                .ok_or_else(|| unexpected_shape(&path, "object"))?;
            member_or_insert(alias, &path, "hostnames", json!([]))?
                .as_array_mut()
                .ok_or_else(|| unexpected_shape(&format!("{path}.hostnames"), "array"))?
                .push(json!(hostname));
        }
        AliasUpdate::Appended => {
            aliases.push(json!({"ip": LOOPBACK, "hostnames": [hostname]}));
        }
    }

    Ok(mutated)
}

/// The `key` member of `parent`, set to `empty` when missing or null.
fn member_or_insert<'a>(
    parent: &'a mut Value,
    path: &str,
    key: &str,
    empty: Value,
) -> Result<&'a mut Value, MutationError> {
    let member = parent
        .as_object_mut()
        .ok_or_else(|| unexpected_shape(path, "object"))?
        .entry(key)
        .or_insert(Value::Null);
    if member.is_null() {
        *member = empty;
    }
    Ok(member)
}

fn unexpected_shape(path: &str, expected: &'static str) -> MutationError {
    MutationError::UnexpectedShape {
        path: path.to_owned(),
        expected,
    }
}
