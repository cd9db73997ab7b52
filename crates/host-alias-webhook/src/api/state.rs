use crate::mutator::HostAliasMutator;

pub(crate) struct ApiServerState {
    pub(crate) mutator: HostAliasMutator,
}
