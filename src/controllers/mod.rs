use std::time::Duration;
mod ingress;
mod lifecycle;
mod rules_merger;
mod selector;

pub use ingress::{IngressController, IngressReconciler};
pub use lifecycle::{FinalizerLifecycle, LifecycleState, RoutingIntent};
pub use rules_merger::{MergeMode, RulesMerger};
pub use selector::{DocumentSelector, SelectorResolver, TunnelAnnotations};

#[derive(thiserror::Error, Debug, PartialEq, PartialOrd)]
pub enum ControllerError {
    FetchFailed(String),
    NoMatchingDocument(String),
    DecodeError(String),
    PersistError(String),
    FinalizerUpdateError(String),
    Timeout,
}

const RECONCILE_LONG_WAIT: Duration = Duration::from_secs(3600);
const RECONCILE_ERROR_WAIT: Duration = Duration::from_secs(100);

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
