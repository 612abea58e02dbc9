use std::{sync::Arc, time::Duration};

use futures::{future::BoxFuture, FutureExt, StreamExt};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use tracing::{debug, info, instrument, warn};
use typed_builder::TypedBuilder;

use super::{ControllerError, FinalizerLifecycle, LifecycleState, RoutingIntent, SelectorResolver, TunnelAnnotations, RECONCILE_ERROR_WAIT, RECONCILE_LONG_WAIT};
use crate::{
    common::{HostRule, ResourceKey},
    services::{KubeResourceStore, ResourceStore, StoreError},
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

#[derive(TypedBuilder)]
pub struct IngressReconciler<S> {
    store: S,
    reconcile_timeout: Duration,
    max_conflict_retries: u32,
}

impl<S: ResourceStore> IngressReconciler<S> {
    /// Reconciles the Ingress identified by `key`, giving up with [`ControllerError::Timeout`] once the deadline passes.
    pub async fn reconcile(&self, key: &ResourceKey) -> Result<LifecycleState> {
        if let Ok(result) = tokio::time::timeout(self.reconcile_timeout, self.reconcile_internal(key)).await {
            result
        } else {
            warn!("reconcile_ingress: {key} did not finish within {:?}", self.reconcile_timeout);
            Err(ControllerError::Timeout)
        }
    }

    #[instrument(level = "info", name = "IngressReconciler", skip_all, fields(id = %key))]
    async fn reconcile_internal(&self, key: &ResourceKey) -> Result<LifecycleState> {
        let ingress = match self.store.get_ingress(key).await {
            Ok(ingress) => ingress,
            Err(StoreError::NotFound) => {
                info!("Ingress deleted, nothing to do");
                return Ok(LifecycleState::Released);
            },
            Err(e) => {
                warn!("Unable to fetch Ingress {e}");
                return Err(ControllerError::FetchFailed(format!("{key} {e}")));
            },
        };

        let annotations = TunnelAnnotations::from(ingress.annotations());
        let intent = SelectorResolver::resolve(&annotations, &key.namespace).map(|selector| RoutingIntent {
            selector,
            rules: HostRule::from_ingress(&ingress),
            fqdn_override: annotations.fqdn_override().map(str::to_owned),
        });

        if let Some(intent) = &intent {
            info!("Setting tunnel {} rules {}", intent.selector, intent.rules.len());
        } else {
            info!("No related annotations found, skipping Ingress");
        }

        FinalizerLifecycle::new(&self.store, self.max_conflict_retries).transition(ingress, intent.as_ref()).await
    }
}

#[derive(TypedBuilder)]
pub struct IngressController {
    client: Client,
    #[builder(default)]
    watch_namespace: Option<String>,
    ctx: Arc<IngressReconciler<KubeResourceStore>>,
}

impl IngressController {
    pub fn get_controller(&'_ self) -> BoxFuture<'_, ()> {
        let api: Api<Ingress> = match &self.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };

        Controller::new(api, Config::default())
            .shutdown_on_signal()
            .run(Self::reconcile_ingress, Self::error_policy, Arc::clone(&self.ctx))
            .for_each(|_| futures::future::ready(()))
            .boxed()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn error_policy(resource: Arc<Ingress>, err: &ControllerError, _ctx: Arc<IngressReconciler<KubeResourceStore>>) -> Action {
        warn!("reconcile_ingress: {} failed {err}, retrying in {:?}", ResourceKey::from(&*resource), RECONCILE_ERROR_WAIT);
        Action::requeue(RECONCILE_ERROR_WAIT)
    }

    async fn reconcile_ingress(resource: Arc<Ingress>, ctx: Arc<IngressReconciler<KubeResourceStore>>) -> Result<Action> {
        let key = ResourceKey::from(&*resource);
        let state = ctx.reconcile(&key).await?;
        debug!("reconcile_ingress: {key} {state:?}");
        Ok(Action::requeue(RECONCILE_LONG_WAIT))
    }
}
