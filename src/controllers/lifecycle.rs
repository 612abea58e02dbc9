use k8s_openapi::api::networking::v1::Ingress;
use kube::{Resource, ResourceExt};
use tracing::{info, warn};

use super::{ControllerError, DocumentSelector, MergeMode, RulesMerger};
use crate::{
    common::{HostRule, ResourceKey, TUNNEL_FINALIZER},
    services::{ConfigurationStore, ResourceStore, UpdateOutcome},
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Unmanaged,
    ManagedActive,
    ManagedDeleting,
    Released,
}

impl LifecycleState {
    pub fn check_state(ingress: &Ingress, managed: bool) -> Self {
        if !managed {
            LifecycleState::Unmanaged
        } else if ingress.meta().deletion_timestamp.is_some() {
            if has_finalizer(ingress) {
                LifecycleState::ManagedDeleting
            } else {
                LifecycleState::Released
            }
        } else {
            LifecycleState::ManagedActive
        }
    }
}

/// Everything an Ingress asks of the tunnel configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingIntent {
    pub selector: DocumentSelector,
    pub rules: Vec<HostRule>,
    pub fqdn_override: Option<String>,
}

fn has_finalizer(ingress: &Ingress) -> bool {
    ingress.finalizers().iter().any(|finalizer| finalizer == TUNNEL_FINALIZER)
}

/// Holds the finalizer on an Ingress for as long as the tunnel configuration may reference it.
pub struct FinalizerLifecycle<'a, S> {
    store: &'a S,
    max_conflict_retries: u32,
}

impl<'a, S: ResourceStore> FinalizerLifecycle<'a, S> {
    pub fn new(store: &'a S, max_conflict_retries: u32) -> Self {
        Self { store, max_conflict_retries }
    }

    /// `intent` is `None` for an Ingress without tunnel annotations. Returns the state the Ingress ends up in.
    pub async fn transition(&self, ingress: Ingress, intent: Option<&RoutingIntent>) -> Result<LifecycleState> {
        let key = ResourceKey::from(&ingress);
        let state = LifecycleState::check_state(&ingress, intent.is_some());
        info!("Ingress {key} is {state:?}");

        match (state, intent) {
            (LifecycleState::Unmanaged, _) | (_, None) => {
                if has_finalizer(&ingress) {
                    info!("Finalizer found on unmanaged Ingress {key}, removing it");
                    self.remove_finalizer(ingress).await?;
                }
                Ok(LifecycleState::Unmanaged)
            },

            (LifecycleState::ManagedActive, Some(intent)) => {
                if !has_finalizer(&ingress) {
                    self.add_finalizer(ingress).await?;
                }
                self.project(intent, MergeMode::Apply).await.inspect_err(|e| {
                    warn!("Unable to configure tunnel for Ingress {key} {e}");
                })?;
                Ok(LifecycleState::ManagedActive)
            },

            (LifecycleState::ManagedDeleting, Some(intent)) => {
                self.project(intent, MergeMode::Cleanup).await.inspect_err(|e| {
                    warn!("Unable to clean up tunnel for Ingress {key}, keeping finalizer {e}");
                })?;
                self.remove_finalizer(ingress).await.inspect_err(|e| {
                    warn!("Unable to continue with Ingress {key} deletion {e}");
                })?;
                Ok(LifecycleState::Released)
            },

            (LifecycleState::Released, Some(_)) => Ok(LifecycleState::Released),
        }
    }

    async fn project(&self, intent: &RoutingIntent, mode: MergeMode) -> Result<UpdateOutcome> {
        ConfigurationStore::new(self.store, self.max_conflict_retries)
            .update(&intent.selector, |document| {
                RulesMerger::new(&intent.rules, document.domain.as_deref(), intent.fqdn_override.as_deref()).merge(&document.configuration, mode)
            })
            .await
    }

    async fn add_finalizer(&self, mut ingress: Ingress) -> Result<Ingress> {
        let key = ResourceKey::from(&ingress);
        ingress.finalizers_mut().push(TUNNEL_FINALIZER.to_owned());
        let updated = self.store.update_ingress(&ingress).await.map_err(|e| {
            warn!("Unable to add finalizer to Ingress {key} {e}");
            ControllerError::FinalizerUpdateError(format!("{key} {e}"))
        })?;
        info!("Finalizer added to Ingress {key}");
        Ok(updated)
    }

    async fn remove_finalizer(&self, mut ingress: Ingress) -> Result<()> {
        let key = ResourceKey::from(&ingress);
        ingress.finalizers_mut().retain(|finalizer| finalizer != TUNNEL_FINALIZER);
        self.store.update_ingress(&ingress).await.map_err(|e| {
            warn!("Unable to remove finalizer from Ingress {key} {e}");
            ControllerError::FinalizerUpdateError(format!("{key} {e}"))
        })?;
        info!("Finalizer removed from Ingress {key}");
        Ok(())
    }
}
