use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use tracing::{debug, info, warn};

use super::{ResourceStore, StoreError};
use crate::{
    common::{ResourceKey, TunnelConfiguration, CONFIGMAP_KEY, TUNNEL_DOMAIN_LABEL},
    controllers::{ControllerError, DocumentSelector},
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

/// A ConfigMap as it was read together with its decoded payload. The ConfigMap keeps the `resourceVersion` the
/// write is checked against.
#[derive(Clone, Debug)]
pub struct TunnelDocument {
    pub config_map: ConfigMap,
    pub configuration: TunnelConfiguration,
    pub domain: Option<String>,
}

impl TunnelDocument {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::from(&self.config_map)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Written,
    Unchanged,
}

pub struct ConfigurationStore<'a, S> {
    store: &'a S,
    max_conflict_retries: u32,
}

impl<'a, S: ResourceStore> ConfigurationStore<'a, S> {
    pub fn new(store: &'a S, max_conflict_retries: u32) -> Self {
        Self { store, max_conflict_retries }
    }

    pub async fn read(&self, selector: &DocumentSelector) -> Result<TunnelDocument> {
        let mut candidates = self.store.list_config_maps(selector).await.map_err(|e| {
            warn!("Failed to list ConfigMaps {selector} {e}");
            ControllerError::FetchFailed(format!("{selector} {e}"))
        })?;
        if candidates.is_empty() {
            warn!("No ConfigMaps found {selector}");
            return Err(ControllerError::NoMatchingDocument(selector.to_string()));
        }
        if candidates.len() > 1 {
            warn!("{} ConfigMaps match {selector}, using the first by namespace and name", candidates.len());
        }
        candidates.sort_by_key(|config_map| ResourceKey::from(config_map));
        let config_map = candidates.swap_remove(0);
        let key = ResourceKey::from(&config_map);

        let Some(payload) = config_map.data.as_ref().and_then(|data| data.get(CONFIGMAP_KEY)) else {
            warn!("Unable to find key {CONFIGMAP_KEY} in ConfigMap {key}");
            return Err(ControllerError::DecodeError(format!("key {CONFIGMAP_KEY} missing in {key}")));
        };
        let configuration = TunnelConfiguration::decode(payload).map_err(|e| {
            warn!("Unable to read {CONFIGMAP_KEY} of {key} as YAML {e}");
            ControllerError::DecodeError(format!("{key} {e}"))
        })?;
        let domain = config_map.labels().get(TUNNEL_DOMAIN_LABEL).cloned();
        debug!("Read ConfigMap {key} version {:?} domain {domain:?}", config_map.resource_version());

        Ok(TunnelDocument { config_map, configuration, domain })
    }

    /// Read, merge and write until the write is accepted. Only the ConfigMap write is retried, and only when it
    /// was rejected because of a stale `resourceVersion`.
    pub async fn update<F>(&self, selector: &DocumentSelector, merge: F) -> Result<UpdateOutcome>
    where
        F: Fn(&TunnelDocument) -> TunnelConfiguration + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let document = self.read(selector).await?;
            let key = document.key();
            let merged = merge(&document);
            if merged == document.configuration {
                debug!("ConfigMap {key} already up to date");
                return Ok(UpdateOutcome::Unchanged);
            }

            match self.write(document, &merged).await {
                Ok(()) => {
                    info!("ConfigMap {key} updated");
                    return Ok(UpdateOutcome::Written);
                },
                Err(PersistFailure::Store(StoreError::Conflict(message))) if attempt < self.max_conflict_retries => {
                    warn!("ConfigMap {key} changed since it was read, retrying {attempt}/{} {message}", self.max_conflict_retries);
                    attempt += 1;
                },
                Err(e) => {
                    warn!("Unable to update ConfigMap {key} {e}");
                    return Err(ControllerError::PersistError(format!("{key} {e}")));
                },
            }
        }
    }

    async fn write(&self, document: TunnelDocument, configuration: &TunnelConfiguration) -> std::result::Result<(), PersistFailure> {
        let payload = configuration.encode().map_err(|e| PersistFailure::Encode(e.to_string()))?;
        let mut config_map = document.config_map;
        config_map.data.get_or_insert_with(Default::default).insert(CONFIGMAP_KEY.to_owned(), payload);
        self.store.update_config_map(&config_map).await?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
enum PersistFailure {
    #[error("unable to encode configuration: {0}")]
    Encode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
