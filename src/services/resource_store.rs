use async_trait::async_trait;
use k8s_openapi::api::{core::v1::ConfigMap, networking::v1::Ingress};
use kube::{
    api::{ListParams, PostParams},
    Api, Client, ResourceExt,
};
use thiserror::Error;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::{common::ResourceKey, controllers::DocumentSelector};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("resource not found")]
    NotFound,
    #[error("resource version conflict: {0}")]
    Conflict(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<kube::Error> for StoreError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) if response.code == 404 => StoreError::NotFound,
            kube::Error::Api(response) if response.code == 409 => StoreError::Conflict(response.message),
            error => StoreError::Transport(error.to_string()),
        }
    }
}

/// Remote operations needed to reconcile an Ingress. Updates carry the `resourceVersion` of the object passed in
/// and fail with [`StoreError::Conflict`] when it is stale.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_ingress(&self, key: &ResourceKey) -> Result<Ingress, StoreError>;
    async fn update_ingress(&self, ingress: &Ingress) -> Result<Ingress, StoreError>;
    async fn list_config_maps(&self, selector: &DocumentSelector) -> Result<Vec<ConfigMap>, StoreError>;
    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, StoreError>;
}

#[derive(Clone, TypedBuilder)]
pub struct KubeResourceStore {
    client: Client,
    controller_name: String,
}

impl KubeResourceStore {
    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.controller_name.clone()),
            ..PostParams::default()
        }
    }
}

#[async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get_ingress(&self, key: &ResourceKey) -> Result<Ingress, StoreError> {
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get(&key.name).await?)
    }

    async fn update_ingress(&self, ingress: &Ingress) -> Result<Ingress, StoreError> {
        let key = ResourceKey::from(ingress);
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.replace(&key.name, &self.post_params(), ingress).await?)
    }

    async fn list_config_maps(&self, selector: &DocumentSelector) -> Result<Vec<ConfigMap>, StoreError> {
        let api: Api<ConfigMap> = match &selector.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };
        let list_params = ListParams::default().labels(&selector.label_selector());
        debug!("list_config_maps {selector}");
        Ok(api.list(&list_params).await?.items)
    }

    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, StoreError> {
        let key = ResourceKey::from(config_map);
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &key.namespace);
        debug!("update_config_map {key} version {:?}", config_map.resource_version());
        Ok(api.replace(&key.name, &self.post_params(), config_map).await?)
    }
}
