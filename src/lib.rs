use std::sync::Arc;

use kube::Client;
use tracing::info;

mod common;
pub mod configuration;
mod controllers;
mod services;

pub use configuration::Configuration;
use controllers::{IngressController, IngressReconciler};
use services::KubeResourceStore;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

pub async fn start(configuration: Configuration) -> Result<()> {
    info!("Kubtunnel started");
    let client = Client::try_default().await?;

    let store = KubeResourceStore::builder().client(client.clone()).controller_name(configuration.controller_name.clone()).build();

    let ingress_controller = IngressController::builder()
        .client(client)
        .watch_namespace(configuration.watch_namespace.clone())
        .ctx(Arc::new(
            IngressReconciler::builder()
                .store(store)
                .reconcile_timeout(configuration.reconcile_timeout())
                .max_conflict_retries(configuration.max_conflict_retries())
                .build(),
        ))
        .build();

    info!("Ingress controller...started");
    ingress_controller.get_controller().await;
    info!("Ingress controller...stopped");

    info!("Kubtunnel stopped");
    Ok(())
}
