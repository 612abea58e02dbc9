mod configuration_store;
#[cfg(test)]
mod in_memory_store;
mod resource_store;

pub use configuration_store::{ConfigurationStore, UpdateOutcome};
#[cfg(test)]
pub use in_memory_store::InMemoryStore;
pub use resource_store::{KubeResourceStore, ResourceStore, StoreError};
