mod resource_key;
mod tunnel_configuration;
#[cfg(test)]
mod test;

pub use resource_key::ResourceKey;
pub use tunnel_configuration::{HostRule, IngressRoute, TunnelConfiguration, CONFIGMAP_KEY};

pub const TUNNEL_CRD_ANNOTATION: &str = "tunnels.networking.cfargotunnel.com";
pub const TUNNEL_ID_ANNOTATION: &str = "tunnels.networking.cfargotunnel.com/id";
pub const TUNNEL_NAME_ANNOTATION: &str = "tunnels.networking.cfargotunnel.com/name";
pub const FQDN_ANNOTATION: &str = "tunnels.networking.cfargotunnel.com/fqdn";
/// `"false"` searches every namespace, any other value names the namespace to search. Absent or `"true"` means the Ingress namespace.
pub const TUNNEL_NAMESPACE_ANNOTATION: &str = "tunnels.networking.cfargotunnel.com/ns";
pub const TUNNEL_FINALIZER: &str = "tunnels.networking.cfargotunnel.com/finalizer";
/// Label on the ConfigMap carrying the DNS suffix used when no fqdn is given.
pub const TUNNEL_DOMAIN_LABEL: &str = "tunnels.networking.cfargotunnel.com/domain";
