use k8s_openapi::api::networking::v1::Ingress;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

pub const CONFIGMAP_KEY: &str = "config.yaml";

/// The cloudflared `config.yaml` document. Only `ingress` is interpreted, every other key is carried through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelConfiguration {
    #[serde(flatten)]
    pub other: Mapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<Vec<IngressRoute>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IngressRoute {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(default)]
    pub service: String,
    #[serde(flatten)]
    pub other: Mapping,
}

impl IngressRoute {
    pub fn new(hostname: &str, service: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            service: service.to_owned(),
            other: Mapping::default(),
        }
    }
}

impl TunnelConfiguration {
    pub fn with_routes(routes: Vec<IngressRoute>) -> Self {
        Self {
            other: Mapping::default(),
            ingress: if routes.is_empty() { None } else { Some(routes) },
        }
    }

    pub fn routes(&self) -> &[IngressRoute] {
        self.ingress.as_deref().unwrap_or_default()
    }

    pub fn decode(payload: &str) -> Result<Self, serde_yaml::Error> {
        if payload.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(payload)
    }

    pub fn encode(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// A host declared by an Ingress rule together with the service the tunnel forwards it to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostRule {
    pub host: String,
    pub service: String,
}

impl HostRule {
    pub fn new(host: &str, service: &str) -> Self {
        Self {
            host: host.to_owned(),
            service: service.to_owned(),
        }
    }

    /// Traffic for a rule is forwarded to the rule's own host, which the in-cluster ingress serves.
    pub fn from_ingress(ingress: &Ingress) -> Vec<HostRule> {
        ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.rules.as_ref())
            .map(|rules| {
                rules
                    .iter()
                    .filter_map(|rule| rule.host.as_deref())
                    .filter(|host| !host.is_empty())
                    .map(|host| HostRule::new(host, host))
                    .collect()
            })
            .unwrap_or_default()
    }
}
