use std::{collections::BTreeMap, fmt::Display};

use itertools::Itertools;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;

use crate::common::{FQDN_ANNOTATION, TUNNEL_CRD_ANNOTATION, TUNNEL_ID_ANNOTATION, TUNNEL_NAMESPACE_ANNOTATION, TUNNEL_NAME_ANNOTATION};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamespaceScope {
    Own,
    Explicit(String),
    ClusterWide,
}

impl From<Option<&String>> for NamespaceScope {
    fn from(value: Option<&String>) -> Self {
        match value.map(String::as_str) {
            None | Some("true") => NamespaceScope::Own,
            Some("false") => NamespaceScope::ClusterWide,
            Some(namespace) => NamespaceScope::Explicit(namespace.to_owned()),
        }
    }
}

/// The tunnel related annotations found on an Ingress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TunnelAnnotations {
    pub tunnel_crd: Option<String>,
    pub tunnel_id: Option<String>,
    pub tunnel_name: Option<String>,
    pub fqdn: Option<String>,
    pub namespace_scope: NamespaceScope,
}

impl From<&BTreeMap<String, String>> for TunnelAnnotations {
    fn from(annotations: &BTreeMap<String, String>) -> Self {
        Self {
            tunnel_crd: annotations.get(TUNNEL_CRD_ANNOTATION).cloned(),
            tunnel_id: annotations.get(TUNNEL_ID_ANNOTATION).cloned(),
            tunnel_name: annotations.get(TUNNEL_NAME_ANNOTATION).cloned(),
            fqdn: annotations.get(FQDN_ANNOTATION).filter(|fqdn| !fqdn.is_empty()).cloned(),
            namespace_scope: NamespaceScope::from(annotations.get(TUNNEL_NAMESPACE_ANNOTATION)),
        }
    }
}

impl TunnelAnnotations {
    pub fn is_managed(&self) -> bool {
        self.tunnel_crd.is_some() || self.tunnel_id.is_some() || self.tunnel_name.is_some()
    }

    pub fn fqdn_override(&self) -> Option<&str> {
        self.fqdn.as_deref()
    }
}

/// Labels and namespace used to find the ConfigMap holding the tunnel configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentSelector {
    pub labels: BTreeMap<String, String>,
    pub namespace: Option<String>,
}

impl DocumentSelector {
    pub fn label_selector(&self) -> String {
        self.labels.iter().map(|(key, value)| format!("{key}={value}")).join(",")
    }

    #[allow(dead_code)]
    pub fn matches(&self, config_map: &ConfigMap) -> bool {
        if let Some(namespace) = &self.namespace {
            if config_map.namespace().as_ref() != Some(namespace) {
                return false;
            }
        }
        let labels = config_map.labels();
        self.labels.iter().all(|(key, value)| labels.get(key) == Some(value))
    }
}

impl Display for DocumentSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "namespace={} labels={}", self.namespace.as_deref().unwrap_or("*"), self.label_selector())
    }
}

pub struct SelectorResolver;

impl SelectorResolver {
    /// Returns `None` when the Ingress carries none of the tunnel identifying annotations.
    pub fn resolve(annotations: &TunnelAnnotations, ingress_namespace: &str) -> Option<DocumentSelector> {
        if !annotations.is_managed() {
            return None;
        }

        let mut labels = BTreeMap::new();
        if let Some(tunnel_id) = &annotations.tunnel_id {
            labels.insert(TUNNEL_ID_ANNOTATION.to_owned(), tunnel_id.clone());
        }
        if let Some(tunnel_name) = &annotations.tunnel_name {
            labels.insert(TUNNEL_NAME_ANNOTATION.to_owned(), tunnel_name.clone());
        }
        if let Some(tunnel_crd) = &annotations.tunnel_crd {
            labels.insert(TUNNEL_CRD_ANNOTATION.to_owned(), tunnel_crd.clone());
        }

        let namespace = match &annotations.namespace_scope {
            NamespaceScope::Own => Some(ingress_namespace.to_owned()),
            NamespaceScope::Explicit(namespace) => Some(namespace.clone()),
            NamespaceScope::ClusterWide => None,
        };
        if let Some(namespace) = &namespace {
            labels.insert(TUNNEL_NAMESPACE_ANNOTATION.to_owned(), namespace.clone());
        }

        Some(DocumentSelector { labels, namespace })
    }
}
