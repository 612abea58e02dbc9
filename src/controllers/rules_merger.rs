use std::collections::BTreeSet;

use tracing::debug;

use crate::common::{HostRule, IngressRoute, TunnelConfiguration};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeMode {
    Apply,
    Cleanup,
}

/// Projects the host rules of one Ingress onto a tunnel configuration.
pub struct RulesMerger<'a> {
    rules: &'a [HostRule],
    domain: Option<&'a str>,
    fqdn_override: Option<&'a str>,
}

impl<'a> RulesMerger<'a> {
    pub fn new(rules: &'a [HostRule], domain: Option<&'a str>, fqdn_override: Option<&'a str>) -> Self {
        Self { rules, domain, fqdn_override }
    }

    /// The override wins for every rule. Otherwise the first label of the rule's host is joined with the domain,
    /// and without a domain the host is used as is.
    pub fn effective_fqdn(&self, rule: &HostRule) -> String {
        if let Some(fqdn) = self.fqdn_override {
            return fqdn.to_owned();
        }
        match self.domain.filter(|domain| !domain.is_empty()) {
            Some(domain) => {
                let first_label = rule.host.split('.').next().unwrap_or_default();
                format!("{first_label}.{domain}")
            },
            None => rule.host.clone(),
        }
    }

    pub fn merge(&self, existing: &TunnelConfiguration, mode: MergeMode) -> TunnelConfiguration {
        if self.rules.is_empty() {
            return existing.clone();
        }
        match mode {
            MergeMode::Apply => self.apply(existing),
            MergeMode::Cleanup => self.cleanup(existing),
        }
    }

    fn apply(&self, existing: &TunnelConfiguration) -> TunnelConfiguration {
        let mut routes = existing.routes().to_vec();
        for rule in self.rules {
            let fqdn = self.effective_fqdn(rule);
            if let Some(route) = routes.iter_mut().find(|route| route.hostname == fqdn) {
                debug!(%fqdn, service = %rule.service, "found existing route for host, modifying the service");
                route.service.clone_from(&rule.service);
            } else {
                debug!(%fqdn, service = %rule.service, "adding route for host");
                routes.push(IngressRoute::new(&fqdn, &rule.service));
            }
        }
        TunnelConfiguration {
            other: existing.other.clone(),
            ingress: Some(routes),
        }
    }

    fn cleanup(&self, existing: &TunnelConfiguration) -> TunnelConfiguration {
        let owned: BTreeSet<String> = self.rules.iter().map(|rule| self.effective_fqdn(rule)).collect();
        let remaining: Vec<IngressRoute> = existing.routes().iter().filter(|route| !owned.contains(&route.hostname)).cloned().collect();
        if remaining.is_empty() {
            debug!("nothing left, removing all routes");
        }
        TunnelConfiguration {
            other: existing.other.clone(),
            ..TunnelConfiguration::with_routes(remaining)
        }
    }
}
