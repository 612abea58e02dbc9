use k8s_openapi::api::networking::v1::Ingress;

use super::{HostRule, IngressRoute, TunnelConfiguration};

const CLOUDFLARED_CONFIG: &str = r"
tunnel: 6ff42ae2-765d-4adf-8112-31c55c1551ef
credentials-file: /etc/cloudflared/creds/credentials.json
metrics: 0.0.0.0:2000
no-autoupdate: true
ingress:
- hostname: web.example.com
  service: web.default.svc
  originRequest:
    noTLSVerify: true
- hostname: api.example.com
  service: api.default.svc
  path: /v1
- service: http_status:404
";

#[test]
pub fn test_decode_keeps_unknown_keys() {
    let config = TunnelConfiguration::decode(CLOUDFLARED_CONFIG).unwrap();
    let routes = config.routes();
    assert_eq!(routes.len(), 3);
    assert_eq!(routes[0].hostname, "web.example.com");
    assert_eq!(routes[0].service, "web.default.svc");
    assert!(routes[0].other.contains_key("originRequest"));
    assert!(routes[1].other.contains_key("path"));
    assert_eq!(routes[2].hostname, "");
    assert_eq!(routes[2].service, "http_status:404");
    assert!(config.other.contains_key("tunnel"));
    assert!(config.other.contains_key("credentials-file"));
    assert!(config.other.contains_key("no-autoupdate"));
}

#[test]
pub fn test_encode_preserves_document() {
    let config = TunnelConfiguration::decode(CLOUDFLARED_CONFIG).unwrap();
    let encoded = config.encode().unwrap();
    println!("{encoded}");
    assert!(encoded.contains("credentials-file: /etc/cloudflared/creds/credentials.json"));
    assert!(encoded.contains("noTLSVerify: true"));
    assert!(!encoded.contains("hostname: ''"));
    assert_eq!(TunnelConfiguration::decode(&encoded).unwrap(), config);
}

#[test]
pub fn test_empty_routes_are_omitted() {
    let mut config = TunnelConfiguration::decode(CLOUDFLARED_CONFIG).unwrap();
    config.ingress = None;
    let encoded = config.encode().unwrap();
    assert!(!encoded.contains("ingress"));
    assert!(encoded.contains("tunnel: 6ff42ae2-765d-4adf-8112-31c55c1551ef"));

    let config = TunnelConfiguration::with_routes(vec![]);
    assert_eq!(config.ingress, None);
    assert!(!config.encode().unwrap().contains("ingress"));
}

#[test]
pub fn test_decode_empty_payload() {
    assert_eq!(TunnelConfiguration::decode("").unwrap(), TunnelConfiguration::default());
    assert_eq!(TunnelConfiguration::decode("  \n").unwrap(), TunnelConfiguration::default());
}

#[test]
pub fn test_decode_rejects_malformed_payload() {
    assert!(TunnelConfiguration::decode("ingress: [").is_err());
    assert!(TunnelConfiguration::decode("ingress: not-a-list").is_err());
    assert!(TunnelConfiguration::decode("ingress:\n- hostname: [a, b]\n  service: x").is_err());
}

#[test]
pub fn test_host_rules_from_ingress() {
    let ingress = r"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
  namespace: apps
  annotations:
    tunnels.networking.cfargotunnel.com/name: home
spec:
  rules:
  - host: web.internal.lan
    http:
      paths:
      - path: /
        pathType: Prefix
        backend:
          service:
            name: web
            port:
              number: 80
  - http:
      paths:
      - path: /
        pathType: Prefix
        backend:
          service:
            name: fallback
            port:
              number: 80
  - host: api.internal.lan
";
    let ingress: Ingress = serde_yaml::from_str(ingress).unwrap();
    let rules = HostRule::from_ingress(&ingress);
    assert_eq!(rules, vec![HostRule::new("web.internal.lan", "web.internal.lan"), HostRule::new("api.internal.lan", "api.internal.lan")]);
    assert!(HostRule::from_ingress(&Ingress::default()).is_empty());
}

#[test]
pub fn test_new_route_has_no_extra_fields() {
    let route = IngressRoute::new("a.example.com", "svcA");
    let encoded = serde_yaml::to_string(&route).unwrap();
    assert_eq!(encoded, "hostname: a.example.com\nservice: svcA\n");
}
