use ipnet::IpNet;
use serde::Deserialize;
use std::net::IpAddr;

/// Identity propagation from the authentication layer in front of the gateway
///
/// The gateway does not authenticate callers itself. It trusts the headers below to carry the
/// already-verified principal and its authorities.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AuthConfig {
    /// Header carrying the authenticated principal name
    /// Default: "x-authenticated-user"
    #[serde(default = "default_principal_header")]
    pub principal_header: String,
    /// Header carrying the principal's authorities, comma separated (e.g. "ROLE_USER,ROLE_ADMIN")
    /// Default: "x-authenticated-roles"
    #[serde(default = "default_roles_header")]
    pub roles_header: String,
    /// Peers allowed to assert identity and client address
    /// Supports CIDR notation: ["10.0.0.0/8", "::1/128"]
    ///
    /// Identity headers and the first X-Forwarded-For hop are honored only if the TCP peer is
    /// inside one of these networks. When empty, every caller is keyed on its TCP peer address.
    /// Default: []
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_ip_networks")]
    pub trusted_proxies: Vec<IpNet>,
    /// Honor identity headers from any peer
    /// Only safe when nothing but the authentication layer can reach the gateway port.
    /// X-Forwarded-For still requires a trusted proxy.
    /// Default: false
    #[serde(default)]
    pub trust_identity_from_any_peer: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            principal_header: default_principal_header(),
            roles_header: default_roles_header(),
            trusted_proxies: vec![],
            trust_identity_from_any_peer: false,
        }
    }
}

impl AuthConfig {
    /// Whether identity headers sent by `peer` may be trusted.
    pub fn trusts_identity_from(&self, peer: IpAddr) -> bool {
        self.trust_identity_from_any_peer || self.is_trusted_proxy(peer)
    }

    /// Whether `peer` is an explicitly configured proxy.
    pub fn is_trusted_proxy(&self, peer: IpAddr) -> bool {
        self.trusted_proxies.iter().any(|net| net.contains(&peer))
    }
}

fn default_principal_header() -> String {
    "x-authenticated-user".to_string()
}

fn default_roles_header() -> String {
    "x-authenticated-roles".to_string()
}

/// Custom deserializer for IP networks that handles parsing errors gracefully
fn deserialize_ip_networks<'de, D>(deserializer: D) -> Result<Vec<IpNet>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let strings: Vec<String> = Vec::deserialize(deserializer)?;
    let mut networks = Vec::new();

    for s in strings {
        // Bare addresses are accepted as single-host networks
        let parsed = s
            .parse::<IpNet>()
            .or_else(|_| s.parse::<IpAddr>().map(IpNet::from));
        match parsed {
            Ok(net) => networks.push(net),
            Err(e) => {
                return Err(serde::de::Error::custom(format!(
                    "Invalid IP network '{}': {}",
                    s, e
                )));
            }
        }
    }

    Ok(networks)
}
