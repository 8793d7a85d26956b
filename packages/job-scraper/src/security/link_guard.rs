//! URL guard for detail-page fetches (SSRF protection).

use std::collections::HashSet;
use std::net::IpAddr;
use url::{Host, Url};

use crate::error::{SecurityError, SecurityResult};

/// Rejects links that would make the scraper reach internal services.
///
/// Blocks:
/// - non-HTTP(S) schemes (file://, ftp://)
/// - localhost and cloud metadata hostnames
/// - private, loopback and link-local IP literals
#[derive(Debug, Clone)]
pub struct LinkGuard {
    allowed_schemes: HashSet<String>,
    blocked_hosts: HashSet<String>,
    blocked_cidrs: Vec<ipnet::IpNet>,
}

impl Default for LinkGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkGuard {
    pub fn new() -> Self {
        let blocked_cidrs = [
            "10.0.0.0/8",
            "172.16.0.0/12",
            "192.168.0.0/16",
            "169.254.0.0/16", // Link-local / cloud metadata
            "127.0.0.0/8",
            "0.0.0.0/8",
            "::1/128",
            "fc00::/7",
            "fe80::/10",
        ]
        .into_iter()
        .filter_map(|cidr| cidr.parse().ok())
        .collect();

        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: [
                "localhost",
                "metadata.google.internal",
                "metadata.gke.internal",
                "instance-data",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            blocked_cidrs,
        }
    }

    /// Block an additional host.
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(host.into().to_lowercase());
        self
    }

    /// Check a link before fetching it.
    pub fn check(&self, link: &str) -> SecurityResult<()> {
        let parsed = Url::parse(link)?;

        if !self.allowed_schemes.contains(parsed.scheme()) {
            return Err(SecurityError::DisallowedScheme(parsed.scheme().to_string()));
        }

        let ip: IpAddr = match parsed.host().ok_or(SecurityError::NoHost)? {
            Host::Domain(domain) => {
                let domain = domain.to_lowercase();
                if self.blocked_hosts.contains(&domain) || domain.ends_with(".localhost") {
                    return Err(SecurityError::BlockedHost(domain));
                }
                return Ok(());
            }
            Host::Ipv4(v4) => v4.into(),
            Host::Ipv6(v6) => v6.into(),
        };

        if self.blocked_cidrs.iter().any(|cidr| cidr.contains(&ip)) {
            return Err(SecurityError::BlockedCidr(ip.to_string()));
        }

        Ok(())
    }
}
