//! Instance identity: hostname, interface addresses and build version.
//!
//! Discovered once at startup. Both lookups are best-effort — a failing
//! hostname lookup falls back to a synthesized name, a failing interface
//! enumeration yields an empty address list. Neither stops the service.

use serde::Serialize;
use tracing::{error, warn};

/// Prefix for the hostname synthesized when the OS lookup fails.
const GENERATED_HOST_PREFIX: &str = "gen-host-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub hostname: String,
    pub ips: Vec<String>,
    pub version: String,
}

impl Identity {
    /// Look up the hostname and local addresses of this process.
    pub fn discover(version: &str) -> Self {
        let hostname = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                error!(error = %e, "unable to get hostname, generating something...");
                generated_hostname(version)
            }
        };

        Self {
            hostname,
            ips: interface_addresses(),
            version: version.to_owned(),
        }
    }

    /// Serialize to the JSON document shape `{hostname, ips, version}`.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn generated_hostname(version: &str) -> String {
    format!("{GENERATED_HOST_PREFIX}{version}")
}

fn interface_addresses() -> Vec<String> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .map(|iface| iface.ip().to_string())
            .collect(),
        Err(e) => {
            warn!(error = %e, "unable to enumerate network interfaces");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_hostname_combines_prefix_and_version() {
        assert_eq!(generated_hostname("1.2.3"), "gen-host-1.2.3");
        assert_eq!(generated_hostname(""), "gen-host-");
    }

    #[test]
    fn json_has_hostname_ips_and_version_fields() {
        let identity = Identity {
            hostname: "pod-7".into(),
            ips: vec!["127.0.0.1".into(), "10.0.0.4".into()],
            version: "0.1.0".into(),
        };

        let bytes = identity.to_json().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["hostname"], "pod-7");
        assert_eq!(json["ips"][0], "127.0.0.1");
        assert_eq!(json["ips"][1], "10.0.0.4");
        assert_eq!(json["version"], "0.1.0");
    }

    #[test]
    fn discover_records_version_and_a_hostname() {
        let identity = Identity::discover("9.9.9");

        assert_eq!(identity.version, "9.9.9");
        assert!(!identity.hostname.is_empty());
        for ip in &identity.ips {
            assert!(ip.parse::<std::net::IpAddr>().is_ok(), "not an ip: {ip}");
        }
    }
}
