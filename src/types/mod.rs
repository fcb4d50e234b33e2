use serde::{Deserialize, Serialize};

/// CNI specification version this plugin declares
pub const CNI_VERSION: &str = "0.3.1";

/// Versions accepted from the runtime, oldest first
pub const SUPPORTED_VERSIONS: [&str; 6] = ["0.1.0", "0.2.0", "0.3.0", "0.3.1", "0.4.0", "1.0.0"];

/// Reply to the VERSION command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Declared CNI specification version
    #[serde(rename = "cniVersion")]
    pub cni_version: String,
    /// All versions this plugin understands
    #[serde(rename = "supportedVersions")]
    pub supported_versions: Vec<String>,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            cni_version: CNI_VERSION.to_string(),
            supported_versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Success result of an ADD (CNI 0.3.1 layout)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResult {
    /// CNI specification version
    #[serde(rename = "cniVersion")]
    pub cni_version: String,
    /// Interfaces created
    pub interfaces: Vec<Interface>,
    /// IP configurations
    pub ips: Vec<IpConfig>,
    /// Routes to configure
    pub routes: Vec<Route>,
    /// DNS configurations
    pub dns: Vec<Dns>,
}

/// Interface information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Interface name
    pub name: String,
    /// MAC address
    pub mac: String,
    /// Sandbox path (network namespace)
    pub sandbox: String,
}

/// IP configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    /// "4" or "6"
    pub version: String,
    /// IP address with prefix length
    pub address: String,
    /// Gateway
    pub gateway: String,
    /// Index into the result's interface list. Not checked against it.
    pub interface: usize,
}

/// Route configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Destination CIDR
    pub dst: String,
    /// Gateway for this route
    pub gw: String,
}

/// DNS configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    pub nameservers: Vec<String>,
    pub domain: String,
    pub search: Vec<String>,
    pub options: Vec<String>,
}

/// Error result written in place of a success or version document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    #[serde(rename = "cniVersion")]
    pub cni_version: String,
    pub code: u32,
    pub msg: String,
    pub details: String,
}

impl SuccessResult {
    /// Create a new empty result
    pub fn new(cni_version: &str) -> Self {
        Self {
            cni_version: cni_version.to_string(),
            interfaces: Vec::new(),
            ips: Vec::new(),
            routes: Vec::new(),
            dns: Vec::new(),
        }
    }

    /// Add an interface to the result
    pub fn add_interface(&mut self, interface: Interface) {
        self.interfaces.push(interface);
    }

    /// Add an IP configuration to the result
    pub fn add_ip(&mut self, ip: IpConfig) {
        self.ips.push(ip);
    }

    /// Add a route to the result
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Add a DNS configuration to the result
    pub fn add_dns(&mut self, dns: Dns) {
        self.dns.push(dns);
    }
}

impl ErrorResult {
    /// Build an error document whose details repeat the message.
    pub fn new(code: u32, msg: &str) -> Self {
        Self {
            cni_version: CNI_VERSION.to_string(),
            code,
            msg: msg.to_string(),
            details: msg.to_string(),
        }
    }
}
