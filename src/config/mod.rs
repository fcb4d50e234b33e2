use anyhow::Context;
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::adapter::{optional_string_parameter, string_parameter, PluginParameters};
use crate::error::{CniError, Result};
use crate::types::CNI_VERSION;

/// Plugin type name written into network configurations
pub const PLUGIN_TYPE: &str = "easycni";

/// Installer and tooling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EasyCniConfig {
    /// Path to the CNI bin directory
    pub cni_bin_dir: PathBuf,
    /// Path to the CNI config directory
    pub cni_conf_dir: PathBuf,
    /// Network name used in generated configurations
    pub network_name: String,
    /// Subnet handed to the plugin
    pub subnet: String,
}

impl Default for EasyCniConfig {
    fn default() -> Self {
        Self {
            cni_bin_dir: PathBuf::from("/opt/cni/bin"),
            cni_conf_dir: PathBuf::from("/etc/cni/net.d"),
            network_name: "easycni".to_string(),
            subnet: "10.10.0.0/24".to_string(),
        }
    }
}

/// Typed view of the plugin parameters read from stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetConf {
    /// CNI specification version
    pub cni_version: Option<String>,
    /// Name of the network
    pub name: Option<String>,
    /// Type of CNI plugin
    pub plugin_type: Option<String>,
    /// IPv4 subnet to assign from
    pub subnet: Ipv4Network,
}

impl NetConf {
    /// Build a NetConf from the untyped parameters. Unknown keys are ignored.
    pub fn from_parameters(params: &PluginParameters) -> Result<Self> {
        let subnet = string_parameter(params, "subnet")?
            .parse::<Ipv4Network>()
            .map_err(|e| CniError::invalid("subnet", e.to_string()))?;

        Ok(Self {
            cni_version: optional_string_parameter(params, "cniVersion")?,
            name: optional_string_parameter(params, "name")?,
            plugin_type: optional_string_parameter(params, "type")?,
            subnet,
        })
    }
}

/// A `.conflist` document as read by container runtimes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfigList {
    #[serde(rename = "cniVersion")]
    pub cni_version: String,
    pub name: String,
    pub plugins: Vec<PluginConfig>,
}

/// One plugin entry of a conflist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(rename = "type")]
    pub plugin_type: String,
    pub subnet: String,
}

impl NetworkConfigList {
    /// Create a conflist with a single easycni entry
    pub fn new(name: &str, subnet: &str) -> Self {
        Self {
            cni_version: CNI_VERSION.to_string(),
            name: name.to_string(),
            plugins: vec![PluginConfig {
                plugin_type: PLUGIN_TYPE.to_string(),
                subnet: subnet.to_string(),
            }],
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write CNI config to {}", path.display()))?;
        Ok(())
    }
}

/// Installer for the easycni plugin
pub struct Installer {
    config: EasyCniConfig,
}

impl Installer {
    /// Create a new installer
    pub fn new(config: EasyCniConfig) -> Self {
        Self { config }
    }

    /// Path the conflist is written to
    pub fn conflist_path(&self) -> PathBuf {
        self.config.cni_conf_dir.join("10-easycni.conflist")
    }

    /// Copy `plugin_binary` into the bin dir and write the network configuration.
    pub fn install(&self, plugin_binary: &Path) -> anyhow::Result<PathBuf> {
        self.config
            .subnet
            .parse::<Ipv4Network>()
            .with_context(|| format!("Invalid subnet {}", self.config.subnet))?;

        for dir in [&self.config.cni_bin_dir, &self.config.cni_conf_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let target = self.config.cni_bin_dir.join(PLUGIN_TYPE);
        fs::copy(plugin_binary, &target).with_context(|| {
            format!("Failed to copy {} to {}", plugin_binary.display(), target.display())
        })?;
        info!("Installed plugin binary at {}", target.display());

        let conflist = NetworkConfigList::new(&self.config.network_name, &self.config.subnet);
        let config_path = self.conflist_path();
        conflist.save(&config_path)?;
        info!("Wrote network configuration {}", config_path.display());

        Ok(target)
    }
}
