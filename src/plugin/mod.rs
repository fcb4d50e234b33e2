use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use tracing::info;

use crate::adapter::{Adapter, PluginParameters};
use crate::commands::Plugin;
use crate::config::NetConf;
use crate::error::{CniError, Result};
use crate::types::{Interface, IpConfig};

/// Host offset of the container address inside the subnet
pub const HOST_OFFSET: u32 = 10;
/// Host offset of the gateway inside the subnet
pub const GATEWAY_OFFSET: u32 = 1;

pub const INTERFACE_NAME: &str = "veth0";
pub const MAC_ADDRESS: &str = "aa:aa:aa:aa:aa:aa";

/// Example plugin that hands out a fixed address from the configured subnet.
///
/// It reports what it would create; no links or addresses are touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubnetPlugin;

impl SubnetPlugin {
    /// Container address and gateway for `subnet`
    pub fn addresses(subnet: Ipv4Network) -> Result<(Ipv4Network, Ipv4Addr)> {
        // A /28 is the smallest network where host 10 is neither the
        // broadcast address nor outside the range.
        if subnet.prefix() > 28 {
            return Err(CniError::invalid(
                "subnet",
                format!("{} is too small to hold host {}", subnet, HOST_OFFSET),
            ));
        }

        let base = u32::from(subnet.network());
        let address = Ipv4Network::new(Ipv4Addr::from(base + HOST_OFFSET), subnet.prefix())
            .map_err(|e| CniError::invalid("subnet", e.to_string()))?;
        let gateway = Ipv4Addr::from(base + GATEWAY_OFFSET);

        Ok((address, gateway))
    }
}

impl Plugin for SubnetPlugin {
    fn add(&self, params: &PluginParameters, adapter: &mut Adapter) -> Result<()> {
        let conf = NetConf::from_parameters(params)?;
        let (address, gateway) = Self::addresses(conf.subnet)?;
        let netns = adapter.netns().to_string();

        info!(%address, %gateway, netns = %netns, "assigning address");

        adapter.add_interface(Interface {
            name: INTERFACE_NAME.to_string(),
            mac: MAC_ADDRESS.to_string(),
            sandbox: netns,
        });
        adapter.add_ip(IpConfig {
            version: "4".to_string(),
            address: address.to_string(),
            gateway: gateway.to_string(),
            interface: 0,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Network {
        s.parse().unwrap()
    }

    #[test]
    fn addresses_for_slash_24() {
        let (address, gateway) = SubnetPlugin::addresses(net("10.0.0.0/24")).unwrap();
        assert_eq!(address.to_string(), "10.0.0.10/24");
        assert_eq!(gateway.to_string(), "10.0.0.1");
    }

    #[test]
    fn addresses_ignore_host_bits() {
        let (address, gateway) = SubnetPlugin::addresses(net("192.168.4.77/22")).unwrap();
        assert_eq!(address.to_string(), "192.168.4.10/22");
        assert_eq!(gateway.to_string(), "192.168.4.1");
    }

    #[test]
    fn smallest_usable_subnet() {
        assert!(SubnetPlugin::addresses(net("10.0.0.0/28")).is_ok());
        assert!(SubnetPlugin::addresses(net("10.0.0.0/29")).is_err());
    }
}
