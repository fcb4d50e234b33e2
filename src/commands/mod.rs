use std::fmt;
use tracing::{debug, info, warn};

use crate::adapter::{render_cni_error, Adapter, PluginParameters};
use crate::error::{CniError, Result};

/// CNI operation requested through CNI_COMMAND
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add,
    Del,
    Version,
    /// Anything else, kept verbatim for the error message
    Other(String),
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ADD" => Command::Add,
            "DEL" => Command::Del,
            "VERSION" => Command::Version,
            other => Command::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Add => f.write_str("ADD"),
            Command::Del => f.write_str("DEL"),
            Command::Version => f.write_str("VERSION"),
            Command::Other(s) => f.write_str(s),
        }
    }
}

/// Network setup logic invoked for ADD
pub trait Plugin {
    /// Configure the network described by `params` and record what was
    /// created through the adapter's `add_*` methods.
    fn add(&self, params: &PluginParameters, adapter: &mut Adapter) -> Result<()>;
}

/// Dispatch on the invocation's command and return the one line to print.
///
/// CNI-level failures are reported in-band as an error document; the
/// process still exits 0.
pub fn dispatch<P: Plugin>(adapter: &mut Adapter, plugin: &P) -> String {
    let command = Command::from(adapter.command());
    info!(
        command = %command,
        container_id = adapter.container_id(),
        ifname = adapter.if_name(),
        "handling CNI invocation"
    );

    match command {
        Command::Version => adapter.render_version(),
        Command::Del => {
            debug!("DEL has no teardown");
            String::new()
        }
        Command::Add => match cmd_add(adapter, plugin) {
            Ok(()) => adapter.render_success(),
            Err(err) => {
                warn!("ADD failed: {}", err);
                render_cni_error(&err)
            }
        },
        Command::Other(cmd) => {
            let err = CniError::UnsupportedCommand(cmd);
            warn!("{}", err);
            render_cni_error(&err)
        }
    }
}

fn cmd_add<P: Plugin>(adapter: &mut Adapter, plugin: &P) -> Result<()> {
    let params = adapter.plugin_parameters()?;
    plugin.add(&params, adapter)
}
