//! The CNI protocol adapter.
//!
//! One `Adapter` lives for one invocation: it owns the captured input,
//! the version negotiation data and the result accumulated during ADD,
//! and turns them into the JSON documents a runtime expects on stdout.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::error::{CniError, Result, CODE_UNKNOWN};
use crate::input::{self, InvocationInput};
use crate::types::{Dns, ErrorResult, Interface, IpConfig, Route, SuccessResult, VersionInfo, CNI_VERSION};

/// Untyped plugin parameters decoded from stdin
pub type PluginParameters = Map<String, Value>;

/// Single-invocation CNI protocol adapter
#[derive(Debug, Clone)]
pub struct Adapter {
    input: InvocationInput,
    version: VersionInfo,
    success: SuccessResult,
}

impl Adapter {
    /// Capture the current process invocation.
    pub fn new() -> Result<Self> {
        Ok(Self::with_input(InvocationInput::read()?))
    }

    /// Create an adapter over an already captured input
    pub fn with_input(input: InvocationInput) -> Self {
        Self {
            input,
            version: VersionInfo::default(),
            success: SuccessResult::new(CNI_VERSION),
        }
    }

    pub fn path(&self) -> &str {
        self.input.get(input::CNI_PATH)
    }

    pub fn args(&self) -> &str {
        self.input.get(input::CNI_ARGS)
    }

    pub fn container_id(&self) -> &str {
        self.input.get(input::CNI_CONTAINERID)
    }

    pub fn if_name(&self) -> &str {
        self.input.get(input::CNI_IFNAME)
    }

    pub fn command(&self) -> &str {
        self.input.get(input::CNI_COMMAND)
    }

    pub fn netns(&self) -> &str {
        self.input.get(input::CNI_NETNS)
    }

    pub fn stdin(&self) -> &str {
        self.input.get(input::STDIN)
    }

    /// The full captured input
    pub fn raw_input(&self) -> &InvocationInput {
        &self.input
    }

    pub fn version_info(&self) -> &VersionInfo {
        &self.version
    }

    /// Result accumulated so far
    pub fn result(&self) -> &SuccessResult {
        &self.success
    }

    /// Decode stdin as a JSON object.
    ///
    /// Fails with [`CniError::Config`] when stdin was empty and with
    /// [`CniError::Parse`] when it is not a UTF-8 JSON object.
    pub fn plugin_parameters(&self) -> Result<PluginParameters> {
        let stdin = self.input.stdin_bytes();
        if stdin.is_empty() {
            return Err(CniError::Config);
        }

        Ok(serde_json::from_slice(stdin)?)
    }

    pub fn add_interface(&mut self, interface: Interface) {
        self.success.add_interface(interface);
    }

    pub fn add_ip(&mut self, ip: IpConfig) {
        self.success.add_ip(ip);
    }

    pub fn add_route(&mut self, route: Route) {
        self.success.add_route(route);
    }

    pub fn add_dns(&mut self, dns: Dns) {
        self.success.add_dns(dns);
    }

    /// The VERSION reply, or an error document if it cannot be marshalled
    pub fn render_version(&self) -> String {
        render_or_error(&self.version)
    }

    /// The accumulated ADD result, or an error document if it cannot be marshalled
    pub fn render_success(&self) -> String {
        render_or_error(&self.success)
    }
}

/// Render an error document with the generic CNI error code.
pub fn render_error(msg: &str) -> String {
    render_error_code(CODE_UNKNOWN, msg)
}

/// Render `err` as an error document carrying its own code
pub fn render_cni_error(err: &CniError) -> String {
    render_error_code(err.code(), &err.to_string())
}

fn render_error_code(code: u32, msg: &str) -> String {
    // An ErrorResult holds only strings and an integer.
    serde_json::to_string(&ErrorResult::new(code, msg))
        .unwrap_or_else(|e| panic!("cannot serialize CNI error document: {e}"))
}

fn render_or_error<T: Serialize>(document: &T) -> String {
    match serde_json::to_string(document) {
        Ok(json) => json,
        Err(e) => {
            let err = CniError::Serialization(e.to_string());
            error!("failed to render CNI document: {}", err);
            render_cni_error(&err)
        }
    }
}

/// Pull an optional string parameter; `null` counts as absent
pub fn optional_string_parameter(params: &PluginParameters, name: &str) -> Result<Option<String>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => string_parameter(params, name).map(|s| Some(s.to_string())),
    }
}

/// Pull a required string parameter out of the untyped mapping
pub fn string_parameter<'a>(params: &'a PluginParameters, name: &str) -> Result<&'a str> {
    match params.get(name) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => {
            warn!(parameter = name, "plugin parameter has unexpected type");
            Err(CniError::invalid(name, format!("expected a string, got {other}")))
        }
        None => Err(CniError::invalid(name, "missing")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("boom"))
        }
    }

    #[test]
    fn render_failure_degrades_to_error_document() {
        let out = render_or_error(&Unserializable);
        let doc: ErrorResult = serde_json::from_str(&out).unwrap();
        assert_eq!(doc.code, 7);
        assert_eq!(doc.msg, "boom");
        assert_eq!(doc.details, "boom");
    }

    #[test]
    fn string_parameter_type_mismatch() {
        let params: PluginParameters = serde_json::from_str(r#"{"subnet": 24}"#).unwrap();
        let err = string_parameter(&params, "subnet").unwrap_err();
        assert!(matches!(err, CniError::InvalidParameter { .. }));
        assert_eq!(err.to_string(), "Invalid plugin parameter 'subnet': expected a string, got 24");
    }

    #[test]
    fn string_parameter_missing() {
        let params = PluginParameters::new();
        assert!(string_parameter(&params, "subnet").is_err());
    }
}
