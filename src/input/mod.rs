//! Reading the CNI invocation: environment variables and piped stdin.

use nix::sys::stat::{fstat, SFlag};
use std::collections::HashMap;
use std::env;
use std::io::{self, BufRead};
use std::os::unix::io::AsRawFd;
use tracing::debug;

use crate::error::Result;

pub const CNI_COMMAND: &str = "CNI_COMMAND";
pub const CNI_CONTAINERID: &str = "CNI_CONTAINERID";
pub const CNI_NETNS: &str = "CNI_NETNS";
pub const CNI_IFNAME: &str = "CNI_IFNAME";
pub const CNI_ARGS: &str = "CNI_ARGS";
pub const CNI_PATH: &str = "CNI_PATH";
pub const STDIN: &str = "STDIN";

/// Environment variables read for every invocation
pub const ENV_FIELDS: [&str; 6] = [CNI_COMMAND, CNI_CONTAINERID, CNI_NETNS, CNI_IFNAME, CNI_ARGS, CNI_PATH];

/// Parameters of one plugin invocation, captured once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationInput {
    fields: HashMap<String, String>,
    stdin: Vec<u8>,
}

impl InvocationInput {
    /// Read the process environment and, if stdin is a pipe, drain it.
    pub fn read() -> Result<Self> {
        let stdin = io::stdin();
        let data = if is_pipe(&stdin)? {
            drain(stdin.lock())?
        } else {
            debug!("stdin is not a pipe, no plugin parameters");
            Vec::new()
        };

        Ok(Self::from_lookup(|key| env::var(key).ok(), data))
    }

    /// Build an input from any variable source. Missing variables become "".
    pub fn from_lookup<F, S>(lookup: F, stdin: S) -> Self
    where
        F: Fn(&str) -> Option<String>,
        S: Into<Vec<u8>>,
    {
        let stdin = stdin.into();
        let mut fields: HashMap<String, String> = ENV_FIELDS
            .iter()
            .map(|key| (key.to_string(), lookup(key).unwrap_or_default()))
            .collect();
        fields.insert(STDIN.to_string(), String::from_utf8_lossy(&stdin).into_owned());

        Self { fields, stdin }
    }

    /// Value of one field, "" when unknown.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// All fields, keyed by variable name plus `STDIN`.
    ///
    /// `STDIN` is decoded lossily; invalid UTF-8 shows up as U+FFFD.
    pub fn raw(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// Stdin exactly as drained
    pub fn stdin_bytes(&self) -> &[u8] {
        &self.stdin
    }

    /// Parse `CNI_ARGS` into key-value pairs
    pub fn cni_args(&self) -> HashMap<String, String> {
        parse_cni_args(self.get(CNI_ARGS))
    }
}

/// Whether stdin is a FIFO, as opposed to a terminal or /dev/null.
fn is_pipe(stdin: &io::Stdin) -> Result<bool> {
    let stat = fstat(stdin.as_raw_fd()).map_err(io::Error::from)?;
    let kind = SFlag::from_bits_truncate(stat.st_mode) & SFlag::S_IFMT;
    Ok(kind == SFlag::S_IFIFO)
}

/// Concatenate every line of `reader`, dropping `\n` and `\r\n` terminators.
///
/// Only stream errors fail; the bytes are not required to be UTF-8.
pub fn drain<R: BufRead>(reader: R) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        data.extend_from_slice(line.strip_suffix(b"\r").unwrap_or(&line[..]));
    }
    debug!(bytes = data.len(), "drained stdin");
    Ok(data)
}

/// Parse a CNI_ARGS string such as `IgnoreUnknown=1;K8S_POD_NAME=web`
fn parse_cni_args(args_str: &str) -> HashMap<String, String> {
    let mut args = HashMap::new();

    for pair in args_str.split(';') {
        if let Some((key, value)) = pair.split_once('=') {
            if !key.is_empty() {
                args.insert(key.to_string(), value.to_string());
            }
        }
    }

    args
}
