//! External program engine
//!
//! Each provisioning call runs the configured program once. The request is
//! written to its stdin as a JSON object:
//!
//! ```json
//! {"action": "create", "kind": "aws:iam/role:Role", "name": "role",
//!  "args": {...}, "attributes": {...}}
//! ```
//!
//! For `create` and `update` the program prints the resource's attributes as
//! a JSON object on stdout. A non-zero exit fails the call with its stderr.

use anyhow::{Context, Result, bail};
use provision::{Attributes, Provisioner, ResourceKind};
use serde::Serialize;
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Create,
    Update,
    Delete,
}

#[derive(Serialize)]
struct Request<'a> {
    action: Action,
    kind: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a Attributes>,
}

/// Engine that shells out to a provisioning program
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Run the program with a request, returning its stdout
    fn call(&self, request: &Request<'_>) -> Result<String> {
        let payload = serde_json::to_vec(request).context("Failed to encode request")?;
        log::trace!("{} <- {}", self.program, String::from_utf8_lossy(&payload));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute: {} {}", self.program, self.args.join(" ")))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload) {
                Ok(()) => {}
                // The program exited without reading its request; its status decides
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    log::debug!("{} closed stdin before reading the request", self.program);
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to write request to {}", self.program));
                }
            }
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Command failed ({}): {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn call_for_attributes(&self, request: &Request<'_>) -> Result<Attributes> {
        let stdout = self.call(request)?;
        serde_json::from_str(&stdout).with_context(|| {
            format!(
                "Expected a JSON object of attributes from {}, got: {}",
                self.program, stdout
            )
        })
    }
}

impl Provisioner for CommandEngine {
    fn create(&self, kind: &ResourceKind, id: &str, args: &Value) -> Result<Attributes> {
        self.call_for_attributes(&Request {
            action: Action::Create,
            kind: kind.as_str(),
            name: id,
            args: Some(args),
            attributes: None,
        })
    }

    fn update(
        &self,
        kind: &ResourceKind,
        id: &str,
        args: &Value,
        current: &Attributes,
    ) -> Result<Attributes> {
        self.call_for_attributes(&Request {
            action: Action::Update,
            kind: kind.as_str(),
            name: id,
            args: Some(args),
            attributes: Some(current),
        })
    }

    fn delete(&self, kind: &ResourceKind, id: &str, attributes: &Attributes) -> Result<()> {
        self.call(&Request {
            action: Action::Delete,
            kind: kind.as_str(),
            name: id,
            args: None,
            attributes: Some(attributes),
        })
        .map(|_| ())
    }
}
