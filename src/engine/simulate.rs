//! In-process fake engine
//!
//! Produces stable, plausible attributes without touching any cloud:
//! the same kind and name always yield the same id, so re-running a stack
//! against its saved state reports no changes.

use anyhow::Result;
use provision::{Attributes, Provisioner, ResourceKind};
use serde_json::{Value, json};

const ACCOUNT: &str = "000000000000";
const REGION: &str = "us-east-1";

#[derive(Debug, Default)]
pub struct SimulateEngine;

impl SimulateEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Short stable digest of a resource's identity
fn digest(kind: &ResourceKind, id: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(id.as_bytes());
    hasher.finalize().to_hex()[..8].to_string()
}

/// Split `aws:iam/role:Role` into (`iam`, `role`)
fn service_and_type(kind: &ResourceKind) -> (String, String) {
    let mut parts = kind.as_str().split(':');
    let _provider = parts.next();
    let module = parts.next().unwrap_or_default();
    let type_name = parts.next().unwrap_or(module);

    let service = module.split('/').next().unwrap_or(module);
    let or_default = |s: &str| {
        if s.is_empty() {
            "resource".to_string()
        } else {
            s.to_lowercase()
        }
    };
    (or_default(service), or_default(type_name))
}

impl Provisioner for SimulateEngine {
    fn create(&self, kind: &ResourceKind, id: &str, args: &Value) -> Result<Attributes> {
        let hash = digest(kind, id);
        let (service, type_name) = service_and_type(kind);
        let physical = format!("{id}-{hash}");

        let mut attrs = Attributes::new();
        // Scalar arguments are reported back like provider outputs
        if let Some(args) = args.as_object() {
            for (key, value) in args {
                if !value.is_object() && !value.is_array() {
                    attrs.insert(key.clone(), value.clone());
                }
            }
        }

        attrs.insert("id".into(), json!(physical));
        attrs.insert("name".into(), json!(physical));
        attrs.insert(
            "arn".into(),
            json!(format!(
                "arn:aws:{service}:{REGION}:{ACCOUNT}:{type_name}/{physical}"
            )),
        );
        if service == "apigateway" || type_name == "restapi" {
            attrs.insert(
                "url".into(),
                json!(format!("https://{hash}.execute-api.{REGION}.amazonaws.com/stage/")),
            );
        }

        log::debug!("Simulated {kind} '{id}' as {physical}");
        Ok(attrs)
    }

    fn update(
        &self,
        kind: &ResourceKind,
        id: &str,
        args: &Value,
        _current: &Attributes,
    ) -> Result<Attributes> {
        self.create(kind, id, args)
    }

    fn delete(&self, kind: &ResourceKind, id: &str, _attributes: &Attributes) -> Result<()> {
        log::debug!("Simulated deletion of {kind} '{id}'");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_deterministic() {
        let engine = SimulateEngine::new();
        let kind = ResourceKind::new("aws:ec2/securityGroup:SecurityGroup");
        let a = engine.create(&kind, "lambdaSecurityGroup", &json!({})).unwrap();
        let b = engine.create(&kind, "lambdaSecurityGroup", &json!({})).unwrap();
        let c = engine.create(&kind, "rdsSecurityGroup", &json!({})).unwrap();

        assert_eq!(a["id"], b["id"]);
        assert_ne!(a["id"], c["id"]);
        assert!(a["id"].as_str().unwrap().starts_with("lambdaSecurityGroup-"));
    }

    #[test]
    fn test_arn_shape() {
        let engine = SimulateEngine::new();
        let attrs = engine
            .create(&ResourceKind::new("aws:iam/role:Role"), "role", &json!({}))
            .unwrap();
        let arn = attrs["arn"].as_str().unwrap();
        assert!(arn.starts_with("arn:aws:iam:us-east-1:000000000000:role/role-"));
        assert!(!attrs.contains_key("url"));
    }

    #[test]
    fn test_rest_api_gets_url() {
        let engine = SimulateEngine::new();
        let attrs = engine
            .create(
                &ResourceKind::new("aws-apigateway:index:RestAPI"),
                "api",
                &json!({}),
            )
            .unwrap();
        let url = attrs["url"].as_str().unwrap();
        assert!(url.starts_with("https://"));
        assert!(url.ends_with(".execute-api.us-east-1.amazonaws.com/stage/"));
    }

    #[test]
    fn test_scalar_args_echoed() {
        let engine = SimulateEngine::new();
        let attrs = engine
            .create(
                &ResourceKind::new("aws:rds/instance:Instance"),
                "dotnet-psql",
                &json!({"engine": "postgres", "allocatedStorage": 20, "tags": {"a": "b"}}),
            )
            .unwrap();
        assert_eq!(attrs["engine"], json!("postgres"));
        assert_eq!(attrs["allocatedStorage"], json!(20));
        assert!(!attrs.contains_key("tags"));
    }

    #[test]
    fn test_service_and_type() {
        assert_eq!(
            service_and_type(&ResourceKind::new("aws:lambda/function:Function")),
            ("lambda".to_string(), "function".to_string())
        );
        assert_eq!(
            service_and_type(&ResourceKind::new("bucket")),
            ("resource".to_string(), "resource".to_string())
        );
    }
}
