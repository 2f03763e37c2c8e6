//! Contract and interface descriptions.
//!
//! A contract is a named set of methods plus the application id it is
//! deployed under on each network (keyed by genesis hash). An interface is
//! the same minus deployments: a set of methods several contracts share.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::method::AbiMethod;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiContractNetworkInfo {
    #[serde(rename = "appID")]
    pub app_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiContract {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Deployments, keyed by base64 genesis hash.
    #[serde(default)]
    pub networks: BTreeMap<String, AbiContractNetworkInfo>,
    pub methods: Vec<AbiMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiInterface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub methods: Vec<AbiMethod>,
}

/// The single method called `name`. Overloads and absence are errors.
fn method_by_name<'a>(methods: &'a [AbiMethod], name: &str) -> Result<&'a AbiMethod> {
    let found: Vec<&AbiMethod> = methods.iter().filter(|m| m.name == name).collect();
    match found.as_slice() {
        [one] => Ok(one),
        [] => Err(Error::Reference(format!("found no methods with the name {}", name))),
        many => {
            let signatures: Vec<String> = many.iter().map(|m| m.signature()).collect();
            Err(Error::Reference(format!(
                "found {} methods with the same name {}",
                many.len(),
                signatures.join(",")
            )))
        }
    }
}

fn from_json<T: for<'de> Deserialize<'de>>(what: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| Error::Encoding(format!("invalid ABI {}: {}", what, e)))
}

impl AbiContract {
    pub fn from_json(json: &str) -> Result<Self> {
        from_json("contract", json)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Encoding(e.to_string()))
    }

    pub fn get_method_by_name(&self, name: &str) -> Result<&AbiMethod> {
        method_by_name(&self.methods, name)
    }

    /// Application id on the network with genesis hash `genesis_hash`.
    pub fn app_id(&self, genesis_hash: &str) -> Option<u64> {
        self.networks.get(genesis_hash).map(|n| n.app_id)
    }
}

impl AbiInterface {
    pub fn from_json(json: &str) -> Result<Self> {
        from_json("interface", json)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Encoding(e.to_string()))
    }

    pub fn get_method_by_name(&self, name: &str) -> Result<&AbiMethod> {
        method_by_name(&self.methods, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = r#"{
        "name": "Calculator",
        "desc": "Integer arithmetic",
        "networks": {
            "wGHE2Pwdvd7S12BL5FaOP20EGYesN73ktiC1qzkkit8=": {"appID": 1234}
        },
        "methods": [
            {"name": "add", "args": [{"type": "uint64"}, {"type": "uint64"}], "returns": {"type": "uint64"}},
            {"name": "mul", "args": [{"type": "uint64"}, {"type": "uint64"}], "returns": {"type": "uint64"}},
            {"name": "mul", "args": [{"type": "uint32"}, {"type": "uint32"}], "returns": {"type": "uint32"}}
        ]
    }"#;

    #[test]
    fn test_parse_contract() {
        let c = AbiContract::from_json(CONTRACT).unwrap();
        assert_eq!(c.name, "Calculator");
        assert_eq!(c.app_id("wGHE2Pwdvd7S12BL5FaOP20EGYesN73ktiC1qzkkit8="), Some(1234));
        assert_eq!(c.methods.len(), 3);

        let again = AbiContract::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(again, c);
    }

    #[test]
    fn test_method_lookup() {
        let c = AbiContract::from_json(CONTRACT).unwrap();
        assert_eq!(
            c.get_method_by_name("add").unwrap().signature(),
            "add(uint64,uint64)uint64"
        );
        assert!(matches!(c.get_method_by_name("mul"), Err(Error::Reference(_))));
        assert!(matches!(c.get_method_by_name("div"), Err(Error::Reference(_))));
    }

    #[test]
    fn test_interface() {
        let i = AbiInterface::from_json(
            r#"{"name": "ARC22", "methods": [{"name": "ping", "args": [], "returns": {"type": "void"}}]}"#,
        )
        .unwrap();
        assert!(i.desc.is_none());
        assert_eq!(i.get_method_by_name("ping").unwrap().txn_count(), 1);
    }

    #[test]
    fn test_rejects_bad_types_in_json() {
        let bad = r#"{"name": "x", "methods": [{"name": "f", "args": [{"type": "uint3"}]}]}"#;
        assert!(matches!(AbiContract::from_json(bad), Err(Error::Encoding(_))));
    }
}
