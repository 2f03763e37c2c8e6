//! ABI methods: signatures, selectors and the JSON description.
//!
//! A method signature reads `name(arg1,arg2,...)returns`. Arguments are
//! value types, transaction types (the caller supplies a whole transaction
//! placed just before the application call) or reference types (an entry
//! in one of the call's foreign arrays).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::types::{parse_tuple_content, AbiType};
use crate::crypto::hash::sha512_256;
use crate::error::{Error, Result};
use crate::transaction::TransactionType;

/// Serde adapter for types that read and write themselves as text.
mod as_text {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Argument and return types
// ---------------------------------------------------------------------------

/// A transaction the caller must place before the application call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiTransactionType {
    /// `txn`: any kind.
    Any,
    Pay,
    Keyreg,
    Acfg,
    Axfer,
    Afrz,
    Appl,
}

impl AbiTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiTransactionType::Any => "txn",
            AbiTransactionType::Pay => "pay",
            AbiTransactionType::Keyreg => "keyreg",
            AbiTransactionType::Acfg => "acfg",
            AbiTransactionType::Axfer => "axfer",
            AbiTransactionType::Afrz => "afrz",
            AbiTransactionType::Appl => "appl",
        }
    }

    /// Whether a transaction of kind `tx_type` satisfies this argument.
    pub fn accepts(&self, tx_type: TransactionType) -> bool {
        *self == AbiTransactionType::Any || self.as_str() == tx_type.as_str()
    }

    fn parse(text: &str) -> Option<Self> {
        Some(match text {
            "txn" => AbiTransactionType::Any,
            "pay" => AbiTransactionType::Pay,
            "keyreg" => AbiTransactionType::Keyreg,
            "acfg" => AbiTransactionType::Acfg,
            "axfer" => AbiTransactionType::Axfer,
            "afrz" => AbiTransactionType::Afrz,
            "appl" => AbiTransactionType::Appl,
            _ => return None,
        })
    }
}

/// An argument passed as an index into one of the call's foreign arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiReferenceType {
    Account,
    Application,
    Asset,
}

impl AbiReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiReferenceType::Account => "account",
            AbiReferenceType::Application => "application",
            AbiReferenceType::Asset => "asset",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        Some(match text {
            "account" => AbiReferenceType::Account,
            "application" => AbiReferenceType::Application,
            "asset" => AbiReferenceType::Asset,
            _ => return None,
        })
    }
}

/// The declared type of a method argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiArgumentType {
    Value(AbiType),
    Transaction(AbiTransactionType),
    Reference(AbiReferenceType),
}

impl fmt::Display for AbiArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiArgumentType::Value(t) => write!(f, "{}", t),
            AbiArgumentType::Transaction(t) => f.write_str(t.as_str()),
            AbiArgumentType::Reference(r) => f.write_str(r.as_str()),
        }
    }
}

impl FromStr for AbiArgumentType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        if let Some(t) = AbiTransactionType::parse(text) {
            return Ok(AbiArgumentType::Transaction(t));
        }
        if let Some(r) = AbiReferenceType::parse(text) {
            return Ok(AbiArgumentType::Reference(r));
        }
        Ok(AbiArgumentType::Value(text.parse()?))
    }
}

/// A method's return type: `void` or a value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AbiReturnType {
    #[default]
    Void,
    Value(AbiType),
}

impl fmt::Display for AbiReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiReturnType::Void => f.write_str("void"),
            AbiReturnType::Value(t) => write!(f, "{}", t),
        }
    }
}

impl FromStr for AbiReturnType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            "void" => Ok(AbiReturnType::Void),
            other => Ok(AbiReturnType::Value(other.parse()?)),
        }
    }
}

// ---------------------------------------------------------------------------
// AbiMethod
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiArgument {
    #[serde(rename = "type", with = "as_text")]
    pub arg_type: AbiArgumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbiReturn {
    #[serde(rename = "type", with = "as_text")]
    pub return_type: AbiReturnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// A contract method as described in ABI JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiMethod {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub args: Vec<AbiArgument>,
    #[serde(default)]
    pub returns: AbiReturn,
}

/// Index of the `)` closing the `(` at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

impl AbiMethod {
    /// Parse `name(arg,...)returns`, validating every type.
    ///
    /// # Example
    ///
    /// ```
    /// use algotx_protocol::abi::AbiMethod;
    ///
    /// let method = AbiMethod::from_signature("add(uint64,uint64)uint64").unwrap();
    /// assert_eq!(hex::encode(method.selector()), "fe6bdf69");
    /// ```
    pub fn from_signature(signature: &str) -> Result<Self> {
        let invalid = || Error::MalformedInput(format!("invalid method signature: {}", signature));
        let open = signature.find('(').ok_or_else(invalid)?;
        let close = matching_paren(signature, open).ok_or_else(invalid)?;
        let name = &signature[..open];
        if name.is_empty() {
            return Err(invalid());
        }

        let args = parse_tuple_content(&signature[open + 1..close])?
            .iter()
            .map(|a| {
                Ok(AbiArgument {
                    arg_type: a.parse()?,
                    name: None,
                    desc: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let returns = AbiReturn {
            return_type: signature[close + 1..].parse()?,
            desc: None,
        };

        Ok(Self {
            name: name.to_string(),
            desc: None,
            args,
            returns,
        })
    }

    /// The canonical signature string.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|a| a.arg_type.to_string()).collect();
        format!("{}({}){}", self.name, args.join(","), self.returns.return_type)
    }

    /// First four bytes of the hash of [`Self::signature`].
    pub fn selector(&self) -> [u8; 4] {
        let hash = sha512_256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Transactions a call occupies: the application call itself plus one
    /// for every transaction argument.
    pub fn txn_count(&self) -> usize {
        1 + self
            .args
            .iter()
            .filter(|a| matches!(a.arg_type, AbiArgumentType::Transaction(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selector() {
        let m = AbiMethod::from_signature("add(uint64,uint64)uint64").unwrap();
        assert_eq!(m.name, "add");
        assert_eq!(m.selector(), [0xfe, 0x6b, 0xdf, 0x69]);
        assert_eq!(m.signature(), "add(uint64,uint64)uint64");
        assert_eq!(m.txn_count(), 1);
    }

    #[test]
    fn test_nested_tuples_and_transactions() {
        let sig = "swap(pay,axfer,(uint64,(bool,address)),asset,uint8[])(uint64,bool)";
        let m = AbiMethod::from_signature(sig).unwrap();
        assert_eq!(m.args.len(), 5);
        assert_eq!(m.txn_count(), 3);
        assert_eq!(
            m.args[3].arg_type,
            AbiArgumentType::Reference(AbiReferenceType::Asset)
        );
        assert_eq!(
            m.returns.return_type,
            AbiReturnType::Value("(uint64,bool)".parse().unwrap())
        );
        assert_eq!(m.signature(), sig);
    }

    #[test]
    fn test_void_and_empty() {
        let m = AbiMethod::from_signature("optin()void").unwrap();
        assert!(m.args.is_empty());
        assert_eq!(m.returns.return_type, AbiReturnType::Void);
        assert_eq!(m.txn_count(), 1);
    }

    #[test]
    fn test_txn_counts_as_transaction() {
        let m = AbiMethod::from_signature("f(txn,appl,account)void").unwrap();
        assert_eq!(m.txn_count(), 3);
    }

    #[test]
    fn test_invalid_signatures() {
        for sig in [
            "noparens",
            "(uint64)void",
            "f(uint64",
            "f(uint63)void",
            "f(uint64)",
            "f(uint64,,bool)void",
            "f(uint64)pay",
        ] {
            assert!(AbiMethod::from_signature(sig).is_err(), "{} should fail", sig);
        }
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "name": "add",
            "desc": "Add two numbers",
            "args": [{"type": "uint64", "name": "a"}, {"type": "uint64", "name": "b"}],
            "returns": {"type": "uint64"}
        }"#;
        let m: AbiMethod = serde_json::from_str(json).unwrap();
        assert_eq!(m.signature(), "add(uint64,uint64)uint64");
        assert_eq!(m.args[0].name.as_deref(), Some("a"));

        let out = serde_json::to_value(&m).unwrap();
        assert_eq!(out["returns"]["type"], "uint64");
        assert!(out["args"][0].get("desc").is_none());
    }

    #[test]
    fn test_transaction_type_acceptance() {
        assert!(AbiTransactionType::Any.accepts(TransactionType::AssetFreeze));
        assert!(AbiTransactionType::Pay.accepts(TransactionType::Payment));
        assert!(!AbiTransactionType::Pay.accepts(TransactionType::ApplicationCall));
    }
}
