//! # ABI
//!
//! Descriptions of application methods: the type grammar, method
//! signatures and their 4-byte selectors, and contract/interface JSON.
//! Nothing here encodes argument values; it only names and checks types.

pub mod contract;
pub mod method;
pub mod types;

pub use contract::{AbiContract, AbiContractNetworkInfo, AbiInterface};
pub use method::{
    AbiArgument, AbiArgumentType, AbiMethod, AbiReferenceType, AbiReturn, AbiReturnType,
    AbiTransactionType,
};
pub use types::{parse_tuple_content, AbiType};
