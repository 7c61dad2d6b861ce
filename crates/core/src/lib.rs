//! fuzzplug Core - Plugin roles, calling contracts and shared types.

pub mod contract;
mod error;
pub mod fs;
mod role;
mod signature;
mod unit;

pub use contract::{FixedParam, Mismatch, Qualifiers, RoleContract, SHARED_PACKAGE, validate};
pub use error::{ParseFailure, PlugError, Result};
pub use role::Role;
pub use signature::{
    FUNC_MARKER, Parameter, ParsedType, Signature, VOID, actual_list, formal_list,
};
pub use unit::{ImportSpec, PluginUnit};
