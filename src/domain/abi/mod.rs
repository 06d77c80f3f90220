//! ABI domain models and contracts
//!
//! This module defines the ABI tables, the selector registry built from
//! them, and the decoding trait, independent of alloy-dyn-abi.

mod decoder;
mod registry;
mod tables;

pub use decoder::{AbiDecoder, DecodedArg, DecodedCall};
pub use registry::{
    compute_selector, AbiRegistry, AbiSource, FunctionSignature, Mutability, ParamSpec,
};
pub use tables::AbiTable;
