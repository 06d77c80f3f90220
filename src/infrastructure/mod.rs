//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based Ethereum provider implementations
//! - Wallet detection and account access
//! - Typed handles for the registry, audit manager and audit contracts
//! - ABI override scanning and decoding using alloy-dyn-abi
//! - Tokio runtime bridge for async operations

pub mod abi;
pub mod contracts;
pub mod ethereum;
pub mod runtime;
pub mod wallet;
