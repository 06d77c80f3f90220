//! Domain layer - ABI tables and audit data, free of transport concerns

pub mod abi;
pub mod audit;
