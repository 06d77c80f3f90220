//! Contract handles for the registry, the audit manager and audit contracts

mod audit;
pub mod bindings;
mod caller;
pub mod conformance;
mod manager;
mod registry;

pub use audit::AuditContract;
pub use caller::{ContractCaller, Submitted};
pub use conformance::{check_tables, ConformanceReport, Mismatch};
pub use manager::AuditManager;
pub use registry::RegistryLookup;
