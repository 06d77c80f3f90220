//! Checks that the ABI tables and the typed bindings describe the same methods

use alloy::primitives::{Address, U256};
use alloy_dyn_abi::DynSolType;

use super::bindings::{audit_contract_methods, audit_manager_methods, registry_methods};
use crate::domain::abi::{compute_selector, AbiTable, FunctionSignature, Mutability};
use crate::domain::audit::{AuditConstructorArgs, AuditSeed, AuditUri};

/// One disagreement between a table and the bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub table: AbiTable,
    pub method: String,
    pub reason: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.table.contract_name(), self.method, self.reason)
    }
}

/// Result of comparing every table against its bindings
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub checked_methods: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ConformanceReport {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn mismatch(&mut self, table: AbiTable, method: &str, reason: impl Into<String>) {
        self.mismatches.push(Mismatch {
            table,
            method: method.to_string(),
            reason: reason.into(),
        });
    }
}

fn binding_methods(table: AbiTable) -> Vec<(&'static str, [u8; 4], bool)> {
    match table {
        AbiTable::AuditContract => audit_contract_methods(),
        AbiTable::AuditManager => audit_manager_methods(),
        AbiTable::Registry => registry_methods(),
    }
}

/// Compare all three tables with the bindings
pub fn check_tables() -> ConformanceReport {
    let mut report = ConformanceReport::default();

    for table in AbiTable::ALL {
        let abi = match table.parse() {
            Ok(abi) => abi,
            Err(err) => {
                report.mismatch(table, "*", format!("{err:#}"));
                continue;
            }
        };

        let bindings = binding_methods(table);
        let functions: Vec<FunctionSignature> = abi
            .functions()
            .map(|function| {
                FunctionSignature::from_json(
                    function,
                    crate::domain::abi::AbiSource::Builtin(table),
                )
            })
            .collect();

        for function in &functions {
            report.checked_methods += 1;
            let Some((signature, selector, read_only)) = bindings
                .iter()
                .find(|(signature, _, _)| *signature == function.signature)
            else {
                report.mismatch(table, &function.name, "no typed binding for this signature");
                continue;
            };

            if compute_selector(signature) != *selector || function.selector != *selector {
                report.mismatch(
                    table,
                    &function.name,
                    format!(
                        "selector {} does not match binding 0x{}",
                        function.selector_hex(),
                        hex::encode(selector)
                    ),
                );
            }
            if function.mutability.is_read_only() != *read_only {
                report.mismatch(
                    table,
                    &function.name,
                    format!("table says {}, binding disagrees", function.mutability),
                );
            }
            if function.mutability == Mutability::Payable {
                report.mismatch(table, &function.name, "payable methods are not supported");
            }
        }

        for (signature, _, _) in &bindings {
            if !functions.iter().any(|f| f.signature == *signature) {
                report.mismatch(table, signature, "binding has no table entry");
            }
        }

        if table == AbiTable::AuditContract {
            check_constructor(&abi, &mut report);
        }
    }

    report
}

/// The table's constructor must accept what `AuditConstructorArgs` encodes
fn check_constructor(abi: &alloy_json_abi::JsonAbi, report: &mut ConformanceReport) {
    let table = AbiTable::AuditContract;
    let Some(constructor) = abi.constructor.as_ref() else {
        report.mismatch(table, "constructor", "missing from table");
        return;
    };

    let types: Result<Vec<DynSolType>, _> = constructor
        .inputs
        .iter()
        .map(|param| param.selector_type().parse::<DynSolType>())
        .collect();
    let types = match types {
        Ok(types) => types,
        Err(err) => {
            report.mismatch(table, "constructor", format!("bad parameter type: {err}"));
            return;
        }
    };

    let encoded = sample_constructor_args().abi_encode();
    if let Err(err) = DynSolType::Tuple(types).abi_decode_params(&encoded) {
        report.mismatch(
            table,
            "constructor",
            format!("encoded arguments do not decode: {err}"),
        );
    }
    report.checked_methods += 1;
}

fn sample_constructor_args() -> AuditConstructorArgs {
    AuditConstructorArgs {
        seed: AuditSeed {
            owner_name: "owner".to_string(),
            owner: Address::repeat_byte(0x01),
            title: "title".to_string(),
            upload_date: U256::from(1u64),
            max_audit_window: U256::from(2u64),
            audit_start: U256::ZERO,
            audit_date: U256::ZERO,
            publish_date: U256::ZERO,
            expires: U256::from(3u64),
            auditor: Address::ZERO,
            auditor_name: String::new(),
            carbon_offset: U256::from(4u64),
        },
        uris: vec![AuditUri {
            uri: "ipfs://sample".to_string(),
            label: "sample".to_string(),
            is_private: true,
        }],
        notes_uri: "ipfs://notes".to_string(),
        registry: Address::repeat_byte(0x02),
        upload_proof: None,
    }
}
