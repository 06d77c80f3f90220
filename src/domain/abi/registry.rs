//! ABI registry - stores contract function metadata by selector

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use alloy_json_abi::{Function, JsonAbi, StateMutability};
use alloy_primitives::keccak256;

use super::AbiTable;

/// A function parameter specification
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name (may be empty)
    pub name: String,
    /// Solidity type (e.g., "address", "uint256", "(string,string,bool)[]")
    pub kind: String,
}

/// Whether a function only reads chain state or needs a signed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl Mutability {
    pub fn is_read_only(self) -> bool {
        matches!(self, Mutability::Pure | Mutability::View)
    }
}

impl From<StateMutability> for Mutability {
    fn from(value: StateMutability) -> Self {
        match value {
            StateMutability::Pure => Mutability::Pure,
            StateMutability::View => Mutability::View,
            StateMutability::NonPayable => Mutability::NonPayable,
            StateMutability::Payable => Mutability::Payable,
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mutability::Pure => "pure",
            Mutability::View => "view",
            Mutability::NonPayable => "nonpayable",
            Mutability::Payable => "payable",
        };
        f.write_str(label)
    }
}

/// Where a function definition was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiSource {
    /// One of the ABI tables compiled into the binary
    Builtin(AbiTable),
    /// An override file found on disk
    File(PathBuf),
}

impl fmt::Display for AbiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiSource::Builtin(table) => write!(f, "builtin:{}", table.contract_name()),
            AbiSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A function signature with its metadata
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// 4-byte function selector
    pub selector: [u8; 4],
    /// Function name
    pub name: String,
    /// Full signature string (e.g., "getAddress(string)")
    pub signature: String,
    /// Input parameters
    pub inputs: Vec<ParamSpec>,
    /// Output parameters
    pub outputs: Vec<ParamSpec>,
    pub mutability: Mutability,
    /// Table or file this definition came from
    pub source: AbiSource,
}

impl FunctionSignature {
    /// Build the registry entry for a parsed ABI function
    pub fn from_json(function: &Function, source: AbiSource) -> Self {
        let signature = function.signature();
        let params = |params: &[alloy_json_abi::Param]| {
            params
                .iter()
                .map(|param| ParamSpec {
                    name: param.name.clone(),
                    kind: param.selector_type().into_owned(),
                })
                .collect::<Vec<_>>()
        };

        Self {
            selector: compute_selector(&signature),
            name: function.name.clone(),
            inputs: params(&function.inputs),
            outputs: params(&function.outputs),
            signature,
            mutability: function.state_mutability.into(),
            source,
        }
    }

    /// Get selector as hex string
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// Compute the 4-byte function selector from a canonical signature
pub fn compute_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Registry of function signatures indexed by selector
#[derive(Debug, Default, Clone)]
pub struct AbiRegistry {
    /// Functions indexed by 4-byte selector
    functions: HashMap<[u8; 4], FunctionSignature>,
    /// Number of override files scanned
    pub scanned_files: usize,
    /// Number of functions loaded
    pub loaded_functions: usize,
    /// Load errors
    pub errors: Vec<String>,
    /// Scan duration in milliseconds
    pub scan_ms: u128,
}

impl AbiRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the three compiled-in contract tables
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for table in AbiTable::ALL {
            match table.parse() {
                Ok(abi) => registry.insert_abi(&abi, AbiSource::Builtin(table)),
                Err(err) => registry
                    .errors
                    .push(format!("{}: {err:#}", table.contract_name())),
            }
        }
        registry.loaded_functions = registry.len();
        registry
    }

    /// Insert every function of a parsed ABI
    pub fn insert_abi(&mut self, abi: &JsonAbi, source: AbiSource) {
        for function in abi.functions() {
            self.insert(FunctionSignature::from_json(function, source.clone()));
        }
    }

    /// Insert a function signature
    ///
    /// Note: First function for a given selector wins (no overwrite)
    pub fn insert(&mut self, function: FunctionSignature) {
        self.functions.entry(function.selector).or_insert(function);
    }

    /// Look up a function by selector
    pub fn lookup(&self, selector: [u8; 4]) -> Option<&FunctionSignature> {
        self.functions.get(&selector)
    }

    /// Look up a function by selector hex string (e.g., "0xbf40fac1")
    pub fn lookup_hex(&self, selector_hex: &str) -> Option<&FunctionSignature> {
        let normalized = selector_hex
            .strip_prefix("0x")
            .or_else(|| selector_hex.strip_prefix("0X"))
            .unwrap_or(selector_hex);

        if normalized.len() != 8 {
            return None;
        }

        let bytes = hex::decode(normalized).ok()?;
        let selector: [u8; 4] = bytes.try_into().ok()?;
        self.lookup(selector)
    }

    /// Look up a function by name, optionally restricted to one table
    pub fn by_name(&self, name: &str, table: Option<AbiTable>) -> Option<&FunctionSignature> {
        self.functions.values().find(|function| {
            function.name == name
                && table
                    .map(|table| function.source == AbiSource::Builtin(table))
                    .unwrap_or(true)
        })
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Merge another registry into this one
    ///
    /// Functions from the other registry are only added if their
    /// selector is not already present (first wins).
    pub fn merge(&mut self, other: Self) {
        self.scanned_files = self.scanned_files.saturating_add(other.scanned_files);
        self.errors.extend(other.errors);
        for (selector, function) in other.functions {
            self.functions.entry(selector).or_insert(function);
        }
        self.loaded_functions = self.functions.len();
    }

    /// Get all functions
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.values()
    }
}
