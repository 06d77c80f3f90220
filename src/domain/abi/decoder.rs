//! ABI decoder trait and types

use super::FunctionSignature;

/// A decoded function argument
#[derive(Debug, Clone)]
pub struct DecodedArg {
    /// Parameter name (or "arg{n}" if unnamed)
    pub name: String,
    /// Solidity type (e.g., "address", "string[]", "(string,string,bool)[]")
    pub kind: String,
    /// Decoded value as a formatted string
    pub value: String,
}

/// Result of decoding a function call
#[derive(Debug, Clone)]
pub struct DecodedCall {
    /// Function name
    pub function_name: String,
    /// Full function signature (e.g., "bookForAudit(string)")
    pub signature: String,
    /// Decoded arguments
    pub arguments: Vec<DecodedArg>,
}

impl DecodedCall {
    /// One-line rendering for the activity log
    pub fn summary(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|arg| format!("{}={}", arg.name, arg.value))
            .collect();
        format!("{}({})", self.function_name, args.join(", "))
    }
}

/// Trait for ABI decoding implementations
///
/// Keeps the UI independent of alloy-dyn-abi.
pub trait AbiDecoder: Send + Sync {
    /// Decode calldata given a function signature
    ///
    /// `data` includes the 4-byte selector.
    fn decode_calldata(
        &self,
        function: &FunctionSignature,
        data: &[u8],
    ) -> anyhow::Result<DecodedCall>;

    /// Decode calldata by looking up the selector
    ///
    /// Returns `Ok(None)` when the selector is unknown.
    fn decode_by_selector(&self, data: &[u8]) -> anyhow::Result<Option<DecodedCall>>;
}
