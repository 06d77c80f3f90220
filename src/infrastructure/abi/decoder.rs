//! Calldata decoding for the activity log, backed by alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use anyhow::{bail, Context, Result};

use crate::domain::abi::{AbiDecoder, AbiRegistry, DecodedArg, DecodedCall, FunctionSignature};

const MAX_STRING: usize = 48;
const MAX_ITEMS: usize = 4;

/// Decodes calls against the built-in tables plus any loaded overrides
pub struct AlloyAbiDecoder {
    registry: AbiRegistry,
}

impl AlloyAbiDecoder {
    pub fn new(registry: AbiRegistry) -> Self {
        Self { registry }
    }
}

impl AbiDecoder for AlloyAbiDecoder {
    fn decode_calldata(&self, function: &FunctionSignature, data: &[u8]) -> Result<DecodedCall> {
        let Some((selector, body)) = data.split_first_chunk::<4>() else {
            bail!("calldata shorter than a selector ({} bytes)", data.len());
        };
        if *selector != function.selector {
            bail!(
                "selector mismatch: calldata has 0x{}, {} is 0x{}",
                hex::encode(selector),
                function.signature,
                hex::encode(function.selector)
            );
        }

        let params = function
            .inputs
            .iter()
            .map(|param| {
                param
                    .kind
                    .parse::<DynSolType>()
                    .with_context(|| format!("{}: bad type '{}'", function.name, param.kind))
            })
            .collect::<Result<Vec<_>>>()?;

        let values = match DynSolType::Tuple(params)
            .abi_decode_params(body)
            .with_context(|| format!("decoding {} arguments", function.name))?
        {
            DynSolValue::Tuple(values) => values,
            single => vec![single],
        };

        let arguments = function
            .inputs
            .iter()
            .zip(&values)
            .enumerate()
            .map(|(idx, (param, value))| DecodedArg {
                name: match param.name.trim() {
                    "" => format!("arg{idx}"),
                    name => name.to_string(),
                },
                kind: param.kind.clone(),
                value: render(value),
            })
            .collect();

        Ok(DecodedCall {
            function_name: function.name.clone(),
            signature: function.signature.clone(),
            arguments,
        })
    }

    fn decode_by_selector(&self, data: &[u8]) -> Result<Option<DecodedCall>> {
        let Some(selector) = data.first_chunk::<4>() else {
            return Ok(None);
        };
        self.registry
            .lookup(*selector)
            .map(|function| self.decode_calldata(function, data))
            .transpose()
    }
}

/// One-line rendering: short strings quoted, long lists elided
fn render(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(flag) => flag.to_string(),
        DynSolValue::Int(int, _) => int.to_string(),
        // Windows, offsets and timestamps are all small decimals
        DynSolValue::Uint(uint, _) => uint.to_string(),
        DynSolValue::Address(address) => address.to_string(),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::Function(function) => format!("0x{}", hex::encode(function)),
        DynSolValue::Bytes(bytes) if bytes.len() > 32 => {
            format!("0x{}… ({} bytes)", hex::encode(&bytes[..32]), bytes.len())
        }
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(text) if text.chars().count() > MAX_STRING => {
            let head: String = text.chars().take(MAX_STRING).collect();
            format!("\"{head}…\"")
        }
        DynSolValue::String(text) => format!("{text:?}"),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let mut shown: Vec<String> = items.iter().take(MAX_ITEMS).map(render).collect();
            if items.len() > MAX_ITEMS {
                shown.push(format!("+{} more", items.len() - MAX_ITEMS));
            }
            format!("[{}]", shown.join(", "))
        }
        DynSolValue::Tuple(fields) => {
            format!("({})", fields.iter().map(render).collect::<Vec<_>>().join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    use crate::domain::abi::AbiTable;
    use crate::infrastructure::contracts::bindings::{ISEAuditContract, ISEAuditManager};

    fn decoder() -> AlloyAbiDecoder {
        AlloyAbiDecoder::new(AbiRegistry::builtin())
    }

    #[test]
    fn test_decode_book_for_audit() {
        let calldata = ISEAuditContract::bookForAuditCall {
            _auditorName: "Verra Auditing".to_string(),
        }
        .abi_encode();

        let decoded = decoder().decode_by_selector(&calldata).unwrap().unwrap();
        assert_eq!(decoded.function_name, "bookForAudit");
        assert_eq!(decoded.arguments.len(), 1);
        assert_eq!(decoded.arguments[0].name, "_auditorName");
        assert_eq!(decoded.arguments[0].value, "\"Verra Auditing\"");
        assert_eq!(decoded.summary(), "bookForAudit(_auditorName=\"Verra Auditing\")");
    }

    #[test]
    fn test_decode_upload_files_arrays() {
        let calldata = ISEAuditManager::uploadFilesCall {
            _ownerName: "Acme".to_string(),
            _auditTitle: "Q3".to_string(),
            _maxAuditWindow: alloy_primitives::U256::from(60u64),
            _carbonOffset: alloy_primitives::U256::from(5u64),
            _urisToAudit: vec!["ipfs://a".to_string()],
            _uriLabels: vec!["ledger".to_string()],
            _private: vec![true],
            _notesUri: "ipfs://n".to_string(),
            _uploadManifestUri: "ipfs://m".to_string(),
        }
        .abi_encode();

        let decoded = decoder().decode_by_selector(&calldata).unwrap().unwrap();
        assert_eq!(decoded.arguments.len(), 9);
        assert_eq!(decoded.arguments[2].value, "60");
        assert_eq!(decoded.arguments[6].value, "[true]");
    }

    #[test]
    fn test_selector_mismatch() {
        let registry = AbiRegistry::builtin();
        let function = registry
            .by_name("withdraw", Some(AbiTable::AuditContract))
            .unwrap()
            .clone();

        let result = decoder().decode_calldata(&function, &hex::decode("deadbeef").unwrap());
        assert!(result.unwrap_err().to_string().contains("selector mismatch"));
    }

    #[test]
    fn test_render_elides_long_values() {
        let uris = DynSolValue::Array(
            (0..6)
                .map(|i| DynSolValue::String(format!("ipfs://{i}")))
                .collect(),
        );
        assert_eq!(
            render(&uris),
            "[\"ipfs://0\", \"ipfs://1\", \"ipfs://2\", \"ipfs://3\", +2 more]"
        );

        let long = DynSolValue::String("x".repeat(60));
        assert_eq!(render(&long), format!("\"{}…\"", "x".repeat(48)));
    }

    #[test]
    fn test_unknown_selector_and_short_data() {
        assert!(decoder().decode_by_selector(&[0xde, 0xad, 0xbe, 0xef]).unwrap().is_none());
        assert!(decoder().decode_by_selector(&[0x01]).unwrap().is_none());
    }
}
