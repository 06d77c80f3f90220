//! ABI file scanner - loads override ABI files from configured directories

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use alloy_json_abi::JsonAbi;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::abi::{AbiRegistry, AbiSource};

const MAX_ABI_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// ABI file scanner
pub struct AbiScanner;

impl AbiScanner {
    /// Scan a single root (directory or file) for ABI files
    pub fn scan(root: impl AsRef<Path>) -> AbiRegistry {
        let started = Instant::now();
        let root = root.as_ref();
        let mut registry = AbiRegistry::new();
        let mut scanned_files = 0;
        let mut errors = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !Self::is_ignored_dir(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    errors.push(err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    errors.push(format!("{}: {}", path.display(), err));
                    continue;
                }
            };
            if metadata.len() > MAX_ABI_FILE_BYTES {
                debug!(path = %path.display(), "skipping oversized ABI file");
                continue;
            }

            scanned_files += 1;

            if let Err(err) = Self::load_abi_file(path, &mut registry) {
                errors.push(format!("{}: {}", path.display(), err));
            }
        }

        for err in &errors {
            warn!("ABI scan: {err}");
        }

        registry.scanned_files = scanned_files;
        registry.loaded_functions = registry.len();
        registry.errors = errors;
        registry.scan_ms = started.elapsed().as_millis();

        registry
    }

    /// Built-in tables first, then every configured root
    ///
    /// Built-ins win on selector collisions so an override cannot change
    /// how the deployed contracts are called.
    pub fn scan_roots(roots: &[PathBuf]) -> AbiRegistry {
        let started = Instant::now();
        let mut registry = AbiRegistry::builtin();

        for root in roots {
            registry.merge(Self::scan(root));
        }

        registry.loaded_functions = registry.len();
        registry.scan_ms = started.elapsed().as_millis();

        registry
    }

    /// Load a single ABI file
    fn load_abi_file(path: &Path, registry: &mut AbiRegistry) -> anyhow::Result<()> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        // Either a raw ABI array or a build artifact with an "abi" field
        let abi_value = if value.is_array() {
            value
        } else if let Some(abi) = value.get("abi") {
            abi.clone()
        } else {
            return Ok(());
        };

        let abi: JsonAbi = serde_json::from_value(abi_value)?;
        registry.insert_abi(&abi, AbiSource::File(path.to_path_buf()));
        Ok(())
    }

    /// Check if a path should be ignored
    fn is_ignored_dir(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| matches!(name, ".git" | "target" | "node_modules" | "cache"))
            .unwrap_or(false)
    }
}
