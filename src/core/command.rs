//! Command parser for the : command system

use alloy::primitives::{Address, U256};
use anyhow::{bail, Context, Result};

use crate::domain::audit::{AuditUri, UploadRequest};

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Wallet
    Connect,

    // Audit lists
    Mine,
    Public(Option<String>),
    Status(String),
    Auditor(Option<String>),
    Open(String),
    Refresh,

    // Audit actions
    Book(String),
    Submit {
        report_uri: String,
        declaration: String,
        seal_uri: String,
        manifest_uri: String,
    },
    Publish,
    Withdraw,
    Upload(String),
    Receipt(Option<String>),

    // Diagnostics
    Abi,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        "connect" | "conn" => Command::Connect,

        "mine" | "my" => Command::Mine,
        "public" | "pub" => Command::Public(args),
        "status" => match args {
            Some(status) => Command::Status(status),
            None => Command::Unknown(input.to_string()),
        },
        "auditor" => Command::Auditor(args),
        "open" | "audit" => match args {
            Some(address) => Command::Open(address),
            None => Command::Unknown(input.to_string()),
        },
        "refresh" | "r" => Command::Refresh,

        "book" => match args {
            Some(name) => Command::Book(name),
            None => Command::Unknown(input.to_string()),
        },
        "submit" => {
            let fields: Vec<String> = args
                .map(|s| s.split_whitespace().map(|s| s.to_string()).collect())
                .unwrap_or_default();
            match <[String; 4]>::try_from(fields) {
                Ok([report_uri, declaration, seal_uri, manifest_uri]) => Command::Submit {
                    report_uri,
                    declaration,
                    seal_uri,
                    manifest_uri,
                },
                Err(_) => Command::Unknown(input.to_string()),
            }
        }
        "publish" | "make-public" => Command::Publish,
        "withdraw" => Command::Withdraw,
        "upload" => match args {
            Some(fields) => Command::Upload(fields),
            None => Command::Unknown(input.to_string()),
        },

        "receipt" | "tx" => Command::Receipt(args),

        "abi" => Command::Abi,
        "quit" | "q" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}

/// Parse a 0x-prefixed address argument
pub fn parse_address(value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .with_context(|| format!("'{}' is not an address", value.trim()))
}

/// Parse `:upload owner|title|window|offset|uri,label,private;...|notes|manifest`
pub fn parse_upload_fields(input: &str) -> Result<UploadRequest> {
    let fields: Vec<&str> = input.split('|').map(str::trim).collect();
    let [owner_name, title, window, offset, uris, notes_uri, manifest_uri] = fields[..] else {
        bail!(
            "expected 7 '|'-separated fields (owner|title|window|offset|uris|notes|manifest), got {}",
            fields.len()
        );
    };

    let max_audit_window = window
        .parse::<U256>()
        .with_context(|| format!("invalid audit window '{window}'"))?;
    let carbon_offset = offset
        .parse::<U256>()
        .with_context(|| format!("invalid carbon offset '{offset}'"))?;

    let uris = uris
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_uri_entry)
        .collect::<Result<Vec<_>>>()?;

    let request = UploadRequest {
        owner_name: owner_name.to_string(),
        title: title.to_string(),
        max_audit_window,
        carbon_offset,
        uris,
        notes_uri: notes_uri.to_string(),
        manifest_uri: manifest_uri.to_string(),
    };
    request.validate()?;
    Ok(request)
}

/// `uri[,label[,private|public]]`, read from the right
///
/// Commas inside the URI survive only when the label and the privacy flag
/// are both given; anything else with extra commas is rejected.
fn parse_uri_entry(entry: &str) -> Result<AuditUri> {
    let (rest, is_private) = match entry.rsplit_once(',') {
        Some((rest, flag)) => match privacy_flag(flag.trim()) {
            Some(is_private) => (rest, Some(is_private)),
            None => (entry, None),
        },
        None => (entry, None),
    };

    let (uri, label) = match (rest.rsplit_once(','), is_private) {
        (None, _) => (rest, ""),
        (Some((uri, label)), Some(_)) => (uri, label),
        (Some((uri, label)), None) if !uri.contains(',') => (uri, label),
        (Some(_), None) => bail!(
            "URI entry '{entry}' is ambiguous: end it with ,<label>,private or ,<label>,public"
        ),
    };

    let uri = uri.trim();
    if uri.is_empty() {
        bail!("invalid URI entry '{entry}'");
    }
    Ok(AuditUri {
        uri: uri.to_string(),
        label: label.trim().to_string(),
        is_private: is_private.unwrap_or(false),
    })
}

fn privacy_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "private" | "true" | "yes" | "1" => Some(true),
        "public" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
