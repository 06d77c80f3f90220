pub mod action;
pub mod command;
pub mod connection;

pub use action::{Action, NotifyLevel};
pub use command::{parse_address, parse_command, parse_upload_fields, Command};
pub use connection::{
    connect, ConnectOutcome, ConnectSettings, ConnectionContext, DEFAULT_REGISTRY_ADDRESS,
};
