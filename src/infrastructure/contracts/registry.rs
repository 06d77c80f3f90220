//! Registry lookup - resolves well-known names to deployed addresses

use alloy::primitives::Address;
use anyhow::{bail, Result};

use super::bindings::ISERegistry;
use super::ContractCaller;

#[derive(Debug, Clone)]
pub struct RegistryLookup {
    caller: ContractCaller,
    address: Address,
}

impl RegistryLookup {
    pub fn new(caller: ContractCaller, address: Address) -> Self {
        Self { caller, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `getAddress(name)`, returning whatever the registry holds (possibly zero)
    pub async fn get_address(&self, name: &str) -> Result<Address> {
        self.caller
            .read(
                self.address,
                &ISERegistry::getAddressCall {
                    _name: name.to_string(),
                },
            )
            .await
    }

    /// Like `get_address` but treats an unregistered (zero) entry as an error
    pub async fn resolve(&self, name: &str) -> Result<Address> {
        let address = self.get_address(name).await?;
        if address == Address::ZERO {
            bail!("'{name}' is not registered at {}", self.address);
        }
        Ok(address)
    }
}
