//! The fixed remote endpoint reference.
//!
//! An `Endpoint` is the immutable (address, interface descriptor) pair
//! identifying the on-chain program the dispatcher talks to. The interface
//! descriptor is a fixed table of operations; `invoke` turns an operation
//! name into a ready-to-submit `CallRequest`.

use thiserror::Error;

use crate::types::{Address, Wei};

/// Endpoint error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Operation {0} does not accept value")]
    NotPayable(String),
}

/// One callable operation of the remote interface.
///
/// The selector is the leading four bytes of the hash of the operation's
/// signature, fixed at build time alongside the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub selector: [u8; 4],
    pub payable: bool,
}

/// A fixed interface descriptor: the operations the endpoint exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interface {
    pub operations: &'static [Operation],
}

impl Interface {
    /// Look up an operation by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&'static Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

/// An immutable reference to the deployed program instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub address: Address,
    pub interface: &'static Interface,
}

impl Endpoint {
    /// Create an endpoint reference.
    #[must_use]
    pub const fn new(address: Address, interface: &'static Interface) -> Self {
        Self { address, interface }
    }

    /// Build a value-free call to a named operation.
    ///
    /// # Errors
    /// Returns error if the interface does not expose the operation.
    pub fn invoke(&self, operation: &str) -> Result<CallRequest, EndpointError> {
        self.invoke_with_value(operation, Wei::ZERO)
    }

    /// Build a call to a named operation with transferred value attached.
    ///
    /// # Errors
    /// Returns error for an unknown operation, or when attaching value to
    /// an operation that does not accept it.
    pub fn invoke_with_value(
        &self,
        operation: &str,
        value: Wei,
    ) -> Result<CallRequest, EndpointError> {
        let op = self
            .interface
            .operation(operation)
            .ok_or_else(|| EndpointError::UnknownOperation(operation.to_string()))?;
        if !op.payable && !value.is_zero() {
            return Err(EndpointError::NotPayable(operation.to_string()));
        }
        Ok(CallRequest {
            from: None,
            to: self.address,
            data: op.selector.to_vec(),
            value,
            operation: op.name,
        })
    }
}

/// A transaction request against the endpoint, ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Sending account; bound by the dispatcher after account access.
    pub from: Option<Address>,
    /// Target contract.
    pub to: Address,
    /// Calldata (operation selector; the interface takes no arguments).
    pub data: Vec<u8>,
    /// Transferred value.
    pub value: Wei,
    /// Operation name, carried for logging.
    pub operation: &'static str,
}

impl CallRequest {
    /// Bind the sending account.
    #[must_use]
    pub fn from_account(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Calldata as a 0x-hex string for the wire.
    #[must_use]
    pub fn data_hex(&self) -> String {
        let mut s = String::with_capacity(2 + self.data.len() * 2);
        s.push_str("0x");
        for b in &self.data {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_INTERFACE: Interface = Interface {
        operations: &[
            Operation {
                name: "fund",
                selector: [0xb6, 0x0d, 0x42, 0x88],
                payable: true,
            },
            Operation {
                name: "withdraw",
                selector: [0x3c, 0xcf, 0xd6, 0x0b],
                payable: false,
            },
        ],
    };

    fn endpoint() -> Endpoint {
        Endpoint::new(Address::new([0x11; 20]), &TEST_INTERFACE)
    }

    #[test]
    fn invoke_builds_selector_calldata() {
        let call = endpoint().invoke("withdraw").unwrap();
        assert_eq!(call.data, vec![0x3c, 0xcf, 0xd6, 0x0b]);
        assert_eq!(call.data_hex(), "0x3ccfd60b");
        assert_eq!(call.value, Wei::ZERO);
        assert_eq!(call.to, endpoint().address);
    }

    #[test]
    fn invoke_with_value_respects_payability() {
        let call = endpoint().invoke_with_value("fund", Wei(7)).unwrap();
        assert_eq!(call.value, Wei(7));

        assert_eq!(
            endpoint().invoke_with_value("withdraw", Wei(7)),
            Err(EndpointError::NotPayable("withdraw".to_string()))
        );
        // Zero value on a non-payable operation is fine.
        assert!(endpoint().invoke_with_value("withdraw", Wei::ZERO).is_ok());
    }

    #[test]
    fn unknown_operation_is_rejected() {
        assert_eq!(
            endpoint().invoke("burn"),
            Err(EndpointError::UnknownOperation("burn".to_string()))
        );
    }

    #[test]
    fn from_account_binds_sender() {
        let sender = Address::new([0x22; 20]);
        let call = endpoint().invoke("withdraw").unwrap().from_account(sender);
        assert_eq!(call.from, Some(sender));
    }
}
