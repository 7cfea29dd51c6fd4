//! The fixed FundMe endpoint: address and interface descriptor.
//!
//! Both halves of the endpoint reference are build-time constants; nothing
//! here is configurable at runtime.

use fundme_core::{Address, Endpoint, Interface, Operation};

/// Deployed contract address (`0x5FbDB2315678afecb367f032d93F642f64180aa3`).
pub const CONTRACT_ADDRESS: Address = Address::new([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64,
    0x2f, 0x64, 0x18, 0x0a, 0xa3,
]);

/// Name of the value-accepting funding operation.
pub const OP_FUND: &str = "fund";

/// Name of the no-argument withdraw operation.
pub const OP_WITHDRAW: &str = "withdraw";

/// Interface descriptor: a payable `fund()` and an owner-only `withdraw()`.
///
/// Selectors are the leading four bytes of each signature hash.
pub static INTERFACE: Interface = Interface {
    operations: &[
        Operation {
            name: OP_FUND,
            selector: [0xb6, 0x0d, 0x42, 0x88],
            payable: true,
        },
        Operation {
            name: OP_WITHDRAW,
            selector: [0x3c, 0xcf, 0xd6, 0x0b],
            payable: false,
        },
    ],
};

/// The endpoint every action is dispatched against.
#[must_use]
pub fn endpoint() -> Endpoint {
    Endpoint::new(CONTRACT_ADDRESS, &INTERFACE)
}
