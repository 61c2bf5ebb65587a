//! Single-owner smart account for ERC-4337 entry points and the zkSync
//! bootloader, with the off-chain tooling that signs its operations.
pub mod account;
pub mod calls;
pub mod config;
pub mod entry_point;
pub mod error;
pub mod hashing;
pub mod ledger;
pub mod rpc;
pub mod signature;
pub mod signer;
pub mod token;
pub mod types;
pub mod zksync;

pub use account::MinimalAccount;
pub use entry_point::EntryPoint;
pub use error::{AccountError, Result};
pub use ledger::Ledger;
pub use signer::OperationSigner;
pub use types::{PackedUserOperation, ValidationData};
pub use zksync::ZkMinimalAccount;
