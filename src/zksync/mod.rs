// src/zksync/mod.rs
//! Bootloader-driven account lifecycle.
mod account;
mod nonce;
mod transaction;

pub use account::{
    Phase, PostProcess, ZkMinimalAccount, ACCOUNT_VALIDATION_SUCCESS_MAGIC, BOOTLOADER_FORMAL_ADDRESS,
};
pub use nonce::{NonceHolder, NonceRegistry};
pub use transaction::{Transaction, EIP712_TX_TYPE};
