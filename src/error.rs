// src/error.rs
use ethers::types::{Address, Bytes, H256, U256};
use thiserror::Error;

use crate::zksync::Phase;

pub type Result<T, E = AccountError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("caller {0:?} is not the entry point")]
    NotFromEntryPoint(Address),

    #[error("caller {0:?} is neither the entry point nor the owner")]
    NotFromEntryPointOrOwner(Address),

    #[error("caller {0:?} is not the bootloader")]
    NotFromBootloader(Address),

    #[error("caller {0:?} is neither the bootloader nor the owner")]
    NotFromBootloaderOrOwner(Address),

    #[error("destination call reverted: {0}")]
    CallFailed(Bytes),

    #[error("transaction execution reverted: {0}")]
    ExecutionFailed(Bytes),

    #[error("recovered signer does not match the account owner")]
    InvalidSignature,

    #[error("balance {available} is below the required {required}")]
    NotEnoughBalance { available: U256, required: U256 },

    #[error("failed to pay the bootloader")]
    FailedToPay,

    #[error("nonce mismatch for {sender:?}: expected {expected}, current {current}")]
    InvalidNonce {
        sender: Address,
        expected: U256,
        current: U256,
    },

    #[error("phase out of order: expected {expected:?}, found {found:?}")]
    PhaseOutOfOrder {
        expected: Option<Phase>,
        found: Option<Phase>,
    },

    #[error("transaction {0:?} is still in flight")]
    TransactionInFlight(H256),

    #[error("unsupported transaction type {0}")]
    UnsupportedTransactionType(u8),

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error("FailedOp({index}, {reason})")]
    FailedOp { index: usize, reason: String },

    #[error("unknown function selector in call data")]
    UnknownSelector,

    #[error("invalid chain id {0}")]
    InvalidChainId(u64),

    #[error("invalid address literal {0}")]
    InvalidAddress(String),

    #[error("no account key configured for chain {0}")]
    MissingAccountKey(u64),

    #[error("signing failed: {0}")]
    Signing(String),
}

impl AccountError {
    /// Caller-identity violations. These always abort the enclosing operation.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            AccountError::NotFromEntryPoint(_)
                | AccountError::NotFromEntryPointOrOwner(_)
                | AccountError::NotFromBootloader(_)
                | AccountError::NotFromBootloaderOrOwner(_)
        )
    }

    /// Raw revert payload of a failed destination call, when there is one.
    pub fn revert_data(&self) -> Option<&Bytes> {
        match self {
            AccountError::CallFailed(data) | AccountError::ExecutionFailed(data) => Some(data),
            _ => None,
        }
    }
}
