// src/types.rs
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

// Verification gas, call gas and pre-verification gas used for every operation
// the signer builds.
pub const DEFAULT_GAS_LIMIT: u128 = 16_777_216;
// Priority fee and max fee per gas used for every operation the signer builds.
pub const DEFAULT_FEE_PER_GAS: u128 = 256;

// EntryPoint v0.7 user operation with packed gas and fee words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedUserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    // `verificationGasLimit << 128 | callGasLimit`
    pub account_gas_limits: H256,
    pub pre_verification_gas: U256,
    // `maxPriorityFeePerGas << 128 | maxFeePerGas`
    pub gas_fees: H256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl PackedUserOperation {
    // Builds an unsigned operation for an already deployed account using the
    // default gas and fee policy.
    pub fn unsigned(sender: Address, nonce: U256, call_data: Bytes) -> Self {
        Self {
            sender,
            nonce,
            init_code: Bytes::default(),
            call_data,
            account_gas_limits: pack_u128_pair(DEFAULT_GAS_LIMIT, DEFAULT_GAS_LIMIT),
            pre_verification_gas: U256::from(DEFAULT_GAS_LIMIT),
            gas_fees: pack_u128_pair(DEFAULT_FEE_PER_GAS, DEFAULT_FEE_PER_GAS),
            paymaster_and_data: Bytes::default(),
            signature: Bytes::default(),
        }
    }

    pub fn with_gas_limits(mut self, verification_gas_limit: u128, call_gas_limit: u128) -> Self {
        self.account_gas_limits = pack_u128_pair(verification_gas_limit, call_gas_limit);
        self
    }

    pub fn with_gas_fees(mut self, max_priority_fee_per_gas: u128, max_fee_per_gas: u128) -> Self {
        self.gas_fees = pack_u128_pair(max_priority_fee_per_gas, max_fee_per_gas);
        self
    }

    pub fn with_signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    pub fn verification_gas_limit(&self) -> u128 {
        unpack_u128_pair(self.account_gas_limits).0
    }

    pub fn call_gas_limit(&self) -> u128 {
        unpack_u128_pair(self.account_gas_limits).1
    }

    pub fn max_priority_fee_per_gas(&self) -> u128 {
        unpack_u128_pair(self.gas_fees).0
    }

    pub fn max_fee_per_gas(&self) -> u128 {
        unpack_u128_pair(self.gas_fees).1
    }

    // Upper bound the entry point asks the account to hold for this operation.
    pub fn required_prefund(&self) -> Option<U256> {
        let total_gas = U256::from(self.verification_gas_limit())
            .checked_add(U256::from(self.call_gas_limit()))?
            .checked_add(self.pre_verification_gas)?;
        total_gas.checked_mul(U256::from(self.max_fee_per_gas()))
    }
}

// Places `high` in the upper 16 bytes and `low` in the lower 16 bytes of a word.
pub fn pack_u128_pair(high: u128, low: u128) -> H256 {
    let mut word = [0u8; 32];
    word[..16].copy_from_slice(&high.to_be_bytes());
    word[16..].copy_from_slice(&low.to_be_bytes());
    H256(word)
}

pub fn unpack_u128_pair(word: H256) -> (u128, u128) {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&word.0[..16]);
    low.copy_from_slice(&word.0[16..]);
    (u128::from_be_bytes(high), u128::from_be_bytes(low))
}

// Numeric validation outcome returned to the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationData(pub U256);

impl ValidationData {
    pub const SUCCESS: Self = Self(U256([0, 0, 0, 0]));
    pub const SIG_VALIDATION_FAILED: Self = Self(U256([1, 0, 0, 0]));

    pub fn is_accepted(&self) -> bool {
        self.0.is_zero()
    }
}
