// src/zksync/transaction.rs
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};

// zkSync EIP-712 transaction type.
pub const EIP712_TX_TYPE: u8 = 0x71;

const DEFAULT_ZK_GAS: u64 = 16_777_216;

const EIP712_DOMAIN_TYPE: &str = "EIP712Domain(string name,string version,uint256 chainId)";
const EIP712_TRANSACTION_TYPE: &str = "Transaction(uint256 txType,uint256 from,uint256 to,uint256 gasLimit,uint256 gasPerPubdataByteLimit,uint256 maxFeePerGas,uint256 maxPriorityFeePerGas,uint256 paymaster,uint256 nonce,uint256 value,bytes data,bytes32[] factoryDeps,bytes paymasterInput)";

// Transaction as handed to the account by the bootloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub tx_type: u8,
    pub from: Address,
    pub to: Address,
    pub gas_limit: U256,
    pub gas_per_pubdata_byte_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    // Zero when the account pays its own fee.
    pub paymaster: Address,
    pub nonce: U256,
    pub value: U256,
    pub data: Bytes,
    pub signature: Bytes,
    pub factory_deps: Vec<H256>,
    pub paymaster_input: Bytes,
}

impl Transaction {
    pub fn eip712(from: Address, to: Address, value: U256, data: Bytes, nonce: U256) -> Self {
        Self {
            tx_type: EIP712_TX_TYPE,
            from,
            to,
            gas_limit: U256::from(DEFAULT_ZK_GAS),
            gas_per_pubdata_byte_limit: U256::from(DEFAULT_ZK_GAS),
            max_fee_per_gas: U256::from(DEFAULT_ZK_GAS),
            max_priority_fee_per_gas: U256::from(DEFAULT_ZK_GAS),
            paymaster: Address::zero(),
            nonce,
            value,
            data,
            signature: Bytes::default(),
            factory_deps: Vec::new(),
            paymaster_input: Bytes::default(),
        }
    }

    pub fn with_paymaster(mut self, paymaster: Address, input: Bytes) -> Self {
        self.paymaster = paymaster;
        self.paymaster_input = input;
        self
    }

    pub fn is_sponsored(&self) -> bool {
        !self.paymaster.is_zero()
    }

    // Fee owed to the bootloader: `maxFeePerGas * gasLimit`.
    pub fn fee(&self) -> Result<U256> {
        self.max_fee_per_gas
            .checked_mul(self.gas_limit)
            .ok_or(AccountError::Overflow("transaction fee"))
    }

    // Balance the account must hold before the transaction may proceed. A
    // paymaster covers the fee, leaving only the transferred value.
    pub fn total_required_balance(&self) -> Result<U256> {
        if self.is_sponsored() {
            return Ok(self.value);
        }
        self.fee()?
            .checked_add(self.value)
            .ok_or(AccountError::Overflow("required balance"))
    }

    // EIP-712 signing hash under the `zkSync` version `2` domain.
    pub fn encode_hash(&self, chain_id: u64) -> Result<H256> {
        if self.tx_type != EIP712_TX_TYPE {
            return Err(AccountError::UnsupportedTransactionType(self.tx_type));
        }

        let factory_deps: Vec<u8> = self
            .factory_deps
            .iter()
            .flat_map(|dep| dep.as_bytes().to_vec())
            .collect();

        let struct_hash = keccak256(encode(&[
            Token::FixedBytes(keccak256(EIP712_TRANSACTION_TYPE).to_vec()),
            Token::Uint(U256::from(self.tx_type)),
            Token::Address(self.from),
            Token::Address(self.to),
            Token::Uint(self.gas_limit),
            Token::Uint(self.gas_per_pubdata_byte_limit),
            Token::Uint(self.max_fee_per_gas),
            Token::Uint(self.max_priority_fee_per_gas),
            Token::Address(self.paymaster),
            Token::Uint(self.nonce),
            Token::Uint(self.value),
            Token::FixedBytes(keccak256(&self.data).to_vec()),
            Token::FixedBytes(keccak256(factory_deps).to_vec()),
            Token::FixedBytes(keccak256(&self.paymaster_input).to_vec()),
        ]));

        let domain_separator = keccak256(encode(&[
            Token::FixedBytes(keccak256(EIP712_DOMAIN_TYPE).to_vec()),
            Token::FixedBytes(keccak256("zkSync").to_vec()),
            Token::FixedBytes(keccak256("2").to_vec()),
            Token::Uint(U256::from(chain_id)),
        ]));

        let mut digest_input = Vec::with_capacity(66);
        digest_input.extend_from_slice(b"\x19\x01");
        digest_input.extend_from_slice(&domain_separator);
        digest_input.extend_from_slice(&struct_hash);
        Ok(H256(keccak256(digest_input)))
    }
}
