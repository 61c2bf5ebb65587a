// src/hashing.rs
use ethers::abi::{encode, Token};
use ethers::types::{Address, H256, U256};
use ethers::utils::{hash_message, keccak256};

use crate::types::PackedUserOperation;

/// EntryPoint v0.7 `getUserOpHash`. The signature field is not covered.
pub fn user_op_hash(user_op: &PackedUserOperation, entry_point: Address, chain_id: u64) -> H256 {
    let packed = encode(&[
        Token::Address(user_op.sender),
        Token::Uint(user_op.nonce),
        Token::FixedBytes(keccak256(&user_op.init_code).to_vec()),
        Token::FixedBytes(keccak256(&user_op.call_data).to_vec()),
        Token::FixedBytes(user_op.account_gas_limits.as_bytes().to_vec()),
        Token::Uint(user_op.pre_verification_gas),
        Token::FixedBytes(user_op.gas_fees.as_bytes().to_vec()),
        Token::FixedBytes(keccak256(&user_op.paymaster_and_data).to_vec()),
    ]);
    let inner = keccak256(packed);

    let outer = encode(&[
        Token::FixedBytes(inner.to_vec()),
        Token::Address(entry_point),
        Token::Uint(U256::from(chain_id)),
    ]);
    H256(keccak256(outer))
}

/// EIP-191 personal-message digest of a 32-byte hash. This is what the owner signs.
pub fn to_signed_digest(hash: H256) -> H256 {
    hash_message(hash.as_bytes())
}
