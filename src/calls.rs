// src/calls.rs
//! ABI call encodings used by the account and the mock token.
use ethers::contract::EthCall;
use ethers::types::{Address, Bytes, U256};

/// `MinimalAccount.execute(address dest, uint256 value, bytes functionData)`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "execute", abi = "execute(address,uint256,bytes)")]
pub struct ExecuteCall {
    pub dest: Address,
    pub value: U256,
    pub function_data: Bytes,
}

/// `ERC20Mock.mint(address to, uint256 amount)`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "mint", abi = "mint(address,uint256)")]
pub struct MintCall {
    pub to: Address,
    pub amount: U256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "balanceOf", abi = "balanceOf(address)")]
pub struct BalanceOfCall {
    pub account: Address,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "transfer", abi = "transfer(address,uint256)")]
pub struct TransferCall {
    pub to: Address,
    pub amount: U256,
}
