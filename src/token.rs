// src/token.rs
use std::collections::HashMap;

use ethers::abi::{AbiDecode, AbiEncode};
use ethers::types::{Address, Bytes, U256};

use crate::calls::{BalanceOfCall, MintCall, TransferCall};
use crate::ledger::{CallContext, Contract};

/// Minimal ERC-20 with an unrestricted `mint`, used as a call destination.
#[derive(Debug, Clone, Default)]
pub struct MockToken {
    balances: HashMap<Address, U256>,
    total_supply: U256,
}

impl MockToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }
}

fn revert(reason: &str) -> Bytes {
    Bytes::from(reason.as_bytes().to_vec())
}

impl Contract for MockToken {
    fn call(&mut self, ctx: &CallContext, data: &[u8]) -> Result<Bytes, Bytes> {
        if !ctx.value.is_zero() {
            return Err(revert("MockToken: not payable"));
        }

        if let Ok(MintCall { to, amount }) = MintCall::decode(data) {
            let supply = self
                .total_supply
                .checked_add(amount)
                .ok_or_else(|| revert("MockToken: supply overflow"))?;
            self.total_supply = supply;
            *self.balances.entry(to).or_default() += amount;
            return Ok(Bytes::default());
        }

        if let Ok(BalanceOfCall { account }) = BalanceOfCall::decode(data) {
            return Ok(Bytes::from(self.balance_of(account).encode()));
        }

        if let Ok(TransferCall { to, amount }) = TransferCall::decode(data) {
            let from_balance = self.balance_of(ctx.caller);
            if from_balance < amount {
                return Err(revert("ERC20InsufficientBalance"));
            }
            self.balances.insert(ctx.caller, from_balance - amount);
            *self.balances.entry(to).or_default() += amount;
            return Ok(Bytes::from(true.encode()));
        }

        Err(revert("MockToken: unknown selector"))
    }

    fn box_clone(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }
}
