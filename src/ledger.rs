// src/ledger.rs
use std::collections::HashMap;
use std::fmt::Debug;

use ethers::types::{Address, Bytes, U256};
use tracing::debug;

use crate::zksync::NonceHolder;

// Caller-visible context of a contract invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub this: Address,
    pub value: U256,
}

// Code deployed at an address. `Err` carries the raw revert payload.
pub trait Contract: Debug + Send + Sync {
    fn call(&mut self, ctx: &CallContext, data: &[u8]) -> Result<Bytes, Bytes>;

    fn box_clone(&self) -> Box<dyn Contract>;
}

impl Clone for Box<dyn Contract> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

// In-memory chain state: native balances, deployed code and the system nonce holder.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain_id: u64,
    balances: HashMap<Address, U256>,
    contracts: HashMap<Address, Box<dyn Contract>>,
    nonce_holder: NonceHolder,
}

impl Ledger {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            balances: HashMap::new(),
            contracts: HashMap::new(),
            nonce_holder: NonceHolder::default(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    // Credits `amount` out of thin air, like `vm.deal`.
    pub fn fund(&mut self, account: Address, amount: U256) {
        let balance = self.balances.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn deploy(&mut self, address: Address, contract: Box<dyn Contract>) {
        debug!("deploying contract at {:?}", address);
        self.contracts.insert(address, contract);
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.contracts.contains_key(&address)
    }

    pub fn nonce_holder(&self) -> &NonceHolder {
        &self.nonce_holder
    }

    pub fn nonce_holder_mut(&mut self) -> &mut NonceHolder {
        &mut self.nonce_holder
    }

    // Runs `f` against this ledger and discards every change it made if it fails.
    pub fn atomic<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    // Native value transfer. A recipient with code is invoked with empty call data
    // and may refuse the funds.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Bytes> {
        self.call(from, to, amount, &[]).map(|_| ())
    }

    // Message call from `from` to `to`. All effects are rolled back on revert.
    pub fn call(&mut self, from: Address, to: Address, value: U256, data: &[u8]) -> Result<Bytes, Bytes> {
        self.atomic(|ledger| {
            ledger.move_value(from, to, value)?;
            let Some(mut contract) = ledger.contracts.remove(&to) else {
                return Ok(Bytes::default());
            };
            let ctx = CallContext { caller: from, this: to, value };
            let result = contract.call(&ctx, data);
            ledger.contracts.insert(to, contract);
            result
        })
    }

    fn move_value(&mut self, from: Address, to: Address, value: U256) -> Result<(), Bytes> {
        if value.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(from);
        if available < value {
            debug!("insufficient balance on {:?}: {} < {}", from, available, value);
            return Err(Bytes::default());
        }
        self.balances.insert(from, available - value);
        self.fund(to, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zksync::NonceRegistry;

    #[derive(Debug, Clone, Default)]
    struct Counter {
        hits: u64,
        rejects_value: bool,
    }

    impl Contract for Counter {
        fn call(&mut self, ctx: &CallContext, data: &[u8]) -> Result<Bytes, Bytes> {
            self.hits += 1;
            if self.rejects_value && !ctx.value.is_zero() {
                return Err(Bytes::from(b"no receive".to_vec()));
            }
            if data == b"boom" {
                return Err(Bytes::from(b"boom".to_vec()));
            }
            Ok(Bytes::from(self.hits.to_be_bytes().to_vec()))
        }

        fn box_clone(&self) -> Box<dyn Contract> {
            Box::new(self.clone())
        }
    }

    const A: Address = Address::repeat_byte(0xaa);
    const B: Address = Address::repeat_byte(0xbb);

    #[test]
    fn transfer_moves_exact_amount() {
        let mut ledger = Ledger::new(1);
        ledger.fund(A, U256::from(10));
        ledger.transfer(A, B, U256::from(4)).unwrap();
        assert_eq!(ledger.balance_of(A), U256::from(6));
        assert_eq!(ledger.balance_of(B), U256::from(4));
        assert!(ledger.transfer(A, B, U256::from(7)).is_err());
        assert_eq!(ledger.balance_of(A), U256::from(6));
    }

    #[test]
    fn revert_rolls_back_value_and_state() {
        let mut ledger = Ledger::new(1);
        ledger.fund(A, U256::from(10));
        ledger.deploy(B, Box::new(Counter::default()));

        let err = ledger.call(A, B, U256::from(5), b"boom").unwrap_err();
        assert_eq!(err, Bytes::from(b"boom".to_vec()));
        assert_eq!(ledger.balance_of(A), U256::from(10));
        assert_eq!(ledger.balance_of(B), U256::zero());

        // the reverted call's counter increment is gone
        let out = ledger.call(A, B, U256::zero(), b"").unwrap();
        assert_eq!(out, Bytes::from(1u64.to_be_bytes().to_vec()));
    }

    #[test]
    fn contract_may_refuse_plain_transfer() {
        let mut ledger = Ledger::new(1);
        ledger.fund(A, U256::from(10));
        ledger.deploy(B, Box::new(Counter { hits: 0, rejects_value: true }));
        assert!(ledger.transfer(A, B, U256::one()).is_err());
        assert_eq!(ledger.balance_of(A), U256::from(10));
    }

    #[test]
    fn atomic_restores_on_error() {
        let mut ledger = Ledger::new(1);
        ledger.fund(A, U256::from(10));
        let result: Result<(), &str> = ledger.atomic(|ledger| {
            ledger.transfer(A, B, U256::from(3)).unwrap();
            ledger.nonce_holder_mut().increment(A);
            Err("abort")
        });
        assert!(result.is_err());
        assert_eq!(ledger.balance_of(A), U256::from(10));
        assert_eq!(ledger.nonce_holder().current(A), U256::zero());
    }
}
