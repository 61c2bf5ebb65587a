// src/zksync/nonce.rs
use std::collections::HashMap;

use ethers::types::{Address, U256};

use crate::error::{AccountError, Result};

// System-level per-sender nonce counter.
pub trait NonceRegistry {
    fn current(&self, sender: Address) -> U256;

    // Bumps the sender's nonce and returns the new value.
    fn increment(&mut self, sender: Address) -> U256;

    // Bumps the nonce only if it currently equals `expected`.
    fn increment_if_equals(&mut self, sender: Address, expected: U256) -> Result<U256> {
        let current = self.current(sender);
        if current != expected {
            return Err(AccountError::InvalidNonce {
                sender,
                expected,
                current,
            });
        }
        Ok(self.increment(sender))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NonceHolder {
    nonces: HashMap<Address, U256>,
}

impl NonceRegistry for NonceHolder {
    fn current(&self, sender: Address) -> U256 {
        self.nonces.get(&sender).copied().unwrap_or_default()
    }

    fn increment(&mut self, sender: Address) -> U256 {
        let nonce = self.nonces.entry(sender).or_default();
        *nonce += U256::one();
        *nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_per_sender() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let mut holder = NonceHolder::default();
        assert_eq!(holder.increment(a), U256::one());
        assert_eq!(holder.increment(a), U256::from(2));
        assert_eq!(holder.current(a), U256::from(2));
        assert_eq!(holder.current(b), U256::zero());
    }

    #[test]
    fn rejects_stale_nonce() {
        let sender = Address::repeat_byte(1);
        let mut holder = NonceHolder::default();
        holder.increment_if_equals(sender, U256::zero()).unwrap();
        let err = holder.increment_if_equals(sender, U256::zero()).unwrap_err();
        assert_eq!(
            err,
            AccountError::InvalidNonce {
                sender,
                expected: U256::zero(),
                current: U256::one(),
            }
        );
        assert_eq!(holder.current(sender), U256::one());
    }
}
