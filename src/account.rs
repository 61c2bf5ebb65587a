// src/account.rs
use ethers::abi::{AbiDecode, AbiEncode};
use ethers::types::{Address, Bytes, H256, U256};
use tracing::{debug, info, warn};

use crate::calls::ExecuteCall;
use crate::error::{AccountError, Result};
use crate::hashing::to_signed_digest;
use crate::ledger::Ledger;
use crate::signature::recover_signer;
use crate::types::{PackedUserOperation, ValidationData};

// Single-owner ERC-4337 account.
//
// `owner` and `entry_point` are fixed at construction. Every gated method takes
// the calling identity explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimalAccount {
    address: Address,
    owner: Address,
    entry_point: Address,
}

impl MinimalAccount {
    pub fn new(address: Address, owner: Address, entry_point: Address) -> Self {
        info!("Initialized account {:?} owned by {:?}", address, owner);
        Self {
            address,
            owner,
            entry_point,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn require_from_entry_point(&self, caller: Address) -> Result<()> {
        if caller != self.entry_point {
            return Err(AccountError::NotFromEntryPoint(caller));
        }
        Ok(())
    }

    pub fn require_from_entry_point_or_owner(&self, caller: Address) -> Result<()> {
        if caller != self.entry_point && caller != self.owner {
            return Err(AccountError::NotFromEntryPointOrOwner(caller));
        }
        Ok(())
    }

    // Entry point hook: checks the signature and pays the entry point what it is
    // missing. A bad signature is reported through the returned value, not an error.
    pub fn validate_user_op(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        user_op: &PackedUserOperation,
        user_op_hash: H256,
        missing_account_funds: U256,
    ) -> Result<ValidationData> {
        self.require_from_entry_point(caller)?;
        let validation_data = self.validate_signature(user_op, user_op_hash);
        self.pay_prefund(ledger, caller, missing_account_funds);
        Ok(validation_data)
    }

    pub fn validate_signature(&self, user_op: &PackedUserOperation, user_op_hash: H256) -> ValidationData {
        let digest = to_signed_digest(user_op_hash);
        match recover_signer(digest, &user_op.signature) {
            Some(signer) if signer == self.owner => ValidationData::SUCCESS,
            signer => {
                debug!("signature by {:?} does not match owner {:?}", signer, self.owner);
                ValidationData::SIG_VALIDATION_FAILED
            }
        }
    }

    // Sends `amount` to `caller`. A failed transfer is logged and reported as
    // `false`; the entry point is responsible for checking the deposit.
    pub fn pay_prefund(&self, ledger: &mut Ledger, caller: Address, amount: U256) -> bool {
        if amount.is_zero() {
            return true;
        }
        match ledger.transfer(self.address, caller, amount) {
            Ok(()) => {
                debug!("paid prefund of {} to {:?}", amount, caller);
                true
            }
            Err(reason) => {
                warn!("prefund of {} to {:?} failed: {}", amount, caller, reason);
                false
            }
        }
    }

    // Forwards `value` and `function_data` to `dest`. A revert aborts with the
    // destination's raw payload and leaves no effects.
    pub fn execute(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        dest: Address,
        value: U256,
        function_data: &[u8],
    ) -> Result<()> {
        self.require_from_entry_point_or_owner(caller)?;
        ledger
            .call(self.address, dest, value, function_data)
            .map_err(AccountError::CallFailed)?;
        info!("Executed call from {:?} to {:?} with value {}", self.address, dest, value);
        Ok(())
    }

    // Dispatches ABI-encoded call data addressed to this account.
    pub fn handle_call(&self, ledger: &mut Ledger, caller: Address, call_data: &[u8]) -> Result<()> {
        let ExecuteCall {
            dest,
            value,
            function_data,
        } = ExecuteCall::decode(call_data).map_err(|_| AccountError::UnknownSelector)?;
        self.execute(ledger, caller, dest, value, &function_data)
    }
}

// Encodes `execute(dest, value, function_data)` as account call data.
pub fn encode_execute(dest: Address, value: U256, function_data: Bytes) -> Bytes {
    Bytes::from(
        ExecuteCall {
            dest,
            value,
            function_data,
        }
        .encode(),
    )
}
