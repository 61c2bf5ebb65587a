// src/entry_point.rs
use std::collections::HashMap;

use ethers::types::{Address, Bytes, H256, U256};
use tracing::{debug, error, info};

use crate::account::MinimalAccount;
use crate::error::{AccountError, Result};
use crate::hashing::user_op_hash;
use crate::ledger::Ledger;
use crate::types::PackedUserOperation;

// Outcome of one operation inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOperationReceipt {
    pub user_op_hash: H256,
    pub sender: Address,
    pub nonce: U256,
    pub success: bool,
    // Raw revert payload when execution failed.
    pub revert_reason: Option<Bytes>,
    pub actual_gas_cost: U256,
}

// Single-account stand-in for the ERC-4337 EntryPoint: sequential nonces,
// deposits and the validate-then-execute loop of `handleOps`.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    address: Address,
    nonces: HashMap<Address, U256>,
    deposits: HashMap<Address, U256>,
}

impl EntryPoint {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            nonces: HashMap::new(),
            deposits: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn get_nonce(&self, sender: Address) -> U256 {
        self.nonces.get(&sender).copied().unwrap_or_default()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.deposits.get(&account).copied().unwrap_or_default()
    }

    // Credits a deposit for `account`, paid by `from`.
    pub fn deposit_to(&mut self, ledger: &mut Ledger, from: Address, account: Address, amount: U256) -> Result<()> {
        ledger
            .transfer(from, self.address, amount)
            .map_err(AccountError::CallFailed)?;
        *self.deposits.entry(account).or_default() += amount;
        Ok(())
    }

    pub fn get_user_op_hash(&self, ledger: &Ledger, user_op: &PackedUserOperation) -> H256 {
        user_op_hash(user_op, self.address, ledger.chain_id())
    }

    // Validates every operation, then executes them in order and pays the
    // collected fees to `beneficiary`. Any validation failure reverts the whole
    // bundle; an execution failure is only recorded on its receipt.
    pub fn handle_ops(
        &mut self,
        ledger: &mut Ledger,
        account: &MinimalAccount,
        ops: &[PackedUserOperation],
        beneficiary: Address,
    ) -> Result<Vec<UserOperationReceipt>> {
        let snapshot = self.clone();
        let result = ledger.atomic(|ledger| self.process_bundle(ledger, account, ops, beneficiary));
        if let Err(e) = &result {
            error!("bundle reverted: {}", e);
            *self = snapshot;
        }
        result
    }

    fn process_bundle(
        &mut self,
        ledger: &mut Ledger,
        account: &MinimalAccount,
        ops: &[PackedUserOperation],
        beneficiary: Address,
    ) -> Result<Vec<UserOperationReceipt>> {
        let mut prefunds = Vec::with_capacity(ops.len());
        for (index, op) in ops.iter().enumerate() {
            prefunds.push(self.validate_op(ledger, account, index, op)?);
        }

        let mut receipts = Vec::with_capacity(ops.len());
        let mut collected = U256::zero();
        for (op, (hash, prefund)) in ops.iter().zip(prefunds) {
            let revert_reason = match account.handle_call(ledger, self.address, &op.call_data) {
                Ok(()) => None,
                Err(AccountError::CallFailed(reason)) => Some(reason),
                Err(e) => Some(Bytes::from(e.to_string().into_bytes())),
            };
            collected += prefund;
            debug!("operation {:?} executed, success = {}", hash, revert_reason.is_none());
            receipts.push(UserOperationReceipt {
                user_op_hash: hash,
                sender: op.sender,
                nonce: op.nonce,
                success: revert_reason.is_none(),
                revert_reason,
                actual_gas_cost: prefund,
            });
        }

        ledger
            .transfer(self.address, beneficiary, collected)
            .map_err(|reason| AccountError::FailedOp {
                index: ops.len(),
                reason: format!("AA91 failed send to beneficiary: {reason}"),
            })?;
        info!("Handled {} user operations, paid {} to {:?}", ops.len(), collected, beneficiary);
        Ok(receipts)
    }

    fn validate_op(
        &mut self,
        ledger: &mut Ledger,
        account: &MinimalAccount,
        index: usize,
        op: &PackedUserOperation,
    ) -> Result<(H256, U256)> {
        let failed = |reason: &str| AccountError::FailedOp {
            index,
            reason: reason.to_string(),
        };

        if op.sender != account.address() {
            return Err(failed("AA20 account not deployed"));
        }
        if op.nonce != self.get_nonce(op.sender) {
            return Err(failed("AA25 invalid account nonce"));
        }

        let hash = self.get_user_op_hash(ledger, op);
        let required = op.required_prefund().ok_or_else(|| failed("AA94 gas values overflow"))?;
        let deposit = self.balance_of(op.sender);
        let missing = required.saturating_sub(deposit);

        let before = ledger.balance_of(self.address);
        let validation = account.validate_user_op(ledger, self.address, op, hash, missing)?;
        let received = ledger.balance_of(self.address) - before;
        let deposit = deposit + received;

        if !validation.is_accepted() {
            return Err(failed("AA24 signature error"));
        }
        if deposit < required {
            return Err(failed("AA21 didn't pay prefund"));
        }

        self.deposits.insert(op.sender, deposit - required);
        *self.nonces.entry(op.sender).or_default() += U256::one();
        Ok((hash, required))
    }
}
