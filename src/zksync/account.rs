// src/zksync/account.rs
use ethers::types::{Address, H160, H256};
use tracing::{debug, info, warn};

use super::nonce::NonceRegistry;
use super::transaction::Transaction;
use crate::error::{AccountError, Result};
use crate::ledger::Ledger;
use crate::signature::recover_signer;

// Formal address the zkSync bootloader calls accounts from.
pub const BOOTLOADER_FORMAL_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x80, 0x01,
]);

// `IAccount.validateTransaction.selector`
pub const ACCOUNT_VALIDATION_SUCCESS_MAGIC: [u8; 4] = [0x20, 0x2b, 0xcc, 0xe7];

// Lifecycle position of the in-flight transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Validated,
    Paid,
    Executed,
}

// Output of the post-process phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    // A paymaster sponsored the fee and was settled.
    Sponsored { paymaster: Address },
    Skipped,
}

// Transaction currently between validation and post-processing, with the
// ledger as it was before validation touched it.
#[derive(Debug, Clone)]
struct InFlight {
    tx_hash: H256,
    phase: Phase,
    checkpoint: Ledger,
}

// Single-owner account driven by the bootloader through
// validate → pay → execute → post-process.
//
// One transaction is in flight at a time, from validation until
// post-processing completes. A phase invoked out of order is rejected with
// AccountError::PhaseOutOfOrder. A failed payment or execution restores the
// ledger to its state before validation, nonce included.
#[derive(Debug, Clone)]
pub struct ZkMinimalAccount {
    address: Address,
    owner: Address,
    bootloader: Address,
    in_flight: Option<InFlight>,
}

impl ZkMinimalAccount {
    pub fn new(address: Address, owner: Address) -> Self {
        Self::with_bootloader(address, owner, BOOTLOADER_FORMAL_ADDRESS)
    }

    pub fn with_bootloader(address: Address, owner: Address, bootloader: Address) -> Self {
        info!("Initialized zk account {:?} owned by {:?}", address, owner);
        Self {
            address,
            owner,
            bootloader,
            in_flight: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn phase(&self, tx_hash: H256) -> Option<Phase> {
        self.in_flight
            .as_ref()
            .filter(|pending| pending.tx_hash == tx_hash)
            .map(|pending| pending.phase)
    }

    pub fn pending_transaction(&self) -> Option<H256> {
        self.in_flight.as_ref().map(|pending| pending.tx_hash)
    }

    pub fn require_from_bootloader(&self, caller: Address) -> Result<()> {
        if caller != self.bootloader {
            return Err(AccountError::NotFromBootloader(caller));
        }
        Ok(())
    }

    pub fn require_from_bootloader_or_owner(&self, caller: Address) -> Result<()> {
        if caller != self.bootloader && caller != self.owner {
            return Err(AccountError::NotFromBootloaderOrOwner(caller));
        }
        Ok(())
    }

    // Increments the account nonce, checks the owner signature and the balance
    // needed for the fee budget. Any failure leaves the nonce untouched.
    pub fn validate_transaction(&mut self, ledger: &mut Ledger, caller: Address, tx: &Transaction) -> Result<[u8; 4]> {
        self.require_from_bootloader(caller)?;
        let tx_hash = tx.encode_hash(ledger.chain_id())?;
        match &self.in_flight {
            Some(pending) if pending.tx_hash == tx_hash => {
                return Err(AccountError::PhaseOutOfOrder { expected: None, found: Some(pending.phase) });
            }
            Some(pending) => return Err(AccountError::TransactionInFlight(pending.tx_hash)),
            None => {}
        }

        let checkpoint = ledger.clone();
        ledger.atomic(|ledger| self.check_transaction(ledger, tx, tx_hash))?;
        self.in_flight = Some(InFlight {
            tx_hash,
            phase: Phase::Validated,
            checkpoint,
        });
        debug!("validated transaction {:?}", tx_hash);
        Ok(ACCOUNT_VALIDATION_SUCCESS_MAGIC)
    }

    // Moves the fee to the bootloader unless a paymaster sponsors it.
    pub fn pay_for_transaction(&mut self, ledger: &mut Ledger, caller: Address, tx: &Transaction) -> Result<()> {
        self.require_from_bootloader(caller)?;
        let tx_hash = tx.encode_hash(ledger.chain_id())?;
        self.expect_phase(tx_hash, Some(Phase::Validated))?;

        if tx.is_sponsored() {
            debug!("fee for {:?} sponsored by {:?}", tx_hash, tx.paymaster);
        } else {
            let paid = tx.fee().and_then(|fee| {
                ledger
                    .transfer(self.address, self.bootloader, fee)
                    .map(|_| fee)
                    .map_err(|_| AccountError::FailedToPay)
            });
            match paid {
                Ok(fee) => debug!("paid {} to the bootloader for {:?}", fee, tx_hash),
                Err(e) => {
                    self.roll_back(ledger);
                    return Err(e);
                }
            }
        }
        self.advance(Phase::Paid);
        Ok(())
    }

    pub fn execute_transaction(&mut self, ledger: &mut Ledger, caller: Address, tx: &Transaction) -> Result<()> {
        self.require_from_bootloader_or_owner(caller)?;
        let tx_hash = tx.encode_hash(ledger.chain_id())?;
        self.expect_phase(tx_hash, Some(Phase::Paid))?;

        if let Err(e) = self.call_destination(ledger, tx) {
            self.roll_back(ledger);
            return Err(e);
        }
        self.advance(Phase::Executed);
        info!("Executed transaction {:?}", tx_hash);
        Ok(())
    }

    // Final phase. Only does work when a paymaster took part in payment; in
    // both cases the transaction stops being tracked.
    pub fn post_process(&mut self, ledger: &Ledger, caller: Address, tx: &Transaction) -> Result<PostProcess> {
        self.require_from_bootloader(caller)?;
        let tx_hash = tx.encode_hash(ledger.chain_id())?;
        self.expect_phase(tx_hash, Some(Phase::Executed))?;

        self.in_flight = None;
        if tx.is_sponsored() {
            info!("settled sponsored transaction {:?} with {:?}", tx_hash, tx.paymaster);
            Ok(PostProcess::Sponsored { paymaster: tx.paymaster })
        } else {
            Ok(PostProcess::Skipped)
        }
    }

    // Drops a transaction the bootloader will not finish and restores the
    // ledger to its state before that transaction was validated.
    pub fn abort_transaction(&mut self, ledger: &mut Ledger, caller: Address) -> Result<Option<H256>> {
        self.require_from_bootloader(caller)?;
        Ok(self.roll_back(ledger))
    }

    // Relayer entry: validation and execution as one atomic step. The relayer
    // pays the outer fee, so nothing is sent to the bootloader.
    pub fn execute_transaction_from_outside(&self, ledger: &mut Ledger, tx: &Transaction) -> Result<()> {
        if let Some(pending) = self.pending_transaction() {
            return Err(AccountError::TransactionInFlight(pending));
        }
        let tx_hash = tx.encode_hash(ledger.chain_id())?;
        ledger.atomic(|ledger| {
            self.check_transaction(ledger, tx, tx_hash)?;
            self.call_destination(ledger, tx)
        })?;
        info!("Executed transaction {:?} from outside", tx_hash);
        Ok(())
    }

    fn check_transaction(&self, ledger: &mut Ledger, tx: &Transaction, tx_hash: H256) -> Result<()> {
        ledger
            .nonce_holder_mut()
            .increment_if_equals(self.address, tx.nonce)?;

        match recover_signer(tx_hash, &tx.signature) {
            Some(signer) if signer == self.owner => {}
            signer => {
                debug!("transaction signed by {:?}, owner is {:?}", signer, self.owner);
                return Err(AccountError::InvalidSignature);
            }
        }

        let required = tx.total_required_balance()?;
        let available = ledger.balance_of(self.address);
        if available < required {
            return Err(AccountError::NotEnoughBalance { available, required });
        }
        Ok(())
    }

    fn call_destination(&self, ledger: &mut Ledger, tx: &Transaction) -> Result<()> {
        ledger
            .call(self.address, tx.to, tx.value, &tx.data)
            .map(|_| ())
            .map_err(AccountError::ExecutionFailed)
    }

    fn advance(&mut self, phase: Phase) {
        if let Some(pending) = self.in_flight.as_mut() {
            pending.phase = phase;
        }
    }

    fn roll_back(&mut self, ledger: &mut Ledger) -> Option<H256> {
        let pending = self.in_flight.take()?;
        *ledger = pending.checkpoint;
        warn!("rolled back transaction {:?} from {:?}", pending.tx_hash, pending.phase);
        Some(pending.tx_hash)
    }

    fn expect_phase(&self, tx_hash: H256, expected: Option<Phase>) -> Result<()> {
        let found = self.phase(tx_hash);
        if found != expected {
            return Err(AccountError::PhaseOutOfOrder { expected, found });
        }
        Ok(())
    }
}
