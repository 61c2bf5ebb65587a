// src/signer.rs
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256, U256};
use tracing::{debug, info, warn};

use crate::config::{NetworkConfig, SignerConfig};
use crate::error::{AccountError, Result};
use crate::hashing::{to_signed_digest, user_op_hash};
use crate::types::PackedUserOperation;

/// Off-chain producer of owner signatures for user operations.
#[derive(Debug, Clone)]
pub struct OperationSigner {
    wallet: LocalWallet,
    network: NetworkConfig,
    chain_id: u64,
}

impl OperationSigner {
    pub fn new(config: &SignerConfig) -> Result<Self> {
        let network = config.network()?;
        let wallet = config
            .signing_key()?
            .parse::<LocalWallet>()
            .map_err(|e| AccountError::Signing(e.to_string()))?
            .with_chain_id(config.chain_id);

        if wallet.address() != network.account {
            warn!(
                "signing key {:?} differs from the network account {:?}",
                wallet.address(),
                network.account
            );
        }
        info!("Initialized signer {:?} for chain {}", wallet.address(), config.chain_id);

        Ok(Self {
            wallet,
            network,
            chain_id: config.chain_id,
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn user_op_hash(&self, user_op: &PackedUserOperation) -> H256 {
        user_op_hash(user_op, self.network.entry_point, self.chain_id)
    }

    /// Signs the EIP-191 digest of the operation hash and stores the 65-byte
    /// `r ‖ s ‖ v` signature on the operation.
    pub fn sign(&self, mut user_op: PackedUserOperation) -> Result<PackedUserOperation> {
        let digest = to_signed_digest(self.user_op_hash(&user_op));
        let signature = self
            .wallet
            .sign_hash(digest)
            .map_err(|e| AccountError::Signing(e.to_string()))?;
        user_op.signature = Bytes::from(signature.to_vec());
        debug!("signed user operation for {:?}", user_op.sender);
        Ok(user_op)
    }

    pub fn generate_signed_user_operation(
        &self,
        call_data: Bytes,
        sender: Address,
        nonce: U256,
    ) -> Result<PackedUserOperation> {
        self.sign(PackedUserOperation::unsigned(sender, nonce, call_data))
    }
}
