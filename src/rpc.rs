// src/rpc.rs
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::error::ErrorObject;
use tracing::{debug, error, info};

use crate::config::NetworkConfig;
use crate::error::AccountError;
use crate::hashing::to_signed_digest;
use crate::signature::recover_signer;
use crate::signer::OperationSigner;
use crate::types::PackedUserOperation;

// Define the RPC interface
#[rpc(server, namespace = "account")]
pub trait AccountSignerRpc {
    /// Canonical hash of an operation under the configured entry point and chain.
    #[method(name = "getUserOperationHash")]
    async fn user_operation_hash(&self, user_op: PackedUserOperation) -> RpcResult<H256>;

    /// Builds an operation with the default gas policy and signs it.
    #[method(name = "signUserOperation")]
    async fn sign_user_operation(&self, call_data: Bytes, sender: Address, nonce: U256) -> RpcResult<PackedUserOperation>;

    /// Address recovered from the operation's signature, if any.
    #[method(name = "recoverSigner")]
    async fn recover_signer(&self, user_op: PackedUserOperation) -> RpcResult<Option<Address>>;

    #[method(name = "networkConfig")]
    async fn network_config(&self) -> RpcResult<NetworkConfig>;
}

pub struct AccountSignerRpcImpl {
    signer: Arc<OperationSigner>,
}

impl AccountSignerRpcImpl {
    pub fn new(signer: Arc<OperationSigner>) -> Self {
        Self { signer }
    }
}

fn rpc_error(e: AccountError) -> jsonrpsee::types::ErrorObjectOwned {
    ErrorObject::owned(-32000, format!("Account error: {}", e), None::<()>)
}

#[async_trait]
impl AccountSignerRpcServer for AccountSignerRpcImpl {
    async fn user_operation_hash(&self, user_op: PackedUserOperation) -> RpcResult<H256> {
        Ok(self.signer.user_op_hash(&user_op))
    }

    async fn sign_user_operation(&self, call_data: Bytes, sender: Address, nonce: U256) -> RpcResult<PackedUserOperation> {
        debug!("Received sign request for sender: {:?}", sender);

        match self.signer.generate_signed_user_operation(call_data, sender, nonce) {
            Ok(user_op) => {
                info!("Signed operation for {:?} at nonce {}", sender, nonce);
                Ok(user_op)
            }
            Err(e) => {
                error!("Failed to sign operation: {}", e);
                Err(rpc_error(e).into())
            }
        }
    }

    async fn recover_signer(&self, user_op: PackedUserOperation) -> RpcResult<Option<Address>> {
        let digest = to_signed_digest(self.signer.user_op_hash(&user_op));
        Ok(recover_signer(digest, &user_op.signature))
    }

    async fn network_config(&self) -> RpcResult<NetworkConfig> {
        Ok(*self.signer.network())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SignerConfig, LOCAL_CHAIN_ID};

    fn service() -> AccountSignerRpcImpl {
        let signer = OperationSigner::new(&SignerConfig {
            rpc_server_addr: "127.0.0.1:0".parse().unwrap(),
            chain_id: LOCAL_CHAIN_ID,
            private_key: None,
        })
        .unwrap();
        AccountSignerRpcImpl::new(Arc::new(signer))
    }

    #[tokio::test]
    async fn sign_then_recover() {
        let service = service();
        let user_op = service
            .sign_user_operation(Bytes::from(vec![0xab]), Address::repeat_byte(3), U256::zero())
            .await
            .unwrap();
        let hash = service.user_operation_hash(user_op.clone()).await.unwrap();
        assert_eq!(hash, service.signer.user_op_hash(&user_op));

        let recovered = service.recover_signer(user_op.clone()).await.unwrap();
        assert_eq!(recovered, Some(service.signer.address()));

        let tampered = PackedUserOperation { nonce: U256::one(), ..user_op };
        let recovered = service.recover_signer(tampered).await.unwrap();
        assert_ne!(recovered, Some(service.signer.address()));
    }

    #[tokio::test]
    async fn serves_network_config() {
        let service = service();
        let config = service.network_config().await.unwrap();
        assert_eq!(config, NetworkConfig::for_chain(LOCAL_CHAIN_ID).unwrap());
    }

    #[tokio::test]
    async fn operation_round_trips_through_json() {
        let service = service();
        let user_op = service
            .sign_user_operation(Bytes::from(vec![1]), Address::repeat_byte(3), U256::from(2))
            .await
            .unwrap();
        let json = serde_json::to_value(&user_op).unwrap();
        assert!(json.get("accountGasLimits").is_some());
        assert!(json.get("paymasterAndData").is_some());
        let decoded: PackedUserOperation = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, user_op);
    }
}
