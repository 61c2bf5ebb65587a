// src/config.rs
use std::net::SocketAddr;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, Result};

pub const ETH_SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const ZKSYNC_SEPOLIA_CHAIN_ID: u64 = 300;
pub const ARBITRUM_MAINNET_CHAIN_ID: u64 = 42_161;
pub const LOCAL_CHAIN_ID: u64 = 31_337;

// Funded account the configured key is expected to control on public networks.
pub const BURNER_WALLET: &str = "0x643315C9Be056cDEA171F4e7b2222a4ddaB9F88D";
// First Anvil account.
pub const ANVIL_DEFAULT_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
// Private key of ANVIL_DEFAULT_ACCOUNT. Public knowledge; local use only.
pub const ANVIL_DEFAULT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const ENTRY_POINT_V07: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";
const SEPOLIA_ENTRY_POINT: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
// First two deployments from the default Anvil account.
const LOCAL_ENTRY_POINT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const LOCAL_USDC: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub entry_point: Address,
    pub usdc: Address,
    pub account: Address,
}

// Which key signs operations on a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningPolicy {
    // Well-known Anvil key, only on the local chain.
    TestKey,
    // Operator supplied key.
    AccountKey,
}

impl SigningPolicy {
    pub fn for_chain(chain_id: u64) -> Self {
        if chain_id == LOCAL_CHAIN_ID {
            SigningPolicy::TestKey
        } else {
            SigningPolicy::AccountKey
        }
    }
}

fn address(s: &str) -> Result<Address> {
    s.parse().map_err(|_| AccountError::InvalidAddress(s.to_string()))
}

impl NetworkConfig {
    pub fn for_chain(chain_id: u64) -> Result<Self> {
        match chain_id {
            ETH_SEPOLIA_CHAIN_ID => Ok(Self {
                entry_point: address(SEPOLIA_ENTRY_POINT)?,
                usdc: address("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238")?,
                account: address(BURNER_WALLET)?,
            }),
            // zkSync has native account abstraction and no entry point contract
            ZKSYNC_SEPOLIA_CHAIN_ID => Ok(Self {
                entry_point: Address::zero(),
                usdc: address("0x5A7d6b2F92C77FAD6CCaBd7EE0624E64907Eaf3E")?,
                account: address(BURNER_WALLET)?,
            }),
            ARBITRUM_MAINNET_CHAIN_ID => Ok(Self {
                entry_point: address(ENTRY_POINT_V07)?,
                usdc: address("0xaf88d065e77c8cC2239327C5EDb3A432268e5831")?,
                account: address(BURNER_WALLET)?,
            }),
            LOCAL_CHAIN_ID => Ok(Self {
                entry_point: address(LOCAL_ENTRY_POINT)?,
                usdc: address(LOCAL_USDC)?,
                account: address(ANVIL_DEFAULT_ACCOUNT)?,
            }),
            other => Err(AccountError::InvalidChainId(other)),
        }
    }
}

// Settings for the signing service.
#[derive(Debug, Clone)]
pub struct SignerConfig {
    pub rpc_server_addr: SocketAddr,
    pub chain_id: u64,
    pub private_key: Option<String>,
}

impl SignerConfig {
    pub fn network(&self) -> Result<NetworkConfig> {
        NetworkConfig::for_chain(self.chain_id)
    }

    // Resolves the key to sign with under the chain's SigningPolicy.
    pub fn signing_key(&self) -> Result<String> {
        match SigningPolicy::for_chain(self.chain_id) {
            SigningPolicy::TestKey => Ok(ANVIL_DEFAULT_KEY.to_string()),
            SigningPolicy::AccountKey => self
                .private_key
                .clone()
                .ok_or(AccountError::MissingAccountKey(self.chain_id)),
        }
    }
}
