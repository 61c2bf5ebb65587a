// src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use minimal_account::config::SignerConfig;
use minimal_account::rpc::{AccountSignerRpcImpl, AccountSignerRpcServer};
use minimal_account::OperationSigner;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, env = "RPC_SERVER_ADDR", default_value = "127.0.0.1:8546")]
    rpc_server_addr: SocketAddr,

    /// Ignored on the local chain, which always signs with the Anvil test key.
    #[clap(short, long, env = "PRIVATE_KEY")]
    private_key: Option<String>,

    #[clap(short, long, env = "CHAIN_ID", default_value_t = 31337)]
    chain_id: u64,
}

impl From<Args> for SignerConfig {
    fn from(args: Args) -> Self {
        SignerConfig {
            rpc_server_addr: args.rpc_server_addr,
            chain_id: args.chain_id,
            private_key: args.private_key,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = SignerConfig::from(Args::parse());
    let signer = OperationSigner::new(&config)?;
    let rpc = AccountSignerRpcImpl::new(Arc::new(signer));

    info!("Starting account signer RPC server on {}", config.rpc_server_addr);
    let server_handle = start_server(config.rpc_server_addr, rpc).await?;

    // Keep the server running until Ctrl+C is pressed
    tokio::signal::ctrl_c().await?;
    server_handle.stop()?;
    info!("Server stopped");

    Ok(())
}

async fn start_server(server_addr: SocketAddr, rpc: AccountSignerRpcImpl) -> anyhow::Result<ServerHandle> {
    let server = ServerBuilder::default().build(server_addr).await?;
    let server_handle = server.start(rpc.into_rpc());
    Ok(server_handle)
}
