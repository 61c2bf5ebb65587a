use ethers::abi::{AbiDecode, AbiEncode};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use ethers::utils::parse_ether;

use minimal_account::account::encode_execute;
use minimal_account::calls::{BalanceOfCall, MintCall};
use minimal_account::config::{SignerConfig, LOCAL_CHAIN_ID, ZKSYNC_SEPOLIA_CHAIN_ID};
use minimal_account::token::MockToken;
use minimal_account::zksync::{NonceRegistry, Transaction, BOOTLOADER_FORMAL_ADDRESS};
use minimal_account::{EntryPoint, Ledger, MinimalAccount, OperationSigner, ZkMinimalAccount};

const ACCOUNT: Address = Address::repeat_byte(0xac);
const TOKEN: Address = Address::repeat_byte(0x70);
const BENEFICIARY: Address = Address::repeat_byte(0xbe);

fn token_balance(ledger: &mut Ledger, account: Address) -> U256 {
    let out = ledger
        .call(BENEFICIARY, TOKEN, U256::zero(), &BalanceOfCall { account }.encode())
        .unwrap();
    U256::decode(out).unwrap()
}

fn local_signer() -> OperationSigner {
    OperationSigner::new(&SignerConfig {
        rpc_server_addr: "127.0.0.1:0".parse().unwrap(),
        chain_id: LOCAL_CHAIN_ID,
        private_key: None,
    })
    .unwrap()
}

#[test]
fn signer_and_entry_point_agree_on_the_digest() {
    let signer = local_signer();
    let entry_point_address = signer.network().entry_point;
    let mut ledger = Ledger::new(LOCAL_CHAIN_ID);
    ledger.deploy(TOKEN, Box::new(MockToken::new()));
    ledger.fund(ACCOUNT, parse_ether(1).unwrap());

    let account = MinimalAccount::new(ACCOUNT, signer.address(), entry_point_address);
    let mut entry_point = EntryPoint::new(entry_point_address);

    let amount = parse_ether(1).unwrap();
    let mint = MintCall { to: ACCOUNT, amount }.encode();
    let call_data = encode_execute(TOKEN, U256::zero(), mint.into());
    let op = signer
        .generate_signed_user_operation(call_data, ACCOUNT, entry_point.get_nonce(ACCOUNT))
        .unwrap();
    assert_eq!(entry_point.get_user_op_hash(&ledger, &op), signer.user_op_hash(&op));

    let receipts = entry_point
        .handle_ops(&mut ledger, &account, &[op], BENEFICIARY)
        .unwrap();
    assert!(receipts.iter().all(|r| r.success));
    assert_eq!(token_balance(&mut ledger, ACCOUNT), amount);
}

#[test]
fn account_owned_by_someone_else_rejects_signer() {
    let signer = local_signer();
    let entry_point_address = signer.network().entry_point;
    let mut ledger = Ledger::new(LOCAL_CHAIN_ID);
    ledger.deploy(TOKEN, Box::new(MockToken::new()));
    ledger.fund(ACCOUNT, parse_ether(1).unwrap());

    let other_owner = LocalWallet::new(&mut ethers::core::rand::thread_rng());
    let account = MinimalAccount::new(ACCOUNT, other_owner.address(), entry_point_address);
    let mut entry_point = EntryPoint::new(entry_point_address);

    let mint = MintCall { to: ACCOUNT, amount: U256::one() }.encode();
    let op = signer
        .generate_signed_user_operation(encode_execute(TOKEN, U256::zero(), mint.into()), ACCOUNT, U256::zero())
        .unwrap();
    assert!(entry_point
        .handle_ops(&mut ledger, &account, &[op], BENEFICIARY)
        .is_err());
    assert_eq!(token_balance(&mut ledger, ACCOUNT), U256::zero());
    assert_eq!(ledger.balance_of(ACCOUNT), parse_ether(1).unwrap());
}

#[test]
fn bootloader_lifecycle_runs_in_order() {
    let owner = LocalWallet::new(&mut ethers::core::rand::thread_rng());
    let mut ledger = Ledger::new(ZKSYNC_SEPOLIA_CHAIN_ID);
    ledger.deploy(TOKEN, Box::new(MockToken::new()));
    ledger.fund(ACCOUNT, parse_ether(1).unwrap());
    let mut account = ZkMinimalAccount::new(ACCOUNT, owner.address());

    let amount = parse_ether(1).unwrap();
    let mint = MintCall { to: ACCOUNT, amount }.encode();
    let mut tx = Transaction::eip712(ACCOUNT, TOKEN, U256::zero(), mint.into(), U256::zero());
    let hash = tx.encode_hash(ZKSYNC_SEPOLIA_CHAIN_ID).unwrap();
    tx.signature = owner.sign_hash(hash).unwrap().to_vec().into();

    let boot = BOOTLOADER_FORMAL_ADDRESS;
    assert!(account.pay_for_transaction(&mut ledger, boot, &tx).is_err());
    account.validate_transaction(&mut ledger, boot, &tx).unwrap();
    assert_eq!(ledger.nonce_holder().current(ACCOUNT), U256::one());
    account.pay_for_transaction(&mut ledger, boot, &tx).unwrap();
    account.execute_transaction(&mut ledger, boot, &tx).unwrap();
    account.post_process(&ledger, boot, &tx).unwrap();

    assert_eq!(token_balance(&mut ledger, ACCOUNT), amount);
    assert_eq!(ledger.balance_of(boot), tx.fee().unwrap());
}
