// src/signature.rs
use ethers::types::{Address, RecoveryMessage, Signature, H256, U256};
use tracing::debug;

pub const SIGNATURE_LENGTH: usize = 65;

/// secp256k1 order / 2. Signatures with a larger `s` are malleable copies.
const SECP256K1_HALF_ORDER: U256 = U256([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Recovers the address that signed `digest`. Returns `None` for any input that
/// is not a well-formed, low-s, 65-byte `r ‖ s ‖ v` signature with `v` of 27 or 28.
pub fn recover_signer(digest: H256, signature: &[u8]) -> Option<Address> {
    let signature = match Signature::try_from(signature) {
        Ok(signature) => signature,
        Err(e) => {
            debug!("rejecting signature: {}", e);
            return None;
        }
    };

    // 27 or 28 only. EIP-155 and bare parity values are rejected.
    if signature.v != 27 && signature.v != 28 {
        debug!("rejecting signature with v = {}", signature.v);
        return None;
    }

    if signature.r.is_zero() || signature.s.is_zero() || signature.s > SECP256K1_HALF_ORDER {
        debug!("rejecting signature with out-of-range scalar");
        return None;
    }

    match signature.recover(RecoveryMessage::Hash(digest)) {
        Ok(address) => Some(address),
        Err(e) => {
            debug!("signature recovery failed: {}", e);
            None
        }
    }
}

/// Packs signature components as `r ‖ s ‖ v`.
pub fn encode_signature(r: H256, s: H256, v: u8) -> [u8; SIGNATURE_LENGTH] {
    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..32].copy_from_slice(r.as_bytes());
    out[32..64].copy_from_slice(s.as_bytes());
    out[64] = v;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};

    fn wallet() -> LocalWallet {
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap()
    }

    #[test]
    fn recovers_the_signing_key() {
        let wallet = wallet();
        let digest = H256::repeat_byte(0x42);
        let signature = wallet.sign_hash(digest).unwrap();
        assert_eq!(recover_signer(digest, &signature.to_vec()), Some(wallet.address()));
    }

    #[test]
    fn layout_is_r_s_v() {
        let wallet = wallet();
        let digest = H256::repeat_byte(0x42);
        let signature = wallet.sign_hash(digest).unwrap();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        signature.r.to_big_endian(&mut r);
        signature.s.to_big_endian(&mut s);
        let packed = encode_signature(H256(r), H256(s), signature.v as u8);

        assert_eq!(packed.to_vec(), signature.to_vec());
        assert_eq!(recover_signer(digest, &packed), Some(wallet.address()));
    }

    #[test]
    fn malformed_input_recovers_nothing() {
        let digest = H256::repeat_byte(0x42);
        assert_eq!(recover_signer(digest, &[]), None);
        assert_eq!(recover_signer(digest, &[1u8; 64]), None);
        assert_eq!(recover_signer(digest, &[1u8; 66]), None);
        assert_eq!(recover_signer(digest, &[0u8; 65]), None);

        let mut bad_v = wallet().sign_hash(digest).unwrap().to_vec();
        bad_v[64] = 5;
        assert_eq!(recover_signer(digest, &bad_v), None);
    }

    #[test]
    fn only_canonical_v_is_accepted() {
        let wallet = wallet();
        let digest = H256::repeat_byte(0x42);
        let signature = wallet.sign_hash(digest).unwrap();
        let parity = signature.v - 27;

        // same (r, s) with the parity folded into an EIP-155 v for chain 1
        let mut eip155 = signature.to_vec();
        eip155[64] = (35 + 2 + parity) as u8;
        assert_eq!(recover_signer(digest, &eip155), None);

        let mut raw_parity = signature.to_vec();
        raw_parity[64] = parity as u8;
        assert_eq!(recover_signer(digest, &raw_parity), None);

        assert_eq!(recover_signer(digest, &signature.to_vec()), Some(wallet.address()));
    }

    #[test]
    fn high_s_is_rejected() {
        let digest = H256::repeat_byte(0x42);
        let mut signature = wallet().sign_hash(digest).unwrap();
        // secp256k1 order
        let order = U256::from_dec_str(
            "115792089237316195423570985008687907852837564279074904382605163141518161494337",
        )
        .unwrap();
        signature.s = order - signature.s;
        signature.v = if signature.v == 27 { 28 } else { 27 };
        assert_eq!(recover_signer(digest, &signature.to_vec()), None);
    }

    #[test]
    fn other_digest_recovers_other_address() {
        let wallet = wallet();
        let signature = wallet.sign_hash(H256::repeat_byte(1)).unwrap();
        let recovered = recover_signer(H256::repeat_byte(2), &signature.to_vec());
        assert_ne!(recovered, Some(wallet.address()));
    }
}
