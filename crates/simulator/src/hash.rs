//! Fake identifiers: transaction hashes, signatures and IPFS CIDs

use rand::Rng;

const CID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
const CID_PREFIX: &str = "bafybeif";
const CID_BODY_LEN: usize = 51;

/// Random `0x`-prefixed 32-byte hash, lowercase hex
pub fn generate_tx_hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 32] = rng.gen();
    format!("0x{}", hex::encode(bytes))
}

/// Random 65-byte wallet signature
pub fn generate_signature<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 65];
    rng.fill(&mut bytes[..]);
    format!("0x{}", hex::encode(bytes))
}

/// CIDv1-looking string; not derived from any content
pub fn generate_ipfs_cid<R: Rng + ?Sized>(rng: &mut R) -> String {
    let body: String = (0..CID_BODY_LEN)
        .map(|_| CID_ALPHABET[rng.gen_range(0..CID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", CID_PREFIX, body)
}
