// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., S_K7NP3X for sellers)

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Seller account (S_)
    Seller,
    /// Back-office administrator (ADM_)
    Admin,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Seller => "S",
            EntityPrefix::Admin => "ADM",
        }
    }
}

fn encode_crockford(mut value: u64, length: usize) -> String {
    let mut out = vec![b'0'; length];
    for slot in out.iter_mut().rev() {
        *slot = CROCKFORD_ALPHABET[(value % 32) as usize];
        value /= 32;
    }
    String::from_utf8(out).unwrap_or_default()
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CROCKFORD_ALPHABET[rng.gen_range(0..32)] as char)
        .collect()
}

/// Generate a prefixed random ID ("S_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

/// Derive a stable prefixed ID from a seed.
///
/// Admin accounts come from configuration, so their IDs must survive restarts.
/// Uses 64-bit FNV-1a, which is stable across builds.
pub fn derive_id(prefix: EntityPrefix, seed: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = seed
        .bytes()
        .fold(FNV_OFFSET, |acc, b| (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME));
    format!("{}_{}", prefix.as_str(), encode_crockford(hash, 10))
}

/// Generate a Seller ID (S_XXXXXX)
pub fn generate_seller_id() -> String {
    generate_id(EntityPrefix::Seller)
}
