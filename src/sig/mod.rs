//! Signature back-ends used to authenticate ballots.
//!
//! Both schemes hash the canonical ballot bytes with SHA-256 and derive the
//! per-signature nonce deterministically (RFC 6979), so signing the same
//! message with the same key always yields the same signature.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

pub mod dsa;
pub mod ecdsa;
mod nonce;

pub(crate) use self::nonce::NonceGenerator;

/// An `(r, s)` signature; both components lie in `(0, order)` of the
/// respective group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub r: BigUint,
    pub s: BigUint,
}

/// SHA-256 of the message, reinterpreted as a big-endian integer.
///
/// Callers reduce the result modulo the group order where their equations
/// require it.
pub(crate) fn digest_int(message: &[u8]) -> BigUint {
    BigUint::from_bytes_be(&Sha256::digest(message))
}
