//! Deterministic nonce derivation per RFC 6979.

use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// Upper bound on candidate nonces drawn from the HMAC-DRBG before giving up.
const MAX_ATTEMPTS: u64 = 1 << 32;

/// The RFC 6979 HMAC-DRBG, seeded from the private key and the message.
///
/// [`Self::next`] yields successive nonce candidates in `(0, q)`; pulling
/// another candidate after a degenerate signature continues the same
/// generator state, as §3.2.h of the RFC prescribes.
#[derive(Debug)]
pub(crate) struct NonceGenerator {
    key: Vec<u8>,
    v: Vec<u8>,
    q: BigUint,
    qlen: u64,
    attempts: u64,
}

impl NonceGenerator {
    pub fn new(secret_key: &BigUint, message: &[u8], q: &BigUint) -> Self {
        let qlen = q.bits();
        let rolen = ((qlen + 7) / 8) as usize;
        let h1 = Sha256::digest(message);
        let x_bytes = int2octets(secret_key, rolen);
        let h1_bytes = bits2octets(&h1, q, qlen, rolen);

        let mut v = vec![0x01_u8; 32];
        let mut key = vec![0x00_u8; 32];

        // K = HMAC_K(V || 0x00 || x || h1); V = HMAC_K(V); then the same
        // round with the 0x01 separator.
        for separator in [0x00_u8, 0x01] {
            key = hmac(&key, &[&v, &[separator][..], &x_bytes, &h1_bytes]);
            v = hmac(&key, &[&v]);
        }

        Self {
            key,
            v,
            q: q.clone(),
            qlen,
            attempts: 0,
        }
    }

    /// Draws the next nonce candidate in `(0, q)`.
    pub fn next(&mut self) -> Result<BigUint, Error> {
        loop {
            if self.attempts >= MAX_ATTEMPTS {
                return Err(Error::NonceExhaustion);
            }
            self.attempts += 1;

            let mut t = Vec::with_capacity(32);
            while (t.len() as u64) * 8 < self.qlen {
                self.v = hmac(&self.key, &[&self.v]);
                t.extend_from_slice(&self.v);
            }
            let candidate = bits2int(&t, self.qlen);

            // Step the generator regardless, so a rejected candidate is not
            // redrawn.
            self.key = hmac(&self.key, &[&self.v, &[0x00][..]]);
            self.v = hmac(&self.key, &[&self.v]);

            if !candidate.is_zero() && candidate < self.q {
                return Ok(candidate);
            }
        }
    }
}

fn hmac(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// Interprets `bytes` as a big-endian integer truncated to the leftmost
/// `qlen` bits.
fn bits2int(bytes: &[u8], qlen: u64) -> BigUint {
    let mut value = BigUint::from_bytes_be(bytes);
    let blen = (bytes.len() as u64) * 8;
    if blen > qlen {
        value >>= (blen - qlen) as usize;
    }
    value
}

/// `bits2octets` from RFC 6979 §2.3.4: truncate, reduce modulo `q`, then
/// left-pad to the byte length of `q`.
fn bits2octets(bytes: &[u8], q: &BigUint, qlen: u64, rolen: usize) -> Vec<u8> {
    let reduced = bits2int(bytes, qlen) % q;
    int2octets(&reduced, rolen)
}

/// Big-endian encoding left-padded to `rolen` bytes.
fn int2octets(value: &BigUint, rolen: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let mut padded = vec![0_u8; rolen.saturating_sub(bytes.len())];
    padded.extend_from_slice(&bytes);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    fn q() -> BigUint {
        crate::elgamal::group().q.clone()
    }

    #[test]
    fn nonces_are_deterministic() {
        let secret = BigUint::from(123_456_789_u64);
        let first = NonceGenerator::new(&secret, b"message", &q()).next().unwrap();
        let second = NonceGenerator::new(&secret, b"message", &q()).next().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nonces_depend_on_message_and_key() {
        let secret = BigUint::from(123_456_789_u64);
        let base = NonceGenerator::new(&secret, b"message", &q()).next().unwrap();

        let other_message = NonceGenerator::new(&secret, b"messagf", &q()).next().unwrap();
        assert_ne!(base, other_message);

        let other_secret = BigUint::from(123_456_790_u64);
        let other_key = NonceGenerator::new(&other_secret, b"message", &q())
            .next()
            .unwrap();
        assert_ne!(base, other_key);
    }

    #[test]
    fn successive_candidates_differ() {
        let secret = BigUint::from(42_u32);
        let mut generator = NonceGenerator::new(&secret, b"degenerate retry", &q());
        let first = generator.next().unwrap();
        let second = generator.next().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn candidates_are_in_range() {
        let secret = BigUint::from(7_u32);
        let order = q();
        let mut generator = NonceGenerator::new(&secret, b"range check", &order);
        for _ in 0..8 {
            let candidate = generator.next().unwrap();
            assert!(candidate >= BigUint::one());
            assert!(candidate < order);
        }
    }

    #[test]
    fn octet_helpers_pad_and_truncate() {
        let value = BigUint::from(0x01ff_u32);
        assert_eq!(int2octets(&value, 4), [0, 0, 1, 0xff]);

        // 16 bits truncated to 12 keeps the leftmost bits.
        let truncated = bits2int(&[0xab, 0xcd], 12);
        assert_eq!(truncated, BigUint::from(0xabc_u32));
    }
}
