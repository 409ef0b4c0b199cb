//! EC-ElGamal over Curve25519, additively homomorphic by construction.
//!
//! A bit is encoded as a point (`0` maps to the neutral element, `1` to the
//! base point), so component-wise point addition of two ciphertexts encrypts
//! the sum of the encoded bits. Decryption subtracts the shared secret and
//! recognizes the plaintext point against a cached multiples-of-G table.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

use std::{collections::HashMap, sync::OnceLock};

use crate::{
    curve25519::{base_point, group_order, MontgomeryPoint},
    error::Error,
    MAX_TALLY,
};

/// Generates a keypair: a secret scalar uniform in `[1, ORDER - 1]` and the
/// public point `Y = x * G`.
pub fn gen_keys<R: CryptoRng + RngCore>(
    rng: &mut R,
) -> Result<(BigUint, MontgomeryPoint), Error> {
    let secret = rng.gen_biguint_range(&BigUint::one(), group_order());
    let public = base_point().mul(&secret)?;
    if !public.is_on_curve() {
        return Err(Error::InvalidKey);
    }
    Ok((secret, public))
}

/// Encrypts a bit: `C1 = k * G`, `C2 = M + k * Y` with `M` the point encoding
/// of the bit.
pub fn encrypt_bit<R: CryptoRng + RngCore>(
    bit: u8,
    public_key: &MontgomeryPoint,
    rng: &mut R,
) -> Result<(MontgomeryPoint, MontgomeryPoint), Error> {
    let encoded = encode_bit(bit)?;
    if !public_key.is_on_curve() {
        return Err(Error::InvalidKey);
    }

    let k = rng.gen_biguint_range(&BigUint::one(), group_order());
    let c1 = base_point().mul(&k)?;
    let shared = public_key.mul(&k)?;
    let c2 = encoded.add(&shared)?;
    Ok((c1, c2))
}

/// Encodes a bit as a group element: the neutral element for `0`, the base
/// point for `1`.
pub fn encode_bit(bit: u8) -> Result<MontgomeryPoint, Error> {
    match bit {
        0 => Ok(MontgomeryPoint::neutral()),
        1 => Ok(base_point().clone()),
        _ => Err(Error::BadVote),
    }
}

/// Decrypts a ciphertext to the small non-negative integer `m` with
/// `m * G == C2 - x * C1`, searching no further than [`MAX_TALLY`].
///
/// [`MAX_TALLY`]: crate::MAX_TALLY
pub fn decrypt(
    secret_key: &BigUint,
    c1: &MontgomeryPoint,
    c2: &MontgomeryPoint,
) -> Result<u64, Error> {
    decrypt_bounded(secret_key, c1, c2, MAX_TALLY)
}

/// [`decrypt`] with an explicit decoding bound (`bound <= MAX_TALLY`).
pub fn decrypt_bounded(
    secret_key: &BigUint,
    c1: &MontgomeryPoint,
    c2: &MontgomeryPoint,
    bound: u64,
) -> Result<u64, Error> {
    if secret_key.is_zero() || secret_key >= group_order() {
        return Err(Error::InvalidKey);
    }

    let shared = c1.mul(secret_key)?;
    let message = c2.add(&shared.negate())?;
    match multiples_table().get(&message) {
        Some(&multiple) if multiple <= bound.min(MAX_TALLY) => Ok(multiple),
        _ => Err(Error::DecodeFailure),
    }
}

/// Component-wise sum of two ciphertexts; encrypts the sum of the underlying
/// bits.
pub fn combine(
    a: &(MontgomeryPoint, MontgomeryPoint),
    b: &(MontgomeryPoint, MontgomeryPoint),
) -> Result<(MontgomeryPoint, MontgomeryPoint), Error> {
    Ok((a.0.add(&b.0)?, a.1.add(&b.1)?))
}

/// Cached table mapping `i * G` to `i` for `i = 0..=MAX_TALLY`.
fn multiples_table() -> &'static HashMap<MontgomeryPoint, u64> {
    static TABLE: OnceLock<HashMap<MontgomeryPoint, u64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::with_capacity(MAX_TALLY as usize + 1);
        let mut current = MontgomeryPoint::neutral();
        for multiple in 0..=MAX_TALLY {
            table.insert(current.clone(), multiple);
            current = current
                .add(base_point())
                .expect("multiples of the base point stay on the curve");
        }
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use num_traits::Zero;
    use rand::rngs::OsRng;

    #[test]
    fn generated_public_keys_are_on_curve() {
        let (_, public) = gen_keys(&mut OsRng).unwrap();
        assert!(public.is_on_curve());
    }

    #[test]
    fn bit_round_trip() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        for bit in [0_u8, 1] {
            let (c1, c2) = encrypt_bit(bit, &public, &mut OsRng).unwrap();
            assert_eq!(decrypt(&secret, &c1, &c2).unwrap(), u64::from(bit));
        }
    }

    #[test]
    fn rejects_non_bit_messages() {
        let (_, public) = gen_keys(&mut OsRng).unwrap();
        assert_matches!(encrypt_bit(2, &public, &mut OsRng), Err(Error::BadVote));
    }

    #[test]
    fn ciphertext_sums_encrypt_sums() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let bits = [1_u8, 0, 1, 1, 0];

        let mut sum = encrypt_bit(bits[0], &public, &mut OsRng).unwrap();
        for &bit in &bits[1..] {
            let ciphertext = encrypt_bit(bit, &public, &mut OsRng).unwrap();
            sum = combine(&sum, &ciphertext).unwrap();
        }

        let expected: u64 = bits.iter().map(|&bit| u64::from(bit)).sum();
        assert_eq!(decrypt(&secret, &sum.0, &sum.1).unwrap(), expected);
    }

    #[test]
    fn decoding_beyond_the_bound_fails() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let mut sum = encrypt_bit(1, &public, &mut OsRng).unwrap();
        for _ in 0..4 {
            let one = encrypt_bit(1, &public, &mut OsRng).unwrap();
            sum = combine(&sum, &one).unwrap();
        }

        assert_matches!(
            decrypt_bounded(&secret, &sum.0, &sum.1, 3),
            Err(Error::DecodeFailure)
        );
        assert_eq!(decrypt(&secret, &sum.0, &sum.1).unwrap(), 5);
    }

    #[test]
    fn rejects_out_of_range_secret_keys() {
        let (_, public) = gen_keys(&mut OsRng).unwrap();
        let (c1, c2) = encrypt_bit(0, &public, &mut OsRng).unwrap();
        assert_matches!(
            decrypt(&BigUint::zero(), &c1, &c2),
            Err(Error::InvalidKey)
        );
        assert_matches!(
            decrypt(group_order(), &c1, &c2),
            Err(Error::InvalidKey)
        );
    }
}
