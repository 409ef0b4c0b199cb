//! Exponential ElGamal over the RFC 5114 MODP Group 24 subgroup.
//!
//! Encryption of a bit `m` produces `(G^k, G^m * Y^k) mod P`; multiplying two
//! ciphertexts component-wise therefore encrypts the sum of the plaintexts,
//! which is what the tally relies on. Decryption recovers `G^m` and then
//! looks the exponent up in a cached table bounded by [`MAX_TALLY`].
//!
//! [`MAX_TALLY`]: crate::MAX_TALLY

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

use std::{collections::HashMap, sync::OnceLock};

use crate::{arith, error::Error, MAX_TALLY};

/// Prime modulus P of MODP Group 24 (RFC 5114).
const MODP_P: &[u8] = b"87A8E61DB4B6663CFFBBD19C651959998CEEF608660DD0F25D2CEED4435E3B00\
E00DF8F1D61957D4FAF7DF4561B2AA3016C3D91134096FAA3BF4296D830E9A7C\
209E0C6497517ABD5A8A9D306BCF67ED91F9E6725B4758C022E0B1EF4275BF7B\
6C5BFC11D45F9088B941F54EB1E59BB8BC39A0BF12307F5C4FDB70C581B23F76\
B63ACAE1CAA6B7902D52526735488A0EF13C6D9A51BFA4AB3AD8347796524D8E\
F6A167B5A41825D967E144E5140564251CCACB83E6B486F6B3CA3F7971506026\
C0B857F689962856DED4010ABD0BE621C3A3960A54E710C375F26375D7014103\
A4B54330C198AF126116D2276E11715F693877FAD7EF09CADB094AE91E1A1597";

/// Order Q of the prime-order subgroup.
const MODP_Q: &[u8] = b"8CF83642A709A097B447997640129DA299B1A47D1EB3750BA308B0FE64F5FBD3";

/// Generator G of the subgroup of order Q.
const MODP_G: &[u8] = b"3FB32C9B73134D0B2E77506660EDBD484CA7B18F21EF205407F4793A1A0BA125\
10DBC15077BE463FFF4FED4AAC0BB555BE3A6C1B0C6B47B1BC3773BF7E8C6F62\
901228F8C28CBB18A55AE31341000A650196F931C77A57F2DDF463E5E9EC144B\
777DE62AAAB8A8628AC376D282D6ED3864E67982428EBC831D14348F6F2F9193\
B5045AF2767164E1DFC967C1FB3F2E55A4BD1BFFE83B9C80D052B985D182EA0A\
DB2A3B7313D3FE14C8484B1E052588B9B7D2BBD2DF016199ECD06E1557CD0915\
B3353BBB64E0EC377FD028370DF92B52C7891428CDC67EB6184B523D1DB246C3\
2F63078490F00EF8D647D148D47954515E2327CFEF98C582664B4C0F6CC41659";

/// The MODP group parameters shared by the ElGamal and DSA back-ends.
#[derive(Debug)]
pub(crate) struct ModpGroup {
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
}

pub(crate) fn group() -> &'static ModpGroup {
    static GROUP: OnceLock<ModpGroup> = OnceLock::new();
    GROUP.get_or_init(|| ModpGroup {
        p: BigUint::parse_bytes(MODP_P, 16).expect("MODP prime literal is well-formed"),
        q: BigUint::parse_bytes(MODP_Q, 16).expect("MODP order literal is well-formed"),
        g: BigUint::parse_bytes(MODP_G, 16).expect("MODP generator literal is well-formed"),
    })
}

/// Checks that the compiled-in group parameters are coherent:
/// `1 < G < P` and `G^Q == 1 (mod P)`.
///
/// The check runs once; subsequent calls return the cached outcome.
pub fn validate_params() -> Result<(), Error> {
    static OUTCOME: OnceLock<bool> = OnceLock::new();
    let valid = *OUTCOME.get_or_init(|| {
        let group = group();
        let two = BigUint::from(2_u32);
        group.p >= two
            && group.q >= two
            && group.g > BigUint::one()
            && group.g < group.p
            && group.g.modpow(&group.q, &group.p).is_one()
    });
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidParameters)
    }
}

/// Generates a keypair: a secret scalar `x` uniform in `[1, Q - 1]` and the
/// public residue `Y = G^x mod P`.
pub fn gen_keys<R: CryptoRng + RngCore>(rng: &mut R) -> Result<(BigUint, BigUint), Error> {
    validate_params()?;
    let group = group();
    let secret = rng.gen_biguint_range(&BigUint::one(), &group.q);
    let public = group.g.modpow(&secret, &group.p);
    Ok((secret, public))
}

/// Encrypts a bit in exponential form: `(G^k, G^m * Y^k) mod P`.
pub fn encrypt_bit<R: CryptoRng + RngCore>(
    bit: u8,
    public_key: &BigUint,
    rng: &mut R,
) -> Result<(BigUint, BigUint), Error> {
    if bit > 1 {
        return Err(Error::BadVote);
    }
    validate_params()?;
    let group = group();

    let encoded = group.g.modpow(&BigUint::from(bit), &group.p);
    let k = rng.gen_biguint_range(&BigUint::one(), &group.q);
    let c1 = group.g.modpow(&k, &group.p);
    let c2 = (encoded * public_key.modpow(&k, &group.p)) % &group.p;
    Ok((c1, c2))
}

/// Encrypts an arbitrary residue `m` in `(0, P)` in multiplicative form:
/// `(G^k, m * Y^k) mod P`.
pub fn encrypt_residue<R: CryptoRng + RngCore>(
    message: &BigUint,
    public_key: &BigUint,
    rng: &mut R,
) -> Result<(BigUint, BigUint), Error> {
    validate_params()?;
    let group = group();
    if message.is_zero() || *message >= group.p {
        return Err(Error::BadVote);
    }

    let k = rng.gen_biguint_range(&BigUint::one(), &group.q);
    let c1 = group.g.modpow(&k, &group.p);
    let c2 = (message * public_key.modpow(&k, &group.p)) % &group.p;
    Ok((c1, c2))
}

/// Decrypts an exponential-form ciphertext to the small exponent `m` with
/// `G^m == C2 * (C1^x)^-1`, searching no further than [`MAX_TALLY`].
///
/// [`MAX_TALLY`]: crate::MAX_TALLY
pub fn decrypt_exp(secret_key: &BigUint, c1: &BigUint, c2: &BigUint) -> Result<u64, Error> {
    decrypt_exp_bounded(secret_key, c1, c2, MAX_TALLY)
}

/// [`decrypt_exp`] with an explicit decoding bound (`bound <= MAX_TALLY`).
pub fn decrypt_exp_bounded(
    secret_key: &BigUint,
    c1: &BigUint,
    c2: &BigUint,
    bound: u64,
) -> Result<u64, Error> {
    let message = decrypt_mult(secret_key, c1, c2)?;
    match exp_table().get(&message) {
        Some(&exponent) if exponent <= bound.min(MAX_TALLY) => Ok(exponent),
        _ => Err(Error::DecodeFailure),
    }
}

/// Decrypts a multiplicative-form ciphertext: `C2 * (C1^x)^-1 mod P`.
pub fn decrypt_mult(secret_key: &BigUint, c1: &BigUint, c2: &BigUint) -> Result<BigUint, Error> {
    validate_params()?;
    let group = group();
    if secret_key.is_zero() || *secret_key >= group.q {
        return Err(Error::InvalidKey);
    }

    let shared = c1.modpow(secret_key, &group.p);
    let shared_inv = arith::mod_inv(&shared, &group.p)?;
    Ok((c2 * shared_inv) % &group.p)
}

/// Component-wise product of two ciphertexts; encrypts the sum of the
/// underlying exponents.
pub fn combine(a: &(BigUint, BigUint), b: &(BigUint, BigUint)) -> (BigUint, BigUint) {
    let p = &group().p;
    ((&a.0 * &b.0) % p, (&a.1 * &b.1) % p)
}

/// Cached table mapping `G^i mod P` to `i` for `i = 0..=MAX_TALLY`.
fn exp_table() -> &'static HashMap<BigUint, u64> {
    static TABLE: OnceLock<HashMap<BigUint, u64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let group = group();
        let mut table = HashMap::with_capacity(MAX_TALLY as usize + 1);
        let mut power = BigUint::one();
        for exponent in 0..=MAX_TALLY {
            table.insert(power.clone(), exponent);
            power = (power * &group.g) % &group.p;
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
    fn params_pass_self_check() {
        validate_params().unwrap();
    }

    #[test]
    fn bit_round_trip() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        for bit in [0_u8, 1] {
            let (c1, c2) = encrypt_bit(bit, &public, &mut OsRng).unwrap();
            assert_eq!(decrypt_exp(&secret, &c1, &c2).unwrap(), u64::from(bit));
        }
    }

    #[test]
    fn rejects_non_bit_messages() {
        let (_, public) = gen_keys(&mut OsRng).unwrap();
        assert_matches!(encrypt_bit(2, &public, &mut OsRng), Err(Error::BadVote));
    }

    #[test]
    fn ciphertext_products_encrypt_sums() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let bits = [1_u8, 0, 1, 1, 0];

        let mut product = encrypt_bit(bits[0], &public, &mut OsRng).unwrap();
        for &bit in &bits[1..] {
            let ciphertext = encrypt_bit(bit, &public, &mut OsRng).unwrap();
            product = combine(&product, &ciphertext);
        }

        let expected: u64 = bits.iter().map(|&bit| u64::from(bit)).sum();
        assert_eq!(
            decrypt_exp(&secret, &product.0, &product.1).unwrap(),
            expected
        );
    }

    #[test]
    fn multiplicative_round_trip() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let message = BigUint::parse_bytes(
            b"2661b673f687c5c3142f806d500d2ce57b1182c9b25bfe4fa09529424b",
            16,
        )
        .unwrap();

        let (c1, c2) = encrypt_residue(&message, &public, &mut OsRng).unwrap();
        assert_eq!(decrypt_mult(&secret, &c1, &c2).unwrap(), message);
    }

    #[test]
    fn multiplicative_products_encrypt_products() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let m1 = BigUint::parse_bytes(
            b"2661b673f687c5c3142f806d500d2ce57b1182c9b25bfe4fa09529424b",
            16,
        )
        .unwrap();
        let m2 = BigUint::parse_bytes(b"1c1c871caabca15828cf08ee3aa3199000b94ed15e743c3", 16).unwrap();

        let (r1, c1) = encrypt_residue(&m1, &public, &mut OsRng).unwrap();
        let (r2, c2) = encrypt_residue(&m2, &public, &mut OsRng).unwrap();
        let product = combine(&(r1, c1), &(r2, c2));

        let expected = (&m1 * &m2) % &group().p;
        assert_eq!(
            decrypt_mult(&secret, &product.0, &product.1).unwrap(),
            expected
        );
    }

    #[test]
    fn decoding_beyond_the_bound_fails() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let mut sum = encrypt_bit(1, &public, &mut OsRng).unwrap();
        for _ in 0..4 {
            let one = encrypt_bit(1, &public, &mut OsRng).unwrap();
            sum = combine(&sum, &one);
        }

        // The sum of five ones cannot be decoded with a bound of 3.
        assert_matches!(
            decrypt_exp_bounded(&secret, &sum.0, &sum.1, 3),
            Err(Error::DecodeFailure)
        );
        assert_eq!(decrypt_exp(&secret, &sum.0, &sum.1).unwrap(), 5);
    }

    #[test]
    fn rejects_out_of_range_secret_keys() {
        let (_, public) = gen_keys(&mut OsRng).unwrap();
        let (c1, c2) = encrypt_bit(1, &public, &mut OsRng).unwrap();
        assert_matches!(
            decrypt_mult(&BigUint::zero(), &c1, &c2),
            Err(Error::InvalidKey)
        );
        assert_matches!(
            decrypt_exp(&group().q, &c1, &c2),
            Err(Error::InvalidKey)
        );
    }
}
