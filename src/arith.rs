//! Modular arithmetic over big unsigned integers.

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};

use crate::error::Error;

/// Computes the inverse of `a` modulo `m` via the extended Euclidean
/// algorithm.
///
/// Fails with [`Error::NoInverse`] when `gcd(a, m) != 1`.
pub fn mod_inv(a: &BigUint, m: &BigUint) -> Result<BigUint, Error> {
    let mut r0 = BigInt::from(a % m);
    let mut r1 = BigInt::from(m.clone());
    let mut s0 = BigInt::one();
    let mut s1 = BigInt::zero();

    while !r1.is_zero() {
        let quotient = &r0 / &r1;
        let r2 = &r0 - &quotient * &r1;
        r0 = std::mem::replace(&mut r1, r2);
        let s2 = &s0 - &quotient * &s1;
        s0 = std::mem::replace(&mut s1, s2);
    }
    if !r0.is_one() {
        return Err(Error::NoInverse);
    }

    let modulus = BigInt::from(m.clone());
    let mut inverse = s0 % &modulus;
    if inverse.is_negative() {
        inverse += &modulus;
    }
    Ok(inverse
        .to_biguint()
        .expect("inverse is non-negative after normalization"))
}

/// Subtraction modulo `m`, defined for any `a, b < m`.
pub(crate) fn mod_sub(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    ((a + m) - b) % m
}

/// Computes a square root of `a` modulo an odd prime `p` via Tonelli–Shanks,
/// or `None` if `a` is a quadratic non-residue.
///
/// For `p = 2^255 - 19` (`p % 8 == 5`) this reduces to `a^((p + 3) / 8)`
/// followed by a sign correction by `2^((p - 1) / 4)`.
pub fn mod_sqrt(a: &BigUint, p: &BigUint) -> Option<BigUint> {
    let a = a % p;
    if a.is_zero() {
        return Some(BigUint::zero());
    }

    let one = BigUint::one();
    let two = BigUint::from(2_u32);
    let p_minus_1 = p - &one;

    // Euler's criterion.
    if a.modpow(&(&p_minus_1 / &two), p) != one {
        return None;
    }

    if p % 4_u32 == BigUint::from(3_u32) {
        return Some(a.modpow(&((p + &one) / 4_u32), p));
    }
    if p % 8_u32 == BigUint::from(5_u32) {
        let mut root = a.modpow(&((p + BigUint::from(3_u32)) / 8_u32), p);
        if (&root * &root) % p != a {
            let correction = two.modpow(&(&p_minus_1 / 4_u32), p);
            root = (root * correction) % p;
        }
        return Some(root);
    }

    // General case: write p - 1 = q * 2^s with q odd.
    let mut q = p_minus_1.clone();
    let mut s = 0_u64;
    while !q.bit(0) {
        q >>= 1_u32;
        s += 1;
    }

    // Any quadratic non-residue works as the seed.
    let mut z = two.clone();
    while z.modpow(&(&p_minus_1 / &two), p) == one {
        z += &one;
    }

    let mut m = s;
    let mut c = z.modpow(&q, p);
    let mut t = a.modpow(&q, p);
    let mut root = a.modpow(&((&q + &one) / &two), p);
    while !t.is_one() {
        let mut i = 0_u64;
        let mut probe = t.clone();
        while !probe.is_one() {
            probe = (&probe * &probe) % p;
            i += 1;
            if i == m {
                return None;
            }
        }
        let exponent = one.clone() << usize::try_from(m - i - 1).expect("exponent fits in usize");
        let b = c.modpow(&exponent, p);
        m = i;
        c = (&b * &b) % p;
        t = (t * &c) % p;
        root = (root * b) % p;
    }
    Some(root)
}

/// Encodes a non-negative integer as minimal-length big-endian bytes.
///
/// Zero encodes to a single zero byte. The canonical ballot encoding depends
/// on this exact convention.
pub fn int_to_bytes(n: &BigUint) -> Vec<u8> {
    n.to_bytes_be()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn inverse_of_small_values() {
        let m = BigUint::from(17_u32);
        for a in 1_u32..17 {
            let a = BigUint::from(a);
            let inv = mod_inv(&a, &m).unwrap();
            assert_eq!((&a * &inv) % &m, BigUint::one());
        }
    }

    #[test]
    fn inverse_fails_for_non_coprime_inputs() {
        let m = BigUint::from(12_u32);
        assert_matches!(mod_inv(&BigUint::from(4_u32), &m), Err(Error::NoInverse));
        assert_matches!(mod_inv(&BigUint::zero(), &m), Err(Error::NoInverse));
    }

    #[test]
    fn sqrt_on_3_mod_4_prime() {
        let p = BigUint::from(23_u32); // 23 % 4 == 3
        for a in 1_u32..23 {
            let square = BigUint::from(a * a) % &p;
            let root = mod_sqrt(&square, &p).unwrap();
            assert_eq!((&root * &root) % &p, square);
        }
    }

    #[test]
    fn sqrt_on_5_mod_8_prime() {
        let p = BigUint::from(13_u32); // 13 % 8 == 5
        for a in 1_u32..13 {
            let square = BigUint::from(a * a) % &p;
            let root = mod_sqrt(&square, &p).unwrap();
            assert_eq!((&root * &root) % &p, square);
        }
    }

    #[test]
    fn sqrt_on_1_mod_8_prime() {
        let p = BigUint::from(41_u32); // exercises the general Tonelli–Shanks loop
        for a in 1_u32..41 {
            let square = BigUint::from(a * a) % &p;
            let root = mod_sqrt(&square, &p).unwrap();
            assert_eq!((&root * &root) % &p, square);
        }
    }

    #[test]
    fn sqrt_of_non_residue_is_none() {
        let p = BigUint::from(23_u32);
        // 5 is a non-residue mod 23.
        assert!(mod_sqrt(&BigUint::from(5_u32), &p).is_none());
    }

    #[test]
    fn byte_encoding_is_minimal() {
        assert_eq!(int_to_bytes(&BigUint::zero()), [0]);
        assert_eq!(int_to_bytes(&BigUint::from(1_u32)), [1]);
        assert_eq!(int_to_bytes(&BigUint::from(255_u32)), [255]);
        assert_eq!(int_to_bytes(&BigUint::from(256_u32)), [1, 0]);
        assert_eq!(int_to_bytes(&BigUint::from(0x0102_03ff_u32)), [1, 2, 3, 255]);
    }
}
