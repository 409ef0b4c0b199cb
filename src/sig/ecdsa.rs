//! ECDSA over Curve25519 in Montgomery form.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

use super::{digest_int, NonceGenerator, Signature};
use crate::{
    arith,
    curve25519::{base_point, group_order, MontgomeryPoint},
    error::Error,
};

/// Generates a signing keypair: `x` uniform in `[1, ORDER - 1]`,
/// `Y = x * G`.
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

/// Signs a message with a deterministic (RFC 6979) nonce.
pub fn sign(message: &[u8], secret_key: &BigUint) -> Result<Signature, Error> {
    let order = group_order();
    if secret_key.is_zero() || secret_key >= order {
        return Err(Error::InvalidKey);
    }

    let h = digest_int(message) % order;
    let mut nonces = NonceGenerator::new(secret_key, message, order);
    loop {
        let k = nonces.next()?;
        if let Some(signature) = sign_with_nonce(&h, secret_key, &k)? {
            return Ok(signature);
        }
    }
}

/// One signing attempt with an explicit nonce; `Ok(None)` on a degenerate
/// outcome.
pub(crate) fn sign_with_nonce(
    h: &BigUint,
    secret_key: &BigUint,
    k: &BigUint,
) -> Result<Option<Signature>, Error> {
    let order = group_order();
    let kg = base_point().mul(k)?;
    if kg.is_neutral() {
        return Ok(None);
    }
    let r = &kg.u % order;
    if r.is_zero() {
        return Ok(None);
    }

    let Ok(k_inv) = arith::mod_inv(k, order) else {
        return Ok(None);
    };
    let s = (k_inv * ((h + secret_key * &r) % order)) % order;
    if s.is_zero() {
        return Ok(None);
    }
    Ok(Some(Signature { r, s }))
}

/// Verifies a signature against the signer's public point.
pub fn verify(
    message: &[u8],
    signature: &Signature,
    public_key: &MontgomeryPoint,
) -> Result<bool, Error> {
    let order = group_order();

    let Signature { r, s } = signature;
    if r.is_zero() || r >= order || s.is_zero() || s >= order {
        return Err(Error::InvalidSignature);
    }
    if !public_key.is_on_curve() {
        return Err(Error::InvalidKey);
    }

    let h = digest_int(message) % order;
    let w = arith::mod_inv(s, order).map_err(|_| Error::InvalidSignature)?;
    let u1 = (&h * &w) % order;
    let u2 = (r * &w) % order;

    let point = base_point().mul(&u1)?.add(&public_key.mul(&u2)?)?;
    if point.is_neutral() {
        return Ok(false);
    }
    Ok(&point.u % order == *r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::OsRng;

    const MESSAGE: &[u8] = b"A very very important message !";

    fn reference_secret() -> BigUint {
        BigUint::parse_bytes(
            b"c841f4896fe86c971bedbcf114a6cfd97e4454c9be9aba876d5a195995e2ba8",
            16,
        )
        .unwrap()
    }

    #[test]
    fn known_nonce_produces_expected_signature() {
        let k = BigUint::parse_bytes(
            b"2c92639dcf417afeae31e0f8fddc8e48b3e11d840523f54aaa97174221faee6",
            16,
        )
        .unwrap();
        let expected_r = BigUint::parse_bytes(
            b"429146a1375614034c65c2b6a86b2fc4aec00147f223cb2a7a22272d4a3fdd2",
            16,
        )
        .unwrap();
        let expected_s = BigUint::parse_bytes(
            b"f23bcdebe2e0d8571d195a9b8a05364b14944032032eeeecd22a0f6e94f8f33",
            16,
        )
        .unwrap();

        let secret = reference_secret();
        let h = digest_int(MESSAGE) % group_order();
        let signature = sign_with_nonce(&h, &secret, &k).unwrap().unwrap();
        assert_eq!(signature.r, expected_r);
        assert_eq!(signature.s, expected_s);

        let public = base_point().mul(&secret).unwrap();
        assert!(verify(MESSAGE, &signature, &public).unwrap());
    }

    #[test]
    fn reference_key_signature_verifies() {
        let secret = reference_secret();
        let public = base_point().mul(&secret).unwrap();
        let signature = sign(MESSAGE, &secret).unwrap();
        assert!(verify(MESSAGE, &signature, &public).unwrap());
    }

    #[test]
    fn signing_is_deterministic() {
        let secret = reference_secret();
        assert_eq!(sign(MESSAGE, &secret).unwrap(), sign(MESSAGE, &secret).unwrap());
    }

    #[test]
    fn generated_keys_sign_and_verify() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let signature = sign(b"ballot bytes", &secret).unwrap();
        assert!(verify(b"ballot bytes", &signature, &public).unwrap());
        assert!(!verify(b"other bytes", &signature, &public).unwrap());
    }

    #[test]
    fn mutated_signatures_are_rejected() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let signature = sign(b"ballot bytes", &secret).unwrap();

        let mut mangled = signature;
        mangled.s = if &mangled.s + BigUint::one() < *group_order() {
            &mangled.s + BigUint::one()
        } else {
            &mangled.s - BigUint::one()
        };
        assert!(!verify(b"ballot bytes", &mangled, &public).unwrap());
    }

    #[test]
    fn out_of_range_components_are_errors() {
        let (secret, public) = gen_keys(&mut OsRng).unwrap();
        let signature = sign(b"ballot bytes", &secret).unwrap();

        let zero_s = Signature {
            r: signature.r.clone(),
            s: BigUint::zero(),
        };
        assert_matches!(
            verify(b"ballot bytes", &zero_s, &public),
            Err(Error::InvalidSignature)
        );

        let off_curve = MontgomeryPoint {
            u: BigUint::from(2_u32),
            v: BigUint::from(1_u32),
        };
        assert_matches!(
            verify(b"ballot bytes", &signature, &off_curve),
            Err(Error::InvalidKey)
        );
    }
}
