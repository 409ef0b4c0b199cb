//! DSA over the MODP Group 24 subgroup.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

use super::{digest_int, NonceGenerator, Signature};
use crate::{
    arith,
    elgamal::{self, group},
    error::Error,
};

/// Generates a signing keypair over the same group as the finite-field
/// encryption back-end: `x` uniform in `[1, Q - 1]`, `Y = G^x mod P`.
pub fn gen_keys<R: CryptoRng + RngCore>(rng: &mut R) -> Result<(BigUint, BigUint), Error> {
    elgamal::validate_params()?;
    let group = group();
    let secret = rng.gen_biguint_range(&BigUint::one(), &group.q);
    let public = group.g.modpow(&secret, &group.p);
    Ok((secret, public))
}

/// Signs a message with a deterministic (RFC 6979) nonce.
///
/// Degenerate `r = 0` or `s = 0` candidates advance the nonce generator and
/// retry; they are not observable by the caller.
pub fn sign(message: &[u8], secret_key: &BigUint) -> Result<Signature, Error> {
    elgamal::validate_params()?;
    let group = group();
    if secret_key.is_zero() || *secret_key >= group.q {
        return Err(Error::InvalidKey);
    }

    let h = digest_int(message) % &group.q;
    let mut nonces = NonceGenerator::new(secret_key, message, &group.q);
    loop {
        let k = nonces.next()?;
        if let Some(signature) = sign_with_nonce(&h, secret_key, &k) {
            return Ok(signature);
        }
    }
}

/// One signing attempt with an explicit nonce; `None` on a degenerate
/// outcome.
pub(crate) fn sign_with_nonce(h: &BigUint, secret_key: &BigUint, k: &BigUint) -> Option<Signature> {
    let group = group();
    let r = group.g.modpow(k, &group.p) % &group.q;
    if r.is_zero() {
        return None;
    }
    let k_inv = arith::mod_inv(k, &group.q).ok()?;
    let s = (k_inv * ((h + secret_key * &r) % &group.q)) % &group.q;
    if s.is_zero() {
        return None;
    }
    Some(Signature { r, s })
}

/// Verifies a signature against the signer's public residue.
///
/// Returns `Ok(false)` for a well-formed but incorrect signature; malformed
/// inputs surface as [`Error::InvalidSignature`] or [`Error::InvalidKey`].
pub fn verify(message: &[u8], signature: &Signature, public_key: &BigUint) -> Result<bool, Error> {
    elgamal::validate_params()?;
    let group = group();

    let Signature { r, s } = signature;
    if r.is_zero() || *r >= group.q || s.is_zero() || *s >= group.q {
        return Err(Error::InvalidSignature);
    }
    if *public_key <= BigUint::one() || *public_key >= group.p {
        return Err(Error::InvalidKey);
    }

    let h = digest_int(message) % &group.q;
    let w = arith::mod_inv(s, &group.q).map_err(|_| Error::InvalidSignature)?;
    let u1 = (&h * &w) % &group.q;
    let u2 = (r * &w) % &group.q;
    let v = ((group.g.modpow(&u1, &group.p) * public_key.modpow(&u2, &group.p)) % &group.p)
        % &group.q;
    Ok(v == *r)
}
