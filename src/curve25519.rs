//! Affine Montgomery-form arithmetic on Curve25519.
//!
//! The curve is `v^2 = u^3 + A*u^2 + u` over `p = 2^255 - 19` with
//! `A = 486662`. Scalar multiplication runs the x-only Montgomery ladder and
//! then recovers the V coordinate from the ladder state, so all returned
//! points are exact affine points that can be fed back into
//! [`MontgomeryPoint::add`].

use num_bigint::BigUint;
use num_traits::{One, Zero};

use std::sync::OnceLock;

use crate::{
    arith::{self, mod_sub},
    error::Error,
};

/// Curve coefficient `A`.
pub const CURVE_A: u32 = 486_662;
/// `(A - 2) / 4`, the constant used by the ladder step.
const A24: u32 = 121_665;

/// The field prime `p = 2^255 - 19`.
pub fn field_prime() -> &'static BigUint {
    static PRIME: OnceLock<BigUint> = OnceLock::new();
    PRIME.get_or_init(|| (BigUint::one() << 255_usize) - BigUint::from(19_u32))
}

/// The order of the prime-order subgroup generated by the base point,
/// `2^252 + 27742317777372353535851937790883648493`.
pub fn group_order() -> &'static BigUint {
    static ORDER: OnceLock<BigUint> = OnceLock::new();
    ORDER.get_or_init(|| {
        (BigUint::one() << 252_usize)
            + BigUint::parse_bytes(b"27742317777372353535851937790883648493", 10)
                .expect("group order literal is well-formed")
    })
}

/// An affine point on Curve25519, or the neutral element encoded as `(1, 0)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MontgomeryPoint {
    pub u: BigUint,
    pub v: BigUint,
}

impl MontgomeryPoint {
    /// The neutral element of the group.
    ///
    /// `(1, 0)` is not a curve point; it is the conventional affine stand-in
    /// for the point at infinity used throughout the ballot encoding.
    pub fn neutral() -> Self {
        Self {
            u: BigUint::one(),
            v: BigUint::zero(),
        }
    }

    /// Creates a point from affine coordinates, rejecting off-curve inputs.
    pub fn new(u: BigUint, v: BigUint) -> Result<Self, Error> {
        let point = Self { u, v };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(Error::NotOnCurve)
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.u.is_one() && self.v.is_zero()
    }

    /// Tests the curve equation `v^2 == u^3 + A*u^2 + u (mod p)`.
    pub fn is_on_curve(&self) -> bool {
        let p = field_prime();
        let lhs = (&self.v * &self.v) % p;
        lhs == curve_rhs(&self.u)
    }

    /// An admissible group element: an on-curve point or the neutral element.
    pub(crate) fn is_valid(&self) -> bool {
        self.is_neutral() || self.is_on_curve()
    }

    /// Adds two points using the affine chord-and-tangent formulas.
    pub fn add(&self, other: &Self) -> Result<Self, Error> {
        if !self.is_valid() || !other.is_valid() {
            return Err(Error::NotOnCurve);
        }
        if self.is_neutral() {
            return Ok(other.clone());
        }
        if other.is_neutral() {
            return Ok(self.clone());
        }

        let p = field_prime();
        if self.u == other.u && (&self.v + &other.v) % p == BigUint::zero() {
            // P + (-P), including doubling a point of order two.
            return Ok(Self::neutral());
        }

        let a = BigUint::from(CURVE_A);
        let lambda = if self == other {
            // (3u^2 + 2Au + 1) / 2v
            let u_sq = (&self.u * &self.u) % p;
            let numerator = (BigUint::from(3_u32) * u_sq
                + BigUint::from(2_u32) * &a * &self.u
                + BigUint::one())
                % p;
            let denominator = (BigUint::from(2_u32) * &self.v) % p;
            (numerator * arith::mod_inv(&denominator, p)?) % p
        } else {
            // (v2 - v1) / (u2 - u1)
            let numerator = mod_sub(&other.v, &self.v, p);
            let denominator = mod_sub(&other.u, &self.u, p);
            (numerator * arith::mod_inv(&denominator, p)?) % p
        };

        let lambda_sq = (&lambda * &lambda) % p;
        let u3 = mod_sub(&mod_sub(&lambda_sq, &a, p), &((&self.u + &other.u) % p), p);
        let v3 = mod_sub(&((lambda * mod_sub(&self.u, &u3, p)) % p), &self.v, p);
        Ok(Self { u: u3, v: v3 })
    }

    /// Negation: `(u, -v mod p)`.
    pub fn negate(&self) -> Self {
        if self.v.is_zero() {
            return self.clone();
        }
        Self {
            u: self.u.clone(),
            v: field_prime() - &self.v,
        }
    }

    /// Scalar multiplication via the Montgomery ladder.
    ///
    /// The ladder tracks `(x(kP), x((k+1)P))` in projective form; the V
    /// coordinate of the result is recovered from that state using the
    /// Okeya–Sakurai formulas, so no square root (and no sign ambiguity) is
    /// involved.
    pub fn mul(&self, k: &BigUint) -> Result<Self, Error> {
        if !self.is_valid() {
            return Err(Error::NotOnCurve);
        }
        if self.is_neutral() || k.is_zero() {
            return Ok(Self::neutral());
        }
        if self.v.is_zero() {
            // A point of order two: kP alternates between P and the neutral.
            return Ok(if k.bit(0) {
                self.clone()
            } else {
                Self::neutral()
            });
        }

        let p = field_prime();
        let x1 = &self.u;
        let mut x2 = BigUint::one();
        let mut z2 = BigUint::zero();
        let mut x3 = x1.clone();
        let mut z3 = BigUint::one();

        for i in (0..k.bits()).rev() {
            if k.bit(i) {
                let (sum_x, sum_z) = ladder_diff_add(&x2, &z2, &x3, &z3, x1, p);
                let (dbl_x, dbl_z) = ladder_double(&x3, &z3, p);
                x2 = sum_x;
                z2 = sum_z;
                x3 = dbl_x;
                z3 = dbl_z;
            } else {
                let (sum_x, sum_z) = ladder_diff_add(&x2, &z2, &x3, &z3, x1, p);
                let (dbl_x, dbl_z) = ladder_double(&x2, &z2, p);
                x2 = dbl_x;
                z2 = dbl_z;
                x3 = sum_x;
                z3 = sum_z;
            }
        }

        if z2.is_zero() {
            return Ok(Self::neutral());
        }
        if z3.is_zero() {
            // (k + 1)P is the neutral, so kP = -P.
            return Ok(self.negate());
        }
        Ok(self.recover_v(&x2, &z2, &x3, &z3))
    }

    /// Okeya–Sakurai V-coordinate recovery for `Q = kP` given the affine `P`
    /// and the ladder outputs `x(Q) = X2/Z2`, `x(Q + P) = X3/Z3`.
    fn recover_v(&self, x2: &BigUint, z2: &BigUint, x3: &BigUint, z3: &BigUint) -> Self {
        let p = field_prime();
        let two_a = BigUint::from(2 * CURVE_A);

        let t1 = (&self.u * z2) % p;
        let mut t2 = (x2 + &t1) % p;
        let mut t3 = mod_sub(x2, &t1, p);
        t3 = (&t3 * &t3) % p;
        t3 = (&t3 * x3) % p;
        let mut t1 = (&two_a * z2) % p;
        t2 = (&t2 + &t1) % p;
        let mut t4 = (&self.u * x2) % p;
        t4 = (&t4 + z2) % p;
        t2 = (&t2 * &t4) % p;
        t1 = (&t1 * z2) % p;
        t2 = mod_sub(&t2, &t1, p);
        t2 = (&t2 * z3) % p;
        let v_num = mod_sub(&t2, &t3, p);
        let mut t1 = (BigUint::from(2_u32) * &self.v) % p;
        t1 = (&t1 * z2) % p;
        t1 = (&t1 * z3) % p;
        let u_num = (&t1 * x2) % p;
        let denom = (&t1 * z2) % p;

        let denom_inv =
            arith::mod_inv(&denom, p).expect("ladder denominator is invertible for curve points");
        Self {
            u: (u_num * &denom_inv) % p,
            v: (v_num * &denom_inv) % p,
        }
    }
}

/// The base point `(9, V)` of the prime-order subgroup.
pub fn base_point() -> &'static MontgomeryPoint {
    static BASE: OnceLock<MontgomeryPoint> = OnceLock::new();
    BASE.get_or_init(|| {
        let u = BigUint::from(9_u32);
        let v = compute_v(&u).expect("the base U coordinate lies on the curve");
        MontgomeryPoint { u, v }
    })
}

/// Right-hand side of the curve equation, `u^3 + A*u^2 + u (mod p)`.
fn curve_rhs(u: &BigUint) -> BigUint {
    let p = field_prime();
    let u_sq = (u * u) % p;
    (&u_sq * u + BigUint::from(CURVE_A) * u_sq + u) % p
}

/// Recovers the canonical V coordinate for a given U: the smaller of the two
/// square roots of `u^3 + A*u^2 + u`.
///
/// Fails with [`Error::NotOnCurve`] when no curve point has this U
/// coordinate.
pub fn compute_v(u: &BigUint) -> Result<BigUint, Error> {
    let p = field_prime();
    let root = arith::mod_sqrt(&curve_rhs(u), p).ok_or(Error::NotOnCurve)?;
    if root.is_zero() {
        return Ok(root);
    }
    let mirrored = p - &root;
    Ok(root.min(mirrored))
}

/// RFC 7748 ladder doubling step on a projective x-coordinate.
fn ladder_double(x: &BigUint, z: &BigUint, p: &BigUint) -> (BigUint, BigUint) {
    let a = (x + z) % p;
    let aa = (&a * &a) % p;
    let b = mod_sub(x, z, p);
    let bb = (&b * &b) % p;
    let e = mod_sub(&aa, &bb, p);
    let out_x = (&aa * &bb) % p;
    let out_z = (&e * ((aa + BigUint::from(A24) * &e) % p)) % p;
    (out_x, out_z)
}

/// RFC 7748 differential addition: `x(m P) + x((m+1) P)` with known
/// difference `x1 = x(P)`.
fn ladder_diff_add(
    x2: &BigUint,
    z2: &BigUint,
    x3: &BigUint,
    z3: &BigUint,
    x1: &BigUint,
    p: &BigUint,
) -> (BigUint, BigUint) {
    let a = (x2 + z2) % p;
    let b = mod_sub(x2, z2, p);
    let c = (x3 + z3) % p;
    let d = mod_sub(x3, z3, p);
    let da = (&d * &a) % p;
    let cb = (&c * &b) % p;
    let sum = (&da + &cb) % p;
    let diff = mod_sub(&da, &cb, p);
    let out_x = (&sum * &sum) % p;
    let out_z = (x1 * ((&diff * &diff) % p)) % p;
    (out_x, out_z)
}
