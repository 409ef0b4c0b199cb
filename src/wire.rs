//! Serde helpers for the storage-boundary encoding.
//!
//! The external ballot store consumes decimal-string ciphertext components,
//! hex signature components without a `0x` prefix, and `"ec,…"` / `"eg,…"`
//! prefixed keys. The helpers here keep that format stable and validate group
//! membership on the way in.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    ballot::{Ciphertext, GroupElement},
    curve25519::MontgomeryPoint,
    elgamal,
    error::Error,
};

pub(crate) fn encode_group_element(element: &GroupElement) -> String {
    match element {
        GroupElement::Modp(y) => format!("eg,{}", y.to_str_radix(16)),
        GroupElement::Curve(point) => format!(
            "ec,{},{}",
            point.u.to_str_radix(16),
            point.v.to_str_radix(16)
        ),
    }
}

pub(crate) fn decode_group_element(encoded: &str) -> Result<GroupElement, Error> {
    let parts: Vec<_> = encoded.split(',').collect();
    match parts.as_slice() {
        ["eg", y] => {
            let y = parse_hex(y)?;
            if y <= BigUint::one() || y >= elgamal::group().p {
                return Err(Error::InvalidKey);
            }
            Ok(GroupElement::Modp(y))
        }
        ["ec", u, v] => {
            let point = MontgomeryPoint::new(parse_hex(u)?, parse_hex(v)?)
                .map_err(|_| Error::InvalidKey)?;
            if point.is_neutral() {
                return Err(Error::InvalidKey);
            }
            Ok(GroupElement::Curve(point))
        }
        _ => Err(Error::InvalidKey),
    }
}

pub(crate) fn parse_hex(digits: &str) -> Result<BigUint, Error> {
    BigUint::parse_bytes(digits.as_bytes(), 16).ok_or(Error::InvalidKey)
}

fn parse_decimal<E: serde::de::Error>(digits: &str) -> Result<BigUint, E> {
    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| E::custom(format!("invalid decimal integer: {digits:?}")))
}

/// Ciphertext vectors as nested arrays of decimal strings:
/// `[c1, c2]` per slot for the MODP back-end, `[[u1, v1], [u2, v2]]` for the
/// curve back-end.
pub(crate) mod ciphertexts {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum CiphertextRepr {
        Modp([String; 2]),
        Curve([[String; 2]; 2]),
    }

    pub fn serialize<S: Serializer>(
        slots: &[Ciphertext],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let reprs: Vec<_> = slots
            .iter()
            .map(|ciphertext| match ciphertext {
                Ciphertext::Modp { c1, c2 } => {
                    CiphertextRepr::Modp([c1.to_string(), c2.to_string()])
                }
                Ciphertext::Curve { c1, c2 } => CiphertextRepr::Curve([
                    [c1.u.to_string(), c1.v.to_string()],
                    [c2.u.to_string(), c2.v.to_string()],
                ]),
            })
            .collect();
        reprs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Ciphertext>, D::Error> {
        let reprs = Vec::<CiphertextRepr>::deserialize(deserializer)?;
        reprs
            .into_iter()
            .map(|repr| match repr {
                CiphertextRepr::Modp([c1, c2]) => {
                    let c1 = residue::<D::Error>(&c1)?;
                    let c2 = residue::<D::Error>(&c2)?;
                    Ok(Ciphertext::Modp { c1, c2 })
                }
                CiphertextRepr::Curve([[u1, v1], [u2, v2]]) => {
                    let c1 = point::<D::Error>(&u1, &v1)?;
                    let c2 = point::<D::Error>(&u2, &v2)?;
                    Ok(Ciphertext::Curve { c1, c2 })
                }
            })
            .collect()
    }

    fn residue<E: serde::de::Error>(digits: &str) -> Result<BigUint, E> {
        let value = parse_decimal::<E>(digits)?;
        if value.is_zero() || value >= elgamal::group().p {
            return Err(E::custom("ciphertext residue is outside the group"));
        }
        Ok(value)
    }

    fn point<E: serde::de::Error>(u: &str, v: &str) -> Result<MontgomeryPoint, E> {
        MontgomeryPoint::new(parse_decimal::<E>(u)?, parse_decimal::<E>(v)?)
            .map_err(|err| E::custom(format!("ciphertext component: {err}")))
    }
}

/// Signatures as `[r, s]` in lowercase hex without a `0x` prefix.
pub(crate) mod signature {
    use super::*;
    use crate::sig::Signature;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(
        signature: &Signature,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        [
            signature.r.to_str_radix(16),
            signature.s.to_str_radix(16),
        ]
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Signature, D::Error> {
        let [r, s] = <[String; 2]>::deserialize(deserializer)?;
        let r = super::parse_hex(&r)
            .map_err(|_| D::Error::custom(format!("invalid hex integer: {r:?}")))?;
        let s = super::parse_hex(&s)
            .map_err(|_| D::Error::custom(format!("invalid hex integer: {s:?}")))?;
        Ok(Signature { r, s })
    }
}

/// Keys as `"ec,<u_hex>,<v_hex>"` or `"eg,<y_hex>"` strings.
pub(crate) mod public_key {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(
        element: &GroupElement,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        encode_group_element(element).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<GroupElement, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        decode_group_element(&encoded)
            .map_err(|err| D::Error::custom(format!("invalid key {encoded:?}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve25519::base_point;
    use assert_matches::assert_matches;

    #[test]
    fn group_element_strings_round_trip() {
        let modp = GroupElement::Modp(BigUint::from(0xdead_beef_u32));
        let encoded = encode_group_element(&modp);
        assert_eq!(encoded, "eg,deadbeef");
        assert_eq!(decode_group_element(&encoded).unwrap(), modp);

        let curve = GroupElement::Curve(base_point().clone());
        let encoded = encode_group_element(&curve);
        assert!(encoded.starts_with("ec,9,"));
        assert_eq!(decode_group_element(&encoded).unwrap(), curve);
    }

    #[test]
    fn malformed_key_strings_are_rejected() {
        assert_matches!(decode_group_element("dsa,1234"), Err(Error::InvalidKey));
        assert_matches!(decode_group_element("eg,"), Err(Error::InvalidKey));
        assert_matches!(decode_group_element("eg,xyz"), Err(Error::InvalidKey));
        assert_matches!(decode_group_element("eg,1"), Err(Error::InvalidKey));
        // (2, 1) is not on the curve.
        assert_matches!(decode_group_element("ec,2,1"), Err(Error::InvalidKey));
    }
}
