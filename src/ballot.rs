//! Ballot data types and the canonical byte encoding used for signing.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    arith::int_to_bytes,
    curve25519::MontgomeryPoint,
    elgamal,
    error::Error,
    sig::Signature,
    wire,
};

/// A plaintext vote: an indicator vector with exactly one `1`.
///
/// Votes only exist in memory while a ballot is being built; the slots are
/// wiped when the value is dropped.
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct Vote {
    slots: Vec<u8>,
}

impl Vote {
    /// Builds the indicator vector for the given candidate.
    pub fn new(candidate: usize, candidates: usize) -> Result<Self, Error> {
        if candidate >= candidates {
            return Err(Error::InvalidCandidate {
                candidate,
                candidates,
            });
        }
        let slots = (0..candidates)
            .map(|slot| u8::from(slot == candidate))
            .collect();
        Ok(Self { slots })
    }

    pub fn candidates(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slots(&self) -> &[u8] {
        &self.slots
    }

    /// A well-formed vote has exactly one selected slot.
    pub fn is_well_formed(&self) -> bool {
        self.slots.iter().all(|&slot| slot <= 1)
            && self.slots.iter().map(|&slot| u32::from(slot)).sum::<u32>() == 1
    }
}

/// An ElGamal ciphertext in either back-end representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ciphertext {
    /// `(C1, C2)` residues modulo the MODP prime.
    Modp { c1: BigUint, c2: BigUint },
    /// `(C1, C2)` points on Curve25519.
    Curve {
        c1: MontgomeryPoint,
        c2: MontgomeryPoint,
    },
}

impl Ciphertext {
    /// Appends the canonical byte encoding of this ciphertext.
    fn canonical_bytes_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Modp { c1, c2 } => {
                out.extend_from_slice(&int_to_bytes(c1));
                out.extend_from_slice(&int_to_bytes(c2));
            }
            Self::Curve { c1, c2 } => {
                out.extend_from_slice(&int_to_bytes(&c1.u));
                out.extend_from_slice(&int_to_bytes(&c1.v));
                out.extend_from_slice(&int_to_bytes(&c2.u));
                out.extend_from_slice(&int_to_bytes(&c2.v));
            }
        }
    }

    /// Homomorphic combination: multiplication modulo P for the MODP variant,
    /// point addition for the curve variant.
    ///
    /// Fails with [`Error::BadVote`] when the variants do not match.
    pub(crate) fn combine(&self, other: &Self) -> Result<Self, Error> {
        match (self, other) {
            (Self::Modp { c1, c2 }, Self::Modp { c1: d1, c2: d2 }) => {
                let (c1, c2) = elgamal::combine(&(c1.clone(), c2.clone()), &(d1.clone(), d2.clone()));
                Ok(Self::Modp { c1, c2 })
            }
            (Self::Curve { c1, c2 }, Self::Curve { c1: d1, c2: d2 }) => Ok(Self::Curve {
                c1: c1.add(d1)?,
                c2: c2.add(d2)?,
            }),
            _ => Err(Error::BadVote),
        }
    }
}

/// Slot-wise encryption of a [`Vote`], one ciphertext per candidate.
pub type EncryptedBallot = Vec<Ciphertext>;

/// The canonical byte encoding of an encrypted ballot: the slot-ordered
/// concatenation of minimal big-endian component encodings, with no length
/// prefixes. This layout is shared with the external ballot store and must
/// not change.
pub fn canonical_bytes(slots: &[Ciphertext]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for ciphertext in slots {
        ciphertext.canonical_bytes_into(&mut bytes);
    }
    bytes
}

/// An encrypted, signed ballot as submitted by one voter.
///
/// The serde representation matches the external store: decimal-string
/// ciphertext components, a hex `[r, s]` signature, and a `"ec,…"` / `"eg,…"`
/// prefixed public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedBallot {
    #[serde(with = "wire::ciphertexts")]
    pub encrypted_votes: EncryptedBallot,
    #[serde(with = "wire::signature")]
    pub signature: Signature,
    /// Public half of the one-shot keypair generated for this ballot.
    ///
    /// Embedding it here lets anyone check the signature without a voter-key
    /// registry; binding the key to a person is the authenticator's job.
    #[serde(with = "wire::public_key")]
    pub ephemeral_public_key: GroupElement,
    pub voter_id: u64,
}

impl SignedBallot {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(&self.encrypted_votes)
    }
}

/// A public key (or other group member) in either back-end representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupElement {
    /// A residue modulo the MODP prime.
    Modp(BigUint),
    /// A point on Curve25519.
    Curve(MontgomeryPoint),
}

/// The slot-wise homomorphic sum of a set of ballots, still encrypted.
///
/// A tally is a pure function of the ballots it was combined from and is
/// recomputed rather than stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    slots: Vec<Ciphertext>,
}

impl Tally {
    pub(crate) fn new(slots: Vec<Ciphertext>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Ciphertext] {
        &self.slots
    }
}
