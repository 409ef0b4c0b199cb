//! The voting engine: ballot creation, verification, and homomorphic
//! tallying for one election.

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::OsRng;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use std::fmt;

use crate::{
    ballot::{canonical_bytes, Ciphertext, GroupElement, SignedBallot, Tally, Vote},
    curve25519,
    ecelgamal, elgamal,
    error::Error,
    sig::{dsa, ecdsa},
    wire, MAX_TALLY,
};

/// Smallest number of candidates an election may have.
pub const MIN_CANDIDATES: usize = 2;
/// Largest number of candidates an election may have.
pub const MAX_CANDIDATES: usize = 20;

/// The cryptographic back-end an election runs on.
///
/// Both back-ends satisfy the same contract (encrypt a bit, combine
/// homomorphically, decrypt a small sum, sign and verify ballots); the engine
/// holds one variant for its whole lifetime, and every ballot it produces
/// carries the matching ciphertext and key variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Exponential ElGamal over the RFC 5114 MODP group, with DSA ballot
    /// signatures.
    Modp,
    /// EC-ElGamal over Curve25519, with ECDSA ballot signatures.
    Curve,
}

/// The election keypair in its storage encoding.
///
/// The public half uses the same `"ec,…"` / `"eg,…"` string format as ballot
/// keys; the secret half is additionally wrapped so that it is neither
/// printed nor left in memory after use.
pub struct ElectionKeys {
    pub public_key: String,
    pub secret_key: SecretString,
}

impl fmt::Debug for ElectionKeys {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ElectionKeys")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// A single election: the chosen back-end, the candidate count and the
/// election keypair.
///
/// All methods are pure with respect to the election state, so a shared
/// reference can be used from multiple threads.
pub struct Election {
    backend: Backend,
    candidates: usize,
    secret_key: BigUint,
    public_key: GroupElement,
    decode_bound: u64,
}

impl fmt::Debug for Election {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Election")
            .field("backend", &self.backend)
            .field("candidates", &self.candidates)
            .field("public_key", &self.public_key)
            .field("decode_bound", &self.decode_bound)
            .finish_non_exhaustive()
    }
}

impl Election {
    /// Creates an election with a freshly generated keypair.
    pub fn new(backend: Backend, candidates: usize) -> Result<Self, Error> {
        if !(MIN_CANDIDATES..=MAX_CANDIDATES).contains(&candidates) {
            return Err(Error::InvalidCandidateCount(candidates));
        }

        let (secret_key, public_key) = match backend {
            Backend::Modp => {
                let (secret, public) = elgamal::gen_keys(&mut OsRng)?;
                (secret, GroupElement::Modp(public))
            }
            Backend::Curve => {
                let (secret, public) = ecelgamal::gen_keys(&mut OsRng)?;
                (secret, GroupElement::Curve(public))
            }
        };
        info!(?backend, candidates, "created election");

        Ok(Self {
            backend,
            candidates,
            secret_key,
            public_key,
            decode_bound: MAX_TALLY,
        })
    }

    /// Restores an election from exported keys. The back-end is implied by
    /// the key encoding.
    pub fn from_keys(candidates: usize, keys: &ElectionKeys) -> Result<Self, Error> {
        if !(MIN_CANDIDATES..=MAX_CANDIDATES).contains(&candidates) {
            return Err(Error::InvalidCandidateCount(candidates));
        }

        let public_key = wire::decode_group_element(&keys.public_key)?;
        let secret_encoded = keys.secret_key.expose_secret();
        let (prefix, secret_hex) = secret_encoded
            .split_once(',')
            .ok_or(Error::InvalidKey)?;
        let secret_key = wire::parse_hex(secret_hex)?;

        let backend = match (&public_key, prefix) {
            (GroupElement::Modp(public), "eg") => {
                if secret_key.is_zero() || secret_key >= elgamal::group().q {
                    return Err(Error::InvalidKey);
                }
                // The public residue must match the secret scalar.
                let expected = elgamal::group()
                    .g
                    .modpow(&secret_key, &elgamal::group().p);
                if *public != expected {
                    return Err(Error::InvalidKey);
                }
                Backend::Modp
            }
            (GroupElement::Curve(public), "ec") => {
                if secret_key.is_zero() || secret_key >= *curve25519::group_order() {
                    return Err(Error::InvalidKey);
                }
                if *public != curve25519::base_point().mul(&secret_key)? {
                    return Err(Error::InvalidKey);
                }
                Backend::Curve
            }
            _ => return Err(Error::InvalidKey),
        };

        Ok(Self {
            backend,
            candidates,
            secret_key,
            public_key,
            decode_bound: MAX_TALLY,
        })
    }

    /// Lowers the bound used when decoding per-candidate counts. Useful when
    /// the expected number of voters is known to be small.
    #[must_use]
    pub fn with_decode_bound(mut self, bound: u64) -> Self {
        self.decode_bound = bound.min(MAX_TALLY);
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn candidates(&self) -> usize {
        self.candidates
    }

    pub fn public_key(&self) -> &GroupElement {
        &self.public_key
    }

    /// Exports the election keypair in its storage encoding.
    pub fn export_keys(&self) -> ElectionKeys {
        let prefix = match self.backend {
            Backend::Modp => "eg",
            Backend::Curve => "ec",
        };
        ElectionKeys {
            public_key: wire::encode_group_element(&self.public_key),
            secret_key: SecretString::new(format!(
                "{prefix},{}",
                self.secret_key.to_str_radix(16)
            )),
        }
    }

    /// Builds the indicator vector for the given candidate.
    pub fn create_vote(&self, candidate: usize) -> Result<Vote, Error> {
        Vote::new(candidate, self.candidates)
    }

    /// Encrypts a vote slot-wise under the election public key and signs the
    /// canonical ballot bytes with a fresh one-shot keypair.
    pub fn encrypt_vote(&self, vote: &Vote, voter_id: u64) -> Result<SignedBallot, Error> {
        if vote.candidates() != self.candidates || !vote.is_well_formed() {
            return Err(Error::BadVote);
        }

        let encrypted_votes: Vec<_> = match &self.public_key {
            GroupElement::Modp(public) => vote
                .slots()
                .iter()
                .map(|&bit| {
                    let (c1, c2) = elgamal::encrypt_bit(bit, public, &mut OsRng)?;
                    Ok(Ciphertext::Modp { c1, c2 })
                })
                .collect::<Result<_, Error>>()?,
            GroupElement::Curve(public) => vote
                .slots()
                .iter()
                .map(|&bit| {
                    let (c1, c2) = ecelgamal::encrypt_bit(bit, public, &mut OsRng)?;
                    Ok(Ciphertext::Curve { c1, c2 })
                })
                .collect::<Result<_, Error>>()?,
        };

        let message = canonical_bytes(&encrypted_votes);
        let (signature, ephemeral_public_key) = match self.backend {
            Backend::Modp => {
                let (signing_key, verifying_key) = dsa::gen_keys(&mut OsRng)?;
                (
                    dsa::sign(&message, &signing_key)?,
                    GroupElement::Modp(verifying_key),
                )
            }
            Backend::Curve => {
                let (signing_key, verifying_key) = ecdsa::gen_keys(&mut OsRng)?;
                (
                    ecdsa::sign(&message, &signing_key)?,
                    GroupElement::Curve(verifying_key),
                )
            }
        };
        debug!(voter_id, "encrypted and signed ballot");

        Ok(SignedBallot {
            encrypted_votes,
            signature,
            ephemeral_public_key,
            voter_id,
        })
    }

    /// Checks a ballot's signature against its embedded ephemeral key.
    pub fn verify_ballot(&self, ballot: &SignedBallot) -> bool {
        let message = ballot.canonical_bytes();
        match (self.backend, &ballot.ephemeral_public_key) {
            (Backend::Modp, GroupElement::Modp(key)) => {
                dsa::verify(&message, &ballot.signature, key).unwrap_or(false)
            }
            (Backend::Curve, GroupElement::Curve(key)) => {
                ecdsa::verify(&message, &ballot.signature, key).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Verifies every ballot and folds the ciphertexts slot-wise into a
    /// tally.
    ///
    /// The fold is commutative and associative, so the result does not depend
    /// on ballot order. The first failing ballot aborts the tally with
    /// [`Error::BadBallot`] naming its voter.
    ///
    /// # Panics
    ///
    /// Panics if `ballots` is empty.
    pub fn combine(&self, ballots: &[SignedBallot]) -> Result<Tally, Error> {
        assert!(!ballots.is_empty(), "cannot tally an empty set of ballots");

        let mut slots: Vec<Option<Ciphertext>> = vec![None; self.candidates];
        for ballot in ballots {
            let bad_ballot = Error::BadBallot {
                voter_id: ballot.voter_id,
            };
            if ballot.encrypted_votes.len() != self.candidates
                || !self.matches_backend(ballot)
                || !self.verify_ballot(ballot)
            {
                return Err(bad_ballot);
            }

            for (accumulator, ciphertext) in slots.iter_mut().zip(&ballot.encrypted_votes) {
                *accumulator = Some(match accumulator.take() {
                    None => ciphertext.clone(),
                    Some(sum) => sum.combine(ciphertext).map_err(|_| bad_ballot.clone())?,
                });
            }
        }
        debug!(ballots = ballots.len(), "combined ballots into a tally");

        let slots = slots
            .into_iter()
            .map(|slot| slot.expect("every slot was assigned by the first ballot"))
            .collect();
        Ok(Tally::new(slots))
    }

    /// Decrypts a tally into per-candidate counts.
    pub fn decrypt_result(&self, tally: &Tally) -> Result<Vec<u64>, Error> {
        tally
            .slots()
            .iter()
            .enumerate()
            .map(|(candidate, ciphertext)| {
                let count = match ciphertext {
                    Ciphertext::Modp { c1, c2 } => {
                        elgamal::decrypt_exp_bounded(&self.secret_key, c1, c2, self.decode_bound)?
                    }
                    Ciphertext::Curve { c1, c2 } => {
                        ecelgamal::decrypt_bounded(&self.secret_key, c1, c2, self.decode_bound)?
                    }
                };
                debug!(candidate, count, "decrypted tally slot");
                Ok(count)
            })
            .collect()
    }

    fn matches_backend(&self, ballot: &SignedBallot) -> bool {
        ballot.encrypted_votes.iter().all(|slot| {
            matches!(
                (self.backend, slot),
                (Backend::Modp, Ciphertext::Modp { .. }) | (Backend::Curve, Ciphertext::Curve { .. })
            )
        })
    }
}

/// Runs a complete election: one ballot per entry of `choices`, using the
/// entry's index as the voter id, then tallies and decrypts.
pub fn run_election(
    backend: Backend,
    candidates: usize,
    choices: &[usize],
) -> Result<Vec<u64>, Error> {
    let election = Election::new(backend, candidates)?;
    let ballots = choices
        .iter()
        .enumerate()
        .map(|(voter_id, &candidate)| {
            let vote = election.create_vote(candidate)?;
            election.encrypt_vote(&vote, voter_id as u64)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tally = election.combine(&ballots)?;
    election.decrypt_result(&tally)
}
