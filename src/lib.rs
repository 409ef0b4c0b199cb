//! Cryptographic voting core with additively homomorphic tallying.
//!
//! Ballots are encrypted slot-wise under one of two interchangeable
//! back-ends — exponential ElGamal over the RFC 5114 MODP Group 24 subgroup,
//! or EC-ElGamal over Curve25519 in Montgomery form — and signed with a
//! one-shot DSA / ECDSA keypair whose public half travels with the ballot.
//! Individual ballots are never decrypted; the engine folds them into a
//! per-candidate tally under encryption and only decrypts the aggregate.

// Linter settings.
#![warn(missing_debug_implementations, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::similar_names
)]

pub mod arith;
mod ballot;
pub mod curve25519;
pub mod ecelgamal;
mod election;
pub mod elgamal;
mod error;
pub mod sig;
mod wire;

pub use self::{
    ballot::{
        canonical_bytes, Ciphertext, EncryptedBallot, GroupElement, SignedBallot, Tally, Vote,
    },
    election::{run_election, Backend, Election, ElectionKeys, MAX_CANDIDATES, MIN_CANDIDATES},
    error::Error,
    sig::Signature,
};

/// Upper bound on the per-candidate count that result decryption will
/// recover. Aggregates beyond this bound surface as [`Error::DecodeFailure`].
pub const MAX_TALLY: u64 = 1024;
