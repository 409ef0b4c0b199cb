//! Error taxonomy shared by all modules of the voting core.

use std::{error::Error as StdError, fmt};

/// Failures surfaced by the voting core.
///
/// Internal retries (a degenerate signing nonce, a zero random scalar) are
/// handled where they occur and never reach the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Group or curve parameters failed the startup self-check.
    InvalidParameters,
    /// A key is outside its valid range, or an EC key is not on the curve.
    InvalidKey,
    /// The selected candidate index does not exist in this election.
    InvalidCandidate {
        candidate: usize,
        candidates: usize,
    },
    /// The requested number of candidates is outside the supported range.
    InvalidCandidateCount(usize),
    /// A vote is not an indicator vector of the election's dimension.
    BadVote,
    /// A ballot failed signature verification during tallying.
    BadBallot {
        voter_id: u64,
    },
    /// Signature components are outside `(0, order)`.
    InvalidSignature,
    /// Modular inverse does not exist for the given inputs.
    NoInverse,
    /// Deterministic nonce derivation ran out of attempts.
    NonceExhaustion,
    /// The decrypted value exceeds the configured decoding bound.
    DecodeFailure,
    /// A point does not lie on Curve25519.
    NotOnCurve,
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameters => {
                formatter.write_str("group parameters failed the self-check")
            }
            Self::InvalidKey => {
                formatter.write_str("key is outside the valid range or not on the curve")
            }
            Self::InvalidCandidate {
                candidate,
                candidates,
            } => {
                write!(
                    formatter,
                    "candidate #{candidate} does not exist in an election with {candidates} candidates"
                )
            }
            Self::InvalidCandidateCount(count) => {
                write!(formatter, "unsupported number of candidates: {count}")
            }
            Self::BadVote => formatter.write_str("vote is not a well-formed indicator vector"),
            Self::BadBallot { voter_id } => {
                write!(formatter, "ballot from voter {voter_id} failed verification")
            }
            Self::InvalidSignature => {
                formatter.write_str("signature components are outside the valid range")
            }
            Self::NoInverse => formatter.write_str("modular inverse does not exist"),
            Self::NonceExhaustion => {
                formatter.write_str("deterministic nonce derivation exhausted its attempt budget")
            }
            Self::DecodeFailure => {
                formatter.write_str("decrypted tally exceeds the decodable bound")
            }
            Self::NotOnCurve => formatter.write_str("point is not on Curve25519"),
        }
    }
}

impl StdError for Error {}
