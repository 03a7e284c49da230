//! Aggregate BLS signatures and epoch encodings for validator-set attestation.
//!
//! Each validator signs the canonical encoding of a validator-set transition;
//! the signatures sum into a single 48-byte group element, and a verifier
//! holding the previous set's keys checks them all with one pairing equation.
//! Hashing onto the curve runs a bounded try-and-increment search over an
//! extendable-output hash, with composite two-stage modes whose first stage
//! is the only part a SNARK circuit replicates at full cost, so the same
//! attestations stay verifiable both natively and in-circuit.
//!
//! # Status
//!
//! `bls-attest` is **ALPHA** software and is not yet recommended for production use. Developers
//! should expect breaking changes and occasional instability.
//!
//! # Acknowledgements
//!
//! _The following crates were used as a reference when implementing this crate. If code is very
//! similar to the reference, it is accompanied by a comment and link._
//!
//! * <https://github.com/filecoin-project/blstrs> + <https://github.com/MystenLabs/fastcrypto>:
//!   Implementing group operations over BLS12-381 with <https://github.com/supranational/blst>.
//! * <https://www.rfc-editor.org/rfc/rfc9380>: Domain separation tags and extendable-output
//!   framing.
//!
//! # Example
//!
//! ```rust
//! use bls_attest::{
//!     aggregate::{aggregate_public_keys, aggregate_signatures},
//!     epoch::EpochBlockCip22,
//!     hash::TryAndIncrementCip22,
//!     keys::PrivateKey,
//! };
//! use rand::rngs::OsRng;
//!
//! // The current validator set
//! let privates: Vec<_> = (0..4).map(|_| PrivateKey::generate(&mut OsRng)).collect();
//! let publics: Vec<_> = privates.iter().map(|p| p.public_key()).collect();
//!
//! // The transition it attests: the next set, canonically encoded
//! let next: Vec<_> = (0..4)
//!     .map(|_| PrivateKey::generate(&mut OsRng).public_key())
//!     .collect();
//! let block = EpochBlockCip22::new(1, 0, [0u8; 32], [0u8; 32], 1, 4, next);
//! let (message, extra) = block.encode_to_bytes();
//!
//! // Every validator signs the same bytes
//! let hasher = TryAndIncrementCip22;
//! let signatures: Vec<_> = privates
//!     .iter()
//!     .map(|p| p.sign(&message, &extra, &hasher).expect("hashing should succeed"))
//!     .collect();
//!
//! // One pairing check settles the whole set
//! let key = aggregate_public_keys(&publics).unwrap();
//! let signature = aggregate_signatures(&signatures).unwrap();
//! assert!(key.verify(&message, &extra, &signature, &hasher).unwrap());
//! ```

use thiserror::Error;

pub mod aggregate;
pub mod batch;
pub mod epoch;
pub mod group;
pub mod hash;
pub mod keys;

pub use aggregate::{
    aggregate_public_keys, aggregate_public_keys_subtract, aggregate_signatures,
};
pub use batch::{batch_verify, batch_verify_strict, Batch, Message};
pub use epoch::{EpochBlock, EpochBlockCip22, CIP22_EXTRA_DATA_LENGTH};
pub use hash::{
    CompositeXof, DirectXof, HashToCurve, TryAndIncrement, TryAndIncrementCip22, Xof,
    MAX_ATTEMPTS,
};
pub use keys::{PrivateKey, PublicKey, PublicKeyCache, Signature};

/// Errors that can occur when working with attestation data.
///
/// Verification failure is deliberately not represented here: verify
/// functions return `Ok(false)` for a well-formed signature that does not
/// check out, and reserve `Err` for inputs the operation cannot process at
/// all.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("malformed input: {0}")]
    InputMalformed(&'static str),
    #[error("invalid curve point")]
    CurvePointInvalid,
    #[error("cannot aggregate an empty set")]
    AggregationEmptyInput,
    #[error("no curve point found in {0} attempts")]
    HashToCurveExhausted(u8),
}
