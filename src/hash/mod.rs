//! Hashing messages onto G1.
//!
//! Three interchangeable modes produce the point a signature commits to:
//!
//! - *Direct*: a single extendable-output hash over the input.
//! - *Composite*: a fixed-width collision-resistant hash first, then the
//!   extendable-output hash over its digest. The first stage is the only
//!   part a SNARK circuit has to replicate at full cost, which keeps
//!   in-circuit verification of the same computation affordable.
//! - *CIP22 composite*: like composite, but the first stage runs once over
//!   the message alone, outside the retry loop, so a circuit pays for it a
//!   single time regardless of how many attempts the search takes.
//!
//! All modes share the bounded try-and-increment search in
//! [try_and_increment]: expand to candidate bytes, attempt to decode a curve
//! point, bump a one-byte counter and repeat.

pub mod try_and_increment;
pub mod xof;

pub use try_and_increment::{TryAndIncrement, TryAndIncrementCip22, MAX_ATTEMPTS};
pub use xof::{CompositeXof, DirectXof, Xof, CRH_OUTPUT_LENGTH};

use crate::{group::DST, group::G1, Error};

/// Deterministically maps a `(message, extra)` pair onto the prime-order
/// subgroup of G1.
///
/// Implementations are pure functions of their inputs: the same
/// `(dst, message, extra)` always produces the same point, on any machine.
pub trait HashToCurve: Send + Sync {
    /// Hashes to a point.
    fn hash(&self, dst: DST, message: &[u8], extra: &[u8]) -> Result<G1, Error> {
        self.hash_with_attempt(dst, message, extra)
            .map(|(point, _)| point)
    }

    /// Hashes to a point, also returning the attempt counter that produced
    /// it (which in-circuit verifiers take as a hint).
    fn hash_with_attempt(
        &self,
        dst: DST,
        message: &[u8],
        extra: &[u8],
    ) -> Result<(G1, u8), Error>;
}
