//! Bounded try-and-increment search for a valid curve point.

use crate::{
    group::{DST, G1, G1_COMPRESSED_BYTE_LENGTH},
    hash::{
        xof::{CompositeXof, DirectXof, Xof},
        HashToCurve,
    },
    Error,
};
use tracing::trace;

/// Maximum number of decode attempts before hashing gives up.
///
/// Each attempt succeeds with probability roughly 2/5, so exhausting the
/// bound is a ~2^-190 event. The bound exists so circuit implementations of
/// the same search have a fixed iteration count, not because it is expected
/// to trigger.
pub const MAX_ATTEMPTS: u8 = 255;

/// Runs the attempt loop over candidate bytes produced per counter value.
fn search<F>(mut candidate: F) -> Result<(G1, u8), Error>
where
    F: FnMut(u8) -> [u8; G1_COMPRESSED_BYTE_LENGTH],
{
    for attempt in 0..MAX_ATTEMPTS {
        if let Some(point) = G1::from_candidate(&candidate(attempt)) {
            trace!(attempt, "hashed to curve");
            return Ok((point, attempt));
        }
    }
    Err(Error::HashToCurveExhausted(MAX_ATTEMPTS))
}

/// Try-and-increment over any [Xof].
///
/// Attempt `c` expands `c || extra || message` to the width of a compressed
/// G1 point and tries to decode it. With [CompositeXof] this is the legacy
/// composite mode, in which the whole attempt payload (counter included)
/// passes through the first-stage hash on every attempt.
#[derive(Clone, Debug)]
pub struct TryAndIncrement<X: Xof> {
    xof: X,
}

impl<X: Xof> TryAndIncrement<X> {
    pub fn new(xof: X) -> Self {
        Self { xof }
    }
}

impl TryAndIncrement<DirectXof> {
    /// Single-stage hashing.
    pub fn direct() -> Self {
        Self::new(DirectXof)
    }
}

impl TryAndIncrement<CompositeXof> {
    /// Legacy two-stage hashing.
    pub fn composite() -> Self {
        Self::new(CompositeXof)
    }
}

impl<X: Xof> HashToCurve for TryAndIncrement<X> {
    fn hash_with_attempt(
        &self,
        dst: DST,
        message: &[u8],
        extra: &[u8],
    ) -> Result<(G1, u8), Error> {
        let mut payload = Vec::with_capacity(1 + extra.len() + message.len());
        payload.push(0u8);
        payload.extend_from_slice(extra);
        payload.extend_from_slice(message);
        search(|attempt| {
            payload[0] = attempt;
            let mut candidate = [0u8; G1_COMPRESSED_BYTE_LENGTH];
            candidate.copy_from_slice(&self.xof.expand(dst, &payload, G1_COMPRESSED_BYTE_LENGTH));
            candidate
        })
    }
}

/// The CIP22 composite mode.
///
/// The first-stage hash runs once, over the message alone and outside the
/// attempt loop; attempt `c` then expands `c || extra || crh(message)`. A
/// circuit thus pays for the expensive first stage a single time regardless
/// of how many attempts the search takes.
///
/// Signers and verifiers must agree byte-exactly on the split between
/// `message` and `extra`; for epoch attestation both halves come out of
/// [crate::epoch::EpochBlockCip22::encode_to_bytes].
#[derive(Clone, Copy, Debug, Default)]
pub struct TryAndIncrementCip22;

impl HashToCurve for TryAndIncrementCip22 {
    fn hash_with_attempt(
        &self,
        dst: DST,
        message: &[u8],
        extra: &[u8],
    ) -> Result<(G1, u8), Error> {
        let message_hash = CompositeXof::crh(message);
        let mut payload = Vec::with_capacity(1 + extra.len() + message_hash.len());
        payload.push(0u8);
        payload.extend_from_slice(extra);
        payload.extend_from_slice(&message_hash);
        search(|attempt| {
            payload[0] = attempt;
            let mut candidate = [0u8; G1_COMPRESSED_BYTE_LENGTH];
            candidate.copy_from_slice(&DirectXof.expand(dst, &payload, G1_COMPRESSED_BYTE_LENGTH));
            candidate
        })
    }
}
