//! Extendable-output hashing with domain separation.

use crate::group::DST;

/// Number of bytes produced by the first-stage collision-resistant hash.
pub const CRH_OUTPUT_LENGTH: usize = 32;

/// A deterministic extendable-output function with domain separation.
pub trait Xof: Send + Sync {
    /// Expands `payload` to `length` bytes under the given domain.
    fn expand(&self, dst: DST, payload: &[u8], length: usize) -> Vec<u8>;
}

/// Single-stage expansion: BLAKE3 in XOF mode.
///
/// The domain tag and output length are folded into the input with the
/// RFC 9380 `expand_message_xof` framing
/// (`payload || len(out) || dst || len(dst)`), so distinct domains or output
/// lengths can never produce overlapping streams.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectXof;

impl Xof for DirectXof {
    fn expand(&self, dst: DST, payload: &[u8], length: usize) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(payload);
        hasher.update(&(length as u16).to_be_bytes());
        hasher.update(dst);
        hasher.update(&[dst.len() as u8]);
        let mut out = vec![0u8; length];
        hasher.finalize_xof().fill(&mut out);
        out
    }
}

/// Two-stage expansion: the fixed-width collision-resistant hash first, then
/// [DirectXof] over its digest.
///
/// The first stage is what a SNARK circuit replicates, so it is exposed on
/// its own as [CompositeXof::crh].
#[derive(Clone, Copy, Debug, Default)]
pub struct CompositeXof;

impl CompositeXof {
    /// The first-stage collision-resistant hash: a fixed 32-byte digest.
    pub fn crh(payload: &[u8]) -> [u8; CRH_OUTPUT_LENGTH] {
        *blake3::hash(payload).as_bytes()
    }
}

impl Xof for CompositeXof {
    fn expand(&self, dst: DST, payload: &[u8], length: usize) -> Vec<u8> {
        DirectXof.expand(dst, &Self::crh(payload), length)
    }
}
