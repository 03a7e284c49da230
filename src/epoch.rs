//! Canonical byte encodings of validator-set transitions.
//!
//! Signers and verifiers, native or in-circuit, must agree on these bytes
//! exactly, so the encodings are fixed-width fields followed by the keys in
//! consensus order, with no framing or padding of any kind.

use crate::{group::G2_COMPRESSED_BYTE_LENGTH, keys::PublicKey};

/// A validator-set transition to be attested by the previous set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochBlock {
    /// Index of the epoch being entered.
    pub epoch_index: u16,
    /// Largest number of validators that may abstain while keeping an
    /// attestation over this set valid.
    pub maximum_non_signers: u32,
    /// The incoming validator set, in consensus order.
    pub added_public_keys: Vec<PublicKey>,
}

impl EpochBlock {
    pub fn new(
        epoch_index: u16,
        maximum_non_signers: u32,
        added_public_keys: Vec<PublicKey>,
    ) -> Self {
        Self {
            epoch_index,
            maximum_non_signers,
            added_public_keys,
        }
    }

    /// Encodes the transition as
    /// `epoch_index (u16 LE) || maximum_non_signers (u32 LE) || compressed keys in order`.
    pub fn encode_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            2 + 4 + self.added_public_keys.len() * G2_COMPRESSED_BYTE_LENGTH,
        );
        bytes.extend_from_slice(&self.epoch_index.to_le_bytes());
        bytes.extend_from_slice(&self.maximum_non_signers.to_le_bytes());
        for key in &self.added_public_keys {
            bytes.extend_from_slice(&key.serialize());
        }
        bytes
    }
}

/// Length of the CIP22 extra-data buffer: a round byte plus two 32-byte
/// hashes.
pub const CIP22_EXTRA_DATA_LENGTH: usize = 65;

/// A validator-set transition in the CIP22 format, which additionally binds
/// the proposal round and the block hashes, and splits the encoding into a
/// message buffer and an extra-data buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochBlockCip22 {
    /// Index of the epoch being entered.
    pub epoch_index: u16,
    /// Consensus round that produced the epoch block.
    pub round_number: u8,
    /// Hash of the epoch block.
    pub block_hash: [u8; 32],
    /// Hash of its parent.
    pub parent_hash: [u8; 32],
    /// Largest number of validators that may abstain while keeping an
    /// attestation over this set valid.
    pub maximum_non_signers: u32,
    /// Validator-set capacity the circuit is provisioned for.
    pub maximum_validators: u32,
    /// The incoming validator set, in consensus order.
    pub added_public_keys: Vec<PublicKey>,
}

impl EpochBlockCip22 {
    pub fn new(
        epoch_index: u16,
        round_number: u8,
        block_hash: [u8; 32],
        parent_hash: [u8; 32],
        maximum_non_signers: u32,
        maximum_validators: u32,
        added_public_keys: Vec<PublicKey>,
    ) -> Self {
        Self {
            epoch_index,
            round_number,
            block_hash,
            parent_hash,
            maximum_non_signers,
            maximum_validators,
            added_public_keys,
        }
    }

    /// Encodes the transition as a `(message, extra)` pair.
    ///
    /// The message buffer is
    /// `epoch_index (u16 LE) || maximum_non_signers (u32 LE) || maximum_validators (u32 LE) || compressed keys in order`;
    /// the extra-data buffer is `round_number (u8) || block_hash || parent_hash`.
    /// Both halves must reach the CIP22 hasher unmodified: only the message
    /// buffer passes through the first-stage hash, so the round and hashes
    /// stay re-readable by the circuit.
    pub fn encode_to_bytes(&self) -> (Vec<u8>, Vec<u8>) {
        let mut message = Vec::with_capacity(
            2 + 4 + 4 + self.added_public_keys.len() * G2_COMPRESSED_BYTE_LENGTH,
        );
        message.extend_from_slice(&self.epoch_index.to_le_bytes());
        message.extend_from_slice(&self.maximum_non_signers.to_le_bytes());
        message.extend_from_slice(&self.maximum_validators.to_le_bytes());
        for key in &self.added_public_keys {
            message.extend_from_slice(&key.serialize());
        }

        let mut extra = Vec::with_capacity(CIP22_EXTRA_DATA_LENGTH);
        extra.push(self.round_number);
        extra.extend_from_slice(&self.block_hash);
        extra.extend_from_slice(&self.parent_hash);
        (message, extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::{aggregate_public_keys, aggregate_signatures},
        hash::TryAndIncrementCip22,
        keys::PrivateKey,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn validator_keys(n: usize, rng: &mut StdRng) -> (Vec<PrivateKey>, Vec<PublicKey>) {
        let privates: Vec<_> = (0..n).map(|_| PrivateKey::generate(rng)).collect();
        let publics = privates.iter().map(|p| p.public_key()).collect();
        (privates, publics)
    }

    #[test]
    fn encoding_layout() {
        let mut rng = StdRng::seed_from_u64(0);
        let (_, publics) = validator_keys(3, &mut rng);
        let block = EpochBlock::new(5, 2, publics.clone());
        let bytes = block.encode_to_bytes();

        assert_eq!(bytes.len(), 2 + 4 + 3 * G2_COMPRESSED_BYTE_LENGTH);
        assert_eq!(bytes[..2], 5u16.to_le_bytes());
        assert_eq!(bytes[2..6], 2u32.to_le_bytes());
        for (i, key) in publics.iter().enumerate() {
            let offset = 6 + i * G2_COMPRESSED_BYTE_LENGTH;
            assert_eq!(
                bytes[offset..offset + G2_COMPRESSED_BYTE_LENGTH],
                key.serialize()
            );
        }
    }

    #[test]
    fn encoding_preserves_key_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let (_, publics) = validator_keys(4, &mut rng);
        let forward = EpochBlock::new(1, 1, publics.clone()).encode_to_bytes();
        let mut reversed_keys = publics;
        reversed_keys.reverse();
        let reversed = EpochBlock::new(1, 1, reversed_keys).encode_to_bytes();
        assert_ne!(forward, reversed);
        assert_eq!(forward[..6], reversed[..6]);
    }

    #[test]
    fn encoding_with_no_keys() {
        let block = EpochBlock::new(0, 0, Vec::new());
        assert_eq!(block.encode_to_bytes().len(), 6);
    }

    #[test]
    fn cip22_encoding_layout() {
        let mut rng = StdRng::seed_from_u64(2);
        let (_, publics) = validator_keys(2, &mut rng);
        let block = EpochBlockCip22::new(9, 3, [0xaa; 32], [0xbb; 32], 1, 100, publics.clone());
        let (message, extra) = block.encode_to_bytes();

        assert_eq!(message.len(), 2 + 4 + 4 + 2 * G2_COMPRESSED_BYTE_LENGTH);
        assert_eq!(message[..2], 9u16.to_le_bytes());
        assert_eq!(message[2..6], 1u32.to_le_bytes());
        assert_eq!(message[6..10], 100u32.to_le_bytes());
        for (i, key) in publics.iter().enumerate() {
            let offset = 10 + i * G2_COMPRESSED_BYTE_LENGTH;
            assert_eq!(
                message[offset..offset + G2_COMPRESSED_BYTE_LENGTH],
                key.serialize()
            );
        }

        assert_eq!(extra.len(), CIP22_EXTRA_DATA_LENGTH);
        assert_eq!(extra[0], 3);
        assert_eq!(extra[1..33], [0xaa; 32]);
        assert_eq!(extra[33..], [0xbb; 32]);
    }

    #[test]
    fn attested_transition_verifies() {
        let mut rng = StdRng::seed_from_u64(3);
        let hasher = TryAndIncrementCip22;

        // The current validator set attests the next one
        let (current_privates, current_publics) = validator_keys(5, &mut rng);
        let (_, next_publics) = validator_keys(5, &mut rng);
        let block =
            EpochBlockCip22::new(7, 0, [0x11; 32], [0x22; 32], 1, 5, next_publics);
        let (message, extra) = block.encode_to_bytes();

        let signatures: Vec<_> = current_privates
            .iter()
            .map(|p| p.sign(&message, &extra, &hasher).unwrap())
            .collect();
        let aggregate_key = aggregate_public_keys(&current_publics).unwrap();
        let aggregate_sig = aggregate_signatures(&signatures).unwrap();
        assert!(aggregate_key
            .verify(&message, &extra, &aggregate_sig, &hasher)
            .unwrap());

        // The same attestation under a different round byte must not verify
        let mut altered = block;
        altered.round_number = 1;
        let (altered_message, altered_extra) = altered.encode_to_bytes();
        assert_eq!(altered_message, message);
        assert!(!aggregate_key
            .verify(&altered_message, &altered_extra, &aggregate_sig, &hasher)
            .unwrap());
    }
}
