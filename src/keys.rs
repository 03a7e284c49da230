//! Private keys, public keys, signatures and their serialized forms.

use crate::{
    group::{verify_pairing, Element, Scalar, G1, G2, MESSAGE_DST, PROOF_OF_POSSESSION_DST},
    hash::{HashToCurve, TryAndIncrement},
    Error,
};
use rand::{CryptoRng, RngCore};
use std::{collections::HashMap, fmt};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A BLS private key.
///
/// The scalar is zeroized when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    scalar: Scalar,
}

impl PrivateKey {
    /// Generates a private key from the provided randomness source.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            scalar: Scalar::rand(rng),
        }
    }

    /// Derives the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        let mut point = G2::one();
        point.mul(&self.scalar);
        PublicKey { point }
    }

    /// Signs `(message, extra)` under the message domain, hashing with the
    /// provided mode.
    ///
    /// The hashing mode is part of what verifiers must agree on; a signature
    /// produced with one mode never verifies under another.
    pub fn sign<H: HashToCurve>(
        &self,
        message: &[u8],
        extra: &[u8],
        hasher: &H,
    ) -> Result<Signature, Error> {
        let mut point = hasher.hash(MESSAGE_DST, message, extra)?;
        point.mul(&self.scalar);
        Ok(Signature { point })
    }

    /// Signs a proof of possession over `message` (the signer's identifying
    /// bytes, typically its serialized public key or on-chain address).
    ///
    /// Proofs of possession always hash directly, under their own domain, so
    /// they can never be replayed as message signatures.
    pub fn sign_pop(&self, message: &[u8]) -> Result<Signature, Error> {
        let mut point =
            TryAndIncrement::direct().hash(PROOF_OF_POSSESSION_DST, message, &[])?;
        point.mul(&self.scalar);
        Ok(Signature { point })
    }

    /// Serializes the scalar as 32 big-endian bytes.
    pub fn serialize(&self) -> Vec<u8> {
        self.scalar.serialize()
    }

    /// Deserializes a private key, rejecting values at or above the group
    /// order.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != Scalar::size() {
            return Err(Error::InputMalformed("private key must be 32 bytes"));
        }
        let scalar =
            Scalar::deserialize(bytes).ok_or(Error::InputMalformed("non-canonical scalar"))?;
        Ok(Self { scalar })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

/// A BLS public key: a point in G2.
///
/// Every untrusted decode verifies the point is on the curve, in the
/// prime-order subgroup, and not the identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    point: G2,
}

impl PublicKey {
    pub(crate) fn from_point(point: G2) -> Self {
        Self { point }
    }

    pub(crate) fn point(&self) -> &G2 {
        &self.point
    }

    /// Verifies `signature` over `(message, extra)`, hashing with the
    /// provided mode.
    ///
    /// A well-formed signature that does not verify is `Ok(false)`, not an
    /// error: the error channel is reserved for inputs the operation cannot
    /// process at all.
    pub fn verify<H: HashToCurve>(
        &self,
        message: &[u8],
        extra: &[u8],
        signature: &Signature,
        hasher: &H,
    ) -> Result<bool, Error> {
        let hm = hasher.hash(MESSAGE_DST, message, extra)?;
        Ok(verify_pairing(&self.point, &hm, &signature.point))
    }

    /// Verifies a proof of possession over `message`.
    pub fn verify_pop(&self, message: &[u8], signature: &Signature) -> Result<bool, Error> {
        let hm = TryAndIncrement::direct().hash(PROOF_OF_POSSESSION_DST, message, &[])?;
        Ok(verify_pairing(&self.point, &hm, &signature.point))
    }

    /// Serializes the key in compressed form (96 bytes).
    pub fn serialize(&self) -> Vec<u8> {
        self.point.serialize()
    }

    /// Serializes the key in uncompressed form (192 bytes).
    pub fn serialize_uncompressed(&self) -> Vec<u8> {
        self.point.serialize_uncompressed()
    }

    /// Deserializes a public key from either encoding (selected by length).
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != G2::size() && bytes.len() != G2::uncompressed_size() {
            return Err(Error::InputMalformed("public key must be 96 or 192 bytes"));
        }
        let point = G2::deserialize(bytes).ok_or(Error::CurvePointInvalid)?;
        Ok(Self { point })
    }
}

/// A BLS signature (or proof of possession): a point in G1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    point: G1,
}

impl Signature {
    pub(crate) fn from_point(point: G1) -> Self {
        Self { point }
    }

    pub(crate) fn point(&self) -> &G1 {
        &self.point
    }

    /// Serializes the signature in compressed form (48 bytes).
    pub fn serialize(&self) -> Vec<u8> {
        self.point.serialize()
    }

    /// Serializes the signature in uncompressed form (96 bytes).
    pub fn serialize_uncompressed(&self) -> Vec<u8> {
        self.point.serialize_uncompressed()
    }

    /// Deserializes a signature from either encoding (selected by length).
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != G1::size() && bytes.len() != G1::uncompressed_size() {
            return Err(Error::InputMalformed("signature must be 48 or 96 bytes"));
        }
        let point = G1::deserialize(bytes).ok_or(Error::CurvePointInvalid)?;
        Ok(Self { point })
    }
}

/// A cache of verified public keys, keyed by their serialized bytes.
///
/// Epoch processing decodes the same validator keys over and over, and the
/// subgroup check dominates each decode. A hit returns the previously
/// verified key without touching the curve.
#[derive(Clone, Debug, Default)]
pub struct PublicKeyCache {
    keys: HashMap<Vec<u8>, PublicKey>,
}

impl PublicKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [PublicKey::deserialize], memoized on the exact input bytes.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<PublicKey, Error> {
        if let Some(key) = self.keys.get(bytes) {
            return Ok(*key);
        }
        let key = PublicKey::deserialize(bytes)?;
        self.keys.insert(bytes.to_vec(), key);
        Ok(key)
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drops every cached key.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
