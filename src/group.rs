//! Group operations over BLS12-381 in the MinSig orientation.
//!
//! Signatures and message hashes live in G1 (48-byte compressed), public keys
//! in G2 (96-byte compressed), serialized in the ZCash format. All unsafe
//! calls into [blst] are confined to this module.
//!
//! # Warning
//!
//! Points received from untrusted sources must be checked to belong to the
//! correct subgroup to prevent small-subgroup attacks. The `deserialize`
//! functions here take care of that; the candidate decoding used by
//! try-and-increment instead clears the cofactor, which lands any curve
//! point in the prime-order subgroup.

use blst::{
    blst_bendian_from_scalar, blst_fr, blst_fr_add, blst_fr_from_scalar, blst_fr_mul,
    blst_keygen_v3, blst_p1, blst_p1_add_or_double, blst_p1_affine, blst_p1_compress,
    blst_p1_deserialize, blst_p1_from_affine, blst_p1_in_g1, blst_p1_is_equal, blst_p1_is_inf,
    blst_p1_mult, blst_p1_serialize, blst_p1_to_affine, blst_p1_uncompress, blst_p2,
    blst_p2_add_or_double, blst_p2_affine, blst_p2_cneg, blst_p2_compress, blst_p2_deserialize,
    blst_p2_from_affine, blst_p2_in_g2, blst_p2_is_equal, blst_p2_is_inf, blst_p2_mult,
    blst_p2_serialize, blst_p2_to_affine, blst_p2_uncompress, blst_scalar, blst_scalar_fr_check,
    blst_scalar_from_bendian, blst_scalar_from_fr, Pairing as blst_pairing, BLS12_381_G1,
    BLS12_381_G2, BLS12_381_NEG_G2, BLST_ERROR,
};
use rand::{CryptoRng, RngCore};
use std::ptr;
use zeroize::Zeroize;

/// Domain separation tag.
pub type DST = &'static [u8];

/// Domain separation tag for hashing a message to G1.
pub const MESSAGE_DST: DST = b"BLS_SIG_BLS12381G1_XOF:BLAKE3_TAI_POP_";

/// Domain separation tag for hashing a proof-of-possession message to G1.
///
/// Distinct from [MESSAGE_DST] so a proof of possession can never double as a
/// signature over the same bytes (and vice versa).
pub const PROOF_OF_POSSESSION_DST: DST = b"BLS_POP_BLS12381G1_XOF:BLAKE3_TAI_POP_";

/// Domain separation tag for deriving deterministic batch exponents.
pub(crate) const BATCH_DST: DST = b"BLS_BATCH_BLS12381G1_XOF:BLAKE3_DET_";

/// An element of a group.
pub trait Element: Clone + Eq + PartialEq + Send + Sync {
    /// Returns the additive identity.
    fn zero() -> Self;

    /// Returns the multiplicative identity.
    fn one() -> Self;

    /// Adds to self in-place.
    fn add(&mut self, rhs: &Self);

    /// Multiplies self in-place.
    fn mul(&mut self, rhs: &Scalar);

    /// Canonically serializes the element in compressed form.
    fn serialize(&self) -> Vec<u8>;

    /// Serializes the element in uncompressed form.
    ///
    /// For scalars the two forms coincide.
    fn serialize_uncompressed(&self) -> Vec<u8>;

    /// Compressed size of the element.
    fn size() -> usize;

    /// Uncompressed size of the element.
    fn uncompressed_size() -> usize;

    /// Deserializes a canonically encoded element, accepting either the
    /// compressed or the uncompressed form (selected by length).
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

/// An element of the BLS12-381 scalar field.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct Scalar(blst_fr);

pub const SCALAR_BYTE_LENGTH: usize = 32;

/// `R = 2^256 mod q` in little-endian Montgomery form which is equivalent to 1 in little-endian
/// non-Montgomery form.
///
/// mod(2^256, 0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001) = 0x1824b159acc5056f998c4fefecbc4ff55884b7fa0003480200000001fffffffe
// Reference: https://github.com/filecoin-project/blstrs/blob/ffbb41d1495d84e40a712583346439924603b49a/src/scalar.rs#L77-L89
const BLST_FR_ONE: Scalar = Scalar(blst_fr {
    l: [
        0x0000_0001_ffff_fffe,
        0x5884_b7fa_0003_4802,
        0x998c_4fef_ecbc_4ff5,
        0x1824_b159_acc5_056f,
    ],
});

/// A point on the G1 curve (where signatures and message hashes live).
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct G1(blst_p1);

pub const G1_COMPRESSED_BYTE_LENGTH: usize = 48;
pub const G1_UNCOMPRESSED_BYTE_LENGTH: usize = 96;

/// A point on the G2 curve (where public keys live).
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct G2(blst_p2);

pub const G2_COMPRESSED_BYTE_LENGTH: usize = 96;
pub const G2_UNCOMPRESSED_BYTE_LENGTH: usize = 192;

/// The G1 cofactor `0x396c8c005555e1568c00aaab0000aaab` in little-endian bytes.
///
/// Multiplying any point on the curve by the cofactor lands it in the
/// prime-order subgroup.
const G1_COFACTOR_LE: [u8; 16] = [
    0xab, 0xaa, 0x00, 0x00, 0xab, 0xaa, 0x00, 0x8c, 0x56, 0xe1, 0x55, 0x55, 0x00, 0x8c, 0x6c,
    0x39,
];
const G1_COFACTOR_BITS: usize = 126;

/// Returns the size in bits of a given blst_scalar (represented in little-endian).
fn bits(scalar: &blst_scalar) -> usize {
    let mut bits: usize = SCALAR_BYTE_LENGTH * 8;
    for i in scalar.b.iter().rev() {
        let leading = i.leading_zeros();
        bits -= leading as usize;
        if leading < 8 {
            break;
        }
    }
    bits
}

impl Scalar {
    /// Generates a random scalar using the provided RNG.
    pub fn rand<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        // Generate a random 64 byte buffer
        let mut ikm = [0u8; 64];
        rng.fill_bytes(&mut ikm);

        // Generate a scalar from the randomly populated buffer
        let mut ret = blst_fr::default();
        unsafe {
            let mut sc = blst_scalar::default();
            blst_keygen_v3(&mut sc, ikm.as_ptr(), ikm.len(), ptr::null(), 0);
            blst_fr_from_scalar(&mut ret, &sc);
        }
        ikm.zeroize();
        Self(ret)
    }

    /// Builds a scalar from a 128-bit integer.
    ///
    /// Always canonical: every 128-bit value is below the group order.
    pub(crate) fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; SCALAR_BYTE_LENGTH];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_bendian(&mut scalar, bytes.as_ptr());
            blst_fr_from_scalar(&mut ret, &scalar);
        }
        Self(ret)
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.l.zeroize();
    }
}

impl Element for Scalar {
    fn zero() -> Self {
        Self(blst_fr::default())
    }

    fn one() -> Self {
        BLST_FR_ONE
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_add(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_mul(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut bytes = [0u8; SCALAR_BYTE_LENGTH];
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_fr(&mut scalar, &self.0);
            blst_bendian_from_scalar(bytes.as_mut_ptr(), &scalar);
        }
        bytes.to_vec()
    }

    fn serialize_uncompressed(&self) -> Vec<u8> {
        self.serialize()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SCALAR_BYTE_LENGTH {
            return None;
        }
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_bendian(&mut scalar, bytes.as_ptr());

            // Reject values at or above the group order
            if !blst_scalar_fr_check(&scalar) {
                return None;
            }
            blst_fr_from_scalar(&mut ret, &scalar);
        }
        Some(Self(ret))
    }

    fn size() -> usize {
        SCALAR_BYTE_LENGTH
    }

    fn uncompressed_size() -> usize {
        SCALAR_BYTE_LENGTH
    }
}

impl G1 {
    /// Decodes 48 bytes of XOF output as a compressed candidate point.
    ///
    /// The ZCash header bits are forced first (compressed set, infinity
    /// cleared, the sign bit keeping its value from the XOF), then the
    /// x-coordinate is decompressed and the cofactor cleared. Returns `None`
    /// when the bytes do not name an x-coordinate on the curve or the result
    /// is the identity, in which case the caller moves to its next attempt.
    pub(crate) fn from_candidate(bytes: &[u8; G1_COMPRESSED_BYTE_LENGTH]) -> Option<Self> {
        let mut candidate = *bytes;
        candidate[0] &= 0b1011_1111;
        candidate[0] |= 0b1000_0000;
        let mut ret = blst_p1::default();
        unsafe {
            let mut affine = blst_p1_affine::default();
            if blst_p1_uncompress(&mut affine, candidate.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return None;
            }
            blst_p1_from_affine(&mut ret, &affine);
            blst_p1_mult(&mut ret, &ret, G1_COFACTOR_LE.as_ptr(), G1_COFACTOR_BITS);
            if blst_p1_is_inf(&ret) {
                return None;
            }
        }
        Some(Self(ret))
    }

    pub(crate) fn as_blst_p1_affine(&self) -> blst_p1_affine {
        let mut affine = blst_p1_affine::default();
        unsafe { blst_p1_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl PartialEq for G1 {
    fn eq(&self, other: &Self) -> bool {
        // Projective coordinates are not unique, so compare in the group
        unsafe { blst_p1_is_equal(&self.0, &other.0) }
    }
}

impl Eq for G1 {}

impl Element for G1 {
    fn zero() -> Self {
        Self(blst_p1::default())
    }

    fn one() -> Self {
        let mut ret = blst_p1::default();
        unsafe {
            blst_p1_from_affine(&mut ret, &BLS12_381_G1);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p1_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar: blst_scalar = blst_scalar::default();
        unsafe {
            blst_scalar_from_fr(&mut scalar, &rhs.0);
            blst_p1_mult(&mut self.0, &self.0, scalar.b.as_ptr(), bits(&scalar));
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut bytes = [0u8; G1_COMPRESSED_BYTE_LENGTH];
        unsafe {
            blst_p1_compress(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }

    fn serialize_uncompressed(&self) -> Vec<u8> {
        let mut bytes = [0u8; G1_UNCOMPRESSED_BYTE_LENGTH];
        unsafe {
            blst_p1_serialize(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        let mut ret = blst_p1::default();
        unsafe {
            let mut affine = blst_p1_affine::default();
            match bytes.len() {
                G1_COMPRESSED_BYTE_LENGTH => {
                    if blst_p1_uncompress(&mut affine, bytes.as_ptr())
                        != BLST_ERROR::BLST_SUCCESS
                    {
                        return None;
                    }
                }
                G1_UNCOMPRESSED_BYTE_LENGTH => {
                    // A compressed header with trailing bytes is not canonical
                    if bytes[0] & 0x80 != 0 {
                        return None;
                    }
                    if blst_p1_deserialize(&mut affine, bytes.as_ptr())
                        != BLST_ERROR::BLST_SUCCESS
                    {
                        return None;
                    }
                }
                _ => return None,
            }
            blst_p1_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p1_is_inf(&ret) {
                return None;
            }

            // Verify that the deserialized element is in G1
            if !blst_p1_in_g1(&ret) {
                return None;
            }
        }
        Some(Self(ret))
    }

    fn size() -> usize {
        G1_COMPRESSED_BYTE_LENGTH
    }

    fn uncompressed_size() -> usize {
        G1_UNCOMPRESSED_BYTE_LENGTH
    }
}

impl G2 {
    /// Negates the point in-place.
    pub(crate) fn neg(&mut self) {
        unsafe { blst_p2_cneg(&mut self.0, true) };
    }

    pub(crate) fn as_blst_p2_affine(&self) -> blst_p2_affine {
        let mut affine = blst_p2_affine::default();
        unsafe { blst_p2_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl PartialEq for G2 {
    fn eq(&self, other: &Self) -> bool {
        // Projective coordinates are not unique, so compare in the group
        unsafe { blst_p2_is_equal(&self.0, &other.0) }
    }
}

impl Eq for G2 {}

impl Element for G2 {
    fn zero() -> Self {
        Self(blst_p2::default())
    }

    fn one() -> Self {
        let mut ret = blst_p2::default();
        unsafe {
            blst_p2_from_affine(&mut ret, &BLS12_381_G2);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p2_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar = blst_scalar::default();
        unsafe {
            blst_scalar_from_fr(&mut scalar, &rhs.0);
            blst_p2_mult(&mut self.0, &self.0, scalar.b.as_ptr(), bits(&scalar));
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut bytes = [0u8; G2_COMPRESSED_BYTE_LENGTH];
        unsafe {
            blst_p2_compress(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }

    fn serialize_uncompressed(&self) -> Vec<u8> {
        let mut bytes = [0u8; G2_UNCOMPRESSED_BYTE_LENGTH];
        unsafe {
            blst_p2_serialize(bytes.as_mut_ptr(), &self.0);
        }
        bytes.to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        let mut ret = blst_p2::default();
        unsafe {
            let mut affine = blst_p2_affine::default();
            match bytes.len() {
                G2_COMPRESSED_BYTE_LENGTH => {
                    if blst_p2_uncompress(&mut affine, bytes.as_ptr())
                        != BLST_ERROR::BLST_SUCCESS
                    {
                        return None;
                    }
                }
                G2_UNCOMPRESSED_BYTE_LENGTH => {
                    // A compressed header with trailing bytes is not canonical
                    if bytes[0] & 0x80 != 0 {
                        return None;
                    }
                    if blst_p2_deserialize(&mut affine, bytes.as_ptr())
                        != BLST_ERROR::BLST_SUCCESS
                    {
                        return None;
                    }
                }
                _ => return None,
            }
            blst_p2_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p2_is_inf(&ret) {
                return None;
            }

            // Verify that the deserialized element is in G2
            if !blst_p2_in_g2(&ret) {
                return None;
            }
        }
        Some(Self(ret))
    }

    fn size() -> usize {
        G2_COMPRESSED_BYTE_LENGTH
    }

    fn uncompressed_size() -> usize {
        G2_UNCOMPRESSED_BYTE_LENGTH
    }
}

/// Verifies that `e(hm,pk)` is equal to `e(sig,G2::one())` using a single
/// product check with a negated G2 generator (`e(hm,pk) * e(sig,-G2::one()) == 1`).
pub(crate) fn verify_pairing(public: &G2, hm: &G1, signature: &G1) -> bool {
    // Create a pairing context
    //
    // We only handle pre-hashed messages, so we leave the domain separator tag (`DST`) empty.
    let mut pairing = blst_pairing::new(false, &[]);

    // Convert `sig` into affine and aggregate `e(sig,-G2::one())`
    let q = signature.as_blst_p1_affine();
    unsafe {
        pairing.raw_aggregate(&BLS12_381_NEG_G2, &q);
    }

    // Convert `pk` and `hm` into affine and aggregate `e(hm,pk)`
    let p = public.as_blst_p2_affine();
    let q = hm.as_blst_p1_affine();
    pairing.raw_aggregate(&p, &q);

    // Finalize the pairing accumulation and verify the result
    //
    // If `finalverify()` returns `true`, it means `e(hm,pk) * e(sig,-G2::one()) == 1`. This
    // is equivalent to `e(hm,pk) == e(sig,G2::one())`.
    pairing.commit();
    pairing.finalverify(None)
}

/// Verifies that `e(combined,-G2::one()) * Π e(hmᵢ,pkᵢ) == 1` with a single
/// n+1-term product, where `combined` is the weighted sum of signatures and
/// each `hmᵢ` carries its weight already.
pub(crate) fn verify_pairing_product(terms: &[(G2, G1)], combined: &G1) -> bool {
    let mut pairing = blst_pairing::new(false, &[]);
    let q = combined.as_blst_p1_affine();
    unsafe {
        pairing.raw_aggregate(&BLS12_381_NEG_G2, &q);
    }
    for (public, hm) in terms {
        let p = public.as_blst_p2_affine();
        let q = hm.as_blst_p1_affine();
        pairing.raw_aggregate(&p, &q);
    }
    pairing.commit();
    pairing.finalverify(None)
}
