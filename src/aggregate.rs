//! Aggregation of public keys and signatures by group addition.

use crate::{
    group::{Element, G1, G2},
    keys::{PublicKey, Signature},
    Error,
};

/// Aggregates public keys by group addition.
///
/// Order-independent. Errors on empty input.
pub fn aggregate_public_keys(keys: &[PublicKey]) -> Result<PublicKey, Error> {
    if keys.is_empty() {
        return Err(Error::AggregationEmptyInput);
    }
    let mut sum = G2::zero();
    for key in keys {
        sum.add(key.point());
    }
    Ok(PublicKey::from_point(sum))
}

/// Aggregates signatures over the same message by group addition.
///
/// Order-independent. Errors on empty input.
pub fn aggregate_signatures(signatures: &[Signature]) -> Result<Signature, Error> {
    if signatures.is_empty() {
        return Err(Error::AggregationEmptyInput);
    }
    let mut sum = G1::zero();
    for signature in signatures {
        sum.add(signature.point());
    }
    Ok(Signature::from_point(sum))
}

/// Removes a subset of keys from a running aggregate, returning
/// `aggregate - Σ keys`.
///
/// An empty subset is a no-op; subtracting every key that formed the
/// aggregate yields the identity. This is the fast path for attestations
/// where most validators sign: keep the full-set aggregate around and
/// subtract the few absentees.
pub fn aggregate_public_keys_subtract(
    aggregate: &PublicKey,
    keys: &[PublicKey],
) -> PublicKey {
    let mut subtotal = G2::zero();
    for key in keys {
        subtotal.add(key.point());
    }
    subtotal.neg();
    let mut sum = *aggregate.point();
    sum.add(&subtotal);
    PublicKey::from_point(sum)
}
