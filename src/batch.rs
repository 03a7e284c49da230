//! Batch verification: many signature checks folded into one pairing product.

use crate::{
    aggregate::{aggregate_public_keys, aggregate_signatures},
    group::{verify_pairing, verify_pairing_product, Element, Scalar, G1, BATCH_DST, MESSAGE_DST},
    hash::{DirectXof, HashToCurve, Xof},
    keys::{PublicKey, Signature},
    Error,
};
use rand::{CryptoRng, RngCore};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// One signed message inside a randomized batch.
#[derive(Clone, Copy, Debug)]
pub struct Message<'a> {
    pub data: &'a [u8],
    pub extra: &'a [u8],
    pub public_key: &'a PublicKey,
    pub signature: &'a Signature,
}

/// One aggregated attestation inside a strict batch: a single message signed
/// by many validators, with the keys and signatures still unaggregated.
///
/// The two lists pair up by index and must have equal, nonzero length.
#[derive(Clone, Copy, Debug)]
pub struct Batch<'a> {
    pub data: &'a [u8],
    pub extra: &'a [u8],
    pub public_keys: &'a [PublicKey],
    pub signatures: &'a [Signature],
}

fn build_pool(concurrency: usize) -> Option<ThreadPool> {
    // Avoid pool overhead when concurrency is 1
    if concurrency <= 1 {
        return None;
    }
    Some(
        ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .build()
            .expect("Unable to build thread pool"),
    )
}

/// Verifies `n` independent signed messages with one `n+1`-term pairing
/// product instead of `n` separate pairing checks.
///
/// Each tuple is weighted by a fresh random nonzero scalar before folding, so
/// entries cannot cancel against each other: a batch containing any invalid
/// tuple fails except with probability ~2^-255. An empty batch is vacuously
/// valid.
///
/// Returns one boolean for the whole batch; callers that need to know which
/// tuple failed fall back to [PublicKey::verify] per tuple.
pub fn batch_verify<H, R>(
    rng: &mut R,
    messages: &[Message<'_>],
    hasher: &H,
    concurrency: usize,
) -> Result<bool, Error>
where
    H: HashToCurve,
    R: RngCore + CryptoRng,
{
    if messages.is_empty() {
        return Ok(true);
    }

    // Hash every message to the curve, in parallel when requested
    let hms: Result<Vec<G1>, Error> = match build_pool(concurrency) {
        Some(pool) => pool.install(|| {
            messages
                .par_iter()
                .map(|message| hasher.hash(MESSAGE_DST, message.data, message.extra))
                .collect()
        }),
        None => messages
            .iter()
            .map(|message| hasher.hash(MESSAGE_DST, message.data, message.extra))
            .collect(),
    };
    let hms = hms?;

    // Weight and fold the tuples
    let mut combined = G1::zero();
    let mut terms = Vec::with_capacity(messages.len());
    for (message, mut hm) in messages.iter().zip(hms) {
        // Generate a non-zero random scalar
        let scalar = loop {
            let scalar = Scalar::rand(rng);
            if scalar != Scalar::zero() {
                break scalar;
            }
        };

        let mut signature = *message.signature.point();
        signature.mul(&scalar);
        combined.add(&signature);

        hm.mul(&scalar);
        terms.push((*message.public_key.point(), hm));
    }
    Ok(verify_pairing_product(&terms, &combined))
}

/// Verifies a sequence of aggregated attestations, reporting one boolean per
/// batch.
///
/// Per batch, the keys and signatures are aggregated and the message hashed;
/// a single pairing product over every batch (weighted by 128-bit exponents
/// derived deterministically from a transcript of all inputs) then settles
/// the common case in one shot. Only when that combined check fails does each
/// batch get its own pairing check to localize the failures.
///
/// The deterministic exponents make results reproducible across runs,
/// machines, and `concurrency` settings, and cannot be predicted without
/// first fixing every batch's contents. The overall outcome is the
/// conjunction of the returned booleans.
pub fn batch_verify_strict<H: HashToCurve>(
    batches: &[Batch<'_>],
    hasher: &H,
    concurrency: usize,
) -> Result<Vec<bool>, Error> {
    for batch in batches {
        if batch.public_keys.is_empty() {
            return Err(Error::AggregationEmptyInput);
        }
        if batch.public_keys.len() != batch.signatures.len() {
            return Err(Error::InputMalformed(
                "batch key and signature counts differ",
            ));
        }
    }
    if batches.is_empty() {
        return Ok(Vec::new());
    }

    // Aggregate each batch and hash its message, in parallel when requested
    let prepare = |batch: &Batch<'_>| -> Result<(PublicKey, Signature, G1), Error> {
        let key = aggregate_public_keys(batch.public_keys)?;
        let signature = aggregate_signatures(batch.signatures)?;
        let hm = hasher.hash(MESSAGE_DST, batch.data, batch.extra)?;
        Ok((key, signature, hm))
    };
    let pool = build_pool(concurrency);
    let prepared: Result<Vec<_>, Error> = match &pool {
        Some(pool) => pool.install(|| batches.par_iter().map(prepare).collect()),
        None => batches.iter().map(prepare).collect(),
    };
    let prepared = prepared?;

    // Fold all batches into one product under deterministic exponents
    let exponents = derive_exponents(batches);
    let mut combined = G1::zero();
    let mut terms = Vec::with_capacity(prepared.len());
    for ((key, signature, hm), exponent) in prepared.iter().zip(&exponents) {
        let mut signature = *signature.point();
        signature.mul(exponent);
        combined.add(&signature);

        let mut hm = *hm;
        hm.mul(exponent);
        terms.push((*key.point(), hm));
    }
    if verify_pairing_product(&terms, &combined) {
        return Ok(vec![true; batches.len()]);
    }

    // Localize the failing batches
    debug!(
        batches = batches.len(),
        "combined batch check failed, checking batches individually"
    );
    let check =
        |(key, signature, hm): &(PublicKey, Signature, G1)| -> bool {
            verify_pairing(key.point(), hm, signature.point())
        };
    let results = match &pool {
        Some(pool) => pool.install(|| prepared.par_iter().map(check).collect()),
        None => prepared.iter().map(check).collect(),
    };
    Ok(results)
}

/// Derives one 128-bit exponent per batch from a transcript of every batch's
/// contents.
fn derive_exponents(batches: &[Batch<'_>]) -> Vec<Scalar> {
    // Length-prefix each variable-width field so distinct inputs can never
    // produce the same transcript
    let mut transcript = blake3::Hasher::new();
    for batch in batches {
        transcript.update(&(batch.data.len() as u32).to_be_bytes());
        transcript.update(batch.data);
        transcript.update(&(batch.extra.len() as u32).to_be_bytes());
        transcript.update(batch.extra);
        transcript.update(&(batch.public_keys.len() as u32).to_be_bytes());
        for key in batch.public_keys {
            transcript.update(&key.serialize());
        }
        for signature in batch.signatures {
            transcript.update(&signature.serialize());
        }
    }
    let seed = transcript.finalize();

    let mut exponents = Vec::with_capacity(batches.len());
    for index in 0..batches.len() as u32 {
        let mut payload = [0u8; 37];
        payload[..32].copy_from_slice(seed.as_bytes());
        payload[32..36].copy_from_slice(&index.to_be_bytes());

        // Re-expand with a bumped retry byte in the negligible case where the
        // expansion is all zeros
        let exponent = loop {
            let expanded = DirectXof.expand(BATCH_DST, &payload, 16);
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(&expanded);
            let value = u128::from_be_bytes(bytes);
            if value != 0 {
                break Scalar::from_u128(value);
            }
            payload[36] += 1;
        };
        exponents.push(exponent);
    }
    exponents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hash::{TryAndIncrement, TryAndIncrementCip22},
        keys::PrivateKey,
    };
    use rand::{rngs::StdRng, SeedableRng};

    struct Signed {
        data: Vec<u8>,
        extra: Vec<u8>,
        publics: Vec<PublicKey>,
        signatures: Vec<Signature>,
    }

    fn sign_batches<H: HashToCurve>(
        sizes: &[usize],
        hasher: &H,
        rng: &mut StdRng,
    ) -> Vec<Signed> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let data = format!("epoch {i}").into_bytes();
                let extra = format!("round {i}").into_bytes();
                let privates: Vec<_> = (0..*n).map(|_| PrivateKey::generate(rng)).collect();
                Signed {
                    publics: privates.iter().map(|p| p.public_key()).collect(),
                    signatures: privates
                        .iter()
                        .map(|p| p.sign(&data, &extra, hasher).unwrap())
                        .collect(),
                    data,
                    extra,
                }
            })
            .collect()
    }

    fn as_batches(signed: &[Signed]) -> Vec<Batch<'_>> {
        signed
            .iter()
            .map(|s| Batch {
                data: &s.data,
                extra: &s.extra,
                public_keys: &s.publics,
                signatures: &s.signatures,
            })
            .collect()
    }

    #[test]
    fn randomized_batch_accepts_honest_tuples() {
        let mut rng = StdRng::seed_from_u64(0);
        let hasher = TryAndIncrement::direct();
        let privates: Vec<_> = (0..5).map(|_| PrivateKey::generate(&mut rng)).collect();
        let publics: Vec<_> = privates.iter().map(|p| p.public_key()).collect();
        let datas: Vec<_> = (0..5u32).map(|i| i.to_be_bytes().to_vec()).collect();
        let signatures: Vec<_> = privates
            .iter()
            .zip(&datas)
            .map(|(p, d)| p.sign(d, &[], &hasher).unwrap())
            .collect();

        let messages: Vec<_> = (0..5)
            .map(|i| Message {
                data: &datas[i],
                extra: &[],
                public_key: &publics[i],
                signature: &signatures[i],
            })
            .collect();
        for concurrency in [1, 4] {
            assert!(batch_verify(&mut rng, &messages, &hasher, concurrency).unwrap());
        }
        assert!(batch_verify(&mut rng, &[], &hasher, 1).unwrap());
    }

    #[test]
    fn randomized_batch_rejects_a_single_corruption() {
        let mut rng = StdRng::seed_from_u64(1);
        let hasher = TryAndIncrement::direct();
        let privates: Vec<_> = (0..5).map(|_| PrivateKey::generate(&mut rng)).collect();
        let publics: Vec<_> = privates.iter().map(|p| p.public_key()).collect();
        let datas: Vec<_> = (0..5u32).map(|i| i.to_be_bytes().to_vec()).collect();
        let mut signatures: Vec<_> = privates
            .iter()
            .zip(&datas)
            .map(|(p, d)| p.sign(d, &[], &hasher).unwrap())
            .collect();

        // Swapping two individually valid signatures must still fail: the
        // random weights prevent errors cancelling across tuples
        signatures.swap(1, 3);
        let messages: Vec<_> = (0..5)
            .map(|i| Message {
                data: &datas[i],
                extra: &[],
                public_key: &publics[i],
                signature: &signatures[i],
            })
            .collect();
        assert!(!batch_verify(&mut rng, &messages, &hasher, 1).unwrap());
    }

    #[test]
    fn strict_accepts_honest_batches() {
        let mut rng = StdRng::seed_from_u64(2);
        let hasher = TryAndIncrementCip22;
        let signed = sign_batches(&[3, 1, 5], &hasher, &mut rng);
        let batches = as_batches(&signed);

        let sequential = batch_verify_strict(&batches, &hasher, 1).unwrap();
        assert_eq!(sequential, vec![true, true, true]);

        // Deterministic across repeats and concurrency settings
        assert_eq!(batch_verify_strict(&batches, &hasher, 1).unwrap(), sequential);
        assert_eq!(batch_verify_strict(&batches, &hasher, 4).unwrap(), sequential);
        assert!(batch_verify_strict(&[], &hasher, 1).unwrap().is_empty());
    }

    #[test]
    fn strict_localizes_corrupted_batches() {
        let mut rng = StdRng::seed_from_u64(3);
        let hasher = TryAndIncrementCip22;
        let mut signed = sign_batches(&[3, 4, 2], &hasher, &mut rng);

        // Corrupt the middle batch by dropping a signer's contribution
        signed[1].signatures[0] = signed[1].signatures[1];
        let batches = as_batches(&signed);

        let results = batch_verify_strict(&batches, &hasher, 1).unwrap();
        assert_eq!(results, vec![true, false, true]);
        assert!(!results.iter().all(|r| *r));
    }

    #[test]
    fn strict_rejects_malformed_batches() {
        let mut rng = StdRng::seed_from_u64(4);
        let hasher = TryAndIncrementCip22;
        let signed = sign_batches(&[2], &hasher, &mut rng);

        let mismatched = Batch {
            data: &signed[0].data,
            extra: &signed[0].extra,
            public_keys: &signed[0].publics,
            signatures: &signed[0].signatures[..1],
        };
        assert_eq!(
            batch_verify_strict(&[mismatched], &hasher, 1).unwrap_err(),
            Error::InputMalformed("batch key and signature counts differ")
        );

        let empty = Batch {
            data: &signed[0].data,
            extra: &signed[0].extra,
            public_keys: &[],
            signatures: &[],
        };
        assert_eq!(
            batch_verify_strict(&[empty], &hasher, 1).unwrap_err(),
            Error::AggregationEmptyInput
        );
    }

    #[test]
    fn exponents_are_deterministic_and_input_bound() {
        let mut rng = StdRng::seed_from_u64(5);
        let hasher = TryAndIncrementCip22;
        let signed = sign_batches(&[2, 2], &hasher, &mut rng);
        let batches = as_batches(&signed);

        let first = derive_exponents(&batches);
        let second = derive_exponents(&batches);
        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);

        // Any change to any batch changes every exponent
        let mut altered = signed;
        altered[1].data[0] ^= 0x01;
        let altered = as_batches(&altered);
        let third = derive_exponents(&altered);
        assert_ne!(first[0], third[0]);
        assert_ne!(first[1], third[1]);
    }
}
