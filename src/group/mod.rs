// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Prime-order groups with hash-to-curve capability, used by the OPRF and the
//! AKE. Scalars and elements carry their group variant; a configuration only
//! ever mixes values of the same variant.

mod nist;
mod ristretto;

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::IsIdentity;
use elliptic_curve::ff::{Field, PrimeField};
use elliptic_curve::group::Group as _;
use generic_array::GenericArray;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use self::nist::{p256_impl, p384_impl, p521_impl};
use crate::errors::{utils::check_slice_size, InternalError, ProtocolError};

/// Identifies a prime-order group with hash-to-curve capability.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Group {
    /// Ristretto255 with SHA-512
    Ristretto255,
    /// NIST P-256 with SHA-256
    P256,
    /// NIST P-384 with SHA-384
    P384,
    /// NIST P-521 with SHA-512
    P521,
}

impl Group {
    /// The single-byte group identifier.
    pub fn identifier(self) -> u8 {
        match self {
            Group::Ristretto255 => 1,
            Group::P256 => 3,
            Group::P384 => 4,
            Group::P521 => 5,
        }
    }

    pub(crate) fn from_identifier(id: u8) -> Option<Self> {
        match id {
            1 => Some(Group::Ristretto255),
            3 => Some(Group::P256),
            4 => Some(Group::P384),
            5 => Some(Group::P521),
            _ => None,
        }
    }

    /// Length of the canonical element encoding in bytes.
    pub fn element_len(self) -> usize {
        match self {
            Group::Ristretto255 => 32,
            Group::P256 => 33,
            Group::P384 => 49,
            Group::P521 => 67,
        }
    }

    /// Length of the canonical scalar encoding in bytes.
    pub fn scalar_len(self) -> usize {
        match self {
            Group::Ristretto255 => 32,
            Group::P256 => 32,
            Group::P384 => 48,
            Group::P521 => 66,
        }
    }

    pub(crate) fn base(self) -> Element {
        match self {
            Group::Ristretto255 => Element::Ristretto255(RISTRETTO_BASEPOINT_POINT),
            Group::P256 => Element::P256(p256::ProjectivePoint::GENERATOR),
            Group::P384 => Element::P384(p384::ProjectivePoint::GENERATOR),
            Group::P521 => Element::P521(p521::ProjectivePoint::GENERATOR),
        }
    }

    /// Samples a uniformly random nonzero scalar.
    pub(crate) fn random_scalar<R: RngCore + CryptoRng>(self, rng: &mut R) -> Scalar {
        match self {
            Group::Ristretto255 => Scalar::Ristretto255(ristretto::random_nonzero_scalar(rng)),
            Group::P256 => loop {
                let scalar = p256::Scalar::random(&mut *rng);
                if !bool::from(scalar.is_zero()) {
                    break Scalar::P256(scalar);
                }
            },
            Group::P384 => loop {
                let scalar = p384::Scalar::random(&mut *rng);
                if !bool::from(scalar.is_zero()) {
                    break Scalar::P384(scalar);
                }
            },
            Group::P521 => loop {
                let scalar = p521::Scalar::random(&mut *rng);
                if !bool::from(scalar.is_zero()) {
                    break Scalar::P521(scalar);
                }
            },
        }
    }

    /// Hashes `input` to a group element with the given domain separation tag.
    pub(crate) fn hash_to_group(
        self,
        input: &[&[u8]],
        dst: &[u8],
    ) -> Result<Element, InternalError> {
        match self {
            Group::Ristretto255 => ristretto::hash_to_group(input, dst).map(Element::Ristretto255),
            Group::P256 => p256_impl::hash_to_group(input, dst).map(Element::P256),
            Group::P384 => p384_impl::hash_to_group(input, dst).map(Element::P384),
            Group::P521 => p521_impl::hash_to_group(input, dst).map(Element::P521),
        }
    }

    /// Hashes `input` to a scalar with the given domain separation tag. The
    /// result may be zero; callers that need a nonzero scalar must resample.
    pub(crate) fn hash_to_scalar(
        self,
        input: &[&[u8]],
        dst: &[u8],
    ) -> Result<Scalar, InternalError> {
        match self {
            Group::Ristretto255 => ristretto::hash_to_scalar(input, dst).map(Scalar::Ristretto255),
            Group::P256 => p256_impl::hash_to_scalar(input, dst).map(Scalar::P256),
            Group::P384 => p384_impl::hash_to_scalar(input, dst).map(Scalar::P384),
            Group::P521 => p521_impl::hash_to_scalar(input, dst).map(Scalar::P521),
        }
    }

    /// Decodes a canonical element encoding, rejecting the identity.
    pub(crate) fn deserialize_element(self, bytes: &[u8]) -> Result<Element, ProtocolError> {
        check_slice_size(bytes, self.element_len(), "group element")?;

        let element = match self {
            Group::Ristretto255 => Element::Ristretto255(ristretto::deserialize_point(bytes)?),
            Group::P256 => Element::P256(p256_impl::deserialize_point(bytes)?),
            Group::P384 => Element::P384(p384_impl::deserialize_point(bytes)?),
            Group::P521 => Element::P521(p521_impl::deserialize_point(bytes)?),
        };

        if element.is_identity() {
            return Err(ProtocolError::NonCanonicalEncoding);
        }

        Ok(element)
    }

    /// Decodes a canonical scalar encoding. Zero scalars decode successfully;
    /// callers reject them where the protocol requires it.
    pub(crate) fn deserialize_scalar(self, bytes: &[u8]) -> Result<Scalar, ProtocolError> {
        check_slice_size(bytes, self.scalar_len(), "scalar")?;

        match self {
            Group::Ristretto255 => ristretto::deserialize_scalar(bytes).map(Scalar::Ristretto255),
            Group::P256 => {
                let repr = GenericArray::clone_from_slice(bytes);
                Option::<p256::Scalar>::from(p256::Scalar::from_repr(repr))
                    .map(Scalar::P256)
                    .ok_or(ProtocolError::NonCanonicalEncoding)
            }
            Group::P384 => {
                let repr = GenericArray::clone_from_slice(bytes);
                Option::<p384::Scalar>::from(p384::Scalar::from_repr(repr))
                    .map(Scalar::P384)
                    .ok_or(ProtocolError::NonCanonicalEncoding)
            }
            Group::P521 => {
                let repr = GenericArray::clone_from_slice(bytes);
                Option::<p521::Scalar>::from(p521::Scalar::from_repr(repr))
                    .map(Scalar::P521)
                    .ok_or(ProtocolError::NonCanonicalEncoding)
            }
        }
    }
}

/// A group element.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Element {
    Ristretto255(RistrettoPoint),
    P256(p256::ProjectivePoint),
    P384(p384::ProjectivePoint),
    P521(p521::ProjectivePoint),
}

impl Element {
    /// The canonical compressed encoding.
    pub(crate) fn serialize(&self) -> Vec<u8> {
        match self {
            Element::Ristretto255(p) => p.compress().to_bytes().to_vec(),
            Element::P256(p) => p256_impl::serialize_point(p),
            Element::P384(p) => p384_impl::serialize_point(p),
            Element::P521(p) => p521_impl::serialize_point(p),
        }
    }

    pub(crate) fn mult(&self, scalar: &Scalar) -> Element {
        match (self, scalar) {
            (Element::Ristretto255(p), Scalar::Ristretto255(s)) => Element::Ristretto255(p * s),
            (Element::P256(p), Scalar::P256(s)) => Element::P256(*p * *s),
            (Element::P384(p), Scalar::P384(s)) => Element::P384(*p * *s),
            (Element::P521(p), Scalar::P521(s)) => Element::P521(*p * *s),
            // element and scalar variants always come from the same configured group
            _ => unreachable!("group mismatch"),
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        match self {
            Element::Ristretto255(p) => p.is_identity(),
            Element::P256(p) => p.is_identity().into(),
            Element::P384(p) => p.is_identity().into(),
            Element::P521(p) => p.is_identity().into(),
        }
    }
}

/// A scalar modulo the group order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Scalar {
    Ristretto255(curve25519_dalek::scalar::Scalar),
    P256(p256::Scalar),
    P384(p384::Scalar),
    P521(p521::Scalar),
}

impl Scalar {
    /// The canonical encoding.
    pub(crate) fn serialize(&self) -> Vec<u8> {
        match self {
            Scalar::Ristretto255(s) => s.to_bytes().to_vec(),
            Scalar::P256(s) => s.to_repr().to_vec(),
            Scalar::P384(s) => s.to_repr().to_vec(),
            Scalar::P521(s) => s.to_repr().to_vec(),
        }
    }

    /// The multiplicative inverse. Callers uphold the nonzero invariant; the
    /// inverse of zero is zero.
    pub(crate) fn invert(&self) -> Scalar {
        match self {
            Scalar::Ristretto255(s) => Scalar::Ristretto255(s.invert()),
            Scalar::P256(s) => Scalar::P256(Option::from(s.invert()).unwrap_or(p256::Scalar::ZERO)),
            Scalar::P384(s) => Scalar::P384(Option::from(s.invert()).unwrap_or(p384::Scalar::ZERO)),
            Scalar::P521(s) => Scalar::P521(Option::from(s.invert()).unwrap_or(p521::Scalar::ZERO)),
        }
    }

    pub(crate) fn is_zero(&self) -> bool {
        match self {
            Scalar::Ristretto255(s) => *s == curve25519_dalek::scalar::Scalar::ZERO,
            Scalar::P256(s) => s.is_zero().into(),
            Scalar::P384(s) => s.is_zero().into(),
            Scalar::P521(s) => s.is_zero().into(),
        }
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        match self {
            Scalar::Ristretto255(s) => *s = curve25519_dalek::scalar::Scalar::ZERO,
            Scalar::P256(s) => *s = p256::Scalar::ZERO,
            Scalar::P384(s) => *s = p384::Scalar::ZERO,
            Scalar::P521(s) => *s = p521::Scalar::ZERO,
        }
    }
}

// Tests
// =====

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    const GROUPS: [Group; 4] = [Group::Ristretto255, Group::P256, Group::P384, Group::P521];

    #[test]
    fn element_encoding_round_trip() {
        let mut rng = OsRng;

        for group in GROUPS {
            let scalar = group.random_scalar(&mut rng);
            let element = group.base().mult(&scalar);

            let encoded = element.serialize();
            assert_eq!(encoded.len(), group.element_len());
            assert_eq!(group.deserialize_element(&encoded).unwrap(), element);
        }
    }

    #[test]
    fn scalar_encoding_round_trip() {
        let mut rng = OsRng;

        for group in GROUPS {
            let scalar = group.random_scalar(&mut rng);

            let encoded = scalar.serialize();
            assert_eq!(encoded.len(), group.scalar_len());
            assert_eq!(group.deserialize_scalar(&encoded).unwrap(), scalar);
        }
    }

    #[test]
    fn element_decoding_rejects_bad_lengths() {
        for group in GROUPS {
            let encoded = group.base().serialize();
            assert!(group.deserialize_element(&encoded[..encoded.len() - 1]).is_err());
            assert!(group
                .deserialize_element(&[encoded.clone(), vec![0]].concat())
                .is_err());
        }
    }

    #[test]
    fn element_decoding_rejects_identity() {
        // The Ristretto255 identity has a valid 32-byte encoding of all zeros.
        let identity = vec![0u8; 32];
        assert_eq!(
            Group::Ristretto255.deserialize_element(&identity),
            Err(ProtocolError::NonCanonicalEncoding)
        );
    }

    #[test]
    fn scalar_decoding_rejects_non_canonical() {
        for group in GROUPS {
            // The group order is larger than 2^(8*(len-1)), so the all-0xff
            // string of scalar length is never a canonical encoding.
            let non_canonical = vec![0xffu8; group.scalar_len()];
            assert_eq!(
                group.deserialize_scalar(&non_canonical),
                Err(ProtocolError::NonCanonicalEncoding)
            );
        }
    }

    #[test]
    fn blinding_inverts() {
        let mut rng = OsRng;

        for group in GROUPS {
            let element = group
                .hash_to_group(&[&b"some input"[..]], b"TestDST")
                .unwrap();
            let blind = group.random_scalar(&mut rng);

            let unblinded = element.mult(&blind).mult(&blind.invert());
            assert_eq!(unblinded.serialize(), element.serialize());
        }
    }

    #[test]
    fn hash_to_group_is_deterministic_and_dst_separated() {
        for group in GROUPS {
            let a = group.hash_to_group(&[&b"input"[..]], b"DST-A").unwrap();
            let b = group.hash_to_group(&[&b"input"[..]], b"DST-A").unwrap();
            let c = group.hash_to_group(&[&b"input"[..]], b"DST-B").unwrap();

            assert_eq!(a.serialize(), b.serialize());
            assert_ne!(a.serialize(), c.serialize());
        }
    }
}
