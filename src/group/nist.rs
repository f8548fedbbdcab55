// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Backends for the NIST prime-order groups P-256, P-384, and P-521

macro_rules! nist_backend {
    ($name:ident, $curve:ty, $hash:ty, $point:ty) => {
        pub(super) mod $name {
            use elliptic_curve::hash2curve::{ExpandMsgXmd, GroupDigest};
            use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};

            use crate::errors::{InternalError, ProtocolError};

            type Point = $point;
            type Scalar = elliptic_curve::Scalar<$curve>;
            type AffinePoint = elliptic_curve::AffinePoint<$curve>;
            type EncodedPoint = elliptic_curve::sec1::EncodedPoint<$curve>;

            pub fn hash_to_group(input: &[&[u8]], dst: &[u8]) -> Result<Point, InternalError> {
                <$curve>::hash_from_bytes::<ExpandMsgXmd<$hash>>(input, &[dst])
                    .map_err(|_| InternalError::HashToGroup)
            }

            pub fn hash_to_scalar(input: &[&[u8]], dst: &[u8]) -> Result<Scalar, InternalError> {
                <$curve>::hash_to_scalar::<ExpandMsgXmd<$hash>>(input, &[dst])
                    .map_err(|_| InternalError::HashToScalar)
            }

            pub fn serialize_point(point: &Point) -> Vec<u8> {
                point.to_affine().to_encoded_point(true).as_bytes().to_vec()
            }

            // The caller has already checked that `bytes` is exactly the
            // compressed point length, so only the 0x02/0x03 SEC1 forms parse.
            pub fn deserialize_point(bytes: &[u8]) -> Result<Point, ProtocolError> {
                let encoded = EncodedPoint::from_bytes(bytes)
                    .map_err(|_| ProtocolError::NonCanonicalEncoding)?;
                let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
                    .ok_or(ProtocolError::NonCanonicalEncoding)?;

                Ok(Point::from(affine))
            }
        }
    };
}

nist_backend!(p256_impl, p256::NistP256, sha2::Sha256, p256::ProjectivePoint);
nist_backend!(p384_impl, p384::NistP384, sha2::Sha384, p384::ProjectivePoint);
nist_backend!(p521_impl, p521::NistP521, sha2::Sha512, p521::ProjectivePoint);
