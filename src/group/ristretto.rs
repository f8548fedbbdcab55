// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Backend for the Ristretto255 group

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use elliptic_curve::hash2curve::{ExpandMsg, ExpandMsgXmd, Expander};
use rand::{CryptoRng, RngCore};
use sha2::Sha512;

use crate::errors::{InternalError, ProtocolError};

// Uniform bytes fed to the Elligator map and to wide scalar reduction.
const UNIFORM_BYTES_LEN: usize = 64;

pub(super) fn hash_to_group(input: &[&[u8]], dst: &[u8]) -> Result<RistrettoPoint, InternalError> {
    let mut uniform_bytes = [0u8; UNIFORM_BYTES_LEN];
    ExpandMsgXmd::<Sha512>::expand_message(input, &[dst], UNIFORM_BYTES_LEN)
        .map_err(|_| InternalError::HashToGroup)?
        .fill_bytes(&mut uniform_bytes);

    Ok(RistrettoPoint::from_uniform_bytes(&uniform_bytes))
}

pub(super) fn hash_to_scalar(input: &[&[u8]], dst: &[u8]) -> Result<Scalar, InternalError> {
    let mut uniform_bytes = [0u8; UNIFORM_BYTES_LEN];
    ExpandMsgXmd::<Sha512>::expand_message(input, &[dst], UNIFORM_BYTES_LEN)
        .map_err(|_| InternalError::HashToScalar)?
        .fill_bytes(&mut uniform_bytes);

    Ok(Scalar::from_bytes_mod_order_wide(&uniform_bytes))
}

pub(super) fn deserialize_point(bytes: &[u8]) -> Result<RistrettoPoint, ProtocolError> {
    CompressedRistretto::from_slice(bytes)
        .map_err(|_| ProtocolError::NonCanonicalEncoding)?
        .decompress()
        .ok_or(ProtocolError::NonCanonicalEncoding)
}

pub(super) fn deserialize_scalar(bytes: &[u8]) -> Result<Scalar, ProtocolError> {
    let mut array = [0u8; 32];
    array.copy_from_slice(bytes);

    Option::<Scalar>::from(Scalar::from_canonical_bytes(array))
        .ok_or(ProtocolError::NonCanonicalEncoding)
}

pub(super) fn random_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let scalar = Scalar::random(rng);

        if scalar != Scalar::ZERO {
            break scalar;
        }
    }
}
