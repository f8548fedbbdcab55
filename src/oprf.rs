// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! An implementation of the oblivious pseudorandom function (OPRF) in its
//! non-verifiable base mode, over a prime-order group. The client blinds its
//! input, the server evaluates the blinded element with its key, and the
//! client unblinds and hashes the result.

use rand::{CryptoRng, RngCore};

use crate::errors::{InternalError, ProtocolError};
use crate::group::{Element, Group, Scalar};
use crate::hash::{Hash, HashAlg};
use crate::serialization::{encode_vector, i2osp};

static STR_OPRF: &[u8] = b"OPRFV1-";
static STR_HASH_TO_GROUP: &[u8] = b"HashToGroup-";
static STR_DERIVE_KEY_PAIR: &[u8] = b"DeriveKeyPair";
static STR_FINALIZE: &[u8] = b"Finalize";

// Base (non-verifiable) mode.
const MODE_OPRF: u8 = 0;

/// A base-mode OPRF instantiation over a prime-order group. The hash is fixed
/// by the group's cipher suite and is independent of the application's
/// configured KDF/MAC/transcript hashes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Oprf {
    group: Group,
    hash: HashAlg,
    context_string: Vec<u8>,
}

impl Oprf {
    pub(crate) fn new(group: Group) -> Self {
        let hash = match group {
            Group::Ristretto255 => HashAlg::Sha512,
            Group::P256 => HashAlg::Sha256,
            Group::P384 => HashAlg::Sha384,
            Group::P521 => HashAlg::Sha512,
        };

        // "OPRFV1-" ‖ I2OSP(mode, 1) ‖ I2OSP(suite, 2)
        let mut context_string = STR_OPRF.to_vec();
        context_string.push(MODE_OPRF);
        context_string.extend_from_slice(&[0, group.identifier()]);

        Self {
            group,
            hash,
            context_string,
        }
    }

    pub(crate) fn group(&self) -> Group {
        self.group
    }

    fn dst(&self, prefix: &[u8]) -> Vec<u8> {
        [prefix, &self.context_string[..]].concat()
    }

    /// Client: blinds `input` with a fresh random scalar, returning the blind
    /// and the blinded element to send to the server.
    pub(crate) fn blind<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        input: &[u8],
    ) -> Result<(Scalar, Element), ProtocolError> {
        let element = self
            .group
            .hash_to_group(&[input], &self.dst(STR_HASH_TO_GROUP))?;
        if element.is_identity() {
            return Err(InternalError::HashToGroup.into());
        }

        let blind = self.group.random_scalar(rng);
        let blinded_element = element.mult(&blind);

        Ok((blind, blinded_element))
    }

    /// Server: evaluates a blinded element under the OPRF key.
    pub(crate) fn evaluate(&self, key: &Scalar, blinded_element: &Element) -> Element {
        blinded_element.mult(key)
    }

    /// Client: unblinds the evaluated element and hashes it together with the
    /// input into the OPRF output.
    pub(crate) fn finalize(
        &self,
        input: &[u8],
        blind: &Scalar,
        evaluated_element: &Element,
    ) -> Result<Vec<u8>, ProtocolError> {
        let unblinded = evaluated_element.mult(&blind.invert());

        let mut hasher = Hash::new(self.hash);
        hasher.write(&encode_vector(input)?);
        hasher.write(&encode_vector(&unblinded.serialize())?);
        hasher.write(STR_FINALIZE);

        Ok(hasher.sum())
    }

    /// Maps a seed and info string to a nonzero scalar, resampling with a
    /// counter byte in the negligible case that the map returns zero.
    pub(crate) fn derive_key(&self, seed: &[u8], info: &[u8]) -> Result<Scalar, ProtocolError> {
        let info_length = i2osp(info.len(), 2)?;
        let derive_input = [seed, &info_length[..], info].concat();
        let dst = self.dst(STR_DERIVE_KEY_PAIR);

        for counter in 0..=u8::MAX {
            let scalar = self
                .group
                .hash_to_scalar(&[&derive_input[..], &[counter][..]], &dst)?;

            if !scalar.is_zero() {
                return Ok(scalar);
            }
        }

        Err(InternalError::HashToScalar.into())
    }
}

// Tests
// =====
