// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Ciphersuite configuration: the identifiers selecting the underlying
//! primitives, their wire encoding, and the internal primitive bundle that
//! the rest of the protocol dispatches over.

use rand::{CryptoRng, RngCore};

use crate::errors::ProtocolError;
use crate::group::Group;
use crate::hash::{HashAlg, Kdf, Mac};
use crate::ksf::Ksf;
use crate::messages::{
    CredentialRequest, CredentialResponse, RegistrationRecord, RegistrationRequest,
    RegistrationResponse, KE1, KE2, KE3,
};
use crate::oprf::Oprf;
use crate::serialization::{decode_vector, encode_vector, MAX_VECTOR_LENGTH};

/// Length of the protocol nonces in bytes.
pub const NONCE_LENGTH: usize = 32;

const CONF_IDS_LENGTH: usize = 6;
// Identifier bytes plus the 2-byte encoding of an empty context.
const MIN_CONF_LENGTH: usize = CONF_IDS_LENGTH + 2;

/// An OPAQUE configuration. The OPRF and AKE groups are recommended to be
/// equal, as are the KDF, MAC, and transcript hashes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Configuration {
    /// The OPRF group.
    pub oprf: Group,
    /// The AKE group.
    pub ake: Group,
    /// The key stretching function.
    pub ksf: Ksf,
    /// The KDF hash.
    pub kdf: HashAlg,
    /// The MAC hash.
    pub mac: HashAlg,
    /// The transcript hash.
    pub hash: HashAlg,
    /// An optional shared context string bound into the transcript.
    pub context: Vec<u8>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            oprf: Group::Ristretto255,
            ake: Group::Ristretto255,
            ksf: Ksf::Argon2id,
            kdf: HashAlg::Sha512,
            mac: HashAlg::Sha512,
            hash: HashAlg::Sha512,
            context: Vec::new(),
        }
    }
}

impl Configuration {
    /// Checks the configuration parameters. The identifiers themselves are
    /// valid by construction; only the context length can be out of range.
    pub fn verify(&self) -> Result<(), ProtocolError> {
        if self.context.len() > MAX_VECTOR_LENGTH {
            return Err(ProtocolError::InvalidLength {
                name: "configuration context",
                expected: MAX_VECTOR_LENGTH,
                actual: self.context.len(),
            });
        }

        Ok(())
    }

    /// The byte encoding of the configuration:
    /// `OPRF ‖ AKE ‖ KSF ‖ KDF ‖ MAC ‖ Hash ‖ EncodeVector(context)`.
    pub fn serialize(&self) -> Result<Vec<u8>, ProtocolError> {
        self.verify()?;

        let ids = [
            self.oprf.identifier(),
            self.ake.identifier(),
            self.ksf.identifier(),
            self.kdf.identifier(),
            self.mac.identifier(),
            self.hash.identifier(),
        ];
        let context = encode_vector(&self.context)?;

        Ok([&ids[..], &context[..]].concat())
    }

    /// Decodes a configuration, rejecting unknown identifiers and trailing
    /// bytes.
    pub fn deserialize(encoded: &[u8]) -> Result<Self, ProtocolError> {
        if encoded.len() < MIN_CONF_LENGTH {
            return Err(ProtocolError::InvalidLength {
                name: "configuration",
                expected: MIN_CONF_LENGTH,
                actual: encoded.len(),
            });
        }

        let (context, remainder) = decode_vector(&encoded[CONF_IDS_LENGTH..])?;
        if !remainder.is_empty() {
            return Err(ProtocolError::InvalidLength {
                name: "configuration",
                expected: encoded.len() - remainder.len(),
                actual: encoded.len(),
            });
        }

        let configuration = Self {
            oprf: Group::from_identifier(encoded[0]).ok_or(ProtocolError::InvalidCiphersuite)?,
            ake: Group::from_identifier(encoded[1]).ok_or(ProtocolError::InvalidCiphersuite)?,
            ksf: Ksf::from_identifier(encoded[2]).ok_or(ProtocolError::InvalidCiphersuite)?,
            kdf: HashAlg::from_identifier(encoded[3]).ok_or(ProtocolError::InvalidCiphersuite)?,
            mac: HashAlg::from_identifier(encoded[4]).ok_or(ProtocolError::InvalidCiphersuite)?,
            hash: HashAlg::from_identifier(encoded[5]).ok_or(ProtocolError::InvalidCiphersuite)?,
            context: context.to_vec(),
        };

        configuration.verify()?;
        Ok(configuration)
    }

    /// Returns a message deserializer for this configuration.
    pub fn deserializer(&self) -> Result<Deserializer, ProtocolError> {
        Ok(Deserializer {
            conf: self.internal()?,
        })
    }

    /// Samples an OPRF seed of the correct length for this configuration.
    pub fn generate_oprf_seed<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Vec<u8> {
        random_bytes(rng, self.hash.size())
    }

    /// Generates an AKE key pair, returned as canonical encodings of the
    /// secret and public keys.
    pub fn key_gen<R: RngCore + CryptoRng>(&self, rng: &mut R) -> (Vec<u8>, Vec<u8>) {
        let secret_key = self.ake.random_scalar(rng);
        let public_key = self.ake.base().mult(&secret_key);

        (secret_key.serialize(), public_key.serialize())
    }

    pub(crate) fn internal(&self) -> Result<Internal, ProtocolError> {
        self.verify()?;

        Ok(Internal {
            oprf: Oprf::new(self.oprf),
            group: self.ake,
            ksf: self.ksf,
            kdf: Kdf(self.kdf),
            mac: Mac(self.mac),
            hash: self.hash,
            context: self.context.clone(),
            nonce_length: NONCE_LENGTH,
        })
    }
}

/// The internal bundle of instantiated primitives a session dispatches over.
#[derive(Clone, Debug)]
pub(crate) struct Internal {
    pub(crate) oprf: Oprf,
    pub(crate) group: Group,
    pub(crate) ksf: Ksf,
    pub(crate) kdf: Kdf,
    pub(crate) mac: Mac,
    pub(crate) hash: HashAlg,
    pub(crate) context: Vec<u8>,
    pub(crate) nonce_length: usize,
}

impl Internal {
    pub(crate) fn envelope_size(&self) -> usize {
        self.nonce_length + self.mac.size()
    }
}

/// Deserializes protocol messages under a fixed configuration, with strict
/// length checks.
#[derive(Clone, Debug)]
pub struct Deserializer {
    conf: Internal,
}

impl Deserializer {
    pub(crate) fn new(conf: Internal) -> Self {
        Self { conf }
    }

    /// Deserializes a [`RegistrationRequest`].
    pub fn registration_request(&self, input: &[u8]) -> Result<RegistrationRequest, ProtocolError> {
        RegistrationRequest::deserialize(&self.conf, input)
    }

    /// Deserializes a [`RegistrationResponse`].
    pub fn registration_response(
        &self,
        input: &[u8],
    ) -> Result<RegistrationResponse, ProtocolError> {
        RegistrationResponse::deserialize(&self.conf, input)
    }

    /// Deserializes a [`RegistrationRecord`].
    pub fn registration_record(&self, input: &[u8]) -> Result<RegistrationRecord, ProtocolError> {
        RegistrationRecord::deserialize(&self.conf, input)
    }

    /// Deserializes a [`CredentialRequest`].
    pub fn credential_request(&self, input: &[u8]) -> Result<CredentialRequest, ProtocolError> {
        CredentialRequest::deserialize(&self.conf, input)
    }

    /// Deserializes a [`CredentialResponse`].
    pub fn credential_response(&self, input: &[u8]) -> Result<CredentialResponse, ProtocolError> {
        CredentialResponse::deserialize(&self.conf, input)
    }

    /// Deserializes a [`KE1`].
    pub fn ke1(&self, input: &[u8]) -> Result<KE1, ProtocolError> {
        KE1::deserialize(&self.conf, input)
    }

    /// Deserializes a [`KE2`].
    pub fn ke2(&self, input: &[u8]) -> Result<KE2, ProtocolError> {
        KE2::deserialize(&self.conf, input)
    }

    /// Deserializes a [`KE3`].
    pub fn ke3(&self, input: &[u8]) -> Result<KE3, ProtocolError> {
        KE3::deserialize(&self.conf, input)
    }
}

/// Returns `length` bytes from the given CSPRNG.
pub(crate) fn random_bytes<R: RngCore + CryptoRng>(rng: &mut R, length: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; length];
    rng.fill_bytes(&mut bytes);
    bytes
}

// Tests
// =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_round_trip() {
        let configurations = [
            Configuration::default(),
            Configuration {
                oprf: Group::P256,
                ake: Group::P256,
                ksf: Ksf::Identity,
                kdf: HashAlg::Sha256,
                mac: HashAlg::Sha256,
                hash: HashAlg::Sha256,
                context: b"application context".to_vec(),
            },
            Configuration {
                oprf: Group::P384,
                ake: Group::P521,
                ksf: Ksf::Scrypt,
                kdf: HashAlg::Sha384,
                mac: HashAlg::Sha512,
                hash: HashAlg::Sha512,
                context: Vec::new(),
            },
        ];

        for configuration in configurations {
            let encoded = configuration.serialize().unwrap();
            assert!(encoded.len() >= MIN_CONF_LENGTH);
            assert_eq!(Configuration::deserialize(&encoded).unwrap(), configuration);
        }
    }

    #[test]
    fn deserialization_rejects_unknown_identifiers() {
        let mut encoded = Configuration::default().serialize().unwrap();

        for index in 0..CONF_IDS_LENGTH {
            let mut bad = encoded.clone();
            bad[index] = 0x7f;
            assert_eq!(
                Configuration::deserialize(&bad),
                Err(ProtocolError::InvalidCiphersuite)
            );
        }

        // an unknown KSF identifier, specifically
        encoded[2] = 4;
        assert_eq!(
            Configuration::deserialize(&encoded),
            Err(ProtocolError::InvalidCiphersuite)
        );
    }

    #[test]
    fn deserialization_rejects_bad_lengths() {
        let encoded = Configuration::default().serialize().unwrap();

        assert!(Configuration::deserialize(&encoded[..MIN_CONF_LENGTH - 1]).is_err());
        assert!(Configuration::deserialize(&[encoded, vec![0]].concat()).is_err());
    }

    #[test]
    fn oversized_context_is_rejected() {
        let configuration = Configuration {
            context: vec![0u8; MAX_VECTOR_LENGTH + 1],
            ..Configuration::default()
        };

        assert!(configuration.verify().is_err());
        assert!(configuration.serialize().is_err());
    }
}
