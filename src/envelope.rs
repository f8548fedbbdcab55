// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The envelope mechanism for key recovery. The client's long-term key pair is
//! a deterministic function of the randomized password and an envelope nonce,
//! so the envelope itself only carries the nonce and an authentication tag
//! binding the cleartext credentials.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::ciphersuite::Internal;
use crate::errors::ProtocolError;
use crate::group::{Element, Scalar};
use crate::opaque::{bytestrings_from_identifiers, Identifiers};
use crate::oprf::Oprf;
use crate::serialization::encode_vector;

static STR_AUTH_KEY: &[u8] = b"AuthKey";
static STR_EXPORT_KEY: &[u8] = b"ExportKey";
static STR_MASKING_KEY: &[u8] = b"MaskingKey";
static STR_PRIVATE_KEY: &[u8] = b"PrivateKey";
static STR_DERIVE_AUTH_KEY_PAIR: &[u8] = b"OPAQUE-DeriveAuthKeyPair";

/// The sealed envelope: `nonce ‖ auth_tag`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Envelope {
    pub(crate) nonce: Vec<u8>,
    pub(crate) auth_tag: Vec<u8>,
}

impl Envelope {
    pub(crate) fn serialize(&self) -> Vec<u8> {
        [&self.nonce[..], &self.auth_tag[..]].concat()
    }

    pub(crate) fn deserialize(conf: &Internal, bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != conf.envelope_size() {
            return Err(ProtocolError::InvalidLength {
                name: "envelope",
                expected: conf.envelope_size(),
                actual: bytes.len(),
            });
        }

        Ok(Self {
            nonce: bytes[..conf.nonce_length].to_vec(),
            auth_tag: bytes[conf.nonce_length..].to_vec(),
        })
    }

    /// An all-zero envelope of the correct length, used in fake records.
    pub(crate) fn zero(conf: &Internal) -> Self {
        Self {
            nonce: vec![0u8; conf.nonce_length],
            auth_tag: vec![0u8; conf.mac.size()],
        }
    }
}

/// Derives the randomized password from the OPRF output by stretching it and
/// extracting over the concatenation.
pub(crate) fn randomized_password(
    conf: &Internal,
    oprf_output: &[u8],
) -> Result<Zeroizing<Vec<u8>>, ProtocolError> {
    let stretched = Zeroizing::new(conf.ksf.harden(
        &conf.kdf,
        oprf_output,
        &[],
        conf.hash.size(),
    )?);

    Ok(Zeroizing::new(conf.kdf.extract(
        None,
        &[oprf_output, &stretched[..]].concat(),
    )))
}

/// Expands the masking key from the randomized password.
pub(crate) fn masking_key(
    conf: &Internal,
    randomized_pwd: &[u8],
) -> Result<Zeroizing<Vec<u8>>, ProtocolError> {
    Ok(Zeroizing::new(conf.kdf.expand(
        randomized_pwd,
        STR_MASKING_KEY,
        conf.kdf.size(),
    )?))
}

// Derives the client's long-term AKE key pair from the randomized password and
// the envelope nonce.
fn derive_auth_key_pair(
    conf: &Internal,
    randomized_pwd: &[u8],
    nonce: &[u8],
) -> Result<(Scalar, Element), ProtocolError> {
    let seed = Zeroizing::new(conf.kdf.expand(
        randomized_pwd,
        &[nonce, STR_PRIVATE_KEY].concat(),
        conf.kdf.size(),
    )?);

    let secret_key = Oprf::new(conf.group).derive_key(&seed, STR_DERIVE_AUTH_KEY_PAIR)?;
    let public_key = conf.group.base().mult(&secret_key);

    Ok((secret_key, public_key))
}

// Encodes the credentials bound by the envelope MAC. An absent identity is
// replaced by the corresponding public key encoding.
fn cleartext_credentials(
    server_public_key: &[u8],
    client_public_key: &[u8],
    ids: &Identifiers,
) -> Result<Vec<u8>, ProtocolError> {
    let (client_identity, server_identity) =
        bytestrings_from_identifiers(ids, client_public_key, server_public_key);

    let server_identity = encode_vector(&server_identity)?;
    let client_identity = encode_vector(&client_identity)?;

    Ok([server_public_key, &server_identity[..], &client_identity[..]].concat())
}

pub(crate) struct SealedEnvelope {
    pub(crate) envelope: Envelope,
    pub(crate) client_public_key: Element,
    pub(crate) masking_key: Vec<u8>,
    pub(crate) export_key: Vec<u8>,
}

pub(crate) struct OpenedEnvelope {
    pub(crate) client_secret_key: Scalar,
    pub(crate) client_public_key: Element,
    pub(crate) export_key: Vec<u8>,
}

/// Seals a fresh envelope during registration.
pub(crate) fn store<R: RngCore + CryptoRng>(
    conf: &Internal,
    rng: &mut R,
    randomized_pwd: &[u8],
    server_public_key: &[u8],
    ids: &Identifiers,
) -> Result<SealedEnvelope, ProtocolError> {
    let mut nonce = vec![0u8; conf.nonce_length];
    rng.fill_bytes(&mut nonce);

    seal(conf, randomized_pwd, server_public_key, ids, nonce)
}

fn seal(
    conf: &Internal,
    randomized_pwd: &[u8],
    server_public_key: &[u8],
    ids: &Identifiers,
    nonce: Vec<u8>,
) -> Result<SealedEnvelope, ProtocolError> {
    let auth_key = Zeroizing::new(conf.kdf.expand(
        randomized_pwd,
        &[&nonce[..], STR_AUTH_KEY].concat(),
        conf.kdf.size(),
    )?);
    let export_key = conf.kdf.expand(
        randomized_pwd,
        &[&nonce[..], STR_EXPORT_KEY].concat(),
        conf.kdf.size(),
    )?;
    let masking_key = masking_key(conf, randomized_pwd)?;

    let (_, client_public_key) = derive_auth_key_pair(conf, randomized_pwd, &nonce)?;

    let credentials =
        cleartext_credentials(server_public_key, &client_public_key.serialize(), ids)?;
    let auth_tag = conf
        .mac
        .mac(&auth_key, &[&nonce[..], &credentials[..]].concat())?;

    Ok(SealedEnvelope {
        envelope: Envelope { nonce, auth_tag },
        client_public_key,
        masking_key: masking_key.to_vec(),
        export_key,
    })
}

/// Recovers the client's keys from an envelope during login, verifying the
/// authentication tag in constant time.
pub(crate) fn recover(
    conf: &Internal,
    randomized_pwd: &[u8],
    server_public_key: &[u8],
    envelope: &Envelope,
    ids: &Identifiers,
) -> Result<OpenedEnvelope, ProtocolError> {
    let auth_key = Zeroizing::new(conf.kdf.expand(
        randomized_pwd,
        &[&envelope.nonce[..], STR_AUTH_KEY].concat(),
        conf.kdf.size(),
    )?);
    let export_key = conf.kdf.expand(
        randomized_pwd,
        &[&envelope.nonce[..], STR_EXPORT_KEY].concat(),
        conf.kdf.size(),
    )?;

    let (client_secret_key, client_public_key) =
        derive_auth_key_pair(conf, randomized_pwd, &envelope.nonce)?;

    let credentials =
        cleartext_credentials(server_public_key, &client_public_key.serialize(), ids)?;
    let expected_tag = conf
        .mac
        .mac(&auth_key, &[&envelope.nonce[..], &credentials[..]].concat())?;

    if !conf.mac.equal(&expected_tag, &envelope.auth_tag) {
        return Err(ProtocolError::EnvelopeRecovery);
    }

    Ok(OpenedEnvelope {
        client_secret_key,
        client_public_key,
        export_key,
    })
}

// Tests
// =====
