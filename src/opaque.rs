// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Provides the main OPAQUE API: the client and server session objects
//! orchestrating the three-message registration and login flows.

use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use crate::ciphersuite::{random_bytes, Configuration, Deserializer, Internal};
use crate::envelope::{self, Envelope};
use crate::errors::ProtocolError;
use crate::group::{Element, Scalar};
use crate::key_exchange::tripledh::{AkeClient, AkeServer};
use crate::key_exchange::{Identities, Options};
use crate::masking;
use crate::messages::{
    CredentialRequest, CredentialResponse, RegistrationRecord, RegistrationRequest,
    RegistrationResponse, KE1, KE2, KE3,
};

static STR_OPRF_KEY: &[u8] = b"OprfKey";
static STR_DERIVE_KEY_PAIR: &[u8] = b"OPAQUE-DeriveKeyPair";

// Identifiers
// ===========

/// Optional custom identities for the two parties. An absent identity is
/// substituted by the canonical encoding of the party's public key. Whatever
/// was used during registration must be used again during login.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Identifiers<'a> {
    /// The client identity.
    pub client: Option<&'a [u8]>,
    /// The server identity.
    pub server: Option<&'a [u8]>,
}

pub(crate) fn bytestrings_from_identifiers(
    ids: &Identifiers<'_>,
    client_public_key: &[u8],
    server_public_key: &[u8],
) -> (Vec<u8>, Vec<u8>) {
    (
        ids.client.unwrap_or(client_public_key).to_vec(),
        ids.server.unwrap_or(server_public_key).to_vec(),
    )
}

// Client records
// ==============

/// A server-side record storing everything relevant to a registered client.
#[derive(Clone, Debug)]
pub struct ClientRecord {
    /// The identifier under which the record is stored; the per-client OPRF
    /// key is derived from it and the server's OPRF seed.
    pub credential_identifier: Vec<u8>,
    /// The client identity used during registration, if any.
    pub client_identity: Option<Vec<u8>>,
    /// The registration record uploaded by the client.
    pub record: RegistrationRecord,
}

impl Configuration {
    /// Creates a fake client record to be used when no record exists for a
    /// credential identifier, to defend against client enumeration. Login
    /// proceeds normally against it and fails on the client side the same way
    /// a wrong password does.
    pub fn fake_record<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        credential_identifier: &[u8],
    ) -> Result<ClientRecord, ProtocolError> {
        let conf = self.internal()?;

        let mut secret_key = conf.group.random_scalar(rng);
        let public_key = conf.group.base().mult(&secret_key);
        secret_key.zeroize();

        Ok(ClientRecord {
            credential_identifier: credential_identifier.to_vec(),
            client_identity: None,
            record: RegistrationRecord {
                public_key,
                masking_key: random_bytes(rng, conf.kdf.size()),
                envelope: Envelope::zero(&conf),
            },
        })
    }
}

// Client
// ======

/// The result of a finished client registration.
#[derive(Clone, Debug)]
pub struct ClientRegistrationFinishResult {
    /// The registration record to send to the server for storage.
    pub message: RegistrationRecord,
    /// A client-only secret derived from the password, usable for encrypting
    /// higher-level payloads. Identical across logins with the same record.
    pub export_key: Vec<u8>,
}

/// The result of a finished client login.
#[derive(Clone, Debug)]
pub struct ClientLoginFinishResult {
    /// The KE3 message to send to the server.
    pub message: KE3,
    /// The mutually authenticated session key.
    pub session_key: Vec<u8>,
    /// The client-only export key; see
    /// [`ClientRegistrationFinishResult::export_key`].
    pub export_key: Vec<u8>,
}

/// An OPAQUE client session. One object drives one registration or one login
/// at a time; it is owned exclusively by its caller and is not safe for
/// concurrent mutation.
pub struct Client {
    conf: Internal,
    blind: Option<Scalar>,
    password: Zeroizing<Vec<u8>>,
    ake: AkeClient,
}

impl Client {
    /// Returns a new client for the given configuration.
    pub fn new(configuration: &Configuration) -> Result<Self, ProtocolError> {
        Ok(Self {
            conf: configuration.internal()?,
            blind: None,
            password: Zeroizing::new(Vec::new()),
            ake: AkeClient::new(),
        })
    }

    /// Returns a message deserializer for this client's configuration.
    pub fn deserializer(&self) -> Deserializer {
        Deserializer::new(self.conf.clone())
    }

    /// Registration, first step: blinds the password into a
    /// [`RegistrationRequest`] for the server.
    pub fn registration_init<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        password: &[u8],
    ) -> Result<RegistrationRequest, ProtocolError> {
        let (blind, blinded_message) = self.conf.oprf.blind(rng, password)?;

        self.blind = Some(blind);
        self.password = Zeroizing::new(password.to_vec());

        Ok(RegistrationRequest { blinded_message })
    }

    /// Registration, final step: unblinds the server's response, derives the
    /// long-term key material, and seals the envelope into a
    /// [`RegistrationRecord`].
    pub fn registration_finalize<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        response: &RegistrationResponse,
        identifiers: &Identifiers<'_>,
    ) -> Result<ClientRegistrationFinishResult, ProtocolError> {
        let mut blind = self.blind.take().ok_or(ProtocolError::InvalidState)?;

        let oprf_output = Zeroizing::new(self.conf.oprf.finalize(
            &self.password,
            &blind,
            &response.evaluated_message,
        )?);
        blind.zeroize();
        let randomized_pwd = envelope::randomized_password(&self.conf, &oprf_output)?;

        let sealed = envelope::store(
            &self.conf,
            rng,
            &randomized_pwd,
            &response.server_public_key.serialize(),
            identifiers,
        )?;

        self.password = Zeroizing::new(Vec::new());

        Ok(ClientRegistrationFinishResult {
            message: RegistrationRecord {
                public_key: sealed.client_public_key,
                masking_key: sealed.masking_key,
                envelope: sealed.envelope,
            },
            export_key: sealed.export_key,
        })
    }

    /// Login, first step: blinds the password and generates the ephemeral AKE
    /// values, producing a [`KE1`] for the server.
    pub fn generate_ke1<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        password: &[u8],
        options: &Options,
    ) -> Result<KE1, ProtocolError> {
        let (blind, blinded_message) = self.conf.oprf.blind(rng, password)?;

        self.blind = Some(blind);
        self.password = Zeroizing::new(password.to_vec());

        self.ake
            .start(&self.conf, rng, CredentialRequest { blinded_message }, options)
    }

    /// Login, final step: unmasks the credential response, recovers the
    /// envelope, verifies the server MAC, and produces a [`KE3`] together
    /// with the session and export keys.
    pub fn generate_ke3(
        &mut self,
        ke2: &KE2,
        identifiers: &Identifiers<'_>,
    ) -> Result<ClientLoginFinishResult, ProtocolError> {
        let mut blind = self.blind.take().ok_or(ProtocolError::InvalidState)?;
        let response = &ke2.credential_response;

        let oprf_output = Zeroizing::new(self.conf.oprf.finalize(
            &self.password,
            &blind,
            &response.evaluated_message,
        )?);
        blind.zeroize();
        let randomized_pwd = envelope::randomized_password(&self.conf, &oprf_output)?;
        let masking_key = envelope::masking_key(&self.conf, &randomized_pwd)?;

        let (server_public_key_bytes, envelope_bytes) = masking::unmask(
            &self.conf,
            &masking_key,
            &response.masking_nonce,
            &response.masked_response,
        )?;

        // A wrong password scrambles the unmasked payload; a decoding failure
        // here is the same failure as a bad envelope tag.
        let server_public_key = self
            .conf
            .group
            .deserialize_element(&server_public_key_bytes)
            .map_err(|_| ProtocolError::EnvelopeRecovery)?;
        let envelope = Envelope::deserialize(&self.conf, &envelope_bytes)?;

        let opened = envelope::recover(
            &self.conf,
            &randomized_pwd,
            &server_public_key_bytes,
            &envelope,
            identifiers,
        )?;

        let (client_identity, server_identity) = bytestrings_from_identifiers(
            identifiers,
            &opened.client_public_key.serialize(),
            &server_public_key_bytes,
        );
        let identities = Identities {
            client: client_identity,
            server: server_identity,
        };

        let message = self.ake.finalize(
            &self.conf,
            &identities,
            &opened.client_secret_key,
            &server_public_key,
            ke2,
        )?;

        self.password = Zeroizing::new(Vec::new());

        let session_key = self
            .ake
            .session_key()
            .map(<[u8]>::to_vec)
            .ok_or(ProtocolError::InvalidState)?;

        Ok(ClientLoginFinishResult {
            message,
            session_key,
            export_key: opened.export_key,
        })
    }

    /// The session key, if the previous call to [`Client::generate_ke3`]
    /// succeeded.
    pub fn session_key(&self) -> Option<&[u8]> {
        self.ake.session_key()
    }

    /// Overwrites and drops all session values.
    pub fn flush(&mut self) {
        if let Some(blind) = self.blind.as_mut() {
            blind.zeroize();
        }
        self.blind = None;
        self.password = Zeroizing::new(Vec::new());
        self.ake.flush();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.flush();
    }
}

// Server
// ======

// The server's long-term values, read-only after set_key_material.
struct KeyMaterial {
    server_identity: Option<Vec<u8>>,
    server_secret_key: Scalar,
    server_public_key: Element,
    oprf_seed: Zeroizing<Vec<u8>>,
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.server_secret_key.zeroize();
    }
}

/// Optional values for [`Server::generate_ke2`], defaulting to secure random
/// values when unset.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GenerateKe2Options {
    /// Seed for deterministic derivation of the ephemeral AKE scalar.
    pub key_share_seed: Option<Vec<u8>>,
    /// Explicit server AKE nonce.
    pub ake_nonce: Option<Vec<u8>>,
    /// Length of the generated AKE nonce when no explicit nonce is given.
    pub ake_nonce_length: Option<usize>,
    /// Explicit masking nonce.
    pub masking_nonce: Option<Vec<u8>>,
}

/// An OPAQUE server session. The key material set through
/// [`Server::set_key_material`] lives for the lifetime of the object; the
/// per-login state is cleared by [`Server::flush`].
pub struct Server {
    conf: Internal,
    ake: AkeServer,
    key_material: Option<KeyMaterial>,
}

impl Server {
    /// Returns a new server for the given configuration.
    pub fn new(configuration: &Configuration) -> Result<Self, ProtocolError> {
        Ok(Self {
            conf: configuration.internal()?,
            ake: AkeServer::new(),
            key_material: None,
        })
    }

    /// Returns a message deserializer for this server's configuration.
    pub fn deserializer(&self) -> Deserializer {
        Deserializer::new(self.conf.clone())
    }

    /// Sets the server's identity and mandatory key material. All values must
    /// be the ones used during the clients' registrations and must remain the
    /// same across protocol executions.
    ///
    /// - `server_identity` may be `None`, in which case the public key
    ///   encoding stands in for it.
    /// - `server_secret_key` and `server_public_key` are the canonical
    ///   encodings of the server's long-term AKE key pair.
    /// - `oprf_seed` is the long-term OPRF seed, of transcript-hash length.
    pub fn set_key_material(
        &mut self,
        server_identity: Option<&[u8]>,
        server_secret_key: &[u8],
        server_public_key: &[u8],
        oprf_seed: &[u8],
    ) -> Result<(), ProtocolError> {
        let secret_key = self.conf.group.deserialize_scalar(server_secret_key)?;
        if secret_key.is_zero() {
            return Err(ProtocolError::ZeroScalar);
        }

        if oprf_seed.len() != self.conf.hash.size() {
            return Err(ProtocolError::InvalidLength {
                name: "OPRF seed",
                expected: self.conf.hash.size(),
                actual: oprf_seed.len(),
            });
        }

        let public_key = self.conf.group.deserialize_element(server_public_key)?;

        self.key_material = Some(KeyMaterial {
            server_identity: server_identity.map(<[u8]>::to_vec),
            server_secret_key: secret_key,
            server_public_key: public_key,
            oprf_seed: Zeroizing::new(oprf_seed.to_vec()),
        });

        Ok(())
    }

    fn key_material(&self) -> Result<&KeyMaterial, ProtocolError> {
        self.key_material
            .as_ref()
            .ok_or(ProtocolError::MissingKeyMaterial)
    }

    // Evaluates the OPRF under the key derived from the long-term seed and
    // the credential identifier.
    fn oprf_response(
        &self,
        blinded_message: &Element,
        credential_identifier: &[u8],
    ) -> Result<Element, ProtocolError> {
        let key_material = self.key_material()?;

        let seed = Zeroizing::new(self.conf.kdf.expand(
            &key_material.oprf_seed,
            &[credential_identifier, STR_OPRF_KEY].concat(),
            self.conf.kdf.size(),
        )?);
        let oprf_key = self.conf.oprf.derive_key(&seed, STR_DERIVE_KEY_PAIR)?;

        Ok(self.conf.oprf.evaluate(&oprf_key, blinded_message))
    }

    /// Registration: answers a [`RegistrationRequest`] for the given
    /// credential identifier.
    pub fn registration_response(
        &self,
        request: &RegistrationRequest,
        credential_identifier: &[u8],
    ) -> Result<RegistrationResponse, ProtocolError> {
        let key_material = self.key_material()?;

        Ok(RegistrationResponse {
            evaluated_message: self
                .oprf_response(&request.blinded_message, credential_identifier)?,
            server_public_key: key_material.server_public_key.clone(),
        })
    }

    /// Login, second step: responds to a [`KE1`] message with a [`KE2`]
    /// message, against the given client record.
    pub fn generate_ke2<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        ke1: &KE1,
        record: &ClientRecord,
        options: &GenerateKe2Options,
    ) -> Result<KE2, ProtocolError> {
        if self.key_material.is_none() {
            return Err(ProtocolError::MissingKeyMaterial);
        }

        let envelope_len = record.record.envelope.serialize().len();
        if envelope_len != self.conf.envelope_size() {
            return Err(ProtocolError::InvalidLength {
                name: "record envelope",
                expected: self.conf.envelope_size(),
                actual: envelope_len,
            });
        }

        let evaluated_message = self.oprf_response(
            &ke1.credential_request.blinded_message,
            &record.credential_identifier,
        )?;

        // field-level borrow, so the AKE half of the session stays mutable
        let key_material = self
            .key_material
            .as_ref()
            .ok_or(ProtocolError::MissingKeyMaterial)?;
        let server_public_key_bytes = key_material.server_public_key.serialize();

        let masking_nonce = match &options.masking_nonce {
            Some(nonce) if !nonce.is_empty() => nonce.clone(),
            _ => random_bytes(rng, self.conf.nonce_length),
        };
        let masked_response = masking::mask(
            &self.conf,
            &record.record.masking_key,
            &masking_nonce,
            &server_public_key_bytes,
            &record.record.envelope.serialize(),
        )?;

        let credential_response = CredentialResponse {
            evaluated_message,
            masking_nonce,
            masked_response,
        };

        let (client_identity, server_identity) = bytestrings_from_identifiers(
            &Identifiers {
                client: record.client_identity.as_deref(),
                server: key_material.server_identity.as_deref(),
            },
            &record.record.public_key.serialize(),
            &server_public_key_bytes,
        );
        let identities = Identities {
            client: client_identity,
            server: server_identity,
        };

        let ake_options = Options {
            key_share_seed: options.key_share_seed.clone(),
            nonce: options.ake_nonce.clone(),
            nonce_length: options.ake_nonce_length,
        };

        self.ake.response(
            &self.conf,
            rng,
            &identities,
            &key_material.server_secret_key,
            &record.record.public_key,
            ke1,
            credential_response,
            &ake_options,
        )
    }

    /// Login, final step: verifies the client MAC contained in the [`KE3`]
    /// message in constant time.
    pub fn login_finish(&self, ke3: &KE3) -> Result<(), ProtocolError> {
        self.ake.finalize(&self.conf, ke3)
    }

    /// The session key, if the previous call to [`Server::generate_ke2`]
    /// succeeded.
    pub fn session_key(&self) -> Option<&[u8]> {
        self.ake.session_key()
    }

    /// The expected client MAC, if the previous call to
    /// [`Server::generate_ke2`] succeeded.
    pub fn expected_client_mac(&self) -> Option<&[u8]> {
        self.ake.expected_client_mac()
    }

    /// The serialized AKE session state: `expected_client_mac ‖ session_key`.
    pub fn serialize_state(&self) -> Vec<u8> {
        self.ake.serialize_state()
    }

    /// Restores an AKE session state produced by [`Server::serialize_state`].
    /// Fails on a buffer of the wrong length or a non-empty session.
    pub fn set_state(&mut self, state: &[u8]) -> Result<(), ProtocolError> {
        let mac_size = self.conf.mac.size();
        if state.len() != mac_size + self.conf.kdf.size() {
            return Err(ProtocolError::InvalidState);
        }

        self.ake.set_state(&state[..mac_size], &state[mac_size..])
    }

    /// Overwrites and drops the per-session values. The long-term key
    /// material is kept.
    pub fn flush(&mut self) {
        self.ake.flush();
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.flush();
    }
}
