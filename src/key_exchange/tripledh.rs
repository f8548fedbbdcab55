// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! An implementation of the Triple Diffie-Hellman key exchange protocol.
//! Three DH products over one long-term and one ephemeral key pair per party
//! feed a TLS-1.3-style key schedule, producing a mutually authenticated
//! session key and transcript-bound MAC tags.

use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use super::{Identities, Options};
use crate::ciphersuite::{random_bytes, Internal};
use crate::errors::ProtocolError;
use crate::group::{Element, Scalar};
use crate::hash::Hash;
use crate::messages::{CredentialRequest, CredentialResponse, KE1, KE2, KE3};
use crate::oprf::Oprf;
use crate::serialization::{encode_vector, encode_vector_len, i2osp};

static STR_CONTEXT: &[u8] = b"OPAQUEv1-";
static STR_OPAQUE: &[u8] = b"OPAQUE-";
static STR_HANDSHAKE_SECRET: &[u8] = b"HandshakeSecret";
static STR_SESSION_KEY: &[u8] = b"SessionKey";
static STR_SERVER_MAC: &[u8] = b"ServerMAC";
static STR_CLIENT_MAC: &[u8] = b"ClientMAC";
static STR_DERIVE_DIFFIE_HELLMAN: &[u8] = b"OPAQUE-DeriveDiffieHellmanKeyPair";

// Produces the ephemeral scalar and nonce for a key exchange step, honoring
// caller-supplied deterministic values.
fn secret_and_nonce<R: RngCore + CryptoRng>(
    conf: &Internal,
    rng: &mut R,
    options: &Options,
) -> Result<(Scalar, Vec<u8>), ProtocolError> {
    let secret = match &options.key_share_seed {
        Some(seed) if !seed.is_empty() => {
            Oprf::new(conf.group).derive_key(seed, STR_DERIVE_DIFFIE_HELLMAN)?
        }
        _ => conf.group.random_scalar(rng),
    };

    let nonce = match &options.nonce {
        Some(nonce) if !nonce.is_empty() => nonce.clone(),
        _ => random_bytes(rng, options.nonce_length.unwrap_or(conf.nonce_length)),
    };

    Ok((secret, nonce))
}

// HkdfLabel = I2OSP(L, 2) ‖ EncVec1("OPAQUE-" ‖ label) ‖ EncVec1(context)
fn build_label(length: usize, label: &[u8], context: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    Ok([
        i2osp(length, 2)?,
        encode_vector_len(&[STR_OPAQUE, label].concat(), 1)?,
        encode_vector_len(context, 1)?,
    ]
    .concat())
}

fn expand_label(
    conf: &Internal,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let hkdf_label = build_label(conf.kdf.size(), label, context)?;
    Ok(conf.kdf.expand(secret, &hkdf_label, conf.kdf.size())?)
}

fn derive_secret(
    conf: &Internal,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    expand_label(conf, secret, label, context)
}

// The session key and the two MAC keys of the key schedule.
struct DerivedKeys {
    session_key: Vec<u8>,
    server_mac_key: Zeroizing<Vec<u8>>,
    client_mac_key: Zeroizing<Vec<u8>>,
}

fn derive_keys(conf: &Internal, ikm: &[u8], preamble: &[u8]) -> Result<DerivedKeys, ProtocolError> {
    let prk = Zeroizing::new(conf.kdf.extract(None, ikm));
    let handshake_secret =
        Zeroizing::new(derive_secret(conf, &prk, STR_HANDSHAKE_SECRET, preamble)?);
    let session_key = derive_secret(conf, &prk, STR_SESSION_KEY, preamble)?;

    let server_mac_key = Zeroizing::new(expand_label(conf, &handshake_secret, STR_SERVER_MAC, &[])?);
    let client_mac_key = Zeroizing::new(expand_label(conf, &handshake_secret, STR_CLIENT_MAC, &[])?);

    Ok(DerivedKeys {
        session_key,
        server_mac_key,
        client_mac_key,
    })
}

// Runs the transcript hash and key schedule common to both sides. The hasher
// is constructed here, once per session, and never reused.
fn core_3dh(
    conf: &Internal,
    identities: &Identities,
    ikm: &[u8],
    serialized_ke1: &[u8],
    credential_response: &CredentialResponse,
    server_nonce: &[u8],
    serialized_server_keyshare: &[u8],
) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), ProtocolError> {
    let mut hasher = Hash::new(conf.hash);
    hasher.write(STR_CONTEXT);
    hasher.write(&encode_vector(&conf.context)?);
    hasher.write(&encode_vector(&identities.client)?);
    hasher.write(serialized_ke1);
    hasher.write(&encode_vector(&identities.server)?);
    hasher.write(&credential_response.serialize());
    hasher.write(server_nonce);
    hasher.write(serialized_server_keyshare);

    let preamble = hasher.sum();
    let keys = derive_keys(conf, ikm, &preamble)?;

    let server_mac = conf.mac.mac(&keys.server_mac_key, &preamble)?;
    hasher.write(&server_mac);
    let client_mac = conf.mac.mac(&keys.client_mac_key, &hasher.sum())?;

    Ok((keys.session_key, server_mac, client_mac))
}

/// The client side of the 3DH exchange. Holds the ephemeral AKE values
/// between KE1 and KE3.
pub(crate) struct AkeClient {
    ephemeral_secret: Option<Scalar>,
    nonce: Vec<u8>,
    serialized_ke1: Vec<u8>,
    session_key: Option<Vec<u8>>,
}

impl AkeClient {
    pub(crate) fn new() -> Self {
        Self {
            ephemeral_secret: None,
            nonce: Vec::new(),
            serialized_ke1: Vec::new(),
            session_key: None,
        }
    }

    /// Produces KE1 and stores the ephemeral values needed for KE3.
    pub(crate) fn start<R: RngCore + CryptoRng>(
        &mut self,
        conf: &Internal,
        rng: &mut R,
        credential_request: CredentialRequest,
        options: &Options,
    ) -> Result<KE1, ProtocolError> {
        let (ephemeral_secret, nonce) = secret_and_nonce(conf, rng, options)?;
        let client_keyshare = conf.group.base().mult(&ephemeral_secret);

        let ke1 = KE1 {
            credential_request,
            client_nonce: nonce.clone(),
            client_keyshare,
        };

        self.ephemeral_secret = Some(ephemeral_secret);
        self.nonce = nonce;
        self.serialized_ke1 = ke1.serialize();
        self.session_key = None;

        Ok(ke1)
    }

    /// Verifies the server MAC in KE2 and produces KE3. The three DH products
    /// are computed with the client's scalars against the server's public
    /// values, mirroring the server-side computation.
    pub(crate) fn finalize(
        &mut self,
        conf: &Internal,
        identities: &Identities,
        client_secret_key: &Scalar,
        server_public_key: &Element,
        ke2: &KE2,
    ) -> Result<KE3, ProtocolError> {
        let ephemeral_secret = self
            .ephemeral_secret
            .as_ref()
            .ok_or(ProtocolError::InvalidState)?;

        let ikm = Zeroizing::new(
            [
                ke2.server_keyshare.mult(client_secret_key).serialize(),
                server_public_key.mult(ephemeral_secret).serialize(),
                ke2.server_keyshare.mult(ephemeral_secret).serialize(),
            ]
            .concat(),
        );

        let (session_key, server_mac, client_mac) = core_3dh(
            conf,
            identities,
            &ikm,
            &self.serialized_ke1,
            &ke2.credential_response,
            &ke2.server_nonce,
            &ke2.server_keyshare.serialize(),
        )?;

        if !conf.mac.equal(&server_mac, &ke2.server_mac) {
            return Err(ProtocolError::InvalidServerMac);
        }

        self.session_key = Some(session_key);
        if let Some(secret) = self.ephemeral_secret.as_mut() {
            secret.zeroize();
        }
        self.ephemeral_secret = None;

        Ok(KE3 { client_mac })
    }

    pub(crate) fn session_key(&self) -> Option<&[u8]> {
        self.session_key.as_deref()
    }

    /// Overwrites and drops all session values.
    pub(crate) fn flush(&mut self) {
        if let Some(secret) = self.ephemeral_secret.as_mut() {
            secret.zeroize();
        }
        self.ephemeral_secret = None;
        self.nonce.zeroize();
        self.nonce.clear();
        self.serialized_ke1.clear();
        if let Some(key) = self.session_key.as_mut() {
            key.zeroize();
        }
        self.session_key = None;
    }
}

impl Drop for AkeClient {
    fn drop(&mut self) {
        self.flush();
    }
}

/// The server side of the 3DH exchange. After KE2 only the expected client
/// MAC and the session key remain.
pub(crate) struct AkeServer {
    expected_client_mac: Option<Vec<u8>>,
    session_key: Option<Vec<u8>>,
}

impl AkeServer {
    pub(crate) fn new() -> Self {
        Self {
            expected_client_mac: None,
            session_key: None,
        }
    }

    /// Produces KE2 in response to KE1 and a credential response, and stores
    /// the expected client MAC for the final step.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn response<R: RngCore + CryptoRng>(
        &mut self,
        conf: &Internal,
        rng: &mut R,
        identities: &Identities,
        server_secret_key: &Scalar,
        client_public_key: &Element,
        ke1: &KE1,
        credential_response: CredentialResponse,
        options: &Options,
    ) -> Result<KE2, ProtocolError> {
        let (ephemeral_secret, server_nonce) = secret_and_nonce(conf, rng, options)?;
        let server_keyshare = conf.group.base().mult(&ephemeral_secret);

        let ikm = Zeroizing::new(
            [
                client_public_key.mult(&ephemeral_secret).serialize(),
                ke1.client_keyshare.mult(server_secret_key).serialize(),
                ke1.client_keyshare.mult(&ephemeral_secret).serialize(),
            ]
            .concat(),
        );

        let (session_key, server_mac, client_mac) = core_3dh(
            conf,
            identities,
            &ikm,
            &ke1.serialize(),
            &credential_response,
            &server_nonce,
            &server_keyshare.serialize(),
        )?;

        self.session_key = Some(session_key);
        self.expected_client_mac = Some(client_mac);

        Ok(KE2 {
            credential_response,
            server_nonce,
            server_keyshare,
            server_mac,
        })
    }

    /// Verifies the client MAC contained in KE3 in constant time.
    pub(crate) fn finalize(&self, conf: &Internal, ke3: &KE3) -> Result<(), ProtocolError> {
        let expected = self
            .expected_client_mac
            .as_ref()
            .ok_or(ProtocolError::InvalidState)?;

        if !conf.mac.equal(expected, &ke3.client_mac) {
            return Err(ProtocolError::InvalidClientMac);
        }

        Ok(())
    }

    pub(crate) fn session_key(&self) -> Option<&[u8]> {
        self.session_key.as_deref()
    }

    pub(crate) fn expected_client_mac(&self) -> Option<&[u8]> {
        self.expected_client_mac.as_deref()
    }

    /// `expected_client_mac ‖ session_key`, for multi-process deployments.
    pub(crate) fn serialize_state(&self) -> Vec<u8> {
        [
            self.expected_client_mac.as_deref().unwrap_or_default(),
            self.session_key.as_deref().unwrap_or_default(),
        ]
        .concat()
    }

    /// Restores a serialized state into an empty session.
    pub(crate) fn set_state(
        &mut self,
        expected_client_mac: &[u8],
        session_key: &[u8],
    ) -> Result<(), ProtocolError> {
        if self.expected_client_mac.is_some() || self.session_key.is_some() {
            return Err(ProtocolError::InvalidState);
        }

        self.expected_client_mac = Some(expected_client_mac.to_vec());
        self.session_key = Some(session_key.to_vec());

        Ok(())
    }

    /// Overwrites and drops all session values.
    pub(crate) fn flush(&mut self) {
        if let Some(mac) = self.expected_client_mac.as_mut() {
            mac.zeroize();
        }
        self.expected_client_mac = None;
        if let Some(key) = self.session_key.as_mut() {
            key.zeroize();
        }
        self.session_key = None;
    }
}

impl Drop for AkeServer {
    fn drop(&mut self) {
        self.flush();
    }
}

// Tests
// =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphersuite::Configuration;

    #[test]
    fn label_layout() {
        let label = build_label(64, b"ServerMAC", &[]).unwrap();

        // 2-byte length, 1-byte label length, "OPAQUE-ServerMAC", 1-byte empty context
        assert_eq!(label[..2], [0, 64]);
        assert_eq!(label[2], 16);
        assert_eq!(&label[3..19], b"OPAQUE-ServerMAC");
        assert_eq!(label[19..], [0]);
    }

    #[test]
    fn key_share_seed_is_deterministic() {
        let conf = Configuration::default().internal().unwrap();
        let mut rng = rand::rngs::OsRng;

        let options = Options {
            key_share_seed: Some(vec![1u8; 32]),
            nonce: Some(vec![2u8; 32]),
            nonce_length: None,
        };

        let (secret_a, nonce_a) = secret_and_nonce(&conf, &mut rng, &options).unwrap();
        let (secret_b, nonce_b) = secret_and_nonce(&conf, &mut rng, &options).unwrap();
        assert_eq!(secret_a, secret_b);
        assert_eq!(nonce_a, nonce_b);

        let (secret_c, nonce_c) =
            secret_and_nonce(&conf, &mut rng, &Options::default()).unwrap();
        assert_ne!(secret_a, secret_c);
        assert_ne!(nonce_a, nonce_c);
        assert_eq!(nonce_c.len(), conf.nonce_length);
    }

    #[test]
    fn empty_server_state_rejects_ke3() {
        let conf = Configuration::default().internal().unwrap();
        let server = AkeServer::new();

        let ke3 = KE3 {
            client_mac: vec![0u8; conf.mac.size()],
        };
        assert_eq!(
            server.finalize(&conf, &ke3),
            Err(ProtocolError::InvalidState)
        );
    }

    #[test]
    fn state_restore_requires_empty_session() {
        let mut server = AkeServer::new();
        server.set_state(&[1; 64], &[2; 64]).unwrap();
        assert_eq!(
            server.set_state(&[1; 64], &[2; 64]),
            Err(ProtocolError::InvalidState)
        );

        server.flush();
        server.set_state(&[3; 64], &[4; 64]).unwrap();
        assert_eq!(server.serialize_state(), [[3u8; 64], [4u8; 64]].concat());
    }
}
