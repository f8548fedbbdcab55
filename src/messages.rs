// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Contains the messages used for OPAQUE

use crate::ciphersuite::Internal;
use crate::envelope::Envelope;
use crate::errors::{utils::check_slice_size, ProtocolError};
use crate::group::Element;

/// The message sent by the client to the server to initiate registration
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationRequest {
    /// blinded password information
    pub(crate) blinded_message: Element,
}

impl RegistrationRequest {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        self.blinded_message.serialize()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        let oprf_group = conf.oprf.group();
        check_slice_size(input, oprf_group.element_len(), "registration request")?;

        Ok(Self {
            blinded_message: oprf_group.deserialize_element(input)?,
        })
    }
}

/// The answer sent by the server to the client upon reception of the
/// registration request
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationResponse {
    /// the server's OPRF output
    pub(crate) evaluated_message: Element,
    /// the server's long-term AKE public key
    pub(crate) server_public_key: Element,
}

impl RegistrationResponse {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        [
            self.evaluated_message.serialize(),
            self.server_public_key.serialize(),
        ]
        .concat()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        let oprf_group = conf.oprf.group();
        let oprf_len = oprf_group.element_len();
        let ake_len = conf.group.element_len();
        check_slice_size(input, oprf_len + ake_len, "registration response")?;

        Ok(Self {
            evaluated_message: oprf_group.deserialize_element(&input[..oprf_len])?,
            server_public_key: conf.group.deserialize_element(&input[oprf_len..])?,
        })
    }
}

/// The final registration message from the client, stored by the server as
/// part of the client's record
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationRecord {
    /// the client's long-term AKE public key
    pub(crate) public_key: Element,
    /// a KDF-sized secret used to mask the credential response
    pub(crate) masking_key: Vec<u8>,
    /// the sealed envelope
    pub(crate) envelope: Envelope,
}

impl RegistrationRecord {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        [
            self.public_key.serialize(),
            self.masking_key.clone(),
            self.envelope.serialize(),
        ]
        .concat()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        let ake_len = conf.group.element_len();
        let kdf_len = conf.kdf.size();
        check_slice_size(
            input,
            ake_len + kdf_len + conf.envelope_size(),
            "registration record",
        )?;

        Ok(Self {
            public_key: conf.group.deserialize_element(&input[..ake_len])?,
            masking_key: input[ake_len..ake_len + kdf_len].to_vec(),
            envelope: Envelope::deserialize(conf, &input[ake_len + kdf_len..])?,
        })
    }
}

/// The credential retrieval part of KE1
#[derive(Clone, Debug, PartialEq)]
pub struct CredentialRequest {
    /// blinded password information
    pub(crate) blinded_message: Element,
}

impl CredentialRequest {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        self.blinded_message.serialize()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        let oprf_group = conf.oprf.group();
        check_slice_size(input, oprf_group.element_len(), "credential request")?;

        Ok(Self {
            blinded_message: oprf_group.deserialize_element(input)?,
        })
    }
}

/// The credential retrieval part of KE2
#[derive(Clone, Debug, PartialEq)]
pub struct CredentialResponse {
    /// the server's OPRF output
    pub(crate) evaluated_message: Element,
    /// nonce under which the record was masked
    pub(crate) masking_nonce: Vec<u8>,
    /// `server_public_key ‖ envelope`, masked
    pub(crate) masked_response: Vec<u8>,
}

impl CredentialResponse {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        [
            self.evaluated_message.serialize(),
            self.masking_nonce.clone(),
            self.masked_response.clone(),
        ]
        .concat()
    }

    pub(crate) fn size(conf: &Internal) -> usize {
        conf.oprf.group().element_len()
            + conf.nonce_length
            + conf.group.element_len()
            + conf.envelope_size()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        check_slice_size(input, Self::size(conf), "credential response")?;

        let oprf_len = conf.oprf.group().element_len();
        let nonce_end = oprf_len + conf.nonce_length;

        Ok(Self {
            evaluated_message: conf.oprf.group().deserialize_element(&input[..oprf_len])?,
            masking_nonce: input[oprf_len..nonce_end].to_vec(),
            masked_response: input[nonce_end..].to_vec(),
        })
    }
}

/// The first login message, from client to server
#[derive(Clone, Debug, PartialEq)]
pub struct KE1 {
    /// the credential retrieval request
    pub(crate) credential_request: CredentialRequest,
    /// the client's AKE nonce
    pub(crate) client_nonce: Vec<u8>,
    /// the client's ephemeral AKE public key
    pub(crate) client_keyshare: Element,
}

impl KE1 {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        [
            self.credential_request.serialize(),
            self.client_nonce.clone(),
            self.client_keyshare.serialize(),
        ]
        .concat()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        let oprf_len = conf.oprf.group().element_len();
        let ake_len = conf.group.element_len();
        check_slice_size(input, oprf_len + conf.nonce_length + ake_len, "KE1")?;

        let nonce_end = oprf_len + conf.nonce_length;

        Ok(Self {
            credential_request: CredentialRequest::deserialize(conf, &input[..oprf_len])?,
            client_nonce: input[oprf_len..nonce_end].to_vec(),
            client_keyshare: conf.group.deserialize_element(&input[nonce_end..])?,
        })
    }
}

/// The second login message, from server to client
#[derive(Clone, Debug, PartialEq)]
pub struct KE2 {
    /// the credential retrieval response
    pub(crate) credential_response: CredentialResponse,
    /// the server's AKE nonce
    pub(crate) server_nonce: Vec<u8>,
    /// the server's ephemeral AKE public key
    pub(crate) server_keyshare: Element,
    /// the server's transcript MAC
    pub(crate) server_mac: Vec<u8>,
}

impl KE2 {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        [
            self.credential_response.serialize(),
            self.server_nonce.clone(),
            self.server_keyshare.serialize(),
            self.server_mac.clone(),
        ]
        .concat()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        let response_len = CredentialResponse::size(conf);
        let ake_len = conf.group.element_len();
        check_slice_size(
            input,
            response_len + conf.nonce_length + ake_len + conf.mac.size(),
            "KE2",
        )?;

        let nonce_end = response_len + conf.nonce_length;
        let keyshare_end = nonce_end + ake_len;

        Ok(Self {
            credential_response: CredentialResponse::deserialize(conf, &input[..response_len])?,
            server_nonce: input[response_len..nonce_end].to_vec(),
            server_keyshare: conf.group.deserialize_element(&input[nonce_end..keyshare_end])?,
            server_mac: input[keyshare_end..].to_vec(),
        })
    }
}

/// The third login message, from client to server
#[derive(Clone, Debug, PartialEq)]
pub struct KE3 {
    /// the client's transcript MAC
    pub(crate) client_mac: Vec<u8>,
}

impl KE3 {
    /// Serialization into bytes
    pub fn serialize(&self) -> Vec<u8> {
        self.client_mac.clone()
    }

    pub(crate) fn deserialize(conf: &Internal, input: &[u8]) -> Result<Self, ProtocolError> {
        check_slice_size(input, conf.mac.size(), "KE3")?;

        Ok(Self {
            client_mac: input.to_vec(),
        })
    }
}
