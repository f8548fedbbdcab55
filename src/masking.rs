// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Masking of the credential response. The server XORs the pair
//! `server_public_key ‖ envelope` with a pad expanded from the client's
//! masking key, so the response reveals nothing to anyone who cannot derive
//! that key from the password.

use zeroize::Zeroizing;

use crate::ciphersuite::Internal;
use crate::errors::ProtocolError;

static STR_CREDENTIAL_RESPONSE_PAD: &[u8] = b"CredentialResponsePad";

fn pad(
    conf: &Internal,
    masking_key: &[u8],
    masking_nonce: &[u8],
) -> Result<Zeroizing<Vec<u8>>, ProtocolError> {
    Ok(Zeroizing::new(conf.kdf.expand(
        masking_key,
        &[masking_nonce, STR_CREDENTIAL_RESPONSE_PAD].concat(),
        conf.group.element_len() + conf.envelope_size(),
    )?))
}

/// Masks `server_public_key ‖ envelope` under the given nonce.
pub(crate) fn mask(
    conf: &Internal,
    masking_key: &[u8],
    masking_nonce: &[u8],
    server_public_key: &[u8],
    envelope: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let pad = pad(conf, masking_key, masking_nonce)?;

    Ok([server_public_key, envelope]
        .concat()
        .iter()
        .zip(pad.iter())
        .map(|(x, p)| x ^ p)
        .collect())
}

/// Unmasks a credential response payload into the serialized server public
/// key and envelope.
pub(crate) fn unmask(
    conf: &Internal,
    masking_key: &[u8],
    masking_nonce: &[u8],
    masked_response: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), ProtocolError> {
    let element_len = conf.group.element_len();
    let expected = element_len + conf.envelope_size();
    if masked_response.len() != expected {
        return Err(ProtocolError::InvalidLength {
            name: "masked response",
            expected,
            actual: masked_response.len(),
        });
    }

    let pad = pad(conf, masking_key, masking_nonce)?;
    let unmasked: Vec<u8> = masked_response
        .iter()
        .zip(pad.iter())
        .map(|(x, p)| x ^ p)
        .collect();

    Ok((
        unmasked[..element_len].to_vec(),
        unmasked[element_len..].to_vec(),
    ))
}

// Tests
// =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphersuite::Configuration;

    #[test]
    fn mask_unmask_round_trip() {
        let conf = Configuration::default().internal().unwrap();

        let masking_key = vec![3u8; conf.kdf.size()];
        let masking_nonce = vec![5u8; conf.nonce_length];
        let server_public_key = conf.group.base().serialize();
        let envelope = vec![7u8; conf.envelope_size()];

        let masked = mask(
            &conf,
            &masking_key,
            &masking_nonce,
            &server_public_key,
            &envelope,
        )
        .unwrap();
        assert_eq!(masked.len(), conf.group.element_len() + conf.envelope_size());

        let (pk, env) = unmask(&conf, &masking_key, &masking_nonce, &masked).unwrap();
        assert_eq!(pk, server_public_key);
        assert_eq!(env, envelope);
    }

    #[test]
    fn unmask_with_wrong_key_scrambles() {
        let conf = Configuration::default().internal().unwrap();

        let masking_nonce = vec![5u8; conf.nonce_length];
        let server_public_key = conf.group.base().serialize();
        let envelope = vec![7u8; conf.envelope_size()];

        let masked = mask(
            &conf,
            &vec![3u8; conf.kdf.size()],
            &masking_nonce,
            &server_public_key,
            &envelope,
        )
        .unwrap();

        let (pk, env) = unmask(&conf, &vec![4u8; conf.kdf.size()], &masking_nonce, &masked).unwrap();
        assert_ne!(pk, server_public_key);
        assert_ne!(env, envelope);
    }

    #[test]
    fn unmask_rejects_wrong_length() {
        let conf = Configuration::default().internal().unwrap();

        let result = unmask(
            &conf,
            &vec![3u8; conf.kdf.size()],
            &vec![5u8; conf.nonce_length],
            &[0u8; 4],
        );
        assert!(result.is_err());
    }
}
