// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A list of error types which are produced during an execution of the protocol

use displaydoc::Display;
use thiserror::Error;

/// Represents a failure inside the cryptographic primitive layer. These cannot
/// occur with well-formed configuration parameters and message lengths.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum InternalError {
    /// Computing HKDF failed while deriving subkeys
    HkdfError,
    /// Computing HMAC failed while supplying a secret key
    HmacError,
    /// Computing the key stretching function failed
    KsfError,
    /// Computing the hash-to-group map failed
    HashToGroup,
    /// Computing the hash-to-scalar map failed
    HashToScalar,
}

/// Represents an error in protocol handling
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum ProtocolError {
    /// Unrecognized OPRF group, AKE group, hash, or KSF identifier
    InvalidCiphersuite,
    /// Invalid length for {name}: expected {expected}, but is actually {actual}.
    InvalidLength {
        /// name of the checked buffer
        name: &'static str,
        /// expected length
        expected: usize,
        /// actual length
        actual: usize,
    },
    /// Decoding a group element or scalar failed
    NonCanonicalEncoding,
    /// The server AKE secret key is the zero scalar
    ZeroScalar,
    /// The envelope authentication tag did not verify
    EnvelopeRecovery,
    /// The server MAC contained in KE2 did not verify
    InvalidServerMac,
    /// The client MAC contained in KE3 did not verify
    InvalidClientMac,
    /// Key material has not been set; call set_key_material() first
    MissingKeyMaterial,
    /// Out-of-order call, or a state buffer of the wrong length
    InvalidState,
    /// Internal error during cryptographic computation: {0}
    Internal(InternalError),
}

impl From<InternalError> for ProtocolError {
    fn from(e: InternalError) -> ProtocolError {
        ProtocolError::Internal(e)
    }
}

pub(crate) mod utils {
    use super::*;

    pub fn check_slice_size<'a>(
        slice: &'a [u8],
        expected_len: usize,
        arg_name: &'static str,
    ) -> Result<&'a [u8], ProtocolError> {
        if slice.len() != expected_len {
            return Err(ProtocolError::InvalidLength {
                name: arg_name,
                expected: expected_len,
                actual: slice.len(),
            });
        }
        Ok(slice)
    }
}
