// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Transcript hashing, HKDF, and HMAC over the sealed set of hash functions

use digest::Digest;
use hkdf::Hkdf;
use hmac::{Hmac, Mac as _};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::errors::InternalError;

/// Identifies a hash function, following the standard registry namespace
/// (SHA-256 = 5, SHA-384 = 6, SHA-512 = 7).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashAlg {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlg {
    /// The single-byte registry identifier.
    pub fn identifier(self) -> u8 {
        match self {
            HashAlg::Sha256 => 5,
            HashAlg::Sha384 => 6,
            HashAlg::Sha512 => 7,
        }
    }

    pub(crate) fn from_identifier(id: u8) -> Option<Self> {
        match id {
            5 => Some(HashAlg::Sha256),
            6 => Some(HashAlg::Sha384),
            7 => Some(HashAlg::Sha512),
            _ => None,
        }
    }

    /// Output length in bytes.
    pub fn size(self) -> usize {
        match self {
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
            HashAlg::Sha512 => 64,
        }
    }
}

enum State {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Clone for State {
    fn clone(&self) -> Self {
        match self {
            State::Sha256(d) => State::Sha256(d.clone()),
            State::Sha384(d) => State::Sha384(d.clone()),
            State::Sha512(d) => State::Sha512(d.clone()),
        }
    }
}

/// A streaming transcript hasher. `sum` returns the digest of everything
/// written so far without disturbing the running state, so a transcript can be
/// extended after an intermediate digest has been taken.
pub(crate) struct Hash {
    alg: HashAlg,
    state: State,
}

impl Hash {
    pub(crate) fn new(alg: HashAlg) -> Self {
        let state = match alg {
            HashAlg::Sha256 => State::Sha256(Sha256::new()),
            HashAlg::Sha384 => State::Sha384(Sha384::new()),
            HashAlg::Sha512 => State::Sha512(Sha512::new()),
        };

        Self { alg, state }
    }

    pub(crate) fn write(&mut self, data: &[u8]) {
        match &mut self.state {
            State::Sha256(d) => d.update(data),
            State::Sha384(d) => d.update(data),
            State::Sha512(d) => d.update(data),
        }
    }

    pub(crate) fn sum(&self) -> Vec<u8> {
        match self.state.clone() {
            State::Sha256(d) => d.finalize().to_vec(),
            State::Sha384(d) => d.finalize().to_vec(),
            State::Sha512(d) => d.finalize().to_vec(),
        }
    }

    #[allow(dead_code)]
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.alg);
    }

    pub(crate) fn size(&self) -> usize {
        self.alg.size()
    }
}

/// HKDF over the configured hash.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Kdf(pub(crate) HashAlg);

impl Kdf {
    /// HKDF-Extract. A `None` salt is the all-zero salt.
    pub(crate) fn extract(&self, salt: Option<&[u8]>, ikm: &[u8]) -> Vec<u8> {
        match self.0 {
            HashAlg::Sha256 => Hkdf::<Sha256>::extract(salt, ikm).0.to_vec(),
            HashAlg::Sha384 => Hkdf::<Sha384>::extract(salt, ikm).0.to_vec(),
            HashAlg::Sha512 => Hkdf::<Sha512>::extract(salt, ikm).0.to_vec(),
        }
    }

    /// HKDF-Expand of `length` bytes from a pseudorandom key.
    pub(crate) fn expand(
        &self,
        prk: &[u8],
        info: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, InternalError> {
        let mut okm = vec![0u8; length];

        match self.0 {
            HashAlg::Sha256 => Hkdf::<Sha256>::from_prk(prk)
                .map_err(|_| InternalError::HkdfError)?
                .expand(info, &mut okm)
                .map_err(|_| InternalError::HkdfError)?,
            HashAlg::Sha384 => Hkdf::<Sha384>::from_prk(prk)
                .map_err(|_| InternalError::HkdfError)?
                .expand(info, &mut okm)
                .map_err(|_| InternalError::HkdfError)?,
            HashAlg::Sha512 => Hkdf::<Sha512>::from_prk(prk)
                .map_err(|_| InternalError::HkdfError)?
                .expand(info, &mut okm)
                .map_err(|_| InternalError::HkdfError)?,
        }

        Ok(okm)
    }

    pub(crate) fn size(&self) -> usize {
        self.0.size()
    }
}

/// HMAC over the configured hash, with constant-time tag comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Mac(pub(crate) HashAlg);

impl Mac {
    pub(crate) fn mac(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, InternalError> {
        let tag = match self.0 {
            HashAlg::Sha256 => {
                let mut mac =
                    Hmac::<Sha256>::new_from_slice(key).map_err(|_| InternalError::HmacError)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            HashAlg::Sha384 => {
                let mut mac =
                    Hmac::<Sha384>::new_from_slice(key).map_err(|_| InternalError::HmacError)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            HashAlg::Sha512 => {
                let mut mac =
                    Hmac::<Sha512>::new_from_slice(key).map_err(|_| InternalError::HmacError)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        };

        Ok(tag)
    }

    /// Constant-time comparison of two tags.
    pub(crate) fn equal(&self, a: &[u8], b: &[u8]) -> bool {
        a.ct_eq(b).into()
    }

    pub(crate) fn size(&self) -> usize {
        self.0.size()
    }
}

// Tests
// =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_sum_preserves_state() {
        let mut hasher = Hash::new(HashAlg::Sha512);
        hasher.write(b"preamble");
        let intermediate = hasher.sum();

        hasher.write(b"server mac");
        let last = hasher.sum();

        let mut direct = Hash::new(HashAlg::Sha512);
        direct.write(b"preamble");
        direct.write(b"server mac");
        assert_eq!(last, direct.sum());
        assert_ne!(intermediate, last);
    }

    #[test]
    fn kdf_sizes_follow_hash() {
        for (alg, size) in [
            (HashAlg::Sha256, 32),
            (HashAlg::Sha384, 48),
            (HashAlg::Sha512, 64),
        ] {
            let kdf = Kdf(alg);
            assert_eq!(kdf.size(), size);
            assert_eq!(kdf.extract(None, b"ikm").len(), size);

            let prk = kdf.extract(None, b"ikm");
            assert_eq!(kdf.expand(&prk, b"info", 2 * size).unwrap().len(), 2 * size);
        }
    }

    #[test]
    fn mac_equal_is_length_aware() {
        let mac = Mac(HashAlg::Sha256);
        let tag = mac.mac(b"key", b"message").unwrap();

        assert!(mac.equal(&tag, &tag));
        assert!(!mac.equal(&tag, &tag[..tag.len() - 1]));

        let mut tampered = tag.clone();
        tampered[0] ^= 1;
        assert!(!mac.equal(&tag, &tampered));
    }
}
