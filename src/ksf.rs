// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Key stretching functions applied to the OPRF output before key recovery

use sha2::Sha512;

use crate::errors::InternalError;
use crate::hash::Kdf;

// The argon2 crate refuses empty salts, so the empty protocol salt maps to
// this fixed all-zero salt of the recommended length.
const ARGON2_RECOMMENDED_SALT_LEN: usize = 16;

const ARGON2_MEMORY_KIB: u32 = 65536;
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;

const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

const PBKDF2_ITERATIONS: u32 = 10000;

/// Identifies the key stretching function used to harden the OPRF output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ksf {
    /// No stretching; the input is truncated or KDF-extended to the requested
    /// length.
    Identity,
    /// Argon2id(1, 65536, 4)
    Argon2id,
    /// scrypt(32768, 8, 1)
    Scrypt,
    /// PBKDF2-SHA512 with 10,000 iterations
    Pbkdf2Sha512,
}

impl Ksf {
    /// The single-byte registry identifier.
    pub fn identifier(self) -> u8 {
        match self {
            Ksf::Identity => 0,
            Ksf::Argon2id => 1,
            Ksf::Scrypt => 2,
            Ksf::Pbkdf2Sha512 => 3,
        }
    }

    pub(crate) fn from_identifier(id: u8) -> Option<Self> {
        match id {
            0 => Some(Ksf::Identity),
            1 => Some(Ksf::Argon2id),
            2 => Some(Ksf::Scrypt),
            3 => Some(Ksf::Pbkdf2Sha512),
            _ => None,
        }
    }

    /// Stretches `input` into `length` bytes.
    pub(crate) fn harden(
        self,
        kdf: &Kdf,
        input: &[u8],
        salt: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, InternalError> {
        match self {
            Ksf::Identity => {
                if input.len() >= length {
                    Ok(input[..length].to_vec())
                } else {
                    kdf.expand(input, &[], length)
                }
            }
            Ksf::Argon2id => {
                let params = argon2::Params::new(
                    ARGON2_MEMORY_KIB,
                    ARGON2_ITERATIONS,
                    ARGON2_PARALLELISM,
                    Some(length),
                )
                .map_err(|_| InternalError::KsfError)?;
                let argon2 = argon2::Argon2::new(
                    argon2::Algorithm::Argon2id,
                    argon2::Version::V0x13,
                    params,
                );

                let zero_salt = [0u8; ARGON2_RECOMMENDED_SALT_LEN];
                let salt = if salt.is_empty() { &zero_salt[..] } else { salt };

                let mut output = vec![0u8; length];
                argon2
                    .hash_password_into(input, salt, &mut output)
                    .map_err(|_| InternalError::KsfError)?;
                Ok(output)
            }
            Ksf::Scrypt => {
                let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, length)
                    .map_err(|_| InternalError::KsfError)?;

                let mut output = vec![0u8; length];
                scrypt::scrypt(input, salt, &params, &mut output)
                    .map_err(|_| InternalError::KsfError)?;
                Ok(output)
            }
            Ksf::Pbkdf2Sha512 => {
                let mut output = vec![0u8; length];
                pbkdf2::pbkdf2_hmac::<Sha512>(input, salt, PBKDF2_ITERATIONS, &mut output);
                Ok(output)
            }
        }
    }
}

// Tests
// =====

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlg;

    #[test]
    fn identity_truncates_and_extends() {
        let kdf = Kdf(HashAlg::Sha256);
        let input = [7u8; 32];

        assert_eq!(Ksf::Identity.harden(&kdf, &input, &[], 16).unwrap(), input[..16]);
        assert_eq!(Ksf::Identity.harden(&kdf, &input, &[], 32).unwrap(), input);

        let extended = Ksf::Identity.harden(&kdf, &input, &[], 48).unwrap();
        assert_eq!(extended.len(), 48);
        assert_ne!(&extended[..32], input);
    }

    #[test]
    fn hardened_output_is_deterministic() {
        let kdf = Kdf(HashAlg::Sha512);

        for ksf in [Ksf::Scrypt, Ksf::Pbkdf2Sha512] {
            let a = ksf.harden(&kdf, b"hunter2", &[], 64).unwrap();
            let b = ksf.harden(&kdf, b"hunter2", &[], 64).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.len(), 64);
            assert_ne!(a, ksf.harden(&kdf, b"hunter3", &[], 64).unwrap());
        }
    }
}
