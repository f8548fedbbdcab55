// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The authenticated key exchange layered over the OPRF

pub(crate) mod tripledh;

/// Optional values for a key exchange step. Unset fields are sampled from the
/// caller's CSPRNG; they exist to support deterministic test-vector
/// reproduction and must be left unset by production callers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Options {
    /// Seed for deterministic derivation of the ephemeral AKE scalar.
    pub key_share_seed: Option<Vec<u8>>,
    /// Explicit AKE nonce.
    pub nonce: Option<Vec<u8>>,
    /// Length of the generated nonce when no explicit nonce is given. Must
    /// equal the nonce length used elsewhere in the session.
    pub nonce_length: Option<usize>,
}

/// Identities bound into the transcript, after substituting absent ones with
/// the corresponding public key encodings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Identities {
    pub(crate) client: Vec<u8>,
    pub(crate) server: Vec<u8>,
}
