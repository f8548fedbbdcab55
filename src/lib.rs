// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! An implementation of the OPAQUE asymmetric password-authenticated key
//! exchange protocol.
//!
//! OPAQUE lets a client prove knowledge of a password to a server and derive
//! a shared session key, without the server ever learning the password and
//! without enabling precomputation attacks against a stolen server database.
//!
//! # Overview
//!
//! A client and a server first agree on a [`Configuration`]: an OPRF group,
//! an AKE group, a key stretching function, and the KDF, MAC, and transcript
//! hashes, plus an optional shared context string. The configuration must be
//! kept consistent throughout protocol execution; it can be serialized and
//! compared over the wire.
//!
//! ```
//! use opaque_ake::{Configuration, Group, HashAlg};
//!
//! let configuration = Configuration::default();
//! assert_eq!(configuration.oprf, Group::Ristretto255);
//! assert_eq!(configuration.hash, HashAlg::Sha512);
//!
//! let encoded = configuration.serialize()?;
//! assert_eq!(Configuration::deserialize(&encoded)?, configuration);
//! # Ok::<(), opaque_ake::ProtocolError>(())
//! ```
//!
//! ## Setup
//!
//! The server generates its long-term key material once and sets it on every
//! [`Server`] instance. The OPRF seed must be of transcript-hash length, and
//! per-client OPRF keys are derived from it and the credential identifier.
//!
//! ```
//! use opaque_ake::{Configuration, Server};
//! use rand::rngs::OsRng;
//!
//! let mut rng = OsRng;
//! let configuration = Configuration::default();
//!
//! let (server_secret_key, server_public_key) = configuration.key_gen(&mut rng);
//! let oprf_seed = configuration.generate_oprf_seed(&mut rng);
//!
//! let mut server = Server::new(&configuration)?;
//! server.set_key_material(None, &server_secret_key, &server_public_key, &oprf_seed)?;
//! # Ok::<(), opaque_ake::ProtocolError>(())
//! ```
//!
//! ## Registration and login
//!
//! Registration is a three-message flow producing a [`RegistrationRecord`]
//! that the server stores under a credential identifier; login is a
//! three-message flow producing a mutually authenticated session key. Note
//! that the identity key stretching function is selected below only so that
//! the documentation tests execute quickly; real applications should keep the
//! default Argon2id.
//!
//! ```
//! use opaque_ake::{Client, ClientRecord, Configuration, Identifiers, Ksf, Server};
//! use rand::rngs::OsRng;
//!
//! let mut rng = OsRng;
//! let configuration = Configuration {
//!     ksf: Ksf::Identity,
//!     ..Configuration::default()
//! };
//!
//! # let (server_secret_key, server_public_key) = configuration.key_gen(&mut rng);
//! # let oprf_seed = configuration.generate_oprf_seed(&mut rng);
//! # let mut server = Server::new(&configuration)?;
//! # server.set_key_material(None, &server_secret_key, &server_public_key, &oprf_seed)?;
//! // Registration
//! let mut client = Client::new(&configuration)?;
//! let request = client.registration_init(&mut rng, b"hunter2")?;
//! let response = server.registration_response(&request, b"alice@example")?;
//! let registration =
//!     client.registration_finalize(&mut rng, &response, &Identifiers::default())?;
//!
//! let record = ClientRecord {
//!     credential_identifier: b"alice@example".to_vec(),
//!     client_identity: None,
//!     record: registration.message,
//! };
//!
//! // Login
//! let mut client = Client::new(&configuration)?;
//! let ke1 = client.generate_ke1(&mut rng, b"hunter2", &Default::default())?;
//! let ke2 = server.generate_ke2(&mut rng, &ke1, &record, &Default::default())?;
//! let finish = client.generate_ke3(&ke2, &Identifiers::default())?;
//! server.login_finish(&finish.message)?;
//!
//! assert_eq!(server.session_key(), Some(&finish.session_key[..]));
//! # Ok::<(), opaque_ake::ProtocolError>(())
//! ```
//!
//! When no record exists for a credential identifier, the server should run
//! the login against [`Configuration::fake_record`] so that unregistered
//! identifiers are indistinguishable from wrong passwords.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ciphersuite;
mod envelope;
pub mod errors;
pub mod group;
pub mod hash;
pub mod key_exchange;
pub mod ksf;
mod masking;
pub mod messages;
mod opaque;
mod oprf;
mod serialization;

#[cfg(test)]
mod tests;

pub use crate::ciphersuite::{Configuration, Deserializer, NONCE_LENGTH};
pub use crate::errors::{InternalError, ProtocolError};
pub use crate::group::Group;
pub use crate::hash::HashAlg;
pub use crate::key_exchange::Options;
pub use crate::ksf::Ksf;
pub use crate::messages::{
    CredentialRequest, CredentialResponse, RegistrationRecord, RegistrationRequest,
    RegistrationResponse, KE1, KE2, KE3,
};
pub use crate::opaque::{
    Client, ClientLoginFinishResult, ClientRecord, ClientRegistrationFinishResult,
    GenerateKe2Options, Identifiers, Server,
};
