// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

mod message_test;

use crate::ciphersuite::Configuration;
use crate::group::Group;
use crate::hash::HashAlg;
use crate::ksf::Ksf;

// The recommended configuration for each supported group, with the identity
// KSF selected so that the tests execute quickly.
pub(crate) fn test_configurations() -> Vec<Configuration> {
    [Group::Ristretto255, Group::P256, Group::P384, Group::P521]
        .into_iter()
        .map(test_configuration)
        .collect()
}

pub(crate) fn test_configuration(group: Group) -> Configuration {
    let hash = match group {
        Group::Ristretto255 | Group::P521 => HashAlg::Sha512,
        Group::P256 => HashAlg::Sha256,
        Group::P384 => HashAlg::Sha384,
    };

    Configuration {
        oprf: group,
        ake: group,
        ksf: Ksf::Identity,
        kdf: hash,
        mac: hash,
        hash,
        context: Vec::new(),
    }
}
