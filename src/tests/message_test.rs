// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Serialization round-trips and length checks for every protocol message

use rand::rngs::OsRng;

use super::{test_configuration, test_configurations};
use crate::ciphersuite::{Configuration, Deserializer, NONCE_LENGTH};
use crate::errors::ProtocolError;
use crate::group::Group;
use crate::opaque::{Client, ClientRecord, Identifiers, Server};

struct Messages {
    deserializer: Deserializer,
    registration_request: Vec<u8>,
    registration_response: Vec<u8>,
    registration_record: Vec<u8>,
    credential_request: Vec<u8>,
    credential_response: Vec<u8>,
    ke1: Vec<u8>,
    ke2: Vec<u8>,
    ke3: Vec<u8>,
}

// Runs a complete registration and login to produce genuine messages of every
// type under the given configuration.
fn messages_for(configuration: &Configuration) -> Messages {
    let mut rng = OsRng;

    let (server_secret_key, server_public_key) = configuration.key_gen(&mut rng);
    let oprf_seed = configuration.generate_oprf_seed(&mut rng);

    let mut server = Server::new(configuration).unwrap();
    server
        .set_key_material(None, &server_secret_key, &server_public_key, &oprf_seed)
        .unwrap();

    let mut client = Client::new(configuration).unwrap();
    let registration_request = client.registration_init(&mut rng, b"password").unwrap();
    let registration_response = server
        .registration_response(&registration_request, b"credential_identifier")
        .unwrap();
    let registration = client
        .registration_finalize(&mut rng, &registration_response, &Identifiers::default())
        .unwrap();

    let record = ClientRecord {
        credential_identifier: b"credential_identifier".to_vec(),
        client_identity: None,
        record: registration.message.clone(),
    };

    let mut client = Client::new(configuration).unwrap();
    let ke1 = client
        .generate_ke1(&mut rng, b"password", &Default::default())
        .unwrap();
    let ke2 = server
        .generate_ke2(&mut rng, &ke1, &record, &Default::default())
        .unwrap();
    let finish = client.generate_ke3(&ke2, &Identifiers::default()).unwrap();

    let oprf_element_len = configuration.oprf.element_len();
    let ake_element_len = configuration.ake.element_len();
    let envelope_len = NONCE_LENGTH + configuration.mac.size();
    let credential_response_len =
        oprf_element_len + NONCE_LENGTH + ake_element_len + envelope_len;

    let serialized_ke1 = ke1.serialize();
    let serialized_ke2 = ke2.serialize();

    Messages {
        deserializer: configuration.deserializer().unwrap(),
        registration_request: registration_request.serialize(),
        registration_response: registration_response.serialize(),
        registration_record: registration.message.serialize(),
        credential_request: serialized_ke1[..oprf_element_len].to_vec(),
        credential_response: serialized_ke2[..credential_response_len].to_vec(),
        ke1: serialized_ke1,
        ke2: serialized_ke2,
        ke3: finish.message.serialize(),
    }
}

#[test]
fn round_trip_all_messages() {
    for configuration in test_configurations() {
        let m = messages_for(&configuration);
        let d = &m.deserializer;

        assert_eq!(
            d.registration_request(&m.registration_request)
                .unwrap()
                .serialize(),
            m.registration_request
        );
        assert_eq!(
            d.registration_response(&m.registration_response)
                .unwrap()
                .serialize(),
            m.registration_response
        );
        assert_eq!(
            d.registration_record(&m.registration_record)
                .unwrap()
                .serialize(),
            m.registration_record
        );
        assert_eq!(
            d.credential_request(&m.credential_request)
                .unwrap()
                .serialize(),
            m.credential_request
        );
        assert_eq!(
            d.credential_response(&m.credential_response)
                .unwrap()
                .serialize(),
            m.credential_response
        );
        assert_eq!(d.ke1(&m.ke1).unwrap().serialize(), m.ke1);
        assert_eq!(d.ke2(&m.ke2).unwrap().serialize(), m.ke2);
        assert_eq!(d.ke3(&m.ke3).unwrap().serialize(), m.ke3);
    }
}

#[test]
fn deserialized_messages_compare_equal() {
    let configuration = test_configuration(Group::Ristretto255);
    let m = messages_for(&configuration);
    let d = &m.deserializer;

    assert_eq!(d.ke1(&m.ke1).unwrap(), d.ke1(&m.ke1).unwrap());
    assert_eq!(d.ke2(&m.ke2).unwrap(), d.ke2(&m.ke2).unwrap());
    assert_eq!(
        d.registration_record(&m.registration_record).unwrap(),
        d.registration_record(&m.registration_record).unwrap()
    );
}

#[test]
fn altered_lengths_are_rejected() {
    for configuration in test_configurations() {
        let m = messages_for(&configuration);
        let d = &m.deserializer;

        let cases: [(&[u8], fn(&Deserializer, &[u8]) -> Result<(), ProtocolError>); 8] = [
            (&m.registration_request, |d, i| {
                d.registration_request(i).map(|_| ())
            }),
            (&m.registration_response, |d, i| {
                d.registration_response(i).map(|_| ())
            }),
            (&m.registration_record, |d, i| {
                d.registration_record(i).map(|_| ())
            }),
            (&m.credential_request, |d, i| {
                d.credential_request(i).map(|_| ())
            }),
            (&m.credential_response, |d, i| {
                d.credential_response(i).map(|_| ())
            }),
            (&m.ke1, |d, i| d.ke1(i).map(|_| ())),
            (&m.ke2, |d, i| d.ke2(i).map(|_| ())),
            (&m.ke3, |d, i| d.ke3(i).map(|_| ())),
        ];

        for (bytes, deserialize) in cases {
            let truncated = deserialize(d, &bytes[..bytes.len() - 1]);
            assert!(matches!(
                truncated,
                Err(ProtocolError::InvalidLength { .. })
            ));

            let extended = deserialize(d, &[bytes, &[0u8][..]].concat());
            assert!(matches!(extended, Err(ProtocolError::InvalidLength { .. })));

            let empty = deserialize(d, &[]);
            assert!(matches!(empty, Err(ProtocolError::InvalidLength { .. })));
        }
    }
}

#[test]
fn non_canonical_elements_are_rejected() {
    for configuration in test_configurations() {
        let deserializer = configuration.deserializer().unwrap();

        let garbage = vec![0xffu8; configuration.oprf.element_len()];
        assert_eq!(
            deserializer.registration_request(&garbage).err(),
            Some(ProtocolError::NonCanonicalEncoding)
        );
        assert_eq!(
            deserializer.credential_request(&garbage).err(),
            Some(ProtocolError::NonCanonicalEncoding)
        );
    }
}

#[test]
fn messages_do_not_cross_configurations() {
    let ristretto = messages_for(&test_configuration(Group::Ristretto255));
    let p256 = test_configuration(Group::P256).deserializer().unwrap();

    // All fixed lengths differ between the two configurations.
    assert!(matches!(
        p256.ke1(&ristretto.ke1),
        Err(ProtocolError::InvalidLength { .. })
    ));
    assert!(matches!(
        p256.ke2(&ristretto.ke2),
        Err(ProtocolError::InvalidLength { .. })
    ));
    assert!(matches!(
        p256.registration_record(&ristretto.registration_record),
        Err(ProtocolError::InvalidLength { .. })
    ));
}
