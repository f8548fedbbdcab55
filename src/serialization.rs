// Copyright (c) the opaque-ake developers.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Integer and length-prefixed vector encodings shared by all wire formats

use crate::errors::ProtocolError;

/// Maximum byte length of a 2-byte length-prefixed vector.
pub(crate) const MAX_VECTOR_LENGTH: usize = 65535;

/// I2OSP: big-endian `length`-byte encoding of `value`. Fails if the value
/// does not fit in `length` bytes.
pub(crate) fn i2osp(value: usize, length: usize) -> Result<Vec<u8>, ProtocolError> {
    const SIZE: usize = core::mem::size_of::<usize>();

    if length < SIZE && value >= 1 << (8 * length) {
        return Err(ProtocolError::InvalidLength {
            name: "i2osp value",
            expected: length,
            actual: SIZE,
        });
    }

    if length <= SIZE {
        return Ok(value.to_be_bytes()[SIZE - length..].to_vec());
    }

    let mut out = vec![0u8; length - SIZE];
    out.extend_from_slice(&value.to_be_bytes());
    Ok(out)
}

/// OS2IP: inverse of [`i2osp`] for inputs no longer than a `usize`.
pub(crate) fn os2ip(input: &[u8]) -> Result<usize, ProtocolError> {
    if input.len() > core::mem::size_of::<usize>() {
        return Err(ProtocolError::InvalidLength {
            name: "os2ip input",
            expected: core::mem::size_of::<usize>(),
            actual: input.len(),
        });
    }

    Ok(input.iter().fold(0, |value, byte| (value << 8) | usize::from(*byte)))
}

/// Prefixes `input` with its length encoded over `prefix_length` bytes.
pub(crate) fn encode_vector_len(input: &[u8], prefix_length: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut out = i2osp(input.len(), prefix_length)?;
    out.extend_from_slice(input);
    Ok(out)
}

/// Prefixes `input` with its 2-byte length. Inputs over 65,535 bytes are
/// rejected.
pub(crate) fn encode_vector(input: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if input.len() > MAX_VECTOR_LENGTH {
        return Err(ProtocolError::InvalidLength {
            name: "vector",
            expected: MAX_VECTOR_LENGTH,
            actual: input.len(),
        });
    }

    encode_vector_len(input, 2)
}

/// Reads a 2-byte length followed by that many bytes, returning the vector
/// contents and the remaining input.
pub(crate) fn decode_vector(input: &[u8]) -> Result<(&[u8], &[u8]), ProtocolError> {
    if input.len() < 2 {
        return Err(ProtocolError::InvalidLength {
            name: "vector length prefix",
            expected: 2,
            actual: input.len(),
        });
    }

    let length = os2ip(&input[..2])?;
    if input.len() - 2 < length {
        return Err(ProtocolError::InvalidLength {
            name: "vector contents",
            expected: length,
            actual: input.len() - 2,
        });
    }

    Ok((&input[2..2 + length], &input[2 + length..]))
}

// Tests
// =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2osp_fixed_width() {
        assert_eq!(i2osp(0, 1).unwrap(), vec![0]);
        assert_eq!(i2osp(255, 1).unwrap(), vec![255]);
        assert_eq!(i2osp(256, 2).unwrap(), vec![1, 0]);
        assert_eq!(i2osp(65535, 2).unwrap(), vec![255, 255]);
        assert_eq!(i2osp(1, 10).unwrap(), [vec![0u8; 9], vec![1]].concat());
    }

    #[test]
    fn i2osp_out_of_range() {
        assert!(i2osp(256, 1).is_err());
        assert!(i2osp(65536, 2).is_err());
    }

    #[test]
    fn os2ip_inverts_i2osp() {
        for value in [0usize, 1, 255, 256, 65535, 65536] {
            assert_eq!(os2ip(&i2osp(value, 4).unwrap()).unwrap(), value);
        }
    }

    #[test]
    fn vector_round_trip() {
        let input = b"some vector contents";
        let encoded = encode_vector(input).unwrap();
        assert_eq!(encoded.len(), input.len() + 2);

        let (contents, remainder) = decode_vector(&encoded).unwrap();
        assert_eq!(contents, input);
        assert!(remainder.is_empty());
    }

    #[test]
    fn vector_decode_short_input() {
        assert!(decode_vector(&[]).is_err());
        assert!(decode_vector(&[0]).is_err());
        // declared length exceeds available bytes
        assert!(decode_vector(&[0, 5, 1, 2]).is_err());
    }
}
