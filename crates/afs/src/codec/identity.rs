//! Identity codec — no transformation.

use super::traits::{BlobCodec, CodecError};

/// Pass-through codec. The default when `encryption_scope` is unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl BlobCodec for IdentityCodec {
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &str {
        "identity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_arbitrary_bytes() {
        let codec = IdentityCodec;
        let data = vec![0xFF, 0x00, 0xAB, 0xCD];
        let encoded = codec.encode(&data);
        assert_eq!(data, encoded);
        assert_eq!(data, codec.decode(&encoded).unwrap());
    }

    #[test]
    fn empty_input_stays_empty() {
        let codec = IdentityCodec;
        assert!(codec.decode(&codec.encode(&[])).unwrap().is_empty());
    }
}
