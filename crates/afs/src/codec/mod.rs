//! Blob codec seam (spec §4, `encryptionScope`).
//!
//! Every byte written through [`crate::fragmented::FragmentedFileSystem`]
//! passes through a [`BlobCodec`] before it reaches a connector, and back
//! through it on read. Only [`IdentityCodec`] ships today; `encryptionScope`
//! is carried on [`crate::ConnectorConfig`] as the hook point for a future
//! `AesGcmCodec`, not implemented here (see `DESIGN.md`).

mod identity;
mod traits;

pub use identity::IdentityCodec;
pub use traits::{BlobCodec, CodecError};

/// Resolve a codec by id. Unknown ids are an error rather than a silent
/// fallback to identity, so a misconfigured `encryptionScope` is caught at
/// startup instead of silently storing plaintext.
pub fn get_codec(codec_id: &str) -> Result<Box<dyn BlobCodec>, CodecError> {
    match codec_id {
        "identity" => Ok(Box::new(IdentityCodec)),
        other => Err(CodecError::UnknownCodec(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_identity() {
        assert_eq!(get_codec("identity").unwrap().codec_id(), "identity");
    }

    #[test]
    fn unknown_codec_is_an_error() {
        assert!(matches!(get_codec("aes-gcm-256"), Err(CodecError::UnknownCodec(_))));
    }
}
