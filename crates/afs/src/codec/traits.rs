//! Blob codec trait definitions (spec §4 `encryptionScope`).

/// A transformation applied to blob bytes before they reach a connector and
/// reversed after they are read back.
///
/// This is the seam `ConnectorConfig::encryption_scope` hooks into: every
/// byte written through a [`crate::fragmented::FragmentedFileSystem`] passes
/// through a codec first. `Send + Sync` so one codec instance can be shared
/// across threads.
pub trait BlobCodec: Send + Sync {
    /// Transform bytes for storage.
    fn encode(&self, data: &[u8]) -> Vec<u8>;

    /// Reverse [`encode`](Self::encode). Returns an error if `data` cannot
    /// be decoded (corruption, wrong key, wrong codec).
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Identifier for this codec, recorded so a store can detect it was
    /// reopened with a different codec than it was written with.
    fn codec_id(&self) -> &str;
}

/// Errors raised by a [`BlobCodec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The codec could not reverse the transformation.
    #[error("decode error: {0}")]
    DecodeError(String),
    /// `get_codec` was asked for a codec id it doesn't know.
    #[error("unknown codec: {0}")]
    UnknownCodec(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _accepts_box_dyn_codec(_codec: Box<dyn BlobCodec>) {}
}
