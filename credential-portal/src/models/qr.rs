use bytes::Bytes;

/// Scoped handle over a QR PNG returned by issuance or renewal calls.
///
/// The flow that requested the artifact owns it; storing a new artifact in a
/// flow slot drops the previous one, and leaving the flow drops the slot. At
/// most one live artifact per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrArtifact {
    bytes: Bytes,
    content_type: String,
}

impl QrArtifact {
    pub fn new(bytes: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
