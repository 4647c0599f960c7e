use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ARTIFACT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one generated or user-supplied still image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactId(pub u64);

impl ArtifactId {
    fn next() -> Self {
        Self(NEXT_ARTIFACT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared reference to encoded image bytes.
///
/// Cloning a handle never copies the bytes. Equality is identity: two uploads of the same file
/// are distinct versions.
#[derive(Clone)]
pub struct ImageHandle {
    id: ArtifactId,
    bytes: Arc<[u8]>,
}

impl ImageHandle {
    /// Wrap encoded image bytes (PNG, JPEG, ...) under a fresh identity.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: ArtifactId::next(),
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageHandle {}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id.0)
            .field("len", &self.bytes.len())
            .finish()
    }
}
