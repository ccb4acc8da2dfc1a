//! Identity tokens for cached resources.

use std::sync::atomic::{AtomicU64, Ordering};

/// Kinds of resource that carry their own token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    VertexBuffer,
    Shader,
}

impl ResourceKind {
    const fn index(self) -> usize {
        match self {
            ResourceKind::Texture => 0,
            ResourceKind::VertexBuffer => 1,
            ResourceKind::Shader => 2,
        }
    }
}

// Token 0 is reserved for "nothing bound".
static NEXT_IDS: [AtomicU64; 3] = [AtomicU64::new(1), AtomicU64::new(1), AtomicU64::new(1)];

/// Identity token of one resource instance.
///
/// Tokens are handed out from a process-wide counter per [`ResourceKind`] and
/// are never reused, even after the resource is dropped. Two resources alive at
/// overlapping times therefore never share a token, whatever thread created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct CacheId(u64);

impl CacheId {
    /// The token of an unbound slot.
    pub const NULL: Self = Self(0);

    /// Allocate a fresh token. Resource implementations call this once, at creation.
    pub fn allocate(kind: ResourceKind) -> Self {
        Self(NEXT_IDS[kind.index()].fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}
