use std::{fmt, fs::File, io, ops::Range, sync::Arc};

use bytemuck::Pod;
use memmap2::Mmap;

#[derive(Clone)]
enum Backing {
    Mapped(Arc<Mmap>),
    /// Word-backed so every view starts on an 8-byte boundary, matching what
    /// the widest plain element (`f64`) needs for zero-copy casts.
    Heap { words: Arc<[u64]>, len: usize },
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => &mmap[..],
            Backing::Heap { words, len } => &bytemuck::cast_slice::<u64, u8>(words)[..*len],
        }
    }
}

/// Shared, immutable byte store behind every tensor.
///
/// Cloning or slicing never copies: each view holds a reference-counted handle
/// to the same mapping (or heap block) plus its own byte range, so the store
/// lives as long as the last tensor that points into it.
#[derive(Clone)]
pub struct TensorBuffer {
    backing: Backing,
    range: Range<usize>,
}

impl TensorBuffer {
    /// Memory-map `file` read-only.
    pub fn map_file(file: &File) -> io::Result<Self> {
        // SAFETY: the mapping is read-only and never handed out mutably. Callers
        // must not truncate the file while tensors derived from it are alive.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self::from_mmap(mmap))
    }

    pub fn from_mmap(mmap: Mmap) -> Self {
        let len = mmap.len();
        Self {
            backing: Backing::Mapped(Arc::new(mmap)),
            range: 0..len,
        }
    }

    /// Copy `bytes` into a fresh 8-byte-aligned heap block.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut words = vec![0u64; bytes.len().div_ceil(8)];
        bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);
        Self {
            backing: Backing::Heap {
                words: Arc::from(words),
                len: bytes.len(),
            },
            range: 0..bytes.len(),
        }
    }

    pub fn from_pod<T: Pod>(values: &[T]) -> Self {
        Self::from_bytes(bytemuck::cast_slice(values))
    }

    /// Sub-view of `range`, relative to this view. `None` when out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        if range.start > range.end || range.end > self.len() {
            return None;
        }
        Some(Self {
            backing: self.backing.clone(),
            range: self.range.start + range.start..self.range.start + range.end,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.backing.bytes()[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }

    /// Whether both views point into the same underlying store.
    pub fn shares_storage_with(&self, other: &TensorBuffer) -> bool {
        match (&self.backing, &other.backing) {
            (Backing::Mapped(a), Backing::Mapped(b)) => Arc::ptr_eq(a, b),
            (Backing::Heap { words: a, .. }, Backing::Heap { words: b, .. }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl AsRef<[u8]> for TensorBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for TensorBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorBuffer")
            .field("mapped", &self.is_mapped())
            .field("range", &self.range)
            .finish()
    }
}

#[path = "storage.test.rs"]
mod tests;
