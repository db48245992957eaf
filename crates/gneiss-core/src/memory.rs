use serde::{Deserialize, Serialize};
use std::mem;
use std::ops::{Deref, DerefMut};

/// Which memory space backs a buffer.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MemoryType {
    Host,
    Device,
    #[default]
    Unified,
}

/// A growable array that remembers the [`MemoryType`] it was allocated in.
///
/// Dereferences to a slice for element access. Clearing keeps the allocation so buffers can be refilled every frame without
/// touching the allocator.
#[derive(Clone, Debug, PartialEq)]
pub struct UnifiedVec<T> {
    values: Vec<T>,
    memory_type: MemoryType,
}

impl<T> UnifiedVec<T> {
    pub fn new(memory_type: MemoryType) -> Self {
        Self {
            values: Vec::new(),
            memory_type,
        }
    }

    pub fn with_capacity(capacity: usize, memory_type: MemoryType) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            memory_type,
        }
    }

    pub fn from_vec(values: Vec<T>, memory_type: MemoryType) -> Self {
        Self {
            values,
            memory_type,
        }
    }

    #[inline]
    pub fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Drops all values but keeps the backing allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.values.clear();
    }

    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    /// Direct access to the backing storage for algorithms that need to change the length (sort, dedup, etc).
    #[inline]
    pub fn as_mut_vec(&mut self) -> &mut Vec<T> {
        &mut self.values
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }

    /// The footprint of the live elements.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.values.len() * mem::size_of::<T>()
    }
}

impl<T: Clone> UnifiedVec<T> {
    pub fn resize(&mut self, len: usize, value: T) {
        self.values.resize(len, value);
    }

    pub fn extend_from_slice(&mut self, other: &[T]) {
        self.values.extend_from_slice(other);
    }

    /// Deep copy of `other`'s elements. `self` keeps its own [`MemoryType`].
    pub fn copy_from(&mut self, other: &Self) {
        self.values.clone_from(&other.values);
    }
}

impl<T> Deref for UnifiedVec<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<T> DerefMut for UnifiedVec<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.values
    }
}

impl<T> Default for UnifiedVec<T> {
    fn default() -> Self {
        Self::new(MemoryType::default())
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clear_keeps_capacity() {
        let mut v = UnifiedVec::with_capacity(64, MemoryType::Device);
        v.extend_from_slice(&[1u32; 40]);
        v.clear();
        assert!(v.is_empty());
        assert!(v.capacity() >= 64);
    }

    #[test]
    fn copy_keeps_destination_memory_type() {
        let src = UnifiedVec::from_vec(vec![1u16, 2, 3], MemoryType::Host);
        let mut dst = UnifiedVec::new(MemoryType::Device);
        dst.copy_from(&src);
        assert_eq!(&*dst, &[1, 2, 3]);
        assert_eq!(dst.memory_type(), MemoryType::Device);
    }

    #[test]
    fn size_in_bytes_counts_live_elements() {
        let mut v = UnifiedVec::with_capacity(100, MemoryType::Unified);
        v.resize(10, 0u64);
        assert_eq!(v.size_in_bytes(), 80);
    }
}
