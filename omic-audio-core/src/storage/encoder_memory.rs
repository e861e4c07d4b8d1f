use std::slice;

use crate::models::error::CodecError;

/// Heap block holding an opaque, engine-initialized encoder state.
///
/// Sized by the codec engine and 8-byte aligned. Freed when dropped, so
/// every allocation is released exactly once.
#[derive(Debug)]
pub struct EncoderMemory {
    words: Vec<u64>,
    len: usize,
}

impl EncoderMemory {
    /// Reserve `size` zeroed bytes.
    ///
    /// Fails for a zero size or when the allocator cannot provide the memory.
    pub fn allocate(size: usize) -> Result<Self, CodecError> {
        if size == 0 {
            return Err(CodecError::AllocationFailure { size });
        }

        let word_count = size.div_ceil(std::mem::size_of::<u64>());
        let mut words = Vec::new();
        words
            .try_reserve_exact(word_count)
            .map_err(|_| CodecError::AllocationFailure { size })?;
        words.resize(word_count, 0);

        Ok(Self { words, len: size })
    }

    /// Size in bytes as requested at allocation.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start of the block, for engines that initialize state in place.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.words.as_mut_ptr().cast()
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `words` owns at least `len` initialized bytes and u8 has no
        // alignment requirement.
        unsafe { slice::from_raw_parts(self.words.as_ptr().cast(), self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above; the exclusive borrow of `self` covers the slice.
        unsafe { slice::from_raw_parts_mut(self.words.as_mut_ptr().cast(), self.len) }
    }
}
