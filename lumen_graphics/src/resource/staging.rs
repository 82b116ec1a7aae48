/// Shared scratch memory for buffer map/write/unmap sequences
///
/// One block is reserved up front and lent out for every write that fits
/// in it. Larger writes get a one-off allocation whose failure surfaces as
/// `Error::OutOfMemory` instead of aborting. A map/write/unmap sequence is
/// always completed before the next one starts, so the block is never lent
/// twice at the same time (the borrow checker enforces this through `&mut`).

use std::ops::{Deref, DerefMut};
use crate::error::{Error, Result};

pub struct StagingMemory {
    block: Vec<u8>,
}

/// Scratch region handed out by `StagingMemory::scratch`
pub enum Scratch<'a> {
    Shared(&'a mut [u8]),
    Owned(Vec<u8>),
}

impl StagingMemory {
    /// Reserve the shared block
    pub fn new(block_size: usize) -> Result<Self> {
        Ok(Self { block: try_alloc_zeroed(block_size)? })
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    /// Zeroed scratch memory of exactly `len` bytes
    pub fn scratch(&mut self, len: usize) -> Result<Scratch<'_>> {
        if len <= self.block.len() {
            let region = &mut self.block[..len];
            region.fill(0);
            Ok(Scratch::Shared(region))
        } else {
            Ok(Scratch::Owned(try_alloc_zeroed(len)?))
        }
    }
}

impl Scratch<'_> {
    pub fn is_shared(&self) -> bool {
        matches!(self, Scratch::Shared(_))
    }
}

impl Deref for Scratch<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Scratch::Shared(region) => region,
            Scratch::Owned(bytes) => bytes,
        }
    }
}

impl DerefMut for Scratch<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Scratch::Shared(region) => region,
            Scratch::Owned(bytes) => bytes,
        }
    }
}

/// Fallible zeroed allocation
pub fn try_alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    bytes.resize(len, 0);
    Ok(bytes)
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
