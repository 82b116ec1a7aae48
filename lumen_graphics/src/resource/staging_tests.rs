/// Unit tests for StagingMemory

use super::*;

#[test]
fn test_small_writes_use_shared_block() {
    let mut staging = StagingMemory::new(16).unwrap();
    let mut scratch = staging.scratch(8).unwrap();
    assert!(scratch.is_shared());
    assert_eq!(scratch.len(), 8);
    scratch[0] = 9;
}

#[test]
fn test_shared_block_is_zeroed_between_uses() {
    let mut staging = StagingMemory::new(16).unwrap();
    staging.scratch(4).unwrap().copy_from_slice(&[1, 2, 3, 4]);

    let scratch = staging.scratch(4).unwrap();
    assert_eq!(&scratch[..], &[0, 0, 0, 0]);
}

#[test]
fn test_large_writes_allocate() {
    let mut staging = StagingMemory::new(16).unwrap();
    let scratch = staging.scratch(17).unwrap();
    assert!(!scratch.is_shared());
    assert_eq!(scratch.len(), 17);
}

#[test]
fn test_impossible_allocation_is_out_of_memory() {
    assert_eq!(try_alloc_zeroed(usize::MAX).err(), Some(Error::OutOfMemory));
}
