/// Unit tests for the Buffer resource

use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::DataUsage;

fn desc(size: usize) -> BufferDesc {
    BufferDesc {
        size,
        usage: BufferUsageFlags::SHADER_STORAGE,
        data_usage: DataUsage::Dynamic,
        debug_name: None,
    }
}

#[test]
fn test_initial_data_is_padded() {
    let buffer = Buffer::new(desc(6), Some(&[1, 2, 3]));
    assert_eq!(buffer.data(), &[1, 2, 3, 0, 0, 0]);
    assert!(!buffer.is_loaded());
}

#[test]
fn test_load_uploads_shadow_copy() {
    let mut device = MockGraphicsDevice::new();
    let mut buffer = Buffer::new(desc(4), Some(&[7, 7, 7, 7]));
    buffer.load(&mut device).unwrap();

    let handle = buffer.handle().unwrap();
    assert_eq!(device.buffer_contents(handle).unwrap(), &[7, 7, 7, 7]);

    // second load keeps the same object
    buffer.load(&mut device).unwrap();
    assert_eq!(buffer.handle(), Some(handle));
}

#[test]
fn test_map_write_updates_device_and_shadow() {
    let mut device = MockGraphicsDevice::new();
    let mut staging = StagingMemory::new(2).unwrap();
    let mut buffer = Buffer::new(desc(8), None);
    buffer.load(&mut device).unwrap();

    // larger than the staging block
    buffer
        .map_write(&mut device, &mut staging, 4, 4, |bytes| bytes.copy_from_slice(&[1, 2, 3, 4]))
        .unwrap();

    assert_eq!(&buffer.data()[4..], &[1, 2, 3, 4]);
    assert_eq!(device.buffer_contents(buffer.handle().unwrap()).unwrap()[4..], [1, 2, 3, 4]);
}

#[test]
fn test_map_write_out_of_range() {
    let mut device = MockGraphicsDevice::new();
    let mut staging = StagingMemory::new(16).unwrap();
    let mut buffer = Buffer::new(desc(8), None);

    let result = buffer.map_write(&mut device, &mut staging, 6, 4, |_| {});
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
}

#[test]
fn test_contents_survive_reload() {
    let mut device = MockGraphicsDevice::new();
    let mut staging = StagingMemory::new(16).unwrap();
    let mut buffer = Buffer::new(desc(2), None);
    buffer.load(&mut device).unwrap();
    buffer.map_write(&mut device, &mut staging, 0, 2, |b| b.copy_from_slice(&[5, 6])).unwrap();

    buffer.unload(&mut device);
    assert_eq!(device.live_buffers(), 0);
    buffer.load(&mut device).unwrap();
    assert_eq!(device.buffer_contents(buffer.handle().unwrap()).unwrap(), &[5, 6]);
}
