//! Unit tests for vulkan_buffer.rs
//!
//! Tests the pure memory-type selection logic without requiring a GPU.
//! The property tables are plain data and can be built by hand.

use crate::vulkan_buffer::find_memory_type;
use crate::error::Error;
use ash::vk;

/// Build a property table from (flags, heap_index) pairs
fn memory_properties(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
    let mut properties = vk::PhysicalDeviceMemoryProperties::default();
    properties.memory_type_count = types.len() as u32;
    for (index, &flags) in types.iter().enumerate() {
        properties.memory_types[index] = vk::MemoryType {
            property_flags: flags,
            heap_index: 0,
        };
    }
    properties
}

// ============================================================================
// SELECTION TESTS
// ============================================================================

#[test]
fn test_find_memory_type_first_match_wins() {
    let properties = memory_properties(&[
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    ]);

    // All types allowed by the requirements mask
    let index = find_memory_type(
        &properties,
        0b111,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    )
    .unwrap();
    assert_eq!(index, 1);
}

#[test]
fn test_find_memory_type_respects_type_bits() {
    let properties = memory_properties(&[
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
    ]);

    // Type 0 matches the flags but is excluded by the requirements mask
    let index = find_memory_type(&properties, 0b10, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap();
    assert_eq!(index, 1);
}

#[test]
fn test_find_memory_type_superset_flags_match() {
    let properties = memory_properties(&[
        vk::MemoryPropertyFlags::HOST_VISIBLE
            | vk::MemoryPropertyFlags::HOST_COHERENT
            | vk::MemoryPropertyFlags::HOST_CACHED,
    ]);

    let index =
        find_memory_type(&properties, 0b1, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap();
    assert_eq!(index, 0);
}

// ============================================================================
// FAILURE TESTS
// ============================================================================

#[test]
fn test_find_memory_type_no_match_is_fatal() {
    let properties = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);

    let result = find_memory_type(&properties, 0b1, vk::MemoryPropertyFlags::HOST_VISIBLE);
    match result {
        Err(Error::NoCompatibleMemoryType { type_bits, flags }) => {
            assert_eq!(type_bits, 0b1);
            assert_eq!(flags, vk::MemoryPropertyFlags::HOST_VISIBLE);
        }
        other => panic!("expected NoCompatibleMemoryType, got {:?}", other),
    }
}

#[test]
fn test_find_memory_type_empty_table() {
    let properties = memory_properties(&[]);

    let result = find_memory_type(&properties, u32::MAX, vk::MemoryPropertyFlags::DEVICE_LOCAL);
    assert!(matches!(result, Err(Error::NoCompatibleMemoryType { .. })));
}
