//! Unit tests for geometry.rs
//!
//! Tests vertex layout descriptions, the quad's index/vertex counts, and
//! the spin transform.

use crate::geometry::{spin_transform, Vertex, QUAD_INDICES, QUAD_VERTICES};
use ash::vk;
use glam::Vec4;

// ============================================================================
// VERTEX LAYOUT TESTS
// ============================================================================

#[test]
fn test_vertex_binding_description() {
    let binding = Vertex::binding_description();
    assert_eq!(binding.binding, 0);
    assert_eq!(binding.stride, 20); // 2 + 3 floats
    assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
}

#[test]
fn test_vertex_attribute_descriptions() {
    let attributes = Vertex::attribute_descriptions();

    assert_eq!(attributes[0].location, 0);
    assert_eq!(attributes[0].format, vk::Format::R32G32_SFLOAT);
    assert_eq!(attributes[0].offset, 0);

    assert_eq!(attributes[1].location, 1);
    assert_eq!(attributes[1].format, vk::Format::R32G32B32_SFLOAT);
    assert_eq!(attributes[1].offset, 8); // after the 2-float position
}

#[test]
fn test_vertex_is_pod() {
    // Safe byte-cast is what the staging upload relies on
    let bytes = bytemuck::cast_slice::<Vertex, u8>(&QUAD_VERTICES);
    assert_eq!(bytes.len(), 4 * 20);
}

// ============================================================================
// QUAD TESTS
// ============================================================================

#[test]
fn test_quad_index_count_independent_of_vertex_count() {
    // 4 vertices, 6 indices forming two triangles sharing a diagonal;
    // the indexed draw is sized by the index list, not the vertex list
    assert_eq!(QUAD_VERTICES.len(), 4);
    assert_eq!(QUAD_INDICES.len(), 6);
}

#[test]
fn test_quad_indices_reference_valid_vertices() {
    for &index in &QUAD_INDICES {
        assert!((index as usize) < QUAD_VERTICES.len());
    }
}

#[test]
fn test_quad_shares_diagonal() {
    let first: Vec<u32> = QUAD_INDICES[..3].to_vec();
    let second: Vec<u32> = QUAD_INDICES[3..].to_vec();
    let shared: Vec<u32> = first.iter().filter(|i| second.contains(i)).copied().collect();
    assert_eq!(shared.len(), 2);
}

// ============================================================================
// TRANSFORM TESTS
// ============================================================================

#[test]
fn test_spin_transform_half_period_mirrors() {
    // Rotation by half a period is a point reflection in the XY plane, so
    // transforming v at t=T/2 matches transforming -v at t=0
    let half_turn = spin_transform(2.0, 800, 600) * Vec4::new(0.5, 0.25, 0.0, 1.0);
    let mirrored = spin_transform(0.0, 800, 600) * Vec4::new(-0.5, -0.25, 0.0, 1.0);
    assert!((half_turn - mirrored).length() < 1e-4);
}

#[test]
fn test_spin_transform_quarter_period_rotates() {
    // After a quarter of the period the quad must have visibly rotated
    let before = spin_transform(0.0, 800, 600) * Vec4::new(0.5, 0.0, 0.0, 1.0);
    let after = spin_transform(1.0, 800, 600) * Vec4::new(0.5, 0.0, 0.0, 1.0);
    assert!((before - after).length() > 1e-3);
}

#[test]
fn test_spin_transform_full_period_wraps() {
    let start = spin_transform(0.0, 800, 600);
    let wrapped = spin_transform(4.0, 800, 600);
    let difference = (start * Vec4::ONE - wrapped * Vec4::ONE).length();
    assert!(difference < 1e-4);
}

#[test]
fn test_spin_transform_handles_zero_height() {
    // Degenerate extent must not produce NaNs (height clamped internally)
    let mvp = spin_transform(1.0, 800, 0);
    assert!(mvp.is_finite());
}

#[test]
fn test_spin_transform_flips_y_for_vulkan() {
    let wide = spin_transform(0.0, 1600, 600);
    let narrow = spin_transform(0.0, 400, 600);
    // Aspect feeds the projection, so X scaling must differ
    assert!((wide.x_axis.x - narrow.x_axis.x).abs() > 1e-6);
    // Y axis flipped relative to a GL-style projection
    assert!(wide.y_axis.y < 0.0);
}
