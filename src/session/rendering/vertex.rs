//! Vertex data handed to the rendering backend.

/// A vertex of a chunk mesh.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes), world space
/// - Normal: [f32; 3] (12 bytes), outward unit normal of the face
/// - Color: [f32; 3] (12 bytes), linear RGB
///
/// Total size: 36 bytes. The struct is `Pod`, so a vertex buffer can be uploaded with
/// `bytemuck::cast_slice`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Outward normal of the face.
    pub normal: [f32; 3],
    /// Linear RGB color.
    pub color: [f32; 3],
}

impl Vertex {
    /// Creates a vertex.
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Vertex {
            position,
            normal,
            color,
        }
    }
}
