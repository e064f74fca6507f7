use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A weighted sphere, laid out as the `Primitive` struct of the meshing shader
#[repr(C, align(16))]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3], // rgb + 1 padding for memory alignment
    pub _padding: f32,
}
unsafe impl Zeroable for Primitive {}
unsafe impl Pod for Primitive {}

impl Primitive {
    pub fn new(center: Vec3, radius: f32, color: Vec3) -> Self {
        Primitive {
            center: center.to_array(),
            radius,
            color: color.to_array(),
            _padding: 0.,
        }
    }

    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.center)
    }

    pub fn color(&self) -> Vec3 {
        Vec3::from_array(self.color)
    }
}

/// One output vertex, 48 bytes so it matches both the shader's `array<Vertex>` stride and
/// the vertex buffer layout used for drawing
#[repr(C, align(16))]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub _padding_0: f32,
    pub normal: [f32; 3],
    pub _padding_1: f32,
    pub color: [f32; 3],
    pub _padding_2: f32,
}
unsafe impl Zeroable for MeshVertex {}
unsafe impl Pod for MeshVertex {}

impl MeshVertex {
    pub const POSITION_OFFSET: u64 = 0;
    pub const NORMAL_OFFSET: u64 = 16;
    pub const COLOR_OFFSET: u64 = 32;

    pub fn new(position: Vec3, normal: Vec3, color: Vec3) -> Self {
        MeshVertex {
            position: position.to_array(),
            normal: normal.to_array(),
            color: color.to_array(),
            ..Default::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn color(&self) -> Vec3 {
        Vec3::from_array(self.color)
    }
}

/// Per-frame uniforms of the meshing shader
pub use crate::meshing::gpu::shader::types::Params as MeshParams;

#[cfg(test)]
mod tests {
    use super::*;
    use encase::ShaderSize;
    use std::mem::size_of;

    #[test]
    fn gpu_layouts_match_wgsl() {
        assert_eq!(size_of::<Primitive>(), 32);
        assert_eq!(size_of::<MeshVertex>(), 48);
        // vec3<u32>, vec3<f32>, vec3<f32> + f32, u32, f32 rounded up to 16
        assert_eq!(MeshParams::SHADER_SIZE.get(), 64);
    }

    #[test]
    fn primitive_bytes_follow_wgsl_field_order() {
        let primitive = Primitive::new(Vec3::new(1., 2., 3.), 0.5, Vec3::new(0.25, 0.5, 1.));
        let bytes = bytemuck::bytes_of(&primitive);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats, &[1., 2., 3., 0.5, 0.25, 0.5, 1., 0.]);
    }
}
