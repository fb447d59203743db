//! Render pipelines and uniform layouts

use bytemuck::{Pod, Zeroable};
use stillframe_core::{Camera, MeshVertex, SurfaceProperty};
use wgpu::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BufferBindingType, ColorTargetState, ColorWrites, CompareFunction, DepthStencilState, Device,
    FragmentState, MultisampleState, PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology,
    RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor, ShaderSource, ShaderStages,
    TextureFormat, VertexAttribute, VertexBufferLayout, VertexFormat, VertexState,
    VertexStepMode,
};

use crate::shaders;

/// Colour target format; unorm so stored bytes match the requested colours
pub const COLOR_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Camera uniform (group 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub to_eye: [f32; 4],
}

impl CameraUniform {
    pub fn new(camera: &Camera, aspect: f32) -> Self {
        Self {
            view_proj: camera.view_projection(aspect).to_cols_array_2d(),
            to_eye: camera.view_plane_normal().extend(0.0).to_array(),
        }
    }
}

/// Per-actor material uniform (group 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    /// ambient, diffuse, specular, specular power
    pub lighting: [f32; 4],
}

impl From<&SurfaceProperty> for MaterialUniform {
    fn from(p: &SurfaceProperty) -> Self {
        Self {
            color: [p.color[0], p.color[1], p.color[2], 1.0],
            lighting: [p.ambient, p.diffuse, p.specular, p.specular_power],
        }
    }
}

const VERTEX_ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
];

fn vertex_layout() -> VertexBufferLayout<'static> {
    VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

fn uniform_layout(device: &Device, label: &str, visibility: ShaderStages) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Pipelines shared by every capture on a device
pub struct MeshPipelines {
    pub camera_layout: BindGroupLayout,
    pub material_layout: BindGroupLayout,
    /// Shaded triangle lists
    pub triangles: RenderPipeline,
    /// Unlit line lists for wireframes
    pub lines: RenderPipeline,
}

impl MeshPipelines {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Stillframe Mesh Shader"),
            source: ShaderSource::Wgsl(shaders::MESH.into()),
        });

        let camera_layout = uniform_layout(
            device,
            "Camera Layout",
            ShaderStages::VERTEX | ShaderStages::FRAGMENT,
        );
        let material_layout = uniform_layout(device, "Material Layout", ShaderStages::FRAGMENT);

        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Stillframe Mesh Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let build = |label: &str, topology: PrimitiveTopology, fragment: &str| {
            device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                fragment: Some(FragmentState {
                    module: &shader,
                    entry_point: fragment,
                    compilation_options: Default::default(),
                    targets: &[Some(ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: None,
                        write_mask: ColorWrites::ALL,
                    })],
                }),
                primitive: PrimitiveState {
                    topology,
                    // Two-sided lighting, nothing is culled
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: CompareFunction::LessEqual,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: MultisampleState::default(),
                multiview: None,
            })
        };

        let triangles = build(
            "Stillframe Triangle Pipeline",
            PrimitiveTopology::TriangleList,
            "fs_lit",
        );
        let lines = build(
            "Stillframe Line Pipeline",
            PrimitiveTopology::LineList,
            "fs_flat",
        );

        Self {
            camera_layout,
            material_layout,
            triangles,
            lines,
        }
    }
}

impl std::fmt::Debug for MeshPipelines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshPipelines").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes() {
        // WGSL uniform layout: mat4x4 + vec4, vec4 + vec4
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }

    #[test]
    fn test_material_from_property() {
        let property = SurfaceProperty {
            color: [0.1, 0.2, 0.3],
            ambient: 0.4,
            ..Default::default()
        };
        let material = MaterialUniform::from(&property);
        assert_eq!(material.color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(material.lighting, [0.4, 1.0, 0.0, 1.0]);
    }
}
