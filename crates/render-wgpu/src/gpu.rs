use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use materia_assets::{EnvironmentMap, TextureHandle, TextureLibrary};
use materia_render::Viewport;
use materia_scene::{Geometry, PerspectiveCamera, Scene, Side};
use wgpu::util::DeviceExt;

use crate::shaders;
use crate::target::{Blitter, COLOR_FORMAT, DEPTH_FORMAT, OffscreenTarget};
use crate::textures::{GpuEnvironment, TextureCache};
use crate::uniforms::{
    EnvironmentInfo, FrameUniforms, MaterialUniforms, ObjectUniforms, Vertex, interleave,
};

/// Mesh pipelines differ only in face culling and blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub side: Side,
    pub transparent: bool,
}

impl PipelineKey {
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self.side {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }

    pub fn blend(self) -> wgpu::BlendState {
        if self.transparent {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        }
    }

    pub fn depth_write(self) -> bool {
        !self.transparent
    }
}

struct GpuGeometry {
    source: Rc<Geometry>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct ObjectSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// State that decides when the material bind group must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MaterialBinding {
    slots: [Option<TextureHandle>; 7],
    present: [bool; 7],
}

/// wgpu scene renderer: equirectangular background plus image-lit PBR
/// meshes, drawn offscreen at the capped pixel ratio and blitted to the
/// output view.
pub struct PbrRenderer {
    surface_format: wgpu::TextureFormat,

    frame_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,
    pbr_layout: wgpu::PipelineLayout,
    pbr_shader: wgpu::ShaderModule,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    background_pipeline: wgpu::RenderPipeline,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    env_sampler: wgpu::Sampler,
    empty_environment: Rc<GpuEnvironment>,
    environment: Rc<GpuEnvironment>,
    background: Rc<GpuEnvironment>,

    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
    material_binding: Option<MaterialBinding>,
    map_sampler: wgpu::Sampler,
    textures: TextureCache,

    geometries: Vec<GpuGeometry>,
    objects: Vec<ObjectSlot>,

    target: OffscreenTarget,
    blitter: Blitter,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

impl PbrRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        viewport: &Viewport,
    ) -> Self {
        let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let fragment = wgpu::ShaderStages::FRAGMENT;

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                uniform_entry(0, both),
                texture_entry(1, fragment),
                sampler_entry(2, fragment),
                texture_entry(3, fragment),
            ],
        });

        let mut material_entries = vec![uniform_entry(0, both)];
        material_entries.extend((1..=7).map(|b| texture_entry(b, both)));
        material_entries.push(sampler_entry(8, both));
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &material_entries,
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_entry(0, both)],
        });

        let pbr_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pbr_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let pbr_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pbr_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::pbr_shader().into()),
        });

        let background_pipeline = Self::create_background_pipeline(device, &frame_layout);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let env_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let empty_environment = Rc::new(GpuEnvironment::empty(device, queue));
        let frame_bind_group = Self::create_frame_bind_group(
            device,
            &frame_layout,
            &frame_buffer,
            &env_sampler,
            &empty_environment,
            &empty_environment,
        );

        let material_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("material_uniform_buffer"),
            size: std::mem::size_of::<MaterialUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let map_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_map_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let textures = TextureCache::new(device, queue);
        let material_bind_group = Self::create_material_bind_group(
            device,
            &material_layout,
            &material_buffer,
            &map_sampler,
            &textures,
            [None; 7],
        );

        let target = OffscreenTarget::new(device, viewport);
        let blitter = Blitter::new(device, surface_format, &target.color);

        Self {
            surface_format,
            frame_layout,
            material_layout,
            object_layout,
            pbr_layout,
            pbr_shader,
            pipelines: HashMap::new(),
            background_pipeline,
            frame_buffer,
            frame_bind_group,
            env_sampler,
            environment: empty_environment.clone(),
            background: empty_environment.clone(),
            empty_environment,
            material_buffer,
            material_bind_group,
            material_binding: None,
            map_sampler,
            textures,
            geometries: Vec::new(),
            objects: Vec::new(),
            target,
            blitter,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Physical size of the offscreen drawing buffer.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    /// Recreate the offscreen target if the viewport's drawing-buffer size
    /// changed. Returns whether it did.
    pub fn resize(&mut self, device: &wgpu::Device, viewport: &Viewport) -> bool {
        if self.target.matches(viewport) {
            return false;
        }
        self.target = OffscreenTarget::new(device, viewport);
        self.blitter.rebind(device, &self.target.color);
        tracing::debug!(
            width = self.target.width,
            height = self.target.height,
            "offscreen target resized"
        );
        true
    }

    /// Render one frame of `scene` into `output`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
        library: &TextureLibrary,
    ) {
        self.sync_environment(device, queue, scene);
        let material = scene.material().snapshot();
        self.sync_material(device, queue, library, &material);
        let key = PipelineKey {
            side: material.side,
            transparent: material.transparent,
        };
        self.ensure_pipeline(device, key);
        self.sync_meshes(device, queue, scene);

        let env_info = EnvironmentInfo {
            has_environment: scene.environment().is_some(),
            mip_count: self.environment.mip_count(),
            has_background: scene.background().is_some(),
        };
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(camera, env_info)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            if env_info.has_background {
                pass.set_pipeline(&self.background_pipeline);
                pass.draw(0..3, 0..1);
            }

            if let Some(pipeline) = self.pipelines.get(&key) {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &self.material_bind_group, &[]);
                for (mesh, object) in scene.meshes().iter().zip(&self.objects) {
                    let Some(gpu) = self
                        .geometries
                        .iter()
                        .find(|g| Rc::ptr_eq(&g.source, &mesh.geometry))
                    else {
                        continue;
                    };
                    pass.set_bind_group(2, &object.bind_group, &[]);
                    pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                    pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..gpu.index_count, 0, 0..1);
                }
            }
        }

        self.blitter.draw(&mut encoder, output);
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn sync_environment(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        let env = scene.environment();
        let bg = scene.background();
        if self.environment.is_for(env) && self.background.is_for(bg) {
            return;
        }

        let existing = [&self.environment, &self.background, &self.empty_environment];
        let reuse = |want: Option<&Arc<EnvironmentMap>>| {
            existing.iter().find(|e| e.is_for(want)).map(|e| Rc::clone(e))
        };
        let environment = reuse(env).unwrap_or_else(|| match env {
            Some(e) => Rc::new(GpuEnvironment::upload(device, queue, e)),
            None => self.empty_environment.clone(),
        });
        let background = if environment.is_for(bg) {
            environment.clone()
        } else {
            reuse(bg).unwrap_or_else(|| match bg {
                Some(e) => Rc::new(GpuEnvironment::upload(device, queue, e)),
                None => self.empty_environment.clone(),
            })
        };

        self.frame_bind_group = Self::create_frame_bind_group(
            device,
            &self.frame_layout,
            &self.frame_buffer,
            &self.env_sampler,
            &environment,
            &background,
        );
        self.environment = environment;
        self.background = background;
        tracing::info!(
            environment = env.is_some(),
            background = bg.is_some(),
            "environment bindings updated"
        );
    }

    fn sync_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        library: &TextureLibrary,
        material: &materia_scene::Material,
    ) {
        self.textures.sync(device, queue, library);
        let slots = material.maps.slots();
        let binding = MaterialBinding {
            slots,
            present: slots.map(|s| self.textures.is_uploaded(s)),
        };
        if self.material_binding != Some(binding) {
            self.material_bind_group = Self::create_material_bind_group(
                device,
                &self.material_layout,
                &self.material_buffer,
                &self.map_sampler,
                &self.textures,
                slots,
            );
            self.material_binding = Some(binding);
            tracing::debug!("material bind group rebuilt");
        }
        queue.write_buffer(
            &self.material_buffer,
            0,
            bytemuck::bytes_of(&MaterialUniforms::new(material, binding.present)),
        );
    }

    fn sync_meshes(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        for mesh in scene.meshes() {
            if self
                .geometries
                .iter()
                .any(|g| Rc::ptr_eq(&g.source, &mesh.geometry))
            {
                continue;
            }
            let vertices = interleave(&mesh.geometry);
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}_vertex_buffer", mesh.name)),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}_index_buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            self.geometries.push(GpuGeometry {
                source: mesh.geometry.clone(),
                vertex_buffer,
                index_buffer,
                index_count: mesh.geometry.index_count() as u32,
            });
        }

        while self.objects.len() < scene.meshes().len() {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("object_uniform_buffer"),
                size: std::mem::size_of::<ObjectUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("object_bind_group"),
                layout: &self.object_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.objects.push(ObjectSlot { buffer, bind_group });
        }

        for (mesh, object) in scene.meshes().iter().zip(&self.objects) {
            queue.write_buffer(
                &object.buffer,
                0,
                bytemuck::bytes_of(&ObjectUniforms::new(mesh.transform.matrix())),
            );
        }
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pbr_pipeline"),
            layout: Some(&self.pbr_layout),
            vertex: wgpu::VertexState {
                module: &self.pbr_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.pbr_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(key.blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull_mode(),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_write(),
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        tracing::debug!(?key, "pbr pipeline created");
        self.pipelines.insert(key, pipeline);
    }

    fn create_background_pipeline(
        device: &wgpu::Device,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("background_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::background_shader().into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("background_pipeline_layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("background_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_background"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_background"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_frame_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        environment: &GpuEnvironment,
        background: &GpuEnvironment,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&background.view),
                },
            ],
        })
    }

    fn create_material_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        textures: &TextureCache,
        slots: [Option<TextureHandle>; 7],
    ) -> wgpu::BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }];
        entries.extend(slots.iter().enumerate().map(|(i, slot)| wgpu::BindGroupEntry {
            binding: i as u32 + 1,
            resource: wgpu::BindingResource::TextureView(textures.view(*slot)),
        }));
        entries.push(wgpu::BindGroupEntry {
            binding: 8,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout,
            entries: &entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_side_culls_back_faces() {
        let key = PipelineKey {
            side: Side::Front,
            transparent: false,
        };
        assert_eq!(key.cull_mode(), Some(wgpu::Face::Back));
        assert!(key.depth_write());
        assert_eq!(key.blend(), wgpu::BlendState::REPLACE);
    }

    #[test]
    fn double_side_culls_nothing() {
        let key = PipelineKey {
            side: Side::Double,
            transparent: false,
        };
        assert_eq!(key.cull_mode(), None);
        let back = PipelineKey {
            side: Side::Back,
            transparent: false,
        };
        assert_eq!(back.cull_mode(), Some(wgpu::Face::Front));
    }

    #[test]
    fn transparent_blends_without_depth_writes() {
        let key = PipelineKey {
            side: Side::Front,
            transparent: true,
        };
        assert!(!key.depth_write());
        assert_eq!(key.blend(), wgpu::BlendState::ALPHA_BLENDING);
    }
}
