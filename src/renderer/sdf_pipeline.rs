//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in a fragment shader using signed distance fields.
//! The CPU side only packs the presented frame into uniform and storage
//! buffers.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::settings::Settings;
use crate::sim::{Arena, FrameView, GamePhase, Player, Projectile, Target, TargetKind};

/// Maximum number of targets drawn
pub const MAX_TARGETS: usize = 64;
/// Maximum number of projectiles drawn
pub const MAX_PROJECTILES: usize = 128;

/// Seconds the hit flash takes to fade after game over
const HIT_FLASH_SECS: f32 = 0.6;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],  // offset 0
    arena: [f32; 2],       // offset 8
    time: f32,             // offset 16
    target_count: u32,     // offset 20
    projectile_count: u32, // offset 24
    game_over: u32,        // offset 28
    hit_flash: f32,        // offset 32
    star_layers: u32,      // offset 36
    detail: u32,           // offset 40
    level: u32,            // offset 44
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct PlayerUniform {
    pos: [f32; 2],
    angle: f32,
    radius: f32,
    thrusting: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct TargetData {
    pos: [f32; 2],
    radius: f32,
    kind: u32, // 0 = asteroid, 1 = saucer
    scale: f32,
    seed: u32,
    heading: f32,
    _pad: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ProjectileData {
    pos: [f32; 2],
    radius: f32,
    _pad: u32,
}

impl From<&Player> for PlayerUniform {
    fn from(player: &Player) -> Self {
        Self {
            pos: player.body.pos.to_array(),
            angle: player.angle,
            radius: player.body.radius,
            thrusting: 0,
            _pad: [0; 3],
        }
    }
}

impl From<&Target> for TargetData {
    fn from(target: &Target) -> Self {
        Self {
            pos: target.body.pos.to_array(),
            radius: target.body.radius,
            kind: match target.kind {
                TargetKind::Asteroid => 0,
                TargetKind::Saucer => 1,
            },
            scale: target.scale,
            seed: target.id,
            heading: target.body.vel.y.atan2(target.body.vel.x),
            _pad: 0,
        }
    }
}

impl From<&Projectile> for ProjectileData {
    fn from(shot: &Projectile) -> Self {
        Self {
            pos: shot.body.pos.to_array(),
            radius: shot.body.radius,
            _pad: 0,
        }
    }
}

/// Fill a fixed-size GPU array; returns the element count actually used
fn pack<'a, S, D: Pod + From<&'a S>>(items: &'a [S], out: &mut [D]) -> u32 {
    let mut count = 0;
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = D::from(item);
        count += 1;
    }
    count
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    player_buffer: wgpu::Buffer,
    targets_buffer: wgpu::Buffer,
    projectiles_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    arena: Arena,
    start_time: f64,
    /// Page time (ms) of the first game-over frame
    game_over_at: Option<f64>,

    // Scratch copies reused every frame
    targets_data: Vec<TargetData>,
    projectiles_data: Vec<ProjectileData>,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        arena: Arena,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        // Two read-only storage buffers in the fragment stage
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8Unorm);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                arena: [arena.width, arena.height],
                ..Globals::zeroed()
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let player_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("player"),
            contents: bytemuck::bytes_of(&PlayerUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let targets_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("targets"),
            size: (std::mem::size_of::<TargetData>() * MAX_TARGETS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let projectiles_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("projectiles"),
            size: (std::mem::size_of::<ProjectileData>() * MAX_PROJECTILES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                storage_entry(2),
                storage_entry(3),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: player_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: targets_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: projectiles_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // Fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            player_buffer,
            targets_buffer,
            projectiles_buffer,
            bind_group,
            size: (width, height),
            arena,
            start_time: 0.0,
            game_over_at: None,
            targets_data: vec![TargetData::zeroed(); MAX_TARGETS],
            projectiles_data: vec![ProjectileData::zeroed(); MAX_PROJECTILES],
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Hit flash intensity for the current frame (1 at impact, fading to 0)
    fn hit_flash(&mut self, phase: GamePhase, settings: &Settings, time: f64) -> f32 {
        match phase {
            GamePhase::Running => {
                self.game_over_at = None;
                0.0
            }
            GamePhase::GameOver => {
                let since = *self.game_over_at.get_or_insert(time);
                if !settings.effective_hit_flash() {
                    return 0.0;
                }
                let secs = ((time - since) / 1000.0) as f32;
                (1.0 - secs / HIT_FLASH_SECS).clamp(0.0, 1.0)
            }
        }
    }

    /// Update GPU buffers from the presented frame and render
    pub fn render(
        &mut self,
        frame: &FrameView<'_>,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // rAF time is ms since page load
        let elapsed = ((time - self.start_time) / 1000.0) as f32;
        let hit_flash = self.hit_flash(frame.phase, settings, time);

        let target_count = pack(frame.targets, &mut self.targets_data);
        let projectile_count = pack(frame.projectiles, &mut self.projectiles_data);

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            arena: [self.arena.width, self.arena.height],
            time: elapsed,
            target_count,
            projectile_count,
            game_over: (frame.phase == GamePhase::GameOver) as u32,
            hit_flash,
            star_layers: settings.quality.star_layers(),
            detail: settings.quality.detailed_targets() as u32,
            level: frame.level,
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let mut player = PlayerUniform::from(frame.player);
        player.thrusting = frame.thrusting as u32;
        self.queue
            .write_buffer(&self.player_buffer, 0, bytemuck::bytes_of(&player));

        self.queue.write_buffer(
            &self.targets_buffer,
            0,
            bytemuck::cast_slice(&self.targets_data),
        );
        self.queue.write_buffer(
            &self.projectiles_buffer,
            0,
            bytemuck::cast_slice(&self.projectiles_data),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
