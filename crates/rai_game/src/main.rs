//! Rise of the AI: entry point and winit application handler.
//!
//! winit drives the event loop through `ApplicationHandler`. Everything that
//! moves happens inside `RedrawRequested`:
//!
//!   1. turn this frame's keyboard state into a `PlayerIntent`
//!   2. `Game::update` feeds the accumulator and runs whole fixed steps
//!   3. rebuild the sprite mesh and move the camera onto the player
//!   4. draw the level, composite the egui overlay, present
//!
//! Q, Escape and closing the window all become a quit intent. The game marks
//! itself terminated, the loop exits, and `exiting` drops the engine state.

mod ai;
mod audio;
mod entity;
mod game;
mod level;
mod map;
mod mesh;
#[cfg(test)]
mod replay;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use audio::AudioSystem;
use game::{Game, PlayerIntent};
use level::{build_game, load_level_from_path};
use mesh::{texture_keys, DrawCall, SceneMesh};
use rai_core::input::{InputState, Key};
use rai_devtools::{DebugOverlay, OverlayStats};
use rai_platform::window::PlatformConfig;
use rai_render::{Camera2D, GpuContext, SpritePipeline, SpriteVertex, Texture};

const LEVEL_PATH: &str = "assets/levels/level1.json";

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1922,
    g: 0.549,
    b: 0.9059,
    a: 1.0,
};

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Everything that exists once the window and GPU surface are up.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    input: InputState,
    camera: Camera2D,
    view_width: f32,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,
    game: Game,
    audio: AudioSystem,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,

    // Streamed every frame. Buffers grow to the next power of two and never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
    sprite_count: usize,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let level = load_level_from_path(Path::new(LEVEL_PATH))?;
        let game = build_game(&level)?;

        let mut textures = HashMap::new();
        for key in texture_keys(&game) {
            let texture = Texture::from_path(&gpu.device, &gpu.queue, Path::new(&key))?;
            let bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &texture);
            textures.insert(
                Arc::from(key.as_str()),
                GpuSpriteTexture {
                    texture,
                    bind_group,
                },
            );
        }
        log::info!("Loaded {} textures", textures.len());

        let mut audio = AudioSystem::new();
        if let Some(section) = &level.audio {
            audio.load(section);
        }

        let view_width = level.camera.view_width;
        let mut camera = Camera2D::new(gpu.size.0, gpu.size.1);
        camera.fit_view_width(view_width);
        camera.position = game.camera;

        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            input: InputState::new(),
            camera,
            view_width,
            sprite_pipeline,
            debug_overlay,
            game,
            audio,
            textures,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
            sprite_count: 0,
        };
        state.rebuild_scene_mesh();
        Ok(state)
    }

    fn texture_memory_bytes(&self) -> u64 {
        self.textures.values().map(|t| t.texture.byte_size()).sum()
    }

    fn rebuild_scene_mesh(&mut self) {
        let mesh = SceneMesh::build(&self.game);
        self.ensure_mesh_capacity(mesh.vertices.len(), mesh.indices.len());
        self.sprite_count = mesh.sprite_count();

        if !mesh.vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
        if !mesh.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
        self.draw_calls = mesh.draw_calls;
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let player = &self.game.player.body;
        OverlayStats {
            enemies_killed: self.game.enemies_killed,
            active_enemies: self.game.active_enemies() as u32,
            player_position: player.position.to_array(),
            player_velocity: player.velocity.to_array(),
            contacts: player.contacts.as_array(),
            status_label: self.game.status().label().to_string(),
            paused: self.game.status() == game::GameStatus::Paused,
            draw_calls: self.draw_calls.len() as u32,
            sprite_count: self.sprite_count as u32,
        }
    }

    fn render(&mut self) {
        self.camera.position = self.game.camera;
        let camera_uniform = self.camera.build_uniform();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniform]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.game.time, &stats);

        if overlay_actions.toggle_pause {
            self.game.toggle_pause();
        }
        if overlay_actions.single_step {
            let report = self.game.single_step();
            if report.steps > 0 {
                self.rebuild_scene_mesh();
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut last_bound: Option<&Arc<str>> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.draw_calls {
                let Some(texture) = self.textures.get(&draw.texture_key) else {
                    continue;
                };
                if last_bound != Some(&draw.texture_key) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound = Some(&draw.texture_key);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match rai_platform::window::create_window(event_loop, &self.config) {
            Ok(window) => window,
            Err(err) => {
                log::error!("{err}");
                panic!("{err}");
            }
        };
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        match EngineState::new(window) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {err}");
                panic!("Startup failed: {err}");
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                state.input.request_quit();
                state.window.request_redraw();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    state.camera.fit_view_width(state.view_width);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                if state.input.is_just_pressed(Key::F3) {
                    state.debug_overlay.toggle();
                }

                let intent = PlayerIntent::from_input(&state.input);
                let report = state.game.update(intent);
                state.input.end_frame();

                if state.game.is_terminated() {
                    event_loop.exit();
                    return;
                }
                if report.jumped {
                    state.audio.play_jump();
                }

                state.rebuild_scene_mesh();
                state.render();
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            log::info!(
                "Shutting down: {} enemies defeated in {} steps, {:.1} MB of textures released",
                state.game.enemies_killed,
                state.game.time.fixed_step_count,
                state.texture_memory_bytes() as f64 / (1024.0 * 1024.0)
            );
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::Space => Some(Key::Space),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Rise of the AI starting...");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
    }
}
