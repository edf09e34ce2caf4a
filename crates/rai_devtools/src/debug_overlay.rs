//! F3 debug overlay drawn with egui on top of the level.
//!
//! `egui_wgpu::Renderer::render()` wants a `RenderPass<'static>` while the
//! pass itself borrows the encoder, so a frame goes through four calls:
//!
//!   1. `prepare()` runs the UI and tessellates it
//!   2. `upload()`  pushes textures and buffers through the encoder
//!   3. `paint()`   draws into a pass opened with `forget_lifetime()`
//!   4. `cleanup()` frees textures egui dropped this frame
//!
//! Window events are always routed to egui; the panel itself is only built
//! while `visible` is set.

use rai_core::time::TimeState;
use winit::window::Window;

/// Game-side numbers shown under the timing block.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub enemies_killed: u32,
    pub active_enemies: u32,
    pub player_position: [f32; 2],
    pub player_velocity: [f32; 2],
    /// Contact flags in top, bottom, left, right order.
    pub contacts: [bool; 4],
    pub status_label: String,
    pub paused: bool,
    pub draw_calls: u32,
    pub sprite_count: u32,
}

/// Buttons the user pressed this frame.
#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Run exactly one fixed step while paused.
    pub single_step: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

fn contact_label(contacts: [bool; 4]) -> String {
    let names = ["top", "bottom", "left", "right"];
    let hit: Vec<&str> = names
        .iter()
        .zip(contacts)
        .filter_map(|(name, on)| on.then_some(*name))
        .collect();
    if hit.is_empty() {
        "none".to_string()
    } else {
        hit.join(" ")
    }
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    /// Returns true when egui wants the event for itself.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_winit_state.on_window_event(window, event).consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: &OverlayStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let visible = self.visible;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !visible {
                return;
            }
            egui::Window::new("Debug")
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                    ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                    ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                    ui.label(format!("Total steps: {}", time.fixed_step_count));

                    ui.separator();
                    ui.label(format!("Status: {}", stats.status_label));
                    ui.label(format!("Enemies defeated: {}", stats.enemies_killed));
                    ui.label(format!("Enemies active: {}", stats.active_enemies));
                    ui.label(format!(
                        "Player: ({:.2}, {:.2})  vel ({:.2}, {:.2})",
                        stats.player_position[0],
                        stats.player_position[1],
                        stats.player_velocity[0],
                        stats.player_velocity[1],
                    ));
                    ui.label(format!("Contacts: {}", contact_label(stats.contacts)));

                    ui.separator();
                    ui.label(format!("Draw calls: {}", stats.draw_calls));
                    ui.label(format!("Sprites: {}", stats.sprite_count));

                    ui.separator();
                    ui.horizontal(|ui| {
                        let pause_label = if stats.paused { "Resume" } else { "Pause" };
                        if ui.button(pause_label).clicked() {
                            actions.toggle_pause = true;
                        }
                        if stats.paused && ui.button("Step").clicked() {
                            actions.single_step = true;
                        }
                    });
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Call before opening the overlay's render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
