use std::sync::Arc;

use clap::Parser;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use mannequin::asset::{AssetLoader, CATALOGUE};
use mannequin::controller::{ControlState, FrameContext, Intent, OrbitController};
use mannequin::model::{Camera, Scene};
use mannequin::view::{render, GpuContext, RenderState};
use mannequin::{logging, ui};

#[derive(Parser)]
#[command(name = "mannequin", about = "Animated character viewer with movement and box collision")]
struct Args {
    /// Directory containing the .glb character assets
    #[arg(long, default_value = "models")]
    assets: std::path::PathBuf,

    /// Asset to load at startup (defaults to the first catalogue entry)
    #[arg(long)]
    asset: Option<String>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn intent_from_key(code: KeyCode) -> Option<Intent> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Intent::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Intent::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Intent::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Intent::Right),
        KeyCode::Space => Some(Intent::Jump),
        _ => None,
    }
}

struct App {
    // Core GPU resources
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    window: Arc<Window>,

    // Rendering state
    bindings: render::SceneBindings,
    render_state: RenderState,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // Simulation state
    camera: Camera,
    orbit: OrbitController,
    scene: Scene,
    controls: ControlState,
    frame_ctx: FrameContext,
    loader: AssetLoader,
    ui_state: ui::UiState,

    // Input handling
    mouse_dragging: bool,

    // Frame timing
    last_frame_time: std::time::Instant,
    fps: f32,
    frame_count: u32,
    fps_timer: f32,
}

impl App {
    async fn new(window: Arc<Window>, args: &Args) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone()).unwrap();
        let gpu = GpuContext::new_native(instance, surface, size.width, size.height).await;

        let device = gpu.device.clone();
        let queue = gpu.queue.clone();
        let config = gpu.config.clone();

        let depth_format = wgpu::TextureFormat::Depth32Float;
        let (depth_texture, depth_view) =
            render::create_depth_texture(&device, size.width, size.height);

        let camera = Camera::new(size.width, size.height);
        let bindings = render::create_scene_bindings(&device, &queue);
        let pipelines =
            render::create_scene_pipelines(&device, config.format, &bindings, depth_format);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&device, config.format, egui_wgpu::RendererOptions::default());

        let render_state = RenderState {
            format: config.format,
            alpha_mode: config.alpha_mode,
            width: size.width,
            height: size.height,
            pipelines,
            egui_renderer,
            egui_primitives: None,
            egui_textures_delta: None,
            egui_dpr: 1.0,
        };

        let scene = Scene::new(&device, &bindings.model_layout, &mut rand::thread_rng());
        let loader = AssetLoader::new(args.assets.clone());

        Self {
            surface: gpu.surface,
            device,
            queue,
            config,
            size,
            window,
            bindings,
            render_state,
            depth_texture,
            depth_view,
            egui_state,
            egui_ctx,
            camera,
            orbit: OrbitController::new(),
            scene,
            controls: ControlState::new(),
            frame_ctx: FrameContext::new(),
            loader,
            ui_state: ui::UiState::new(),
            mouse_dragging: false,
            last_frame_time: std::time::Instant::now(),
            fps: 0.0,
            frame_count: 0,
            fps_timer: 0.0,
        }
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // Let egui take the event first
        let egui_captured = self
            .egui_state
            .on_window_event(self.window.as_ref(), event)
            .consumed;
        if egui_captured {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key,
                        ..
                    },
                ..
            } => {
                if let PhysicalKey::Code(code) = physical_key {
                    if let Some(intent) = intent_from_key(*code) {
                        match state {
                            ElementState::Pressed => {
                                let body = self.scene.character.as_mut().map(|c| &mut c.body);
                                self.controls.key_down(intent, body);
                            }
                            ElementState::Released => {
                                self.controls.key_up(intent);
                            }
                        }
                    }
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if *button == MouseButton::Left {
                    self.mouse_dragging = *state == ElementState::Pressed;
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * 50.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.orbit.apply_zoom(&mut self.camera, scroll);
                true
            }
            WindowEvent::Focused(false) => {
                self.controls.clear_movement();
                self.mouse_dragging = false;
                true
            }
            _ => false,
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.mouse_dragging {
            self.orbit
                .apply_drag(&mut self.camera, dx as f32, dy as f32);
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            let (depth_texture, depth_view) =
                render::create_depth_texture(&self.device, new_size.width, new_size.height);
            self.depth_texture = depth_texture;
            self.depth_view = depth_view;

            self.camera.set_aspect(new_size.width, new_size.height);
            self.render_state.width = new_size.width;
            self.render_state.height = new_size.height;
        }
    }

    fn update(&mut self, dt: f32) {
        self.frame_count += 1;
        self.fps_timer += dt;
        if self.fps_timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer;
            self.frame_count = 0;
            self.fps_timer = 0.0;
        }
        self.ui_state.fps = self.fps;

        self.frame_ctx.advance(
            &self.device,
            &self.queue,
            &self.bindings,
            &mut self.scene,
            &mut self.controls,
            &self.loader,
            &self.camera,
            dt,
        );
    }

    fn render(&mut self) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = self.egui_ctx.run(raw_input, |ctx| {
            ui::draw_panels(ctx, &mut self.scene, &self.loader, &mut self.ui_state);
        });
        self.egui_state
            .handle_platform_output(&self.window, output.platform_output);

        let dpr = self.window.scale_factor() as f32;
        let primitives = self.egui_ctx.tessellate(output.shapes, dpr);
        self.render_state.egui_primitives = Some(primitives);
        self.render_state.egui_textures_delta = Some(output.textures_delta);
        self.render_state.egui_dpr = dpr;

        self.render_state.draw_frame(
            &self.device,
            &self.queue,
            &self.surface,
            &self.scene,
            &self.depth_view,
            &self.bindings,
        );
    }
}

fn main() {
    logging::init();
    let args = Args::parse();

    let event_loop = EventLoop::new().unwrap();
    let window_attributes = Window::default_attributes()
        .with_title("Mannequin")
        .with_inner_size(winit::dpi::LogicalSize::new(args.width, args.height));
    #[allow(deprecated)]
    let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

    let mut app = pollster::block_on(App::new(window.clone(), &args));
    let first_asset = args.asset.as_deref().unwrap_or(CATALOGUE[0]).to_string();
    app.loader.request(&first_asset);

    #[allow(deprecated)]
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => {
                            let now = std::time::Instant::now();
                            let dt = (now - app.last_frame_time).as_secs_f32();
                            app.last_frame_time = now;

                            app.update(dt);
                            app.render();
                        }
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent {
                event: winit::event::DeviceEvent::MouseMotion { delta },
                ..
            } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        })
        .unwrap();
}
