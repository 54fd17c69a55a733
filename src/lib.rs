// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod ui;
pub mod utils;

// MVC architecture plus the asset pipeline
pub mod asset;
pub mod controller;
pub mod model;
pub mod view;

// Common imports for the WASM shell
#[cfg(target_arch = "wasm32")]
use std::cell::{Cell, RefCell};
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

#[cfg(target_arch = "wasm32")]
use crate::asset::{AssetLoader, CATALOGUE};
#[cfg(target_arch = "wasm32")]
use crate::controller::{intent_from_code, ControlState, FrameContext, OrbitController};
#[cfg(target_arch = "wasm32")]
use crate::model::{Camera, Scene};
#[cfg(target_arch = "wasm32")]
use crate::view::{render, GpuContext, RenderState};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let (window, document, canvas) = init_canvas(800, 600)?;
    setup_app(&window, &document, &canvas).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    let gpu = GpuContext::new(canvas, 800, 600)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e:?}")))?;

    let width = gpu.config.width;
    let height = gpu.config.height;

    let camera = Rc::new(RefCell::new(Camera::new(width, height)));

    let bindings = render::create_scene_bindings(gpu.device.as_ref(), gpu.queue.as_ref());
    let depth_format = wgpu::TextureFormat::Depth32Float;
    let (_depth_texture, depth_view) =
        render::create_depth_texture(gpu.device.as_ref(), width, height);
    let depth_view_cell: Rc<RefCell<wgpu::TextureView>> = Rc::new(RefCell::new(depth_view));
    let pipelines =
        render::create_scene_pipelines(gpu.device.as_ref(), gpu.format, &bindings, depth_format);

    let scene = Rc::new(RefCell::new(Scene::new(
        gpu.device.as_ref(),
        &bindings.model_layout,
        &mut rand::thread_rng(),
    )));
    let controls = Rc::new(RefCell::new(ControlState::new()));
    let orbit = OrbitController::new();

    // Assets are fetched relative to the page.
    let loader = Rc::new(AssetLoader::new("models"));
    loader.request(CATALOGUE[0]);

    let ui_state = Rc::new(RefCell::new(ui::UiState::new()));
    let egui_ctx = egui::Context::default();
    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));
    let egui_renderer = egui_wgpu::Renderer::new(
        gpu.device.as_ref(),
        gpu.format,
        egui_wgpu::RendererOptions::default(),
    );

    setup_input_listeners(
        document,
        window,
        scene.clone(),
        controls.clone(),
        camera.clone(),
        orbit,
        egui_ctx.clone(),
        egui_events.clone(),
    )?;

    let mut render_state = RenderState {
        format: gpu.format,
        alpha_mode: gpu.config.alpha_mode,
        width,
        height,
        pipelines,
        egui_renderer,
        egui_primitives: None,
        egui_textures_delta: None,
        egui_dpr: 1.0,
    };

    let mut frame_ctx = FrameContext::new();
    let last_time = Rc::new(RefCell::new(
        window.performance().map(|p| p.now()).unwrap_or(0.0),
    ));

    let frame = RcCellCallback::new(window.clone(), {
        let window = window.clone();
        let canvas = canvas.clone();
        let scene = scene.clone();
        let controls = controls.clone();
        let camera = camera.clone();
        let loader = loader.clone();
        let ui_state = ui_state.clone();
        let depth_view_cell = depth_view_cell.clone();
        let egui_events = egui_events.clone();

        move || {
            let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
            let mut last = last_time.borrow_mut();
            let dt = ((now - *last) / 1000.0) as f32;
            *last = now;
            drop(last);

            handle_resize(
                &window,
                &canvas,
                gpu.device.as_ref(),
                &gpu.surface,
                &mut render_state,
                &mut camera.borrow_mut(),
                &depth_view_cell,
            );

            {
                let mut scene_mut = scene.borrow_mut();
                let mut controls_mut = controls.borrow_mut();
                frame_ctx.advance(
                    gpu.device.as_ref(),
                    gpu.queue.as_ref(),
                    &bindings,
                    &mut scene_mut,
                    &mut controls_mut,
                    &loader,
                    &camera.borrow(),
                    dt,
                );
            }

            // Build and tessellate the UI
            let dpr = window.device_pixel_ratio() as f32;
            egui_ctx.set_pixels_per_point(dpr);
            let mut raw_input = egui::RawInput::default();
            raw_input.time = Some(now / 1000.0);
            raw_input.screen_rect = Some(egui::Rect::from_min_size(
                egui::Pos2::new(0.0, 0.0),
                egui::vec2(
                    render_state.width as f32 / dpr,
                    render_state.height as f32 / dpr,
                ),
            ));
            raw_input.events.extend(egui_events.borrow_mut().drain(..));

            {
                let mut ui_ref = ui_state.borrow_mut();
                ui_ref.fps = if dt > 0.0 { 1.0 / dt } else { 0.0 };
                let mut scene_mut = scene.borrow_mut();
                let full_output = egui_ctx.run(raw_input, |ctx| {
                    ui::draw_panels(ctx, &mut scene_mut, &loader, &mut ui_ref);
                });
                let primitives = egui_ctx.tessellate(full_output.shapes, dpr);
                render_state.egui_primitives = Some(primitives);
                render_state.egui_textures_delta = Some(full_output.textures_delta);
                render_state.egui_dpr = dpr;
            }

            let scene_ref = scene.borrow();
            let depth_view = depth_view_cell.borrow();
            render_state.draw_frame(
                gpu.device.as_ref(),
                gpu.queue.as_ref(),
                &gpu.surface,
                &scene_ref,
                &depth_view,
                &bindings,
            );
        }
    });
    frame.start();

    Ok(())
}

/// Reconfigure the surface and depth buffer when the window size changes
#[cfg(target_arch = "wasm32")]
fn handle_resize(
    window: &Window,
    canvas: &HtmlCanvasElement,
    device: &wgpu::Device,
    surface: &wgpu::Surface,
    render_state: &mut RenderState,
    camera: &mut Camera,
    depth_view_cell: &Rc<RefCell<wgpu::TextureView>>,
) {
    if let (Ok(w), Ok(h)) = (window.inner_width(), window.inner_height()) {
        let nw = w.as_f64().unwrap_or(800.0) as u32;
        let nh = h.as_f64().unwrap_or(600.0) as u32;
        if (nw != render_state.width || nh != render_state.height) && nw > 0 && nh > 0 {
            canvas.set_width(nw);
            canvas.set_height(nh);
            camera.set_aspect(nw, nh);
            render_state.width = nw;
            render_state.height = nh;

            let config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: render_state.format,
                width: nw,
                height: nh,
                present_mode: wgpu::PresentMode::Fifo,
                alpha_mode: render_state.alpha_mode,
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            };
            surface.configure(device, &config);

            let (_texture, view) = render::create_depth_texture(device, nw, nh);
            *depth_view_cell.borrow_mut() = view;
        }
    }
}

/// Wire up keyboard, mouse, and focus listeners
#[cfg(target_arch = "wasm32")]
#[allow(clippy::too_many_arguments)]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    scene: Rc<RefCell<Scene>>,
    controls: Rc<RefCell<ControlState>>,
    camera: Rc<RefCell<Camera>>,
    orbit: OrbitController,
    egui_ctx: egui::Context,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
) -> Result<(), JsValue> {
    // Keyboard down: movement flags plus the edge-triggered jump
    {
        let scene = scene.clone();
        let controls = controls.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            if let Some(intent) = intent_from_code(&e.code()) {
                let mut scene = scene.borrow_mut();
                let body = scene.character.as_mut().map(|c| &mut c.body);
                controls.borrow_mut().key_down(intent, body);
                e.prevent_default();
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let controls = controls.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            if let Some(intent) = intent_from_code(&e.code()) {
                controls.borrow_mut().key_up(intent);
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Focus loss drops held movement keys
    {
        let controls = controls.clone();
        let blur = Closure::wrap(Box::new(move |_e: web_sys::Event| {
            controls.borrow_mut().clear_movement();
        }) as Box<dyn FnMut(web_sys::Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    let dragging = Rc::new(Cell::new(false));

    // Mouse down starts an orbit drag unless the UI wants the pointer
    {
        let dragging = dragging.clone();
        let egui_ctx = egui_ctx.clone();
        let egui_events = egui_events.clone();
        let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
            let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed: true,
                modifiers: egui::Modifiers::default(),
            });
            if !egui_ctx.wants_pointer_input() {
                dragging.set(true);
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }

    // Mouse up ends the drag
    {
        let dragging = dragging.clone();
        let egui_events = egui_events.clone();
        let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
            let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed: false,
                modifiers: egui::Modifiers::default(),
            });
            dragging.set(false);
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Mouse move: orbit while dragging, always fed to the UI
    {
        let dragging = dragging.clone();
        let camera = camera.clone();
        let egui_events = egui_events.clone();
        let mousemove = Closure::wrap(Box::new(move |e: MouseEvent| {
            let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerMoved(pos));
            if dragging.get() {
                orbit.apply_drag(
                    &mut camera.borrow_mut(),
                    e.movement_x() as f32,
                    e.movement_y() as f32,
                );
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }

    // Wheel zooms the orbit camera
    {
        let wheel = Closure::wrap(Box::new(move |e: web_sys::WheelEvent| {
            if !egui_ctx.wants_pointer_input() {
                orbit.apply_zoom(&mut camera.borrow_mut(), e.delta_y() as f32);
                e.prevent_default();
            }
        }) as Box<dyn FnMut(web_sys::WheelEvent)>);
        document.add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref())?;
        wheel.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn init_canvas(width: u32, height: u32) -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas_el.set_width(width);
    canvas_el.set_height(height);
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            let cb_ref = callback_clone.borrow();
            window
                .request_animation_frame(cb_ref.as_ref().unwrap().as_ref().unchecked_ref())
                .expect("RAF failed");
        }) as Box<dyn FnMut()>));

        self.window
            .request_animation_frame(callback.borrow().as_ref().unwrap().as_ref().unchecked_ref())
            .expect("RAF start failed");

        // Leak the closure to keep it alive
        std::mem::forget(callback);
    }
}
