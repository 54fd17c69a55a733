use egui::Context;

use crate::asset::{AssetLoader, CATALOGUE};
use crate::model::Scene;

/// UI-owned state that survives across frames.
pub struct UiState {
    pub selected_asset: usize,
    pub fps: f32,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            selected_asset: 0,
            fps: 0.0,
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build all control panels. Shared between the native and WASM shells.
pub fn draw_panels(ctx: &Context, scene: &mut Scene, loader: &AssetLoader, state: &mut UiState) {
    draw_asset_window(ctx, loader, state);
    draw_environment_window(ctx, scene);
    draw_morphs_window(ctx, scene);
    draw_debug_window(ctx, scene, loader, state);
}

fn draw_asset_window(ctx: &Context, loader: &AssetLoader, state: &mut UiState) {
    egui::Window::new("Asset")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            let mut selected = state.selected_asset;
            egui::ComboBox::from_label("Animation")
                .selected_text(CATALOGUE[state.selected_asset])
                .show_ui(ui, |ui| {
                    for (i, name) in CATALOGUE.iter().enumerate() {
                        ui.selectable_value(&mut selected, i, *name);
                    }
                });
            if selected != state.selected_asset {
                state.selected_asset = selected;
                loader.request(CATALOGUE[selected]);
            }
            if loader.in_flight() > 0 {
                ui.label(egui::RichText::new("loading...").small());
            }
        });
}

fn draw_environment_window(ctx: &Context, scene: &mut Scene) {
    let env = &mut scene.environment;
    egui::Window::new("Environment")
        .default_pos([8.0, 160.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Fog").small());
            ui.horizontal(|ui| {
                ui.color_edit_button_rgb(&mut env.fog_color);
                ui.label(egui::RichText::new("color").small());
            });
            ui.add(egui::Slider::new(&mut env.fog_near, 0.0..=2000.0).text("near"));
            ui.add(egui::Slider::new(&mut env.fog_far, 0.0..=2000.0).text("far"));

            ui.separator();
            ui.label(egui::RichText::new("Hemisphere light").small());
            ui.horizontal(|ui| {
                ui.color_edit_button_rgb(&mut env.hemi_sky_color);
                ui.label(egui::RichText::new("sky").small());
            });
            ui.horizontal(|ui| {
                ui.color_edit_button_rgb(&mut env.hemi_ground_color);
                ui.label(egui::RichText::new("ground").small());
            });
            ui.add(egui::Slider::new(&mut env.hemi_intensity, 0.0..=10.0).text("intensity"));

            ui.separator();
            ui.label(egui::RichText::new("Directional light").small());
            ui.horizontal(|ui| {
                ui.color_edit_button_rgb(&mut env.sun_color);
                ui.label(egui::RichText::new("color").small());
            });
            ui.add(egui::Slider::new(&mut env.sun_intensity, 0.0..=10.0).text("intensity"));
        });
}

fn draw_morphs_window(ctx: &Context, scene: &mut Scene) {
    let Some(character) = scene.character.as_mut() else {
        return;
    };
    if character.morphs.is_empty() {
        return;
    }

    egui::Window::new("Morphs")
        .default_pos([8.0, 420.0])
        .show(ctx, |ui| {
            for (i, morph) in character.morphs.iter().enumerate() {
                let weight = &mut character.morph_weights[i];
                if ui
                    .add(egui::Slider::new(weight, 0.0..=1.0).step_by(0.01).text(&morph.name))
                    .changed()
                {
                    character.morphs_dirty = true;
                }
            }
        });
}

fn draw_debug_window(ctx: &Context, scene: &Scene, loader: &AssetLoader, state: &UiState) {
    egui::Window::new("Debug")
        .default_pos([8.0, 600.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("FPS: {:.0}", state.fps)).small());
            match &scene.character {
                Some(character) => {
                    let pos = character.body.position;
                    let status = if character.body.is_grounded() {
                        "grounded"
                    } else {
                        "airborne"
                    };
                    ui.label(
                        egui::RichText::new(format!(
                            "Pos: x: {:.1} y: {:.1} z: {:.1}",
                            pos.x, pos.y, pos.z
                        ))
                        .small(),
                    );
                    ui.label(egui::RichText::new(format!("State: {status}")).small());
                    if let Some(clip) = character.active_clip() {
                        ui.label(
                            egui::RichText::new(format!(
                                "Clip: {} ({:.2}s / {:.2}s)",
                                clip.name, character.playhead.time, clip.duration
                            ))
                            .small(),
                        );
                    }
                }
                None => {
                    ui.label(egui::RichText::new("No character loaded").small());
                }
            }
            ui.label(egui::RichText::new(format!("Obstacles: {}", scene.obstacles.len())).small());
            if loader.in_flight() > 0 {
                ui.label(egui::RichText::new(format!("Loads in flight: {}", loader.in_flight())).small());
            }
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            ui.label(egui::RichText::new("WASD / arrows - Move").small());
            ui.label(egui::RichText::new("Space - Jump").small());
            ui.label(egui::RichText::new("Drag - Orbit, Wheel - Zoom").small());
        });
}
