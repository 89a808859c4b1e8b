use crate::scene_graph::LodLevel;
use crate::viewer::{Command, LayerFilter, ViewerState};

const ACTIVE: [f32; 4] = [0.4, 0.9, 0.4, 1.0];
const INACTIVE: [f32; 4] = [0.6, 0.6, 0.6, 1.0];

fn on_off(ui: &imgui::Ui, label: &str, enabled: bool) {
    ui.same_line();
    if enabled {
        ui.text_colored(ACTIVE, format!("{} on", label));
    } else {
        ui.text_colored(INACTIVE, format!("{} off", label));
    }
}

/// Draws the control panel and returns the commands its buttons issued this frame.
pub fn control_panel(ui: &imgui::Ui, state: &ViewerState) -> Vec<Command> {
    let mut commands = Vec::new();

    ui.window("Viewer")
        .position([10.0, 10.0], imgui::Condition::FirstUseEver)
        .size([320.0, 300.0], imgui::Condition::FirstUseEver)
        .build(|| {
            match state.stats.fps {
                Some(fps) => ui.text(format!("FPS: {:.1}", fps)),
                None => ui.text("FPS: -"),
            }
            ui.text_wrapped(state.status_line());
            ui.separator();

            if ui.button("Wireframe") {
                commands.push(Command::ToggleWireframe);
            }
            on_off(ui, "wireframe", state.view.wireframe);

            if ui.button("Explode") {
                commands.push(Command::ToggleExplode);
            }
            on_off(ui, "exploded", state.view.exploded());

            if ui.button("Clipping") {
                commands.push(Command::ToggleClipping);
            }
            on_off(ui, "clipping", state.view.clipping);

            ui.separator();
            ui.text("Layers");
            for (label, filter) in [
                ("Structure", LayerFilter::StructuralOnly),
                ("Spatial", LayerFilter::SpatialOnly),
                ("Both", LayerFilter::Both),
            ] {
                if ui.button(label) {
                    commands.push(Command::ShowLayers(filter));
                }
                ui.same_line();
            }
            ui.new_line();

            ui.text("Detail");
            if ui.button("LOD 0") {
                commands.push(Command::ShowLod(LodLevel::Lod0));
            }
            ui.same_line();
            if ui.button("LOD 1") {
                commands.push(Command::ShowLod(LodLevel::Lod1));
            }

            ui.separator();
            match &state.selection.readout {
                Some(info) => ui.text_wrapped(info.to_string()),
                None => match state.selection.selected.and_then(|id| state.scene.get_object(id)) {
                    Some(object) => ui.text_wrapped(format!("Selected: {}", object.name)),
                    None => ui.text("Nothing selected"),
                },
            }
        });

    commands
}
