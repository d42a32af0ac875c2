//! Application style configuration

use eframe::egui;
use egui::Color32;

use crate::state::settings::ViewportSettings;

/// Dark theme whose panels and selection follow the viewport colors
pub fn configure_styles(ctx: &egui::Context, viewport: &ViewportSettings) {
    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::dark();

    style.visuals.window_corner_radius = egui::CornerRadius::same(4);
    style.spacing.item_spacing = egui::vec2(6.0, 3.0);

    // Panels sit a little above the mesh background
    let [r, g, b] = viewport.background_color;
    style.visuals.panel_fill = lift(r, g, b, 6);
    style.visuals.window_fill = lift(r, g, b, 12);
    style.visuals.extreme_bg_color = lift(r, g, b, 0);

    let [hr, hg, hb] = viewport.highlight_color;
    style.visuals.selection.bg_fill = Color32::from_rgba_unmultiplied(hr, hg, hb, 90);
    style.visuals.selection.stroke.color = Color32::from_rgb(hr, hg, hb);

    // Ids and coordinates in the properties grid
    style
        .text_styles
        .insert(egui::TextStyle::Monospace, egui::FontId::monospace(12.0));

    ctx.set_style(style);
}

fn lift(r: u8, g: u8, b: u8, by: u8) -> Color32 {
    Color32::from_rgb(r.saturating_add(by), g.saturating_add(by), b.saturating_add(by))
}
