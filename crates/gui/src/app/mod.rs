//! Main application module

mod keyboard;
mod menus;
mod styles;

use std::path::PathBuf;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{properties, status_bar};
use crate::viewport::ViewportPanel;

/// Main application
pub struct ViewerApp {
    state: AppState,
    viewport: ViewportPanel,
    /// Settings as last written to disk
    saved_settings: crate::state::AppSettings,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_mesh: Option<PathBuf>) -> Self {
        let mut state = AppState::default();

        // CLI argument takes priority, then the demo mesh
        let opened = initial_mesh.is_some_and(|path| state.open_file(&path).is_ok());
        if !opened {
            if let Err(e) = state.show_demo() {
                tracing::error!("Failed to build demo mesh: {e}");
            }
        }

        styles::configure_styles(&cc.egui_ctx, &state.settings.viewport);

        let mut viewport = ViewportPanel::new();

        // Initialize GL renderer if glow context is available
        if let Some(gl) = cc.gl.as_ref() {
            viewport.init_gl(gl);
        }

        let saved_settings = state.settings.clone();
        Self {
            state,
            viewport,
            saved_settings,
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Persist settings when changed
        if self.state.settings != self.saved_settings {
            if self.state.settings.viewport != self.saved_settings.viewport {
                styles::configure_styles(ctx, &self.state.settings.viewport);
            }
            self.state.settings.save();
            self.saved_settings = self.state.settings.clone();
        }

        keyboard::handle_keyboard(ctx, &mut self.state, &mut self.viewport);

        // ── Menu bar ──────────────────────────────────────────
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                menus::file_menu(ui, &mut self.state);
                menus::view_menu(ui, &mut self.state, &mut self.viewport);
                menus::settings_menu(ui, &mut self.state);
            });
        });

        // ── Settings window ──────────────────────────────────
        menus::settings_window(ctx, &mut self.state);

        // ── Status bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &self.state, self.viewport.has_gl());
            });

        // ── Right panel: mesh and selection properties ───────
        egui::SidePanel::right("properties")
            .default_width(240.0)
            .width_range(180.0..=420.0)
            .resizable(true)
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    properties::show(ui, &mut self.state);
                });
            });

        // ── Central panel: mesh viewport ─────────────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.state);
            });
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let Some(gl) = gl {
            self.viewport.destroy_gl(gl);
        }
    }
}
