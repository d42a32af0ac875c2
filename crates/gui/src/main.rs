mod app;
mod ui;
mod viewport;

// Re-export library modules so that `crate::state`, `crate::error`, etc.
// resolve to the lib crate types everywhere in the binary.
pub use qmvision_gui_lib::error;
pub use qmvision_gui_lib::state;

use std::path::PathBuf;

use app::ViewerApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qmvision=info,qmvision_gui_lib=info".into()),
        )
        .init();

    // Parse --mesh <path> argument
    let initial_mesh = parse_mesh_arg(std::env::args().skip(1));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("QMVision: quad/triangle mesh viewer")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "qmvision",
        native_options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, initial_mesh)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_mesh_arg(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--mesh" {
            let path = args.next();
            if path.is_none() {
                tracing::error!("--mesh needs a path to a JSON mesh document");
            }
            return path.map(PathBuf::from);
        }
    }
    None
}
