//! Application entry point for the space-colonization viewer.
//!
//! This binary sets up logging and eframe/egui, and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging goes through `env_logger`, so `RUST_LOG=venation_core=debug`
/// prints a summary of every growth step.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Space Colonisation",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new()))),
    )
}
