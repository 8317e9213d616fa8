use std::process::ExitCode;

use markboard::cli::{self, CliArgs};
use markboard::{MarkboardApp, logger};

fn main() -> ExitCode {
    // -- CLI / headless mode -------------------------------------------
    // Routed before any window is created so exports work over SSH and in
    // scripts.
    if CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = CliArgs::parse();
        return cli::run(args);
    }

    // -- GUI mode ------------------------------------------------------

    // Session log (overwrites the previous session's log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 500.0])
            .with_title("Markboard"),
        ..Default::default()
    };

    match eframe::run_native(
        "Markboard",
        options,
        Box::new(|cc| Box::new(MarkboardApp::new(cc))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: failed to start GUI: {}", e);
            ExitCode::FAILURE
        }
    }
}
