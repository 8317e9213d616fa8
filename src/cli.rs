// ============================================================================
// Markboard CLI — headless export of saved projects
// ============================================================================
//
// Usage examples:
//   markboard --input review.mkb --output flat.png
//   markboard -i review.mkb -o flat.jpg --quality 85 --background 1e1e1e
//   markboard -i review.mkb -o older.png --revision 2
//
// No GUI is opened in CLI mode; the project's overlays are flattened over
// the selected revision's base image and written to disk synchronously.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::compositor::compose_revision;
use crate::io::{ExportFormat, load_project, write_export};

/// Markboard headless exporter.
///
/// Flatten a saved project's annotations over a revision's base image and
/// write a PNG or JPEG — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "markboard",
    about = "Markboard headless project exporter",
    long_about = "Export a .mkb project to a flattened raster image without\n\
                  opening the GUI.\n\n\
                  Example:\n  \
                  markboard --input review.mkb --output flat.png\n  \
                  markboard -i review.mkb -o flat.jpg --quality 85"
)]
pub struct CliArgs {
    /// Input .mkb project file.
    #[arg(short, long, value_name = "PROJECT.mkb")]
    pub input: PathBuf,

    /// Output image path. Format inferred from the extension (png/jpg).
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Revision index to export (0 = newest). Defaults to the revision the
    /// project was viewing when it was saved.
    #[arg(short, long, value_name = "INDEX")]
    pub revision: Option<usize>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Background fill as RRGGBB hex. Defaults to white for JPEG output and
    /// to no fill (transparent) for PNG.
    #[arg(short, long, value_name = "RRGGBB")]
    pub background: Option<String>,
}

impl CliArgs {
    /// Returns `true` when a CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// Run the export and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let (store, mut history) = match load_project(&args.input) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("error: cannot open {}: {}", args.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(index) = args.revision {
        if let Err(e) = history.jump_to(index) {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let active = match history.active() {
        Ok(entry) => entry,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let format = ExportFormat::from_extension(&args.output);

    let background = match args.background.as_deref() {
        Some(hex) => match parse_hex_color(hex) {
            Some(rgb) => Some(rgb),
            None => {
                eprintln!("error: invalid --background '{}': expected RRGGBB hex", hex);
                return ExitCode::FAILURE;
            }
        },
        // JPEG cannot represent transparency.
        None if format == ExportFormat::Jpeg => Some([255, 255, 255, 255]),
        None => None,
    };

    let composite = match compose_revision(&active.image, &store.annotations, background) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_export(&composite, &args.output, format, args.quality) {
        eprintln!("error: cannot write {}: {}", args.output.display(), e);
        return ExitCode::FAILURE;
    }

    println!(
        "exported revision {} ({} annotation{}) -> {}",
        history.current_index(),
        store.annotations.len(),
        if store.annotations.len() == 1 { "" } else { "s" },
        args.output.display()
    );
    ExitCode::SUCCESS
}

/// Parse "RRGGBB" (optionally "#RRGGBB") into opaque RGBA.
fn parse_hex_color(hex: &str) -> Option<[u8; 4]> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("ffffff"), Some([255, 255, 255, 255]));
        assert_eq!(parse_hex_color("#1e1e1e"), Some([30, 30, 30, 255]));
        assert_eq!(parse_hex_color("00ff7f"), Some([0, 255, 127, 255]));
        assert_eq!(parse_hex_color("fff"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }
}
