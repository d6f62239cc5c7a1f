// ============================================================================
// SkinFE CLI: headless batch processing of skin textures
// ============================================================================
//
// Usage examples:
//   skinfe -i steve.png --swap-left-right -o mirrored.png
//   skinfe -i skins/*.png --variant slim --flatten-overlay --output-dir flat/
//   skinfe -i alex.png --hue 40 --saturation 1.2 --merge-filters -o tinted.png
//
// Every input is loaded as a one-layer project; the requested operations run
// through the same history-backed paths as interactive edits, then the
// composite is written as PNG.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::components::tools::MutationResult;
use crate::error::EditError;
use crate::ops::filters::FilterKind;
use crate::ops::skin_layout::SkinVariant;
use crate::ops::transform::TextureOp;
use crate::project::{Project, ProjectError};
use crate::settings::{EditorSettings, SettingsError};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Project(#[from] ProjectError),
    #[error("{0}")]
    Settings(#[from] SettingsError),
    #[error("{op} failed: {source}")]
    Op { op: &'static str, source: EditError },
}

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// SkinFE headless skin processor.
#[derive(Parser, Debug)]
#[command(
    name = "skinfe",
    about = "SkinFE headless batch skin processor",
    long_about = "Apply texture operations and colour filters to 64x64 skin PNGs\n\
                  without opening the editor.\n\n\
                  Example:\n  \
                  skinfe -i steve.png --swap-left-right -o mirrored.png\n  \
                  skinfe -i skins/*.png --flatten-overlay --output-dir flat/"
)]
pub struct CliArgs {
    /// Input skin(s). Glob patterns accepted (e.g. "skins/*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Arm model: classic or slim. Overrides the settings file.
    #[arg(long, value_name = "MODEL")]
    pub variant: Option<SkinVariant>,

    #[arg(long)]
    pub swap_front_back: bool,

    #[arg(long)]
    pub swap_left_right: bool,

    /// Exchange base and overlay texels of every body part.
    #[arg(long)]
    pub swap_body_overlay: bool,

    #[arg(long)]
    pub clear_base: bool,

    #[arg(long)]
    pub clear_overlay: bool,

    /// Paint opaque overlay texels onto the base and clear the overlay.
    #[arg(long)]
    pub flatten_overlay: bool,

    /// Layer opacity filter, 0-1.
    #[arg(long, value_name = "0-1")]
    pub opacity: Option<f32>,

    /// Hue rotation in degrees.
    #[arg(long, value_name = "DEG")]
    pub hue: Option<f32>,

    #[arg(long, value_name = "FACTOR")]
    pub saturation: Option<f32>,

    #[arg(long, value_name = "FACTOR")]
    pub brightness: Option<f32>,

    /// Bake the filters into the pixels before saving.
    #[arg(long)]
    pub merge_filters: bool,

    /// Settings JSON to use instead of the standard location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Echo log lines and per-file timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Texture operations requested on the command line, in application order.
    pub fn texture_ops(&self) -> Vec<TextureOp> {
        TextureOp::all()
            .iter()
            .copied()
            .filter(|op| match op {
                TextureOp::SwapFrontBack => self.swap_front_back,
                TextureOp::SwapLeftRight => self.swap_left_right,
                TextureOp::SwapBodyOverlay => self.swap_body_overlay,
                TextureOp::ClearBase => self.clear_base,
                TextureOp::ClearOverlay => self.clear_overlay,
                TextureOp::FlattenOverlay => self.flatten_overlay,
            })
            .collect()
    }

    pub fn filter_values(&self) -> Vec<(FilterKind, f32)> {
        FilterKind::all()
            .iter()
            .filter_map(|&kind| {
                let value = match kind {
                    FilterKind::Opacity => self.opacity,
                    FilterKind::Hue => self.hue,
                    FilterKind::Saturation => self.saturation,
                    FilterKind::Brightness => self.brightness,
                };
                value.map(|v| (kind, v))
            })
            .collect()
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    crate::logger::set_verbose(args.verbose);

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let mut settings = match &args.config {
        Some(path) => match EditorSettings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: could not load settings '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EditorSettings::load_or_default(),
    };
    if let Some(variant) = args.variant {
        settings.variant = variant;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let ops = args.texture_ops();
    let filters = args.filter_values();
    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let Some(output_path) = build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref())
        else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &settings, &ops, &filters, args.merge_filters) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                crate::log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    settings: &EditorSettings,
    ops: &[TextureOp],
    filters: &[(FilterKind, f32)],
    merge: bool,
) -> Result<(), CliError> {
    // -- Step 1: Load ----------------------------------------------------
    let mut project = Project::open(input, settings.clone())?;

    // -- Step 2: Texture operations --------------------------------------
    for &op in ops {
        match project.texture_op(op) {
            MutationResult::Committed => {}
            MutationResult::Skipped(reason) => {
                crate::log_info!("{} skipped on {}: {}", op.label(), input.display(), reason);
            }
            MutationResult::Rejected(source) => {
                return Err(CliError::Op { op: op.label(), source });
            }
        }
    }

    // -- Step 3: Filters -------------------------------------------------
    for &(kind, value) in filters {
        project.set_filter(kind, value, true);
    }
    if merge {
        project.merge_filters();
    }

    // -- Step 4: Save ----------------------------------------------------
    project.export_png(output)?;
    project.path = Some(output.to_path_buf());
    project.update_name_from_path();
    project.mark_clean();
    crate::log_info!("Wrote {} ({} undo steps)", project.display_title(), project.history.undo_count());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output`
/// 2. `--output-dir` joined with the input's file stem
/// 3. Next to the input with an `_out` suffix
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_out.png", stem)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_ops_in_fixed_order() {
        let args = CliArgs::parse_from([
            "skinfe",
            "-i",
            "a.png",
            "--flatten-overlay",
            "--swap-front-back",
            "--variant",
            "alex",
            "--hue",
            "30",
        ]);
        assert_eq!(args.texture_ops(), vec![TextureOp::SwapFrontBack, TextureOp::FlattenOverlay]);
        assert_eq!(args.filter_values(), vec![(FilterKind::Hue, 30.0)]);
        assert_eq!(args.variant, Some(SkinVariant::Slim));
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("skins/steve.png");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), Some(Path::new("out"))),
            Some(PathBuf::from("x.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out"))),
            Some(PathBuf::from("out/steve.png"))
        );
        assert_eq!(build_output_path(input, None, None), Some(PathBuf::from("skins/steve_out.png")));
    }

    #[test]
    fn batch_run_writes_processed_skin() {
        let dir = std::env::temp_dir().join(format!("skinfe-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.png");
        let mut skin = image::RgbaImage::new(64, 64);
        // Right arm front face, classic layout.
        skin.put_pixel(44, 20, image::Rgba([255, 0, 0, 255]));
        skin.save(&input).unwrap();

        let output = dir.join("out.png");
        run_one(&input, &output, &EditorSettings::default(), &[TextureOp::SwapLeftRight], &[], false).unwrap();

        let written = image::open(&output).unwrap().to_rgba8();
        assert_eq!(written.get_pixel(44, 20)[3], 0);
        assert!(written.pixels().any(|p| *p == image::Rgba([255, 0, 0, 255])));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrong_size_input_fails() {
        let dir = std::env::temp_dir().join(format!("skinfe-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("legacy.png");
        image::RgbaImage::new(64, 32).save(&input).unwrap();

        let result = run_one(&input, &dir.join("o.png"), &EditorSettings::default(), &[], &[], false);
        assert!(matches!(result, Err(CliError::Project(ProjectError::Edit(EditError::SizeMismatch { .. })))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
