// ============================================================================
// Grainy CLI — headless grain rendering via command-line arguments
// ============================================================================
//
// Usage examples:
//   grainy --width 3000 --height 2000 -i 0.6 -s 3 -t film
//   grainy --width 210 --height 297 --unit mm --ppi 300 --preset risograph
//   grainy --settings look.json --seed 7 --output cover.png
//   grainy --recipe "dusty 1970s magazine" --recipe-index 2 --clipboard
//
// Settings are layered: defaults -> --settings file -> --preset -> --recipe
// -> individual flags.  Later layers only override what they mention.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use grainy::config::AppConfig;
use grainy::io::{export_filename_for, write_png};
use grainy::ops::clipboard::copy_to_system_clipboard;
use grainy::recipes::{Recipe, RecipeClient};
use grainy::settings::{self, GrainSettings, Preset, SettingsPatch, TextureType, Unit};
use grainy::{Renderer, log_info, log_warn};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Grainy Editorial film-grain generator.
#[derive(Parser, Debug, Default)]
#[command(
    name = "grainy",
    about = "Deterministic film-grain texture generator",
    long_about = "Render a seeded film-grain texture over a background color and export\n\
                  it as PNG (Grainy_Editorial_<w>x<h>.png) or copy it to the clipboard.\n\n\
                  Example:\n  \
                  grainy --width 3000 --height 2000 -i 0.6 -s 3 -t film\n  \
                  grainy --recipe \"soft newsprint\" --clipboard --no-file"
)]
pub struct CliArgs {
    /// Output width, in --unit (clamped to 5000 px).
    #[arg(long, value_name = "N")]
    pub width: Option<f64>,

    /// Output height, in --unit (clamped to 5000 px).
    #[arg(long, value_name = "N")]
    pub height: Option<f64>,

    /// Unit for --width/--height: px or mm.
    #[arg(long, default_value = "px", value_name = "px|mm")]
    pub unit: String,

    /// Pixel density used for mm conversion.
    #[arg(long, value_name = "PPI")]
    pub ppi: Option<u32>,

    /// Grain strength (0–1).
    #[arg(short, long, value_name = "0-1")]
    pub intensity: Option<f64>,

    /// Grain cell size in output pixels (1–20).
    #[arg(short, long, value_name = "1-20")]
    pub scale: Option<f64>,

    /// Ink-spread blur (0–1, radius = roughness × 10 px).
    #[arg(short, long, value_name = "0-1")]
    pub roughness: Option<f64>,

    /// Grain layer opacity (0–1).
    #[arg(long, value_name = "0-1")]
    pub opacity: Option<f64>,

    /// Clumping strength (0–1, ≤ 0.05 disables clumping).
    #[arg(long, value_name = "0-1")]
    pub randomness: Option<f64>,

    /// PRNG seed. Same seed + same settings = identical image.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i32>,

    /// Background color (#RRGGBB).
    #[arg(long, value_name = "#RRGGBB")]
    pub bg: Option<String>,

    /// Grain color in monochrome mode (#RRGGBB).
    #[arg(long, value_name = "#RRGGBB")]
    pub grain: Option<String>,

    /// Texture family: uniform, gaussian, speckle, film.
    #[arg(short, long, value_name = "FAMILY")]
    pub texture: Option<String>,

    /// Per-channel random grain color instead of --grain.
    #[arg(long, conflicts_with = "mono")]
    pub color: bool,

    /// Force single-color grain (overrides a settings file).
    #[arg(long)]
    pub mono: bool,

    /// Start from a named preset (see --list-presets).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// JSON settings file (full or partial, camelCase keys).
    #[arg(long, value_name = "FILE.json")]
    pub settings: Option<PathBuf>,

    /// Ask the recipe service for looks matching this prompt.
    #[arg(long, value_name = "PROMPT")]
    pub recipe: Option<String>,

    /// Which suggested recipe to apply (1-based).
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub recipe_index: usize,

    /// Output file path. Defaults to <output-dir>/Grainy_Editorial_<w>x<h>.png.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for the default filename.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not write a PNG file.
    #[arg(long)]
    pub no_file: bool,

    /// Copy the rendered image to the system clipboard.
    #[arg(long)]
    pub clipboard: bool,

    /// Print the final settings as JSON.
    #[arg(long)]
    pub print_settings: bool,

    /// List preset names and exit.
    #[arg(long)]
    pub list_presets: bool,

    /// Echo log lines and timing to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    grainy::logger::set_echo(args.verbose);

    if args.list_presets {
        for preset in Preset::ALL {
            println!("{}", preset.name());
        }
        return ExitCode::SUCCESS;
    }

    let config = AppConfig::load();

    let mut settings = match base_settings(&args, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(prompt) = &args.recipe {
        let recipes = RecipeClient::from_config(&config).fetch(prompt);
        match pick_recipe(&recipes, args.recipe_index) {
            Some(recipe) => {
                print_recipes(&recipes, args.recipe_index);
                settings = recipe.apply(&settings);
            }
            None if recipes.is_empty() => {
                eprintln!("warning: no recipes available for \"{}\"; using current settings.", prompt);
            }
            None => {
                print_recipes(&recipes, 0);
                eprintln!(
                    "warning: --recipe-index {} out of range (1-{}); using current settings.",
                    args.recipe_index,
                    recipes.len()
                );
            }
        }
    }

    let settings = apply_flags(settings, &args);

    if args.print_settings {
        println!("{}", settings.to_json());
    }

    let out_path = (!args.no_file).then(|| output_path(&args, &config, &settings));

    let start = Instant::now();
    let mut renderer = Renderer::new(settings);
    let image = renderer.render_now();
    if args.verbose {
        let (w, h) = image.dimensions();
        println!("rendered {}x{} in {:.0}ms", w, h, start.elapsed().as_secs_f64() * 1000.0);
    }

    let mut any_failure = false;

    if let Some(path) = out_path {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            eprintln!("error: could not create output directory '{}': {}", parent.display(), e);
            return ExitCode::FAILURE;
        }
        match write_png(image, &path) {
            Ok(()) => println!("{}", path.display()),
            Err(e) => {
                eprintln!("error: save failed: {}", e);
                any_failure = true;
            }
        }
    }

    if args.clipboard {
        match copy_to_system_clipboard(image) {
            Ok(()) => log_info!("Clipboard copy done"),
            Err(e) => {
                eprintln!("error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Settings layering
// ============================================================================

/// Defaults, then the settings file, then the preset.
fn base_settings(args: &CliArgs, config: &AppConfig) -> Result<GrainSettings, String> {
    let mut s = GrainSettings { ppi: config.default_ppi, ..Default::default() };

    if let Some(path) = &args.settings {
        let patch = settings::load_patch(path)
            .map_err(|e| format!("could not load settings '{}': {}", path.display(), e))?;
        s = s.merge(&patch);
    }

    if let Some(name) = &args.preset {
        let preset = Preset::parse(name).ok_or_else(|| {
            let names: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
            format!("unknown preset '{}' (available: {})", name, names.join(", "))
        })?;
        s = preset.apply(&s);
    }

    Ok(s)
}

/// Individual flags override everything before them.
fn apply_flags(base: GrainSettings, args: &CliArgs) -> GrainSettings {
    let unit = Unit::parse(&args.unit).unwrap_or_else(|| {
        log_warn!("Unknown unit '{}', using px", args.unit);
        Unit::Px
    });
    let ppi = args.ppi.unwrap_or(base.ppi).max(1);

    let texture = args.texture.as_deref().and_then(|name| {
        let parsed = TextureType::parse(name);
        if parsed.is_none() {
            eprintln!("warning: unknown texture '{}', keeping {}.", name, base.texture.label());
        }
        parsed
    });

    let monochrome = if args.color {
        Some(false)
    } else if args.mono {
        Some(true)
    } else {
        None
    };

    let patch = SettingsPatch {
        width: args.width.map(|w| unit.to_px(w, ppi)),
        height: args.height.map(|h| unit.to_px(h, ppi)),
        ppi: args.ppi,
        intensity: args.intensity,
        scale: args.scale,
        roughness: args.roughness,
        opacity: args.opacity,
        randomness: args.randomness,
        seed: args.seed,
        bg_color: args.bg.clone(),
        grain_color: args.grain.clone(),
        texture,
        monochrome,
    };
    base.merge(&patch)
}

fn pick_recipe(recipes: &[Recipe], index: usize) -> Option<&Recipe> {
    index.checked_sub(1).and_then(|i| recipes.get(i))
}

fn print_recipes(recipes: &[Recipe], chosen: usize) {
    for (i, r) in recipes.iter().enumerate() {
        let marker = if i + 1 == chosen { '*' } else { ' ' };
        if r.description.is_empty() {
            println!("{} {}. {}", marker, i + 1, r.name);
        } else {
            println!("{} {}. {}: {}", marker, i + 1, r.name, r.description);
        }
    }
}

/// Priority: --output, then --output-dir, then the configured directory.
fn output_path(args: &CliArgs, config: &AppConfig, settings: &GrainSettings) -> PathBuf {
    if let Some(out) = &args.output {
        return out.clone();
    }
    let dir = args.output_dir.clone().unwrap_or_else(|| config.output_dir());
    dir.join(export_filename_for(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        let mut full = vec!["grainy"];
        full.extend_from_slice(argv);
        CliArgs::try_parse_from(full).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&["--width", "640", "--height", "480", "-i", "0.9", "-t", "speckle", "--seed", "-3", "--color"]);
        let s = apply_flags(GrainSettings::default(), &args);
        assert_eq!((s.width, s.height), (640, 480));
        assert_eq!(s.intensity, 0.9);
        assert_eq!(s.texture, TextureType::Speckle);
        assert_eq!(s.seed, -3);
        assert!(!s.monochrome);
    }

    #[test]
    fn millimetres_convert_with_ppi() {
        let args = parse(&["--width", "25.4", "--height", "50.8", "--unit", "mm", "--ppi", "100"]);
        let s = apply_flags(GrainSettings::default(), &args);
        assert_eq!((s.width, s.height, s.ppi), (100, 200, 100));
    }

    #[test]
    fn preset_then_flags() {
        let args = parse(&["--preset", "coarse-print", "-s", "6"]);
        let base = base_settings(&args, &AppConfig::default()).unwrap();
        assert_eq!(base.scale, 4.0);
        let s = apply_flags(base, &args);
        assert_eq!(s.scale, 6.0);
        assert_eq!(s.roughness, 0.2);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let args = parse(&["--preset", "vaporwave"]);
        let err = base_settings(&args, &AppConfig::default()).unwrap_err();
        assert!(err.contains("fine-editorial"));
    }

    #[test]
    fn settings_file_is_layered_under_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("look.json");
        std::fs::write(&path, r##"{"intensity": 0.2, "bgColor": "#101010", "monochrome": false}"##).unwrap();
        let args = parse(&["--settings", path.to_str().unwrap(), "--mono"]);
        let s = apply_flags(base_settings(&args, &AppConfig::default()).unwrap(), &args);
        assert_eq!(s.intensity, 0.2);
        assert_eq!(s.bg_color, "#101010");
        assert!(s.monochrome);
    }

    #[test]
    fn default_output_uses_clamped_size() {
        let args = parse(&["--width", "9000", "--height", "100", "--output-dir", "out"]);
        let s = apply_flags(GrainSettings::default(), &args);
        let path = output_path(&args, &AppConfig::default(), &s);
        assert_eq!(path, PathBuf::from("out").join("Grainy_Editorial_5000x100.png"));
    }

    #[test]
    fn recipe_index_is_one_based() {
        let r = |n: &str| Recipe { name: n.into(), description: String::new(), settings: Default::default() };
        let list = vec![r("a"), r("b")];
        assert_eq!(pick_recipe(&list, 2).map(|x| x.name.as_str()), Some("b"));
        assert!(pick_recipe(&list, 0).is_none());
        assert!(pick_recipe(&list, 3).is_none());
    }

    #[test]
    fn color_and_mono_conflict() {
        assert!(CliArgs::try_parse_from(["grainy", "--color", "--mono"]).is_err());
    }
}
