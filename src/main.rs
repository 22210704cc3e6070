use clap::{ArgAction, Parser, Subcommand};
use retouch::adjust::{AdjustmentState, Continuous, DiscreteFilter, FlipAxis, RotationStep};
use retouch::editor::{Editor, EditorOptions, ExportSink, FileSink, spawn_decode};
use retouch::imaging::{RasterSurface, RenderSurface};
use retouch::store::{LoadOutcome, Upload};
use retouch::viewport::Viewport;
use retouch::{config, output};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Adjustment flags shared by `apply` and `chain`.
///
/// Applied in this order: recipe, sliders, filter toggles, rotations, flips.
#[derive(clap::Args, Clone, Debug)]
struct AdjustArgs {
    /// JSON adjustment recipe applied before any other flag
    #[arg(long, value_name = "FILE")]
    recipe: Option<PathBuf>,

    /// Brightness offset in percent (-100 to 100)
    #[arg(long, allow_negative_numbers = true)]
    brightness: Option<f32>,

    /// Contrast offset in percent (-100 to 100)
    #[arg(long, allow_negative_numbers = true)]
    contrast: Option<f32>,

    /// Saturation offset in percent (-100 to 100)
    #[arg(long, allow_negative_numbers = true)]
    saturation: Option<f32>,

    /// Hue rotation in degrees (wraps at 360)
    #[arg(long, allow_negative_numbers = true)]
    hue: Option<f32>,

    /// Blur radius in pixels (0 to 50)
    #[arg(long)]
    blur: Option<f32>,

    /// Toggle a filter: grayscale, sepia, invert, blur-preset (or blur), sharpen
    #[arg(long = "filter", value_name = "NAME")]
    filters: Vec<DiscreteFilter>,

    /// Rotate 90° counter-clockwise (repeatable)
    #[arg(short = 'l', long, action = ArgAction::Count)]
    rotate_left: u8,

    /// Rotate 90° clockwise (repeatable)
    #[arg(short = 'r', long, action = ArgAction::Count)]
    rotate_right: u8,

    /// Mirror left to right
    #[arg(long)]
    flip_horizontal: bool,

    /// Mirror top to bottom
    #[arg(long)]
    flip_vertical: bool,
}

impl AdjustArgs {
    fn sliders(&self) -> [(Continuous, Option<f32>); 5] {
        [
            (Continuous::Brightness, self.brightness),
            (Continuous::Contrast, self.contrast),
            (Continuous::Saturation, self.saturation),
            (Continuous::Hue, self.hue),
            (Continuous::Blur, self.blur),
        ]
    }

    fn rotations(&self) -> impl Iterator<Item = RotationStep> {
        std::iter::repeat_n(RotationStep::CounterClockwise, self.rotate_left.into())
            .chain(std::iter::repeat_n(RotationStep::Clockwise, self.rotate_right.into()))
    }

    fn flips(&self) -> impl Iterator<Item = FlipAxis> {
        let h = self.flip_horizontal.then_some(FlipAxis::Horizontal);
        let v = self.flip_vertical.then_some(FlipAxis::Vertical);
        h.into_iter().chain(v)
    }

    /// Build the resulting state without an image.
    fn to_state(&self) -> CliResult<AdjustmentState> {
        let mut state = match &self.recipe {
            Some(path) => load_recipe(path)?,
            None => AdjustmentState::new(),
        };
        for (kind, value) in self.sliders() {
            if let Some(value) = value {
                state.set_continuous(kind, value);
            }
        }
        for filter in &self.filters {
            state.toggle_discrete_filter(*filter);
        }
        for step in self.rotations() {
            state.rotate(step);
        }
        for axis in self.flips() {
            state.flip(axis);
        }
        Ok(state)
    }

    /// Drive the same changes through the editor's controls.
    fn apply<S: RenderSurface, E: ExportSink>(&self, editor: &mut Editor<S, E>) -> CliResult<()> {
        if let Some(path) = &self.recipe {
            editor.set_adjustments(load_recipe(path)?)?;
        }
        for (kind, value) in self.sliders() {
            if let Some(value) = value {
                editor.set_continuous(kind, value)?;
            }
        }
        for filter in &self.filters {
            editor.toggle_filter(*filter)?;
        }
        for step in self.rotations() {
            editor.rotate(step)?;
        }
        for axis in self.flips() {
            editor.flip(axis)?;
        }
        Ok(())
    }
}

#[derive(clap::Args, Clone, Debug)]
struct ApplyArgs {
    /// Image to edit (PNG, JPEG, GIF, BMP, TIFF, WebP)
    input: PathBuf,

    /// Directory the edited PNG is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Name of the exported file (overrides export.file_name)
    #[arg(long)]
    file_name: Option<String>,

    /// Canvas width in pixels (defaults to the image width)
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels (defaults to the image height)
    #[arg(long)]
    height: Option<u32>,

    #[command(flatten)]
    adjust: AdjustArgs,
}

#[derive(clap::Args, Clone, Debug)]
struct ChainArgs {
    /// Print the adjustment state as JSON (usable as --recipe)
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    adjust: AdjustArgs,
}

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Headless raster image editor")]
#[command(long_about = "\
Headless raster image editor

Loads an image, applies brightness/contrast/saturation/hue/blur, toggle
filters and quarter-turn rotations or flips, and exports the result as PNG.
Every render starts from the original pixels; edits are never destructive.

Filter chain order (always):
  brightness → contrast → saturate → hue-rotate → blur
  → grayscale → sepia → invert → blur-preset (5px) → sharpen (contrast 200%)

Run 'retouch gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Edit one image and export it as PNG
    Apply(ApplyArgs),
    /// Print the filter chain and transform for a set of adjustments
    Chain(ChainArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Apply(args) => {
            let mut settings = config::load_config(&cli.config)?;
            if let Some(name) = &args.file_name {
                settings.export.file_name = name.clone();
                settings.validate()?;
            }
            init_thread_pool(&settings.processing);
            run_apply(&args, &settings)?;
        }
        Command::Chain(args) => {
            let state = args.adjust.to_state()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                output::print_chain_output(&state);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_apply(args: &ApplyArgs, settings: &config::EditorConfig) -> CliResult<()> {
    let canvas = Viewport::new(settings.canvas.width.into(), settings.canvas.height.into())?;
    let mut editor = Editor::new(
        RasterSurface::new(canvas),
        FileSink::new(&args.output),
        (canvas.width().into(), canvas.height().into()),
        EditorOptions::from(settings),
    )?;

    // Decode on a worker, the same way an interactive shell would.
    let upload = Upload::from_path(&args.input)?;
    let pending = editor.begin_upload(upload)?;
    let (tx, rx) = mpsc::channel();
    let worker = spawn_decode(pending, tx);
    let event = rx.recv()?;
    worker.join().map_err(|_| "decode worker panicked")?;
    let image = match editor.finish_upload(event)? {
        LoadOutcome::Committed(image) => image,
        LoadOutcome::Superseded => return Err("upload was superseded".into()),
    };

    let width = args.width.unwrap_or(image.width());
    let height = args.height.unwrap_or(image.height());
    editor.resize((width.into(), height.into()))?;

    args.adjust.apply(&mut editor)?;
    let exported = editor.export()?;

    output::print_apply_output(
        &args.input,
        image.dimensions(),
        editor.viewport(),
        editor.last_plan(),
        exported.as_ref(),
        editor.sink().dir(),
    );
    Ok(())
}

fn load_recipe(path: &Path) -> CliResult<AdjustmentState> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn init_tracing(verbosity: u8) -> CliResult<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(format!("retouch={level}").parse()?);
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
