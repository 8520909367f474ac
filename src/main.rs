//! heatwall: render one heatmap frame headless and write it as PNG

use heatwall::display::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use heatwall::error::{HeatError, Result};
use heatwall::export::save_png;
use heatwall::heat::MaxIntensity;
use heatwall::layer::{HeatLayer, HeatLayerController, HeatOptions, PlanarViewport};
use heatwall::points::{demo_points, load_points};
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DEMO_POINTS: usize = 2000;
const DEFAULT_OUT: &str = "heatmap.png";

struct Args {
    points: Option<PathBuf>,
    options: Option<PathBuf>,
    demo: Option<usize>,
    seed: u64,
    width: u32,
    height: u32,
    zoom: f64,
    center: (f64, f64),
    radius: Option<f64>,
    blur: Option<f64>,
    min_opacity: Option<f64>,
    legacy_max: bool,
    out: PathBuf,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            points: None,
            options: None,
            demo: None,
            seed: 1,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            zoom: 0.0,
            center: (0.0, 0.0),
            radius: None,
            blur: None,
            min_opacity: None,
            legacy_max: false,
            out: PathBuf::from(DEFAULT_OUT),
        }
    }
}

fn print_help() {
    println!("Usage: heatwall [OPTIONS]");
    println!();
    println!("Renders a density heatmap to a PNG file.");
    println!();
    println!("Options:");
    println!("  --points FILE         Load points from a JSON file");
    println!(
        "  --demo N              Generate N clustered demo points (default without --points: {})",
        DEFAULT_DEMO_POINTS
    );
    println!("  --seed S              Seed for demo points (default: 1)");
    println!("  --options FILE        Load layer options from a JSON file");
    println!(
        "  --width W, -w W       Surface width (default: {})",
        DEFAULT_WIDTH
    );
    println!(
        "  --height H, -h H      Surface height (default: {})",
        DEFAULT_HEIGHT
    );
    println!("  --resolution WxH, -r WxH  Surface size (e.g., 1920x1080)");
    println!("  --zoom Z              Viewport zoom, 2^Z pixels per unit (default: 0)");
    println!("  --center LAT,LNG      Viewport center (default: 0,0)");
    println!("  --radius R            Stamp radius in pixels");
    println!("  --blur B              Stamp blur in pixels");
    println!("  --min-opacity A       Opacity floor per point, 0..1");
    println!("  --legacy-max          Normalize against a fixed max of 5");
    println!("  --out FILE            Output PNG (default: {})", DEFAULT_OUT);
    println!("  --help                Show this help message");
}

/// Parse the value following `flag`
fn value<T: FromStr>(args: &[String], i: usize, flag: &str) -> Result<T> {
    let raw = args
        .get(i + 1)
        .ok_or_else(|| HeatError::InvalidArgument(format!("{} needs a value", flag)))?;
    raw.parse::<T>()
        .map_err(|_| HeatError::InvalidArgument(format!("{}: invalid value '{}'", flag, raw)))
}

/// Parse a "AxB" style pair
fn pair<T: FromStr>(raw: &str, sep: char, flag: &str) -> Result<(T, T)> {
    let bad = || HeatError::InvalidArgument(format!("{}: invalid value '{}'", flag, raw));
    let (a, b) = raw.split_once(sep).ok_or_else(bad)?;
    Ok((
        a.trim().parse().map_err(|_| bad())?,
        b.trim().parse().map_err(|_| bad())?,
    ))
}

/// Parse command line arguments. `None` means help was printed.
fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut out = Args::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--points" => {
                out.points = Some(value(args, i, flag)?);
                i += 1;
            },
            "--options" => {
                out.options = Some(value(args, i, flag)?);
                i += 1;
            },
            "--demo" => {
                out.demo = Some(value(args, i, flag)?);
                i += 1;
            },
            "--seed" => {
                out.seed = value(args, i, flag)?;
                i += 1;
            },
            "--width" | "-w" => {
                out.width = value(args, i, flag)?;
                i += 1;
            },
            "--height" | "-h" => {
                out.height = value(args, i, flag)?;
                i += 1;
            },
            "--resolution" | "-r" => {
                let raw: String = value(args, i, flag)?;
                (out.width, out.height) = pair(&raw, 'x', flag)?;
                i += 1;
            },
            "--zoom" => {
                out.zoom = value(args, i, flag)?;
                i += 1;
            },
            "--center" => {
                let raw: String = value(args, i, flag)?;
                out.center = pair(&raw, ',', flag)?;
                i += 1;
            },
            "--radius" => {
                out.radius = Some(value(args, i, flag)?);
                i += 1;
            },
            "--blur" => {
                out.blur = Some(value(args, i, flag)?);
                i += 1;
            },
            "--min-opacity" => {
                out.min_opacity = Some(value(args, i, flag)?);
                i += 1;
            },
            "--legacy-max" => out.legacy_max = true,
            "--out" => {
                out.out = value(args, i, flag)?;
                i += 1;
            },
            "--help" => {
                print_help();
                return Ok(None);
            },
            other => {
                return Err(HeatError::InvalidArgument(format!(
                    "unknown option '{}' (try --help)",
                    other
                )));
            },
        }
        i += 1;
    }

    Ok(Some(out))
}

/// File options with command line overrides applied
fn layer_options(args: &Args) -> Result<HeatOptions> {
    let mut options = match &args.options {
        Some(path) => HeatOptions::load(path)?,
        None => HeatOptions::default(),
    };
    if let Some(r) = args.radius {
        options.radius = r;
    }
    if let Some(b) = args.blur {
        options.blur = b;
    }
    if let Some(a) = args.min_opacity {
        options.min_opacity = a;
    }
    if args.legacy_max {
        options.max_intensity = MaxIntensity::LegacyFixed;
    }
    Ok(options)
}

fn run() -> Result<()> {
    let argv: Vec<String> = std::env::args().collect();
    let Some(args) = parse_args(&argv)? else {
        return Ok(());
    };

    let options = layer_options(&args)?;
    let mut points = match &args.points {
        Some(path) => load_points(path)?,
        None => Vec::new(),
    };
    if args.points.is_none() || args.demo.is_some() {
        let count = args.demo.unwrap_or(DEFAULT_DEMO_POINTS);
        let extent = args.width.min(args.height) as f64 / 2.0 / args.zoom.exp2();
        points.extend(demo_points(count, args.seed, extent));
        log::info!("generated {} demo point(s), seed {}", count, args.seed);
    }

    let viewport = PlanarViewport::new(args.width, args.height)
        .with_center(args.center.0, args.center.1)
        .with_zoom(args.zoom);
    let mut layer = HeatLayerController::new(points, options);
    layer.attach(viewport);

    let surface = layer
        .surface()
        .ok_or_else(|| HeatError::InvalidArgument("layer has no surface".to_string()))?;
    save_png(surface, &args.out)?;

    if let Some(stats) = layer.last_stats() {
        println!(
            "{} points -> {} cells (max {:.2}, {} culled, {} dropped), {} pixels covered",
            stats.input,
            stats.cells,
            stats.max,
            stats.culled,
            stats.dropped + stats.unprojected,
            surface.covered_pixels()
        );
    }
    println!("Wrote {}", args.out.display());
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("heatwall: {}", e);
        std::process::exit(1);
    }
}
