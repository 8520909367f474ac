//! heatwall-viewer: interactive heatmap window (drag to pan, wheel to zoom)

use heatwall::color::Rgba;
use heatwall::display::{
    Display, InputEvent, MouseButtonKind, PixelBuffer, RenderTarget, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};
use heatwall::error::{HeatError, Result};
use heatwall::heat::{ColorStop, MaxIntensity};
use heatwall::layer::{HeatLayer, HeatLayerController, HeatOptions, PlanarViewport};
use heatwall::points::{demo_points, load_points};
use heatwall::util::FpsCounter;
use sdl2::keyboard::Keycode;
use std::path::PathBuf;

const BACKGROUND: (u8, u8, u8) = (16, 18, 28);
const BLUR_STEPS: [f64; 5] = [4.0, 8.0, 15.0, 25.0, 40.0];
const ZOOM_STEP: f64 = 0.25;

type Layer = HeatLayerController<PlanarViewport>;

struct Args {
    points: Option<PathBuf>,
    options: Option<PathBuf>,
    demo: usize,
    seed: u64,
    width: u32,
    height: u32,
    vsync: bool,
    #[cfg(feature = "mqtt")]
    mqtt: Option<String>,
    #[cfg(feature = "mqtt")]
    topic: String,
}

fn flag_value(args: &[String], i: usize) -> Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| HeatError::InvalidArgument(format!("{} needs a value", args[i])))
}

fn parse_args() -> Result<Option<Args>> {
    let args: Vec<String> = std::env::args().collect();
    let mut out = Args {
        points: None,
        options: None,
        demo: 3000,
        seed: 1,
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        vsync: true,
        #[cfg(feature = "mqtt")]
        mqtt: None,
        #[cfg(feature = "mqtt")]
        topic: heatwall::mqtt::DEFAULT_TOPIC.to_string(),
    };

    let next = |i: usize| flag_value(&args, i);
    let bad = |i: usize| HeatError::InvalidArgument(format!("{}: invalid value", args[i]));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => out.vsync = false,
            "--points" => {
                out.points = Some(PathBuf::from(next(i)?));
                i += 1;
            },
            "--options" => {
                out.options = Some(PathBuf::from(next(i)?));
                i += 1;
            },
            "--demo" => {
                out.demo = next(i)?.parse().map_err(|_| bad(i))?;
                i += 1;
            },
            "--seed" => {
                out.seed = next(i)?.parse().map_err(|_| bad(i))?;
                i += 1;
            },
            "--width" | "-w" => {
                out.width = next(i)?.parse().map_err(|_| bad(i))?;
                i += 1;
            },
            "--height" | "-h" => {
                out.height = next(i)?.parse().map_err(|_| bad(i))?;
                i += 1;
            },
            #[cfg(feature = "mqtt")]
            "--mqtt" => {
                out.mqtt = Some(next(i)?.to_string());
                i += 1;
            },
            #[cfg(feature = "mqtt")]
            "--topic" => {
                out.topic = next(i)?.to_string();
                i += 1;
            },
            "--help" => {
                println!("Usage: heatwall-viewer [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --points FILE         Load points from a JSON file");
                println!("  --demo N              Demo points when no file is given (default: 3000)");
                println!("  --seed S              Demo seed (default: 1)");
                println!("  --options FILE        Load layer options from a JSON file");
                println!("  --width W, -w W       Window width (default: {})", DEFAULT_WIDTH);
                println!("  --height H, -h H      Window height (default: {})", DEFAULT_HEIGHT);
                println!("  --no-vsync            Disable VSync");
                #[cfg(feature = "mqtt")]
                {
                    println!("  --mqtt HOST[:PORT]    Append points received over MQTT");
                    println!("  --topic TOPIC         MQTT topic (default: {})", heatwall::mqtt::DEFAULT_TOPIC);
                }
                println!("  --help                Show this help message");
                return Ok(None);
            },
            other => {
                return Err(HeatError::InvalidArgument(format!("unknown option '{}'", other)));
            },
        }
        i += 1;
    }
    Ok(Some(out))
}

/// Gradients cycled with G; `None` is the built-in blue -> red
fn gradient_presets() -> Vec<Option<Vec<ColorStop>>> {
    vec![
        None,
        Some(vec![
            ColorStop::new(0.0, Rgba::rgb(0, 0, 0)),
            ColorStop::new(0.45, Rgba::rgb(200, 30, 0)),
            ColorStop::new(0.75, Rgba::rgb(255, 200, 0)),
            ColorStop::new(1.0, Rgba::rgb(255, 255, 255)),
        ]),
        Some(vec![
            ColorStop::new(0.0, Rgba::rgb(68, 1, 84)),
            ColorStop::new(0.5, Rgba::rgb(33, 145, 140)),
            ColorStop::new(1.0, Rgba::rgb(253, 231, 37)),
        ]),
        Some(vec![
            ColorStop::new(0.2, Rgba::rgb(40, 40, 60)),
            ColorStop::new(1.0, Rgba::rgb(240, 240, 255)),
        ]),
    ]
}

/// Apply an option change through the layer so the renderer follows
fn tweak(layer: &mut Layer, f: impl FnOnce(&mut HeatOptions)) {
    let mut options = layer.options().clone();
    f(&mut options);
    log::info!(
        "options: radius={} blur={} maxIntensity={:?}",
        options.radius,
        options.blur,
        options.max_intensity
    );
    layer.set_options(options);
}

fn run() -> Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let options = match &args.options {
        Some(path) => HeatOptions::load(path)?,
        None => HeatOptions::default(),
    };
    let points = match &args.points {
        Some(path) => load_points(path)?,
        None => demo_points(args.demo, args.seed, args.width.min(args.height) as f64 / 2.0),
    };

    #[cfg(feature = "mqtt")]
    let feed = match &args.mqtt {
        Some(addr) => {
            let (host, port) = match addr.rsplit_once(':') {
                Some((h, p)) => (
                    h,
                    p.parse()
                        .map_err(|_| HeatError::InvalidArgument(format!("--mqtt: bad port '{}'", p)))?,
                ),
                None => (addr.as_str(), heatwall::mqtt::DEFAULT_PORT),
            };
            Some(heatwall::mqtt::PointFeed::connect(host, port, &args.topic)?)
        },
        None => None,
    };

    let (mut display, texture_creator) =
        Display::with_options("heatwall", args.width, args.height, args.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, args.width, args.height)?;

    let mut layer: Layer = HeatLayerController::new(points, options);
    layer.attach(PlanarViewport::new(args.width, args.height));

    let gradients = gradient_presets();
    let mut gradient_index = 0;
    let mut blur_index = 2;
    let mut fps_counter = FpsCounter::new(60);
    let mut show_fps = false;
    let mut fps_timer = 0.0;
    let mut dragging = false;
    let mut mouse = (0, 0);
    let empty = PixelBuffer::new();

    log::info!("heatwall-viewer {}x{}", args.width, args.height);
    println!("Controls: drag pan, wheel zoom, +/- radius, B blur, G gradient, M max policy, F fps, Esc quit");

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::Plus | Keycode::Equals | Keycode::KpPlus => {
                        tweak(&mut layer, |o| o.radius += 2.0);
                    },
                    Keycode::Minus | Keycode::KpMinus => {
                        tweak(&mut layer, |o| o.radius = (o.radius - 2.0).max(1.0));
                    },
                    Keycode::B => {
                        blur_index = (blur_index + 1) % BLUR_STEPS.len();
                        tweak(&mut layer, |o| o.blur = BLUR_STEPS[blur_index]);
                    },
                    Keycode::G => {
                        gradient_index = (gradient_index + 1) % gradients.len();
                        let stops = gradients[gradient_index].clone();
                        tweak(&mut layer, |o| o.gradient = stops);
                    },
                    Keycode::M => tweak(&mut layer, |o| {
                        o.max_intensity = match o.max_intensity {
                            MaxIntensity::Computed => MaxIntensity::LegacyFixed,
                            MaxIntensity::LegacyFixed => MaxIntensity::Computed,
                        };
                    }),
                    Keycode::F => show_fps = !show_fps,
                    _ => {},
                },
                InputEvent::MouseDown {
                    button: MouseButtonKind::Left,
                    ..
                } => dragging = true,
                InputEvent::MouseUp {
                    button: MouseButtonKind::Left,
                    ..
                } => {
                    if dragging {
                        dragging = false;
                        // Pan finished
                        layer.on_viewport_changed();
                    }
                },
                InputEvent::MouseMove { x, y, dx, dy } => {
                    mouse = (x, y);
                    if dragging {
                        if let Some(vp) = layer.host_mut() {
                            vp.pan_by(dx as f64, dy as f64);
                        }
                        layer.request_redraw();
                    }
                },
                InputEvent::Wheel(clicks) => {
                    if let Some(vp) = layer.host_mut() {
                        vp.zoom_about(clicks as f64 * ZOOM_STEP, (mouse.0 as f64, mouse.1 as f64));
                    }
                    layer.on_viewport_changed();
                },
                InputEvent::Resized { width, height } => {
                    if let Some(vp) = layer.host_mut() {
                        vp.resize(width, height);
                    }
                    target = RenderTarget::with_size(&texture_creator, width, height)?;
                    layer.on_viewport_changed();
                },
                _ => {},
            }
        }

        #[cfg(feature = "mqtt")]
        if let Some(feed) = &feed {
            let incoming = feed.poll();
            if !incoming.is_empty() {
                log::debug!("mqtt: {} new point(s)", incoming.len());
                layer.extend_points(incoming);
            }
        }

        let frame_due = layer.host_mut().is_some_and(|vp| vp.take_frame_request());
        if frame_due {
            layer.on_frame();
        }

        if show_fps {
            fps_timer += dt;
            if fps_timer >= 1.0 {
                fps_timer = 0.0;
                let (min_fps, max_fps) = fps_counter.min_max_fps();
                let cells = layer.last_stats().map_or(0, |s| s.cells);
                log::info!(
                    "fps {:.0} avg {:.0} min {:.0} max, {:.1}ms, {} cells",
                    avg_fps,
                    min_fps,
                    max_fps,
                    fps_counter.avg_frame_time_ms(),
                    cells
                );
            }
        }

        display.present(&mut target, layer.surface().unwrap_or(&empty), BACKGROUND)?;
    }

    layer.detach();
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("heatwall-viewer: {}", e);
        std::process::exit(1);
    }
}
