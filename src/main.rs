//! Pixelprey is a small natural-selection habitat simulation.
//!
//! A bounded square habitat holds four kinds of organisms: plants, which sit
//! around photosynthesizing, and herbivores, omnivores and carnivores, which
//! hunt whatever their prey set allows. Every tick each organism picks its
//! nearest neighbour, chases it if it is prey or wanders otherwise, settles
//! collisions by eating or being eaten, pays (or gathers) energy on an
//! age-dependent curve, and reproduces once it has stockpiled enough. The
//! bigger, fitter organisms tend to survive; the run ends when the habitat
//! collapses to a single non-plant survivor or the tick budget runs out.
//!
//! # Hacking
//! The per-tick rules live in the organism module, the orchestration in the
//! app module. Rendering and statistics are sinks behind small traits, so
//! the simulation itself can be stepped headless (the tests do). All knobs
//! sit in the config module.

use opengl_graphics::{GlGraphics, OpenGL};
use sdl2_window::Sdl2Window as Window;

use piston::event_loop::{EventSettings, Events};
use piston::input;
use piston::input::mouse::MouseCursorEvent;
use piston::input::{ButtonEvent, RenderEvent, UpdateEvent};
use piston::window::WindowSettings;

use tracing::info;

mod config;
use config::Config;

mod organism;

mod app;
use app::App;

mod clock;
use clock::{Clock, ClockState};

mod renderer;
use renderer::{Renderer, Scene};

mod stats;
use stats::CsvStats;

// coordinates:
// habitat positions live in [-window_size, window_size] on both axes,
// the window maps that square onto its full client area.

fn main() {
    let config = Config::default();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.event_log {
            tracing_subscriber::EnvFilter::new("pixelprey=debug")
        } else {
            tracing_subscriber::EnvFilter::new("pixelprey=info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // fixme: i don't want to manually be guessing opengl versions
    let opengl = OpenGL::V4_5;

    let mut window: Window = WindowSettings::new("pixelprey", [700, 700])
        .graphics_api(opengl)
        .exit_on_esc(true)
        .build()
        .unwrap();

    let mut scene = Scene::new();
    let mut stats = CsvStats::create("report.csv").unwrap();

    let seed = 1234;
    let mut runs: u64 = 0;
    let mut app = match App::new(config.clone(), seed, &mut scene) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    let mut clock = Clock::new(config.tick_budget);
    clock.start(app.living_consumers());
    info!(seed, "simulation started");

    let mut render = Renderer {
        gl: GlGraphics::new(opengl),
        mousepos: [0.; 2],
        window_size: config.window_size,
    };
    let mut winsize = [700., 700.];

    let ts = opengl_graphics::TextureSettings::new();

    // font_kit is a bit "heavy" i only need font loading, could not really find a good other lib
    // for that though.
    use font_kit::family_name::FamilyName;
    use font_kit::handle::Handle;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let fontprops = Properties::new();
    let fontfam = [
        FamilyName::Title("FiraCode".to_owned()),
        FamilyName::SansSerif,
    ];
    let handle = SystemSource::new()
        .select_best_match(&fontfam, &fontprops)
        .unwrap();
    let fontdata: Result<std::path::PathBuf, Vec<u8>> = match handle {
        Handle::Path { path, .. } => Ok(path),
        Handle::Memory { bytes, .. } => Err((*bytes).clone()),
    };
    let mut cache = match fontdata.as_ref() {
        Ok(path) => opengl_graphics::GlyphCache::new(path, (), ts).unwrap(),
        Err(bytes) => opengl_graphics::GlyphCache::from_bytes(bytes, (), ts).unwrap(),
    };

    // input and event handling.
    let mut speed = 1;
    let mut pause = false;
    let mut hyper = false;

    let mut settings = EventSettings::new();
    settings.ups = config.ticks_per_second;
    let mut events = Events::new(settings);
    while let Some(e) = events.next(&mut window) {
        if let Some(args) = e.button_args() {
            match args.button {
                input::Button::Keyboard(input::keyboard::Key::R) => {
                    if args.state == input::ButtonState::Release {
                        app.report()
                    }
                }
                input::Button::Keyboard(input::keyboard::Key::NumPadPlus) => {
                    if args.state == input::ButtonState::Release {
                        speed += 1;
                        println!("now running {} ticks per update", speed);
                    }
                }
                input::Button::Keyboard(input::keyboard::Key::NumPadMinus) => {
                    if args.state == input::ButtonState::Release {
                        if speed > 1 {
                            speed -= 1;
                        }
                        println!("now running {} ticks per update", speed);
                    }
                }
                input::Button::Keyboard(input::keyboard::Key::Space) => {
                    if args.state == input::ButtonState::Release {
                        pause = !pause;
                        println!("pausing {}", pause);
                    }
                }
                input::Button::Keyboard(input::keyboard::Key::H) => {
                    if args.state == input::ButtonState::Release {
                        hyper = !hyper;
                        if hyper {
                            println!("HYPERSPEED");
                        } else {
                            println!("regular speed");
                        }
                    }
                }
                input::Button::Keyboard(k) => {
                    println!("unhandled keypress: {:?} ({:?})", k, args.button);
                }
                input::Button::Mouse(input::mouse::MouseButton::Left) => {
                    if args.state == input::ButtonState::Release && clock.is_running() {
                        let ws = config.window_size;
                        let pos = [
                            render.mousepos[0] / winsize[0] * 2. * ws - ws,
                            render.mousepos[1] / winsize[1] * 2. * ws - ws,
                        ];
                        app.spawn_clicked(pos, &mut scene);
                    }
                }
                input::Button::Mouse(_) => (),
                input::Button::Controller(_) => (),
                input::Button::Hat(_) => (),
            }
        }
        if let Some(args) = e.mouse_cursor_args() {
            render.mousepos = args;
        }
        if let Some(args) = e.render_args() {
            winsize = args.window_size;
            let [plants, herbivores, omnivores, carnivores] = app.counts();
            let hud = format!(
                "tick {} / {}\nplants {}  herbivores {}  omnivores {}  carnivores {}",
                clock.tick(),
                clock.budget(),
                plants,
                herbivores,
                omnivores,
                carnivores,
            );
            render.render(&scene, &hud, &args, &mut cache);
        }

        if e.update_args().is_some() && !pause {
            let times = if hyper { 50 * speed } else { speed };
            for _ in 0..times {
                if clock.state() != ClockState::Running {
                    break;
                }
                app.update(&mut scene, &mut stats);
                if clock.tick_done(app.living_consumers()) == ClockState::Finished {
                    info!(
                        tick = clock.tick(),
                        survivors = app.living_consumers(),
                        "simulation finished"
                    );
                    app.report();
                    app.undraw_all(&mut scene);
                    if config.loop_simulation {
                        runs += 1;
                        app = App::new(config.clone(), seed + runs, &mut scene)
                            .expect("config was valid for the first run");
                        clock = Clock::new(config.tick_budget);
                        clock.start(app.living_consumers());
                        info!(run = runs, "simulation restarted");
                    }
                }
            }
        }
    }
    println!("goodbye!");
}
