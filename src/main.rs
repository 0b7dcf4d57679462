//! Lane Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop. On the
//! web the scene/camera layer lives in JS and talks to the core through the
//! exported functions below; natively the binary runs a headless autopilot
//! session and records the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use glam::DVec3;
    use lane_dash::App;
    use lane_dash::assets::{AssetError, AssetEvent, AssetTarget};
    use lane_dash::consts::STEP;
    use lane_dash::leaderboard::format_time;
    use lane_dash::persistence::LocalStorage;
    use lane_dash::sim::{SessionEvent, SessionState};
    use lane_dash::tuning::Tuning;
    use lane_dash::ui::{SceneSnapshot, WarningLevel};

    /// Game instance holding all state
    struct Game {
        app: App<LocalStorage>,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
    }

    fn with_game(f: impl FnOnce(&mut Game)) {
        GAME.with(|slot| {
            if let Some(game) = slot.borrow().as_ref() {
                f(&mut game.borrow_mut());
            }
        });
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                app: App::new(Tuning::default(), seed, LocalStorage),
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        fn update(&mut self, dt: f64, time: f64) -> Vec<SessionEvent> {
            let events = self.app.frame(dt);

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
            events
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.app.hud();
            let set_text = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            let set_class = |id: &str, class: &str| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", class);
                }
            };

            set_text("#hud-distance .hud-value", &format!("{:.0} m", hud.distance));
            set_text("#hud-score .hud-value", &hud.score.to_string());
            set_text("#hud-time .hud-value", &format_time(hud.elapsed));
            set_text("#hud-speed .hud-value", &format!("{:.0} km/h", hud.speed_kmh));
            set_text(
                "#hud-health .hud-value",
                &format!("{:.0}%", hud.health_pct * 100.0),
            );
            if self.app.settings.show_fps {
                set_text("#hud-fps .hud-value", &self.fps.to_string());
            }

            let flash = self.app.settings.effective_warning_flash();
            let warning_class = match hud.warning {
                WarningLevel::None => "hidden",
                WarningLevel::Low => "warning low",
                WarningLevel::High if flash => "warning high flash",
                WarningLevel::High => "warning high",
                WarningLevel::Critical if flash => "warning critical flash",
                WarningLevel::Critical => "warning critical",
            };
            set_class("warning-overlay", warning_class);

            let visible = |shown: bool| if shown { "" } else { "hidden" };
            set_class("start-menu", visible(hud.state == SessionState::Idle));
            set_class("hud", visible(hud.state.is_racing()));
            set_class("game-over", visible(hud.state == SessionState::GameOver));
            set_class("completed", visible(hud.state == SessionState::Completed));

            if let Some(stats) = self.app.session.last_run() {
                set_text("#final-time", &format_time(stats.elapsed));
                set_text("#final-distance", &format!("{:.0} m", stats.distance));
                set_text(
                    "#final-avg-speed",
                    &format!("{:.0} km/h", lane_dash::to_kmh(stats.average_speed)),
                );
                set_text("#final-collisions", &stats.collisions.to_string());
                set_text("#final-score", &stats.score.to_string());
                let rank = self
                    .app
                    .last_rank
                    .map(|r| format!("#{r}"))
                    .unwrap_or_else(|| "-".to_string());
                set_text("#final-rank", &rank);
            }
        }

        fn render_leaderboard(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(list) = document.get_element_by_id("leaderboard-list") {
                let rows: String = self
                    .app
                    .leaderboard
                    .entries()
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        format!(
                            "<li><span>{}. {}</span><span>{}</span><span>{} hits</span></li>",
                            i + 1,
                            escape_html(&e.name),
                            format_time(e.time),
                            e.collisions
                        )
                    })
                    .collect();
                list.set_inner_html(&rows);
            }
        }
    }

    fn escape_html(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    /// Scene layer: a model finished loading
    #[wasm_bindgen]
    pub fn on_model_ready(target: &str, half_x: f64, half_y: f64, half_z: f64) {
        let Some(target) = parse_target(target) else {
            log::warn!("Unknown asset target '{}'", target);
            return;
        };
        with_game(|g| {
            g.app.on_asset_event(AssetEvent::Ready {
                target,
                half_extents: DVec3::new(half_x, half_y, half_z),
            })
        });
    }

    /// Scene layer: a model failed to load
    #[wasm_bindgen]
    pub fn on_model_failed(target: &str, name: &str, reason: &str) {
        let Some(target) = parse_target(target) else {
            return;
        };
        with_game(|g| {
            g.app.on_asset_event(AssetEvent::Failed {
                target,
                error: AssetError::LoadFailed {
                    name: name.to_string(),
                    reason: reason.to_string(),
                },
            })
        });
    }

    /// Camera layer: the intro sweep finished early
    #[wasm_bindgen]
    pub fn on_intro_complete() {
        with_game(|g| {
            g.app.session.transition_complete();
        });
    }

    /// Scene layer: poses for this frame as JSON
    #[wasm_bindgen]
    pub fn scene_json() -> String {
        let mut json = String::from("null");
        with_game(|g| {
            json = serde_json::to_string(&SceneSnapshot::from_session(&g.app.session))
                .unwrap_or_else(|_| "null".to_string());
        });
        json
    }

    fn parse_target(target: &str) -> Option<AssetTarget> {
        match target {
            "vehicle" => Some(AssetTarget::Vehicle),
            "obstacle" => Some(AssetTarget::Obstacle),
            _ => None,
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Lane Dash starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        GAME.with(|slot| *slot.borrow_mut() = Some(game.clone()));
        log::info!("Game initialized with seed: {}", seed);

        game.borrow().render_leaderboard();
        if let Some(input) = document
            .get_element_by_id("player-name")
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            input.set_value(&game.borrow().app.settings.player_name);
        }

        setup_input_handlers(game.clone());
        setup_buttons(game.clone());
        setup_auto_release(game.clone());

        request_animation_frame(game);

        log::info!("Lane Dash running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        for (event_name, pressed) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if g.app.input.handle_key(&key, pressed) {
                    event.prevent_default();
                    return;
                }
                if !pressed {
                    return;
                }
                match key.as_str() {
                    " " | "Enter" => match g.app.state() {
                        SessionState::Idle => {
                            g.app.start();
                        }
                        SessionState::GameOver | SessionState::Completed => {
                            g.app.reset();
                        }
                        _ => {}
                    },
                    "Escape" => {
                        g.app.quit();
                    }
                    "p" | "P" => {
                        g.app.input.autopilot = !g.app.input.autopilot;
                        log::info!("Autopilot: {}", g.app.input.autopilot);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Start button (plays the intro)
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                let name_input = web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.get_element_by_id("player-name"))
                    .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok());
                if let Some(input) = name_input {
                    g.app.settings.set_player_name(&input.value());
                    g.app.save_settings();
                }
                g.app.start();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Restart buttons (skip the intro)
        for id in ["restart-btn", "play-again-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                    game.borrow_mut().app.reset();
                });
                let _ = btn
                    .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        // Menu button
        if let Some(btn) = document.get_element_by_id("menu-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().app.quit();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Held keys never see their keyup when focus is lost
    fn setup_auto_release(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().app.input.release_all();
                    log::info!("Inputs released (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().app.input.release_all();
                log::info!("Inputs released (window blur)");
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time (the clock clamps hitches)
            let dt = if g.last_time > 0.0 {
                (time - g.last_time) / 1000.0
            } else {
                STEP
            };
            g.last_time = time;

            let events = g.update(dt, time);
            if events
                .iter()
                .any(|e| matches!(e, SessionEvent::Finished(_)))
            {
                g.render_leaderboard();
            }
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use lane_dash::consts::DEMO_SEED;
    use lane_dash::leaderboard::format_time;
    use lane_dash::persistence::FileStorage;
    use lane_dash::sim::{ControlScheme, SessionState};
    use lane_dash::{App, Tuning, to_kmh};

    /// Simulated display refresh for the headless run
    const FRAME_DT: f64 = 1.0 / 60.0;
    /// Give up after this much simulated time
    const MAX_SECONDS: f64 = 20.0 * 60.0;

    struct Options {
        tuning_path: Option<String>,
        seed: u64,
        name: Option<String>,
        scheme: Option<ControlScheme>,
        data_dir: String,
        print_tuning: bool,
    }

    fn parse_args() -> Options {
        let mut options = Options {
            tuning_path: None,
            seed: DEMO_SEED,
            name: None,
            scheme: None,
            data_dir: ".lane-dash".to_string(),
            print_tuning: false,
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--tuning" => options.tuning_path = args.next(),
                "--seed" => match args.next().and_then(|s| s.parse().ok()) {
                    Some(seed) => options.seed = seed,
                    None => log::warn!("--seed expects an integer, keeping {}", options.seed),
                },
                "--name" => options.name = args.next(),
                "--scheme" => options.scheme = args.next().and_then(|s| ControlScheme::from_str(&s)),
                "--print-tuning" => options.print_tuning = true,
                "--data" => {
                    if let Some(dir) = args.next() {
                        options.data_dir = dir;
                    }
                }
                other => log::warn!("Ignoring unknown argument '{}'", other),
            }
        }
        options
    }

    fn load_tuning(path: Option<&str>) -> Tuning {
        let Some(path) = path else {
            return Tuning::default();
        };
        match std::fs::read_to_string(path) {
            Ok(json) => match Tuning::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path);
                    tuning
                }
                Err(e) => {
                    log::warn!("{}; using default tuning", e);
                    Tuning::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {}: {}; using default tuning", path, e);
                Tuning::default()
            }
        }
    }

    pub fn run() {
        log::info!("Lane Dash (native) starting...");
        let options = parse_args();
        let tuning = load_tuning(options.tuning_path.as_deref());
        if options.print_tuning {
            match tuning.to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => log::warn!("Could not serialize tuning: {}", e),
            }
            return;
        }

        let mut app = App::new(tuning, options.seed, FileStorage::new(&options.data_dir));
        if let Some(name) = &options.name {
            app.settings.set_player_name(name);
        }
        if let Some(scheme) = options.scheme {
            app.settings.control_scheme = scheme;
        }
        app.save_settings();
        log::info!("Headless run: default collision volumes, autopilot driving");

        app.input.autopilot = true;
        app.start();

        let mut simulated = 0.0;
        while !app.state().is_terminal() && simulated < MAX_SECONDS {
            app.frame(FRAME_DT);
            simulated += FRAME_DT;
        }

        let hud = app.hud();
        match app.session.last_run() {
            Some(stats) => {
                let outcome = if app.state() == SessionState::Completed {
                    "Completed"
                } else {
                    "Game over"
                };
                println!("\n{outcome} (seed {})", stats.seed);
                println!("  controls   {}", app.session.control_scheme().as_str());
                println!("  time       {}", format_time(stats.elapsed));
                println!("  distance   {:.1} m", stats.distance);
                println!("  avg speed  {:.1} km/h", to_kmh(stats.average_speed));
                println!("  collisions {}", stats.collisions);
                println!("  score      {}", stats.score);
                if let Some(rank) = app.last_rank {
                    println!("  rank       #{rank}");
                }
            }
            None => println!(
                "\nRun still going after {:.0}s at {:.0} m",
                simulated, hud.distance
            ),
        }

        if !app.leaderboard.is_empty() {
            println!("\nLeaderboard");
            for (i, entry) in app.leaderboard.entries().iter().enumerate() {
                println!(
                    "  {:>2}. {:<16} {}  {} hits  {}",
                    i + 1,
                    entry.name,
                    format_time(entry.time),
                    entry.collisions,
                    entry.score
                );
            }
        }
    }
}
