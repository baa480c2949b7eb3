//! Space Defender entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, KeyboardEvent};

    use space_defender::audio::{AudioManager, SoundEffect, SoundRequest, service};
    use space_defender::consts::*;
    use space_defender::format_elapsed;
    use space_defender::highscores::HighScores;
    use space_defender::platform::{Key, KeyState, LoopControl, SessionScope};
    use space_defender::renderer::SdfRenderState;
    use space_defender::sim::{
        Arena, FrameSnapshot, GamePhase, GameState, SessionObserver, TargetKind, tick,
    };
    use space_defender::{Settings, Tuning};

    /// Frames keep rendering this long after game over so the hit flash fades
    const GAME_OVER_LINGER_MS: f64 = 1000.0;

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
        /// Browser registrations of the running session
        static SESSION: RefCell<Option<SessionScope>> = const { RefCell::new(None) };
    }

    fn js_err(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Presents session notifications in the DOM
    struct HudObserver<'a> {
        document: &'a Document,
        audio: &'a AudioManager,
        highscores: &'a mut HighScores,
        level: u32,
    }

    impl SessionObserver for HudObserver<'_> {
        fn on_score_change(&mut self, score: u64) {
            set_text(self.document, "#hud-score .hud-value", &score.to_string());
        }

        fn on_level_change(&mut self, level: u32) {
            self.level = level;
            set_text(self.document, "#hud-level .hud-value", &level.to_string());
        }

        fn on_game_over(&mut self, final_score: u64, elapsed_secs: u32) {
            set_visible(self.document, "game-over", true);
            set_text(self.document, "#final-score", &final_score.to_string());
            set_text(self.document, "#final-time", &format_elapsed(elapsed_secs));
            set_text(self.document, "#final-level", &self.level.to_string());

            let rank = self.highscores.add_score(
                final_score,
                self.level,
                elapsed_secs,
                js_sys::Date::now(),
            );
            set_visible(self.document, "new-high-score", rank.is_some());
            if let Some(rank) = rank {
                log::info!("New high score #{}: {}", rank, final_score);
                self.highscores.save();
                self.audio.play(SoundEffect::HighScore);
            }
            if let Some(best) = self.highscores.top_score() {
                set_text(self.document, "#hud-best .hud-value", &best.to_string());
            }
        }

        fn on_target_destroyed(&mut self, kind: TargetKind, split: bool) {
            log::debug!("{:?} {}", kind, if split { "split" } else { "destroyed" });
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        /// Last frame the simulation presented
        snapshot: FrameSnapshot,
        render_state: Option<SdfRenderState>,
        document: Document,
        keys: KeyState,
        accumulator: f32,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        /// Page time (ms) of the first frame after game over
        game_over_at: Option<f64>,
        settings: Settings,
        highscores: HighScores,
        audio: Rc<RefCell<AudioManager>>,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning, document: Document) -> Self {
            let state = GameState::new(seed, Arena::default(), tuning);
            let settings = Settings::load();
            let mut audio = AudioManager::new();
            audio.apply_settings(&settings);

            Self {
                snapshot: FrameSnapshot::new(&state),
                state,
                render_state: None,
                document,
                keys: KeyState::new(),
                accumulator: 0.0,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                game_over_at: None,
                settings,
                highscores: HighScores::load(),
                audio: Rc::new(RefCell::new(audio)),
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.keys.take_tick_input();
                tick(&mut self.state, &input, &mut self.snapshot);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

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
        }

        /// Render the last presented frame
        fn render(&mut self, time: f64) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            // The snapshot is taken before collisions, so the phase comes from the live state
            let mut frame = self.snapshot.view();
            frame.phase = self.state.phase;

            match render_state.render(&frame, &self.settings, time) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Play sounds for and present everything the simulation reported
        fn flush_events(&mut self) {
            let audio = self.audio.borrow();
            for effect in self.state.events.iter().filter_map(SoundEffect::for_event) {
                audio.play(effect);
            }

            let mut hud = HudObserver {
                document: &self.document,
                audio: &audio,
                highscores: &mut self.highscores,
                level: self.state.level,
            };
            self.state.dispatch_events(&mut hud);
        }

        /// Per-frame HUD values that are not event driven
        fn update_hud(&self) {
            set_text(
                &self.document,
                "#hud-time .hud-value",
                &format_elapsed(self.state.elapsed_secs),
            );
            set_visible(
                &self.document,
                "sound-pending",
                self.audio.borrow().fire_slot().is_pending(),
            );
            set_visible(&self.document, "hud-fps", self.settings.show_fps);
            if self.settings.show_fps {
                set_text(&self.document, "#hud-fps .hud-value", &self.fps.to_string());
            }
        }

        /// Reset every HUD field to the values of a fresh session
        fn reset_hud(&self) {
            set_text(&self.document, "#hud-score .hud-value", &self.state.score.to_string());
            set_text(&self.document, "#hud-level .hud-value", &self.state.level.to_string());
            let best = self.highscores.top_score().unwrap_or(0);
            set_text(&self.document, "#hud-best .hud-value", &best.to_string());
            self.update_mute_indicator();
            set_visible(&self.document, "game-over", false);
            set_visible(&self.document, "new-high-score", false);
            self.update_hud();
        }

        fn update_mute_indicator(&self) {
            let label = if self.audio.borrow().is_muted() { "off" } else { "on" };
            set_text(&self.document, "#hud-sound .hud-value", label);
        }

        /// One animation frame; stops the loop once the game-over frame has settled
        fn frame(&mut self, time: f64) -> LoopControl {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;

            self.update(dt, time);
            self.render(time);
            self.flush_events();
            self.update_hud();

            match self.state.phase {
                GamePhase::Running => LoopControl::Continue,
                GamePhase::GameOver => {
                    let since = *self.game_over_at.get_or_insert(time);
                    if time - since < GAME_OVER_LINGER_MS {
                        LoopControl::Continue
                    } else {
                        LoopControl::Stop
                    }
                }
            }
        }

        fn on_key_down(&mut self, event: &KeyboardEvent) {
            let Some(key) = self.keys.key_down(&event.key(), event.repeat()) else {
                return;
            };
            event.prevent_default();
            // First gesture unlocks audio
            self.audio.borrow().resume();

            if key == Key::Mute {
                self.settings.muted = self.audio.borrow_mut().toggle_mute();
                self.settings.save();
                self.update_mute_indicator();
            }
        }

        fn on_key_up(&mut self, event: &KeyboardEvent) {
            if self.keys.key_up(&event.key()).is_some() {
                event.prevent_default();
            }
        }

        /// Reset game state for restart
        fn restart(&mut self, seed: u64) {
            self.state.restart(seed);
            self.snapshot = FrameSnapshot::new(&self.state);
            self.keys.release_all();
            self.accumulator = 0.0;
            self.last_time = 0.0;
            self.game_over_at = None;
            self.reset_hud();
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(js_err)?;

        log::info!("Space Defender starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        set_visible(&document, "loading", false);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let tuning = Tuning::load();
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, tuning, document.clone())));
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(js_err)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(js_err)?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let arena = game.borrow().state.arena;
        let mut render_state = SdfRenderState::new(surface, &adapter, width, height, arena)
            .await
            .map_err(js_err)?;
        render_state.set_start_time(js_sys::Date::now());
        game.borrow_mut().render_state = Some(render_state);

        setup_restart_button(game.clone());
        setup_sound_form(&document);
        setup_resize(&canvas, game.clone());

        game.borrow().reset_hud();
        set_visible(&document, "hud", true);

        GAME.with(|g| *g.borrow_mut() = Some(game.clone()));
        start_session(&game)?;

        log::info!("Space Defender running!");
        Ok(())
    }

    /// Register the session's listeners, timers and frame loop, releasing
    /// whatever the previous session registered first
    fn start_session(game: &Rc<RefCell<Game>>) -> Result<(), JsValue> {
        drop(SESSION.with(|s| s.borrow_mut().take()));

        let window = web_sys::window().ok_or("no window")?;
        let level_ms = game
            .borrow()
            .state
            .tuning
            .level_interval_secs
            .saturating_mul(1000)
            .min(i32::MAX as u32) as i32;

        let mut scope = SessionScope::new();

        // Keyboard
        {
            let game = game.clone();
            scope.listen(&window, "keydown", move |event| {
                if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                    game.borrow_mut().on_key_down(event);
                }
            })?;
        }
        {
            let game = game.clone();
            scope.listen(&window, "keyup", move |event| {
                if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                    game.borrow_mut().on_key_up(event);
                }
            })?;
        }
        // Key-up events are lost while the window is unfocused
        {
            let game = game.clone();
            scope.listen(&window, "blur", move |_event| {
                game.borrow_mut().keys.release_all();
            })?;
        }

        // Wall-clock timers
        {
            let game = game.clone();
            scope.every(&window, 1000, move || {
                game.borrow_mut().state.on_second_elapsed();
            })?;
        }
        {
            let game = game.clone();
            scope.every(&window, level_ms, move || {
                game.borrow_mut().state.on_level_timer();
            })?;
        }

        {
            let game = game.clone();
            scope.run_frames(&window, move |time| game.borrow_mut().frame(time));
        }

        SESSION.with(|s| *s.borrow_mut() = Some(scope));
        Ok(())
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                drop(SESSION.with(|s| s.borrow_mut().take()));
                game.borrow_mut().restart(seed);
                if let Err(e) = start_session(&game) {
                    log::error!("Failed to start session: {:?}", e);
                    return;
                }
                log::info!("Game restarted with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Text box + button that ask the sound service for a new fire sound
    fn setup_sound_form(document: &Document) {
        let input = document
            .get_element_by_id("sound-text")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
        let (Some(input), Some(btn)) = (input, document.get_element_by_id("sound-btn")) else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            match request_fire_sound(SoundRequest::Text(input.value())) {
                Ok(()) => input.set_value(""),
                Err(e) => log::warn!("Fire sound request rejected: {:?}", e),
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let width = (canvas.client_width() as f64 * dpr) as u32;
            let height = (canvas.client_height() as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(render_state) = game.borrow_mut().render_state.as_mut() {
                render_state.resize(width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Send a request to the sound service; the result replaces the fire sound
    pub fn request_fire_sound(request: SoundRequest) -> Result<(), JsValue> {
        let request = request.validate().map_err(js_err)?;
        let game = GAME
            .with(|g| g.borrow().clone())
            .ok_or("game not started")?;
        let (audio, url) = {
            let g = game.borrow();
            (g.audio.clone(), g.settings.sound_service_url.clone())
        };
        service::request_fire_sound(audio, url, request);
        Ok(())
    }

    /// Go back to the synthesized fire sound
    pub fn reset_fire_sound() {
        if let Some(game) = GAME.with(|g| g.borrow().clone()) {
            game.borrow().audio.borrow_mut().fire_slot_mut().reset();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {:?}", e);
    }
}

/// Describe the fire sound in words
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn set_fire_sound_from_text(text: String) -> Result<(), JsValue> {
    wasm_game::request_fire_sound(space_defender::audio::SoundRequest::Text(text))
}

/// Upload a recorded clip (e.g. from MediaRecorder) describing the fire sound
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn set_fire_sound_from_clip(bytes: Vec<u8>) -> Result<(), JsValue> {
    wasm_game::request_fire_sound(space_defender::audio::SoundRequest::Clip(bytes))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn reset_fire_sound() {
    wasm_game::reset_fire_sound();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Space Defender (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    headless::run(std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(1));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Autopilot session driven by simulated wall-clock timers
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use space_defender::format_elapsed;
    use space_defender::sim::{Arena, GameState, SessionObserver, TargetKind, TickInput, tick};
    use space_defender::{HighScores, Tuning};

    /// Ticks per simulated second
    const TICKS_PER_SEC: u64 = 60;
    /// Give up after ten simulated minutes
    const MAX_TICKS: u64 = 10 * 60 * TICKS_PER_SEC;

    #[derive(Default)]
    struct ConsoleObserver {
        shots: u32,
        destroyed: u32,
        splits: u32,
        result: Option<(u64, u32)>,
    }

    impl SessionObserver for ConsoleObserver {
        fn on_level_change(&mut self, level: u32) {
            log::info!("Level {}", level);
        }

        fn on_game_over(&mut self, final_score: u64, elapsed_secs: u32) {
            self.result = Some((final_score, elapsed_secs));
        }

        fn on_fire(&mut self) {
            self.shots += 1;
        }

        fn on_target_destroyed(&mut self, _kind: TargetKind, split: bool) {
            if split {
                self.splits += 1;
            } else {
                self.destroyed += 1;
            }
        }
    }

    pub fn run(seed: u64) {
        let tuning = Tuning::load();
        let level_ticks = tuning.level_interval_secs as u64 * TICKS_PER_SEC;
        let mut state = GameState::new(seed, Arena::default(), tuning);
        let mut observer = ConsoleObserver::default();

        while state.is_running() && state.time_ticks < MAX_TICKS {
            // Sweep clockwise, firing every quarter second
            let input = TickInput {
                rotate_right: true,
                fire: state.time_ticks % 15 == 0,
                ..Default::default()
            };
            tick(&mut state, &input, &mut ());

            if state.time_ticks % TICKS_PER_SEC == 0 {
                state.on_second_elapsed();
            }
            if level_ticks > 0 && state.time_ticks % level_ticks == 0 {
                state.on_level_timer();
            }
            state.dispatch_events(&mut observer);
        }

        let (score, secs) = observer
            .result
            .unwrap_or((state.score, state.elapsed_secs));
        println!(
            "seed {}: score {} in {} (level {}), {} shots, {} destroyed, {} splits",
            seed,
            score,
            format_elapsed(secs),
            state.level,
            observer.shots,
            observer.destroyed,
            observer.splits
        );

        let mut scores = HighScores::load();
        if let Some(rank) = scores.add_score(score, state.level, secs, 0.0) {
            println!("Leaderboard rank: #{}", rank);
        }
    }
}
