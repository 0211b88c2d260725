//! One visualization session.
//!
//! `GameInstance` owns the renderer and every renderable of a match, drives
//! the turn clock and routes input to playback and the viewport.

mod perf;
mod playback;

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat3, Vec2};
use pw_engine::input::{InputEvent, Key, KeyState, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};
use pw_engine::render::{
    IndexBuffer,
    RenderCtx,
    RenderTarget,
    Renderable,
    Renderer,
    Shader,
    ShaderContext,
    ShaderFactory,
    Texture,
    Uniform,
    Uniforms,
    VertexArray,
    VertexBuffer,
    VertexLayout,
};

pub use perf::PerfThrottle;
pub use playback::Playback;

use crate::assets::{FontAsset, GameAssets};
use crate::config::VisualizerConfig;
use crate::error::{VisualizerError, VisualizerResult};
use crate::game::{MatchLog, StateSource, TRANSFORM_PAIR};
use crate::resizer::Resizer;
use crate::text::{Align, BitmapLabelFactory, Label, LabelFactory, MsdfLabelFactory};
use crate::util::{BBox, Point};
use crate::voronoi::VoronoiBuilder;

pub const LAYER_VOR: i32 = -1;
pub const LAYER_PLANET: i32 = 1;
pub const LAYER_PLANET_LABEL: i32 = 2;
pub const LAYER_SHIP: i32 = 3;
pub const LAYER_SHIP_LABEL: i32 = 4;

/// Line height of planet labels, in world units.
const LABEL_LINE: f32 = 1.171875;
const LABEL_RAISE: f32 = 0.2;

/// Turns skipped by arrow keys while shift is held.
const FAST_STEP: isize = 5;

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 2, 3];

fn compile(factory: &ShaderFactory, name: &str, context: &ShaderContext) -> VisualizerResult<Rc<Shader>> {
    let message = RefCell::new(String::new());
    factory
        .create_shader(name, context, &|msg: &str| *message.borrow_mut() = msg.to_owned())
        .ok_or_else(|| VisualizerError::Shader {
            name: name.to_owned(),
            message: message.take(),
        })
}

fn translation(x: f32, y: f32) -> [f32; 9] {
    Mat3::from_translation(Vec2::new(x, y)).to_cols_array()
}

fn mat(pair: &[f32], half: usize) -> Option<[f32; 9]> {
    pair.get(half * 9..half * 9 + 9)?.try_into().ok()
}

/// Textured quad with corners at `(±half_w, ±1)`.
fn quad(shader: Rc<Shader>, texture: Rc<Texture>, half_w: f32, texcoords: [f32; 8], uniforms: Uniforms) -> Renderable {
    let mut pos_layout = VertexLayout::new();
    pos_layout.push_float(2, "a_position");
    let mut tex_layout = VertexLayout::new();
    tex_layout.push_float(2, "a_texcoord");

    let positions = vec![-half_w, 1.0, half_w, 1.0, -half_w, -1.0, half_w, -1.0];
    let mut va = VertexArray::new();
    va.add_buffer(VertexBuffer::vertex(positions), pos_layout)
        .add_buffer(VertexBuffer::vertex(texcoords.to_vec()), tex_layout);

    Renderable::new(IndexBuffer::index(QUAD_INDICES.to_vec()), va, shader, vec![texture], uniforms)
}

/// A match being visualized: renderables, turn clock and viewport.
pub struct GameInstance<S: StateSource = MatchLog> {
    config: VisualizerConfig,
    state: S,
    playback: Playback,
    perf: PerfThrottle,
    running: bool,

    renderer: Renderer,
    resizer: Resizer,

    masked_image: Rc<Shader>,
    vor_shader: Rc<Shader>,
    label_shader: Rc<Shader>,
    label_factory: Box<dyn LabelFactory>,

    vor: VoronoiBuilder,
    vor_index: usize,
    use_vor: bool,

    planet_count: usize,
    planet_labels: Vec<Box<dyn Label>>,

    ship_texture: Rc<Texture>,
    ship_labels: Vec<Box<dyn Label>>,
    max_num_ships: usize,
}

impl<S: StateSource> GameInstance<S> {
    /// Compiles the shaders and builds every planet renderable.
    ///
    /// The session starts stopped at turn 0; call `start` to run the clock.
    pub fn new(mut state: S, assets: &GameAssets, config: VisualizerConfig, el_size: (f32, f32)) -> VisualizerResult<Self> {
        let planets = state.planets().to_vec();
        let planet_count = planets.len() / 3;

        let mut context = ShaderContext::new();
        context.insert("COLOUR_SLOTS".to_owned(), (planet_count * 2).max(1).to_string());

        let masked_image = compile(&assets.shaders.masked_image, "masked_image", &context)?;
        let vor_shader = compile(&assets.shaders.vor, "vor", &context)?;

        let (label_shader, label_factory): (Rc<Shader>, Box<dyn LabelFactory>) = match &assets.font {
            FontAsset::Msdf { font, texture } => {
                let shader = compile(&assets.shaders.msdf, "msdf", &context)?;
                let factory = MsdfLabelFactory::new(Rc::clone(font), Rc::clone(&shader), Rc::clone(texture));
                (shader, Box::new(factory))
            }
            FontAsset::Bitmap { font, texture } => {
                let shader = compile(&assets.shaders.bitmap, "bitmap", &context)?;
                let factory = BitmapLabelFactory::new(Rc::clone(font), Rc::clone(&shader), Rc::clone(texture));
                (shader, Box::new(factory))
            }
        };

        state.update_turn(0);

        let resizer = Resizer::new(state.viewbox(), el_size, config.keep_aspect_ratio);
        let mut renderer = Renderer::new();

        let sites = planets
            .chunks_exact(3)
            .map(|p| Point::new(p[0] as f64, p[1] as f64))
            .collect();
        let vor = VoronoiBuilder::new(Rc::clone(&vor_shader), sites, BBox::from_viewbox(resizer.viewbox()));
        let vor_index = renderer.add_renderable(vor.renderable(), LAYER_VOR);

        let mut planet_labels = Vec::with_capacity(planet_count);
        for (i, p) in planets.chunks_exact(3).enumerate() {
            let (x, y, r) = (p[0], p[1], p[2]);
            let name = state.planet_name(i).unwrap_or_default();

            let rect = assets.planets.sprite_for(name);
            let trans = Mat3::from_scale_angle_translation(Vec2::splat(r / 2.0), 0.0, Vec2::new(x, y)).to_cols_array();
            let mut uniforms = Uniforms::new();
            uniforms.insert("u_trans".to_owned(), Uniform::Mat3(trans));
            uniforms.insert("u_trans_next".to_owned(), Uniform::Mat3(trans));

            let sprite = quad(
                Rc::clone(&masked_image),
                Rc::clone(&assets.planets.texture),
                1.0,
                assets.planets.texcoords(rect),
                uniforms,
            );
            renderer.add_renderable(Rc::new(RefCell::new(sprite)), LAYER_PLANET);

            let count = label_factory.build(Some(translation(x, y + LABEL_RAISE - 2.0 * LABEL_LINE)));
            renderer.add_renderable(count.renderable(), LAYER_PLANET_LABEL);
            planet_labels.push(count);

            let mut title = label_factory.build(Some(translation(x, y + LABEL_RAISE - LABEL_LINE)));
            title.set_text(name, Align::Middle, Align::Begin);
            renderer.add_renderable(title.renderable(), LAYER_PLANET_LABEL);
        }

        log::info!(
            "session: {} planets, {} turns, up to {} ships in flight",
            planet_count,
            state.turn_count(),
            state.max_ships()
        );

        let mut instance = Self {
            playback: Playback::new(state.turn_count(), config.ms_per_turn),
            perf: PerfThrottle::new(config.perf.clone()),
            running: false,
            config,
            state,

            renderer,
            resizer,

            masked_image,
            vor_shader,
            label_shader,
            label_factory,

            vor,
            vor_index,
            use_vor: true,

            planet_count,
            planet_labels,

            ship_texture: Rc::clone(&assets.ship),
            ship_labels: Vec::new(),
            max_num_ships: 0,
        };

        instance.update_state();
        instance.set_globals();
        Ok(instance)
    }

    // ── controls ──────────────────────────────────────────────────────────

    /// Jumps to `turn` (clamped); returns the turn shown.
    pub fn update_turn(&mut self, turn: usize) -> usize {
        self.playback.set_turn(turn);
        self.show_current_turn()
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("session started");
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("session stopped");
            self.running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn toggle(&mut self) {
        self.playback.toggle();
    }

    /// Moves `delta` turns, clamped at both ends.
    pub fn step(&mut self, delta: isize) -> usize {
        self.playback.step(delta);
        self.show_current_turn()
    }

    /// Appends a serialized state. A session parked on the previous last
    /// turn resumes playing.
    ///
    /// The current turn is re-read so its "next" half points at the new
    /// state instead of repeating the old last one.
    pub fn push_state(&mut self, state: &str) -> VisualizerResult<()> {
        self.state.push_state(state)?;
        self.playback.push_turn();
        self.state.update_turn(self.playback.turn());
        self.update_state();
        log::debug!("state pushed, {} turns", self.playback.turn_count());
        Ok(())
    }

    /// Rebuilds the viewport for a new element size and re-tessellates the
    /// background to cover it.
    pub fn on_resize(&mut self, el_size: (f32, f32)) {
        self.resizer = Resizer::new(self.state.viewbox(), el_size, self.config.keep_aspect_ratio);
        self.vor.recompute(BBox::from_viewbox(self.resizer.viewbox()));
        self.set_globals();
    }

    pub fn set_ms_per_turn(&mut self, ms: f64) {
        self.config.ms_per_turn = ms;
        self.playback.set_ms_per_turn(ms);
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Advances the clock by `elapsed_ms` and refreshes uniforms.
    ///
    /// Stopped or paused sessions only pick up viewport changes.
    pub fn tick(&mut self, elapsed_ms: f64) {
        if self.running && self.playback.advance(elapsed_ms) {
            self.state.update_turn(self.playback.turn());
            self.update_state();
        }
        self.set_globals();
    }

    /// Feeds one frame duration to the throttle; the background goes away
    /// for good once it trips.
    pub fn record_frame_time(&mut self, frame_ms: f64) {
        if self.perf.record(frame_ms) && self.use_vor {
            log::info!(
                "frames over {} ms, disabling voronoi background",
                self.config.perf.frame_budget_ms
            );
            self.renderer.disable(self.vor_index, LAYER_VOR);
            self.use_vor = false;
        }
    }

    pub fn render(&self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        self.renderer.render(ctx, target, self.config.clear_color);
    }

    pub fn title(&self) -> String {
        format!(
            "Planet Wars: turn {} / {}",
            self.playback.turn(),
            self.playback.last_turn()
        )
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Key bindings: Space toggles playback, arrows step (five at a time
    /// with shift), Home/End jump to the ends. Pointer events pan and zoom.
    pub fn handle_input(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Key { key, state: KeyState::Pressed, modifiers, repeat } => {
                let stride = if modifiers.shift { FAST_STEP } else { 1 };
                match key {
                    Key::Space if !repeat => self.toggle(),
                    Key::ArrowRight => {
                        self.step(stride);
                    }
                    Key::ArrowLeft => {
                        self.step(-stride);
                    }
                    Key::Home => {
                        self.update_turn(0);
                    }
                    Key::End => {
                        self.update_turn(self.playback.last_turn());
                    }
                    _ => {}
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => self.resizer.mouse_move(*x, *y),

            InputEvent::PointerButton(PointerButtonEvent { button: MouseButton::Left, state, x, y, .. }) => {
                self.resizer.mouse_move(*x, *y);
                match state {
                    MouseButtonState::Pressed => self.resizer.mouse_down(),
                    MouseButtonState::Released => self.resizer.mouse_up(),
                }
            }

            InputEvent::MouseWheel { delta, .. } => self.resizer.wheel(-delta.y()),

            InputEvent::PointerLeft => self.resizer.mouse_leave(),

            _ => {}
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn resizer(&self) -> &Resizer {
        &self.resizer
    }

    pub fn is_vor_enabled(&self) -> bool {
        self.use_vor
    }

    pub fn ship_pool_len(&self) -> usize {
        self.max_num_ships
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn show_current_turn(&mut self) -> usize {
        let turn = self.playback.turn();
        self.state.update_turn(turn);
        self.update_state();
        self.set_globals();
        turn
    }

    fn set_globals(&self) {
        let viewbox = Uniform::Vec4(self.resizer.viewbox());
        let time = Uniform::Float(self.playback.fraction() as f32);

        for shader in [&self.masked_image, &self.vor_shader, &self.label_shader] {
            shader.uniform("u_viewbox", viewbox.clone());
            shader.uniform("u_time", time.clone());
        }
    }

    fn update_state(&mut self) {
        self.update_planets();
        self.update_ships();
    }

    fn update_planets(&mut self) {
        let colours = self.state.planet_colours().to_vec();
        let ships = self.state.planet_ships().to_vec();

        self.vor_shader.uniform("u_planet_colours", Uniform::Vec3Array(colours.clone()));

        for i in 0..self.planet_count {
            let Some(c) = colours.get(i * 6..i * 6 + 6) else { continue };
            let now = [c[0], c[1], c[2]];
            let next = [c[3], c[4], c[5]];
            self.renderer.update_uniform(
                i,
                |us| {
                    us.insert("u_color".to_owned(), Uniform::Vec3(now));
                    us.insert("u_color_next".to_owned(), Uniform::Vec3(next));
                },
                LAYER_PLANET,
            );

            if let Some(count) = ships.get(i) {
                self.planet_labels[i].set_text(&count.to_string(), Align::Middle, Align::Begin);
            }
        }
    }

    fn grow_ship_pool(&mut self, len: usize) {
        let ratio = self.ship_texture.width() as f32 / self.ship_texture.height() as f32;

        for _ in self.max_num_ships..len {
            let sprite = quad(
                Rc::clone(&self.masked_image),
                Rc::clone(&self.ship_texture),
                ratio,
                [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
                Uniforms::new(),
            );
            self.renderer.add_renderable(Rc::new(RefCell::new(sprite)), LAYER_SHIP);

            let label = self.label_factory.build(None);
            self.renderer.add_renderable(label.renderable(), LAYER_SHIP_LABEL);
            self.ship_labels.push(label);
        }

        if len > self.max_num_ships {
            log::debug!("ship pool grown to {len}");
            self.max_num_ships = len;
        }
    }

    fn update_ships(&mut self) {
        let counts = self.state.ship_counts().to_vec();
        let ships = self.state.ship_locations().to_vec();
        let labels = self.state.ship_label_locations().to_vec();
        let colours = self.state.ship_colours().to_vec();

        self.grow_ship_pool(counts.len());

        for i in 0..self.max_num_ships {
            if i >= counts.len() {
                self.renderer.disable(i, LAYER_SHIP);
                self.renderer.disable(i, LAYER_SHIP_LABEL);
                continue;
            }

            self.ship_labels[i].set_text(&counts[i].to_string(), Align::Middle, Align::Middle);
            self.renderer.enable(i, LAYER_SHIP);
            self.renderer.enable(i, LAYER_SHIP_LABEL);

            let pair = ships.get(i * TRANSFORM_PAIR..(i + 1) * TRANSFORM_PAIR).unwrap_or_default();
            let label_pair = labels.get(i * TRANSFORM_PAIR..(i + 1) * TRANSFORM_PAIR).unwrap_or_default();
            let colour = colours
                .get(i * 3..i * 3 + 3)
                .map_or([1.0; 3], |c| [c[0], c[1], c[2]]);

            self.renderer.update_uniform(
                i,
                |us| {
                    us.insert("u_color".to_owned(), Uniform::Vec3(colour));
                    us.insert("u_color_next".to_owned(), Uniform::Vec3(colour));
                    if let (Some(now), Some(next)) = (mat(pair, 0), mat(pair, 1)) {
                        us.insert("u_trans".to_owned(), Uniform::Mat3(now));
                        us.insert("u_trans_next".to_owned(), Uniform::Mat3(next));
                    }
                },
                LAYER_SHIP,
            );

            self.renderer.update_uniform(
                i,
                |us| {
                    if let (Some(now), Some(next)) = (mat(label_pair, 0), mat(label_pair, 1)) {
                        us.insert("u_trans".to_owned(), Uniform::Mat3(now));
                        us.insert("u_trans_next".to_owned(), Uniform::Mat3(next));
                    }
                },
                LAYER_SHIP_LABEL,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pw_engine::input::{Modifiers, MouseWheelDelta};

    use super::*;

    fn state(ships: &[(&str, &str, u64)]) -> String {
        state_with_b_owner(2, ships)
    }

    fn state_with_b_owner(b_owner: u64, ships: &[(&str, &str, u64)]) -> String {
        let expeditions: Vec<String> = ships
            .iter()
            .enumerate()
            .map(|(id, (from, to, rem))| {
                format!(
                    r#"{{"id":{id},"ship_count":7,"origin":"{from}","destination":"{to}","owner":1,"turns_remaining":{rem}}}"#
                )
            })
            .collect();
        format!(
            r#"{{"planets":[{{"ship_count":5,"x":0.0,"y":0.0,"owner":1,"name":"a"}},{{"ship_count":5,"x":20.0,"y":0.0,"owner":{b_owner},"name":"b"}},{{"ship_count":3,"x":10.0,"y":15.0,"owner":null,"name":"c"}}],"expeditions":[{expeditions}]}}"#,
            expeditions = expeditions.join(",")
        )
    }

    /// Turns 0..4: no ships, two ships, one ship, none.
    fn session() -> GameInstance {
        let text = [
            state(&[]),
            state(&[("a", "b", 3), ("b", "c", 2)]),
            state(&[("a", "b", 2)]),
            state(&[]),
        ]
        .join("\n");
        let log = MatchLog::parse(&text).expect("parses");
        GameInstance::new(log, &GameAssets::procedural(), VisualizerConfig::default(), (800.0, 600.0)).expect("builds")
    }

    fn key(key: Key, shift: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers { shift, ..Modifiers::default() },
            repeat: false,
        }
    }

    fn enabled(game: &GameInstance, layer: i32) -> usize {
        (0..game.renderer().layer_len(layer))
            .filter(|&i| game.renderer().is_enabled(i, layer) == Some(true))
            .count()
    }

    // ── setup ─────────────────────────────────────────────────────────────

    #[test]
    fn builds_one_sprite_and_two_labels_per_planet() {
        let game = session();
        assert_eq!(game.renderer().layer_len(LAYER_VOR), 1);
        assert_eq!(game.renderer().layer_len(LAYER_PLANET), 3);
        assert_eq!(game.renderer().layer_len(LAYER_PLANET_LABEL), 6);
        assert_eq!(game.renderer().layer_len(LAYER_SHIP), 0);
        assert!(!game.is_running());
    }

    #[test]
    fn planet_colours_are_uploaded() {
        let game = session();
        let planet = game.renderer().get(1, LAYER_PLANET).expect("planet b");
        let uniforms = planet.borrow().uniforms().clone();
        assert_eq!(uniforms.get("u_color"), Some(&Uniform::Vec3([0.0, 0.5, 1.0])));
    }

    // ── ships ─────────────────────────────────────────────────────────────

    #[test]
    fn ship_pool_grows_and_extra_slots_are_disabled() {
        let mut game = session();
        game.update_turn(1);
        assert_eq!(game.ship_pool_len(), 2);
        assert_eq!(enabled(&game, LAYER_SHIP), 2);
        assert_eq!(enabled(&game, LAYER_SHIP_LABEL), 2);

        game.update_turn(2);
        assert_eq!(game.ship_pool_len(), 2);
        assert_eq!(game.renderer().layer_len(LAYER_SHIP), 2);
        assert_eq!(enabled(&game, LAYER_SHIP), 1);

        game.update_turn(3);
        assert_eq!(enabled(&game, LAYER_SHIP), 0);
    }

    #[test]
    fn ship_uniforms_carry_both_transforms() {
        let mut game = session();
        game.update_turn(1);
        let ship = game.renderer().get(0, LAYER_SHIP).expect("ship 0");
        let uniforms = ship.borrow().uniforms().clone();
        assert!(matches!(uniforms.get("u_trans"), Some(Uniform::Mat3(_))));
        assert!(matches!(uniforms.get("u_trans_next"), Some(Uniform::Mat3(_))));
        assert_ne!(uniforms.get("u_trans"), uniforms.get("u_trans_next"));
    }

    // ── playback ──────────────────────────────────────────────────────────

    #[test]
    fn stopped_session_does_not_advance() {
        let mut game = session();
        game.tick(5000.0);
        assert_eq!(game.playback().turn(), 0);

        game.start();
        game.start();
        game.tick(500.0);
        assert_eq!(game.playback().turn(), 1);
        assert_eq!(game.ship_pool_len(), 2);

        game.stop();
        game.tick(500.0);
        assert_eq!(game.playback().turn(), 1);
    }

    #[test]
    fn playing_to_the_end_pauses() {
        let mut game = session();
        game.start();
        game.tick(10_000.0);
        assert_eq!(game.playback().turn(), 3);
        assert!(!game.playback().is_playing());
    }

    #[test]
    fn pushed_state_resumes_a_finished_session() {
        let mut game = session();
        game.start();
        game.tick(10_000.0);

        game.push_state(&state(&[("c", "a", 4)])).expect("valid state");
        assert!(game.playback().is_playing());
        game.tick(500.0);
        assert_eq!(game.playback().turn(), 4);
        assert_eq!(enabled(&game, LAYER_SHIP), 1);
    }

    #[test]
    fn pushed_state_becomes_the_next_colour() {
        let text = [state(&[]), state(&[])].join("\n");
        let log = MatchLog::parse(&text).expect("parses");
        let mut game =
            GameInstance::new(log, &GameAssets::procedural(), VisualizerConfig::default(), (800.0, 600.0)).expect("builds");
        game.start();
        game.tick(10_000.0);
        assert_eq!(game.playback().turn(), 1);

        game.push_state(&state_with_b_owner(1, &[])).expect("valid state");
        game.tick(250.0);
        assert_eq!(game.playback().turn(), 1);

        let planet = game.renderer().get(1, LAYER_PLANET).expect("planet b");
        let uniforms = planet.borrow().uniforms().clone();
        assert_eq!(uniforms.get("u_color"), Some(&Uniform::Vec3([0.0, 0.5, 1.0])));
        assert_eq!(uniforms.get("u_color_next"), Some(&Uniform::Vec3([1.0, 0.5, 0.0])));
    }

    #[test]
    fn malformed_push_is_rejected() {
        let mut game = session();
        assert!(game.push_state("{not json").is_err());
        assert_eq!(game.playback().turn_count(), 4);
    }

    // ── input ─────────────────────────────────────────────────────────────

    #[test]
    fn keys_drive_playback() {
        let mut game = session();
        assert!(game.playback().is_playing());
        game.handle_input(&key(Key::Space, false));
        assert!(!game.playback().is_playing());

        game.handle_input(&key(Key::ArrowRight, false));
        assert_eq!(game.playback().turn(), 1);
        game.handle_input(&key(Key::ArrowRight, true));
        assert_eq!(game.playback().turn(), 3);
        game.handle_input(&key(Key::ArrowLeft, false));
        assert_eq!(game.playback().turn(), 2);
        game.handle_input(&key(Key::Home, false));
        assert_eq!(game.playback().turn(), 0);
        game.handle_input(&key(Key::End, false));
        assert_eq!(game.playback().turn(), 3);
    }

    #[test]
    fn wheel_over_the_view_zooms() {
        let mut game = session();
        let before = game.resizer().viewbox();
        game.handle_input(&InputEvent::PointerMoved(PointerMoveEvent { x: 400.0, y: 300.0 }));
        game.handle_input(&InputEvent::MouseWheel {
            delta: MouseWheelDelta::Line { x: 0.0, y: 1.0 },
            modifiers: Modifiers::default(),
        });
        assert!(game.resizer().viewbox()[2] < before[2]);
    }

    // ── perf ──────────────────────────────────────────────────────────────

    #[test]
    fn slow_frames_drop_the_background_for_good() {
        let mut game = session();
        for _ in 0..8 {
            game.record_frame_time(100.0);
        }
        assert!(!game.is_vor_enabled());
        assert_eq!(game.renderer().is_enabled(0, LAYER_VOR), Some(false));

        for _ in 0..20 {
            game.record_frame_time(1.0);
        }
        assert!(!game.is_vor_enabled());
    }

    #[test]
    fn title_shows_the_turn() {
        let mut game = session();
        game.update_turn(2);
        assert_eq!(game.title(), "Planet Wars: turn 2 / 3");
    }
}
