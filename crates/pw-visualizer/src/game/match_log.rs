use std::collections::HashMap;

use super::arc::ArcPath;
use super::types::{Planet, State};
use super::StateSource;
use crate::error::{VisualizerError, VisualizerResult};

/// Player palette; index 0 is neutral.
pub const COLORS: [[f32; 3]; 10] = [
    [0.5, 0.5, 0.5],
    [1.0, 0.50, 0.0],
    [0.0, 0.50, 1.0],
    [1.0, 0.4, 0.58],
    [0.24, 0.79, 0.33],
    [0.79, 0.76, 0.24],
    [0.81, 0.25, 0.91],
    [0.94, 0.32, 0.32],
    [0.11, 0.93, 0.94],
    [0.05, 0.77, 1.0],
];

/// Extra viewbox margin as a share of the planet extent.
const VIEWBOX_SCALE: f32 = 0.1;
const VIEWBOX_MIN_MARGIN: f32 = 6.0;
const PLANET_RADIUS: f32 = 2.0;

fn colour(owner: u64) -> [f32; 3] {
    COLORS[(owner % COLORS.len() as u64) as usize]
}

fn planet_colour(p: &Planet) -> [f32; 3] {
    colour(p.owner.unwrap_or(0) as u64)
}

/// Planet extent plus margin, as `[x, y, w, h]`.
pub(crate) fn viewbox(planets: &[Planet]) -> [f32; 4] {
    let Some(first) = planets.first() else {
        return [0.0; 4];
    };

    let init = (first.x, first.y, first.x, first.y);
    let (min_x, min_y, max_x, max_y) = planets.iter().fold(init, |(x0, y0, x1, y1), p| {
        (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
    });

    let (w, h) = (max_x - min_x, max_y - min_y);
    let dx = (VIEWBOX_SCALE * w).max(VIEWBOX_MIN_MARGIN);
    let dy = (VIEWBOX_SCALE * h).max(VIEWBOX_MIN_MARGIN);

    [min_x - dx / 2.0, min_y - dy / 2.0, w + dx, h + dy]
}

/// A match log: one JSON state per line.
///
/// Planet layout comes from the first state; flight arcs are precomputed
/// for every ordered planet pair.
pub struct MatchLog {
    states: Vec<State>,
    turn: usize,

    arcs: HashMap<(String, String), ArcPath>,
    viewbox: [f32; 4],
    planets: Vec<f32>,
    planet_names: Vec<String>,

    planet_ships: Vec<u64>,
    planet_colours: Vec<f32>,

    ship_locations: Vec<f32>,
    ship_label_locations: Vec<f32>,
    ship_colours: Vec<f32>,
    ship_counts: Vec<u64>,
}

impl MatchLog {
    /// Parses every line that holds a state; other lines (headers, blank
    /// lines, truncated writes) are skipped.
    pub fn parse(log: &str) -> VisualizerResult<Self> {
        let states: Vec<State> = log
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(state) => Some(state),
                Err(err) => {
                    log::debug!("skipping match log line: {err}");
                    None
                }
            })
            .collect();

        let first = states.first().ok_or(VisualizerError::EmptyMatch)?;

        let mut arcs = HashMap::new();
        for p1 in &first.planets {
            for p2 in &first.planets {
                arcs.insert((p1.name.clone(), p2.name.clone()), ArcPath::new(p1, p2));
            }
        }

        let viewbox = viewbox(&first.planets);
        let planets = first.planets.iter().flat_map(|p| [p.x, p.y, PLANET_RADIUS]).collect();
        let planet_names = first.planets.iter().map(|p| p.name.clone()).collect();

        log::info!("match log: {} turns, {} planets", states.len(), first.planets.len());

        Ok(Self {
            states,
            turn: 0,
            arcs,
            viewbox,
            planets,
            planet_names,
            planet_ships: Vec::new(),
            planet_colours: Vec::new(),
            ship_locations: Vec::new(),
            ship_label_locations: Vec::new(),
            ship_colours: Vec::new(),
            ship_counts: Vec::new(),
        })
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    fn update_planets(&mut self) {
        let now = &self.states[self.turn];
        let next = &self.states[(self.turn + 1).min(self.states.len() - 1)];

        self.planet_ships = now.planets.iter().map(|p| p.ship_count).collect();
        self.planet_colours = now
            .planets
            .iter()
            .zip(&next.planets)
            .flat_map(|(a, b)| {
                let (a, b) = (planet_colour(a), planet_colour(b));
                [a[0], a[1], a[2], b[0], b[1], b[2]]
            })
            .collect();
    }

    fn update_ships(&mut self) {
        self.ship_locations.clear();
        self.ship_label_locations.clear();
        self.ship_colours.clear();
        self.ship_counts.clear();

        for ship in &self.states[self.turn].expeditions {
            let Some(arc) = self.arcs.get(&(ship.origin.clone(), ship.destination.clone())) else {
                log::warn!(
                    "expedition {} flies {} -> {}, unknown planet; skipped",
                    ship.id,
                    ship.origin,
                    ship.destination
                );
                continue;
            };

            let (now, next) = arc.steps(ship.turns_remaining as usize);
            self.ship_locations.extend(arc.ship_transform(now).to_cols_array());
            self.ship_locations.extend(arc.ship_transform(next).to_cols_array());
            self.ship_label_locations.extend(arc.label_transform(now).to_cols_array());
            self.ship_label_locations.extend(arc.label_transform(next).to_cols_array());
            self.ship_colours.extend(colour(ship.owner));
            self.ship_counts.push(ship.ship_count);
        }
    }
}

impl StateSource for MatchLog {
    fn viewbox(&self) -> [f32; 4] {
        self.viewbox
    }

    fn planets(&self) -> &[f32] {
        &self.planets
    }

    fn planet_name(&self, index: usize) -> Option<&str> {
        self.planet_names.get(index).map(String::as_str)
    }

    fn planet_colours(&self) -> &[f32] {
        &self.planet_colours
    }

    fn planet_ships(&self) -> &[u64] {
        &self.planet_ships
    }

    fn ship_locations(&self) -> &[f32] {
        &self.ship_locations
    }

    fn ship_label_locations(&self) -> &[f32] {
        &self.ship_label_locations
    }

    fn ship_colours(&self) -> &[f32] {
        &self.ship_colours
    }

    fn ship_counts(&self) -> &[u64] {
        &self.ship_counts
    }

    fn turn_count(&self) -> usize {
        self.states.len()
    }

    fn update_turn(&mut self, turn: usize) -> usize {
        self.turn = turn.min(self.states.len() - 1);
        self.update_planets();
        self.update_ships();
        self.turn
    }

    fn push_state(&mut self, state: &str) -> VisualizerResult<()> {
        let state: State = serde_json::from_str(state.trim())?;
        self.states.push(state);
        Ok(())
    }

    fn max_ships(&self) -> usize {
        self.states.iter().map(|s| s.expeditions.len()).max().unwrap_or(0)
    }
}
