use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Expedition {
    pub id: u64,
    pub ship_count: u64,
    pub origin: String,
    pub destination: String,
    pub owner: u64,
    pub turns_remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Planet {
    pub ship_count: u64,
    pub x: f32,
    pub y: f32,
    pub owner: Option<u32>,
    pub name: String,
}

/// One turn snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct State {
    pub planets: Vec<Planet>,
    pub expeditions: Vec<Expedition>,
}
