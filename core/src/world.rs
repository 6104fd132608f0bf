//! World state: the tile grid, every derived map, the census and the
//! city-wide numbers the subsystems share.
//!
//! RULE: The tile grid has a single writer at a time. Simulation
//! phases and external edits are serialized by the engine.
//!
//! RULE: A derived map is rewritten only by the scan that owns it;
//! between scans it changes only through its decay function or the
//! explicit accumulate helpers (traffic, growth rate, station maps).

use crate::{
    budget_subsystem::BudgetState,
    config::{GameLevel, ScenarioConfig, SimConfig},
    evaluation_subsystem::EvaluationState,
    event::SimEvent,
    map::{MapLayer, EIGHTH, FULL, HALF, QUARTER},
    sprite_subsystem::{Sprite, SpriteKind},
    tiles::{self, ALLBITS, LOMASK, PWRBIT},
    types::{Cell, Position},
};
use serde::{Deserialize, Serialize};

/// Entries per history series: 120 short-range plus 120 long-range.
pub const HISTORY_LEN: usize = 240;
pub const HISTORY_SHORT: usize = 120;

// ── Census ─────────────────────────────────────────────────────────

/// Counters reset at phase 0 and accumulated by the zone scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub res_pop: i32,
    pub com_pop: i32,
    pub ind_pop: i32,
    pub res_zones: i32,
    pub com_zones: i32,
    pub ind_zones: i32,
    pub hospitals: i32,
    pub churches: i32,
    pub fire_stations: i32,
    pub police_stations: i32,
    pub stadiums: i32,
    pub seaports: i32,
    pub airports: i32,
    pub coal_plants: i32,
    pub nuclear_plants: i32,
    pub road_total: i32,
    pub rail_total: i32,
    pub fire_pop: i32,
    pub powered_zones: i32,
    pub unpowered_zones: i32,
}

impl Census {
    pub fn zone_total(&self) -> i32 {
        self.res_zones + self.com_zones + self.ind_zones
    }

    /// Displayed population: residents plus workers scaled up.
    pub fn city_population(&self) -> i64 {
        (self.res_pop as i64 + (self.com_pop as i64 + self.ind_pop as i64) * 8) * 20
    }
}

/// Rolling history buffers, most recent first in each half.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub res: Vec<i32>,
    pub com: Vec<i32>,
    pub ind: Vec<i32>,
    pub crime: Vec<i32>,
    pub pollution: Vec<i32>,
    pub money: Vec<i32>,
    pub res_max: i32,
    pub com_max: i32,
    pub ind_max: i32,
}

impl Default for History {
    fn default() -> Self {
        Self {
            res: vec![0; HISTORY_LEN],
            com: vec![0; HISTORY_LEN],
            ind: vec![0; HISTORY_LEN],
            crime: vec![0; HISTORY_LEN],
            pollution: vec![0; HISTORY_LEN],
            money: vec![0; HISTORY_LEN],
            res_max: 0,
            com_max: 0,
            ind_max: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valves {
    pub res: i32,
    pub com: i32,
    pub ind: i32,
}

/// Demand caps raised by the advisory checks when a city outgrows its
/// stadium, seaport or airport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caps {
    pub res: bool,
    pub com: bool,
    pub ind: bool,
}

/// Averages and hot spots produced by the map scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResults {
    pub land_value_avg: i32,
    pub pollution_avg: i32,
    pub crime_avg: i32,
    pub city_center: Position,
    pub pollution_max: Position,
    pub crime_max: Position,
    pub traffic_max: Position,
}

/// Runtime options the player can change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySettings {
    pub level: GameLevel,
    pub disasters_enabled: bool,
    pub scenario: Option<ScenarioConfig>,
}

// ── World ──────────────────────────────────────────────────────────

pub struct WorldState {
    width: i32,
    height: i32,
    tiles: MapLayer<Cell>,

    pub power_map: MapLayer<bool>,
    pub land_value: MapLayer<i32>,
    pub pollution: MapLayer<i32>,
    pub crime: MapLayer<i32>,
    pub pop_density: MapLayer<i32>,
    pub traffic_density: MapLayer<i32>,
    pub terrain: MapLayer<i32>,
    pub fire_station_map: MapLayer<i32>,
    pub fire_coverage: MapLayer<i32>,
    pub police_station_map: MapLayer<i32>,
    pub police_coverage: MapLayer<i32>,
    pub growth_rate: MapLayer<i32>,
    pub com_rate: MapLayer<i32>,

    pub census: Census,
    pub history: History,
    pub valves: Valves,
    pub caps: Caps,
    pub scan: ScanResults,
    pub budget: BudgetState,
    pub evaluation: EvaluationState,
    pub settings: CitySettings,

    /// `res/8 + com + ind`, refreshed with the valves.
    pub total_pop: i32,
    pub need_hospital: i32,
    pub need_church: i32,
    pub crime_ramp: i32,
    pub pollution_ramp: i32,
    /// City population at the last growth check, for milestone messages.
    pub last_city_pop: i64,
    /// Flood spread countdown, decremented every phase 15.
    pub flood_count: i32,

    /// Plant locations pushed by the zone scan, consumed by the power scan.
    pub power_plants: Vec<Position>,
    pub sprites: Vec<Sprite>,
    next_sprite_id: u32,

    pending: Vec<SimEvent>,
}

impl WorldState {
    /// A bare dirt map with default budget and options.
    pub fn new(width: usize, height: usize) -> Self {
        Self::from_config(&SimConfig {
            width,
            height,
            ..SimConfig::default_test()
        })
    }

    pub fn from_config(config: &SimConfig) -> Self {
        let (w, h) = (config.width, config.height);
        let center = Position::new(w.div_ceil(2) as i32, h.div_ceil(2) as i32);
        Self {
            width: w as i32,
            height: h as i32,
            tiles: MapLayer::new(w, h, FULL),
            power_map: MapLayer::new(w, h, FULL),
            land_value: MapLayer::new(w, h, HALF),
            pollution: MapLayer::new(w, h, HALF),
            crime: MapLayer::new(w, h, HALF),
            pop_density: MapLayer::new(w, h, HALF),
            traffic_density: MapLayer::new(w, h, HALF),
            terrain: MapLayer::new(w, h, QUARTER),
            fire_station_map: MapLayer::new(w, h, EIGHTH),
            fire_coverage: MapLayer::new(w, h, EIGHTH),
            police_station_map: MapLayer::new(w, h, EIGHTH),
            police_coverage: MapLayer::new(w, h, EIGHTH),
            growth_rate: MapLayer::new(w, h, EIGHTH),
            com_rate: MapLayer::new(w, h, EIGHTH),
            census: Census::default(),
            history: History::default(),
            valves: Valves::default(),
            caps: Caps::default(),
            scan: ScanResults {
                city_center: center,
                ..ScanResults::default()
            },
            budget: BudgetState::from_config(config),
            evaluation: EvaluationState::default(),
            settings: CitySettings {
                level: config.level,
                disasters_enabled: config.disasters_enabled,
                scenario: config.scenario.clone(),
            },
            total_pop: 0,
            need_hospital: 0,
            need_church: 0,
            crime_ramp: 0,
            pollution_ramp: 0,
            last_city_pop: 0,
            flood_count: 0,
            power_plants: Vec::new(),
            sprites: Vec::new(),
            next_sprite_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn test_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    // ── Tile access ────────────────────────────────────────────────

    /// Tile id without flags. Outside the map reads as dirt.
    pub fn get_tile(&self, x: i32, y: i32) -> u16 {
        self.tiles.get(x, y) & LOMASK
    }

    /// Raw cell including flags.
    pub fn get_cell(&self, x: i32, y: i32) -> Cell {
        self.tiles.get(x, y)
    }

    /// Overwrite a cell, flags included. Queues a `TileChanged`
    /// notification only when the stored value actually changes.
    pub fn set_tile(&mut self, x: i32, y: i32, cell: Cell) {
        if !self.test_bounds(x, y) {
            return;
        }
        if self.tiles.get(x, y) != cell {
            self.tiles.set(x, y, cell);
            self.pending.push(SimEvent::TileChanged { x, y });
        }
    }

    /// Replace the tile id and keep the current flag bits.
    pub fn set_tile_keep_flags(&mut self, x: i32, y: i32, tile: u16) {
        let flags = self.get_cell(x, y) & ALLBITS;
        self.set_tile(x, y, (tile & LOMASK) | flags);
    }

    /// Place a tile id with its default flags.
    pub fn place(&mut self, x: i32, y: i32, tile: u16) {
        self.set_tile(x, y, tiles::cell(tile));
    }

    pub fn is_tile_powered(&self, x: i32, y: i32) -> bool {
        self.get_cell(x, y) & PWRBIT != 0
    }

    pub fn set_tile_power(&mut self, x: i32, y: i32, powered: bool) {
        let cell = self.get_cell(x, y);
        let updated = if powered { cell | PWRBIT } else { cell & !PWRBIT };
        self.set_tile(x, y, updated);
    }

    /// Whether the last power scan reached this tile.
    pub fn has_power(&self, x: i32, y: i32) -> bool {
        self.power_map.get(x, y)
    }

    // ── Funds ──────────────────────────────────────────────────────

    /// Debit the city treasury. Negative amounts credit it.
    pub fn spend(&mut self, amount: i64) {
        self.budget.funds -= amount;
        self.pending.push(SimEvent::FundsChanged { funds: self.budget.funds });
    }

    // ── Derived helpers ────────────────────────────────────────────

    /// Manhattan distance of a half-resolution cell to the city
    /// center, capped at 32.
    pub fn distance_to_center(&self, hx: i32, hy: i32) -> i32 {
        let c = self.scan.city_center;
        let d = (hx - c.x / 2).abs() + (hy - c.y / 2).abs();
        d.min(32)
    }

    /// Record zone growth or decline on the growth-rate map.
    pub fn adjust_growth(&mut self, pos: Position, amount: i32) {
        self.growth_rate.world_add(pos.x, pos.y, amount * 4);
    }

    // ── Sprites ────────────────────────────────────────────────────

    pub fn sprite(&self, kind: SpriteKind) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.kind == kind)
    }

    pub fn sprite_mut(&mut self, kind: SpriteKind) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.kind == kind)
    }

    pub fn has_sprite(&self, kind: SpriteKind) -> bool {
        self.sprite(kind).is_some()
    }

    pub fn add_sprite(&mut self, kind: SpriteKind, pos: Position, dest: Position) -> u32 {
        let id = self.next_sprite_id;
        self.next_sprite_id += 1;
        self.sprites.push(Sprite::new(id, kind, pos, dest));
        id
    }

    // ── Notifications ──────────────────────────────────────────────

    pub fn notify(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    pub fn drain_notifications(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }
}
