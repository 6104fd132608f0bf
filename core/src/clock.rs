//! Simulation clock: the sub-phase counter, the city calendar,
//! speed control and pause.
//!
//! One engine invocation executes exactly one of sixteen sub-phases.
//! A full cycle of sixteen sub-phases is one simulated week; 4 weeks
//! make a month and 48 weeks a year.

use crate::types::{RunId, Tick};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PHASES_PER_WEEK: u64 = 16;
pub const WEEKS_PER_MONTH: u64 = 4;
pub const WEEKS_PER_YEAR: u64 = 48;
pub const START_YEAR: i32 = 1900;

/// Number of horizontal bands the zone scan is split into.
pub const SCAN_BANDS: u8 = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id: RunId,
    /// Engine invocations so far.
    pub current_tick: Tick,
    /// Simulated weeks since the city was founded.
    pub city_time: u64,
    /// Week counter modulo 1024, drives the "every N weeks" periods.
    pub sim_cycle: u32,
    pub speed: SimSpeed,
    pub paused: bool,
}

impl SimClock {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            current_tick: 0,
            city_time: 0,
            sim_cycle: 0,
            speed: SimSpeed::Normal,
            paused: false,
        }
    }

    /// The phase the next invocation will execute.
    pub fn next_phase(&self) -> Phase {
        Phase::from_index((self.current_tick % PHASES_PER_WEEK) as u8)
    }

    /// Consume one invocation. Returns the phase to execute.
    /// Panics if called while paused.
    pub fn advance(&mut self) -> Phase {
        assert!(!self.paused, "advance() called on paused clock");
        let phase = self.next_phase();
        self.current_tick += 1;
        if phase == Phase::WeekStart {
            self.sim_cycle = (self.sim_cycle + 1) % 1024;
            self.city_time += 1;
        }
        phase
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    /// Engine invocations a host should make per animation frame.
    pub fn ticks_per_frame(&self) -> u32 {
        match self.speed {
            SimSpeed::Slow   => 1,
            SimSpeed::Normal => 2,
            SimSpeed::Fast   => 8,
        }
    }

    pub fn year(&self) -> i32 {
        START_YEAR + (self.city_time / WEEKS_PER_YEAR) as i32
    }

    /// Month of year, 0-based.
    pub fn month(&self) -> u32 {
        ((self.city_time % WEEKS_PER_YEAR) / WEEKS_PER_MONTH) as u32
    }

    /// The first day of the current city month.
    pub fn city_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year(), self.month() + 1, 1)
            .unwrap_or(NaiveDate::MIN)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Slow,
    Normal,
    Fast,
}

/// The sixteen sub-phases of a simulated week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "band", rename_all = "snake_case")]
pub enum Phase {
    /// 0: advance the calendar, valves, census reset.
    WeekStart,
    /// 1–8: zone scan over one row band (0-based band index).
    ZoneScan(u8),
    /// 9: census, tax collection, evaluation.
    Finance,
    /// 10: map decay and advisory messages.
    Decay,
    /// 11: power distribution.
    Power,
    /// 12: land value, pollution and terrain.
    PollutionScan,
    /// 13: crime.
    CrimeScan,
    /// 14: population density and city center.
    PopulationScan,
    /// 15: fire coverage and disasters.
    FireScan,
}

impl Phase {
    /// Map a phase index to its phase. Indexes outside 0..16 mean the
    /// scheduler state is corrupt.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::WeekStart,
            1..=8 => Self::ZoneScan(index - 1),
            9 => Self::Finance,
            10 => Self::Decay,
            11 => Self::Power,
            12 => Self::PollutionScan,
            13 => Self::CrimeScan,
            14 => Self::PopulationScan,
            15 => Self::FireScan,
            other => panic!("simulation phase {other} out of range"),
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::WeekStart      => 0,
            Self::ZoneScan(band) => band + 1,
            Self::Finance        => 9,
            Self::Decay          => 10,
            Self::Power          => 11,
            Self::PollutionScan  => 12,
            Self::CrimeScan      => 13,
            Self::PopulationScan => 14,
            Self::FireScan       => 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_index_round_trips_for_every_phase() {
        for i in 0..16u8 {
            assert_eq!(Phase::from_index(i).index(), i);
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn phase_sixteen_is_fatal() {
        Phase::from_index(16);
    }

    #[test]
    #[should_panic(expected = "paused")]
    fn advancing_a_paused_clock_is_fatal() {
        let mut clock = SimClock::new("clock".into());
        clock.pause();
        clock.advance();
    }

    #[test]
    fn calendar_advances_once_per_sixteen_ticks() {
        let mut clock = SimClock::new("clock".into());
        for _ in 0..(16 * 49) {
            clock.advance();
        }
        assert_eq!(clock.city_time, 49);
        assert_eq!(clock.year(), START_YEAR + 1);
        assert_eq!(clock.month(), 0);
    }
}
