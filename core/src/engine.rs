//! The simulation engine: one invocation runs one of the sixteen
//! sub-phases of a simulated week.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Demand subsystem      (phase 0)
//!   2. Census subsystem      (phases 0, 9)
//!   3. Zone subsystem        (phases 1–8, one row band each)
//!   4. Budget subsystem      (phase 9)
//!   5. Evaluation subsystem  (phase 9)
//!   6. Scan subsystem        (phases 10, 12–15)
//!   7. Message subsystem     (phase 10)
//!   8. Power subsystem       (phase 11)
//!   9. Disaster subsystem    (phase 15)
//!  10. Sprite subsystem      (every phase)
//!
//! RULES:
//!   - Subsystems execute in registration order, filtered by slot.
//!   - All randomness flows through the engine's single CityRng.
//!   - Edits and commands are applied between invocations, never during.
//!   - Notifications reach listeners after each sub-phase and after each
//!     edit, in emission order.

use crate::{
    budget_subsystem::{BudgetSubsystem, FinancialRecord},
    census_subsystem::CensusSubsystem,
    clock::{Phase, SimClock},
    command::{PlayerCommand, MAX_TAX_RATE},
    config::SimConfig,
    demand_subsystem::DemandSubsystem,
    disaster_subsystem::{self, DisasterSubsystem},
    error::{SimError, SimResult},
    evaluation_subsystem::EvaluationSubsystem,
    event::{CityListener, EventLogEntry, SimEvent},
    message_subsystem::MessageSubsystem,
    power_subsystem::PowerSubsystem,
    rng::CityRng,
    scan_subsystem::ScanSubsystem,
    snapshot::CitySnapshot,
    sprite_subsystem::SpriteSubsystem,
    store::{EvaluationRecord, SimStore},
    subsystem::{SimContext, SimSubsystem, SubsystemSlot},
    types::{Cell, RunId, Tick},
    world::WorldState,
    zone::ZoneSubsystem,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct SimEngine {
    pub run_id: RunId,
    pub clock: SimClock,
    rng: CityRng,
    seed: u64,
    world: WorldState,
    subsystems: Vec<(SubsystemSlot, Box<dyn SimSubsystem>)>,
    listeners: Vec<Box<dyn CityListener>>,
    store: SimStore,
    announced: bool,
}

impl SimEngine {
    pub fn new(run_id: RunId, seed: u64, store: SimStore, config: &SimConfig) -> Self {
        Self {
            clock: SimClock::new(run_id.clone()),
            rng: CityRng::new(seed),
            seed,
            world: WorldState::from_config(config),
            subsystems: Vec::new(),
            listeners: Vec::new(),
            store,
            run_id,
            announced: false,
        }
    }

    /// Build a fully wired engine with all subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, seed: u64, store: SimStore, config: &SimConfig) -> Self {
        let mut engine = SimEngine::new(run_id, seed, store, config);

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(SubsystemSlot::Demand, Box::new(DemandSubsystem::new()));
        engine.register(SubsystemSlot::Census, Box::new(CensusSubsystem::new()));
        engine.register(SubsystemSlot::Zone, Box::new(ZoneSubsystem::new()));
        engine.register(SubsystemSlot::Budget, Box::new(BudgetSubsystem::new()));
        engine.register(SubsystemSlot::Evaluation, Box::new(EvaluationSubsystem::new()));
        engine.register(SubsystemSlot::Scan, Box::new(ScanSubsystem::new()));
        engine.register(SubsystemSlot::Message, Box::new(MessageSubsystem::new()));
        engine.register(SubsystemSlot::Power, Box::new(PowerSubsystem::new()));
        engine.register(SubsystemSlot::Disaster, Box::new(DisasterSubsystem::new()));
        engine.register(SubsystemSlot::Sprite, Box::new(SpriteSubsystem::new()));
        engine
    }

    /// A wired engine over a fresh in-memory store and test defaults.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, ENGINE_VERSION)?;
        Ok(Self::build(run_id, seed, store, &SimConfig::default_test()))
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, slot: SubsystemSlot, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push((slot, subsystem));
    }

    pub fn register_listener(&mut self, listener: Box<dyn CityListener>) {
        self.listeners.push(listener);
    }

    // ── Stepping ───────────────────────────────────────────────

    /// Execute one sub-phase. Panics if called while paused.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        assert!(!self.clock.paused, "tick() called on paused engine");

        let phase = self.clock.advance();
        let tick = self.clock.current_tick;
        let mut tick_events = Vec::new();

        for (slot, subsystem) in &mut self.subsystems {
            if !slot.runs_in(phase) {
                continue;
            }
            let mut ctx = SimContext {
                clock: &self.clock,
                world: &mut self.world,
                rng: &mut self.rng,
            };
            let summary = subsystem.update(phase, &mut ctx)?;

            let mut batch = self.world.drain_notifications();
            batch.extend(summary);
            record(&self.store, &self.run_id, tick, subsystem.name(), &batch)?;
            tick_events.extend(batch);
        }

        if phase == Phase::Finance && CitySnapshot::is_due(self.clock.city_time) {
            self.take_snapshot()?;
        }

        self.dispatch(&tick_events);
        Ok(tick_events)
    }

    /// Run up to n sub-phases. Stops early if the clock is paused.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        if !self.announced {
            // Emit RunInitialized once so seed differences are observable.
            let init = SimEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed: self.seed,
            };
            record(&self.store, &self.run_id, 0, "engine", std::slice::from_ref(&init))?;
            self.dispatch(std::slice::from_ref(&init));
            self.announced = true;
        }
        for _ in 0..n {
            if self.clock.paused {
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    /// Run one host frame: as many sub-phases as the current speed asks
    /// for.
    pub fn run_frame(&mut self) -> SimResult<()> {
        let ticks = u64::from(self.clock.ticks_per_frame());
        self.run_ticks(ticks)
    }

    // ── Commands and edits ─────────────────────────────────────

    /// Apply a player command between invocations.
    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let received = SimEvent::PlayerCommandReceived {
            tick,
            command_type: command.type_name().to_string(),
        };
        record(&self.store, &self.run_id, tick, "engine", std::slice::from_ref(&received))?;
        let mut events = vec![received];

        match command {
            PlayerCommand::Pause => self.clock.pause(),
            PlayerCommand::Resume => self.clock.resume(),
            PlayerCommand::SetSpeed { speed } => self.clock.set_speed(speed),
            PlayerCommand::SetTaxRate { rate } => {
                self.world.budget.tax_rate = rate.clamp(0, MAX_TAX_RATE);
            }
            PlayerCommand::SetFunding { road, fire, police } => {
                let budget = &mut self.world.budget;
                budget.road_percent = road.clamp(0.0, 1.0);
                budget.fire_percent = fire.clamp(0.0, 1.0);
                budget.police_percent = police.clamp(0.0, 1.0);
            }
            PlayerCommand::SetAutoBudget { enabled } => {
                self.world.budget.auto_budget = enabled;
                let options = self.options_changed();
                self.world.notify(options);
            }
            PlayerCommand::Spend { amount } => {
                if amount < 0 {
                    self.flush("engine", &mut events)?;
                    log::warn!("tick={tick} refused spend of {amount}");
                    return Err(SimError::InvalidCommand {
                        reason: format!("cannot spend a negative amount ({amount})"),
                    });
                }
                self.world.spend(amount);
            }
            PlayerCommand::SetDisasters { enabled } => {
                self.world.settings.disasters_enabled = enabled;
                let options = self.options_changed();
                self.world.notify(options);
            }
            PlayerCommand::TriggerDisaster { kind } => {
                if !disaster_subsystem::trigger(&mut self.world, &mut self.rng, kind) {
                    self.flush("engine", &mut events)?;
                    log::warn!("tick={tick} refused {kind:?}: nothing to strike");
                    return Err(SimError::InvalidCommand {
                        reason: format!("{kind:?} has no target in this city"),
                    });
                }
            }
        }

        self.flush("engine", &mut events)?;
        Ok(events)
    }

    /// Apply an external edit to the world, then deliver the
    /// notifications it raised.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut WorldState) -> R) -> SimResult<R> {
        let result = f(&mut self.world);
        let mut events = Vec::new();
        self.flush("edit", &mut events)?;
        Ok(result)
    }

    pub fn set_tile(&mut self, x: i32, y: i32, cell: Cell) -> SimResult<()> {
        if !self.world.test_bounds(x, y) {
            return Err(SimError::OutOfBounds { x, y });
        }
        self.edit(|world| world.set_tile(x, y, cell))
    }

    pub fn spend(&mut self, amount: i64) -> SimResult<()> {
        self.edit(|world| world.spend(amount))
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    /// Look up a registered subsystem by type.
    /// Used by the runner and tests only.
    pub fn subsystem<T: 'static>(&self) -> Option<&T> {
        self.subsystems
            .iter()
            .find_map(|(_, sub)| sub.as_any().downcast_ref::<T>())
    }

    pub fn snapshot(&self) -> CitySnapshot {
        CitySnapshot::capture(&self.clock, &self.world)
    }

    // ── Internals ──────────────────────────────────────────────

    fn options_changed(&self) -> SimEvent {
        SimEvent::OptionsChanged {
            level: self.world.settings.level,
            disasters_enabled: self.world.settings.disasters_enabled,
            auto_budget: self.world.budget.auto_budget,
        }
    }

    /// Persist and deliver whatever the world queued since the last
    /// drain, appending it to `events`.
    fn flush(&mut self, source: &str, events: &mut Vec<SimEvent>) -> SimResult<()> {
        let pending = self.world.drain_notifications();
        record(&self.store, &self.run_id, self.clock.current_tick, source, &pending)?;
        events.extend(pending);
        self.dispatch(events);
        Ok(())
    }

    fn dispatch(&mut self, events: &[SimEvent]) {
        for listener in &mut self.listeners {
            for event in events {
                listener.on_event(event);
            }
        }
    }

    fn take_snapshot(&self) -> SimResult<()> {
        let snapshot = self.snapshot();
        let json = serde_json::to_string(&snapshot)?;
        let tick = self.clock.current_tick;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick} (week {})", self.clock.city_time);
        Ok(())
    }
}

/// Persist the logged events of one batch. Yearly settlements and
/// evaluations also land in their history tables.
fn record(
    store: &SimStore,
    run_id: &str,
    tick: Tick,
    source: &str,
    events: &[SimEvent],
) -> SimResult<()> {
    for event in events.iter().filter(|e| e.is_logged()) {
        let entry = EventLogEntry {
            id: None,
            run_id: run_id.to_string(),
            tick,
            subsystem: source.to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
        };
        store.append_event(&entry)?;

        match event {
            SimEvent::TaxCollected { city_time, revenue, expenses, funds, .. } => {
                store.insert_financial_record(
                    run_id,
                    tick,
                    &FinancialRecord {
                        city_time: *city_time,
                        tax_income: *revenue,
                        operating_expenses: *expenses,
                        total_funds: *funds,
                    },
                )?;
            }
            SimEvent::EvaluationChanged {
                city_time,
                score,
                delta_score,
                population,
                class,
                approval,
            } => {
                store.insert_evaluation_record(
                    run_id,
                    tick,
                    &EvaluationRecord {
                        city_time: *city_time,
                        score: *score,
                        delta_score: *delta_score,
                        population: *population,
                        class: *class,
                        approval: *approval,
                    },
                )?;
            }
            _ => {}
        }
    }
    Ok(())
}
