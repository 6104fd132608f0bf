//! city-runner: headless runner for the city simulation.
//!
//! Usage:
//!   city-runner --seed 12345 --ticks 7680 --db run.db --data-dir ./data
//!   city-runner --seed 12345 --ipc-mode

use anyhow::{Context, Result};
use chrono::NaiveDate;
use citysim_core::{
    clock::{SimSpeed, PHASES_PER_WEEK},
    command::{PlayerCommand, QueuedCommand},
    config::SimConfig,
    edit::{self, ZoneKind},
    engine::{SimEngine, ENGINE_VERSION},
    evaluation_subsystem::{CityClass, Problem},
    store::SimStore,
    types::{Position, Tick},
    world::{Valves, WorldState},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u64 },
    Frame,
    Command { command: PlayerCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    tick: Tick,
    week: u64,
    date: NaiveDate,
    paused: bool,
    speed: SimSpeed,
    population: i64,
    res_pop: i32,
    com_pop: i32,
    ind_pop: i32,
    valves: Valves,
    funds: i64,
    tax_rate: i32,
    score: i32,
    class: CityClass,
    approval: u32,
    problems: Vec<(Problem, u32)>,
    sprites: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 10 * 48 * PHASES_PER_WEEK);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    if !ipc_mode {
        println!("city-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = SimConfig::load(data_dir)
        .or_else(|e| {
            log::warn!("{e}; falling back to built-in defaults");
            Ok::<_, anyhow::Error>(SimConfig {
                disasters_enabled: true,
                ..SimConfig::default_test()
            })
        })?;

    let store = SimStore::open(db)?;
    store.migrate()?;
    let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
    store.insert_run(&run_id, seed, ENGINE_VERSION)?;

    let mut engine = SimEngine::build(run_id.clone(), seed, store, &config);
    engine
        .edit(lay_out_demo_city)?
        .context("laying out the demo city")?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        engine.run_ticks(ticks)?;
        print_summary(&engine, &run_id, ticks)?;
    }
    Ok(())
}

/// A power plant feeding a strip of zones along one main road.
fn lay_out_demo_city(world: &mut WorldState) -> citysim_core::error::SimResult<()> {
    let cx = world.width() / 2;
    let cy = world.height() / 2;
    let road_y = cy;

    edit::lay_line(
        world,
        Position::new(cx - 20, road_y),
        Position::new(cx + 20, road_y),
        edit::lay_road,
    )?;
    edit::place_zone(world, Position::new(cx - 16, road_y - 4), ZoneKind::CoalPlant)?;
    edit::lay_line(
        world,
        Position::new(cx - 13, road_y - 3),
        Position::new(cx - 12, road_y - 3),
        edit::lay_wire,
    )?;

    let north = [
        ZoneKind::Residential,
        ZoneKind::Residential,
        ZoneKind::Residential,
        ZoneKind::Residential,
        ZoneKind::Commercial,
        ZoneKind::Commercial,
        ZoneKind::Industrial,
        ZoneKind::Industrial,
    ];
    for (i, kind) in north.iter().enumerate() {
        let x = cx - 10 + 3 * i as i32;
        edit::place_zone(world, Position::new(x, road_y - 2), *kind)?;
    }
    for i in 0..3 {
        let x = cx - 10 + 3 * i;
        edit::place_zone(world, Position::new(x, road_y + 2), ZoneKind::Residential)?;
    }
    // Carry power across the road to the southern row.
    edit::lay_wire(world, Position::new(cx - 11, road_y))?;
    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { count } => {
                engine.run_ticks(count)?;
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::Frame => {
                engine.run_frame()?;
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::Command { command } => {
                let queued =
                    QueuedCommand::new(engine.run_id.clone(), engine.clock.current_tick, command);
                log::info!(
                    "command {} ({}) at tick {}",
                    queued.command_id,
                    queued.command.type_name(),
                    queued.queued_at
                );
                match engine.apply_command(queued.command) {
                    Ok(_) => {
                        writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
                    }
                    Err(e) => {
                        log::warn!("Command refused: {e}");
                        writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                    }
                }
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> UiState {
    let world = engine.world();
    let c = &world.census;
    let e = &world.evaluation;
    UiState {
        tick: engine.clock.current_tick,
        week: engine.clock.city_time,
        date: engine.clock.city_date(),
        paused: engine.clock.paused,
        speed: engine.clock.speed,
        population: c.city_population(),
        res_pop: c.res_pop,
        com_pop: c.com_pop,
        ind_pop: c.ind_pop,
        valves: world.valves,
        funds: world.budget.funds,
        tax_rate: world.budget.tax_rate,
        score: e.score,
        class: e.class,
        approval: e.yes,
        problems: e.problems.clone(),
        sprites: world.sprites.len(),
    }
}

fn print_summary(engine: &SimEngine, run_id: &str, ticks: u64) -> Result<()> {
    let state = build_ui_state(engine);
    let store = engine.store();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");
    println!("  ticks run:      {ticks}");
    println!("  final tick:     {}", state.tick);
    println!("  date:           {}", state.date.format("%B %Y"));
    println!("  population:     {} ({:?})", state.population, state.class);
    println!("  res/com/ind:    {}/{}/{}", state.res_pop, state.com_pop, state.ind_pop);
    println!(
        "  valves:         R {} C {} I {}",
        state.valves.res, state.valves.com, state.valves.ind
    );
    println!("  funds:          ${}", state.funds);
    println!("  score:          {} (approval {}%)", state.score, state.approval);
    println!("  messages:       {}", store.event_count(run_id, "city_message")?);

    println!();
    println!("=== PROBLEMS ===");
    if state.problems.is_empty() {
        println!("  (none reported)");
    } else {
        for (problem, votes) in &state.problems {
            println!("  {problem:?}: {votes}%");
        }
    }

    println!();
    println!("=== FINANCES (Last 4 Years) ===");
    let history = store.financial_history(run_id)?;
    if history.is_empty() {
        println!("  (No years completed yet)");
    } else {
        for r in history.iter().rev().take(4).rev() {
            println!(
                "  week {:>5} | Taxes: ${} | Expenses: ${} | Funds: ${}",
                r.city_time, r.tax_income, r.operating_expenses, r.total_funds
            );
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
