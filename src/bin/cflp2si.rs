//! CLI entry point (§6.C): parses an instance file, builds an initial state,
//! runs the selected metaheuristic, and prints the single-line JSON report
//! (or writes a pretty-printed solution when `--output-file` is set).
//!
//! Grounded in `FLP_Main.cc`'s parameter wiring and the same field order for
//! the reported JSON.

use std::fs;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, info_span};

use cflp2si::instance::{parser, Instance, PreferenceParams};
use cflp2si::search::{
    self, CoolingSchedule, Neighborhoods, RunOutcome, TimeoutMode,
};
use cflp2si::state::SolutionState;
use cflp2si::{builders, io, report, Error};

/// Local-search solver for the capacitated facility location problem with
/// two-source supply and store incompatibilities.
#[derive(Debug, Parser)]
#[command(name = "cflp2si", rename_all = "kebab-case")]
struct Args {
    /// Input instance file (`main::instance`). Required; checked by hand
    /// (rather than via clap's `required`) so a missing value exits with
    /// code 1 and a diagnostic, matching `FLP_Main.cc`'s own check, instead
    /// of clap's usage-error exit code.
    #[arg(long = "main::instance")]
    instance: Option<String>,

    /// PRNG seed (`main::seed`). Defaults to a fixed value so runs are
    /// reproducible when unset, matching the fact that the original only
    /// reseeds the global generator when the option is explicitly set.
    #[arg(long = "main::seed")]
    seed: Option<u64>,

    /// Solution method (`main::method`): CHC, CSD, CSA, CSSA, CSKSA,
    /// CSKSAtb.
    #[arg(long = "main::method")]
    method: String,

    /// Path to a file holding a pre-built initial state (`main::init_state`).
    /// When set, takes priority over `init_state_strategy`.
    #[arg(long = "main::init_state")]
    init_state: Option<String>,

    /// Initial-state construction strategy (`main::init_state_strategy`):
    /// `greedy` (default) or `random`.
    #[arg(long = "main::init_state_strategy", default_value = "greedy")]
    init_state_strategy: String,

    /// Write the pretty-printed solution to this file instead of printing
    /// the JSON report to stdout (`main::output_file`).
    #[arg(long = "main::output_file")]
    output_file: Option<String>,

    /// Probability of drawing a Swap move (`main::swap_rate`).
    #[arg(long = "main::swap_rate", default_value_t = 0.19)]
    swap_rate: f64,

    /// Bias toward replacing a store's second supplier in a Swap draw
    /// (`main::swap_bias`).
    #[arg(long = "main::swap_bias", default_value_t = 0.44)]
    swap_bias: f64,

    /// Probability, within a Clopen draw, of a close-only move
    /// (`main::close_irate`).
    #[arg(long = "main::close_irate", default_value_t = 0.33)]
    close_irate: f64,

    /// Probability, within a Clopen draw, of an open-only move
    /// (`main::open_irate`).
    #[arg(long = "main::open_irate", default_value_t = 0.33)]
    open_irate: f64,

    /// Probability of drawing a Clopen move (`main::clopen_rate`).
    #[arg(long = "main::clopen_rate", default_value_t = 0.1)]
    clopen_rate: f64,

    /// Multiplier for the time-based annealer's running-time budget
    /// (`main::timeout_factor`).
    #[arg(long = "main::timeout_factor", default_value_t = 10.0)]
    timeout_factor: f64,

    /// Running-time budget formula for `CSKSAtb` (`main::timeout_mode`):
    /// `sqrt` (default) or `linear`.
    #[arg(long = "main::timeout_mode", default_value = "sqrt")]
    timeout_mode: String,

    /// Ratio used to size the preferred-supplier shortlist
    /// (`input::sqrt_ratio_preferred`).
    #[arg(long = "input::sqrt_ratio_preferred", default_value_t = 1.0)]
    sqrt_ratio_preferred: f64,

    /// Threshold-widening tolerance for the preferred-supplier shortlist
    /// (`input::diff_threshold`).
    #[arg(long = "input::diff_threshold", default_value_t = 100)]
    diff_threshold: i64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> cflp2si::Result<()> {
    let Some(instance_path) = &args.instance else {
        return Err(Error::Parameter(
            "--main::instance filename option must always be set".to_string(),
        ));
    };

    let seed = args.seed.unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(seed);

    let params = PreferenceParams {
        sqrt_ratio_preferred: args.sqrt_ratio_preferred,
        diff_threshold: args.diff_threshold,
    };

    let inst = {
        let _span = info_span!("load_instance", path = %instance_path).entered();
        let text = fs::read_to_string(instance_path)?;
        parser::parse(&text, params)?
    };
    info!(
        warehouses = inst.num_warehouses(),
        stores = inst.num_stores(),
        "instance loaded"
    );

    let neighborhoods = Neighborhoods::all(
        args.swap_rate,
        args.swap_bias,
        args.close_irate,
        args.open_irate,
        args.clopen_rate,
    );

    let init_start = Instant::now();
    let init_state = {
        let _span = info_span!("build_initial_state", strategy = %args.init_state_strategy).entered();
        build_initial_state(&args, &inst, &mut rng)?
    };
    let Some(init_state) = init_state else {
        let line = report::GreedyFailureReport::default().to_json_line();
        println!("{line}");
        return Ok(());
    };
    let init_time = init_start.elapsed().as_secs_f64();
    let init_supply = init_state.supply_cost(&inst);
    let init_opening = init_state.opening_cost(&inst);
    let init_cost = init_supply + init_opening;

    let mut state = init_state.clone();
    let outcome = {
        let _span = info_span!("search", method = %args.method).entered();
        run_method(&args, &inst, &mut state, neighborhoods, &mut rng)?
    };

    let supply = state.supply_cost(&inst);
    let opening = state.opening_cost(&inst);
    let cost = supply + opening;
    let consistent = if state.check_consistency(&inst).is_ok() {
        "yes"
    } else {
        "no"
    };
    let ss_ratio = state.number_of_single_source_stores() as f64 / inst.num_stores() as f64;
    let open_ratio = state.number_of_open_warehouses() as f64 / inst.num_warehouses() as f64;

    if let Some(path) = &args.output_file {
        let pretty = io::pretty_print(&state, &inst);
        let body = format!(
            "{pretty}\nCost: {cost}\nTime: {}s",
            outcome.running_time + init_time
        );
        fs::write(path, body)?;
        return Ok(());
    }

    let run_report = report::RunReport {
        cost,
        supply,
        opening,
        init_cost,
        init_supply,
        init_opening,
        init_time,
        time: outcome.running_time,
        consistent,
        ss_ratio,
        open_ratio,
        iterations: outcome.iterations,
        seed,
    };
    println!("{}", run_report.to_json_line());
    Ok(())
}

fn build_initial_state(
    args: &Args,
    inst: &Instance,
    rng: &mut StdRng,
) -> cflp2si::Result<Option<SolutionState>> {
    if let Some(path) = &args.init_state {
        let text = fs::read_to_string(path)?;
        return Ok(Some(io::read_solution(&text, inst)?));
    }
    match args.init_state_strategy.as_str() {
        "greedy" => Ok(builders::greedy_state(inst, rng)),
        "random" => Ok(Some(builders::random_state(inst, rng))),
        other => Err(Error::UnknownInitStrategy(other.to_string())),
    }
}

fn run_method(
    args: &Args,
    inst: &Instance,
    state: &mut SolutionState,
    neighborhoods: Neighborhoods,
    rng: &mut StdRng,
) -> cflp2si::Result<RunOutcome> {
    let schedule = CoolingSchedule::default();
    match args.method.as_str() {
        "CHC" => Ok(search::hill_climbing(inst, state, 1000, rng)),
        "CSD" => Ok(search::steepest_descent(inst, state)),
        "CSA" => Ok(search::simulated_annealing(
            inst,
            state,
            Neighborhoods::change_only(),
            0.0,
            schedule,
            rng,
        )),
        "CSSA" => Ok(search::simulated_annealing(
            inst,
            state,
            Neighborhoods::change_and_swap(args.swap_rate, args.swap_bias),
            0.0,
            schedule,
            rng,
        )),
        "CSKSA" => Ok(search::simulated_annealing(
            inst,
            state,
            neighborhoods,
            args.clopen_rate,
            schedule,
            rng,
        )),
        "CSKSAtb" => {
            let timeout_mode = match args.timeout_mode.as_str() {
                "sqrt" => TimeoutMode::Sqrt,
                "linear" => TimeoutMode::Linear,
                other => return Err(Error::UnknownMethod(format!("timeout_mode {other}"))),
            };
            let allowed_running_time = timeout_mode.allowed_running_time(inst, args.timeout_factor);
            Ok(search::simulated_annealing_time_based(
                inst,
                state,
                neighborhoods,
                args.clopen_rate,
                schedule,
                allowed_running_time,
                rng,
            ))
        }
        other => Err(Error::UnknownMethod(other.to_string())),
    }
}
