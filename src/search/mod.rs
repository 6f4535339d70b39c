//! Metaheuristic drivers wiring the three neighborhoods together (§6.D).
//!
//! Grounded in `FLP_Main.cc`'s runner wiring: `CHC`/`CSD` explore the Change
//! neighborhood alone, `CSSA` composes Change+Swap, `CSKSA`/`CSKSAtb` compose
//! all three. [`CombinedMove`] plus [`Neighborhoods`] stand in for the
//! original's `SetUnionNeighborhoodExplorer`.

use std::time::Instant;

use rand::Rng;

use crate::instance::Instance;
use crate::neighborhoods::{change, clopen, swap, Change, Clopen, Swap};
use crate::state::SolutionState;
use crate::types::Cost;

/// Which neighborhoods a run draws moves from, and at what relative rates.
///
/// `swap_rate`/`clopen_rate` are probabilities of drawing that kind of move
/// on a given iteration (the remainder goes to Change); `swap_bias` and
/// `close_rate`/`open_rate` are forwarded unchanged to the respective
/// neighborhood's own `random_move`.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhoods {
    pub include_swap: bool,
    pub include_clopen: bool,
    pub swap_rate: f64,
    pub swap_bias: f64,
    pub close_rate: f64,
    pub open_rate: f64,
}

impl Neighborhoods {
    pub fn change_only() -> Self {
        Self {
            include_swap: false,
            include_clopen: false,
            swap_rate: 0.0,
            swap_bias: 0.0,
            close_rate: 0.0,
            open_rate: 0.0,
        }
    }

    pub fn change_and_swap(swap_rate: f64, swap_bias: f64) -> Self {
        Self {
            include_swap: true,
            include_clopen: false,
            swap_rate,
            swap_bias,
            close_rate: 0.0,
            open_rate: 0.0,
        }
    }

    pub fn all(swap_rate: f64, swap_bias: f64, close_rate: f64, open_rate: f64, clopen_rate: f64) -> Self {
        let _ = clopen_rate; // the draw below derives the clopen share as the remainder
        Self {
            include_swap: true,
            include_clopen: true,
            swap_rate,
            swap_bias,
            close_rate,
            open_rate,
        }
    }

    fn draw<R: Rng + ?Sized>(&self, inst: &Instance, st: &SolutionState, clopen_rate: f64, rng: &mut R) -> CombinedMove {
        if self.include_clopen {
            let u: f64 = rng.gen_range(0.0..1.0);
            if u < clopen_rate {
                return CombinedMove::Clopen(clopen::random_move(inst, st, self.close_rate, self.open_rate, rng));
            }
            if u < clopen_rate + self.swap_rate {
                return CombinedMove::Swap(swap::random_move(inst, st, self.swap_bias, rng));
            }
            return CombinedMove::Change(change::random_move(inst, st, rng));
        }
        if self.include_swap {
            let u: f64 = rng.gen_range(0.0..1.0);
            if u < self.swap_rate {
                return CombinedMove::Swap(swap::random_move(inst, st, self.swap_bias, rng));
            }
            return CombinedMove::Change(change::random_move(inst, st, rng));
        }
        CombinedMove::Change(change::random_move(inst, st, rng))
    }
}

/// A move drawn from any of the three neighborhoods.
#[derive(Debug, Clone)]
pub enum CombinedMove {
    Change(Change),
    Swap(Swap),
    Clopen(Clopen),
}

impl CombinedMove {
    fn delta(&self, inst: &Instance, st: &SolutionState) -> Cost {
        match self {
            CombinedMove::Change(mv) => change::delta_supply(inst, st, mv) + change::delta_opening(inst, st, mv),
            CombinedMove::Swap(mv) => swap::delta_supply(inst, mv),
            CombinedMove::Clopen(mv) => clopen::delta_supply(inst, mv) + clopen::delta_opening(inst, mv),
        }
    }

    fn apply(&self, inst: &Instance, st: &mut SolutionState) {
        match self {
            CombinedMove::Change(mv) => change::apply(inst, st, mv),
            CombinedMove::Swap(mv) => swap::apply(inst, st, mv),
            CombinedMove::Clopen(mv) => clopen::apply(inst, st, mv),
        }
    }
}

/// Outcome of a completed run: elapsed wall-clock time and, for the
/// time-bounded annealer, the iteration count the JSON report wants.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub running_time: f64,
    pub iterations: Option<u64>,
}

/// `CHC`: accept the first non-worsening random Change move each round;
/// stop after `max_idle` consecutive rejections.
pub fn hill_climbing<R: Rng + ?Sized>(
    inst: &Instance,
    st: &mut SolutionState,
    max_idle: u64,
    rng: &mut R,
) -> RunOutcome {
    let start = Instant::now();
    let mut idle = 0u64;
    while idle < max_idle {
        let mv = change::random_move(inst, st, rng);
        let delta = change::delta_supply(inst, st, &mv) + change::delta_opening(inst, st, &mv);
        if delta <= 0 {
            change::apply(inst, st, &mv);
            idle = 0;
        } else {
            idle += 1;
        }
    }
    RunOutcome {
        running_time: start.elapsed().as_secs_f64(),
        iterations: None,
    }
}

/// `CSD`: scan the full Change neighborhood each round, apply the best
/// improving move found, stop at the first round with no improving move
/// (a local optimum).
pub fn steepest_descent(inst: &Instance, st: &mut SolutionState) -> RunOutcome {
    let start = Instant::now();
    loop {
        let mut best: Option<(Change, Cost)> = None;
        let mut mv = change::first_move(inst, st);
        while let Some(candidate) = mv {
            let delta = change::delta_supply(inst, st, &candidate) + change::delta_opening(inst, st, &candidate);
            let better = match &best {
                None => true,
                Some((_, best_delta)) => delta < *best_delta,
            };
            if better {
                best = Some((candidate, delta));
            }
            mv = change::next_move(inst, st, &candidate);
        }
        match best {
            Some((candidate, delta)) if delta < 0 => change::apply(inst, st, &candidate),
            _ => break,
        }
    }
    RunOutcome {
        running_time: start.elapsed().as_secs_f64(),
        iterations: None,
    }
}

/// Geometric cooling schedule shared by [`simulated_annealing`] and
/// [`simulated_annealing_time_based`]: `start_temperature`, multiplied by
/// `cooling_rate` (< 1) after every `neighbors_per_temperature` moves, until
/// it drops below `min_temperature`.
#[derive(Debug, Clone, Copy)]
pub struct CoolingSchedule {
    pub start_temperature: f64,
    pub cooling_rate: f64,
    pub min_temperature: f64,
    pub neighbors_per_temperature: u64,
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        Self {
            start_temperature: 100.0,
            cooling_rate: 0.95,
            min_temperature: 0.01,
            neighbors_per_temperature: 50,
        }
    }
}

fn metropolis_accept<R: Rng + ?Sized>(delta: Cost, temperature: f64, rng: &mut R) -> bool {
    if delta <= 0 {
        return true;
    }
    let p = (-(delta as f64) / temperature).exp();
    rng.gen_range(0.0..1.0) < p
}

/// `CSA`/`CSSA`/`CSKSA`: Metropolis acceptance over `neighborhoods`, cooling
/// geometrically until `schedule.min_temperature` is reached.
pub fn simulated_annealing<R: Rng + ?Sized>(
    inst: &Instance,
    st: &mut SolutionState,
    neighborhoods: Neighborhoods,
    clopen_rate: f64,
    schedule: CoolingSchedule,
    rng: &mut R,
) -> RunOutcome {
    let start = Instant::now();
    let mut temperature = schedule.start_temperature;
    while temperature > schedule.min_temperature {
        for _ in 0..schedule.neighbors_per_temperature {
            let mv = neighborhoods.draw(inst, st, clopen_rate, rng);
            let delta = mv.delta(inst, st);
            if metropolis_accept(delta, temperature, rng) {
                mv.apply(inst, st);
            }
        }
        temperature *= schedule.cooling_rate;
    }
    RunOutcome {
        running_time: start.elapsed().as_secs_f64(),
        iterations: None,
    }
}

/// How `CSKSAtb`'s running-time budget is derived from the instance size
/// (`FLP_Main.cc`'s `allowed_running_time`).
#[derive(Debug, Clone, Copy)]
pub enum TimeoutMode {
    Sqrt,
    Linear,
}

impl TimeoutMode {
    pub fn allowed_running_time(self, inst: &Instance, timeout_factor: f64) -> f64 {
        match self {
            TimeoutMode::Sqrt => timeout_factor * (inst.num_warehouses() as f64).sqrt(),
            TimeoutMode::Linear => inst.num_warehouses() as f64,
        }
    }
}

/// `CSKSAtb`: same Metropolis acceptance rule as [`simulated_annealing`],
/// but the schedule is driven by an elapsed-time budget rather than a fixed
/// move count, and the iteration count is tracked for the JSON report.
pub fn simulated_annealing_time_based<R: Rng + ?Sized>(
    inst: &Instance,
    st: &mut SolutionState,
    neighborhoods: Neighborhoods,
    clopen_rate: f64,
    schedule: CoolingSchedule,
    allowed_running_time: f64,
    rng: &mut R,
) -> RunOutcome {
    let start = Instant::now();
    let mut temperature = schedule.start_temperature;
    let mut iterations = 0u64;
    while start.elapsed().as_secs_f64() < allowed_running_time && temperature > schedule.min_temperature {
        for _ in 0..schedule.neighbors_per_temperature {
            let mv = neighborhoods.draw(inst, st, clopen_rate, rng);
            let delta = mv.delta(inst, st);
            if metropolis_accept(delta, temperature, rng) {
                mv.apply(inst, st);
            }
            iterations += 1;
            if start.elapsed().as_secs_f64() >= allowed_running_time {
                break;
            }
        }
        temperature *= schedule.cooling_rate;
    }
    RunOutcome {
        running_time: start.elapsed().as_secs_f64(),
        iterations: Some(iterations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PreferenceParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn toy() -> Instance {
        Instance::new(
            vec![10, 10],
            vec![100, 50],
            vec![5, 4],
            vec![vec![7, 3], vec![2, 9]],
            vec![],
            PreferenceParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn hill_climbing_never_increases_cost() {
        let inst = toy();
        let mut rng = StdRng::seed_from_u64(1);
        let mut st = crate::builders::random_state(&inst, &mut rng);
        let before = st.total_cost(&inst);
        hill_climbing(&inst, &mut st, 200, &mut rng);
        assert!(st.total_cost(&inst) <= before);
        assert!(st.check_consistency(&inst).is_ok());
    }

    #[test]
    fn steepest_descent_reaches_a_local_optimum() {
        let inst = toy();
        let mut rng = StdRng::seed_from_u64(2);
        let mut st = crate::builders::random_state(&inst, &mut rng);
        let before = st.total_cost(&inst);
        steepest_descent(&inst, &mut st);
        assert!(st.total_cost(&inst) <= before);
        assert!(change::first_move(&inst, &st).map_or(true, |mv| {
            change::delta_supply(&inst, &st, &mv) + change::delta_opening(&inst, &st, &mv) >= 0
        }));
    }

    #[test]
    fn simulated_annealing_keeps_state_consistent() {
        let inst = toy();
        let mut rng = StdRng::seed_from_u64(3);
        let mut st = crate::builders::random_state(&inst, &mut rng);
        let neighborhoods = Neighborhoods::all(0.19, 0.44, 0.33, 0.33, 0.1);
        let schedule = CoolingSchedule {
            start_temperature: 10.0,
            cooling_rate: 0.9,
            min_temperature: 1.0,
            neighbors_per_temperature: 5,
        };
        simulated_annealing(&inst, &mut st, neighborhoods, 0.1, schedule, &mut rng);
        assert!(st.check_consistency(&inst).is_ok());
    }
}
