//! Initial-state construction: random and randomized-greedy (§4.G).

use rand::Rng;
use tracing::warn;

use crate::instance::Instance;
use crate::state::SolutionState;
use crate::types::Quantity;

/// Cost reported on the sentinel JSON line emitted when greedy construction
/// fails after the retry budget (spec §6/§7, `InfeasibleGreedy`).
pub const INFEASIBLE_GREEDY_COST: i64 = 100_000_000_000;

const GREEDY_RETRY_LIMIT: usize = 50;
const GREEDY_AMORTIZATION_FACTOR: f64 = 0.25;
const GREEDY_EQUAL_TOLERANCE: f64 = 0.288;

/// 80% single-source, drawing destinations from `pref_sup[s]` by rejection
/// sampling against capacity/compatibility.
pub fn random_state<R: Rng + ?Sized>(inst: &Instance, rng: &mut R) -> SolutionState {
    let mut st = SolutionState::new(inst);
    for s in 0..inst.num_stores() {
        let single_source = rng.gen_range(1..=100) <= 80;

        let (w1, q1) = loop {
            let i = rng.gen_range(0..inst.pref_sup(s).len());
            let w = inst.pref_sup(s)[i];
            let q = if single_source {
                inst.demand(s)
            } else {
                rng.gen_range(1..inst.demand(s))
            };
            if st.compatible(s, w) && st.load(w) + q <= inst.capacity(w) {
                break (w, q);
            }
        };
        st.assign_first(inst, s, w1, q1);

        if !single_source {
            let q2 = inst.demand(s) - q1;
            let w2 = loop {
                let i = rng.gen_range(0..inst.pref_sup(s).len());
                let w = inst.pref_sup(s)[i];
                if w != w1 && st.compatible(s, w) && st.load(w) + q2 <= inst.capacity(w) {
                    break w;
                }
            };
            st.assign_second(inst, s, w2, q2);
        }
    }
    st
}

/// Repeatedly construct a greedy assignment until every store is served,
/// retrying the whole procedure up to [`GREEDY_RETRY_LIMIT`] times.
///
/// Returns `None` after exhausting the retry budget; the caller is
/// responsible for emitting the `InfeasibleGreedy` sentinel report and
/// exiting, matching the original's direct `exit(0)` from within the
/// builder (kept out of this function so library code never terminates the
/// process).
pub fn greedy_state<R: Rng + ?Sized>(inst: &Instance, rng: &mut R) -> Option<SolutionState> {
    for attempt in 1..=GREEDY_RETRY_LIMIT {
        if let Some(st) = try_greedy_once(inst, rng) {
            return Some(st);
        }
        warn!(attempt, "greedy construction attempt failed, retrying");
    }
    None
}

struct Candidate {
    store_index: usize,
    store: usize,
    warehouse: usize,
    cost: f64,
}

fn try_greedy_once<R: Rng + ?Sized>(inst: &Instance, rng: &mut R) -> Option<SolutionState> {
    let mut st = SolutionState::new(inst);
    let mut unserved: Vec<usize> = (0..inst.num_stores()).collect();

    while !unserved.is_empty() {
        let mut best: Option<Candidate> = None;
        let mut equal_bests = 0u32;

        for (i, &s) in unserved.iter().enumerate() {
            for &w in inst.pref_sup(s) {
                let has_room = st.compatible(s, w)
                    && st.residual_capacity(inst, w) > 0
                    && (st.first_supplier(s).is_none()
                        || st.residual_capacity(inst, w) >= inst.demand(s) - st.first_quantity(s));
                if !has_room {
                    continue;
                }
                let amortized_fixed_cost = if st.closed(w) {
                    GREEDY_AMORTIZATION_FACTOR * (inst.fixed_cost(w) as f64 * inst.demand(s) as f64)
                        / inst.capacity(w) as f64
                } else {
                    0.0
                };
                let cost = inst.supply_cost(s, w) as f64 + amortized_fixed_cost;

                match &best {
                    None => {
                        best = Some(Candidate {
                            store_index: i,
                            store: s,
                            warehouse: w,
                            cost,
                        });
                        equal_bests = 1;
                    }
                    Some(current) if cost < current.cost => {
                        best = Some(Candidate {
                            store_index: i,
                            store: s,
                            warehouse: w,
                            cost,
                        });
                        equal_bests = 1;
                    }
                    Some(current) if cost < current.cost + GREEDY_EQUAL_TOLERANCE => {
                        equal_bests += 1;
                        if rng.gen_range(1..=equal_bests) == 1 {
                            best = Some(Candidate {
                                store_index: i,
                                store: s,
                                warehouse: w,
                                cost: best.as_ref().unwrap().cost,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        let Some(chosen) = best else {
            return None;
        };

        if st.first_supplier(chosen.store).is_none() {
            let residual = st.residual_capacity(inst, chosen.warehouse);
            if residual >= inst.demand(chosen.store) {
                st.full_assign(inst, chosen.store, chosen.warehouse);
                unserved.remove(chosen.store_index);
            } else {
                let q: Quantity = residual;
                st.assign_first(inst, chosen.store, chosen.warehouse, q);
            }
        } else {
            let q = inst.demand(chosen.store) - st.first_quantity(chosen.store);
            st.assign_second(inst, chosen.store, chosen.warehouse, q);
            unserved.remove(chosen.store_index);
        }
    }

    Some(st)
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
    fn random_state_is_consistent() {
        let inst = toy();
        let mut rng = StdRng::seed_from_u64(42);
        let st = random_state(&inst, &mut rng);
        assert!(st.check_consistency(&inst).is_ok());
    }

    #[test]
    fn greedy_state_is_consistent_and_serves_every_store() {
        let inst = toy();
        let mut rng = StdRng::seed_from_u64(7);
        let st = greedy_state(&inst, &mut rng).expect("greedy should find a feasible state");
        assert!(st.check_consistency(&inst).is_ok());
        for s in 0..inst.num_stores() {
            assert!(st.first_supplier(s).is_some());
        }
    }
}
