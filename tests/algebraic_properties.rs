//! Property tests for the algebraic laws of §8: cost agrees with the
//! per-move delta, enumeration is total (and matches a brute-force count on
//! small instances), and every generated Swap is canonicalized `s1 < s2`.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cflp2si::instance::{Instance, PreferenceParams};
use cflp2si::neighborhoods::{change, clopen, swap};
use cflp2si::state::SolutionState;

/// A small, always-feasible instance: warehouses big enough that any store
/// can be fully served by any single warehouse, so a random single-source
/// assignment is always a valid starting point.
fn arb_instance() -> impl Strategy<Value = Instance> {
    (2usize..=4, 2usize..=5).prop_flat_map(|(num_warehouses, num_stores)| {
        let capacities = prop::collection::vec(30i64..=60, num_warehouses);
        let fixed_costs = prop::collection::vec(1i64..=50, num_warehouses);
        let demands = prop::collection::vec(2i64..=6, num_stores);
        let supply_costs = prop::collection::vec(
            prop::collection::vec(1i64..=20, num_warehouses),
            num_stores,
        );
        (capacities, fixed_costs, demands, supply_costs).prop_map(
            move |(capacity, fixed_cost, demand, supply_cost)| {
                Instance::new(
                    capacity,
                    fixed_cost,
                    demand,
                    supply_cost,
                    Vec::new(),
                    PreferenceParams::default(),
                )
                .expect("generated instance always satisfies demand/shape invariants")
            },
        )
    })
}

fn initial_state(inst: &Instance, seed: u64) -> SolutionState {
    let mut rng = StdRng::seed_from_u64(seed);
    cflp2si::builders::random_state(inst, &mut rng)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// cost(apply(sigma, m)) - cost(sigma) == delta_supply(sigma, m) + delta_opening(sigma, m)
    /// for a Change move.
    #[test]
    fn change_cost_delta_law(inst in arb_instance(), seed in any::<u64>(), draws in 1u32..10) {
        let st = initial_state(&inst, seed);
        let mut rng = StdRng::seed_from_u64(seed ^ 0xC0FFEE);
        for _ in 0..draws {
            let mv = change::random_move(&inst, &st, &mut rng);
            let before = st.total_cost(&inst);
            let delta = change::delta_supply(&inst, &st, &mv) + change::delta_opening(&inst, &st, &mv);
            let mut after_state = st.clone();
            change::apply(&inst, &mut after_state, &mv);
            let after = after_state.total_cost(&inst);
            prop_assert_eq!(after - before, delta);
            prop_assert!(after_state.check_consistency(&inst).is_ok());
        }
    }

    /// Same law for Swap (opening cost is always unaffected).
    #[test]
    fn swap_cost_delta_law(inst in arb_instance(), seed in any::<u64>(), draws in 1u32..10) {
        let st = initial_state(&inst, seed);
        let mut rng = StdRng::seed_from_u64(seed ^ 0xBEEF);
        for _ in 0..draws {
            if inst.num_stores() < 2 {
                break;
            }
            let mv = swap::random_move(&inst, &st, 0.44, &mut rng);
            let before = st.total_cost(&inst);
            let delta = swap::delta_supply(&inst, &mv);
            let mut after_state = st.clone();
            swap::apply(&inst, &mut after_state, &mv);
            let after = after_state.total_cost(&inst);
            prop_assert_eq!(after - before, delta);
            prop_assert!(after_state.check_consistency(&inst).is_ok());
        }
    }

    /// Same law for Clopen.
    #[test]
    fn clopen_cost_delta_law(inst in arb_instance(), seed in any::<u64>(), draws in 1u32..6) {
        let st = initial_state(&inst, seed);
        let mut rng = StdRng::seed_from_u64(seed ^ 0x5EED);
        for _ in 0..draws {
            let mv = clopen::random_move(&inst, &st, 0.33, 0.33, &mut rng);
            let before = st.total_cost(&inst);
            let delta = clopen::delta_supply(&inst, &mv) + clopen::delta_opening(&inst, &mv);
            let mut after_state = st.clone();
            clopen::apply(&inst, &mut after_state, &mv);
            let after = after_state.total_cost(&inst);
            prop_assert_eq!(after - before, delta);
            prop_assert!(after_state.check_consistency(&inst).is_ok());
        }
    }

    /// Every Swap move produced by either enumeration or random draw has
    /// `s1 < s2`.
    #[test]
    fn swap_moves_are_always_canonicalized(inst in arb_instance(), seed in any::<u64>()) {
        if inst.num_stores() < 2 {
            return Ok(());
        }
        let st = initial_state(&inst, seed);
        let mut rng = StdRng::seed_from_u64(seed ^ 0xA11CE);
        for _ in 0..20 {
            let mv = swap::random_move(&inst, &st, 0.44, &mut rng);
            prop_assert!(mv.s1 < mv.s2);
        }

        let mut mv = swap::first_move(&inst, &st);
        let mut count = 0;
        while let Some(m) = mv {
            prop_assert!(m.s1 < m.s2);
            count += 1;
            prop_assert!(count < 10_000, "enumeration did not terminate");
            mv = swap::next_move(&inst, &st, &m);
        }
    }

    /// Enumeration totality for Change: the enumerator visits every
    /// feasible `(store, new_w_index, pos)` triple exactly once, matching a
    /// brute-force scan over the same index space.
    #[test]
    fn change_enumeration_is_total(inst in arb_instance(), seed in any::<u64>()) {
        use cflp2si::state::Position;

        let st = initial_state(&inst, seed);

        let mut brute_force = 0usize;
        for store in 0..inst.num_stores() {
            for pos in [Position::First, Position::Second] {
                for &new_w in inst.pref_sup(store) {
                    let old_w1 = st.first_supplier(store).unwrap();
                    let old_w2 = st.second_supplier(store);
                    let mut mv = change::Change {
                        store,
                        new_w_index: 0,
                        new_w,
                        old_w1,
                        old_w2,
                        pos,
                        new_q: 0,
                    };
                    if change::feasible(&inst, &st, &mut mv) {
                        brute_force += 1;
                    }
                }
            }
        }

        let mut enumerated = 0usize;
        let mut mv = change::first_move(&inst, &st);
        while let Some(m) = mv {
            enumerated += 1;
            prop_assert!(enumerated < 10_000, "enumeration did not terminate");
            mv = change::next_move(&inst, &st, &m);
        }

        prop_assert_eq!(enumerated, brute_force);
    }
}
