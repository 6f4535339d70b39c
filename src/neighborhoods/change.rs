//! Single-store supplier change with automatic quantity rebalancing (§4.D).

use rand::Rng;

use crate::instance::Instance;
use crate::state::{Position, SolutionState};
use crate::types::{Cost, Quantity, StoreId, WarehouseId};

/// A candidate replacement of one of store `store`'s suppliers.
///
/// `new_q` is filled in by [`feasible`] and is only meaningful once a move
/// has been found feasible; `old_w1`/`old_w2` are snapshotted at generation
/// time purely so the delta-cost functions don't need a second state lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub store: StoreId,
    pub new_w_index: usize,
    pub new_w: WarehouseId,
    pub old_w1: WarehouseId,
    pub old_w2: Option<WarehouseId>,
    pub pos: Position,
    pub new_q: Quantity,
}

/// Checks feasibility and, if feasible, fills in `new_q`.
///
/// `(pos = First, old_w2 = Some(_))` is excluded unconditionally: once a
/// store has two suppliers, only its second slot is ever replaced by this
/// neighborhood (see spec's open question on the Change enumerator).
pub fn feasible(inst: &Instance, st: &SolutionState, mv: &mut Change) -> bool {
    if mv.new_w == mv.old_w1 || Some(mv.new_w) == mv.old_w2 {
        return false;
    }
    if !st.compatible(mv.store, mv.new_w) {
        return false;
    }
    if mv.pos == Position::First && mv.old_w2.is_some() {
        return false;
    }
    if st.residual_capacity(inst, mv.new_w) <= 0 {
        return false;
    }
    match st.check_and_compute_quantity(inst, mv.store, mv.new_w, mv.pos) {
        Some(q) => {
            mv.new_q = q;
            true
        }
        None => false,
    }
}

/// Apply `mv` to `st`, mutating the corresponding supplier slot.
pub fn apply(inst: &Instance, st: &mut SolutionState, mv: &Change) {
    match mv.pos {
        Position::First => {
            st.change_first_supplier_and_quantity(inst, mv.store, mv.new_w, mv.new_q);
        }
        Position::Second => {
            st.change_second_supplier_and_quantity(inst, mv.store, Some(mv.new_w), mv.new_q);
        }
    }
}

/// Draw a uniformly random feasible move by rejection sampling, exactly as
/// `FLP_ChangeNeighborhoodExplorer::RandomMove` does.
pub fn random_move<R: Rng + ?Sized>(inst: &Instance, st: &SolutionState, rng: &mut R) -> Change {
    loop {
        let store = rng.gen_range(0..inst.num_stores());
        let old_w1 = st.first_supplier(store).expect("store has a first supplier");
        let old_w2 = st.second_supplier(store);
        let pos = if old_w2.is_none() {
            if rng.gen_bool(0.5) {
                Position::First
            } else {
                Position::Second
            }
        } else {
            Position::Second
        };
        let pref = inst.pref_sup(store);
        let new_w_index = rng.gen_range(0..pref.len());
        let new_w = pref[new_w_index];

        let mut mv = Change {
            store,
            new_w_index,
            new_w,
            old_w1,
            old_w2,
            pos,
            new_q: 0,
        };
        if feasible(inst, st, &mut mv) {
            return mv;
        }
    }
}

/// Start systematic enumeration at `(store=0, new_w_index=0, pos=First)`,
/// advancing until a feasible move is found.
pub fn first_move(inst: &Instance, st: &SolutionState) -> Option<Change> {
    let mut mv = any_first_move(inst, st);
    if feasible(inst, st, &mut mv) {
        return Some(mv);
    }
    next_move(inst, st, &mv)
}

fn any_first_move(inst: &Instance, st: &SolutionState) -> Change {
    let store = 0;
    let new_w_index = 0;
    Change {
        store,
        new_w_index,
        new_w: inst.pref_sup(store)[new_w_index],
        old_w1: st.first_supplier(store).expect("store has a first supplier"),
        old_w2: st.second_supplier(store),
        pos: Position::First,
        new_q: 0,
    }
}

/// Advance `mv` to the next candidate in the enumeration, re-checking
/// feasibility at every step, returning `None` once the enumeration is
/// exhausted.
pub fn next_move(inst: &Instance, st: &SolutionState, mv: &Change) -> Option<Change> {
    let mut mv = *mv;
    loop {
        if !any_next_move(inst, st, &mut mv) {
            return None;
        }
        if feasible(inst, st, &mut mv) {
            return Some(mv);
        }
    }
}

fn any_next_move(inst: &Instance, st: &SolutionState, mv: &mut Change) -> bool {
    if mv.pos == Position::First {
        mv.pos = Position::Second;
        true
    } else if mv.new_w_index + 1 < inst.pref_sup(mv.store).len() {
        mv.new_w_index += 1;
        mv.new_w = inst.pref_sup(mv.store)[mv.new_w_index];
        mv.pos = Position::First;
        true
    } else if mv.store + 1 < inst.num_stores() {
        mv.store += 1;
        mv.pos = Position::First;
        mv.new_w_index = 0;
        mv.new_w = inst.pref_sup(mv.store)[mv.new_w_index];
        mv.old_w1 = st.first_supplier(mv.store).expect("store has a first supplier");
        mv.old_w2 = st.second_supplier(mv.store);
        true
    } else {
        false
    }
}

/// Incremental supply-cost delta of applying `mv`.
pub fn delta_supply(inst: &Instance, st: &SolutionState, mv: &Change) -> Cost {
    let mut cost = mv.new_q * inst.supply_cost(mv.store, mv.new_w);
    match mv.pos {
        Position::First => {
            cost -= st.first_quantity(mv.store) * inst.supply_cost(mv.store, mv.old_w1);
            // The First slot is only ever replaced when the store is still
            // single-source (the enumerator excludes First once a second
            // supplier exists), so there is normally no rebalancing term
            // here; handled anyway for symmetry with the Second branch.
            if let Some(old_w2) = mv.old_w2 {
                cost += (st.first_quantity(mv.store) - mv.new_q) * inst.supply_cost(mv.store, old_w2);
            }
        }
        Position::Second => {
            if let Some(old_w2) = mv.old_w2 {
                cost -= st.second_quantity(mv.store) * inst.supply_cost(mv.store, old_w2);
            }
            cost += (st.second_quantity(mv.store) - mv.new_q) * inst.supply_cost(mv.store, mv.old_w1);
        }
    }
    cost
}

/// Incremental opening-cost delta of applying `mv`.
pub fn delta_opening(inst: &Instance, st: &SolutionState, mv: &Change) -> Cost {
    let mut cost = 0;
    if mv.new_q > 0 && st.clients(mv.new_w) == 0 {
        cost += inst.fixed_cost(mv.new_w);
    }
    match mv.pos {
        Position::First => {
            if st.clients(mv.old_w1) == 1 {
                cost -= inst.fixed_cost(mv.old_w1);
            }
        }
        Position::Second => {
            if let Some(old_w2) = mv.old_w2 {
                if st.clients(old_w2) == 1 {
                    cost -= inst.fixed_cost(old_w2);
                }
            }
        }
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PreferenceParams;

    fn scenario_1() -> (Instance, SolutionState) {
        let inst = Instance::new(
            vec![10, 10],
            vec![100, 50],
            vec![5],
            vec![vec![7, 3]],
            vec![],
            PreferenceParams::default(),
        )
        .unwrap();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 0);
        (inst, st)
    }

    #[test]
    fn change_move_delta_matches_scenario() {
        let (inst, st) = scenario_1();
        let mv = Change {
            store: 0,
            new_w_index: 1,
            new_w: 1,
            old_w1: 0,
            old_w2: None,
            pos: Position::First,
            new_q: 5,
        };
        assert_eq!(delta_supply(&inst, &st, &mv), 5 * 3 - 5 * 7);
        assert_eq!(delta_opening(&inst, &st, &mv), 50 - 100);
    }

    #[test]
    fn enumeration_never_yields_first_with_existing_second() {
        let (inst, mut st) = scenario_1();
        st.change_second_supplier_and_quantity(&inst, 0, Some(1), 2);
        let mut mv = first_move(&inst, &st);
        let mut count = 0;
        while let Some(m) = mv {
            assert!(!(m.pos == Position::First && m.old_w2.is_some()));
            count += 1;
            mv = next_move(&inst, &st, &m);
        }
        assert!(count > 0);
    }
}
