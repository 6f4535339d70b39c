//! Exchange a supplier between two stores (§4.E).

use rand::Rng;

use crate::instance::Instance;
use crate::state::{Position, SolutionState};
use crate::types::{Cost, Quantity, StoreId, WarehouseId};

/// A candidate exchange of the supplier serving `s1` at `pos1` with the one
/// serving `s2` at `pos2`. Always canonicalized so `s1 < s2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub s1: StoreId,
    pub pos1: Position,
    pub w1: WarehouseId,
    pub q1: Quantity,
    pub s2: StoreId,
    pub pos2: Position,
    pub w2: WarehouseId,
    pub q2: Quantity,
}

fn canonicalize(mv: &mut Swap) {
    if mv.s2 < mv.s1 {
        std::mem::swap(&mut mv.s1, &mut mv.s2);
        std::mem::swap(&mut mv.w1, &mut mv.w2);
        std::mem::swap(&mut mv.q1, &mut mv.q2);
        std::mem::swap(&mut mv.pos1, &mut mv.pos2);
    }
}

/// `w1 != w2`, enough residual capacity to absorb the flow difference at
/// each destination, and compatibility: if `s1`/`s2` are themselves
/// incompatible the swap must be the thing that *removes* that single
/// incompatibility (`almost_compatible` at both destinations); otherwise
/// plain compatibility is required at both destinations.
pub fn feasible(inst: &Instance, st: &SolutionState, mv: &Swap) -> bool {
    if mv.w1 == mv.w2 {
        return false;
    }
    if st.residual_capacity(inst, mv.w2) < mv.q1 - mv.q2 {
        return false;
    }
    if st.residual_capacity(inst, mv.w1) < mv.q2 - mv.q1 {
        return false;
    }
    if inst.incompatible(mv.s1, mv.s2) {
        st.almost_compatible(mv.s1, mv.w2) && st.almost_compatible(mv.s2, mv.w1)
    } else {
        st.compatible(mv.s1, mv.w2) && st.compatible(mv.s2, mv.w1)
    }
}

/// Apply the exchange: two `replace_supplier` calls, `s1` first (the
/// quantity fixed for `s2`'s call is the pre-move `q2`, decided up front).
pub fn apply(inst: &Instance, st: &mut SolutionState, mv: &Swap) {
    st.replace_supplier(inst, mv.s1, mv.pos1, mv.w2, mv.q1);
    st.replace_supplier(inst, mv.s2, mv.pos2, mv.w1, mv.q2);
}

fn slot_of(st: &SolutionState, s: StoreId, pos: Position) -> (WarehouseId, Quantity) {
    match pos {
        Position::First => (
            st.first_supplier(s).expect("store has a first supplier"),
            st.first_quantity(s),
        ),
        Position::Second => (
            st.second_supplier(s).expect("slot is a second supplier"),
            st.second_quantity(s),
        ),
    }
}

/// `s2` drawn among `w1`'s preferred clients (`RandomMove`, the version
/// actually wired into the driver — faster than drawing `s2` fully at
/// random because fewer candidates are infeasible).
pub fn random_move<R: Rng + ?Sized>(
    inst: &Instance,
    st: &SolutionState,
    bias: f64,
    rng: &mut R,
) -> Swap {
    loop {
        let s1 = rng.gen_range(0..inst.num_stores());
        let pos1 = if st.second_supplier(s1).is_some() {
            if rng.gen_range(0.0..1.0) <= bias {
                Position::Second
            } else if rng.gen_bool(0.5) {
                Position::Second
            } else {
                Position::First
            }
        } else {
            Position::First
        };
        let (w1, q1) = slot_of(st, s1, pos1);

        let s2 = loop {
            let clients = inst.pref_cli(w1);
            let candidate = clients[rng.gen_range(0..clients.len())];
            if candidate != s1 {
                break candidate;
            }
        };
        let pos2 = if st.second_supplier(s2).is_some() {
            if rng.gen_range(0.0..1.0) <= bias {
                Position::Second
            } else if rng.gen_bool(0.5) {
                Position::Second
            } else {
                Position::First
            }
        } else {
            Position::First
        };
        let (w2, q2) = slot_of(st, s2, pos2);

        let mut mv = Swap {
            s1,
            pos1,
            w1,
            q1,
            s2,
            pos2,
            w2,
            q2,
        };
        if feasible(inst, st, &mv) {
            canonicalize(&mut mv);
            return mv;
        }
    }
}

/// Start systematic enumeration at `(s1=0, s2=1, pos1=First, pos2=First)`.
pub fn first_move(inst: &Instance, st: &SolutionState) -> Option<Swap> {
    let mut mv = any_first_move(st);
    if feasible(inst, st, &mv) {
        canonicalize(&mut mv);
        return Some(mv);
    }
    next_move(inst, st, &mv)
}

fn any_first_move(st: &SolutionState) -> Swap {
    let (w1, q1) = slot_of(st, 0, Position::First);
    let (w2, q2) = slot_of(st, 1, Position::First);
    Swap {
        s1: 0,
        pos1: Position::First,
        w1,
        q1,
        s2: 1,
        pos2: Position::First,
        w2,
        q2,
    }
}

/// Lexicographic advance over `(s1, s2 > s1, pos1, pos2)`.
pub fn next_move(inst: &Instance, st: &SolutionState, mv: &Swap) -> Option<Swap> {
    let mut mv = *mv;
    loop {
        if !any_next_move(inst, st, &mut mv) {
            return None;
        }
        if feasible(inst, st, &mv) {
            let mut out = mv;
            canonicalize(&mut out);
            return Some(out);
        }
    }
}

fn any_next_move(inst: &Instance, st: &SolutionState, mv: &mut Swap) -> bool {
    if mv.pos2 == Position::First && st.second_supplier(mv.s2).is_some() {
        mv.pos2 = Position::Second;
        let (w2, q2) = slot_of(st, mv.s2, mv.pos2);
        mv.w2 = w2;
        mv.q2 = q2;
        true
    } else if mv.pos1 == Position::First && st.second_supplier(mv.s1).is_some() {
        mv.pos1 = Position::Second;
        let (w1, q1) = slot_of(st, mv.s1, mv.pos1);
        mv.w1 = w1;
        mv.q1 = q1;
        mv.pos2 = Position::First;
        let (w2, q2) = slot_of(st, mv.s2, mv.pos2);
        mv.w2 = w2;
        mv.q2 = q2;
        true
    } else if mv.s2 + 1 < inst.num_stores() {
        mv.s2 += 1;
        mv.pos1 = Position::First;
        let (w1, q1) = slot_of(st, mv.s1, mv.pos1);
        mv.w1 = w1;
        mv.q1 = q1;
        mv.pos2 = Position::First;
        let (w2, q2) = slot_of(st, mv.s2, mv.pos2);
        mv.w2 = w2;
        mv.q2 = q2;
        true
    } else if mv.s1 + 2 < inst.num_stores() {
        mv.s1 += 1;
        mv.pos1 = Position::First;
        let (w1, q1) = slot_of(st, mv.s1, mv.pos1);
        mv.w1 = w1;
        mv.q1 = q1;
        mv.s2 = mv.s1 + 1;
        mv.pos2 = Position::First;
        let (w2, q2) = slot_of(st, mv.s2, mv.pos2);
        mv.w2 = w2;
        mv.q2 = q2;
        true
    } else {
        false
    }
}

/// Incremental supply-cost delta; opening cost is unaffected since a swap
/// can neither close nor newly open a warehouse.
pub fn delta_supply(inst: &Instance, mv: &Swap) -> Cost {
    mv.q1 * (inst.supply_cost(mv.s1, mv.w2) - inst.supply_cost(mv.s1, mv.w1))
        + mv.q2 * (inst.supply_cost(mv.s2, mv.w1) - inst.supply_cost(mv.s2, mv.w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PreferenceParams;

    #[test]
    fn canonicalizes_so_s1_is_smaller() {
        let mut mv = Swap {
            s1: 3,
            pos1: Position::First,
            w1: 0,
            q1: 1,
            s2: 1,
            pos2: Position::First,
            w2: 1,
            q2: 1,
        };
        canonicalize(&mut mv);
        assert_eq!(mv.s1, 1);
        assert_eq!(mv.s2, 3);
    }

    #[test]
    fn delta_supply_matches_formula() {
        let inst = Instance::new(
            vec![4, 4],
            vec![1, 1],
            vec![4, 4],
            vec![vec![1, 9], vec![1, 9]],
            vec![],
            PreferenceParams::default(),
        )
        .unwrap();
        let mv = Swap {
            s1: 0,
            pos1: Position::First,
            w1: 0,
            q1: 4,
            s2: 1,
            pos2: Position::First,
            w2: 0,
            q2: 4,
        };
        let expected = 4 * (9 - 1) + 4 * (1 - 9);
        assert_eq!(delta_supply(&inst, &mv), expected);
    }
}
