//! Close one warehouse, open one warehouse, or flip a neighbor pair,
//! synthesizing the cascade of store transfers this implies (§4.F).
//!
//! This is the most intricate neighborhood: evacuating a closing warehouse
//! and filling an opening one both run a greedy transfer search that has to
//! account for transfers already staged earlier in the same move.

use rand::Rng;

use crate::instance::Instance;
use crate::state::{Position, SolutionState, Transfer};
use crate::types::{Cost, Quantity, StoreId, WarehouseId};

/// A close/open/flip move together with the transfer cascade and the set of
/// warehouses that become open/closed as a side effect.
///
/// `open_w`/`close_w` are `None` for a close-only/open-only move
/// respectively (never both `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clopen {
    pub open_w: Option<WarehouseId>,
    pub close_w: Option<WarehouseId>,
    pub index: Option<usize>,
    pub transfers: Vec<Transfer>,
    pub closings: Vec<WarehouseId>,
    pub openings: Vec<WarehouseId>,
}

impl Clopen {
    fn skeleton(open_w: Option<WarehouseId>, close_w: Option<WarehouseId>, index: Option<usize>) -> Self {
        Self {
            open_w,
            close_w,
            index,
            transfers: Vec::new(),
            closings: Vec::new(),
            openings: Vec::new(),
        }
    }
}

fn occurrences_as_from(transfers: &[Transfer], w: WarehouseId) -> usize {
    transfers.iter().filter(|t| t.from_w == w).count()
}

fn occurrences_as_to(transfers: &[Transfer], w: WarehouseId) -> usize {
    transfers.iter().filter(|t| t.to_w == w).count()
}

fn occurs_pair_store_to(transfers: &[Transfer], s: StoreId, w: WarehouseId) -> bool {
    transfers.iter().any(|t| t.to_w == w && t.store == s)
}

fn incompatible_transfers(transfers: &[Transfer], inst: &Instance, s: StoreId, w: WarehouseId) -> bool {
    transfers
        .iter()
        .any(|t| t.to_w == w && inst.incompatible(t.store, s))
}

/// Preconditions only: `open_w` currently closed (or absent), `close_w`
/// currently open (or absent), not both absent. The cascade itself is
/// checked (and, if feasible, filled in) by [`compute_and_check_involved_stores`].
pub fn feasible(inst: &Instance, st: &SolutionState, mv: &mut Clopen) -> bool {
    if let Some(w) = mv.open_w {
        if !st.closed(w) {
            return false;
        }
    }
    if let Some(w) = mv.close_w {
        if !st.open(w) {
            return false;
        }
    }
    if mv.open_w.is_none() && mv.close_w.is_none() {
        return false;
    }
    compute_and_check_involved_stores(inst, st, mv)
}

/// Plan the cascade: evacuate `close_w` (phase 1), then fill `open_w`
/// (phase 2). Mutates `mv.transfers`/`closings`/`openings` in place, even on
/// the feasible path, exactly like the reference `const` method that treats
/// those fields as the computed part of the descriptor.
fn compute_and_check_involved_stores(inst: &Instance, st: &SolutionState, mv: &mut Clopen) -> bool {
    mv.transfers.clear();
    mv.openings.clear();
    mv.closings.clear();

    if let Some(open_w) = mv.open_w {
        mv.openings.push(open_w);
    }

    let mut new_load: Quantity = 0;

    if let Some(close_w) = mv.close_w {
        mv.closings.push(close_w);
        for i in 0..st.clients(close_w) {
            let s = st.client(close_w, i);
            let q = if st.first_supplier(s) == Some(close_w) {
                st.first_quantity(s)
            } else {
                st.second_quantity(s)
            };
            let new_w = match st.best_transfer(inst, s, close_w, q, &mv.openings, &mv.transfers) {
                Some(w) => w,
                None => return false,
            };
            if Some(new_w) == mv.open_w {
                new_load += q;
            }
            mv.transfers.push(Transfer {
                store: s,
                from_w: close_w,
                to_w: new_w,
                quantity: q,
            });
            if st.closed(new_w) && !mv.openings.contains(&new_w) {
                mv.openings.push(new_w);
            }
        }
    }

    let Some(open_w) = mv.open_w else {
        return true;
    };

    let mut second_supplier_checked = false;
    let mut i = 0;
    let clients = inst.pref_cli(open_w);
    while i < clients.len() {
        let s = clients[i];
        if !st.compatible(s, open_w) || incompatible_transfers(&mv.transfers, inst, s, open_w) {
            i += 1;
            continue;
        }
        let (old_w, q) = if st.second_supplier(s).is_none() || second_supplier_checked {
            let old_w = st.first_supplier(s).expect("store has a first supplier");
            let q = st.first_quantity(s);
            i += 1;
            second_supplier_checked = false;
            (old_w, q)
        } else {
            let old_w = st.second_supplier(s).expect("second supplier present");
            let q = st.second_quantity(s);
            second_supplier_checked = true;
            (old_w, q)
        };

        if Some(old_w) == mv.close_w || occurs_pair_store_to(&mv.transfers, s, old_w) {
            continue;
        }
        if new_load + q <= inst.capacity(open_w) {
            let would_empty_old_w =
                occurrences_as_from(&mv.transfers, old_w) as isize - occurrences_as_to(&mv.transfers, old_w) as isize
                    == st.clients(old_w) as isize - 1;
            if would_empty_old_w {
                mv.closings.push(old_w);
                mv.transfers.push(Transfer {
                    store: s,
                    from_w: old_w,
                    to_w: open_w,
                    quantity: q,
                });
                new_load += q;
            } else if inst.supply_cost(s, open_w) < inst.supply_cost(s, old_w) {
                mv.transfers.push(Transfer {
                    store: s,
                    from_w: old_w,
                    to_w: open_w,
                    quantity: q,
                });
                new_load += q;
            }
        }
        if new_load == inst.capacity(open_w) {
            break;
        }
    }
    new_load > 0
}

/// Apply every staged transfer in order, consulting the *current* state at
/// each step to tell whether the transferred slot is currently first or
/// second for that store.
pub fn apply(inst: &Instance, st: &mut SolutionState, mv: &Clopen) {
    for t in &mv.transfers {
        let pos = if st.first_supplier(t.store) == Some(t.from_w) {
            Position::First
        } else {
            Position::Second
        };
        st.replace_supplier(inst, t.store, pos, t.to_w, t.quantity);
    }
}

/// Draw a family (close-only/open-only/flip) according to `close_rate`,
/// `open_rate`, and `1 - close_rate - open_rate`, then re-draw until
/// feasible.
pub fn random_move<R: Rng + ?Sized>(
    inst: &Instance,
    st: &SolutionState,
    close_rate: f64,
    open_rate: f64,
    rng: &mut R,
) -> Clopen {
    loop {
        let draw: f64 = rng.gen_range(0.0..1.0);
        let mut mv = if draw < close_rate {
            let close_w = loop {
                let w = rng.gen_range(0..inst.num_warehouses());
                if st.open(w) {
                    break w;
                }
            };
            Clopen::skeleton(None, Some(close_w), None)
        } else if draw < close_rate + open_rate {
            let open_w = loop {
                let w = rng.gen_range(0..inst.num_warehouses());
                if st.closed(w) {
                    break w;
                }
            };
            Clopen::skeleton(Some(open_w), None, None)
        } else {
            let index = rng.gen_range(0..inst.num_neighbor_pairs());
            let (mut a, mut b) = inst.neighbor_warehouses()[index];
            if st.open(a) {
                std::mem::swap(&mut a, &mut b);
            }
            Clopen::skeleton(Some(a), Some(b), Some(index))
        };
        if feasible(inst, st, &mut mv) {
            return mv;
        }
    }
}

/// Start systematic enumeration with the first open-only move
/// (`close_w=None, open_w=Some(0)`).
pub fn first_move(inst: &Instance, st: &SolutionState) -> Option<Clopen> {
    let mut mv = Clopen::skeleton(Some(0), None, None);
    if feasible(inst, st, &mut mv) {
        return Some(mv);
    }
    next_move(inst, st, &mv)
}

/// Advance `open_w` through `[0,W)`, then `close_w` through `[0,W)`, then
/// `index` through the neighbor pairs (canonicalizing pair order against
/// current openness at each step).
pub fn next_move(inst: &Instance, st: &SolutionState, mv: &Clopen) -> Option<Clopen> {
    let mut mv = mv.clone();
    loop {
        if !any_next_move(inst, st, &mut mv) {
            return None;
        }
        if feasible(inst, st, &mut mv) {
            return Some(mv);
        }
    }
}

fn any_next_move(inst: &Instance, st: &SolutionState, mv: &mut Clopen) -> bool {
    if mv.close_w.is_none() {
        let next_open = mv.open_w.unwrap_or(0) + 1;
        if next_open == inst.num_warehouses() {
            mv.open_w = None;
            mv.close_w = Some(0);
        } else {
            mv.open_w = Some(next_open);
        }
        true
    } else if mv.open_w.is_none() {
        let next_close = mv.close_w.unwrap() + 1;
        if next_close == inst.num_warehouses() {
            mv.index = Some(0);
            let (mut a, mut b) = inst.neighbor_warehouses()[0];
            if st.open(a) {
                std::mem::swap(&mut a, &mut b);
            }
            mv.open_w = Some(a);
            mv.close_w = Some(b);
        } else {
            mv.close_w = Some(next_close);
        }
        true
    } else if mv.index.map_or(-1, |i| i as isize) < inst.num_neighbor_pairs() as isize - 1 {
        let next_index = mv.index.map_or(0, |i| i + 1);
        mv.index = Some(next_index);
        let (mut a, mut b) = inst.neighbor_warehouses()[next_index];
        if st.open(a) {
            std::mem::swap(&mut a, &mut b);
        }
        mv.open_w = Some(a);
        mv.close_w = Some(b);
        true
    } else {
        false
    }
}

pub fn delta_supply(inst: &Instance, mv: &Clopen) -> Cost {
    mv.transfers
        .iter()
        .map(|t| t.quantity * (inst.supply_cost(t.store, t.to_w) - inst.supply_cost(t.store, t.from_w)))
        .sum()
}

pub fn delta_opening(inst: &Instance, mv: &Clopen) -> Cost {
    let closed: Cost = mv.closings.iter().map(|&w| inst.fixed_cost(w)).sum();
    let opened: Cost = mv.openings.iter().map(|&w| inst.fixed_cost(w)).sum();
    opened - closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PreferenceParams;

    fn two_open_warehouses() -> (Instance, SolutionState) {
        let inst = Instance::new(
            vec![10, 10],
            vec![1, 100],
            vec![5, 5],
            vec![vec![1, 5], vec![1, 5]],
            vec![],
            PreferenceParams::default(),
        )
        .unwrap();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 0);
        st.full_assign(&inst, 1, 1);
        (inst, st)
    }

    #[test]
    fn closing_the_expensive_warehouse_evacuates_all_clients() {
        let (inst, st) = two_open_warehouses();
        let mut mv = Clopen::skeleton(None, Some(1), None);
        assert!(feasible(&inst, &st, &mut mv));
        assert_eq!(mv.transfers.len(), 1);
        assert_eq!(mv.transfers[0].to_w, 0);
        assert_eq!(delta_opening(&inst, &mv), -inst.fixed_cost(1));
    }

    #[test]
    fn opening_with_no_clients_attracted_is_infeasible() {
        // single store, already served by the only warehouse that could
        // ever be cheaper for it; opening a second, pricier one attracts
        // nothing and must be rejected.
        let inst = Instance::new(
            vec![10, 10],
            vec![1, 1],
            vec![5],
            vec![vec![1, 99]],
            vec![],
            PreferenceParams::default(),
        )
        .unwrap();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 0);
        let mut mv = Clopen::skeleton(Some(1), None, None);
        assert!(!feasible(&inst, &st, &mut mv));
    }
}
