//! Incremental solution state: who supplies each store, how much is loaded
//! onto each warehouse, and the bookkeeping the neighborhood explorers read
//! and mutate in O(1)/O(|clients|) per move (§4.B).
//!
//! A [`SolutionState`] never stores a reference to the [`Instance`] it was
//! built for; every mutator that needs instance data takes `&Instance`
//! explicitly. This keeps the state cheap to clone (simulated annealing and
//! the metaheuristic runners keep a "current" and a "best" copy around) and
//! avoids threading a lifetime parameter through every neighborhood type.

use crate::instance::Instance;
use crate::types::{Cost, Quantity, StoreId, WarehouseId};

/// Which of a store's two supplier slots a move or a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    First,
    Second,
}

/// A single-unit transfer of `quantity` of a store's demand from one
/// warehouse to another, as synthesized while exploring a [`crate::neighborhoods::clopen`]
/// move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub store: StoreId,
    pub from_w: WarehouseId,
    pub to_w: WarehouseId,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, Copy, Default)]
struct Assignment {
    w1: Option<WarehouseId>,
    q1: Quantity,
    w2: Option<WarehouseId>,
    q2: Quantity,
}

/// The mutable part of a CFLP-2S-I solution: per-store supplier assignment,
/// per-warehouse load, the store/warehouse incompatibility counters, and the
/// per-warehouse client lists.
#[derive(Debug, Clone)]
pub struct SolutionState {
    assignment: Vec<Assignment>,
    load: Vec<Quantity>,
    /// `incompatible[s][w]`: number of stores incompatible with `s` that are
    /// currently assigned (as first or second supplier) to `w`.
    incompatible: Vec<Vec<u32>>,
    client_list: Vec<Vec<StoreId>>,
}

impl SolutionState {
    /// An empty state: no store assigned, every warehouse closed.
    pub fn new(inst: &Instance) -> Self {
        Self {
            assignment: vec![Assignment::default(); inst.num_stores()],
            load: vec![0; inst.num_warehouses()],
            incompatible: vec![vec![0; inst.num_warehouses()]; inst.num_stores()],
            client_list: vec![Vec::new(); inst.num_warehouses()],
        }
    }

    /// Clear every assignment, load, incompatibility counter, and client
    /// list back to the empty state, reusing the existing allocations.
    pub fn reset(&mut self) {
        for a in &mut self.assignment {
            *a = Assignment::default();
        }
        for row in &mut self.incompatible {
            row.iter_mut().for_each(|c| *c = 0);
        }
        for c in &mut self.client_list {
            c.clear();
        }
        for l in &mut self.load {
            *l = 0;
        }
    }

    // ---- queries -------------------------------------------------------

    pub fn first_supplier(&self, s: StoreId) -> Option<WarehouseId> {
        self.assignment[s].w1
    }

    pub fn second_supplier(&self, s: StoreId) -> Option<WarehouseId> {
        self.assignment[s].w2
    }

    pub fn first_quantity(&self, s: StoreId) -> Quantity {
        self.assignment[s].q1
    }

    pub fn second_quantity(&self, s: StoreId) -> Quantity {
        self.assignment[s].q2
    }

    pub fn supplier(&self, s: StoreId, pos: Position) -> Option<WarehouseId> {
        match pos {
            Position::First => self.first_supplier(s),
            Position::Second => self.second_supplier(s),
        }
    }

    pub fn quantity(&self, s: StoreId, pos: Position) -> Quantity {
        match pos {
            Position::First => self.first_quantity(s),
            Position::Second => self.second_quantity(s),
        }
    }

    pub fn load(&self, w: WarehouseId) -> Quantity {
        self.load[w]
    }

    pub fn open(&self, w: WarehouseId) -> bool {
        self.load[w] > 0
    }

    pub fn closed(&self, w: WarehouseId) -> bool {
        self.load[w] == 0
    }

    pub fn residual_capacity(&self, inst: &Instance, w: WarehouseId) -> Quantity {
        inst.capacity(w) - self.load[w]
    }

    pub fn compatible(&self, s: StoreId, w: WarehouseId) -> bool {
        self.incompatible[s][w] == 0
    }

    /// True when exactly one store incompatible with `s` currently sits at
    /// `w`: removing that single store (as a [`crate::neighborhoods::swap`]
    /// move does for its own counterpart) would make `w` compatible again.
    pub fn almost_compatible(&self, s: StoreId, w: WarehouseId) -> bool {
        self.incompatible[s][w] == 1
    }

    pub fn clients(&self, w: WarehouseId) -> usize {
        self.client_list[w].len()
    }

    pub fn client(&self, w: WarehouseId, i: usize) -> StoreId {
        self.client_list[w][i]
    }

    pub fn client_list(&self, w: WarehouseId) -> &[StoreId] {
        &self.client_list[w]
    }

    // ---- mutators (building an initial state from empty) ---------------

    /// Assign `s` to `w1`, starting from an empty (or at least first-empty)
    /// slot. Does not touch the second slot.
    pub fn assign_first(&mut self, inst: &Instance, s: StoreId, w: WarehouseId, q: Quantity) {
        self.assignment[s].w1 = Some(w);
        self.assignment[s].q1 = q;
        self.client_list[w].push(s);
        self.load[w] += q;
        self.bump_incompatible(inst, s, w, 1);
    }

    /// Assign `s` to `w2`, starting from an empty second slot, then restore
    /// the cheaper-first ordering invariant.
    pub fn assign_second(&mut self, inst: &Instance, s: StoreId, w: WarehouseId, q: Quantity) {
        self.assignment[s].w2 = Some(w);
        self.assignment[s].q2 = q;
        self.client_list[w].push(s);
        self.load[w] += q;
        self.bump_incompatible(inst, s, w, 1);
        self.reorder_suppliers(inst, s);
    }

    /// Assign the whole demand of `s` to `w`, clearing any second supplier.
    pub fn full_assign(&mut self, inst: &Instance, s: StoreId, w: WarehouseId) {
        let demand = inst.demand(s);
        self.assignment[s].w1 = Some(w);
        self.assignment[s].q1 = demand;
        self.client_list[w].push(s);
        self.load[w] += demand;
        self.bump_incompatible(inst, s, w, 1);
        self.assignment[s].w2 = None;
        self.assignment[s].q2 = 0;
    }

    fn bump_incompatible(&mut self, inst: &Instance, s: StoreId, w: WarehouseId, delta: i32) {
        for &s2 in inst.incompat_of(s) {
            let counter = &mut self.incompatible[s2][w];
            *counter = (*counter as i32 + delta) as u32;
        }
    }

    /// Restore the invariant that the first supplier is never costlier than
    /// the second, swapping both slots if needed.
    fn reorder_suppliers(&mut self, inst: &Instance, s: StoreId) {
        if let Some(w2) = self.assignment[s].w2 {
            let w1 = self.assignment[s].w1.expect("first supplier is never empty once assigned");
            if inst.supply_cost(s, w1) > inst.supply_cost(s, w2) {
                self.assignment[s].w1 = Some(w2);
                self.assignment[s].w2 = Some(w1);
                std::mem::swap(&mut self.assignment[s].q1, &mut self.assignment[s].q2);
            }
        }
    }

    // ---- mutators (moves on an already-assigned state) ------------------

    /// Move `s`'s first supplier to `new_w` with quantity `new_q`; the
    /// second supplier's quantity is adjusted to keep the demand covered.
    pub fn change_first_supplier_and_quantity(
        &mut self,
        inst: &Instance,
        s: StoreId,
        new_w: WarehouseId,
        new_q: Quantity,
    ) {
        let old_w1 = self.assignment[s].w1.expect("store has a first supplier");
        let old_w2 = self.assignment[s].w2;
        let old_q1 = self.assignment[s].q1;
        let old_q2 = self.assignment[s].q2;
        let new_q2 = inst.demand(s) - new_q;

        self.assignment[s].w1 = Some(new_w);
        self.assignment[s].q1 = new_q;
        self.assignment[s].q2 = new_q2;

        self.client_list[new_w].push(s);
        remove_element(&mut self.client_list[old_w1], s);

        self.load[new_w] += new_q;
        self.load[old_w1] -= old_q1;
        if let Some(w2) = old_w2 {
            self.load[w2] += new_q2 - old_q2;
        }

        for &s2 in inst.incompat_of(s) {
            self.incompatible[s2][new_w] += 1;
            self.incompatible[s2][old_w1] -= 1;
        }
        self.reorder_suppliers(inst, s);
    }

    /// Move `s`'s second supplier to `new_w` with quantity `new_q`
    /// (`new_w` may be absent, i.e. the store becomes single-sourced); the
    /// first supplier's quantity is adjusted to keep the demand covered.
    pub fn change_second_supplier_and_quantity(
        &mut self,
        inst: &Instance,
        s: StoreId,
        new_w: Option<WarehouseId>,
        new_q: Quantity,
    ) {
        let old_w1 = self.assignment[s].w1.expect("store has a first supplier");
        let old_w2 = self.assignment[s].w2;
        let old_q1 = self.assignment[s].q1;
        let old_q2 = self.assignment[s].q2;
        let new_q1 = inst.demand(s) - new_q;

        // a quantity driven to 0 means no second supplier after all, matching
        // CheckAndComputeQuantity's "give everything to w1" outcome.
        let new_w = if new_q == 0 { None } else { new_w };

        self.assignment[s].w2 = new_w;
        self.assignment[s].q2 = new_q;
        self.assignment[s].q1 = new_q1;

        if let Some(w) = new_w {
            self.client_list[w].push(s);
        }
        if let Some(w) = old_w2 {
            remove_element(&mut self.client_list[w], s);
        }

        if let Some(w) = new_w {
            self.load[w] += new_q;
        }
        if let Some(w) = old_w2 {
            self.load[w] -= old_q2;
        }
        self.load[old_w1] += new_q1 - old_q1;

        for &s2 in inst.incompat_of(s) {
            if let Some(w) = new_w {
                self.incompatible[s2][w] += 1;
            }
            if let Some(w) = old_w2 {
                self.incompatible[s2][w] -= 1;
            }
        }
        self.reorder_suppliers(inst, s);
    }

    /// Replace the supplier at `pos` with `new_w` carrying quantity `q`.
    ///
    /// `q` is passed in rather than recomputed because a
    /// [`crate::neighborhoods::swap`] move calls this twice in a row and the
    /// second call must use the quantity fixed by the first. If `new_w`
    /// happens to equal the store's *other* supplier, the two slots are
    /// merged into a single first-supplier assignment.
    pub fn replace_supplier(
        &mut self,
        inst: &Instance,
        s: StoreId,
        pos: Position,
        new_w: WarehouseId,
        q: Quantity,
    ) {
        let (old_w, other_old_w): (WarehouseId, Option<WarehouseId>) = match pos {
            Position::First => {
                let old_w = self.assignment[s].w1.expect("store has a first supplier");
                let other = self.assignment[s].w2;
                self.assignment[s].w1 = Some(new_w);
                (old_w, other)
            }
            Position::Second => {
                let old_w = self.assignment[s]
                    .w2
                    .expect("replace_supplier(Second) requires an existing second supplier");
                let other = self.assignment[s].w1;
                self.assignment[s].w2 = Some(new_w);
                (old_w, Some(other))
            }
        };

        self.load[new_w] += q;
        remove_element(&mut self.client_list[old_w], s);
        self.load[old_w] -= q;

        let merges = other_old_w == Some(new_w);
        for &s2 in inst.incompat_of(s) {
            if !merges {
                self.incompatible[s2][new_w] += 1;
            }
            self.incompatible[s2][old_w] -= 1;
        }

        if !merges {
            self.client_list[new_w].push(s);
            self.reorder_suppliers(inst, s);
        } else {
            self.assignment[s].q1 += self.assignment[s].q2;
            self.assignment[s].q2 = 0;
            self.assignment[s].w2 = None;
        }
    }

    // ---- feasibility / planning helpers ---------------------------------

    /// The quantity that would be assigned to `new_w` if it replaced the
    /// supplier in slot `pos`, or `None` if no feasible quantity exists.
    ///
    /// Mirrors `CheckAndComputeQuantity` exactly, including the asymmetric
    /// handling of "introducing a second supplier" (slot `Second`, currently
    /// empty): the move is rejected outright if `new_w` is not at least as
    /// cheap as the current first supplier, and one unit is always left with
    /// the first supplier so it is never fully displaced by this path.
    pub fn check_and_compute_quantity(
        &self,
        inst: &Instance,
        s: StoreId,
        new_w: WarehouseId,
        pos: Position,
    ) -> Option<Quantity> {
        let w1 = self.assignment[s].w1.expect("store has a first supplier");
        let w2 = self.assignment[s].w2;
        let q2 = self.assignment[s].q2;

        match (pos, w2) {
            (Position::Second, Some(_)) => {
                let rc_w1 = self.residual_capacity(inst, w1);
                let rc_new = self.residual_capacity(inst, new_w);
                if rc_w1 + rc_new < q2 {
                    return None;
                }
                if inst.supply_cost(s, w1) < inst.supply_cost(s, new_w) {
                    if q2 <= rc_w1 {
                        Some(0)
                    } else {
                        Some(q2 - rc_w1)
                    }
                } else if q2 <= rc_new {
                    Some(q2)
                } else {
                    Some(rc_new)
                }
            }
            (Position::First, None) => {
                let q1 = self.assignment[s].q1;
                let rc_new = self.residual_capacity(inst, new_w);
                if rc_new < q1 {
                    None
                } else {
                    Some(inst.demand(s))
                }
            }
            _ => {
                // Position::Second with an empty second slot: introduce a
                // second supplier, splitting off part of the first's load.
                if inst.supply_cost(s, w1) < inst.supply_cost(s, new_w) {
                    return None;
                }
                let rc_new = self.residual_capacity(inst, new_w);
                let demand_minus_one = inst.demand(s) - 1;
                if demand_minus_one <= rc_new {
                    Some(demand_minus_one)
                } else {
                    Some(rc_new)
                }
            }
        }
    }

    /// Residual capacity of `w` after hypothetically applying `transfers`
    /// (each `to_w` consumes capacity, each `from_w` frees it back up).
    pub fn revised_residual_capacity(
        &self,
        inst: &Instance,
        w: WarehouseId,
        transfers: &[Transfer],
    ) -> Quantity {
        let mut rc = self.residual_capacity(inst, w);
        for t in transfers {
            if t.to_w == w {
                rc -= t.quantity;
            } else if t.from_w == w {
                rc += t.quantity;
            }
        }
        rc
    }

    /// Cheapest warehouse that can absorb `q` units of `s`'s demand away
    /// from `old_w`, given that the warehouses in `assumed_open` are (or
    /// will be) open and `planned_transfers` have already been committed to
    /// the plan. Returns `None` if no candidate has room.
    pub fn best_transfer(
        &self,
        inst: &Instance,
        s: StoreId,
        old_w: WarehouseId,
        q: Quantity,
        assumed_open: &[WarehouseId],
        planned_transfers: &[Transfer],
    ) -> Option<WarehouseId> {
        let mut best: Option<(WarehouseId, Cost)> = None;
        for &new_w in inst.pref_sup(s) {
            if new_w == old_w || !self.compatible(s, new_w) {
                continue;
            }
            if self.revised_residual_capacity(inst, new_w, planned_transfers) < q {
                continue;
            }
            if self.open(new_w) || assumed_open.contains(&new_w) {
                // the first preferred supplier that is already (or about to
                // be) open is the cheapest usable one, since pref_sup is
                // cost-ordered.
                return Some(new_w);
            }
            let cost = inst.fixed_cost(new_w) + q * inst.supply_cost(s, new_w);
            let better = match best {
                None => true,
                Some((_, best_cost)) => cost < best_cost,
            };
            if better {
                best = Some((new_w, cost));
            }
        }
        best.map(|(w, _)| w)
    }

    // ---- aggregate cost / diagnostics ------------------------------------

    /// Full supply cost: sum over stores of quantity times per-unit cost for
    /// each assigned supplier.
    pub fn supply_cost(&self, inst: &Instance) -> Cost {
        let mut cost = 0;
        for s in 0..self.assignment.len() {
            let a = &self.assignment[s];
            cost += a.q1 * inst.supply_cost(s, a.w1.expect("store has a first supplier"));
            if let Some(w2) = a.w2 {
                cost += a.q2 * inst.supply_cost(s, w2);
            }
        }
        cost
    }

    /// Full opening cost: sum of fixed costs of every warehouse with at
    /// least one client.
    pub fn opening_cost(&self, inst: &Instance) -> Cost {
        (0..self.load.len())
            .filter(|&w| self.clients(w) > 0)
            .map(|w| inst.fixed_cost(w))
            .sum()
    }

    /// Total cost (supply + opening).
    pub fn total_cost(&self, inst: &Instance) -> Cost {
        self.supply_cost(inst) + self.opening_cost(inst)
    }

    /// Number of warehouses whose load exceeds their capacity. Should
    /// always be zero for a state built through the public mutators, which
    /// never create infeasible loads; kept for diagnostics and
    /// [`Self::check_consistency`].
    pub fn compute_violations(&self, inst: &Instance) -> usize {
        (0..self.load.len())
            .filter(|&w| self.load[w] > inst.capacity(w))
            .count()
    }

    /// Number of stores served by a single supplier.
    pub fn number_of_single_source_stores(&self) -> usize {
        self.assignment.iter().filter(|a| a.w2.is_none()).count()
    }

    /// Number of warehouses with at least one client.
    pub fn number_of_open_warehouses(&self) -> usize {
        self.load.iter().filter(|&&l| l > 0).count()
    }

    /// Re-derive every invariant from scratch and report the first one that
    /// fails, mirroring `CheckConsistency`. Intended for tests and for
    /// `--check` style CLI diagnostics, not the hot move loop.
    pub fn check_consistency(&self, inst: &Instance) -> Result<(), String> {
        for w in 0..self.load.len() {
            if self.residual_capacity(inst, w) < 0 {
                return Err(format!(
                    "excessive load for warehouse {w}: capacity {}, load {}",
                    inst.capacity(w),
                    self.load[w]
                ));
            }
            let mut load = 0;
            for i in 0..self.clients(w) {
                let s = self.client(w, i);
                if self.first_supplier(s) == Some(w) {
                    load += self.first_quantity(s);
                } else if self.second_supplier(s) == Some(w) {
                    load += self.second_quantity(s);
                } else {
                    return Err(format!("inconsistency between warehouse {w} and store {s}"));
                }
            }
            if self.load[w] != load {
                return Err(format!(
                    "warehouse {w} has stored load {} but computed load {load}",
                    self.load[w]
                ));
            }
        }
        for s in 0..self.assignment.len() {
            let a = &self.assignment[s];
            if a.q1 + a.q2 != inst.demand(s) {
                return Err(format!(
                    "store {s} is not supplied correctly: {}+{}!={}",
                    a.q1,
                    a.q2,
                    inst.demand(s)
                ));
            }
            if a.q1 <= 0 {
                return Err(format!("store {s} has non-positive first quantity {}", a.q1));
            }
            if a.q2 < 0 || (a.q2 == 0 && a.w2.is_some()) {
                return Err(format!(
                    "store {s} has inconsistent second quantity {} (second supplier {:?})",
                    a.q2, a.w2
                ));
            }
            let w1 = a.w1.expect("store has a first supplier");
            if let Some(w2) = a.w2 {
                if inst.supply_cost(s, w1) > inst.supply_cost(s, w2) {
                    return Err(format!("reversed suppliers for store {s}"));
                }
                if w1 == w2 {
                    return Err(format!("identical suppliers for store {s}"));
                }
                if !self.compatible(s, w2) {
                    return Err(format!(
                        "store {s} served (as second) by incompatible warehouse {w2}"
                    ));
                }
            }
            if !self.compatible(s, w1) {
                return Err(format!(
                    "store {s} served (as first) by incompatible warehouse {w1}"
                ));
            }
        }
        Ok(())
    }
}

fn remove_element(v: &mut Vec<StoreId>, e: StoreId) {
    if let Some(pos) = v.iter().position(|&x| x == e) {
        v.remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PreferenceParams;

    fn toy() -> Instance {
        Instance::new(
            vec![10, 10],
            vec![100, 50],
            vec![5, 3],
            vec![vec![7, 3], vec![2, 9]],
            vec![],
            PreferenceParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn full_assign_then_reset_round_trips_to_empty() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 1);
        assert_eq!(st.load(1), 5);
        assert_eq!(st.clients(1), 1);
        st.reset();
        assert_eq!(st.load(1), 0);
        assert_eq!(st.clients(1), 0);
        assert_eq!(st.first_supplier(0), None);
    }

    #[test]
    fn assign_second_restores_cheaper_first_ordering() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        // store 0: cost to w0 is 7, to w1 is 3. Assign first to the
        // expensive one, then second to the cheap one: ReorderSuppliers
        // must swap them back.
        st.assign_first(&inst, 0, 0, 3);
        st.assign_second(&inst, 0, 1, 2);
        assert_eq!(st.first_supplier(0), Some(1));
        assert_eq!(st.first_quantity(0), 2);
        assert_eq!(st.second_supplier(0), Some(0));
        assert_eq!(st.second_quantity(0), 3);
    }

    #[test]
    fn replace_supplier_merges_into_single_source_when_matching_other_slot() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.assign_first(&inst, 0, 0, 3);
        st.assign_second(&inst, 0, 1, 2);
        // now w1 (cheaper, w=1) holds q1=2, w2 (w=0) holds q2=3.
        // Replacing slot Second with warehouse 1 (== current first) merges.
        st.replace_supplier(&inst, 0, Position::Second, 1, 3);
        assert_eq!(st.second_supplier(0), None);
        assert_eq!(st.first_supplier(0), Some(1));
        assert_eq!(st.first_quantity(0), 5);
    }

    #[test]
    fn check_and_compute_quantity_rejects_pricier_second_supplier_introduction() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 1); // first supplier cost 3 (cheapest)
        // warehouse 0 costs 7 > 3, so introducing it as second is forbidden.
        assert_eq!(
            st.check_and_compute_quantity(&inst, 0, 0, Position::Second),
            None
        );
    }

    #[test]
    fn consistency_check_passes_for_freshly_built_state() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 1);
        st.full_assign(&inst, 1, 0);
        assert!(st.check_consistency(&inst).is_ok());
    }
}
