//! Problem instance: warehouses, stores, costs, incompatibilities, and the
//! derived indices (preferred suppliers/clients, neighbor-warehouse pairs)
//! that the neighborhood explorers rely on.
//!
//! An `Instance` is built once from a text file (see [`parser`]) and never
//! mutated afterwards; all per-move bookkeeping lives in
//! [`crate::state::SolutionState`].

pub mod parser;

use crate::types::{Cost, Quantity, StoreId, WarehouseId};
use crate::{Error, Result};

/// Tuning knobs for the derived "preferred supplier" index (§4.A).
///
/// These correspond to the `input::` CLI parameter group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferenceParams {
    /// `k = round(sqrt_ratio_preferred * sqrt(W))` preferred suppliers are
    /// kept unconditionally (clamped to `W`).
    pub sqrt_ratio_preferred: f64,
    /// After the cheapest-k cut, additional suppliers within
    /// `min_cost + diff_threshold` are appended (still in ascending order).
    pub diff_threshold: Cost,
}

impl Default for PreferenceParams {
    fn default() -> Self {
        Self {
            sqrt_ratio_preferred: 1.0,
            diff_threshold: 100,
        }
    }
}

/// An immutable CFLP-2S-I problem instance.
#[derive(Debug, Clone)]
pub struct Instance {
    num_warehouses: usize,
    num_stores: usize,
    capacity: Vec<Quantity>,
    fixed_cost: Vec<Cost>,
    demand: Vec<Quantity>,
    supply_cost: Vec<Vec<Cost>>,
    incompatible_pairs: Vec<(StoreId, StoreId)>,
    incompat_of: Vec<Vec<StoreId>>,
    pref_sup: Vec<Vec<WarehouseId>>,
    pref_cli: Vec<Vec<StoreId>>,
    neighbors: Vec<(WarehouseId, WarehouseId)>,
}

impl Instance {
    /// Build an instance from raw problem data, validating demands and
    /// computing the derived indices described in §4.A.
    pub fn new(
        capacity: Vec<Quantity>,
        fixed_cost: Vec<Cost>,
        demand: Vec<Quantity>,
        supply_cost: Vec<Vec<Cost>>,
        incompatible_pairs: Vec<(StoreId, StoreId)>,
        params: PreferenceParams,
    ) -> Result<Self> {
        let num_warehouses = capacity.len();
        let num_stores = demand.len();

        if fixed_cost.len() != num_warehouses {
            return Err(Error::invalid_instance(format!(
                "FixedCost has {} entries, expected {num_warehouses}",
                fixed_cost.len()
            )));
        }
        if supply_cost.len() != num_stores {
            return Err(Error::invalid_instance(format!(
                "SupplyCost has {} rows, expected {num_stores}",
                supply_cost.len()
            )));
        }
        for (s, row) in supply_cost.iter().enumerate() {
            if row.len() != num_warehouses {
                return Err(Error::invalid_instance(format!(
                    "SupplyCost row {s} has {} entries, expected {num_warehouses}",
                    row.len()
                )));
            }
        }
        for (s, &d) in demand.iter().enumerate() {
            if d == 1 {
                return Err(Error::invalid_instance(format!(
                    "store {s} has demand 1, which cannot be split between two suppliers"
                )));
            }
            if d < 1 {
                return Err(Error::invalid_instance(format!(
                    "store {s} has non-positive demand {d}"
                )));
            }
        }
        for &(s1, s2) in &incompatible_pairs {
            if s1 >= num_stores || s2 >= num_stores {
                return Err(Error::invalid_instance(format!(
                    "incompatible pair ({s1}, {s2}) out of range for {num_stores} stores"
                )));
            }
        }

        let mut incompat_of = vec![Vec::new(); num_stores];
        for &(s1, s2) in &incompatible_pairs {
            incompat_of[s1].push(s2);
            incompat_of[s2].push(s1);
        }

        let mut instance = Self {
            num_warehouses,
            num_stores,
            capacity,
            fixed_cost,
            demand,
            supply_cost,
            incompatible_pairs,
            incompat_of,
            pref_sup: vec![Vec::new(); num_stores],
            pref_cli: vec![Vec::new(); num_warehouses],
            neighbors: Vec::new(),
        };
        instance.compute_preferred_suppliers(params);
        instance.compute_neighbor_warehouses();
        Ok(instance)
    }

    fn compute_preferred_suppliers(&mut self, params: PreferenceParams) {
        let k = ((params.sqrt_ratio_preferred * (self.num_warehouses as f64).sqrt()) + 0.5)
            as usize;
        let k = k.min(self.num_warehouses);

        for s in 0..self.num_stores {
            let mut by_cost: Vec<WarehouseId> = (0..self.num_warehouses).collect();
            by_cost.sort_by_key(|&w| self.supply_cost[s][w]);

            let mut pref = Vec::with_capacity(k);
            for &w in by_cost.iter().take(k) {
                pref.push(w);
                self.insert_preferred_client(w, s);
            }
            if !by_cost.is_empty() {
                let min_cost = self.supply_cost[s][by_cost[0]];
                for &w in by_cost.iter().skip(k) {
                    if self.supply_cost[s][w] <= min_cost + params.diff_threshold {
                        pref.push(w);
                        self.insert_preferred_client(w, s);
                    } else {
                        break;
                    }
                }
            }
            self.pref_sup[s] = pref;
        }
    }

    /// Ordered (ascending cost) stable insertion of `s` into `pref_cli[w]`.
    fn insert_preferred_client(&mut self, w: WarehouseId, s: StoreId) {
        let cost = self.supply_cost[s][w];
        let pos = self.pref_cli[w]
            .iter()
            .position(|&s2| self.supply_cost[s2][w] > cost)
            .unwrap_or(self.pref_cli[w].len());
        self.pref_cli[w].insert(pos, s);
    }

    fn compute_neighbor_warehouses(&mut self) {
        let mut seen = vec![vec![false; self.num_warehouses]; self.num_warehouses];
        for s in 0..self.num_stores {
            let pref = &self.pref_sup[s];
            for i in 0..pref.len() {
                for j in (i + 1)..pref.len() {
                    let (lo, hi) = if pref[i] < pref[j] {
                        (pref[i], pref[j])
                    } else {
                        (pref[j], pref[i])
                    };
                    if lo == hi {
                        continue;
                    }
                    if !seen[lo][hi] {
                        seen[lo][hi] = true;
                        self.neighbors.push((lo, hi));
                    }
                }
            }
        }
    }

    /// Number of warehouses.
    pub fn num_warehouses(&self) -> usize {
        self.num_warehouses
    }

    /// Number of stores.
    pub fn num_stores(&self) -> usize {
        self.num_stores
    }

    /// Capacity of warehouse `w`.
    pub fn capacity(&self, w: WarehouseId) -> Quantity {
        self.capacity[w]
    }

    /// Fixed opening cost of warehouse `w`.
    pub fn fixed_cost(&self, w: WarehouseId) -> Cost {
        self.fixed_cost[w]
    }

    /// Demand of store `s`.
    pub fn demand(&self, s: StoreId) -> Quantity {
        self.demand[s]
    }

    /// Unit supply cost from warehouse `w` to store `s`.
    pub fn supply_cost(&self, s: StoreId, w: WarehouseId) -> Cost {
        self.supply_cost[s][w]
    }

    /// All unordered incompatible store pairs, as given in the instance file.
    pub fn incompatible_pairs(&self) -> &[(StoreId, StoreId)] {
        &self.incompatible_pairs
    }

    /// Whether `s1` and `s2` are an incompatible pair.
    pub fn incompatible(&self, s1: StoreId, s2: StoreId) -> bool {
        self.incompat_of[s1].contains(&s2)
    }

    /// Stores incompatible with `s`.
    pub fn incompat_of(&self, s: StoreId) -> &[StoreId] {
        &self.incompat_of[s]
    }

    /// Preferred suppliers of `s`, in ascending cost order.
    pub fn pref_sup(&self, s: StoreId) -> &[WarehouseId] {
        &self.pref_sup[s]
    }

    /// Preferred clients of `w`, in ascending cost order.
    pub fn pref_cli(&self, w: WarehouseId) -> &[StoreId] {
        &self.pref_cli[w]
    }

    /// All neighbor-warehouse pairs (unordered, deduplicated, `lo < hi`).
    pub fn neighbor_warehouses(&self) -> &[(WarehouseId, WarehouseId)] {
        &self.neighbors
    }

    /// Number of neighbor-warehouse pairs.
    pub fn num_neighbor_pairs(&self) -> usize {
        self.neighbors.len()
    }
}
