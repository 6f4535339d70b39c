//! Common scalar types shared across the instance, state, and search modules

/// Integer cost/price type (supply costs, fixed costs, and totals are all
/// small enough integers that `i64` never overflows in practice).
pub type Cost = i64;

/// Integer demand/capacity/quantity type.
pub type Quantity = i64;

/// Warehouse index into `Instance`'s per-warehouse arrays.
pub type WarehouseId = usize;

/// Store index into `Instance`'s per-store arrays.
pub type StoreId = usize;

/// Sentinel used in place of `Option<WarehouseId>` for the second supplier
/// slot, matching the `-1` convention of the reference implementation this
/// crate's wire format (dump/pretty-print) is compatible with.
pub const NO_WAREHOUSE: i64 = -1;
