//! Parser for the MiniZinc-style instance text format (§6).
//!
//! ```text
//! Warehouses = 2;
//! Stores = 1;
//! Capacity = [10, 10];
//! FixedCost = [100, 50];
//! Goods = [5];
//! SupplyCost = [| 7, 3 |];
//! Incompatibilities = 0;
//! IncompatiblePairs = [|];
//! ```
//!
//! The reader is a small hand-rolled tokenizer: keys are matched literally,
//! values are read with Rust's own integer/float parsing. Store indices in
//! `IncompatiblePairs` are 1-based in the file and converted to 0-based.

use super::{Instance, PreferenceParams};
use crate::types::Cost;
use crate::{Error, Result};

/// Parse an instance from its textual representation.
pub fn parse(text: &str, params: PreferenceParams) -> Result<Instance> {
    let mut cursor = Cursor::new(text);

    let num_warehouses = cursor.read_keyed_int("Warehouses")? as usize;
    let num_stores = cursor.read_keyed_int("Stores")? as usize;
    let capacity = cursor.read_keyed_int_array("Capacity", num_warehouses)?;
    let fixed_cost = cursor.read_keyed_int_array("FixedCost", num_warehouses)?;
    let demand = cursor.read_keyed_int_array("Goods", num_stores)?;
    let supply_cost = cursor.read_keyed_matrix("SupplyCost", num_stores, num_warehouses)?;
    let num_incompatibilities = cursor.read_keyed_int("Incompatibilities")? as usize;
    let incompatible_pairs =
        cursor.read_keyed_pairs("IncompatiblePairs", num_incompatibilities)?;

    Instance::new(
        capacity,
        fixed_cost,
        demand,
        supply_cost,
        incompatible_pairs,
        params,
    )
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn expect(&mut self, tok: &str) -> Result<()> {
        self.skip_ws();
        if let Some(rest) = self.rest.strip_prefix(tok) {
            self.rest = rest;
            Ok(())
        } else {
            let found: String = self.rest.chars().take(20).collect();
            Err(Error::invalid_instance(format!(
                "expected '{tok}', found '{found}'"
            )))
        }
    }

    /// Read up to (and consuming) the next occurrence of `delim`.
    fn take_until(&mut self, delim: char) -> Result<&'a str> {
        match self.rest.find(delim) {
            Some(idx) => {
                let (head, tail) = self.rest.split_at(idx);
                self.rest = &tail[delim.len_utf8()..];
                Ok(head)
            }
            None => Err(Error::invalid_instance(format!(
                "unexpected end of input looking for '{delim}'"
            ))),
        }
    }

    fn read_keyed_int(&mut self, key: &str) -> Result<i64> {
        self.skip_ws();
        self.expect(key)?;
        self.expect("=")?;
        let value = self.take_until(';')?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::invalid_instance(format!("{key}: {e}")))
    }

    fn read_keyed_int_array(&mut self, key: &str, expected_len: usize) -> Result<Vec<i64>> {
        self.skip_ws();
        self.expect(key)?;
        self.expect("=")?;
        self.expect("[")?;
        let body = self.take_until(']')?;
        self.expect(";")?;
        let values = parse_int_list(body)?;
        if values.len() != expected_len {
            return Err(Error::invalid_instance(format!(
                "{key} has {} entries, expected {expected_len}",
                values.len()
            )));
        }
        Ok(values)
    }

    fn read_keyed_matrix(
        &mut self,
        key: &str,
        rows: usize,
        cols: usize,
    ) -> Result<Vec<Vec<Cost>>> {
        self.skip_ws();
        self.expect(key)?;
        self.expect("=")?;
        self.expect("[")?;
        self.expect("|")?;
        let body = self.take_until(']')?;
        self.expect(";")?;

        let mut matrix = Vec::with_capacity(rows);
        for row_text in body.split('|') {
            let row_text = row_text.trim();
            if row_text.is_empty() {
                continue;
            }
            let row = parse_int_list(row_text)?;
            if row.len() != cols {
                return Err(Error::invalid_instance(format!(
                    "{key} row {} has {} entries, expected {cols}",
                    matrix.len(),
                    row.len()
                )));
            }
            matrix.push(row);
        }
        if matrix.len() != rows {
            return Err(Error::invalid_instance(format!(
                "{key} has {} rows, expected {rows}",
                matrix.len()
            )));
        }
        Ok(matrix)
    }

    fn read_keyed_pairs(
        &mut self,
        key: &str,
        expected_len: usize,
    ) -> Result<Vec<(usize, usize)>> {
        self.skip_ws();
        self.expect(key)?;
        self.expect("=")?;
        self.expect("[")?;
        self.expect("|")?;
        let body = self.take_until(']')?;
        self.expect(";")?;

        let mut pairs = Vec::with_capacity(expected_len);
        for row_text in body.split('|') {
            let row_text = row_text.trim();
            if row_text.is_empty() {
                continue;
            }
            let entries = parse_int_list(row_text)?;
            if entries.len() != 2 {
                return Err(Error::invalid_instance(format!(
                    "{key} entry '{row_text}' is not a pair"
                )));
            }
            if entries[0] < 1 || entries[1] < 1 {
                return Err(Error::invalid_instance(format!(
                    "{key} uses 1-based indices, got {entries:?}"
                )));
            }
            pairs.push(((entries[0] - 1) as usize, (entries[1] - 1) as usize));
        }
        if pairs.len() != expected_len {
            return Err(Error::invalid_instance(format!(
                "{key} declared {expected_len} pairs but {} were listed",
                pairs.len()
            )));
        }
        Ok(pairs)
    }
}

fn parse_int_list(text: &str) -> Result<Vec<i64>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| Error::invalid_instance(format!("'{s}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tiny_single_source_instance() {
        let text = "Warehouses = 2;\nStores = 1;\n\
                     Capacity = [10, 10];\n\
                     FixedCost = [100, 50];\n\
                     Goods = [5];\n\
                     SupplyCost = [| 7, 3 |];\n\
                     Incompatibilities = 0;\n\
                     IncompatiblePairs = [|];\n";
        let inst = parse(text, PreferenceParams::default()).unwrap();
        assert_eq!(inst.num_warehouses(), 2);
        assert_eq!(inst.num_stores(), 1);
        assert_eq!(inst.capacity(0), 10);
        assert_eq!(inst.supply_cost(0, 1), 3);
    }

    #[test]
    fn parses_incompatibilities() {
        let text = "Warehouses = 2;\nStores = 2;\n\
                     Capacity = [4, 4];\n\
                     FixedCost = [1, 1];\n\
                     Goods = [4, 4];\n\
                     SupplyCost = [| 1, 9 | 1, 9 |];\n\
                     Incompatibilities = 1;\n\
                     IncompatiblePairs = [| 1, 2 |];\n";
        let inst = parse(text, PreferenceParams::default()).unwrap();
        assert!(inst.incompatible(0, 1));
    }

    #[test]
    fn rejects_demand_one_at_load_time() {
        let text = "Warehouses = 1;\nStores = 1;\n\
                     Capacity = [10];\n\
                     FixedCost = [1];\n\
                     Goods = [1];\n\
                     SupplyCost = [| 1 |];\n\
                     Incompatibilities = 0;\n\
                     IncompatiblePairs = [|];\n";
        let err = parse(text, PreferenceParams::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInstance(_)));
    }
}
