//! Solution I/O: the dump (bracket) and pretty (brace) text formats (§6.B),
//! grounded in `FLP_Output.cc`'s `operator<<`/`operator>>`/`PrettyPrint`.

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::state::SolutionState;
use crate::types::{WarehouseId, NO_WAREHOUSE};

/// `[(w1/q1,w2/q2), (w1/q1,w2/q2), ...]` over stores in order, `w2=-1`
/// denoting single-source. Matches `FLP_Output::operator<<` exactly (the
/// same format `Dump` writes and `operator>>` reads back).
pub fn dump(st: &SolutionState, inst: &Instance) -> String {
    let mut out = String::from("[");
    for s in 0..inst.num_stores() {
        if s > 0 {
            out.push_str(", ");
        }
        let w1 = st.first_supplier(s).map(|w| w as i64).unwrap_or(NO_WAREHOUSE);
        let w2 = st.second_supplier(s).map(|w| w as i64).unwrap_or(NO_WAREHOUSE);
        out.push_str(&format!("({}/{},{}/{})", w1, st.first_quantity(s), w2, st.second_quantity(s)));
    }
    out.push(']');
    out
}

/// Parse the bracket form written by [`dump`].
pub fn parse_dump(text: &str, inst: &Instance) -> Result<SolutionState> {
    let mut st = SolutionState::new(inst);
    let mut cursor = text.trim_start();
    cursor = expect_char(cursor, '[')?;
    for s in 0..inst.num_stores() {
        if s > 0 {
            cursor = expect_char(cursor.trim_start(), ',')?;
            cursor = cursor.trim_start();
        }
        cursor = expect_char(cursor, '(')?;
        let (w1, rest) = take_int(cursor)?;
        cursor = expect_char(rest, '/')?;
        let (q1, rest) = take_int(cursor)?;
        cursor = expect_char(rest, ',')?;
        let (w2, rest) = take_int(cursor)?;
        cursor = expect_char(rest, '/')?;
        let (q2, rest) = take_int(cursor)?;
        cursor = expect_char(rest, ')')?;

        assign_pair(&mut st, inst, s, w1, q1, w2, q2)?;
    }
    cursor = cursor.trim_start();
    expect_char(cursor, ']')?;
    Ok(st)
}

/// `{(s,w,q), (s,w,q), ...}`, 1-based, one tuple per supplier slot.
/// Matches `FLP_Output::PrettyPrint`.
pub fn pretty_print(st: &SolutionState, inst: &Instance) -> String {
    let mut out = String::from("{");
    let mut first = true;
    for s in 0..inst.num_stores() {
        if !first {
            out.push_str(", ");
        }
        first = false;
        let w1 = st.first_supplier(s).expect("store has a first supplier");
        out.push_str(&format!("({}, {}, {})", s + 1, w1 + 1, st.first_quantity(s)));
        if let Some(w2) = st.second_supplier(s) {
            out.push_str(&format!(",({}, {}, {})", s + 1, w2 + 1, st.second_quantity(s)));
        }
    }
    out.push('}');
    out
}

/// Parse the brace form written by [`pretty_print`]. Tolerates either one
/// or two tuples per store, in any order within the pair, matching
/// `operator>>`'s "second tuple for the same store" detection.
pub fn parse_pretty(text: &str, inst: &Instance) -> Result<SolutionState> {
    let mut st = SolutionState::new(inst);
    let mut cursor = text.trim_start();
    cursor = expect_char(cursor, '{')?;

    let mut prev_store: Option<i64> = None;
    let mut count = 0u32;
    loop {
        cursor = cursor.trim_start();
        if cursor.starts_with('}') {
            break;
        }
        cursor = expect_char(cursor, '(')?;
        let (s1, rest) = take_int(cursor)?;
        cursor = expect_char(rest.trim_start(), ',')?;
        let (w1, rest) = take_int(cursor.trim_start())?;
        cursor = expect_char(rest.trim_start(), ',')?;
        let (q1, rest) = take_int(cursor.trim_start())?;
        cursor = expect_char(rest.trim_start(), ')')?;

        if Some(s1) == prev_store {
            count += 1;
            if count != 2 {
                return Err(Error::invalid_solution("more than two suppliers for one store"));
            }
            let s = (s1 - 1) as usize;
            validate_store_index(inst, s)?;
            let w = validate_warehouse_index(inst, w1)?;
            st.assign_second(inst, s, w, q1);
        } else {
            count = 1;
            prev_store = Some(s1);
            let s = (s1 - 1) as usize;
            validate_store_index(inst, s)?;
            let w = validate_warehouse_index(inst, w1)?;
            st.assign_first(inst, s, w, q1);
        }

        cursor = cursor.trim_start();
        if cursor.starts_with(',') {
            cursor = &cursor[1..];
        }
    }
    cursor = &cursor[1..]; // consume '}'
    let _ = cursor;

    for s in 0..inst.num_stores() {
        if st.first_supplier(s).is_none() {
            return Err(Error::invalid_solution(format!("store {s} never assigned a first supplier")));
        }
    }
    Ok(st)
}

/// Auto-detect by the first non-whitespace byte (`[` or `{`), exactly as
/// `operator>>(istream&, FLP_Output&)` does.
pub fn read_solution(text: &str, inst: &Instance) -> Result<SolutionState> {
    match text.trim_start().chars().next() {
        Some('[') => parse_dump(text, inst),
        Some('{') => parse_pretty(text, inst),
        _ => Err(Error::invalid_solution("unknown solution format")),
    }
}

fn assign_pair(
    st: &mut SolutionState,
    inst: &Instance,
    s: usize,
    w1: i64,
    q1: i64,
    w2: i64,
    q2: i64,
) -> Result<()> {
    let w1 = validate_warehouse_index(inst, w1)?;
    st.assign_first(inst, s, w1, q1);
    if w2 != NO_WAREHOUSE {
        let w2 = validate_warehouse_index(inst, w2)?;
        st.assign_second(inst, s, w2, q2);
    }
    Ok(())
}

fn validate_warehouse_index(inst: &Instance, w: i64) -> Result<WarehouseId> {
    if w < 0 || w as usize >= inst.num_warehouses() {
        return Err(Error::invalid_solution(format!("warehouse index {w} out of range")));
    }
    Ok(w as usize)
}

fn validate_store_index(inst: &Instance, s: usize) -> Result<()> {
    if s >= inst.num_stores() {
        return Err(Error::invalid_solution(format!("store index {s} out of range")));
    }
    Ok(())
}

fn expect_char(text: &str, ch: char) -> Result<&str> {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == ch => Ok(chars.as_str()),
        Some(c) => Err(Error::invalid_solution(format!("expected '{ch}', found '{c}'"))),
        None => Err(Error::invalid_solution(format!("expected '{ch}', found end of input"))),
    }
}

fn take_int(text: &str) -> Result<(i64, &str)> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    if end == 0 {
        return Err(Error::invalid_solution("expected an integer"));
    }
    let n: i64 = text[..end]
        .parse()
        .map_err(|_| Error::invalid_solution(format!("malformed integer '{}'", &text[..end])))?;
    Ok((n, &text[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::PreferenceParams;

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
    fn dump_round_trips() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.assign_first(&inst, 0, 0, 3);
        st.assign_second(&inst, 0, 1, 2);
        st.full_assign(&inst, 1, 1);

        let text = dump(&st, &inst);
        let parsed = parse_dump(&text, &inst).unwrap();
        assert_eq!(dump(&parsed, &inst), text);
    }

    #[test]
    fn pretty_print_uses_one_based_indices() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 1);
        st.full_assign(&inst, 1, 0);
        let text = pretty_print(&st, &inst);
        assert_eq!(text, "{(1, 2, 5), (2, 1, 4)}");
    }

    #[test]
    fn parse_pretty_round_trips_through_dump() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.assign_first(&inst, 0, 0, 3);
        st.assign_second(&inst, 0, 1, 2);
        st.full_assign(&inst, 1, 1);

        let text = pretty_print(&st, &inst);
        let parsed = parse_pretty(&text, &inst).unwrap();
        assert_eq!(dump(&parsed, &inst), dump(&st, &inst));
    }

    #[test]
    fn read_solution_detects_format_by_first_character() {
        let inst = toy();
        let mut st = SolutionState::new(&inst);
        st.full_assign(&inst, 0, 0);
        st.full_assign(&inst, 1, 1);

        let bracket = dump(&st, &inst);
        let brace = pretty_print(&st, &inst);
        assert!(read_solution(&bracket, &inst).is_ok());
        assert!(read_solution(&brace, &inst).is_ok());
        assert!(read_solution("nonsense", &inst).is_err());
    }
}
