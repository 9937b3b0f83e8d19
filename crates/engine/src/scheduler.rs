use std::collections::HashMap;

use common::QuoteSnapshot;

/// Rank symbols by absolute 24-hour percentage change, descending. The sort
/// is stable, so equal magnitudes keep their input order. Symbols without a
/// quote are dropped from the ranking.
pub fn rank_by_volatility(
    symbols: &[String],
    quotes: &HashMap<String, QuoteSnapshot>,
) -> Vec<String> {
    let mut ranked: Vec<(String, f64)> = symbols
        .iter()
        .filter_map(|s| quotes.get(s).map(|q| (s.clone(), q.usd_24h_change.abs())))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(s, _)| s).collect()
}

/// Keep the top `n` ranked symbols, never fewer than one when any ranked.
pub fn select_top(mut ranked: Vec<String>, n: usize) -> Vec<String> {
    ranked.truncate(n.max(1));
    ranked
}

/// Partition the selection into fixed-size fetch batches. The pacing delay
/// between batches is the caller's job.
pub fn batches(selected: &[String], size: usize) -> Vec<Vec<String>> {
    selected
        .chunks(size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(change: f64) -> QuoteSnapshot {
        QuoteSnapshot {
            usd: 100.0,
            usd_24h_change: change,
        }
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ranks_by_absolute_change_descending() {
        let syms = symbols(&["A", "B", "C"]);
        let quotes = HashMap::from([
            ("A".to_string(), quote(1.0)),
            ("B".to_string(), quote(-8.0)),
            ("C".to_string(), quote(3.0)),
        ]);
        assert_eq!(rank_by_volatility(&syms, &quotes), symbols(&["B", "C", "A"]));
    }

    #[test]
    fn ties_preserve_input_order() {
        let syms = symbols(&["A", "B", "C", "D"]);
        let quotes = HashMap::from([
            ("A".to_string(), quote(2.0)),
            ("B".to_string(), quote(-2.0)),
            ("C".to_string(), quote(5.0)),
            ("D".to_string(), quote(2.0)),
        ]);
        assert_eq!(
            rank_by_volatility(&syms, &quotes),
            symbols(&["C", "A", "B", "D"])
        );
    }

    #[test]
    fn unquoted_symbols_are_dropped() {
        let syms = symbols(&["A", "B"]);
        let quotes = HashMap::from([("B".to_string(), quote(1.0))]);
        assert_eq!(rank_by_volatility(&syms, &quotes), symbols(&["B"]));
    }

    #[test]
    fn select_top_keeps_at_least_one() {
        assert_eq!(select_top(symbols(&["A", "B"]), 0), symbols(&["A"]));
        assert_eq!(select_top(symbols(&["A", "B"]), 5), symbols(&["A", "B"]));
    }

    #[test]
    fn batches_partition_without_overlap() {
        let parts = batches(&symbols(&["A", "B", "C", "D", "E"]), 2);
        assert_eq!(
            parts,
            vec![symbols(&["A", "B"]), symbols(&["C", "D"]), symbols(&["E"])]
        );
    }
}
