//! Plain-text edge-list and feature-matrix readers.
//!
//! Edge lists hold one `u v` pair per line. Fields are separated by
//! whitespace or commas; any trailing fields (weights) are ignored. Lines
//! that are blank or start with `#` or `%` are skipped.
//!
//! Feature files hold one row of floats per node, in node order.

use std::io::BufRead;

use nalgebra::DMatrix;

use crate::adjacency::{Adjacency, MAX_NODES};
use crate::error::{BenchError, Result};

fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|field| !field.is_empty())
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%')
}

fn parse_node(field: &str, line: usize, limit: usize) -> Result<usize> {
    let id = field.parse::<usize>().map_err(|err| BenchError::Parse {
        line,
        message: format!("invalid node id {field:?}: {err}"),
    })?;
    if id >= limit {
        return Err(BenchError::Parse {
            line,
            message: format!("node id {id} is outside 0..{limit}"),
        });
    }
    Ok(id)
}

/// Read an undirected edge list into an [`Adjacency`].
///
/// When `node_count` is `None` the graph has `max_id + 1` nodes. Ids are
/// bounded by the explicit count, or by [`MAX_NODES`] without one, before
/// anything is allocated.
///
/// # Errors
///
/// Returns [`BenchError::Parse`] for malformed lines or out-of-range ids,
/// [`BenchError::InvalidAdjacency`] when `node_count` exceeds [`MAX_NODES`],
/// or [`BenchError::Io`] if reading fails.
pub fn parse_edge_list<R: BufRead>(reader: R, node_count: Option<usize>) -> Result<Adjacency> {
    if let Some(n) = node_count.filter(|&n| n > MAX_NODES) {
        return Err(BenchError::adjacency(format!(
            "{n} nodes exceeds the limit of {MAX_NODES}"
        )));
    }
    let limit = node_count.unwrap_or(MAX_NODES);

    let mut pairs = Vec::new();
    let mut max_id: Option<usize> = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        if is_skippable(&line) {
            continue;
        }

        let mut it = fields(&line);
        let (Some(a), Some(b)) = (it.next(), it.next()) else {
            return Err(BenchError::Parse {
                line: line_no,
                message: "expected two node ids".to_string(),
            });
        };
        let a = parse_node(a, line_no, limit)?;
        let b = parse_node(b, line_no, limit)?;

        max_id = Some(max_id.map_or(a.max(b), |m| m.max(a).max(b)));
        pairs.push((a, b));
    }

    // Every id is below `limit <= MAX_NODES`, so the increment cannot overflow.
    let n = node_count.unwrap_or_else(|| max_id.map_or(0, |m| m + 1));
    Adjacency::from_edges(n, pairs)
}

/// Read a dense `rows × F` feature matrix.
///
/// # Errors
///
/// Returns [`BenchError::Parse`] for non-numeric fields and
/// [`BenchError::InvalidFeatures`] for ragged rows or a row count that
/// differs from `expected_rows`.
pub fn parse_feature_matrix<R: BufRead>(reader: R, expected_rows: usize) -> Result<DMatrix<f64>> {
    let mut values = Vec::new();
    let mut width: Option<usize> = None;
    let mut rows = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        if is_skippable(&line) {
            continue;
        }

        let start = values.len();
        for field in fields(&line) {
            let value = field.parse::<f64>().map_err(|err| BenchError::Parse {
                line: line_no,
                message: format!("invalid feature value {field:?}: {err}"),
            })?;
            values.push(value);
        }

        let row_width = values.len() - start;
        match width {
            None => width = Some(row_width),
            Some(w) if w != row_width => {
                return Err(BenchError::InvalidFeatures {
                    reason: format!("line {line_no} has {row_width} values, expected {w}"),
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    if rows != expected_rows {
        return Err(BenchError::InvalidFeatures {
            reason: format!("found {rows} feature rows for {expected_rows} nodes"),
        });
    }

    Ok(DMatrix::from_row_slice(rows, width.unwrap_or(0), &values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_whitespace_and_comma_separated_pairs() {
        let input = "# karate subset\n0 1\n1,2\n2\t3 0.5\n\n% matrix-market style comment\n";
        let g = parse_edge_list(Cursor::new(input), None).expect("valid edge list");
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 3);
        assert!(g.has_edge(3, 2));
    }

    #[test]
    fn explicit_node_count_adds_isolated_nodes() {
        let g = parse_edge_list(Cursor::new("0 1\n"), Some(5)).expect("valid");
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.degree(4), 0);
    }

    #[test]
    fn node_count_smaller_than_ids_is_rejected() {
        let err = parse_edge_list(Cursor::new("0 1\n0 7\n"), Some(3)).expect_err("7 >= 3");
        assert!(matches!(err, BenchError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn id_at_usize_max_is_a_parse_error() {
        let err = parse_edge_list(Cursor::new("0 18446744073709551615\n"), None)
            .expect_err("id beyond node limit");
        assert!(matches!(err, BenchError::Parse { line: 1, .. }), "{err}");
    }

    #[test]
    fn huge_id_is_rejected_before_allocating() {
        let err = parse_edge_list(Cursor::new("0 4000000000000000000\n"), None)
            .expect_err("id beyond node limit");
        assert!(err.to_string().contains("outside 0.."), "{err}");

        let err = parse_edge_list(Cursor::new("0 4000000000\n"), None).expect_err("4e9 nodes");
        assert!(matches!(err, BenchError::Parse { .. }));
    }

    #[test]
    fn explicit_node_count_above_limit_is_rejected() {
        let err = parse_edge_list(Cursor::new("0 1\n"), Some(usize::MAX))
            .expect_err("too many nodes");
        assert!(matches!(err, BenchError::InvalidAdjacency { .. }));
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = parse_edge_list(Cursor::new("0 1\nfoo 2\n"), None).expect_err("bad id");
        match err {
            BenchError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_field_line_is_rejected() {
        let err = parse_edge_list(Cursor::new("3\n"), None).expect_err("one field");
        assert!(matches!(err, BenchError::Parse { line: 1, .. }));
    }

    #[test]
    fn empty_input_gives_empty_graph() {
        let g = parse_edge_list(Cursor::new(""), None).expect("empty is valid");
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn feature_matrix_reads_rows_in_order() {
        let m = parse_feature_matrix(Cursor::new("1 0\n0.5, 2\n"), 2).expect("valid");
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m[(1, 0)], 0.5);
        assert_eq!(m[(1, 1)], 2.0);
    }

    #[test]
    fn ragged_feature_rows_are_rejected() {
        let err = parse_feature_matrix(Cursor::new("1 2\n3\n"), 2).expect_err("ragged");
        assert!(matches!(err, BenchError::InvalidFeatures { .. }));
    }

    #[test]
    fn feature_row_count_must_match_nodes() {
        let err = parse_feature_matrix(Cursor::new("1\n2\n"), 3).expect_err("2 rows for 3 nodes");
        assert!(err.to_string().contains("2 feature rows for 3 nodes"));
    }
}
