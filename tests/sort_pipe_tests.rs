//! End-to-end sort pipe tests

mod test_data_gen;

use std::sync::Arc;

use logq_core::block::{Block, Column};
use logq_core::cancel::CancelToken;
use logq_core::sort_expr::{SortConfig, SortKey};
use logq_lang::parse_sort_clause;
use logq_operators::{PipeError, PipeProcessor, SortPipe};
use test_data_gen::{block_from_rows, run_sort, Collector, Lcg};

const MEM: usize = 64 * 1024 * 1024;

fn clause(s: &str) -> SortConfig {
    parse_sort_clause(s).expect("test clause parses")
}

fn column_values(rows: &[Vec<(String, String)>], name: &str) -> Vec<String> {
    rows.iter()
        .map(|r| {
            r.iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn test_sort_all_columns_by_json_form() {
    let block = block_from_rows(
        &["a", "b"],
        &[vec!["2", "x"], vec!["10", "y"], vec!["2", "w"]],
    );
    let (result, rows) = run_sort(clause("sort"), 1, MEM, vec![vec![block]]);
    result.expect("flush succeeds");

    // Ordered by the JSON-concatenated row form: "10" sorts before "2" as a
    // string, and among a == "2" the second column decides.
    assert_eq!(column_values(&rows, "a"), vec!["10", "2", "2"]);
    assert_eq!(column_values(&rows, "b"), vec!["y", "w", "x"]);
}

#[test]
fn test_sort_integer_tier() {
    let block = block_from_rows(&["n"], &[vec!["9"], vec!["10"], vec!["2"]]);
    let (result, rows) = run_sort(clause("sort by (n)"), 1, MEM, vec![vec![block]]);
    result.expect("flush succeeds");
    assert_eq!(column_values(&rows, "n"), vec!["2", "9", "10"]);
}

#[test]
fn test_sort_mixed_tiers_fall_back_to_strings() {
    let block = block_from_rows(&["n"], &[vec!["9"], vec!["foo"], vec!["2"]]);
    let (result, rows) = run_sort(clause("sort by (n)"), 1, MEM, vec![vec![block]]);
    result.expect("flush succeeds");
    // "foo" parses in no numeric tier, so all three compare as strings.
    assert_eq!(column_values(&rows, "n"), vec!["2", "9", "foo"]);
}

#[test]
fn test_sort_all_zero_cells_compare_as_strings() {
    // Every cell parses as integer zero (the not-numeric sentinel) and as
    // float 0.0, so ordering falls through to the string tier.
    let block = block_from_rows(&["z"], &[vec!["00"], vec!["0"], vec!["0.0"]]);
    let (result, rows) = run_sort(clause("sort by (z)"), 1, MEM, vec![vec![block]]);
    result.expect("flush succeeds");
    assert_eq!(column_values(&rows, "z"), vec!["0", "0.0", "00"]);
}

fn time_block(timestamps: Vec<i64>, names_cells: &[(&str, Vec<&str>)]) -> Block {
    let mut columns = vec![Column::time("_time")];
    for (name, cells) in names_cells {
        columns.push(Column::plain(
            name.to_string(),
            cells.iter().map(|c| c.to_string()).collect(),
        ));
    }
    Block::new(timestamps, columns).expect("test block is well-formed")
}

#[test]
fn test_sort_by_time_column() {
    let block = time_block(vec![100, 50, 200], &[]);
    let (result, rows) = run_sort(clause("sort by (_time)"), 1, MEM, vec![vec![block.clone()]]);
    result.expect("flush succeeds");
    assert_eq!(column_values(&rows, "_time"), vec!["50", "100", "200"]);

    let (result, rows) = run_sort(clause("sort by (_time) desc"), 1, MEM, vec![vec![block]]);
    result.expect("flush succeeds");
    assert_eq!(column_values(&rows, "_time"), vec!["200", "100", "50"]);
}

#[test]
fn test_sort_time_then_numeric_key_across_workers() {
    let a = time_block(vec![100, 100], &[("v", vec!["5", "3"])]);
    let b = time_block(vec![50, 100], &[("v", vec!["9", "1"])]);
    let (result, rows) = run_sort(
        clause("sort by (_time, v)"),
        2,
        MEM,
        vec![vec![a], vec![b]],
    );
    result.expect("flush succeeds");
    // Smallest timestamp first; equal timestamps order numerically on v.
    assert_eq!(column_values(&rows, "_time"), vec!["50", "100", "100", "100"]);
    assert_eq!(column_values(&rows, "v"), vec!["9", "1", "3", "5"]);
}

#[test]
fn test_sort_empty_input_yields_empty_output() {
    let (result, rows) = run_sort(clause("sort by (x)"), 4, MEM, vec![vec![]; 4]);
    result.expect("flush succeeds");
    assert!(rows.is_empty());
}

#[test]
fn test_sort_drops_empty_blocks() {
    let empty = Block::new(vec![], vec![Column::plain("n", vec![])]).unwrap();
    let block = block_from_rows(&["n"], &[vec!["3"], vec!["1"]]);
    let (result, rows) = run_sort(clause("sort by (n)"), 1, MEM, vec![vec![empty, block]]);
    result.expect("flush succeeds");
    assert_eq!(column_values(&rows, "n"), vec!["1", "3"]);
}

#[test]
fn test_sort_missing_key_column_sorts_as_empty() {
    let with_x = block_from_rows(&["x", "msg"], &[vec!["b", "m1"], vec!["a", "m2"]]);
    let without_x = block_from_rows(&["msg"], &[vec!["m3"]]);
    let (result, rows) = run_sort(
        clause("sort by (x)"),
        1,
        MEM,
        vec![vec![with_x, without_x]],
    );
    result.expect("flush succeeds");
    // The block without `x` contributes empty key cells, which sort first.
    assert_eq!(column_values(&rows, "x"), vec!["", "a", "b"]);
    assert_eq!(column_values(&rows, "msg"), vec!["m3", "m2", "m1"]);
}

#[test]
fn test_sort_const_columns_ignore_direction() {
    // Const/const comparisons are an ascending fast path even under `desc`.
    let prod = Block::new(
        vec![0, 0],
        vec![
            Column::const_value("env", "prod".to_string()),
            Column::plain("n", vec!["1".to_string(), "2".to_string()]),
        ],
    )
    .unwrap();
    let dev = Block::new(
        vec![0],
        vec![
            Column::const_value("env", "dev".to_string()),
            Column::plain("n", vec!["3".to_string()]),
        ],
    )
    .unwrap();
    let (result, rows) = run_sort(clause("sort by (env desc)"), 1, MEM, vec![vec![prod, dev]]);
    result.expect("flush succeeds");
    assert_eq!(column_values(&rows, "env"), vec!["dev", "prod", "prod"]);
}

#[test]
fn test_sort_desc_reverses_distinct_keys() {
    let mut rng = Lcg::new(7);
    // Distinct keys, shuffled: desc must be the exact reverse of asc.
    let mut values: Vec<i64> = (0..100).map(|i| i * 13 + 1).collect();
    for i in (1..values.len()).rev() {
        values.swap(i, rng.below((i + 1) as u64) as usize);
    }
    let shuffled: Vec<String> = values.iter().map(|n| n.to_string()).collect();
    let rows_vec: Vec<Vec<&str>> = shuffled.iter().map(|s| vec![s.as_str()]).collect();
    let block = block_from_rows(&["n"], &rows_vec);

    let (result, asc) = run_sort(clause("sort by (n)"), 1, MEM, vec![vec![block.clone()]]);
    result.expect("flush succeeds");
    let (result, desc) = run_sort(clause("sort by (n) desc"), 1, MEM, vec![vec![block]]);
    result.expect("flush succeeds");

    let mut reversed = column_values(&asc, "n");
    reversed.reverse();
    assert_eq!(column_values(&desc, "n"), reversed);
}

#[test]
fn test_sort_merge_is_ordered_for_every_shard_count() {
    let mut rng = Lcg::new(42);
    for &workers in &[1usize, 2, 3, 8, 32] {
        let mut blocks_per_worker: Vec<Vec<Block>> = vec![Vec::new(); workers];
        let mut expected: Vec<i64> = Vec::new();
        for (w, blocks) in blocks_per_worker.iter_mut().enumerate() {
            for _ in 0..=(w % 3) {
                let cells: Vec<String> = (0..50)
                    .map(|_| (rng.below(10_000) as i64 + 1).to_string())
                    .collect();
                expected.extend(cells.iter().map(|c| c.parse::<i64>().unwrap()));
                let rows_vec: Vec<Vec<&str>> = cells.iter().map(|c| vec![c.as_str()]).collect();
                blocks.push(block_from_rows(&["n"], &rows_vec));
            }
        }
        expected.sort_unstable();

        let (result, rows) = run_sort(clause("sort by (n)"), workers, MEM, blocks_per_worker);
        result.expect("flush succeeds");
        let got: Vec<i64> = column_values(&rows, "n")
            .iter()
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(got, expected, "workers={workers}");
    }
}

#[test]
fn test_sort_output_is_a_permutation_of_input() {
    let mut rng = Lcg::new(9);
    let words = ["alpha", "beta", "gamma", "delta", ""];
    let data: Vec<(String, String)> = (0..300)
        .map(|_| {
            (
                (rng.below(50)).to_string(),
                words[rng.below(words.len() as u64) as usize].to_string(),
            )
        })
        .collect();
    let rows_vec: Vec<Vec<&str>> = data
        .iter()
        .map(|(a, b)| vec![a.as_str(), b.as_str()])
        .collect();
    let blocks: Vec<Block> = rows_vec
        .chunks(37)
        .map(|chunk| block_from_rows(&["k", "w"], chunk))
        .collect();

    let (result, rows) = run_sort(clause("sort"), 3, MEM, vec![blocks, vec![], vec![]]);
    result.expect("flush succeeds");

    let mut got: Vec<(String, String)> = rows
        .iter()
        .map(|r| (r[0].1.clone(), r[1].1.clone()))
        .collect();
    let mut want = data;
    got.sort();
    want.sort();
    assert_eq!(got, want);
}

#[test]
fn test_sort_is_idempotent() {
    let block = block_from_rows(
        &["k", "v"],
        &[
            vec!["30", "c"],
            vec!["7", "a"],
            vec!["7", "b"],
            vec!["100", "z"],
        ],
    );
    let cfg = SortConfig {
        by_fields: vec![SortKey {
            name: "k".to_string(),
            desc: false,
        }],
        desc: false,
    };

    let (result, first) = run_sort(cfg.clone(), 2, MEM, vec![vec![block], vec![]]);
    result.expect("flush succeeds");

    let sorted_rows: Vec<Vec<&str>> = first
        .iter()
        .map(|r| r.iter().map(|(_, v)| v.as_str()).collect())
        .collect();
    let names: Vec<&str> = first[0].iter().map(|(n, _)| n.as_str()).collect();
    let resorted_input = block_from_rows(&names, &sorted_rows);

    let (result, second) = run_sort(cfg, 2, MEM, vec![vec![resorted_input], vec![]]);
    result.expect("flush succeeds");
    assert_eq!(first, second);
}

#[test]
fn test_sort_budget_doubling_keeps_output_identical() {
    let mut rng = Lcg::new(11);
    let cells: Vec<String> = (0..200).map(|_| rng.below(1000).to_string()).collect();
    let rows_vec: Vec<Vec<&str>> = cells.iter().map(|c| vec![c.as_str()]).collect();
    let block = block_from_rows(&["n"], &rows_vec);

    let (r1, out1) = run_sort(clause("sort by (n)"), 1, 8 * 1024 * 1024, vec![vec![block.clone()]]);
    let (r2, out2) = run_sort(clause("sort by (n)"), 1, 16 * 1024 * 1024, vec![vec![block]]);
    r1.expect("small budget suffices");
    r2.expect("large budget suffices");
    assert_eq!(out1, out2);
}

#[test]
fn test_sort_budget_exceeded_reports_and_emits_nothing() {
    // 1 MiB allowance -> ~140 KiB of sort state after the shard pre-charge.
    let allowed = 1024 * 1024;
    let collector = Arc::new(Collector::default());
    let processor = SortPipe::new(clause("sort")).into_processor(
        1,
        allowed,
        CancelToken::new(),
        Arc::clone(&collector) as Arc<dyn PipeProcessor>,
    );

    let payload = "x".repeat(1000);
    for _ in 0..400 {
        let cells: Vec<String> = (0..20).map(|_| payload.clone()).collect();
        let rows_vec: Vec<Vec<&str>> = cells.iter().map(|c| vec![c.as_str()]).collect();
        let block = block_from_rows(&["msg"], &rows_vec);
        processor.write_block(0, &block);
    }

    let err = processor.flush().expect_err("budget must be exceeded");
    match &err {
        PipeError::MemoryLimitExceeded { clause, .. } => assert_eq!(clause, "sort"),
    }
    assert_eq!(
        err.to_string(),
        "cannot calculate [sort], since it requires more than 0MB of memory"
    );
    assert!(collector.rows().is_empty());
}

#[test]
fn test_sort_cancelled_flush_returns_ok_without_output() {
    let cancel = CancelToken::new();
    let collector = Arc::new(Collector::default());
    let processor = SortPipe::new(clause("sort by (n)")).into_processor(
        1,
        MEM,
        cancel.clone(),
        Arc::clone(&collector) as Arc<dyn PipeProcessor>,
    );
    processor.write_block(0, &block_from_rows(&["n"], &[vec!["2"], vec!["1"]]));

    cancel.cancel();
    processor.flush().expect("cancelled flush is not an error");
    assert!(collector.rows().is_empty());
}

#[test]
fn test_sort_ignores_writes_after_flush() {
    let collector = Arc::new(Collector::default());
    let processor = SortPipe::new(clause("sort by (n)")).into_processor(
        1,
        MEM,
        CancelToken::new(),
        Arc::clone(&collector) as Arc<dyn PipeProcessor>,
    );
    processor.write_block(0, &block_from_rows(&["n"], &[vec!["2"], vec!["1"]]));
    processor.flush().expect("flush succeeds");
    let emitted = collector.rows().len();

    processor.write_block(0, &block_from_rows(&["n"], &[vec!["9"]]));
    processor.flush().expect("repeat flush is a no-op");
    assert_eq!(collector.rows().len(), emitted);
}

#[test]
fn test_sort_batches_split_on_column_shape_change() {
    let ab = block_from_rows(&["k", "a"], &[vec!["1", "x"]]);
    let ac = block_from_rows(&["k", "b"], &[vec!["2", "y"]]);
    let collector = Arc::new(Collector::default());
    let processor = SortPipe::new(clause("sort by (k)")).into_processor(
        1,
        MEM,
        CancelToken::new(),
        Arc::clone(&collector) as Arc<dyn PipeProcessor>,
    );
    processor.write_block(0, &ab);
    processor.write_block(0, &ac);
    processor.flush().expect("flush succeeds");

    let blocks = collector.blocks.lock().unwrap();
    assert_eq!(blocks.len(), 2);
    let names0: Vec<&str> = blocks[0].columns().iter().map(|c| c.name.as_str()).collect();
    let names1: Vec<&str> = blocks[1].columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names0, vec!["k", "a"]);
    assert_eq!(names1, vec!["k", "b"]);
}
