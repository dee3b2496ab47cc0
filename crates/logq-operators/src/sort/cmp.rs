//! Total order over row references.
//!
//! Each key column is compared in the strongest tier in which both sides are
//! representable: const-string, time, int64, float64, then raw strings.

use std::cmp::Ordering;

use logq_core::block::ColumnKind;
use logq_core::sort_expr::SortConfig;

use super::shard::{RowRef, SortBlock};

/// Compare two rows under `cfg`. `Less` means row `a` sorts first; `Equal`
/// is a genuine tie (the sort is not stable across ties).
pub(crate) fn cmp_rows(
    cfg: &SortConfig,
    blocks_a: &[SortBlock],
    a: RowRef,
    blocks_b: &[SortBlock],
    b: RowRef,
) -> Ordering {
    let ba = &blocks_a[a.block_idx as usize];
    let bb = &blocks_b[b.block_idx as usize];
    let ra = a.row_idx as usize;
    let rb = b.row_idx as usize;

    for idx in 0..ba.by_columns.len() {
        let ca = &ba.by_columns[idx];
        let cb = &bb.by_columns[idx];
        let desc = cfg.effective_desc(idx);
        let ka = ca.column(&ba.block).kind;
        let kb = cb.column(&bb.block).kind;

        if ka == ColumnKind::Const && kb == ColumnKind::Const {
            // Fast path: const cells compare as strings. Direction is
            // ignored here; keep that behavior.
            let va = ca.column(&ba.block).values()[0].as_str();
            let vb = cb.column(&bb.block).values()[0].as_str();
            match va.cmp(vb) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }

        if ka == ColumnKind::Time && kb == ColumnKind::Time {
            // Fast path: raw timestamps.
            let ta = ba.block.timestamps()[ra];
            let tb = bb.block.timestamps()[rb];
            match ta.cmp(&tb) {
                Ordering::Equal => continue,
                ord => return directed(ord, desc),
            }
        }
        // Timestamps sort before any other value, in either direction.
        if ka == ColumnKind::Time {
            return Ordering::Less;
        }
        if kb == ColumnKind::Time {
            return Ordering::Greater;
        }

        // Integer tier; zero is the did-not-parse sentinel.
        let ia = ca.i64_at(&ba.block, ra);
        let ib = cb.i64_at(&bb.block, rb);
        if ia != 0 && ib != 0 {
            match ia.cmp(&ib) {
                Ordering::Equal => continue,
                ord => return directed(ord, desc),
            }
        }

        // Float tier; NaN is the did-not-parse sentinel.
        let fa = ca.f64_at(&ba.block, ra);
        let fb = cb.f64_at(&bb.block, rb);
        if !fa.is_nan() && !fb.is_nan() {
            match fa.partial_cmp(&fb).unwrap_or(Ordering::Equal) {
                Ordering::Equal => continue,
                ord => return directed(ord, desc),
            }
        }

        // Fall back to byte-lexicographic string order.
        let sa = ba.by_value_at(idx, ra);
        let sb = bb.by_value_at(idx, rb);
        match sa.cmp(sb) {
            Ordering::Equal => continue,
            ord => return directed(ord, desc),
        }
    }

    Ordering::Equal
}

fn directed(ord: Ordering, desc: bool) -> Ordering {
    if desc {
        ord.reverse()
    } else {
        ord
    }
}
