//! K-way merge across locally sorted shards.
//!
//! A min-heap over shard indices is keyed by each shard's merge head. The
//! heap is hand-sifted (rather than `BinaryHeap`) because the hot loop only
//! needs to re-sift the top slot, and usually not even that: after emitting a
//! row, the top shard's new head is often still ahead of the runner-up.

use std::cmp::Ordering;

use logq_core::cancel::CancelToken;
use logq_core::sort_expr::SortConfig;

use super::cmp::cmp_rows;
use super::shard::Shard;
use super::writer::SortWriteContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeOutcome {
    Completed,
    Cancelled,
}

/// Stream every remaining row of `shards` to `wctx` in global order.
///
/// Cancellation is polled at each shard exhaustion and each heap re-sift;
/// a cancelled merge leaves the write context unflushed.
pub(crate) fn merge_shards(
    cfg: &SortConfig,
    shards: &mut [&mut Shard],
    cancel: &CancelToken,
    wctx: &mut SortWriteContext<'_>,
) -> MergeOutcome {
    let mut heap: Vec<usize> = (0..shards.len())
        .filter(|&i| shards[i].remaining_rows() > 0)
        .collect();
    for pos in (0..heap.len() / 2).rev() {
        sift_down(&mut heap, pos, shards, cfg);
    }

    // Cached runner-up shard; invalidated whenever the heap changes shape.
    let mut shard_next: Option<usize> = None;

    while heap.len() > 1 {
        let top = heap[0];
        let row = shards[top].row_ref_next;
        wctx.write_row(&*shards[top], row);
        shards[top].row_ref_next += 1;

        if shards[top].remaining_rows() == 0 {
            let last = heap.len() - 1;
            heap.swap(0, last);
            heap.pop();
            sift_down(&mut heap, 0, shards, cfg);
            shard_next = None;

            if cancel.is_cancelled() {
                return MergeOutcome::Cancelled;
            }
            continue;
        }

        let runner_up = match shard_next {
            Some(s) => s,
            None => {
                let mut s = heap[1];
                if heap.len() > 2 && head_less(shards, cfg, heap[2], s) {
                    s = heap[2];
                }
                shard_next = Some(s);
                s
            }
        };

        // Only pay for a sift when the top's new head fell behind the
        // runner-up.
        if head_less(shards, cfg, runner_up, top) {
            sift_down(&mut heap, 0, shards, cfg);
            shard_next = None;

            if cancel.is_cancelled() {
                return MergeOutcome::Cancelled;
            }
        }
    }

    // Drain the last shard directly.
    if let Some(&only) = heap.first() {
        while shards[only].remaining_rows() > 0 {
            let row = shards[only].row_ref_next;
            wctx.write_row(&*shards[only], row);
            shards[only].row_ref_next += 1;
        }
    }

    MergeOutcome::Completed
}

fn head_less(shards: &[&mut Shard], cfg: &SortConfig, x: usize, y: usize) -> bool {
    let a: &Shard = &*shards[x];
    let b: &Shard = &*shards[y];
    cmp_rows(cfg, &a.blocks, a.head(), &b.blocks, b.head()) == Ordering::Less
}

fn sift_down(heap: &mut Vec<usize>, mut pos: usize, shards: &[&mut Shard], cfg: &SortConfig) {
    loop {
        let left = 2 * pos + 1;
        if left >= heap.len() {
            break;
        }
        let mut child = left;
        let right = left + 1;
        if right < heap.len() && head_less(shards, cfg, heap[right], heap[left]) {
            child = right;
        }
        if !head_less(shards, cfg, heap[child], heap[pos]) {
            break;
        }
        heap.swap(pos, child);
        pos = child;
    }
}
