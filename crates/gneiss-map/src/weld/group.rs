use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed-size set of workers that run one kernel together.
///
/// Each of the `num_threads` workers owns `items_per_thread` consecutive items (a "blocked" arrangement), so a group can hold at
/// most [`capacity`](Self::capacity) items. Workers only cooperate inside their own group: there is no coordination between
/// groups, and kernels never split oversized inputs across several of them.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CooperativeGroup {
    pub num_threads: usize,
    pub items_per_thread: usize,
}

impl Default for CooperativeGroup {
    fn default() -> Self {
        Self::new(256, 16)
    }
}

impl CooperativeGroup {
    pub const fn new(num_threads: usize, items_per_thread: usize) -> Self {
        Self {
            num_threads,
            items_per_thread,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.num_threads * self.items_per_thread
    }

    /// The item slots owned by the worker with `rank`.
    #[inline]
    pub fn thread_items(&self, rank: usize) -> Range<usize> {
        let start = rank * self.items_per_thread;
        start..start + self.items_per_thread
    }

    /// Returns how many of `num_items` the group will process. Anything above capacity is reported and dropped.
    pub fn clamp_to_capacity(&self, kernel: &str, num_items: usize) -> usize {
        let capacity = self.capacity();
        if num_items > capacity {
            log::error!(
                "{}: {} items exceed the group capacity of {} ({} threads x {} items); dropping the last {}",
                kernel,
                num_items,
                capacity,
                self.num_threads,
                self.items_per_thread,
                num_items - capacity
            );
            capacity
        } else {
            num_items
        }
    }

    /// Runs `f` once per worker rank, in parallel. Returning is the barrier: every worker has finished when this returns.
    pub fn phase<R, F>(&self, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Send + Sync,
        R: Send,
    {
        (0..self.num_threads).into_par_iter().map(f).collect()
    }
}

const RADIX_BITS: u32 = 8;
const RADIX: usize = 1 << RADIX_BITS;

#[inline]
fn digit(key: u32, shift: u32) -> usize {
    ((key >> shift) as usize) & (RADIX - 1)
}

/// Stable LSD radix sort of `(key, value)` pairs across the whole group. Both slices must hold exactly `group.capacity()`
/// items.
pub fn block_radix_sort_pairs<V>(group: &CooperativeGroup, keys: &mut [u32], values: &mut [V])
where
    V: Copy + Send + Sync,
{
    debug_assert_eq!(keys.len(), group.capacity());
    debug_assert_eq!(values.len(), group.capacity());

    let sources: Vec<AtomicUsize> = (0..keys.len()).map(|_| AtomicUsize::new(0)).collect();

    for shift in (0..u32::BITS).step_by(RADIX_BITS as usize) {
        let src_keys: &[u32] = keys;

        let histograms: Vec<[usize; RADIX]> = group.phase(|rank| {
            let mut histogram = [0; RADIX];
            for &key in &src_keys[group.thread_items(rank)] {
                histogram[digit(key, shift)] += 1;
            }
            histogram
        });

        // Digit-major, then rank-major: equal digits keep their relative order, which is what makes the sort stable.
        let mut offsets = vec![[0; RADIX]; group.num_threads];
        let mut running = 0;
        let mut single_digit = false;
        for d in 0..RADIX {
            let digit_start = running;
            for (rank, histogram) in histograms.iter().enumerate() {
                offsets[rank][d] = running;
                running += histogram[d];
            }
            if running - digit_start == src_keys.len() {
                single_digit = true;
            }
        }
        if single_digit {
            // Every key shares this digit, so the pass would be the identity permutation.
            continue;
        }

        // Scatter: every item records itself as the source of its destination slot.
        group.phase(|rank| {
            let mut next = offsets[rank];
            for src in group.thread_items(rank) {
                let d = digit(src_keys[src], shift);
                sources[next[d]].store(src, Ordering::Relaxed);
                next[d] += 1;
            }
        });

        // Gather: every worker fills its own slots from their sources.
        let src_values: &[V] = values;
        let sorted: Vec<(u32, V)> = group
            .phase(|rank| {
                group
                    .thread_items(rank)
                    .map(|dst| {
                        let src = sources[dst].load(Ordering::Relaxed);
                        (src_keys[src], src_values[src])
                    })
                    .collect::<Vec<_>>()
            })
            .concat();

        for (i, (key, value)) in sorted.into_iter().enumerate() {
            keys[i] = key;
            values[i] = value;
        }
    }
}

/// Flags the first item of every run of equal keys. Items at or beyond `num_valid` are never flagged.
pub fn block_flag_heads(group: &CooperativeGroup, keys: &[u32], num_valid: usize) -> Vec<u32> {
    debug_assert_eq!(keys.len(), group.capacity());

    group
        .phase(|rank| {
            group
                .thread_items(rank)
                .map(|i| (i < num_valid && (i == 0 || keys[i] != keys[i - 1])) as u32)
                .collect::<Vec<_>>()
        })
        .concat()
}

/// Inclusive prefix sum across the whole group.
pub fn block_inclusive_sum(group: &CooperativeGroup, values: &[u32]) -> Vec<u32> {
    debug_assert_eq!(values.len(), group.capacity());

    let thread_totals: Vec<u32> = group.phase(|rank| values[group.thread_items(rank)].iter().sum());

    let mut thread_prefixes = Vec::with_capacity(thread_totals.len());
    let mut running = 0;
    for total in thread_totals {
        thread_prefixes.push(running);
        running += total;
    }

    group
        .phase(|rank| {
            let mut sum = thread_prefixes[rank];
            values[group.thread_items(rank)]
                .iter()
                .map(|&v| {
                    sum += v;
                    sum
                })
                .collect::<Vec<_>>()
        })
        .concat()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
