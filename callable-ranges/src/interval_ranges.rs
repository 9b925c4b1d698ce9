//! Interval set algebra operations for genomic region sets.
//!
//! Provides bedtools/GenomicRanges-style operations: reduce, setdiff, merge
//! with a gap distance, intersect and union. All operations use 0-based
//! half-open coordinates (BED convention) and are strand-unaware.

use std::collections::HashMap;

use callable_core::models::{Region, RegionSet};

/// Intervals of one contig as `(start, end)` pairs.
type Spans = Vec<(u32, u32)>;

/// Interval set algebra operations on genomic region sets.
///
/// All functions return new `RegionSet` instances. Within a contig the result
/// is sorted by start and free of overlaps. Contigs are reported in order of
/// first appearance in `self`, followed by contigs that only `other` has.
pub trait IntervalRanges {
    /// Merge overlapping and adjacent intervals per chromosome.
    fn reduce(&self) -> RegionSet;

    /// Subtract one region set from another (set difference).
    ///
    /// Removes portions of `self` that overlap with `other`. Both inputs are
    /// reduced internally before subtraction. Operates per-chromosome with a
    /// sweep-line algorithm.
    ///
    /// # Example
    /// ```text
    /// A: chr1 100–200
    /// B: chr1 120–140, chr1 160–180
    /// setdiff(A, B): chr1 100–120, chr1 140–160, chr1 180–200
    /// ```
    fn setdiff(&self, other: &RegionSet) -> RegionSet;

    /// Union of two region sets, coalescing intervals closer than `gap`.
    ///
    /// Two intervals on the same chromosome are joined when
    /// `next.start <= current.end + gap`, so abutting intervals are always
    /// joined, even with `gap == 0`. The joined interval spans the gap.
    ///
    /// # Example
    /// ```text
    /// A: chr1 0–400, chr1 700–1000
    /// B: chr1 420–500
    /// merge(A, B, 50): chr1 0–500, chr1 700–1000
    /// ```
    fn merge(&self, other: &RegionSet, gap: u32) -> RegionSet;

    /// Bases present in both region sets, per chromosome.
    fn intersect(&self, other: &RegionSet) -> RegionSet;

    /// Merge two region sets into a minimal non-overlapping result.
    fn union(&self, other: &RegionSet) -> RegionSet {
        self.merge(other, 0)
    }
}

impl IntervalRanges for RegionSet {
    fn reduce(&self) -> RegionSet {
        let groups = group_by_chr([self]);
        build(groups, 0)
    }

    fn setdiff(&self, other: &RegionSet) -> RegionSet {
        let a = coalesced(group_by_chr([self]), 0);
        let b: HashMap<&str, Spans> = coalesced(group_by_chr([other]), 0).into_iter().collect();

        let mut result: Vec<Region> = Vec::new();

        for (chr, a_spans) in &a {
            let Some(b_spans) = b.get(chr) else {
                result.extend(a_spans.iter().filter_map(|&(s, e)| Region::non_empty(chr, s, e)));
                continue;
            };
            let mut b_idx = 0;

            for &(a_start, a_end) in a_spans {
                // Advance b cursor past intervals that end before this region starts
                while b_idx < b_spans.len() && b_spans[b_idx].1 <= a_start {
                    b_idx += 1;
                }

                let mut pos = a_start;
                let mut j = b_idx;

                while j < b_spans.len() && b_spans[j].0 < a_end && pos < a_end {
                    if b_spans[j].0 > pos {
                        result.extend(Region::non_empty(chr, pos, b_spans[j].0));
                    }
                    pos = pos.max(b_spans[j].1);
                    j += 1;
                }

                // Remaining tail after all subtraction intervals
                if pos < a_end {
                    result.extend(Region::non_empty(chr, pos, a_end));
                }
            }
        }

        RegionSet::from(result)
    }

    fn merge(&self, other: &RegionSet, gap: u32) -> RegionSet {
        let groups = group_by_chr([self, other]);
        build(groups, gap)
    }

    fn intersect(&self, other: &RegionSet) -> RegionSet {
        let a = coalesced(group_by_chr([self]), 0);
        let b: HashMap<&str, Spans> = coalesced(group_by_chr([other]), 0).into_iter().collect();

        let mut result: Vec<Region> = Vec::new();

        for (chr, a_spans) in &a {
            let Some(b_spans) = b.get(chr) else {
                continue;
            };

            let (mut i, mut j) = (0, 0);
            while i < a_spans.len() && j < b_spans.len() {
                let (a_start, a_end) = a_spans[i];
                let (b_start, b_end) = b_spans[j];

                result.extend(Region::non_empty(chr, a_start.max(b_start), a_end.min(b_end)));

                // Drop whichever interval finishes first; the other may still
                // overlap the next one.
                if a_end <= b_end {
                    i += 1;
                } else {
                    j += 1;
                }
            }
        }

        RegionSet::from(result)
    }
}

///
/// Collect intervals per chromosome across several sets, keeping chromosome
/// order of first appearance.
///
fn group_by_chr<'a, const N: usize>(sets: [&'a RegionSet; N]) -> Vec<(&'a str, Spans)> {
    let mut order: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Spans)> = Vec::new();

    for set in sets {
        for region in set {
            let idx = *order.entry(region.chr()).or_insert_with(|| {
                groups.push((region.chr(), Vec::new()));
                groups.len() - 1
            });
            groups[idx].1.push((region.start(), region.end()));
        }
    }

    groups
}

///
/// Sort each chromosome's intervals and sweep them together, joining an
/// interval into the current one when `start <= current_end + gap`.
///
fn coalesced(groups: Vec<(&str, Spans)>, gap: u32) -> Vec<(&str, Spans)> {
    groups
        .into_iter()
        .map(|(chr, mut spans)| {
            spans.sort_unstable();

            let mut merged: Spans = Vec::with_capacity(spans.len());
            for (start, end) in spans {
                match merged.last_mut() {
                    Some(current) if start <= current.1.saturating_add(gap) => {
                        current.1 = current.1.max(end);
                    }
                    _ => merged.push((start, end)),
                }
            }
            (chr, merged)
        })
        .collect()
}

fn build(groups: Vec<(&str, Spans)>, gap: u32) -> RegionSet {
    let regions: Vec<Region> = coalesced(groups, gap)
        .into_iter()
        .flat_map(|(chr, spans)| {
            spans
                .into_iter()
                .filter_map(move |(start, end)| Region::non_empty(chr, start, end))
        })
        .collect();
    RegionSet::from(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn make_region(chr: &str, start: u32, end: u32) -> Region {
        Region::new(chr, start, end).unwrap()
    }

    fn make_regionset(regions: Vec<(&str, u32, u32)>) -> RegionSet {
        let regions: Vec<Region> = regions
            .into_iter()
            .map(|(chr, start, end)| make_region(chr, start, end))
            .collect();
        RegionSet::from(regions)
    }

    // ── reduce tests ────────────────────────────────────────────────────

    #[rstest]
    fn test_reduce_overlapping() {
        let rs = make_regionset(vec![
            ("chr1", 2, 6),
            ("chr1", 4, 7),
            ("chr1", 5, 9),
            ("chr1", 7, 12),
        ]);
        let reduced = rs.reduce();
        assert_eq!(reduced.regions(), &[make_region("chr1", 2, 12)]);
    }

    #[rstest]
    fn test_reduce_non_overlapping() {
        let rs = make_regionset(vec![("chr1", 0, 5), ("chr1", 10, 15), ("chr1", 20, 25)]);
        let reduced = rs.reduce();
        assert_eq!(reduced.len(), 3);
    }

    #[rstest]
    fn test_reduce_adjacent_merged() {
        let rs = make_regionset(vec![("chr1", 0, 10), ("chr1", 10, 20)]);
        let reduced = rs.reduce();
        assert_eq!(reduced.regions(), &[make_region("chr1", 0, 20)]);
    }

    #[rstest]
    fn test_reduce_keeps_first_seen_chrom_order() {
        let rs = make_regionset(vec![
            ("chr2", 20, 30),
            ("chr10", 5, 15),
            ("chr2", 0, 10),
            ("chr10", 0, 8),
        ]);
        let reduced = rs.reduce();
        assert_eq!(
            reduced.regions(),
            &[
                make_region("chr2", 0, 10),
                make_region("chr2", 20, 30),
                make_region("chr10", 0, 15),
            ]
        );
    }

    #[rstest]
    fn test_reduce_empty() {
        let rs = RegionSet::from(Vec::<Region>::new());
        assert!(rs.reduce().is_empty());
    }

    // ── setdiff tests ───────────────────────────────────────────────────

    #[rstest]
    fn test_setdiff_middle_subtraction() {
        let a = make_regionset(vec![("chr1", 0, 1000)]);
        let b = make_regionset(vec![("chr1", 400, 700)]);
        let result = a.setdiff(&b);
        assert_eq!(
            result.regions(),
            &[make_region("chr1", 0, 400), make_region("chr1", 700, 1000)]
        );
    }

    #[rstest]
    fn test_setdiff_complete_subtraction() {
        let a = make_regionset(vec![("chr1", 3, 7)]);
        let b = make_regionset(vec![("chr1", 0, 10)]);
        assert!(a.setdiff(&b).is_empty());
    }

    #[rstest]
    fn test_setdiff_no_overlap() {
        let a = make_regionset(vec![("chr1", 0, 5)]);
        let b = make_regionset(vec![("chr1", 10, 20)]);
        assert_eq!(a.setdiff(&b).regions(), &[make_region("chr1", 0, 5)]);
    }

    #[rstest]
    fn test_setdiff_multi_chrom_keeps_order() {
        let a = make_regionset(vec![("chr2", 0, 10), ("chr1", 0, 10)]);
        let b = make_regionset(vec![("chr1", 5, 15)]);
        let result = a.setdiff(&b);
        assert_eq!(
            result.regions(),
            &[make_region("chr2", 0, 10), make_region("chr1", 0, 5)]
        );
    }

    #[rstest]
    fn test_setdiff_multiple_subtractions() {
        let a = make_regionset(vec![("chr1", 0, 20)]);
        let b = make_regionset(vec![("chr1", 2, 5), ("chr1", 8, 12), ("chr1", 15, 18)]);
        let result = a.setdiff(&b);
        assert_eq!(
            result.regions(),
            &[
                make_region("chr1", 0, 2),
                make_region("chr1", 5, 8),
                make_region("chr1", 12, 15),
                make_region("chr1", 18, 20),
            ]
        );
    }

    #[rstest]
    fn test_setdiff_unsorted_overlapping_subtrahend() {
        let a = make_regionset(vec![("chr1", 0, 100)]);
        let b = make_regionset(vec![("chr1", 50, 60), ("chr1", 10, 30), ("chr1", 20, 55)]);
        let result = a.setdiff(&b);
        assert_eq!(
            result.regions(),
            &[make_region("chr1", 0, 10), make_region("chr1", 60, 100)]
        );
    }

    // ── merge tests ─────────────────────────────────────────────────────

    #[rstest]
    fn test_merge_gap_joins_near_intervals() {
        let a = make_regionset(vec![("chr1", 0, 400), ("chr1", 700, 1000)]);
        let b = make_regionset(vec![("chr1", 420, 500)]);
        let result = a.merge(&b, 50);
        assert_eq!(
            result.regions(),
            &[make_region("chr1", 0, 500), make_region("chr1", 700, 1000)]
        );
    }

    #[rstest]
    #[case(0)]
    #[case(10)]
    fn test_merge_abutting_always_joined(#[case] gap: u32) {
        let a = make_regionset(vec![("chr1", 0, 10)]);
        let b = make_regionset(vec![("chr1", 10, 20)]);
        assert_eq!(a.merge(&b, gap).regions(), &[make_region("chr1", 0, 20)]);
    }

    #[rstest]
    fn test_merge_gap_boundary_is_inclusive() {
        let a = make_regionset(vec![("chr1", 0, 10)]);
        let joined = make_regionset(vec![("chr1", 15, 20)]);
        let apart = make_regionset(vec![("chr1", 16, 20)]);
        assert_eq!(a.merge(&joined, 5).len(), 1);
        assert_eq!(a.merge(&apart, 5).len(), 2);
    }

    #[rstest]
    fn test_merge_never_crosses_chromosomes() {
        let a = make_regionset(vec![("chr1", 0, 10)]);
        let b = make_regionset(vec![("chr2", 0, 10)]);
        let result = a.merge(&b, 1_000);
        assert_eq!(
            result.regions(),
            &[make_region("chr1", 0, 10), make_region("chr2", 0, 10)]
        );
    }

    #[rstest]
    fn test_merge_two_samples_with_gap() {
        let a = make_regionset(vec![("chr1", 0, 400), ("chr1", 700, 1000)]);
        let b = make_regionset(vec![("chr1", 0, 350), ("chr1", 720, 1000)]);
        let result = a.merge(&b, 50);
        assert_eq!(
            result.regions(),
            &[make_region("chr1", 0, 400), make_region("chr1", 700, 1000)]
        );
    }

    #[rstest]
    fn test_union_is_merge_without_gap() {
        let a = make_regionset(vec![("chr1", 0, 10)]);
        let b = make_regionset(vec![("chr1", 11, 20)]);
        assert_eq!(a.union(&b).len(), 2);
    }

    // ── intersect tests ─────────────────────────────────────────────────

    #[rstest]
    fn test_intersect_overlaps_across_all_regions() {
        let a = make_regionset(vec![("chr1", 0, 100), ("chr2", 0, 50)]);
        let b = make_regionset(vec![("chr1", 10, 20), ("chr1", 90, 150), ("chr3", 0, 10)]);
        let result = a.intersect(&b);
        assert_eq!(
            result.regions(),
            &[make_region("chr1", 10, 20), make_region("chr1", 90, 100)]
        );
    }

    #[rstest]
    fn test_intersect_touching_is_empty() {
        let a = make_regionset(vec![("chr1", 0, 10)]);
        let b = make_regionset(vec![("chr1", 10, 20)]);
        assert!(a.intersect(&b).is_empty());
    }

    #[rstest]
    fn test_intersect_contained() {
        let a = make_regionset(vec![("chr1", 0, 100)]);
        let b = make_regionset(vec![("chr1", 30, 70)]);
        assert_eq!(a.intersect(&b).regions(), &[make_region("chr1", 30, 70)]);
    }
}
