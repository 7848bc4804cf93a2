// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Compressed run-length representation of per-character style attributes
//!
//! [`RunList`] stores a sorted partition of `[0, len)` into maximal runs each
//! carrying a value. Point lookup and range iteration are both used
//! extensively by the [flow generator](crate::flow) and
//! [vertex builder](crate::vertex), which each need to walk several
//! attributes in lock-step — see [`ZipRunIterator`].
//!
//! The composite iterators ([`FilteredRunIterator`], [`OverriddenRunIterator`],
//! [`ZipRunIterator`], [`ConstRunIterator`]) are stateless wrappers: they hold
//! only a reference (or, for `ConstRunIterator`, a single value) and compute
//! boundaries on demand, so stacking several of them costs no more than one
//! allocation per `.ranges()` call (for the boxed iterator returned), never
//! per yielded element.

use smallvec::{smallvec, SmallVec};

use crate::conv::{to_u32, to_usize};

/// Inline capacity for a [`RunList`]'s run storage
///
/// Most style attributes on a document cover it with only a handful of
/// runs (e.g. one color change, one bold span); this avoids a heap
/// allocation for the common case while still growing for documents with
/// many runs.
type Runs<T> = SmallVec<[(u32, T); 4]>;

/// A boxed, lazily-computed sequence of maximal `(start, end, value)` runs
/// covering a queried sub-range
pub type Ranges<'a, T> = Box<dyn Iterator<Item = (usize, usize, T)> + 'a>;

/// A source of per-character run values
///
/// Implemented by [`RunList`] itself and by each of the composite iterator
/// wrappers below, so that flow/shaper/vertex code can be written generically
/// over "whatever gives me a value at an index and a list of ranges".
pub trait RunSource<T: Clone> {
    /// Number of characters covered
    fn len(&self) -> usize;

    /// True if no characters are covered
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at a single character index
    ///
    /// `index` must be `< self.len()`; out-of-range is a programmer error.
    fn value_at(&self, index: usize) -> T;

    /// Maximal runs covering `[start, end)`
    ///
    /// The first yielded range always starts at `start` and the last always
    /// ends at `end`.
    fn ranges(&self, start: usize, end: usize) -> Ranges<'_, T>;
}

/// Compressed run-length list: a total length plus a sorted partition into
/// maximal runs, each carrying a `T`
///
/// Internally, each run is stored as `(end, value)`; a run's start is the
/// previous run's end (or `0` for the first run). This is the data structure
/// a [`Document`](crate::document::Document) implementation is expected to
/// use internally for each recognised style attribute.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunList<T> {
    len: u32,
    runs: Runs<T>,
}

impl<T: Clone + Default> RunList<T> {
    /// Construct an empty run-list
    pub fn empty() -> Self {
        RunList {
            len: 0,
            runs: SmallVec::new(),
        }
    }

    /// Construct a run-list of `len` characters, all carrying `value`
    pub fn new(len: usize, value: T) -> Self {
        let len = to_u32(len);
        let runs = if len > 0 { smallvec![(len, value)] } else { SmallVec::new() };
        RunList { len, runs }
    }

    /// Number of characters covered
    #[inline]
    pub fn len(&self) -> usize {
        to_usize(self.len)
    }

    /// True if no characters are covered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn run_index_at(&self, i: u32) -> usize {
        self.runs.partition_point(|&(end, _)| end <= i)
    }

    /// Value at a single character index
    pub fn value_at(&self, i: usize) -> &T {
        let i = to_u32(i);
        assert!(i < self.len, "RunList::value_at: index out of range");
        &self.runs[self.run_index_at(i)].1
    }

    /// Grow the list by inserting `count` characters at `pos`
    ///
    /// The containing run (the run covering `pos`, or the last run if
    /// `pos == len`) is extended to cover the new characters, i.e. they
    /// inherit that run's value. Later run boundaries are shifted by
    /// `+count`.
    pub fn insert(&mut self, pos: usize, count: usize) {
        assert!(pos <= self.len(), "RunList::insert: pos out of range");
        if count == 0 {
            return;
        }
        let pos = to_u32(pos);
        let count = to_u32(count);

        if self.runs.is_empty() {
            self.runs.push((count, T::default()));
        } else {
            let idx = if pos == self.len {
                self.runs.len() - 1
            } else {
                self.run_index_at(pos)
            };
            for (end, _) in self.runs[idx + 1..].iter_mut() {
                *end += count;
            }
            self.runs[idx].0 += count;
        }
        self.len += count;
    }

    /// Shrink the list by deleting characters `[start, end)`
    ///
    /// Runs fully inside `[start, end)` are removed; runs that straddle an
    /// edge are shrunk. Adjacent runs left with equal values are not
    /// required to merge (iteration behaves identically either way).
    pub fn delete(&mut self, start: usize, end: usize) {
        assert!(end <= self.len(), "RunList::delete: end out of range");
        assert!(start <= end, "RunList::delete: start > end");
        if start == end {
            return;
        }
        let (start, end) = (to_u32(start), to_u32(end));
        let count = end - start;

        let shift = |x: u32| -> u32 {
            if x <= start {
                x
            } else if x >= end {
                x - count
            } else {
                start
            }
        };

        let mut new_runs = Runs::with_capacity(self.runs.len());
        let mut prev_new_end = 0u32;
        for (e, v) in self.runs.drain(..) {
            let new_e = shift(e);
            if new_e > prev_new_end {
                new_runs.push((new_e, v));
                prev_new_end = new_e;
            }
        }
        self.runs = new_runs;
        self.len -= count;
    }

    /// Force a constant `value` over `[start, end)`
    ///
    /// A no-op if `start >= end`. Idempotent: applying the same `set_run`
    /// twice in a row leaves the run-list in the same state as applying it
    /// once.
    pub fn set_run(&mut self, start: usize, end: usize, value: T) {
        if end <= start {
            return;
        }
        assert!(end <= self.len(), "RunList::set_run: end out of range");
        let (start, end) = (to_u32(start), to_u32(end));

        let mut new_runs = Runs::with_capacity(self.runs.len() + 2);
        let mut prev_end = 0u32;
        let mut middle_inserted = false;
        for (e, v) in self.runs.drain(..) {
            let s = prev_end;
            prev_end = e;
            if e <= start {
                new_runs.push((e, v));
            } else if s >= end {
                new_runs.push((e, v));
            } else {
                if s < start {
                    new_runs.push((start, v.clone()));
                }
                if !middle_inserted {
                    new_runs.push((end, value.clone()));
                    middle_inserted = true;
                }
                if e > end {
                    new_runs.push((e, v));
                }
            }
        }
        if !middle_inserted {
            new_runs.push((end, value));
        }
        self.runs = new_runs;
    }

    /// Maximal runs covering `[start, end)`, by reference
    pub fn ranges_ref(&self, start: usize, end: usize) -> RunListRanges<'_, T> {
        assert!(end <= self.len(), "RunList::ranges: end out of range");
        assert!(start <= end, "RunList::ranges: start > end");
        let from = self.run_index_at(to_u32(start));
        RunListRanges {
            runs: &self.runs,
            idx: from,
            pos: to_u32(start),
            end: to_u32(end),
        }
    }
}

/// Iterator over `(start, end, &T)` produced by [`RunList::ranges_ref`]
pub struct RunListRanges<'a, T> {
    runs: &'a [(u32, T)],
    idx: usize,
    pos: u32,
    end: u32,
}

impl<'a, T> Iterator for RunListRanges<'a, T> {
    type Item = (usize, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let (run_end, value) = &self.runs[self.idx];
        let clipped_end = (*run_end).min(self.end);
        let s = to_usize(self.pos);
        let e = to_usize(clipped_end);
        self.pos = clipped_end;
        self.idx += 1;
        Some((s, e, value))
    }
}

impl<T: Clone> RunSource<T> for RunList<T> {
    fn len(&self) -> usize {
        RunList::len(self)
    }

    fn value_at(&self, index: usize) -> T {
        RunList::value_at(self, index).clone()
    }

    fn ranges(&self, start: usize, end: usize) -> Ranges<'_, T> {
        Box::new(
            self.ranges_ref(start, end)
                .map(|(s, e, v)| (s, e, v.clone())),
        )
    }
}

/// Wraps a source, replacing values that fail `predicate` with `default`
///
/// Used for optional style attributes such as `margin_left` (absent ⇒ `0`)
/// or `background_color` (absent ⇒ no fill).
pub struct FilteredRunIterator<'a, T, S: ?Sized> {
    source: &'a S,
    default: T,
    predicate: fn(&T) -> bool,
}

impl<'a, T: Clone, S: RunSource<T> + ?Sized> FilteredRunIterator<'a, T, S> {
    pub fn new(source: &'a S, default: T, predicate: fn(&T) -> bool) -> Self {
        FilteredRunIterator {
            source,
            default,
            predicate,
        }
    }

    fn resolve(&self, value: T) -> T {
        if (self.predicate)(&value) {
            value
        } else {
            self.default.clone()
        }
    }
}

impl<'a, T: Clone, S: RunSource<T> + ?Sized> RunSource<T> for FilteredRunIterator<'a, T, S> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn value_at(&self, index: usize) -> T {
        self.resolve(self.source.value_at(index))
    }

    fn ranges(&self, start: usize, end: usize) -> Ranges<'_, T> {
        Box::new(
            self.source
                .ranges(start, end)
                .map(move |(s, e, v)| (s, e, self.resolve(v))),
        )
    }
}

/// Wraps a source, forcing a constant `value` over `[start, end)`
///
/// Used to render an active selection without mutating the document: the
/// layout composes this on top of the `color`/`background_color` sources
/// just for the vertex-build pass.
pub struct OverriddenRunIterator<'a, T, S: ?Sized> {
    source: &'a S,
    start: usize,
    end: usize,
    value: T,
}

impl<'a, T: Clone, S: RunSource<T> + ?Sized> OverriddenRunIterator<'a, T, S> {
    pub fn new(source: &'a S, start: usize, end: usize, value: T) -> Self {
        OverriddenRunIterator {
            source,
            start,
            end,
            value,
        }
    }
}

impl<'a, T: Clone, S: RunSource<T> + ?Sized> RunSource<T> for OverriddenRunIterator<'a, T, S> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn value_at(&self, index: usize) -> T {
        if index >= self.start && index < self.end {
            self.value.clone()
        } else {
            self.source.value_at(index)
        }
    }

    fn ranges(&self, start: usize, end: usize) -> Ranges<'_, T> {
        // Split the queried range at the override boundaries so that the
        // override's span is always emitted as its own run, even if the
        // underlying source had a single run spanning across it.
        let mut cuts = vec![start, end];
        if self.start > start && self.start < end {
            cuts.push(self.start);
        }
        if self.end > start && self.end < end {
            cuts.push(self.end);
        }
        cuts.sort_unstable();
        cuts.dedup();

        let value = self.value.clone();
        let (ov_start, ov_end) = (self.start, self.end);
        Box::new(cuts.windows(2).flat_map(move |w| {
            let (s, e) = (w[0], w[1]);
            if s >= ov_start && e <= ov_end && ov_start < ov_end {
                vec![(s, e, value.clone())].into_iter()
            } else {
                self.source
                    .ranges(s, e)
                    .collect::<Vec<_>>()
                    .into_iter()
            }
        }))
    }
}

/// A source that yields one constant value for its whole length
///
/// Used where no underlying document run-list exists, e.g. the `wrap`
/// attribute when the layout has no width bound.
#[derive(Clone, Copy)]
pub struct ConstRunIterator<T> {
    len: usize,
    value: T,
}

impl<T> ConstRunIterator<T> {
    pub fn new(len: usize, value: T) -> Self {
        ConstRunIterator { len, value }
    }
}

impl<T: Clone> RunSource<T> for ConstRunIterator<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn value_at(&self, _index: usize) -> T {
        self.value.clone()
    }

    fn ranges(&self, start: usize, end: usize) -> Ranges<'_, T> {
        let value = self.value.clone();
        Box::new(std::iter::once((start, end, value)))
    }
}

/// Zips two sources, yielding the intersection of their run boundaries
///
/// Advances whichever side's current run ends first ("the laggard"), so the
/// combined iterator never produces more runs than the sum of its inputs.
pub struct ZipRunIterator<'a, TA, TB, A: ?Sized, B: ?Sized> {
    a: &'a A,
    b: &'a B,
    _marker: std::marker::PhantomData<(TA, TB)>,
}

impl<'a, TA: Clone, TB: Clone, A: RunSource<TA> + ?Sized, B: RunSource<TB> + ?Sized>
    ZipRunIterator<'a, TA, TB, A, B>
{
    pub fn new(a: &'a A, b: &'a B) -> Self {
        debug_assert_eq!(a.len(), b.len(), "ZipRunIterator: length mismatch");
        ZipRunIterator {
            a,
            b,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<'a, TA: Clone, TB: Clone, A: RunSource<TA> + ?Sized, B: RunSource<TB> + ?Sized>
    RunSource<(TA, TB)> for ZipRunIterator<'a, TA, TB, A, B>
{
    fn len(&self) -> usize {
        self.a.len()
    }

    fn value_at(&self, index: usize) -> (TA, TB) {
        (self.a.value_at(index), self.b.value_at(index))
    }

    fn ranges(&self, start: usize, end: usize) -> Ranges<'_, (TA, TB)> {
        Box::new(ZipCursor {
            a: self.a.ranges(start, end).peekable(),
            b: self.b.ranges(start, end).peekable(),
        })
    }
}

struct ZipCursor<'a, TA, TB> {
    a: std::iter::Peekable<Ranges<'a, TA>>,
    b: std::iter::Peekable<Ranges<'a, TB>>,
}

impl<'a, TA: Clone, TB: Clone> Iterator for ZipCursor<'a, TA, TB> {
    type Item = (usize, usize, (TA, TB));

    fn next(&mut self) -> Option<Self::Item> {
        let &(a_s, a_e, _) = self.a.peek()?;
        let &(b_s, b_e, _) = self.b.peek()?;
        let s = a_s.max(b_s);
        let e = a_e.min(b_e);

        let (_, _, av) = self.a.peek().unwrap().clone();
        let (_, _, bv) = self.b.peek().unwrap().clone();

        if a_e <= e {
            self.a.next();
        }
        if b_e <= e {
            self.b.next();
        }
        Some((s, e, (av, bv)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(rl: &RunList<i32>, start: usize, end: usize) -> Vec<(usize, usize, i32)> {
        RunSource::ranges(rl, start, end).collect()
    }

    #[test]
    fn new_single_run() {
        let rl = RunList::new(10, 5);
        assert_eq!(rl.len(), 10);
        assert_eq!(collect(&rl, 0, 10), vec![(0, 10, 5)]);
    }

    #[test]
    fn set_run_splits() {
        let mut rl = RunList::new(10, 0);
        rl.set_run(3, 6, 9);
        assert_eq!(collect(&rl, 0, 10), vec![(0, 3, 0), (3, 6, 9), (6, 10, 0)]);
    }

    #[test]
    fn set_run_idempotent() {
        let mut rl = RunList::new(10, 0);
        rl.set_run(3, 6, 9);
        let once = collect(&rl, 0, 10);
        rl.set_run(3, 6, 9);
        let twice = collect(&rl, 0, 10);
        assert_eq!(once, twice);
    }

    #[test]
    fn insert_extends_containing_run() {
        let mut rl = RunList::new(10, 0);
        rl.set_run(3, 6, 9);
        rl.insert(4, 2);
        assert_eq!(rl.len(), 12);
        assert_eq!(collect(&rl, 0, 12), vec![(0, 3, 0), (3, 8, 9), (8, 12, 0)]);
    }

    #[test]
    fn insert_at_end_appends_to_last_run() {
        let mut rl = RunList::new(5, 1);
        rl.insert(5, 3);
        assert_eq!(rl.len(), 8);
        assert_eq!(collect(&rl, 0, 8), vec![(0, 8, 1)]);
    }

    #[test]
    fn delete_removes_and_shrinks() {
        let mut rl = RunList::new(10, 0);
        rl.set_run(3, 6, 9);
        rl.delete(4, 5);
        assert_eq!(rl.len(), 9);
        assert_eq!(collect(&rl, 0, 9), vec![(0, 3, 0), (3, 5, 9), (5, 9, 0)]);
    }

    #[test]
    fn delete_whole_run() {
        let mut rl = RunList::new(10, 0);
        rl.set_run(3, 6, 9);
        rl.delete(3, 6);
        assert_eq!(rl.len(), 7);
        assert_eq!(collect(&rl, 0, 7), vec![(0, 7, 0)]);
    }

    #[test]
    fn totality_after_mixed_ops() {
        let mut rl = RunList::new(20, 0);
        rl.set_run(2, 5, 1);
        rl.insert(4, 3);
        rl.set_run(10, 15, 2);
        rl.delete(1, 3);
        let total: usize = RunSource::ranges(&rl, 0, rl.len())
            .map(|(s, e, _)| e - s)
            .sum();
        assert_eq!(total, rl.len());
    }

    #[test]
    fn filtered_applies_default() {
        let rl: RunList<Option<i32>> = {
            let mut rl = RunList::new(6, None);
            rl.set_run(2, 4, Some(7));
            rl
        };
        let filtered = FilteredRunIterator::new(&rl, 0, |v: &Option<i32>| v.is_some());
        // Note: default supplied is a plain i32, but predicate/value types must
        // match; demonstrate with Option<i32> default of None filtered to 0-like
        // sentinel via map afterwards is unnecessary here — direct use instead:
        let filtered2 = FilteredRunIterator::new(&rl, Some(0), |v: &Option<i32>| v.is_some());
        assert_eq!(filtered2.value_at(0), Some(0));
        assert_eq!(filtered2.value_at(2), Some(7));
        let _ = filtered.value_at(0); // exercise the first binding too
    }

    #[test]
    fn overridden_splits_ranges() {
        let rl = RunList::new(10, 1);
        let ov = OverriddenRunIterator::new(&rl, 3, 6, 9);
        let got: Vec<_> = ov.ranges(0, 10).collect();
        assert_eq!(got, vec![(0, 3, 1), (3, 6, 9), (6, 10, 1)]);
    }

    #[test]
    fn zip_intersects_boundaries() {
        let mut a = RunList::new(10, 'x');
        a.set_run(3, 7, 'y');
        let mut b = RunList::new(10, 0);
        b.set_run(5, 9, 1);
        let z = ZipRunIterator::new(&a, &b);
        let got: Vec<_> = z.ranges(0, 10).collect();
        assert_eq!(
            got,
            vec![
                (0, 3, ('x', 0)),
                (3, 5, ('y', 0)),
                (5, 7, ('y', 1)),
                (7, 9, ('x', 1)),
                (9, 10, ('x', 0)),
            ]
        );
    }

    #[test]
    fn const_iterator() {
        let c = ConstRunIterator::new(5, true);
        assert_eq!(c.value_at(3), true);
        assert_eq!(c.ranges(1, 4).collect::<Vec<_>>(), vec![(1, 4, true)]);
    }
}
