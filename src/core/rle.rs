//! Run-length encoded voxel rows.
//!
//! Voxels are grouped into rows of constant `(j, k)`. Each row stores sorted,
//! non-overlapping runs `[start, end)` along `i`. Rows are kept minimal: two
//! runs of the same value never touch, they are merged instead.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::iter;

use super::bounds::BoundsIjk;
use super::index::{Connectivity, Dimensions};
use super::voxel::Voxel;
use crate::error::{Result, VoxelError};

/// A range `[start, end)` of voxels along `i` sharing one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run<T> {
    pub value: T,
    pub start: usize,
    pub end: usize,
}

impl<T> Run<T> {
    pub fn new(value: T, start: usize, end: usize) -> Self {
        Self { value, start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        self.start <= i && i < self.end
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloodFillConfig {
    pub connectivity: Connectivity,
    /// Keep the fill inside the plane of the seed.
    pub single_plane: bool,
}

impl FloodFillConfig {
    pub fn new(connectivity: Connectivity) -> Self {
        Self {
            connectivity,
            single_plane: false,
        }
    }

    pub fn in_plane(mut self) -> Self {
        self.single_plane = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RunTable<T> {
    dimensions: Dimensions,
    rows: BTreeMap<usize, Vec<Run<T>>>,
    default_value: Option<T>,
}

impl<T: Copy + PartialEq + Debug> RunTable<T> {
    pub fn new(dimensions: Dimensions) -> Self {
        Self::with_default_value(dimensions, None)
    }

    /// A table where indices without a run read as `default_value`.
    ///
    /// The default also fills the gaps of [`RunTable::materialize`], so dense
    /// planes agree with [`RunTable::get`]. Without a default, gaps are zero.
    pub fn with_default_value(dimensions: Dimensions, default_value: Option<T>) -> Self {
        Self {
            dimensions,
            rows: BTreeMap::new(),
            default_value,
        }
    }

    #[inline]
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    #[inline]
    pub fn default_value(&self) -> Option<T> {
        self.default_value
    }

    pub fn set_default_value(&mut self, default_value: Option<T>) {
        self.default_value = default_value;
    }

    /// Row key and `i` of a linear index.
    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        let (row_key, i) = num_integer::div_rem(index, self.dimensions.width);
        (row_key, i)
    }

    /// Position of the first run ending after `i`, or `row.len()`.
    #[inline]
    fn find_run(row: &[Run<T>], i: usize) -> usize {
        row.partition_point(|run| run.end <= i)
    }

    /// Position of the run covering `i`.
    fn covering_run(row: &[Run<T>], i: usize) -> Option<usize> {
        let n = Self::find_run(row, i);
        (n < row.len() && row[n].start <= i).then_some(n)
    }

    /// The run covering voxel `(i, j, k)`.
    pub fn run_at(&self, i: usize, j: usize, k: usize) -> Option<&Run<T>> {
        let row = self.rows.get(&self.dimensions.row_key(j, k))?;
        Self::covering_run(row, i).map(|n| &row[n])
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.get_or(index, self.default_value)
    }

    /// Like [`RunTable::get`] with an explicit value for uncovered indices.
    pub fn get_or(&self, index: usize, default_value: Option<T>) -> Option<T> {
        let (row_key, i) = self.locate(index);
        self.rows
            .get(&row_key)
            .and_then(|row| Self::covering_run(row, i).map(|n| row[n].value))
            .or(default_value)
    }

    /// Whether a run covers `index`.
    pub fn has(&self, index: usize) -> bool {
        let (row_key, i) = self.locate(index);
        self.rows
            .get(&row_key)
            .is_some_and(|row| Self::covering_run(row, i).is_some())
    }

    /// Stores `value` at `index`. Returns `false` when the index already held it.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        let (row_key, i) = self.locate(index);

        let row = match self.rows.entry(row_key) {
            Entry::Vacant(entry) => {
                entry.insert(vec![Run::new(value, i, i + 1)]);
                return true;
            }
            Entry::Occupied(entry) => entry.into_mut(),
        };

        let n = Self::find_run(row, i);

        if n < row.len() && row[n].start <= i {
            if row[n].value == value {
                return false;
            }
            Self::split_run(row, n, i, value);
        } else {
            Self::insert_in_gap(row, n, i, value);
        }

        debug_assert!(
            Self::row_is_valid(row, self.dimensions.width),
            "invalid row {row_key} after set at i = {i}: {row:?}"
        );

        true
    }

    /// Inserts a single voxel into the gap before `row[n]`.
    fn insert_in_gap(row: &mut Vec<Run<T>>, n: usize, i: usize, value: T) {
        let merge_prev = n > 0 && row[n - 1].end == i && row[n - 1].value == value;
        let merge_next = n < row.len() && row[n].start == i + 1 && row[n].value == value;

        match (merge_prev, merge_next) {
            (true, true) => {
                row[n - 1].end = row[n].end;
                row.remove(n);
            }
            (true, false) => row[n - 1].end = i + 1,
            (false, true) => row[n].start = i,
            (false, false) => row.insert(n, Run::new(value, i, i + 1)),
        }
    }

    /// Overwrites voxel `i` inside `row[n]` with a different value.
    fn split_run(row: &mut Vec<Run<T>>, n: usize, i: usize, value: T) {
        let run = row[n];
        let left = (run.start < i).then(|| Run::new(run.value, run.start, i));
        let right = (i + 1 < run.end).then(|| Run::new(run.value, i + 1, run.end));

        let mut inserted = Run::new(value, i, i + 1);
        let mut replaced = n..n + 1;

        // the new voxel can only touch an outer neighbour when it sits on the
        // boundary of the run it replaces
        if left.is_none() && n > 0 && row[n - 1].end == i && row[n - 1].value == value {
            inserted.start = row[n - 1].start;
            replaced.start = n - 1;
        }
        if right.is_none()
            && n + 1 < row.len()
            && row[n + 1].start == i + 1
            && row[n + 1].value == value
        {
            inserted.end = row[n + 1].end;
            replaced.end = n + 2;
        }

        row.splice(
            replaced,
            left.into_iter().chain(iter::once(inserted)).chain(right),
        );
    }

    /// Removes the voxel at `index`. Returns `false` when no run covered it.
    pub fn delete(&mut self, index: usize) -> bool {
        let (row_key, i) = self.locate(index);

        let Some(row) = self.rows.get_mut(&row_key) else {
            return false;
        };
        let Some(n) = Self::covering_run(row, i) else {
            return false;
        };

        let run = row[n];
        let left = (run.start < i).then(|| Run::new(run.value, run.start, i));
        let right = (i + 1 < run.end).then(|| Run::new(run.value, i + 1, run.end));
        row.splice(n..n + 1, left.into_iter().chain(right));

        if row.is_empty() {
            self.rows.remove(&row_key);
        } else {
            debug_assert!(Self::row_is_valid(row, self.dimensions.width));
        }

        true
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn run_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// Number of voxels covered by runs.
    pub fn voxel_count(&self) -> usize {
        self.rows.values().flatten().map(Run::len).sum()
    }

    /// The runs of row `(j, k)`.
    pub fn row(&self, j: usize, k: usize) -> Option<&[Run<T>]> {
        self.rows
            .get(&self.dimensions.row_key(j, k))
            .map(Vec::as_slice)
    }

    /// Replaces the runs of row `(j, k)`. An empty list removes the row.
    pub fn set_row(&mut self, j: usize, k: usize, mut runs: Vec<Run<T>>) {
        let row_key = self.dimensions.row_key(j, k);
        runs.retain(|run| !run.is_empty());
        runs.sort_by_key(|run| run.start);
        Self::compact_row(&mut runs);

        if runs.is_empty() {
            self.rows.remove(&row_key);
        } else {
            debug_assert!(Self::row_is_valid(&runs, self.dimensions.width));
            self.rows.insert(row_key, runs);
        }
    }

    /// Visits every run in row-major order. The first argument is the linear
    /// index of `i = 0` in the run's row.
    pub fn for_each_run<F: FnMut(usize, &Run<T>)>(&self, mut callback: F) {
        for (row_key, row) in &self.rows {
            let base_index = row_key * self.dimensions.width;
            for run in row {
                callback(base_index, run);
            }
        }
    }

    /// Visits every covered voxel in row-major order.
    pub fn for_each<F: FnMut(usize, T)>(&self, mut callback: F) {
        self.for_each_run(|base_index, run| {
            for i in run.start..run.end {
                callback(base_index + i, run.value);
            }
        });
    }

    /// Linear indices of every covered voxel, ascending.
    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        let width = self.dimensions.width;
        self.rows.iter().flat_map(move |(row_key, row)| {
            row.iter()
                .flat_map(move |run| (run.start..run.end).map(move |i| row_key * width + i))
        })
    }

    /// Rebuilds the rows inside `bounds` from `sampler`.
    ///
    /// Consecutive equal samples along `i` form one run, `None` leaves a gap.
    /// Every row receiving at least one sample is replaced; the previous runs
    /// of that row are dropped, including those outside `bounds`.
    pub fn fill_from<F>(&mut self, mut sampler: F, bounds: &BoundsIjk)
    where
        F: FnMut(usize, usize, usize) -> Option<T>,
    {
        firestorm::profile_fn!(fill_from);

        let Some(bounds) = bounds.clamped(&self.dimensions) else {
            return;
        };
        let ([i_min, i_max], [j_min, j_max], [k_min, k_max]) = (bounds.i(), bounds.j(), bounds.k());

        for k in k_min..=k_max {
            for j in j_min..=j_max {
                let mut row: Vec<Run<T>> = Vec::new();
                let mut open = false;

                for i in i_min..=i_max {
                    let Some(value) = sampler(i, j, k) else {
                        open = false;
                        continue;
                    };

                    match row.last_mut() {
                        Some(run) if open && run.value == value => run.end += 1,
                        _ => row.push(Run::new(value, i, i + 1)),
                    }
                    open = true;
                }

                if !row.is_empty() {
                    self.rows.insert(self.dimensions.row_key(j, k), row);
                }
            }
        }

        log::trace!(
            "filled {} runs in {} rows",
            self.run_count(),
            self.row_count()
        );
    }

    /// Repaints the region connected to `(i, j, k)` that holds the seed's
    /// value, returning the number of voxels changed.
    pub fn flood_fill(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        value: T,
        config: &FloodFillConfig,
    ) -> Result<usize> {
        let mut changed = BoundsIjk::empty();
        self.flood_fill_tracked(i, j, k, value, config, &mut changed)
    }

    /// [`RunTable::flood_fill`] that also grows `changed` by every repainted voxel.
    pub fn flood_fill_tracked(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        value: T,
        config: &FloodFillConfig,
        changed: &mut BoundsIjk,
    ) -> Result<usize> {
        firestorm::profile_fn!(flood_fill);

        let seed_key = self.dimensions.row_key(j, k);
        let seed = self
            .rows
            .get(&seed_key)
            .and_then(|row| Self::covering_run(row, i).map(|n| (n, row[n].value)));

        let Some((seed_run, source_value)) = seed else {
            return Err(VoxelError::FloodFillSeedMissing { i, j, k });
        };
        if source_value == value {
            return Err(VoxelError::FloodFillSameValue);
        }

        let mut stack = vec![(j, k, seed_run)];
        let mut touched_rows = BTreeSet::new();
        let mut count = 0;

        while let Some((j, k, n)) = stack.pop() {
            let row_key = self.dimensions.row_key(j, k);
            let Some(run) = self.rows.get_mut(&row_key).and_then(|row| row.get_mut(n)) else {
                continue;
            };
            if run.value != source_value {
                continue;
            }

            run.value = value;
            let (start, end) = (run.start, run.end);

            count += end - start;
            changed.include(start, j, k);
            changed.include(end - 1, j, k);
            touched_rows.insert(row_key);

            self.push_adjacent_runs(&mut stack, (j, k, n), (start, end), source_value, config);
        }

        for row_key in touched_rows {
            if let Some(row) = self.rows.get_mut(&row_key) {
                Self::compact_row(row);
            }
        }

        log::debug!("flood fill from ({i}, {j}, {k}) repainted {count} voxels");

        Ok(count)
    }

    fn push_adjacent_runs(
        &self,
        stack: &mut Vec<(usize, usize, usize)>,
        (j, k, n): (usize, usize, usize),
        (start, end): (usize, usize),
        source_value: T,
        config: &FloodFillConfig,
    ) {
        if let Some(row) = self.rows.get(&self.dimensions.row_key(j, k)) {
            if n > 0 && row[n - 1].end == start && row[n - 1].value == source_value {
                stack.push((j, k, n - 1));
            }
            if n + 1 < row.len() && row[n + 1].start == end && row[n + 1].value == source_value {
                stack.push((j, k, n + 1));
            }
        }

        let widened = (start.saturating_sub(1), (end + 1).min(self.dimensions.width));
        let exact = (start, end);

        let (side_range, diagonal_range) = match config.connectivity {
            Connectivity::Face => (exact, None),
            Connectivity::Edge => (widened, Some(exact)),
            Connectivity::Vertex => (widened, Some(widened)),
        };

        for (dj, dk) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            if config.single_plane && dk != 0 {
                continue;
            }
            self.push_overlapping_runs(stack, (j, k), (dj, dk), side_range, source_value);
        }

        if let Some(diagonal_range) = diagonal_range {
            if !config.single_plane {
                for (dj, dk) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
                    self.push_overlapping_runs(
                        stack,
                        (j, k),
                        (dj, dk),
                        diagonal_range,
                        source_value,
                    );
                }
            }
        }
    }

    fn push_overlapping_runs(
        &self,
        stack: &mut Vec<(usize, usize, usize)>,
        (j, k): (usize, usize),
        (dj, dk): (isize, isize),
        (lo, hi): (usize, usize),
        source_value: T,
    ) {
        let (Some(j), Some(k)) = (j.checked_add_signed(dj), k.checked_add_signed(dk)) else {
            return;
        };
        if j >= self.dimensions.height || k >= self.dimensions.depth {
            return;
        }
        let Some(row) = self.rows.get(&self.dimensions.row_key(j, k)) else {
            return;
        };

        let first = Self::find_run(row, lo);
        for (n, run) in row.iter().enumerate().skip(first) {
            if run.start >= hi {
                break;
            }
            if run.value == source_value {
                stack.push((j, k, n));
            }
        }
    }

    /// Merges touching runs of equal value.
    fn compact_row(row: &mut Vec<Run<T>>) {
        row.dedup_by(|next, prev| {
            if prev.end == next.start && prev.value == next.value {
                prev.end = next.end;
                true
            } else {
                false
            }
        });
    }

    fn row_is_valid(row: &[Run<T>], width: usize) -> bool {
        !row.is_empty()
            && row.iter().all(|run| run.start < run.end && run.end <= width)
            && row.windows(2).all(|pair| {
                pair[0].end < pair[1].start
                    || (pair[0].end == pair[1].start && pair[0].value != pair[1].value)
            })
    }

    /// Checks that every row is sorted, non-overlapping and minimal.
    pub fn validate(&self) -> bool {
        self.rows
            .values()
            .all(|row| Self::row_is_valid(row, self.dimensions.width))
    }
}

impl<T: Voxel> RunTable<T> {
    /// Expands plane `k` into a dense buffer of `width * height * T::COMPONENTS`
    /// components. Voxels without a run take the default value, or zero when
    /// the table has none. `buffer` is reused when given.
    pub fn materialize(&self, k: usize, buffer: Option<Vec<T::Component>>) -> Vec<T::Component> {
        let len = self.dimensions.frame_size() * T::COMPONENTS;
        let mut buffer = buffer.unwrap_or_default();
        buffer.clear();
        buffer.resize(len, Default::default());

        self.materialize_into(k, &mut buffer);
        buffer
    }

    /// Writes the runs of plane `k` into `out`, which must already be zeroed.
    /// Uncovered voxels receive the default value when the table has one.
    pub fn materialize_into(&self, k: usize, out: &mut [T::Component]) {
        firestorm::profile_fn!(materialize);

        let width = self.dimensions.width;
        let components = T::COMPONENTS;

        if let Some(default_value) = self.default_value {
            for voxel in out.chunks_exact_mut(components) {
                default_value.write_components(voxel);
            }
        }

        for j in 0..self.dimensions.height {
            let Some(row) = self.row(j, k) else {
                continue;
            };
            let row_offset = j * width;
            for run in row {
                for i in run.start..run.end {
                    let offset = (row_offset + i) * components;
                    run.value
                        .write_components(&mut out[offset..offset + components]);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn runs<T: Copy + PartialEq + Debug>(
        table: &RunTable<T>,
        j: usize,
        k: usize,
    ) -> Vec<(usize, usize, T)> {
        table
            .row(j, k)
            .unwrap_or_default()
            .iter()
            .map(|run| (run.start, run.end, run.value))
            .collect()
    }

    fn table_with(width: usize, values: &[(usize, u8)]) -> RunTable<u8> {
        let mut table = RunTable::new(Dimensions::new(width, 1, 1));
        for &(i, value) in values {
            table.set(i, value);
        }
        table
    }

    #[test]
    fn test_get_default_value() {
        let mut table = RunTable::with_default_value(Dimensions::new(4, 4, 1), Some(9u8));
        assert_eq!(table.get(5), Some(9));
        assert_eq!(table.get_or(5, None), None);

        table.set(5, 1);
        assert_eq!(table.get(5), Some(1));
        assert_eq!(table.get(4), Some(9));
        assert!(table.has(5));
        assert!(!table.has(6));
    }

    #[test]
    fn test_set_new_row_and_extend() {
        let mut table = table_with(10, &[(2, 1)]);
        assert_eq!(runs(&table, 0, 0), vec![(2, 3, 1)]);

        // extends the last run
        assert!(table.set(3, 1));
        assert_eq!(runs(&table, 0, 0), vec![(2, 4, 1)]);

        // appends past a gap
        assert!(table.set(6, 1));
        assert_eq!(runs(&table, 0, 0), vec![(2, 4, 1), (6, 7, 1)]);

        // appends an adjacent run of a different value
        assert!(table.set(7, 2));
        assert_eq!(runs(&table, 0, 0), vec![(2, 4, 1), (6, 7, 1), (7, 8, 2)]);
    }

    #[test]
    fn test_set_inside_same_value_is_noop() {
        let mut table = table_with(10, &[(2, 1), (3, 1), (4, 1)]);
        assert!(!table.set(3, 1));
        assert_eq!(runs(&table, 0, 0), vec![(2, 5, 1)]);
    }

    #[test]
    fn test_set_splits_run() {
        // interior
        let mut table = table_with(10, &[(2, 1), (3, 1), (4, 1)]);
        assert!(table.set(3, 2));
        assert_eq!(runs(&table, 0, 0), vec![(2, 3, 1), (3, 4, 2), (4, 5, 1)]);

        // first voxel of a run
        let mut table = table_with(10, &[(2, 1), (3, 1), (4, 1)]);
        assert!(table.set(2, 2));
        assert_eq!(runs(&table, 0, 0), vec![(2, 3, 2), (3, 5, 1)]);

        // last voxel of a run
        let mut table = table_with(10, &[(2, 1), (3, 1), (4, 1)]);
        assert!(table.set(4, 2));
        assert_eq!(runs(&table, 0, 0), vec![(2, 4, 1), (4, 5, 2)]);

        // single voxel run
        let mut table = table_with(10, &[(2, 1)]);
        assert!(table.set(2, 2));
        assert_eq!(runs(&table, 0, 0), vec![(2, 3, 2)]);
    }

    #[test]
    fn test_set_boundary_merges_with_neighbour() {
        // first voxel of a run merges into the previous run
        let mut table = table_with(10, &[(0, 2), (1, 2), (2, 1), (3, 1)]);
        assert!(table.set(2, 2));
        assert_eq!(runs(&table, 0, 0), vec![(0, 3, 2), (3, 4, 1)]);

        // last voxel of a run merges into the next run
        let mut table = table_with(10, &[(0, 1), (1, 1), (2, 2), (3, 2)]);
        assert!(table.set(1, 2));
        assert_eq!(runs(&table, 0, 0), vec![(0, 1, 1), (1, 4, 2)]);

        // single voxel run bridges both neighbours
        let mut table = table_with(10, &[(0, 2), (1, 1), (2, 2)]);
        assert!(table.set(1, 2));
        assert_eq!(runs(&table, 0, 0), vec![(0, 3, 2)]);
    }

    #[test]
    fn test_set_in_gap() {
        // before the first run, merging
        let mut table = table_with(10, &[(3, 1)]);
        assert!(table.set(2, 1));
        assert_eq!(runs(&table, 0, 0), vec![(2, 4, 1)]);

        // before the first run, not touching
        let mut table = table_with(10, &[(3, 1)]);
        assert!(table.set(0, 1));
        assert_eq!(runs(&table, 0, 0), vec![(0, 1, 1), (3, 4, 1)]);

        // at row start, different value
        let mut table = table_with(10, &[(1, 1)]);
        assert!(table.set(0, 2));
        assert_eq!(runs(&table, 0, 0), vec![(0, 1, 2), (1, 2, 1)]);

        // bridging a one voxel gap
        let mut table = table_with(10, &[(1, 1), (3, 1)]);
        assert!(table.set(2, 1));
        assert_eq!(runs(&table, 0, 0), vec![(1, 4, 1)]);

        // gap merge on one side only
        let mut table = table_with(10, &[(1, 1), (3, 2)]);
        assert!(table.set(2, 2));
        assert_eq!(runs(&table, 0, 0), vec![(1, 2, 1), (2, 4, 2)]);
    }

    #[test]
    fn test_delete() {
        let mut table = table_with(10, &[(2, 1), (3, 1), (4, 1)]);

        assert!(table.delete(3));
        assert_eq!(runs(&table, 0, 0), vec![(2, 3, 1), (4, 5, 1)]);

        assert!(table.delete(2));
        assert_eq!(runs(&table, 0, 0), vec![(4, 5, 1)]);

        assert!(!table.delete(2));
        assert!(!table.delete(9));

        assert!(table.delete(4));
        assert!(table.is_empty());
        assert_eq!(table.row(0, 0), None);
    }

    #[test]
    fn test_rows_are_independent() {
        let dims = Dimensions::new(4, 2, 2);
        let mut table = RunTable::new(dims);

        table.set(dims.to_index(3, 0, 0), 1u8);
        table.set(dims.to_index(0, 1, 0), 1);
        table.set(dims.to_index(0, 0, 1), 1);

        // the end of one row never merges with the start of the next
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.run_count(), 3);
        assert_eq!(runs(&table, 1, 0), vec![(0, 1, 1)]);
        assert_eq!(runs(&table, 0, 1), vec![(0, 1, 1)]);
        assert!(table.validate());
    }

    #[test]
    fn test_for_each_and_keys() {
        let dims = Dimensions::new(4, 2, 1);
        let mut table = RunTable::new(dims);
        for index in [6, 1, 2, 5] {
            table.set(index, index as u8 / 4);
        }

        let mut visited = Vec::new();
        table.for_each(|index, value| visited.push((index, value)));
        assert_eq!(visited, vec![(1, 0), (2, 0), (5, 1), (6, 1)]);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec![1, 2, 5, 6]);

        let mut run_starts = Vec::new();
        table.for_each_run(|base, run| run_starts.push(base + run.start));
        assert_eq!(run_starts, vec![1, 5]);
        assert_eq!(table.voxel_count(), 4);
    }

    #[test]
    fn test_set_row() {
        let mut table = RunTable::new(Dimensions::new(8, 2, 1));
        table.set_row(
            1,
            0,
            vec![Run::new(1u8, 4, 6), Run::new(1, 0, 2), Run::new(1, 2, 3)],
        );
        assert_eq!(runs(&table, 1, 0), vec![(0, 3, 1), (4, 6, 1)]);

        table.set_row(1, 0, Vec::new());
        assert!(table.is_empty());
    }

    #[test]
    fn test_random_ops_match_dense_oracle() {
        let dims = Dimensions::new(8, 8, 2);
        let mut table = RunTable::new(dims);
        let mut oracle: Vec<Option<u8>> = vec![None; dims.voxel_count()];
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..4000 {
            let index = rng.gen_range(0..dims.voxel_count());
            if rng.gen_bool(0.2) {
                let deleted = table.delete(index);
                assert_eq!(deleted, oracle[index].is_some());
                oracle[index] = None;
            } else {
                let value = rng.gen_range(0..3u8);
                let changed = table.set(index, value);
                assert_eq!(changed, oracle[index] != Some(value));
                oracle[index] = Some(value);
            }

            assert!(table.validate());
            for (index, expected) in oracle.iter().enumerate() {
                assert_eq!(table.get(index), *expected, "mismatch at {index}");
            }
        }
    }

    proptest! {
        #[test]
        fn should_stay_minimal_after_any_ops(
            ops in prop::collection::vec((0..32usize, prop::option::of(0..3u8)), 1..200)
        ) {
            let mut table = RunTable::new(Dimensions::new(8, 2, 2));
            for (index, value) in ops {
                match value {
                    Some(value) => { table.set(index, value); }
                    None => { table.delete(index); }
                }
                prop_assert!(table.validate());
            }
        }

        #[test]
        fn should_delete_what_was_set(
            prefill in prop::collection::vec((0..16usize, 0..2u8), 0..16),
            index in 0..16usize,
            value in 0..2u8,
        ) {
            let mut table = RunTable::with_default_value(Dimensions::new(16, 1, 1), Some(7u8));
            for (i, v) in prefill {
                table.set(i, v);
            }
            table.set(index, value);
            table.delete(index);
            prop_assert_eq!(table.get(index), Some(7));
            prop_assert!(table.validate());
        }
    }

    /// 10x10 plane of value 1 with a ring of value 2 enclosing a 4x4 square of 1.
    fn enclosed_square() -> RunTable<u8> {
        let dims = Dimensions::new(10, 10, 1);
        let mut table = RunTable::new(dims);
        let full = BoundsIjk::full(&dims);
        table.fill_from(
            |i, j, _| {
                let on_ring = (2..=7).contains(&i)
                    && (2..=7).contains(&j)
                    && (i == 2 || i == 7 || j == 2 || j == 7);
                Some(if on_ring { 2 } else { 1 })
            },
            &full,
        );
        table
    }

    #[test]
    fn test_flood_fill_enclosed_square() {
        for connectivity in [Connectivity::Face, Connectivity::Edge, Connectivity::Vertex] {
            let mut table = enclosed_square();
            let count = table
                .flood_fill(4, 4, 0, 3, &FloodFillConfig::new(connectivity))
                .unwrap();
            assert_eq!(count, 16);

            let dims = *table.dimensions();
            for j in 0..10 {
                for i in 0..10 {
                    let expected = if (3..=6).contains(&i) && (3..=6).contains(&j) {
                        3
                    } else if (2..=7).contains(&i) && (2..=7).contains(&j) {
                        2
                    } else {
                        1
                    };
                    assert_eq!(table.get(dims.to_index(i, j, 0)), Some(expected));
                }
            }
            assert!(table.validate());
        }
    }

    #[test]
    fn test_flood_fill_background() {
        let mut table = enclosed_square();
        let count = table.flood_fill(0, 0, 0, 5, &FloodFillConfig::default()).unwrap();
        assert_eq!(count, 100 - 20 - 16);
        assert_eq!(table.get(44), Some(1));
    }

    #[test]
    fn test_flood_fill_preconditions() {
        let mut table = enclosed_square();
        assert_eq!(
            table.flood_fill(4, 4, 0, 1, &FloodFillConfig::default()),
            Err(VoxelError::FloodFillSameValue)
        );

        let mut sparse = RunTable::new(Dimensions::new(4, 4, 1));
        sparse.set(0, 1u8);
        assert_eq!(
            sparse.flood_fill(2, 2, 0, 3, &FloodFillConfig::default()),
            Err(VoxelError::FloodFillSeedMissing { i: 2, j: 2, k: 0 })
        );
    }

    fn diagonal_pair(second: (usize, usize, usize)) -> RunTable<u8> {
        let dims = Dimensions::new(4, 4, 4);
        let mut table = RunTable::new(dims);
        table.set(dims.to_index(1, 1, 1), 1);
        table.set(dims.to_index(second.0, second.1, second.2), 1);
        table
    }

    fn fill_count(mut table: RunTable<u8>, config: FloodFillConfig) -> usize {
        table.flood_fill(1, 1, 1, 2, &config).unwrap()
    }

    #[test]
    fn test_flood_fill_face_neighbours() {
        for second in [(1, 2, 1), (1, 1, 2), (1, 0, 1), (1, 1, 0)] {
            for connectivity in [Connectivity::Face, Connectivity::Edge, Connectivity::Vertex] {
                assert_eq!(fill_count(diagonal_pair(second), FloodFillConfig::new(connectivity)), 2);
            }
        }
    }

    #[test]
    fn test_flood_fill_edge_neighbours() {
        // diagonal within a plane, across planes along i, and across j and k
        for second in [(2, 2, 1), (0, 1, 2), (1, 2, 2), (1, 0, 0)] {
            assert_eq!(
                fill_count(diagonal_pair(second), FloodFillConfig::new(Connectivity::Face)),
                1
            );
            assert_eq!(
                fill_count(diagonal_pair(second), FloodFillConfig::new(Connectivity::Edge)),
                2
            );
            assert_eq!(
                fill_count(diagonal_pair(second), FloodFillConfig::new(Connectivity::Vertex)),
                2
            );
        }
    }

    #[test]
    fn test_flood_fill_vertex_neighbours() {
        for second in [(2, 2, 2), (0, 0, 0), (2, 0, 2)] {
            assert_eq!(
                fill_count(diagonal_pair(second), FloodFillConfig::new(Connectivity::Face)),
                1
            );
            assert_eq!(
                fill_count(diagonal_pair(second), FloodFillConfig::new(Connectivity::Edge)),
                1
            );
            assert_eq!(
                fill_count(diagonal_pair(second), FloodFillConfig::new(Connectivity::Vertex)),
                2
            );
        }
    }

    #[test]
    fn test_flood_fill_single_plane() {
        let config = FloodFillConfig::new(Connectivity::Vertex).in_plane();
        assert_eq!(fill_count(diagonal_pair((1, 1, 2)), config), 1);
        assert_eq!(fill_count(diagonal_pair((2, 2, 1)), config), 2);
    }

    #[test]
    fn test_flood_fill_merges_runs() {
        // 1 1 2 2 3 3 -> fill the 2s with 3
        let mut table = table_with(6, &[(0, 1), (1, 1), (2, 2), (3, 2), (4, 3), (5, 3)]);
        let mut changed = BoundsIjk::empty();
        let count = table
            .flood_fill_tracked(2, 0, 0, 3, &FloodFillConfig::default(), &mut changed)
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(runs(&table, 0, 0), vec![(0, 2, 1), (2, 6, 3)]);
        assert_eq!(changed, BoundsIjk::new([2, 3], [0, 0], [0, 0]));
        assert!(table.validate());
    }

    #[test]
    fn test_fill_from() {
        let dims = Dimensions::new(6, 2, 1);
        let mut table = RunTable::new(dims);
        table.set(dims.to_index(5, 0, 0), 9u8);
        table.set(dims.to_index(5, 1, 0), 9);

        // row 0 gets samples, row 1 gets none
        table.fill_from(
            |i, j, _| match (j, i) {
                (0, 0..=1) => Some(1),
                (0, 3) => Some(1),
                (0, 4) => Some(2),
                _ => None,
            },
            &BoundsIjk::new([0, 4], [0, 1], [0, 0]),
        );

        assert_eq!(runs(&table, 0, 0), vec![(0, 2, 1), (3, 4, 1), (4, 5, 2)]);
        assert_eq!(runs(&table, 1, 0), vec![(5, 6, 9)]);
        assert!(table.validate());
    }

    #[test]
    fn test_materialize_plane() {
        let dims = Dimensions::new(4, 4, 3);
        let mut table = RunTable::new(dims);
        table.fill_from(
            |i, j, k| Some((i + j * 4 + k * 16) as u16),
            &BoundsIjk::full(&dims),
        );

        let plane = table.materialize(1, None);
        let expected: Vec<u16> = (0..16).map(|n| 16 + n).collect();
        assert_eq!(plane, expected);

        // reused buffers are cleared and resized
        let plane = table.materialize(2, Some(vec![7u16; 3]));
        assert_eq!(plane[0], 32);
        assert_eq!(plane.len(), 16);
    }

    #[test]
    fn test_materialize_gaps_and_components() {
        let dims = Dimensions::new(3, 1, 1);
        let mut table = RunTable::new(dims);
        table.set(1, [4u8, 5, 6]);

        assert_eq!(table.materialize(0, None), vec![0, 0, 0, 4, 5, 6, 0, 0, 0]);
    }

    #[test]
    fn test_materialize_default_value() {
        let mut table = RunTable::with_default_value(Dimensions::new(3, 1, 1), Some(2u8));
        table.set(1, 5);
        assert_eq!(table.materialize(0, None), vec![2, 5, 2]);
        assert_eq!(table.get(0), Some(2));
        assert_eq!(table.get_or(0, None), None);
    }
}
