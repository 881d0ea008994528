//! The spatial hash grid.

use crate::SpatialError;
use mesh_types::Aabb;
use nalgebra::Point3;

/// Large odd multipliers for the 3D cell hash (Teschner et al., 2003).
const HASH_X: i64 = 73_856_093;
const HASH_Y: i64 = 19_349_663;
const HASH_Z: i64 = 83_492_791;

/// Fixed prime bucket count.
const NUM_BUCKETS: usize = 170_111;

/// Sentinel for "no entry" in bucket chains.
const NONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    /// Head of the entry chain for this bucket.
    first: u32,
    /// Query epoch at which this bucket was last visited.
    last_query: u64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    item: u32,
    next: u32,
}

/// A uniform spatial hash grid over `u32` item indices.
///
/// Cell coordinates are obtained by flooring `coordinate / spacing`; a cell
/// hashes into one of a fixed prime number of buckets, each holding a singly
/// linked chain of item entries. An item registered with a bounding box is
/// inserted into every cell the box overlaps.
///
/// [`SpatialHash::query_unique`] suppresses duplicates across a multi-cell
/// query in O(1) per entry using a global query epoch: bucket roots and items
/// each carry a "last visited" counter compared against the epoch, so no
/// visited-set is built or cleared between queries.
#[derive(Debug)]
pub struct SpatialHash {
    spacing: f64,
    inv_spacing: f64,
    buckets: Vec<Bucket>,
    entries: Vec<Entry>,
    /// Query epoch at which each item was last reported, indexed by item.
    item_marks: Vec<u64>,
    epoch: u64,
}

impl SpatialHash {
    /// Create a spatial hash with the given cell spacing.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidSpacing`] if `spacing` is not positive
    /// and finite.
    pub fn try_new(spacing: f64) -> Result<Self, SpatialError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(SpatialError::InvalidSpacing(spacing));
        }
        Ok(Self {
            spacing,
            inv_spacing: 1.0 / spacing,
            buckets: vec![
                Bucket {
                    first: NONE,
                    last_query: 0,
                };
                NUM_BUCKETS
            ],
            entries: Vec::new(),
            item_marks: Vec::new(),
            epoch: 0,
        })
    }

    /// The cell spacing.
    #[must_use]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Change the cell spacing, discarding all stored items.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidSpacing`] if `spacing` is not positive
    /// and finite; the hash is left unchanged in that case.
    pub fn set_spacing(&mut self, spacing: f64) -> Result<(), SpatialError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(SpatialError::InvalidSpacing(spacing));
        }
        self.spacing = spacing;
        self.inv_spacing = 1.0 / spacing;
        self.reset();
        Ok(())
    }

    /// Remove all stored items, keeping the spacing.
    pub fn reset(&mut self) {
        for bucket in &mut self.buckets {
            bucket.first = NONE;
        }
        self.entries.clear();
        self.item_marks.clear();
    }

    /// The integer cell containing a point.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, point: &Point3<f64>) -> [i32; 3] {
        [
            (point.x * self.inv_spacing).floor() as i32,
            (point.y * self.inv_spacing).floor() as i32,
            (point.z * self.inv_spacing).floor() as i32,
        ]
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn bucket_of(cell: [i32; 3]) -> usize {
        let h = (i64::from(cell[0]) * HASH_X)
            ^ (i64::from(cell[1]) * HASH_Y)
            ^ (i64::from(cell[2]) * HASH_Z);
        h.rem_euclid(NUM_BUCKETS as i64) as usize
    }

    fn insert(&mut self, bucket: usize, item: u32) {
        let entry = u32::try_from(self.entries.len()).unwrap_or(NONE);
        self.entries.push(Entry {
            item,
            next: self.buckets[bucket].first,
        });
        self.buckets[bucket].first = entry;
        if self.item_marks.len() <= item as usize {
            self.item_marks.resize(item as usize + 1, 0);
        }
    }

    /// Register an item at a single point.
    pub fn add_point(&mut self, point: &Point3<f64>, item: u32) {
        let bucket = Self::bucket_of(self.cell_of(point));
        self.insert(bucket, item);
    }

    /// Register an item in every cell its bounding box overlaps.
    ///
    /// An empty box registers nothing.
    pub fn add_bounds(&mut self, bounds: &Aabb, item: u32) {
        if bounds.is_empty() {
            return;
        }
        let lo = self.cell_of(&bounds.min);
        let hi = self.cell_of(&bounds.max);
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    let bucket = Self::bucket_of([x, y, z]);
                    self.insert(bucket, item);
                }
            }
        }
    }

    fn collect_bucket(&self, bucket: usize, out: &mut Vec<u32>, max_count: Option<usize>) {
        let mut entry = self.buckets[bucket].first;
        while entry != NONE {
            if max_count.is_some_and(|max| out.len() >= max) {
                return;
            }
            let e = self.entries[entry as usize];
            out.push(e.item);
            entry = e.next;
        }
    }

    /// Items stored in the cell containing `point`.
    ///
    /// May contain duplicates and hash-collision candidates from other cells;
    /// `max_count` caps the result length.
    #[must_use]
    pub fn query_point(&self, point: &Point3<f64>, max_count: Option<usize>) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_bucket(Self::bucket_of(self.cell_of(point)), &mut out, max_count);
        out
    }

    /// Items stored in any cell overlapping `bounds`.
    ///
    /// An item spanning several overlapped cells is reported once per cell;
    /// use [`SpatialHash::query_unique`] to suppress duplicates.
    #[must_use]
    pub fn query(&self, bounds: &Aabb, max_count: Option<usize>) -> Vec<u32> {
        let mut out = Vec::new();
        if bounds.is_empty() {
            return out;
        }
        let lo = self.cell_of(&bounds.min);
        let hi = self.cell_of(&bounds.max);
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    self.collect_bucket(Self::bucket_of([x, y, z]), &mut out, max_count);
                    if max_count.is_some_and(|max| out.len() >= max) {
                        return out;
                    }
                }
            }
        }
        out
    }

    /// Items stored in any cell overlapping `bounds`, each reported at most
    /// once.
    ///
    /// Requires `&mut self` to advance the query epoch used for duplicate
    /// suppression.
    pub fn query_unique(&mut self, bounds: &Aabb, max_count: Option<usize>) -> Vec<u32> {
        let mut out = Vec::new();
        if bounds.is_empty() {
            return out;
        }
        self.epoch += 1;
        let lo = self.cell_of(&bounds.min);
        let hi = self.cell_of(&bounds.max);
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    let bucket = Self::bucket_of([x, y, z]);
                    // Several cells can land in one bucket; visit it once.
                    if self.buckets[bucket].last_query == self.epoch {
                        continue;
                    }
                    self.buckets[bucket].last_query = self.epoch;

                    let mut entry = self.buckets[bucket].first;
                    while entry != NONE {
                        let e = self.entries[entry as usize];
                        let mark = &mut self.item_marks[e.item as usize];
                        if *mark != self.epoch {
                            *mark = self.epoch;
                            if max_count.is_some_and(|max| out.len() >= max) {
                                return out;
                            }
                            out.push(e.item);
                        }
                        entry = e.next;
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_spacing_rejected() {
        assert!(SpatialHash::try_new(0.0).is_err());
        assert!(SpatialHash::try_new(-1.0).is_err());
        assert!(SpatialHash::try_new(f64::NAN).is_err());
        assert!(SpatialHash::try_new(1.0).is_ok());
    }

    #[test]
    fn test_cell_floor_handles_negatives() {
        let hash = SpatialHash::try_new(1.0).unwrap();
        assert_eq!(hash.cell_of(&Point3::new(0.5, 1.5, -0.5)), [0, 1, -1]);
        assert_eq!(hash.cell_of(&Point3::new(-1.0, -0.001, 2.0)), [-1, -1, 2]);
    }

    #[test]
    fn test_point_query_finds_neighbors() {
        let mut hash = SpatialHash::try_new(1.0).unwrap();
        hash.add_point(&Point3::new(0.2, 0.2, 0.2), 0);
        hash.add_point(&Point3::new(0.8, 0.8, 0.8), 1);
        hash.add_point(&Point3::new(5.0, 5.0, 5.0), 2);

        let found = hash.query_point(&Point3::new(0.5, 0.5, 0.5), None);
        assert!(found.contains(&0));
        assert!(found.contains(&1));
        assert!(!found.contains(&2));
    }

    #[test]
    fn test_bounds_insertion_spans_cells() {
        let mut hash = SpatialHash::try_new(1.0).unwrap();
        let bounds = Aabb::new(Point3::new(0.1, 0.1, 0.1), Point3::new(2.9, 0.9, 0.9));
        hash.add_bounds(&bounds, 7);

        // Each overlapped cell sees the item.
        for x in [0.5, 1.5, 2.5] {
            let found = hash.query_point(&Point3::new(x, 0.5, 0.5), None);
            assert!(found.contains(&7), "missing at x = {x}");
        }
    }

    #[test]
    fn test_query_unique_no_duplicates() {
        let mut hash = SpatialHash::try_new(1.0).unwrap();
        // Item 3 spans many cells; a covering query would report it once per
        // cell without deduplication.
        let big = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 4.0));
        hash.add_bounds(&big, 3);
        hash.add_point(&Point3::new(1.5, 1.5, 1.5), 8);

        let plain = hash.query(&big, None);
        assert!(plain.iter().filter(|&&i| i == 3).count() > 1);

        let unique = hash.query_unique(&big, None);
        assert_eq!(unique.iter().filter(|&&i| i == 3).count(), 1);
        assert_eq!(unique.iter().filter(|&&i| i == 8).count(), 1);

        // A second query starts a fresh epoch.
        let again = hash.query_unique(&big, None);
        assert_eq!(again.iter().filter(|&&i| i == 3).count(), 1);
    }

    #[test]
    fn test_query_capped() {
        let mut hash = SpatialHash::try_new(1.0).unwrap();
        for i in 0..10 {
            hash.add_point(&Point3::new(0.5, 0.5, 0.5), i);
        }
        let capped = hash.query_point(&Point3::new(0.5, 0.5, 0.5), Some(4));
        assert_eq!(capped.len(), 4);

        let bounds = Aabb::from_point(Point3::new(0.5, 0.5, 0.5));
        let capped_unique = hash.query_unique(&bounds, Some(4));
        assert_eq!(capped_unique.len(), 4);
    }

    #[test]
    fn test_reset_clears_items() {
        let mut hash = SpatialHash::try_new(1.0).unwrap();
        hash.add_point(&Point3::new(0.5, 0.5, 0.5), 0);
        hash.reset();
        assert!(hash.query_point(&Point3::new(0.5, 0.5, 0.5), None).is_empty());
    }

    #[test]
    fn test_set_spacing_rebuckets() {
        let mut hash = SpatialHash::try_new(1.0).unwrap();
        hash.add_point(&Point3::new(0.5, 0.5, 0.5), 0);
        hash.set_spacing(2.0).unwrap();
        assert!(hash.query_point(&Point3::new(0.5, 0.5, 0.5), None).is_empty());
        assert!(hash.set_spacing(-1.0).is_err());
    }
}
