//! Column storage: mmap-backed catalog columns and heap-backed handle
//! columns.
//!
//! A [`CatalogColumn`] is the durable, disk-backed kind: its values live
//! in a memory-mapped file that is extended (never shrunk) as rows are
//! inserted, mirroring `extend_and_update_mmap` in the original engine.
//! A [`HandleColumn`] is purely in-memory, session-local query output.
//! It never touches a file and is freed when the handle pool drops it.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::MmapMut;

use crate::error::{EngineError, Result};
use crate::index::ColumnIndex;

/// Running min/max/sum, kept up to date incrementally rather than
/// recomputed on every read (`exec_fetch`/`exec_insert` both update these
/// in place in the original).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnStats {
    pub min: i64,
    pub max: i64,
    pub sum: i64,
}

impl ColumnStats {
    pub const EMPTY: ColumnStats = ColumnStats { min: 0, max: 0, sum: 0 };

    pub fn from_values(values: &[i32]) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }
        let mut min = values[0] as i64;
        let mut max = values[0] as i64;
        let mut sum = 0i64;
        for &v in values {
            let v = v as i64;
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        ColumnStats { min, max, sum }
    }

    /// Fold in one more observed value without rescanning everything.
    pub fn observe(&mut self, v: i32) {
        let v = v as i64;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.sum += v;
    }
}

/// A page-granular mmap growth strategy. Files are only ever extended,
/// matching the original's "never shrink a storage file" invariant.
const PAGE_SIZE: usize = 4096;

fn round_up_to_page(n: usize) -> usize {
    let bytes = n * std::mem::size_of::<i32>();
    ((bytes + PAGE_SIZE - 1) / PAGE_SIZE) * PAGE_SIZE
}

/// A catalog column: fixed-width `i32` values backed by a growable mmap
/// file plus an optional index over those values.
pub struct CatalogColumn {
    pub name: String,
    file: File,
    mmap: MmapMut,
    /// Number of `i32` slots the current mapping can hold without
    /// re-extending the backing file.
    mapped_capacity: usize,
    pub num_elements: usize,
    pub stats: ColumnStats,
    pub index: Option<ColumnIndex>,
    pub dirty: bool,
}

impl CatalogColumn {
    /// Create a brand-new, empty catalog column backed by `path`.
    pub fn create(name: &str, path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(PAGE_SIZE as u64)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(CatalogColumn {
            name: name.to_string(),
            file,
            mmap,
            mapped_capacity: PAGE_SIZE / std::mem::size_of::<i32>(),
            num_elements: 0,
            stats: ColumnStats::EMPTY,
            index: None,
            dirty: false,
        })
    }

    /// Reopen an existing column file, given the element count and stats
    /// recorded in the `.meta` file (see `storage::catalog::load`).
    pub fn open_existing(
        name: &str,
        path: &Path,
        num_elements: usize,
        stats: ColumnStats,
    ) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len() as usize;
        let mapped_capacity = len / std::mem::size_of::<i32>();
        if mapped_capacity < num_elements {
            return Err(EngineError::IncorrectFormat(format!(
                "column {name} file shorter than recorded element count"
            )));
        }
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(CatalogColumn {
            name: name.to_string(),
            file,
            mmap,
            mapped_capacity,
            num_elements,
            stats,
            index: None,
            dirty: false,
        })
    }

    pub fn as_slice(&self) -> &[i32] {
        let bytes = &self.mmap[..self.num_elements * std::mem::size_of::<i32>()];
        cast_i32_slice(bytes)
    }

    /// Append one value, growing the backing mmap if needed. Updates
    /// running stats and marks the column dirty, same as `exec_insert`.
    pub fn append(&mut self, value: i32) -> Result<()> {
        if self.num_elements >= self.mapped_capacity {
            self.grow(self.mapped_capacity.max(1) * 2)?;
        }
        let offset = self.num_elements * std::mem::size_of::<i32>();
        self.mmap[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        if self.num_elements == 0 {
            self.stats = ColumnStats { min: value as i64, max: value as i64, sum: value as i64 };
        } else {
            self.stats.observe(value);
        }
        self.num_elements += 1;
        self.dirty = true;
        Ok(())
    }

    /// Extend the mapping to hold at least `new_capacity` elements,
    /// rounding up to a page boundary. Mirrors
    /// `extend_and_update_mmap`'s munmap → ftruncate → mmap sequence.
    fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let new_bytes = round_up_to_page(new_capacity);
        self.file.set_len(new_bytes as u64)?;
        self.mmap = unsafe { MmapMut::map_mut(&self.file)? };
        self.mapped_capacity = new_bytes / std::mem::size_of::<i32>();
        Ok(())
    }

    /// Flush dirty pages and drop the mapping. Called from
    /// `Catalog::shutdown`; a clean column (never inserted into since
    /// open) skips the msync, matching `shutdown_catalog_manager`'s
    /// `is_dirty` check.
    pub fn sync(&mut self) -> Result<()> {
        if self.dirty {
            self.mmap.flush()?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Overwrite this column's values in place with `new_values` (used by
    /// clustering) without touching `num_elements` or `stats`, since a
    /// reorder doesn't change either.
    pub fn overwrite(&mut self, new_values: &[i32]) -> Result<()> {
        assert_eq!(new_values.len(), self.num_elements);
        if new_values.len() > self.mapped_capacity {
            self.grow(new_values.len())?;
        }
        for (i, &v) in new_values.iter().enumerate() {
            let offset = i * std::mem::size_of::<i32>();
            self.mmap[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
        }
        self.dirty = true;
        Ok(())
    }
}

fn cast_i32_slice(bytes: &[u8]) -> &[i32] {
    // Safety: mmap regions are always allocated at page granularity and
    // i32 alignment is 4 bytes; the slice length is always a multiple of
    // 4 by construction (num_elements * size_of::<i32>()).
    debug_assert_eq!(bytes.len() % 4, 0);
    unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const i32, bytes.len() / 4) }
}

/// Values produced by fetch/aggregate/arithmetic, owned by a session's
/// handle pool rather than any file.
#[derive(Debug, Clone)]
pub enum HandleData {
    Int(Vec<i32>),
    Long(Vec<i64>),
    Double(Vec<f64>),
}

impl HandleData {
    pub fn len(&self) -> usize {
        match self {
            HandleData::Int(v) => v.len(),
            HandleData::Long(v) => v.len(),
            HandleData::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct HandleColumn {
    pub name: String,
    pub data: HandleData,
    pub stats: Option<ColumnStats>,
}

impl HandleColumn {
    pub fn new(name: String, data: HandleData, stats: Option<ColumnStats>) -> Self {
        HandleColumn { name, data, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_updates_stats_and_grows_past_one_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.col.bin");
        let mut col = CatalogColumn::create("col", &path).unwrap();
        for v in -5..2000 {
            col.append(v).unwrap();
        }
        assert_eq!(col.num_elements, 2005);
        assert_eq!(col.stats.min, -5);
        assert_eq!(col.stats.max, 1999);
        assert_eq!(col.as_slice()[0], -5);
        assert_eq!(col.as_slice()[2004], 1999);
    }

    #[test]
    fn reopen_existing_preserves_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.col.bin");
        {
            let mut col = CatalogColumn::create("col", &path).unwrap();
            col.append(10).unwrap();
            col.append(20).unwrap();
            col.sync().unwrap();
        }
        let stats = ColumnStats { min: 10, max: 20, sum: 30 };
        let reopened = CatalogColumn::open_existing("col", &path, 2, stats).unwrap();
        assert_eq!(reopened.as_slice(), &[10, 20]);
    }

    #[test]
    fn clean_column_skips_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.col.bin");
        let mut col = CatalogColumn::create("col", &path).unwrap();
        assert!(!col.dirty);
        col.sync().unwrap();
        assert!(!col.dirty);
    }
}
