//! Catalog: the registry of tables and columns for the single active
//! database, plus the on-disk `.meta` format and `.bin` column files.
//!
//! Only one database is open at a time (`create_db` wipes any existing
//! storage root first, mirroring the original's `system("rm -r disk")`
//! single-db-at-a-time constraint).

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::index::catalog_ops;
use crate::storage::column::{CatalogColumn, ColumnStats};
use crate::types::{Clustering, IndexKind};

pub struct Table {
    pub name: String,
    pub columns: Vec<CatalogColumn>,
}

impl Table {
    pub fn get_column(&self, name: &str) -> Result<&CatalogColumn> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| EngineError::NotFound(format!("column {name}")))
    }

    pub fn get_column_mut(&mut self, name: &str) -> Result<&mut CatalogColumn> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| EngineError::NotFound(format!("column {name}")))
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| EngineError::NotFound(format!("column {name}")))
    }

    /// Insert one row: `values` must have one entry per column, in
    /// column order, matching `exec_insert`'s per-column append.
    pub fn insert_row(&mut self, values: &[i32]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(EngineError::Execution(format!(
                "insert expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }
        for (col, &v) in self.columns.iter_mut().zip(values) {
            col.append(v)?;
        }
        Ok(())
    }
}

pub struct Db {
    pub name: String,
    pub tables: Vec<Table>,
}

impl Db {
    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| EngineError::NotFound(format!("table {name}")))
    }

    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| EngineError::NotFound(format!("table {name}")))
    }
}

/// Split `"db.table.column"` into its three parts, matching
/// `get_column_from_catalog`'s `sscanf` split.
pub fn split_column_spec(spec: &str) -> Result<(&str, &str, &str)> {
    let mut parts = spec.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(db), Some(table), Some(col)) if !col.is_empty() => Ok((db, table, col)),
        _ => Err(EngineError::IncorrectFormat(format!("bad column reference: {spec}"))),
    }
}

pub struct Catalog {
    pub root: PathBuf,
    pub db: Option<Db>,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Catalog { root: root.into(), db: None }
    }

    fn meta_path(&self, db_name: &str) -> PathBuf {
        self.root.join(format!("{db_name}.meta"))
    }

    fn column_path(&self, db_name: &str, table_name: &str, col_name: &str) -> PathBuf {
        self.root.join(format!("{db_name}.{table_name}.{col_name}.bin"))
    }

    /// Wipe any existing storage root and start a fresh, empty database.
    pub fn create_db(&mut self, name: &str) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        self.db = Some(Db { name: name.to_string(), tables: Vec::new() });
        Ok(())
    }

    pub fn create_table(&mut self, name: &str) -> Result<()> {
        let db = self.db.as_mut().ok_or_else(|| EngineError::NotFound("no active database".into()))?;
        if db.tables.iter().any(|t| t.name == name) {
            return Err(EngineError::Execution(format!("table {name} already exists")));
        }
        db.tables.push(Table { name: name.to_string(), columns: Vec::new() });
        Ok(())
    }

    pub fn create_column(&mut self, table_name: &str, col_name: &str) -> Result<()> {
        let db_name = self.db.as_ref().ok_or_else(|| EngineError::NotFound("no active database".into()))?.name.clone();
        let path = self.column_path(&db_name, table_name, col_name);
        let db = self.db.as_mut().unwrap();
        let table = db.get_table_mut(table_name)?;
        if table.columns.iter().any(|c| c.name == col_name) {
            return Err(EngineError::Execution(format!("column {col_name} already exists")));
        }
        table.columns.push(CatalogColumn::create(col_name, &path)?);
        Ok(())
    }

    /// Build an index (sorted mirror, optionally a fence B-tree) on an
    /// existing column, clustering sibling columns if requested.
    pub fn create_index(
        &mut self,
        table_name: &str,
        col_name: &str,
        kind: IndexKind,
        clustering: Clustering,
        btree_fanout: usize,
    ) -> Result<()> {
        let db = self.db.as_mut().ok_or_else(|| EngineError::NotFound("no active database".into()))?;
        let table = db.get_table_mut(table_name)?;
        catalog_ops::create_index_on(table, col_name, kind, clustering, btree_fanout)
    }

    pub fn get_column(&self, spec: &str) -> Result<&CatalogColumn> {
        let (_db, table, col) = split_column_spec(spec)?;
        self.db
            .as_ref()
            .ok_or_else(|| EngineError::NotFound("no active database".into()))?
            .get_table(table)?
            .get_column(col)
    }

    pub fn get_table_named(&self, spec: &str) -> Result<&Table> {
        let mut parts = spec.splitn(2, '.');
        let (_db, table) = (parts.next(), parts.next());
        let table = table.ok_or_else(|| EngineError::IncorrectFormat(format!("bad table reference: {spec}")))?;
        self.db
            .as_ref()
            .ok_or_else(|| EngineError::NotFound("no active database".into()))?
            .get_table(table)
    }

    /// Flush dirty columns, write the `.meta` file, and drop the
    /// mappings. Mirrors `shutdown_catalog_manager`.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(db) = self.db.as_mut() {
            for table in &mut db.tables {
                for col in &mut table.columns {
                    col.sync()?;
                }
            }
        }
        self.save()
    }

    fn save(&self) -> Result<()> {
        let Some(db) = &self.db else { return Ok(()) };
        let path = self.meta_path(&db.name);
        let mut out = String::new();
        out.push_str(&format!("DB_NAME={}\n", db.name));
        out.push_str(&format!("TABLES_SIZE={}\n", db.tables.len()));
        out.push_str(&format!("TABLES_CAPACITY={}\n", db.tables.capacity()));
        for table in &db.tables {
            out.push_str(&format!("TABLE_NAME={}\n", table.name));
            out.push_str(&format!("COL_CAPACITY={}\n", table.columns.capacity()));
            out.push_str(&format!("NUM_COLS={}\n", table.columns.len()));
            for col in &table.columns {
                out.push_str(&format!("COLUMN_NAME={}\n", col.name));
                out.push_str(&format!("NUM_ELEMENTS={}\n", col.num_elements));
                out.push_str(&format!("MIN_VALUE={}\n", col.stats.min));
                out.push_str(&format!("MAX_VALUE={}\n", col.stats.max));
                out.push_str(&format!("SUM={}\n", col.stats.sum));
                out.push_str(&format!(
                    "INDEX_TYPE={}\n",
                    match col.index.as_ref().map(|i| i.kind) {
                        None => "NONE",
                        Some(IndexKind::None) => "NONE",
                        Some(IndexKind::Sorted) => "SORTED",
                        Some(IndexKind::Btree) => "BTREE",
                    }
                ));
            }
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Scan `root` for the first `*.meta` file and load it, reopening
    /// every column's mmap. Mirrors `init_db_from_disk`.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut meta_file = None;
        if root.is_dir() {
            for entry in fs::read_dir(&root)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("meta") {
                    meta_file = Some(path);
                    break;
                }
            }
        }
        let Some(meta_path) = meta_file else {
            return Ok(Catalog { root, db: None });
        };

        let f = fs::File::open(&meta_path)?;
        let mut lines = BufReader::new(f).lines();
        let db_name = read_field(&mut lines, "DB_NAME")?;
        let tables_size: usize = read_field(&mut lines, "TABLES_SIZE")?.parse().map_err(parse_err)?;
        let tables_capacity: usize = read_field(&mut lines, "TABLES_CAPACITY")?.parse().map_err(parse_err)?;

        let mut tables = Vec::with_capacity(tables_capacity.max(tables_size));
        for _ in 0..tables_size {
            let table_name = read_field(&mut lines, "TABLE_NAME")?;
            let col_capacity: usize = read_field(&mut lines, "COL_CAPACITY")?.parse().map_err(parse_err)?;
            let num_cols: usize = read_field(&mut lines, "NUM_COLS")?.parse().map_err(parse_err)?;
            let mut columns = Vec::with_capacity(col_capacity.max(num_cols));
            for _ in 0..num_cols {
                let col_name = read_field(&mut lines, "COLUMN_NAME")?;
                let num_elements: usize = read_field(&mut lines, "NUM_ELEMENTS")?.parse().map_err(parse_err)?;
                let min: i64 = read_field(&mut lines, "MIN_VALUE")?.parse().map_err(parse_err)?;
                let max: i64 = read_field(&mut lines, "MAX_VALUE")?.parse().map_err(parse_err)?;
                let sum: i64 = read_field(&mut lines, "SUM")?.parse().map_err(parse_err)?;
                let index_type = read_field(&mut lines, "INDEX_TYPE")?;

                let col_path = root.join(format!("{db_name}.{table_name}.{col_name}.bin"));
                let mut col = CatalogColumn::open_existing(
                    &col_name,
                    &col_path,
                    num_elements,
                    ColumnStats { min, max, sum },
                )?;
                if index_type != "NONE" {
                    let kind = if index_type == "BTREE" { IndexKind::Btree } else { IndexKind::Sorted };
                    let values = col.as_slice().to_vec();
                    col.index = Some(crate::index::ColumnIndex::build(
                        &values,
                        kind,
                        Clustering::Unclustered,
                        crate::config::DEFAULT_BTREE_FANOUT,
                    ));
                }
                columns.push(col);
            }
            tables.push(Table { name: table_name, columns });
        }

        Ok(Catalog { root, db: Some(Db { name: db_name, tables }) })
    }
}

fn read_field(lines: &mut std::io::Lines<BufReader<fs::File>>, key: &str) -> Result<String> {
    let line = lines
        .next()
        .ok_or_else(|| EngineError::IncorrectFormat(format!("expected {key}, got EOF")))??;
    line.strip_prefix(&format!("{key}="))
        .map(|rest| rest.trim().to_string())
        .ok_or_else(|| EngineError::IncorrectFormat(format!("expected {key}=..., got {line}")))
}

fn parse_err<E: std::fmt::Display>(e: E) -> EngineError {
    EngineError::IncorrectFormat(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_and_reload_roundtrips_stats() {
        let dir = tempdir().unwrap();
        let mut cat = Catalog::new(dir.path().join("disk"));
        cat.create_db("db1").unwrap();
        cat.create_table("t1").unwrap();
        cat.create_column("t1", "a").unwrap();
        {
            let db = cat.db.as_mut().unwrap();
            let table = db.get_table_mut("t1").unwrap();
            table.insert_row(&[1]).unwrap();
            table.insert_row(&[5]).unwrap();
            table.insert_row(&[-3]).unwrap();
        }
        cat.shutdown().unwrap();

        let reloaded = Catalog::load(dir.path().join("disk")).unwrap();
        let col = reloaded.get_column("db1.t1.a").unwrap();
        assert_eq!(col.num_elements, 3);
        assert_eq!(col.stats.min, -3);
        assert_eq!(col.stats.max, 5);
        assert_eq!(col.stats.sum, 3);
        assert_eq!(col.as_slice(), &[1, 5, -3]);
    }

    #[test]
    fn split_column_spec_rejects_malformed_input() {
        assert!(split_column_spec("db.table.col").is_ok());
        assert!(split_column_spec("db.table").is_err());
    }

    #[test]
    fn create_db_wipes_prior_storage() {
        let dir = tempdir().unwrap();
        let storage = dir.path().join("disk");
        let mut cat = Catalog::new(&storage);
        cat.create_db("db1").unwrap();
        cat.create_table("t1").unwrap();
        cat.create_db("db2").unwrap();
        assert!(cat.db.as_ref().unwrap().get_table("t1").is_err());
    }
}
