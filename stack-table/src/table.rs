//! Definition of a growable, dense table of `u32` cells.

use crate::error::TableError;

/// Sentinel carrying two overloaded meanings depending on context: "cell is
/// absent/unused" when read from a data column, and "end of list" when read
/// from an [`crate::Arena`] column.
pub const EMPTY: u32 = u32::MAX;

/// Number of identifier values reserved at the top of the `u32` range so
/// that [`EMPTY`] (and room for future sentinels) never collides with a
/// legitimate row index.
pub const RESERVED_IDS: u32 = 256;

/// Hard cap on the number of rows a [`Table`] can ever hold, so that every
/// row index remains representable as a non-reserved `u32`.
pub const MAX_ROWS: u32 = u32::MAX - RESERVED_IDS;

/// Fraction of extra rows allocated beyond the logical row count on growth.
const DEFAULT_PADDING: f32 = 0.1;

/// A contiguous, row-major array of `u32` cells with a fixed column count.
///
/// * Rows beyond the logical size but within allocated capacity exist only
///   to make `append_rows` amortized O(1); they are never observable until
///   `append_rows` grows the logical size to include them.
/// * Growth reallocates with padding (`rows * (1.0 + padding)`, default
///   10%) so repeated single-row appends are fast in the common case,
///   mirroring [`Vec`]'s own growth strategy.
#[derive(Debug, Clone)]
pub struct Table {
    rows: u32,
    columns: u32,
    capacity_rows: u32,
    padding: f32,
    data: Vec<u32>,
}

impl Table {
    /// Create an empty table with the default growth padding (10%).
    pub fn new(rows: u32, columns: u32) -> Self {
        Self::with_padding(rows, columns, DEFAULT_PADDING)
    }

    /// Create an empty table with an explicit growth-padding fraction.
    pub fn with_padding(rows: u32, columns: u32, padding: f32) -> Self {
        let capacity_rows = grown_capacity(rows, padding);
        let data = vec![EMPTY; capacity_rows as usize * columns as usize];

        Self {
            rows,
            columns,
            capacity_rows,
            padding,
            data,
        }
    }

    /// Logical number of rows (padding not included).
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows currently allocated, including padding.
    #[inline]
    pub fn capacity_rows(&self) -> u32 {
        self.capacity_rows
    }

    /// Read a single cell.
    ///
    /// Fails with [`TableError::OutOfRange`] if `row >= rows()` or
    /// `col >= columns()`.
    #[inline]
    pub fn get(&self, row: u32, col: u32) -> Result<u32, TableError> {
        let index = self.index(row, col)?;
        Ok(self.data[index])
    }

    /// Write a single cell. Same bounds contract as [`Table::get`].
    #[inline]
    pub fn set(&mut self, row: u32, col: u32, value: u32) -> Result<(), TableError> {
        let index = self.index(row, col)?;
        self.data[index] = value;
        Ok(())
    }

    /// Extend the logical row count by `extra` rows.
    ///
    /// If the current allocation has enough padding, this only adjusts the
    /// logical size (amortized O(1)); appended cells are observed as
    /// [`EMPTY`] since unused capacity is always kept zeroed to `EMPTY`.
    /// Otherwise reallocates with fresh padding and copies existing data.
    ///
    /// Returns the row index of the first newly appended row.
    pub fn append_rows(&mut self, extra: u32) -> Result<u32, TableError> {
        let first_new = self.rows;
        let new_rows = self.rows as u64 + extra as u64;

        if new_rows > MAX_ROWS as u64 {
            return Err(TableError::CapacityExceeded {
                requested: new_rows,
                max: MAX_ROWS,
            });
        }

        let new_rows = new_rows as u32;

        if new_rows > self.capacity_rows {
            let new_capacity = grown_capacity(new_rows, self.padding).max(new_rows);
            let mut new_data =
                vec![EMPTY; new_capacity as usize * self.columns as usize];
            new_data[..self.data.len()].copy_from_slice(&self.data);

            self.data = new_data;
            self.capacity_rows = new_capacity;
        }

        self.rows = new_rows;
        Ok(first_new)
    }

    /// Shrink the logical row count to `new_rows`.
    ///
    /// The vacated rows are reset to [`EMPTY`] so that a subsequent
    /// `append_rows` that re-grows into them observes `EMPTY` again.
    /// Fails if `new_rows` exceeds the currently allocated capacity.
    pub fn truncate_rows(&mut self, new_rows: u32) -> Result<(), TableError> {
        if new_rows > self.capacity_rows {
            return Err(TableError::TruncateExceedsCapacity {
                target: new_rows,
                capacity: self.capacity_rows,
            });
        }

        if new_rows < self.rows {
            let start = new_rows as usize * self.columns as usize;
            let end = self.rows as usize * self.columns as usize;
            self.data[start..end].fill(EMPTY);
        }

        self.rows = new_rows;
        Ok(())
    }

    /// Reference to the logical `rows * columns` cells, row-major, for bulk
    /// serialization.
    pub fn as_raw(&self) -> &[u32] {
        &self.data[..self.rows as usize * self.columns as usize]
    }

    /// Build a table directly from row-major data, e.g. when reading a
    /// dataset back from a container file. `data.len()` must equal
    /// `rows * columns`.
    pub fn from_raw(rows: u32, columns: u32, data: Vec<u32>) -> Self {
        debug_assert_eq!(data.len(), rows as usize * columns as usize);

        Self {
            rows,
            columns,
            capacity_rows: rows,
            padding: DEFAULT_PADDING,
            data,
        }
    }

    #[inline]
    fn index(&self, row: u32, col: u32) -> Result<usize, TableError> {
        if row >= self.rows || col >= self.columns {
            return Err(TableError::OutOfRange {
                row,
                col,
                rows: self.rows,
                columns: self.columns,
            });
        }

        Ok(row as usize * self.columns as usize + col as usize)
    }
}

/// Compute `rows * (1 + padding)`, capped at [`MAX_ROWS`].
fn grown_capacity(rows: u32, padding: f32) -> u32 {
    let grown = (rows as f64 * (1.0 + padding as f64)).ceil() as u64;
    grown.min(MAX_ROWS as u64) as u32
}
