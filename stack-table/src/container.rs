//! A small self-describing binary container format for named `u32` tables.
//!
//! The on-disk layout is intentionally simple and fully little-endian,
//! independent of host architecture:
//!
//! ```text
//! magic:    8 bytes   b"STCKFMT\0"
//! version:  u32       hdf-stack-version, currently 1
//! count:    u32       number of datasets
//! directory: count * {
//!     name_len: u32
//!     name:     name_len bytes, utf8
//!     rows:     u32
//!     columns:  u32
//!     offset:   u64    byte offset of this dataset's data, from start of file
//! }
//! data:     each dataset's `rows * columns` u32 cells, little-endian, in
//!           directory order, back to back
//! ```

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::ContainerError;
use crate::table::Table;

const MAGIC: &[u8; 8] = b"STCKFMT\0";
const VERSION: u32 = 1;

struct DirectoryEntry {
    name: String,
    rows: u32,
    columns: u32,
    offset: u64,
}

/// Writes a container file holding zero or more named [`Table`]s.
///
/// Datasets are staged in memory in the order they are added and the whole
/// file, directory included, is written out in one shot by [`ContainerWriter::finish`].
pub struct ContainerWriter {
    datasets: Vec<(String, Table)>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self {
            datasets: Vec::new(),
        }
    }

    /// No-op: groups are just name prefixes in this flat format (e.g.
    /// `"superpixel/3"`), there is nothing to create ahead of time. Kept as
    /// an explicit call so callers that think in terms of HDF5-style groups
    /// have somewhere to put that intent.
    pub fn create_group(&mut self, _prefix: &str) {}

    /// Stage a named dataset. Overwrites any previously staged dataset with
    /// the same name.
    pub fn add_dataset(&mut self, name: impl Into<String>, table: &Table) {
        let name = name.into();
        if let Some(existing) = self.datasets.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = table.clone();
        } else {
            self.datasets.push((name, table.clone()));
        }
    }

    /// Write the magic, version, directory and raw data to `writer`.
    pub fn finish<W: Write + Seek>(&self, mut writer: W) -> Result<(), ContainerError> {
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&(self.datasets.len() as u32).to_le_bytes())?;

        // The directory must be written before we know data offsets, so
        // compute them up front: header size plus each directory entry's
        // own encoded size, then the running data offset.
        let header_size = 8u64 + 4 + 4;
        let mut directory_size = 0u64;
        for (name, _) in &self.datasets {
            directory_size += 4 + name.len() as u64 + 4 + 4 + 8;
        }

        let mut offset = header_size + directory_size;
        let mut entries = Vec::with_capacity(self.datasets.len());
        for (name, table) in &self.datasets {
            entries.push(DirectoryEntry {
                name: name.clone(),
                rows: table.rows(),
                columns: table.columns(),
                offset,
            });
            offset += table.as_raw().len() as u64 * 4;
        }

        for entry in &entries {
            writer.write_all(&(entry.name.len() as u32).to_le_bytes())?;
            writer.write_all(entry.name.as_bytes())?;
            writer.write_all(&entry.rows.to_le_bytes())?;
            writer.write_all(&entry.columns.to_le_bytes())?;
            writer.write_all(&entry.offset.to_le_bytes())?;
        }

        for (_, table) in &self.datasets {
            for &value in table.as_raw() {
                writer.write_all(&value.to_le_bytes())?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for ContainerWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads named datasets back out of a container file written by
/// [`ContainerWriter`].
pub struct ContainerReader<R> {
    reader: R,
    directory: HashMap<String, DirectoryEntry>,
}

impl<R: Read + Seek> ContainerReader<R> {
    /// Parse the magic, version and directory out of `reader`. Dataset
    /// bodies are read lazily by [`ContainerReader::read_dataset`].
    pub fn open(mut reader: R) -> Result<Self, ContainerError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(ContainerError::BadMagic);
        }

        let version = read_u32(&mut reader)?;
        if version != VERSION {
            return Err(ContainerError::VersionMismatch { found: version });
        }

        let count = read_u32(&mut reader)?;
        let mut directory = HashMap::with_capacity(count as usize);

        for _ in 0..count {
            let name_len = read_u32(&mut reader)? as usize;
            let mut name_bytes = vec![0u8; name_len];
            reader.read_exact(&mut name_bytes)?;
            let name = String::from_utf8(name_bytes).map_err(|_| ContainerError::Truncated {
                reason: "dataset name is not valid utf8",
            })?;

            let rows = read_u32(&mut reader)?;
            let columns = read_u32(&mut reader)?;
            let offset = read_u64(&mut reader)?;

            directory.insert(
                name.clone(),
                DirectoryEntry {
                    name,
                    rows,
                    columns,
                    offset,
                },
            );
        }

        Ok(Self { reader, directory })
    }

    /// Names of every dataset present in the container, in no particular
    /// order.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.directory.keys().map(String::as_str)
    }

    /// Names of every dataset whose name starts with `prefix`, e.g.
    /// `"superpixel/"` to enumerate every plane.
    pub fn list_datasets(&self, prefix: &str) -> Vec<String> {
        self.directory
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Read a single named dataset back into a [`Table`].
    pub fn read_dataset(&mut self, name: &str) -> Result<Table, ContainerError> {
        let entry = self
            .directory
            .get(name)
            .ok_or_else(|| ContainerError::UnknownDataset {
                name: name.to_string(),
            })?;

        let rows = entry.rows;
        let columns = entry.columns;
        let cells = rows as usize * columns as usize;

        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut data = Vec::with_capacity(cells);
        for _ in 0..cells {
            data.push(read_u32(&mut self.reader)?);
        }

        Ok(Table::from_raw(rows, columns, data))
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, ContainerError> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64, ContainerError> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Cursor;

    fn sample_table() -> Table {
        let mut table = Table::new(0, 2);
        table.append_rows(3).unwrap();
        table.set(0, 0, 1).unwrap();
        table.set(0, 1, 2).unwrap();
        table.set(1, 0, 3).unwrap();
        table.set(1, 1, 4).unwrap();
        table.set(2, 0, 5).unwrap();
        table.set(2, 1, 6).unwrap();
        table
    }

    #[test]
    fn round_trip_in_memory() {
        let table = sample_table();
        let mut writer = ContainerWriter::new();
        writer.add_dataset("superpixels/0", &table);

        let mut buffer = Cursor::new(Vec::new());
        writer.finish(&mut buffer).unwrap();
        buffer.set_position(0);

        let mut reader = ContainerReader::open(buffer).unwrap();
        let names: Vec<&str> = reader.dataset_names().collect();
        assert_eq!(names, vec!["superpixels/0"]);

        let read_back = reader.read_dataset("superpixels/0").unwrap();
        assert_eq!(read_back.as_raw(), table.as_raw());
        assert_eq!(read_back.columns(), 2);
    }

    #[test]
    fn round_trip_multiple_datasets_through_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.bin");

        let segments = sample_table();
        let mut bodies = Table::new(0, 1);
        bodies.append_rows(2).unwrap();
        bodies.set(0, 0, 100).unwrap();
        bodies.set(1, 0, 200).unwrap();

        let mut writer = ContainerWriter::new();
        writer.add_dataset("segments", &segments);
        writer.add_dataset("bodies", &bodies);
        writer.finish(File::create(&path).unwrap()).unwrap();

        let mut reader = ContainerReader::open(File::open(&path).unwrap()).unwrap();
        let read_segments = reader.read_dataset("segments").unwrap();
        let read_bodies = reader.read_dataset("bodies").unwrap();

        assert_eq!(read_segments.as_raw(), segments.as_raw());
        assert_eq!(read_bodies.as_raw(), bodies.as_raw());
    }

    #[test]
    fn unknown_dataset_errors() {
        let writer = ContainerWriter::new();
        let mut buffer = Cursor::new(Vec::new());
        writer.finish(&mut buffer).unwrap();
        buffer.set_position(0);

        let mut reader = ContainerReader::open(buffer).unwrap();
        assert!(matches!(
            reader.read_dataset("missing"),
            Err(ContainerError::UnknownDataset { .. })
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let buffer = Cursor::new(vec![0u8; 32]);
        assert!(matches!(
            ContainerReader::open(buffer),
            Err(ContainerError::BadMagic)
        ));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let buffer = Cursor::new(bytes);

        assert!(matches!(
            ContainerReader::open(buffer),
            Err(ContainerError::VersionMismatch { found: 99 })
        ));
    }
}
