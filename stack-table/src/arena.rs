//! Definition of an append-only list-of-lists arena.

use std::collections::HashMap;

use crate::error::ArenaError;
use crate::table::{EMPTY, Table};

/// Sentinel terminating each list stored in an [`Arena`]. Numerically
/// identical to [`EMPTY`]; the meaning ("end of list" rather than "absent
/// cell") is determined entirely by context.
pub const END_OF_LIST: u32 = EMPTY;

/// A single-column [`Table`] holding concatenated, terminator-delimited
/// variable-length lists.
///
/// Mutation is append-only: [`Arena::append_list`] always writes a fresh
/// list at the end and returns its start index; updating an owner's list
/// means appending a new one and overwriting the owner's stored index, which
/// leaves the previous list as dead space until the next [`Arena::compress`].
#[derive(Debug, Clone)]
pub struct Arena {
    table: Table,
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            table: Table::new(0, 1),
        }
    }

    /// Number of rows (list cells plus terminators) currently in the arena.
    pub fn rows(&self) -> u32 {
        self.table.rows()
    }

    /// Borrow the backing table, e.g. to hand to a [`crate::ContainerWriter`].
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Rebuild an arena from a table previously produced by [`Arena::table`]
    /// or read back from a container.
    pub fn from_table(table: Table) -> Self {
        Self { table }
    }

    /// Append `items` followed by [`END_OF_LIST`]. Returns the start index
    /// of the new list. The empty list is the degenerate case: a single
    /// terminator cell with no preceding items.
    pub fn append_list(&mut self, items: &[u32]) -> Result<u32, ArenaError> {
        let start = self.table.rows();
        self.table.append_rows(items.len() as u32 + 1)?;

        for (offset, &value) in items.iter().enumerate() {
            self.table.set(start + offset as u32, 0, value)?;
        }
        self.table
            .set(start + items.len() as u32, 0, END_OF_LIST)?;

        Ok(start)
    }

    /// Read the list starting at `index`, stopping at the terminator.
    ///
    /// Fails with [`ArenaError::MissingTerminator`] if the walk runs past
    /// the end of the table without finding one.
    pub fn read_list(&self, index: u32) -> Result<Vec<u32>, ArenaError> {
        let mut result = Vec::new();
        let mut cursor = index;

        loop {
            let value = self
                .table
                .get(cursor, 0)
                .map_err(|_| ArenaError::MissingTerminator { index })?;

            if value == END_OF_LIST {
                break;
            }

            result.push(value);
            cursor += 1;
        }

        Ok(result)
    }

    /// Compact the arena in place, discarding lists no longer referenced by
    /// `owners[_, column]`.
    ///
    /// Builds a reverse map from arena start-index to owner row, then
    /// sweeps the arena once with a `NewList -> {Copying, Skipping}` state
    /// machine, rewriting each surviving owner's index column to the new,
    /// compacted location. If two owners point at the same start index, the
    /// first one encountered wins and the collision is logged; the
    /// compaction still succeeds.
    pub fn compress(&mut self, owners: &mut Table, column: u32) -> Result<(), ArenaError> {
        let mut reverse: HashMap<u32, u32> = HashMap::new();

        for owner_row in 0..owners.rows() {
            let start = owners.get(owner_row, column)?;
            if start == EMPTY {
                continue;
            }

            reverse.entry(start).or_insert_with(|| {
                owner_row
            });

            if let Some(&first_owner) = reverse.get(&start) {
                if first_owner != owner_row {
                    tracing::warn!(
                        arena_index = start,
                        first_owner,
                        other_owner = owner_row,
                        "two owners point at the same arena list; keeping the first"
                    );
                }
            }
        }

        enum State {
            NewList,
            Copying,
            Skipping,
        }

        let mut state = State::NewList;
        let mut out = 0u32;
        let mut i = 0u32;
        let total_rows = self.table.rows();

        while i < total_rows {
            if let State::NewList = state {
                match reverse.get(&i) {
                    Some(&owner_row) => {
                        owners.set(owner_row, column, out)?;
                        state = State::Copying;
                    }
                    None => {
                        state = State::Skipping;
                    }
                }
            }

            match state {
                State::Skipping => {
                    if self.table.get(i, 0)? == END_OF_LIST {
                        state = State::NewList;
                    }
                }
                State::Copying => {
                    let value = self.table.get(i, 0)?;
                    self.table.set(out, 0, value)?;
                    out += 1;

                    if value == END_OF_LIST {
                        state = State::NewList;
                    }
                }
                State::NewList => unreachable!("handled above"),
            }

            i += 1;
        }

        self.table.truncate_rows(out)?;
        Ok(())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read_round_trip() {
        let mut arena = Arena::new();
        let empty_index = arena.append_list(&[]).unwrap();
        let index = arena.append_list(&[10, 20, 30]).unwrap();

        assert_eq!(arena.read_list(empty_index).unwrap(), Vec::<u32>::new());
        assert_eq!(arena.read_list(index).unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn read_list_missing_terminator_fails() {
        let mut arena = Arena::new();
        arena.append_list(&[1, 2]).unwrap();

        // Index one past the terminator is out of bounds; the table has no
        // more rows to find a terminator in.
        assert!(matches!(
            arena.read_list(5),
            Err(ArenaError::MissingTerminator { .. })
        ));
    }

    #[test]
    fn compress_drops_orphans_and_rewrites_owner_index() {
        let mut arena = Arena::new();
        let mut owners = Table::new(0, 1);
        owners.append_rows(2).unwrap();

        // Owner 0 points at an orphaned (overwritten) list.
        let orphan = arena.append_list(&[1, 2, 3]).unwrap();
        owners.set(0, 0, orphan).unwrap();

        // Owner 0 is updated to point at a fresh list; the old one rots.
        let live_for_0 = arena.append_list(&[4, 5]).unwrap();
        owners.set(0, 0, live_for_0).unwrap();

        // Owner 1 has its own live list.
        let live_for_1 = arena.append_list(&[6]).unwrap();
        owners.set(1, 0, live_for_1).unwrap();

        arena.compress(&mut owners, 0).unwrap();

        let index0 = owners.get(0, 0).unwrap();
        let index1 = owners.get(1, 0).unwrap();
        assert_eq!(arena.read_list(index0).unwrap(), vec![4, 5]);
        assert_eq!(arena.read_list(index1).unwrap(), vec![6]);

        // Orphaned list (3 items + terminator) should be gone: total rows
        // are exactly the two surviving lists' rows.
        assert_eq!(arena.rows(), 3 + 2);
    }

    #[test]
    fn compress_is_idempotent() {
        let mut arena = Arena::new();
        let mut owners = Table::new(0, 1);
        owners.append_rows(1).unwrap();
        let index = arena.append_list(&[1, 2, 3]).unwrap();
        owners.set(0, 0, index).unwrap();

        arena.compress(&mut owners, 0).unwrap();
        let rows_after_first = arena.rows();
        let data_after_first: Vec<u32> = (0..rows_after_first)
            .map(|r| arena.table.get(r, 0).unwrap())
            .collect();

        arena.compress(&mut owners, 0).unwrap();
        let rows_after_second = arena.rows();
        let data_after_second: Vec<u32> = (0..rows_after_second)
            .map(|r| arena.table.get(r, 0).unwrap())
            .collect();

        assert_eq!(rows_after_first, rows_after_second);
        assert_eq!(data_after_first, data_after_second);
    }

    #[test]
    fn compress_keeps_first_owner_on_collision() {
        let mut arena = Arena::new();
        let mut owners = Table::new(0, 1);
        owners.append_rows(2).unwrap();

        let shared = arena.append_list(&[9]).unwrap();
        owners.set(0, 0, shared).unwrap();
        owners.set(1, 0, shared).unwrap();

        arena.compress(&mut owners, 0).unwrap();

        let index0 = owners.get(0, 0).unwrap();
        let index1 = owners.get(1, 0).unwrap();
        assert_eq!(index0, index1);
        assert_eq!(arena.read_list(index0).unwrap(), vec![9]);
    }

    mod state_machine {
        use super::*;
        use bolero::{check, generator::*};

        const OWNERS: u32 = 4;

        #[derive(Debug, TypeGenerator)]
        enum Operation {
            SetList(u8, Vec<u8>),
            Compress,
        }

        // Reference model: the list each owner currently points at, kept in
        // sync independently of where `compress` relocates it in the arena.
        #[test]
        fn arena_state_machine() {
            check!()
                .with_type::<Vec<Operation>>()
                .for_each(|operations| {
                    let mut arena = Arena::new();
                    let mut owners = Table::new(OWNERS, 1);
                    let mut model: HashMap<u32, Vec<u32>> = HashMap::new();

                    for operation in operations {
                        match operation {
                            Operation::SetList(owner, items) => {
                                let owner = *owner as u32 % OWNERS;
                                let items: Vec<u32> = items.iter().map(|&b| b as u32).collect();
                                let index = arena.append_list(&items).unwrap();
                                owners.set(owner, 0, index).unwrap();
                                model.insert(owner, items);
                            }

                            Operation::Compress => {
                                arena.compress(&mut owners, 0).unwrap();
                            }
                        }

                        for owner in 0..OWNERS {
                            let index = owners.get(owner, 0).unwrap();
                            match model.get(&owner) {
                                Some(expected) => {
                                    assert_eq!(&arena.read_list(index).unwrap(), expected);
                                }
                                None => assert_eq!(index, EMPTY),
                            }
                        }
                    }
                });
        }
    }
}
