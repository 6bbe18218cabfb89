//! Matrix clock ("time table")
//!
//! An N×N matrix where `table[i][j]` is replica i's best knowledge of
//! replica j's local clock. Row i is replica i's vector clock. The size is
//! fixed at construction and cells only ever grow: the only way to change a
//! cell is [`TimeTable::raise`], which takes the maximum.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SystemError, SystemResult};
use crate::event::OriginStamp;
use crate::identity::ReplicaId;

/// Fixed-size N×N matrix clock, row-major
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeTableRepr", into = "TimeTableRepr")]
pub struct TimeTable {
    size: usize,
    cells: Vec<u64>,
}

impl TimeTable {
    /// Zero-filled table for `size` replicas
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Build a table from explicit rows; every row must have `rows.len()` cells.
    pub fn from_rows(rows: &[Vec<u64>]) -> SystemResult<Self> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for row in rows {
            if row.len() != size {
                return Err(SystemError::DimensionMismatch {
                    expected: size,
                    actual: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self { size, cells })
    }

    /// Number of replicas the table covers
    pub fn size(&self) -> usize {
        self.size
    }

    fn offset(&self, row: ReplicaId, col: ReplicaId) -> Option<usize> {
        let r = row.index()?;
        let c = col.index()?;
        (r < self.size && c < self.size).then_some(r * self.size + c)
    }

    /// `row`'s knowledge of `col`'s clock.
    ///
    /// Ids outside the table read as 0: nothing is known about them.
    pub fn get(&self, row: ReplicaId, col: ReplicaId) -> u64 {
        self.offset(row, col)
            .map(|offset| self.cells[offset])
            .unwrap_or(0)
    }

    /// Raise a cell to `value` if that is larger. Returns whether it changed.
    pub fn raise(&mut self, row: ReplicaId, col: ReplicaId, value: u64) -> bool {
        debug_assert!(
            self.offset(row, col).is_some(),
            "cell ({row}, {col}) outside a {0}x{0} table",
            self.size
        );
        match self.offset(row, col) {
            Some(offset) if self.cells[offset] < value => {
                self.cells[offset] = value;
                true
            }
            _ => false,
        }
    }

    /// Whether `observer` is known to have incorporated the event at `stamp`
    pub fn knows(&self, observer: ReplicaId, stamp: OriginStamp) -> bool {
        self.get(observer, stamp.replica) >= stamp.seq
    }

    /// Row `id` as a vector clock
    pub fn row(&self, id: ReplicaId) -> &[u64] {
        match id.index() {
            Some(r) if r < self.size => &self.cells[r * self.size..(r + 1) * self.size],
            _ => &[],
        }
    }

    /// Copy of the whole matrix as nested rows
    pub fn rows(&self) -> Vec<Vec<u64>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.size).map(<[u64]>::to_vec).collect()
    }

    /// Merge a snapshot received from `source` into the table owned by `owner`.
    ///
    /// The owner's row first absorbs the source's row (everything the source
    /// had seen, the owner has now seen), then every cell takes the entrywise
    /// maximum with the snapshot so third-party knowledge travels along.
    pub fn merge_from(
        &mut self,
        owner: ReplicaId,
        source: ReplicaId,
        snapshot: &TimeTable,
    ) -> SystemResult<()> {
        if snapshot.size != self.size {
            return Err(SystemError::DimensionMismatch {
                expected: self.size,
                actual: snapshot.size,
            });
        }

        for col in ReplicaId::range(self.size) {
            self.raise(owner, col, snapshot.get(source, col));
        }

        for (mine, theirs) in self.cells.iter_mut().zip(&snapshot.cells) {
            *mine = (*mine).max(*theirs);
        }
        Ok(())
    }

    /// Whether every cell of `self` is at least the matching cell of `other`
    pub fn dominates(&self, other: &TimeTable) -> bool {
        self.size == other.size
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(mine, theirs)| mine >= theirs)
    }
}

impl fmt::Debug for TimeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

#[derive(Serialize, Deserialize)]
struct TimeTableRepr {
    size: u32,
    cells: Vec<u64>,
}

impl From<TimeTable> for TimeTableRepr {
    fn from(table: TimeTable) -> Self {
        Self {
            size: table.size as u32,
            cells: table.cells,
        }
    }
}

impl TryFrom<TimeTableRepr> for TimeTable {
    type Error = SystemError;

    fn try_from(repr: TimeTableRepr) -> Result<Self, Self::Error> {
        let size = repr.size as usize;
        if repr.cells.len() != size * size {
            return Err(SystemError::Codec(format!(
                "time table of size {} carries {} cells",
                size,
                repr.cells.len()
            )));
        }
        Ok(Self {
            size,
            cells: repr.cells,
        })
    }
}
