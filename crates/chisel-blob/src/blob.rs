use chisel_blocks::{AIR, StateId};
use chisel_geom::{Axis, BitBox, BitPos};

use crate::error::BlobError;

pub const DEFAULT_SIDE: usize = 16;
pub const MAX_SIDE: usize = 64;

pub(crate) fn check_side(side: usize) -> Result<usize, BlobError> {
    if side == 0 || side > MAX_SIDE {
        return Err(BlobError::UnsupportedSide(side));
    }
    Ok(side * side * side)
}

/// Dense `S×S×S` grid of state ids. Cell `(x, y, z)` lives at
/// `(y*S + z)*S + x`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoxelBlob {
    side: usize,
    cells: Vec<StateId>,
}

impl VoxelBlob {
    /// All-air blob.
    pub fn new(side: usize) -> Result<Self, BlobError> {
        Self::filled(side, AIR)
    }

    pub fn filled(side: usize, state: StateId) -> Result<Self, BlobError> {
        let n = check_side(side)?;
        Ok(Self {
            side,
            cells: vec![state; n],
        })
    }

    /// Caller guarantees `cells.len() == side^3`.
    pub(crate) fn from_cells(side: usize, cells: Vec<StateId>) -> Self {
        debug_assert_eq!(cells.len(), side * side * side);
        Self { side, cells }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cells(&self) -> &[StateId] {
        &self.cells
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.side + z) * self.side + x
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.side && y < self.side && z < self.side
    }

    #[inline]
    fn checked_idx(&self, x: usize, y: usize, z: usize) -> Result<usize, BlobError> {
        if !self.contains(x, y, z) {
            return Err(BlobError::OutOfRange {
                x,
                y,
                z,
                side: self.side,
            });
        }
        Ok(self.idx(x, y, z))
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<StateId, BlobError> {
        Ok(self.cells[self.checked_idx(x, y, z)?])
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, state: StateId) -> Result<(), BlobError> {
        let i = self.checked_idx(x, y, z)?;
        self.cells[i] = state;
        Ok(())
    }

    pub fn fill(&mut self, state: StateId) {
        self.cells.fill(state);
    }

    pub fn clear(&mut self) {
        self.fill(AIR);
    }

    /// Sets the first `amount` cells walking y, then x, then z; the rest of
    /// the blob is left as is.
    pub fn fill_from_bottom(&mut self, state: StateId, amount: usize) {
        let s = self.side;
        let mut left = amount.min(self.cells.len());
        'outer: for y in 0..s {
            for x in 0..s {
                for z in 0..s {
                    if left == 0 {
                        break 'outer;
                    }
                    let i = self.idx(x, y, z);
                    self.cells[i] = state;
                    left -= 1;
                }
            }
        }
    }

    /// True when no cell is non-air in both blobs.
    pub fn can_merge(&self, other: &VoxelBlob) -> bool {
        self.side == other.side
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(&a, &b)| a == AIR || b == AIR)
    }

    /// Copy of `self` with its air cells taken from `other`.
    pub fn merge(&self, other: &VoxelBlob) -> Result<VoxelBlob, BlobError> {
        if self.side != other.side {
            return Err(BlobError::UnsupportedSide(other.side));
        }
        let cells = self
            .cells
            .iter()
            .zip(&other.cells)
            .map(|(&a, &b)| if a == AIR { b } else { a })
            .collect();
        Ok(VoxelBlob::from_cells(self.side, cells))
    }

    pub fn count(&self, state: StateId) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    pub fn non_air_count(&self) -> usize {
        self.cells.len() - self.count(AIR)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == AIR)
    }

    pub fn max_state(&self) -> StateId {
        self.cells.iter().copied().max().unwrap_or(AIR)
    }

    /// Distinct states in first-seen scan order, air included when present.
    pub fn distinct_states(&self) -> Vec<StateId> {
        let mut out: Vec<StateId> = Vec::new();
        let mut last = None;
        for &c in &self.cells {
            if last == Some(c) {
                continue;
            }
            last = Some(c);
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    /// Tight local bounds of the non-air cells.
    pub fn bounds(&self) -> Option<BitBox> {
        let mut out: Option<BitBox> = None;
        for (x, y, z, state) in self.iter() {
            if state == AIR {
                continue;
            }
            let p = BitPos::new(x as i64, y as i64, z as i64);
            out = Some(match out {
                Some(b) => b.including(p),
                None => BitBox::point(p),
            });
        }
        out
    }

    /// `(x, y, z, state)` in linear index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, StateId)> + '_ {
        let s = self.side;
        self.cells.iter().enumerate().map(move |(i, &state)| {
            let x = i % s;
            let z = (i / s) % s;
            let y = i / (s * s);
            (x, y, z, state)
        })
    }

    /// Single quarter turn about `axis`.
    pub fn spin(&self, axis: Axis) -> VoxelBlob {
        self.rotate90(axis, 1)
    }
}
