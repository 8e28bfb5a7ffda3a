use core::ops::{Add, Sub};

use crate::Vec3;

/// Absolute position on the bit grid (one unit = one sub-block cell).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BitPos {
    pub const ORIGIN: BitPos = BitPos { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Container holding this bit for blocks of `side` bits per edge.
    #[inline]
    pub fn block(self, side: usize) -> BlockPos {
        let s = side as i64;
        BlockPos::new(self.x.div_euclid(s), self.y.div_euclid(s), self.z.div_euclid(s))
    }

    /// Coordinates of this bit inside its container.
    #[inline]
    pub fn local(self, side: usize) -> (usize, usize, usize) {
        let s = side as i64;
        (
            self.x.rem_euclid(s) as usize,
            self.y.rem_euclid(s) as usize,
            self.z.rem_euclid(s) as usize,
        )
    }

    #[inline]
    pub fn offset(self, dx: i64, dy: i64, dz: i64) -> BitPos {
        BitPos::new(self.x + dx, self.y + dy, self.z + dz)
    }

    #[inline]
    pub fn min(self, o: BitPos) -> BitPos {
        BitPos::new(self.x.min(o.x), self.y.min(o.y), self.z.min(o.z))
    }

    #[inline]
    pub fn max(self, o: BitPos) -> BitPos {
        BitPos::new(self.x.max(o.x), self.y.max(o.y), self.z.max(o.z))
    }

    /// Center of the cell in bit units.
    #[inline]
    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }
}

impl Add for BitPos {
    type Output = BitPos;
    #[inline]
    fn add(self, rhs: BitPos) -> BitPos {
        BitPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for BitPos {
    type Output = BitPos;
    #[inline]
    fn sub(self, rhs: BitPos) -> BitPos {
        BitPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Position of a full block (one container).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Lowest-corner bit of this block.
    #[inline]
    pub fn origin(self, side: usize) -> BitPos {
        let s = side as i64;
        BitPos::new(self.x * s, self.y * s, self.z * s)
    }

    #[inline]
    pub fn bit(self, side: usize, lx: usize, ly: usize, lz: usize) -> BitPos {
        self.origin(side).offset(lx as i64, ly as i64, lz as i64)
    }
}

/// Inclusive box of bit positions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitBox {
    pub min: BitPos,
    pub max: BitPos,
}

impl BitBox {
    /// Normalizes the corners so `min <= max` on every axis.
    pub fn new(a: BitPos, b: BitPos) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn point(p: BitPos) -> Self {
        Self { min: p, max: p }
    }

    /// Whole-block box covering every bit of `block`.
    pub fn of_block(block: BlockPos, side: usize) -> Self {
        let o = block.origin(side);
        let e = side as i64 - 1;
        Self::new(o, o.offset(e, e, e))
    }

    #[inline]
    pub fn contains(&self, p: BitPos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Smallest box covering both `self` and `p`.
    pub fn including(&self, p: BitPos) -> BitBox {
        BitBox {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(&self, o: &BitBox) -> BitBox {
        BitBox {
            min: self.min.min(o.min),
            max: self.max.max(o.max),
        }
    }

    #[inline]
    pub fn size(&self) -> (i64, i64, i64) {
        (
            self.max.x - self.min.x + 1,
            self.max.y - self.min.y + 1,
            self.max.z - self.min.z + 1,
        )
    }

    pub fn volume(&self) -> u64 {
        let (x, y, z) = self.size();
        (x as u64) * (y as u64) * (z as u64)
    }

    /// Positions in y-major, then z, then x order.
    pub fn iter(&self) -> impl Iterator<Item = BitPos> + use<> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| {
            (min.z..=max.z)
                .flat_map(move |z| (min.x..=max.x).map(move |x| BitPos::new(x, y, z)))
        })
    }

    /// Containers touched by this box, in y-major, then z, then x order.
    pub fn blocks(&self, side: usize) -> Vec<BlockPos> {
        let lo = self.min.block(side);
        let hi = self.max.block(side);
        let mut out = Vec::new();
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                for x in lo.x..=hi.x {
                    out.push(BlockPos::new(x, y, z));
                }
            }
        }
        out
    }
}
