use chisel_blocks::{AIR, StateId, StateTable, VoxelKind};
use chisel_geom::{Axis, Face};

use crate::blob::{DEFAULT_SIDE, VoxelBlob};

/// Aggregate facts about a blob gathered in one scan.
#[derive(Clone, Debug, PartialEq)]
pub struct BlobStats {
    /// Most frequent non-air state; air when the blob is empty.
    pub most_common_state: StateId,
    pub is_full_block: bool,
    pub solid_cells: usize,
    pub fluid_cells: usize,
    pub air_cells: usize,
    /// Mean emitted light in `[0,1]`.
    pub block_light: f32,
    /// Mean opacity in `[0,1]`.
    pub opacity: f32,
}

impl BlobStats {
    /// Light level on the 0..=15 scale used by containers.
    pub fn light_level(&self) -> u8 {
        (self.block_light * 15.0).round().clamp(0.0, 15.0) as u8
    }
}

/// Which cells count toward a face being "solid".
///
/// For every face the `depth` outermost layers are scanned, restricted to
/// `window_min..=window_max` on both in-plane axes; the face bit is set when
/// at least `threshold` solid cells are found. The default is the window
/// for [`DEFAULT_SIDE`]; use [`SideSampling::for_side`] for other sides.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SideSampling {
    pub depth: usize,
    pub window_min: usize,
    pub window_max: usize,
    pub threshold: usize,
}

impl SideSampling {
    /// Window scaled from the 16-wide reference `(1, 5..=11, 16)`.
    ///
    /// The threshold keeps the reference ratio of 16 out of 49 window cells
    /// and never exceeds the window area, so a full block covers all faces
    /// at every side length.
    pub fn for_side(side: usize) -> Self {
        let side = side.max(1);
        let window_min = 5 * side / 16;
        let window_max = (11 * side / 16).clamp(window_min, side - 1);
        let width = window_max - window_min + 1;
        let area = width * width;
        Self {
            depth: 1,
            window_min,
            window_max,
            threshold: (16 * area).div_ceil(49).clamp(1, area),
        }
    }
}

impl Default for SideSampling {
    fn default() -> Self {
        Self::for_side(DEFAULT_SIDE)
    }
}

impl VoxelBlob {
    pub fn stats(&self, table: &dyn StateTable) -> BlobStats {
        // (state, count) in first-seen order so ties resolve to the earliest
        let mut counts: Vec<(StateId, usize)> = Vec::new();
        let mut last: Option<(StateId, usize)> = None;
        let (mut solid, mut fluid, mut air) = (0usize, 0usize, 0usize);
        let mut light_sum = 0u64;
        let mut opacity_sum = 0f64;

        for &c in self.cells() {
            let props = table.resolve(c);
            match props.kind() {
                VoxelKind::Air => {
                    air += 1;
                    continue;
                }
                VoxelKind::Fluid => fluid += 1,
                VoxelKind::Solid => solid += 1,
            }
            light_sum += props.light_value.min(15) as u64;
            opacity_sum += props.opacity.clamp(0.0, 1.0) as f64;

            let slot = match last {
                Some((s, i)) if s == c => i,
                _ => match counts.iter().position(|&(s, _)| s == c) {
                    Some(i) => i,
                    None => {
                        counts.push((c, 0));
                        counts.len() - 1
                    }
                },
            };
            counts[slot].1 += 1;
            last = Some((c, slot));
        }

        let mut most_common_state = AIR;
        let mut best = 0;
        for &(s, n) in &counts {
            if n > best {
                best = n;
                most_common_state = s;
            }
        }

        let volume = self.volume() as f64;
        BlobStats {
            most_common_state,
            is_full_block: counts.len() == 1 && air == 0,
            solid_cells: solid,
            fluid_cells: fluid,
            air_cells: air,
            block_light: (light_sum as f64 / (15.0 * volume)) as f32,
            opacity: (opacity_sum / volume) as f32,
        }
    }

    /// Bit mask over `Face::ALL` of faces considered covered.
    pub fn side_flags(&self, table: &dyn StateTable, sampling: SideSampling) -> u8 {
        let s = self.side();
        let depth = sampling.depth.min(s);
        let lo = sampling.window_min.min(s - 1);
        let hi = sampling.window_max.min(s - 1);
        if depth == 0 || lo > hi {
            return 0;
        }
        let mut flags = 0u8;
        for face in Face::ALL {
            let layers = if face.is_positive() { s - depth..s } else { 0..depth };
            let mut solid = 0usize;
            for d in layers {
                for a in lo..=hi {
                    for b in lo..=hi {
                        let (x, y, z) = match face.axis() {
                            Axis::Y => (a, d, b),
                            Axis::Z => (a, b, d),
                            Axis::X => (d, a, b),
                        };
                        let c = self.cells()[self.idx(x, y, z)];
                        if table.kind(c) == VoxelKind::Solid {
                            solid += 1;
                        }
                    }
                }
            }
            if solid >= sampling.threshold {
                flags |= face.bit();
            }
        }
        flags
    }
}
