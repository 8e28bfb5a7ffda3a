//! Rigid transforms. Both return a new blob and leave the source untouched.

use chisel_geom::Axis;

use crate::blob::VoxelBlob;

impl VoxelBlob {
    /// Quarter turns about `axis` through the grid centre, right-handed.
    ///
    /// Coordinates are doubled (`u = 2c - (S-1)`) so the centre is integral
    /// for every side length.
    pub fn rotate90(&self, axis: Axis, times: u32) -> VoxelBlob {
        let times = times % 4;
        if times == 0 {
            return self.clone();
        }
        let s = self.side();
        let off = s as i64 - 1;
        let to_u = |c: usize| 2 * c as i64 - off;
        let from_u = |u: i64| ((u + off) / 2) as usize;
        let turn = |a: i64, b: i64| -> (i64, i64) {
            let (mut a, mut b) = (a, b);
            for _ in 0..times {
                (a, b) = (-b, a);
            }
            (a, b)
        };

        let mut cells = vec![0; self.volume()];
        for (x, y, z, state) in self.iter() {
            let (ux, uy, uz) = (to_u(x), to_u(y), to_u(z));
            let (nx, ny, nz) = match axis {
                Axis::X => {
                    let (ny, nz) = turn(uy, uz);
                    (ux, ny, nz)
                }
                Axis::Y => {
                    let (nz, nx) = turn(uz, ux);
                    (nx, uy, nz)
                }
                Axis::Z => {
                    let (nx, ny) = turn(ux, uy);
                    (nx, ny, uz)
                }
            };
            cells[self.idx(from_u(nx), from_u(ny), from_u(nz))] = state;
        }
        VoxelBlob::from_cells(s, cells)
    }

    /// Reflects across the mid-plane perpendicular to `axis`.
    pub fn mirror(&self, axis: Axis) -> VoxelBlob {
        let s = self.side();
        let mut cells = vec![0; self.volume()];
        for (x, y, z, state) in self.iter() {
            let (x, y, z) = match axis {
                Axis::X => (s - 1 - x, y, z),
                Axis::Y => (x, s - 1 - y, z),
                Axis::Z => (x, y, s - 1 - z),
            };
            cells[self.idx(x, y, z)] = state;
        }
        VoxelBlob::from_cells(s, cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_directions() {
        let mut b = VoxelBlob::new(4).unwrap();
        b.set(3, 0, 0, 1).unwrap();
        // +x rotates toward +y about z
        assert_eq!(b.rotate90(Axis::Z, 1).get(3, 3, 0), Ok(1));
        // about y, +x goes to -z
        let y = b.rotate90(Axis::Y, 1);
        assert_eq!(y.get(0, 0, 0), Ok(1));
        assert_eq!(y.non_air_count(), 1);

        let mut c = VoxelBlob::new(4).unwrap();
        c.set(0, 3, 0, 1).unwrap();
        // about x, +y goes to +z
        assert_eq!(c.rotate90(Axis::X, 1).get(0, 3, 3), Ok(1));
    }

    #[test]
    fn odd_side_keeps_centre() {
        let mut b = VoxelBlob::new(3).unwrap();
        b.set(1, 1, 1, 4).unwrap();
        for axis in Axis::ALL {
            assert_eq!(b.rotate90(axis, 1).get(1, 1, 1), Ok(4));
            assert_eq!(b.mirror(axis).get(1, 1, 1), Ok(4));
        }
    }

    #[test]
    fn mirror_flips_one_axis() {
        let mut b = VoxelBlob::new(4).unwrap();
        b.set(0, 1, 2, 6).unwrap();
        assert_eq!(b.mirror(Axis::X).get(3, 1, 2), Ok(6));
        assert_eq!(b.mirror(Axis::Y).get(0, 2, 2), Ok(6));
        assert_eq!(b.mirror(Axis::Z).get(0, 1, 1), Ok(6));
        assert_eq!(b.get(0, 1, 2), Ok(6));
    }

    #[test]
    fn zero_turns_is_a_copy() {
        let mut b = VoxelBlob::new(2).unwrap();
        b.set(1, 0, 1, 2).unwrap();
        assert_eq!(b.rotate90(Axis::Y, 0), b);
        assert_eq!(b.rotate90(Axis::Y, 8), b);
    }
}
