/// One of the three principal axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        match name {
            "x" | "X" => Some(Axis::X),
            "y" | "Y" => Some(Axis::Y),
            "z" | "Z" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Block faces in flag-bit order: 0=Down(-Y), 1=Up(+Y), 2=North(-Z),
/// 3=South(+Z), 4=West(-X), 5=East(+X).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Down = 0,
    Up = 1,
    North = 2,
    South = 3,
    West = 4,
    East = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Down,
        Face::Up,
        Face::North,
        Face::South,
        Face::West,
        Face::East,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn bit(self) -> u8 {
        1u8 << self.index()
    }

    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Face::Down | Face::Up => Axis::Y,
            Face::North | Face::South => Axis::Z,
            Face::West | Face::East => Axis::X,
        }
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Face::Up | Face::South | Face::East)
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::Down => Face::Up,
            Face::Up => Face::Down,
            Face::North => Face::South,
            Face::South => Face::North,
            Face::West => Face::East,
            Face::East => Face::West,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_bits_cover_six_flags() {
        let all = Face::ALL.iter().fold(0u8, |acc, f| acc | f.bit());
        assert_eq!(all, 0b11_1111);
    }

    #[test]
    fn opposite_faces_share_axis() {
        for f in Face::ALL {
            assert_eq!(f.opposite().axis(), f.axis());
            assert_ne!(f.opposite().is_positive(), f.is_positive());
            assert_eq!(f.opposite().opposite(), f);
        }
    }

    #[test]
    fn axis_names() {
        assert_eq!(Axis::from_name("y"), Some(Axis::Y));
        assert_eq!(Axis::from_name("Z"), Some(Axis::Z));
        assert_eq!(Axis::from_name("w"), None);
    }
}
