//! Versioned byte formats. The first byte names the layout:
//!
//! * `0x00` legacy: two 4-bit cells per byte, low nibble first.
//! * `0x01` compact: `[width]` then every id packed at `width` bits.
//! * `0x02` paletted: `[width][len varint][ids varint…]` then palette indices.
//!
//! Payload bits are packed LSB-first. Width `0` carries no payload.

use chisel_blocks::{AIR, StateId};

use crate::bits::{BitReader, BitWriter, packed_len, read_varint, width_for, write_varint};
use crate::blob::{VoxelBlob, check_side};
use crate::error::BlobError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlobVersion {
    Legacy,
    Compact,
    #[default]
    Paletted,
}

impl BlobVersion {
    pub const fn tag(self) -> u8 {
        match self {
            BlobVersion::Legacy => 0x00,
            BlobVersion::Compact => 0x01,
            BlobVersion::Paletted => 0x02,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(BlobVersion::Legacy),
            0x01 => Some(BlobVersion::Compact),
            0x02 => Some(BlobVersion::Paletted),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "legacy" => Some(BlobVersion::Legacy),
            "compact" => Some(BlobVersion::Compact),
            "paletted" | "palette" => Some(BlobVersion::Paletted),
            _ => None,
        }
    }
}

impl VoxelBlob {
    pub fn to_bytes(&self, version: BlobVersion) -> Result<Vec<u8>, BlobError> {
        let mut out = vec![version.tag()];
        match version {
            BlobVersion::Legacy => write_nibbles(self.cells(), &mut out)?,
            BlobVersion::Compact => {
                let width = width_for(self.max_state());
                out.push(width as u8);
                out.reserve(packed_len(self.volume(), width));
                let mut w = BitWriter::new(&mut out);
                for &c in self.cells() {
                    w.push(c, width);
                }
                w.finish();
            }
            BlobVersion::Paletted => {
                let palette = self.distinct_states();
                let width = width_for(palette.len().saturating_sub(1) as u32);
                out.push(width as u8);
                write_varint(&mut out, palette.len() as u32);
                for &id in &palette {
                    write_varint(&mut out, id);
                }
                let mut w = BitWriter::new(&mut out);
                if width > 0 {
                    let mut last = (palette[0], 0u32);
                    for &c in self.cells() {
                        if c != last.0 {
                            let i = palette.iter().position(|&p| p == c).unwrap_or(0);
                            last = (c, i as u32);
                        }
                        w.push(last.1, width);
                    }
                }
                w.finish();
            }
        }
        Ok(out)
    }

    pub fn from_bytes(side: usize, bytes: &[u8]) -> Result<VoxelBlob, BlobError> {
        let n = check_side(side)?;
        let (&tag, body) = bytes
            .split_first()
            .ok_or_else(|| BlobError::malformed("empty input"))?;
        let version = BlobVersion::from_tag(tag)
            .ok_or_else(|| BlobError::malformed(format!("unknown version tag {tag:#04x}")))?;
        let cells = match version {
            BlobVersion::Legacy => read_nibbles(n, body)?,
            BlobVersion::Compact => {
                let (width, payload) = split_width(body)?;
                read_packed(n, width, payload)?
            }
            BlobVersion::Paletted => {
                let (width, rest) = split_width(body)?;
                let mut pos = 0;
                let len = read_varint(rest, &mut pos)? as usize;
                if len == 0 {
                    return Err(BlobError::malformed("empty palette"));
                }
                if len > n {
                    return Err(BlobError::malformed(format!(
                        "palette of {len} entries exceeds {n} cells"
                    )));
                }
                let mut palette = Vec::with_capacity(len);
                for _ in 0..len {
                    palette.push(read_varint(rest, &mut pos)?);
                }
                let indices = read_packed(n, width, &rest[pos..])?;
                indices
                    .into_iter()
                    .map(|i| {
                        palette.get(i as usize).copied().ok_or_else(|| {
                            BlobError::malformed(format!("palette index {i} out of range"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(VoxelBlob::from_cells(side, cells))
    }

    /// Decodes bare nibble data written before version tags existed.
    pub fn from_legacy_bytes(side: usize, bytes: &[u8]) -> Result<VoxelBlob, BlobError> {
        let n = check_side(side)?;
        Ok(VoxelBlob::from_cells(side, read_nibbles(n, bytes)?))
    }
}

fn split_width(body: &[u8]) -> Result<(u32, &[u8]), BlobError> {
    let (&width, rest) = body
        .split_first()
        .ok_or_else(|| BlobError::malformed("missing bit width"))?;
    if width > 32 {
        return Err(BlobError::malformed(format!("bit width {width} exceeds 32")));
    }
    Ok((width as u32, rest))
}

fn read_packed(n: usize, width: u32, payload: &[u8]) -> Result<Vec<StateId>, BlobError> {
    let expect = packed_len(n, width);
    if payload.len() != expect {
        return Err(BlobError::malformed(format!(
            "payload is {} bytes, expected {expect}",
            payload.len()
        )));
    }
    let mut r = BitReader::new(payload);
    (0..n)
        .map(|_| {
            r.read(width)
                .ok_or_else(|| BlobError::malformed("payload ended early"))
        })
        .collect()
}

fn write_nibbles(cells: &[StateId], out: &mut Vec<u8>) -> Result<(), BlobError> {
    if let Some(&state) = cells.iter().find(|&&c| c > 0x0f) {
        return Err(BlobError::LegacyStateOverflow { state });
    }
    out.extend(cells.chunks(2).map(|pair| {
        let lo = pair[0] as u8;
        let hi = pair.get(1).copied().unwrap_or(AIR) as u8;
        lo | (hi << 4)
    }));
    Ok(())
}

fn read_nibbles(n: usize, bytes: &[u8]) -> Result<Vec<StateId>, BlobError> {
    let expect = n.div_ceil(2);
    if bytes.len() != expect {
        return Err(BlobError::malformed(format!(
            "legacy payload is {} bytes, expected {expect}",
            bytes.len()
        )));
    }
    let mut cells = Vec::with_capacity(n);
    for &b in bytes {
        cells.push((b & 0x0f) as StateId);
        cells.push((b >> 4) as StateId);
    }
    cells.truncate(n);
    Ok(cells)
}
