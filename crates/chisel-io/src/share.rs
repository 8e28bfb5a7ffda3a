//! Share strings: `[C&B](` base64 of a zlib stream `)[C&B]`.
//!
//! Stream layout (varints unless noted): format `1`, size x/y/z, index bit
//! width, one packed model index per block (x fastest, then y, then z),
//! padding to the next byte, model count, then each model as a
//! length-prefixed byte string. Model byte strings start with a tag: `1`
//! uniform state (varint), `2` blob bytes, anything else air.

use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chisel_area::BlobWorld;
use chisel_blob::bits::{BitReader, BitWriter, read_varint, width_for, write_varint};
use chisel_blob::{BlobRef, VoxelBlob};
use chisel_blocks::{AIR, StateId};
use chisel_geom::BlockPos;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::IoError;

pub const HEADER: &str = "[C&B](";
pub const FOOTER: &str = ")[C&B]";
const FORMAT: u32 = 1;
/// Refuse absurd dimensions before allocating.
const MAX_BLOCKS: u64 = 1 << 20;
/// Larger than any blob encoding at the maximum side.
const MAX_MODEL_BYTES: usize = 1 << 22;
/// Inflated stream cap: 32-bit indices for every block plus room for models.
const MAX_STREAM_BYTES: u64 = MAX_BLOCKS * 4 + 32 * MAX_MODEL_BYTES as u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SharedModel {
    Air,
    Uniform(StateId),
    Blob(Vec<u8>),
}

impl SharedModel {
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            SharedModel::Air => vec![0],
            SharedModel::Uniform(s) => {
                let mut out = vec![1];
                write_varint(&mut out, *s);
                out
            }
            SharedModel::Blob(bytes) => {
                let mut out = Vec::with_capacity(bytes.len() + 1);
                out.push(2);
                out.extend_from_slice(bytes);
                out
            }
        }
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, IoError> {
        Ok(match bytes.split_first() {
            Some((&1, rest)) => {
                let mut pos = 0;
                SharedModel::Uniform(read_varint(rest, &mut pos)?)
            }
            Some((&2, rest)) => SharedModel::Blob(rest.to_vec()),
            _ => SharedModel::Air,
        })
    }
}

/// A rectangular region of blocks, each pointing at a shared model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareData {
    pub size: [u32; 3],
    pub blocks: Vec<u32>,
    pub models: Vec<SharedModel>,
}

impl ShareData {
    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let [sx, sy, _] = self.size;
        (x + y * sx + z * sx * sy) as usize
    }

    /// Captures the blocks between `a` and `b` inclusive.
    pub fn capture(world: &BlobWorld, a: BlockPos, b: BlockPos) -> Result<Self, IoError> {
        let min = BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z));
        let max = BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z));
        let size = [
            (max.x - min.x + 1) as u64,
            (max.y - min.y + 1) as u64,
            (max.z - min.z + 1) as u64,
        ];
        check_volume(size)?;
        let mut data = ShareData {
            size: size.map(|v| v as u32),
            blocks: Vec::with_capacity((size[0] * size[1] * size[2]) as usize),
            models: Vec::new(),
        };
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let model = match world.container(BlockPos::new(x, y, z)) {
                        None => SharedModel::Air,
                        Some(c) => {
                            let blob = c.blob().blob();
                            match blob.distinct_states().as_slice() {
                                [AIR] => SharedModel::Air,
                                [s] => SharedModel::Uniform(*s),
                                _ => SharedModel::Blob(c.blob().bytes().to_vec()),
                            }
                        }
                    };
                    let id = match data.models.iter().position(|m| *m == model) {
                        Some(i) => i,
                        None => {
                            data.models.push(model);
                            data.models.len() - 1
                        }
                    };
                    data.blocks.push(id as u32);
                }
            }
        }
        Ok(data)
    }

    pub fn model_at(&self, x: u32, y: u32, z: u32) -> &SharedModel {
        let [sx, sy, sz] = self.size;
        if x >= sx || y >= sy || z >= sz {
            return &SharedModel::Air;
        }
        self.blocks
            .get(self.index(x, y, z))
            .and_then(|&m| self.models.get(m as usize))
            .unwrap_or(&SharedModel::Air)
    }

    /// Blob for one block; unknown models and bad bytes become air.
    pub fn blob_at(&self, x: u32, y: u32, z: u32, side: usize) -> Result<BlobRef, IoError> {
        Ok(match self.model_at(x, y, z) {
            SharedModel::Air => BlobRef::empty(side)?,
            SharedModel::Uniform(s) => {
                let blob = VoxelBlob::filled(side, *s)?;
                BlobRef::from_blob(blob, chisel_blob::BlobVersion::Paletted)?
            }
            SharedModel::Blob(bytes) => BlobRef::from_bytes(side, bytes.clone(), AIR),
        })
    }

    /// Writes every non-air block with its lowest corner at `origin`.
    pub fn apply(&self, world: &mut BlobWorld, origin: BlockPos) -> Result<usize, IoError> {
        let side = world.side();
        let [sx, sy, sz] = self.size;
        let mut placed = 0;
        for z in 0..sz {
            for y in 0..sy {
                for x in 0..sx {
                    if *self.model_at(x, y, z) == SharedModel::Air {
                        continue;
                    }
                    let blob = self.blob_at(x, y, z, side)?;
                    let pos = BlockPos::new(
                        origin.x + x as i64,
                        origin.y + y as i64,
                        origin.z + z as i64,
                    );
                    world.insert_container(pos, blob);
                    placed += 1;
                }
            }
        }
        Ok(placed)
    }

    fn to_stream(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_varint(&mut out, FORMAT);
        for s in self.size {
            write_varint(&mut out, s);
        }
        let width = width_for(self.models.len().saturating_sub(1) as u32);
        write_varint(&mut out, width);
        let mut w = BitWriter::new(&mut out);
        for &b in &self.blocks {
            w.push(b, width);
        }
        w.finish();
        write_varint(&mut out, self.models.len() as u32);
        for m in &self.models {
            let bytes = m.to_bytes();
            write_varint(&mut out, bytes.len() as u32);
            out.extend_from_slice(&bytes);
        }
        out
    }

    fn from_stream(data: &[u8]) -> Result<Self, IoError> {
        let mut pos = 0;
        let format = read_varint(data, &mut pos)?;
        if format != FORMAT {
            return Err(IoError::Share(format!("unsupported format {format}")));
        }
        let mut size = [0u32; 3];
        for s in &mut size {
            *s = read_varint(data, &mut pos)?;
        }
        let volume = check_volume(size.map(u64::from))?;
        let width = read_varint(data, &mut pos)?;
        if width > 32 {
            return Err(IoError::Share(format!("index width {width} exceeds 32")));
        }
        let mut r = BitReader::new(&data[pos..]);
        let blocks = (0..volume)
            .map(|_| {
                r.read(width)
                    .ok_or_else(|| IoError::Share("block indices truncated".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        pos += r.byte_pos();
        let count = read_varint(data, &mut pos)? as usize;
        if count as u64 > volume + 1 {
            return Err(IoError::Share(format!("{count} models for {volume} blocks")));
        }
        let mut models = Vec::with_capacity(count.min(volume as usize + 1));
        for _ in 0..count {
            let len = read_varint(data, &mut pos)? as usize;
            if len > MAX_MODEL_BYTES {
                return Err(IoError::Share(format!("model of {len} bytes is too large")));
            }
            let bytes = pos
                .checked_add(len)
                .and_then(|end| data.get(pos..end))
                .ok_or_else(|| IoError::Share("model bytes truncated".into()))?;
            pos += len;
            models.push(SharedModel::from_bytes(bytes)?);
        }
        Ok(ShareData {
            size,
            blocks,
            models,
        })
    }

    /// `[C&B](…)[C&B]` text.
    pub fn encode(&self) -> Result<String, IoError> {
        let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
        z.write_all(&self.to_stream())?;
        let compressed = z.finish()?;
        Ok(format!("{HEADER}{}{FOOTER}", STANDARD.encode(compressed)))
    }

    /// Parses share text; surrounding text is ignored.
    pub fn decode(text: &str) -> Result<Self, IoError> {
        let start = text
            .find(HEADER)
            .ok_or_else(|| IoError::Share("unable to locate share data".into()))?
            + HEADER.len();
        let len = text[start..]
            .find(FOOTER)
            .ok_or_else(|| IoError::Share("unterminated share data".into()))?;
        let compressed = STANDARD.decode(text[start..start + len].trim())?;
        let stream = inflate(&compressed, MAX_STREAM_BYTES)?;
        Self::from_stream(&stream)
    }
}

/// Inflates at most `limit` bytes; longer streams are rejected.
fn inflate(compressed: &[u8], limit: u64) -> Result<Vec<u8>, IoError> {
    let mut stream = Vec::new();
    ZlibDecoder::new(compressed)
        .take(limit + 1)
        .read_to_end(&mut stream)?;
    if stream.len() as u64 > limit {
        return Err(IoError::Share(format!("share data inflates past {limit} bytes")));
    }
    Ok(stream)
}

fn check_volume(size: [u64; 3]) -> Result<u64, IoError> {
    let v = size[0].saturating_mul(size[1]).saturating_mul(size[2]);
    if v == 0 || v > MAX_BLOCKS {
        return Err(IoError::Share(format!(
            "region of {}x{}x{} blocks is not shareable",
            size[0], size[1], size[2]
        )));
    }
    Ok(v)
}
