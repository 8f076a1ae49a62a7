//! Fixed-layout little-endian records shared by the runtime and the authoring tool.
//!
//! ```text
//! master record (60 bytes)
//!   i32 count_x, count_z, count_y
//!   f32 origin.x, origin.y, origin.z          authored origin
//!   i32 cell_size_xz, cell_size_y
//!   i32 expansion_mode, expansion_level
//!   f32 grid_min.x, grid_min.y, grid_min.z    origin + base + vertical offset
//!   f32 cell_size_xz, cell_size_y
//!
//! cell record (24 bytes)
//!   f32 min.x, min.y, min.z, max.x, max.y, max.z
//! ```
//!
//! There are no field tags and no version: fields are read back in exactly
//! the order they were written. Bytes past the end of a record are ignored.

use std::io::{self, Write};

use glam::{IVec3, Vec2, Vec3};
use gridstream_common::CellBounds;
use gridstream_topology::{ExpansionLevel, ExpansionMode, GridTopology, TopologyError};

pub const MASTER_RECORD_LEN: usize = 60;
pub const CELL_RECORD_LEN: usize = 24;

/// Errors from decoding records.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("truncated {record} record: need {needed} bytes, have {available}")]
    TruncatedStream {
        record: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("invalid topology in master record: {0}")]
    Topology(#[from] TopologyError),
}

/// The master topology record, one per world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterRecord {
    pub count_x: i32,
    pub count_z: i32,
    pub count_y: i32,
    pub origin: Vec3,
    pub cell_size_xz: i32,
    pub cell_size_y: i32,
    pub expansion_mode: ExpansionMode,
    pub expansion_level: ExpansionLevel,
    /// Minimum corner of the grid, derived from the fields above.
    pub grid_min: Vec3,
    /// Cell sizes again, as floats. Read by older runtimes.
    pub grid_cell_size: Vec2,
}

impl MasterRecord {
    pub fn from_topology(topology: &GridTopology) -> Self {
        let counts = topology.counts();
        Self {
            count_x: counts.x,
            count_z: counts.z,
            count_y: counts.y,
            origin: topology.origin(),
            cell_size_xz: topology.cell_size_xz(),
            cell_size_y: topology.cell_size_y(),
            expansion_mode: topology.expansion_mode(),
            expansion_level: topology.expansion_level(),
            grid_min: topology.min_corner(),
            grid_cell_size: Vec2::new(
                topology.cell_size_xz() as f32,
                topology.cell_size_y() as f32,
            ),
        }
    }

    /// Rebuild the topology this record describes.
    pub fn to_topology(&self) -> Result<GridTopology, CodecError> {
        Ok(GridTopology::new(
            self.origin,
            IVec3::new(self.count_x, self.count_y, self.count_z),
            self.cell_size_xz,
            self.cell_size_y,
            self.expansion_mode,
            self.expansion_level,
        )?)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_i32(writer, self.count_x)?;
        write_i32(writer, self.count_z)?;
        write_i32(writer, self.count_y)?;
        write_vec3(writer, self.origin)?;
        write_i32(writer, self.cell_size_xz)?;
        write_i32(writer, self.cell_size_y)?;
        write_i32(writer, self.expansion_mode as i32)?;
        write_i32(writer, self.expansion_level as i32)?;
        write_vec3(writer, self.grid_min)?;
        write_f32(writer, self.grid_cell_size.x)?;
        write_f32(writer, self.grid_cell_size.y)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MASTER_RECORD_LEN);
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = ByteReader::new(bytes, "master", MASTER_RECORD_LEN)?;
        Ok(Self {
            count_x: r.i32(),
            count_z: r.i32(),
            count_y: r.i32(),
            origin: r.vec3(),
            cell_size_xz: r.i32(),
            cell_size_y: r.i32(),
            expansion_mode: ExpansionMode::try_from(r.i32())?,
            expansion_level: ExpansionLevel::try_from(r.i32())?,
            grid_min: r.vec3(),
            grid_cell_size: Vec2::new(r.f32(), r.f32()),
        })
    }
}

/// Axis-aligned bounds of one valid cell, min corner then max corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRecord {
    pub min: Vec3,
    pub max: Vec3,
}

impl CellRecord {
    pub fn bounds(&self) -> CellBounds {
        CellBounds::from_min_max(self.min, self.max)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_vec3(writer, self.min)?;
        write_vec3(writer, self.max)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(CELL_RECORD_LEN);
        let _ = self.write_to(&mut buf);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = ByteReader::new(bytes, "cell", CELL_RECORD_LEN)?;
        Ok(Self {
            min: r.vec3(),
            max: r.vec3(),
        })
    }
}

impl From<CellBounds> for CellRecord {
    fn from(bounds: CellBounds) -> Self {
        Self {
            min: bounds.min(),
            max: bounds.max(),
        }
    }
}

fn write_i32<W: Write>(writer: &mut W, v: i32) -> io::Result<()> {
    writer.write_all(&v.to_le_bytes())
}

fn write_f32<W: Write>(writer: &mut W, v: f32) -> io::Result<()> {
    writer.write_all(&v.to_le_bytes())
}

fn write_vec3<W: Write>(writer: &mut W, v: Vec3) -> io::Result<()> {
    write_f32(writer, v.x)?;
    write_f32(writer, v.y)?;
    write_f32(writer, v.z)
}

/// Sequential reader over a slice already checked to hold a whole record.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8], record: &'static str, needed: usize) -> Result<Self, CodecError> {
        if bytes.len() < needed {
            return Err(CodecError::TruncatedStream {
                record,
                needed,
                available: bytes.len(),
            });
        }
        Ok(Self { bytes, pos: 0 })
    }

    fn word(&mut self) -> [u8; 4] {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        word
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.word())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.word())
    }

    fn vec3(&mut self) -> Vec3 {
        Vec3::new(self.f32(), self.f32(), self.f32())
    }
}
