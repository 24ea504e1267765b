use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::nav::error::{NavError, NavResult};
use crate::nav::fixed_math::FixedVec2;
use super::NavGrid;

pub const MAP_VERSION: u32 = 1;

/// On-disk navigation map: the grid plus the spawn points a scenario uses.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NavMapData {
    pub version: u32,
    pub grid: NavGrid,
    pub spawn_points: Vec<FixedVec2>,
}

impl NavMapData {
    pub fn new(grid: NavGrid, spawn_points: Vec<FixedVec2>) -> Self {
        Self {
            version: MAP_VERSION,
            grid,
            spawn_points,
        }
    }
}

pub fn save_map(path: impl AsRef<Path>, map_data: &NavMapData) -> NavResult<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    bincode::serialize_into(&mut encoder, map_data)?;
    encoder.finish()?;
    Ok(())
}

pub fn load_map(path: impl AsRef<Path>) -> NavResult<NavMapData> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut decoder = ZlibDecoder::new(reader);
    let map_data: NavMapData = bincode::deserialize_from(&mut decoder)?;
    if map_data.version != MAP_VERSION {
        return Err(NavError::MapVersion {
            expected: MAP_VERSION,
            found: map_data.version,
        });
    }
    map_data.grid.validate()?;
    Ok(map_data)
}
