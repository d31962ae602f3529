//! `kern` table: horizontal pair adjustments.
//!
//! Only the Windows-style (version 0) table with format-0 horizontal
//! subtables is read. Other subtables are skipped using their declared
//! length.

use std::collections::BTreeMap;

use super::reader::{read_i16, read_u16};
use crate::error::{FontError, Result};

const COVERAGE_HORIZONTAL: u16 = 0x0001;
const COVERAGE_MINIMUM: u16 = 0x0002;
const COVERAGE_CROSS_STREAM: u16 = 0x0004;

#[derive(Debug, Clone, Default)]
pub struct KerningTable {
    /// (left << 16) | right → adjustment in font units
    pairs: BTreeMap<u32, i16>,
}

fn pair_key(left: u16, right: u16) -> u32 {
    ((left as u32) << 16) | right as u32
}

impl KerningTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pairs = BTreeMap::new();
        let version = read_u16(data, 0)?;
        if version != 0 {
            log::debug!("skipping kern table version {}", version);
            return Ok(Self { pairs });
        }

        let num_tables = read_u16(data, 2)?;
        let mut pos = 4;
        for _ in 0..num_tables {
            let length = read_u16(data, pos + 2)? as usize;
            let coverage = read_u16(data, pos + 4)?;
            let format = coverage >> 8;

            let wanted = format == 0
                && coverage & COVERAGE_HORIZONTAL != 0
                && coverage & (COVERAGE_MINIMUM | COVERAGE_CROSS_STREAM) == 0;
            if wanted {
                let n_pairs = read_u16(data, pos + 6)? as usize;
                let body = pos + 14;
                for i in 0..n_pairs {
                    let rec = body + i * 6;
                    let left = read_u16(data, rec)?;
                    let right = read_u16(data, rec + 2)?;
                    let value = read_i16(data, rec + 4)?;
                    pairs.insert(pair_key(left, right), value);
                }
            } else {
                log::debug!("skipping kern subtable with coverage 0x{:04X}", coverage);
            }

            if length < 6 {
                return Err(FontError::format("kern subtable length too small"));
            }
            pos += length;
        }

        Ok(Self { pairs })
    }

    /// Adjustment between `left` and `right`, in font units. Not symmetric.
    pub fn kern_value(&self, left: u16, right: u16) -> i16 {
        self.pairs.get(&pair_key(left, right)).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
