//! `name` table parsing.
//!
//! Only the handful of names needed for PDF embedding and collection lookup
//! are extracted. Windows Unicode English (3/1/0x409) records win; Mac Roman
//! English (1/0/0) records are the fallback.

use serde::Serialize;

use super::encoding::decode_mac_roman;
use super::reader::{read_u16, slice};
use crate::error::Result;

pub const FAMILY: u16 = 1;
pub const SUBFAMILY: u16 = 2;
pub const UNIQUE_ID: u16 = 3;
pub const FULL_NAME: u16 = 4;
pub const POSTSCRIPT_NAME: u16 = 6;

/// Names extracted from the `name` table. Missing names are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontNames {
    pub family: String,
    pub subfamily: String,
    pub unique_id: String,
    pub full_name: String,
    pub postscript_name: String,
}

impl FontNames {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let count = read_u16(data, 2)? as usize;
        let string_offset = read_u16(data, 4)? as usize;

        // Per name id: (windows candidate, mac candidate)
        let mut found: [(Option<String>, Option<String>); 5] = Default::default();

        for i in 0..count {
            let rec = 6 + i * 12;
            let platform_id = read_u16(data, rec)?;
            let encoding_id = read_u16(data, rec + 2)?;
            let language_id = read_u16(data, rec + 4)?;
            let name_id = read_u16(data, rec + 6)?;
            let length = read_u16(data, rec + 8)? as usize;
            let offset = read_u16(data, rec + 10)? as usize;

            let Some(slot) = slot_for(name_id) else {
                continue;
            };
            let windows = platform_id == 3 && encoding_id == 1 && language_id == 0x409;
            let mac = platform_id == 1 && encoding_id == 0 && language_id == 0;
            if !windows && !mac {
                continue;
            }

            let raw = slice(data, string_offset + offset, length)?;
            let entry = &mut found[slot];
            if windows && entry.0.is_none() {
                entry.0 = Some(decode_utf16_be(raw));
            } else if mac && entry.1.is_none() {
                entry.1 = Some(decode_mac_roman(raw));
            }
        }

        let [family, subfamily, unique_id, full_name, postscript_name] =
            found.map(|(win, mac)| win.or(mac).unwrap_or_default());

        Ok(Self {
            family,
            subfamily,
            unique_id,
            full_name,
            postscript_name,
        })
    }

    /// Whether `name` names this font, by family or full name.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        (!self.family.is_empty() && self.family.eq_ignore_ascii_case(name))
            || (!self.full_name.is_empty() && self.full_name.eq_ignore_ascii_case(name))
    }
}

fn slot_for(name_id: u16) -> Option<usize> {
    match name_id {
        FAMILY => Some(0),
        SUBFAMILY => Some(1),
        UNIQUE_ID => Some(2),
        FULL_NAME => Some(3),
        POSTSCRIPT_NAME => Some(4),
        _ => None,
    }
}

fn decode_utf16_be(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
