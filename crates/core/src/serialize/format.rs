//! Binary wire format: header, primitives, strings, GUIDs, timestamps,
//! object references (spec §4.9).
//!
//! All multi-byte primitives are little-endian. Strings are length-prefixed
//! UTF-8 with length `-1` denoting `null` (distinct from length `0`, the
//! empty string). `DateTime` is encoded as `i64` ticks (100ns units since
//! `0001-01-01`, .NET's convention, kept for on-wire compatibility with any
//! existing NebulaStore data). Object references are var-ints; `0` is the
//! reserved null reference and `1` is always the root object.

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::varint::{read_varint, write_varint};

/// Magic number identifying a NebulaStore binary payload: ASCII "NEBS".
pub const MAGIC: u32 = 0x4E45_4253;

/// Current binary format version.
pub const FORMAT_VERSION: u32 = 1;

/// Object reference value reserved to mean "no object".
pub const NULL_OBJECT_ID: u64 = 0;

/// Object id of the root object (spec §4.9, §6).
pub const ROOT_OBJECT_ID: u64 = 1;

/// Header present at the start of every NebulaStore binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Format version this payload was written with.
    pub format_version: u32,
}

impl Header {
    /// The current header.
    pub fn current() -> Self {
        Header {
            format_version: FORMAT_VERSION,
        }
    }

    /// Write `magic` then `format_version`.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LE>(MAGIC)?;
        w.write_u32::<LE>(self.format_version)
    }

    /// Read and validate the header, rejecting payloads with the wrong
    /// magic or a format version newer than this build understands.
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let magic = r.read_u32::<LE>()?;
        if magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad magic: expected {MAGIC:#x}, got {magic:#x}"),
            ));
        }
        let format_version = r.read_u32::<LE>()?;
        if format_version > FORMAT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "unsupported format version {format_version} (max known {FORMAT_VERSION})"
                ),
            ));
        }
        Ok(Header { format_version })
    }
}

/// Write a length-prefixed UTF-8 string. `None` is encoded as length `-1`.
pub fn write_string<W: Write>(w: &mut W, value: Option<&str>) -> io::Result<()> {
    match value {
        None => w.write_i32::<LE>(-1),
        Some(s) => {
            let bytes = s.as_bytes();
            w.write_i32::<LE>(bytes.len() as i32)?;
            w.write_all(bytes)
        }
    }
}

/// Read a length-prefixed UTF-8 string, inverse of [`write_string`].
pub fn read_string<R: Read>(r: &mut R) -> io::Result<Option<String>> {
    let len = r.read_i32::<LE>()?;
    if len < 0 {
        return Ok(None);
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write a 16-byte GUID.
pub fn write_guid<W: Write>(w: &mut W, value: Uuid) -> io::Result<()> {
    w.write_all(value.as_bytes())
}

/// Read a 16-byte GUID.
pub fn read_guid<R: Read>(r: &mut R) -> io::Result<Uuid> {
    let mut buf = [0u8; 16];
    r.read_exact(&mut buf)?;
    Ok(Uuid::from_bytes(buf))
}

/// Write a `DateTime<Utc>` as `i64` ticks (100ns units since `0001-01-01`).
pub fn write_datetime<W: Write>(w: &mut W, value: DateTime<Utc>) -> io::Result<()> {
    w.write_i64::<LE>(to_ticks(value))
}

/// Read a `DateTime<Utc>` from `i64` ticks.
pub fn read_datetime<R: Read>(r: &mut R) -> io::Result<DateTime<Utc>> {
    from_ticks(r.read_i64::<LE>()?)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "ticks out of range"))
}

/// Write an object reference: a var-int, with `0` reserved for null.
pub fn write_object_ref<W: Write>(w: &mut W, id: Option<u64>) -> io::Result<()> {
    write_varint(w, id.unwrap_or(NULL_OBJECT_ID))
}

/// Read an object reference, inverse of [`write_object_ref`].
pub fn read_object_ref<R: Read>(r: &mut R) -> io::Result<Option<u64>> {
    let id = read_varint(r)?;
    Ok(if id == NULL_OBJECT_ID { None } else { Some(id) })
}

fn epoch() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

fn to_ticks(value: DateTime<Utc>) -> i64 {
    let duration = value.signed_duration_since(epoch());
    duration.num_nanoseconds().unwrap_or(i64::MAX) / 100
}

fn from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    epoch().checked_add_signed(chrono::Duration::nanoseconds(ticks.checked_mul(100)?))
}
