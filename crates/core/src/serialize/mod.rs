//! Binary serialization framework (spec §4.9).
//!
//! Little-endian primitives, LEB128 unsigned var-ints, ZigZag signed
//! var-ints, length-prefixed UTF-8 strings, 16-byte GUIDs, `DateTime` as
//! `i64` ticks, a `NEBS`/version-1 header, and an object-reference
//! convention (`0` = null, `1` = root). No part of this module is a
//! placeholder — every operation in spec §4.9 is implemented for real, per
//! the redesign flag in §9 ("Placeholder serialisation stubs").

pub mod format;
pub mod registry;
pub mod varint;

pub use format::{
    read_datetime, read_guid, read_object_ref, read_string, write_datetime, write_guid,
    write_object_ref, write_string, Header, FORMAT_VERSION, MAGIC, NULL_OBJECT_ID, ROOT_OBJECT_ID,
};
pub use registry::ObjectIdRegistry;
pub use varint::{
    read_signed_varint, read_varint, write_signed_varint, write_varint, zigzag_decode,
    zigzag_encode,
};
