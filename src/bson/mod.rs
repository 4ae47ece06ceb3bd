//! Self-describing binary document format
//!
//! A BSON-compatible subset: every value is a one-byte [`Tag`], a
//! NUL-terminated field name and a body. Objects and arrays are
//! length-prefixed blocks, so a reader can skip any field it does not
//! recognise without understanding it.

mod tag;
mod writer;
mod reader;
mod collections;

pub use tag::Tag;
pub use writer::{index_name, BsonWriter, LenWriter};
pub use reader::{verify_object, Block, BsonReader, DEFAULT_MAX_DEPTH};
pub use collections::{
    decode_object_array, decode_object_map, decode_string_array, decode_string_map,
    encode_object_array, encode_object_map, encode_string_array, encode_string_map,
};

use crate::error::Result;

/// Encode/decode capability of a record type.
///
/// `marshal_bson` appends the value under `key`; an empty key writes a
/// top-level document without tag or name. `unmarshal_bson` is called
/// with the tag that preceded the value and must consume exactly the
/// value's bytes, populating `self` in place.
pub trait BsonCodec {
    /// Append this value to `w` under the field name `key`
    fn marshal_bson(&self, w: &mut BsonWriter, key: &str);

    /// Populate this value from `r`, whose next bytes are a value of kind `tag`
    fn unmarshal_bson(&mut self, r: &mut BsonReader<'_>, tag: Tag) -> Result<()>;
}
