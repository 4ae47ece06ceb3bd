//! Collection codecs
//!
//! Sequences are written as arrays whose children are named by their
//! decimal index; maps as objects whose field names are the map keys.
//! An empty collection is written as Null and a Null slot decodes to an
//! empty collection.

use std::collections::HashMap;
use std::hash::Hash;

use crate::bson::{index_name, BsonCodec, BsonReader, BsonWriter, Tag};
use crate::error::{Error, Result};

/// Encode a sequence of string-valued items
pub fn encode_string_array<T: AsRef<str>>(w: &mut BsonWriter, name: &str, values: &[T]) {
    if values.is_empty() {
        w.write_null(name);
        return;
    }
    w.write_prefix(Tag::Array, name);
    let block = w.begin_block();
    for (i, value) in values.iter().enumerate() {
        w.write_string(&index_name(i), value.as_ref());
    }
    w.end_block(block);
}

/// Decode a sequence of string-valued items, preserving wire order
pub fn decode_string_array<T: From<String>>(
    r: &mut BsonReader<'_>,
    tag: Tag,
    context: &str,
) -> Result<Vec<T>> {
    if !open_sequence(tag, Tag::Array, context)? {
        return Ok(Vec::new());
    }
    let block = r.begin_block(context)?;
    let mut values = Vec::new();
    while let Some((tag, _index)) = r.next_field(context)? {
        if tag != Tag::Binary {
            return Err(Error::unexpected_tag(
                tag as u8,
                format!("{} index {}", context, values.len()),
            ));
        }
        values.push(T::from(r.read_string(tag, context)?));
    }
    r.end_block(block, context)?;
    Ok(values)
}

/// Encode a sequence of records
pub fn encode_object_array<T: BsonCodec>(w: &mut BsonWriter, name: &str, values: &[T]) {
    if values.is_empty() {
        w.write_null(name);
        return;
    }
    w.write_prefix(Tag::Array, name);
    let block = w.begin_block();
    for (i, value) in values.iter().enumerate() {
        value.marshal_bson(w, &index_name(i));
    }
    w.end_block(block);
}

/// Decode a sequence of records, preserving wire order
pub fn decode_object_array<T: BsonCodec + Default>(
    r: &mut BsonReader<'_>,
    tag: Tag,
    context: &str,
) -> Result<Vec<T>> {
    if !open_sequence(tag, Tag::Array, context)? {
        return Ok(Vec::new());
    }
    let block = r.begin_block(context)?;
    let mut values = Vec::new();
    while let Some((tag, _index)) = r.next_field(context)? {
        if tag != Tag::Object {
            return Err(Error::unexpected_tag(
                tag as u8,
                format!("{} index {}", context, values.len()),
            ));
        }
        let mut value = T::default();
        value.unmarshal_bson(r, tag)?;
        values.push(value);
    }
    r.end_block(block, context)?;
    Ok(values)
}

/// Encode a map of records keyed by string.
///
/// Keys are written in sorted order so equal maps encode to equal bytes.
pub fn encode_object_map<K, V>(w: &mut BsonWriter, name: &str, values: &HashMap<K, V>)
where
    K: AsRef<str>,
    V: BsonCodec,
{
    if values.is_empty() {
        w.write_null(name);
        return;
    }
    w.write_prefix(Tag::Object, name);
    let block = w.begin_block();
    for (key, value) in sorted_entries(values) {
        value.marshal_bson(w, key);
    }
    w.end_block(block);
}

/// Decode a map of records keyed by string; a repeated key keeps the last value
pub fn decode_object_map<K, V>(
    r: &mut BsonReader<'_>,
    tag: Tag,
    context: &str,
) -> Result<HashMap<K, V>>
where
    K: From<String> + Eq + Hash,
    V: BsonCodec + Default,
{
    if !open_sequence(tag, Tag::Object, context)? {
        return Ok(HashMap::new());
    }
    let block = r.begin_block(context)?;
    let mut values = HashMap::new();
    while let Some((tag, key)) = r.next_field(context)? {
        if tag != Tag::Object {
            return Err(Error::unexpected_tag(tag as u8, format!("{} key {}", context, key)));
        }
        let mut value = V::default();
        value.unmarshal_bson(r, tag)?;
        values.insert(K::from(key.to_string()), value);
    }
    r.end_block(block, context)?;
    Ok(values)
}

/// Encode a map of strings keyed by string, keys in sorted order
pub fn encode_string_map<K, V>(w: &mut BsonWriter, name: &str, values: &HashMap<K, V>)
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if values.is_empty() {
        w.write_null(name);
        return;
    }
    w.write_prefix(Tag::Object, name);
    let block = w.begin_block();
    for (key, value) in sorted_entries(values) {
        w.write_string(key, value.as_ref());
    }
    w.end_block(block);
}

/// Decode a map of strings keyed by string; a repeated key keeps the last value.
///
/// Entries whose value is Null are dropped.
pub fn decode_string_map<K, V>(
    r: &mut BsonReader<'_>,
    tag: Tag,
    context: &str,
) -> Result<HashMap<K, V>>
where
    K: From<String> + Eq + Hash,
    V: From<String>,
{
    if !open_sequence(tag, Tag::Object, context)? {
        return Ok(HashMap::new());
    }
    let block = r.begin_block(context)?;
    let mut values = HashMap::new();
    while let Some((tag, key)) = r.next_field(context)? {
        match tag {
            Tag::String | Tag::Binary => {
                let value = r.read_string(tag, context)?;
                values.insert(K::from(key.to_string()), V::from(value));
            }
            // A Null value carries no entry.
            Tag::Null => {}
            other => {
                return Err(Error::unexpected_tag(
                    other as u8,
                    format!("{} key {}", context, key),
                ))
            }
        }
    }
    r.end_block(block, context)?;
    Ok(values)
}

/// Check the tag of a collection slot; false means the slot is Null
fn open_sequence(tag: Tag, expected: Tag, context: &str) -> Result<bool> {
    match tag {
        Tag::Null => Ok(false),
        t if t == expected => Ok(true),
        other => Err(Error::unexpected_tag(other as u8, context)),
    }
}

fn sorted_entries<K: AsRef<str>, V>(values: &HashMap<K, V>) -> Vec<(&str, &V)> {
    let mut entries: Vec<(&str, &V)> = values.iter().map(|(k, v)| (k.as_ref(), v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
