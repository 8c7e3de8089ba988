use chrono::{DateTime, Utc};

use crate::store::table::Collection;

const INDEX_VALUE_TERMINATOR: u8 = 0x00;
const INDEX_VALUE_ESCAPE: u8 = 0x01;

pub fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn decode_id(raw: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = raw.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

pub fn sequence_key(collection: Collection) -> String {
    format!("seq:{}", collection.as_str())
}

/// `{field}={value}\0{id:be64}`; ids sort numerically inside one value.
///
/// Inside `value`, `0x00` is written as `0x01 0x01` and `0x01` as `0x01 0x02`,
/// so the terminator only ever ends the value and byte order is preserved.
pub fn index_key(field: &str, value: &str, id: u64) -> Vec<u8> {
    let mut key = index_prefix(field, value);
    key.extend_from_slice(&id_key(id));
    key
}

pub fn index_prefix(field: &str, value: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(field.len() + value.len() + 10);
    key.extend_from_slice(field.as_bytes());
    key.push(b'=');
    push_escaped(&mut key, value);
    key.push(INDEX_VALUE_TERMINATOR);
    key
}

fn push_escaped(key: &mut Vec<u8>, value: &str) {
    for &byte in value.as_bytes() {
        match byte {
            INDEX_VALUE_TERMINATOR => key.extend_from_slice(&[INDEX_VALUE_ESCAPE, 0x01]),
            INDEX_VALUE_ESCAPE => key.extend_from_slice(&[INDEX_VALUE_ESCAPE, 0x02]),
            other => key.push(other),
        }
    }
}

pub fn index_field_prefix(field: &str) -> Vec<u8> {
    format!("{}=", field).into_bytes()
}

/// Exclusive upper bound covering every entry of `field` whose value is `<= value`.
pub fn index_upper_bound(field: &str, value: &str) -> Vec<u8> {
    let mut key = index_field_prefix(field);
    push_escaped(&mut key, value);
    key.push(INDEX_VALUE_TERMINATOR + 1);
    key
}

pub fn id_from_index_key(key: &[u8]) -> Option<u64> {
    if key.len() < 8 {
        return None;
    }
    decode_id(&key[key.len() - 8..])
}

/// Zero-padded millis so lexical order equals chronological order.
pub fn timestamp_value(at: DateTime<Utc>) -> String {
    format!("{:020}", at.timestamp_millis().max(0) as u64)
}

pub fn id_value(id: u64) -> String {
    format!("{:020}", id)
}

pub fn bool_value(flag: bool) -> String {
    let value = if flag { "1" } else { "0" };
    value.to_string()
}

pub fn wrong_answer_key(sequence: u64) -> [u8; 8] {
    sequence.to_be_bytes()
}
