use crate::{
    key_value_store::{StreamFields, StreamId},
    resp::RespValue,
};

/// Converts stream entries to their RESP shape: each entry becomes a
/// 2-element array of `[id, [field1, value1, field2, value2, ...]]`,
/// with fields in insertion order.
pub fn stream_entries_to_resp(entries: &[(StreamId, StreamFields)]) -> RespValue {
    let encoded_entries = entries
        .iter()
        .map(|(id, fields)| {
            let mut flattened = Vec::with_capacity(fields.len() * 2);

            for (field, value) in fields {
                flattened.push(RespValue::BulkString(field.clone()));
                flattened.push(RespValue::BulkString(value.clone()));
            }

            RespValue::Array(vec![
                RespValue::BulkString(id.to_string()),
                RespValue::Array(flattened),
            ])
        })
        .collect::<Vec<RespValue>>();

    RespValue::Array(encoded_entries)
}

/// Converts a collection of streams to the RESP shape XREAD replies
/// with: `[[key, [entries...]], ...]`, in the caller-supplied key order.
pub fn stream_collection_to_resp(
    streams: &[(String, Vec<(StreamId, StreamFields)>)],
) -> RespValue {
    RespValue::Array(
        streams
            .iter()
            .map(|(key, entries)| {
                RespValue::Array(vec![
                    RespValue::BulkString(key.clone()),
                    stream_entries_to_resp(entries),
                ])
            })
            .collect::<Vec<RespValue>>(),
    )
}
