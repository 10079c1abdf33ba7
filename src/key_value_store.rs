//! The keyed data store.
//!
//! One global mapping from key to a typed value (string, list or stream)
//! with a per-key expiry policy. Expiry is enforced lazily: a key is
//! evicted when an access finds it past its deadline, never by a
//! background sweep. Operations on a key holding a different type than
//! expected fail with [`StoreError::WrongType`] instead of coercing.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt,
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    StreamIdNotAllowed,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdLower,
    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidStreamId,
}

/// A stream entry id: millisecond timestamp plus a sequence number,
/// compared lexicographically. `0-0` is never a valid stored id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };

    pub fn new(ms: u64, seq: u64) -> Self {
        StreamId { ms, seq }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (ms, seq) = input.split_once('-').ok_or(StoreError::InvalidStreamId)?;

        Ok(StreamId {
            ms: ms.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)?,
            seq: seq.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)?,
        })
    }
}

/// Field-value pairs of one stream entry, in insertion order.
pub type StreamFields = Vec<(String, String)>;

pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Stream(BTreeMap<StreamId, StreamFields>),
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
        }
    }
}

/// When a stored value stops being visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpiryPolicy {
    NoExpiry,
    RelativeTtl(Duration),
    AbsoluteDeadline(SystemTime),
}

impl ExpiryPolicy {
    fn is_expired(&self, created_at: SystemTime) -> bool {
        match self {
            ExpiryPolicy::NoExpiry => false,
            ExpiryPolicy::RelativeTtl(ttl) => match created_at.checked_add(*ttl) {
                Some(deadline) => SystemTime::now() > deadline,
                None => false,
            },
            ExpiryPolicy::AbsoluteDeadline(deadline) => SystemTime::now() > *deadline,
        }
    }
}

pub struct StoredValue {
    pub data: DataType,
    created_at: SystemTime,
    expiry: ExpiryPolicy,
}

impl StoredValue {
    pub fn new(data: DataType, expiry: ExpiryPolicy) -> Self {
        StoredValue {
            data,
            created_at: SystemTime::now(),
            expiry,
        }
    }

    fn is_expired(&self) -> bool {
        self.expiry.is_expired(self.created_at)
    }
}

#[derive(Default)]
pub struct KeyValueStore {
    entries: HashMap<String, StoredValue>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        KeyValueStore {
            entries: HashMap::new(),
        }
    }

    /// Evicts `key` if its expiry has elapsed, so callers only ever see
    /// live entries.
    fn evict_if_expired(&mut self, key: &str) {
        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired())
        {
            self.entries.remove(key);
        }
    }

    fn live_entry(&mut self, key: &str) -> Option<&StoredValue> {
        self.evict_if_expired(key);
        self.entries.get(key)
    }

    fn live_entry_mut(&mut self, key: &str) -> Option<&mut StoredValue> {
        self.evict_if_expired(key);
        self.entries.get_mut(key)
    }

    pub fn contains_key(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    pub fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        match self.live_entry(key) {
            Some(value) => match &value.data {
                DataType::String(s) => Ok(Some(s.clone())),
                _ => Err(StoreError::WrongType),
            },
            None => Ok(None),
        }
    }

    pub fn set(&mut self, key: String, value: String, expiry: ExpiryPolicy) {
        self.entries
            .insert(key, StoredValue::new(DataType::String(value), expiry));
    }

    /// Appends `values` to the back of the list at `key`, creating the
    /// list when absent. Returns the new length.
    pub fn append(&mut self, key: &str, values: Vec<String>) -> Result<usize, StoreError> {
        self.push(key, values, false)
    }

    /// Pushes `values` to the front of the list at `key`, one at a time
    /// in call order, creating the list when absent. Returns the new
    /// length.
    pub fn prepend(&mut self, key: &str, values: Vec<String>) -> Result<usize, StoreError> {
        self.push(key, values, true)
    }

    fn push(
        &mut self,
        key: &str,
        values: Vec<String>,
        to_front: bool,
    ) -> Result<usize, StoreError> {
        self.evict_if_expired(key);

        let value = self.entries.entry(key.to_string()).or_insert_with(|| {
            StoredValue::new(DataType::List(VecDeque::new()), ExpiryPolicy::NoExpiry)
        });

        let DataType::List(ref mut list) = value.data else {
            return Err(StoreError::WrongType);
        };

        for value in values {
            if to_front {
                list.push_front(value);
            } else {
                list.push_back(value);
            }
        }

        Ok(list.len())
    }

    /// Inclusive range over the list at `key`. Negative indices count
    /// from the end; out-of-range bounds clamp. An absent key yields an
    /// empty result.
    pub fn range(
        &mut self,
        key: &str,
        start_index: isize,
        end_index: isize,
    ) -> Result<Vec<String>, StoreError> {
        let Some(value) = self.live_entry(key) else {
            return Ok(Vec::new());
        };

        let DataType::List(ref list) = value.data else {
            return Err(StoreError::WrongType);
        };

        let len = list.len() as isize;

        let start = if start_index < 0 {
            len + start_index
        } else {
            start_index
        }
        .max(0);
        let end = if end_index < 0 {
            len + end_index
        } else {
            end_index
        }
        .min(len - 1);

        if start >= len || start > end {
            return Ok(Vec::new());
        }

        Ok(list
            .range(start as usize..=end as usize)
            .cloned()
            .collect::<Vec<String>>())
    }

    pub fn list_len(&mut self, key: &str) -> Result<usize, StoreError> {
        match self.live_entry(key) {
            Some(value) => match &value.data {
                DataType::List(list) => Ok(list.len()),
                _ => Err(StoreError::WrongType),
            },
            None => Ok(0),
        }
    }

    /// Removes and returns up to `count` elements from the front of the
    /// list at `key`. `Ok(None)` means the key does not exist, as
    /// opposed to a present list yielding fewer (or zero) elements. A
    /// list drained to empty is removed from the keyspace.
    pub fn pop_front(
        &mut self,
        key: &str,
        count: usize,
    ) -> Result<Option<Vec<String>>, StoreError> {
        let Some(value) = self.live_entry_mut(key) else {
            return Ok(None);
        };

        let DataType::List(ref mut list) = value.data else {
            return Err(StoreError::WrongType);
        };

        let mut popped = Vec::with_capacity(count.min(list.len()));

        for _ in 0..count {
            match list.pop_front() {
                Some(element) => popped.push(element),
                None => break,
            }
        }

        if list.is_empty() {
            self.entries.remove(key);
        }

        Ok(Some(popped))
    }

    /// Parses the string at `key` as an integer, stores and returns the
    /// incremented value. An absent key is created at 1.
    pub fn increment(&mut self, key: &str) -> Result<i64, StoreError> {
        match self.live_entry_mut(key) {
            Some(value) => match value.data {
                DataType::String(ref mut s) => {
                    let current = s.parse::<i64>().map_err(|_| StoreError::NotAnInteger)?;
                    let updated = current.checked_add(1).ok_or(StoreError::NotAnInteger)?;
                    *s = updated.to_string();
                    Ok(updated)
                }
                _ => Err(StoreError::WrongType),
            },
            None => {
                self.set(key.to_string(), "1".to_string(), ExpiryPolicy::NoExpiry);
                Ok(1)
            }
        }
    }

    pub fn type_name(&mut self, key: &str) -> &'static str {
        match self.live_entry(key) {
            Some(value) => value.data.type_name(),
            None => "none",
        }
    }

    /// Removes every existing key in `keys`, returning how many were
    /// removed. Expired keys do not count.
    pub fn delete(&mut self, keys: &[String]) -> usize {
        keys.iter()
            .filter(|key| {
                self.evict_if_expired(key);
                self.entries.remove(key.as_str()).is_some()
            })
            .count()
    }

    /// Appends an entry to the stream at `key`, resolving `*` and
    /// `ts-*` wildcards in `requested_id` against the stream's last id.
    /// Returns the resolved id of the stored entry.
    pub fn add_stream_entry(
        &mut self,
        key: &str,
        requested_id: &str,
        fields: StreamFields,
    ) -> Result<StreamId, StoreError> {
        let requested = RequestedStreamId::parse(requested_id)?;
        let last_id = self.last_stream_id(key)?;
        let resolved = requested.resolve(last_id);

        if resolved == StreamId::MIN {
            return Err(StoreError::StreamIdNotAllowed);
        }

        if last_id.is_some_and(|last| resolved <= last) {
            return Err(StoreError::StreamIdLower);
        }

        let value = self.entries.entry(key.to_string()).or_insert_with(|| {
            StoredValue::new(DataType::Stream(BTreeMap::new()), ExpiryPolicy::NoExpiry)
        });

        let DataType::Stream(ref mut stream) = value.data else {
            return Err(StoreError::WrongType);
        };

        stream.insert(resolved, fields);

        Ok(resolved)
    }

    /// The id of the newest entry in the stream at `key`, if any.
    pub fn last_stream_id(&mut self, key: &str) -> Result<Option<StreamId>, StoreError> {
        match self.live_entry(key) {
            Some(value) => match &value.data {
                DataType::Stream(stream) => Ok(stream.keys().next_back().copied()),
                _ => Err(StoreError::WrongType),
            },
            None => Ok(None),
        }
    }

    /// Entries of the stream at `key` within the normalized
    /// `[start, end)` window described by the raw XRANGE bounds: `-` is
    /// the minimum id, `+` the maximum, and a bare timestamp covers the
    /// whole timestamp (inclusive on both sides of the command).
    pub fn stream_range(
        &mut self,
        key: &str,
        raw_start: &str,
        raw_end: &str,
    ) -> Result<Vec<(StreamId, StreamFields)>, StoreError> {
        let start = parse_range_start(raw_start)?;
        let end_exclusive = parse_range_end_exclusive(raw_end)?;

        let Some(value) = self.live_entry(key) else {
            return Ok(Vec::new());
        };

        let DataType::Stream(ref stream) = value.data else {
            return Err(StoreError::WrongType);
        };

        Ok(stream
            .range(start..)
            .take_while(|(id, _)| match end_exclusive {
                Some(end) => **id < end,
                None => true,
            })
            .map(|(id, fields)| (*id, fields.clone()))
            .collect())
    }

    /// Entries of the stream at `key` with ids strictly greater than
    /// `after`. An absent key yields an empty result.
    pub fn entries_after(
        &mut self,
        key: &str,
        after: StreamId,
    ) -> Result<Vec<(StreamId, StreamFields)>, StoreError> {
        let Some(value) = self.live_entry(key) else {
            return Ok(Vec::new());
        };

        let DataType::Stream(ref stream) = value.data else {
            return Err(StoreError::WrongType);
        };

        Ok(stream
            .iter()
            .filter(|(id, _)| **id > after)
            .map(|(id, fields)| (*id, fields.clone()))
            .collect())
    }
}

/// An XADD id argument before resolution against the stream.
enum RequestedStreamId {
    /// `*`: timestamp is the current wall clock, sequence auto.
    Auto,
    /// `ts-*`: explicit timestamp, sequence auto.
    PartialAuto { ms: u64 },
    Literal(StreamId),
}

impl RequestedStreamId {
    fn parse(raw: &str) -> Result<Self, StoreError> {
        if raw == "*" {
            return Ok(RequestedStreamId::Auto);
        }

        let shape = Regex::new(r"^\d+-(\d+|\*)$").unwrap();

        if !shape.is_match(raw) {
            return Err(StoreError::InvalidStreamId);
        }

        if raw == "0-0" {
            return Err(StoreError::StreamIdNotAllowed);
        }

        let (ms, seq) = raw.split_once('-').ok_or(StoreError::InvalidStreamId)?;
        let ms = ms.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)?;

        if seq == "*" {
            return Ok(RequestedStreamId::PartialAuto { ms });
        }

        let seq = seq.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)?;

        Ok(RequestedStreamId::Literal(StreamId::new(ms, seq)))
    }

    fn resolve(&self, last_id: Option<StreamId>) -> StreamId {
        match *self {
            RequestedStreamId::Literal(id) => id,
            RequestedStreamId::Auto => {
                RequestedStreamId::PartialAuto {
                    ms: unix_time_millis(),
                }
                .resolve(last_id)
            }
            RequestedStreamId::PartialAuto { ms } => {
                let seq = match last_id {
                    Some(last) if last.ms == ms => last.seq + 1,
                    Some(_) => 0,
                    // Brand-new stream: timestamp 0 starts at sequence 1
                    // so 0-0 can never be produced.
                    None => {
                        if ms == 0 {
                            1
                        } else {
                            0
                        }
                    }
                };

                StreamId::new(ms, seq)
            }
        }
    }
}

fn parse_range_start(raw: &str) -> Result<StreamId, StoreError> {
    if raw == "-" {
        return Ok(StreamId::MIN);
    }

    match parse_range_bound(raw)? {
        (ms, Some(seq)) => Ok(StreamId::new(ms, seq)),
        (ms, None) => Ok(StreamId::new(ms, 0)),
    }
}

/// Converts an inclusive XRANGE end bound into the first excluded id.
/// `None` means the range is unbounded (`+`).
fn parse_range_end_exclusive(raw: &str) -> Result<Option<StreamId>, StoreError> {
    if raw == "+" {
        return Ok(None);
    }

    match parse_range_bound(raw)? {
        (ms, Some(seq)) => match seq.checked_add(1) {
            Some(next_seq) => Ok(Some(StreamId::new(ms, next_seq))),
            None => Ok(ms.checked_add(1).map(|next_ms| StreamId::new(next_ms, 0))),
        },
        (ms, None) => Ok(ms.checked_add(1).map(|next_ms| StreamId::new(next_ms, 0))),
    }
}

fn parse_range_bound(raw: &str) -> Result<(u64, Option<u64>), StoreError> {
    let shape = Regex::new(r"^\d+(-\d+)?$").unwrap();

    if !shape.is_match(raw) {
        return Err(StoreError::InvalidStreamId);
    }

    match raw.split_once('-') {
        Some((ms, seq)) => Ok((
            ms.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)?,
            Some(seq.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)?),
        )),
        None => Ok((
            raw.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)?,
            None,
        )),
    }
}

fn unix_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::{
        DataType, ExpiryPolicy, KeyValueStore, StoreError, StoredValue, StreamId,
    };

    fn stream_fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_get_and_set() {
        let mut store = KeyValueStore::new();

        assert_eq!(store.get("fruit"), Ok(None));

        store.set("fruit".to_string(), "pear".to_string(), ExpiryPolicy::NoExpiry);
        assert_eq!(store.get("fruit"), Ok(Some("pear".to_string())));
    }

    #[test]
    fn test_get_on_list_is_wrong_type() {
        let mut store = KeyValueStore::new();
        store.append("fruits", vec!["pear".to_string()]).unwrap();

        assert_eq!(store.get("fruits"), Err(StoreError::WrongType));
    }

    #[test]
    fn test_expired_key_is_lazily_evicted() {
        let mut store = KeyValueStore::new();

        let mut value = StoredValue::new(
            DataType::String("pear".to_string()),
            ExpiryPolicy::RelativeTtl(Duration::from_millis(50)),
        );
        value.created_at = SystemTime::now() - Duration::from_millis(200);
        store.entries.insert("fruit".to_string(), value);

        assert_eq!(store.get("fruit"), Ok(None));
        assert!(!store.entries.contains_key("fruit"));
    }

    #[test]
    fn test_absolute_deadline_expiry() {
        let mut store = KeyValueStore::new();

        store.set(
            "past".to_string(),
            "gone".to_string(),
            ExpiryPolicy::AbsoluteDeadline(SystemTime::now() - Duration::from_secs(1)),
        );
        store.set(
            "future".to_string(),
            "kept".to_string(),
            ExpiryPolicy::AbsoluteDeadline(SystemTime::now() + Duration::from_secs(60)),
        );

        assert_eq!(store.get("past"), Ok(None));
        assert_eq!(store.get("future"), Ok(Some("kept".to_string())));
    }

    #[test]
    fn test_no_expiry_key_survives_old_creation() {
        let mut store = KeyValueStore::new();

        let mut value = StoredValue::new(
            DataType::String("pear".to_string()),
            ExpiryPolicy::NoExpiry,
        );
        value.created_at = SystemTime::now() - Duration::from_secs(3600);
        store.entries.insert("fruit".to_string(), value);

        assert_eq!(store.get("fruit"), Ok(Some("pear".to_string())));
    }

    #[test]
    fn test_append_and_prepend() {
        let mut store = KeyValueStore::new();

        assert_eq!(
            store.append("fruits", vec!["pear".to_string(), "apple".to_string()]),
            Ok(2)
        );
        assert_eq!(
            store.prepend("fruits", vec!["mango".to_string(), "grape".to_string()]),
            Ok(4)
        );

        // Prepends land one at a time, so the last value ends up first.
        assert_eq!(
            store.range("fruits", 0, -1),
            Ok(vec![
                "grape".to_string(),
                "mango".to_string(),
                "pear".to_string(),
                "apple".to_string(),
            ])
        );
    }

    #[test]
    fn test_push_on_string_is_wrong_type() {
        let mut store = KeyValueStore::new();
        store.set("key".to_string(), "value".to_string(), ExpiryPolicy::NoExpiry);

        assert_eq!(
            store.append("key", vec!["x".to_string()]),
            Err(StoreError::WrongType)
        );
        assert_eq!(
            store.prepend("key", vec!["x".to_string()]),
            Err(StoreError::WrongType)
        );
    }

    #[test]
    fn test_range_index_handling() {
        let mut store = KeyValueStore::new();
        store
            .append(
                "fruits",
                vec![
                    "grape".to_string(),
                    "apple".to_string(),
                    "pineapple".to_string(),
                    "mango".to_string(),
                    "raspberry".to_string(),
                ],
            )
            .unwrap();

        let test_cases = vec![
            (0, 2, vec!["grape", "apple", "pineapple"]),
            (1, 3, vec!["apple", "pineapple", "mango"]),
            (2, 9, vec!["pineapple", "mango", "raspberry"]),
            (2, 1, vec![]),
            (5, 6, vec![]),
            (-1, -1, vec!["raspberry"]),
            (-2, -1, vec!["mango", "raspberry"]),
            (-9, -2, vec!["grape", "apple", "pineapple", "mango"]),
            (-2, -10, vec![]),
        ];

        for (start, end, expected) in test_cases {
            assert_eq!(
                store.range("fruits", start, end),
                Ok(expected
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<String>>()),
                "range({}, {})",
                start,
                end
            );
        }

        assert_eq!(store.range("missing", 0, -1), Ok(Vec::new()));
    }

    #[test]
    fn test_pop_front_distinguishes_missing_key() {
        let mut store = KeyValueStore::new();

        assert_eq!(store.pop_front("missing", 1), Ok(None));

        store
            .append("fruits", vec!["pear".to_string(), "apple".to_string()])
            .unwrap();

        assert_eq!(
            store.pop_front("fruits", 1),
            Ok(Some(vec!["pear".to_string()]))
        );
        assert_eq!(
            store.pop_front("fruits", 5),
            Ok(Some(vec!["apple".to_string()]))
        );

        // The drained list is gone from the keyspace entirely.
        assert_eq!(store.pop_front("fruits", 1), Ok(None));
        assert_eq!(store.type_name("fruits"), "none");
    }

    #[test]
    fn test_increment() {
        let mut store = KeyValueStore::new();

        assert_eq!(store.increment("counter"), Ok(1));
        assert_eq!(store.increment("counter"), Ok(2));
        assert_eq!(store.get("counter"), Ok(Some("2".to_string())));

        store.set("word".to_string(), "pear".to_string(), ExpiryPolicy::NoExpiry);
        assert_eq!(store.increment("word"), Err(StoreError::NotAnInteger));

        store.append("list", vec!["x".to_string()]).unwrap();
        assert_eq!(store.increment("list"), Err(StoreError::WrongType));
    }

    #[test]
    fn test_delete() {
        let mut store = KeyValueStore::new();
        store.set("a".to_string(), "1".to_string(), ExpiryPolicy::NoExpiry);
        store.set("b".to_string(), "2".to_string(), ExpiryPolicy::NoExpiry);

        assert_eq!(
            store.delete(&[
                "a".to_string(),
                "missing".to_string(),
                "b".to_string()
            ]),
            2
        );
        assert_eq!(store.get("a"), Ok(None));
    }

    #[test]
    fn test_type_name() {
        let mut store = KeyValueStore::new();
        store.set("s".to_string(), "v".to_string(), ExpiryPolicy::NoExpiry);
        store.append("l", vec!["v".to_string()]).unwrap();
        store
            .add_stream_entry("st", "1-1", stream_fields(&[("temp", "37")]))
            .unwrap();

        assert_eq!(store.type_name("s"), "string");
        assert_eq!(store.type_name("l"), "list");
        assert_eq!(store.type_name("st"), "stream");
        assert_eq!(store.type_name("missing"), "none");
    }

    #[test]
    fn test_stream_id_resolution() {
        let mut store = KeyValueStore::new();
        store
            .add_stream_entry("sensor", "1526919030474-0", stream_fields(&[("temp", "37")]))
            .unwrap();

        let test_cases = vec![
            ("sensor", "stream_id", Err(StoreError::InvalidStreamId)),
            ("sensor", "-1-1", Err(StoreError::InvalidStreamId)),
            ("sensor", "1-invalid", Err(StoreError::InvalidStreamId)),
            ("sensor", "0-0", Err(StoreError::StreamIdNotAllowed)),
            ("fresh", "0-0", Err(StoreError::StreamIdNotAllowed)),
            ("sensor", "1526919030474-0", Err(StoreError::StreamIdLower)),
            ("sensor", "1526919030473-9", Err(StoreError::StreamIdLower)),
            ("sensor", "1526919030474-*", Ok(StreamId::new(1526919030474, 1))),
            ("sensor", "1526919030474-2", Ok(StreamId::new(1526919030474, 2))),
            ("sensor", "1526919030484-*", Ok(StreamId::new(1526919030484, 0))),
            // Brand-new stream: timestamp 0 auto-sequences from 1.
            ("fresh", "0-*", Ok(StreamId::new(0, 1))),
        ];

        for (key, requested_id, expected) in test_cases {
            assert_eq!(
                store.add_stream_entry(key, requested_id, stream_fields(&[("k", "v")])),
                expected,
                "adding id {} to {}",
                requested_id,
                key
            );
        }

        let auto = store
            .add_stream_entry("sensor", "*", stream_fields(&[("k", "v")]))
            .unwrap();
        assert!(auto > StreamId::new(1526919030484, 0));
    }

    #[test]
    fn test_stream_ids_are_strictly_increasing() {
        let mut store = KeyValueStore::new();
        let mut last = StreamId::MIN;

        for requested in ["1-1", "1-*", "5-0", "*", "*"] {
            let id = store
                .add_stream_entry("s", requested, stream_fields(&[("k", "v")]))
                .unwrap();
            assert!(id > last, "{} resolved to non-increasing {}", requested, id);
            last = id;
        }
    }

    #[test]
    fn test_stream_range_bounds() {
        let mut store = KeyValueStore::new();

        for id in ["1-1", "1-2", "2-0", "3-5"] {
            store
                .add_stream_entry("s", id, stream_fields(&[("n", id)]))
                .unwrap();
        }

        let collect_ids = |entries: Vec<(StreamId, Vec<(String, String)>)>| {
            entries
                .into_iter()
                .map(|(id, _)| id.to_string())
                .collect::<Vec<String>>()
        };

        let test_cases = vec![
            ("-", "+", vec!["1-1", "1-2", "2-0", "3-5"]),
            ("1-2", "2-0", vec!["1-2", "2-0"]),
            // Bare timestamps cover the whole timestamp on both ends.
            ("1", "1", vec!["1-1", "1-2"]),
            ("2", "+", vec!["2-0", "3-5"]),
            ("-", "2", vec!["1-1", "1-2", "2-0"]),
            ("4", "+", vec![]),
        ];

        for (start, end, expected) in test_cases {
            assert_eq!(
                collect_ids(store.stream_range("s", start, end).unwrap()),
                expected
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<String>>(),
                "range {} {}",
                start,
                end
            );
        }

        assert_eq!(
            store.stream_range("s", "bogus", "+"),
            Err(StoreError::InvalidStreamId)
        );
        assert_eq!(store.stream_range("missing", "-", "+"), Ok(Vec::new()));
    }

    #[test]
    fn test_entries_after() {
        let mut store = KeyValueStore::new();

        for id in ["1-1", "2-0", "2-1"] {
            store
                .add_stream_entry("s", id, stream_fields(&[("n", id)]))
                .unwrap();
        }

        let after = store.entries_after("s", StreamId::new(2, 0)).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].0, StreamId::new(2, 1));

        assert_eq!(store.entries_after("missing", StreamId::MIN), Ok(Vec::new()));
    }

    #[test]
    fn test_last_stream_id() {
        let mut store = KeyValueStore::new();

        assert_eq!(store.last_stream_id("s"), Ok(None));

        store
            .add_stream_entry("s", "7-3", stream_fields(&[("k", "v")]))
            .unwrap();
        assert_eq!(store.last_stream_id("s"), Ok(Some(StreamId::new(7, 3))));

        store.set("plain".to_string(), "v".to_string(), ExpiryPolicy::NoExpiry);
        assert_eq!(store.last_stream_id("plain"), Err(StoreError::WrongType));
    }
}
