//! The shared keyspace: typed values with lazy expiration.
//!
//! Every operation takes the map lock exactly once, so a read-modify-write on
//! a key (for instance a list push) is never interleaved with another command
//! touching the same key. Expired keys are removed by whichever operation
//! touches them first.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;
use tokio::time::Instant;

use crate::stream::{Stream, StreamEntry, StreamId, StreamIdError, StreamIdSpec};

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("operation against a key holding the wrong kind of value")]
    WrongType,
    #[error(transparent)]
    InvalidStreamId(#[from] StreamIdError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Stream(Stream),
}

impl DataType {
    /// Name reported by the TYPE command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn with_expiration(data: DataType, expiration: Instant) -> Self {
        Self {
            data,
            expiration: Some(expiration),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expiration, Some(expiration) if expiration <= now)
    }
}

/// Which end of a list a push targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListEnd {
    Head,
    Tail,
}

#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the map and drops `key` first if it has expired.
    fn lock_live(&self, key: &str) -> MutexGuard<'_, HashMap<String, Value>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if entries
            .get(key)
            .is_some_and(|value| value.is_expired(Instant::now()))
        {
            entries.remove(key);
        }

        entries
    }

    /// Returns a copy of the live value stored at `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock_live(key).get(key).cloned()
    }

    /// Stores `value` at `key`, replacing whatever was there regardless of type.
    pub fn set(&self, key: String, value: Value) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Removes `key`, returning whether a live value was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.lock_live(key).remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|value| !value.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.lock_live(key).get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::String(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub fn type_name(&self, key: &str) -> Option<&'static str> {
        self.lock_live(key)
            .get(key)
            .map(|value| value.data.type_name())
    }

    /// Pushes `values` one at a time onto the chosen end of the list at `key`,
    /// creating the list when absent. Returns the resulting length.
    pub fn push_list(&self, key: &str, values: &[String], end: ListEnd) -> Result<usize, StoreError> {
        let mut entries = self.lock_live(key);

        if values.is_empty() {
            return match entries.get(key) {
                None => Ok(0),
                Some(Value {
                    data: DataType::List(list),
                    ..
                }) => Ok(list.len()),
                Some(_) => Err(StoreError::WrongType),
            };
        }

        let value = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::new(DataType::List(VecDeque::new())));

        let DataType::List(ref mut list) = value.data else {
            return Err(StoreError::WrongType);
        };

        for item in values {
            match end {
                ListEnd::Head => list.push_front(item.clone()),
                ListEnd::Tail => list.push_back(item.clone()),
            }
        }

        Ok(list.len())
    }

    /// Removes up to `count` elements from the head of the list at `key`.
    ///
    /// Returns `None` when the key is absent. A list drained to empty is
    /// removed from the store.
    pub fn pop_list_front(&self, key: &str, count: usize) -> Result<Option<Vec<String>>, StoreError> {
        let mut entries = self.lock_live(key);

        let Some(value) = entries.get_mut(key) else {
            return Ok(None);
        };

        let DataType::List(ref mut list) = value.data else {
            return Err(StoreError::WrongType);
        };

        let take = count.min(list.len());
        let popped = list.drain(..take).collect::<Vec<String>>();

        if list.is_empty() {
            entries.remove(key);
        }

        Ok(Some(popped))
    }

    /// Removes the head element of the list at `key`, if there is one.
    pub fn pop_list_head(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .pop_list_front(key, 1)?
            .and_then(|mut popped| popped.pop()))
    }

    pub fn list_len(&self, key: &str) -> Result<usize, StoreError> {
        match self.lock_live(key).get(key) {
            None => Ok(0),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(list.len()),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Returns the elements between the normalized `start` and `stop` indexes,
    /// both inclusive. Negative indexes count back from the tail.
    pub fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let entries = self.lock_live(key);

        let list = match entries.get(key) {
            None => return Ok(Vec::new()),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => list,
            Some(_) => return Err(StoreError::WrongType),
        };

        let Some((start, stop)) = normalize_range_indexes(list.len(), start, stop) else {
            return Ok(Vec::new());
        };

        Ok(list.range(start..=stop).cloned().collect())
    }

    /// Appends an entry to the stream at `key`, creating the stream when absent.
    /// The id is resolved and validated against the stream's last entry under
    /// the same lock that performs the append.
    pub fn append_stream(
        &self,
        key: &str,
        id_spec: StreamIdSpec,
        pairs: &[String],
    ) -> Result<StreamId, StoreError> {
        let mut entries = self.lock_live(key);

        if !entries.contains_key(key) {
            let mut stream = Stream::new();
            let id = stream.next_id(id_spec)?;
            stream.push(StreamEntry::new(id, pairs));
            entries.insert(key.to_string(), Value::new(DataType::Stream(stream)));

            return Ok(id);
        }

        let Some(Value {
            data: DataType::Stream(stream),
            ..
        }) = entries.get_mut(key)
        else {
            return Err(StoreError::WrongType);
        };

        let id = stream.next_id(id_spec)?;
        stream.push(StreamEntry::new(id, pairs));

        Ok(id)
    }

    pub fn stream_range(
        &self,
        key: &str,
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        match self.lock_live(key).get(key) {
            None => Ok(Vec::new()),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(stream.range(start, end, count)),
            Some(_) => Err(StoreError::WrongType),
        }
    }
}

/// Normalizes LRANGE-style indexes against a list of length `len`.
///
/// Negative indexes count from the end (-1 is the last element). Both are
/// clamped into the list, so a stop before the head selects the first
/// element. Returns `None` for an empty selection.
pub fn normalize_range_indexes(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;

    if len == 0 {
        return None;
    }

    let start = if start < 0 { len + start } else { start }.max(0);
    let stop = if stop < 0 { (len + stop).max(0) } else { stop }.min(len - 1);

    if start >= len || start > stop {
        return None;
    }

    Some((start as usize, stop as usize))
}
