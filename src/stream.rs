//! Stream values: entry ids, entries and id generation rules.

use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamIdError {
    #[error("The ID specified in XADD must be greater than 0-0")]
    ZeroId,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    NotIncreasing,
    #[error("Invalid stream ID specified as stream command argument")]
    Malformed,
}

/// A `<milliseconds>-<sequence>` stream entry id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub milliseconds: u64,
    pub sequence: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId::new(0, 0);
    pub const MAX: StreamId = StreamId::new(u64::MAX, u64::MAX);

    pub const fn new(milliseconds: u64, sequence: u64) -> Self {
        Self {
            milliseconds,
            sequence,
        }
    }

    /// Parses a range bound as accepted by XRANGE.
    ///
    /// `-` and `+` are the smallest and largest ids. A bare timestamp takes
    /// sequence 0 as a start bound and the largest sequence as an end bound.
    pub fn parse_range_bound(input: &str, is_start: bool) -> Result<Self, StreamIdError> {
        match input {
            "-" => return Ok(StreamId::ZERO),
            "+" => return Ok(StreamId::MAX),
            _ => (),
        }

        match input.split_once('-') {
            Some(_) => input.parse(),
            None => {
                let milliseconds = parse_id_part(input)?;
                let sequence = if is_start { 0 } else { u64::MAX };

                Ok(StreamId::new(milliseconds, sequence))
            }
        }
    }
}

impl FromStr for StreamId {
    type Err = StreamIdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some((milliseconds, sequence)) = input.split_once('-') else {
            return Err(StreamIdError::Malformed);
        };

        Ok(StreamId::new(
            parse_id_part(milliseconds)?,
            parse_id_part(sequence)?,
        ))
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.milliseconds, self.sequence)
    }
}

fn parse_id_part(part: &str) -> Result<u64, StreamIdError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StreamIdError::Malformed);
    }

    part.parse::<u64>().map_err(|_| StreamIdError::Malformed)
}

/// The id argument given to XADD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamIdSpec {
    /// `<ms>-<seq>`
    Explicit(StreamId),
    /// `<ms>-*`
    AutoSequence(u64),
    /// `*`
    Auto,
}

impl FromStr for StreamIdSpec {
    type Err = StreamIdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(StreamIdSpec::Auto);
        }

        if let Some(milliseconds) = input.strip_suffix("-*") {
            return Ok(StreamIdSpec::AutoSequence(parse_id_part(milliseconds)?));
        }

        Ok(StreamIdSpec::Explicit(input.parse()?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(String, String)>,
}

impl StreamEntry {
    /// Builds an entry from flat `field value` pairs. A repeated field keeps its
    /// first position and takes the last value.
    pub fn new(id: StreamId, pairs: &[String]) -> Self {
        let mut fields: Vec<(String, String)> = Vec::with_capacity(pairs.len() / 2);

        for pair in pairs.chunks_exact(2) {
            match fields.iter_mut().find(|(field, _)| *field == pair[0]) {
                Some(existing) => existing.1 = pair[1].clone(),
                None => fields.push((pair[0].clone(), pair[1].clone())),
            }
        }

        Self { id, fields }
    }
}

/// Append-only, id-ordered sequence of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    entries: Vec<StreamEntry>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.entries.last().map(|entry| entry.id)
    }

    /// Resolves the id an XADD with `spec` would receive, enforcing that it is
    /// above 0-0 and above the current last entry.
    pub fn next_id(&self, spec: StreamIdSpec) -> Result<StreamId, StreamIdError> {
        let id = match spec {
            StreamIdSpec::Explicit(id) => id,
            StreamIdSpec::AutoSequence(milliseconds) => self.id_for_timestamp(milliseconds)?,
            StreamIdSpec::Auto => {
                let now = current_unix_time_in_milliseconds();
                let milliseconds = match self.last_id() {
                    Some(last) => now.max(last.milliseconds),
                    None => now,
                };

                self.id_for_timestamp(milliseconds)?
            }
        };

        if id == StreamId::ZERO {
            return Err(StreamIdError::ZeroId);
        }

        match self.last_id() {
            Some(last) if id <= last => Err(StreamIdError::NotIncreasing),
            _ => Ok(id),
        }
    }

    fn id_for_timestamp(&self, milliseconds: u64) -> Result<StreamId, StreamIdError> {
        match self.last_id() {
            Some(last) if last.milliseconds == milliseconds => {
                let sequence = last
                    .sequence
                    .checked_add(1)
                    .ok_or(StreamIdError::NotIncreasing)?;

                Ok(StreamId::new(milliseconds, sequence))
            }
            Some(last) if last.milliseconds > milliseconds => Err(StreamIdError::NotIncreasing),
            _ if milliseconds == 0 => Ok(StreamId::new(0, 1)),
            _ => Ok(StreamId::new(milliseconds, 0)),
        }
    }

    /// Appends an entry whose id came from [`Stream::next_id`].
    pub fn push(&mut self, entry: StreamEntry) {
        self.entries.push(entry);
    }

    /// Entries with `start <= id <= end`, in id order, at most `count` of them.
    pub fn range(&self, start: StreamId, end: StreamId, count: Option<usize>) -> Vec<StreamEntry> {
        let first = self.entries.partition_point(|entry| entry.id < start);

        self.entries[first..]
            .iter()
            .take_while(|entry| entry.id <= end)
            .take(count.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

fn current_unix_time_in_milliseconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
