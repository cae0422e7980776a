//! Addressing and encoding shared by everything that talks to the room document store.
//!
//! Documents live in a single tree addressed by slash-separated paths:
//!
//! - `rooms/{code}`: the whole room
//! - `rooms/{code}/players/{name}`: one player record
//! - `rooms/{code}/board/{row}/{col}`: one cell
//! - `rooms/{code}/damageEvent`: last combat cue
//! - `rooms/{code}/ripples/{id}`: one pin ripple

use core::fmt;
use core::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use serde_json;

/// Top-level collection holding every room.
pub const ROOMS: &str = "rooms";

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Room code must not be empty")]
    EmptyRoomCode,
    #[error("Room code {0:?} must be letters and digits only")]
    InvalidRoomCode(String),
    #[error("Path segment {0:?} is empty or contains a reserved character")]
    InvalidKey(String),
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Uppercase alphanumeric room code as shared between players.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes user input: surrounding whitespace is dropped and letters are uppercased.
    pub fn parse(input: &str) -> Result<Self> {
        let code = input.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(ProtocolError::EmptyRoomCode);
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProtocolError::InvalidRoomCode(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Rejects keys the store cannot address: empty, or containing `/ . # $ [ ]`.
pub fn validate_key(key: &str) -> Result<&str> {
    let reserved = |c: char| matches!(c, '/' | '.' | '#' | '$' | '[' | ']') || c.is_control();
    if key.is_empty() || key.contains(reserved) {
        Err(ProtocolError::InvalidKey(key.to_string()))
    } else {
        Ok(key)
    }
}

/// Location of a node in the document tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn room(code: &RoomCode) -> Self {
        Self::root().child(ROOMS).child(code.as_str())
    }

    pub fn players(code: &RoomCode) -> Self {
        Self::room(code).child("players")
    }

    pub fn player(code: &RoomCode, name: &str) -> Result<Self> {
        Ok(Self::players(code).child(validate_key(name)?))
    }

    pub fn cell(code: &RoomCode, (row, col): (u8, u8)) -> Self {
        Self::room(code)
            .child("board")
            .child(&row.to_string())
            .child(&col.to_string())
    }

    pub fn damage_event(code: &RoomCode) -> Self {
        Self::room(code).child("damageEvent")
    }

    pub fn ripples(code: &RoomCode) -> Self {
        Self::room(code).child("ripples")
    }

    pub fn ripple(code: &RoomCode, id: &str) -> Result<Self> {
        Ok(Self::ripples(code).child(validate_key(id)?))
    }

    pub fn child(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &StorePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Whether a write at one path can change the value seen at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for StorePath {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        s.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(Self::root(), |path, segment| {
                Ok(path.child(validate_key(segment)?))
            })
    }
}

/// Encodes a value for storage.
pub fn encode<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Decodes a stored node, treating a missing node and `null` alike.
pub fn decode<T: DeserializeOwned>(value: Option<&Value>) -> Result<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(T::deserialize(value)?)),
    }
}
