use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier attached to every outbound service request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new unique request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Bot => write!(f, "bot"),
        }
    }
}

/// A single entry in the conversation. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// The selected dataset, encoded as the composite key `"{id}-{table_name}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    pub id: i64,
    pub table_name: String,
}

impl DatasetKey {
    pub fn new(id: i64, table_name: impl Into<String>) -> Self {
        Self {
            id,
            table_name: table_name.into(),
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.id, self.table_name)
    }
}

impl FromStr for DatasetKey {
    type Err = String;

    /// Splits at the first `-` only, table names may contain hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, table_name) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid dataset key (missing '-'): {}", s))?;
        let id = id
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("Invalid dataset id '{}': {}", id, e))?;
        if table_name.is_empty() {
            return Err(format!("Invalid dataset key (empty table name): {}", s));
        }
        Ok(Self::new(id, table_name))
    }
}

/// Lifecycle phase of the chat widget, derived from its state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatPhase {
    NoDatasetSelected,
    DatasetSelected,
    AwaitingResponse,
}

impl fmt::Display for ChatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDatasetSelected => write!(f, "no dataset"),
            Self::DatasetSelected => write!(f, "ready"),
            Self::AwaitingResponse => write!(f, "waiting"),
        }
    }
}
