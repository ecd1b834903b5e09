//! Subscriber directory: who receives notification messages.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub address: String,
    #[serde(default = "default_subscribed")]
    pub subscribed: bool,
}

fn default_subscribed() -> bool {
    true
}

impl Subscriber {
    pub fn new(address: impl Into<String>, subscribed: bool) -> Self {
        Self {
            address: address.into(),
            subscribed,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("failed to read subscriber file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse subscriber file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Source of notification recipients.
pub trait SubscriberDirectory: Send + Sync {
    fn all(&self) -> Result<Vec<Subscriber>, SubscriberError>;

    /// Subscribers that opted in, in directory order.
    fn subscribed(&self) -> Result<Vec<Subscriber>, SubscriberError> {
        Ok(self.all()?.into_iter().filter(|s| s.subscribed).collect())
    }
}

/// Fixed in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSubscribers {
    subscribers: Vec<Subscriber>,
}

impl StaticSubscribers {
    pub fn new(subscribers: Vec<Subscriber>) -> Self {
        Self { subscribers }
    }
}

impl SubscriberDirectory for StaticSubscribers {
    fn all(&self) -> Result<Vec<Subscriber>, SubscriberError> {
        Ok(self.subscribers.clone())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SubscriberFile {
    #[serde(default, rename = "subscriber")]
    subscribers: Vec<Subscriber>,
}

/// TOML file with a `[[subscriber]]` array, re-read on every query so edits
/// take effect on the next check without a restart.
///
/// ```toml
/// [[subscriber]]
/// address = "alice@example.com"
///
/// [[subscriber]]
/// address = "bob@example.com"
/// subscribed = false
/// ```
#[derive(Debug, Clone)]
pub struct FileSubscriberDirectory {
    path: PathBuf,
}

impl FileSubscriberDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(content: &str) -> Result<Vec<Subscriber>, toml::de::Error> {
        toml::from_str::<SubscriberFile>(content).map(|f| f.subscribers)
    }
}

impl SubscriberDirectory for FileSubscriberDirectory {
    /// A missing file is an empty directory.
    fn all(&self) -> Result<Vec<Subscriber>, SubscriberError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no subscriber file");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SubscriberError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Self::parse(&content).map_err(|source| SubscriberError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}
