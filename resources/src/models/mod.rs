use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Response<T: Serialize> {
    pub msg: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrResponse {
    pub msg: String,
    pub cause: Option<String>,
}

/// A single change delivered on a watch stream.
///
/// `Error` is sent by the api-server when the watch itself breaks
/// (for example an expired revision), never as part of the normal
/// lifecycle of the watched object.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", content = "object")]
pub enum WatchEvent<T> {
    Added(T),
    Modified(T),
    Deleted(T),
    Error(ErrResponse),
}

impl<T> WatchEvent<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            WatchEvent::Added(_) => "Added",
            WatchEvent::Modified(_) => "Modified",
            WatchEvent::Deleted(_) => "Deleted",
            WatchEvent::Error(_) => "Error",
        }
    }
}
