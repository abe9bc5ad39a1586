use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub mod installation;
pub mod test_suite;

/// Standard object's metadata.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

pub trait Object:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn kind(&self) -> &'static str;

    fn name(&self) -> &String;

    fn kind_plural(&self) -> String {
        format!("{}s", self.kind().to_lowercase())
    }
}
