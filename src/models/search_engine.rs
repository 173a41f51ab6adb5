use serde::{Deserialize, Serialize};
use std::fmt;

/// Search engines that accept delisting requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEngine {
    Google,
    Bing,
    Yandex,
    DuckDuckGo,
}

impl SearchEngine {
    /// Engines targeted when a request names none
    pub fn defaults() -> Vec<SearchEngine> {
        vec![Self::Google, Self::Bing, Self::Yandex]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Bing => "bing",
            Self::Yandex => "yandex",
            Self::DuckDuckGo => "duck_duck_go",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "bing" => Ok(Self::Bing),
            "yandex" => Ok(Self::Yandex),
            "duck_duck_go" | "duckduckgo" => Ok(Self::DuckDuckGo),
            _ => Err(format!("Invalid search engine: {s}")),
        }
    }
}
