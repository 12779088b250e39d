//! Catalog records.
//!
//! Plain serde structs. The only behavior they carry is the `Entity`
//! contract that repositories and the resource controller rely on.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record addressable at `/{RESOURCE}` and `/{RESOURCE}/{id}`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Lower-case path prefix, also the route table key.
    const RESOURCE: &'static str;

    /// Singular name used in messages.
    const KIND: &'static str;

    fn id(&self) -> Option<u64>;

    fn set_id(&mut self, id: u64);
}

macro_rules! entity {
    ($ty:ty, $resource:literal, $kind:literal) => {
        impl Entity for $ty {
            const RESOURCE: &'static str = $resource;
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<u64> {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = Some(id);
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub founded_year: Option<u16>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Console {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub release_year: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub release_year: Option<u16>,
    #[serde(default)]
    pub developer_id: Option<u64>,
    #[serde(default)]
    pub publisher_id: Option<u64>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub console_ids: Vec<u64>,
}

entity!(Developer, "developers", "developer");
entity!(Publisher, "publishers", "publisher");
entity!(Genre, "genres", "genre");
entity!(Console, "consoles", "console");
entity!(Game, "games", "game");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_id_is_omitted_on_the_wire() {
        let developer = Developer {
            id: None,
            name: "Looking Glass".into(),
            country: Some("US".into()),
            founded_year: Some(1990),
            website: None,
        };
        let json = serde_json::to_value(&developer).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["name"], "Looking Glass");
    }

    #[test]
    fn optional_fields_default() {
        let game: Game = serde_json::from_str(r#"{"title":"Thief"}"#).unwrap();
        assert_eq!(game.id, None);
        assert!(game.console_ids.is_empty());
    }

    #[test]
    fn set_id_assigns() {
        let mut genre = Genre {
            id: None,
            name: "Immersive sim".into(),
            description: None,
        };
        genre.set_id(7);
        assert_eq!(genre.id(), Some(7));
        assert_eq!(Genre::RESOURCE, "genres");
    }
}
