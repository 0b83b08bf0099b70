//! JSON shapes of the roster and project endpoints. These stay separate from
//! the domain types so the HTTP surface can drift without touching them.

use crate::{Player, Position};
use serde::{Deserialize, Serialize};

/// One row of the active-roster source. Accepts both camelCase and the
/// snake_case column names the roster database exports.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub id: String,
    #[serde(default, alias = "first_name")]
    pub first_name: String,
    #[serde(default, alias = "last_name")]
    pub last_name: String,
    #[serde(default, alias = "jersey_number")]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub position: Option<String>,
}

impl RosterRow {
    pub fn into_player(self) -> Player {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned();
        Player {
            id: self.id,
            name,
            jersey_number: self.jersey_number.unwrap_or(0),
            position: self.position.as_deref().map(Position::parse).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub id: Option<String>,
}
