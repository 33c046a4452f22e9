//! Buildings and rooms

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::BiosafetyLevel;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A lab or support room inside a building
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub building_id: String,
    pub room_number: String,
    pub floor: Option<i32>,
    pub room_type: Option<String>,
    pub capacity: Option<u32>,
    pub biosafety_level: Option<BiosafetyLevel>,
    #[serde(default)]
    pub certifications: BTreeSet<String>,
    #[serde(default)]
    pub available_ppe: BTreeSet<String>,
    pub supervisor_id: Option<String>,
    pub manager_id: Option<String>,
}

impl Room {
    pub fn new(building_id: impl Into<String>, room_number: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            building_id: building_id.into(),
            room_number: room_number.into(),
            floor: None,
            room_type: None,
            capacity: None,
            biosafety_level: None,
            certifications: BTreeSet::new(),
            available_ppe: BTreeSet::new(),
            supervisor_id: None,
            manager_id: None,
        }
    }
}
