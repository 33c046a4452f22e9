//! Building and room commands

use compliance_domain::{validate_building, validate_room, Building, Room, ValidationIssue};

use super::{ensure_valid, Command};
use crate::error::{ComplianceError, Result};
use crate::persistence::Repository;

#[derive(Debug, Clone)]
pub struct SaveBuilding {
    pub building: Building,
}

impl Command for SaveBuilding {
    type Output = Building;

    fn execute(self, repo: &Repository) -> Result<Building> {
        ensure_valid(validate_building(&self.building))?;
        repo.save_building(&self.building)?;
        Ok(self.building)
    }
}

/// Create or update a room. The building it names must exist.
#[derive(Debug, Clone)]
pub struct SaveRoom {
    pub room: Room,
}

impl Command for SaveRoom {
    type Output = Room;

    fn execute(self, repo: &Repository) -> Result<Room> {
        let mut issues = validate_room(&self.room);
        if !self.room.building_id.trim().is_empty()
            && repo.get_building(&self.room.building_id)?.is_none()
        {
            issues.push(ValidationIssue::error(
                "buildingId",
                format!("Unknown building {}", self.room.building_id),
            ));
        }
        ensure_valid(issues)?;

        let clash = repo
            .list_rooms(Some(&self.room.building_id))?
            .into_iter()
            .any(|r| r.id != self.room.id && r.room_number == self.room.room_number);
        if clash {
            return Err(ComplianceError::Conflict(format!(
                "Room {} already exists in this building",
                self.room.room_number
            )));
        }

        repo.save_room(&self.room)?;
        tracing::debug!(room = %self.room.room_number, building = %self.room.building_id, "Room saved");
        Ok(self.room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_needs_existing_building() {
        let repo = Repository::in_memory().unwrap();
        let err = SaveRoom {
            room: Room::new("nowhere", "101"),
        }
        .execute(&repo)
        .unwrap_err();
        match err {
            ComplianceError::Validation(issues) => assert_eq!(issues[0].field, "buildingId"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(repo.list_rooms(None).unwrap().is_empty());
    }

    #[test]
    fn test_room_saved_and_updated() {
        let repo = Repository::in_memory().unwrap();
        let building = SaveBuilding {
            building: Building::new("Life Sciences"),
        }
        .execute(&repo)
        .unwrap();

        let mut room = SaveRoom {
            room: Room::new(&building.id, "B12"),
        }
        .execute(&repo)
        .unwrap();
        room.available_ppe.insert("Lab coat".into());
        SaveRoom { room: room.clone() }.execute(&repo).unwrap();

        let stored = repo.get_room(&room.id).unwrap().unwrap();
        assert!(stored.available_ppe.contains("Lab coat"));

        let dup = SaveRoom {
            room: Room::new(&building.id, "B12"),
        }
        .execute(&repo);
        assert!(matches!(dup, Err(ComplianceError::Conflict(_))));
    }

    #[test]
    fn test_blank_building_name() {
        let repo = Repository::in_memory().unwrap();
        assert!(SaveBuilding {
            building: Building::new("  "),
        }
        .execute(&repo)
        .is_err());
    }
}
