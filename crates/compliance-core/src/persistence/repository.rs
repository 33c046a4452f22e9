//! Repository for CRUD operations on compliance records

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use compliance_domain::{
    Building, Certificate, CertificationModule, IbcApplication, IbcBoardMember, IbcPersonnel,
    ManuscriptHistory, PdfImportRecord, ProjectMember, Publication, PublicationAuthor,
    ResearchActivity, Room, Scientist,
};
use rusqlite::{params, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use super::schema::{Schema, SCHEMA_VERSION};
use crate::error::{PersistenceError, Result};

/// Repository for persisting compliance records
pub struct Repository {
    conn: rusqlite::Connection,
}

impl Repository {
    /// Create a new repository with the given database path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(PersistenceError::from)?;
            }
        }
        let conn = rusqlite::Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Create an in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        let current_version = self.get_schema_version().unwrap_or(0);

        if current_version == 0 {
            self.conn.execute_batch(Schema::create_tables())?;
            self.set_schema_version(SCHEMA_VERSION)?;
        } else if current_version < SCHEMA_VERSION {
            for version in current_version..SCHEMA_VERSION {
                if let Some(migration) = Schema::migration(version, version + 1) {
                    self.conn
                        .execute_batch(migration)
                        .map_err(|e| PersistenceError::Migration(e.to_string()))?;
                }
            }
            self.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Option<u32> {
        self.conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok()
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    /// Run `f` inside a transaction; any error rolls everything back
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // ==================== Scientist Operations ====================

    pub fn save_scientist(&self, s: &Scientist) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO scientists
            (id, name, first_name, last_name, title, job_title, staff_id, department, email)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                s.id,
                s.name,
                s.first_name,
                s.last_name,
                s.title,
                s.job_title,
                s.staff_id,
                s.department,
                s.email,
            ],
        )?;
        Ok(())
    }

    pub fn get_scientist(&self, id: &str) -> Result<Option<Scientist>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, first_name, last_name, title, job_title, staff_id, department, email FROM scientists WHERE id = ?1",
                [id],
                Self::row_to_scientist,
            )
            .optional()?)
    }

    pub fn list_scientists(&self) -> Result<Vec<Scientist>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, first_name, last_name, title, job_title, staff_id, department, email FROM scientists ORDER BY last_name, first_name, name",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_scientist)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_scientist(row: &Row) -> rusqlite::Result<Scientist> {
        Ok(Scientist {
            id: row.get(0)?,
            name: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            title: row.get(4)?,
            job_title: row.get(5)?,
            staff_id: row.get(6)?,
            department: row.get(7)?,
            email: row.get(8)?,
        })
    }

    // ==================== Research Activity Operations ====================

    pub fn save_research_activity(&self, ra: &ResearchActivity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO research_activities (id, sdr_number, title, status, budget_source) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![ra.id, ra.sdr_number, ra.title, ra.status, ra.budget_source],
        )?;
        Ok(())
    }

    pub fn get_research_activity(&self, id: &str) -> Result<Option<ResearchActivity>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, sdr_number, title, status, budget_source FROM research_activities WHERE id = ?1",
                [id],
                Self::row_to_research_activity,
            )
            .optional()?)
    }

    pub fn list_research_activities(&self) -> Result<Vec<ResearchActivity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sdr_number, title, status, budget_source FROM research_activities ORDER BY sdr_number",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_research_activity)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_research_activity(row: &Row) -> rusqlite::Result<ResearchActivity> {
        Ok(ResearchActivity {
            id: row.get(0)?,
            sdr_number: row.get(1)?,
            title: row.get(2)?,
            status: row.get(3)?,
            budget_source: row.get(4)?,
        })
    }

    // ==================== Team Member Operations ====================

    pub fn insert_member(&self, member: &ProjectMember) -> Result<()> {
        self.conn.execute(
            "INSERT INTO project_members (id, research_activity_id, scientist_id, role) VALUES (?1, ?2, ?3, ?4)",
            params![
                member.id,
                member.research_activity_id,
                member.scientist_id,
                member.role.label(),
            ],
        )?;
        Ok(())
    }

    pub fn list_members(&self, research_activity_id: &str) -> Result<Vec<ProjectMember>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, research_activity_id, scientist_id, role FROM project_members WHERE research_activity_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([research_activity_id], |row| {
                Ok(ProjectMember {
                    id: row.get(0)?,
                    research_activity_id: row.get(1)?,
                    scientist_id: row.get(2)?,
                    role: label_at(row, 3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Remove a member; false if no such member on that activity
    pub fn delete_member(&self, research_activity_id: &str, member_id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM project_members WHERE research_activity_id = ?1 AND id = ?2",
            [research_activity_id, member_id],
        )?;
        Ok(n > 0)
    }

    // ==================== IBC Operations ====================

    pub fn save_ibc_application(&self, app: &IbcApplication) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO ibc_applications
            (id, ibc_number, title, status, biosafety_level, review_comments, reviewer_assignments,
             principal_investigator_id, research_activity_id, risk_flags, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                app.id,
                app.ibc_number,
                app.title,
                app.status.as_str(),
                app.biosafety_level.map(|l| l.as_str()),
                serde_json::to_string(&app.review_comments)?,
                serde_json::to_string(&app.reviewer_assignments)?,
                app.principal_investigator_id,
                app.research_activity_id,
                serde_json::to_string(&app.risk_flags)?,
                app.created_at.to_rfc3339(),
                app.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_ibc_application(&self, id: &str) -> Result<Option<IbcApplication>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, ibc_number, title, status, biosafety_level, review_comments, reviewer_assignments, principal_investigator_id, research_activity_id, risk_flags, created_at, updated_at FROM ibc_applications WHERE id = ?1",
                [id],
                Self::row_to_ibc_application,
            )
            .optional()?)
    }

    pub fn list_ibc_applications(&self, status: Option<&str>) -> Result<Vec<IbcApplication>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ibc_number, title, status, biosafety_level, review_comments, reviewer_assignments, principal_investigator_id, research_activity_id, risk_flags, created_at, updated_at FROM ibc_applications WHERE (?1 IS NULL OR status = ?1) ORDER BY updated_at DESC",
        )?;
        let rows = stmt
            .query_map([status], Self::row_to_ibc_application)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_ibc_application(row: &Row) -> rusqlite::Result<IbcApplication> {
        Ok(IbcApplication {
            id: row.get(0)?,
            ibc_number: row.get(1)?,
            title: row.get(2)?,
            status: label_at(row, 3)?,
            biosafety_level: opt_label_at(row, 4)?,
            review_comments: json_at(row, 5)?,
            reviewer_assignments: json_at(row, 6)?,
            principal_investigator_id: row.get(7)?,
            research_activity_id: row.get(8)?,
            risk_flags: json_at(row, 9)?,
            created_at: timestamp_at(row, 10)?,
            updated_at: timestamp_at(row, 11)?,
        })
    }

    pub fn save_board_member(&self, member: &IbcBoardMember) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO ibc_board_members (id, scientist_id, role, expertise, is_active, term_end_date) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                member.id,
                member.scientist_id,
                member.role.as_str(),
                serde_json::to_string(&member.expertise)?,
                member.is_active,
                fmt_date(member.term_end_date),
            ],
        )?;
        Ok(())
    }

    pub fn list_board_members(&self) -> Result<Vec<IbcBoardMember>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scientist_id, role, expertise, is_active, term_end_date FROM ibc_board_members ORDER BY role, rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(IbcBoardMember {
                    id: row.get(0)?,
                    scientist_id: row.get(1)?,
                    role: label_at(row, 2)?,
                    expertise: json_at(row, 3)?,
                    is_active: row.get(4)?,
                    term_end_date: date_at(row, 5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn insert_personnel(&self, p: &IbcPersonnel) -> Result<()> {
        self.conn.execute(
            "INSERT INTO ibc_personnel (id, application_id, scientist_id, role) VALUES (?1, ?2, ?3, ?4)",
            params![p.id, p.application_id, p.scientist_id, p.role],
        )?;
        Ok(())
    }

    pub fn list_personnel(&self, application_id: &str) -> Result<Vec<IbcPersonnel>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, application_id, scientist_id, role FROM ibc_personnel WHERE application_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([application_id], |row| {
                Ok(IbcPersonnel {
                    id: row.get(0)?,
                    application_id: row.get(1)?,
                    scientist_id: row.get(2)?,
                    role: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ==================== Publication Operations ====================

    pub fn save_publication(&self, p: &Publication) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO publications
            (id, title, status, authors, journal, doi, publication_date, prepublication_url,
             prepublication_site, research_activity_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                p.id,
                p.title,
                p.status.label(),
                p.authors,
                p.journal,
                p.doi,
                fmt_date(p.publication_date),
                p.prepublication_url,
                p.prepublication_site,
                p.research_activity_id,
                p.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_publication(&self, id: &str) -> Result<Option<Publication>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, status, authors, journal, doi, publication_date, prepublication_url, prepublication_site, research_activity_id, updated_at FROM publications WHERE id = ?1",
                [id],
                Self::row_to_publication,
            )
            .optional()?)
    }

    pub fn list_publications(&self) -> Result<Vec<Publication>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, status, authors, journal, doi, publication_date, prepublication_url, prepublication_site, research_activity_id, updated_at FROM publications ORDER BY updated_at DESC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_publication)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_publication(row: &Row) -> rusqlite::Result<Publication> {
        Ok(Publication {
            id: row.get(0)?,
            title: row.get(1)?,
            status: label_at(row, 2)?,
            authors: row.get(3)?,
            journal: row.get(4)?,
            doi: row.get(5)?,
            publication_date: date_at(row, 6)?,
            prepublication_url: row.get(7)?,
            prepublication_site: row.get(8)?,
            research_activity_id: row.get(9)?,
            updated_at: timestamp_at(row, 10)?,
        })
    }

    pub fn insert_author(&self, author: &PublicationAuthor) -> Result<()> {
        self.conn.execute(
            "INSERT INTO publication_authors (publication_id, scientist_id, authorship_type, author_position) VALUES (?1, ?2, ?3, ?4)",
            params![
                author.publication_id,
                author.scientist_id,
                author.authorship.to_string(),
                author.author_position,
            ],
        )?;
        Ok(())
    }

    /// Authors of a publication, by position
    pub fn list_authors(&self, publication_id: &str) -> Result<Vec<PublicationAuthor>> {
        let mut stmt = self.conn.prepare(
            "SELECT publication_id, scientist_id, authorship_type, author_position FROM publication_authors WHERE publication_id = ?1 ORDER BY author_position",
        )?;
        let rows = stmt
            .query_map([publication_id], |row| {
                Ok(PublicationAuthor {
                    publication_id: row.get(0)?,
                    scientist_id: row.get(1)?,
                    authorship: label_at(row, 2)?,
                    author_position: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_author(&self, publication_id: &str, scientist_id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM publication_authors WHERE publication_id = ?1 AND scientist_id = ?2",
            [publication_id, scientist_id],
        )?;
        Ok(n > 0)
    }

    /// Append one audit row. Rows are never updated or deleted.
    pub fn append_history(&self, h: &ManuscriptHistory) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO manuscript_history
            (id, publication_id, from_status, to_status, changed_field, old_value, new_value, changed_by, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                h.id,
                h.publication_id,
                h.from_status.label(),
                h.to_status.label(),
                h.changed_field,
                h.old_value,
                h.new_value,
                h.changed_by,
                h.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Audit trail of a publication, oldest first
    pub fn history_for(&self, publication_id: &str) -> Result<Vec<ManuscriptHistory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, publication_id, from_status, to_status, changed_field, old_value, new_value, changed_by, timestamp FROM manuscript_history WHERE publication_id = ?1 ORDER BY timestamp, rowid",
        )?;
        let rows = stmt
            .query_map([publication_id], |row| {
                Ok(ManuscriptHistory {
                    id: row.get(0)?,
                    publication_id: row.get(1)?,
                    from_status: label_at(row, 2)?,
                    to_status: label_at(row, 3)?,
                    changed_field: row.get(4)?,
                    old_value: row.get(5)?,
                    new_value: row.get(6)?,
                    changed_by: row.get(7)?,
                    timestamp: timestamp_at(row, 8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ==================== Facility Operations ====================

    pub fn save_building(&self, b: &Building) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO buildings (id, name, address, description) VALUES (?1, ?2, ?3, ?4)",
            params![b.id, b.name, b.address, b.description],
        )?;
        Ok(())
    }

    pub fn get_building(&self, id: &str) -> Result<Option<Building>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, address, description FROM buildings WHERE id = ?1",
                [id],
                Self::row_to_building,
            )
            .optional()?)
    }

    pub fn list_buildings(&self) -> Result<Vec<Building>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, address, description FROM buildings ORDER BY name")?;
        let rows = stmt
            .query_map([], Self::row_to_building)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_building(row: &Row) -> rusqlite::Result<Building> {
        Ok(Building {
            id: row.get(0)?,
            name: row.get(1)?,
            address: row.get(2)?,
            description: row.get(3)?,
        })
    }

    pub fn save_room(&self, r: &Room) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO rooms
            (id, building_id, room_number, floor, room_type, capacity, biosafety_level,
             certifications, available_ppe, supervisor_id, manager_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                r.id,
                r.building_id,
                r.room_number,
                r.floor,
                r.room_type,
                r.capacity,
                r.biosafety_level.map(|l| l.as_str()),
                serde_json::to_string(&r.certifications)?,
                serde_json::to_string(&r.available_ppe)?,
                r.supervisor_id,
                r.manager_id,
            ],
        )?;
        Ok(())
    }

    pub fn get_room(&self, id: &str) -> Result<Option<Room>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, building_id, room_number, floor, room_type, capacity, biosafety_level, certifications, available_ppe, supervisor_id, manager_id FROM rooms WHERE id = ?1",
                [id],
                Self::row_to_room,
            )
            .optional()?)
    }

    pub fn list_rooms(&self, building_id: Option<&str>) -> Result<Vec<Room>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, building_id, room_number, floor, room_type, capacity, biosafety_level, certifications, available_ppe, supervisor_id, manager_id FROM rooms WHERE (?1 IS NULL OR building_id = ?1) ORDER BY building_id, room_number",
        )?;
        let rows = stmt
            .query_map([building_id], Self::row_to_room)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_room(row: &Row) -> rusqlite::Result<Room> {
        Ok(Room {
            id: row.get(0)?,
            building_id: row.get(1)?,
            room_number: row.get(2)?,
            floor: row.get(3)?,
            room_type: row.get(4)?,
            capacity: row.get(5)?,
            biosafety_level: opt_label_at(row, 6)?,
            certifications: json_at(row, 7)?,
            available_ppe: json_at(row, 8)?,
            supervisor_id: row.get(9)?,
            manager_id: row.get(10)?,
        })
    }

    // ==================== Certification Operations ====================

    pub fn save_module(&self, m: &CertificationModule) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO certification_modules (id, name, description, validity_months, is_core) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![m.id, m.name, m.description, m.validity_months, m.is_core],
        )?;
        Ok(())
    }

    pub fn list_modules(&self) -> Result<Vec<CertificationModule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, validity_months, is_core FROM certification_modules ORDER BY is_core DESC, name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CertificationModule {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    validity_months: row.get(3)?,
                    is_core: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn insert_certificate(&self, c: &Certificate) -> Result<()> {
        self.conn.execute(
            "INSERT INTO certificates (id, scientist_id, module_id, start_date, end_date, source_file_url, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                c.id,
                c.scientist_id,
                c.module_id,
                fmt_date(c.start_date),
                fmt_date(c.end_date),
                c.source_file_url,
                c.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_certificates(&self) -> Result<Vec<Certificate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scientist_id, module_id, start_date, end_date, source_file_url, created_at FROM certificates ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Certificate {
                    id: row.get(0)?,
                    scientist_id: row.get(1)?,
                    module_id: row.get(2)?,
                    start_date: date_at(row, 3)?,
                    end_date: date_at(row, 4)?,
                    source_file_url: row.get(5)?,
                    created_at: timestamp_at(row, 6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn append_import_record(&self, r: &PdfImportRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO pdf_import_history
            (id, file_name, file_url, uploaded_by, processed, certificates_created, error, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                r.id,
                r.file_name,
                r.file_url,
                r.uploaded_by,
                r.processed,
                r.certificates_created,
                r.error,
                r.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Import log, newest first
    pub fn list_import_records(&self, limit: usize) -> Result<Vec<PdfImportRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_name, file_url, uploaded_by, processed, certificates_created, error, created_at FROM pdf_import_history ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(PdfImportRecord {
                    id: row.get(0)?,
                    file_name: row.get(1)?,
                    file_url: row.get(2)?,
                    uploaded_by: row.get(3)?,
                    processed: row.get(4)?,
                    certificates_created: row.get(5)?,
                    error: row.get(6)?,
                    created_at: timestamp_at(row, 7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ==================== Column Conversions ====================

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn fmt_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn date_at(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn label_at<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_error(idx, e))
}

fn opt_label_at<T>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s: Option<String> = row.get(idx)?;
    s.map(|s| s.parse().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn json_at<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(idx, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_domain::{
        AuthorRole, AuthorshipRole, BiosafetyLevel, IbcStatus, PublicationStatus, ReviewerAssignment,
        TeamRole,
    };

    #[test]
    fn test_scientist_crud() {
        let repo = Repository::in_memory().unwrap();
        let s = Scientist::new("Ada", "Lovelace").with_job_title("Investigator");
        repo.save_scientist(&s).unwrap();
        assert_eq!(repo.get_scientist(&s.id).unwrap(), Some(s.clone()));
        assert_eq!(repo.list_scientists().unwrap().len(), 1);
        assert_eq!(repo.get_scientist("missing").unwrap(), None);
    }

    #[test]
    fn test_ibc_application_round_trip() {
        let repo = Repository::in_memory().unwrap();
        let mut app = IbcApplication::new("IBC-1", "Lentiviral vectors");
        app.biosafety_level = Some(BiosafetyLevel::Bsl2);
        app.reviewer_assignments
            .push(ReviewerAssignment::assigned("r1", Utc::now()));
        app.risk_flags.recombinant_dna = true;
        repo.save_ibc_application(&app).unwrap();

        let loaded = repo.get_ibc_application(&app.id).unwrap().unwrap();
        assert_eq!(loaded.biosafety_level, Some(BiosafetyLevel::Bsl2));
        assert_eq!(loaded.reviewer_assignments.len(), 1);
        assert!(loaded.risk_flags.recombinant_dna);

        assert_eq!(repo.list_ibc_applications(Some("draft")).unwrap().len(), 1);
        assert!(repo.list_ibc_applications(Some("active")).unwrap().is_empty());
        assert_eq!(loaded.status, IbcStatus::Draft);
    }

    #[test]
    fn test_members_and_delete() {
        let repo = Repository::in_memory().unwrap();
        let m = ProjectMember::new("ra1", "s1", TeamRole::LeadScientist);
        repo.insert_member(&m).unwrap();
        assert_eq!(repo.list_members("ra1").unwrap(), vec![m.clone()]);
        assert!(repo.delete_member("ra1", &m.id).unwrap());
        assert!(!repo.delete_member("ra1", &m.id).unwrap());
    }

    #[test]
    fn test_author_position_unique() {
        let repo = Repository::in_memory().unwrap();
        let role = AuthorshipRole::new(AuthorRole::FirstAuthor).corresponding();
        let a = PublicationAuthor {
            publication_id: "p1".into(),
            scientist_id: "s1".into(),
            authorship: role.clone(),
            author_position: 1,
        };
        repo.insert_author(&a).unwrap();
        let clash = PublicationAuthor {
            scientist_id: "s2".into(),
            ..a.clone()
        };
        assert!(repo.insert_author(&clash).is_err());
        assert_eq!(repo.list_authors("p1").unwrap()[0].authorship, role);
    }

    #[test]
    fn test_history_append_and_read() {
        let repo = Repository::in_memory().unwrap();
        let h = ManuscriptHistory {
            id: "h1".into(),
            publication_id: "p1".into(),
            from_status: PublicationStatus::Concept,
            to_status: PublicationStatus::CompleteDraft,
            changed_field: "status".into(),
            old_value: Some("Concept".into()),
            new_value: Some("Complete Draft".into()),
            changed_by: None,
            timestamp: Utc::now(),
        };
        repo.append_history(&h).unwrap();
        assert_eq!(repo.history_for("p1").unwrap().len(), 1);
        assert!(repo.append_history(&h).is_err());
    }

    #[test]
    fn test_transaction_rolls_back() {
        let repo = Repository::in_memory().unwrap();
        let result: Result<()> = repo.transaction(|r| {
            r.save_building(&Building::new("North"))?;
            Err(crate::error::ComplianceError::Conflict("abort".into()))
        });
        assert!(result.is_err());
        assert!(repo.list_buildings().unwrap().is_empty());
    }

    #[test]
    fn test_file_backed_repository_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("compliance.db");
        {
            let repo = Repository::new(&path).unwrap();
            repo.save_building(&Building::new("North")).unwrap();
        }
        let repo = Repository::new(&path).unwrap();
        assert_eq!(repo.list_buildings().unwrap().len(), 1);
    }
}
