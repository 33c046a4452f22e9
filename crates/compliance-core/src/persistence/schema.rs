//! SQLite schema for compliance records

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS scientists (
    id TEXT PRIMARY KEY,
    name TEXT,
    first_name TEXT,
    last_name TEXT,
    title TEXT,
    job_title TEXT,
    staff_id TEXT,
    department TEXT,
    email TEXT
);

CREATE INDEX IF NOT EXISTS idx_scientists_staff ON scientists(staff_id);

CREATE TABLE IF NOT EXISTS research_activities (
    id TEXT PRIMARY KEY,
    sdr_number TEXT NOT NULL,
    title TEXT NOT NULL,
    status TEXT,
    budget_source TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_research_activities_sdr ON research_activities(sdr_number);

-- Team membership
CREATE TABLE IF NOT EXISTS project_members (
    id TEXT PRIMARY KEY,
    research_activity_id TEXT NOT NULL,
    scientist_id TEXT NOT NULL,
    role TEXT NOT NULL,
    FOREIGN KEY (research_activity_id) REFERENCES research_activities(id),
    FOREIGN KEY (scientist_id) REFERENCES scientists(id)
);

CREATE INDEX IF NOT EXISTS idx_project_members_activity ON project_members(research_activity_id);

CREATE TABLE IF NOT EXISTS ibc_applications (
    id TEXT PRIMARY KEY,
    ibc_number TEXT NOT NULL,
    title TEXT NOT NULL,
    status TEXT NOT NULL,
    biosafety_level TEXT,
    review_comments TEXT NOT NULL DEFAULT '[]',
    reviewer_assignments TEXT NOT NULL DEFAULT '[]',
    principal_investigator_id TEXT,
    research_activity_id TEXT,
    risk_flags TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ibc_applications_status ON ibc_applications(status);

CREATE TABLE IF NOT EXISTS ibc_board_members (
    id TEXT PRIMARY KEY,
    scientist_id TEXT NOT NULL,
    role TEXT NOT NULL,
    expertise TEXT NOT NULL DEFAULT '[]',
    is_active INTEGER NOT NULL DEFAULT 1,
    term_end_date TEXT,
    FOREIGN KEY (scientist_id) REFERENCES scientists(id)
);

CREATE TABLE IF NOT EXISTS ibc_personnel (
    id TEXT PRIMARY KEY,
    application_id TEXT NOT NULL,
    scientist_id TEXT NOT NULL,
    role TEXT NOT NULL,
    FOREIGN KEY (application_id) REFERENCES ibc_applications(id),
    FOREIGN KEY (scientist_id) REFERENCES scientists(id)
);

CREATE INDEX IF NOT EXISTS idx_ibc_personnel_application ON ibc_personnel(application_id);

CREATE TABLE IF NOT EXISTS publications (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    status TEXT NOT NULL,
    authors TEXT,
    journal TEXT,
    doi TEXT,
    publication_date TEXT,
    prepublication_url TEXT,
    prepublication_site TEXT,
    research_activity_id TEXT,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS publication_authors (
    publication_id TEXT NOT NULL,
    scientist_id TEXT NOT NULL,
    authorship_type TEXT NOT NULL,
    author_position INTEGER NOT NULL,
    PRIMARY KEY (publication_id, scientist_id),
    UNIQUE (publication_id, author_position),
    FOREIGN KEY (publication_id) REFERENCES publications(id),
    FOREIGN KEY (scientist_id) REFERENCES scientists(id)
);

-- Manuscript audit trail (append-only)
CREATE TABLE IF NOT EXISTS manuscript_history (
    id TEXT PRIMARY KEY,
    publication_id TEXT NOT NULL,
    from_status TEXT NOT NULL,
    to_status TEXT NOT NULL,
    changed_field TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    changed_by TEXT,
    timestamp TEXT NOT NULL,
    FOREIGN KEY (publication_id) REFERENCES publications(id)
);

CREATE INDEX IF NOT EXISTS idx_manuscript_history_publication ON manuscript_history(publication_id, timestamp);

CREATE TRIGGER IF NOT EXISTS manuscript_history_no_update
BEFORE UPDATE ON manuscript_history
BEGIN
    SELECT RAISE(ABORT, 'manuscript history is append-only');
END;

CREATE TRIGGER IF NOT EXISTS manuscript_history_no_delete
BEFORE DELETE ON manuscript_history
BEGIN
    SELECT RAISE(ABORT, 'manuscript history is append-only');
END;

CREATE TABLE IF NOT EXISTS buildings (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    building_id TEXT NOT NULL,
    room_number TEXT NOT NULL,
    floor INTEGER,
    room_type TEXT,
    capacity INTEGER,
    biosafety_level TEXT,
    certifications TEXT NOT NULL DEFAULT '[]',
    available_ppe TEXT NOT NULL DEFAULT '[]',
    supervisor_id TEXT,
    manager_id TEXT,
    FOREIGN KEY (building_id) REFERENCES buildings(id)
);

CREATE INDEX IF NOT EXISTS idx_rooms_building ON rooms(building_id);

CREATE TABLE IF NOT EXISTS certification_modules (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    validity_months INTEGER,
    is_core INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS certificates (
    id TEXT PRIMARY KEY,
    scientist_id TEXT NOT NULL,
    module_id TEXT NOT NULL,
    start_date TEXT,
    end_date TEXT,
    source_file_url TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (scientist_id) REFERENCES scientists(id),
    FOREIGN KEY (module_id) REFERENCES certification_modules(id)
);

CREATE INDEX IF NOT EXISTS idx_certificates_scientist ON certificates(scientist_id, module_id);

CREATE TABLE IF NOT EXISTS pdf_import_history (
    id TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    file_url TEXT,
    uploaded_by TEXT,
    processed INTEGER NOT NULL,
    certificates_created INTEGER NOT NULL DEFAULT 0,
    error TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pdf_import_history_created ON pdf_import_history(created_at);
"#
    }

    /// Get migration SQL for a specific version
    pub fn migration(from_version: u32, to_version: u32) -> Option<&'static str> {
        match (from_version, to_version) {
            // (1, 2) => Some("ALTER TABLE ..."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sql_valid() {
        let sql = Schema::create_tables();
        assert!(sql.contains("CREATE TABLE"));
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(sql).unwrap();
    }

    #[test]
    fn test_history_rejects_update() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(Schema::create_tables()).unwrap();
        conn.execute(
            "INSERT INTO manuscript_history (id, publication_id, from_status, to_status, changed_field, timestamp) VALUES ('h1', 'p1', 'Concept', 'Complete Draft', 'status', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        assert!(conn
            .execute("UPDATE manuscript_history SET new_value = 'x' WHERE id = 'h1'", [])
            .is_err());
        assert!(conn.execute("DELETE FROM manuscript_history", []).is_err());
    }
}
