//! SQL schema for the trialsync SQLite store.
//!
//! Table DDL is idempotent thanks to `CREATE TABLE IF NOT EXISTS`. The view is
//! dropped and recreated inside one transaction so re-issuing it never leaves
//! the database without a definition.

/// Connection-level settings, applied once at open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Studies from the US registry. Structured modules are JSON text.
pub const US_TABLE: &str = "
CREATE TABLE IF NOT EXISTS us (
    nct_id                TEXT NOT NULL PRIMARY KEY,
    org_study_id          TEXT NOT NULL,
    secondary_ids         TEXT NOT NULL DEFAULT '[]',
    organization          TEXT NOT NULL DEFAULT '{}',
    brief_title           TEXT NOT NULL,
    official_title        TEXT,
    status                TEXT NOT NULL DEFAULT '{}',
    sponsor_collaborators TEXT NOT NULL DEFAULT '{}',
    description           TEXT NOT NULL DEFAULT '{}',
    conditions            TEXT NOT NULL DEFAULT '{}',
    design                TEXT NOT NULL DEFAULT '{}',
    arms_interventions    TEXT NOT NULL DEFAULT '{}',
    outcomes              TEXT NOT NULL DEFAULT '{}',
    eligibility           TEXT NOT NULL DEFAULT '{}',
    contacts_locations    TEXT NOT NULL DEFAULT '{}',
    derived               TEXT NOT NULL DEFAULT '{}',
    has_results           INTEGER NOT NULL
);
";

/// Trials scraped from the EU registry.
///
/// SQLite allows NULL in a non-INTEGER primary key unless told otherwise.
pub const EU_TABLE: &str = "
CREATE TABLE IF NOT EXISTS eu (
    eudract_number          TEXT NOT NULL PRIMARY KEY,
    sponsor_protocol_number TEXT,
    sponsor_name            TEXT,
    full_title              TEXT,
    medical_condition       TEXT
);
";

/// Union of both base tables in one logical shape.
///
/// US rows are expanded one per element of `conditions.conditions`; a study
/// without that array contributes no rows.
pub const COMBINED_VIEW: &str = "
DROP VIEW IF EXISTS combined_view;

CREATE VIEW combined_view AS
SELECT
    'US_' || us.nct_id                                       AS study_identifier,
    LOWER(COALESCE(us.official_title, us.brief_title))       AS study_name,
    condition.value                                          AS conditions,
    json_extract(us.sponsor_collaborators, '$.leadSponsor.name') AS sponsor
FROM us, json_each(us.conditions, '$.conditions') AS condition
UNION ALL
SELECT
    'EU_' || eu.eudract_number AS study_identifier,
    LOWER(eu.full_title)       AS study_name,
    eu.medical_condition       AS conditions,
    eu.sponsor_name            AS sponsor
FROM eu;
";
