//! SQL schema for the Satchel SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS forms (
    form_id      TEXT PRIMARY KEY,
    form_name    TEXT NOT NULL,
    form_year    INTEGER NOT NULL,
    teacher_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pupils (
    pupil_id   TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    form_id    TEXT REFERENCES forms(form_id),
    notes      TEXT,
    created_at TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS needs (
    need_id           TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    short_description TEXT,
    description       TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    category_id   TEXT PRIMARY KEY,
    category_name TEXT NOT NULL,
    description   TEXT
);

-- Edge in the category/need bipartite graph; owns neither endpoint.
CREATE TABLE IF NOT EXISTS category_needs (
    category_id TEXT NOT NULL REFERENCES categories(category_id),
    need_id     TEXT NOT NULL REFERENCES needs(need_id),
    UNIQUE (category_id, need_id)
);

-- The mechanism by which a pupil inherits every need in a category.
CREATE TABLE IF NOT EXISTS pupil_categories (
    pupil_id    TEXT NOT NULL REFERENCES pupils(pupil_id),
    category_id TEXT NOT NULL REFERENCES categories(category_id),
    UNIQUE (pupil_id, category_id)
);

-- At most one override per (pupil, need) pair; conflicting add/remove
-- rows cannot coexist.
CREATE TABLE IF NOT EXISTS pupil_need_overrides (
    override_id TEXT PRIMARY KEY,
    pupil_id    TEXT NOT NULL REFERENCES pupils(pupil_id),
    need_id     TEXT NOT NULL REFERENCES needs(need_id),
    is_added    INTEGER NOT NULL,    -- 0 = removal, 1 = addition
    notes       TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (pupil_id, need_id)
);

CREATE TABLE IF NOT EXISTS devices (
    device_id     TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    model         TEXT,
    serial_number TEXT,
    purchase_date TEXT,              -- ISO 8601 date
    warranty_info TEXT,
    status        TEXT,
    notes         TEXT,
    category_id   TEXT REFERENCES categories(category_id)
);

CREATE TABLE IF NOT EXISTS need_devices (
    need_id         TEXT NOT NULL REFERENCES needs(need_id),
    device_id       TEXT NOT NULL REFERENCES devices(device_id),
    assignment_date TEXT,            -- ISO 8601 date
    notes           TEXT,
    UNIQUE (need_id, device_id)
);

CREATE INDEX IF NOT EXISTS pupils_form_idx            ON pupils(form_id);
CREATE INDEX IF NOT EXISTS category_needs_need_idx    ON category_needs(need_id);
CREATE INDEX IF NOT EXISTS pupil_categories_pupil_idx ON pupil_categories(pupil_id);
CREATE INDEX IF NOT EXISTS overrides_pupil_idx        ON pupil_need_overrides(pupil_id);
CREATE INDEX IF NOT EXISTS need_devices_need_idx      ON need_devices(need_id);

PRAGMA user_version = 1;
";
