//! SQL schema for the Strand SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are never deleted. The only UPDATE ever issued is demotion, which
-- rewrites link_precedence, linked_id and updated_at.
CREATE TABLE IF NOT EXISTS contacts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    phone_number    TEXT,
    email           TEXT,
    linked_id       INTEGER REFERENCES contacts(id),
    link_precedence TEXT    NOT NULL
                    CHECK (link_precedence IN ('primary', 'secondary')),
    created_at      TEXT    NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at      TEXT    NOT NULL,
    deleted_at      TEXT,
    CHECK ((link_precedence = 'primary') = (linked_id IS NULL))
);

CREATE INDEX IF NOT EXISTS contacts_email_idx     ON contacts(email);
CREATE INDEX IF NOT EXISTS contacts_phone_idx     ON contacts(phone_number);
CREATE INDEX IF NOT EXISTS contacts_linked_id_idx ON contacts(linked_id);
CREATE INDEX IF NOT EXISTS contacts_created_idx   ON contacts(created_at, id);

PRAGMA user_version = 1;
";
