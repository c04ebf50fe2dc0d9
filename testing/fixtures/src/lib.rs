//! Record types with generated accessors, shared by the SQLite tests.

pub mod model;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/person.rs"));
    include!(concat!(env!("OUT_DIR"), "/document.rs"));
    include!(concat!(env!("OUT_DIR"), "/membership.rs"));
    include!(concat!(env!("OUT_DIR"), "/noted.rs"));
}

/// Schema matching the fixtures in `model`.
pub const SCHEMA: &str = "
CREATE TABLE person (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(80),
    created_at TIMESTAMP
);

CREATE TABLE document (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body TEXT,
    attachment BLOB,
    created_by TEXT NOT NULL,
    updated_by TEXT,
    reviewer TEXT,
    score INTEGER
);

CREATE TABLE membership (
    group_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    active INTEGER NOT NULL,
    PRIMARY KEY (group_id, user_id)
);

CREATE TABLE noted (
    id INTEGER PRIMARY KEY,
    text TEXT,
    extra TEXT,
    weight INTEGER
);
";

/// Seed rows for `person`, ids 1 through 5.
pub const SEED: &str = r#"
INSERT INTO person (name, created_at) VALUES
    ('Alberto',     '2018-03-05 12:34:56'),
    ('Lamimi',      '2018-04-06 01:23:45'),
    ('Naillebert',  '2018-05-07 12:34:56'),
    ('Blanhaerz',   '2018-06-09 12:34:56'),
    ('J''rhoomale', '2018-06-11 12:34:56');
"#;
