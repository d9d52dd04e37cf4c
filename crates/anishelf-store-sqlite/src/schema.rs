//! SQL schema for the anishelf SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    avatar_path TEXT,
    role        TEXT NOT NULL DEFAULT 'user',  -- 'user' | 'moderator' | 'admin'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS anime (
    anime_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    alt_title   TEXT,
    kind        TEXT NOT NULL,
    year        INTEGER NOT NULL,           -- year of season_date
    genres      TEXT NOT NULL DEFAULT '[]', -- JSON array of names
    episodes    INTEGER CHECK (episodes >= 0),
    status      TEXT NOT NULL,
    source      TEXT,
    season_date TEXT NOT NULL,              -- YYYY-MM-DD
    description TEXT,
    trailer_url TEXT,
    cover_path  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    studios         TEXT NOT NULL DEFAULT '[]', -- JSON array of studio ids, lead first
    main_characters TEXT NOT NULL DEFAULT '[]', -- JSON array of {id, name, voice_actor}
    mpaa_rating     TEXT,
    age_rating      TEXT,
    duration        TEXT
);

-- One row per related-anime edge. The inverse edge lives in its own row
-- owned by the other anime; the store keeps both in step on every save.
CREATE TABLE IF NOT EXISTS anime_relations (
    anime_id         INTEGER NOT NULL REFERENCES anime(anime_id) ON DELETE CASCADE,
    related_anime_id INTEGER NOT NULL REFERENCES anime(anime_id) ON DELETE CASCADE,
    relation_type    TEXT NOT NULL,
    position         INTEGER NOT NULL,      -- order within the owner's list
    UNIQUE (anime_id, related_anime_id, relation_type)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    anime_id   INTEGER NOT NULL REFERENCES anime(anime_id) ON DELETE CASCADE,
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    parent_id  INTEGER REFERENCES comments(comment_id) ON DELETE CASCADE,
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comment_reactions (
    comment_id INTEGER NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    value      INTEGER NOT NULL CHECK (value IN (1, -1)),
    PRIMARY KEY (comment_id, user_id)
);

CREATE TABLE IF NOT EXISTS anime_lists (
    entry_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    anime_id   INTEGER NOT NULL REFERENCES anime(anime_id) ON DELETE CASCADE,
    status     TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, anime_id)
);

CREATE TABLE IF NOT EXISTS friend_requests (
    request_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    requester_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    addressee_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    status       TEXT NOT NULL DEFAULT 'pending',
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (requester_id, addressee_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    user_id         INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    kind            TEXT NOT NULL,
    data            TEXT NOT NULL,          -- JSON NotificationData
    read_at         TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS anime_relations_owner_idx ON anime_relations(anime_id, position);
CREATE INDEX IF NOT EXISTS comments_anime_idx        ON comments(anime_id);
CREATE INDEX IF NOT EXISTS comments_parent_idx       ON comments(parent_id);
CREATE INDEX IF NOT EXISTS anime_lists_user_idx      ON anime_lists(user_id);
CREATE INDEX IF NOT EXISTS notifications_user_idx    ON notifications(user_id, created_at);

PRAGMA user_version = 1;
";
