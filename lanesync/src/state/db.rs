use std::path::Path;
use anyhow::{Context, Result};
use rusqlite::{Connection, params, OptionalExtension};
use shared::types::{Auth, NodeDescriptor};

const CURRENT_USER_KEY: &str = "current_user";

/// Local copy of the dashboard's working configuration.
pub struct StateDb {
    conn: Connection,
}

impl StateDb {
    /// Open or create the SQLite database with WAL mode enabled
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL mode")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                position        INTEGER PRIMARY KEY,
                name            TEXT NOT NULL,
                address         TEXT NOT NULL,
                port            INTEGER NOT NULL,
                path_root       TEXT NOT NULL,
                sos_endpoint    TEXT NOT NULL,
                config_endpoint TEXT NOT NULL,
                api_endpoint    TEXT NOT NULL,
                username        TEXT NOT NULL,
                password        TEXT NOT NULL,
                secure          INTEGER NOT NULL,
                is_default      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .context("Failed to create database schema")?;

        Ok(Self { conn })
    }

    /// Replace the whole node list, keeping its order. Returns true if data changed.
    pub fn replace_nodes(&mut self, nodes: &[NodeDescriptor]) -> Result<bool> {
        let existing = self.get_nodes()?;
        if existing == nodes {
            return Ok(false);
        }

        let tx = self.conn.transaction().context("Failed to begin transaction")?;
        tx.execute("DELETE FROM nodes", [])
            .context("Failed to clear nodes")?;

        for (position, node) in nodes.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO nodes (
                    position, name, address, port, path_root, sos_endpoint,
                    config_endpoint, api_endpoint, username, password, secure, is_default
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    position as i64,
                    &node.name,
                    &node.address,
                    node.port,
                    &node.path_root,
                    &node.sos_endpoint,
                    &node.config_endpoint,
                    &node.api_endpoint,
                    &node.auth.username,
                    &node.auth.password,
                    node.secure as i32,
                    node.is_default as i32,
                ],
            )
            .with_context(|| format!("Failed to insert node {}", node.address))?;
        }

        tx.commit().context("Failed to commit node list")?;
        Ok(true)
    }

    /// All nodes in their stored order
    pub fn get_nodes(&self) -> Result<Vec<NodeDescriptor>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name, address, port, path_root, sos_endpoint, config_endpoint,
                        api_endpoint, username, password, secure, is_default
                 FROM nodes ORDER BY position"
            )
            .context("Failed to prepare query")?;

        let nodes = stmt
            .query_map([], Self::row_to_node)
            .context("Failed to query nodes")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect nodes")?;

        Ok(nodes)
    }

    /// Record the active user. Returns true if data changed.
    pub fn set_current_user(&self, user: &str) -> Result<bool> {
        if self.get_current_user()?.as_deref() == Some(user) {
            return Ok(false);
        }

        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CURRENT_USER_KEY, user],
        )
        .context("Failed to store current user")?;

        Ok(true)
    }

    pub fn get_current_user(&self) -> Result<Option<String>> {
        let user = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![CURRENT_USER_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query current user")?;

        Ok(user)
    }

    fn row_to_node(row: &rusqlite::Row) -> Result<NodeDescriptor, rusqlite::Error> {
        let secure: i32 = row.get(9)?;
        let is_default: i32 = row.get(10)?;

        Ok(NodeDescriptor {
            name: row.get(0)?,
            address: row.get(1)?,
            port: row.get::<_, u16>(2)?,
            path_root: row.get(3)?,
            sos_endpoint: row.get(4)?,
            config_endpoint: row.get(5)?,
            api_endpoint: row.get(6)?,
            auth: Auth {
                username: row.get(7)?,
                password: row.get(8)?,
            },
            secure: secure != 0,
            is_default: is_default != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_node(name: &str) -> NodeDescriptor {
        NodeDescriptor {
            name: name.to_string(),
            address: format!("{}.lanes.local", name.to_lowercase()),
            port: 8282,
            auth: Auth::new("admin", "secret"),
            ..NodeDescriptor::default()
        }
    }

    #[test]
    fn test_replace_and_query() {
        let mut db = StateDb::open(":memory:").unwrap();
        let nodes = vec![test_node("B"), test_node("A")];

        let changed = db.replace_nodes(&nodes).unwrap();
        assert!(changed, "First write should report change");

        let retrieved = db.get_nodes().unwrap();
        assert_eq!(retrieved, nodes, "Order and fields must survive storage");
    }

    #[test]
    fn test_replace_is_not_merge() {
        let mut db = StateDb::open(":memory:").unwrap();

        db.replace_nodes(&[test_node("A"), test_node("B")]).unwrap();
        db.replace_nodes(&[test_node("C")]).unwrap();

        let retrieved = db.get_nodes().unwrap();
        assert_eq!(retrieved.len(), 1);
        assert_eq!(retrieved[0].name, "C");
    }

    #[test]
    fn test_replace_detects_changes() {
        let mut db = StateDb::open(":memory:").unwrap();
        let mut nodes = vec![test_node("A")];

        db.replace_nodes(&nodes).unwrap();

        let changed = db.replace_nodes(&nodes).unwrap();
        assert!(!changed, "Identical write should not report change");

        nodes[0].secure = true;
        let changed = db.replace_nodes(&nodes).unwrap();
        assert!(changed, "Modified node should report change");
    }

    #[test]
    fn test_current_user() {
        let db = StateDb::open(":memory:").unwrap();
        assert_eq!(db.get_current_user().unwrap(), None);

        assert!(db.set_current_user("operator").unwrap());
        assert!(!db.set_current_user("operator").unwrap());
        assert!(db.set_current_user("supervisor").unwrap());

        assert_eq!(db.get_current_user().unwrap().as_deref(), Some("supervisor"));
    }
}
