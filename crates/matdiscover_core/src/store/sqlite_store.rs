//! SQLite-backed provenance store.
//!
//! # Responsibility
//! - Answer `ProvenanceStore` queries with SQL over the provenance schema.
//! - Own the connection lifecycle (open, close).
//!
//! # Invariants
//! - Every query is bounded by the connection busy timeout.
//! - Rows with malformed ids, node types or JSON payloads are rejected,
//!   not skipped.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::node::{NodeType, StoreNode};
use crate::store::{
    GroupedNode, LinkedOutput, ProvenanceStore, StoreError, StoreResult, TaggedNodeQuery,
};
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::Map;
use std::path::Path;
use std::time::{Duration, Instant};
use uuid::Uuid;

const NODE_COLUMNS: &str = "n.uuid AS uuid,
    n.node_type AS node_type,
    n.label AS label,
    n.tag AS tag,
    n.attributes AS attributes,
    n.extras AS extras,
    n.content AS content";

/// Provenance store over one SQLite connection.
pub struct SqliteProvenanceStore {
    conn: Connection,
}

impl SqliteProvenanceStore {
    /// Opens (and migrates) an existing store file; `query_timeout` bounds
    /// lock waits. A missing file is `StoreError::Unavailable`.
    pub fn open(path: impl AsRef<Path>, query_timeout: Duration) -> StoreResult<Self> {
        let conn = open_db(path, query_timeout)?;
        Ok(Self { conn })
    }

    /// Opens an empty, migrated in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self { conn })
    }

    /// Wraps a connection that was opened through `crate::db`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Borrow of the underlying connection, for fixture seeding.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, surfacing any close-time failure.
    pub fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .map_err(|(_, err)| StoreError::Unavailable(DbError::Sqlite(err)))
    }
}

impl ProvenanceStore for SqliteProvenanceStore {
    fn tagged_nodes(&self, query: &TaggedNodeQuery) -> StoreResult<Vec<GroupedNode>> {
        let started_at = Instant::now();
        let mut bind_values: Vec<Value> = Vec::new();

        let mut sql = match query.material_ids.as_ref() {
            Some(ids) if ids.is_empty() => return Ok(Vec::new()),
            Some(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                bind_values.extend(ids.iter().cloned().map(Value::Text));
                format!(
                    "SELECT DISTINCT m.label AS material_id, g.label AS group_label, {NODE_COLUMNS}
                     FROM node_groups g
                     JOIN group_members gm ON gm.group_id = g.id
                     JOIN nodes m ON m.uuid = gm.node_uuid
                        AND m.node_type = 'structure'
                        AND m.label IN ({placeholders})
                     JOIN group_members gn ON gn.group_id = g.id
                     JOIN nodes n ON n.uuid = gn.node_uuid
                     WHERE n.tag IS NOT NULL"
                )
            }
            None => format!(
                "SELECT NULL AS material_id, g.label AS group_label, {NODE_COLUMNS}
                 FROM node_groups g
                 JOIN group_members gn ON gn.group_id = g.id
                 JOIN nodes n ON n.uuid = gn.node_uuid
                 WHERE n.tag IS NOT NULL"
            ),
        };

        sql.push_str(" AND g.label LIKE ? ESCAPE '\\'");
        bind_values.push(Value::Text(query.group_pattern.clone()));

        if let Some(tag_pattern) = query.tag_pattern.as_ref() {
            sql.push_str(" AND n.tag LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(tag_pattern.clone()));
        }

        sql.push_str(" ORDER BY g.label ASC, n.label ASC, n.uuid ASC");

        let result = (|| -> StoreResult<Vec<GroupedNode>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut found = Vec::new();
            while let Some(row) = rows.next()? {
                found.push(GroupedNode {
                    group_label: row.get("group_label")?,
                    material_id: row.get("material_id")?,
                    node: parse_node_row(row)?,
                });
            }
            Ok(found)
        })();

        log_query("tagged_nodes", started_at, &result);
        result
    }

    fn multi_temperature_outputs(&self, group_pattern: &str) -> StoreResult<Vec<LinkedOutput>> {
        let started_at = Instant::now();
        let sql = format!(
            "SELECT DISTINCT
                mt_out.tag AS origin_tag,
                g.label AS group_label,
                call_link.label AS call_label,
                {NODE_COLUMNS}
             FROM node_groups g
             JOIN group_members gm ON gm.group_id = g.id
             JOIN nodes mt_out ON mt_out.uuid = gm.node_uuid
                AND mt_out.tag LIKE 'isotmt\\_%' ESCAPE '\\'
             JOIN links create_link ON create_link.target_uuid = mt_out.uuid
                AND create_link.link_type = 'create'
             JOIN nodes batch_wc ON batch_wc.uuid = create_link.source_uuid
                AND batch_wc.node_type = 'workchain'
             JOIN links call_link ON call_link.source_uuid = batch_wc.uuid
                AND call_link.link_type = 'call'
                AND call_link.label LIKE 'run\\_isotherm\\_%' ESCAPE '\\'
             JOIN nodes child_wc ON child_wc.uuid = call_link.target_uuid
                AND child_wc.node_type = 'workchain'
             JOIN links output_link ON output_link.source_uuid = child_wc.uuid
                AND output_link.link_type = 'create'
                AND output_link.label = 'output_parameters'
             JOIN nodes n ON n.uuid = output_link.target_uuid
                AND n.node_type = 'record'
             WHERE g.label LIKE ?1 ESCAPE '\\'
             ORDER BY g.label ASC, call_link.label ASC, n.uuid ASC"
        );

        let result = (|| -> StoreResult<Vec<LinkedOutput>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query([group_pattern])?;
            let mut found = Vec::new();
            while let Some(row) = rows.next()? {
                found.push(LinkedOutput {
                    origin_tag: row.get("origin_tag")?,
                    group_label: row.get("group_label")?,
                    node: parse_node_row(row)?,
                });
            }
            Ok(found)
        })();

        log_query("multi_temperature_outputs", started_at, &result);
        result
    }

    fn revision(&self) -> StoreResult<i64> {
        let revision = self.conn.query_row(
            "SELECT value FROM store_meta WHERE key = 'revision';",
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(revision)
    }
}

fn log_query<T>(query: &str, started_at: Instant, result: &StoreResult<Vec<T>>) {
    match result {
        Ok(rows) => debug!(
            "event=store_query module=store status=ok query={} rows={} duration_ms={}",
            query,
            rows.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=store_query module=store status=error query={} duration_ms={} error={}",
            query,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

fn parse_node_row(row: &Row<'_>) -> StoreResult<StoreNode> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{uuid_text}` in nodes.uuid"))
    })?;

    let type_text: String = row.get("node_type")?;
    let node_type = NodeType::parse(&type_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid node type `{type_text}` in nodes.node_type"
        ))
    })?;

    let attributes = parse_json_object(row.get("attributes")?, "nodes.attributes", &uuid_text)?;
    let extras = parse_json_object(row.get("extras")?, "nodes.extras", &uuid_text)?;

    Ok(StoreNode {
        uuid,
        node_type,
        label: row.get("label")?,
        tag: row.get("tag")?,
        attributes,
        extras,
        content: row.get("content")?,
    })
}

fn parse_json_object(
    raw: String,
    column: &str,
    uuid: &str,
) -> StoreResult<Map<String, serde_json::Value>> {
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::InvalidData(format!(
            "{column} of node {uuid} is not a JSON object"
        ))),
        Err(err) => Err(StoreError::InvalidData(format!(
            "{column} of node {uuid} is not valid JSON: {err}"
        ))),
    }
}
