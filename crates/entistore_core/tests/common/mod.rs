#![allow(dead_code)]

use entistore_core::db::resolve_location;
use entistore_core::{
    Entity, FieldSchema, GenericDao, Record, RecordSchema, StoreConfig, StoreLocation, Translator,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------- task

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub rank: i64,
    pub done: bool,
}

impl Entity for Task {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub rank: i64,
    pub done: bool,
    /// Storage-only; no translator maps it.
    pub sync_token: Option<String>,
}

pub static TASK_SCHEMA: RecordSchema = RecordSchema {
    type_name: "task",
    fields: &[
        FieldSchema::scalar("id"),
        FieldSchema::scalar("title"),
        FieldSchema::scalar("rank"),
        FieldSchema::scalar("done"),
        FieldSchema::scalar("sync_token"),
    ],
};

fn task_schema() -> &'static RecordSchema {
    &TASK_SCHEMA
}

impl Record for TaskRecord {
    fn schema() -> &'static RecordSchema {
        &TASK_SCHEMA
    }

    fn primary_key(&self) -> &str {
        &self.id
    }
}

pub struct TaskTranslator;

impl Translator for TaskTranslator {
    type Entity = Task;
    type Record = TaskRecord;

    fn fill_record(record: &mut TaskRecord, entity: &Task) {
        record.id = entity.id.clone();
        record.title = entity.title.clone();
        record.rank = entity.rank;
        record.done = entity.done;
    }

    fn fill_entity(entity: &mut Task, record: &TaskRecord) {
        entity.id = record.id.clone();
        entity.title = record.title.clone();
        entity.rank = record.rank;
        entity.done = record.done;
    }
}

pub type TaskDao = GenericDao<TaskTranslator>;

pub fn task(id: &str, title: &str, rank: i64) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        rank,
        done: false,
    }
}

// ---------------------------------------------------------------- node

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub children: Vec<String>,
    pub attachment: Option<String>,
    pub links: Vec<String>,
    pub pinned_task: Option<String>,
}

impl Entity for Node {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    pub tags: Vec<String>,
    pub children: Vec<String>,
    pub attachment: Option<String>,
    pub links: Vec<String>,
    pub pinned_task: Option<String>,
}

pub static NODE_SCHEMA: RecordSchema = RecordSchema {
    type_name: "node",
    fields: &[
        FieldSchema::scalar("id"),
        FieldSchema::scalar("label"),
        FieldSchema::scalar_list("tags"),
        FieldSchema::owned_list("children", node_schema),
        FieldSchema::owned("attachment", attachment_schema),
        FieldSchema::unowned_list("links", node_schema),
        FieldSchema::unowned("pinned_task", task_schema),
    ],
};

fn node_schema() -> &'static RecordSchema {
    &NODE_SCHEMA
}

impl Record for NodeRecord {
    fn schema() -> &'static RecordSchema {
        &NODE_SCHEMA
    }

    fn primary_key(&self) -> &str {
        &self.id
    }
}

pub struct NodeTranslator;

impl Translator for NodeTranslator {
    type Entity = Node;
    type Record = NodeRecord;

    fn fill_record(record: &mut NodeRecord, entity: &Node) {
        record.id = entity.id.clone();
        record.label = entity.label.clone();
        record.children = entity.children.clone();
        record.attachment = entity.attachment.clone();
        record.links = entity.links.clone();
        record.pinned_task = entity.pinned_task.clone();
    }

    fn fill_entity(entity: &mut Node, record: &NodeRecord) {
        entity.id = record.id.clone();
        entity.label = record.label.clone();
        entity.children = record.children.clone();
        entity.attachment = record.attachment.clone();
        entity.links = record.links.clone();
        entity.pinned_task = record.pinned_task.clone();
    }
}

pub type NodeDao = GenericDao<NodeTranslator>;

pub fn node(id: &str, children: &[&str]) -> Node {
    Node {
        id: id.to_string(),
        label: format!("node {id}"),
        children: children.iter().map(|child| child.to_string()).collect(),
        ..Node::default()
    }
}

// ---------------------------------------------------------- attachment

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachment {
    pub id: String,
    pub file_name: String,
}

impl Entity for Attachment {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentRecord {
    pub id: String,
    pub file_name: String,
}

pub static ATTACHMENT_SCHEMA: RecordSchema = RecordSchema {
    type_name: "attachment",
    fields: &[FieldSchema::scalar("id"), FieldSchema::scalar("file_name")],
};

fn attachment_schema() -> &'static RecordSchema {
    &ATTACHMENT_SCHEMA
}

impl Record for AttachmentRecord {
    fn schema() -> &'static RecordSchema {
        &ATTACHMENT_SCHEMA
    }

    fn primary_key(&self) -> &str {
        &self.id
    }
}

pub struct AttachmentTranslator;

impl Translator for AttachmentTranslator {
    type Entity = Attachment;
    type Record = AttachmentRecord;

    fn fill_record(record: &mut AttachmentRecord, entity: &Attachment) {
        record.id = entity.id.clone();
        record.file_name = entity.file_name.clone();
    }

    fn fill_entity(entity: &mut Attachment, record: &AttachmentRecord) {
        entity.id = record.id.clone();
        entity.file_name = record.file_name.clone();
    }
}

pub type AttachmentDao = GenericDao<AttachmentTranslator>;

pub fn attachment(id: &str) -> Attachment {
    Attachment {
        id: id.to_string(),
        file_name: format!("{id}.bin"),
    }
}

// ------------------------------------------------------------- storage

pub fn memory_config() -> StoreConfig {
    StoreConfig {
        location: StoreLocation::unique_in_memory(),
        ..StoreConfig::default()
    }
}

/// Opens a plain handle on the same store, bypassing the DAO.
pub fn raw_handle(config: &StoreConfig) -> Connection {
    let path = resolve_location(&config.location).unwrap();
    Connection::open(path).unwrap()
}

pub fn count_records(conn: &Connection, type_name: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM records WHERE type_name = ?1;",
        [type_name],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn record_exists(conn: &Connection, type_name: &str, key: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM records WHERE type_name = ?1 AND record_key = ?2
            );",
            [type_name, key],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}
