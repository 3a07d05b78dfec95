//! Cascade deletion over owned record graphs.
//!
//! # Responsibility
//! - Delete root records together with every record they exclusively own.
//! - Discover the graph from each record type's static schema.
//!
//! # Invariants
//! - Children are deleted before their owners (depth-first post-order).
//! - Each `(type_name, key)` is visited at most once, so cycles terminate and
//!   shared descendants are deleted exactly once.
//! - Unowned references are never followed.
//! - A descendant still owned by a record outside this deletion is kept,
//!   together with everything reachable only through it. Roots are always
//!   deleted.
//! - Runs inside the caller's write transaction; any fault aborts the walk and
//!   propagates so nothing is committed.

use crate::model::schema::{FieldReference, RecordSchema};
use crate::repo::record_repo::{RecordKey, RecordRepository, SqliteRecordRepository};
use crate::repo::StoreResult;
use log::debug;
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};

/// What one cascade removed and what it kept because of outside owners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    /// Deleted records, in deletion order.
    pub deleted: Vec<RecordKey>,
    pub retained: Vec<RecordKey>,
}

/// Deletes `root_keys` of type `schema` and their exclusively owned subgraphs.
///
/// Missing roots are skipped.
pub fn delete_cascade(
    conn: &Connection,
    schema: &'static RecordSchema,
    root_keys: &[String],
) -> StoreResult<CascadeOutcome> {
    let store = SqliteRecordRepository::new(conn);
    let roots: HashSet<RecordKey> = root_keys
        .iter()
        .map(|key| RecordKey::new(schema.type_name, key.as_str()))
        .collect();

    let order = plan_post_order(&store, schema, root_keys)?;
    let (members, retained) = prune_externally_owned(&store, &order, &roots)?;

    let mut deleted = Vec::with_capacity(members.len());
    for id in order {
        if !members.contains(&id) {
            continue;
        }
        if store.delete(&id.type_name, &id.key)? {
            debug!(
                "event=cascade_delete module=cascade status=ok type={} key={}",
                id.type_name, id.key
            );
            deleted.push(id);
        }
    }

    Ok(CascadeOutcome { deleted, retained })
}

struct Frame {
    id: RecordKey,
    children: std::vec::IntoIter<FieldReference>,
}

/// Walks owned references depth-first and returns nodes in post-order.
fn plan_post_order<S: RecordRepository>(
    store: &S,
    schema: &'static RecordSchema,
    root_keys: &[String],
) -> StoreResult<Vec<RecordKey>> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();

    for key in root_keys {
        let Some(root) = enter(store, &mut visited, schema, key)? else {
            continue;
        };
        let mut stack = vec![root];
        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            match frame.children.next() {
                Some(child) => {
                    if let Some(next) = enter(store, &mut visited, child.target, &child.key)? {
                        stack.push(next);
                    }
                }
                None => {
                    if let Some(done) = stack.pop() {
                        order.push(done.id);
                    }
                }
            }
        }
    }

    Ok(order)
}

/// Marks a node visited and loads its owned children.
///
/// Returns `None` for nodes already visited in this walk or already gone
/// from storage.
fn enter<S: RecordRepository>(
    store: &S,
    visited: &mut HashSet<RecordKey>,
    schema: &'static RecordSchema,
    key: &str,
) -> StoreResult<Option<Frame>> {
    let id = RecordKey::new(schema.type_name, key);
    if !visited.insert(id.clone()) {
        return Ok(None);
    }
    let Some(document) = store.fetch_document(schema.type_name, key)? else {
        return Ok(None);
    };
    Ok(Some(Frame {
        id,
        children: schema.owned_children_in(&document).into_iter(),
    }))
}

/// Drops non-root nodes that still have an owner outside the deletion set,
/// repeating until no more nodes drop out.
fn prune_externally_owned<S: RecordRepository>(
    store: &S,
    order: &[RecordKey],
    roots: &HashSet<RecordKey>,
) -> StoreResult<(HashSet<RecordKey>, Vec<RecordKey>)> {
    let mut owners: HashMap<&RecordKey, Vec<RecordKey>> = HashMap::new();
    for id in order.iter().filter(|id| !roots.contains(*id)) {
        owners.insert(id, store.owners_of(&id.type_name, &id.key)?);
    }

    let mut members: HashSet<RecordKey> = order.iter().cloned().collect();
    let mut retained = Vec::new();
    loop {
        let before = members.len();
        for id in order {
            let Some(id_owners) = owners.get(id) else {
                continue;
            };
            if !members.contains(id) {
                continue;
            }
            if id_owners.iter().any(|owner| !members.contains(owner)) {
                members.remove(id);
                retained.push(id.clone());
            }
        }
        if members.len() == before {
            break;
        }
    }

    Ok((members, retained))
}
