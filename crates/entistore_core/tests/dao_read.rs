mod common;

use common::{memory_config, raw_handle, task, TaskDao};
use entistore_core::{Comparison, Predicate, ReadQuery, SortKey};
use rusqlite::types::Value;

fn ranked_dao() -> TaskDao {
    let dao = TaskDao::new(memory_config()).unwrap();
    dao.persist_all(&[
        task("three", "third", 3),
        task("one", "first", 1),
        task("two", "second", 2),
    ])
    .unwrap();
    dao
}

fn ids(tasks: &[common::Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.id.as_str()).collect()
}

#[test]
fn filter_applies_before_ascending_sort() {
    let dao = ranked_dao();

    let result = dao.read_filtered_sorted(Predicate::gt("rank", 1i64), "rank", true);

    let ranks: Vec<i64> = result.iter().map(|task| task.rank).collect();
    assert_eq!(ranks, vec![2, 3]);
}

#[test]
fn descending_sort_reverses_order() {
    let dao = ranked_dao();

    let result = dao.read_sorted("rank", false);

    assert_eq!(ids(&result), vec!["three", "two", "one"]);
}

#[test]
fn unsorted_reads_keep_insertion_order() {
    let dao = ranked_dao();
    dao.persist(&task("one", "first, edited", 10)).unwrap();

    assert_eq!(ids(&dao.read_all()), vec!["three", "one", "two"]);
}

#[test]
fn filter_without_sort_matches_exact_values() {
    let dao = ranked_dao();

    let result = dao.read_filtered(Predicate::eq("title", "second".to_string()));
    assert_eq!(ids(&result), vec!["two"]);

    let either = Predicate::lt("rank", 2i64).or(Predicate::eq("rank", 3i64));
    assert_eq!(ids(&dao.read_filtered(either)), vec!["three", "one"]);

    let not_two = Predicate::compare("rank", Comparison::Ne, 2i64).and(Predicate::gt("rank", 0i64));
    assert_eq!(ids(&dao.read_filtered(not_two)), vec!["three", "one"]);
}

#[test]
fn null_and_negated_filters() {
    let config = memory_config();
    let dao = TaskDao::new(config.clone()).unwrap();
    dao.persist_all(&[task("a", "synced", 1), task("b", "local", 2)])
        .unwrap();
    raw_handle(&config)
        .execute(
            "UPDATE records SET body = json_set(body, '$.sync_token', 'etag')
             WHERE record_key = 'a';",
            [],
        )
        .unwrap();

    let unsynced = dao.read_filtered(Predicate::IsNull("sync_token".to_string()));
    assert_eq!(ids(&unsynced), vec!["b"]);

    let synced = dao.read_filtered(Predicate::IsNull("sync_token".to_string()).negate());
    assert_eq!(ids(&synced), vec!["a"]);
}

#[test]
fn raw_predicates_pass_through_to_the_engine() {
    let dao = ranked_dao();

    let predicate = Predicate::raw(
        "json_extract(body, '$.rank') BETWEEN ? AND ?",
        vec![Value::Integer(2), Value::Integer(3)],
    );
    let query = ReadQuery::filtered(predicate).with_order(SortKey::descending("title"));

    assert_eq!(ids(&dao.read_query(&query)), vec!["three", "two"]);
}

#[test]
fn missing_id_reads_as_none() {
    let dao = ranked_dao();

    assert!(dao.read("missing").is_none());
}

#[test]
fn invalid_field_path_degrades_to_empty() {
    let dao = ranked_dao();

    assert!(dao.read_sorted("rank; DROP TABLE records", true).is_empty());
    assert!(dao
        .read_filtered(Predicate::eq("bad field", 1i64))
        .is_empty());
    assert_eq!(dao.read_all().len(), 3);
}

#[test]
fn malformed_raw_clause_degrades_to_empty() {
    let dao = ranked_dao();

    let result = dao.read_filtered(Predicate::raw("no_such_function(body)", Vec::new()));

    assert!(result.is_empty());
}

#[test]
fn reads_only_see_their_own_record_type() {
    let config = memory_config();
    let tasks = TaskDao::new(config.clone()).unwrap();
    let nodes = common::NodeDao::new(config).unwrap();
    tasks.persist(&task("shared-id", "task", 1)).unwrap();
    nodes.persist(&common::node("shared-id", &[])).unwrap();

    assert_eq!(tasks.read_all().len(), 1);
    assert_eq!(nodes.read("shared-id").unwrap().label, "node shared-id");
    assert_eq!(tasks.read("shared-id").unwrap().title, "task");
}
