//! Build-time and run-time failures.

#[path = "../common/mod.rs"]
mod common;

use std::error::Error as _;

use common::{seeded, Member, Team};
use quarry::prelude::*;

#[test]
fn test_fetch_one_with_many_rows() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let result = query
        .select_from(&m)
        .filter(m.get(Member::AGE).gt(15))
        .fetch_one();
    assert!(matches!(result, Err(QueryError::NonUniqueResult { count: 2 })));
}

#[test]
fn test_execution_failure_keeps_sql_and_cause() {
    let db = Database::open_in_memory().unwrap();
    let source = db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let err = query.select_from(&m).fetch().unwrap_err();
    match &err {
        QueryError::Execution { sql, source } => {
            assert!(sql.contains("FROM \"member\" AS \"member1\""), "{sql}");
            assert!(source.to_string().contains("no such table"), "{source}");
        }
        other => panic!("expected Execution, got {other:?}"),
    }
    assert!(err.source().is_some());
}

#[test]
fn test_type_mismatch() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    // A text column read as an integer.
    let wrong: Expression<i32> = Expression::from_expr(m.get(Member::USERNAME).into_expr());
    let result = query.select(wrong).from(&m).fetch();
    assert!(matches!(result, Err(QueryError::TypeMismatch { .. })));
}

#[test]
fn test_duplicate_alias() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let again = EntityPath::<Member>::new();

    let result = query.select_from(&m).join_entity(&again).fetch();
    match result {
        Err(QueryError::DuplicateAlias { alias }) => assert_eq!(alias, "member1"),
        other => panic!("expected DuplicateAlias, got {other:?}"),
    }
}

#[test]
fn test_missing_from() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let t = EntityPath::<Team>::new();

    let result = query.select(t.get(Team::NAME)).fetch();
    assert!(matches!(result, Err(QueryError::InvalidPlan(_))));
}

#[test]
fn test_aggregate_in_where() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let result = query
        .select_from(&m)
        .filter(m.get(Member::AGE).max().gt(10))
        .fetch_count();
    assert!(matches!(result, Err(QueryError::InvalidPlan(_))));
}

#[test]
fn test_missing_tuple_target() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let rows = query
        .select(Projections::tuple((m.get(Member::USERNAME),)))
        .from(&m)
        .fetch()
        .unwrap();

    let err = rows[0].get(&m.get(Member::AGE)).unwrap_err();
    assert!(matches!(err, QueryError::MissingTarget(label) if label == "member1.age"));
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let mut fx = seeded();
    let m = EntityPath::<Member>::new();

    let result: QueryResult<()> = fx.db.transaction(|source| {
        source.persist(&mut Member::new("ghost", 99, None))?;
        let query = QueryFactory::new(source);
        // fetch_one over several rows fails inside the transaction
        query.select_from(&m).fetch_one()?;
        Ok(())
    });
    assert!(matches!(result, Err(QueryError::NonUniqueResult { .. })));

    let source = fx.db.source();
    let count = QueryFactory::new(&source).select_from(&m).fetch_count().unwrap();
    assert_eq!(count, 4);
}

#[test]
fn test_transaction_commits_on_success() {
    let mut fx = seeded();
    let m = EntityPath::<Member>::new();

    let key = fx
        .db
        .transaction(|source| source.persist(&mut Member::new("member5", 50, None)))
        .unwrap();

    let source = fx.db.source();
    let found = source.find_by_key::<Member>(key).unwrap().expect("committed");
    assert_eq!(found.username.as_deref(), Some("member5"));
    assert_eq!(
        QueryFactory::new(&source).select_from(&m).fetch_count().unwrap(),
        5
    );
}
