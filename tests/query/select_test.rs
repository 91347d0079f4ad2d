//! Basic selection, filtering and sorting against the seeded member table.

#[path = "../common/mod.rs"]
mod common;

use common::{empty, seeded, sorted, Member, Team};
use quarry::prelude::*;

fn usernames(members: Vec<Member>) -> Vec<String> {
    members.into_iter().filter_map(|m| m.username).collect()
}

#[test]
fn test_find_entity_by_username() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let found = query
        .select_from(&m)
        .filter(m.get(Member::USERNAME).eq("member1"))
        .fetch_one()
        .unwrap()
        .expect("member1 exists");

    assert_eq!(found.age, Some(10));
    assert_eq!(found.team_id, fx.team_a.id);
}

#[test]
fn test_chained_and_equals_separate_predicates() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let chained = query
        .select_from(&m)
        .filter(
            m.get(Member::USERNAME)
                .starts_with("member")
                .and(m.get(Member::AGE).between(10, 30)),
        )
        .fetch()
        .unwrap();
    let separate = query
        .select_from(&m)
        .filter_all([
            m.get(Member::USERNAME).starts_with("member"),
            m.get(Member::AGE).between(10, 30),
        ])
        .fetch()
        .unwrap();

    assert_eq!(chained.len(), 3);
    assert_eq!(sorted(usernames(chained)), sorted(usernames(separate)));
}

#[test]
fn test_select_scalar_column() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let names: Vec<String> = query
        .select(m.get(Member::USERNAME))
        .from(&m)
        .order_by(m.get(Member::USERNAME).desc())
        .fetch()
        .unwrap();

    assert_eq!(names, vec!["member4", "member3", "member2", "member1"]);
}

#[test]
fn test_predicate_operators() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let age = m.get(Member::AGE);

    let count = |predicate: Predicate| {
        query
            .select_from(&m)
            .filter(predicate)
            .fetch_count()
            .unwrap()
    };

    assert_eq!(count(age.ne(10)), 3);
    assert_eq!(count(age.gte(30)), 2);
    assert_eq!(count(age.lt(30)), 2);
    assert_eq!(count(age.lte(30)), 3);
    assert_eq!(count(age.in_list([10, 40, 99])), 2);
    assert_eq!(count(age.not_in([10, 40])), 2);
    assert_eq!(count(age.in_list(Vec::<i32>::new())), 0);
    assert_eq!(count(age.not_between(15, 35)), 2);
    assert_eq!(count(m.get(Member::USERNAME).like("member_")), 4);
    assert_eq!(count(m.get(Member::USERNAME).contains("ber3")), 1);
    assert_eq!(count(age.gt(10).or(age.eq(10)).not()), 0);
    assert_eq!(count(m.get(Member::USERNAME).is_null()), 0);
    assert_eq!(count(m.get(Member::USERNAME).is_not_null()), 4);
}

#[test]
fn test_fetch_on_no_match_is_empty() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let none = query
        .select_from(&m)
        .filter(m.get(Member::AGE).gt(1000))
        .fetch()
        .unwrap();
    assert!(none.is_empty());

    let one = query
        .select_from(&m)
        .filter(m.get(Member::AGE).gt(1000))
        .fetch_one()
        .unwrap();
    assert!(one.is_none());
}

#[test]
fn test_fetch_first_follows_ordering() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let oldest = query
        .select(m.get(Member::USERNAME))
        .from(&m)
        .order_by(m.get(Member::AGE).desc())
        .fetch_first()
        .unwrap();
    assert_eq!(oldest.as_deref(), Some("member4"));
}

#[test]
fn test_fetch_count_without_filter_is_table_size() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let t = EntityPath::<Team>::new();

    assert_eq!(query.select_from(&m).fetch_count().unwrap(), 4);
    assert_eq!(
        query
            .select(m.get(Member::USERNAME))
            .from(&m)
            .order_by(m.get(Member::AGE).asc())
            .limit(1)
            .fetch_count()
            .unwrap(),
        4
    );
    assert_eq!(query.select_from(&t).fetch_count().unwrap(), 2);
}

#[test]
fn test_distinct() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let teams: Vec<i64> = query
        .select(m.get(Member::TEAM_ID))
        .from(&m)
        .distinct()
        .order_by(m.get(Member::TEAM_ID).asc())
        .fetch()
        .unwrap();
    assert_eq!(teams.len(), 2);

    let count = query
        .select(m.get(Member::TEAM_ID))
        .from(&m)
        .distinct()
        .fetch_count()
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_sort_nulls_last_regardless_of_direction() {
    let fx = seeded();
    let source = fx.db.source();
    for (name, age) in [(None, 100), (Some("member5"), 100), (Some("member6"), 100)] {
        let mut member = Member {
            username: name.map(str::to_string),
            age: Some(age),
            ..Member::default()
        };
        source.persist(&mut member).unwrap();
    }

    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let asc: Vec<Option<String>> = query
        .select(m.get(Member::USERNAME).nullable())
        .from(&m)
        .filter(m.get(Member::AGE).eq(100))
        .order_by(m.get(Member::AGE).desc())
        .order_by(m.get(Member::USERNAME).asc().nulls_last())
        .fetch()
        .unwrap();
    assert_eq!(
        asc,
        vec![Some("member5".to_string()), Some("member6".to_string()), None]
    );

    let desc: Vec<Option<String>> = query
        .select(m.get(Member::USERNAME).nullable())
        .from(&m)
        .filter(m.get(Member::AGE).eq(100))
        .order_by(m.get(Member::USERNAME).desc().nulls_last())
        .fetch()
        .unwrap();
    assert_eq!(
        desc,
        vec![Some("member6".to_string()), Some("member5".to_string()), None]
    );

    let first: Vec<Option<String>> = query
        .select(m.get(Member::USERNAME).nullable())
        .from(&m)
        .filter(m.get(Member::AGE).eq(100))
        .order_by(m.get(Member::USERNAME).desc().nulls_first())
        .fetch()
        .unwrap();
    assert_eq!(first[0], None);
}

#[test]
fn test_aliased_paths_for_self_join() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let older = EntityPath::<Member>::aliased("older");

    // Pairs of teammates where the second is older than the first.
    let pairs = query
        .select(Projections::tuple((
            m.get(Member::USERNAME),
            older.get(Member::USERNAME),
        )))
        .from(&m)
        .join_entity(&older)
        .on(older.get(Member::TEAM_ID).eq(m.get(Member::TEAM_ID)))
        .filter(older.get(Member::AGE).gt(m.get(Member::AGE)))
        .order_by(m.get(Member::USERNAME).asc())
        .fetch()
        .unwrap();

    let names: Vec<(String, String)> = pairs
        .iter()
        .map(|t| {
            (
                t.get(&m.get(Member::USERNAME)).unwrap().unwrap(),
                t.get(&older.get(Member::USERNAME)).unwrap().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        names,
        vec![
            ("member1".to_string(), "member2".to_string()),
            ("member3".to_string(), "member4".to_string()),
        ]
    );
}

#[test]
fn test_empty_table() {
    let db = empty();
    let source = db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    assert!(query.select_from(&m).fetch().unwrap().is_empty());
    assert_eq!(query.select_from(&m).fetch_count().unwrap(), 0);
}
