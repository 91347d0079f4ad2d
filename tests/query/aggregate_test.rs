//! Aggregates, grouping and HAVING.

#[path = "../common/mod.rs"]
mod common;

use common::{seeded, Member, Team};
use quarry::prelude::*;

#[test]
fn test_aggregate_tuple() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let age = m.get(Member::AGE);

    let stats = query
        .select((count_all(), age.sum(), age.avg(), age.max(), age.min()))
        .from(&m)
        .fetch_one()
        .unwrap();

    assert_eq!(stats, Some((4, 100, 25.0, 40, 10)));
}

#[test]
fn test_aggregate_through_tuple_lookup() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let age = m.get(Member::AGE);
    let (count, sum, avg, max, min) = (m.count(), age.sum(), age.avg(), age.max(), age.min());

    let rows = query
        .select(Projections::tuple((&count, &sum, &avg, &max, &min)))
        .from(&m)
        .fetch()
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get(&count).unwrap(), Some(4));
    assert_eq!(row.get(&sum).unwrap(), Some(100));
    assert_eq!(row.get(&avg).unwrap(), Some(25.0));
    assert_eq!(row.get(&max).unwrap(), Some(40));
    assert_eq!(row.get(&min).unwrap(), Some(10));
}

#[test]
fn test_group_by_team_name() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let t = EntityPath::<Team>::new();

    let averages = query
        .select((t.get(Team::NAME), m.get(Member::AGE).avg()))
        .from(&m)
        .join(m.relation(Member::TEAM), &t)
        .group_by(t.get(Team::NAME))
        .order_by(t.get(Team::NAME).asc())
        .fetch()
        .unwrap();

    assert_eq!(
        averages,
        vec![("teamA".to_string(), 15.0), ("teamB".to_string(), 35.0)]
    );
}

#[test]
fn test_having_filters_groups() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let t = EntityPath::<Team>::new();

    let plan = || {
        query
            .select(t.get(Team::NAME))
            .from(&m)
            .join(m.relation(Member::TEAM), &t)
            .group_by(t.get(Team::NAME))
            .having(m.get(Member::AGE).avg().gt(20.0))
    };

    assert_eq!(plan().fetch().unwrap(), vec!["teamB".to_string()]);
    assert_eq!(plan().fetch_count().unwrap(), 1);
}

#[test]
fn test_count_distinct() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let teams = query
        .select(m.get(Member::TEAM_ID).count_distinct())
        .from(&m)
        .fetch_one()
        .unwrap();
    assert_eq!(teams, Some(2));
}

#[test]
fn test_grouped_count_counts_groups() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let groups = query
        .select((m.get(Member::TEAM_ID), m.count()))
        .from(&m)
        .group_by(m.get(Member::TEAM_ID))
        .fetch_count()
        .unwrap();
    assert_eq!(groups, 2);
}

#[test]
fn test_integer_sum_beyond_i32() {
    let fx = seeded();
    let source = fx.db.source();
    for name in ["big1", "big2"] {
        source
            .persist(&mut Member::new(name, i32::MAX, None))
            .unwrap();
    }

    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let total: i64 = query
        .select(m.get(Member::AGE).sum())
        .from(&m)
        .fetch_one()
        .unwrap()
        .expect("one row");

    assert_eq!(total, 100 + 2 * i64::from(i32::MAX));
}
