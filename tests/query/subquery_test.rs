//! Sub-queries in WHERE and SELECT positions, correlated and uncorrelated.

#[path = "../common/mod.rs"]
mod common;

use common::{seeded, sorted, Member, Team, UserDto};
use quarry::prelude::*;

#[test]
fn test_equals_max_subquery() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let max_age = SubQueryBuilder::select(sub.get(Member::AGE).max())
        .from(&sub)
        .build()
        .unwrap();

    let oldest = query
        .select_from(&m)
        .filter(m.get(Member::AGE).eq(&max_age))
        .fetch()
        .unwrap();

    assert_eq!(oldest.len(), 1);
    assert_eq!(oldest[0].age, Some(40));
}

#[test]
fn test_at_least_average_subquery() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let average = SubQueryBuilder::select(sub.get(Member::AGE).avg())
        .from(&sub)
        .build()
        .unwrap();

    let ages: Vec<i32> = query
        .select(m.get(Member::AGE))
        .from(&m)
        .filter(m.get(Member::AGE).as_f64().gte(&average))
        .order_by(m.get(Member::AGE).asc())
        .fetch()
        .unwrap();

    assert_eq!(ages, vec![30, 40]);
}

#[test]
fn test_integer_sum_subquery_is_64_bit() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let total_age = SubQueryBuilder::select(sub.get(Member::AGE).sum())
        .from(&sub)
        .build()
        .unwrap();

    // age * 4 >= sum(age) over four rows
    let ages: Vec<i32> = query
        .select(m.get(Member::AGE))
        .from(&m)
        .filter(m.get(Member::AGE).as_i64().mul(4).gte(&total_age))
        .order_by(m.get(Member::AGE).asc())
        .fetch()
        .unwrap();

    assert_eq!(ages, vec![30, 40]);
}

#[test]
fn test_sibling_subqueries_share_alias() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let max_age = SubQueryBuilder::select(sub.get(Member::AGE).max())
        .from(&sub)
        .build()
        .unwrap();
    let min_age = SubQueryBuilder::select(sub.get(Member::AGE).min())
        .from(&sub)
        .build()
        .unwrap();

    let ages: Vec<i32> = query
        .select(m.get(Member::AGE))
        .from(&m)
        .filter(m.get(Member::AGE).lt(&max_age))
        .filter(m.get(Member::AGE).gt(&min_age))
        .order_by(m.get(Member::AGE).asc())
        .fetch()
        .unwrap();

    assert_eq!(ages, vec![20, 30]);
}

#[test]
fn test_in_subquery() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let over_ten = SubQueryBuilder::select(sub.get(Member::AGE))
        .from(&sub)
        .filter(sub.get(Member::AGE).gt(10))
        .build()
        .unwrap();

    let inside = query
        .select(m.get(Member::USERNAME))
        .from(&m)
        .filter(m.get(Member::AGE).in_subquery(&over_ten))
        .fetch()
        .unwrap();
    assert_eq!(sorted(inside), vec!["member2", "member3", "member4"]);

    let outside = query
        .select(m.get(Member::USERNAME))
        .from(&m)
        .filter(m.get(Member::AGE).not_in_subquery(&over_ten))
        .fetch()
        .unwrap();
    assert_eq!(outside, vec!["member1"]);
}

#[test]
fn test_correlated_exists() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let t = EntityPath::<Team>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let has_senior = SubQueryBuilder::select(sub.get(Member::ID))
        .from(&sub)
        .filter(sub.get(Member::TEAM_ID).eq(t.get(Team::ID)))
        .filter(sub.get(Member::AGE).gt(30))
        .build()
        .unwrap();

    let teams: Vec<String> = query
        .select(t.get(Team::NAME))
        .from(&t)
        .filter(has_senior.exists())
        .fetch()
        .unwrap();
    assert_eq!(teams, vec!["teamB"]);

    let others: Vec<String> = query
        .select(t.get(Team::NAME))
        .from(&t)
        .filter(has_senior.not_exists())
        .fetch()
        .unwrap();
    assert_eq!(others, vec!["teamA"]);
}

#[test]
fn test_subquery_in_select_list() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let average = SubQueryBuilder::select(sub.get(Member::AGE).avg())
        .from(&sub)
        .build()
        .unwrap()
        .as_expression();

    let rows = query
        .select(Projections::tuple((m.get(Member::USERNAME), &average)))
        .from(&m)
        .fetch()
        .unwrap();

    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert_eq!(row.get(&average).unwrap(), Some(25.0));
    }
}

#[test]
fn test_correlated_subquery_in_select_list() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let mate = EntityPath::<Member>::aliased("mate");

    let team_max = SubQueryBuilder::select(mate.get(Member::AGE).max())
        .from(&mate)
        .filter(mate.get(Member::TEAM_ID).eq(m.get(Member::TEAM_ID)))
        .build()
        .unwrap();

    let pairs: Vec<(String, i32)> = query
        .select((m.get(Member::USERNAME), team_max.as_expression()))
        .from(&m)
        .order_by(m.get(Member::USERNAME).asc())
        .fetch()
        .unwrap();

    assert_eq!(
        pairs,
        vec![
            ("member1".to_string(), 20),
            ("member2".to_string(), 20),
            ("member3".to_string(), 40),
            ("member4".to_string(), 40),
        ]
    );
}

#[test]
fn test_subquery_alias_fills_dto_slot() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let max_age = SubQueryBuilder::select(sub.get(Member::AGE).max())
        .from(&sub)
        .build()
        .unwrap();

    let users = query
        .select(Projections::fields::<UserDto>((
            m.get(Member::USERNAME).alias("name"),
            max_age.alias("age"),
        )))
        .from(&m)
        .order_by(m.get(Member::USERNAME).asc())
        .fetch()
        .unwrap();

    assert_eq!(users.len(), 4);
    assert_eq!(users[0].name, "member1");
    assert!(users.iter().all(|u| u.age == 40));
}

#[test]
fn test_subquery_requires_from() {
    let m = EntityPath::<Member>::aliased("memberSub");
    let t = EntityPath::<Team>::new();
    let result = SubQueryBuilder::select(m.get(Member::AGE))
        .from(&m)
        .join(m.relation(Member::TEAM), &t)
        .build();
    assert!(result.is_ok());

    let result = SubQueryBuilder::select(m.get(Member::AGE)).build();
    assert!(matches!(result, Err(QueryError::InvalidPlan(_))));
}

#[test]
fn test_distinct_subquery_with_unrelated_join() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let t = EntityPath::<Team>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");
    let sub_team = EntityPath::<Team>::aliased("teamSub");

    // Team ids reached through an ON-only join, deduplicated.
    let senior_team_ids = SubQueryBuilder::select(sub_team.get(Team::ID))
        .distinct()
        .from(&sub)
        .join_entity(&sub_team)
        .on(sub.get(Member::TEAM_ID).eq(sub_team.get(Team::ID)))
        .filter(sub.get(Member::AGE).gt(25))
        .build()
        .unwrap();

    let teams: Vec<String> = query
        .select(t.get(Team::NAME))
        .from(&t)
        .filter(t.get(Team::ID).in_subquery(&senior_team_ids))
        .fetch()
        .unwrap();
    assert_eq!(teams, vec!["teamB"]);
}

#[test]
fn test_paged_subquery() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let sub = EntityPath::<Member>::aliased("memberSub");

    let second_oldest = SubQueryBuilder::select(sub.get(Member::AGE))
        .from(&sub)
        .order_by(sub.get(Member::AGE).desc())
        .offset(1)
        .limit(1)
        .build()
        .unwrap();

    let names: Vec<String> = query
        .select(m.get(Member::USERNAME))
        .from(&m)
        .filter(m.get(Member::AGE).eq(&second_oldest))
        .fetch()
        .unwrap();
    assert_eq!(names, vec!["member3"]);
}
