//! Result shapes: tuples, setter/field DTOs and positional constructors.

#[path = "../common/mod.rs"]
mod common;

use common::{seeded, Member, MemberDto, UserDto};
use quarry::prelude::*;

fn expected() -> Vec<MemberDto> {
    vec![
        MemberDto::new("member1", 10),
        MemberDto::new("member2", 20),
        MemberDto::new("member3", 30),
        MemberDto::new("member4", 40),
    ]
}

#[test]
fn test_tuple_lookup_by_expression() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();
    let (username, age) = (m.get(Member::USERNAME), m.get(Member::AGE));

    let rows = query
        .select(Projections::tuple((&username, &age)))
        .from(&m)
        .order_by(age.asc())
        .fetch()
        .unwrap();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].len(), 2);
    // Lookups go through the selecting expression, in any order.
    assert_eq!(rows[3].get(&age).unwrap(), Some(40));
    assert_eq!(rows[3].get(&username).unwrap().as_deref(), Some("member4"));
    // A fresh but equal expression finds the same column.
    assert_eq!(rows[0].get(&m.get(Member::AGE)).unwrap(), Some(10));
}

#[test]
fn test_tuple_lookup_by_alias() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let rows = query
        .select(Projections::tuple((
            m.get(Member::USERNAME).alias("who"),
            m.get(Member::AGE).max().alias("oldest"),
        )))
        .from(&m)
        .group_by(m.get(Member::USERNAME))
        .order_by(m.get(Member::USERNAME).asc())
        .fetch()
        .unwrap();

    assert_eq!(rows[1].get_alias::<String>("who").unwrap().as_deref(), Some("member2"));
    assert_eq!(rows[1].get_alias::<i32>("oldest").unwrap(), Some(20));
    assert!(matches!(
        rows[1].get_alias::<i32>("nope"),
        Err(QueryError::MissingTarget(_))
    ));
}

#[test]
fn test_bean_projection() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let dtos = query
        .select(Projections::bean::<MemberDto>((
            m.get(Member::USERNAME),
            m.get(Member::AGE),
        )))
        .from(&m)
        .order_by(m.get(Member::AGE).asc())
        .fetch()
        .unwrap();

    assert_eq!(dtos, expected());
}

#[test]
fn test_fields_projection() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let dtos = query
        .select(Projections::fields::<MemberDto>((
            m.get(Member::AGE),
            m.get(Member::USERNAME),
        )))
        .from(&m)
        .order_by(m.get(Member::AGE).asc())
        .fetch()
        .unwrap();

    assert_eq!(dtos, expected());
}

#[test]
fn test_constructor_projection_is_positional() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let dtos: Vec<MemberDto> = query
        .select(Projections::constructor::<MemberDto, _>((
            m.get(Member::USERNAME),
            m.get(Member::AGE),
        )))
        .from(&m)
        .order_by(m.get(Member::AGE).asc())
        .fetch()
        .unwrap();

    assert_eq!(dtos, expected());
}

#[test]
fn test_alias_fills_differently_named_slot() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let users = query
        .select(Projections::bean::<UserDto>((
            m.get(Member::USERNAME).alias("name"),
            m.get(Member::AGE),
        )))
        .from(&m)
        .filter(m.get(Member::AGE).eq(30))
        .fetch()
        .unwrap();
    assert_eq!(
        users,
        vec![UserDto {
            name: "member3".to_string(),
            age: 30
        }]
    );

    // Without the alias the username has no slot and is skipped.
    let unnamed = query
        .select(Projections::fields::<UserDto>((
            m.get(Member::USERNAME),
            m.get(Member::AGE),
        )))
        .from(&m)
        .filter(m.get(Member::AGE).eq(30))
        .fetch()
        .unwrap();
    assert_eq!(unnamed[0].name, "");
    assert_eq!(unnamed[0].age, 30);
}

#[test]
fn test_entity_and_scalar_in_one_tuple() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let pairs: Vec<(Member, i32)> = query
        .select((m.clone(), m.get(Member::AGE).mul(10)))
        .from(&m)
        .order_by(m.get(Member::AGE).desc())
        .limit(1)
        .fetch()
        .unwrap();

    let (member, scaled) = &pairs[0];
    assert_eq!(member.username.as_deref(), Some("member4"));
    assert_eq!(*scaled, 400);
}

#[test]
fn test_executor_with_explicit_plan() {
    let fx = seeded();
    let source = fx.db.source();
    let m = EntityPath::<Member>::new();
    let age = m.get(Member::AGE);

    let plan = QueryBuilder::new()
        .select(&age)
        .from(&m)
        .filter(age.gt(25))
        .order_by(age.asc())
        .build()
        .unwrap();

    let executor = Executor::new(&source);
    assert_eq!(executor.fetch(&plan, &age).unwrap(), vec![30, 40]);

    let tuples = executor.fetch_tuples(&plan).unwrap();
    assert_eq!(tuples[1].get(&age).unwrap(), Some(40));
    assert_eq!(executor.fetch_count(&plan).unwrap(), 2);
}
