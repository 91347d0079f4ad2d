//! Offset/limit and paged results.

#[path = "../common/mod.rs"]
mod common;

use common::{seeded, Member};
use quarry::prelude::*;

#[test]
fn test_limit_with_offset() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let names: Vec<String> = query
        .select(m.get(Member::USERNAME))
        .from(&m)
        .order_by(m.get(Member::USERNAME).desc())
        .offset(1)
        .limit(2)
        .fetch()
        .unwrap();

    assert_eq!(names, vec!["member3", "member2"]);
}

#[test]
fn test_fetch_results_counts_all_rows() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let page = query
        .select_from(&m)
        .order_by(m.get(Member::USERNAME).desc())
        .offset(1)
        .limit(2)
        .fetch_results()
        .unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(page.offset, 1);
    assert_eq!(page.limit, Some(2));
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].username.as_deref(), Some("member3"));
}

#[test]
fn test_total_is_invariant_under_paging() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    for (offset, limit) in [(0, 1), (0, 4), (2, 2), (3, 10), (10, 1)] {
        let page = query
            .select(m.get(Member::AGE))
            .from(&m)
            .filter(m.get(Member::AGE).gte(20))
            .order_by(m.get(Member::AGE).asc())
            .offset(offset)
            .limit(limit)
            .fetch_results()
            .unwrap();

        assert_eq!(page.total, 3, "offset {offset} limit {limit}");
        assert!(page.results.len() as u64 <= limit);
        assert!(page.total >= page.results.len() as i64);
    }
}

#[test]
fn test_offset_without_limit_is_uncapped() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let ages: Vec<i32> = query
        .select(m.get(Member::AGE))
        .from(&m)
        .order_by(m.get(Member::AGE).asc())
        .offset(1)
        .fetch()
        .unwrap();

    assert_eq!(ages, vec![20, 30, 40]);
}

#[test]
fn test_limit_zero() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let page = query.select_from(&m).limit(0).fetch_results().unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total, 4);
}

#[test]
fn test_fetch_first_respects_offset() {
    let fx = seeded();
    let source = fx.db.source();
    let query = QueryFactory::new(&source);
    let m = EntityPath::<Member>::new();

    let second: Option<i32> = query
        .select(m.get(Member::AGE))
        .from(&m)
        .order_by(m.get(Member::AGE).asc())
        .offset(1)
        .fetch_first()
        .unwrap();
    assert_eq!(second, Some(20));
}
