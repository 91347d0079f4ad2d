//! The frozen query plan and its SQL rendering.

use std::ops::Range;

use crate::expr::{Aliased, BinaryOperator, Expr, Expression, Nullable, OrderSpecifier};
use crate::schema::{Entity, EntityPath, EntityRef, EntitySchema};
use crate::sql::dialect::SqlDialect;
use crate::sql::token::{Token, TokenStream};

// =============================================================================
// Select targets
// =============================================================================

/// An expression in the SELECT list, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_owned());
        self
    }

    /// The name DTO slots match against: the alias, else the field name.
    pub fn name(&self) -> Option<&str> {
        match (&self.alias, &self.expr) {
            (Some(alias), _) => Some(alias),
            (None, Expr::Column { field, .. }) => Some(field),
            _ => None,
        }
    }

    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = self.expr.to_tokens(dialect);
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectTarget {
    /// A single column value.
    Expr(SelectExpr),
    /// Every column of an aliased entity.
    Entity(EntityRef),
}

impl SelectTarget {
    /// Number of result columns this target occupies.
    pub fn width(&self) -> usize {
        match self {
            SelectTarget::Expr(_) => 1,
            SelectTarget::Entity(entity) => entity.schema.columns.len(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SelectTarget::Expr(e) => e.name(),
            SelectTarget::Entity(entity) => Some(&entity.alias),
        }
    }

    fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        match self {
            SelectTarget::Expr(e) => e.to_tokens(dialect),
            SelectTarget::Entity(entity) => column_list(&entity.columns(), dialect),
        }
    }
}

impl<T> From<Expression<T>> for SelectTarget {
    fn from(e: Expression<T>) -> Self {
        SelectTarget::Expr(SelectExpr::new(e.into_expr()))
    }
}

impl<T> From<&Expression<T>> for SelectTarget {
    fn from(e: &Expression<T>) -> Self {
        SelectTarget::Expr(SelectExpr::new(e.as_expr().clone()))
    }
}

impl<T> From<Aliased<T>> for SelectTarget {
    fn from(a: Aliased<T>) -> Self {
        SelectTarget::Expr(SelectExpr::new(a.expr.into_expr()).with_alias(&a.name))
    }
}

impl<T> From<Nullable<T>> for SelectTarget {
    fn from(n: Nullable<T>) -> Self {
        n.expr.into()
    }
}

impl<E: Entity> From<&EntityPath<E>> for SelectTarget {
    fn from(path: &EntityPath<E>) -> Self {
        SelectTarget::Entity(path.entity_ref())
    }
}

impl<E: Entity> From<EntityPath<E>> for SelectTarget {
    fn from(path: EntityPath<E>) -> Self {
        SelectTarget::Entity(path.entity_ref())
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// The relation a join follows: `owner.local_column = target.target_column`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRelation {
    pub owner: EntityRef,
    pub name: &'static str,
    pub local_column: &'static str,
    pub target_column: &'static str,
}

/// A JOIN clause.
///
/// Joins without a relation are joined purely on their ON predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub target: EntityRef,
    pub relation: Option<JoinRelation>,
    pub on: Option<Expr>,
    /// Eagerly load the target's columns into the owner entity.
    pub fetch: bool,
}

impl JoinClause {
    /// The full join condition: the relation equality AND-ed with ON.
    pub fn condition(&self) -> Option<Expr> {
        let relation = self.relation.as_ref().map(|rel| Expr::BinaryOp {
            left: Box::new(rel.owner.column(rel.local_column)),
            op: BinaryOperator::Eq,
            right: Box::new(self.target.column(rel.target_column)),
        });
        match (relation, self.on.clone()) {
            (Some(rel), Some(on)) => Some(and(rel, on)),
            (rel, on) => rel.or(on),
        }
    }

    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self.kind {
            JoinKind::Inner => ts.push(Token::Inner),
            JoinKind::Left => ts.push(Token::Left),
        };

        ts.space().push(Token::Join).space();
        ts.append(&table_tokens(&self.target));

        // SQLite accepts an ON-less join; it behaves as a cross join.
        if let Some(condition) = self.condition() {
            ts.space().push(Token::On).space();
            ts.append(&condition.to_tokens(dialect));
        }

        ts
    }
}

pub(crate) fn and(left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op: BinaryOperator::And,
        right: Box::new(right),
    }
}

fn conjunction(predicates: &[Expr]) -> Option<Expr> {
    predicates.iter().cloned().reduce(and)
}

fn table_tokens(entity: &EntityRef) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Ident(entity.schema.table.into()))
        .space()
        .push(Token::As)
        .space()
        .push(Token::Ident(entity.alias.clone()));
    ts
}

fn column_list(exprs: &[Expr], dialect: &dyn SqlDialect) -> TokenStream {
    let mut ts = TokenStream::new();
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.append(&expr.to_tokens(dialect));
    }
    ts
}

// =============================================================================
// Row layout
// =============================================================================

/// Columns of a fetch-joined entity within a result row.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSlot {
    /// Alias of the entity that owns the relation.
    pub owner: String,
    pub relation: &'static str,
    pub schema: &'static EntitySchema,
    pub range: Range<usize>,
}

/// Where each select target's values sit within a result row.
///
/// Targets come first in select order, then the columns of fetch joins in
/// join order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub targets: Vec<Range<usize>>,
    pub fetches: Vec<FetchSlot>,
    pub width: usize,
}

// =============================================================================
// Query plan
// =============================================================================

/// An immutable, validated read query.
///
/// Only [`QueryBuilder::build`](super::QueryBuilder::build) creates plans;
/// rendering the same plan always yields the same text and parameters.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a plan does nothing until executed"]
pub struct QueryPlan {
    pub(crate) select: Vec<SelectTarget>,
    pub(crate) distinct: bool,
    pub(crate) from: EntityRef,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) predicates: Vec<Expr>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Vec<Expr>,
    pub(crate) order_by: Vec<OrderSpecifier>,
    pub(crate) offset: Option<u64>,
    pub(crate) limit: Option<u64>,
}

impl QueryPlan {
    pub fn select(&self) -> &[SelectTarget] {
        &self.select
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn from(&self) -> &EntityRef {
        &self.from
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// WHERE predicates; they are AND-ed together.
    pub fn predicates(&self) -> &[Expr] {
        &self.predicates
    }

    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn having(&self) -> &[Expr] {
        &self.having
    }

    pub fn order_by(&self) -> &[OrderSpecifier] {
        &self.order_by
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// A copy of this plan with a different page window.
    pub(crate) fn with_page(&self, offset: Option<u64>, limit: Option<u64>) -> QueryPlan {
        QueryPlan {
            offset,
            limit,
            ..self.clone()
        }
    }

    pub fn layout(&self) -> RowLayout {
        let mut targets = Vec::with_capacity(self.select.len());
        let mut next = 0;
        for target in &self.select {
            let width = target.width();
            targets.push(next..next + width);
            next += width;
        }

        let mut fetches = Vec::new();
        for join in self.joins.iter().filter(|j| j.fetch) {
            if let Some(rel) = &join.relation {
                let width = join.target.schema.columns.len();
                fetches.push(FetchSlot {
                    owner: rel.owner.alias.clone(),
                    relation: rel.name,
                    schema: join.target.schema,
                    range: next..next + width,
                });
                next += width;
            }
        }

        RowLayout {
            targets,
            fetches,
            width: next,
        }
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.append(&self.select_clause(dialect));
        ts.append(&self.body_tokens(dialect));

        // ORDER BY
        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy).space();
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&order.to_tokens(dialect));
            }
        }

        let page = dialect.emit_limit_offset(self.limit, self.offset);
        if !page.is_empty() {
            ts.newline().append(&page);
        }

        ts
    }

    /// Tokens counting the rows this plan matches, ignoring the projection,
    /// ordering and paging.
    ///
    /// Grouped or DISTINCT plans are counted as a derived table.
    pub fn count_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Select)
            .space()
            .push(Token::FunctionName("count".into()))
            .lparen()
            .push(Token::Star)
            .rparen();

        if self.distinct || !self.group_by.is_empty() || !self.having.is_empty() {
            ts.newline().push(Token::From).space().lparen();
            if self.distinct {
                ts.append(&self.select_clause(dialect));
            } else {
                ts.push(Token::Select).space().push(Token::LitInt(1));
            }
            ts.append(&self.body_tokens(dialect));
            ts.rparen()
                .space()
                .push(Token::As)
                .space()
                .push(Token::Ident("counted".into()));
        } else {
            ts.append(&self.body_tokens(dialect));
        }

        ts
    }

    fn select_clause(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Select);
        if self.distinct {
            ts.space().push(Token::Distinct);
        }
        ts.space();

        let mut first = true;
        for target in &self.select {
            if !first {
                ts.comma().space();
            }
            first = false;
            ts.append(&target.to_tokens(dialect));
        }

        for join in self.joins.iter().filter(|j| j.fetch && j.relation.is_some()) {
            if !first {
                ts.comma().space();
            }
            first = false;
            ts.append(&column_list(&join.target.columns(), dialect));
        }

        ts
    }

    /// FROM through HAVING.
    fn body_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();

        // FROM
        ts.newline().push(Token::From).space();
        ts.append(&table_tokens(&self.from));

        // JOINs
        for join in &self.joins {
            ts.newline();
            ts.append(&join.to_tokens(dialect));
        }

        // WHERE
        if let Some(predicate) = conjunction(&self.predicates) {
            ts.newline().push(Token::Where).space();
            ts.append(&predicate.to_tokens(dialect));
        }

        // GROUP BY
        if !self.group_by.is_empty() {
            ts.newline().push(Token::GroupBy).space();
            ts.append(&column_list(&self.group_by, dialect));
        }

        // HAVING
        if let Some(having) = conjunction(&self.having) {
            ts.newline().push(Token::Having).space();
            ts.append(&having.to_tokens(dialect));
        }

        ts
    }
}
