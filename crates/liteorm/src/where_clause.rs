//! Comparison half of `where` / `and` / `or` clauses.

use crate::entity::Entity;
use crate::executor::SqlExecutor;
use crate::value::Value;

/// Comparison operator appended after a `where`/`and`/`or` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    Like,
}

impl Comparator {
    /// Operator with its placeholder, e.g. `"= ? "`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "= ? ",
            Comparator::GreaterThan => "> ? ",
            Comparator::GreaterThanOrEq => ">= ? ",
            Comparator::LessThan => "< ? ",
            Comparator::LessThanOrEq => "<= ? ",
            Comparator::Like => "like ? ",
        }
    }
}

/// Pending comparison returned by [`SqlExecutor::where_`], `and` and `or`.
///
/// Each operator records exactly one bind value and hands the executor back.
#[must_use = "a where clause needs a comparison"]
pub struct Comparison<'a, T: Entity> {
    executor: SqlExecutor<'a, T>,
}

impl<'a, T: Entity> Comparison<'a, T> {
    pub(crate) fn new(executor: SqlExecutor<'a, T>) -> Self {
        Self { executor }
    }

    fn compare(self, comparator: Comparator, value: Value) -> SqlExecutor<'a, T> {
        self.executor.push_comparison(comparator, value)
    }

    pub fn eq(self, value: impl Into<Value>) -> SqlExecutor<'a, T> {
        self.compare(Comparator::Eq, value.into())
    }

    pub fn greater_than(self, value: impl Into<Value>) -> SqlExecutor<'a, T> {
        self.compare(Comparator::GreaterThan, value.into())
    }

    pub fn greater_than_or_eq(self, value: impl Into<Value>) -> SqlExecutor<'a, T> {
        self.compare(Comparator::GreaterThanOrEq, value.into())
    }

    pub fn less_than(self, value: impl Into<Value>) -> SqlExecutor<'a, T> {
        self.compare(Comparator::LessThan, value.into())
    }

    pub fn less_than_or_eq(self, value: impl Into<Value>) -> SqlExecutor<'a, T> {
        self.compare(Comparator::LessThanOrEq, value.into())
    }

    /// `like ?`; the pattern is bound as-is, wildcards included.
    pub fn like(self, pattern: impl Into<Value>) -> SqlExecutor<'a, T> {
        self.compare(Comparator::Like, pattern.into())
    }
}
