//! Custom projections for [`SqlExecutor::get_columns`](crate::SqlExecutor::get_columns).

use crate::clause::{ClauseSlot, StatementParts};
use crate::error::{OrmError, OrmResult};

/// A custom `select` column list.
///
/// Columns may be arbitrary expressions, including SQLite functions:
///
/// ```
/// use liteorm::ColumnExpression;
///
/// let expr = ColumnExpression::new()
///     .column("strftime('%Y', date)")
///     .as_("year")
///     .column("name");
/// assert_eq!(expr.to_sql().unwrap(), "select strftime('%Y', date) as year, name ");
/// ```
#[derive(Debug, Clone)]
pub struct ColumnExpression {
    parts: StatementParts,
    error: Option<String>,
}

impl Default for ColumnExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnExpression {
    pub fn new() -> Self {
        let mut parts = StatementParts::new();
        parts.set(ClauseSlot::Select, "select ");
        parts.set(ClauseSlot::Column, "");
        Self { parts, error: None }
    }

    /// Add a column or expression.
    pub fn column(mut self, expr: &str) -> Self {
        self.parts.append_or_set(ClauseSlot::Column, &format!("{expr}, "));
        self
    }

    /// Alias the most recently added column.
    pub fn as_(mut self, alias: &str) -> Self {
        let columns = self
            .parts
            .get(ClauseSlot::Column)
            .unwrap_or_default()
            .to_string();
        match columns.strip_suffix(", ") {
            Some(head) => {
                let aliased = format!("{head} as {alias}, ");
                self.parts.set(ClauseSlot::Column, aliased);
            }
            None => {
                self.error
                    .get_or_insert_with(|| format!("alias '{alias}' has no column to apply to"));
            }
        }
        self
    }

    /// Eliminate duplicate rows.
    pub fn distinct(mut self) -> Self {
        self.parts.set(ClauseSlot::Select, "select distinct ");
        self
    }

    /// The rendered `select` fragment, ending with a single space.
    pub fn to_sql(&self) -> OrmResult<String> {
        if let Some(message) = &self.error {
            return Err(OrmError::statement(message.clone()));
        }
        let fragment = self.parts.render_fragment();
        if self.parts.get(ClauseSlot::Column).is_none_or(str::is_empty) {
            return Err(OrmError::statement("column expression has no columns"));
        }
        let trimmed = fragment.strip_suffix(", ").unwrap_or(&fragment);
        Ok(format!("{} ", trimmed.trim_end()))
    }
}
