//! JOIN fragments.

use std::fmt;

/// Kind prefix of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner ",
            JoinType::LeftOuter => "left outer ",
            JoinType::RightOuter => "right outer ",
        }
    }
}

/// `[kind ]join <right> on <right>.<right_field> = <left>.<left_field> `
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause<'a> {
    pub kind: Option<JoinType>,
    pub left_table: &'a str,
    pub left_field: &'a str,
    pub right_table: &'a str,
    pub right_field: &'a str,
}

impl fmt::Display for JoinClause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = self.kind {
            f.write_str(kind.as_sql())?;
        }
        write!(
            f,
            "join {right} on {right}.{rf} = {left}.{lf} ",
            right = self.right_table,
            rf = self.right_field,
            left = self.left_table,
            lf = self.left_field,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(kind: Option<JoinType>) -> String {
        JoinClause {
            kind,
            left_table: "a",
            left_field: "x",
            right_table: "b",
            right_field: "y",
        }
        .to_string()
    }

    #[test]
    fn join_kinds() {
        assert_eq!(clause(None), "join b on b.y = a.x ");
        assert_eq!(clause(Some(JoinType::Inner)), "inner join b on b.y = a.x ");
        assert_eq!(clause(Some(JoinType::LeftOuter)), "left outer join b on b.y = a.x ");
        assert_eq!(clause(Some(JoinType::RightOuter)), "right outer join b on b.y = a.x ");
    }
}
