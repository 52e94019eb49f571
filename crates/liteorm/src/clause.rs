//! Ordered clause slots and statement rendering.

use crate::error::{OrmError, OrmResult};
use std::collections::BTreeMap;

/// A named segment of a SQL statement.
///
/// Slots always render in declaration order, whatever order they were
/// filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseSlot {
    Select,
    Update,
    Insert,
    Delete,
    Set,
    From,
    Join,
    Where,
    OrderBy,
    Column,
}

impl ClauseSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseSlot::Select => "SELECT",
            ClauseSlot::Update => "UPDATE",
            ClauseSlot::Insert => "INSERT",
            ClauseSlot::Delete => "DELETE",
            ClauseSlot::Set => "SET",
            ClauseSlot::From => "FROM",
            ClauseSlot::Join => "JOIN",
            ClauseSlot::Where => "WHERE",
            ClauseSlot::OrderBy => "ORDER BY",
            ClauseSlot::Column => "COLUMN",
        }
    }
}

/// Accumulated text of each clause slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementParts {
    slots: BTreeMap<ClauseSlot, String>,
}

impl StatementParts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content of a slot.
    pub fn set(&mut self, slot: ClauseSlot, text: impl Into<String>) {
        self.slots.insert(slot, text.into());
    }

    /// Concatenate onto a slot that has already been set.
    pub fn append(&mut self, slot: ClauseSlot, text: &str) -> OrmResult<()> {
        match self.slots.get_mut(&slot) {
            Some(existing) => {
                existing.push_str(text);
                Ok(())
            }
            None => Err(OrmError::statement(format!(
                "cannot append to the {} clause before it has been started",
                slot.as_str()
            ))),
        }
    }

    /// Append to a slot, creating it when absent.
    pub fn append_or_set(&mut self, slot: ClauseSlot, text: &str) {
        self.slots.entry(slot).or_default().push_str(text);
    }

    pub fn has(&self, slot: ClauseSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn get(&self, slot: ClauseSlot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Concatenate the present slots in order, without trimming.
    pub fn render_fragment(&self) -> String {
        self.slots.values().map(String::as_str).collect()
    }

    /// Render the full statement: trimmed and terminated with `;`.
    pub fn render(&self) -> String {
        let mut sql = self.render_fragment().trim().to_string();
        sql.push(';');
        sql
    }
}
