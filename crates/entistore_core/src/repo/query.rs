//! Read query model: opaque filters and field sort keys.
//!
//! # Responsibility
//! - Carry a caller-built filter to the engine without interpreting it.
//! - Render filters and sort keys against document fields.
//!
//! # Invariants
//! - Field paths are validated before they reach SQL text.
//! - Values are always bound as parameters, never inlined.
//! - Filtering applies before sorting.

use crate::repo::{StorageFault, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;

static FIELD_PATH: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Filter evaluated by the storage engine against stored documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: String,
        op: Comparison,
        value: Value,
    },
    IsNull(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// Engine-native clause with positional `?` parameters, passed through verbatim.
    Raw { clause: String, params: Vec<Value> },
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Gt, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Lt, value)
    }

    pub fn raw(clause: impl Into<String>, params: Vec<Value>) -> Self {
        Self::Raw {
            clause: clause.into(),
            params,
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::And(mut items) => {
                items.push(other);
                Self::And(items)
            }
            first => Self::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Or(mut items) => {
                items.push(other);
                Self::Or(items)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Appends this predicate as a parenthesized SQL clause.
    pub(crate) fn render(&self, sql: &mut String, params: &mut Vec<Value>) -> StoreResult<()> {
        match self {
            Self::Compare { field, op, value } => {
                sql.push('(');
                sql.push_str(&field_expr(field)?);
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?)");
                params.push(value.clone());
            }
            Self::IsNull(field) => {
                sql.push('(');
                sql.push_str(&field_expr(field)?);
                sql.push_str(" IS NULL)");
            }
            Self::And(items) => render_joined(items, " AND ", "1 = 1", sql, params)?,
            Self::Or(items) => render_joined(items, " OR ", "1 = 0", sql, params)?,
            Self::Not(inner) => {
                sql.push_str("(NOT ");
                inner.render(sql, params)?;
                sql.push(')');
            }
            Self::Raw {
                clause,
                params: raw_params,
            } => {
                sql.push('(');
                sql.push_str(clause);
                sql.push(')');
                params.extend(raw_params.iter().cloned());
            }
        }
        Ok(())
    }
}

fn render_joined(
    items: &[Predicate],
    separator: &str,
    empty: &str,
    sql: &mut String,
    params: &mut Vec<Value>,
) -> StoreResult<()> {
    if items.is_empty() {
        sql.push('(');
        sql.push_str(empty);
        sql.push(')');
        return Ok(());
    }
    sql.push('(');
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            sql.push_str(separator);
        }
        item.render(sql, params)?;
    }
    sql.push(')');
    Ok(())
}

/// Sort key over one document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn new(field: impl Into<String>, ascending: bool) -> Self {
        Self {
            field: field.into(),
            ascending,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, true)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, false)
    }

    pub(crate) fn render(&self) -> StoreResult<String> {
        let direction = if self.ascending { "ASC" } else { "DESC" };
        Ok(format!("{} {direction}", field_expr(&self.field)?))
    }
}

/// Options for listing records of one type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadQuery {
    pub predicate: Option<Predicate>,
    pub order_by: Option<SortKey>,
}

impl ReadQuery {
    pub fn filtered(predicate: Predicate) -> Self {
        Self {
            predicate: Some(predicate),
            order_by: None,
        }
    }

    pub fn sorted(order_by: SortKey) -> Self {
        Self {
            predicate: None,
            order_by: Some(order_by),
        }
    }

    pub fn with_order(mut self, order_by: SortKey) -> Self {
        self.order_by = Some(order_by);
        self
    }
}

/// SQL expression reading `field` from the stored document.
pub(crate) fn field_expr(field: &str) -> StoreResult<String> {
    let pattern = FIELD_PATH
        .as_ref()
        .map_err(|err| StorageFault::InvalidQuery(format!("field pattern unavailable: {err}")))?;
    if !pattern.is_match(field) {
        return Err(StorageFault::InvalidQuery(format!(
            "invalid field path `{field}`"
        )));
    }
    Ok(format!("json_extract(body, '$.{field}')"))
}
