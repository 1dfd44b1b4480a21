//! Dynamic `WHERE` clause construction for list endpoints.
//!
//! Filters are optional, so list queries are assembled at runtime: each
//! active filter appends a condition with the next `$n` placeholder and a
//! typed [`BindValue`]. The resulting values are bound in order onto either
//! a `query_as` or a `query_scalar`.

use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::Postgres;

use cmms_core::types::{Date, DbId, Timestamp};

/// Typed bind value for dynamically-built queries.
#[derive(Debug, Clone)]
pub enum BindValue {
    BigInt(i64),
    Text(String),
    Bool(bool),
    Timestamp(Timestamp),
    Date(Date),
}

/// Accumulates conditions and their bind values.
#[derive(Debug, Default)]
pub struct Filter {
    conditions: Vec<String>,
    values: Vec<BindValue>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the next placeholder.
    pub fn next_index(&self) -> usize {
        self.values.len() + 1
    }

    /// Add a condition with a single placeholder written as `{}`.
    ///
    /// `push("status = {}", ..)` becomes `status = $3` when two values are
    /// already bound.
    pub fn push(&mut self, condition: &str, value: BindValue) -> &mut Self {
        let placeholder = format!("${}", self.next_index());
        self.conditions.push(condition.replace("{}", &placeholder));
        self.values.push(value);
        self
    }

    /// Add a condition that binds no value.
    pub fn push_raw(&mut self, condition: &str) -> &mut Self {
        self.conditions.push(condition.to_string());
        self
    }

    pub fn eq_text(&mut self, column: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.push(&format!("{column} = {{}}"), BindValue::Text(v.to_string()));
        }
        self
    }

    pub fn eq_id(&mut self, column: &str, value: Option<DbId>) -> &mut Self {
        if let Some(v) = value {
            self.push(&format!("{column} = {{}}"), BindValue::BigInt(v));
        }
        self
    }

    pub fn eq_bool(&mut self, column: &str, value: Option<bool>) -> &mut Self {
        if let Some(v) = value {
            self.push(&format!("{column} = {{}}"), BindValue::Bool(v));
        }
        self
    }

    /// Case-insensitive substring match across several columns.
    ///
    /// One placeholder is shared by every column.
    pub fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let term = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return self,
        };
        let placeholder = format!("${}", self.next_index());
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("{c} ILIKE {placeholder}"))
            .collect();
        self.conditions.push(format!("({})", ors.join(" OR ")));
        self.values.push(BindValue::Text(format!("%{term}%")));
        self
    }

    /// `WHERE ...` or an empty string.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[BindValue] {
        &self.values
    }
}

/// Bind filter values onto a `query_as`.
pub fn bind_values<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    values: &'q [BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for val in values {
        q = match val {
            BindValue::BigInt(v) => q.bind(*v),
            BindValue::Text(v) => q.bind(v.as_str()),
            BindValue::Bool(v) => q.bind(*v),
            BindValue::Timestamp(v) => q.bind(*v),
            BindValue::Date(v) => q.bind(*v),
        };
    }
    q
}

/// Bind filter values onto a `query_scalar`.
pub fn bind_values_scalar<'q, O>(
    mut q: QueryScalar<'q, Postgres, O, PgArguments>,
    values: &'q [BindValue],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for val in values {
        q = match val {
            BindValue::BigInt(v) => q.bind(*v),
            BindValue::Text(v) => q.bind(v.as_str()),
            BindValue::Bool(v) => q.bind(*v),
            BindValue::Timestamp(v) => q.bind(*v),
            BindValue::Date(v) => q.bind(*v),
        };
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where() {
        assert_eq!(Filter::new().where_clause(), "");
    }

    #[test]
    fn placeholders_are_numbered_in_order() {
        let mut f = Filter::new();
        f.eq_text("status", Some("open"))
            .eq_id("equipment_id", None)
            .eq_id("mechanic_id", Some(4))
            .search(&["name", "code"], Some(" pump "));
        assert_eq!(
            f.where_clause(),
            "WHERE status = $1 AND mechanic_id = $2 AND (name ILIKE $3 OR code ILIKE $3)"
        );
        assert_eq!(f.values().len(), 3);
        assert_eq!(f.next_index(), 4);
        match &f.values()[2] {
            BindValue::Text(t) => assert_eq!(t, "%pump%"),
            other => panic!("unexpected bind value {other:?}"),
        }
    }

    #[test]
    fn blank_text_filters_are_ignored() {
        let mut f = Filter::new();
        f.eq_text("status", Some("  ")).search(&["name"], Some(""));
        assert_eq!(f.where_clause(), "");
    }

    #[test]
    fn raw_conditions_bind_nothing() {
        let mut f = Filter::new();
        f.push_raw("quantity <= min_stock").eq_bool("is_active", Some(true));
        assert_eq!(f.where_clause(), "WHERE quantity <= min_stock AND is_active = $1");
    }
}
