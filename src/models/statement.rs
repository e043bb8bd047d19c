//! Statement descriptors and execution outcomes.
//!
//! A [`Statement`] is an opaque, shape-tagged query descriptor: the core never
//! interprets its SQL, it only executes it and classifies the outcome.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::num::NonZeroU32;

/// A row normalized into a field -> value mapping.
pub type Record = serde_json::Map<String, JsonValue>;

/// Sub-shape of a mutating statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

/// Shape tag of a statement, deciding how its outcome is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// First column of the first row, or nothing.
    ScalarRead,
    /// Full first row, or nothing.
    RowRead,
    /// All matching rows, possibly paginated.
    ListRead,
    /// Insert, update or delete.
    Mutation(MutationKind),
}

/// A value bound to a named statement parameter.
///
/// Every variant carries an `Option`, so an absent value still knows its
/// type. PostgreSQL prepares statements with a wire type per placeholder and
/// rejects a text-typed NULL in an integer, date or boolean column, so NULLs
/// must bind with the type the column expects.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Bool(None) | Self::Int(None) | Self::Float(None) | Self::Text(None) | Self::Date(None)
        )
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
        }
    }

    /// Normalize into a JSON value, the representation records use.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(Some(v)) => JsonValue::Bool(*v),
            Self::Int(Some(v)) => JsonValue::Number((*v).into()),
            Self::Float(Some(v)) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            Self::Text(Some(v)) => JsonValue::String(v.clone()),
            Self::Date(Some(v)) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
            _ => JsonValue::Null,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(Some(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(Some(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(Some(v))
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(Some(v.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(Some(v))
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(Some(v))
    }
}

impl From<Option<bool>> for ParamValue {
    fn from(v: Option<bool>) -> Self {
        Self::Bool(v)
    }
}

impl From<Option<i64>> for ParamValue {
    fn from(v: Option<i64>) -> Self {
        Self::Int(v)
    }
}

impl From<Option<f64>> for ParamValue {
    fn from(v: Option<f64>) -> Self {
        Self::Float(v)
    }
}

impl From<Option<&str>> for ParamValue {
    fn from(v: Option<&str>) -> Self {
        Self::Text(v.map(String::from))
    }
}

impl From<Option<String>> for ParamValue {
    fn from(v: Option<String>) -> Self {
        Self::Text(v)
    }
}

impl From<Option<NaiveDate>> for ParamValue {
    fn from(v: Option<NaiveDate>) -> Self {
        Self::Date(v)
    }
}

/// An executable query descriptor with named, ordered parameters.
///
/// SQL is authored with `?` placeholders; parameters bind positionally in the
/// order they were added, and their names feed the mutation echo.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<(String, ParamValue)>,
}

impl Statement {
    fn new(kind: StatementKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn scalar(sql: impl Into<String>) -> Self {
        Self::new(StatementKind::ScalarRead, sql)
    }

    pub fn row(sql: impl Into<String>) -> Self {
        Self::new(StatementKind::RowRead, sql)
    }

    pub fn list(sql: impl Into<String>) -> Self {
        Self::new(StatementKind::ListRead, sql)
    }

    pub fn insert(sql: impl Into<String>) -> Self {
        Self::new(StatementKind::Mutation(MutationKind::Insert), sql)
    }

    pub fn update(sql: impl Into<String>) -> Self {
        Self::new(StatementKind::Mutation(MutationKind::Update), sql)
    }

    pub fn delete(sql: impl Into<String>) -> Self {
        Self::new(StatementKind::Mutation(MutationKind::Delete), sql)
    }

    /// Bind a named parameter. Position in the SQL follows call order.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// The bound parameters as a record, used to echo applied updates.
    pub fn echo(&self) -> Record {
        self.params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

/// Outcome of a mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MutationOutcome {
    /// Primary identifier generated by an insert.
    GeneratedId(i64),
    /// The applied input parameters, echoed back for response building.
    Echo(Record),
    /// Nothing was generated (deletes, no-effect inserts).
    Empty,
}

impl MutationOutcome {
    pub fn generated_id(&self) -> Option<i64> {
        match self {
            Self::GeneratedId(id) => Some(*id),
            _ => None,
        }
    }
}

/// A 1-based page request. Zero values are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    page: NonZeroU32,
    size: NonZeroU32,
}

impl Page {
    /// Returns `None` when either value is zero.
    pub fn new(page: u32, size: u32) -> Option<Self> {
        Some(Self {
            page: NonZeroU32::new(page)?,
            size: NonZeroU32::new(size)?,
        })
    }

    pub fn limit(&self) -> u32 {
        self.size.get()
    }

    /// Widened to u64 so extreme page/size pairs cannot overflow.
    pub fn offset(&self) -> u64 {
        (u64::from(self.page.get()) - 1) * u64::from(self.size.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        let page = Page::new(1, 10).unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 10);

        let page = Page::new(3, 25).unwrap();
        assert_eq!(page.offset(), 50);
        assert_eq!(page.limit(), 25);
    }

    #[test]
    fn test_page_rejects_zero() {
        assert!(Page::new(0, 10).is_none());
        assert!(Page::new(1, 0).is_none());
    }

    #[test]
    fn test_page_offset_survives_extreme_values() {
        let page = Page::new(u32::MAX, u32::MAX).unwrap();
        assert_eq!(
            page.offset(),
            (u64::from(u32::MAX) - 1) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(
            ParamValue::from(Some("x")),
            ParamValue::Text(Some("x".into()))
        );
        assert_eq!(ParamValue::from(None::<String>), ParamValue::Text(None));
        assert!(ParamValue::from(None::<i64>).is_null());
        assert!(!ParamValue::from(7i64).is_null());
        assert_eq!(ParamValue::Int(Some(42)).type_name(), "int");
    }

    #[test]
    fn test_statement_echo_preserves_params() {
        let stmt = Statement::update("UPDATE users SET first_name = ? WHERE id = ?")
            .bind("first_name", "New")
            .bind("id", 7i64);

        let echo = stmt.echo();
        assert_eq!(echo["first_name"], "New");
        assert_eq!(echo["id"], 7);
    }

    #[test]
    fn test_statement_shapes() {
        assert_eq!(
            Statement::insert("INSERT").kind,
            StatementKind::Mutation(MutationKind::Insert)
        );
        assert_eq!(
            Statement::scalar("SELECT 1").kind,
            StatementKind::ScalarRead
        );
    }
}
