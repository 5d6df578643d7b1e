//! Output of [`Compiler::build`](crate::Compiler::build).

use crate::client::GenericClient;
use crate::error::TemplateResult;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Positional SQL (`$1, $2, ...`) plus the arguments in marker order.
///
/// `args()[k - 1]` is the value bound to `$k`.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct CompiledQuery {
    sql: String,
    args: Vec<Value>,
    tag: Option<String>,
}

impl CompiledQuery {
    pub(crate) fn new(sql: String, args: Vec<Value>, tag: Option<String>) -> Self {
        Self { sql, args, tag }
    }

    /// Access the SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Arguments in positional order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Number of `$k` markers, which always equals `args().len()`.
    pub fn placeholder_count(&self) -> usize {
        self.args.len()
    }

    /// Split into `(sql, args)`.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }

    fn log_exec(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgtpl.sql",
            tag = self.tag.as_deref().unwrap_or("-"),
            params = self.args.len(),
            sql = %self.sql,
            "executing compiled template"
        );
    }

    // ==================== Execution ====================

    /// Execute the query and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> TemplateResult<Vec<Row>> {
        self.log_exec();
        conn.query(&self.sql, &self.params_ref()).await
    }

    /// Execute the query and return the **first** row.
    ///
    /// Returns [`TemplateError::NotFound`](crate::TemplateError::NotFound) when
    /// no rows come back.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> TemplateResult<Row> {
        self.log_exec();
        conn.query_one(&self.sql, &self.params_ref()).await
    }

    /// Execute the query and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> TemplateResult<Option<Row>> {
        self.log_exec();
        conn.query_opt(&self.sql, &self.params_ref()).await
    }

    /// Execute the statement and return the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> TemplateResult<u64> {
        self.log_exec();
        conn.execute(&self.sql, &self.params_ref()).await
    }
}
