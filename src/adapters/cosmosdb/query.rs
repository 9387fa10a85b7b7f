//! Cosmos DB SQL rendering for transaction filters
//!
//! Values are always bound as `@name` parameters.

use crate::core::query::{Predicate, TransactionFilter};
use crate::domain::metadata::METADATA_FIELD;
use crate::domain::timestamp::midnight_timestamp;
use crate::domain::{CosmosDbError, Result};
use azure_data_cosmos::Query;

/// Query text with its named parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    pub sql: String,
    pub parameters: Vec<(&'static str, String)>,
}

impl RenderedQuery {
    /// Converts into an SDK query with bound parameters
    pub fn into_query(self) -> Result<Query> {
        let mut query = Query::from(self.sql);
        for (name, value) in self.parameters {
            query = query.with_parameter(name, value).map_err(|e| {
                CosmosDbError::QueryFailed(format!("Failed to bind parameter {name}: {e}"))
            })?;
        }
        Ok(query)
    }
}

fn render_predicate(predicate: &Predicate, parameters: &mut Vec<(&'static str, String)>) -> String {
    match predicate {
        Predicate::AccountIs(account_id) => {
            parameters.push(("@account_id", account_id.to_string()));
            "c.account_id = @account_id".to_string()
        }
        Predicate::NotPulled => format!(
            "(NOT IS_BOOL(c.{field}.pulled_to_file) OR c.{field}.pulled_to_file = false)",
            field = METADATA_FIELD
        ),
        Predicate::DateOnOrAfter(from) => {
            parameters.push(("@from_date", midnight_timestamp(*from)));
            "c.date >= @from_date".to_string()
        }
        Predicate::DateOnOrBefore(to) => {
            parameters.push(("@to_date", midnight_timestamp(*to)));
            "c.date <= @to_date".to_string()
        }
    }
}

fn render(select: &str, filter: &TransactionFilter, suffix: &str) -> RenderedQuery {
    let mut parameters = Vec::new();
    let clauses: Vec<String> = filter
        .predicates()
        .iter()
        .map(|p| render_predicate(p, &mut parameters))
        .collect();

    let mut sql = format!("{select} FROM c");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(suffix);

    RenderedQuery { sql, parameters }
}

/// Documents matching the filter, oldest first
pub fn select_documents(filter: &TransactionFilter) -> RenderedQuery {
    render("SELECT *", filter, " ORDER BY c.date ASC")
}

/// Count of documents matching the filter
pub fn count_documents(filter: &TransactionFilter) -> RenderedQuery {
    render("SELECT VALUE COUNT(1)", filter, "")
}

/// Most recent `date` under the filter
pub fn latest_date(filter: &TransactionFilter) -> RenderedQuery {
    render("SELECT TOP 1 VALUE c.date", filter, " ORDER BY c.date DESC")
}
