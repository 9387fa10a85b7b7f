//! Typed transaction filter
//!
//! A [`TransactionFilter`] is a set of explicit optional clauses. Backends
//! never receive filter text; they render the [`Predicate`] list into their
//! own query language with bound parameters.

use crate::domain::ids::AccountId;
use chrono::NaiveDate;

/// Date bounds of a transaction query, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    /// No date restriction
    #[default]
    Any,
    /// `date >= from`
    From(NaiveDate),
    /// `date <= to`
    Until(NaiveDate),
    /// `from <= date <= to`
    Between(NaiveDate, NaiveDate),
}

impl DateRange {
    /// Builds a range from optional bounds
    ///
    /// Inverted bounds (`from > to`) apply no date restriction at all.
    pub fn from_bounds(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(from), Some(to)) if from <= to => DateRange::Between(from, to),
            (Some(from), Some(to)) => {
                tracing::warn!(
                    from_date = %from,
                    to_date = %to,
                    "from_date is after to_date, ignoring date bounds"
                );
                DateRange::Any
            }
            (Some(from), None) => DateRange::From(from),
            (None, Some(to)) => DateRange::Until(to),
            (None, None) => DateRange::Any,
        }
    }

    /// Lower bound, if any
    pub fn lower(&self) -> Option<NaiveDate> {
        match *self {
            DateRange::From(from) | DateRange::Between(from, _) => Some(from),
            _ => None,
        }
    }

    /// Upper bound, if any
    pub fn upper(&self) -> Option<NaiveDate> {
        match *self {
            DateRange::Until(to) | DateRange::Between(_, to) => Some(to),
            _ => None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.lower().map_or(true, |from| date >= from) && self.upper().map_or(true, |to| date <= to)
    }
}

/// One clause of a transaction query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Transaction belongs to this account
    AccountIs(AccountId),
    /// Metadata `pulled_to_file` is not `true` (absent metadata counts as new)
    NotPulled,
    /// `date >= bound`
    DateOnOrAfter(NaiveDate),
    /// `date <= bound`
    DateOnOrBefore(NaiveDate),
}

/// Filter for [`get_transactions`](crate::adapters::storage::TransactionStorage::get_transactions)
/// and pending checks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionFilter {
    /// Restrict to one account
    pub account_id: Option<AccountId>,

    /// Exclude transactions already written to a ledger file
    pub only_new: bool,

    /// Date bounds
    pub dates: DateRange,
}

impl TransactionFilter {
    /// Filter with the `get_transactions` argument semantics
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>, only_new: bool) -> Self {
        Self {
            account_id: None,
            only_new,
            dates: DateRange::from_bounds(from, to),
        }
    }

    /// Every transaction not yet written to a ledger file
    pub fn unpulled() -> Self {
        Self {
            only_new: true,
            ..Self::default()
        }
    }

    /// Restricts the filter to one account; `None` leaves it unscoped
    pub fn scoped_to(mut self, account_id: Option<&AccountId>) -> Self {
        self.account_id = account_id.cloned();
        self
    }

    /// The clauses of this filter, in rendering order
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(account_id) = &self.account_id {
            predicates.push(Predicate::AccountIs(account_id.clone()));
        }
        if self.only_new {
            predicates.push(Predicate::NotPulled);
        }
        if let Some(from) = self.dates.lower() {
            predicates.push(Predicate::DateOnOrAfter(from));
        }
        if let Some(to) = self.dates.upper() {
            predicates.push(Predicate::DateOnOrBefore(to));
        }
        predicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test_case(None, None => DateRange::Any ; "no bounds")]
    #[test_case(Some("2024-01-01"), None => DateRange::From(d("2024-01-01")) ; "lower only")]
    #[test_case(None, Some("2024-01-31") => DateRange::Until(d("2024-01-31")) ; "upper only")]
    #[test_case(Some("2024-01-01"), Some("2024-01-31") => DateRange::Between(d("2024-01-01"), d("2024-01-31")) ; "both bounds")]
    #[test_case(Some("2024-01-05"), Some("2024-01-05") => DateRange::Between(d("2024-01-05"), d("2024-01-05")) ; "single day")]
    #[test_case(Some("2024-02-01"), Some("2024-01-01") => DateRange::Any ; "inverted bounds")]
    fn test_date_range_from_bounds(from: Option<&str>, to: Option<&str>) -> DateRange {
        DateRange::from_bounds(from.map(d), to.map(d))
    }

    #[test]
    fn test_date_range_contains_is_inclusive() {
        let range = DateRange::Between(d("2024-01-01"), d("2024-01-31"));
        assert!(range.contains(d("2024-01-01")));
        assert!(range.contains(d("2024-01-31")));
        assert!(!range.contains(d("2024-02-01")));
        assert!(DateRange::Any.contains(d("1999-12-31")));
    }

    #[test]
    fn test_predicates_order() {
        let account = AccountId::new("A1").unwrap();
        let filter = TransactionFilter::new(Some(d("2024-01-01")), Some(d("2024-01-31")), true)
            .scoped_to(Some(&account));

        assert_eq!(
            filter.predicates(),
            vec![
                Predicate::AccountIs(account),
                Predicate::NotPulled,
                Predicate::DateOnOrAfter(d("2024-01-01")),
                Predicate::DateOnOrBefore(d("2024-01-31")),
            ]
        );
    }

    #[test]
    fn test_unfiltered_has_no_predicates() {
        assert!(TransactionFilter::new(None, None, false).predicates().is_empty());
        assert_eq!(TransactionFilter::unpulled().predicates(), vec![Predicate::NotPulled]);
    }
}
