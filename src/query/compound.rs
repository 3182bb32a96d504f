//! Multi-condition queries.
//!
//! A [`Query`] yields the indexed records matching every [`QueryArg`]. Two
//! kinds exist:
//! - [`QueryKind::Scan`] - Evaluated lazily, one record per `next()`
//! - [`QueryKind::Prefetch`] - All matches collected when the query is built
//!
//! A scan query observes records created after it was built. A prefetched
//! query does not, and skips matches that were deleted before being yielded.

use std::fmt;

use super::search::field_matches;
use super::Condition;
use crate::codec::EncodedValue;
use crate::common::{RecordId, Result};
use crate::record::Record;
use crate::store::Store;

/// One condition of a query: `field <condition> value`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryArg {
    /// Field index to test.
    pub field: usize,
    /// Comparison to apply.
    pub condition: Condition,
    /// Value to compare against.
    pub value: EncodedValue,
}

impl QueryArg {
    /// Create a query argument.
    pub fn new(field: usize, condition: Condition, value: impl Into<EncodedValue>) -> Self {
        Self {
            field,
            condition,
            value: value.into(),
        }
    }

    fn matches(&self, fields: &[EncodedValue]) -> bool {
        field_matches(fields, self.field, self.condition, &self.value)
    }
}

impl fmt::Display for QueryArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {:?}", self.field, self.condition, self.value)
    }
}

/// How a query produces its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Matches are found on demand.
    Scan,
    /// Matches were collected up front.
    Prefetch,
}

#[derive(Debug)]
enum Cursor {
    Scan { last: Option<RecordId> },
    Prefetch { matches: std::vec::IntoIter<RecordId> },
}

/// Iterator over the records matching a set of [`QueryArg`]s.
///
/// Obtained from [`Store::query`] or [`Store::prefetch_query`].
#[derive(Debug)]
pub struct Query<'a> {
    store: &'a Store,
    args: Vec<QueryArg>,
    cursor: Cursor,
    done: bool,
}

impl<'a> Query<'a> {
    /// The query's kind.
    pub fn kind(&self) -> QueryKind {
        match self.cursor {
            Cursor::Scan { .. } => QueryKind::Scan,
            Cursor::Prefetch { .. } => QueryKind::Prefetch,
        }
    }

    /// The query's arguments.
    pub fn args(&self) -> &[QueryArg] {
        &self.args
    }

    fn matches_all(args: &[QueryArg], fields: &[EncodedValue]) -> bool {
        args.iter().all(|arg| arg.matches(fields))
    }

    fn next_match(&mut self) -> Result<Option<Record>> {
        let segment = self.store.segment()?;
        let args = &self.args;

        match &mut self.cursor {
            Cursor::Scan { last } => {
                let found = segment.find_indexed(*last, |fields| Self::matches_all(args, fields));
                *last = found;
                Ok(found.map(|id| Record::new(segment.id(), id)))
            }
            Cursor::Prefetch { matches } => {
                // Skip matches deleted since the query was built.
                for id in matches.by_ref() {
                    if segment.record_len(id).is_ok() {
                        return Ok(Some(Record::new(segment.id(), id)));
                    }
                }
                Ok(None)
            }
        }
    }
}

impl Iterator for Query<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_match() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Store {
    /// Build a lazily evaluated query.
    ///
    /// # Errors
    /// - `Error::Detached`
    pub fn query(&self, args: Vec<QueryArg>) -> Result<Query<'_>> {
        self.segment()?;
        Ok(Query {
            store: self,
            args,
            cursor: Cursor::Scan { last: None },
            done: false,
        })
    }

    /// Build a query whose matches are collected immediately.
    ///
    /// # Errors
    /// - `Error::Detached`
    pub fn prefetch_query(&self, args: Vec<QueryArg>) -> Result<Query<'_>> {
        let segment = self.segment()?;
        let matches = segment.collect_indexed(|fields| Query::matches_all(&args, fields));

        Ok(Query {
            store: self,
            args,
            cursor: Cursor::Prefetch {
                matches: matches.into_iter(),
            },
            done: false,
        })
    }

    /// Count the records a query would yield.
    pub fn count_matches(&self, args: &[QueryArg]) -> Result<usize> {
        let segment = self.segment()?;
        Ok(segment
            .collect_indexed(|fields| Query::matches_all(args, fields))
            .len())
    }
}
