//! Forward traversal over every record in a store.
//!
//! Traversal visits indexed and raw records alike, in slot order. Records
//! created or deleted while a traversal is in progress may or may not be
//! seen. Resuming from a record that has since been deleted continues with
//! the next live slot after it.

use crate::common::{Error, Result};
use crate::record::Record;
use crate::store::Store;

impl Store {
    /// First record of the store.
    ///
    /// # Errors
    /// - `Error::EndOfStore` if the store holds no records
    pub fn first_record(&self) -> Result<Record> {
        self.advance(None)
    }

    /// Record following `record` in traversal order.
    ///
    /// # Errors
    /// - `Error::EndOfStore` once the traversal is exhausted
    pub fn next_record(&self, record: Record) -> Result<Record> {
        let segment = self.segment()?;
        if record.segment() != segment.id() {
            return Err(Error::StaleRecord(record.id()));
        }
        self.advance(Some(record))
    }

    fn advance(&self, after: Option<Record>) -> Result<Record> {
        let segment = self.segment()?;
        segment
            .next_live(after.map(|record| record.id()))
            .map(|id| Record::new(segment.id(), id))
            .ok_or(Error::EndOfStore)
    }

    /// Iterate over every record, starting from the first.
    pub fn records(&self) -> Records<'_> {
        Records {
            store: self,
            last: None,
            done: false,
        }
    }
}

/// Iterator returned by [`Store::records`].
///
/// Yields `Err` once if traversal fails for a reason other than reaching the
/// end, then stops.
#[derive(Debug)]
pub struct Records<'a> {
    store: &'a Store,
    last: Option<Record>,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.store.advance(self.last) {
            Ok(record) => {
                self.last = Some(record);
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                if e.is_end_of_store() {
                    None
                } else {
                    Some(Err(e))
                }
            }
        }
    }
}
