/// Array elements as a two-column cursor
///
/// Column 1 is the element's 1-based position within the cursor, column 2 is
/// the element value. The cursor covers `count` elements starting at a
/// 0-based offset into the array.
///
/// The index is relative to the window, not to the array: a cursor over
/// elements 3..=5 of an array numbers them 1, 2, 3, whatever the start
/// offset. Add the start offset to recover an element's array position.
use crate::cursor::{RowBuffer, RowCursor};
use crate::error::{Error, Result};
use crate::metadata::{ColumnMetaData, ResultSetMetaData};
use crate::value::{Array, Value};
use tracing::trace;

#[derive(Debug)]
pub struct ArrayCursor {
    array: Array,
    start: usize,
    count: usize,
    /// Rows consumed so far; `None` once exhausted or closed
    counter: Option<usize>,
    row: RowBuffer,
    metadata: ResultSetMetaData,
    closed: bool,
}

impl ArrayCursor {
    /// Cursor over `count` elements of `array` from the 0-based `start`.
    pub fn new(array: Array, start: usize, count: usize) -> Result<Self> {
        let in_range = start
            .checked_add(count)
            .is_some_and(|end| end <= array.len());
        if !in_range {
            return Err(Error::BadArgument(format!(
                "elements {start}..{start}+{count} outside an array of {}",
                array.len()
            )));
        }
        Ok(Self::over(array, start, count))
    }

    /// Callers have already checked the range against the array.
    pub(crate) fn over(array: Array, start: usize, count: usize) -> Self {
        let element = match array.metadata() {
            Some(meta) => meta.as_element(),
            None => ColumnMetaData::inferred_element(array.element_catalog_type()),
        };
        let metadata = ResultSetMetaData::new(vec![ColumnMetaData::element_index(), element]);
        Self {
            array,
            start,
            count,
            counter: if count == 0 { None } else { Some(0) },
            row: RowBuffer::default(),
            metadata,
            closed: false,
        }
    }

    /// Number of elements this cursor covers.
    pub fn element_count(&self) -> usize {
        self.count
    }
}

impl RowCursor for ArrayCursor {
    fn next(&mut self) -> Result<bool> {
        self.row.close_stream();
        let Some(n) = self.counter else {
            return Ok(false);
        };
        if n >= self.count {
            trace!(count = self.count, "array cursor exhausted");
            self.counter = None;
            self.row.clear();
            return Ok(false);
        }
        let index = i32::try_from(n + 1)
            .map_err(|_| Error::BadArgument(format!("element index {} exceeds i32", n + 1)))?;
        let element = self
            .array
            .as_slice()
            .get(n + self.start)
            .cloned()
            .unwrap_or(Value::Null);
        self.row.set_row(vec![Value::Integer(index), element], n + 1);
        self.counter = Some(n + 1);
        Ok(true)
    }

    fn is_last(&mut self) -> Result<bool> {
        Ok(self.count > 0 && self.counter == Some(self.count))
    }

    fn metadata(&mut self) -> Result<&ResultSetMetaData> {
        Ok(&self.metadata)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.counter = None;
        self.row.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn current(&self) -> &RowBuffer {
        &self.row
    }

    fn known_metadata(&self) -> Option<&ResultSetMetaData> {
        Some(&self.metadata)
    }
}
