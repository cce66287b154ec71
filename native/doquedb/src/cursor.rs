/// Forward-only result cursors
///
/// [`RowCursor`] is the row-reading contract shared by statement results and
/// array cursors. The current row lives in a [`RowBuffer`]; the typed getters
/// are provided on the trait and read from it.
///
/// [`ResultCursor`] walks the answer stream of an executed statement. It skips
/// metadata tuples, can look one row ahead to answer `is_last`, and closes
/// any binary stream handed out for the previous row before it moves on.
use crate::error::{Error, Result};
use crate::metadata::{ParameterMetaData, ResultSetMetaData};
use crate::transport::{Tuple, WireResultSet};
use crate::utils::{block_on_wire, run_cleanup};
use crate::value::{Array, Value};
use bytes::{Buf, Bytes};
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Readable view of a binary cell
///
/// Valid until the cursor that produced it advances or closes; after that
/// every read fails.
#[derive(Debug)]
pub struct LobStream {
    data: Bytes,
    closed: Arc<AtomicBool>,
}

impl LobStream {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl io::Read for LobStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stream closed: the cursor moved off its row",
            ));
        }
        let n = buf.len().min(self.data.remaining());
        self.data.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

/// The row a cursor is positioned on
#[derive(Debug, Default)]
pub struct RowBuffer {
    values: Option<Vec<Value>>,
    row_number: usize,
    was_null: Cell<bool>,
    stream: RefCell<Option<Arc<AtomicBool>>>,
}

impl RowBuffer {
    /// 1-based number of the current row, `None` when not on a row.
    pub fn row_number(&self) -> Option<usize> {
        self.values.as_ref().map(|_| self.row_number)
    }

    pub fn is_on_row(&self) -> bool {
        self.values.is_some()
    }

    /// Cell at a 1-based column index.
    pub fn value(&self, column: usize) -> Result<&Value> {
        let values = self
            .values
            .as_ref()
            .ok_or_else(|| Error::BadArgument("cursor is not positioned on a row".to_string()))?;
        let value = column
            .checked_sub(1)
            .and_then(|i| values.get(i))
            .ok_or_else(|| {
                Error::BadArgument(format!(
                    "column index {column} outside 1..={}",
                    values.len()
                ))
            })?;
        self.was_null.set(value.is_null());
        Ok(value)
    }

    /// Whether the last cell read was null.
    pub fn was_null(&self) -> bool {
        self.was_null.get()
    }

    pub fn binary_stream(&self, column: usize) -> Result<Option<LobStream>> {
        let Some(data) = self.value(column)?.to_bytes()? else {
            return Ok(None);
        };
        let closed = Arc::new(AtomicBool::new(false));
        if let Some(previous) = self.stream.replace(Some(Arc::clone(&closed))) {
            previous.store(true, Ordering::Release);
        }
        Ok(Some(LobStream { data, closed }))
    }

    pub(crate) fn set_row(&mut self, values: Vec<Value>, row_number: usize) {
        self.close_stream();
        self.values = Some(values);
        self.row_number = row_number;
        self.was_null.set(false);
    }

    pub(crate) fn clear(&mut self) {
        self.close_stream();
        self.values = None;
        self.was_null.set(false);
    }

    /// Invalidate the stream handed out for the current row, if any.
    pub(crate) fn close_stream(&mut self) {
        if let Some(closed) = self.stream.get_mut().take() {
            trace!("closing binary stream of previous row");
            closed.store(true, Ordering::Release);
        }
    }
}

/// Forward-only access to rows of cells
pub trait RowCursor {
    /// Move to the next row. Returns `false` once the rows are exhausted,
    /// and keeps returning `false` after that.
    fn next(&mut self) -> Result<bool>;

    /// Whether the cursor is on the final row.
    fn is_last(&mut self) -> Result<bool>;

    /// Column descriptions of the rows.
    fn metadata(&mut self) -> Result<&ResultSetMetaData>;

    /// Release the cursor. Safe to call more than once.
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;

    fn current(&self) -> &RowBuffer;

    /// Metadata already known without reading ahead.
    fn known_metadata(&self) -> Option<&ResultSetMetaData>;

    fn row_number(&self) -> Option<usize> {
        self.current().row_number()
    }

    fn value(&self, column: usize) -> Result<&Value> {
        self.current().value(column)
    }

    fn was_null(&self) -> bool {
        self.current().was_null()
    }

    fn get_i32(&self, column: usize) -> Result<Option<i32>> {
        self.value(column)?.to_i32()
    }

    fn get_i64(&self, column: usize) -> Result<Option<i64>> {
        self.value(column)?.to_i64()
    }

    fn get_f64(&self, column: usize) -> Result<Option<f64>> {
        self.value(column)?.to_f64()
    }

    fn get_string(&self, column: usize) -> Result<Option<String>> {
        self.value(column)?.to_string_value()
    }

    fn get_bytes(&self, column: usize) -> Result<Option<Bytes>> {
        self.value(column)?.to_bytes()
    }

    fn get_date(&self, column: usize) -> Result<Option<NaiveDate>> {
        self.value(column)?.to_date()
    }

    fn get_timestamp(&self, column: usize) -> Result<Option<NaiveDateTime>> {
        self.value(column)?.to_timestamp()
    }

    /// Read an array cell; the array keeps its column's metadata.
    fn get_array(&self, column: usize) -> Result<Option<Array>> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Array(elements) => {
                let meta = self
                    .known_metadata()
                    .and_then(|m| m.column(column).ok())
                    .cloned();
                Ok(Some(match meta {
                    Some(meta) => Array::with_metadata(Arc::clone(elements), meta),
                    None => Array::new(Arc::clone(elements)),
                }))
            }
            other => Err(Error::ClassCast {
                from: other.kind_name(),
                to: "Array",
            }),
        }
    }

    /// Stream a binary cell; the stream is closed when the cursor advances.
    fn get_binary_stream(&self, column: usize) -> Result<Option<LobStream>> {
        self.current().binary_stream(column)
    }
}

/// Cursor over the answer of an executed statement
pub struct ResultCursor {
    wire: Option<Box<dyn WireResultSet>>,
    metadata: Option<ResultSetMetaData>,
    labels: Option<HashMap<String, usize>>,
    /// A row read ahead by `is_last`; `Some(None)` means the end was seen
    peeked: Option<Option<Vec<Value>>>,
    exhausted: bool,
    row: RowBuffer,
    parameters: ParameterMetaData,
}

impl std::fmt::Debug for ResultCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCursor")
            .field("open", &self.wire.is_some())
            .field("row_number", &self.row.row_number())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl ResultCursor {
    pub(crate) fn new(wire: Box<dyn WireResultSet>, parameter_count: usize) -> Self {
        Self {
            wire: Some(wire),
            metadata: None,
            labels: None,
            peeked: None,
            exhausted: false,
            row: RowBuffer::default(),
            parameters: ParameterMetaData::new(parameter_count),
        }
    }

    /// Parameter metadata of the statement that produced this cursor.
    pub fn parameter_metadata(&self) -> ParameterMetaData {
        self.parameters
    }

    /// 1-based index of the first column whose label matches, ignoring case.
    pub fn find_column(&mut self, label: &str) -> Result<usize> {
        if self.labels.is_none() {
            let mut labels = HashMap::new();
            for (i, column) in self.metadata()?.columns().iter().enumerate() {
                labels
                    .entry(column.label().to_ascii_lowercase())
                    .or_insert(i + 1);
            }
            self.labels = Some(labels);
        }
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(&label.to_ascii_lowercase()).copied())
            .ok_or_else(|| Error::EntryNotFound(label.to_string()))
    }

    /// Ask the server to stop producing rows.
    pub fn cancel(&mut self) -> Result<()> {
        match self.wire.as_mut() {
            Some(wire) => block_on_wire(wire.cancel()),
            None => Ok(()),
        }
    }

    /// Read the next data row from the wire, absorbing metadata tuples.
    fn fetch(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(wire) = self.wire.as_mut() else {
            return Ok(None);
        };
        loop {
            match block_on_wire(wire.next_tuple())? {
                Tuple::MetaData(columns) => {
                    trace!(columns = columns.len(), "received result metadata");
                    self.metadata = Some(ResultSetMetaData::new(columns));
                    self.labels = None;
                }
                Tuple::Data(values) => {
                    if let Some(meta) = &self.metadata {
                        if meta.column_count() != values.len() {
                            return Err(Error::unexpected(format!(
                                "row has {} cells but the result has {} columns",
                                values.len(),
                                meta.column_count()
                            )));
                        }
                    }
                    return Ok(Some(values));
                }
                Tuple::End => return Ok(None),
            }
        }
    }

    fn peek(&mut self) -> Result<bool> {
        if self.peeked.is_none() {
            let next = self.fetch()?;
            self.peeked = Some(next);
        }
        Ok(matches!(self.peeked, Some(Some(_))))
    }
}

impl RowCursor for ResultCursor {
    fn next(&mut self) -> Result<bool> {
        self.row.close_stream();
        if self.exhausted {
            return Ok(false);
        }
        let next = match self.peeked.take() {
            Some(next) => next,
            None => self.fetch()?,
        };
        match next {
            Some(values) => {
                let number = self.row.row_number().unwrap_or(0) + 1;
                self.row.set_row(values, number);
                Ok(true)
            }
            None => {
                trace!("result exhausted");
                self.exhausted = true;
                self.row.clear();
                Ok(false)
            }
        }
    }

    fn is_last(&mut self) -> Result<bool> {
        if self.exhausted || !self.row.is_on_row() {
            return Ok(false);
        }
        Ok(!self.peek()?)
    }

    fn metadata(&mut self) -> Result<&ResultSetMetaData> {
        if self.metadata.is_none() && !self.exhausted {
            self.peek()?;
        }
        self.metadata
            .as_ref()
            .ok_or(Error::NotSupported("statement produced no result metadata"))
    }

    fn close(&mut self) -> Result<()> {
        self.row.clear();
        self.exhausted = true;
        self.peeked = None;
        match self.wire.take() {
            Some(mut wire) => {
                debug!("closing result cursor");
                block_on_wire(wire.close())
            }
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.wire.is_none()
    }

    fn current(&self) -> &RowBuffer {
        &self.row
    }

    fn known_metadata(&self) -> Option<&ResultSetMetaData> {
        self.metadata.as_ref()
    }
}

impl Drop for ResultCursor {
    fn drop(&mut self) {
        self.row.close_stream();
        if let Some(mut wire) = self.wire.take() {
            run_cleanup(async move {
                if let Err(e) = wire.close().await {
                    warn!(error = %e, "failed to close result stream");
                }
            });
        }
    }
}
