/// Cell values and the array contract
///
/// [`Value`] mirrors the data kinds the server puts on the wire. An
/// array-valued cell is read through [`Array`], which can hand its elements
/// out directly or re-expose them as a two-column [`ArrayCursor`].
use crate::array_cursor::ArrayCursor;
use crate::error::{Error, Result};
use crate::metadata::ColumnMetaData;
use crate::types::{standard_type, CatalogType, StandardType};
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::sync::Arc;

/// A word with its linguistic attributes, as returned by full-text functions
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub term: String,
    pub language: String,
    pub category: i32,
    pub scale: f64,
    pub document_frequency: i32,
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i32),
    BigInt(i64),
    /// Exact numeric, kept in its textual form
    Decimal(String),
    Double(f64),
    String(String),
    Binary(Bytes),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    /// Language tag set, e.g. `ja+en`
    Language(String),
    Word(Word),
    Array(Arc<[Value]>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value kind, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::BigInt(_) => "bigint",
            Value::Decimal(_) => "decimal",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Language(_) => "language",
            Value::Word(_) => "word",
            Value::Array(_) => "array",
        }
    }

    /// Catalog type a value of this kind would be declared with.
    pub fn catalog_type(&self) -> CatalogType {
        match self {
            Value::Null | Value::Array(_) => CatalogType::Unknown,
            Value::Integer(_) => CatalogType::Integer,
            Value::BigInt(_) => CatalogType::BigInt,
            Value::Decimal(_) => CatalogType::Decimal,
            Value::Double(_) => CatalogType::DoublePrecision,
            Value::String(_) => CatalogType::NationalCharacterVarying,
            Value::Binary(_) => CatalogType::BinaryVarying,
            Value::Date(_) => CatalogType::Date,
            Value::Timestamp(_) => CatalogType::Timestamp,
            Value::Language(_) => CatalogType::Language,
            Value::Word(_) => CatalogType::Word,
        }
    }

    fn cast_error(&self, to: &'static str) -> Error {
        Error::ClassCast {
            from: self.kind_name(),
            to,
        }
    }

    pub fn to_i32(&self) -> Result<Option<i32>> {
        match self {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(*v)),
            Value::BigInt(v) => i32::try_from(*v)
                .map(Some)
                .map_err(|_| self.cast_error("i32")),
            Value::Double(v) if v.is_finite() && *v >= i32::MIN as f64 && *v <= i32::MAX as f64 => {
                Ok(Some(*v as i32))
            }
            Value::Decimal(s) | Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.cast_error("i32")),
            _ => Err(self.cast_error("i32")),
        }
    }

    pub fn to_i64(&self) -> Result<Option<i64>> {
        match self {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(i64::from(*v))),
            Value::BigInt(v) => Ok(Some(*v)),
            Value::Double(v) if v.is_finite() && *v >= i64::MIN as f64 && *v <= i64::MAX as f64 => {
                Ok(Some(*v as i64))
            }
            Value::Decimal(s) | Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.cast_error("i64")),
            _ => Err(self.cast_error("i64")),
        }
    }

    pub fn to_f64(&self) -> Result<Option<f64>> {
        match self {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(f64::from(*v))),
            Value::BigInt(v) => Ok(Some(*v as f64)),
            Value::Double(v) => Ok(Some(*v)),
            Value::Decimal(s) | Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.cast_error("f64")),
            _ => Err(self.cast_error("f64")),
        }
    }

    pub fn to_string_value(&self) -> Result<Option<String>> {
        match self {
            Value::Null => Ok(None),
            Value::Binary(_) | Value::Array(_) => Err(self.cast_error("String")),
            other => Ok(Some(other.to_string())),
        }
    }

    pub fn to_bytes(&self) -> Result<Option<Bytes>> {
        match self {
            Value::Null => Ok(None),
            Value::Binary(b) => Ok(Some(b.clone())),
            _ => Err(self.cast_error("Bytes")),
        }
    }

    pub fn to_date(&self) -> Result<Option<NaiveDate>> {
        match self {
            Value::Null => Ok(None),
            Value::Date(d) => Ok(Some(*d)),
            Value::Timestamp(ts) => Ok(Some(ts.date())),
            _ => Err(self.cast_error("NaiveDate")),
        }
    }

    pub fn to_timestamp(&self) -> Result<Option<NaiveDateTime>> {
        match self {
            Value::Null => Ok(None),
            Value::Timestamp(ts) => Ok(Some(*ts)),
            Value::Date(d) => Ok(Some(d.and_time(chrono::NaiveTime::MIN))),
            _ => Err(self.cast_error("NaiveDateTime")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("(null)"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Decimal(s) | Value::String(s) | Value::Language(s) => f.write_str(s),
            Value::Double(v) => write!(f, "{v}"),
            Value::Binary(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.3f")),
            Value::Word(w) => f.write_str(&w.term),
            Value::Array(elements) => {
                f.write_str("{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// An array cell together with the metadata of the column it came from
#[derive(Debug, Clone)]
pub struct Array {
    elements: Arc<[Value]>,
    metadata: Option<ColumnMetaData>,
}

impl Array {
    pub fn new(elements: impl Into<Arc<[Value]>>) -> Self {
        Self {
            elements: elements.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(elements: impl Into<Arc<[Value]>>, metadata: ColumnMetaData) -> Self {
        Self {
            elements: elements.into(),
            metadata: Some(metadata),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Metadata of the array column, when the array came from a result row.
    pub fn metadata(&self) -> Option<&ColumnMetaData> {
        self.metadata.as_ref()
    }

    /// All elements, in order.
    pub fn as_slice(&self) -> &[Value] {
        &self.elements
    }

    /// Catalog type of the elements: declared by the column when known,
    /// otherwise inferred from the first element.
    pub fn element_catalog_type(&self) -> CatalogType {
        match &self.metadata {
            Some(meta) => meta.catalog_type,
            None => self
                .elements
                .first()
                .map_or(CatalogType::Unknown, Value::catalog_type),
        }
    }

    pub fn base_type(&self) -> Result<StandardType> {
        self.metadata
            .as_ref()
            .map(|meta| standard_type(meta.catalog_type))
            .ok_or(Error::NotSupported("base type of an array without column metadata"))
    }

    pub fn base_type_name(&self) -> Result<&str> {
        self.metadata
            .as_ref()
            .map(|meta| meta.type_name.as_str())
            .ok_or(Error::NotSupported(
                "base type name of an array without column metadata",
            ))
    }

    /// Elements `index..index + count`, with a 1-based `index`.
    ///
    /// `count` is clamped to the elements remaining after `index`.
    pub fn elements(&self, index: usize, count: usize) -> Result<&[Value]> {
        let (start, count) = self.range(index, count)?;
        Ok(&self.elements[start..start + count])
    }

    /// Cursor over every element.
    pub fn cursor(&self) -> ArrayCursor {
        ArrayCursor::over(self.clone(), 0, self.len())
    }

    /// Cursor over `count` elements starting at the 1-based `index`.
    pub fn cursor_range(&self, index: usize, count: usize) -> Result<ArrayCursor> {
        let (start, count) = self.range(index, count)?;
        Ok(ArrayCursor::over(self.clone(), start, count))
    }

    /// Validate a 1-based index and clamp the count; returns a 0-based start.
    fn range(&self, index: usize, count: usize) -> Result<(usize, usize)> {
        let len = self.len();
        if index < 1 || index > len {
            return Err(Error::BadArgument(format!(
                "array index {index} outside 1..={len}"
            )));
        }
        let start = index - 1;
        Ok((start, count.min(len - start)))
    }
}
