/// Result and parameter metadata
///
/// Column descriptions arrive from the server as a metadata tuple ahead of
/// the first data row. This module wraps them with 1-based accessors and the
/// type mapping callers expect, and synthesizes the two-column description an
/// array cursor reports.
use crate::constants::{
    ARRAY_TYPE_SUFFIX, ELEMENT_INDEX_COLUMN, ELEMENT_VALUE_COLUMN, INTEGER_DISPLAY_SIZE,
    UNLIMITED_DISPLAY_SIZE,
};
use crate::error::{Error, Result};
use crate::types::{column_standard_type, host_repr, CatalogType, HostRepr, StandardType};

/// Per-column attribute flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnFlags {
    pub auto_increment: bool,
    pub case_insensitive: bool,
    pub not_searchable: bool,
    pub read_only: bool,
    pub not_nullable: bool,
    pub unique: bool,
    pub unsigned: bool,
    pub is_array: bool,
}

/// Description of one result column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetaData {
    pub catalog_type: CatalogType,
    /// Server type name of the element type, without the array suffix
    pub type_name: String,
    pub display_size: i32,
    pub precision: i32,
    pub scale: i32,
    pub flags: ColumnFlags,
    pub table_name: String,
    pub database_name: String,
    pub column_name: String,
    /// Label given by `AS`; empty when the select list used no alias
    pub alias_name: String,
    /// Maximum element count of an array column, 0 when unbounded
    pub cardinality: i32,
}

impl ColumnMetaData {
    /// A nullable scalar column with the catalog type's default name and sizes.
    pub fn new(column_name: impl Into<String>, catalog_type: CatalogType) -> Self {
        let (display_size, precision) = default_sizes(catalog_type);
        Self {
            catalog_type,
            type_name: catalog_type.sql_name().to_string(),
            display_size,
            precision,
            scale: 0,
            flags: ColumnFlags {
                unsigned: !catalog_type.is_signed(),
                ..ColumnFlags::default()
            },
            table_name: String::new(),
            database_name: String::new(),
            column_name: column_name.into(),
            alias_name: String::new(),
            cardinality: 0,
        }
    }

    /// The same column, marked as an array of its catalog type.
    pub fn into_array(mut self, cardinality: i32) -> Self {
        self.flags.is_array = true;
        self.cardinality = cardinality;
        self
    }

    pub fn standard_type(&self) -> StandardType {
        column_standard_type(self.catalog_type, self.flags.is_array)
    }

    /// Type name as callers see it: array columns carry a trailing ` array`.
    pub fn display_type_name(&self) -> String {
        if self.flags.is_array {
            format!("{}{ARRAY_TYPE_SUFFIX}", self.type_name)
        } else {
            self.type_name.clone()
        }
    }

    pub fn host_repr(&self) -> HostRepr {
        host_repr(self.catalog_type, self.flags.is_array)
    }

    /// Alias if one was given, the column name otherwise.
    pub fn label(&self) -> &str {
        if self.alias_name.is_empty() {
            &self.column_name
        } else {
            &self.alias_name
        }
    }

    /// Description of a single element of this array column.
    pub fn as_element(&self) -> ColumnMetaData {
        let mut element = self.clone();
        element.flags.is_array = false;
        element.cardinality = 0;
        element
    }

    /// Description of an array cursor's element-index column.
    pub fn element_index() -> ColumnMetaData {
        let mut index = ColumnMetaData::new(ELEMENT_INDEX_COLUMN, CatalogType::Integer);
        index.display_size = INTEGER_DISPLAY_SIZE;
        index.precision = INTEGER_DISPLAY_SIZE;
        index.flags.read_only = true;
        index.flags.not_nullable = true;
        index.flags.not_searchable = true;
        index
    }

    /// Element description for an array with no column metadata of its own.
    pub(crate) fn inferred_element(catalog_type: CatalogType) -> ColumnMetaData {
        let mut element = ColumnMetaData::new(ELEMENT_VALUE_COLUMN, catalog_type);
        element.flags.read_only = true;
        element
    }
}

fn default_sizes(catalog_type: CatalogType) -> (i32, i32) {
    match catalog_type {
        CatalogType::SmallInt => (6, 5),
        CatalogType::Integer => (INTEGER_DISPLAY_SIZE, INTEGER_DISPLAY_SIZE),
        CatalogType::BigInt => (19, 19),
        CatalogType::Float | CatalogType::DoublePrecision => (24, 15),
        CatalogType::Real => (14, 7),
        CatalogType::Date => (10, 10),
        CatalogType::Time => (12, 12),
        CatalogType::Timestamp => (23, 23),
        CatalogType::Boolean => (1, 1),
        CatalogType::CharacterLargeObject
        | CatalogType::NationalCharacterLargeObject
        | CatalogType::BinaryLargeObject => (UNLIMITED_DISPLAY_SIZE, UNLIMITED_DISPLAY_SIZE),
        _ => (0, 0),
    }
}

/// Column descriptions of a result, addressed by 1-based column index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSetMetaData {
    columns: Vec<ColumnMetaData>,
}

impl ResultSetMetaData {
    pub fn new(columns: Vec<ColumnMetaData>) -> Self {
        Self { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnMetaData] {
        &self.columns
    }

    /// Column description at a 1-based index.
    pub fn column(&self, column: usize) -> Result<&ColumnMetaData> {
        column
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .ok_or_else(|| {
                Error::BadArgument(format!(
                    "column index {column} outside 1..={}",
                    self.columns.len()
                ))
            })
    }

    pub fn column_label(&self, column: usize) -> Result<&str> {
        self.column(column).map(ColumnMetaData::label)
    }

    pub fn column_name(&self, column: usize) -> Result<&str> {
        self.column(column).map(|c| c.column_name.as_str())
    }

    pub fn column_type(&self, column: usize) -> Result<StandardType> {
        self.column(column).map(ColumnMetaData::standard_type)
    }

    pub fn column_type_name(&self, column: usize) -> Result<String> {
        self.column(column).map(ColumnMetaData::display_type_name)
    }

    pub fn column_host_repr(&self, column: usize) -> Result<HostRepr> {
        self.column(column).map(ColumnMetaData::host_repr)
    }

    pub fn display_size(&self, column: usize) -> Result<i32> {
        self.column(column).map(|c| c.display_size)
    }

    pub fn precision(&self, column: usize) -> Result<i32> {
        self.column(column).map(|c| c.precision)
    }

    pub fn scale(&self, column: usize) -> Result<i32> {
        self.column(column).map(|c| c.scale)
    }

    pub fn is_nullable(&self, column: usize) -> Result<bool> {
        self.column(column).map(|c| !c.flags.not_nullable)
    }

    pub fn is_signed(&self, column: usize) -> Result<bool> {
        self.column(column).map(|c| !c.flags.unsigned)
    }

    pub fn is_read_only(&self, column: usize) -> Result<bool> {
        self.column(column).map(|c| c.flags.read_only)
    }

    /// 1-based index of the first column whose label matches, ignoring case.
    pub fn find_column(&self, label: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.label().eq_ignore_ascii_case(label))
            .map(|i| i + 1)
            .ok_or_else(|| Error::EntryNotFound(label.to_string()))
    }
}

/// Parameter metadata of an executed statement
///
/// Only the parameter count is known on the client side; per-parameter type
/// queries are not supported by the server protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterMetaData {
    count: usize,
}

impl ParameterMetaData {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn parameter_count(&self) -> usize {
        self.count
    }

    fn check(&self, parameter: usize) -> Result<()> {
        if parameter < 1 || parameter > self.count {
            return Err(Error::BadArgument(format!(
                "parameter index {parameter} outside 1..={}",
                self.count
            )));
        }
        Ok(())
    }

    pub fn parameter_type(&self, parameter: usize) -> Result<StandardType> {
        self.check(parameter)?;
        Err(Error::NotSupported("parameter type"))
    }

    pub fn parameter_type_name(&self, parameter: usize) -> Result<String> {
        self.check(parameter)?;
        Err(Error::NotSupported("parameter type name"))
    }

    pub fn is_nullable(&self, parameter: usize) -> Result<bool> {
        self.check(parameter)?;
        Err(Error::NotSupported("parameter nullability"))
    }

    pub fn is_signed(&self, parameter: usize) -> Result<bool> {
        self.check(parameter)?;
        Err(Error::NotSupported("parameter signedness"))
    }
}
