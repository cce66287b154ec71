//! Catalog type mapping
//!
//! The server describes every column with a catalog type code. Callers expect
//! vendor-neutral standard type codes (the values shared by JDBC `Types` and
//! ODBC), a type name, and the host type a cell will be read as. Everything
//! here is a pure function of its inputs.
//!
//! The array meta-type is not a catalog code of its own: it is a flag carried
//! next to the element type, and it overrides the host representation.

/// Server catalog type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogType {
    Unknown,
    Character,
    CharacterVarying,
    NationalCharacter,
    NationalCharacterVarying,
    Binary,
    BinaryVarying,
    CharacterLargeObject,
    NationalCharacterLargeObject,
    BinaryLargeObject,
    Numeric,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Float,
    Real,
    DoublePrecision,
    Boolean,
    Date,
    Time,
    Timestamp,
    Language,
    Word,
}

impl CatalogType {
    /// Every defined catalog type, in code order.
    pub const ALL: [CatalogType; 24] = [
        CatalogType::Unknown,
        CatalogType::Character,
        CatalogType::CharacterVarying,
        CatalogType::NationalCharacter,
        CatalogType::NationalCharacterVarying,
        CatalogType::Binary,
        CatalogType::BinaryVarying,
        CatalogType::CharacterLargeObject,
        CatalogType::NationalCharacterLargeObject,
        CatalogType::BinaryLargeObject,
        CatalogType::Numeric,
        CatalogType::SmallInt,
        CatalogType::Integer,
        CatalogType::BigInt,
        CatalogType::Decimal,
        CatalogType::Float,
        CatalogType::Real,
        CatalogType::DoublePrecision,
        CatalogType::Boolean,
        CatalogType::Date,
        CatalogType::Time,
        CatalogType::Timestamp,
        CatalogType::Language,
        CatalogType::Word,
    ];

    pub fn code(self) -> i32 {
        // ALL is in code order, so the position is the code.
        Self::ALL
            .iter()
            .position(|t| *t == self)
            .map_or(0, |p| p as i32)
    }

    /// Decode a wire code; codes this client does not know become `Unknown`.
    pub fn from_code(code: i32) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(CatalogType::Unknown)
    }

    /// Default SQL type name, used when the server supplies none.
    pub fn sql_name(self) -> &'static str {
        match self {
            CatalogType::Unknown => "unknown",
            CatalogType::Character => "char",
            CatalogType::CharacterVarying => "varchar",
            CatalogType::NationalCharacter => "nchar",
            CatalogType::NationalCharacterVarying => "nvarchar",
            CatalogType::Binary => "binary",
            CatalogType::BinaryVarying => "varbinary",
            CatalogType::CharacterLargeObject => "clob",
            CatalogType::NationalCharacterLargeObject => "nclob",
            CatalogType::BinaryLargeObject => "blob",
            CatalogType::Numeric => "numeric",
            CatalogType::SmallInt => "smallint",
            CatalogType::Integer => "int",
            CatalogType::BigInt => "bigint",
            CatalogType::Decimal => "decimal",
            CatalogType::Float => "float",
            CatalogType::Real => "real",
            CatalogType::DoublePrecision => "double precision",
            CatalogType::Boolean => "boolean",
            CatalogType::Date => "date",
            CatalogType::Time => "time",
            CatalogType::Timestamp => "datetime",
            CatalogType::Language => "language",
            CatalogType::Word => "word",
        }
    }

    /// Whether values of this type carry a sign.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            CatalogType::Numeric
                | CatalogType::SmallInt
                | CatalogType::Integer
                | CatalogType::BigInt
                | CatalogType::Decimal
                | CatalogType::Float
                | CatalogType::Real
                | CatalogType::DoublePrecision
        )
    }
}

/// Vendor-neutral standard type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardType {
    Unknown,
    Char,
    Varchar,
    Binary,
    Varbinary,
    Clob,
    Blob,
    Numeric,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Double,
    Boolean,
    Date,
    Time,
    Timestamp,
    Other,
    Array,
}

impl StandardType {
    pub fn code(self) -> i32 {
        match self {
            StandardType::Unknown => 0,
            StandardType::Char => 1,
            StandardType::Varchar => 12,
            StandardType::Binary => -2,
            StandardType::Varbinary => -3,
            StandardType::Clob => 2005,
            StandardType::Blob => 2004,
            StandardType::Numeric => 2,
            StandardType::SmallInt => 5,
            StandardType::Integer => 4,
            StandardType::BigInt => -5,
            StandardType::Decimal => 3,
            StandardType::Double => 8,
            StandardType::Boolean => 16,
            StandardType::Date => 91,
            StandardType::Time => 92,
            StandardType::Timestamp => 93,
            StandardType::Other => 1111,
            StandardType::Array => 2003,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StandardType::Unknown => "UNKNOWN",
            StandardType::Char => "CHAR",
            StandardType::Varchar => "VARCHAR",
            StandardType::Binary => "BINARY",
            StandardType::Varbinary => "VARBINARY",
            StandardType::Clob => "CLOB",
            StandardType::Blob => "BLOB",
            StandardType::Numeric => "NUMERIC",
            StandardType::SmallInt => "SMALLINT",
            StandardType::Integer => "INTEGER",
            StandardType::BigInt => "BIGINT",
            StandardType::Decimal => "DECIMAL",
            StandardType::Double => "DOUBLE",
            StandardType::Boolean => "BOOLEAN",
            StandardType::Date => "DATE",
            StandardType::Time => "TIME",
            StandardType::Timestamp => "TIMESTAMP",
            StandardType::Other => "OTHER",
            StandardType::Array => "ARRAY",
        }
    }
}

/// Map a catalog type to its standard type.
///
/// National character types fold onto their plain counterparts and every
/// floating-point type reports `Double`; the language
/// and word extension types have no standard equivalent and report `Other`.
pub fn standard_type(catalog: CatalogType) -> StandardType {
    match catalog {
        CatalogType::Unknown => StandardType::Unknown,
        CatalogType::Character | CatalogType::NationalCharacter => StandardType::Char,
        CatalogType::CharacterVarying | CatalogType::NationalCharacterVarying => {
            StandardType::Varchar
        }
        CatalogType::Binary => StandardType::Binary,
        CatalogType::BinaryVarying => StandardType::Varbinary,
        CatalogType::CharacterLargeObject | CatalogType::NationalCharacterLargeObject => {
            StandardType::Clob
        }
        CatalogType::BinaryLargeObject => StandardType::Blob,
        CatalogType::Numeric => StandardType::Numeric,
        CatalogType::SmallInt => StandardType::SmallInt,
        CatalogType::Integer => StandardType::Integer,
        CatalogType::BigInt => StandardType::BigInt,
        CatalogType::Decimal => StandardType::Decimal,
        CatalogType::Float | CatalogType::Real | CatalogType::DoublePrecision => {
            StandardType::Double
        }
        CatalogType::Boolean => StandardType::Boolean,
        CatalogType::Date => StandardType::Date,
        CatalogType::Time => StandardType::Time,
        CatalogType::Timestamp => StandardType::Timestamp,
        CatalogType::Language | CatalogType::Word => StandardType::Other,
    }
}

/// Standard type of a column, honouring the array flag.
pub fn column_standard_type(catalog: CatalogType, is_array: bool) -> StandardType {
    if is_array {
        StandardType::Array
    } else {
        standard_type(catalog)
    }
}

/// Host type a cell of a column is read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostRepr {
    Int,
    Long,
    Decimal,
    Double,
    Boolean,
    String,
    Bytes,
    Date,
    Time,
    Timestamp,
    Language,
    Word,
    /// The array contract: see [`Array`](crate::value::Array)
    Array,
    /// Untyped; read as [`Value`](crate::value::Value)
    Value,
}

impl HostRepr {
    /// Stable identifier of the host type.
    pub fn name(self) -> &'static str {
        match self {
            HostRepr::Int => "i32",
            HostRepr::Long => "i64",
            HostRepr::Decimal => "Decimal",
            HostRepr::Double => "f64",
            HostRepr::Boolean => "bool",
            HostRepr::String => "String",
            HostRepr::Bytes => "Bytes",
            HostRepr::Date => "NaiveDate",
            HostRepr::Time => "NaiveTime",
            HostRepr::Timestamp => "NaiveDateTime",
            HostRepr::Language => "Language",
            HostRepr::Word => "Word",
            HostRepr::Array => "Array",
            HostRepr::Value => "Value",
        }
    }
}

/// Map a column's catalog type and array flag to its host representation.
///
/// An array column is always the array contract, whatever its element type.
pub fn host_repr(catalog: CatalogType, is_array: bool) -> HostRepr {
    if is_array {
        return HostRepr::Array;
    }
    match catalog {
        CatalogType::Unknown => HostRepr::Value,
        CatalogType::Character
        | CatalogType::CharacterVarying
        | CatalogType::NationalCharacter
        | CatalogType::NationalCharacterVarying
        | CatalogType::CharacterLargeObject
        | CatalogType::NationalCharacterLargeObject => HostRepr::String,
        CatalogType::Binary | CatalogType::BinaryVarying | CatalogType::BinaryLargeObject => {
            HostRepr::Bytes
        }
        CatalogType::Numeric | CatalogType::Decimal => HostRepr::Decimal,
        CatalogType::SmallInt | CatalogType::Integer => HostRepr::Int,
        CatalogType::BigInt => HostRepr::Long,
        CatalogType::Float | CatalogType::Real | CatalogType::DoublePrecision => HostRepr::Double,
        CatalogType::Boolean => HostRepr::Boolean,
        CatalogType::Date => HostRepr::Date,
        CatalogType::Time => HostRepr::Time,
        CatalogType::Timestamp => HostRepr::Timestamp,
        CatalogType::Language => HostRepr::Language,
        CatalogType::Word => HostRepr::Word,
    }
}
