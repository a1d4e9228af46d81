/// Database column types as far as value formatting cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    TinyInt,
    SmallInt,   // SMALLINT SHORT
    MediumInt,
    Int,        // INT INTEGER LONG
    BigInt,
    Varchar,    // VARCHAR VARYING
    Text,
    Timestamp,  // TIMESTAMP DATETIME
    Other,
}

impl ColumnType {
    pub fn classify(type_name: &str) -> Self {
        match type_name.trim().to_ascii_uppercase().as_str() {
            "TINYINT" => ColumnType::TinyInt,
            "SMALLINT" | "SHORT" => ColumnType::SmallInt,
            "MEDIUMINT" => ColumnType::MediumInt,
            "INT" | "INTEGER" | "LONG" => ColumnType::Int,
            "BIGINT" | "INT64" => ColumnType::BigInt,
            "VARCHAR" | "VARYING" => ColumnType::Varchar,
            "TEXT" | "BLOB" => ColumnType::Text,
            "TIMESTAMP" | "DATETIME" => ColumnType::Timestamp,
            _ => ColumnType::Other,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnType::TinyInt
                | ColumnType::SmallInt
                | ColumnType::MediumInt
                | ColumnType::Int
                | ColumnType::BigInt
        )
    }

    /// Output width used when printing values of this type, if fixed.
    pub fn width(self) -> Option<usize> {
        match self {
            ColumnType::TinyInt => Some(4),
            ColumnType::SmallInt => Some(6),
            ColumnType::MediumInt => Some(8),
            ColumnType::Int => Some(11),
            ColumnType::BigInt => Some(20),
            ColumnType::Timestamp => Some(19),
            ColumnType::Varchar | ColumnType::Text | ColumnType::Other => None,
        }
    }

    /// Normalise a raw textual value for this column type.
    ///
    /// Integers keep their digits in order and gain a leading `-` if any
    /// minus sign occurs anywhere in the input.
    pub fn clean(self, raw: &str) -> String {
        if self.is_integer() {
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            if raw.contains('-') {
                return format!("-{}", digits);
            }
            return digits;
        }

        if self == ColumnType::Timestamp {
            return raw.trim().replace('T', " ").chars().take(19).collect();
        }

        raw.trim().to_string()
    }
}
