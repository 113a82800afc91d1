pub mod column;
pub mod record;
pub mod table;
pub mod time;
pub mod value;

pub use column::{Column, ColumnIter, DataType};
pub use record::{Record, RecordCollection};
pub use table::{Table, TableError};
pub use time::{canonicalize_time, format_time, parse_time, TimeParseError, TIME_WIDTH};
pub use value::Value;
