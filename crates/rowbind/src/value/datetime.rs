use super::{FieldValue, Value};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

// the text form sqlite's date functions understand
const DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// written only when the value has a sub-second part
const DATETIME_FRACTION: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");

// read side accepts both
const DATETIME_READ: &[BorrowedFormatItem<'static>] = format_description!(
    version = 2,
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);

impl FieldValue for PrimitiveDateTime {
    fn to_value(&self) -> Value {
        let format = if self.nanosecond() == 0 {
            DATETIME
        } else {
            DATETIME_FRACTION
        };

        match self.format(format) {
            Ok(text) => Value::Text(text),
            Err(err) => {
                log::warn!("cannot format {self:?} as a datetime column: {err}");
                Value::Null
            }
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(text) => Self::parse(text, DATETIME_READ).ok(),
            _ => None,
        }
    }
}
