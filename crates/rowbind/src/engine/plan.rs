use crate::{
    error::Error,
    record::{ReadableRecord, WritableRecord},
    value::Value,
};
use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

///
/// ReadPlan
///
/// `SELECT <columns> FROM <table>` for one record type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadPlan {
    pub select: String,
    pub width: usize,
}

impl ReadPlan {
    pub fn of<R: ReadableRecord>() -> Result<Self, Error> {
        let table = R::table();
        let columns = R::columns();

        if table.is_empty() {
            return Err(Error::InvalidOutput {
                record: type_name::<R>(),
                reason: "record declares no table".to_string(),
            });
        }
        if columns.is_empty() {
            return Err(Error::InvalidOutput {
                record: type_name::<R>(),
                reason: "record declares no columns".to_string(),
            });
        }

        Ok(Self {
            select: format!("SELECT {} FROM {table}", columns.join(", ")),
            width: columns.len(),
        })
    }

    /// Full statement text for a caller fragment (`WHERE ...`, `ORDER BY ...`, or empty).
    #[must_use]
    pub fn statement(&self, fragment: &str) -> String {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            self.select.clone()
        } else {
            format!("{} {fragment}", self.select)
        }
    }
}

///
/// WritePlan
///
/// INSERT/UPDATE/DELETE text for one record type.
/// `insert_mask` lines up with primary values followed by values and is
/// false for the auto-increment column. `update` is `None` without value
/// columns and `delete` is `None` without primary keys.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WritePlan {
    pub insert: String,
    pub insert_mask: Vec<bool>,
    pub update: Option<String>,
    pub delete: Option<String>,
}

impl WritePlan {
    #[must_use]
    pub fn of<R: WritableRecord>() -> Self {
        let table = R::table();
        let primary = R::primary_keys();
        let values = R::value_columns();
        let auto = R::auto_increment_column();

        let insert_mask: Vec<bool> = primary
            .iter()
            .chain(values)
            .map(|column| Some(*column) != auto)
            .collect();
        let insert_columns: Vec<&str> = primary
            .iter()
            .chain(values)
            .zip(&insert_mask)
            .filter_map(|(column, keep)| keep.then_some(*column))
            .collect();

        // only the database fills in columns
        let insert = if insert_columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES (?)",
                insert_columns.join(", ")
            )
        };

        let cond = assignments(primary, " AND ");
        let set = assignments(values, ", ");

        Self {
            insert,
            insert_mask,
            update: (!primary.is_empty() && !values.is_empty())
                .then(|| format!("UPDATE {table} SET {set} WHERE {cond}")),
            delete: (!primary.is_empty()).then(|| format!("DELETE FROM {table} WHERE {cond}")),
        }
    }

    /// Insert arguments: primary then value arguments, auto-increment removed.
    #[must_use]
    pub fn insert_args(&self, args: WriteArgs) -> Vec<Value> {
        args.primary
            .into_iter()
            .chain(args.values)
            .zip(&self.insert_mask)
            .filter_map(|(value, keep)| keep.then_some(value))
            .collect()
    }

    /// Update arguments: SET values, then WHERE keys.
    #[must_use]
    pub fn update_args(args: WriteArgs) -> Vec<Value> {
        let WriteArgs { primary, mut values } = args;
        values.extend(primary);
        values
    }
}

///
/// WriteArgs
///
/// A record's primary and value arguments, checked to be scalars. A
/// sequence would be fanned out by the placeholder expander, so it can
/// never stand for a single column.
///

#[derive(Clone, Debug, PartialEq)]
pub struct WriteArgs {
    pub primary: Vec<Value>,
    pub values: Vec<Value>,
}

impl WriteArgs {
    pub fn of<R: WritableRecord>(record: &R) -> Result<Self, Error> {
        let primary = record.primary_values();
        let values = record.values();

        let columns = R::primary_keys().iter().chain(R::value_columns());
        if let Some((column, _)) = columns
            .zip(primary.iter().chain(&values))
            .find(|(_, value)| matches!(value, Value::List(_)))
        {
            return Err(Error::InvalidRecord {
                record: type_name::<R>(),
                reason: format!("column {column} is bound to a sequence"),
            });
        }

        Ok(Self { primary, values })
    }
}

fn assignments(columns: &[&str], sep: &str) -> String {
    columns
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(sep)
}

///
/// Registry
///
/// Lazily filled plan cache keyed by record type. Plans are immutable once
/// built, so entries are never invalidated.
///

#[derive(Debug, Default)]
pub struct Registry {
    read: RwLock<HashMap<TypeId, Arc<ReadPlan>>>,
    write: RwLock<HashMap<TypeId, Arc<WritePlan>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_plan<R: ReadableRecord + 'static>(&self) -> Result<Arc<ReadPlan>, Error> {
        let key = TypeId::of::<R>();
        if let Some(plan) = self
            .read
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(plan));
        }

        let plan = Arc::new(ReadPlan::of::<R>()?);
        let mut read = self.read.write().unwrap_or_else(PoisonError::into_inner);

        Ok(Arc::clone(read.entry(key).or_insert(plan)))
    }

    pub fn write_plan<R: WritableRecord + 'static>(&self) -> Arc<WritePlan> {
        let key = TypeId::of::<R>();
        if let Some(plan) = self
            .write
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(plan);
        }

        let plan = Arc::new(WritePlan::of::<R>());
        let mut write = self.write.write().unwrap_or_else(PoisonError::into_inner);

        Arc::clone(write.entry(key).or_insert(plan))
    }

    /// Number of record types with a cached plan (read and write counted separately).
    #[must_use]
    pub fn len(&self) -> usize {
        self.read.read().unwrap_or_else(PoisonError::into_inner).len()
            + self.write.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
