use serde::Deserialize;

///
/// ColumnMode
///
/// How `ReadableRecord::columns()` spells column names.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMode {
    #[default]
    Plain,
    Qualified,
}

///
/// FieldStep
///
/// One hop from the record towards a mapped field. `optional` marks an
/// `Option<Nested>` hop that has to be unwrapped (or materialised) on access.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldStep {
    pub ident: String,
    pub optional: bool,
}

impl FieldStep {
    #[must_use]
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            optional: false,
        }
    }
}

///
/// FieldSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    pub path: Vec<FieldStep>,
    pub column: String,
    pub ty: syn::Type,
    pub primary: bool,
    pub auto_increment: bool,
}

impl FieldSpec {
    /// Dotted accessor path, e.g. `audit.created_by`.
    #[must_use]
    pub fn accessor(&self) -> String {
        self.path
            .iter()
            .map(|step| step.ident.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

///
/// TableDescription
///
/// Ordered column metadata for one record type. `primary` and `values`
/// partition every mapped field in declaration order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableDescription {
    pub record: String,
    pub table: String,
    pub primary: Vec<FieldSpec>,
    pub values: Vec<FieldSpec>,
    pub auto_increment: Option<String>,
}

impl TableDescription {
    /// Primary fields followed by value fields.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.primary.iter().chain(&self.values)
    }

    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.fields().map(|field| field.column.as_str()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.values.is_empty()
    }
}
