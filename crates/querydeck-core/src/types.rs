use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value as produced by a driver
pub type Value = serde_json::Value;

/// A row of data, ordered like the header
pub type Row = Vec<Value>;

/// Column names of a result
pub type Header = Vec<String>;

/// Shape of the rows produced by a result stream
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// Rows share a fixed set of columns (SQL tables, columnar stores)
    #[default]
    Tabular,
    /// Rows carry arbitrary documents (MongoDB, Redis values, etc.)
    Schemaless,
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Tabular => write!(f, "tabular"),
            SchemaType::Schemaless => write!(f, "schemaless"),
        }
    }
}

/// Per-result metadata, known before the first row is read
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub schema_type: SchemaType,
}

impl Meta {
    pub fn new(schema_type: SchemaType) -> Self {
        Self { schema_type }
    }
}

/// Kind of a node in the structure tree
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    /// Grouping node without its own object (e.g. a schema)
    None,
    Table,
    View,
    Materialized,
    StreamingTable,
    Sink,
    Source,
    Managed,
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureType::None => write!(f, ""),
            StructureType::Table => write!(f, "table"),
            StructureType::View => write!(f, "view"),
            StructureType::Materialized => write!(f, "materialized"),
            StructureType::StreamingTable => write!(f, "streaming_table"),
            StructureType::Sink => write!(f, "sink"),
            StructureType::Source => write!(f, "source"),
            StructureType::Managed => write!(f, "managed"),
        }
    }
}

/// Hierarchical schema/table/view listing returned by a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Display name of the node
    pub name: String,
    /// Schema the node belongs to (empty for top-level nodes)
    pub schema: String,
    #[serde(rename = "type")]
    pub structure_type: StructureType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Structure>,
}

impl Structure {
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        structure_type: StructureType,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            structure_type,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Structure>) -> Self {
        self.children = children;
        self
    }

    /// Placeholder node shown when a driver has nothing to list
    pub fn no_schema() -> Self {
        Self::new("no schema to show", "", StructureType::None)
    }
}

/// Options handed to a formatter alongside the rows
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct FormatOptions {
    pub schema_type: SchemaType,
    /// Absolute index of the first row in the formatted slice
    pub chunk_start: usize,
}
