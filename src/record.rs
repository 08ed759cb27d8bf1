//! The record shape written by a run and the in-memory batch that holds it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The number of records inserted when no batch size is configured.
pub const DEFAULT_BATCH_SIZE: usize = 500_000;

/// A single document of the bulk insert.
///
/// Only the id is ever populated. The remaining fields mirror the schema the run was designed
/// against: list and most string fields are omitted from BSON when empty, and
/// `wwwwwwwwwwwwwwwwwwww` is never written to the database at all.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub ssssssssssssssss: String,

    #[serde(rename = "iiiiiiiiiiiiiiii1111111111", default)]
    pub iiiiiiiiiiiiiiii_1111111111: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dddddddddddddddddddddd: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pppppppppppppppp: Vec<String>,

    #[serde(skip)]
    pub wwwwwwwwwwwwwwwwwwww: Vec<String>,

    #[serde(
        rename = "ssssssssssssssssssSS",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub ssssssssssssssssss_ss: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub xxxxxxxxxxxxxxx: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ttt: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ccc: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bbb: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aaa: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ggg: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ddd: Vec<String>,
}

impl Record {
    /// Creates a record with a freshly generated v4 UUID as its id and every other field empty.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ..Default::default()
        }
    }
}

/// An ordered, owned batch of records submitted as one `insertMany`.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    /// Builds `size` records, each with its own id. Memory use is linear in `size`.
    pub fn generate(size: usize) -> Self {
        let mut records = Vec::with_capacity(size);
        records.extend((0..size).map(|_| Record::new()));
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
