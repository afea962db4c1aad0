// Batch - a traceable unit of product

use crate::dates::{self, deserialize_text};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub origin: Option<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub production_date: Option<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub status: Option<String>,
}

impl Batch {
    pub fn new(batch_id: &str) -> Self {
        Batch {
            batch_id: batch_id.to_string(),
            origin: None,
            production_date: None,
            status: None,
        }
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    pub fn with_production_date(mut self, date: &str) -> Self {
        self.production_date = Some(date.to_string());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn production_date(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.production_date.as_ref())
    }
}
