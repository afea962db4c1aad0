// LogisticsMove - one physical transport leg of a batch

use super::{typed_cell, RejectedCell};
use crate::dates::{self, deserialize_scalar, deserialize_text};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMove")]
pub struct LogisticsMove {
    pub batch_id: String,
    pub from_location: String,
    pub to_location: String,

    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cost: Option<f64>,

    // Shipment tracking
    pub shipment_id: Option<String>,
    pub delivery_eta: Option<String>,
    pub delivered: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedCell>,
}

/// Row as read from CSV
///
/// Older exports say `move_date` / `logistics_cost`; combined order exports
/// have no location columns and name the parties `from_entity` / `to_entity`.
#[derive(Debug, Deserialize)]
struct RawMove {
    batch_id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    from_location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    to_location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    from_entity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    to_entity: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    start_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    move_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    end_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    cost: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    logistics_cost: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    shipment_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    delivery_eta: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    delivered: Option<String>,
}

impl From<RawMove> for LogisticsMove {
    fn from(raw: RawMove) -> Self {
        let mut rejected = Vec::new();
        let cost = typed_cell(
            "cost",
            raw.cost.or(raw.logistics_cost),
            dates::parse_number,
            &mut rejected,
        );
        let delivered = typed_cell("delivered", raw.delivered, dates::parse_flag, &mut rejected);

        LogisticsMove {
            batch_id: raw.batch_id,
            from_location: raw.from_location.or(raw.from_entity).unwrap_or_default(),
            to_location: raw.to_location.or(raw.to_entity).unwrap_or_default(),
            // start_date wins when a file carries both spellings
            start_date: raw.start_date.or(raw.move_date),
            end_date: raw.end_date,
            cost,
            shipment_id: raw.shipment_id,
            delivery_eta: raw.delivery_eta,
            delivered,
            rejected,
        }
    }
}

impl LogisticsMove {
    pub fn new(batch_id: &str, from_location: &str, to_location: &str) -> Self {
        LogisticsMove {
            batch_id: batch_id.to_string(),
            from_location: from_location.to_string(),
            to_location: to_location.to_string(),
            start_date: None,
            end_date: None,
            cost: None,
            shipment_id: None,
            delivery_eta: None,
            delivered: None,
            rejected: Vec::new(),
        }
    }

    /// Builder pattern: start and end dates
    pub fn with_window(mut self, start: &str, end: &str) -> Self {
        self.start_date = Some(start.to_string());
        self.end_date = Some(end.to_string());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Builder pattern: shipment id, ETA and delivered flag
    pub fn with_shipment(mut self, shipment_id: &str, eta: &str, delivered: bool) -> Self {
        self.shipment_id = Some(shipment_id.to_string());
        self.delivery_eta = Some(eta.to_string());
        self.delivered = Some(delivered);
        self
    }

    pub fn start_date(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.start_date.as_ref())
    }

    pub fn end_date(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.end_date.as_ref())
    }

    pub fn delivery_eta(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.delivery_eta.as_ref())
    }

    /// Transit time in whole days, `None` if either date is missing
    pub fn duration_days(&self) -> Option<i64> {
        Some(dates::days_between(self.start_date()?, self.end_date()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_days() {
        let mv = LogisticsMove::new("B001", "Farm", "Port").with_window("2024-07-08", "2024-07-12");
        assert_eq!(mv.duration_days(), Some(4));
    }

    #[test]
    fn test_duration_requires_both_dates() {
        let mut mv = LogisticsMove::new("B001", "Farm", "Port");
        mv.start_date = Some("2024-07-08".to_string());
        assert_eq!(mv.duration_days(), None);
    }

    fn read_moves(data: &str) -> Vec<LogisticsMove> {
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        rdr.deserialize()
            .collect::<Result<_, _>>()
            .expect("rows load")
    }

    #[test]
    fn test_both_date_spellings_in_one_file() {
        let moves = read_moves(
            "batch_id,from_location,to_location,start_date,move_date,end_date\n\
             B001,Farm,Port,2024-07-08,2024-07-01,2024-07-10\n\
             B002,Farm,Port,,2024-07-02,2024-07-10\n",
        );

        assert_eq!(moves[0].start_date.as_deref(), Some("2024-07-08"));
        assert_eq!(moves[0].duration_days(), Some(2));
        assert_eq!(moves[1].start_date.as_deref(), Some("2024-07-02"));
    }

    #[test]
    fn test_entity_columns_stand_in_for_locations() {
        let moves = read_moves(
            "batch_id,from_entity,to_entity,start_date,end_date,delivered\n\
             B001,Blue Aqua,FreshSeafood,2024-07-08,2024-07-09,maybe\n",
        );

        assert_eq!(moves[0].from_location, "Blue Aqua");
        assert_eq!(moves[0].to_location, "FreshSeafood");
        assert_eq!(moves[0].delivered, None);
        assert_eq!(moves[0].rejected[0].field, "delivered");
        assert_eq!(moves[0].rejected[0].value, "maybe");
    }
}
