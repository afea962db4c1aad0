// Demo dataset - used when no data source is configured
//
// Three producers selling one batch each to two buyers, shipped in July 2024.
// Lead times are 1 day each and no leg stands out as a bottleneck.

use crate::dataset::Dataset;
use crate::records::{Batch, LogisticsMove, Transaction};

struct DemoRow {
    from: &'static str,
    to: &'static str,
    batch: &'static str,
    amount: f64,
    transaction_date: &'static str,
    delivery_date: &'static str,
    payment_date: &'static str,
    start_date: &'static str,
    end_date: &'static str,
    shipment_id: &'static str,
    delivered: bool,
    paid: bool,
}

const DEMO_ROWS: [DemoRow; 3] = [
    DemoRow {
        from: "Blue Aqua",
        to: "FreshSeafood",
        batch: "B001",
        amount: 5000.0,
        transaction_date: "2024-06-30",
        delivery_date: "2024-07-09",
        payment_date: "2024-07-10",
        start_date: "2024-07-08",
        end_date: "2024-07-09",
        shipment_id: "21001",
        delivered: true,
        paid: true,
    },
    DemoRow {
        from: "Green Oceans",
        to: "AquaRetail",
        batch: "B002",
        amount: 3000.0,
        transaction_date: "2024-07-01",
        delivery_date: "2024-07-12",
        payment_date: "2024-07-13",
        start_date: "2024-07-10",
        end_date: "2024-07-12",
        shipment_id: "21002",
        delivered: false,
        paid: false,
    },
    DemoRow {
        from: "FishPro",
        to: "FreshSeafood",
        batch: "B003",
        amount: 4500.0,
        transaction_date: "2024-07-02",
        delivery_date: "2024-07-15",
        payment_date: "2024-07-16",
        start_date: "2024-07-14",
        end_date: "2024-07-15",
        shipment_id: "21003",
        delivered: true,
        paid: true,
    },
];

/// Build the demo dataset
pub fn demo_dataset() -> Dataset {
    let mut transactions = Vec::new();
    let mut batches = Vec::new();
    let mut logistics = Vec::new();

    for row in &DEMO_ROWS {
        transactions.push(
            Transaction::new(row.from, row.to, row.batch)
                .with_dates(row.transaction_date, row.delivery_date, row.payment_date)
                .with_amount(row.amount)
                // Due date is the payment date in the demo export
                .with_payment_status(row.payment_date, row.paid),
        );

        batches.push(
            Batch::new(row.batch)
                .with_origin(row.from)
                .with_status(if row.delivered { "Delivered" } else { "In Transit" }),
        );

        logistics.push(
            LogisticsMove::new(
                row.batch,
                &format!("{} Farm", row.from),
                &format!("{} DC", row.to),
            )
            .with_window(row.start_date, row.end_date)
            .with_shipment(row.shipment_id, row.end_date, row.delivered),
        );
    }

    Dataset::new(transactions, batches, logistics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_dataset_shape() {
        let data = demo_dataset();

        assert_eq!(data.transactions.len(), 3);
        assert_eq!(data.batches.len(), 3);
        assert_eq!(data.logistics.len(), 3);
        assert_eq!(data.transactions[1].paid, Some(false));
        assert_eq!(data.logistics[1].delivered, Some(false));
    }

    #[test]
    fn test_demo_lead_times_are_one_day() {
        let data = demo_dataset();
        assert!(data
            .transactions
            .iter()
            .all(|tx| tx.payment_lead_time() == Some(1)));
    }
}
