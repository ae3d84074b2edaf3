//! CSV export of a tax report's disposal rows, one line per disposal.

use super::TaxYearReport;
use std::io::Write;

/// Write the report's disposals as CSV.
///
/// # Errors
/// Returns an error when the underlying writer fails.
pub fn write_disposals_csv<W: Write>(report: &TaxYearReport, writer: W) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record([
        "eventId",
        "asset",
        "timestamp",
        "quantity",
        "proceeds",
        "costBasis",
        "fee",
        "realizedGain",
    ])?;
    for disposal in &report.disposals {
        out.write_record([
            disposal.event_id.as_str(),
            disposal.asset.as_str(),
            &disposal.timestamp.to_rfc3339(),
            &disposal.quantity.to_canonical_string(),
            &disposal.proceeds.to_canonical_string(),
            &disposal.cost_basis.to_canonical_string(),
            &disposal.fee.to_canonical_string(),
            &disposal.realized_gain.to_canonical_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::{AssetId, Decimal, EventId, EventKind, LedgerEvent};
    use crate::tax::generate_tax_report;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    #[test]
    fn test_disposals_csv_rows() {
        let dec = |s: &str| Decimal::from_str(s).unwrap();
        let event = |id: &str, day: u32, kind: EventKind| LedgerEvent {
            id: EventId::new(id),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
            timestamp: Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap(),
            account: None,
            note: None,
            tags: Vec::new(),
            external_ref: None,
            replaces_event_id: None,
            deleted: false,
            fee: None,
            kind,
        };

        let active = vec![
            event(
                "b1",
                1,
                EventKind::Buy {
                    asset: AssetId::new("BTC"),
                    quantity: dec("1"),
                    price_base: Some(dec("100")),
                },
            ),
            event(
                "s1",
                2,
                EventKind::Sell {
                    asset: AssetId::new("BTC"),
                    quantity: dec("1"),
                    price_base: Some(dec("150")),
                },
            ),
        ];
        let report = generate_tax_report(&active, &Settings::default(), 2025, None).unwrap();

        let mut buffer = Vec::new();
        write_disposals_csv(&report, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "eventId,asset,timestamp,quantity,proceeds,costBasis,fee,realizedGain"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("s1,BTC,2025-06-02T00:00:00+00:00,1,150,100,0,50"));
        assert!(lines.next().is_none());
    }
}
