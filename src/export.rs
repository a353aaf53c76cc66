//! CSV export of movements and reconciliation reports

use csv::WriterBuilder;
use std::io;

use crate::amount::{canonical_amount, format_italian_date};
use crate::config::MovementColumns;
use crate::reconciliation::ReconciliationReport;
use crate::types::*;

/// Movements as UTF-8 CSV bytes, header row included
///
/// Amounts use the canonical dot-decimal form so that the file opens the
/// same way in any locale.
pub fn movements_to_csv<'a, I>(
    movements: I,
    columns: &MovementColumns,
) -> PrimaNotaResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a Movement>,
{
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record([
        &columns.date,
        &columns.reason,
        &columns.cost_center,
        &columns.amount,
        &columns.description,
        &columns.account,
        &columns.notes,
        &columns.period,
    ])?;

    for movement in movements {
        writer.write_record([
            format_italian_date(movement.date),
            movement.reason.clone(),
            movement.cost_center.clone(),
            canonical_amount(&movement.amount),
            movement.description.clone(),
            movement.account.clone(),
            movement.notes.clone(),
            movement.period().to_string(),
        ])?;
    }

    finish(writer)
}

/// Reconciliation rows as UTF-8 CSV bytes
pub fn reconciliation_to_csv(report: &ReconciliationReport) -> PrimaNotaResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["Cassa", "Saldo calcolato", "Saldo dichiarato", "Differenza", "Ok"])?;

    for row in &report.rows {
        writer.write_record([
            row.account.clone(),
            canonical_amount(&row.computed_balance),
            canonical_amount(&row.declared_balance),
            canonical_amount(&row.delta),
            if row.within_tolerance { "si" } else { "no" }.to_string(),
        ])?;
    }

    finish(writer)
}

/// Flush the CSV writer and hand back its sink
fn finish<W: io::Write>(writer: csv::Writer<W>) -> PrimaNotaResult<W> {
    writer
        .into_inner()
        .map_err(|e| PrimaNotaError::Export(e.into_error().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::reconcile;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    #[test]
    fn test_movements_csv() {
        let mut movement = Movement::new(
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            "Quote".to_string(),
            "Generale".to_string(),
            BigDecimal::from_str("1234.5").unwrap(),
            "Contanti".to_string(),
        );
        movement.description = "Quote, gennaio".to_string();

        let mut unpaid = movement.clone();
        unpaid.amount = BigDecimal::from(0);
        unpaid.description = String::new();

        let bytes = movements_to_csv(&[movement, unpaid], &MovementColumns::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Data,Causale,Centro,Importo,Descrizione,Cassa,Note,Mese")
        );
        assert_eq!(
            lines.next(),
            Some("10/01/2024,Quote,Generale,1234.50,\"Quote, gennaio\",Contanti,,2024-01")
        );
        assert_eq!(
            lines.next(),
            Some("10/01/2024,Quote,Generale,0.00,,Contanti,,2024-01")
        );
        assert_eq!(lines.next(), None);
    }

    struct FullDisk;

    impl io::Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_failure_is_an_export_error() {
        let mut writer = WriterBuilder::new().from_writer(FullDisk);
        writer.write_record(["Cassa", "Ok"]).unwrap();
        assert!(matches!(finish(writer), Err(PrimaNotaError::Export(_))));
    }

    #[test]
    fn test_reconciliation_csv() {
        let mut computed = BTreeMap::new();
        computed.insert("Contanti".to_string(), BigDecimal::from(60));
        let report = reconcile(&computed, &BTreeMap::new(), &BigDecimal::from_str("0.01").unwrap());

        let text = String::from_utf8(reconciliation_to_csv(&report).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Cassa,Saldo calcolato,Saldo dichiarato,Differenza,Ok",
                "Contanti,60.00,0.00,60.00,no",
            ]
        );
    }
}
