//! Integration tests for prima-nota-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use prima_nota_core::{
    format_euro, normalize,
    sheet::Table,
    utils::{EnhancedMovementValidator, MemoryStorage},
    DeclaredBalance, MovementBuilder, MovementDraft, MovementFilter, Period, PrimaNota,
    PrimaNotaConfig, PrimaNotaError, PrimaNotaStorage, RowIssue,
};
use std::str::FromStr;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Movements sheet as the original spreadsheet holds it: no id column,
/// Italian amounts, mixed date formats
fn legacy_movements() -> Table {
    Table::from_rows(
        &[
            "Data",
            "Causale",
            "Centro",
            "Importo",
            "Descrizione",
            "Cassa",
            "Note",
            "Mese",
        ],
        &[
            &["10/01/2024", "Quote", "Generale", "100,00", "Quote soci", "Contanti", "", "2024-01"],
            &["2024-01-15", "Spese", "Sede", "-40,00", "Cancelleria", "Contanti", "", "2024-01"],
            &["03/02/2024", "Donazioni", "Progetti", "1.250,40", "Bonifico", "Banco Posta", "", "2024-02"],
            &["05/02/2024", "Spese", "Sede", "n.d.", "Bolletta", "Banco Posta", "da verificare", "2024-02"],
        ],
    )
}

#[tokio::test]
async fn test_complete_prima_nota_workflow() {
    let storage = MemoryStorage::new();
    storage
        .insert_table("prima_nota", legacy_movements())
        .unwrap();
    let mut prima_nota = PrimaNota::new(storage.clone(), PrimaNotaConfig::default());

    // Loading keeps the unparseable amount as zero and reports it
    let listing = prima_nota.load_movements().await.unwrap();
    assert_eq!(listing.movements.len(), 4);
    assert_eq!(listing.warnings.len(), 1);
    assert_eq!(listing.warnings[0].row, 4);
    assert!(matches!(listing.warnings[0].issue, RowIssue::Amount(_)));

    // Dashboard totals
    let totals = prima_nota.aggregate(&MovementFilter::all()).await.unwrap();
    assert_eq!(totals.total_income(), &dec("1350.40"));
    assert_eq!(totals.total_expense(), &dec("40"));
    assert_eq!(totals.net_balance(), &dec("1310.40"));
    assert_eq!(totals.movement_count, 4);
    let periods: Vec<String> = totals.by_period.keys().map(|p| p.to_string()).collect();
    assert_eq!(periods, vec!["2024-01", "2024-02"]);

    // Declared balances are seeded at zero before anything is saved
    let seed = prima_nota.declared_balances_or_seed().await.unwrap();
    let accounts: Vec<&str> = seed.iter().map(|b| b.account.as_str()).collect();
    assert_eq!(accounts, vec!["Banco Posta", "Contanti"]);

    // Only Contanti is declared: Banco Posta shows its full balance as delta
    prima_nota
        .save_declared_balances(vec![DeclaredBalance::new("Contanti", dec("60"))])
        .await
        .unwrap();
    let report = prima_nota.reconcile().await.unwrap();
    assert!(!report.ok);
    let banco = report.row("Banco Posta").unwrap();
    assert_eq!(banco.delta, dec("1250.40"));
    assert_eq!(report.row("Contanti").unwrap().delta, dec("0"));

    prima_nota
        .save_declared_balances(vec![
            DeclaredBalance::new("Contanti", dec("60")),
            DeclaredBalance::new("Banco Posta", dec("1250.41")),
        ])
        .await
        .unwrap();
    let overview = prima_nota.balance_overview().await.unwrap();
    assert!(!overview.seeded);
    assert!(overview.report.ok);
    assert_eq!(overview.warnings.len(), 1);

    // Legacy rows keep their ids across loads and the first write stores them
    let first_id = prima_nota.load_movements().await.unwrap().movements[0].id;
    assert_eq!(first_id, listing.movements[0].id);
    let added = prima_nota
        .add_movement(
            MovementBuilder::new(date(2024, 2, 20), "Quote", "Contanti", "€ 25,00")
                .cost_center("Generale")
                .description("Quota ritardataria")
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(added.amount, dec("25"));

    let stored = storage.read_table("prima_nota").await.unwrap();
    assert!(stored.column_index("Id").is_some());
    assert_eq!(stored.rows.len(), 5);
    let amount_col = stored.column_index("Importo").unwrap();
    assert_eq!(stored.cell(3, amount_col), "n.d.");
    assert_eq!(stored.cell(4, amount_col), "25.00");

    let reloaded = prima_nota.load_movements().await.unwrap();
    assert_eq!(reloaded.movements[0].id, first_id);
    assert_eq!(reloaded.warnings, listing.warnings);
}

#[tokio::test]
async fn test_legacy_rows_are_editable_by_listed_id() {
    let storage = MemoryStorage::new();
    storage
        .insert_table("prima_nota", legacy_movements())
        .unwrap();
    let mut prima_nota = PrimaNota::new(storage, PrimaNotaConfig::default());

    let listing = prima_nota
        .list_movements(&MovementFilter::all().account("Contanti"))
        .await
        .unwrap();
    let quote = listing.movements[0].clone();
    let spese = listing.movements[1].clone();

    let removed = prima_nota.delete_movement(spese.id).await.unwrap();
    assert_eq!(removed.description, "Cancelleria");

    let mut draft = MovementDraft::from(&quote);
    draft.amount = "110,00".to_string();
    prima_nota.update_movement(quote.id, draft).await.unwrap();

    let balances = prima_nota.account_balances().await.unwrap();
    assert_eq!(balances["Contanti"], dec("110"));
    assert!(prima_nota.get_movement(spese.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rows_with_bad_dates_survive_writes() {
    let storage = MemoryStorage::new();
    storage
        .insert_table(
            "prima_nota",
            Table::from_rows(
                &["Data", "Causale", "Centro", "Importo", "Cassa", "Allegato"],
                &[
                    &["10/01/2024", "Quote", "Generale", "100,00", "Contanti", "ric-1"],
                    &["31/02/2024", "Spese", "Sede", "-500,00", "Contanti", "ric-2"],
                    &["15/01/2024", "Spese", "Sede", "-40,00", "Contanti", ""],
                ],
            ),
        )
        .unwrap();
    let mut prima_nota = PrimaNota::new(storage.clone(), PrimaNotaConfig::default());

    prima_nota
        .add_movement(
            MovementBuilder::new(date(2024, 1, 20), "Quote", "Contanti", "5")
                .cost_center("Generale")
                .build(),
        )
        .await
        .unwrap();

    let stored = storage.read_table("prima_nota").await.unwrap();
    assert_eq!(stored.rows.len(), 4);
    assert_eq!(stored.cell(1, 0), "31/02/2024");
    assert_eq!(stored.cell(1, 3), "-500,00");
    assert_eq!(stored.cell(0, stored.column_index("Allegato").unwrap()), "ric-1");

    let listing = prima_nota.load_movements().await.unwrap();
    assert_eq!(listing.movements.len(), 3);
    assert_eq!(listing.warnings.len(), 1);
    assert_eq!(listing.warnings[0].row, 2);
    assert!(matches!(listing.warnings[0].issue, RowIssue::Date(_)));
}

#[tokio::test]
async fn test_duplicate_rows_are_addressed_by_id() {
    let storage = MemoryStorage::new();
    let mut prima_nota = PrimaNota::new(storage, PrimaNotaConfig::default());

    let draft = MovementBuilder::new(date(2024, 3, 1), "Spese", "Contanti", "-12,50")
        .cost_center("Sede")
        .description("Caffè")
        .build();
    let first = prima_nota.add_movement(draft.clone()).await.unwrap();
    let second = prima_nota.add_movement(draft.clone()).await.unwrap();

    let mut edited = draft;
    edited.amount = "-13,00".to_string();
    prima_nota.update_movement(second.id, edited).await.unwrap();

    let first_now = prima_nota.get_movement(first.id).await.unwrap().unwrap();
    let second_now = prima_nota.get_movement(second.id).await.unwrap().unwrap();
    assert_eq!(first_now.amount, dec("-12.50"));
    assert_eq!(second_now.amount, dec("-13"));

    prima_nota.delete_movement(first.id).await.unwrap();
    assert!(prima_nota.get_movement(first.id).await.unwrap().is_none());
    assert!(prima_nota.get_movement(second.id).await.unwrap().is_some());

    assert!(matches!(
        prima_nota.delete_movement(first.id).await,
        Err(PrimaNotaError::MovementNotFound(id)) if id == first.id
    ));
}

#[tokio::test]
async fn test_invalid_entry_is_not_saved() {
    let storage = MemoryStorage::new();
    let mut prima_nota = PrimaNota::with_validator(
        storage.clone(),
        PrimaNotaConfig::default(),
        Box::new(EnhancedMovementValidator),
    );

    let bad_amount = prima_nota
        .add_movement(
            MovementBuilder::new(date(2024, 3, 1), "Quote", "Contanti", "cento")
                .cost_center("Generale")
                .build(),
        )
        .await;
    assert!(matches!(bad_amount, Err(PrimaNotaError::InvalidAmount(_))));

    let zero = prima_nota
        .add_movement(
            MovementBuilder::new(date(2024, 3, 1), "Quote", "Contanti", "0,00")
                .cost_center("Generale")
                .build(),
        )
        .await;
    assert!(matches!(zero, Err(PrimaNotaError::Validation(_))));

    assert!(storage.read_table("prima_nota").await.unwrap().is_blank());
}

#[tokio::test]
async fn test_missing_required_column_is_fatal() {
    let storage = MemoryStorage::new();
    storage
        .insert_table(
            "prima_nota",
            Table::from_rows(&["Data", "Cassa", "Valore"], &[&["10/01/2024", "Contanti", "5"]]),
        )
        .unwrap();
    let prima_nota = PrimaNota::new(storage, PrimaNotaConfig::default());

    match prima_nota.reconcile().await {
        Err(PrimaNotaError::MissingColumn { column, .. }) => assert_eq!(column, "Importo"),
        other => panic!("expected a missing column error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_configuration() {
    let config = PrimaNotaConfig::from_toml_str(
        r#"
        tolerance = "0,50"

        [tables]
        declared_balances = "saldi"

        [balance_columns]
        declared = ["Estratto conto"]
        "#,
    )
    .unwrap();

    let storage = MemoryStorage::new();
    storage
        .insert_table(
            "prima_nota",
            Table::from_rows(
                &["Data", "Importo", "Cassa", "Causale"],
                &[&["10/01/2024", "10,40", "Contanti", "Quote"]],
            ),
        )
        .unwrap();
    storage
        .insert_table(
            "saldi",
            Table::from_rows(&["Cassa", "Estratto conto"], &[&["Contanti", "10"]]),
        )
        .unwrap();

    let prima_nota = PrimaNota::new(storage, config);
    let report = prima_nota.reconcile().await.unwrap();
    assert!(report.ok);
    assert_eq!(report.tolerance, dec("0.5"));
}

#[tokio::test]
async fn test_filtered_export() {
    let storage = MemoryStorage::new();
    storage
        .insert_table("prima_nota", legacy_movements())
        .unwrap();
    let prima_nota = PrimaNota::new(storage, PrimaNotaConfig::default());

    let filter = MovementFilter::all().period(Period::from_str("2024-02").unwrap());
    let csv = String::from_utf8(prima_nota.export_csv(&filter).await.unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Data,Causale,Centro,Importo,Descrizione,Cassa,Note,Mese");
    assert!(lines[1].starts_with("03/02/2024,Donazioni,Progetti,1250.40,"));

    let report_csv = prima_nota.export_reconciliation_csv().await.unwrap();
    assert!(String::from_utf8(report_csv).unwrap().contains("Banco Posta"));
}

#[test]
fn test_normalize_format_round_trip() {
    for cents in [-1_000_000_i64, -12_345, -1, 0, 1, 99, 100, 123_456, 987_654_321] {
        let value = BigDecimal::new(cents.into(), 2);
        let text = format_euro(&value);
        let back = normalize(text.as_str());
        assert!(back.is_clean(), "{} did not parse", text);
        assert_eq!(back.value, value, "{}", text);
    }
}

#[test]
fn test_report_serializes() {
    let mut computed = std::collections::BTreeMap::new();
    computed.insert("Contanti".to_string(), dec("60"));
    let report = prima_nota_core::reconcile(&computed, &computed, &dec("0.01"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ok"], serde_json::Value::Bool(true));
    assert_eq!(json["rows"][0]["account"], "Contanti");
}
