//! Prima nota walkthrough: record movements, show the dashboard and run the
//! reconciliation against declared balances.
//!
//! Run with `RUST_LOG=prima_nota_core=debug` to see the library's events.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use prima_nota_core::sheet::Table;
use prima_nota_core::utils::{EnhancedMovementValidator, MemoryStorage};
use prima_nota_core::{
    DeclaredBalance, MovementBuilder, MovementFilter, PrimaNota, PrimaNotaConfig, ReferenceList,
};
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prima_nota_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("📒 Prima Nota - Example\n");

    // Reference sheets feeding the form selectors
    let storage = MemoryStorage::new();
    storage.insert_table(
        "rif cassa",
        Table::from_rows(&["rif cassa"], &[&["Contanti"], &["Banco Posta"]]),
    )?;
    storage.insert_table(
        "rif causale",
        Table::from_rows(&["rif causale"], &[&["Quote"], &["Donazioni"], &["Spese"]]),
    )?;

    let mut prima_nota = PrimaNota::with_validator(
        storage,
        PrimaNotaConfig::default(),
        Box::new(EnhancedMovementValidator),
    );

    let accounts = prima_nota.reference_options(ReferenceList::Accounts).await?;
    let reasons = prima_nota.reference_options(ReferenceList::Reasons).await?;
    println!("Casse:   {}", accounts.join(", "));
    println!("Causali: {}\n", reasons.join(", "));

    // 1. Record movements as typed in the form
    let entries = [
        (NaiveDate::from_ymd_opt(2024, 1, 10), "Quote", "Contanti", "100,00"),
        (NaiveDate::from_ymd_opt(2024, 1, 15), "Spese", "Contanti", "-40,00"),
        (NaiveDate::from_ymd_opt(2024, 2, 3), "Donazioni", "Banco Posta", "1.250,40"),
        (NaiveDate::from_ymd_opt(2024, 2, 28), "Spese", "Banco Posta", "-€ 75,90"),
    ];
    for (date, reason, account, amount) in entries {
        let date = date.ok_or("invalid date")?;
        let movement = prima_nota
            .add_movement(
                MovementBuilder::new(date, reason, account, amount)
                    .cost_center("Generale")
                    .build(),
            )
            .await?;
        println!(
            "  ✓ {} {:<10} {:<12} {:>14}",
            movement.date.format("%d/%m/%Y"),
            movement.reason,
            movement.account,
            prima_nota.format_amount(&movement.amount)
        );
    }

    // A form submission with an unreadable amount is refused
    let refused = prima_nota
        .add_movement(
            MovementBuilder::new(
                NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("invalid date")?,
                "Quote",
                "Contanti",
                "venti",
            )
            .cost_center("Generale")
            .build(),
        )
        .await;
    if let Err(e) = refused {
        println!("  ✗ Refused: {}", e);
    }

    // 2. Dashboard
    let totals = prima_nota.aggregate(&MovementFilter::all()).await?;
    println!("\n📊 Dashboard");
    println!("  Entrate: {}", prima_nota.format_amount(totals.total_income()));
    println!("  Uscite:  {}", prima_nota.format_amount(totals.total_expense()));
    println!("  Saldo:   {}", prima_nota.format_amount(totals.net_balance()));
    for (period, period_totals) in &totals.by_period {
        println!(
            "  {}  +{} / -{}",
            period,
            prima_nota.format_amount(&period_totals.income),
            prima_nota.format_amount(&period_totals.expense)
        );
    }

    // 3. Prova del 9
    prima_nota
        .save_declared_balances(vec![
            DeclaredBalance::new("Contanti", BigDecimal::from(60)),
            DeclaredBalance::new("Banco Posta", BigDecimal::from_str("1174.50")?),
        ])
        .await?;

    let report = prima_nota.reconcile().await?;
    println!("\n🔍 Prova del 9");
    for row in &report.rows {
        println!(
            "  {:<12} calcolato {:>14}  dichiarato {:>14}  differenza {:>12} {}",
            row.account,
            prima_nota.format_amount(&row.computed_balance),
            prima_nota.format_amount(&row.declared_balance),
            prima_nota.format_amount(&row.delta),
            if row.within_tolerance { "✅" } else { "❌" }
        );
    }
    println!(
        "  Esito: {}",
        if report.ok {
            "quadra"
        } else {
            "non quadra"
        }
    );

    // 4. Export
    let csv = prima_nota.export_csv(&MovementFilter::all()).await?;
    println!("\n📄 CSV export: {} bytes", csv.len());

    Ok(())
}
