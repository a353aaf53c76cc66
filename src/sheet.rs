//! Spreadsheet table codec
//!
//! The backing store is a spreadsheet: every worksheet is a header row plus
//! string cells. This module turns those tables into [`Movement`]s and
//! [`DeclaredBalance`]s and back, reporting per-row problems as warnings
//! instead of aborting the load. Movement edits patch single rows of the
//! sheet as read, so rows and columns this module does not understand are
//! written back unchanged.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::amount::{canonical_amount, format_italian_date, normalize, parse_sheet_date};
use crate::config::{BalanceColumns, MovementColumns};
use crate::types::*;

/// A worksheet: header row plus data rows of string cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string slices, handy for fixtures
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// A table with neither headers nor rows (a freshly created worksheet)
    pub fn is_blank(&self) -> bool {
        self.headers.iter().all(|h| h.trim().is_empty()) && self.rows.is_empty()
    }

    /// Index of a header, compared after trimming
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cell at `row`/`column`, empty when the row is short
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// All values of a column, header included
    pub fn column_values(&self, column: usize) -> Vec<&str> {
        let header = self.headers.get(column).map(String::as_str);
        header
            .into_iter()
            .chain(
                self.rows
                    .iter()
                    .map(move |r| r.get(column).map(String::as_str).unwrap_or("")),
            )
            .collect()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Problem found on a single sheet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowIssue {
    /// Amount could not be parsed; the row counts as zero
    Amount(NormalizationWarning),
    /// Date could not be parsed; the row is skipped
    Date(String),
    /// Declared balance listed more than once; the later row wins
    DuplicateAccount(String),
}

/// Warning attached to a 1-based data row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    pub row: usize,
    pub issue: RowIssue,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            RowIssue::Amount(warning) => write!(f, "row {}: {}", self.row, warning),
            RowIssue::Date(raw) => {
                write!(f, "row {}: unparseable date '{}', row skipped", self.row, raw)
            }
            RowIssue::DuplicateAccount(account) => write!(
                f,
                "row {}: account '{}' declared more than once, keeping this row",
                self.row, account
            ),
        }
    }
}

/// Movements decoded from a sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementImport {
    pub movements: Vec<Movement>,
    pub warnings: Vec<RowWarning>,
    /// Rows without a usable identifier, addressed by a derived one
    pub assigned_ids: usize,
}

/// Declared balances decoded from a sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceImport {
    pub balances: Vec<DeclaredBalance>,
    pub warnings: Vec<RowWarning>,
}

impl BalanceImport {
    /// Balances keyed by account, later rows overriding earlier ones
    pub fn by_account(&self) -> BTreeMap<String, BigDecimal> {
        self.balances
            .iter()
            .map(|b| (b.account.clone(), b.declared_amount.clone()))
            .collect()
    }
}

fn require_column(table: &Table, table_name: &str, column: &str) -> PrimaNotaResult<usize> {
    table
        .column_index(column)
        .ok_or_else(|| PrimaNotaError::MissingColumn {
            table: table_name.to_string(),
            column: column.to_string(),
        })
}

/// Identifier of every data row, `None` for blank rows
///
/// A valid id cell is used as is. Rows with a missing, invalid or repeated
/// id get one derived from their position and cells, flagged `true`.
fn row_ids(table: &Table, id_col: Option<usize>) -> Vec<Option<(MovementId, bool)>> {
    let mut seen = BTreeSet::new();
    table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            if cells.iter().all(|c| c.trim().is_empty()) {
                return None;
            }
            let stored = id_col
                .and_then(|c| table.cell(row, c).parse::<MovementId>().ok())
                .filter(|id| seen.insert(*id));
            Some(match stored {
                Some(id) => (id, false),
                None => {
                    let id = MovementId::for_sheet_row(row, cells);
                    seen.insert(id);
                    (id, true)
                }
            })
        })
        .collect()
}

/// Decode the movements sheet
///
/// The date and amount columns are required; every other column is optional
/// and read as empty text when absent. A blank worksheet decodes to an empty
/// ledger.
pub fn decode_movements(
    table: &Table,
    table_name: &str,
    columns: &MovementColumns,
) -> PrimaNotaResult<MovementImport> {
    if table.is_blank() {
        return Ok(MovementImport::default());
    }

    let date_col = require_column(table, table_name, &columns.date)?;
    let amount_col = require_column(table, table_name, &columns.amount)?;
    let reason_col = table.column_index(&columns.reason);
    let center_col = table.column_index(&columns.cost_center);
    let description_col = table.column_index(&columns.description);
    let account_col = table.column_index(&columns.account);
    let notes_col = table.column_index(&columns.notes);

    let text = |row: usize, col: Option<usize>| -> String {
        col.map(|c| table.cell(row, c).trim().to_string())
            .unwrap_or_default()
    };

    let mut import = MovementImport::default();

    for (row, row_id) in row_ids(table, table.column_index(&columns.id))
        .into_iter()
        .enumerate()
    {
        let row_number = row + 1;
        let Some((id, derived)) = row_id else {
            continue;
        };

        let raw_date = table.cell(row, date_col);
        let Some(date) = parse_sheet_date(raw_date) else {
            tracing::warn!(row = row_number, value = raw_date, "skipping row with unparseable date");
            import.warnings.push(RowWarning {
                row: row_number,
                issue: RowIssue::Date(raw_date.to_string()),
            });
            continue;
        };

        let amount = normalize(table.cell(row, amount_col));
        if let Some(warning) = amount.warning {
            tracing::warn!(row = row_number, value = %warning.raw, "amount counted as zero");
            import.warnings.push(RowWarning {
                row: row_number,
                issue: RowIssue::Amount(warning),
            });
        }

        if derived {
            import.assigned_ids += 1;
        }

        import.movements.push(Movement {
            id,
            date,
            reason: text(row, reason_col),
            cost_center: text(row, center_col),
            amount: amount.value,
            description: text(row, description_col),
            account: text(row, account_col),
            notes: text(row, notes_col),
        });
    }

    tracing::debug!(
        table = table_name,
        movements = import.movements.len(),
        warnings = import.warnings.len(),
        "decoded movements"
    );

    Ok(import)
}

fn ensure_column(table: &mut Table, name: &str) -> usize {
    match table.column_index(name) {
        Some(index) => index,
        None => {
            table.headers.push(name.to_string());
            table.headers.len() - 1
        }
    }
}

/// Prepare the movements sheet for an in-place edit
///
/// Adds the mapped columns the sheet lacks and writes every row's id into the
/// id column, so derived ids become permanent with the edit. Cells outside
/// the mapping, and rows that do not decode, are left untouched.
fn prepare_for_edit(table: &mut Table, columns: &MovementColumns) -> Vec<Option<MovementId>> {
    if table.is_blank() {
        table.headers.clear();
    }

    let ids = row_ids(table, table.column_index(&columns.id));
    let id_col = ensure_column(table, &columns.id);
    for name in columns.all() {
        ensure_column(table, name);
    }

    let width = table.headers.len();
    for (cells, row_id) in table.rows.iter_mut().zip(&ids) {
        if cells.len() < width {
            cells.resize(width, String::new());
        }
        if let Some((id, _)) = row_id {
            cells[id_col] = id.to_string();
        }
    }

    ids.into_iter().map(|row_id| row_id.map(|(id, _)| id)).collect()
}

/// Write the mapped cells of a movement on one row
///
/// Dates are written as `dd/mm/yyyy`, amounts in canonical form and the
/// period column is recomputed from the date.
fn write_movement_cells(
    table: &mut Table,
    row: usize,
    movement: &Movement,
    columns: &MovementColumns,
) {
    let values = [
        (&columns.id, movement.id.to_string()),
        (&columns.date, format_italian_date(movement.date)),
        (&columns.reason, movement.reason.clone()),
        (&columns.cost_center, movement.cost_center.clone()),
        (&columns.amount, canonical_amount(&movement.amount)),
        (&columns.description, movement.description.clone()),
        (&columns.account, movement.account.clone()),
        (&columns.notes, movement.notes.clone()),
        (&columns.period, movement.period().to_string()),
    ];

    for (name, value) in values {
        let Some(column) = table.column_index(name) else {
            continue;
        };
        if let Some(cell) = table.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value;
        }
    }
}

/// Append a movement as a new row, creating the header row on a blank sheet
pub fn append_movement(table: &mut Table, movement: &Movement, columns: &MovementColumns) {
    prepare_for_edit(table, columns);
    table.push_row(vec![String::new(); table.headers.len()]);
    let row = table.rows.len() - 1;
    write_movement_cells(table, row, movement, columns);
}

/// Overwrite the mapped cells of the row holding `movement.id`
///
/// Returns false when no row carries that id.
pub fn replace_movement(table: &mut Table, movement: &Movement, columns: &MovementColumns) -> bool {
    let ids = prepare_for_edit(table, columns);
    match ids.iter().position(|id| *id == Some(movement.id)) {
        Some(row) => {
            write_movement_cells(table, row, movement, columns);
            true
        }
        None => false,
    }
}

/// Remove the row holding `id`; returns false when no row carries it
pub fn remove_movement(table: &mut Table, id: MovementId, columns: &MovementColumns) -> bool {
    let ids = prepare_for_edit(table, columns);
    match ids.iter().position(|row_id| *row_id == Some(id)) {
        Some(row) => {
            table.rows.remove(row);
            true
        }
        None => false,
    }
}

/// Decode the declared balances sheet
///
/// Any alias in `columns.declared` is accepted for the amount column. Rows
/// with a blank account are editor leftovers and are ignored.
pub fn decode_declared_balances(
    table: &Table,
    table_name: &str,
    columns: &BalanceColumns,
) -> PrimaNotaResult<BalanceImport> {
    if table.is_blank() {
        return Ok(BalanceImport::default());
    }

    let account_col = require_column(table, table_name, &columns.account)?;
    let declared_col = columns
        .declared
        .iter()
        .find_map(|name| table.column_index(name))
        .ok_or_else(|| PrimaNotaError::MissingColumn {
            table: table_name.to_string(),
            column: columns.declared.join(" | "),
        })?;

    let mut import = BalanceImport::default();
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();

    for row in 0..table.rows.len() {
        let row_number = row + 1;
        let account = table.cell(row, account_col).trim().to_string();
        if account.is_empty() {
            continue;
        }

        let amount = normalize(table.cell(row, declared_col));
        if let Some(warning) = amount.warning {
            tracing::warn!(row = row_number, account = %account, value = %warning.raw, "declared balance counted as zero");
            import.warnings.push(RowWarning {
                row: row_number,
                issue: RowIssue::Amount(warning),
            });
        }

        let balance = DeclaredBalance::new(account.clone(), amount.value);
        match positions.get(&account) {
            Some(&index) => {
                tracing::warn!(row = row_number, account = %account, "duplicate declared balance");
                import.warnings.push(RowWarning {
                    row: row_number,
                    issue: RowIssue::DuplicateAccount(account),
                });
                import.balances[index] = balance;
            }
            None => {
                positions.insert(account, import.balances.len());
                import.balances.push(balance);
            }
        }
    }

    Ok(import)
}

/// Encode declared balances as a full sheet using the first declared alias
pub fn encode_declared_balances(balances: &[DeclaredBalance], columns: &BalanceColumns) -> Table {
    let declared_header = columns
        .declared
        .first()
        .cloned()
        .unwrap_or_else(|| "Saldo dichiarato".to_string());
    let mut table = Table::new(vec![columns.account.clone(), declared_header]);

    for balance in balances {
        table.push_row(vec![
            balance.account.clone(),
            canonical_amount(&balance.declared_amount),
        ]);
    }

    table
}

/// Selector options from a reference sheet
///
/// Reads the first column, dropping blank cells and the title cell that
/// repeats the list name.
pub fn reference_options(table: &Table, list_name: &str) -> Vec<String> {
    let list_name = list_name.trim().to_lowercase();
    table
        .column_values(0)
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.to_lowercase() != list_name)
        .map(str::to_string)
        .collect()
}
