//! Структурные проверки QIF- и CSV-текста, шаблона и разобранного документа.
//!
//! Валидаторы только читают вход и собирают все найденные проблемы,
//! не останавливаясь на первой.

use crate::{
    error::{Location, QifError, Result},
    formats::{
        csv::{self as tabular, Plan},
        qif::{self, IssueKind, Record},
    },
    model::{BankingTransaction, InvestmentTransaction, LedgerDocument, Transaction},
    template::{Field, MappingTemplate},
};
use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub severity: Severity,
    pub location: Location,
    pub message: String,
}

impl ValidationError {
    pub fn error(location: Location, message: impl Into<String>) -> Self {
        ValidationError {
            severity: Severity::Error,
            location,
            message: message.into(),
        }
    }

    pub fn warning(location: Location, message: impl Into<String>) -> Self {
        ValidationError {
            severity: Severity::Warning,
            location,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Location::Input => write!(f, "{}: {}", self.severity, self.message),
            at => write!(f, "{} at {at}: {}", self.severity, self.message),
        }
    }
}

/// Результат проверки: все проблемы в порядке обнаружения.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Нет ни одной проблемы уровня `Error` (предупреждения допустимы).
    pub fn is_valid(&self) -> bool {
        !self.errors.iter().any(ValidationError::is_error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| !e.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_error()).count()
    }

    /// `Ok(предупреждения)` либо `QifError::Invalid` со всеми проблемами.
    pub fn into_result(self) -> Result<Vec<ValidationError>> {
        if self.is_valid() {
            Ok(self.errors)
        } else {
            Err(QifError::Invalid(self.errors))
        }
    }

    fn error(&mut self, location: Location, message: impl Into<String>) {
        self.errors.push(ValidationError::error(location, message));
    }

    fn warning(&mut self, location: Location, message: impl Into<String>) {
        self.errors.push(ValidationError::warning(location, message));
    }
}

fn split_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

fn split_message(t: &BankingTransaction) -> Option<String> {
    let difference = t.split_difference()?;
    if difference <= split_tolerance() {
        return None;
    }
    let amount = t.amount.unwrap_or_default();
    Some(match t.split_total() {
        Some(total) => {
            format!("split amounts sum to {total} but the transaction amount is {amount}")
        }
        None => format!(
            "split amounts overflow the decimal range; the transaction amount is {amount}"
        ),
    })
}

// ---------------------------------------------------------------------------
// QIF

/// Проверка QIF-текста без построения документа.
pub fn validate_qif(text: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    if text.trim().is_empty() {
        report.error(Location::Input, "input is empty");
        return report;
    }

    let scan = qif::scan(text);
    let mut unterminated = 0usize;

    for block in &scan.blocks {
        let kind = match (&block.header, block.kind) {
            (Some(_), Some(kind)) => kind,
            (Some(header), None) => {
                report.error(
                    Location::Line(block.line),
                    format!("unknown section header {header:?}"),
                );
                continue;
            }
            (None, _) => {
                report.error(Location::Line(block.line), "data before the first section header");
                continue;
            }
        };

        for entry in &block.entries {
            let at = |line| Location::Entry {
                block: block.index,
                entry: entry.index,
                line,
            };
            if !entry.terminated {
                unterminated += 1;
                report.error(
                    at(entry.line),
                    "entry is not terminated with '^' (missing terminator)",
                );
            }

            let (record, issues) = qif::decode_entry(kind, entry);
            for issue in issues {
                match issue.kind {
                    IssueKind::Unusual => report.warning(at(issue.line), issue.message),
                    _ => report.error(at(issue.line), issue.message),
                }
            }
            let banking = match &record {
                Record::Transaction(Transaction::Banking(t)) => Some(t),
                Record::Memorized(m) => match &m.transaction {
                    Transaction::Banking(t) => Some(t),
                    Transaction::Investment(_) => None,
                },
                _ => None,
            };
            if let Some(message) = banking.and_then(split_message) {
                report.warning(at(entry.line), message);
            }
        }
    }

    if scan.terminators == 0 && unterminated == 0 {
        report.error(Location::Input, "no entry terminator '^' found");
    }
    report
}

// ---------------------------------------------------------------------------
// CSV

/// Проверка CSV-текста по шаблону: заголовок, число колонок, приводимость
/// каждой сопоставленной ячейки.
pub fn validate_csv(text: &str, template: &MappingTemplate) -> ValidationReport {
    let mut report = ValidationReport::default();
    if text.trim().is_empty() {
        report.error(Location::Input, "input is empty");
        return report;
    }

    let grid = match tabular::read_grid(text, template) {
        Ok(grid) => grid,
        Err(e) => {
            report.error(Location::Input, e.to_string());
            return report;
        }
    };
    if grid.header.is_some() && grid.rows.iter().all(|r| tabular::is_blank(r)) {
        report.warning(Location::Input, "CSV has a header but no data rows");
    }

    if let Err(e) = tabular::check_required(template) {
        report.error(Location::Input, e.to_string());
    }
    let (plan, problems) = Plan::build(template, grid.header.as_deref());
    for problem in problems {
        report.error(Location::Input, problem);
    }

    let expected = grid
        .header
        .as_ref()
        .map(Vec::len)
        .or_else(|| grid.rows.iter().find(|r| !tabular::is_blank(r)).map(Vec::len));

    for (i, row) in grid.rows.iter().enumerate() {
        if tabular::is_blank(row) {
            continue;
        }
        let row_no = grid.row_number(i);
        if let Some(expected) = expected {
            if row.len() != expected {
                report.error(
                    Location::Row(row_no),
                    format!("expected {expected} columns, found {}", row.len()),
                );
            }
        }

        let (txn, issues) = tabular::decode_row(&plan, row);
        for issue in issues {
            report.error(
                Location::Cell {
                    row: row_no,
                    column: issue.column,
                },
                format!(
                    "cannot convert {:?} for field '{}': {}",
                    issue.value,
                    issue.field.name(),
                    issue.message
                ),
            );
        }
        check_required_cells(&mut report, &plan, row, row_no);
        check_codes(&mut report, &txn, row_no);
    }
    report
}

fn check_required_cells(report: &mut ValidationReport, plan: &Plan<'_>, row: &[String], row_no: usize) {
    let cell = |index: usize| row.get(index).map(|c| c.trim()).unwrap_or("");
    for field in Field::required_for(plan.template.account_kind) {
        if *field == Field::Amount && !plan.amount_parts.is_empty() {
            if plan.amount_parts.iter().all(|p| cell(p.index).is_empty()) {
                report.error(Location::Row(row_no), "required field 'amount' is empty");
            }
            continue;
        }
        if let Some(b) = plan.bound.iter().find(|b| b.field == *field) {
            if cell(b.index).is_empty() {
                report.error(
                    Location::Cell {
                        row: row_no,
                        column: b.column.clone(),
                    },
                    format!("required field '{}' is empty", field.name()),
                );
            }
        }
    }
}

fn check_codes(report: &mut ValidationReport, txn: &Transaction, row_no: usize) {
    let (cleared, action) = match txn {
        Transaction::Banking(t) => (&t.cleared, None),
        Transaction::Investment(t) => (&t.cleared, Some(&t.action)),
    };
    if let Some(action) = action {
        if !action.is_known() && !action.code().is_empty() {
            report.warning(
                Location::Row(row_no),
                format!("unknown investment action {:?}", action.code()),
            );
        }
    }
    if !cleared.is_known() {
        report.warning(
            Location::Row(row_no),
            format!("unknown cleared status {:?}", cleared.label()),
        );
    }
}

// ---------------------------------------------------------------------------
// Шаблон

/// Есть ли в формате хотя бы один спецификатор даты и нет ли ошибок.
fn check_date_format(format: &str) -> std::result::Result<(), String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("date format {format:?} is not a valid strftime pattern"));
    }
    let has_date = StrftimeItems::new(format).any(|item| matches!(item, Item::Numeric(..) | Item::Fixed(..)));
    if !has_date {
        return Err(format!("date format {format:?} has no date specifier"));
    }
    Ok(())
}

pub fn validate_template(template: &MappingTemplate) -> ValidationReport {
    let mut report = ValidationReport::default();
    if template.name.trim().is_empty() {
        report.error(Location::Input, "template name is empty");
    }
    if let Err(e) = tabular::delimiter_byte(template) {
        report.error(Location::Input, e.to_string());
    }

    let allowed = Field::allowed_for(template.account_kind);
    for m in &template.field_mapping {
        if !allowed.contains(&m.field) {
            report.error(
                Location::Input,
                format!(
                    "field '{}' is not used by {:?} templates",
                    m.field.name(),
                    template.account_kind
                ),
            );
        }
    }
    for field in Field::required_for(template.account_kind) {
        if !template.maps(*field) {
            report.error(
                Location::Input,
                format!("required field '{}' is not mapped", field.name()),
            );
        }
    }
    for (i, m) in template.field_mapping.iter().enumerate() {
        if template.field_mapping[..i].iter().any(|p| p.field == m.field) {
            report.warning(
                Location::Input,
                format!("field '{}' is mapped more than once; the first mapping is used", m.field.name()),
            );
        }
    }

    if let Err(message) = check_date_format(&template.date_format) {
        report.error(Location::Input, message);
    }

    for column in template.amount_multipliers.keys() {
        let declared = template.amount_columns.contains(column)
            || template.field_mapping.iter().any(|m| &m.column == column && m.field.is_numeric());
        if !declared {
            report.error(
                Location::Input,
                format!("multiplier for column '{column}' refers to no amount column"),
            );
        }
    }

    if template.detect_transfers {
        if let Err(e) = Regex::new(&template.transfer_pattern) {
            report.error(Location::Input, format!("invalid transfer pattern: {e}"));
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Документ

fn check_banking(report: &mut ValidationReport, t: &BankingTransaction, at: &Location) {
    if t.date.is_none() {
        report.error(at.clone(), "transaction has no date");
    }
    if t.amount.is_none() {
        report.error(at.clone(), "transaction has no amount");
    }
    if let Some(message) = split_message(t) {
        report.warning(at.clone(), message);
    }
}

fn check_investment(report: &mut ValidationReport, t: &InvestmentTransaction, at: &Location) {
    if t.date.is_none() {
        report.error(at.clone(), "transaction has no date");
    }
    if t.action.code().is_empty() {
        report.error(at.clone(), "investment transaction has no action");
    } else if !t.action.is_known() {
        report.warning(at.clone(), format!("unknown investment action {:?}", t.action.code()));
    }
    if t.action.is_trade() {
        if t.security.is_none() {
            report.error(at.clone(), format!("{} without a security", t.action.code()));
        }
        if t.quantity.is_none() {
            report.error(at.clone(), format!("{} without a quantity", t.action.code()));
        }
    }
}

/// Проверка уже разобранного документа.
pub fn validate_document(doc: &LedgerDocument) -> ValidationReport {
    let mut report = ValidationReport::default();

    for section in &doc.sections {
        for (i, txn) in section.transactions.iter().enumerate() {
            let at = Location::Transaction {
                account: section.name.clone(),
                index: i + 1,
            };
            if txn.is_investment() != section.kind.is_investment() {
                report.error(
                    at.clone(),
                    format!("record does not match the {:?} section", section.kind),
                );
            }
            match txn {
                Transaction::Banking(t) => check_banking(&mut report, t, &at),
                Transaction::Investment(t) => check_investment(&mut report, t, &at),
            }
        }
    }

    for (i, account) in doc.accounts.iter().enumerate() {
        if account.name.trim().is_empty() {
            report.error(Location::Record(i + 1), "account definition has no name");
        }
    }
    for (i, cat) in doc.categories.iter().enumerate() {
        if cat.name.trim().is_empty() {
            report.error(Location::Record(i + 1), "category has no name");
        }
    }
    for (i, class) in doc.classes.iter().enumerate() {
        if class.name.trim().is_empty() {
            report.error(Location::Record(i + 1), "class has no name");
        }
    }
    for (i, m) in doc.memorized.iter().enumerate() {
        if let Transaction::Banking(t) = &m.transaction {
            if let Some(message) = split_message(t) {
                report.warning(Location::Record(i + 1), format!("memorized transaction: {message}"));
            }
        }
    }
    report
}
