//! CSV по шаблону: колонки сопоставляются полям транзакции через
//! [`MappingTemplate`], значения ячеек приводятся обработчиками полей.

use crate::{
    error::{Location, QifError, Result},
    model::{
        AccountDefinition, AccountKind, BankingTransaction, CategoryDefinition, ClassDefinition, ClearedStatus,
        InvestmentAction, InvestmentTransaction, MemorizedRecord, Transaction,
    },
    template::{Field, MappingTemplate},
    values::{
        apply_multiplier, format_amount, format_date, format_natural, parse_amount,
        parse_date_with, remove_multiplier,
    },
};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Таблица «как есть»: заголовок (если есть) и строки данных.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    /// Сколько физических записей предшествует первой строке данных
    /// (пропущенные строки плюс заголовок).
    pub data_offset: usize,
}

impl Grid {
    /// Физический номер записи (с единицы) для строки данных `index`.
    pub fn row_number(&self, index: usize) -> usize {
        self.data_offset + index + 1
    }
}

/// Формат CSV, привязанный к шаблону.
pub struct TemplateCsv<'a> {
    pub template: &'a MappingTemplate,
}

impl<'a> TemplateCsv<'a> {
    pub fn new(template: &'a MappingTemplate) -> Self {
        TemplateCsv { template }
    }
}

impl crate::traits::ReadFormat for TemplateCsv<'_> {
    type Output = Vec<Transaction>;

    fn read<R: BufRead>(&self, mut r: R) -> Result<Vec<Transaction>> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;
        decode(&text, self.template)
    }
}

impl crate::traits::WriteFormat for TemplateCsv<'_> {
    type Input = [Transaction];

    fn write<W: Write>(&self, w: W, records: &[Transaction]) -> Result<()> {
        let grid = encode_rows(records, self.template)?;
        write_grid(w, &grid, self.template)
    }
}

pub(crate) fn delimiter_byte(template: &MappingTemplate) -> Result<u8> {
    u8::try_from(template.delimiter)
        .ok()
        .filter(|b| b.is_ascii())
        .ok_or_else(|| {
            QifError::Mapping(format!(
                "delimiter {:?} must be a single ASCII character",
                template.delimiter
            ))
        })
}

/// Текст после первых `n` строк.
fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

/// Разбор текста в таблицу с учётом разделителя, `skip_rows` и заголовка.
pub fn read_grid(text: &str, template: &MappingTemplate) -> Result<Grid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter_byte(template)?)
        .from_reader(skip_lines(text.trim_start_matches('\u{feff}'), template.skip_rows).as_bytes());

    let mut records = rdr.records();
    let header = if template.has_header {
        match records.next() {
            Some(rec) => Some(rec?.iter().map(str::to_string).collect::<Vec<_>>()),
            None => None,
        }
    } else {
        None
    };
    let mut rows = Vec::new();
    for rec in records {
        rows.push(rec?.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(Grid {
        data_offset: template.skip_rows + usize::from(header.is_some()),
        header,
        rows,
    })
}

pub fn write_grid<W: Write>(w: W, grid: &Grid, template: &MappingTemplate) -> Result<()> {
    let mut wrt = WriterBuilder::new()
        .delimiter(delimiter_byte(template)?)
        .flexible(true)
        .from_writer(w);
    if let Some(header) = &grid.header {
        wrt.write_record(header)?;
    }
    for row in &grid.rows {
        wrt.write_record(row)?;
    }
    wrt.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Привязка шаблона к колонкам

/// Обязательные для типа счёта поля должны быть сопоставлены колонкам.
pub(crate) fn check_required(template: &MappingTemplate) -> Result<()> {
    for field in Field::required_for(template.account_kind) {
        if !template.maps(*field) {
            return Err(QifError::Mapping(format!(
                "required field '{}' is not mapped by template '{}'",
                field.name(),
                template.name
            )));
        }
    }
    Ok(())
}

pub(crate) struct Bound {
    pub field: Field,
    pub column: String,
    pub index: usize,
    pub multiplier: Decimal,
}

pub(crate) struct AmountPart {
    pub column: String,
    pub index: usize,
    pub multiplier: Decimal,
}

/// Шаблон, привязанный к позициям колонок конкретной таблицы.
pub(crate) struct Plan<'t> {
    pub template: &'t MappingTemplate,
    pub bound: Vec<Bound>,
    pub amount_parts: Vec<AmountPart>,
    pub transfer: Option<Regex>,
}

fn column_index(column: &str, header: Option<&[String]>) -> std::result::Result<usize, String> {
    match header {
        Some(header) => header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| format!("column '{column}' not found in header")),
        None => column
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("column '{column}' must be a 0-based index when the CSV has no header")),
    }
}

impl<'t> Plan<'t> {
    /// Строит план; колонки, которые не удалось найти, возвращаются
    /// списком проблем и в план не попадают.
    pub fn build(template: &'t MappingTemplate, header: Option<&[String]>) -> (Self, Vec<String>) {
        let mut problems = Vec::new();
        let allowed = Field::allowed_for(template.account_kind);
        let mut bound = Vec::new();
        for m in &template.field_mapping {
            if m.column.is_empty() {
                continue;
            }
            if !allowed.contains(&m.field) {
                problems.push(format!(
                    "field '{}' is not used by {:?} templates",
                    m.field.name(),
                    template.account_kind
                ));
                continue;
            }
            match column_index(&m.column, header) {
                Ok(index) => bound.push(Bound {
                    field: m.field,
                    column: m.column.clone(),
                    index,
                    multiplier: template.multiplier(&m.column),
                }),
                Err(e) => problems.push(format!("{e} (field '{}')", m.field.name())),
            }
        }

        let mut amount_parts = Vec::new();
        for column in &template.amount_columns {
            match column_index(column, header) {
                Ok(index) => amount_parts.push(AmountPart {
                    column: column.clone(),
                    index,
                    multiplier: template.multiplier(column),
                }),
                Err(e) => problems.push(format!("{e} (amount column)")),
            }
        }

        let transfer = if template.detect_transfers {
            match Regex::new(&template.transfer_pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    problems.push(format!("invalid transfer pattern: {e}"));
                    None
                }
            }
        } else {
            None
        };

        (
            Plan {
                template,
                bound,
                amount_parts,
                transfer,
            },
            problems,
        )
    }

    pub fn strict(template: &'t MappingTemplate, header: Option<&[String]>) -> Result<Self> {
        check_required(template)?;
        let (plan, problems) = Plan::build(template, header);
        match problems.into_iter().next() {
            Some(problem) => Err(QifError::Mapping(problem)),
            None => Ok(plan),
        }
    }
}

// ---------------------------------------------------------------------------
// Обработчики ячеек

pub(crate) struct Cell<'a> {
    raw: &'a str,
    multiplier: Decimal,
    date_format: &'a str,
    transfer: Option<&'a Regex>,
}

impl Cell<'_> {
    fn text(&self) -> Option<String> {
        Some(self.raw.trim().to_string())
    }

    fn date(&self) -> std::result::Result<chrono::NaiveDate, String> {
        parse_date_with(self.raw, self.date_format).ok_or_else(|| {
            format!("date does not match '{}' or any known format", self.date_format)
        })
    }

    fn number(&self) -> std::result::Result<Decimal, String> {
        apply_multiplier(parse_amount(self.raw)?, self.multiplier)
    }

    /// Категория: совпадение с шаблоном перевода превращается в `[Счёт]`.
    fn category(&self) -> Option<String> {
        let value = self.raw.trim();
        if let Some(re) = self.transfer {
            if let Some(target) = re.captures(value).and_then(|c| c.get(1)) {
                let target = target.as_str().trim();
                if !target.is_empty() {
                    return Some(format!("[{target}]"));
                }
            }
        }
        Some(value.to_string())
    }
}

type CellHandler<T> = fn(&mut T, &Cell<'_>) -> std::result::Result<(), String>;

static BANKING_CELLS: Lazy<HashMap<Field, CellHandler<BankingTransaction>>> = Lazy::new(|| {
    let mut t: HashMap<Field, CellHandler<BankingTransaction>> = HashMap::new();
    t.insert(Field::Date, |x, c| {
        x.date = Some(c.date()?);
        Ok(())
    });
    t.insert(Field::Amount, |x, c| {
        x.amount = Some(c.number()?);
        Ok(())
    });
    t.insert(Field::Payee, |x, c| {
        x.payee = c.text();
        Ok(())
    });
    t.insert(Field::Number, |x, c| {
        x.number = c.text();
        Ok(())
    });
    t.insert(Field::Memo, |x, c| {
        x.memo = c.text();
        Ok(())
    });
    t.insert(Field::Category, |x, c| {
        x.category = c.category();
        Ok(())
    });
    t.insert(Field::Account, |x, c| {
        x.account = c.text();
        Ok(())
    });
    t.insert(Field::ClearedStatus, |x, c| {
        x.cleared = ClearedStatus::from_synonym(c.raw);
        Ok(())
    });
    t.insert(Field::Address, |x, c| {
        x.address = c
            .raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Ok(())
    });
    t
});

static INVESTMENT_CELLS: Lazy<HashMap<Field, CellHandler<InvestmentTransaction>>> = Lazy::new(|| {
    let mut t: HashMap<Field, CellHandler<InvestmentTransaction>> = HashMap::new();
    t.insert(Field::Date, |x, c| {
        x.date = Some(c.date()?);
        Ok(())
    });
    t.insert(Field::Action, |x, c| {
        x.action = InvestmentAction::from_synonym(c.raw);
        Ok(())
    });
    t.insert(Field::Security, |x, c| {
        x.security = c.text();
        Ok(())
    });
    t.insert(Field::Quantity, |x, c| {
        x.quantity = Some(c.number()?);
        Ok(())
    });
    t.insert(Field::Price, |x, c| {
        x.price = Some(c.number()?);
        Ok(())
    });
    t.insert(Field::Amount, |x, c| {
        x.amount = Some(c.number()?);
        Ok(())
    });
    t.insert(Field::Commission, |x, c| {
        x.commission = Some(c.number()?);
        Ok(())
    });
    t.insert(Field::Payee, |x, c| {
        x.payee = c.text();
        Ok(())
    });
    t.insert(Field::Category, |x, c| {
        x.category = c.category();
        Ok(())
    });
    t.insert(Field::Account, |x, c| {
        x.account = c.text();
        Ok(())
    });
    t.insert(Field::Memo, |x, c| {
        x.memo = c.text();
        Ok(())
    });
    t.insert(Field::ClearedStatus, |x, c| {
        x.cleared = ClearedStatus::from_synonym(c.raw);
        Ok(())
    });
    t.insert(Field::TransferAmount, |x, c| {
        x.transfer_amount = Some(c.number()?);
        Ok(())
    });
    t
});

/// Ячейка, которую не удалось привести к типу поля.
#[derive(Debug, Clone)]
pub(crate) struct CellIssue {
    pub column: String,
    pub field: Field,
    pub value: String,
    pub message: String,
}

pub(crate) fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Разбор одной строки. Ошибки ячеек собираются, а не прерывают разбор.
pub(crate) fn decode_row(plan: &Plan<'_>, row: &[String]) -> (Transaction, Vec<CellIssue>) {
    let template = plan.template;
    let mut txn = Transaction::empty(template.account_kind);
    let mut issues = Vec::new();

    for b in &plan.bound {
        if b.field == Field::Amount && !plan.amount_parts.is_empty() {
            continue;
        }
        let raw = row.get(b.index).map(String::as_str).unwrap_or("");
        if raw.trim().is_empty() {
            continue;
        }
        let cell = Cell {
            raw,
            multiplier: b.multiplier,
            date_format: &template.date_format,
            transfer: plan.transfer.as_ref(),
        };
        let result = match &mut txn {
            Transaction::Banking(t) => BANKING_CELLS.get(&b.field).map(|h| h(t, &cell)),
            Transaction::Investment(t) => INVESTMENT_CELLS.get(&b.field).map(|h| h(t, &cell)),
        };
        if let Some(Err(message)) = result {
            issues.push(CellIssue {
                column: b.column.clone(),
                field: b.field,
                value: raw.to_string(),
                message,
            });
        }
    }

    if !plan.amount_parts.is_empty() {
        let mut total: Option<Decimal> = None;
        for part in &plan.amount_parts {
            let raw = row.get(part.index).map(String::as_str).unwrap_or("");
            if raw.trim().is_empty() {
                continue;
            }
            let sum = parse_amount(raw)
                .and_then(|v| apply_multiplier(v, part.multiplier))
                .and_then(|v| {
                    let acc = total.unwrap_or(Decimal::ZERO);
                    acc.checked_add(v)
                        .ok_or_else(|| format!("{acc} + {v} overflows the decimal range"))
                });
            match sum {
                Ok(v) => total = Some(v),
                Err(message) => issues.push(CellIssue {
                    column: part.column.clone(),
                    field: Field::Amount,
                    value: raw.to_string(),
                    message,
                }),
            }
        }
        match &mut txn {
            Transaction::Banking(t) => t.amount = total,
            Transaction::Investment(t) => t.amount = total,
        }
    }

    (txn, issues)
}

/// Тип счёта по первой непустой строке: колонки `action` и `security`
/// означают инвестиционную выгрузку, иначе банковскую.
pub fn detect_kind(text: &str) -> AccountKind {
    let header = text
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim())
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_lowercase();
    if header.contains("action") && header.contains("security") {
        AccountKind::Investment
    } else {
        AccountKind::Bank
    }
}

/// Строки таблицы в записи. Полностью пустые строки пропускаются, первая
/// неприводимая ячейка прерывает разбор.
pub fn decode_rows(grid: &Grid, template: &MappingTemplate) -> Result<Vec<Transaction>> {
    let plan = Plan::strict(template, grid.header.as_deref())?;
    let mut out = Vec::with_capacity(grid.rows.len());
    for (i, row) in grid.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let (txn, issues) = decode_row(&plan, row);
        if let Some(issue) = issues.into_iter().next() {
            return Err(QifError::Coercion {
                location: Location::Cell {
                    row: grid.row_number(i),
                    column: issue.column,
                },
                field: issue.field.name().to_string(),
                value: issue.value,
                message: issue.message,
            });
        }
        out.push(txn);
    }
    debug!(
        "CSV decoded with template '{}': {} of {} rows",
        template.name,
        out.len(),
        grid.rows.len()
    );
    Ok(out)
}

pub fn decode(text: &str, template: &MappingTemplate) -> Result<Vec<Transaction>> {
    let grid = read_grid(text, template)?;
    decode_rows(&grid, template)
}

// ---------------------------------------------------------------------------
// Запись

/// Сводка сплитов для колонки memo: одна строка на запись.
pub fn split_summary(memo: Option<&str>, parts: usize) -> String {
    let summary = format!("Split transaction with {parts} parts");
    match memo {
        Some(m) if !m.is_empty() => format!("{m}; {summary}"),
        _ => summary,
    }
}

/// Колонка из `amount_columns`, в которую ляжет сумма: знак множителя
/// совпадает со знаком суммы, иначе первая. Возвращает колонку и её множитель.
fn amount_target(template: &MappingTemplate, value: Decimal) -> Option<(&str, Decimal)> {
    let by_sign = template.amount_columns.iter().find(|c| {
        let m = template.multiplier(c);
        !m.is_zero() && m.is_sign_negative() == value.is_sign_negative()
    });
    by_sign
        .or_else(|| template.amount_columns.first())
        .map(|c| (c.as_str(), template.multiplier(c)))
}

fn banking_cells(t: &BankingTransaction, template: &MappingTemplate) -> Vec<(Field, String)> {
    let mut out = Vec::new();
    let mut put = |f: Field, v: Option<String>| {
        if let Some(v) = v {
            out.push((f, v));
        }
    };
    put(Field::Date, t.date.map(|d| format_date(d, &template.date_format)));
    put(Field::Amount, t.amount.map(|a| format_amount(&a)));
    put(Field::Payee, t.payee.clone());
    put(Field::Number, t.number.clone());
    let memo = if t.splits.is_empty() {
        t.memo.clone()
    } else {
        Some(split_summary(t.memo.as_deref(), t.splits.len()))
    };
    put(Field::Memo, memo);
    put(Field::Category, t.category.clone());
    put(Field::Account, t.account.clone());
    put(Field::ClearedStatus, Some(t.cleared.label().to_string()));
    put(Field::Address, (!t.address.is_empty()).then(|| t.address.join("\n")));
    out
}

fn investment_cells(t: &InvestmentTransaction, template: &MappingTemplate) -> Vec<(Field, String)> {
    let mut out = Vec::new();
    let mut put = |f: Field, v: Option<String>| {
        if let Some(v) = v {
            out.push((f, v));
        }
    };
    put(Field::Date, t.date.map(|d| format_date(d, &template.date_format)));
    put(Field::Action, Some(t.action.code().to_string()));
    put(Field::Security, t.security.clone());
    put(Field::Quantity, t.quantity.map(|q| format_natural(&q)));
    put(Field::Price, t.price.map(|p| format_natural(&p)));
    put(Field::Amount, t.amount.map(|a| format_amount(&a)));
    put(Field::Commission, t.commission.map(|c| format_amount(&c)));
    put(Field::Payee, t.payee.clone());
    put(Field::Category, t.category.clone());
    put(Field::Account, t.account.clone());
    put(Field::Memo, t.memo.clone());
    put(Field::ClearedStatus, Some(t.cleared.label().to_string()));
    put(Field::TransferAmount, t.transfer_amount.map(|x| format_amount(&x)));
    out
}

/// Колонки выходной таблицы: порядок сопоставления, затем колонки сумм,
/// если `amount` не сопоставлен напрямую.
fn output_columns(template: &MappingTemplate) -> Vec<String> {
    let mut columns: Vec<String> = template
        .field_mapping
        .iter()
        .filter(|m| !m.column.is_empty())
        .map(|m| m.column.clone())
        .collect();
    if template.column_for(Field::Amount).is_none() {
        for c in &template.amount_columns {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }
    columns
}

/// Записи в таблицу: одна строка на запись, сплиты сворачиваются в memo.
pub fn encode_rows(records: &[Transaction], template: &MappingTemplate) -> Result<Grid> {
    check_required(template)?;
    let columns = output_columns(template);

    // Без заголовка колонки шаблона — позиции.
    let positions: Vec<usize> = if template.has_header {
        (0..columns.len()).collect()
    } else {
        columns
            .iter()
            .map(|c| column_index(c, None).map_err(QifError::Mapping))
            .collect::<Result<_>>()?
    };
    let width = positions.iter().max().map_or(0, |m| m + 1);

    let mut rows = Vec::with_capacity(records.len());
    for (i, txn) in records.iter().enumerate() {
        if txn.is_investment() != template.account_kind.is_investment() {
            return Err(QifError::Mapping(format!(
                "record {} does not match {:?} template '{}'",
                i + 1,
                template.account_kind,
                template.name
            )));
        }
        let cells = match txn {
            Transaction::Banking(t) => banking_cells(t, template),
            Transaction::Investment(t) => investment_cells(t, template),
        };

        let unscaled = |field: Field, value: Decimal, multiplier: Decimal| {
            remove_multiplier(value, multiplier).map_err(|message| QifError::Coercion {
                location: Location::Record(i + 1),
                field: field.name().to_string(),
                value: value.to_string(),
                message,
            })
        };

        let mut by_column: HashMap<&str, String> = HashMap::new();
        for (field, value) in cells {
            if let Some(column) = template.column_for(field) {
                let multiplier = template.multiplier(column);
                let value = match (field.is_numeric(), txn_number(txn, field)) {
                    (true, Some(n)) if multiplier != Decimal::ONE => {
                        render_number(field, unscaled(field, n, multiplier)?)
                    }
                    _ => value,
                };
                by_column.insert(column, value);
            }
        }
        if template.column_for(Field::Amount).is_none() {
            if let Some(amount) = txn.amount() {
                if let Some((column, multiplier)) = amount_target(template, amount) {
                    let value = unscaled(Field::Amount, amount, multiplier)?;
                    by_column.insert(column, format_amount(&value));
                }
            }
        }

        let mut row = vec![String::new(); width];
        for (column, pos) in columns.iter().zip(&positions) {
            if let Some(value) = by_column.remove(column.as_str()) {
                row[*pos] = value;
            }
        }
        rows.push(row);
    }

    let header = template.has_header.then_some(columns);
    Ok(Grid {
        data_offset: usize::from(header.is_some()),
        header,
        rows,
    })
}

fn txn_number(txn: &Transaction, field: Field) -> Option<Decimal> {
    match (txn, field) {
        (_, Field::Amount) => txn.amount(),
        (Transaction::Investment(t), Field::Price) => t.price,
        (Transaction::Investment(t), Field::Quantity) => t.quantity,
        (Transaction::Investment(t), Field::Commission) => t.commission,
        (Transaction::Investment(t), Field::TransferAmount) => t.transfer_amount,
        _ => None,
    }
}

fn render_number(field: Field, value: Decimal) -> String {
    match field {
        Field::Price | Field::Quantity => format_natural(&value),
        _ => format_amount(&value),
    }
}

pub fn encode(records: &[Transaction], template: &MappingTemplate) -> Result<String> {
    let grid = encode_rows(records, template)?;
    grid_text(&grid, template)
}

fn grid_text(grid: &Grid, template: &MappingTemplate) -> Result<String> {
    let mut buf = Vec::new();
    write_grid(&mut buf, grid, template)?;
    String::from_utf8(buf).map_err(|e| QifError::Mapping(e.to_string()))
}

// ---------------------------------------------------------------------------
// Списки: фиксированный набор колонок, от шаблона берутся только
// разделитель, формат даты и наличие заголовка.

pub const ACCOUNT_COLUMNS: [&str; 6] = [
    "Name",
    "Type",
    "Description",
    "Credit Limit",
    "Statement Date",
    "Statement Balance",
];

pub const CATEGORY_COLUMNS: [&str; 7] = [
    "Name",
    "Description",
    "Tax Related",
    "Income",
    "Expense",
    "Budget Amount",
    "Tax Schedule",
];

pub const CLASS_COLUMNS: [&str; 2] = ["Name", "Description"];

pub const MEMORIZED_COLUMNS: [&str; 6] =
    ["Transaction Type", "Date", "Amount", "Payee", "Memo", "Category"];

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

fn list_grid(columns: &[&str], rows: Vec<Vec<String>>, template: &MappingTemplate) -> Grid {
    let header = template
        .has_header
        .then(|| columns.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    Grid {
        data_offset: usize::from(header.is_some()),
        header,
        rows,
    }
}

pub fn encode_accounts(accounts: &[AccountDefinition], template: &MappingTemplate) -> Result<String> {
    let rows = accounts
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.kind.qif_code().to_string(),
                a.description.clone().unwrap_or_default(),
                a.credit_limit.map(|v| format_amount(&v)).unwrap_or_default(),
                a.statement_date
                    .map(|d| format_date(d, &template.date_format))
                    .unwrap_or_default(),
                a.statement_balance.map(|v| format_amount(&v)).unwrap_or_default(),
            ]
        })
        .collect();
    grid_text(&list_grid(&ACCOUNT_COLUMNS, rows, template), template)
}

pub fn encode_categories(categories: &[CategoryDefinition], template: &MappingTemplate) -> Result<String> {
    let rows = categories
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.description.clone().unwrap_or_default(),
                yes_no(c.tax_related),
                yes_no(c.income),
                yes_no(c.expense),
                c.budget_amount.map(|v| format_amount(&v)).unwrap_or_default(),
                c.tax_schedule.clone().unwrap_or_default(),
            ]
        })
        .collect();
    grid_text(&list_grid(&CATEGORY_COLUMNS, rows, template), template)
}

pub fn encode_classes(classes: &[ClassDefinition], template: &MappingTemplate) -> Result<String> {
    let rows = classes
        .iter()
        .map(|c| vec![c.name.clone(), c.description.clone().unwrap_or_default()])
        .collect();
    grid_text(&list_grid(&CLASS_COLUMNS, rows, template), template)
}

pub fn encode_memorized(memorized: &[MemorizedRecord], template: &MappingTemplate) -> Result<String> {
    let rows = memorized
        .iter()
        .map(|m| {
            let t = &m.transaction;
            vec![
                m.kind.label().to_string(),
                t.date()
                    .map(|d| format_date(d, &template.date_format))
                    .unwrap_or_default(),
                t.amount().map(|v| format_amount(&v)).unwrap_or_default(),
                t.payee().unwrap_or_default().to_string(),
                t.memo().unwrap_or_default().to_string(),
                t.category().unwrap_or_default().to_string(),
            ]
        })
        .collect();
    grid_text(&list_grid(&MEMORIZED_COLUMNS, rows, template), template)
}
