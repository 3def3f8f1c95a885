//! QIF: строчный формат с однобуквенными тегами.
//!
//! Файл делится на блоки строками-заголовками `!Type:...` / `!Account`,
//! блок делится на записи строкой `^`, каждая строка записи: тег + значение
//! без разделителя. Разбор тегов идёт через таблицы `тег -> обработчик`,
//! своя таблица на каждый тип секции.

use crate::{
    codes::is_directive,
    error::{Location, QifError, Result},
    model::{
        AccountDefinition, AccountKind, AccountSection, BankingTransaction, CategoryDefinition,
        ClassDefinition, ClearedStatus, InvestmentAction, InvestmentTransaction, LedgerDocument,
        MemorizedKind, MemorizedRecord, SectionKind, SplitLine, Transaction,
        DEFAULT_ACCOUNT_NAME,
    },
    values::{format_amount, format_date, format_natural, parse_amount, parse_date, parse_percentage, QIF_DATE_FORMAT},
};
use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::{BufRead, Write};

pub struct Qif;

impl crate::traits::ReadFormat for Qif {
    type Output = LedgerDocument;

    fn read<R: BufRead>(&self, mut r: R) -> Result<LedgerDocument> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;
        decode(&text)
    }
}

impl crate::traits::WriteFormat for Qif {
    type Input = LedgerDocument;

    fn write<W: Write>(&self, mut w: W, doc: &LedgerDocument) -> Result<()> {
        write_document(&mut w, doc)?;
        w.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Разбиение текста на блоки и записи

#[derive(Debug, Clone)]
pub(crate) struct TagLine {
    pub line: usize,
    pub tag: char,
    pub value: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RawEntry {
    /// Номер записи в блоке, с единицы.
    pub index: usize,
    /// Строка первого тега.
    pub line: usize,
    pub lines: Vec<TagLine>,
    pub terminated: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RawBlock {
    pub index: usize,
    pub line: usize,
    /// `None`: данные до первого заголовка.
    pub header: Option<String>,
    pub kind: Option<SectionKind>,
    /// Блок внутри `!Option:AutoSwitch` ... `!Clear:AutoSwitch`.
    pub autoswitch: bool,
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub blocks: Vec<RawBlock>,
    pub terminators: usize,
}

/// Тип счёта последней секции транзакций; `None`, если в тексте только
/// списки или нет заголовков.
pub fn detect_kind(text: &str) -> Option<AccountKind> {
    scan(text)
        .blocks
        .iter()
        .rev()
        .find_map(|b| b.kind.and_then(SectionKind::account_kind))
}

pub(crate) fn scan(text: &str) -> Scan {
    let mut scan = Scan::default();
    let mut autoswitch = false;
    let mut pending: Vec<TagLine> = Vec::new();

    for (n, raw) in text.lines().enumerate() {
        let line_no = n + 1;
        let line = raw.trim_start_matches('\u{feff}').trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('!') {
            if is_directive(trimmed) {
                match trimmed.to_ascii_lowercase().as_str() {
                    "!option:autoswitch" => autoswitch = true,
                    "!clear:autoswitch" => autoswitch = false,
                    _ => {}
                }
                continue;
            }
            close_entry(&mut scan, &mut pending, false);
            scan.blocks.push(RawBlock {
                index: scan.blocks.len() + 1,
                line: line_no,
                header: Some(trimmed.to_string()),
                kind: SectionKind::from_header(trimmed),
                autoswitch,
                entries: Vec::new(),
            });
            continue;
        }

        if trimmed == "^" {
            scan.terminators += 1;
            close_entry(&mut scan, &mut pending, true);
            continue;
        }

        let mut chars = trimmed.chars();
        if let Some(tag) = chars.next() {
            pending.push(TagLine {
                line: line_no,
                tag,
                value: chars.as_str().to_string(),
            });
        }
    }
    close_entry(&mut scan, &mut pending, false);
    scan
}

fn close_entry(scan: &mut Scan, pending: &mut Vec<TagLine>, terminated: bool) {
    if pending.is_empty() {
        return;
    }
    if scan.blocks.is_empty() {
        scan.blocks.push(RawBlock {
            index: 1,
            line: pending[0].line,
            header: None,
            kind: None,
            autoswitch: false,
            entries: Vec::new(),
        });
    }
    let lines = std::mem::take(pending);
    if let Some(block) = scan.blocks.last_mut() {
        block.entries.push(RawEntry {
            index: block.entries.len() + 1,
            line: lines[0].line,
            lines,
            terminated,
        });
    }
}

// ---------------------------------------------------------------------------
// Разбор записей

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IssueKind {
    /// Тег не входит в набор тегов секции.
    UnknownTag,
    /// Значение тега не разбирается.
    BadValue,
    /// Нет обязательного тега.
    Missing,
    /// Нераспознанный код действия или статуса.
    Unusual,
}

#[derive(Debug, Clone)]
pub(crate) struct Issue {
    pub kind: IssueKind,
    pub line: usize,
    pub message: String,
}

impl Issue {
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, IssueKind::UnknownTag | IssueKind::BadValue)
    }
}

pub(crate) enum Record {
    Transaction(Transaction),
    Account(AccountDefinition),
    Category(CategoryDefinition),
    Class(ClassDefinition),
    Memorized(MemorizedRecord),
}

type Handler<T> = fn(&mut T, &str) -> std::result::Result<(), String>;
type Table<T> = HashMap<char, Handler<T>>;

/// Банковская запись в процессе разбора: открытый сплит ждёт своего `S`
/// или конца записи.
#[derive(Default)]
struct BankingDraft {
    txn: BankingTransaction,
    pending: Option<SplitLine>,
}

impl BankingDraft {
    fn split(&mut self) -> &mut SplitLine {
        self.pending.get_or_insert_with(SplitLine::default)
    }

    fn finish(mut self) -> BankingTransaction {
        if let Some(split) = self.pending.take() {
            self.txn.splits.push(split);
        }
        self.txn
    }
}

#[derive(Default)]
struct AccountDraft {
    name: Option<String>,
    kind: Option<AccountKind>,
    description: Option<String>,
    credit_limit: Option<Decimal>,
    statement_date: Option<NaiveDate>,
    statement_balance: Option<Decimal>,
}

fn date(v: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(v).ok_or_else(|| format!("invalid date {:?}", v.trim()))
}

fn amount(v: &str) -> std::result::Result<Decimal, String> {
    parse_amount(v).map_err(|e| format!("invalid amount: {e}"))
}

fn text(v: &str) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

static BANKING_TAGS: Lazy<Table<BankingDraft>> = Lazy::new(|| {
    let mut t: Table<BankingDraft> = HashMap::new();
    t.insert('D', |d, v| {
        d.txn.date = Some(date(v)?);
        Ok(())
    });
    t.insert('T', |d, v| {
        d.txn.amount = Some(amount(v)?);
        Ok(())
    });
    t.insert('U', |d, v| {
        let value = amount(v)?;
        if d.txn.amount.is_none() {
            d.txn.amount = Some(value);
        }
        Ok(())
    });
    t.insert('C', |d, v| {
        d.txn.cleared = ClearedStatus::from_qif_code(v);
        Ok(())
    });
    t.insert('N', |d, v| {
        d.txn.number = text(v);
        Ok(())
    });
    t.insert('P', |d, v| {
        d.txn.payee = text(v);
        Ok(())
    });
    t.insert('M', |d, v| {
        d.txn.memo = text(v);
        Ok(())
    });
    t.insert('A', |d, v| {
        d.txn.address.push(v.trim().to_string());
        Ok(())
    });
    t.insert('L', |d, v| {
        d.txn.category = text(v);
        Ok(())
    });
    t.insert('F', |d, _| {
        d.txn.reimbursable = true;
        Ok(())
    });
    t.insert('S', |d, v| {
        if let Some(split) = d.pending.take() {
            d.txn.splits.push(split);
        }
        d.pending = Some(SplitLine {
            category: v.trim().to_string(),
            ..SplitLine::default()
        });
        Ok(())
    });
    t.insert('E', |d, v| {
        d.split().memo = text(v);
        Ok(())
    });
    t.insert('$', |d, v| {
        d.split().amount = amount(v)?;
        Ok(())
    });
    t.insert('%', |d, v| {
        d.split().percentage =
            Some(parse_percentage(v).map_err(|e| format!("invalid percentage: {e}"))?);
        Ok(())
    });
    t
});

static INVESTMENT_TAGS: Lazy<Table<InvestmentTransaction>> = Lazy::new(|| {
    let mut t: Table<InvestmentTransaction> = HashMap::new();
    t.insert('D', |x, v| {
        x.date = Some(date(v)?);
        Ok(())
    });
    t.insert('N', |x, v| {
        x.action = InvestmentAction::from_code(v);
        Ok(())
    });
    t.insert('Y', |x, v| {
        x.security = text(v);
        Ok(())
    });
    t.insert('I', |x, v| {
        x.price = Some(parse_amount(v).map_err(|e| format!("invalid price: {e}"))?);
        Ok(())
    });
    t.insert('Q', |x, v| {
        x.quantity = Some(parse_amount(v).map_err(|e| format!("invalid quantity: {e}"))?);
        Ok(())
    });
    t.insert('T', |x, v| {
        x.amount = Some(amount(v)?);
        Ok(())
    });
    t.insert('U', |x, v| {
        let value = amount(v)?;
        if x.amount.is_none() {
            x.amount = Some(value);
        }
        Ok(())
    });
    t.insert('C', |x, v| {
        x.cleared = ClearedStatus::from_qif_code(v);
        Ok(())
    });
    t.insert('P', |x, v| {
        x.payee = text(v);
        Ok(())
    });
    t.insert('M', |x, v| {
        x.memo = text(v);
        Ok(())
    });
    t.insert('O', |x, v| {
        x.commission = Some(parse_amount(v).map_err(|e| format!("invalid commission: {e}"))?);
        Ok(())
    });
    t.insert('L', |x, v| {
        x.category = text(v);
        Ok(())
    });
    t.insert('$', |x, v| {
        x.transfer_amount = Some(amount(v)?);
        Ok(())
    });
    t
});

static ACCOUNT_TAGS: Lazy<Table<AccountDraft>> = Lazy::new(|| {
    let mut t: Table<AccountDraft> = HashMap::new();
    t.insert('N', |a, v| {
        a.name = text(v);
        Ok(())
    });
    t.insert('T', |a, v| {
        a.kind = Some(
            AccountKind::from_qif_code(v).ok_or_else(|| format!("unknown account type {:?}", v.trim()))?,
        );
        Ok(())
    });
    t.insert('D', |a, v| {
        a.description = text(v);
        Ok(())
    });
    t.insert('L', |a, v| {
        a.credit_limit = Some(parse_amount(v).map_err(|e| format!("invalid credit limit: {e}"))?);
        Ok(())
    });
    t.insert('/', |a, v| {
        a.statement_date = Some(date(v)?);
        Ok(())
    });
    t.insert('$', |a, v| {
        a.statement_balance = Some(amount(v)?);
        Ok(())
    });
    t
});

static CATEGORY_TAGS: Lazy<Table<CategoryDefinition>> = Lazy::new(|| {
    let mut t: Table<CategoryDefinition> = HashMap::new();
    t.insert('N', |c, v| {
        c.name = v.trim().to_string();
        Ok(())
    });
    t.insert('D', |c, v| {
        c.description = text(v);
        Ok(())
    });
    t.insert('T', |c, _| {
        c.tax_related = true;
        Ok(())
    });
    t.insert('I', |c, _| {
        c.income = true;
        Ok(())
    });
    t.insert('E', |c, _| {
        c.expense = true;
        Ok(())
    });
    t.insert('B', |c, v| {
        c.budget_amount = Some(parse_amount(v).map_err(|e| format!("invalid budget amount: {e}"))?);
        Ok(())
    });
    t.insert('R', |c, v| {
        c.tax_schedule = text(v);
        Ok(())
    });
    t
});

static CLASS_TAGS: Lazy<Table<ClassDefinition>> = Lazy::new(|| {
    let mut t: Table<ClassDefinition> = HashMap::new();
    t.insert('N', |c, v| {
        c.name = v.trim().to_string();
        Ok(())
    });
    t.insert('D', |c, v| {
        c.description = text(v);
        Ok(())
    });
    t
});

/// Теги запомненной транзакции сверх тегов её тела.
const MEMORIZED_EXTRA_TAGS: &[char] = &['K', '1', '2', '3', '4', '5', '6', '7'];

/// Допустимые теги секции (для сообщений и проверок).
pub fn allowed_tags(kind: SectionKind) -> Vec<char> {
    let mut tags: Vec<char> = match kind {
        SectionKind::Transactions(k) if k.is_investment() => INVESTMENT_TAGS.keys().copied().collect(),
        SectionKind::Transactions(_) => BANKING_TAGS.keys().copied().collect(),
        SectionKind::AccountList => ACCOUNT_TAGS.keys().copied().collect(),
        SectionKind::Category => CATEGORY_TAGS.keys().copied().collect(),
        SectionKind::Class => CLASS_TAGS.keys().copied().collect(),
        SectionKind::Memorized => BANKING_TAGS
            .keys()
            .chain(INVESTMENT_TAGS.keys())
            .chain(MEMORIZED_EXTRA_TAGS)
            .copied()
            .collect(),
    };
    tags.sort_unstable();
    tags.dedup();
    tags
}

fn apply<'a, T>(
    table: &Table<T>,
    draft: &mut T,
    section: &str,
    lines: impl Iterator<Item = &'a TagLine>,
    issues: &mut Vec<Issue>,
) {
    for line in lines {
        match table.get(&line.tag) {
            Some(handler) => {
                if let Err(message) = handler(draft, &line.value) {
                    issues.push(Issue {
                        kind: IssueKind::BadValue,
                        line: line.line,
                        message: format!("tag '{}': {message}", line.tag),
                    });
                }
            }
            None => issues.push(Issue {
                kind: IssueKind::UnknownTag,
                line: line.line,
                message: format!("unknown tag '{}' in {section} section", line.tag),
            }),
        }
    }
}

fn missing(issues: &mut Vec<Issue>, entry: &RawEntry, tag: char, what: &str) {
    issues.push(Issue {
        kind: IssueKind::Missing,
        line: entry.line,
        message: format!("missing required tag '{tag}' ({what})"),
    });
}

fn unusual(issues: &mut Vec<Issue>, entry: &RawEntry, message: String) {
    issues.push(Issue {
        kind: IssueKind::Unusual,
        line: entry.line,
        message,
    });
}

fn check_banking(t: &BankingTransaction, entry: &RawEntry, issues: &mut Vec<Issue>) {
    if t.date.is_none() {
        missing(issues, entry, 'D', "date");
    }
    if t.amount.is_none() {
        missing(issues, entry, 'T', "amount");
    }
    if !t.cleared.is_known() {
        unusual(issues, entry, format!("unknown cleared status {:?}", t.cleared.qif_code()));
    }
}

fn check_investment(t: &InvestmentTransaction, entry: &RawEntry, issues: &mut Vec<Issue>) {
    if t.date.is_none() {
        missing(issues, entry, 'D', "date");
    }
    if t.action.code().is_empty() {
        missing(issues, entry, 'N', "action");
    } else if !t.action.is_known() {
        unusual(issues, entry, format!("unknown investment action {:?}", t.action.code()));
    }
    if !t.cleared.is_known() {
        unusual(issues, entry, format!("unknown cleared status {:?}", t.cleared.qif_code()));
    }
}

fn decode_banking<'a>(
    lines: impl Iterator<Item = &'a TagLine>,
    section: &str,
    entry: &RawEntry,
    issues: &mut Vec<Issue>,
) -> BankingTransaction {
    let mut draft = BankingDraft::default();
    apply(&BANKING_TAGS, &mut draft, section, lines, issues);
    let txn = draft.finish();
    check_banking(&txn, entry, issues);
    txn
}

fn decode_investment<'a>(
    lines: impl Iterator<Item = &'a TagLine>,
    section: &str,
    entry: &RawEntry,
    issues: &mut Vec<Issue>,
) -> InvestmentTransaction {
    let mut txn = InvestmentTransaction::default();
    apply(&INVESTMENT_TAGS, &mut txn, section, lines, issues);
    check_investment(&txn, entry, issues);
    txn
}

/// Разбор одной записи. Проблемы не прерывают разбор, а собираются в список:
/// декодер останавливается на первой фатальной, валидатор показывает все.
pub(crate) fn decode_entry(kind: SectionKind, entry: &RawEntry) -> (Record, Vec<Issue>) {
    let mut issues = Vec::new();
    let section = kind.header();
    let record = match kind {
        SectionKind::Transactions(k) if k.is_investment() => Record::Transaction(
            decode_investment(entry.lines.iter(), &section, entry, &mut issues).into(),
        ),
        SectionKind::Transactions(_) => Record::Transaction(
            decode_banking(entry.lines.iter(), &section, entry, &mut issues).into(),
        ),
        SectionKind::AccountList => {
            let mut draft = AccountDraft::default();
            apply(&ACCOUNT_TAGS, &mut draft, &section, entry.lines.iter(), &mut issues);
            if draft.name.is_none() {
                missing(&mut issues, entry, 'N', "account name");
            }
            Record::Account(AccountDefinition {
                name: draft.name.unwrap_or_default(),
                kind: draft.kind.unwrap_or(AccountKind::Bank),
                description: draft.description,
                credit_limit: draft.credit_limit,
                statement_date: draft.statement_date,
                statement_balance: draft.statement_balance,
            })
        }
        SectionKind::Category => {
            let mut cat = CategoryDefinition::default();
            apply(&CATEGORY_TAGS, &mut cat, &section, entry.lines.iter(), &mut issues);
            if cat.name.is_empty() {
                missing(&mut issues, entry, 'N', "category name");
            }
            Record::Category(cat)
        }
        SectionKind::Class => {
            let mut class = ClassDefinition::default();
            apply(&CLASS_TAGS, &mut class, &section, entry.lines.iter(), &mut issues);
            if class.name.is_empty() {
                missing(&mut issues, entry, 'N', "class name");
            }
            Record::Class(class)
        }
        SectionKind::Memorized => Record::Memorized(decode_memorized(entry, &section, &mut issues)),
    };
    (record, issues)
}

fn decode_memorized(entry: &RawEntry, section: &str, issues: &mut Vec<Issue>) -> MemorizedRecord {
    let kind = match entry.lines.iter().find(|l| l.tag == 'K') {
        Some(k) => MemorizedKind::from_code(&k.value),
        None => {
            missing(issues, entry, 'K', "memorized type");
            MemorizedKind::Other(String::new())
        }
    };
    let amortization: Vec<(char, String)> = entry
        .lines
        .iter()
        .filter(|l| matches!(l.tag, '1'..='7'))
        .map(|l| (l.tag, l.value.clone()))
        .collect();
    let body = entry
        .lines
        .iter()
        .filter(|l| !MEMORIZED_EXTRA_TAGS.contains(&l.tag));
    let transaction = if kind == MemorizedKind::Investment {
        decode_investment(body, section, entry, issues).into()
    } else {
        decode_banking(body, section, entry, issues).into()
    };
    MemorizedRecord {
        kind,
        transaction,
        amortization,
    }
}

/// Разбор QIF-текста в документ. Останавливается на первой ошибке формата.
pub fn decode(text: &str) -> Result<LedgerDocument> {
    if text.trim().is_empty() {
        return Err(QifError::format(Location::Input, "empty input"));
    }
    let scan = scan(text);
    if scan.terminators == 0 {
        return Err(QifError::format(
            Location::Input,
            "no entry terminator '^' found",
        ));
    }

    let mut doc = LedgerDocument::default();
    let mut current = DEFAULT_ACCOUNT_NAME.to_string();

    for block in &scan.blocks {
        let kind = match (&block.header, block.kind) {
            (Some(_), Some(kind)) => kind,
            (Some(header), None) => {
                return Err(QifError::format(
                    Location::Line(block.line),
                    format!("unknown section header {header:?}"),
                ))
            }
            (None, _) => {
                return Err(QifError::format(
                    Location::Line(block.line),
                    "data before the first section header",
                ))
            }
        };
        debug!(
            "QIF block {} at line {}: {} with {} entries",
            block.index,
            block.line,
            kind.header(),
            block.entries.len()
        );

        if kind != SectionKind::AccountList {
            doc.kind = Some(kind);
        }
        if let Some(account_kind) = kind.account_kind() {
            doc.section_mut(&current, account_kind);
        }

        let mut last_account: Option<String> = None;
        for entry in &block.entries {
            let at = |line| Location::Entry {
                block: block.index,
                entry: entry.index,
                line,
            };
            if !entry.terminated {
                return Err(QifError::format(
                    at(entry.line),
                    "entry is not terminated with '^' (missing terminator)",
                ));
            }
            let (record, issues) = decode_entry(kind, entry);
            if let Some(issue) = issues.iter().find(|i| i.is_fatal()) {
                return Err(QifError::format(at(issue.line), issue.message.clone()));
            }
            for issue in &issues {
                debug!("{}: {}", at(issue.line), issue.message);
            }

            match record {
                Record::Transaction(mut txn) => {
                    let account_kind = kind.account_kind().unwrap_or(AccountKind::Bank);
                    txn.set_account(Some(current.clone()));
                    doc.section_mut(&current, account_kind).transactions.push(txn);
                }
                Record::Account(def) => {
                    if !def.name.is_empty() {
                        last_account = Some(def.name.clone());
                    }
                    doc.upsert_account(def);
                }
                Record::Category(cat) => doc.categories.push(cat),
                Record::Class(class) => doc.classes.push(class),
                Record::Memorized(m) => doc.memorized.push(m),
            }
        }

        if kind == SectionKind::AccountList && !block.autoswitch {
            if let Some(name) = last_account {
                current = name;
            }
        }
    }

    debug!(
        "QIF decoded: {} sections, {} transactions, {} accounts",
        doc.sections.len(),
        doc.transaction_count(),
        doc.accounts.len()
    );
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Запись

/// Документ в QIF-текст.
pub fn encode(doc: &LedgerDocument) -> Result<String> {
    let mut buf = Vec::new();
    write_document(&mut buf, doc)?;
    String::from_utf8(buf).map_err(|e| QifError::format(Location::Input, e.to_string()))
}

/// Порядок: секции счёта по умолчанию (без блока `!Account`), описания
/// счетов без секций, затем каждая именованная секция со своим блоком
/// `!Account`, категории, классы, запомненные транзакции.
pub fn write_document<W: Write>(w: &mut W, doc: &LedgerDocument) -> Result<()> {
    let implicit_default = doc.account(DEFAULT_ACCOUNT_NAME).is_none();
    let is_default = |s: &AccountSection| implicit_default && s.name == DEFAULT_ACCOUNT_NAME;

    for section in doc.sections.iter().filter(|s| is_default(*s)) {
        write_section(w, section)?;
    }

    let listed: Vec<&AccountDefinition> = doc
        .accounts
        .iter()
        .filter(|a| !doc.sections.iter().any(|s| s.name == a.name))
        .collect();
    if !listed.is_empty() {
        writeln!(w, "!Option:AutoSwitch")?;
        writeln!(w, "{}", SectionKind::AccountList.header())?;
        for def in listed {
            write_account(w, def)?;
        }
        writeln!(w, "!Clear:AutoSwitch")?;
    }

    for section in doc.sections.iter().filter(|s| !is_default(*s)) {
        let def = doc
            .account(&section.name)
            .cloned()
            .unwrap_or_else(|| AccountDefinition::new(section.name.clone(), section.kind));
        writeln!(w, "{}", SectionKind::AccountList.header())?;
        write_account(w, &def)?;
        write_section(w, section)?;
    }

    if !doc.categories.is_empty() {
        writeln!(w, "{}", SectionKind::Category.header())?;
        for cat in &doc.categories {
            write_category(w, cat)?;
        }
    }
    if !doc.classes.is_empty() {
        writeln!(w, "{}", SectionKind::Class.header())?;
        for class in &doc.classes {
            tag(w, 'N', &class.name)?;
            opt(w, 'D', class.description.as_deref())?;
            end(w)?;
        }
    }
    if !doc.memorized.is_empty() {
        writeln!(w, "{}", SectionKind::Memorized.header())?;
        for m in &doc.memorized {
            if !m.kind.code().is_empty() {
                tag(w, 'K', m.kind.code())?;
            }
            write_body(w, &m.transaction)?;
            for (t, value) in &m.amortization {
                tag(w, *t, value)?;
            }
            end(w)?;
        }
    }
    Ok(())
}

fn write_section<W: Write>(w: &mut W, section: &AccountSection) -> Result<()> {
    writeln!(w, "{}", SectionKind::Transactions(section.kind).header())?;
    for (i, txn) in section.transactions.iter().enumerate() {
        if txn.is_investment() != section.kind.is_investment() {
            return Err(QifError::format(
                Location::Input,
                format!(
                    "account '{}': transaction {} does not match section {}",
                    section.name,
                    i + 1,
                    SectionKind::Transactions(section.kind).header()
                ),
            ));
        }
        write_body(w, txn)?;
        end(w)?;
    }
    Ok(())
}

fn write_body<W: Write>(w: &mut W, txn: &Transaction) -> Result<()> {
    match txn {
        Transaction::Banking(t) => write_banking(w, t),
        Transaction::Investment(t) => write_investment(w, t),
    }
}

fn write_banking<W: Write>(w: &mut W, t: &BankingTransaction) -> Result<()> {
    if let Some(d) = t.date {
        tag(w, 'D', &format_date(d, QIF_DATE_FORMAT))?;
    }
    if let Some(a) = &t.amount {
        tag(w, 'T', &format_amount(a))?;
    }
    if !t.cleared.is_uncleared() {
        tag(w, 'C', t.cleared.qif_code())?;
    }
    opt(w, 'N', t.number.as_deref())?;
    opt(w, 'P', t.payee.as_deref())?;
    opt(w, 'M', t.memo.as_deref())?;
    for line in &t.address {
        tag(w, 'A', line)?;
    }
    opt(w, 'L', t.category.as_deref())?;
    if t.reimbursable {
        tag(w, 'F', "")?;
    }
    for s in &t.splits {
        tag(w, 'S', &s.category)?;
        opt(w, 'E', s.memo.as_deref())?;
        tag(w, '$', &format_amount(&s.amount))?;
        if let Some(p) = &s.percentage {
            tag(w, '%', &format_amount(p))?;
        }
    }
    Ok(())
}

fn write_investment<W: Write>(w: &mut W, t: &InvestmentTransaction) -> Result<()> {
    if let Some(d) = t.date {
        tag(w, 'D', &format_date(d, QIF_DATE_FORMAT))?;
    }
    if !t.action.code().is_empty() {
        tag(w, 'N', t.action.code())?;
    }
    opt(w, 'Y', t.security.as_deref())?;
    if let Some(p) = &t.price {
        tag(w, 'I', &format_natural(p))?;
    }
    if let Some(q) = &t.quantity {
        tag(w, 'Q', &format_natural(q))?;
    }
    if let Some(a) = &t.amount {
        tag(w, 'T', &format_amount(a))?;
    }
    if !t.cleared.is_uncleared() {
        tag(w, 'C', t.cleared.qif_code())?;
    }
    opt(w, 'P', t.payee.as_deref())?;
    opt(w, 'M', t.memo.as_deref())?;
    if let Some(c) = &t.commission {
        tag(w, 'O', &format_amount(c))?;
    }
    opt(w, 'L', t.category.as_deref())?;
    if let Some(x) = &t.transfer_amount {
        tag(w, '$', &format_amount(x))?;
    }
    Ok(())
}

fn write_account<W: Write>(w: &mut W, def: &AccountDefinition) -> Result<()> {
    tag(w, 'N', &def.name)?;
    tag(w, 'T', def.kind.qif_code())?;
    opt(w, 'D', def.description.as_deref())?;
    if let Some(l) = &def.credit_limit {
        tag(w, 'L', &format_amount(l))?;
    }
    if let Some(d) = def.statement_date {
        tag(w, '/', &format_date(d, QIF_DATE_FORMAT))?;
    }
    if let Some(b) = &def.statement_balance {
        tag(w, '$', &format_amount(b))?;
    }
    end(w)
}

fn write_category<W: Write>(w: &mut W, cat: &CategoryDefinition) -> Result<()> {
    tag(w, 'N', &cat.name)?;
    opt(w, 'D', cat.description.as_deref())?;
    if cat.tax_related {
        tag(w, 'T', "")?;
    }
    if cat.income {
        tag(w, 'I', "")?;
    }
    if cat.expense {
        tag(w, 'E', "")?;
    }
    if let Some(b) = &cat.budget_amount {
        tag(w, 'B', &format_amount(b))?;
    }
    opt(w, 'R', cat.tax_schedule.as_deref())?;
    end(w)
}

fn tag<W: Write>(w: &mut W, tag: char, value: &str) -> Result<()> {
    writeln!(w, "{tag}{value}")?;
    Ok(())
}

fn opt<W: Write>(w: &mut W, t: char, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => tag(w, t, v),
        None => Ok(()),
    }
}

fn end<W: Write>(w: &mut W) -> Result<()> {
    writeln!(w, "^")?;
    Ok(())
}
