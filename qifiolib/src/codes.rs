//! Таблицы кодов QIF и синонимов CSV.
//!
//! Каждое перечисление имеет каноническое короткое написание (то, что пишется
//! в QIF) и, где нужно, набор синонимов для разбора свободного текста из CSV.
//! Нераспознанные значения не отвергаются, а попадают в вариант `Other`.

use crate::model::{AccountKind, ClearedStatus, InvestmentAction, MemorizedKind, SectionKind};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const ACCOUNT_KIND_CODES: &[(AccountKind, &str)] = &[
    (AccountKind::Bank, "Bank"),
    (AccountKind::Cash, "Cash"),
    (AccountKind::CreditCard, "CCard"),
    (AccountKind::Investment, "Invst"),
    (AccountKind::Asset, "Oth A"),
    (AccountKind::Liability, "Oth L"),
];

impl AccountKind {
    pub fn qif_code(self) -> &'static str {
        ACCOUNT_KIND_CODES
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, code)| *code)
            .unwrap_or("Bank")
    }

    /// Разбор значения `T` из блока `!Account` и хвоста `!Type:`.
    pub fn from_qif_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.eq_ignore_ascii_case("Invest") {
            return Some(AccountKind::Investment);
        }
        ACCOUNT_KIND_CODES
            .iter()
            .find(|(_, c)| c.eq_ignore_ascii_case(code))
            .map(|(k, _)| *k)
    }
}

impl SectionKind {
    pub fn header(self) -> String {
        match self {
            SectionKind::Transactions(kind) => format!("!Type:{}", kind.qif_code()),
            SectionKind::AccountList => "!Account".to_string(),
            SectionKind::Category => "!Type:Cat".to_string(),
            SectionKind::Class => "!Type:Class".to_string(),
            SectionKind::Memorized => "!Type:Memorized".to_string(),
        }
    }

    /// Разбор строки заголовка (`!Type:Bank`, `!Account`, ...), без учёта регистра.
    pub fn from_header(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.eq_ignore_ascii_case("!Account") {
            return Some(SectionKind::AccountList);
        }
        let prefix = line.get(..6)?;
        if !prefix.eq_ignore_ascii_case("!Type:") {
            return None;
        }
        let rest = line[6..].trim();
        match rest.to_ascii_lowercase().as_str() {
            "cat" => Some(SectionKind::Category),
            "class" => Some(SectionKind::Class),
            "memorized" => Some(SectionKind::Memorized),
            _ => AccountKind::from_qif_code(rest).map(SectionKind::Transactions),
        }
    }
}

/// Строки `!Option:...` и `!Clear:...` управляют импортом в Quicken и
/// не открывают секцию.
pub fn is_directive(line: &str) -> bool {
    let lower = line.trim().to_ascii_lowercase();
    lower.starts_with("!option:") || lower.starts_with("!clear:")
}

impl ClearedStatus {
    pub fn qif_code(&self) -> &str {
        match self {
            ClearedStatus::Uncleared => "",
            ClearedStatus::Cleared => "*",
            ClearedStatus::ClearedAlt => "c",
            ClearedStatus::Reconciled => "X",
            ClearedStatus::ReconciledAlt => "R",
            ClearedStatus::Other(code) => code,
        }
    }

    pub fn from_qif_code(code: &str) -> Self {
        match code.trim() {
            "" => ClearedStatus::Uncleared,
            "*" => ClearedStatus::Cleared,
            "c" => ClearedStatus::ClearedAlt,
            "X" => ClearedStatus::Reconciled,
            "R" => ClearedStatus::ReconciledAlt,
            other => ClearedStatus::Other(other.to_string()),
        }
    }

    /// Разбор свободного текста из CSV: «cleared»/«c»/«*» и т.п.
    pub fn from_synonym(text: &str) -> Self {
        let key = text.trim().to_lowercase();
        match CLEARED_SYNONYMS.get(key.as_str()) {
            Some(status) => status.clone(),
            None => ClearedStatus::Other(text.trim().to_string()),
        }
    }

    /// Человекочитаемое написание для CSV.
    pub fn label(&self) -> &str {
        match self {
            ClearedStatus::Uncleared => "",
            ClearedStatus::Cleared | ClearedStatus::ClearedAlt => "Cleared",
            ClearedStatus::Reconciled | ClearedStatus::ReconciledAlt => "Reconciled",
            ClearedStatus::Other(text) => text,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ClearedStatus::Other(_))
    }
}

static CLEARED_SYNONYMS: Lazy<HashMap<&'static str, ClearedStatus>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for key in ["", "uncleared", "n", "no", "pending", "open"] {
        m.insert(key, ClearedStatus::Uncleared);
    }
    for key in ["cleared", "c", "*", "yes", "y"] {
        m.insert(key, ClearedStatus::Cleared);
    }
    for key in ["reconciled", "r", "x"] {
        m.insert(key, ClearedStatus::Reconciled);
    }
    m
});

const ACTION_CODES: &[(&str, InvestmentAction)] = &[
    ("Buy", InvestmentAction::Buy),
    ("BuyX", InvestmentAction::BuyX),
    ("Sell", InvestmentAction::Sell),
    ("SellX", InvestmentAction::SellX),
    ("Div", InvestmentAction::Div),
    ("DivX", InvestmentAction::DivX),
    ("IntInc", InvestmentAction::IntInc),
    ("IntIncX", InvestmentAction::IntIncX),
    ("ReinvDiv", InvestmentAction::ReinvDiv),
    ("ReinvInt", InvestmentAction::ReinvInt),
    ("ReinvLg", InvestmentAction::ReinvLg),
    ("ReinvSh", InvestmentAction::ReinvSh),
    ("CGLong", InvestmentAction::CGLong),
    ("CGShort", InvestmentAction::CGShort),
    ("ShrsIn", InvestmentAction::ShrsIn),
    ("ShrsOut", InvestmentAction::ShrsOut),
    ("XIn", InvestmentAction::XIn),
    ("XOut", InvestmentAction::XOut),
    ("StkSplit", InvestmentAction::StkSplit),
];

static ACTION_BY_CODE: Lazy<HashMap<&'static str, InvestmentAction>> =
    Lazy::new(|| ACTION_CODES.iter().cloned().collect());

static ACTION_SYNONYMS: Lazy<HashMap<String, InvestmentAction>> = Lazy::new(|| {
    let mut m: HashMap<String, InvestmentAction> = ACTION_CODES
        .iter()
        .map(|(code, action)| (code.to_lowercase(), action.clone()))
        .collect();
    let extra: &[(&str, InvestmentAction)] = &[
        ("purchase", InvestmentAction::Buy),
        ("bought", InvestmentAction::Buy),
        ("sold", InvestmentAction::Sell),
        ("sale", InvestmentAction::Sell),
        ("dividend", InvestmentAction::Div),
        ("interest", InvestmentAction::IntInc),
        ("interest income", InvestmentAction::IntInc),
        ("reinvest", InvestmentAction::ReinvDiv),
        ("reinvest dividend", InvestmentAction::ReinvDiv),
        ("reinvest interest", InvestmentAction::ReinvInt),
        ("long term capital gain", InvestmentAction::CGLong),
        ("short term capital gain", InvestmentAction::CGShort),
        ("shares in", InvestmentAction::ShrsIn),
        ("shares out", InvestmentAction::ShrsOut),
        ("stock split", InvestmentAction::StkSplit),
        ("split", InvestmentAction::StkSplit),
        ("cash in", InvestmentAction::XIn),
        ("transfer in", InvestmentAction::XIn),
        ("cash out", InvestmentAction::XOut),
        ("transfer out", InvestmentAction::XOut),
    ];
    for (key, action) in extra {
        m.insert((*key).to_string(), action.clone());
    }
    m
});

impl InvestmentAction {
    pub fn code(&self) -> &str {
        match self {
            InvestmentAction::Other(code) => code,
            known => ACTION_CODES
                .iter()
                .find(|(_, a)| a == known)
                .map(|(code, _)| *code)
                .unwrap_or(""),
        }
    }

    /// Точный разбор кода QIF (тег `N` в инвестиционной секции).
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        ACTION_BY_CODE
            .get(code)
            .cloned()
            .unwrap_or_else(|| InvestmentAction::Other(code.to_string()))
    }

    /// Разбор без учёта регистра, со словарём синонимов (CSV).
    pub fn from_synonym(text: &str) -> Self {
        let text = text.trim();
        ACTION_SYNONYMS
            .get(&text.to_lowercase())
            .cloned()
            .unwrap_or_else(|| InvestmentAction::Other(text.to_string()))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, InvestmentAction::Other(_))
    }

    /// Покупка/продажа: для них обязательны бумага и количество.
    pub fn is_trade(&self) -> bool {
        matches!(
            self,
            InvestmentAction::Buy
                | InvestmentAction::BuyX
                | InvestmentAction::Sell
                | InvestmentAction::SellX
        )
    }
}

impl MemorizedKind {
    pub fn code(&self) -> &str {
        match self {
            MemorizedKind::Check => "C",
            MemorizedKind::Deposit => "D",
            MemorizedKind::Payment => "P",
            MemorizedKind::Investment => "I",
            MemorizedKind::Electronic => "E",
            MemorizedKind::Other(code) => code,
        }
    }

    /// Название для табличной выгрузки.
    pub fn label(&self) -> &str {
        match self {
            MemorizedKind::Check => "Check",
            MemorizedKind::Deposit => "Deposit",
            MemorizedKind::Payment => "Payment",
            MemorizedKind::Investment => "Investment",
            MemorizedKind::Electronic => "Electronic Payee",
            MemorizedKind::Other(code) => code,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "C" => MemorizedKind::Check,
            "D" => MemorizedKind::Deposit,
            "P" => MemorizedKind::Payment,
            "I" => MemorizedKind::Investment,
            "E" => MemorizedKind::Electronic,
            other => MemorizedKind::Other(other.to_string()),
        }
    }
}
