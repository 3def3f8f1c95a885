//! Шаблон соответствия колонок CSV полям транзакции.

use crate::model::AccountKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Поле транзакции, на которое может ссылаться шаблон.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Amount,
    Payee,
    Number,
    Memo,
    Category,
    Account,
    ClearedStatus,
    Address,
    Action,
    Security,
    Price,
    Quantity,
    Commission,
    TransferAmount,
}

const BANKING_FIELDS: &[Field] = &[
    Field::Date,
    Field::Amount,
    Field::Payee,
    Field::Number,
    Field::Memo,
    Field::Category,
    Field::Account,
    Field::ClearedStatus,
    Field::Address,
];

const INVESTMENT_FIELDS: &[Field] = &[
    Field::Date,
    Field::Action,
    Field::Security,
    Field::Quantity,
    Field::Price,
    Field::Amount,
    Field::Commission,
    Field::Payee,
    Field::Category,
    Field::Account,
    Field::Memo,
    Field::ClearedStatus,
    Field::TransferAmount,
];

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Payee => "payee",
            Field::Number => "number",
            Field::Memo => "memo",
            Field::Category => "category",
            Field::Account => "account",
            Field::ClearedStatus => "cleared_status",
            Field::Address => "address",
            Field::Action => "action",
            Field::Security => "security",
            Field::Price => "price",
            Field::Quantity => "quantity",
            Field::Commission => "commission",
            Field::TransferAmount => "transfer_amount",
        }
    }

    pub fn allowed_for(kind: AccountKind) -> &'static [Field] {
        if kind.is_investment() {
            INVESTMENT_FIELDS
        } else {
            BANKING_FIELDS
        }
    }

    pub fn required_for(kind: AccountKind) -> &'static [Field] {
        if kind.is_investment() {
            &[Field::Date, Field::Action, Field::Security]
        } else {
            &[Field::Date, Field::Amount]
        }
    }

    /// Числовые поля: к ним применяется множитель колонки.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::Amount | Field::Price | Field::Quantity | Field::Commission | Field::TransferAmount
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMapping {
    pub field: Field,
    pub column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub account_kind: AccountKind,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_true")]
    pub has_header: bool,
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Порядок элементов задаёт порядок колонок на выходе.
    pub field_mapping: Vec<ColumnMapping>,
    /// Колонки, сумма которых (с множителями) даёт `amount`.
    #[serde(default)]
    pub amount_columns: Vec<String>,
    #[serde(default)]
    pub amount_multipliers: BTreeMap<String, Decimal>,
    #[serde(default = "default_true")]
    pub detect_transfers: bool,
    #[serde(default = "default_transfer_pattern")]
    pub transfer_pattern: String,
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

pub fn default_transfer_pattern() -> String {
    r"^\[(.+)\]$".to_string()
}

impl MappingTemplate {
    pub fn new(name: impl Into<String>, account_kind: AccountKind) -> Self {
        MappingTemplate {
            name: name.into(),
            description: None,
            account_kind,
            delimiter: default_delimiter(),
            has_header: true,
            skip_rows: 0,
            date_format: default_date_format(),
            field_mapping: Vec::new(),
            amount_columns: Vec::new(),
            amount_multipliers: BTreeMap::new(),
            detect_transfers: true,
            transfer_pattern: default_transfer_pattern(),
        }
    }

    pub fn map(mut self, field: Field, column: impl Into<String>) -> Self {
        self.field_mapping.push(ColumnMapping {
            field,
            column: column.into(),
        });
        self
    }

    pub fn column_for(&self, field: Field) -> Option<&str> {
        self.field_mapping
            .iter()
            .find(|m| m.field == field)
            .map(|m| m.column.as_str())
            .filter(|c| !c.is_empty())
    }

    /// Заголовок CSV в порядке сопоставления.
    pub fn columns(&self) -> Vec<&str> {
        self.field_mapping.iter().map(|m| m.column.as_str()).collect()
    }

    /// Множитель колонки; по умолчанию единица.
    pub fn multiplier(&self, column: &str) -> Decimal {
        self.amount_multipliers
            .get(column)
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    /// Отображено ли поле (для `amount` считаются и `amount_columns`).
    pub fn maps(&self, field: Field) -> bool {
        self.column_for(field).is_some() || (field == Field::Amount && !self.amount_columns.is_empty())
    }

    pub fn generic_bank() -> Self {
        MappingTemplate {
            description: Some("Generic bank transaction template".into()),
            transfer_pattern: r"\[(.*?)\]".into(),
            ..MappingTemplate::new("generic_bank", AccountKind::Bank)
        }
        .map(Field::Date, "Date")
        .map(Field::Amount, "Amount")
        .map(Field::Payee, "Description")
        .map(Field::Number, "Reference")
        .map(Field::Memo, "Memo")
        .map(Field::Category, "Category")
        .map(Field::Account, "Account Name")
        .map(Field::ClearedStatus, "Status")
    }

    pub fn generic_credit_card() -> Self {
        MappingTemplate {
            description: Some("Generic credit card transaction template".into()),
            transfer_pattern: r"\[(.*?)\]".into(),
            ..MappingTemplate::new("generic_credit_card", AccountKind::CreditCard)
        }
        .map(Field::Date, "Date")
        .map(Field::Amount, "Amount")
        .map(Field::Payee, "Description")
        .map(Field::Memo, "Memo")
        .map(Field::Category, "Category")
        .map(Field::ClearedStatus, "Status")
    }

    pub fn generic_investment() -> Self {
        MappingTemplate {
            description: Some("Generic investment transaction template".into()),
            transfer_pattern: r"\[(.*?)\]".into(),
            ..MappingTemplate::new("generic_investment", AccountKind::Investment)
        }
        .map(Field::Date, "Date")
        .map(Field::Action, "Action")
        .map(Field::Security, "Security")
        .map(Field::Quantity, "Quantity")
        .map(Field::Price, "Price")
        .map(Field::Amount, "Amount")
        .map(Field::Commission, "Commission")
        .map(Field::Payee, "Description")
        .map(Field::Category, "Category")
        .map(Field::Account, "Account")
        .map(Field::Memo, "Memo")
        .map(Field::ClearedStatus, "Status")
    }

    /// Встроенный шаблон по имени.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "generic_bank" => Some(Self::generic_bank()),
            "generic_credit_card" => Some(Self::generic_credit_card()),
            "generic_investment" => Some(Self::generic_investment()),
            _ => None,
        }
    }

    /// Встроенный шаблон для типа счёта: инвестиционный, кредитной карты
    /// или банковский с подменённым типом.
    pub fn for_kind(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Investment => Self::generic_investment(),
            AccountKind::CreditCard => Self::generic_credit_card(),
            other => MappingTemplate {
                account_kind: other,
                ..Self::generic_bank()
            },
        }
    }

    pub const BUILTIN_NAMES: [&'static str; 3] =
        ["generic_bank", "generic_credit_card", "generic_investment"];
}
