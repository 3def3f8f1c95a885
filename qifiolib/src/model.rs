//! Доменные модели: транзакции по счетам, сплиты, списки счетов, категорий,
//! классов и запомненных транзакций. Общий слой для QIF и CSV.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Имя счёта для записей, встретившихся до первого блока `!Account`.
pub const DEFAULT_ACCOUNT_NAME: &str = "Default";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    #[serde(alias = "Bank")]
    Bank,
    #[serde(alias = "Cash")]
    Cash,
    #[serde(alias = "CCard")]
    CreditCard,
    #[serde(alias = "Invst")]
    Investment,
    #[serde(alias = "Oth A")]
    Asset,
    #[serde(alias = "Oth L")]
    Liability,
}

impl AccountKind {
    pub const ALL: [AccountKind; 6] = [
        AccountKind::Bank,
        AccountKind::Cash,
        AccountKind::CreditCard,
        AccountKind::Investment,
        AccountKind::Asset,
        AccountKind::Liability,
    ];

    pub fn is_investment(self) -> bool {
        self == AccountKind::Investment
    }
}

/// Тип секции QIF; определяет допустимый набор тегов.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Transactions(AccountKind),
    AccountList,
    Category,
    Class,
    Memorized,
}

impl SectionKind {
    pub fn account_kind(self) -> Option<AccountKind> {
        match self {
            SectionKind::Transactions(kind) => Some(kind),
            _ => None,
        }
    }
}

impl From<AccountKind> for SectionKind {
    fn from(kind: AccountKind) -> Self {
        SectionKind::Transactions(kind)
    }
}

/// Статус сверки (тег `C`). У «cleared» и «reconciled» по два написания.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClearedStatus {
    #[default]
    Uncleared,
    Cleared,
    ClearedAlt,
    Reconciled,
    ReconciledAlt,
    /// Нераспознанный код, сохраняется как есть.
    Other(String),
}

impl ClearedStatus {
    pub fn is_uncleared(&self) -> bool {
        *self == ClearedStatus::Uncleared
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvestmentAction {
    Buy,
    BuyX,
    Sell,
    SellX,
    Div,
    DivX,
    IntInc,
    IntIncX,
    ReinvDiv,
    ReinvInt,
    ReinvLg,
    ReinvSh,
    CGLong,
    CGShort,
    ShrsIn,
    ShrsOut,
    XIn,
    XOut,
    StkSplit,
    /// Нераспознанный код, сохраняется как есть.
    Other(String),
}

impl Default for InvestmentAction {
    fn default() -> Self {
        InvestmentAction::Other(String::new())
    }
}

/// Тип запомненной транзакции (тег `K`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemorizedKind {
    Check,
    Deposit,
    Payment,
    Investment,
    Electronic,
    Other(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SplitLine {
    pub category: String,
    pub memo: Option<String>,
    pub amount: Decimal,
    pub percentage: Option<Decimal>,
}

/// Общая форма для bank/cash/credit-card/asset/liability.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BankingTransaction {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub cleared: ClearedStatus,
    pub number: Option<String>,
    pub payee: Option<String>,
    pub memo: Option<String>,
    /// Категория либо перевод в виде `[Имя счёта]`.
    pub category: Option<String>,
    pub address: Vec<String>,
    pub splits: Vec<SplitLine>,
    pub reimbursable: bool,
    /// Счёт, которому принадлежит запись (ключ поиска, не тег QIF).
    pub account: Option<String>,
}

impl BankingTransaction {
    /// Сумма сплитов; `None`, если она не помещается в Decimal.
    pub fn split_total(&self) -> Option<Decimal> {
        self.splits
            .iter()
            .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.amount))
    }

    /// Расхождение суммы записи и суммы сплитов; `None`, если сплитов нет
    /// или у записи нет суммы. Переполнение даёт `Decimal::MAX`.
    pub fn split_difference(&self) -> Option<Decimal> {
        if self.splits.is_empty() {
            return None;
        }
        let amount = self.amount?;
        Some(
            self.split_total()
                .and_then(|total| amount.checked_sub(total))
                .map_or(Decimal::MAX, |d| d.abs()),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InvestmentTransaction {
    pub date: Option<NaiveDate>,
    pub action: InvestmentAction,
    pub security: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub cleared: ClearedStatus,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub category: Option<String>,
    pub transfer_amount: Option<Decimal>,
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Transaction {
    Banking(BankingTransaction),
    Investment(InvestmentTransaction),
}

impl Transaction {
    /// Пустая запись формы, подходящей для данного типа счёта.
    pub fn empty(kind: AccountKind) -> Self {
        if kind.is_investment() {
            Transaction::Investment(InvestmentTransaction::default())
        } else {
            Transaction::Banking(BankingTransaction::default())
        }
    }

    pub fn is_investment(&self) -> bool {
        matches!(self, Transaction::Investment(_))
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Transaction::Banking(t) => t.date,
            Transaction::Investment(t) => t.date,
        }
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Transaction::Banking(t) => t.amount,
            Transaction::Investment(t) => t.amount,
        }
    }

    pub fn payee(&self) -> Option<&str> {
        match self {
            Transaction::Banking(t) => t.payee.as_deref(),
            Transaction::Investment(t) => t.payee.as_deref(),
        }
    }

    pub fn memo(&self) -> Option<&str> {
        match self {
            Transaction::Banking(t) => t.memo.as_deref(),
            Transaction::Investment(t) => t.memo.as_deref(),
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Transaction::Banking(t) => t.category.as_deref(),
            Transaction::Investment(t) => t.category.as_deref(),
        }
    }

    pub fn set_category(&mut self, category: Option<String>) {
        match self {
            Transaction::Banking(t) => t.category = category,
            Transaction::Investment(t) => t.category = category,
        }
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            Transaction::Banking(t) => t.account.as_deref(),
            Transaction::Investment(t) => t.account.as_deref(),
        }
    }

    pub fn set_account(&mut self, account: Option<String>) {
        match self {
            Transaction::Banking(t) => t.account = account,
            Transaction::Investment(t) => t.account = account,
        }
    }

    /// Имя счёта из тега перевода `[Имя]`, если категория — перевод.
    pub fn transfer_target(&self) -> Option<&str> {
        self.category()
            .and_then(|c| c.strip_prefix('['))
            .and_then(|c| c.strip_suffix(']'))
            .filter(|c| !c.is_empty())
    }
}

impl From<BankingTransaction> for Transaction {
    fn from(t: BankingTransaction) -> Self {
        Transaction::Banking(t)
    }
}

impl From<InvestmentTransaction> for Transaction {
    fn from(t: InvestmentTransaction) -> Self {
        Transaction::Investment(t)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountDefinition {
    pub name: String,
    pub kind: AccountKind,
    pub description: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub statement_date: Option<NaiveDate>,
    pub statement_balance: Option<Decimal>,
}

impl AccountDefinition {
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        AccountDefinition {
            name: name.into(),
            kind,
            description: None,
            credit_limit: None,
            statement_date: None,
            statement_balance: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryDefinition {
    pub name: String,
    pub description: Option<String>,
    pub tax_related: bool,
    pub income: bool,
    pub expense: bool,
    pub budget_amount: Option<Decimal>,
    pub tax_schedule: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassDefinition {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemorizedRecord {
    pub kind: MemorizedKind,
    pub transaction: Transaction,
    /// Поля амортизации `1`..`7` в порядке появления.
    pub amortization: Vec<(char, String)>,
}

/// Транзакции одного счёта одного типа.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSection {
    pub name: String,
    pub kind: AccountKind,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerDocument {
    /// Тип последней не-`!Account` секции, встреченной при чтении.
    pub kind: Option<SectionKind>,
    pub sections: Vec<AccountSection>,
    pub accounts: Vec<AccountDefinition>,
    pub categories: Vec<CategoryDefinition>,
    pub classes: Vec<ClassDefinition>,
    pub memorized: Vec<MemorizedRecord>,
}

impl LedgerDocument {
    pub fn section(&self, name: &str, kind: AccountKind) -> Option<&AccountSection> {
        self.sections
            .iter()
            .find(|s| s.name == name && s.kind == kind)
    }

    /// Секция счёта; создаётся в конце списка, если её ещё нет.
    pub fn section_mut(&mut self, name: &str, kind: AccountKind) -> &mut AccountSection {
        let pos = match self
            .sections
            .iter()
            .position(|s| s.name == name && s.kind == kind)
        {
            Some(pos) => pos,
            None => {
                self.sections.push(AccountSection {
                    name: name.to_string(),
                    kind,
                    transactions: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[pos]
    }

    pub fn first_section_of(&self, kind: AccountKind) -> Option<&AccountSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn account(&self, name: &str) -> Option<&AccountDefinition> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Добавляет описание счёта или заменяет существующее с тем же именем.
    pub fn upsert_account(&mut self, def: AccountDefinition) {
        match self.accounts.iter_mut().find(|a| a.name == def.name) {
            Some(existing) => *existing = def,
            None => self.accounts.push(def),
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.sections.iter().map(|s| s.transactions.len()).sum()
    }
}
