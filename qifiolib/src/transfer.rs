//! Поиск парных переводов между счетами.
//!
//! Один жадный проход по всем парам `i < j`. Запись может совпасть с
//! несколькими партнёрами; тогда её категория остаётся от последнего
//! совпадения, а в результат добавляется предупреждение.

use crate::{
    error::Location,
    model::Transaction,
    validate::{Severity, ValidationError},
};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static TO_ACCOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bto\s+(\w+)").expect("literal 'to' pattern"));
static FROM_ACCOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+(\w+)").expect("literal 'from' pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRecognizer {
    /// Допустимая разница дат, в днях.
    pub max_date_difference: i64,
    /// Допустимая разница модулей сумм.
    pub amount_tolerance: Decimal,
}

impl Default for TransferRecognizer {
    fn default() -> Self {
        TransferRecognizer {
            max_date_difference: 1,
            amount_tolerance: Decimal::new(1, 2),
        }
    }
}

/// Найденная пара: индексы записей во входном срезе.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPair {
    /// Откуда ушли деньги (отрицательная сумма или «transfer to»).
    pub source: usize,
    pub destination: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    pub pairs: Vec<TransferPair>,
    pub warnings: Vec<ValidationError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phrase {
    To,
    From,
}

fn phrase(txn: &Transaction) -> Option<Phrase> {
    let payee = txn.payee()?.to_lowercase();
    if payee.contains("transfer to") {
        Some(Phrase::To)
    } else if payee.contains("transfer from") {
        Some(Phrase::From)
    } else {
        None
    }
}

fn account_of(txn: &Transaction) -> Option<&str> {
    txn.account().map(str::trim).filter(|a| !a.is_empty())
}

impl TransferRecognizer {
    pub fn new(max_date_difference: i64, amount_tolerance: Decimal) -> Self {
        TransferRecognizer {
            max_date_difference,
            amount_tolerance,
        }
    }

    /// Проверка пары. Возвращает направление: `true`, если источник `a`.
    fn direction(&self, a: &Transaction, b: &Transaction) -> Option<bool> {
        let (da, db) = (a.date()?, b.date()?);
        if (da - db).num_days().abs() > self.max_date_difference {
            return None;
        }
        if let (Some(x), Some(y)) = (account_of(a), account_of(b)) {
            if x == y {
                return None;
            }
        }

        if let (Some(x), Some(y)) = (a.amount(), b.amount()) {
            let opposite = (x.is_sign_negative() != y.is_sign_negative()) && !x.is_zero() && !y.is_zero();
            if opposite && (x.abs() - y.abs()).abs() <= self.amount_tolerance {
                return Some(x.is_sign_negative());
            }
        }

        match (phrase(a), phrase(b)) {
            (Some(Phrase::To), Some(Phrase::From)) => Some(true),
            (Some(Phrase::From), Some(Phrase::To)) => Some(false),
            _ => None,
        }
    }

    /// Пары-кандидаты в порядке обхода, без изменения записей.
    pub fn detect(&self, records: &[Transaction]) -> Vec<TransferPair> {
        let mut pairs = Vec::new();
        for i in 0..records.len() {
            for j in i + 1..records.len() {
                if let Some(i_is_source) = self.direction(&records[i], &records[j]) {
                    let (source, destination) = if i_is_source { (i, j) } else { (j, i) };
                    pairs.push(TransferPair {
                        source,
                        destination,
                    });
                }
            }
        }
        pairs
    }

    /// Находит пары и проставляет им перекрёстные категории `[Счёт]`.
    pub fn recognize(&self, records: &mut [Transaction]) -> TransferOutcome {
        let pairs = self.detect(records);
        let mut hits = vec![0usize; records.len()];

        for pair in &pairs {
            link(records, *pair);
            hits[pair.source] += 1;
            hits[pair.destination] += 1;
            debug!(
                "transfer pair: record {} -> record {}",
                pair.source + 1,
                pair.destination + 1
            );
        }

        let warnings: Vec<ValidationError> = hits
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 1)
            .map(|(i, n)| ValidationError {
                severity: Severity::Warning,
                location: Location::Record(i + 1),
                message: format!(
                    "record matched {n} transfer candidates; the last match was kept"
                ),
            })
            .collect();

        info!(
            "transfer recognition: {} pair(s) among {} record(s)",
            pairs.len(),
            records.len()
        );
        TransferOutcome { pairs, warnings }
    }
}

/// Имя счёта из фразы вида «Transfer to Savings».
fn account_from_phrase(txn: &Transaction, re: &Regex) -> Option<String> {
    re.captures(txn.payee()?)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn link(records: &mut [Transaction], pair: TransferPair) {
    let source = &records[pair.source];
    let destination = &records[pair.destination];

    let source_tag = account_of(destination)
        .map(str::to_string)
        .or_else(|| account_from_phrase(source, &TO_ACCOUNT));
    let destination_tag = account_of(source)
        .map(str::to_string)
        .or_else(|| account_from_phrase(destination, &FROM_ACCOUNT));

    if let Some(name) = source_tag {
        records[pair.source].set_category(Some(format!("[{name}]")));
    }
    if let Some(name) = destination_tag {
        records[pair.destination].set_category(Some(format!("[{name}]")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BankingTransaction;

    #[test]
    fn phrase_patterns_compile_and_capture_account() {
        let txn: Transaction = BankingTransaction {
            payee: Some("Online TRANSFER to Savings from Checking".into()),
            ..BankingTransaction::default()
        }
        .into();
        assert_eq!(account_from_phrase(&txn, &TO_ACCOUNT).as_deref(), Some("Savings"));
        assert_eq!(account_from_phrase(&txn, &FROM_ACCOUNT).as_deref(), Some("Checking"));
    }
}
