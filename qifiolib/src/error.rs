//! Единый тип ошибок публичного API.

use crate::validate::ValidationError;
use std::fmt;
use thiserror::Error;

/// Место во входных данных, к которому относится ошибка.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Вход целиком.
    Input,
    /// Строка QIF (с единицы).
    Line(usize),
    /// Запись QIF: номер блока (секции), номер записи в блоке и строка.
    Entry { block: usize, entry: usize, line: usize },
    /// Строка CSV (физический номер записи с единицы, включая заголовок).
    Row(usize),
    /// Ячейка CSV.
    Cell { row: usize, column: String },
    /// Запись в списке транзакций (с единицы).
    Record(usize),
    /// Транзакция в секции счёта разобранного документа.
    Transaction { account: String, index: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Input => write!(f, "input"),
            Location::Line(line) => write!(f, "line {line}"),
            Location::Entry { block, entry, line } => {
                write!(f, "block {block}, entry {entry} (line {line})")
            }
            Location::Row(row) => write!(f, "row {row}"),
            Location::Cell { row, column } => write!(f, "row {row}, column '{column}'"),
            Location::Record(n) => write!(f, "record {n}"),
            Location::Transaction { account, index } => {
                write!(f, "account '{account}', transaction {index}")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum QifError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// QIF-текст некорректен: нет терминатора, неизвестный заголовок или тег,
    /// значение тега не разбирается.
    #[error("Format error at {location}: {message}")]
    Format { location: Location, message: String },

    /// Шаблон ссылается на отсутствующее обязательное поле или колонку.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Значение ячейки не приводится к типу поля.
    #[error("Cannot convert {value:?} for {field} at {location}: {message}")]
    Coercion {
        location: Location,
        field: String,
        value: String,
        message: String,
    },

    /// Валидатор нашёл ошибки; конвертация не запускалась.
    #[error("Validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}

impl QifError {
    pub(crate) fn format(location: Location, message: impl Into<String>) -> Self {
        QifError::Format {
            location,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QifError>;
