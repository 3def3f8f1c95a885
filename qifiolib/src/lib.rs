//! qifiolib — библиотека конвертации QIF ↔ CSV: чтение/запись QIF, CSV по
//! шаблонам, поиск переводов между счетами, структурные проверки.

pub mod codes;
pub mod convert;
pub mod error;
pub mod model;
pub mod template;
pub mod traits;
pub mod transfer;
pub mod validate;
pub mod values;

pub mod formats {
    pub mod csv;
    pub mod qif;
}

pub use error::{Location, QifError, Result};
