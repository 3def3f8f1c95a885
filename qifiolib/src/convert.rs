//! Сквозные конвертации CSV → QIF и QIF → CSV.
//!
//! Каждая конвертация сначала проверяет шаблон и входной текст; при ошибках
//! возвращается `QifError::Invalid`, предупреждения попадают в результат.

use crate::{
    error::{QifError, Result},
    formats::{csv, qif},
    model::{AccountDefinition, LedgerDocument, SectionKind},
    template::MappingTemplate,
    transfer::TransferRecognizer,
    validate::{validate_csv, validate_qif, validate_template, ValidationError},
};
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Имя счёта: для CSV → QIF — счёт строк без своей колонки счёта,
    /// для QIF → CSV — какую секцию выгружать.
    pub account_name: Option<String>,
    /// Можно выключить поиск переводов, даже если шаблон его включает.
    pub recognize_transfers: bool,
    pub recognizer: TransferRecognizer,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            account_name: None,
            recognize_transfers: true,
            recognizer: TransferRecognizer::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub output: String,
    pub warnings: Vec<ValidationError>,
}

fn log_warnings(warnings: &[ValidationError]) {
    for w in warnings {
        warn!("{w}");
    }
}

pub fn csv_to_qif(text: &str, template: &MappingTemplate, options: &ConvertOptions) -> Result<Conversion> {
    let mut warnings = validate_template(template).into_result()?;
    warnings.extend(validate_csv(text, template).into_result()?);

    let mut records = csv::decode(text, template)?;
    let default_account = options
        .account_name
        .clone()
        .unwrap_or_else(|| template.name.clone());
    for r in records.iter_mut() {
        if r.account().map_or(true, |a| a.trim().is_empty()) {
            r.set_account(Some(default_account.clone()));
        }
    }

    if template.detect_transfers && options.recognize_transfers {
        let outcome = options.recognizer.recognize(&mut records);
        warnings.extend(outcome.warnings);
    }

    let kind = template.account_kind;
    let mut doc = LedgerDocument {
        kind: Some(SectionKind::Transactions(kind)),
        ..LedgerDocument::default()
    };
    if records.is_empty() {
        doc.section_mut(&default_account, kind);
    }
    let count = records.len();
    for r in records {
        let name = r.account().unwrap_or(default_account.as_str()).to_string();
        doc.section_mut(&name, kind).transactions.push(r);
    }
    let names: Vec<String> = doc.sections.iter().map(|s| s.name.clone()).collect();
    for name in names {
        let description = if name == default_account {
            template.description.clone()
        } else {
            None
        };
        doc.upsert_account(AccountDefinition {
            description,
            ..AccountDefinition::new(name, kind)
        });
    }

    let output = qif::encode(&doc)?;
    log_warnings(&warnings);
    info!(
        "CSV -> QIF with template '{}': {} record(s) in {} account(s), {} warning(s)",
        template.name,
        count,
        doc.sections.len(),
        warnings.len()
    );
    Ok(Conversion { output, warnings })
}

pub fn qif_to_csv(text: &str, template: &MappingTemplate, options: &ConvertOptions) -> Result<Conversion> {
    let mut warnings = validate_template(template).into_result()?;
    warnings.extend(validate_qif(text).into_result()?);

    let doc = qif::decode(text)?;
    if let Some((what, count, output)) = list_export(&doc, template)? {
        log_warnings(&warnings);
        info!(
            "QIF -> CSV: {count} {what} record(s), {} warning(s)",
            warnings.len()
        );
        return Ok(Conversion { output, warnings });
    }

    let kind = template.account_kind;
    let section = match &options.account_name {
        Some(name) => doc.section(name, kind).ok_or_else(|| {
            QifError::Mapping(format!("account '{name}' has no {:?} transactions", kind))
        })?,
        None => doc
            .first_section_of(kind)
            .ok_or_else(|| QifError::Mapping(format!("QIF input has no {:?} section", kind)))?,
    };

    let output = csv::encode(&section.transactions, template)?;
    log_warnings(&warnings);
    info!(
        "QIF -> CSV with template '{}': {} record(s) from account '{}', {} warning(s)",
        template.name,
        section.transactions.len(),
        section.name,
        warnings.len()
    );
    Ok(Conversion { output, warnings })
}

/// Файл со списком (категории, классы, запомненные, счета без транзакций)
/// выгружается своим набором колонок; `None` для файлов с транзакциями.
fn list_export(
    doc: &LedgerDocument,
    template: &MappingTemplate,
) -> Result<Option<(&'static str, usize, String)>> {
    let export = match doc.kind {
        Some(SectionKind::Category) => (
            "category",
            doc.categories.len(),
            csv::encode_categories(&doc.categories, template)?,
        ),
        Some(SectionKind::Class) => (
            "class",
            doc.classes.len(),
            csv::encode_classes(&doc.classes, template)?,
        ),
        Some(SectionKind::Memorized) => (
            "memorized",
            doc.memorized.len(),
            csv::encode_memorized(&doc.memorized, template)?,
        ),
        Some(SectionKind::AccountList) | None
            if doc.sections.is_empty() && !doc.accounts.is_empty() =>
        {
            (
                "account",
                doc.accounts.len(),
                csv::encode_accounts(&doc.accounts, template)?,
            )
        }
        _ => return Ok(None),
    };
    Ok(Some(export))
}
