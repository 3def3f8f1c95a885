mod templates;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::error;
use qifiolib::{
    convert::{csv_to_qif, qif_to_csv, ConvertOptions},
    formats::{csv, qif},
    model::AccountKind,
    transfer::TransferRecognizer,
    validate::{validate_csv, validate_qif, validate_template, ValidationReport},
    QifError,
};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// CSV -> QIF
    Csv2qif,
    /// QIF -> CSV
    Qif2csv,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Kind {
    Bank,
    Cash,
    CreditCard,
    Investment,
    Asset,
    Liability,
}

impl From<Kind> for AccountKind {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Bank => AccountKind::Bank,
            Kind::Cash => AccountKind::Cash,
            Kind::CreditCard => AccountKind::CreditCard,
            Kind::Investment => AccountKind::Investment,
            Kind::Asset => AccountKind::Asset,
            Kind::Liability => AccountKind::Liability,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "qifio", version, about = "Конвертация QIF <-> CSV")]
struct Cli {
    /// Входной файл (по умолчанию stdin)
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Выходной файл (по умолчанию stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Направление; по умолчанию определяется по расширениям файлов
    #[arg(short = 'd', long = "direction", value_enum)]
    direction: Option<Direction>,

    /// Имя встроенного шаблона или путь к YAML-шаблону
    #[arg(short = 't', long = "template")]
    template: Option<String>,

    /// Тип счёта (перекрывает тип из шаблона)
    #[arg(long = "type", value_enum)]
    kind: Option<Kind>,

    /// Имя счёта
    #[arg(short = 'a', long = "account")]
    account: Option<String>,

    /// Не искать переводы между счетами
    #[arg(long = "no-transfers")]
    no_transfers: bool,

    /// Допустимая разница дат перевода, в днях
    #[arg(long = "transfer-days", default_value_t = 1)]
    transfer_days: i64,

    /// Только проверить вход и вывести найденные проблемы
    #[arg(long = "validate-only")]
    validate_only: bool,

    /// Подробный лог
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn extension(path: Option<&str>) -> Option<String> {
    path.and_then(|p| Path::new(p).extension())
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn infer_direction(cli: &Cli) -> Result<Direction> {
    if let Some(d) = cli.direction {
        return Ok(d);
    }
    let input = extension(cli.input.as_deref());
    let output = extension(cli.output.as_deref());
    match (input.as_deref(), output.as_deref()) {
        (Some("csv"), _) | (_, Some("qif")) => Ok(Direction::Csv2qif),
        (Some("qif"), _) | (_, Some("csv")) => Ok(Direction::Qif2csv),
        _ => bail!("cannot infer conversion direction from file names; pass --direction"),
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(p) if p != "-" => fs::read_to_string(p).with_context(|| format!("cannot read {p}")),
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn print_report(report: &ValidationReport) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for e in &report.errors {
        writeln!(out, "{e}")?;
    }
    if report.errors.is_empty() {
        writeln!(out, "OK")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let direction = infer_direction(&cli)?;
    let text = read_input(cli.input.as_deref())?;
    let detected = match direction {
        Direction::Csv2qif => Some(csv::detect_kind(&text)),
        Direction::Qif2csv => qif::detect_kind(&text),
    };
    let template = templates::resolve(cli.template.as_deref(), cli.kind.map(AccountKind::from), detected)?;

    if cli.validate_only {
        let mut report = validate_template(&template);
        let input = match direction {
            Direction::Csv2qif => validate_csv(&text, &template),
            Direction::Qif2csv => validate_qif(&text),
        };
        report.errors.extend(input.errors);
        print_report(&report)?;
        if !report.is_valid() {
            bail!("validation failed with {} error(s)", report.error_count());
        }
        return Ok(());
    }

    let options = ConvertOptions {
        account_name: cli.account.clone(),
        recognize_transfers: !cli.no_transfers,
        recognizer: TransferRecognizer {
            max_date_difference: cli.transfer_days,
            ..TransferRecognizer::default()
        },
    };
    let result = match direction {
        Direction::Csv2qif => csv_to_qif(&text, &template, &options),
        Direction::Qif2csv => qif_to_csv(&text, &template, &options),
    };
    let conversion = match result {
        Ok(c) => c,
        Err(QifError::Invalid(errors)) => {
            for e in &errors {
                error!("{e}");
            }
            bail!("input is not valid ({} problem(s))", errors.len());
        }
        Err(e) => return Err(e.into()),
    };

    let mut writer: Box<dyn Write> = match cli.output.as_deref() {
        Some(p) if p != "-" => Box::new(File::create(p).with_context(|| format!("cannot create {p}"))?),
        _ => Box::new(io::stdout()),
    };
    writer.write_all(conversion.output.as_bytes())?;
    writer.flush()?;
    Ok(())
}
