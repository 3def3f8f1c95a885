use chrono::NaiveDate;
use qifiolib::{
    formats::csv::{self, TemplateCsv},
    model::{AccountKind, BankingTransaction, ClearedStatus, InvestmentAction, SplitLine, Transaction},
    template::{Field, MappingTemplate},
    traits::{ReadFormat, WriteFormat},
    Location, QifError,
};
use rust_decimal::Decimal;
use std::io::Cursor;

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn simple_bank() -> MappingTemplate {
    MappingTemplate::new("simple", AccountKind::Bank)
        .map(Field::Date, "Date")
        .map(Field::Amount, "Amount")
        .map(Field::Payee, "Description")
}

fn banking(t: &Transaction) -> &BankingTransaction {
    match t {
        Transaction::Banking(b) => b,
        other => panic!("expected banking record, got {other:?}"),
    }
}

#[test]
fn decodes_row_into_typed_record() {
    let text = "Date,Amount,Description\n2023-01-15,100.00,Grocery Store\n";
    let records = csv::decode(text, &simple_bank()).expect("decode csv");
    assert_eq!(records.len(), 1);
    let t = banking(&records[0]);
    assert_eq!(t.date, Some(ymd(2023, 1, 15)));
    assert_eq!(t.amount, Some(dec("100.00")));
    assert_eq!(t.payee.as_deref(), Some("Grocery Store"));
}

#[test]
fn required_field_must_be_mapped() {
    let template = MappingTemplate::new("no_amount", AccountKind::Bank).map(Field::Date, "Date");
    let err = csv::decode("Date\n2023-01-15\n", &template).unwrap_err();
    assert!(matches!(err, QifError::Mapping(ref m) if m.contains("amount")), "got {err:?}");
}

#[test]
fn mapped_column_must_exist_in_header() {
    let err = csv::decode("Date,Value\n2023-01-15,1.00\n", &simple_bank()).unwrap_err();
    assert!(matches!(err, QifError::Mapping(ref m) if m.contains("'Amount'")), "got {err:?}");
}

#[test]
fn bad_cell_aborts_with_row_and_column() {
    let text = "Date,Amount,Description\n2023-01-15,1.00,A\n2023-01-16,lots,B\n";
    match csv::decode(text, &simple_bank()).unwrap_err() {
        QifError::Coercion { location, field, value, .. } => {
            assert_eq!(location, Location::Cell { row: 3, column: "Amount".into() });
            assert_eq!(field, "amount");
            assert_eq!(value, "lots");
        }
        other => panic!("expected coercion error, got {other:?}"),
    }
}

#[test]
fn blank_rows_are_skipped() {
    let text = "Date,Amount,Description\n2023-01-15,1.00,A\n,,\n2023-01-16,2.00,B\n";
    let records = csv::decode(text, &simple_bank()).expect("decode csv");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].payee(), Some("B"));
}

#[test]
fn category_matching_transfer_pattern_becomes_bracketed() {
    let template = simple_bank().map(Field::Category, "Category");
    let text = "Date,Amount,Description,Category\n2023-01-15,-5.00,A,[Savings]\n2023-01-15,-5.00,B,Dining\n";
    let records = csv::decode(text, &template).expect("decode csv");
    assert_eq!(records[0].category(), Some("[Savings]"));
    assert_eq!(records[1].category(), Some("Dining"));

    let custom = MappingTemplate {
        transfer_pattern: r"^Transfer: (.+)$".into(),
        ..template
    };
    let records = csv::decode(
        "Date,Amount,Description,Category\n2023-01-15,-5.00,A,Transfer: Brokerage\n",
        &custom,
    )
    .expect("decode csv");
    assert_eq!(records[0].category(), Some("[Brokerage]"));
}

#[test]
fn cleared_synonyms_are_case_insensitive() {
    let template = simple_bank().map(Field::ClearedStatus, "Status");
    let text = "Date,Amount,Description,Status\n\
                2023-01-15,1,A,Cleared\n\
                2023-01-15,1,B,c\n\
                2023-01-15,1,C,*\n\
                2023-01-15,1,D,RECONCILED\n\
                2023-01-15,1,E,\n";
    let records = csv::decode(text, &template).expect("decode csv");
    let statuses: Vec<ClearedStatus> = records.iter().map(|r| banking(r).cleared.clone()).collect();
    assert_eq!(
        statuses,
        vec![
            ClearedStatus::Cleared,
            ClearedStatus::Cleared,
            ClearedStatus::Cleared,
            ClearedStatus::Reconciled,
            ClearedStatus::Uncleared,
        ]
    );
}

fn debit_credit() -> MappingTemplate {
    let mut template = MappingTemplate::new("debit_credit", AccountKind::Bank)
        .map(Field::Date, "Date")
        .map(Field::Payee, "Description");
    template.amount_columns = vec!["Debit".into(), "Credit".into()];
    template.amount_multipliers.insert("Debit".into(), dec("-1"));
    template
}

#[test]
fn amount_columns_are_summed_with_multipliers() {
    let text = "Date,Description,Debit,Credit\n2023-01-15,Cafe,50.00,\n2023-01-16,Refund,,20.00\n";
    let records = csv::decode(text, &debit_credit()).expect("decode csv");
    assert_eq!(records[0].amount(), Some(dec("-50.00")));
    assert_eq!(records[1].amount(), Some(dec("20.00")));
}

#[test]
fn amount_columns_are_split_by_sign_on_encode() {
    let records: Vec<Transaction> = vec![
        BankingTransaction {
            date: Some(ymd(2023, 1, 15)),
            amount: Some(dec("-50")),
            payee: Some("Cafe".into()),
            ..BankingTransaction::default()
        }
        .into(),
        BankingTransaction {
            date: Some(ymd(2023, 1, 16)),
            amount: Some(dec("20")),
            payee: Some("Refund".into()),
            ..BankingTransaction::default()
        }
        .into(),
    ];
    let text = csv::encode(&records, &debit_credit()).expect("encode csv");
    assert_eq!(
        text,
        "Date,Description,Debit,Credit\n2023-01-15,Cafe,50.00,\n2023-01-16,Refund,,20.00\n"
    );
}

const DECIMAL_MAX: &str = "79228162514264337593543950335";

#[test]
fn multiplier_overflow_is_a_coercion_error() {
    let mut template = simple_bank();
    template.amount_multipliers.insert("Amount".into(), dec("10"));
    let text = format!("Date,Amount,Description\n2023-01-15,{DECIMAL_MAX},Cafe\n");
    match csv::decode(&text, &template) {
        Err(QifError::Coercion { location, field, .. }) => {
            assert_eq!(
                location,
                Location::Cell {
                    row: 2,
                    column: "Amount".into()
                }
            );
            assert_eq!(field, "amount");
        }
        other => panic!("expected coercion error, got {other:?}"),
    }
}

#[test]
fn amount_column_sum_overflow_is_a_coercion_error() {
    let mut template = MappingTemplate::new("two_credits", AccountKind::Bank).map(Field::Date, "Date");
    template.amount_columns = vec!["Credit".into(), "Bonus".into()];
    let text = format!("Date,Credit,Bonus\n2023-01-15,{DECIMAL_MAX},{DECIMAL_MAX}\n");
    match csv::decode(&text, &template) {
        Err(QifError::Coercion { location, .. }) => assert_eq!(
            location,
            Location::Cell {
                row: 2,
                column: "Bonus".into()
            }
        ),
        other => panic!("expected coercion error, got {other:?}"),
    }
}

#[test]
fn fractional_multiplier_overflow_on_encode_is_reported() {
    let mut template = simple_bank();
    template.amount_multipliers.insert("Amount".into(), dec("0.1"));
    let records: Vec<Transaction> = vec![BankingTransaction {
        date: Some(ymd(2023, 1, 15)),
        amount: Some(Decimal::MAX),
        ..BankingTransaction::default()
    }
    .into()];
    match csv::encode(&records, &template) {
        Err(QifError::Coercion { location, .. }) => assert_eq!(location, Location::Record(1)),
        other => panic!("expected coercion error, got {other:?}"),
    }
}

#[test]
fn headerless_csv_uses_column_positions() {
    let template = MappingTemplate {
        has_header: false,
        ..MappingTemplate::new("positional", AccountKind::Bank)
    }
    .map(Field::Date, "0")
    .map(Field::Amount, "1")
    .map(Field::Payee, "2");
    let records = csv::decode("2023-01-15,12.50,Cafe\n", &template).expect("decode csv");
    assert_eq!(records[0].amount(), Some(dec("12.50")));
    assert_eq!(records[0].payee(), Some("Cafe"));

    let text = csv::encode(&records, &template).expect("encode csv");
    assert_eq!(text, "2023-01-15,12.50,Cafe\n");
}

#[test]
fn skip_rows_delimiter_and_date_format_are_honoured() {
    let template = MappingTemplate {
        delimiter: ';',
        skip_rows: 2,
        date_format: "%d.%m.%Y".into(),
        ..MappingTemplate::new("european", AccountKind::Bank)
    }
    .map(Field::Date, "Datum")
    .map(Field::Amount, "Betrag");
    let text = "Kontoauszug\nErstellt am 16.01.2023\nDatum;Betrag\n15.01.2023;\"1,234.50\"\n16.01.2023;-12.30\n";
    let grid = csv::read_grid(text, &template).expect("read grid");
    assert_eq!(grid.header.as_deref(), Some(&["Datum".to_string(), "Betrag".to_string()][..]));
    assert_eq!(grid.row_number(0), 4);

    let records = csv::decode_rows(&grid, &template).expect("decode rows");
    assert_eq!(records[0].date(), Some(ymd(2023, 1, 15)));
    assert_eq!(records[0].amount(), Some(dec("1234.50")));
    assert_eq!(records[1].date(), Some(ymd(2023, 1, 16)));
    assert_eq!(records[1].amount(), Some(dec("-12.30")));
}

#[test]
fn investment_rows_use_action_synonyms() {
    let template = MappingTemplate::generic_investment();
    let text = "Date,Action,Security,Quantity,Price,Amount,Commission,Description,Category,Account,Memo,Status\n\
                2023-03-01,purchase,ACME,10,12.5,125.00,1.00,,,Brokerage,,\n\
                2023-03-05,Dividend,ACME,,,4.20,,,,Brokerage,,\n";
    let records = csv::decode(text, &template).expect("decode csv");
    match (&records[0], &records[1]) {
        (Transaction::Investment(buy), Transaction::Investment(div)) => {
            assert_eq!(buy.action, InvestmentAction::Buy);
            assert_eq!(buy.quantity, Some(dec("10")));
            assert_eq!(buy.price, Some(dec("12.5")));
            assert_eq!(buy.account.as_deref(), Some("Brokerage"));
            assert_eq!(div.action, InvestmentAction::Div);
            assert_eq!(div.quantity, None);
        }
        other => panic!("expected investment records, got {other:?}"),
    }
}

#[test]
fn encode_summarises_splits_in_memo() {
    let records: Vec<Transaction> = vec![BankingTransaction {
        date: Some(ymd(2023, 1, 15)),
        amount: Some(dec("-42.5")),
        payee: Some("Cafe".into()),
        memo: Some("Lunch".into()),
        splits: vec![
            SplitLine {
                category: "Dining".into(),
                amount: dec("-30"),
                ..SplitLine::default()
            },
            SplitLine {
                category: "Tips".into(),
                amount: dec("-12.5"),
                ..SplitLine::default()
            },
        ],
        ..BankingTransaction::default()
    }
    .into()];
    let text = csv::encode(&records, &MappingTemplate::generic_bank()).expect("encode csv");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Amount,Description,Reference,Memo,Category,Account Name,Status")
    );
    assert_eq!(
        lines.next(),
        Some("2023-01-15,-42.50,Cafe,,Lunch; Split transaction with 2 parts,,,")
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn encode_requires_matching_record_shape() {
    let records: Vec<Transaction> = vec![BankingTransaction::default().into()];
    let err = csv::encode(&records, &MappingTemplate::generic_investment()).unwrap_err();
    assert!(matches!(err, QifError::Mapping(_)));
}

#[test]
fn template_csv_format_reads_and_writes_streams() {
    let template = simple_bank();
    let fmt = TemplateCsv::new(&template);
    let records = fmt
        .read(Cursor::new("Date,Amount,Description\n2023-01-15,100.00,\"Smith, J.\"\n"))
        .expect("read csv");
    assert_eq!(records[0].payee(), Some("Smith, J."));

    let mut out = Vec::new();
    fmt.write(&mut out, &records).expect("write csv");
    assert_eq!(
        String::from_utf8(out).expect("utf-8"),
        "Date,Amount,Description\n2023-01-15,100.00,\"Smith, J.\"\n"
    );
}
