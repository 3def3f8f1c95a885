use chrono::NaiveDate;
use indoc::indoc;
use qifiolib::{
    formats::qif::{self, Qif},
    model::{
        AccountKind, AccountSection, ClearedStatus, InvestmentAction, InvestmentTransaction,
        LedgerDocument, MemorizedKind, SectionKind, Transaction,
    },
    traits::{ReadFormat, WriteFormat},
    QifError,
};
use rust_decimal::Decimal;
use std::io::Cursor;

const GROCERY: &str = "!Type:Bank\nD01/15/2023\nT100.00\nN1234\nPGrocery Store\nMWeekly shopping\nLGroceries\n^\n";

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn banking(t: &Transaction) -> &qifiolib::model::BankingTransaction {
    match t {
        Transaction::Banking(b) => b,
        other => panic!("expected banking record, got {other:?}"),
    }
}

#[test]
fn decodes_single_bank_entry() {
    let doc = qif::decode(GROCERY).expect("decode qif");
    assert_eq!(doc.kind, Some(SectionKind::Transactions(AccountKind::Bank)));
    assert_eq!(doc.transaction_count(), 1);

    let t = banking(&doc.sections[0].transactions[0]);
    assert_eq!(t.date, Some(ymd(2023, 1, 15)));
    assert_eq!(t.amount, Some(dec("100.00")));
    assert_eq!(t.number.as_deref(), Some("1234"));
    assert_eq!(t.payee.as_deref(), Some("Grocery Store"));
    assert_eq!(t.memo.as_deref(), Some("Weekly shopping"));
    assert_eq!(t.category.as_deref(), Some("Groceries"));
    assert_eq!(t.cleared, ClearedStatus::Uncleared);
}

#[test]
fn indented_tag_lines_are_accepted() {
    let text = "!Type:Bank\n D01/15/2023\n\tT100.00\n  PGrocery Store\n ^\n";
    let doc = qif::decode(text).expect("decode qif");
    let t = banking(&doc.sections[0].transactions[0]);
    assert_eq!(t.date, Some(ymd(2023, 1, 15)));
    assert_eq!(t.amount, Some(dec("100.00")));
    assert_eq!(t.payee.as_deref(), Some("Grocery Store"));
    assert!(qifiolib::validate::validate_qif(text).errors.is_empty());
}

#[test]
fn encodes_bank_entry_in_tag_order() {
    let doc = qif::decode(GROCERY).expect("decode qif");
    let text = qif::encode(&doc).expect("encode qif");
    assert_eq!(text, GROCERY);
}

#[test]
fn missing_terminator_is_a_format_error() {
    let err = qif::decode("!Type:Bank\nD01/15/2023\nT100.00\n").unwrap_err();
    assert!(matches!(err, QifError::Format { .. }), "got {err:?}");
}

#[test]
fn unknown_tag_is_a_format_error() {
    let err = qif::decode("!Type:Bank\nD01/15/2023\nT1.00\nZoops\n^\n").unwrap_err();
    match err {
        QifError::Format { message, .. } => assert!(message.contains("unknown tag 'Z'"), "{message}"),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn investment_tag_is_rejected_in_bank_section() {
    let err = qif::decode("!Type:Bank\nD01/15/2023\nT1.00\nYACME\n^\n").unwrap_err();
    assert!(matches!(err, QifError::Format { .. }));
}

#[test]
fn unknown_header_and_empty_input_fail() {
    assert!(matches!(
        qif::decode("!Type:Stocks\nD01/15/2023\n^\n"),
        Err(QifError::Format { .. })
    ));
    assert!(matches!(qif::decode("  \n"), Err(QifError::Format { .. })));
}

#[test]
fn bad_amount_reports_entry_location() {
    let err = qif::decode("!Type:Bank\nD01/15/2023\n^\nD01/16/2023\nTabc\n^\n").unwrap_err();
    match err {
        QifError::Format { location, message } => {
            assert_eq!(
                location,
                qifiolib::Location::Entry { block: 1, entry: 2, line: 5 }
            );
            assert!(message.contains("tag 'T'"), "{message}");
        }
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn splits_are_collected_in_order() {
    let text = indoc! {"
        !Type:Bank
        D02/01/2023
        T-100.00
        PSupermarket
        SGroceries
        EFood
        $-60.00
        SHousehold
        $-40.00
        %40%
        ^
    "};
    let doc = qif::decode(text).expect("decode qif");
    let t = banking(&doc.sections[0].transactions[0]);
    assert_eq!(t.amount, Some(dec("-100.00")));
    assert_eq!(t.splits.len(), 2);
    assert_eq!(t.splits[0].category, "Groceries");
    assert_eq!(t.splits[0].memo.as_deref(), Some("Food"));
    assert_eq!(t.splits[0].amount, dec("-60"));
    assert_eq!(t.splits[1].category, "Household");
    assert_eq!(t.splits[1].amount, dec("-40"));
    assert_eq!(t.splits[1].percentage, Some(dec("40")));

    let again = qif::decode(&qif::encode(&doc).expect("encode")).expect("decode again");
    assert_eq!(again, doc);
}

#[test]
fn accepts_quicken_dates_and_amount_notations() {
    let text = indoc! {"
        !Type:Bank
        D1/15'23
        T(1,234.56)
        ^
        D 2/ 3/2023
        T$2,000.00
        U999.00
        ^
        D12/31'2022
        U15.00
        ^
    "};
    let doc = qif::decode(text).expect("decode qif");
    let txns = &doc.sections[0].transactions;
    assert_eq!(banking(&txns[0]).date, Some(ymd(2023, 1, 15)));
    assert_eq!(banking(&txns[0]).amount, Some(dec("-1234.56")));
    assert_eq!(banking(&txns[1]).date, Some(ymd(2023, 2, 3)));
    assert_eq!(banking(&txns[1]).amount, Some(dec("2000.00")));
    assert_eq!(banking(&txns[2]).date, Some(ymd(2022, 12, 31)));
    assert_eq!(banking(&txns[2]).amount, Some(dec("15.00")));
}

#[test]
fn cleared_codes_and_flags_round_trip() {
    let text = indoc! {"
        !Type:Bank
        D01/02/2023
        T-5.00
        C*
        A1 Main St
        ASpringfield
        F
        ^
        D01/03/2023
        T-6.00
        CX
        ^
    "};
    let doc = qif::decode(text).expect("decode qif");
    let txns = &doc.sections[0].transactions;
    let first = banking(&txns[0]);
    assert_eq!(first.cleared, ClearedStatus::Cleared);
    assert_eq!(first.address, vec!["1 Main St", "Springfield"]);
    assert!(first.reimbursable);
    assert_eq!(banking(&txns[1]).cleared, ClearedStatus::Reconciled);

    assert_eq!(qif::encode(&doc).expect("encode qif"), text);
}

#[test]
fn investment_entries_use_their_own_tags() {
    let text = indoc! {"
        !Type:Invst
        D03/01/2023
        NBuy
        YACME
        I10.5
        Q100
        T1050.00
        O9.99
        ^
        D03/02/2023
        NFooBar
        YACME
        ^
    "};
    let doc = qif::decode(text).expect("decode qif");
    let section = doc.first_section_of(AccountKind::Investment).expect("invst section");
    match &section.transactions[0] {
        Transaction::Investment(t) => {
            assert_eq!(t.action, InvestmentAction::Buy);
            assert_eq!(t.security.as_deref(), Some("ACME"));
            assert_eq!(t.price, Some(dec("10.5")));
            assert_eq!(t.quantity, Some(dec("100")));
            assert_eq!(t.amount, Some(dec("1050.00")));
            assert_eq!(t.commission, Some(dec("9.99")));
        }
        other => panic!("expected investment record, got {other:?}"),
    }
    match &section.transactions[1] {
        Transaction::Investment(t) => {
            assert_eq!(t.action, InvestmentAction::Other("FooBar".into()))
        }
        other => panic!("expected investment record, got {other:?}"),
    }

    assert_eq!(qif::encode(&doc).expect("encode qif"), text);
}

#[test]
fn account_blocks_switch_current_account() {
    let text = indoc! {"
        !Account
        NChecking
        TBank
        DEveryday account
        ^
        !Type:Bank
        D01/05/2023
        T-20.00
        PCoffee
        ^
        !Account
        NVisa
        TCCard
        L5000.00
        ^
        !Type:CCard
        D01/06/2023
        T-75.00
        ^
    "};
    let doc = qif::decode(text).expect("decode qif");
    assert_eq!(doc.kind, Some(SectionKind::Transactions(AccountKind::CreditCard)));
    assert_eq!(doc.accounts.len(), 2);
    assert_eq!(doc.accounts[1].credit_limit, Some(dec("5000")));

    let checking = doc.section("Checking", AccountKind::Bank).expect("checking section");
    assert_eq!(checking.transactions.len(), 1);
    assert_eq!(checking.transactions[0].account(), Some("Checking"));
    let visa = doc.section("Visa", AccountKind::CreditCard).expect("visa section");
    assert_eq!(visa.transactions[0].amount(), Some(dec("-75.00")));

    let encoded = qif::encode(&doc).expect("encode qif");
    assert_eq!(encoded, text);
    assert_eq!(qif::decode(&encoded).expect("decode again"), doc);
}

#[test]
fn autoswitch_account_list_does_not_change_context() {
    let text = indoc! {"
        !Option:AutoSwitch
        !Account
        NHouse
        TOth A
        ^
        NMortgage
        TOth L
        ^
        !Clear:AutoSwitch
        !Type:Bank
        D01/05/2023
        T-20.00
        ^
    "};
    let doc = qif::decode(text).expect("decode qif");
    assert_eq!(doc.accounts.len(), 2);
    assert_eq!(doc.accounts[0].kind, AccountKind::Asset);
    assert_eq!(doc.accounts[1].kind, AccountKind::Liability);
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].name, qifiolib::model::DEFAULT_ACCOUNT_NAME);

    let again = qif::decode(&qif::encode(&doc).expect("encode")).expect("decode again");
    assert_eq!(again, doc);
}

#[test]
fn unknown_account_type_is_rejected() {
    let err = qif::decode("!Account\nNBrokerage\nTStocks\n^\n").unwrap_err();
    assert!(matches!(err, QifError::Format { .. }));
}

#[test]
fn category_class_and_memorized_lists() {
    let text = indoc! {"
        !Type:Cat
        NGroceries
        DFood and supplies
        E
        B400.00
        ^
        NSalary
        T
        I
        RW-2
        ^
        !Type:Class
        NBusiness
        DWork expenses
        ^
        !Type:Memorized
        KC
        T-50.00
        PLandlord
        ^
        KI
        NBuy
        YACME
        ^
    "};
    let doc = qif::decode(text).expect("decode qif");
    assert_eq!(doc.kind, Some(SectionKind::Memorized));

    assert_eq!(doc.categories.len(), 2);
    assert!(doc.categories[0].expense);
    assert_eq!(doc.categories[0].budget_amount, Some(dec("400")));
    assert!(doc.categories[1].income && doc.categories[1].tax_related);
    assert_eq!(doc.categories[1].tax_schedule.as_deref(), Some("W-2"));

    assert_eq!(doc.classes[0].name, "Business");

    assert_eq!(doc.memorized[0].kind, MemorizedKind::Check);
    assert_eq!(doc.memorized[0].transaction.payee(), Some("Landlord"));
    assert_eq!(doc.memorized[1].kind, MemorizedKind::Investment);
    assert!(doc.memorized[1].transaction.is_investment());

    assert_eq!(qif::encode(&doc).expect("encode qif"), text);
}

#[test]
fn encode_rejects_record_of_wrong_shape() {
    let doc = LedgerDocument {
        sections: vec![AccountSection {
            name: "Checking".into(),
            kind: AccountKind::Bank,
            transactions: vec![InvestmentTransaction::default().into()],
        }],
        ..LedgerDocument::default()
    };
    assert!(matches!(qif::encode(&doc), Err(QifError::Format { .. })));
}

#[test]
fn qif_format_reads_and_writes_streams() {
    let doc = Qif.read(Cursor::new(GROCERY)).expect("read qif");
    let mut out = Vec::new();
    Qif.write(&mut out, &doc).expect("write qif");
    assert_eq!(String::from_utf8(out).expect("utf-8"), GROCERY);
}
