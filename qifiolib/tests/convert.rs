use indoc::indoc;
use qifiolib::{
    convert::{csv_to_qif, qif_to_csv, ConvertOptions},
    formats::qif,
    model::AccountKind,
    template::{Field, MappingTemplate},
    QifError,
};

fn checking() -> MappingTemplate {
    MappingTemplate::new("checking", AccountKind::Bank)
        .map(Field::Date, "Date")
        .map(Field::Amount, "Amount")
        .map(Field::Payee, "Description")
}

#[test]
fn csv_rows_become_one_account_section() {
    let text = "Date,Amount,Description\n2023-01-15,-25.00,Cafe\n";
    let conversion = csv_to_qif(text, &checking(), &ConvertOptions::default()).expect("convert");
    assert_eq!(
        conversion.output,
        "!Account\nNchecking\nTBank\n^\n!Type:Bank\nD01/15/2023\nT-25.00\nPCafe\n^\n"
    );
    assert!(conversion.warnings.is_empty());
}

#[test]
fn account_option_names_the_section() {
    let options = ConvertOptions {
        account_name: Some("Everyday".into()),
        ..ConvertOptions::default()
    };
    let conversion = csv_to_qif("Date,Amount,Description\n2023-01-15,-25.00,Cafe\n", &checking(), &options)
        .expect("convert");
    let doc = qif::decode(&conversion.output).expect("decode output");
    assert_eq!(doc.accounts[0].name, "Everyday");
    assert_eq!(doc.section("Everyday", AccountKind::Bank).map(|s| s.transactions.len()), Some(1));
}

fn two_accounts() -> (MappingTemplate, &'static str) {
    let template = checking().map(Field::Account, "Account");
    let text = indoc! {"
        Date,Amount,Description,Account
        2023-01-15,-200.00,Move,Checking
        2023-01-15,200.00,Move,Savings
    "};
    (template, text)
}

#[test]
fn transfers_between_csv_accounts_are_linked() {
    let (template, text) = two_accounts();
    let conversion = csv_to_qif(text, &template, &ConvertOptions::default()).expect("convert");
    assert!(conversion.output.contains("L[Savings]"));
    assert!(conversion.output.contains("L[Checking]"));

    let doc = qif::decode(&conversion.output).expect("decode output");
    let checking = doc.section("Checking", AccountKind::Bank).expect("checking section");
    assert_eq!(checking.transactions[0].category(), Some("[Savings]"));
    let savings = doc.section("Savings", AccountKind::Bank).expect("savings section");
    assert_eq!(savings.transactions[0].category(), Some("[Checking]"));
}

#[test]
fn transfer_recognition_can_be_switched_off() {
    let (template, text) = two_accounts();
    let options = ConvertOptions {
        recognize_transfers: false,
        ..ConvertOptions::default()
    };
    let conversion = csv_to_qif(text, &template, &options).expect("convert");
    assert!(!conversion.output.contains("\nL"));

    let quiet = MappingTemplate {
        detect_transfers: false,
        ..template
    };
    let conversion = csv_to_qif(text, &quiet, &ConvertOptions::default()).expect("convert");
    assert!(!conversion.output.contains("\nL"));
}

#[test]
fn invalid_csv_is_rejected_with_every_problem() {
    let text = "Date,Amount,Description\n2023-01-15,abc,Cafe\n2023-01-16,10.00\n";
    match csv_to_qif(text, &checking(), &ConvertOptions::default()) {
        Err(QifError::Invalid(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn csv_warnings_are_returned() {
    let conversion = csv_to_qif("Date,Amount,Description\n", &checking(), &ConvertOptions::default())
        .expect("convert");
    assert_eq!(conversion.warnings.len(), 1);
    assert_eq!(conversion.output, "!Account\nNchecking\nTBank\n^\n!Type:Bank\n");
}

#[test]
fn qif_bank_entries_become_csv_rows() {
    let template = checking()
        .map(Field::Number, "Ref")
        .map(Field::Memo, "Memo")
        .map(Field::Category, "Category");
    let text = "!Type:Bank\nD01/15/2023\nT100.00\nN1234\nPGrocery Store\nMWeekly shopping\nLGroceries\n^\n";
    let conversion = qif_to_csv(text, &template, &ConvertOptions::default()).expect("convert");
    assert_eq!(
        conversion.output,
        "Date,Amount,Description,Ref,Memo,Category\n2023-01-15,100.00,Grocery Store,1234,Weekly shopping,Groceries\n"
    );
}

#[test]
fn invalid_qif_is_rejected() {
    let result = qif_to_csv("!Type:Bank\nD01/15/2023\nT100.00\n", &checking(), &ConvertOptions::default());
    match result {
        Err(QifError::Invalid(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].message.contains("terminator"));
        }
        other => panic!("expected invalid input, got {other:?}"),
    }
}

const TWO_BANKS: &str = indoc! {"
    !Account
    NChecking
    TBank
    ^
    !Type:Bank
    D01/05/2023
    T-20.00
    PCoffee
    ^
    !Account
    NSavings
    TBank
    ^
    !Type:Bank
    D01/06/2023
    T500.00
    PDeposit
    ^
"};

#[test]
fn account_option_selects_qif_section() {
    let options = ConvertOptions {
        account_name: Some("Savings".into()),
        ..ConvertOptions::default()
    };
    let conversion = qif_to_csv(TWO_BANKS, &checking(), &options).expect("convert");
    assert_eq!(conversion.output, "Date,Amount,Description\n2023-01-06,500.00,Deposit\n");

    let first = qif_to_csv(TWO_BANKS, &checking(), &ConvertOptions::default()).expect("convert");
    assert_eq!(first.output, "Date,Amount,Description\n2023-01-05,-20.00,Coffee\n");

    let missing = ConvertOptions {
        account_name: Some("Brokerage".into()),
        ..ConvertOptions::default()
    };
    assert!(matches!(
        qif_to_csv(TWO_BANKS, &checking(), &missing),
        Err(QifError::Mapping(_))
    ));
}

#[test]
fn qif_without_matching_section_is_a_mapping_error() {
    let template = MappingTemplate::generic_investment();
    assert!(matches!(
        qif_to_csv(TWO_BANKS, &template, &ConvertOptions::default()),
        Err(QifError::Mapping(_))
    ));
}

#[test]
fn csv_survives_a_round_trip_through_qif() {
    let text = "Date,Amount,Description\n2023-01-15,-25.00,Cafe\n2023-01-16,1000.00,Salary\n";
    let template = checking();
    let options = ConvertOptions::default();
    let qif_text = csv_to_qif(text, &template, &options).expect("csv -> qif").output;
    let back = qif_to_csv(&qif_text, &template, &options).expect("qif -> csv").output;
    assert_eq!(back, text);
}

#[test]
fn category_list_exports_its_own_columns() {
    let template = MappingTemplate::generic_bank();
    let conversion = qif_to_csv("!Type:Cat\nNGroceries\nDFood\nE\n^\n", &template, &ConvertOptions::default())
        .expect("convert");
    assert_eq!(
        conversion.output,
        "Name,Description,Tax Related,Income,Expense,Budget Amount,Tax Schedule\nGroceries,Food,No,No,Yes,,\n"
    );
}

#[test]
fn class_and_memorized_lists_export() {
    let classes = qif_to_csv("!Type:Class\nNBusiness\nDWork expenses\n^\n", &checking(), &ConvertOptions::default())
        .expect("convert");
    assert_eq!(classes.output, "Name,Description\nBusiness,Work expenses\n");

    let text = "!Type:Memorized\nKC\nD02/01/2023\nT-50.00\nPLandlord\nMRent\nLHousing\n^\n";
    let memorized = qif_to_csv(text, &checking(), &ConvertOptions::default()).expect("convert");
    assert_eq!(
        memorized.output,
        "Transaction Type,Date,Amount,Payee,Memo,Category\nCheck,2023-02-01,-50.00,Landlord,Rent,Housing\n"
    );
}

#[test]
fn account_list_without_transactions_exports_accounts() {
    let text = indoc! {"
        !Account
        NVisa
        TCCard
        DTravel card
        L5000.00
        /01/31/2023
        $-250.00
        ^
    "};
    let conversion = qif_to_csv(text, &checking(), &ConvertOptions::default()).expect("convert");
    assert_eq!(
        conversion.output,
        "Name,Type,Description,Credit Limit,Statement Date,Statement Balance\nVisa,CCard,Travel card,5000.00,2023-01-31,-250.00\n"
    );

    // Счета перед транзакциями: выгружаются транзакции.
    let first = qif_to_csv(TWO_BANKS, &checking(), &ConvertOptions::default()).expect("convert");
    assert!(first.output.starts_with("Date,Amount,Description\n"));
}

#[test]
fn builtin_template_follows_detected_kind() {
    let text = "!Type:Invst\nD03/01/2023\nNBuy\nYACME\nI10.00\nQ5\nT50.00\n^\n";
    let kind = qif::detect_kind(text).expect("transaction section");
    assert_eq!(kind, AccountKind::Investment);
    let conversion = qif_to_csv(text, &MappingTemplate::for_kind(kind), &ConvertOptions::default())
        .expect("convert");
    assert!(conversion.output.contains("ACME"), "{}", conversion.output);

    assert_eq!(qif::detect_kind("!Type:Cat\nNGroceries\n^\n"), None);
    assert_eq!(qif::detect_kind(TWO_BANKS), Some(AccountKind::Bank));
}

#[test]
fn csv_header_decides_between_bank_and_investment() {
    use qifiolib::formats::csv;
    assert_eq!(
        csv::detect_kind("Date;ACTION;Security;Quantity\n2023-03-01;Buy;ACME;5\n"),
        AccountKind::Investment
    );
    assert_eq!(csv::detect_kind("\nDate,Amount,Description\n"), AccountKind::Bank);
    assert_eq!(csv::detect_kind("Date,Action,Amount\n"), AccountKind::Bank);
    assert_eq!(MappingTemplate::for_kind(AccountKind::Cash).account_kind, AccountKind::Cash);
}
