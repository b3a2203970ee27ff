mod common;

use cardledger::domain::BalanceLedger;
use common::date;

fn ledger_with(entries: &[(&str, i64)]) -> BalanceLedger {
    let mut ledger = BalanceLedger::new();
    for (d, amount) in entries {
        ledger.record_balance(date(d), *amount).unwrap();
    }
    ledger
}

#[test]
fn test_last_recorded_amount_wins_in_ascending_order() {
    let ledger = ledger_with(&[
        ("2024-01-01", 100),
        ("2024-01-01", 150),
        ("2024-01-02", 300),
        ("2024-01-03", 50),
    ]);

    assert_eq!(ledger.balance_on(date("2024-01-01")), 150);
    assert_eq!(ledger.balance_on(date("2024-01-02")), 300);
    assert_eq!(ledger.balance_on(date("2024-01-03")), 50);
}

#[test]
fn test_correction_shifts_later_entry_by_same_amount() {
    let (v1, v2, k) = (4000, 9000, -1250);
    let mut ledger = ledger_with(&[("2024-05-01", v1), ("2024-05-20", v2)]);

    ledger.record_balance(date("2024-05-01"), v1 + k).unwrap();

    assert_eq!(ledger.balance_on(date("2024-05-01")), v1 + k);
    assert_eq!(ledger.balance_on(date("2024-05-20")), v2 + k);
}

#[test]
fn test_gap_dates_report_prior_entry() {
    let ledger = ledger_with(&[("2024-01-01", 700), ("2024-01-31", 900)]);

    for day in 2..=30 {
        let d = date(&format!("2024-01-{:02}", day));
        assert_eq!(ledger.balance_on(d), 700);
    }
}

#[test]
fn test_empty_ledger_queries() {
    let ledger = BalanceLedger::load("").unwrap();
    assert_eq!(ledger.balance_on(date("1999-12-31")), 0);
    assert_eq!(ledger.current_balance(), 0);
}

#[test]
fn test_stored_form_roundtrip() {
    for ledger in [
        BalanceLedger::new(),
        ledger_with(&[("2024-01-01", 1)]),
        ledger_with(&[("2023-12-31", -5), ("2024-02-29", 12345), ("2025-01-01", 0)]),
    ] {
        let stored = ledger.save().unwrap();
        let restored = BalanceLedger::load(&stored).unwrap();
        assert_eq!(restored, ledger);
        assert_eq!(restored.save().unwrap(), stored);
    }
}

#[test]
fn test_later_entry_absorbs_earlier_insert_in_either_order() {
    let later_first = ledger_with(&[("2024-01-10", 100), ("2024-01-05", 50)]);
    assert_eq!(later_first.balance_on(date("2024-01-05")), 50);
    assert_eq!(later_first.balance_on(date("2024-01-10")), 150);

    let earlier_first = ledger_with(&[("2024-01-05", 50), ("2024-01-10", 150)]);
    assert_eq!(earlier_first, later_first);
}

#[test]
fn test_current_balance_tracks_max_date() {
    let mut ledger = BalanceLedger::new();
    for (d, amount) in [
        ("2024-06-01", 600),
        ("2024-02-01", 200),
        ("2024-09-01", 900),
        ("2024-01-01", 100),
    ] {
        ledger.record_balance(date(d), amount).unwrap();
        let last = ledger.last_date().unwrap();
        assert_eq!(ledger.current_balance(), ledger.get(last).unwrap());
    }
    assert_eq!(ledger.last_date(), Some(date("2024-09-01")));
}
