// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod support;

use cyclebook::clock::FixedClock;
use cyclebook::commands::{goals, Env};
use cyclebook::db;
use cyclebook::models::{Id, Origin, SequentialIdGenerator, TransactionKind};
use rust_decimal::Decimal;
use support::{conn_with_methods, d, run};

#[test]
fn contributions_withdrawals_and_earnings_move_progress() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 5, 20));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };

    run(&conn, &env, &[
        "goal", "add", "--name", "Emergency fund", "--target", "10000", "--initial", "1000",
        "--deadline", "2025-12-31",
    ])
    .unwrap();
    run(&conn, &env, &[
        "goal", "contribute", "--goal", "emergency fund", "--amount", "1500", "--method", "pix",
    ])
    .unwrap();
    run(&conn, &env, &["goal", "earn", "--goal", "id-1", "--amount", "120.50"]).unwrap();
    run(&conn, &env, &[
        "goal", "withdraw", "--goal", "Emergency fund", "--amount", "620.50", "--method", "pix",
    ])
    .unwrap();

    let rows = goals::progress_rows(&conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].contributed, Decimal::from(1500));
    assert_eq!(rows[0].withdrawn, Decimal::new(62050, 2));
    assert_eq!(rows[0].current, Decimal::from(2000));
    assert_eq!(rows[0].remaining, Decimal::from(8000));
    assert_eq!(rows[0].percent, Decimal::from(20));
    assert_eq!(rows[0].deadline, Some(d(2025, 12, 31)));

    let txs = db::load_transactions(&conn).unwrap();
    let contribution = txs.iter().find(|t| t.kind == TransactionKind::Investment).unwrap();
    assert_eq!(contribution.description, "Contribution: Emergency fund");
    assert_eq!(contribution.category, "Investments");
    assert_eq!(contribution.date, d(2024, 5, 20));
    let withdrawal = txs.iter().find(|t| t.kind == TransactionKind::Income).unwrap();
    assert_eq!(withdrawal.description, "Withdrawal from investment: Emergency fund");
    assert_eq!(
        withdrawal.origin,
        Origin::Withdrawal { goal_id: Id::from_string("id-1") }
    );

    assert!(run(&conn, &env, &[
        "goal", "withdraw", "--goal", "id-1", "--amount", "2000.01", "--method", "pix",
    ])
    .is_err());
    assert!(run(&conn, &env, &["goal", "earn", "--goal", "id-1", "--amount", "0"]).is_err());
    assert!(run(&conn, &env, &[
        "goal", "contribute", "--goal", "Holiday", "--amount", "10", "--method", "pix",
    ])
    .is_err());
    assert_eq!(db::load_transactions(&conn).unwrap().len(), 2);
}

#[test]
fn goal_names_are_unique_and_targets_positive() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 5, 20));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };

    run(&conn, &env, &["goal", "add", "--name", "House", "--target", "50000"]).unwrap();
    assert!(run(&conn, &env, &["goal", "add", "--name", "house", "--target", "100"]).is_err());
    assert!(run(&conn, &env, &["goal", "add", "--name", "Car", "--target", "0"]).is_err());
    assert_eq!(goals::progress_rows(&conn).unwrap().len(), 1);
}

#[test]
fn link_then_remove_keeps_transactions_as_manual() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 5, 20));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };

    run(&conn, &env, &["goal", "add", "--name", "Retirement", "--target", "1000"]).unwrap();
    run(&conn, &env, &[
        "tx", "add", "--type", "investment", "--amount", "250", "--date", "2024-05-02",
        "--description", "Index fund", "--category", "Investments", "--method", "pix",
    ])
    .unwrap();
    run(&conn, &env, &[
        "tx", "add", "--amount", "40", "--date", "2024-05-03", "--description", "Lunch",
        "--category", "Food", "--method", "pix",
    ])
    .unwrap();

    assert!(run(&conn, &env, &[
        "goal", "link", "--goal", "Retirement", "--tx", "id-2", "--tx", "id-3",
    ])
    .is_err());
    assert_eq!(goals::progress_rows(&conn).unwrap()[0].current, Decimal::ZERO);

    run(&conn, &env, &["goal", "link", "--goal", "Retirement", "--tx", "id-2"]).unwrap();
    let rows = goals::progress_rows(&conn).unwrap();
    assert_eq!(rows[0].current, Decimal::from(250));
    assert_eq!(rows[0].percent, Decimal::from(25));

    run(&conn, &env, &["goal", "rm", "--goal", "Retirement"]).unwrap();
    assert!(goals::progress_rows(&conn).unwrap().is_empty());
    let txs = db::load_transactions(&conn).unwrap();
    assert_eq!(txs.len(), 2);
    assert!(txs.iter().all(|t| t.origin == Origin::Manual));
}
