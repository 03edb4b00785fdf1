// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod support;

use cyclebook::clock::FixedClock;
use cyclebook::commands::{installments, Env};
use cyclebook::db;
use cyclebook::models::{Origin, SequentialIdGenerator};
use rust_decimal::Decimal;
use support::{conn_with_methods, d, run};

fn add_phone(conn: &rusqlite::Connection, env: &Env) {
    run(conn, env, &[
        "installment", "add", "--title", "Phone", "--total", "600", "--count", "6",
        "--start", "2024-02-10", "--category", "Electronics", "--method", "pix",
        "--debtor", "Ana",
    ])
    .unwrap();
}

#[test]
fn add_creates_dated_members_sharing_a_group() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };
    add_phone(&conn, &env);

    let txs = db::load_transactions(&conn).unwrap();
    assert_eq!(txs.len(), 6);
    assert!(txs.iter().all(|t| t.group_id.as_ref().map(|g| g.as_str()) == Some("id-1")));
    assert_eq!(txs[0].description, "Phone (1/6)");
    assert_eq!(txs[5].description, "Phone (6/6)");
    assert_eq!(txs[5].date, d(2024, 7, 10));
    assert_eq!(
        txs[0].reimbursement.as_ref().and_then(|r| r.debtor.as_deref()),
        Some("Ana")
    );

    let rows = installments::query_rows(&conn, &env).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Phone");
    assert_eq!(rows[0].installments, 6);
    assert_eq!(rows[0].remaining_installments, 4);
    assert_eq!(rows[0].paid, "200.00");
    assert_eq!(rows[0].progress, "33%");
}

#[test]
fn anticipate_settles_upcoming_installments() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };
    add_phone(&conn, &env);

    run(&conn, &env, &[
        "installment", "anticipate", "--group", "id-1", "--count", "2", "--amount", "180",
    ])
    .unwrap();

    let txs = db::load_transactions(&conn).unwrap();
    assert_eq!(txs.len(), 5);
    let total: Decimal = txs.iter().map(|t| t.amount).sum();
    assert_eq!(total, Decimal::from(580));

    let settlement = txs.iter().find(|t| t.origin == Origin::Anticipation).unwrap();
    assert_eq!(settlement.date, d(2024, 3, 15));
    assert_eq!(settlement.description, "Anticipation (2 inst.): Phone");

    let mut future: Vec<_> = txs
        .iter()
        .filter(|t| t.date > d(2024, 3, 15))
        .map(|t| t.date)
        .collect();
    future.sort();
    assert_eq!(future, vec![d(2024, 4, 10), d(2024, 5, 10)]);

    let rows = installments::query_rows(&conn, &env).unwrap();
    assert_eq!(rows[0].remaining, "200.00");
}

#[test]
fn anticipate_with_zero_count_changes_nothing() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };
    add_phone(&conn, &env);
    let before = db::load_transactions(&conn).unwrap();

    run(&conn, &env, &[
        "installment", "anticipate", "--group", "id-1", "--count", "0", "--amount", "180",
    ])
    .unwrap();
    assert_eq!(db::load_transactions(&conn).unwrap(), before);
}

#[test]
fn edit_rename_and_remove_group() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };
    add_phone(&conn, &env);

    run(&conn, &env, &[
        "installment", "edit", "--group", "id-1", "--title", "Phone", "--total", "100",
        "--count", "3", "--start", "2024-02-10", "--category", "Electronics", "--method", "visa",
    ])
    .unwrap();
    let txs = db::load_transactions(&conn).unwrap();
    let amounts: Vec<Decimal> = txs.iter().map(|t| t.amount).collect();
    assert_eq!(
        amounts,
        vec![Decimal::new(3333, 2), Decimal::new(3333, 2), Decimal::new(3334, 2)]
    );
    assert!(txs.iter().all(|t| t.payment_method.as_str() == "visa"));
    assert!(txs
        .iter()
        .all(|t| t.reimbursement.as_ref().and_then(|r| r.debtor.as_deref()) == Some("Ana")));

    run(&conn, &env, &[
        "installment", "rename", "--group", "id-1", "--title", "Smartphone", "--category", "Gadgets",
    ])
    .unwrap();
    let txs = db::load_transactions(&conn).unwrap();
    assert_eq!(txs[1].description, "Smartphone (2/3)");
    assert!(txs.iter().all(|t| t.category == "Gadgets"));

    run(&conn, &env, &["installment", "rm", "--group", "id-1"]).unwrap();
    assert!(db::load_transactions(&conn).unwrap().is_empty());
    assert!(run(&conn, &env, &["installment", "rm", "--group", "id-1"]).is_err());
}
