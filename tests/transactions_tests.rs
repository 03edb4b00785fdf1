// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod support;

use cyclebook::clock::FixedClock;
use cyclebook::commands::{transactions, Env};
use cyclebook::db;
use cyclebook::models::SequentialIdGenerator;
use support::{conn_with_methods, d, leaf, run};

fn seed(conn: &rusqlite::Connection, env: &Env) {
    run(conn, env, &[
        "tx", "add", "--type", "income", "--amount", "5000", "--date", "2024-03-05",
        "--description", "Salary", "--category", "Salary", "--method", "pix",
    ])
    .unwrap();
    run(conn, env, &[
        "tx", "add", "--amount", "200", "--date", "2024-03-26", "--description", "Shoes",
        "--category", "Shopping", "--method", "visa",
    ])
    .unwrap();
    run(conn, env, &[
        "tx", "add", "--amount", "30", "--date", "2024-03-20", "--description", "Lunch",
        "--category", "Food", "--method", "Visa",
    ])
    .unwrap();
}

#[test]
fn add_resolves_payment_method_by_name() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    seed(&conn, &env);

    let stored = db::load_transactions(&conn).unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|t| t.payment_method.as_str() == "visa"
        || t.payment_method.as_str() == "pix"));

    let err = run(&conn, &env, &[
        "tx", "add", "--amount", "1", "--date", "2024-03-01", "--description", "x",
        "--category", "y", "--method", "Amex",
    ]);
    assert!(err.is_err());
}

#[test]
fn list_filters_by_effective_month() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    seed(&conn, &env);

    let march = transactions::query_rows(&conn, &leaf(&["tx", "list", "--month", "2024-03"])).unwrap();
    let names: Vec<&str> = march.iter().map(|r| r.description.as_str()).collect();
    assert_eq!(names, vec!["Lunch", "Salary"]);
    assert_eq!(march[0].effective_date, "2024-03-25");

    let april = transactions::query_rows(&conn, &leaf(&["tx", "list", "--month", "2024-04"])).unwrap();
    assert_eq!(april.len(), 1);
    assert_eq!(april[0].description, "Shoes");
    assert_eq!(april[0].date, "2024-03-26");
    assert_eq!(april[0].effective_date, "2024-04-25");
    assert_eq!(april[0].payment_method, "Visa");
}

#[test]
fn list_limit_and_type_filter() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    seed(&conn, &env);

    let rows = transactions::query_rows(&conn, &leaf(&["tx", "list", "--limit", "2"])).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].description, "Shoes");

    let income = transactions::query_rows(&conn, &leaf(&["tx", "list", "--type", "income"])).unwrap();
    assert_eq!(income.len(), 1);
    assert_eq!(income[0].amount, "5000.00");
}

#[test]
fn closing_day_preference_moves_card_expenses_to_due_month() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    seed(&conn, &env);
    run(&conn, &env, &["prefs", "set", "--credit-card-logic", "closing_day"]).unwrap();

    let may = transactions::query_rows(&conn, &leaf(&["tx", "list", "--month", "2024-05"])).unwrap();
    assert_eq!(may.len(), 1);
    assert_eq!(may[0].description, "Shoes");
    assert_eq!(may[0].effective_date, "2024-05-05");
}

#[test]
fn rm_deletes_and_reports_missing() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    seed(&conn, &env);

    run(&conn, &env, &["tx", "rm", "--id", "tx-2"]).unwrap();
    assert_eq!(db::load_transactions(&conn).unwrap().len(), 2);
    assert!(run(&conn, &env, &["tx", "rm", "--id", "tx-2"]).is_err());
}
