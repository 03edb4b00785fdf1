// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod support;

use cyclebook::clock::FixedClock;
use cyclebook::commands::Env;
use cyclebook::db;
use cyclebook::models::SequentialIdGenerator;
use rust_decimal::Decimal;
use support::{conn_with_methods, d, run};

#[test]
fn rename_reaches_every_place_a_category_is_stored() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 5, 2));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };

    run(&conn, &env, &[
        "tx", "add", "--amount", "80", "--date", "2024-05-01", "--description", "Market",
        "--category", "Groceries", "--method", "pix",
    ])
    .unwrap();
    run(&conn, &env, &[
        "sub", "add", "--name", "Box", "--amount", "45", "--category", "Groceries",
        "--method", "pix", "--start", "2024-01-15",
    ])
    .unwrap();
    run(&conn, &env, &["budget", "set", "--category", "Groceries", "--amount", "600"]).unwrap();
    run(&conn, &env, &[
        "plan", "set", "--month", "2024-05", "--income", "5000", "--expense", "Food=100",
    ])
    .unwrap();

    run(&conn, &env, &["category", "rename", "--from", "Groceries", "--to", "Food"]).unwrap();

    let txs = db::load_transactions(&conn).unwrap();
    assert_eq!(txs[0].category, "Food");
    let ledger = db::load_ledger(&conn).unwrap();
    assert_eq!(ledger.subscriptions[0].category, "Food");
    let budget = db::load_budget(&conn).unwrap();
    assert_eq!(budget.allocation("Food"), Some(Decimal::from(600)));
    assert_eq!(budget.allocations.len(), 1);
    let plan = &db::load_plans(&conn).unwrap()[0];
    assert_eq!(plan.planned.len(), 1);
    assert_eq!(plan.planned.get("Food"), Some(&Decimal::from(700)));
}

#[test]
fn rename_refuses_target_with_its_own_budget() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 5, 2));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };

    run(&conn, &env, &["budget", "set", "--category", "Groceries", "--amount", "600"]).unwrap();
    run(&conn, &env, &["budget", "set", "--category", "Food", "--amount", "300"]).unwrap();
    run(&conn, &env, &[
        "tx", "add", "--amount", "80", "--date", "2024-05-01", "--description", "Market",
        "--category", "Groceries", "--method", "pix",
    ])
    .unwrap();

    assert!(run(&conn, &env, &["category", "rename", "--from", "Groceries", "--to", "food"]).is_err());
    assert_eq!(db::load_transactions(&conn).unwrap()[0].category, "Groceries");
    assert!(run(&conn, &env, &["category", "rename", "--from", "Food", "--to", "Food"]).is_err());

    run(&conn, &env, &["category", "rename", "--from", "Groceries", "--to", "groceries"]).unwrap();
    let budget = db::load_budget(&conn).unwrap();
    assert_eq!(budget.allocation("groceries"), Some(Decimal::from(600)));
    assert_eq!(db::load_transactions(&conn).unwrap()[0].category, "groceries");
}
