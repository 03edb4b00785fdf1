// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod support;

use cyclebook::clock::FixedClock;
use cyclebook::commands::{budgets, Env};
use cyclebook::db;
use cyclebook::models::SequentialIdGenerator;
use rust_decimal::Decimal;
use support::{conn_with_methods, d, leaf, run};

#[test]
fn salary_and_allocations_persist() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 15));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };

    run(&conn, &env, &["budget", "salary", "--amount", "5000"]).unwrap();
    run(&conn, &env, &["budget", "set", "--category", "Food", "--amount", "800"]).unwrap();
    run(&conn, &env, &["budget", "set", "--category", "Home", "--amount", "2000"]).unwrap();
    run(&conn, &env, &["budget", "set", "--category", "food", "--amount", "900"]).unwrap();

    let budget = db::load_budget(&conn).unwrap();
    assert_eq!(budget.salary, Some(Decimal::from(5000)));
    assert_eq!(budget.allocations.len(), 2);
    assert_eq!(budget.allocation("Food"), Some(Decimal::from(900)));
    assert_eq!(budget.unallocated(), Some(Decimal::from(2100)));

    assert!(run(&conn, &env, &["budget", "set", "--category", "Food", "--amount", "0"]).is_err());
    assert!(run(&conn, &env, &["budget", "salary", "--amount", "abc"]).is_err());

    run(&conn, &env, &["budget", "rm", "--category", "HOME"]).unwrap();
    assert_eq!(db::load_budget(&conn).unwrap().allocations.len(), 1);
    assert!(run(&conn, &env, &["budget", "rm", "--category", "Home"]).is_err());
}

#[test]
fn report_counts_card_spending_in_its_effective_month() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 4, 1));
    let ids = SequentialIdGenerator::new("id");
    let env = Env { clock: &clock, ids: &ids };

    run(&conn, &env, &["budget", "set", "--category", "Food", "--amount", "500"]).unwrap();
    run(&conn, &env, &["budget", "set", "--category", "Leisure", "--amount", "200"]).unwrap();
    for (amount, date, method, category) in [
        ("300", "2024-03-04", "pix", "Food"),
        ("150", "2024-02-27", "visa", "Food"),
        ("999", "2024-03-28", "visa", "Food"),
        ("50", "2024-03-09", "pix", "Leisure"),
        ("70", "2024-03-12", "pix", "Transport"),
    ] {
        run(&conn, &env, &[
            "tx", "add", "--amount", amount, "--date", date, "--description", "Spend",
            "--category", category, "--method", method,
        ])
        .unwrap();
    }

    let (budget, lines) =
        budgets::report_lines(&conn, &env, &leaf(&["budget", "report", "--month", "2024-03"])).unwrap();
    assert_eq!(budget.total_budgeted(), Decimal::from(700));

    let seen: Vec<(&str, Decimal, Decimal, bool)> = lines
        .iter()
        .map(|l| (l.category.as_str(), l.spent, l.remaining, l.over_budget))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("Food", Decimal::from(450), Decimal::from(50), false),
            ("Leisure", Decimal::from(50), Decimal::from(150), false),
        ]
    );
    assert_eq!(lines[0].percentage, Decimal::from(90));

    let (_, april) =
        budgets::report_lines(&conn, &env, &leaf(&["budget", "report", "--month", "2024-04"])).unwrap();
    assert!(april[0].over_budget);
    assert_eq!(april[0].spent, Decimal::from(999));
}
