// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

use crate::installments::MAX_INSTALLMENTS;

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn required(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn optional(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn month_arg() -> Arg {
    optional("month", "Month as YYYY-MM (defaults to the current month)")
}

fn debtor_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("reimbursable")
            .long("reimbursable")
            .action(ArgAction::SetTrue)
            .help("Someone owes this back"),
    )
    .arg(
        optional("debtor", "Who owes it back (implies --reimbursable)"),
    )
}

fn method_cmd() -> Command {
    Command::new("method")
        .about("Manage payment methods")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Add a payment method")
                .arg(required("name", "Display name"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("other")
                        .value_parser(["credit_card", "other"])
                        .help("Kind of payment method"),
                )
                .arg(
                    optional("closing-day", "Invoice closing day (credit cards)")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    optional("due-day", "Invoice due day (credit cards)")
                        .value_parser(value_parser!(u32)),
                ),
        )
        .subcommand(json_flags(Command::new("list").about("List payment methods")))
        .subcommand(
            Command::new("rm")
                .about("Remove a payment method")
                .arg(required("name", "Name or id"))
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Remove even if transactions or subscriptions use it"),
                ),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and browse transactions")
        .subcommand_required(true)
        .subcommand(debtor_args(
            Command::new("add")
                .about("Record a transaction")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("expense")
                        .value_parser(["expense", "income", "investment"]),
                )
                .arg(required("amount", "Positive amount"))
                .arg(required("date", "Date as YYYY-MM-DD"))
                .arg(required("description", "What it was"))
                .arg(required("category", "Category"))
                .arg(required("method", "Payment method name or id")),
        ))
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions")
                .arg(optional(
                    "month",
                    "Only transactions whose effective date falls in YYYY-MM",
                ))
                .arg(optional("method", "Filter by payment method"))
                .arg(optional("category", "Filter by category"))
                .arg(
                    optional("type", "Filter by type")
                        .value_parser(["expense", "income", "investment"]),
                )
                .arg(optional("limit", "Show at most N rows").value_parser(value_parser!(usize))),
        ))
        .subcommand(
            Command::new("rm")
                .about("Delete a transaction")
                .arg(required("id", "Transaction id")),
        )
}

fn sub_cmd() -> Command {
    Command::new("sub")
        .about("Recurring subscriptions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Add a subscription billed monthly on the start date's day")
                .arg(required("name", "Name"))
                .arg(required("amount", "Monthly amount"))
                .arg(required("category", "Category"))
                .arg(required("method", "Payment method name or id"))
                .arg(required("start", "First billing date as YYYY-MM-DD"))
                .arg(optional("until", "Last day it can bill, YYYY-MM-DD"))
                .arg(optional("debtor", "Someone who reimburses it")),
        )
        .subcommand(json_flags(Command::new("list").about("List subscriptions")))
        .subcommand(
            Command::new("edit")
                .about("Change a subscription; omitted fields keep their value")
                .arg(required("id", "Subscription id"))
                .arg(optional("name", "New name"))
                .arg(optional("amount", "New monthly amount"))
                .arg(optional("category", "New category"))
                .arg(optional("method", "New payment method name or id"))
                .arg(optional("start", "New first billing date as YYYY-MM-DD"))
                .arg(optional("until", "Last day it can bill, YYYY-MM-DD"))
                .arg(
                    Arg::new("indefinite")
                        .long("indefinite")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("until")
                        .help("Remove the end date"),
                )
                .arg(optional("debtor", "Someone who reimburses it"))
                .arg(
                    Arg::new("no-debtor")
                        .long("no-debtor")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("debtor")
                        .help("Nobody reimburses it any more"),
                ),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a subscription")
                .arg(required("id", "Subscription id")),
        )
        .subcommand(json_flags(
            Command::new("pending")
                .about("Occurrences counted in a month but not launched yet")
                .arg(month_arg()),
        ))
        .subcommand(
            Command::new("launch")
                .about("Record the pending occurrence as a real expense")
                .arg(required("id", "Subscription id"))
                .arg(month_arg()),
        )
}

fn installment_cmd() -> Command {
    let plan = |cmd: Command| {
        cmd.arg(required("title", "Purchase title"))
            .arg(required("total", "Total amount"))
            .arg(
                required("count", "Number of installments")
                    .value_parser(value_parser!(u32).range(1..=i64::from(MAX_INSTALLMENTS))),
            )
            .arg(required("start", "First installment date as YYYY-MM-DD"))
            .arg(required("category", "Category"))
            .arg(required("method", "Payment method name or id"))
    };
    Command::new("installment")
        .about("Purchases split into monthly installments")
        .subcommand_required(true)
        .subcommand(debtor_args(plan(
            Command::new("add").about("Create an installment purchase"),
        )))
        .subcommand(json_flags(Command::new("list").about("List installment groups")))
        .subcommand(
            plan(
                Command::new("edit")
                    .about("Regenerate every installment of a group")
                    .arg(required("group", "Group id")),
            )
            .arg(optional("debtor", "Set who owes it back"))
            .arg(
                Arg::new("not-reimbursable")
                    .long("not-reimbursable")
                    .action(ArgAction::SetTrue)
                    .conflicts_with("debtor")
                    .help("Clear reimbursement terms"),
            ),
        )
        .subcommand(
            Command::new("rename")
                .about("Change title and category of every installment")
                .arg(required("group", "Group id"))
                .arg(required("title", "New title"))
                .arg(required("category", "New category")),
        )
        .subcommand(
            Command::new("anticipate")
                .about("Pay off upcoming installments today")
                .arg(required("group", "Group id"))
                .arg(
                    required("count", "How many upcoming installments")
                        .value_parser(value_parser!(usize)),
                )
                .arg(required("amount", "Amount paid to settle them")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete every installment of a group")
                .arg(required("group", "Group id")),
        )
}

fn reimburse_cmd() -> Command {
    Command::new("reimburse")
        .about("Money other people owe you")
        .subcommand_required(true)
        .subcommand(json_flags(
            Command::new("list").about("Outstanding reimbursements by debtor"),
        ))
        .subcommand(
            Command::new("mark")
                .about("Record that an expense was paid back today")
                .arg(required("id", "Expense id")),
        )
        .subcommand(
            Command::new("undo")
                .about("Reverse a recorded reimbursement")
                .arg(required("id", "Expense id")),
        )
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly budget per category")
        .subcommand_required(true)
        .subcommand(
            Command::new("set")
                .about("Set a category's monthly budget")
                .arg(required("category", "Category"))
                .arg(required("amount", "Monthly amount")),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove a category's budget")
                .arg(required("category", "Category")),
        )
        .subcommand(
            Command::new("salary")
                .about("Set the salary budgets are carved from")
                .arg(required("amount", "Monthly salary")),
        )
        .subcommand(json_flags(Command::new("list").about("Budgets, salary and unallocated amount")))
        .subcommand(json_flags(
            Command::new("report")
                .about("Budget against what counts in a month")
                .arg(month_arg()),
        ))
}

fn plan_cmd() -> Command {
    Command::new("plan")
        .about("Monthly planning: expected income and planned spending")
        .subcommand_required(true)
        .subcommand(
            Command::new("set")
                .about("Create or update the plan for a month (new plans start from the budget)")
                .arg(month_arg())
                .arg(optional("income", "Expected income"))
                .arg(
                    optional("expense", "Planned spending as CATEGORY=AMOUNT; 0 removes the line")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(json_flags(
            Command::new("show")
                .about("Planned against actual for a month")
                .arg(month_arg()),
        ))
        .subcommand(json_flags(Command::new("list").about("Every saved plan")))
        .subcommand(
            Command::new("rm")
                .about("Delete the plan for a month")
                .arg(required("month", "Month as YYYY-MM")),
        )
}

fn goal_cmd() -> Command {
    let movement = |cmd: Command| {
        cmd.arg(required("goal", "Goal name or id"))
            .arg(required("amount", "Amount"))
            .arg(required("method", "Payment method name or id"))
    };
    Command::new("goal")
        .about("Investment goals")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create an investment goal")
                .arg(required("name", "Name"))
                .arg(required("target", "Target amount"))
                .arg(
                    Arg::new("category")
                        .long("category")
                        .default_value("Investments")
                        .help("Category of the goal"),
                )
                .arg(optional("deadline", "Deadline as YYYY-MM-DD"))
                .arg(
                    Arg::new("initial")
                        .long("initial")
                        .default_value("0")
                        .help("Amount already saved"),
                ),
        )
        .subcommand(json_flags(Command::new("list").about("Goals and their progress")))
        .subcommand(movement(
            Command::new("contribute").about("Invest into a goal today"),
        ))
        .subcommand(movement(
            Command::new("withdraw").about("Take money out of a goal today as income"),
        ))
        .subcommand(
            Command::new("earn")
                .about("Add returns earned by a goal")
                .arg(required("goal", "Goal name or id"))
                .arg(required("amount", "Amount earned")),
        )
        .subcommand(
            Command::new("link")
                .about("Count existing investment transactions toward a goal")
                .arg(required("goal", "Goal name or id"))
                .arg(
                    required("tx", "Investment transaction id (repeatable)")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a goal; its transactions stay as manual entries")
                .arg(required("goal", "Goal name or id")),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Categories")
        .subcommand_required(true)
        .subcommand(
            Command::new("rename")
                .about("Rename a category on transactions, subscriptions, budgets, goals and plans")
                .arg(required("from", "Current name"))
                .arg(required("to", "New name")),
        )
}

pub fn build_cli() -> Command {
    Command::new("cyclebook")
        .version(clap::crate_version!())
        .about("Personal finance ledger that follows credit card billing cycles")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(method_cmd())
        .subcommand(tx_cmd())
        .subcommand(sub_cmd())
        .subcommand(json_flags(
            Command::new("invoice")
                .about("Credit card invoice for the cycle closing in a month")
                .arg(optional("card", "Card name or id (all cards when omitted)"))
                .arg(month_arg()),
        ))
        .subcommand(installment_cmd())
        .subcommand(json_flags(
            Command::new("summary")
                .about("Income, expenses and balance per month")
                .arg(month_arg())
                .arg(
                    Arg::new("months")
                        .long("months")
                        .default_value("1")
                        .value_parser(value_parser!(u32).range(1..=36))
                        .help("Number of consecutive months to show"),
                ),
        ))
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("categories")
                        .about("Expenses by category and month")
                        .arg(required("from", "First month, YYYY-MM"))
                        .arg(required("to", "Last month, YYYY-MM")),
                )),
        )
        .subcommand(reimburse_cmd())
        .subcommand(budget_cmd())
        .subcommand(plan_cmd())
        .subcommand(goal_cmd())
        .subcommand(category_cmd())
        .subcommand(
            Command::new("prefs")
                .about("User preferences")
                .subcommand_required(true)
                .subcommand(json_flags(Command::new("show").about("Show preferences")))
                .subcommand(
                    Command::new("set").about("Change preferences").arg(
                        Arg::new("credit-card-logic")
                            .long("credit-card-logic")
                            .required(true)
                            .value_parser(["transaction_date", "closing_day"])
                            .help("Attribute card expenses to the closing month or the due month"),
                    ),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand_required(true)
                .subcommand(
                    Command::new("transactions")
                        .about("Write every transaction with its effective date")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv or json"),
                        )
                        .arg(required("out", "Output file")),
                ),
        )
        .subcommand(Command::new("doctor").about("Check the data for inconsistencies"))
}
