// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cyclebook::clock::SystemClock;
use cyclebook::commands::{self, Env};
use cyclebook::models::UuidIdGenerator;
use cyclebook::{cli, db};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let conn = db::open_or_init()?;
    let env = Env {
        clock: &SystemClock,
        ids: &UuidIdGenerator,
    };

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("method", sub)) => commands::methods::handle(&conn, &env, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, &env, sub)?,
        Some(("sub", sub)) => commands::subscriptions::handle(&conn, &env, sub)?,
        Some(("invoice", sub)) => commands::invoices::handle(&conn, &env, sub)?,
        Some(("installment", sub)) => commands::installments::handle(&conn, &env, sub)?,
        Some(("summary", sub)) => commands::reports::summary(&conn, &env, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, &env, sub)?,
        Some(("reimburse", sub)) => commands::reimbursements::handle(&conn, &env, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, &env, sub)?,
        Some(("plan", sub)) => commands::planning::handle(&conn, &env, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&conn, &env, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("prefs", sub)) => commands::prefs::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
