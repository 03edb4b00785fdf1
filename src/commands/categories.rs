// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

use crate::db;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("rename", sub)) => {
            let from = sub.get_one::<String>("from").unwrap().trim();
            let to = sub.get_one::<String>("to").unwrap().trim();
            if to.is_empty() {
                bail!("New category name must not be empty");
            }
            let renamed = db::rename_category(conn, from, to)?;
            info!(from, to, ?renamed, "category renamed");
            println!(
                "Renamed '{}' to '{}': {} transaction(s), {} subscription(s), {} budget(s), {} goal(s), {} plan line(s)",
                from,
                to,
                renamed.transactions,
                renamed.subscriptions,
                renamed.budgets,
                renamed.goals,
                renamed.plan_lines
            );
        }
        _ => {}
    }
    Ok(())
}
