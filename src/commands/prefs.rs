// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::db;
use crate::models::CreditCardLogic;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let prefs = db::load_preferences(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &prefs)? {
                println!(
                    "{}",
                    pretty_table(
                        &["Setting", "Value"],
                        vec![vec![
                            "credit_card_logic".into(),
                            prefs.credit_card_logic.as_str().into(),
                        ]],
                    )
                );
            }
        }
        Some(("set", sub)) => {
            let logic: CreditCardLogic = sub.get_one::<String>("credit-card-logic").unwrap().parse()?;
            db::set_credit_card_logic(conn, logic)?;
            info!(credit_card_logic = logic.as_str(), "preference updated");
            println!("credit_card_logic = {}", logic.as_str());
        }
        _ => {}
    }
    Ok(())
}
