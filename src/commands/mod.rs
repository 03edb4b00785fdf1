// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::calendar::YearMonth;
use crate::clock::Clock;
use crate::models::{IdGenerator, Reimbursement};
use crate::utils::parse_month;

pub mod methods;
pub mod transactions;
pub mod subscriptions;
pub mod invoices;
pub mod installments;
pub mod reports;
pub mod reimbursements;
pub mod budgets;
pub mod planning;
pub mod goals;
pub mod categories;
pub mod prefs;
pub mod exporter;
pub mod doctor;

/// Clock and id source shared by every handler that creates records or needs "today".
pub struct Env<'a> {
    pub clock: &'a dyn Clock,
    pub ids: &'a dyn IdGenerator,
}

/// `--month` if given, otherwise the current month.
pub(crate) fn month_or_current(m: &clap::ArgMatches, env: &Env) -> Result<YearMonth> {
    match m.get_one::<String>("month") {
        Some(s) => parse_month(s),
        None => Ok(env.clock.current_month()),
    }
}

/// Reimbursement terms from `--reimbursable` / `--debtor`.
pub(crate) fn reimbursement_terms(m: &clap::ArgMatches) -> Option<Reimbursement> {
    let debtor = m
        .get_one::<String>("debtor")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if debtor.is_some() || m.get_flag("reimbursable") {
        Some(Reimbursement::owed_by(debtor))
    } else {
        None
    }
}
