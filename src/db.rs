// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::budget::Budget;
use crate::calendar::YearMonth;
use crate::goals::InvestmentGoal;
use crate::models::{
    CreditCardLogic, Id, Ledger, Lifetime, Origin, PaymentMethod, PaymentMethodKind,
    Reimbursement, Subscription, Transaction, UserPreferences,
};
use crate::planning::PlanningProfile;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Cyclebook", "cyclebook"));

/// Environment variable overriding the database location.
pub const DB_ENV: &str = "CYCLEBOOK_DB";

const CREDIT_CARD_LOGIC_KEY: &str = "credit_card_logic";
const SALARY_KEY: &str = "salary";

pub fn db_path() -> Result<PathBuf> {
    if let Some(custom) = std::env::var_os(DB_ENV).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(custom);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        return Ok(path);
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("cyclebook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS payment_methods(
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        type TEXT NOT NULL CHECK(type IN ('credit_card','other')),
        closing_day INTEGER,
        due_day INTEGER
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('expense','income','investment')),
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        payment_method_id TEXT NOT NULL,
        group_id TEXT,
        origin TEXT NOT NULL DEFAULT 'manual',
        origin_ref TEXT,      -- subscription, reimbursed expense or goal id
        origin_month TEXT,    -- nominal billing month of a launched subscription
        reimbursable INTEGER NOT NULL DEFAULT 0,
        debtor TEXT,
        reimbursed_by TEXT,   -- id of the income that paid it back
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_group ON transactions(group_id);

    CREATE TABLE IF NOT EXISTS subscriptions(
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        amount TEXT NOT NULL,
        category TEXT NOT NULL,
        payment_method_id TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT,
        debtor TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS budgets(
        category TEXT PRIMARY KEY COLLATE NOCASE,
        amount TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS goals(
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        target TEXT NOT NULL,
        category TEXT NOT NULL,
        deadline TEXT,
        initial_amount TEXT NOT NULL DEFAULT '0',
        earnings TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS planning_profiles(
        id TEXT PRIMARY KEY,
        month TEXT NOT NULL UNIQUE,
        expected_income TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS planning_lines(
        profile_id TEXT NOT NULL REFERENCES planning_profiles(id) ON DELETE CASCADE,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        PRIMARY KEY(profile_id, category)
    );
    "#,
    )?;
    Ok(())
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Corrupt date '{}'", s))
}

fn parse_stored_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Corrupt amount '{}'", s))
}

// Settings

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn load_preferences(conn: &Connection) -> Result<UserPreferences> {
    let credit_card_logic = match get_setting(conn, CREDIT_CARD_LOGIC_KEY)? {
        Some(v) => v.parse::<CreditCardLogic>()?,
        None => CreditCardLogic::default(),
    };
    Ok(UserPreferences { credit_card_logic })
}

pub fn set_credit_card_logic(conn: &Connection, logic: CreditCardLogic) -> Result<()> {
    set_setting(conn, CREDIT_CARD_LOGIC_KEY, logic.as_str())
}

// Payment methods

pub fn load_payment_methods(conn: &Connection) -> Result<Vec<PaymentMethod>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, closing_day, due_day FROM payment_methods ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<u32>>(3)?,
            r.get::<_, Option<u32>>(4)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, kind, closing, due) = row?;
        let pm = match (kind.as_str(), closing, due) {
            ("credit_card", Some(c), Some(d)) => {
                PaymentMethod::credit_card(Id::from_string(id), name, c, d)?
            }
            ("credit_card", _, _) => {
                return Err(anyhow!("Credit card '{}' is missing its closing/due day", name));
            }
            _ => PaymentMethod::other(Id::from_string(id), name),
        };
        out.push(pm);
    }
    Ok(out)
}

pub fn insert_payment_method(conn: &Connection, pm: &PaymentMethod) -> Result<()> {
    let (closing, due) = match pm.kind {
        PaymentMethodKind::CreditCard {
            closing_day,
            due_day,
        } => (Some(closing_day), Some(due_day)),
        PaymentMethodKind::Other => (None, None),
    };
    conn.execute(
        "INSERT INTO payment_methods(id, name, type, closing_day, due_day) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![pm.id.as_str(), pm.name, pm.type_str(), closing, due],
    )
    .with_context(|| format!("Payment method '{}' already exists", pm.name))?;
    Ok(())
}

pub fn delete_payment_method(conn: &Connection, id: &Id) -> Result<bool> {
    let n = conn.execute("DELETE FROM payment_methods WHERE id=?1", params![id.as_str()])?;
    Ok(n > 0)
}

/// Transactions and subscriptions still pointing at payment method `id`.
pub fn payment_method_usage(conn: &Connection, id: &Id) -> Result<i64> {
    let n: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM transactions WHERE payment_method_id=?1)
              + (SELECT COUNT(*) FROM subscriptions WHERE payment_method_id=?1)",
        params![id.as_str()],
        |r| r.get(0),
    )?;
    Ok(n)
}

// Transactions

struct TransactionRow {
    id: String,
    date: String,
    amount: String,
    kind: String,
    category: String,
    description: String,
    payment_method: String,
    group_id: Option<String>,
    origin: String,
    origin_ref: Option<String>,
    origin_month: Option<String>,
    reimbursable: bool,
    debtor: Option<String>,
    reimbursed_by: Option<String>,
}

impl TransactionRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            date: r.get(1)?,
            amount: r.get(2)?,
            kind: r.get(3)?,
            category: r.get(4)?,
            description: r.get(5)?,
            payment_method: r.get(6)?,
            group_id: r.get(7)?,
            origin: r.get(8)?,
            origin_ref: r.get(9)?,
            origin_month: r.get(10)?,
            reimbursable: r.get(11)?,
            debtor: r.get(12)?,
            reimbursed_by: r.get(13)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction> {
        let origin = decode_origin(&self.origin, self.origin_ref, self.origin_month)
            .with_context(|| format!("Transaction {}", self.id))?;
        let reimbursement = self.reimbursable.then(|| Reimbursement {
            debtor: self.debtor,
            received: self.reimbursed_by.map(Id::from_string),
        });
        Ok(Transaction {
            amount: parse_stored_decimal(&self.amount)?,
            date: parse_stored_date(&self.date)?,
            kind: self.kind.parse()?,
            id: Id::from_string(self.id),
            category: self.category,
            description: self.description,
            payment_method: Id::from_string(self.payment_method),
            group_id: self.group_id.map(Id::from_string),
            origin,
            reimbursement,
        })
    }
}

fn encode_origin(origin: &Origin) -> (Option<String>, Option<String>) {
    match origin {
        Origin::Manual | Origin::Anticipation => (None, None),
        Origin::Subscription {
            subscription_id,
            month,
        } => (Some(subscription_id.to_string()), Some(month.to_string())),
        Origin::Reimbursement { expense_id } => (Some(expense_id.to_string()), None),
        Origin::Contribution { goal_id } | Origin::Withdrawal { goal_id } => {
            (Some(goal_id.to_string()), None)
        }
    }
}

fn decode_origin(kind: &str, reference: Option<String>, month: Option<String>) -> Result<Origin> {
    let origin = match kind {
        "manual" => Origin::Manual,
        "anticipation" => Origin::Anticipation,
        "subscription" => Origin::Subscription {
            subscription_id: Id::from_string(reference.context("subscription origin without id")?),
            month: month
                .context("subscription origin without month")?
                .parse::<YearMonth>()?,
        },
        "reimbursement" => Origin::Reimbursement {
            expense_id: Id::from_string(reference.context("reimbursement origin without expense")?),
        },
        "contribution" => Origin::Contribution {
            goal_id: Id::from_string(reference.context("contribution origin without goal")?),
        },
        "withdrawal" => Origin::Withdrawal {
            goal_id: Id::from_string(reference.context("withdrawal origin without goal")?),
        },
        other => return Err(anyhow!("Unknown origin '{}'", other)),
    };
    Ok(origin)
}

const TRANSACTION_COLUMNS: &str = "id, date, amount, type, category, description, payment_method_id, \
     group_id, origin, origin_ref, origin_month, reimbursable, debtor, reimbursed_by";

pub fn load_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {} FROM transactions ORDER BY date, created_at, id",
        TRANSACTION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], TransactionRow::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_transaction()?);
    }
    Ok(out)
}

/// Insert or overwrite a transaction by id.
pub fn save_transaction(conn: &Connection, t: &Transaction) -> Result<()> {
    let (origin_ref, origin_month) = encode_origin(&t.origin);
    let sql = format!(
        "INSERT INTO transactions({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(id) DO UPDATE SET
            date=excluded.date, amount=excluded.amount, type=excluded.type,
            category=excluded.category, description=excluded.description,
            payment_method_id=excluded.payment_method_id, group_id=excluded.group_id,
            origin=excluded.origin, origin_ref=excluded.origin_ref,
            origin_month=excluded.origin_month, reimbursable=excluded.reimbursable,
            debtor=excluded.debtor, reimbursed_by=excluded.reimbursed_by",
        TRANSACTION_COLUMNS
    );
    conn.execute(
        &sql,
        params![
            t.id.as_str(),
            t.date.to_string(),
            t.amount.to_string(),
            t.kind.as_str(),
            t.category,
            t.description,
            t.payment_method.as_str(),
            t.group_id.as_ref().map(|g| g.to_string()),
            t.origin.as_str(),
            origin_ref,
            origin_month,
            t.reimbursement.is_some(),
            t.reimbursement.as_ref().and_then(|r| r.debtor.clone()),
            t.reimbursement
                .as_ref()
                .and_then(|r| r.received.as_ref())
                .map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

pub fn delete_transaction(conn: &Connection, id: &Id) -> Result<bool> {
    let n = conn.execute("DELETE FROM transactions WHERE id=?1", params![id.as_str()])?;
    Ok(n > 0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Persist the difference between two versions of the transaction list in a
/// single SQLite transaction.
pub fn apply_changes(
    conn: &Connection,
    before: &[Transaction],
    after: &[Transaction],
) -> Result<ChangeSet> {
    let old: HashMap<&Id, &Transaction> = before.iter().map(|t| (&t.id, t)).collect();
    let kept: HashSet<&Id> = after.iter().map(|t| &t.id).collect();
    let mut changes = ChangeSet::default();

    let tx = conn.unchecked_transaction()?;
    for t in before.iter().filter(|t| !kept.contains(&t.id)) {
        delete_transaction(&tx, &t.id)?;
        changes.deleted += 1;
    }
    for t in after {
        match old.get(&t.id) {
            Some(prev) if *prev == t => {}
            Some(_) => {
                save_transaction(&tx, t)?;
                changes.updated += 1;
            }
            None => {
                save_transaction(&tx, t)?;
                changes.inserted += 1;
            }
        }
    }
    tx.commit()?;
    debug!(?changes, "transactions persisted");
    Ok(changes)
}

// Subscriptions

pub fn load_subscriptions(conn: &Connection) -> Result<Vec<Subscription>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, amount, category, payment_method_id, start_date, end_date, debtor
         FROM subscriptions ORDER BY name, id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, Option<String>>(6)?,
            r.get::<_, Option<String>>(7)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, amount, category, pm, start, end, debtor) = row?;
        let lifetime = match end {
            Some(e) => Lifetime::Until(parse_stored_date(&e)?),
            None => Lifetime::Indefinite,
        };
        out.push(Subscription {
            id: Id::from_string(id),
            name,
            amount: parse_stored_decimal(&amount)?,
            category,
            payment_method: Id::from_string(pm),
            start_date: parse_stored_date(&start)?,
            lifetime,
            debtor,
        });
    }
    Ok(out)
}

fn end_date(lifetime: Lifetime) -> Option<String> {
    match lifetime {
        Lifetime::Indefinite => None,
        Lifetime::Until(d) => Some(d.to_string()),
    }
}

pub fn insert_subscription(conn: &Connection, s: &Subscription) -> Result<()> {
    let end = end_date(s.lifetime);
    conn.execute(
        "INSERT INTO subscriptions(id, name, amount, category, payment_method_id, start_date, end_date, debtor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            s.id.as_str(),
            s.name,
            s.amount.to_string(),
            s.category,
            s.payment_method.as_str(),
            s.start_date.to_string(),
            end,
            s.debtor
        ],
    )?;
    Ok(())
}

/// Overwrite every field of subscription `s.id`. False when it does not exist.
pub fn update_subscription(conn: &Connection, s: &Subscription) -> Result<bool> {
    let n = conn.execute(
        "UPDATE subscriptions SET name=?2, amount=?3, category=?4, payment_method_id=?5,
            start_date=?6, end_date=?7, debtor=?8
         WHERE id=?1",
        params![
            s.id.as_str(),
            s.name,
            s.amount.to_string(),
            s.category,
            s.payment_method.as_str(),
            s.start_date.to_string(),
            end_date(s.lifetime),
            s.debtor
        ],
    )?;
    Ok(n > 0)
}

pub fn delete_subscription(conn: &Connection, id: &Id) -> Result<bool> {
    let n = conn.execute("DELETE FROM subscriptions WHERE id=?1", params![id.as_str()])?;
    Ok(n > 0)
}

// Budget

pub fn load_budget(conn: &Connection) -> Result<Budget> {
    let salary = get_setting(conn, SALARY_KEY)?
        .map(|v| parse_stored_decimal(&v))
        .transpose()?;
    let mut stmt = conn.prepare("SELECT category, amount FROM budgets ORDER BY category")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    let mut allocations = BTreeMap::new();
    for row in rows {
        let (category, amount) = row?;
        allocations.insert(category, parse_stored_decimal(&amount)?);
    }
    Ok(Budget {
        salary,
        allocations,
    })
}

pub fn set_budget(conn: &Connection, category: &str, amount: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO budgets(category, amount) VALUES (?1, ?2)
         ON CONFLICT(category) DO UPDATE SET amount=excluded.amount",
        params![category, amount.to_string()],
    )?;
    Ok(())
}

pub fn delete_budget(conn: &Connection, category: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM budgets WHERE category=?1", params![category])?;
    Ok(n > 0)
}

pub fn set_salary(conn: &Connection, amount: Decimal) -> Result<()> {
    set_setting(conn, SALARY_KEY, &amount.to_string())
}

// Goals

pub fn load_goals(conn: &Connection) -> Result<Vec<InvestmentGoal>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, target, category, deadline, initial_amount, earnings
         FROM goals ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, target, category, deadline, initial, earnings) = row?;
        out.push(InvestmentGoal {
            id: Id::from_string(id),
            name,
            target: parse_stored_decimal(&target)?,
            category,
            deadline: deadline.as_deref().map(parse_stored_date).transpose()?,
            initial_amount: parse_stored_decimal(&initial)?,
            earnings: parse_stored_decimal(&earnings)?,
        });
    }
    Ok(out)
}

/// Insert or overwrite a goal by id.
pub fn save_goal(conn: &Connection, g: &InvestmentGoal) -> Result<()> {
    conn.execute(
        "INSERT INTO goals(id, name, target, category, deadline, initial_amount, earnings)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            name=excluded.name, target=excluded.target, category=excluded.category,
            deadline=excluded.deadline, initial_amount=excluded.initial_amount,
            earnings=excluded.earnings",
        params![
            g.id.as_str(),
            g.name,
            g.target.to_string(),
            g.category,
            g.deadline.map(|d| d.to_string()),
            g.initial_amount.to_string(),
            g.earnings.to_string(),
        ],
    )
    .with_context(|| format!("Goal '{}' already exists", g.name))?;
    Ok(())
}

pub fn delete_goal(conn: &Connection, id: &Id) -> Result<bool> {
    let n = conn.execute("DELETE FROM goals WHERE id=?1", params![id.as_str()])?;
    Ok(n > 0)
}

// Planning

pub fn load_plans(conn: &Connection) -> Result<Vec<PlanningProfile>> {
    let mut stmt =
        conn.prepare("SELECT id, month, expected_income FROM planning_profiles ORDER BY month")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, month, income) = row?;
        out.push(PlanningProfile {
            id: Id::from_string(id),
            month: month.parse::<YearMonth>()?,
            expected_income: parse_stored_decimal(&income)?,
            planned: BTreeMap::new(),
        });
    }

    let mut stmt = conn.prepare("SELECT profile_id, category, amount FROM planning_lines")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (profile_id, category, amount) = row?;
        if let Some(p) = out.iter_mut().find(|p| p.id.as_str() == profile_id) {
            p.planned.insert(category, parse_stored_decimal(&amount)?);
        }
    }
    Ok(out)
}

/// Store a plan and replace its lines. Another plan for the same month is an error.
pub fn save_plan(conn: &Connection, p: &PlanningProfile) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO planning_profiles(id, month, expected_income) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET month=excluded.month, expected_income=excluded.expected_income",
        params![p.id.as_str(), p.month.to_string(), p.expected_income.to_string()],
    )
    .with_context(|| format!("A plan for {} already exists", p.month))?;
    tx.execute(
        "DELETE FROM planning_lines WHERE profile_id=?1",
        params![p.id.as_str()],
    )?;
    for (category, amount) in &p.planned {
        tx.execute(
            "INSERT INTO planning_lines(profile_id, category, amount) VALUES (?1, ?2, ?3)",
            params![p.id.as_str(), category, amount.to_string()],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn delete_plan(conn: &Connection, month: YearMonth) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM planning_lines WHERE profile_id IN
            (SELECT id FROM planning_profiles WHERE month=?1)",
        params![month.to_string()],
    )?;
    let n = tx.execute(
        "DELETE FROM planning_profiles WHERE month=?1",
        params![month.to_string()],
    )?;
    tx.commit()?;
    Ok(n > 0)
}

// Categories

/// Rows touched by a category rename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryRename {
    pub transactions: usize,
    pub subscriptions: usize,
    pub budgets: usize,
    pub goals: usize,
    pub plan_lines: usize,
}

/// Rename category `from` to `to` everywhere it is stored, in one SQLite
/// transaction. Transactions, subscriptions and goals match exactly; the
/// budget matches ignoring case. Refused when `to` already has its own budget.
/// A plan holding both names ends up with one line carrying their sum.
pub fn rename_category(conn: &Connection, from: &str, to: &str) -> Result<CategoryRename> {
    if from == to {
        return Err(anyhow!("Category '{}' already has that name", from));
    }
    if !from.eq_ignore_ascii_case(to) {
        let taken: Option<String> = conn
            .query_row("SELECT category FROM budgets WHERE category=?1", params![to], |r| r.get(0))
            .optional()?;
        if let Some(existing) = taken {
            return Err(anyhow!("Category '{}' already has a budget", existing));
        }
    }

    let tx = conn.unchecked_transaction()?;
    let mut renamed = CategoryRename {
        transactions: tx.execute(
            "UPDATE transactions SET category=?2 WHERE category=?1",
            params![from, to],
        )?,
        subscriptions: tx.execute(
            "UPDATE subscriptions SET category=?2 WHERE category=?1",
            params![from, to],
        )?,
        budgets: tx.execute(
            "UPDATE budgets SET category=?2 WHERE category=?1",
            params![from, to],
        )?,
        goals: tx.execute(
            "UPDATE goals SET category=?2 WHERE category=?1",
            params![from, to],
        )?,
        plan_lines: 0,
    };

    let lines: Vec<(String, String)> = {
        let mut stmt =
            tx.prepare("SELECT profile_id, amount FROM planning_lines WHERE category=?1")?;
        let rows = stmt.query_map(params![from], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    for (profile_id, amount) in lines {
        let existing: Option<String> = tx
            .query_row(
                "SELECT amount FROM planning_lines WHERE profile_id=?1 AND category=?2",
                params![profile_id, to],
                |r| r.get(0),
            )
            .optional()?;
        match existing {
            Some(other) => {
                let merged = parse_stored_decimal(&other)? + parse_stored_decimal(&amount)?;
                tx.execute(
                    "UPDATE planning_lines SET amount=?3 WHERE profile_id=?1 AND category=?2",
                    params![profile_id, to, merged.to_string()],
                )?;
                tx.execute(
                    "DELETE FROM planning_lines WHERE profile_id=?1 AND category=?2",
                    params![profile_id, from],
                )?;
            }
            None => {
                tx.execute(
                    "UPDATE planning_lines SET category=?3 WHERE profile_id=?1 AND category=?2",
                    params![profile_id, from, to],
                )?;
            }
        }
        renamed.plan_lines += 1;
    }
    tx.commit()?;
    debug!(from, to, ?renamed, "category renamed");
    Ok(renamed)
}

pub fn load_ledger(conn: &Connection) -> Result<Ledger> {
    Ok(Ledger {
        transactions: load_transactions(conn)?,
        subscriptions: load_subscriptions(conn)?,
        payment_methods: load_payment_methods(conn)?,
        preferences: load_preferences(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn expense(id: &str, date: &str) -> Transaction {
        Transaction::new(
            Id::from_string(id),
            TransactionKind::Expense,
            Decimal::new(1999, 2),
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            "Lunch",
            "Food",
            Id::from_string("pix"),
        )
        .unwrap()
    }

    #[test]
    fn transactions_survive_a_round_trip_with_links() {
        let conn = conn();
        let mut launched = expense("t1", "2024-03-10");
        launched.origin = Origin::Subscription {
            subscription_id: Id::from_string("netflix"),
            month: "2024-03".parse().unwrap(),
        };
        launched.reimbursement = Some(Reimbursement {
            debtor: Some("Ana".into()),
            received: Some(Id::from_string("t2")),
        });
        save_transaction(&conn, &launched).unwrap();

        let loaded = load_transactions(&conn).unwrap();
        assert_eq!(loaded, vec![launched]);
    }

    #[test]
    fn apply_changes_reports_diff() {
        let conn = conn();
        let before = vec![expense("a", "2024-01-01"), expense("b", "2024-01-02")];
        apply_changes(&conn, &[], &before).unwrap();

        let mut changed = expense("b", "2024-02-02");
        changed.category = "Home".into();
        let after = vec![changed.clone(), expense("c", "2024-01-03")];
        let diff = apply_changes(&conn, &before, &after).unwrap();
        assert_eq!(
            diff,
            ChangeSet {
                inserted: 1,
                updated: 1,
                deleted: 1
            }
        );
        let ids: Vec<String> = load_transactions(&conn)
            .unwrap()
            .into_iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn preferences_default_and_persist() {
        let conn = conn();
        assert_eq!(
            load_preferences(&conn).unwrap().credit_card_logic,
            CreditCardLogic::TransactionDate
        );
        set_credit_card_logic(&conn, CreditCardLogic::ClosingDay).unwrap();
        assert_eq!(
            load_preferences(&conn).unwrap().credit_card_logic,
            CreditCardLogic::ClosingDay
        );
    }

    #[test]
    fn payment_method_names_are_unique_ignoring_case() {
        let conn = conn();
        let card = PaymentMethod::credit_card(Id::from_string("c1"), "Visa", 25, 5).unwrap();
        insert_payment_method(&conn, &card).unwrap();
        let dup = PaymentMethod::other(Id::from_string("c2"), "VISA");
        assert!(insert_payment_method(&conn, &dup).is_err());
        assert_eq!(load_payment_methods(&conn).unwrap(), vec![card]);
    }

    #[test]
    fn goal_origins_survive_a_round_trip() {
        let conn = conn();
        let mut contribution = expense("t1", "2024-03-10");
        contribution.kind = TransactionKind::Investment;
        contribution.origin = Origin::Contribution {
            goal_id: Id::from_string("g1"),
        };
        let mut withdrawal = expense("t2", "2024-03-11");
        withdrawal.kind = TransactionKind::Income;
        withdrawal.origin = Origin::Withdrawal {
            goal_id: Id::from_string("g1"),
        };
        apply_changes(&conn, &[], &[contribution.clone(), withdrawal.clone()]).unwrap();
        assert_eq!(load_transactions(&conn).unwrap(), vec![contribution, withdrawal]);
    }

    #[test]
    fn budget_and_salary_persist() {
        let conn = conn();
        assert_eq!(load_budget(&conn).unwrap(), Budget::default());
        set_budget(&conn, "Food", Decimal::from(800)).unwrap();
        set_budget(&conn, "food", Decimal::from(900)).unwrap();
        set_budget(&conn, "Home", Decimal::from(2000)).unwrap();
        set_salary(&conn, Decimal::from(5000)).unwrap();

        let b = load_budget(&conn).unwrap();
        assert_eq!(b.salary, Some(Decimal::from(5000)));
        assert_eq!(b.allocations.len(), 2);
        assert_eq!(b.allocation("FOOD"), Some(Decimal::from(900)));
        assert!(delete_budget(&conn, "HOME").unwrap());
        assert!(!delete_budget(&conn, "Home").unwrap());
    }

    #[test]
    fn plan_save_replaces_lines() {
        let conn = conn();
        let month: YearMonth = "2024-05".parse().unwrap();
        let mut plan = PlanningProfile {
            id: Id::from_string("p1"),
            month,
            expected_income: Decimal::from(6000),
            planned: [("Food".to_string(), Decimal::from(900))].into_iter().collect(),
        };
        save_plan(&conn, &plan).unwrap();
        plan.planned = [("Home".to_string(), Decimal::from(2000))].into_iter().collect();
        save_plan(&conn, &plan).unwrap();
        assert_eq!(load_plans(&conn).unwrap(), vec![plan]);

        let clash = PlanningProfile {
            id: Id::from_string("p2"),
            month,
            expected_income: Decimal::ONE,
            planned: BTreeMap::new(),
        };
        assert!(save_plan(&conn, &clash).is_err());

        assert!(delete_plan(&conn, month).unwrap());
        assert!(load_plans(&conn).unwrap().is_empty());
        assert!(!delete_plan(&conn, month).unwrap());
    }

    #[test]
    fn rename_cascades_and_merges_plan_lines() {
        let conn = conn();
        apply_changes(&conn, &[], &[expense("t1", "2024-03-10")]).unwrap();
        set_budget(&conn, "Food", Decimal::from(800)).unwrap();
        save_plan(
            &conn,
            &PlanningProfile {
                id: Id::from_string("p1"),
                month: "2024-05".parse().unwrap(),
                expected_income: Decimal::from(6000),
                planned: [
                    ("Food".to_string(), Decimal::from(900)),
                    ("Groceries".to_string(), Decimal::from(100)),
                ]
                .into_iter()
                .collect(),
            },
        )
        .unwrap();

        let renamed = rename_category(&conn, "Food", "Groceries").unwrap();
        assert_eq!(renamed.transactions, 1);
        assert_eq!(renamed.budgets, 1);
        assert_eq!(renamed.plan_lines, 1);
        assert_eq!(load_transactions(&conn).unwrap()[0].category, "Groceries");
        assert_eq!(
            load_budget(&conn).unwrap().allocation("Groceries"),
            Some(Decimal::from(800))
        );
        let plan = &load_plans(&conn).unwrap()[0];
        assert_eq!(plan.planned.len(), 1);
        assert_eq!(plan.planned.get("Groceries"), Some(&Decimal::from(1000)));

        set_budget(&conn, "Home", Decimal::from(2000)).unwrap();
        assert!(rename_category(&conn, "Groceries", "home").is_err());
        assert!(rename_category(&conn, "Home", "Home").is_err());
    }
}
