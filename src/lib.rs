// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod calendar;
pub mod clock;
pub mod error;
pub mod models;
pub mod effective_date;
pub mod invoice;
pub mod recurrence;
pub mod installments;
pub mod summary;
pub mod reimbursement;
pub mod budget;
pub mod planning;
pub mod goals;
pub mod cli;
pub mod db;
pub mod utils;
pub mod commands;
