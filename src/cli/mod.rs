// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Command dispatch and plain-text output

mod args;

pub use args::{Args, Command};

use anyhow::Result;
use std::io::Write;

use crate::ctl::Ctl;
use crate::heartbeat::{Heartbeat, HeartbeatApi};
use crate::selection::BatchOutcome;

/// Run `command`, writing results to `out`
///
/// For batch commands every completed heartbeat is written before the error
/// that stopped the batch is returned.
pub async fn run<A, W>(ctl: &Ctl<A>, command: &Command, no_headers: bool, out: &mut W) -> Result<()>
where
    A: HeartbeatApi + ?Sized,
    W: Write,
{
    match command {
        Command::List { selector, status } => {
            let heartbeats = ctl.list(&selector.to_config(), *status).await?;
            write_status_table(out, &heartbeats, no_headers)?;
        }
        Command::Get { name } => {
            let heartbeat = ctl.get_one(name).await?;
            write_status_table(out, std::slice::from_ref(&heartbeat), no_headers)?;
        }
        Command::Enable { selector } => {
            let outcome = ctl.enable(&selector.to_config()).await?;
            finish(out, outcome, |info| format!("heartbeat \"{}\" enabled", info.name))?;
        }
        Command::Disable { selector } => {
            let outcome = ctl.disable(&selector.to_config()).await?;
            finish(out, outcome, |info| format!("heartbeat \"{}\" disabled", info.name))?;
        }
        Command::Ping { selector } => {
            let outcome = ctl.ping(&selector.to_config()).await?;
            finish(out, outcome, |(name, ping)| {
                format!("heartbeat \"{}\": {}", name, ping.message)
            })?;
        }
    }
    Ok(())
}

fn finish<W, R, F>(out: &mut W, outcome: BatchOutcome<R>, line: F) -> Result<()>
where
    W: Write,
    F: Fn(&R) -> String,
{
    for result in &outcome.completed {
        writeln!(out, "{}", line(result))?;
    }
    match outcome.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

/// `NAME  STATUS` rows with left-aligned, space-padded columns
fn write_status_table<W: Write>(out: &mut W, heartbeats: &[Heartbeat], no_headers: bool) -> Result<()> {
    let mut rows: Vec<(String, String)> = Vec::with_capacity(heartbeats.len() + 1);
    if !no_headers {
        rows.push(("NAME".to_string(), "STATUS".to_string()));
    }
    rows.extend(
        heartbeats
            .iter()
            .map(|hb| (hb.name.clone(), hb.status().to_string())),
    );

    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, status) in rows {
        writeln!(out, "{:<width$}  {}", name, status, width = width)?;
    }
    Ok(())
}
