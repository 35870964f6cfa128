// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand};

use crate::heartbeat::HeartbeatStatus;
use crate::selection::SelectorConfig;

/// How the selector options combine, shared by every selecting command
macro_rules! selection_help {
    () => {
        "Heartbeats are selected by a combination of selectors, all of which must \
match for a heartbeat to be selected.

The label selector (-l/--selector) works like kubectl's. Labels are the \
heartbeat fields such as 'name', 'interval', 'ownerTeam/name' or \
'alertPriority'. Boolean fields 'enabled' and 'expired' are present only when \
true. Each alert tag adds a label as well: tag 'foo' becomes label 'foo' with \
value 'true' and tag 'foo: bar' becomes label 'foo' with value 'bar'. \
Operators are '=', '==', '!=', 'in', 'notin', 'X' and '!X'.

The field selector (--field-selector) is simpler. Fields are the heartbeat \
fields with every field present, booleans as 'true'/'false' and alert tags \
joined with commas under 'alertTags'. Only '=', '==' and '!=' are allowed; \
',', '=' and '\\' in values must be escaped with a backslash.

Positional arguments are regular expressions matched against the whole \
heartbeat name. They are joined into one expression, so 'foo' 'bar-.*' \
becomes '^(foo|bar-.*)$'."
    };
}

/// Worked examples for a selecting command, `$verb` being its name
macro_rules! selection_examples {
    ($verb:literal) => {
        concat!(
            "Examples:\n",
            "  # ", $verb, " all heartbeats with label 'managed-by' equal to 'foobricator'\n",
            "  heartbeatctl ", $verb, " --selector=managed-by=foobricator\n\n",
            "  # ", $verb, " heartbeats with alert priority equal to 'P3'\n",
            "  heartbeatctl ", $verb, " --field-selector=alertPriority=P3\n\n",
            "  # ", $verb, " non-expired heartbeats with alert priority 'P2' or 'P4'\n",
            "  heartbeatctl ", $verb, " -l \"!expired,alertPriority in (P2, P4)\"\n\n",
            "  # ", $verb, " heartbeats with exact names\n",
            "  heartbeatctl ", $verb, " foo foo-rab1 bar-oof2\n\n",
            "  # ", $verb, " heartbeats with names matching any of the expressions\n",
            "  heartbeatctl ", $verb, " \"foo.*\" \".*-oof[12]\"\n\n",
            "  # ", $verb, " every heartbeat\n",
            "  heartbeatctl ", $verb, " \".*\""
        )
    };
}

#[derive(Parser, Debug)]
#[command(name = "heartbeatctl")]
#[command(author, version, about = "Manage OpsGenie heartbeats")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Omit column headers in output
    #[arg(long, global = true)]
    pub no_headers: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// OpsGenie API base URL (overrides the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Options narrowing the set of heartbeats a command works on
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SelectorArgs {
    /// Name regular expressions, matched against the whole name.
    /// Examples: foo, "bar-.*"
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,

    /// Label selector, e.g. -l "!enabled,managed-by=foobricator"
    #[arg(short = 'l', long = "selector", value_name = "SELECTOR")]
    pub selector: Option<String>,

    /// Field selector, e.g. --field-selector alertPriority=P3
    #[arg(long, value_name = "SELECTOR")]
    pub field_selector: Option<String>,
}

impl SelectorArgs {
    pub fn to_config(&self) -> SelectorConfig {
        SelectorConfig {
            name_expressions: self.names.clone(),
            label_selector: self.selector.clone().unwrap_or_default(),
            field_selector: self.field_selector.clone().unwrap_or_default(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List heartbeats
    #[command(
        long_about = concat!("List heartbeats, all of them when no selector is given.\n\n", selection_help!()),
        after_long_help = selection_examples!("list")
    )]
    List {
        #[command(flatten)]
        selector: SelectorArgs,

        /// Only show heartbeats with this status
        #[arg(short, long, value_enum, ignore_case = true)]
        status: Option<HeartbeatStatus>,
    },

    /// Get a single heartbeat by name
    Get {
        name: String,
    },

    /// Enable heartbeats
    #[command(
        long_about = concat!("Enable selected heartbeats.\n\n", selection_help!()),
        after_long_help = selection_examples!("enable")
    )]
    Enable {
        #[command(flatten)]
        selector: SelectorArgs,
    },

    /// Disable heartbeats
    #[command(
        long_about = concat!("Disable selected heartbeats.\n\n", selection_help!()),
        after_long_help = selection_examples!("disable")
    )]
    Disable {
        #[command(flatten)]
        selector: SelectorArgs,
    },

    /// Ping heartbeats
    #[command(
        long_about = concat!(
            "Ping selected heartbeats. A successful ping does not prove the heartbeat exists.\n\n",
            selection_help!()
        ),
        after_long_help = selection_examples!("ping")
    )]
    Ping {
        #[command(flatten)]
        selector: SelectorArgs,
    },
}
