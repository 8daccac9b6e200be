//! Interactive client commands.
//!
//! This module defines the [`Command`] enum, which encapsulates the commands a
//! user can type at the `sphx_cli` prompt, along with their arguments. Each
//! command maps onto one [`Client`](crate::Client) call.
//!
//! # Overview
//! The supported commands are:
//!
//! - `.exit`: Close the session.
//! - `search <index> <query...>`: Run a search and print its results.
//! - `keywords <index> <query...>`: Print the keywords of a query with hit statistics.
//! - `excerpt <index> <words> <text...>`: Highlight `words` in `text`.
//! - `update <index> <attr> <id> <value>`: Set a scalar attribute of one document.
//! - `mva <index> <attr> <id> [values...]`: Replace a multi-valued attribute of one document.
//!
//! # Example
//! ```rust
//! use sphx::Command;
//!
//! let cmd: Command = "search test1 wifi".try_into().unwrap();
//! assert_eq!(
//!     cmd,
//!     Command::Search { index: "test1".into(), query: "wifi".into() }
//! );
//! ```
use std::io;

use thiserror::Error;

/// List of possible errors that a command can throw.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unrecognized command '{0}'")]
    UnrecognizedCommand(String),

    #[error("invalid '{command}' command, {reason}")]
    InvalidCommandArguments { command: String, reason: String },

    #[error("no command provided")]
    Empty,

    #[error("failed to read command: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Search {
        index: String,
        query: String,
    },
    Keywords {
        index: String,
        query: String,
    },
    Excerpt {
        index: String,
        words: String,
        text: String,
    },
    Update {
        index: String,
        attr: String,
        id: u64,
        value: i64,
    },
    UpdateMulti {
        index: String,
        attr: String,
        id: u64,
        values: Vec<u32>,
    },
}

fn invalid(command: &str, reason: &str) -> CommandError {
    CommandError::InvalidCommandArguments {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

fn number<T: std::str::FromStr>(command: &str, value: &str) -> Result<T, CommandError> {
    value.parse::<T>().map_err(|_| {
        invalid(
            command,
            &format!("'{value}' is not a valid non-negative integer"),
        )
    })
}

impl TryFrom<&str> for Command {
    type Error = CommandError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parts = value.split_whitespace().collect::<Vec<&str>>();
        let Some((name, args)) = parts.split_first() else {
            return Err(CommandError::Empty);
        };

        match name.to_lowercase().as_str() {
            ".exit" => Ok(Command::Exit),
            "search" | "keywords" => {
                if args.len() < 2 {
                    return Err(invalid(
                        name,
                        &format!("requires an index and a query. Example: {name} test1 wifi"),
                    ));
                }
                let index = args[0].to_string();
                let query = args[1..].join(" ");
                if name.eq_ignore_ascii_case("search") {
                    Ok(Command::Search { index, query })
                } else {
                    Ok(Command::Keywords { index, query })
                }
            }
            "excerpt" => {
                if args.len() < 3 {
                    return Err(invalid(
                        name,
                        "requires index, words and text. Example: excerpt test1 the what the world",
                    ));
                }
                Ok(Command::Excerpt {
                    index: args[0].to_string(),
                    words: args[1].to_string(),
                    text: args[2..].join(" "),
                })
            }
            "update" => {
                if args.len() != 4 {
                    return Err(invalid(
                        name,
                        "requires index, attribute, id and value. Example: update test1 group_id 2 1",
                    ));
                }
                Ok(Command::Update {
                    index: args[0].to_string(),
                    attr: args[1].to_string(),
                    id: number(name, args[2])?,
                    value: number(name, args[3])?,
                })
            }
            "mva" => {
                if args.len() < 3 {
                    return Err(invalid(
                        name,
                        "requires index, attribute and id. Example: mva test1 tags 2 11 21",
                    ));
                }
                Ok(Command::UpdateMulti {
                    index: args[0].to_string(),
                    attr: args[1].to_string(),
                    id: number(name, args[2])?,
                    values: args[3..]
                        .iter()
                        .map(|v| number(name, v))
                        .collect::<Result<_, _>>()?,
                })
            }
            _ => Err(CommandError::UnrecognizedCommand(value.trim().to_string())),
        }
    }
}
