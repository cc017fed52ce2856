//! Line-oriented command language for driving an integer range tree.
//!
//! ```text
//! # comments and blank lines are ignored
//! build 1 1 1 1 1 1 1 1 1
//! update 0 2 add 1
//! update 5 7 pow 3 eager
//! query 4 8
//! values
//! len
//! tree
//! ```

use std::str::FromStr;

use crate::application::presets::Operation;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::UpdateMode;

/// One parsed script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Build(Vec<i64>),
    Query {
        left: i64,
        right: i64,
    },
    Update {
        left: i64,
        right: i64,
        operation: Operation,
        /// `None` falls back to the session default
        mode: Option<UpdateMode>,
    },
    Values,
    Len,
    Tree,
}

/// A command together with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

/// Parse a whole script, skipping blank lines and `#` comments.
pub fn parse_script(source: &str) -> ApplicationResult<Vec<ScriptLine>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = raw.split('#').next().unwrap_or_default().trim();
            (!text.is_empty()).then_some((idx + 1, text))
        })
        .map(|(line, text)| {
            parse_command(text)
                .map(|command| ScriptLine { line, command })
                .map_err(|message| ApplicationError::script(line, message))
        })
        .collect()
}

/// Parse a single command line (without comment).
pub fn parse_command(text: &str) -> Result<Command, String> {
    let mut words = text.split_whitespace();
    let keyword = words.next().ok_or("empty command")?;
    let args: Vec<&str> = words.collect();

    match keyword {
        "build" => {
            if args.is_empty() {
                return Err("build needs at least one value".into());
            }
            args.iter()
                .map(|a| number::<i64>(a))
                .collect::<Result<Vec<_>, _>>()
                .map(Command::Build)
        }
        "query" => {
            expect_args(keyword, &args, 2, 2)?;
            Ok(Command::Query {
                left: number(args[0])?,
                right: number(args[1])?,
            })
        }
        "update" => {
            expect_args(keyword, &args, 4, 5)?;
            let operation = parse_operation(args[2], args[3])?;
            let mode = args.get(4).map(|m| parse_mode(m)).transpose()?;
            Ok(Command::Update {
                left: number(args[0])?,
                right: number(args[1])?,
                operation,
                mode,
            })
        }
        "values" => expect_args(keyword, &args, 0, 0).map(|_| Command::Values),
        "len" => expect_args(keyword, &args, 0, 0).map(|_| Command::Len),
        "tree" => expect_args(keyword, &args, 0, 0).map(|_| Command::Tree),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_operation(name: &str, arg: &str) -> Result<Operation, String> {
    match name {
        "add" => Ok(Operation::Add(number(arg)?)),
        "mul" => Ok(Operation::Mul(number(arg)?)),
        "set" => Ok(Operation::Assign(number(arg)?)),
        "pow" => Ok(Operation::Pow(number(arg)?)),
        other => Err(format!("unknown operation: {other} (expected add, mul, set or pow)")),
    }
}

fn parse_mode(word: &str) -> Result<UpdateMode, String> {
    match word {
        "lazy" => Ok(UpdateMode::Lazy),
        "eager" => Ok(UpdateMode::Eager),
        other => Err(format!("unknown update mode: {other} (expected lazy or eager)")),
    }
}

fn expect_args(keyword: &str, args: &[&str], min: usize, max: usize) -> Result<(), String> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let wanted = if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    };
    Err(format!(
        "{keyword} takes {wanted} argument(s), got {}",
        args.len()
    ))
}

fn number<N: FromStr>(word: &str) -> Result<N, String> {
    word.parse()
        .map_err(|_| format!("not a valid number: {word}"))
}
