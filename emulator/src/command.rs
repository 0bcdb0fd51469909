//! Prompt grammar for the emulator.
//!
//! Commands are a case-insensitive keyword with at most one argument:
//!
//! ```text
//! on | off | reset
//! crash | hang | lock
//! wait <n>ms | wait <n>s
//! status | events
//! help [topic]
//! ```

use std::time::Duration;

use modemctl_core::sequences::SequenceKind;
use winnow::ModalResult;
use winnow::ascii::{alpha1, dec_uint, space0};
use winnow::combinator::{alt, delimited, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    ("on", "on                 - run the power-on sequence"),
    ("off", "off                - run the power-off sequence"),
    ("reset", "reset              - pulse CP_RESET"),
    ("crash", "crash              - make the running modem drop PHONE_ACTIVE"),
    (
        "hang",
        "hang               - toggle a modem that ignores shutdown and reset",
    ),
    ("lock", "lock               - toggle the link write-pending lock"),
    (
        "wait",
        "wait <duration>    - advance the virtual clock (e.g. 500ms, 2s)",
    ),
    (
        "status",
        "status             - show lifecycle state and line levels",
    ),
    ("events", "events             - dump the telemetry ring"),
    ("help", "help [topic]       - show help for a command"),
];

/// Parsed prompt command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmulatorCommand {
    Sequence(SequenceKind),
    Crash,
    Hang,
    Lock,
    Wait(Duration),
    Status,
    Events,
    Help(Option<String>),
}

/// Parses one prompt line.
pub fn parse(line: &str) -> Result<EmulatorCommand, String> {
    command
        .parse(line)
        .map_err(|err| format!("unexpected input at column {}", err.offset() + 1))
}

/// Parses a duration literal such as `150ms` or `2s`.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    duration
        .parse(text)
        .map_err(|_| format!("invalid duration `{text}` (expected e.g. 500ms or 2s)"))
}

fn command(input: &mut &str) -> ModalResult<EmulatorCommand> {
    let keyword = delimited(space0, alpha1, space0).parse_next(input)?;
    let command = match keyword.to_ascii_lowercase().as_str() {
        "on" => EmulatorCommand::Sequence(SequenceKind::PowerOn),
        "off" => EmulatorCommand::Sequence(SequenceKind::PowerOff),
        "reset" => EmulatorCommand::Sequence(SequenceKind::Reset),
        "crash" => EmulatorCommand::Crash,
        "hang" => EmulatorCommand::Hang,
        "lock" => EmulatorCommand::Lock,
        "wait" => EmulatorCommand::Wait(duration.parse_next(input)?),
        "status" => EmulatorCommand::Status,
        "events" => EmulatorCommand::Events,
        "help" => EmulatorCommand::Help(
            opt(alpha1)
                .parse_next(input)?
                .map(str::to_ascii_lowercase),
        ),
        _ => return Err(ErrMode::Backtrack(ContextError::new())),
    };
    space0.parse_next(input)?;
    Ok(command)
}

fn duration(input: &mut &str) -> ModalResult<Duration> {
    let value: u64 = dec_uint.parse_next(input)?;
    let unit = alt(("ms", "s")).parse_next(input)?;
    Ok(if unit == "ms" {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Help lines for `topic`, or the full command list.
pub fn help(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS.iter().find(|(name, _)| *name == target) {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sequence_keywords_case_insensitively() {
        assert_eq!(
            parse("ON"),
            Ok(EmulatorCommand::Sequence(SequenceKind::PowerOn))
        );
        assert_eq!(
            parse("  off "),
            Ok(EmulatorCommand::Sequence(SequenceKind::PowerOff))
        );
        assert_eq!(
            parse("Reset"),
            Ok(EmulatorCommand::Sequence(SequenceKind::Reset))
        );
    }

    #[test]
    fn parses_wait_durations() {
        assert_eq!(
            parse("wait 150ms"),
            Ok(EmulatorCommand::Wait(Duration::from_millis(150)))
        );
        assert_eq!(
            parse("wait 2s"),
            Ok(EmulatorCommand::Wait(Duration::from_secs(2)))
        );
    }

    #[test]
    fn wait_requires_a_unit() {
        assert!(parse("wait 150").is_err());
        assert!(parse("wait").is_err());
    }

    #[test]
    fn help_takes_an_optional_topic() {
        assert_eq!(parse("help"), Ok(EmulatorCommand::Help(None)));
        assert_eq!(
            parse("help Wait"),
            Ok(EmulatorCommand::Help(Some("wait".to_string())))
        );
    }

    #[test]
    fn rejects_unknown_keywords_and_trailing_input() {
        assert!(parse("reboot").is_err());
        assert!(parse("status now").is_err());
    }

    #[test]
    fn duration_flag_values_parse() {
        assert_eq!(parse_duration("300ms"), Ok(Duration::from_millis(300)));
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn unknown_help_topic_lists_topics() {
        let lines = help(Some("reboot"));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("wait"));
    }
}
