use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant as HostInstant};

use log::warn;
use modemctl_core::link::WritePend;
use modemctl_core::sequences::SequenceKind;
use modemctl_core::telemetry::{TelemetryPayload, TelemetryRecord};
use modemctl_core::{ModemControl, ModemOps, ModemParts};

use crate::board::{
    BoardOptions, CP_OFF, CP_ON, CP_RESET, ConsoleNotifier, EmulatorControl, PHONE_ACTIVE,
    SimBoard, SimDelay, SimIrq, SimLink, StateEvent,
};
use crate::command::{self, EmulatorCommand};

pub struct Session {
    board: SimBoard,
    notifier: ConsoleNotifier,
    control: EmulatorControl,
    options: BoardOptions,
    transcript: Option<TranscriptLogger>,
    started_at: HostInstant,
}

impl Session {
    pub fn new(options: BoardOptions, transcript: Option<&Path>) -> io::Result<Self> {
        let board = SimBoard::new(options);
        let notifier = ConsoleNotifier::new(board.clone());
        let control = ModemControl::init(
            &options.platform(),
            ModemParts {
                gpio: board.clone(),
                irq: SimIrq(board.clone()),
                link: SimLink(board.clone()),
                notifier: notifier.clone(),
            },
        )
        .map_err(io::Error::other)?;

        let transcript = transcript.map(TranscriptLogger::new).transpose()?;

        Ok(Self {
            board,
            notifier,
            control,
            options,
            transcript,
            started_at: HostInstant::now(),
        })
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let elapsed = self.started_at.elapsed();
        self.record(elapsed, TranscriptRole::Host, &[trimmed.to_string()])?;

        let mut lines = match command::parse(trimmed) {
            Ok(command) => self.execute(command),
            Err(err) => vec![format!("ERR syntax {err}")],
        };
        lines.extend(self.notifier.drain().into_iter().map(describe_event));

        self.record(elapsed, TranscriptRole::Emulator, &lines)?;
        Ok(lines)
    }

    fn execute(&mut self, command: EmulatorCommand) -> Vec<String> {
        match command {
            EmulatorCommand::Sequence(kind) => self.run_sequence(kind),
            EmulatorCommand::Wait(duration) => {
                self.board.advance(&self.control, duration);
                vec![format!(
                    "OK wait {} now=+{}ms",
                    format_duration_short(duration),
                    self.board.now().as_millis()
                )]
            }
            EmulatorCommand::Crash => {
                if self.board.crash() {
                    self.board.deliver_irq(&self.control);
                    vec!["OK modem crashed".to_string()]
                } else {
                    vec!["ERR modem is not running".to_string()]
                }
            }
            EmulatorCommand::Hang => {
                if self.board.toggle_hang() {
                    vec!["OK modem hung (ignores shutdown and reset)".to_string()]
                } else {
                    vec!["OK modem responsive".to_string()]
                }
            }
            EmulatorCommand::Lock => match self.board.toggle_write_pend() {
                WritePend::Locked => vec!["OK link write lock held".to_string()],
                WritePend::Unlocked => vec!["OK link write lock released".to_string()],
            },
            EmulatorCommand::Status => self.status(),
            EmulatorCommand::Events => self.events(),
            EmulatorCommand::Help(topic) => command::help(topic.as_deref()),
        }
    }

    fn run_sequence(&mut self, kind: SequenceKind) -> Vec<String> {
        let started = self.board.now();
        let mut delay = SimDelay {
            board: &self.board,
            control: &self.control,
        };

        match self.control.run(kind, &mut delay) {
            Ok(()) => {
                self.board.deliver_irq(&self.control);
                let took = self.board.now() - started;
                vec![format!(
                    "OK {kind} took={} state={}",
                    format_duration_short(took),
                    self.control.state()
                )]
            }
            Err(err) => {
                warn!("{kind} rejected: {err}");
                vec![format!("ERR {kind} {err}")]
            }
        }
    }

    fn status(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "state={} now=+{}ms modem={:?}{}",
                self.control.state(),
                self.board.now().as_millis(),
                self.board.power(),
                if self.board.is_hung() { " hung" } else { "" }
            ),
            format!(
                "CP_ON={:?} CP_RESET={:?} PHONE_ACTIVE={:?}",
                self.board.level(CP_ON),
                self.board.level(CP_RESET),
                self.board.level(PHONE_ACTIVE)
            ),
        ];
        if self.options.cp_off_wired {
            lines.push(format!("CP_OFF={:?}", self.board.level(CP_OFF)));
        }
        lines.push(format!(
            "irq={} armed={} wake={} write-pend={:?} policy={:?} magic-inits={}",
            self.board.irq_name().unwrap_or("-"),
            self.board
                .armed()
                .map_or_else(|| "-".to_string(), |trigger| trigger.to_string()),
            self.board.wake_enabled(),
            self.board.write_pend(),
            self.options.write_pend_policy,
            self.board.magic_inits(),
        ));
        lines.push(format!(
            "power-off budget={} retries x {}",
            self.control.power_off_policy().max_retries,
            format_duration_short(self.control.power_off_policy().interval)
        ));
        lines
    }

    fn events(&self) -> Vec<String> {
        self.control.with_telemetry(|telemetry| {
            if telemetry.is_empty() {
                return vec!["no telemetry recorded".to_string()];
            }
            telemetry.oldest_first().map(describe_record).collect()
        })
    }

    fn record(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        lines: &[String],
    ) -> io::Result<()> {
        if let Some(transcript) = self.transcript.as_mut() {
            for line in lines {
                transcript.append_line(elapsed, &role, line)?;
            }
        }
        Ok(())
    }
}

fn describe_event(event: StateEvent) -> String {
    format!("EVENT +{}ms {}", event.at.as_millis(), event.state)
}

fn describe_record(record: &TelemetryRecord) -> String {
    let details = match record.details {
        TelemetryPayload::None => String::new(),
        TelemetryPayload::Line(gpio) => format!(" ({gpio})"),
        TelemetryPayload::Monitor(sample) => format!(
            " (reset={:?} active={:?})",
            sample.cp_reset, sample.phone_active
        ),
        TelemetryPayload::Retries(retries) => format!(" (retries={retries})"),
    };
    format!("  #{:<4} {}{details}", record.id, record.event)
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# QSC6085 control emulator transcript")?;
        writeln!(
            self.writer,
            "# Timestamps are host milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: &TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
