mod board;
mod command;
mod session;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use modemctl_core::link::WritePendPolicy;

use board::BoardOptions;
use session::Session;

/// Interactive QSC6085 control emulator.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "QSC6085 modem control emulator",
    long_about = "Runs the modem control logic against a simulated board on a virtual clock"
)]
struct Args {
    /// Leave CP_OFF unwired; power-off then fails its configuration check
    #[arg(long)]
    no_cp_off: bool,

    /// Time the simulated modem takes to raise PHONE_ACTIVE after a power-on pulse
    #[arg(long, default_value = "1500ms", value_parser = command::parse_duration)]
    boot_time: Duration,

    /// Time the simulated modem takes to drop PHONE_ACTIVE after a power-off request
    #[arg(long, default_value = "300ms", value_parser = command::parse_duration)]
    shutdown_time: Duration,

    /// Start with a modem that ignores shutdown and reset
    #[arg(long)]
    hung: bool,

    /// Release a held link write lock on reset instead of only reporting it
    #[arg(long)]
    release_write_pend: bool,

    /// Write a session transcript to this file
    #[arg(long)]
    transcript: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let options = BoardOptions {
        cp_off_wired: !args.no_cp_off,
        boot_time: args.boot_time,
        shutdown_time: args.shutdown_time,
        hung: args.hung,
        write_pend_policy: if args.release_write_pend {
            WritePendPolicy::Release
        } else {
            WritePendPolicy::Observe
        },
    };

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(options, args.transcript.as_deref())?;
    let mut line = String::new();

    writeln!(
        writer,
        "QSC6085 control emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}
