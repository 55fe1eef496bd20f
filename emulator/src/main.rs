mod session;
mod sim;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use session::Session;

fn main() -> io::Result<()> {
    let busy_ticks = parse_busy_ticks().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: mission-emulator [--ticks <n>]");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(busy_ticks);
    let mut line = String::new();

    writeln!(
        writer,
        "Arena Mission Emulator ready. Type `help` for commands or `exit` to quit."
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

        for response in session.handle_command(trimmed) {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Parses the optional `--ticks <n>` argument (simulated actuation latency
/// in poll iterations).
fn parse_busy_ticks() -> Result<Option<u32>, String> {
    let mut args = env::args().skip(1);
    let Some(arg) = args.next() else {
        return Ok(None);
    };

    let value = if let Some(value) = arg.strip_prefix("--ticks=") {
        value.to_string()
    } else if arg == "--ticks" {
        args.next().ok_or("Expected value after --ticks".to_string())?
    } else {
        return Err(format!("Unknown argument: {arg}"));
    };

    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| format!("Invalid tick count: {value}"))
}
