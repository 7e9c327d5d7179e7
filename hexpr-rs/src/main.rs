use std::io::{self, BufRead, Write};

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use hexpr::cli::{self, CliArgs};
use hexpr::config::FormatConfig;
use hexpr::expr::{DialogProvider, Evaluator, SymbolTable};
use hexpr::format::parse_int_prefix;

fn main() {
    let args = cli::parse_args();

    let is_tty = unsafe { libc::isatty(libc::STDERR_FILENO) != 0 };
    StderrLogger::install(args.log_level(), is_tty);

    let cfg = match args.resolve_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("hexpr: config: {e}");
            std::process::exit(2);
        }
    };

    // ── Symbols: an empty template over the --data file ──────────────────────
    let mut table = SymbolTable::new();
    if let Some(path) = &args.data {
        match std::fs::read(path) {
            Ok(bytes) => {
                log::debug!("loaded {} bytes from {}", bytes.len(), path.display());
                table = table.with_data(bytes);
            }
            Err(e) => {
                eprintln!("hexpr: {}: {e}", path.display());
                std::process::exit(2);
            }
        }
    }

    let mut ev = Evaluator::new(table)
        .with_options(cfg.eval.clone())
        .with_dialog(Box::new(ConsoleDialog));

    // ── One-shot mode ─────────────────────────────────────────────────────────
    if !args.exprs.is_empty() {
        let mut failed = false;
        for text in &args.exprs {
            failed |= !run_line(&mut ev, text, &args, &cfg.format);
        }
        std::process::exit(i32::from(failed));
    }

    // ── Interactive loop ──────────────────────────────────────────────────────
    let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) != 0 };
    let stdin = io::stdin();
    loop {
        if interactive {
            print!("> ");
            let _ = io::stdout().flush();
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("hexpr: {e}");
                std::process::exit(1);
            }
        }
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => {}
            (":quit" | ":q", _) => break,
            (":vars", _) => {
                for (name, value) in ev.vars().sorted() {
                    println!("{name} = {value} ({})", value.type_name());
                }
            }
            (":seed", n) => ev.seed_rand(parse_int_prefix(n, 10) as u64),
            (cmd, _) if cmd.starts_with(':') => eprintln!("hexpr: unknown command {cmd}"),
            _ => {
                run_line(&mut ev, line, &args, &cfg.format);
            }
        }
    }
}

/// Evaluate and print one expression.  Returns false on error.
fn run_line(ev: &mut Evaluator<SymbolTable>, text: &str, args: &CliArgs, fmt: &FormatConfig) -> bool {
    match ev.evaluate(text) {
        Ok(v) => {
            println!("{}", v.render(&args.format, args.size, args.unsigned, fmt));
            true
        }
        Err(_) => {
            eprintln!("error: {}", ev.last_error().unwrap_or_default());
            false
        }
    }
}

// ── Console prompts ───────────────────────────────────────────────────────────

/// Asks `get_int` / `get_string` / `get_bool` questions on the terminal.
/// End of input cancels.
struct ConsoleDialog;

impl ConsoleDialog {
    fn ask(&self, prompt: &str) -> Option<String> {
        eprint!("{prompt} ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
        }
    }
}

impl DialogProvider for ConsoleDialog {
    fn get_integer(&mut self, prompt: &str, initial: i64, min: i64, max: i64) -> Option<i64> {
        loop {
            let answer = self.ask(&format!("{prompt} [{initial}]"))?;
            if answer.trim().is_empty() {
                return Some(initial);
            }
            let n = parse_int_prefix(&answer, 10);
            if (min..=max).contains(&n) {
                return Some(n);
            }
            eprintln!("Enter a number from {min} to {max}");
        }
    }

    fn get_string(&mut self, prompt: &str, initial: &str) -> Option<String> {
        let answer = self.ask(&format!("{prompt} [{initial}]"))?;
        Some(if answer.is_empty() { initial.to_owned() } else { answer })
    }

    fn get_boolean(&mut self, prompt: &str, true_text: &str, false_text: &str) -> Option<bool> {
        loop {
            let answer = self.ask(&format!("{prompt} ({true_text}/{false_text})"))?;
            let answer = answer.trim();
            if answer.eq_ignore_ascii_case(true_text) {
                return Some(true);
            }
            if answer.eq_ignore_ascii_case(false_text) {
                return Some(false);
            }
        }
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// `log` backend writing to stderr, coloured by level on a terminal.
struct StderrLogger {
    color: bool,
}

impl StderrLogger {
    fn install(level: log::LevelFilter, color: bool) {
        let logger = Box::leak(Box::new(StderrLogger { color }));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(level);
        }
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = io::stderr().lock();
        let level = record.level();
        if self.color {
            let color = match level {
                log::Level::Error => Color::Red,
                log::Level::Warn => Color::Yellow,
                log::Level::Info => Color::Green,
                log::Level::Debug => Color::Cyan,
                log::Level::Trace => Color::DarkGrey,
            };
            let _ = queue!(err, SetForegroundColor(color), Print(level), ResetColor);
        } else {
            let _ = write!(err, "{level}");
        }
        let _ = writeln!(err, " {}: {}", record.target(), record.args());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}
