use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use clap::Parser as ClapParser;
use log::{info, warn};
use rplcore::{RplError, Runtime, Settings, render};

#[derive(ClapParser)]
#[command(about = "Interactive RPL calculator")]
pub struct Arguments {
    /// Settings file (defaults to $RPL_CONFIG_PATH or the user configuration directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the lines of this file instead of reading standard input
    script: Option<PathBuf>,

    /// Number of stack levels shown after each line
    #[arg(short, long, default_value_t = 4)]
    levels: usize,
}

fn report(source_name: &str, line: &str, error: &RplError) {
    let Some(span) = error.span() else {
        eprintln!("Error: {error}");
        return;
    };
    let range = span.offset..span.end().max(span.offset + 1);
    let printed = Report::build(ReportKind::Error, (source_name, range.clone()))
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_message(error.to_string())
        .with_label(
            Label::new((source_name, range))
                .with_message("here")
                .with_color(Color::Red),
        )
        .finish()
        .eprint((source_name, Source::from(line)));
    if printed.is_err() {
        eprintln!("Error: {error}");
    }
}

fn show_stack(rt: &Runtime, levels: usize) {
    for level in (1..=levels.min(rt.depth())).rev() {
        match rt.level(level) {
            Ok(object) => println!("{level}: {}", render(&object, rt.settings())),
            Err(error) => println!("{level}: <{error}>"),
        }
    }
}

fn execute(rt: &mut Runtime, source_name: &str, line: &str, levels: usize) -> bool {
    let line = line.trim();
    match line {
        "" => return true,
        "exit" | "quit" => return false,
        ".stats" => {
            let stats = rt.stats();
            println!(
                "heap: {}/{} bytes, {} objects, {} collections, {} bytes reclaimed",
                stats.used, stats.capacity, stats.live_objects, stats.collections, stats.reclaimed
            );
            return true;
        }
        ".vars" => {
            let names: Vec<String> = rt.variables().iter().map(|v| v.to_string()).collect();
            println!("{}", names.join(" "));
            return true;
        }
        _ => {}
    }
    if let Err(error) = rt.run(line) {
        report(source_name, line, &error);
    }
    show_stack(rt, levels);
    true
}

fn main() {
    env_logger::init();
    let args = Arguments::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from_toml(path),
        None => Settings::load_or_default(),
    };
    let settings = settings.unwrap_or_else(|error| {
        warn!("using default settings: {error}");
        Settings::default()
    });
    let mut rt = Runtime::new(settings);

    if let Some(path) = &args.script {
        let source_name = path.display().to_string();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                eprintln!("Failed to read {source_name}: {error}");
                std::process::exit(1);
            }
        };
        for line in text.lines() {
            if !execute(&mut rt, &source_name, line, args.levels) {
                break;
            }
        }
        std::process::exit(if rt.error().is_some() { 1 } else { 0 });
    }

    println!("RPL v{}", env!("CARGO_PKG_VERSION"));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }
        let Some(Ok(line)) = lines.next() else {
            println!();
            break;
        };
        if !execute(&mut rt, "<stdin>", &line, args.levels) {
            break;
        }
    }
    info!("leaving with {} objects on the stack", rt.depth());
}
