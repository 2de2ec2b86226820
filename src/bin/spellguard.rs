//! spellguard command-line checker
//!
//! Reads words from stdin, one per line, checks them on the worker pool, and
//! prints `word<TAB>result` in input order. Results are JSON values.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use spellguard::{
    DictionaryPaths, Operation, Outcome, Request, SpellError, Speller, SpellerConfig, TaskHandle,
};

/// Command-line configuration
struct Config {
    aff: Option<PathBuf>,
    dic: Option<PathBuf>,
    operation: Operation,
    speller: SpellerConfig,
}

fn usage() {
    println!("spellguard - concurrent spell checker");
    println!();
    println!("USAGE:");
    println!("    spellguard --aff <FILE> --dic <FILE> [OPTIONS] < words.txt");
    println!();
    println!("OPTIONS:");
    println!("    -a, --aff <FILE>          Affix file");
    println!("    -d, --dic <FILE>          Dictionary file");
    println!("    -m, --mode <MODE>         spell | suggest | analyze | stem [default: spell]");
    println!("    -w, --workers <N>         Worker threads [default: $SPELLGUARD_WORKERS or 4]");
    println!("    -h, --help                Print help information");
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config {
        aff: None,
        dic: None,
        operation: Operation::Spell,
        speller: SpellerConfig::from_env(),
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            usage();
            std::process::exit(0);
        }
        let Some(value) = args.get(i + 1) else {
            fail(&format!("{flag} requires a value"));
        };
        match flag {
            "--aff" | "-a" => config.aff = Some(PathBuf::from(value)),
            "--dic" | "-d" => config.dic = Some(PathBuf::from(value)),
            "--mode" | "-m" => {
                config.operation = match value.parse::<Operation>() {
                    Ok(op @ (Operation::Spell | Operation::Suggest | Operation::Analyze | Operation::Stem)) => op,
                    _ => fail(&format!("unsupported mode: {value}")),
                };
            }
            "--workers" | "-w" => {
                config.speller.workers = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => fail(&format!("invalid worker count: {value}")),
                };
            }
            arg => fail(&format!("unknown argument: {arg}")),
        }
        i += 2;
    }

    config
}

fn write_result(
    out: &mut impl Write,
    word: &str,
    result: Result<Outcome, SpellError>,
) -> io::Result<()> {
    match result {
        Ok(outcome) => writeln!(out, "{word}\t{}", outcome.to_json()),
        Err(err) => writeln!(out, "{word}\terror: {err}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = parse_args();
    let (Some(aff), Some(dic)) = (config.aff, config.dic) else {
        usage();
        std::process::exit(1);
    };

    let speller = Speller::with_config(&DictionaryPaths::new(aff, dic), &config.speller)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut pending: VecDeque<(String, TaskHandle<Outcome>)> = VecDeque::new();

    for line in io::stdin().lock().lines() {
        let word = line?.trim().to_string();
        if word.is_empty() {
            continue;
        }
        let request = Request::parse(config.operation, &[word.clone().into()])?;

        let handle = loop {
            match speller.submit(request.clone()) {
                Ok(handle) => break handle,
                // Queue full: make room by finishing the oldest word.
                Err(err) if err.is_retryable() && !pending.is_empty() => {
                    if let Some((done, handle)) = pending.pop_front() {
                        write_result(&mut out, &done, handle.join())?;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        };
        pending.push_back((word, handle));
    }

    for (word, handle) in pending {
        write_result(&mut out, &word, handle.join())?;
    }
    out.flush()?;

    tracing::debug!(operation = %config.operation, "input exhausted");
    speller.close();
    Ok(())
}
