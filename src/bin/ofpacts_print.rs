//! Decode hex-encoded wire action lists and print them.
//!
//! Usage:
//!   ofpacts_print [OPTIONS] [HEX ...]
//!   ofpacts_print [OPTIONS] < lists.txt
//!
//! Each argument (or each non-empty stdin line) is one action list. Whitespace inside a
//! list is ignored, so `0000 0008 0005 0000` works.
//!
//! Options:
//!   --max-ports N, -p N   Also validate against ports 0..N (no field context).
//!   --reencode, -r        Print the re-encoded hex after the formatted list.
//!   --verbose, -v         Log decoder and validator diagnostics to stderr.
//!
//! Exits with status 1 if any list fails to decode or validate.

use anyhow::{anyhow, Context};
use ofpacts::{check, decode, to_openflow, Flow};
use std::io::{self, BufRead};
use tracing::Level;

fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(anyhow!("odd number of hex digits"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair)?;
            u8::from_str_radix(text, 16).with_context(|| format!("bad hex byte {:?}", text))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Prints one list; returns false if it was rejected.
fn print_list(input: &str, max_ports: Option<u16>, reencode: bool) -> bool {
    let wire = match parse_hex(input) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{}: {}", input, e);
            return false;
        }
    };
    let list = match decode(&wire, wire.len()) {
        Ok(l) => l,
        Err(e) => {
            println!("bad action list: {}", e);
            return false;
        }
    };
    println!("{}", list);
    if reencode {
        println!("  {}", to_hex(&to_openflow(&list)));
    }
    if let Some(max_ports) = max_ports {
        if let Err(e) = check(&list, &Flow::new(), max_ports) {
            println!("  invalid: {}", e);
            return false;
        }
    }
    true
}

/// Removes `long` or `short` from `args`, returning whether it was present.
fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> bool {
    match args.iter().position(|a| a == long || a == short) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = take_flag(&mut args, "--verbose", "-v");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let reencode = take_flag(&mut args, "--reencode", "-r");
    let max_ports = if let Some(pos) = args.iter().position(|a| a == "--max-ports" || a == "-p") {
        args.remove(pos);
        if pos >= args.len() {
            return Err(anyhow!("--max-ports needs a value"));
        }
        let value = args.remove(pos);
        Some(value.parse::<u16>().with_context(|| format!("bad --max-ports value {:?}", value))?)
    } else {
        None
    };

    let mut ok = true;
    if args.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            ok &= print_list(&line, max_ports, reencode);
        }
    } else {
        for arg in &args {
            ok &= print_list(arg, max_ports, reencode);
        }
    }
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
