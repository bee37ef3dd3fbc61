//! Interactive and one-shot client for the fleet daemon.

mod cli;
mod client;
mod errors;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;
use crate::client::{Connection, Exchange};
use crate::errors::AppError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("fleet: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let mut connection = Connection::open(&cli.connect)?;
    if cli.commands.is_empty() {
        interactive(&mut connection)
    } else {
        one_shot(&mut connection, &cli.commands)
    }
}

fn one_shot(connection: &mut Connection, commands: &[String]) -> Result<(), AppError> {
    for command in commands {
        match connection.exchange(command)? {
            Exchange::Reply(lines) => print_reply(&lines)?,
            Exchange::Closed => return Ok(()),
        }
    }
    Ok(())
}

fn interactive(connection: &mut Connection) -> Result<(), AppError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        match connection.exchange(command)? {
            Exchange::Reply(lines) => print_reply(&lines)?,
            Exchange::Closed => return Ok(()),
        }
    }
    Ok(())
}

fn print_reply(lines: &[String]) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{line}")?;
    }
    stdout.flush()?;
    Ok(())
}
