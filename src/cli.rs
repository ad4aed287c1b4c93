//! Command line surface: `run` starts the bridge daemon (the default when
//! no subcommand is given); `interactive` is a small hand-driving client
//! that connects to an
//! already-running bridge over the loopback TCP port it published and lets
//! a developer poke at button/stick state from a terminal.
use std::error::Error;

use clap::{Parser, Subcommand};
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::config::BridgeConfig;
use crate::report::{Button, InputReport};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the DS3 bridge daemon (default)
    Run,
    /// Connect to a running bridge and drive it by hand from a terminal
    Interactive,
}

/// Entry point for every non-`Run` subcommand.
pub async fn main_cli(_args: Args) -> Result<i32, Box<dyn Error>> {
    let config = BridgeConfig::default();
    let stream = connect_to_running_bridge(&config).await?;
    run_interactive(stream).await
}

async fn connect_to_running_bridge(config: &BridgeConfig) -> Result<TcpStream, Box<dyn Error>> {
    let contents = std::fs::read_to_string(config.process_file_path())
        .map_err(|e| format!("no running bridge found at {}: {e}", config.process_file_path()))?;
    let port: u16 = contents
        .split(':')
        .nth(1)
        .ok_or("malformed process file")?
        .trim()
        .parse()?;
    Ok(TcpStream::connect(("127.0.0.1", port)).await?)
}

/// Reads whitespace-separated tokens from stdin, one line at a time, and
/// sends the resulting input report frame after each line. Recognized
/// tokens:
///
/// - shorthand: `x` Cross, `o` Circle, `s` Square, `t` Triangle, `c` PS,
///   `u`/`d`/`l`/`r` D-pad
/// - full button names (case-insensitive), e.g. `select`, `l1`, `start`
/// - `stk`: jitter both sticks to a random position
/// - `quit`: disconnect and exit cleanly
///
/// Unrecognized tokens are reported and skipped; the exit code is 0 on
/// `quit` or SIGINT/Ctrl-C, 1 on a connection error.
async fn run_interactive(mut stream: TcpStream) -> Result<i32, Box<dyn Error>> {
    let mut report = InputReport::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("interrupted, disconnecting");
                return Ok(0);
            }
        };
        let Some(line) = line else {
            return Ok(0);
        };

        let mut pressed_any = false;
        for token in line.split_whitespace() {
            if token.eq_ignore_ascii_case("quit") {
                return Ok(0);
            }
            if token.eq_ignore_ascii_case("stk") {
                jitter_sticks(&mut report);
                pressed_any = true;
                continue;
            }
            match parse_button(token) {
                Some(button) => {
                    report.set_button(button, true, Some(255));
                    pressed_any = true;
                }
                None => eprintln!("unrecognized token: {token}"),
            }
        }
        if !pressed_any {
            continue;
        }

        if let Err(e) = stream
            .write_all(&report.bytes[..crate::report::input::WIRE_LEN])
            .await
        {
            eprintln!("write failed: {e}");
            return Ok(1);
        }
    }
}

fn jitter_sticks(report: &mut InputReport) {
    let mut rng = rand::thread_rng();
    report.set_stick(
        rng.gen_range(0..=255),
        rng.gen_range(0..=255),
        rng.gen_range(0..=255),
        rng.gen_range(0..=255),
    );
}

fn parse_button(token: &str) -> Option<Button> {
    match token.to_ascii_lowercase().as_str() {
        "x" | "cross" => Some(Button::Cross),
        "o" | "circle" => Some(Button::Circle),
        "s" | "square" => Some(Button::Square),
        "t" | "triangle" => Some(Button::Triangle),
        "c" | "ps" => Some(Button::Ps),
        "u" | "up" => Some(Button::Up),
        "d" | "down" => Some(Button::Down),
        "l" | "left" => Some(Button::Left),
        "r" | "right" => Some(Button::Right),
        "select" => Some(Button::Select),
        "start" => Some(Button::Start),
        "l1" => Some(Button::L1),
        "l2" => Some(Button::L2),
        "l3" => Some(Button::L3),
        "r1" => Some(Button::R1),
        "r2" => Some(Button::R2),
        "r3" => Some(Button::R3),
        _ => None,
    }
}
