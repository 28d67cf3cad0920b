use std::io::{self, Write};
use std::time::Duration;

use microhub_core::timer::{format_clock, format_stopwatch, Countdown, Stopwatch};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::error::CliError;

pub async fn run_timer(minutes: u64) -> Result<(), CliError> {
    if minutes == 0 {
        return Err(CliError::EmptyText("Timer duration"));
    }
    let mut countdown = Countdown::default();
    countdown.set_preset(minutes);
    countdown.start();

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    draw(&countdown_line(&countdown))?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let finished = countdown.tick();
                draw(&countdown_line(&countdown))?;
                if finished {
                    println!("\nTime is up!");
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopped at {}", format_clock(countdown.remaining_secs()));
                return Ok(());
            }
        }
    }
}

pub async fn run_stopwatch() -> Result<(), CliError> {
    let origin = Instant::now();
    let now_ms = || u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut stopwatch = Stopwatch::new();
    stopwatch.start(now_ms());
    println!("Stopwatch running. Enter records a lap, q then Enter stops.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }
        if let Some(lap) = stopwatch.lap(now_ms()) {
            println!("Lap {:>3}  {}", stopwatch.laps().len(), format_stopwatch(lap));
        }
    }

    stopwatch.pause(now_ms());
    println!("Total    {}", format_stopwatch(stopwatch.elapsed_ms(now_ms())));
    Ok(())
}

pub fn countdown_line(countdown: &Countdown) -> String {
    const WIDTH: usize = 20;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (countdown.progress() * WIDTH as f64).round() as usize;
    format!(
        "{}  [{}{}]",
        format_clock(countdown.remaining_secs()),
        "#".repeat(filled.min(WIDTH)),
        "-".repeat(WIDTH - filled.min(WIDTH))
    )
}

fn draw(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "\r{line}")?;
    stdout.flush()
}
