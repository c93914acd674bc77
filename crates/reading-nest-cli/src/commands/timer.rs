use clap::Subcommand;
use reading_nest_core::storage::Database;
use reading_nest_core::timer::{fmt_clock, period_for_hz, Ticker};
use reading_nest_core::{Config, Event, Nest};
use std::io::Write;

use super::{open_nest, print_json, save_engine, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Set the session length in minutes (5-180); resets the timer
    Set { minutes: u32 },
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Reset to the full session length
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Run the countdown in the foreground until it ends or Ctrl-C pauses it
    Run {
        /// Set the session length first
        #[arg(long)]
        minutes: Option<u32>,
    },
}

pub fn run(action: TimerAction, config: &Config) -> CliResult {
    let mut nest = open_nest(config)?;

    match action {
        TimerAction::Set { minutes } => {
            let event = nest.configure_timer(minutes)?;
            print_json(&event)?;
        }
        TimerAction::Start => {
            if nest.active_book().is_none() {
                eprintln!("Pick a book, then start slow.");
            }
            match nest.timer_mut().start() {
                Some(event) => print_json(&event)?,
                None => print_json(&nest.timer().snapshot())?,
            }
        }
        TimerAction::Pause => {
            let event = nest.timer_mut().pause();
            print_json(&nest.timer().snapshot())?;
            if let Some(event @ Event::TimerExpired { .. }) = event {
                print_json(&event)?;
            }
        }
        TimerAction::Reset => {
            let event = nest.reset_timer()?;
            print_json(&event)?;
        }
        TimerAction::Status => {
            let completed = nest.timer_mut().tick();
            print_json(&nest.timer().snapshot())?;
            if let Some(event) = completed {
                print_json(&event)?;
            }
        }
        TimerAction::Run { minutes } => {
            if let Some(minutes) = minutes {
                nest.configure_timer(minutes)?;
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(countdown(&mut nest, config))?;
        }
    }

    save_engine(&nest)?;
    Ok(())
}

/// Foreground countdown. The ticker is shut down on every way out of the
/// loop: expiry, Ctrl-C, or an error writing the display.
async fn countdown(nest: &mut Nest<Database>, config: &Config) -> CliResult {
    match nest.active_book() {
        Some(book) => eprintln!("Reading: {}", book.title),
        None => eprintln!("Pick a book, then start slow."),
    }
    nest.timer_mut().start();
    save_engine(nest)?;
    eprintln!("Tiny steps. No sprinting.");

    let mut ticker = Ticker::spawn(period_for_hz(config.timer.refresh_hz));
    let outcome = drive(nest, &mut ticker).await;
    ticker.shutdown().await;
    eprintln!();

    match outcome? {
        Some(event @ Event::TimerExpired { .. }) => {
            if config.timer.bell {
                eprint!("\x07");
            }
            eprintln!("Done. Log it (or just bask).");
            print_json(&event)?;
        }
        Some(event) => {
            eprintln!("Paused. Sloths approve.");
            print_json(&event)?;
        }
        None => print_json(&nest.timer().snapshot())?,
    }
    Ok(())
}

/// Tick until the countdown expires or Ctrl-C pauses it.
async fn drive(nest: &mut Nest<Database>, ticker: &mut Ticker) -> CliResult<Option<Event>> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stderr = std::io::stderr();

    loop {
        tokio::select! {
            _ = &mut ctrl_c => return Ok(nest.timer_mut().pause()),
            beat = ticker.next() => {
                if !beat {
                    return Ok(None);
                }
                let expired = nest.timer_mut().tick();
                write!(stderr, "\r  {}  ", fmt_clock(nest.timer().left_sec()))?;
                stderr.flush()?;
                if expired.is_some() {
                    return Ok(expired);
                }
            }
        }
    }
}
