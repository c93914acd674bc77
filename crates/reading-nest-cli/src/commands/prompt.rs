use clap::Subcommand;
use reading_nest_core::Config;

use super::{open_nest, CliResult};

#[derive(Subcommand)]
pub enum PromptAction {
    /// Print today's prompt (picked once per day)
    Show,
    /// Replace the prompt
    New {
        /// Pick at random instead of today's seeded prompt
        #[arg(long)]
        random: bool,
    },
}

pub fn run(action: PromptAction, config: &Config) -> CliResult {
    let mut nest = open_nest(config)?;
    let today = nest.today();

    let prompt = match action {
        PromptAction::Show => nest.ensure_prompt(today)?,
        PromptAction::New { random } => nest.new_prompt(random, today)?,
    };
    println!("{prompt}");
    Ok(())
}
