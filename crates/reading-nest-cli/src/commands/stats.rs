use reading_nest_core::Config;
use serde_json::json;

use super::{open_nest, print_json, CliResult};

pub fn run(config: &Config) -> CliResult {
    let nest = open_nest(config)?;
    let stats = nest.stats();
    print_json(&json!({
        "minutesToday": stats.minutes_today,
        "minutesLast7Days": stats.minutes_last_7_days,
        "sessionCount": stats.session_count,
        "books": nest.books().len(),
        "nowReading": nest.active_book().map(|b| b.title.as_str()),
    }))
}
