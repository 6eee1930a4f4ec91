use crate::duration::{self, ActivityTime};
use crate::error::{Result, TrackerError};

pub fn execute(inicio: &str, fin: &str, json: bool) -> Result<()> {
    // The calculator reads bad input as zero; on the command line say so instead
    for value in [inicio, fin] {
        if duration::parse_clock(value).is_none() {
            return Err(TrackerError::InvalidTime(value.to_string()));
        }
    }

    let time = duration::elapsed(inicio, fin);

    if json {
        println!("{}", render_json(&time));
    } else {
        println!(
            "{} -> {}: {} min ({})",
            inicio,
            fin,
            time.minutes,
            duration::format_minutes(time.minutes)
        );
        if time.crosses_midnight {
            println!("  Crosses midnight: end time is on the next day");
        }
    }

    Ok(())
}

fn render_json(time: &ActivityTime) -> serde_json::Value {
    serde_json::json!({
        "tiempo": time.minutes,
        "cruzaMedianoche": time.crosses_midnight,
    })
}
