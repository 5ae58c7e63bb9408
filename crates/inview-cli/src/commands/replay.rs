use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use inview_core::scenario::{Scenario, UnitSnapshot};
use inview_core::AppConfig;

pub fn run(config: &AppConfig, path: &Path, summary: bool) -> Result<()> {
    let scenario = Scenario::load(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    info!(
        scenario = %path.display(),
        started_at = %Local::now().format("%Y-%m-%d %H:%M:%S"),
        "Replaying scenario"
    );

    let trace = scenario.replay(config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !summary {
        for record in &trace {
            writeln!(out, "{}", record.to_json_line()?)?;
        }
        return Ok(());
    }

    let Some(last) = trace.last() else {
        return Ok(());
    };
    writeln!(out, "Scenario: {}", path.display())?;
    writeln!(out, "Steps: {} | Time: {}ms\n", trace.len() - 1, last.time_ms)?;

    for (name, snapshot) in &last.units {
        let state = match snapshot {
            UnitSnapshot::Visibility(state) => format!(
                "visible={} seen={}",
                state.is_visible, state.has_been_visible
            ),
            UnitSnapshot::Scroll(state) => format!(
                "offset={} direction={:?} past_threshold={} progress={:.2}",
                state.offset, state.direction, state.past_threshold, state.progress
            ),
            UnitSnapshot::CountUp(state) => format!(
                "count={} animating={} done={}",
                state.count, state.is_animating, state.has_animated
            ),
            UnitSnapshot::Activation(record) => format!("triggered={}", record.has_triggered),
            UnitSnapshot::Section { duration_ms, .. } => match duration_ms {
                Some(ms) => format!("measured {}ms", ms),
                None => "not measured".to_string(),
            },
        };
        writeln!(out, "  {:<16} {}", name, state)?;
    }

    Ok(())
}
