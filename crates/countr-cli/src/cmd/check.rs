//! `countr check`: compile every flow and explain it

use anyhow::{bail, Result};
use countr_flows::ActionCatalog;
use countr_platform::{GuildDirectory, RecordingPlatform};
use std::io::Write;

use crate::config::BotConfig;

pub fn run(config: &BotConfig, catalog: &ActionCatalog, out: &mut impl Write) -> Result<()> {
    let directory = RecordingPlatform::new(config.guild.clone());
    let compiled = config.compile(catalog, &directory);

    for (channel, flows) in &compiled.flows {
        let name = directory
            .channel(config.guild.id, *channel)
            .map(|c| format!("#{}", c.name))
            .unwrap_or_else(|| "(unknown channel)".to_string());
        let count = config.channels.get(channel).map(|c| c.count).unwrap_or(0);
        writeln!(out, "{} {} (count {})", channel.mention(), name, count)?;

        for flow in flows {
            let state = if flow.enabled { "" } else { " (disabled)" };
            writeln!(out, "  {}{}", flow.display_name(), state)?;
            for trigger in &flow.triggers {
                writeln!(out, "    when: {}", trigger)?;
            }
            for (index, line) in flow.explain(catalog)?.iter().enumerate() {
                writeln!(out, "    {}. {}", index + 1, line)?;
            }
        }
    }

    for issue in &compiled.issues {
        writeln!(
            out,
            "error: {} flow {}: {}",
            issue.channel.mention(),
            issue.label(),
            issue.error
        )?;
    }
    if !compiled.issues.is_empty() {
        bail!("{} flow(s) failed to compile", compiled.issues.len());
    }
    Ok(())
}
