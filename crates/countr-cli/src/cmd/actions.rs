//! `countr actions`: list the action catalog

use anyhow::Result;
use countr_flows::ActionCatalog;
use std::io::Write;

pub fn run(catalog: &ActionCatalog, out: &mut impl Write) -> Result<()> {
    for descriptor in catalog.iter() {
        let mut usage = descriptor.key.to_string();
        for property in descriptor.properties {
            usage.push_str(&format!(" <{}>", property.kind));
        }
        writeln!(out, "{}  {}", usage, descriptor.short)?;
        if let Some(long) = descriptor.long {
            for line in long.lines() {
                writeln!(out, "    {}", line)?;
            }
        }
    }
    Ok(())
}
