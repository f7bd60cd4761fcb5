//! List known result codes.

use anyhow::Result;
use serde::Serialize;
use ts3_bridge::ReturnCode;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct CodeRow {
    name: &'static str,
    value: u32,
    hex: String,
}

fn rows(filter: Option<&str>) -> Vec<CodeRow> {
    let needle = filter.map(str::to_lowercase);
    ReturnCode::KNOWN
        .iter()
        .filter(|(_, name)| match &needle {
            Some(needle) => name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .map(|&(code, name)| CodeRow {
            name,
            value: code.raw(),
            hex: format!("0x{:04x}", code.raw()),
        })
        .collect()
}

/// Run the codes command.
pub fn run(filter: Option<&str>, json: bool) -> Result<()> {
    let rows = rows(filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        println!("{}  {}", row.hex, row.name);
    }
    if rows.is_empty() {
        println!("No result codes match {:?}", filter.unwrap_or(""));
    }
    Ok(())
}
