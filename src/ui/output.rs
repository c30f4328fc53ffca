use crate::analyser::containers::SourceMetrics;
use ansi_term::Colour;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::Path;

/// Prints flagged sources, one `address: rarity,breadth` line per source.
///
/// The map carries no ordering, so entries are sorted by address before
/// printing to keep runs comparable.
pub fn print_results(scanners: &HashMap<Ipv4Addr, SourceMetrics>) {
    println!("\n\u{250F}\u{2501}\u{2501}\u{2501}\u{2501} Results");
    print_scanners(scanners);
}

fn print_scanners(scanners: &HashMap<Ipv4Addr, SourceMetrics>) {
    println!("\u{2503}");
    println!(
        "\u{2503} Flagged sources  : {}",
        Colour::Red.paint(scanners.len().to_string())
    );
    println!("\u{2503}");

    let mut entries: Vec<_> = scanners.iter().collect();
    entries.sort_by_key(|(address, _)| u32::from(**address));

    for (address, metrics) in entries {
        println!(
            "\u{2503} {}: {}",
            Colour::Fixed(226).paint(address.to_string()),
            metrics
        );
    }
    println!("\u{2503}");
}

pub fn data_as_json(scanners: &HashMap<Ipv4Addr, SourceMetrics>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(scanners)
}

pub fn data_to_file(json: String, path: &Path) -> io::Result<()> {
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_report_round_trips() {
        let mut scanners = HashMap::new();
        scanners.insert(
            "10.0.0.3".parse::<Ipv4Addr>().unwrap(),
            SourceMetrics {
                rarity: 1.0,
                breadth: 1,
            },
        );

        let json = data_as_json(&scanners).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["10.0.0.3"]["rarity"], 1.0);
        assert_eq!(parsed["10.0.0.3"]["breadth"], 1);
    }
}
