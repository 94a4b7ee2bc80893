//! Reporter: component G.
//!
//! Renders the top-N slowest SQL statements and the error list on
//! shutdown. Deliberately reproduces the original's `i > n` loop break,
//! which prints `N + 1` entries rather than `N`.

use std::fmt::Write as _;

use console::style;

use crate::stats::aggregator::Snapshot;

const SEPARATOR: &str = "====================================================================================================";

/// Render the full shutdown report as a single string.
pub fn render(snapshot: &Snapshot, top_n: usize) -> String {
    let mut out = String::new();

    let mut entries: Vec<(&String, &crate::stats::aggregator::SqlStats)> =
        snapshot.by_sql.iter().collect();
    entries.sort_by(|a, b| b.1.max.cmp(&a.1.max));

    // Mirrors `for i := range slist { if i > n { break } }`: indices
    // 0..=n inclusive, i.e. n+1 entries, not n.
    for (query, stats) in entries.into_iter().take(top_n + 1) {
        #[allow(clippy::float_arithmetic)]
        let max_ms = stats.max as f64 / 1000.0;
        #[allow(clippy::float_arithmetic)]
        let min_ms = stats.min as f64 / 1000.0;
        let details: Vec<String> = stats
            .calls
            .iter()
            .map(|c| {
                #[allow(clippy::float_arithmetic)]
                let ms = *c as f64 / 1000.0;
                format!("{ms:.2}")
            })
            .collect();

        let body = format!(
            "{query}\nCall-Times: {calls}\nMin-Cost: {min_ms:.2} ms\nMax-Cost: {max_ms:.2} ms\nDetail-Cost: [{details}]",
            calls = stats.calls.len(),
            details = details.join(", "),
        );

        if max_ms > 500.0 {
            let _ignored = writeln!(out, "{}", style(body).red());
        } else if max_ms > 100.0 {
            let _ignored = writeln!(out, "{}", style(body).yellow());
        } else {
            let _ignored = writeln!(out, "{body}");
        }
        let _ignored = writeln!(out, "{SEPARATOR}");
    }

    for msg in &snapshot.errors {
        let line = format!(
            "{}, error: {}, errno: {}",
            msg.query,
            msg.error_info.as_deref().unwrap_or(""),
            msg.error_code.as_deref().unwrap_or(""),
        );
        let _ignored = writeln!(out, "{}", style(line).red());
        let _ignored = writeln!(out, "{SEPARATOR}");
    }

    out
}

/// Print the report to standard output.
pub fn print_report(snapshot: &Snapshot, top_n: usize) {
    print!("{}", render(snapshot, top_n));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregator::SqlStats;

    fn stats(max: u64) -> SqlStats {
        SqlStats { min: max, max, calls: vec![max] }
    }

    #[test]
    fn top_n_prints_n_plus_one_entries() {
        let mut snapshot = Snapshot::default();
        snapshot.by_sql.insert("a".to_string(), stats(1000));
        snapshot.by_sql.insert("b".to_string(), stats(5000));
        snapshot.by_sql.insert("c".to_string(), stats(3000));

        let report = render(&snapshot, 1);
        let present: Vec<&str> =
            ["a", "b", "c"].into_iter().filter(|q| report.lines().any(|l| l == *q)).collect();
        assert_eq!(present, vec!["b", "c"]);
    }
}
