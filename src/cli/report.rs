//! Plain-text report: one card plus three sections per user

use std::collections::HashMap;
use std::fmt::Write;

use selfdash::services::Aggregator;
use selfdash::types::{UserBundle, UserResult};

/// Widest bar drawn for a daily commit count
const MAX_BAR: u64 = 40;

pub fn render(results: &[UserResult]) -> String {
    let mut out = String::new();
    for result in results {
        match result {
            UserResult::Ready(bundle) => render_bundle(&mut out, bundle),
            UserResult::Failed { username, reason } => {
                let _ = writeln!(out, "== {} ==", username);
                let _ = writeln!(out, "  error or API limit: {}", reason);
            }
        }
        out.push('\n');
    }
    out
}

fn render_bundle(out: &mut String, bundle: &UserBundle) {
    let s = &bundle.summary;
    let _ = writeln!(out, "== {} ==", s.username);
    let _ = writeln!(out, "  Repositories: {}", s.public_repos);
    let _ = writeln!(out, "  Followers / Following: {} / {}", s.followers, s.following);
    let _ = writeln!(out, "  Public events: {}", s.public_events);

    let _ = writeln!(out, "  Commits:");
    if bundle.commit_days.is_empty() {
        let _ = writeln!(out, "    (none)");
    }
    for day in &bundle.commit_days {
        let bar = "#".repeat(day.count.min(MAX_BAR) as usize);
        let _ = writeln!(out, "    {}  {:>4} {}", day.date, day.count, bar);
    }

    render_histogram(out, "Languages", &bundle.languages);
    render_histogram(out, "Events", &bundle.events);
}

fn render_histogram(out: &mut String, title: &str, histogram: &HashMap<String, u64>) {
    let _ = writeln!(out, "  {} ({}):", title, Aggregator::total(histogram));
    if histogram.is_empty() {
        let _ = writeln!(out, "    (none)");
        return;
    }
    for (name, count) in sorted_desc(histogram) {
        let _ = writeln!(out, "    {:<20} {}", name, count);
    }
}

/// Highest count first; ties by name
fn sorted_desc(histogram: &HashMap<String, u64>) -> Vec<(&String, &u64)> {
    let mut entries: Vec<(&String, &u64)> = histogram.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
}
