//! Fixed-width plain-text renderer for terminals and logs.

use std::fmt::Write as _;

use crate::structure::{RankingRow, ReportModel};

fn push_table(out: &mut String, title: &str, rows: &[RankingRow]) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(
        out,
        "{:>4}  {:<20} {:<12} {:>6} {:>7} {:>5} {:>8} {:>5}",
        "rank", "proposal", "owner", "points", "mbc", "votes", "avg", "move"
    );
    for r in rows {
        let movement = match r.movement {
            0 => "·".to_string(),
            d if d < 0 => format!("↑{}", -d),
            d => format!("↓{d}"),
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<20} {:<12} {:>6} {:>7} {:>5} {:>8} {:>5}",
            r.rank,
            truncate(&r.original_name, 20),
            truncate(&r.owner_id, 12),
            r.borda_points,
            r.mbc,
            r.votes,
            r.average_rank,
            movement
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Render the whole report as plain text.
pub fn render_report_text(model: &ReportModel) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) — stage {}, computed {}",
        model.cover.event_name, model.cover.event_id, model.cover.stage, model.cover.calculated_at
    );
    let _ = writeln!(
        out,
        "proposals {}  participants {}  votes {}  completed assignments {}",
        model.totals.attachments,
        model.totals.participants,
        model.totals.votes,
        model.totals.completed_assignments
    );
    out.push('\n');

    push_table(&mut out, "Global ranking", &model.global_ranking);
    out.push('\n');

    let _ = writeln!(out, "Evaluator quality");
    for q in &model.evaluator_qualities {
        let _ = writeln!(out, "  {:<12} {}", q.participant_id, q.quality);
    }
    out.push('\n');

    push_table(&mut out, "Adjusted ranking", &model.adjusted_ranking);
    out.push('\n');
    let _ = writeln!(out, "results digest: {}", model.integrity.results_digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_keeps_width() {
        assert_eq!(truncate("short", 20), "short");
        let long = "a-very-long-proposal-filename.pdf";
        let t = truncate(long, 20);
        assert!(t.chars().count() <= 20);
        assert!(t.ends_with('…'));
    }
}
