//! Pure report data model + mapper from engine results.
//! No I/O, no recomputation. Deterministic ordering and formatting only.

use serde::Serialize;

use rv_core::entities::{Event, VotingResults};

/// Root of the report, sections in render order.
#[derive(Clone, Debug, Serialize)]
pub struct ReportModel {
    pub cover: CoverBlock,
    pub totals: TotalsBlock,
    pub global_ranking: Vec<RankingRow>,
    pub evaluator_qualities: Vec<QualityRow>,
    pub adjusted_ranking: Vec<RankingRow>,
    pub integrity: IntegrityBlock,
}

#[derive(Clone, Debug, Serialize)]
pub struct CoverBlock {
    pub event_id: String,
    pub event_name: String,
    pub stage: String,
    pub calculated_at: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TotalsBlock {
    pub attachments: u32,
    pub participants: u32,
    pub votes: u32,
    pub completed_assignments: u32,
}

/// One line of a ranking table. `mbc` and `average_rank` are pre-formatted
/// so renderers cannot drift on digits.
#[derive(Clone, Debug, Serialize)]
pub struct RankingRow {
    pub rank: u32,
    pub attachment_id: String,
    pub original_name: String,
    pub owner_id: String,
    pub borda_points: u64,
    pub mbc: String,
    pub votes: u32,
    pub average_rank: String,
    /// Positions gained (negative) or lost (positive) between the global and
    /// adjusted rankings.
    pub movement: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct QualityRow {
    pub participant_id: String,
    pub quality: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct IntegrityBlock {
    pub results_digest: String,
}

fn fmt3(x: f64) -> String {
    format!("{x:.3}")
}

/// Map persisted results into the report model.
pub fn build_model(event: &Event, results: &VotingResults) -> ReportModel {
    let rows = |list: &[rv_core::entities::AttachmentResult], adjusted: bool| {
        list.iter()
            .map(|r| RankingRow {
                rank: if adjusted { r.adjusted_rank } else { r.global_rank },
                attachment_id: r.attachment.to_string(),
                original_name: r.original_name.clone(),
                owner_id: r.owner.to_string(),
                borda_points: r.borda_points,
                mbc: fmt3(r.mbc_score),
                votes: r.vote_count,
                average_rank: fmt3(r.average_rank),
                movement: r.adjusted_rank as i64 - r.global_rank as i64,
            })
            .collect::<Vec<_>>()
    };

    ReportModel {
        cover: CoverBlock {
            event_id: event.id.to_string(),
            event_name: event.name.clone(),
            stage: event.stage.to_string(),
            calculated_at: results.calculated_at.to_rfc3339(),
        },
        totals: TotalsBlock {
            attachments: results.totals.attachments,
            participants: results.totals.participants,
            votes: results.totals.votes,
            completed_assignments: results.totals.completed_assignments,
        },
        global_ranking: rows(&results.global_ranking, false),
        evaluator_qualities: results
            .participant_qualities
            .iter()
            .map(|(p, q)| QualityRow {
                participant_id: p.to_string(),
                quality: fmt3(*q),
            })
            .collect(),
        adjusted_ranking: rows(&results.adjusted_ranking, true),
        integrity: IntegrityBlock {
            results_digest: results.digest.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rv_core::entities::{AttachmentResult, Totals};
    use rv_core::stage::Stage;
    use std::collections::BTreeMap;

    fn sample() -> (Event, VotingResults) {
        let row = |id: &str, owner: &str, g: u32, a: u32, points: u64| AttachmentResult {
            attachment: id.parse().unwrap(),
            owner: owner.parse().unwrap(),
            original_name: format!("{id}.pdf"),
            borda_points: points,
            mbc_score: points as f64 / 2.0,
            global_rank: g,
            adjusted_rank: a,
            vote_count: 2,
            average_rank: 1.5,
        };
        let event = Event {
            id: "evt".parse().unwrap(),
            name: "demo".into(),
            description: String::new(),
            author: "admin".parse().unwrap(),
            start_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
            stage: Stage::Results,
        };
        let results = VotingResults {
            event: "evt".parse().unwrap(),
            global_ranking: vec![row("F1", "P1", 1, 2, 2), row("F2", "P2", 2, 1, 1)],
            participant_qualities: BTreeMap::from([
                ("P1".parse().unwrap(), 1.0),
                ("P2".parse().unwrap(), 0.0),
            ]),
            adjusted_ranking: vec![row("F2", "P2", 2, 1, 1), row("F1", "P1", 1, 2, 2)],
            totals: Totals {
                attachments: 2,
                participants: 2,
                votes: 4,
                completed_assignments: 2,
            },
            digest: "a".repeat(64).parse().unwrap(),
            calculated_at: Utc.with_ymd_and_hms(2024, 5, 3, 8, 0, 0).unwrap(),
        };
        (event, results)
    }

    #[test]
    fn model_follows_persisted_order_and_formats_numbers() {
        let (event, results) = sample();
        let model = build_model(&event, &results);

        assert_eq!(model.global_ranking[0].attachment_id, "F1");
        assert_eq!(model.global_ranking[0].rank, 1);
        assert_eq!(model.global_ranking[0].movement, 1);
        assert_eq!(model.adjusted_ranking[0].attachment_id, "F2");
        assert_eq!(model.adjusted_ranking[0].rank, 1);
        assert_eq!(model.adjusted_ranking[0].movement, -1);

        assert_eq!(model.global_ranking[0].mbc, "1.000");
        assert_eq!(model.global_ranking[1].mbc, "0.500");
        assert_eq!(model.evaluator_qualities[0].quality, "1.000");
        assert_eq!(model.cover.stage, "results");
    }
}
