//! End-to-end scenarios driven through the service against the in-memory
//! store: full lifecycle, literal vote tables with hand-computed outcomes,
//! duplicate/malformed ballots, stage gates, idempotent recomputation.

use chrono::{DateTime, TimeZone, Utc};

use rv_core::entities::{Event, Role, User, VotingConfig};
use rv_core::ids::{AttachmentId, EventId, UserId};
use rv_core::stage::Stage;
use rv_engine::{NewAttachment, RankingEntry, VotingService};
use rv_store::{MemoryStore, Store};

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn later() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap()
}

fn uid(s: &str) -> UserId {
    s.parse().unwrap()
}

fn att(s: &str) -> AttachmentId {
    s.parse().unwrap()
}

struct Fixture {
    svc: VotingService<MemoryStore>,
    event: EventId,
    admin: UserId,
    participants: Vec<UserId>,
}

/// Admin + n participants, event advanced into `registration` with everyone
/// joined and the given configuration stored.
fn registered(n: usize, cfg: VotingConfig) -> Fixture {
    let svc = VotingService::new(MemoryStore::new());
    let admin = uid("admin");
    svc.create_user(User {
        id: admin.clone(),
        display_name: "Admin".into(),
        email: "admin@example.com".into(),
        role: Role::Admin,
    })
    .unwrap();

    let participants: Vec<UserId> = (1..=n).map(|i| uid(&format!("P{i}"))).collect();
    for p in &participants {
        svc.create_user(User {
            id: p.clone(),
            display_name: p.to_string(),
            email: format!("{p}@example.com"),
            role: Role::Participant,
        })
        .unwrap();
    }

    let event: EventId = "evt-review".parse().unwrap();
    svc.create_event(Event {
        id: event.clone(),
        name: "proposal review".into(),
        description: String::new(),
        author: admin.clone(),
        start_date: ts(),
        end_date: later(),
        stage: Stage::Creation,
    })
    .unwrap();

    svc.advance_stage(&admin, &event, Stage::Registration, false)
        .unwrap();
    for p in &participants {
        svc.register_participant(&event, p, ts()).unwrap();
    }

    let mut cfg = cfg;
    cfg.event = event.clone();
    svc.create_config(&admin, cfg).unwrap();

    Fixture {
        svc,
        event,
        admin,
        participants,
    }
}

/// Through `attachment_upload`: each participant uploads one proposal
/// F<i> owned by P<i>.
fn uploaded(n: usize, cfg: VotingConfig) -> Fixture {
    let f = registered(n, cfg);
    f.svc
        .advance_stage(&f.admin, &f.event, Stage::AttachmentUpload, false)
        .unwrap();
    for (i, p) in f.participants.iter().enumerate() {
        f.svc
            .upload_attachment(
                &f.event,
                p,
                NewAttachment {
                    id: att(&format!("F{}", i + 1)),
                    original_name: format!("proposal-{}.pdf", i + 1),
                    stored_path: format!("/blobs/F{}", i + 1),
                    size_bytes: 1024,
                    mime_label: "application/pdf".into(),
                },
            )
            .unwrap();
    }
    f
}

/// Through `voting` with assignments generated from a pinned seed.
fn voting(n: usize, cfg: VotingConfig) -> Fixture {
    let f = uploaded(n, cfg);
    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Voting, false)
        .unwrap();
    f.svc
        .generate_assignments(&f.admin, &f.event, Some(7))
        .unwrap();
    f
}

fn base_cfg() -> VotingConfig {
    VotingConfig {
        event: "placeholder".parse().unwrap(),
        attachments_per_evaluator: 2,
        min_coverage: 2,
        quality_good: 0.6,
        quality_bad: 0.3,
        adjustment: 1,
        seed: None,
    }
}

fn submit(f: &Fixture, voter: &str, ranks: &[(&str, u32)]) -> rv_core::errors::Result<()> {
    let voter = uid(voter);
    let assignment = f.svc.store().assignment_for(&f.event, &voter).unwrap();
    let rankings: Vec<RankingEntry> = ranks
        .iter()
        .map(|(a, r)| RankingEntry::new(att(a), *r))
        .collect();
    f.svc
        .intake_ballot(&f.event, &voter, &assignment.id, &rankings, ts())
        .map(|_| ())
}

fn order_of(rows: &[rv_core::entities::AttachmentResult]) -> Vec<&str> {
    rows.iter().map(|r| r.attachment.as_str()).collect()
}

#[test]
fn minimal_run_ranks_by_consensus() {
    let f = voting(3, base_cfg());

    // With one owned file each and m = 2, the only possible assignment is
    // "everything you did not write".
    for (i, p) in f.participants.iter().enumerate() {
        let a = f.svc.store().assignment_for(&f.event, p).unwrap();
        let mut files = a.attachments.clone();
        files.sort();
        let own = att(&format!("F{}", i + 1));
        assert_eq!(files.len(), 2);
        assert!(!files.contains(&own));
    }

    submit(&f, "P1", &[("F2", 1), ("F3", 2)]).unwrap();
    submit(&f, "P2", &[("F1", 1), ("F3", 2)]).unwrap();
    submit(&f, "P3", &[("F1", 1), ("F2", 2)]).unwrap();

    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Results, false)
        .unwrap();
    let results = f.svc.compute_results(&f.event, later()).unwrap();

    assert_eq!(order_of(&results.global_ranking), ["F1", "F2", "F3"]);
    let mbc: Vec<f64> = results.global_ranking.iter().map(|r| r.mbc_score).collect();
    assert_eq!(mbc, [1.0, 0.5, 0.0]);

    for p in &f.participants {
        assert_eq!(results.participant_qualities[p], 1.0);
    }

    // Every owner earned the bonus; the −1 shift clamps and preserves order.
    assert_eq!(order_of(&results.adjusted_ranking), ["F1", "F2", "F3"]);
    for row in &results.global_ranking {
        assert_eq!(row.vote_count, 2);
    }
    assert_eq!(results.totals.attachments, 3);
    assert_eq!(results.totals.votes, 6);
    assert_eq!(results.totals.completed_assignments, 3);
}

#[test]
fn split_vote_still_earns_every_evaluator_the_bonus() {
    let f = voting(3, base_cfg());
    submit(&f, "P1", &[("F2", 1), ("F3", 2)]).unwrap();
    submit(&f, "P2", &[("F3", 1), ("F1", 2)]).unwrap();
    submit(&f, "P3", &[("F2", 1), ("F1", 2)]).unwrap();

    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Results, false)
        .unwrap();
    let results = f.svc.compute_results(&f.event, later()).unwrap();

    assert_eq!(order_of(&results.global_ranking), ["F2", "F3", "F1"]);
    let mbc: Vec<f64> = results.global_ranking.iter().map(|r| r.mbc_score).collect();
    assert_eq!(mbc, [1.0, 0.5, 0.0]);

    // Every evaluator's pairwise order agrees with the global order
    // restricted to their subset, so all three earn Q = 1 and the bonus
    // cancels out.
    for p in &f.participants {
        assert_eq!(results.participant_qualities[p], 1.0);
    }
    assert_eq!(order_of(&results.adjusted_ranking), ["F2", "F3", "F1"]);
}

#[test]
fn contrarian_evaluator_is_penalized_in_the_adjusted_ranking() {
    let f = voting(3, base_cfg());
    // Symmetric three-way tie on points; ids break it: [F1, F2, F3].
    // P2 ranks their subset against that consensus and lands at Q = 0.
    submit(&f, "P1", &[("F2", 1), ("F3", 2)]).unwrap();
    submit(&f, "P2", &[("F3", 1), ("F1", 2)]).unwrap();
    submit(&f, "P3", &[("F1", 1), ("F2", 2)]).unwrap();

    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Results, false)
        .unwrap();
    let results = f.svc.compute_results(&f.event, later()).unwrap();

    assert_eq!(order_of(&results.global_ranking), ["F1", "F2", "F3"]);
    assert_eq!(results.participant_qualities[&uid("P1")], 1.0);
    assert_eq!(results.participant_qualities[&uid("P2")], 0.0);
    assert_eq!(results.participant_qualities[&uid("P3")], 1.0);

    // F2 (owned by the contrarian P2) takes the +1 penalty; F1 and F3 get
    // the −1 bonus: [F1, F3, F2].
    assert_eq!(order_of(&results.adjusted_ranking), ["F1", "F3", "F2"]);
}

#[test]
fn mutual_self_conflict_makes_generation_infeasible() {
    let mut cfg = base_cfg();
    cfg.min_coverage = 1;
    let f = uploaded(2, cfg);
    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Voting, false)
        .unwrap();
    let err = f
        .svc
        .generate_assignments(&f.admin, &f.event, Some(1))
        .unwrap_err();
    assert_eq!(err.kind(), "infeasible_assignment");
    assert!(f.svc.store().assignments_by_event(&f.event).unwrap().is_empty());
}

#[test]
fn duplicate_ballot_changes_nothing() {
    let f = voting(3, base_cfg());
    submit(&f, "P1", &[("F2", 1), ("F3", 2)]).unwrap();
    let before = f.svc.store().votes_by_event(&f.event).unwrap();

    let err = submit(&f, "P1", &[("F2", 2), ("F3", 1)]).unwrap_err();
    assert_eq!(err.kind(), "duplicate_vote");

    let after = f.svc.store().votes_by_event(&f.event).unwrap();
    assert_eq!(before, after);
}

#[test]
fn malformed_rankings_write_nothing() {
    let f = voting(3, base_cfg());

    // m − 1 entries.
    let err = submit(&f, "P1", &[("F2", 1)]).unwrap_err();
    assert_eq!(err.kind(), "ranking_not_permutation");

    // Repeated rank.
    let err = submit(&f, "P1", &[("F2", 1), ("F3", 1)]).unwrap_err();
    assert_eq!(err.kind(), "ranking_not_permutation");

    // Attachment outside the assignment (P1 owns F1).
    let err = submit(&f, "P1", &[("F1", 1), ("F3", 2)]).unwrap_err();
    assert_eq!(err.kind(), "ranking_not_permutation");

    // Rank outside 1..=m.
    let err = submit(&f, "P1", &[("F2", 0), ("F3", 2)]).unwrap_err();
    assert_eq!(err.kind(), "ranking_not_permutation");

    assert!(f.svc.store().votes_by_event(&f.event).unwrap().is_empty());
    let a = f.svc.store().assignment_for(&f.event, &uid("P1")).unwrap();
    assert!(!a.completed);
}

#[test]
fn ballots_outside_voting_report_the_current_stage() {
    let f = uploaded(3, base_cfg());
    // Still in attachment_upload: a ballot must bounce with the stage name.
    let voter = uid("P1");
    let err = f
        .svc
        .intake_ballot(
            &f.event,
            &voter,
            &"asg-unknown".parse().unwrap(),
            &[RankingEntry::new(att("F2"), 1), RankingEntry::new(att("F3"), 2)],
            ts(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), "wrong_stage");
    assert_eq!(
        err.detail().get("current_stage").map(String::as_str),
        Some("attachment_upload")
    );
}

#[test]
fn recomputation_is_idempotent() {
    let f = voting(3, base_cfg());
    submit(&f, "P1", &[("F2", 1), ("F3", 2)]).unwrap();
    submit(&f, "P2", &[("F1", 1), ("F3", 2)]).unwrap();
    submit(&f, "P3", &[("F1", 1), ("F2", 2)]).unwrap();
    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Results, false)
        .unwrap();

    let first = f.svc.compute_results(&f.event, later()).unwrap();
    let second = f.svc.compute_results(&f.event, later()).unwrap();
    assert_eq!(first, second);

    // A different wall clock moves only the timestamp, never the digest.
    let third = f
        .svc
        .compute_results(&f.event, later() + chrono::Duration::hours(1))
        .unwrap();
    assert_eq!(third.digest, first.digest);
    assert_eq!(third.global_ranking, first.global_ranking);
    assert_eq!(third.adjusted_ranking, first.adjusted_ranking);

    // The stored row was replaced in place.
    let stored = f.svc.get_results(&f.event).unwrap();
    assert_eq!(stored.calculated_at, third.calculated_at);
}

#[test]
fn forced_closure_scores_the_votes_that_exist() {
    let f = voting(3, base_cfg());
    // Only P1 votes; F1 ends up voteless.
    submit(&f, "P1", &[("F2", 1), ("F3", 2)]).unwrap();

    // Without force the transition is refused while assignments are open.
    let err = f
        .svc
        .advance_stage(&f.admin, &f.event, Stage::Results, false)
        .unwrap_err();
    assert_eq!(err.kind(), "wrong_stage");

    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Results, true)
        .unwrap();
    let results = f.svc.compute_results(&f.event, later()).unwrap();

    // Voteless F1 scores MBC 0 and sits below every voted attachment.
    assert_eq!(order_of(&results.global_ranking), ["F2", "F3", "F1"]);
    let f1 = &results.global_ranking[2];
    assert_eq!(f1.vote_count, 0);
    assert_eq!(f1.mbc_score, 0.0);
    assert_eq!(f1.borda_points, 0);

    // Non-voters have no quality and their proposals move by Δ = 0.
    assert_eq!(results.participant_qualities.len(), 1);
    assert!(results.participant_qualities.contains_key(&uid("P1")));
}

#[test]
fn single_review_assignments_degenerate_gracefully() {
    // m = 1: the MBC divisor m·(m−1) vanishes, quality is undefined, and
    // every adjustment is neutral.
    let mut cfg = base_cfg();
    cfg.attachments_per_evaluator = 1;
    cfg.min_coverage = 1;
    let f = voting(2, cfg);

    submit(&f, "P1", &[("F2", 1)]).unwrap();
    submit(&f, "P2", &[("F1", 1)]).unwrap();

    f.svc
        .advance_stage(&f.admin, &f.event, Stage::Results, false)
        .unwrap();
    let results = f.svc.compute_results(&f.event, later()).unwrap();

    for row in &results.global_ranking {
        assert_eq!(row.borda_points, 0);
        assert_eq!(row.mbc_score, 0.0);
        assert_eq!(row.vote_count, 1);
    }
    assert!(results.participant_qualities.is_empty());
    assert_eq!(
        order_of(&results.adjusted_ranking),
        order_of(&results.global_ranking)
    );
}

#[test]
fn stage_machine_rejects_skips_and_non_admins() {
    let f = registered(3, base_cfg());

    // Skipping a stage is refused.
    let err = f
        .svc
        .advance_stage(&f.admin, &f.event, Stage::Voting, false)
        .unwrap_err();
    assert_eq!(err.kind(), "wrong_stage");

    // A plain participant may not advance the event.
    let err = f
        .svc
        .advance_stage(&uid("P1"), &f.event, Stage::AttachmentUpload, false)
        .unwrap_err();
    assert_eq!(err.kind(), "forbidden");
}

#[test]
fn registration_gates_and_uniqueness() {
    let f = registered(3, base_cfg());

    let err = f.svc.register_participant(&f.event, &uid("P1"), ts()).unwrap_err();
    assert_eq!(err.kind(), "already_registered");

    f.svc
        .advance_stage(&f.admin, &f.event, Stage::AttachmentUpload, false)
        .unwrap();
    // Too late to join now.
    let outsider = f
        .svc
        .create_user(User {
            id: uid("P9"),
            display_name: "Late".into(),
            email: "late@example.com".into(),
            role: Role::Participant,
        })
        .unwrap();
    let err = f
        .svc
        .register_participant(&f.event, &outsider.id, ts())
        .unwrap_err();
    assert_eq!(err.kind(), "wrong_stage");
}

#[test]
fn upload_rules() {
    let f = uploaded(3, base_cfg());

    // Second proposal by the same participant.
    let err = f
        .svc
        .upload_attachment(
            &f.event,
            &uid("P1"),
            NewAttachment {
                id: att("F9"),
                original_name: "second.pdf".into(),
                stored_path: "/blobs/F9".into(),
                size_bytes: 10,
                mime_label: "application/pdf".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "duplicate_attachment");

    // Not a participant.
    f.svc
        .create_user(User {
            id: uid("stranger"),
            display_name: "Stranger".into(),
            email: "stranger@example.com".into(),
            role: Role::Participant,
        })
        .unwrap();
    let err = f
        .svc
        .upload_attachment(
            &f.event,
            &uid("stranger"),
            NewAttachment {
                id: att("F8"),
                original_name: "s.pdf".into(),
                stored_path: "/blobs/F8".into(),
                size_bytes: 10,
                mime_label: "application/pdf".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "not_registered");

    // Empty upload is rejected before the duplicate check.
    let err = f
        .svc
        .upload_attachment(
            &f.event,
            &uid("P2"),
            NewAttachment {
                id: att("F7"),
                original_name: "empty.pdf".into(),
                stored_path: "/blobs/F7".into(),
                size_bytes: 0,
                mime_label: "application/pdf".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_attachment");
}

#[test]
fn assignments_generate_only_once_with_a_replayable_seed() {
    let f = voting(3, base_cfg());
    let err = f
        .svc
        .generate_assignments(&f.admin, &f.event, Some(7))
        .unwrap_err();
    assert_eq!(err.kind(), "assignments_exist");

    // The effective seed was persisted onto the configuration.
    let cfg = f.svc.store().config(&f.event).unwrap();
    assert!(cfg.seed.is_some());

    // An identical event replayed with the same seed produces the same
    // assignment sets.
    let g = uploaded(3, base_cfg());
    g.svc
        .advance_stage(&g.admin, &g.event, Stage::Voting, false)
        .unwrap();
    g.svc
        .generate_assignments(&g.admin, &g.event, Some(7))
        .unwrap();
    for p in &f.participants {
        let a = f.svc.store().assignment_for(&f.event, p).unwrap();
        let b = g.svc.store().assignment_for(&g.event, p).unwrap();
        assert_eq!(a.attachments, b.attachments);
    }
}

#[test]
fn config_preview_warns_and_strict_mode_rejects() {
    let f = uploaded(3, base_cfg());
    let preview = f.svc.preview_config(&f.event, &f.svc.store().config(&f.event).unwrap(), false).unwrap();
    assert_eq!(preview.attachments, 3);
    assert_eq!(preview.participants, 3);
    // m = 2 < ceil(2·log2 3) = 4.
    assert!(!preview.warnings.is_empty());

    let err = f
        .svc
        .preview_config(&f.event, &f.svc.store().config(&f.event).unwrap(), true)
        .unwrap_err();
    assert_eq!(err.kind(), "config_invalid");
}

#[test]
fn config_update_delete_and_withdrawal_in_registration() {
    let f = registered(3, base_cfg());

    let mut cfg = f.svc.store().config(&f.event).unwrap();
    cfg.adjustment = 2;
    f.svc.update_config(&f.admin, cfg).unwrap();
    assert_eq!(f.svc.store().config(&f.event).unwrap().adjustment, 2);

    f.svc.withdraw_participant(&f.event, &uid("P3")).unwrap();
    let err = f.svc.withdraw_participant(&f.event, &uid("P3")).unwrap_err();
    assert_eq!(err.kind(), "not_registered");
    f.svc.register_participant(&f.event, &uid("P3"), ts()).unwrap();

    f.svc.delete_config(&f.admin, &f.event).unwrap();
    let err = f.svc.delete_config(&f.admin, &f.event).unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let mut again = base_cfg();
    again.event = f.event.clone();
    f.svc.create_config(&f.admin, again.clone()).unwrap();
    let err = f.svc.create_config(&f.admin, again).unwrap_err();
    assert_eq!(err.kind(), "config_exists");
}

#[test]
fn owners_delete_their_own_proposal_admins_delete_any() {
    let f = uploaded(3, base_cfg());

    f.svc
        .delete_attachment(&f.event, &uid("P1"), &att("F1"))
        .unwrap();

    // Someone else's proposal needs the admin gate.
    let err = f
        .svc
        .delete_attachment(&f.event, &uid("P1"), &att("F2"))
        .unwrap_err();
    assert_eq!(err.kind(), "forbidden");
    f.svc
        .delete_attachment(&f.event, &f.admin, &att("F2"))
        .unwrap();

    let err = f
        .svc
        .delete_attachment(&f.event, &uid("P1"), &att("F1"))
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn results_are_unreadable_before_the_results_stage() {
    let f = voting(3, base_cfg());
    let err = f.svc.get_results(&f.event).unwrap_err();
    assert_eq!(err.kind(), "wrong_stage");
    let err = f.svc.get_ranking(&f.event).unwrap_err();
    assert_eq!(err.kind(), "wrong_stage");
}
