//! Offline runner: drives one event fixture through the full lifecycle —
//! registration, uploads, configuration, assignment generation, ballots,
//! results — against the in-memory store, then renders the outcome.

mod args;

use std::error::Error;
use std::fs;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use tracing::warn;

use rv_core::entities::{Event, Role, User, VotingConfig};
use rv_core::ids::{AttachmentId, EventId, UserId};
use rv_core::stage::Stage;
use rv_engine::{NewAttachment, RankingEntry, VotingService};
use rv_report::{build_model, render_json::render_report_json_string, render_report_text};
use rv_store::{MemoryStore, Store};

use args::Args;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    event: FixtureEvent,
    admin: FixtureUser,
    participants: Vec<FixtureParticipant>,
    config: FixtureConfig,
    #[serde(default)]
    ballots: Vec<FixtureBallot>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureEvent {
    id: EventId,
    name: String,
    #[serde(default)]
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureUser {
    id: UserId,
    display_name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureParticipant {
    id: UserId,
    display_name: String,
    email: String,
    #[serde(default)]
    proposal: Option<FixtureProposal>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureProposal {
    id: AttachmentId,
    original_name: String,
    #[serde(default = "default_size")]
    size_bytes: u64,
    #[serde(default = "default_mime")]
    mime_label: String,
}

fn default_size() -> u64 {
    1
}

fn default_mime() -> String {
    "application/octet-stream".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureConfig {
    attachments_per_evaluator: u32,
    min_coverage: u32,
    quality_good: f64,
    quality_bad: f64,
    adjustment: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureBallot {
    voter: UserId,
    rankings: Vec<RankingEntry>,
}

fn run(args: &Args, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let raw = fs::read_to_string(&args.fixture)?;
    let fixture: Fixture = serde_json::from_str(&raw)?;

    let svc = VotingService::new(MemoryStore::new());
    let admin = fixture.admin.id.clone();
    svc.create_user(User {
        id: admin.clone(),
        display_name: fixture.admin.display_name.clone(),
        email: fixture.admin.email.clone(),
        role: Role::Admin,
    })?;
    for p in &fixture.participants {
        svc.create_user(User {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            email: p.email.clone(),
            role: Role::Participant,
        })?;
    }

    let event_id: EventId = fixture.event.id.clone();
    svc.create_event(Event {
        id: event_id.clone(),
        name: fixture.event.name.clone(),
        description: fixture.event.description.clone(),
        author: admin.clone(),
        start_date: fixture.event.start_date,
        end_date: fixture.event.end_date,
        stage: Stage::Creation,
    })?;

    svc.advance_stage(&admin, &event_id, Stage::Registration, false)?;
    for p in &fixture.participants {
        svc.register_participant(&event_id, &p.id, Utc::now())?;
    }

    let cfg = VotingConfig {
        event: event_id.clone(),
        attachments_per_evaluator: fixture.config.attachments_per_evaluator,
        min_coverage: fixture.config.min_coverage,
        quality_good: fixture.config.quality_good,
        quality_bad: fixture.config.quality_bad,
        adjustment: fixture.config.adjustment,
        seed: None,
    };
    for w in svc.create_config(&admin, cfg.clone())? {
        eprintln!("configuration warning: {w}");
    }

    svc.advance_stage(&admin, &event_id, Stage::AttachmentUpload, false)?;
    for p in &fixture.participants {
        if let Some(proposal) = &p.proposal {
            svc.upload_attachment(
                &event_id,
                &p.id,
                NewAttachment {
                    id: proposal.id.clone(),
                    original_name: proposal.original_name.clone(),
                    stored_path: format!("fixture/{}", proposal.id),
                    size_bytes: proposal.size_bytes,
                    mime_label: proposal.mime_label.clone(),
                },
            )?;
        }
    }

    // Strict mode re-runs the full validation against the final population.
    let preview = svc.preview_config(&event_id, &cfg, args.strict)?;
    for w in &preview.warnings {
        eprintln!("configuration warning: {w}");
    }

    svc.advance_stage(&admin, &event_id, Stage::Voting, false)?;
    svc.generate_assignments(&admin, &event_id, seed)?;

    for ballot in &fixture.ballots {
        let assignment = svc.store().assignment_for(&event_id, &ballot.voter)?;
        svc.intake_ballot(
            &event_id,
            &ballot.voter,
            &assignment.id,
            &ballot.rankings,
            Utc::now(),
        )?;
    }

    let open = svc
        .store()
        .assignments_by_event(&event_id)?
        .iter()
        .filter(|a| !a.completed)
        .count();
    if open > 0 {
        warn!(open, "closing the vote with incomplete assignments");
    }
    svc.advance_stage(&admin, &event_id, Stage::Results, open > 0)?;
    let results = svc.compute_results(&event_id, Utc::now())?;

    let event = svc.store().event(&event_id)?;
    let model = build_model(&event, &results);

    fs::create_dir_all(&args.out)?;
    let out_path = args.out.join("results.json");
    fs::write(&out_path, render_report_json_string(&model))?;
    if !args.quiet {
        print!("{}", render_report_text(&model));
        println!("written: {}", out_path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let seed = match args::validate(&args) {
        Ok(seed) => seed,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args, seed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
