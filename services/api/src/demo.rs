use crate::infra::{
    demo_inventory, demo_submissions, parse_instant, InMemoryActivityFeed,
    InMemoryAllocationRepository,
};
use chrono::{DateTime, Utc};
use clap::Args;
use food_rescue::allocation::{
    AllocationService, FixedClock, InventorySnapshot, MatchCandidate, NeedId, RecommendationEngine,
    SequentialIds, SnapshotImporter, SubmissionId,
};
use food_rescue::config::AppConfig;
use food_rescue::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// CSV export of inventory lots
    #[arg(long)]
    pub(crate) lots: PathBuf,
    /// CSV export of beneficiary needs
    #[arg(long)]
    pub(crate) needs: PathBuf,
    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Print candidates as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pin the demo clock (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Stop after printing recommendations.
    #[arg(long)]
    pub(crate) skip_commit: bool,
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let RecommendArgs {
        lots,
        needs,
        now,
        json,
    } = args;

    let config = AppConfig::load()?;
    let snapshot = SnapshotImporter::from_paths(lots, needs)?;
    let now = now.unwrap_or_else(Utc::now);
    let engine = RecommendationEngine::new(config.allocation.recommendation);
    let candidates = engine.recommend(&snapshot, now);

    if json {
        match serde_json::to_string_pretty(&candidates) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Recommendations unavailable as JSON: {err}"),
        }
        return Ok(());
    }

    println!(
        "Recommendations at {} ({} lots, {} needs)",
        now.format("%Y-%m-%d %H:%M UTC"),
        snapshot.lots.len(),
        snapshot.needs.len()
    );
    render_candidates(&snapshot, &candidates);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { now, skip_commit } = args;
    let now = now.unwrap_or_else(Utc::now);

    let repository = Arc::new(InMemoryAllocationRepository::seeded(
        demo_inventory(now),
        demo_submissions(now),
    ));
    let service = AllocationService::with_collaborators(
        repository,
        Arc::new(InMemoryActivityFeed::default()),
        food_rescue::config::AllocationConfig::default(),
        Arc::new(FixedClock(now)),
        Arc::new(SequentialIds::new()),
    );

    println!("Food rescue allocation demo ({})", now.format("%Y-%m-%d"));
    let snapshot = demo_inventory(now);
    let candidates = service.recommend()?;
    render_candidates(&snapshot, &candidates);

    if skip_commit {
        return Ok(());
    }

    println!("\nCommitting the first recommendation");
    match candidates.first() {
        Some(candidate) => match service.accept(candidate) {
            Ok(receipt) => println!(
                "- {} -> {}: {} moved, {} left in lot, {} still needed",
                receipt.transfer.lot_id,
                receipt.transfer.need_id,
                receipt.transfer.quantity,
                receipt.transfer.lot_remaining,
                receipt.transfer.need_remaining
            ),
            Err(err) => println!("  Commit rejected: {err}"),
        },
        None => println!("  Nothing to commit"),
    }

    println!("\nMatching pending donation sub003 to need03");
    match service.match_submission(
        &SubmissionId("sub003".to_string()),
        &NeedId("need03".to_string()),
    ) {
        Ok(outcome) => {
            for lot in &outcome.lots {
                println!(
                    "- New lot {}: {} {} {} ({}), expires {}",
                    lot.id,
                    lot.quantity(),
                    lot.unit,
                    lot.item_name,
                    lot.category.label(),
                    lot.expires_at.format("%Y-%m-%d")
                );
            }
        }
        Err(err) => println!("  Intake rejected: {err}"),
    }

    println!("\nRecent activity");
    for activity in service.activities(10)? {
        println!(
            "- [{}] {} {}",
            activity.kind.label(),
            activity.timestamp.format("%H:%M"),
            activity.description
        );
    }

    println!("\nLow stock");
    let low_stock = service.low_stock()?;
    if low_stock.is_empty() {
        println!("- none");
    }
    for lot in low_stock {
        println!("- {} {}: {} {}", lot.id, lot.item_name, lot.quantity(), lot.unit);
    }

    println!("\nSuggested donations");
    for suggestion in service.suggestions()? {
        println!("- {}: {}", suggestion.item_name, suggestion.reason);
    }

    Ok(())
}

fn render_candidates(snapshot: &InventorySnapshot, candidates: &[MatchCandidate]) {
    if candidates.is_empty() {
        println!("- no matches proposed");
        return;
    }

    for candidate in candidates {
        let item = snapshot
            .lot(&candidate.lot_id)
            .map(|lot| format!("{} {}", lot.unit, lot.item_name))
            .unwrap_or_else(|| candidate.lot_id.to_string());
        let beneficiary = snapshot
            .need(&candidate.need_id)
            .map(|need| need.beneficiary_name.as_str())
            .unwrap_or(candidate.need_id.0.as_str());
        println!(
            "- {} {} -> {} [{:?}]",
            candidate.quantity, item, beneficiary, candidate.rule
        );
        println!("  {}", candidate.reason);
    }
}
