use crate::infra::{sample_catalog, sample_registry};
use chrono::{DateTime, Utc};
use clap::Args;
use product_score::catalog::CatalogImporter;
use product_score::config::AppConfig;
use product_score::error::AppError;
use product_score::scoring::{
    CategoryRegistry, RankedProduct, ScoreRequest, ScoringService, ScoringServiceError,
    ScoringSettings,
};
use product_score::telemetry::{self, LogSink};
use serde::Serialize;
use std::path::PathBuf;

const DEMO_CATEGORY: &str = "robot_vacuum";

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    /// Category to rank within
    #[arg(long)]
    pub(crate) category: String,
    /// Product export to rank (.csv or .json)
    #[arg(long)]
    pub(crate) products: PathBuf,
    /// Directory of category definitions (defaults to SCORING_CATEGORY_DIR)
    #[arg(long, conflicts_with = "category_file")]
    pub(crate) category_dir: Option<PathBuf>,
    /// Load a single category definition file instead of a directory
    #[arg(long)]
    pub(crate) category_file: Option<PathBuf>,
    /// Usage context to apply; repeat or comma-separate for several
    #[arg(long = "context", value_delimiter = ',')]
    pub(crate) contexts: Vec<String>,
    /// Region consulted by region-specific context rules
    #[arg(long)]
    pub(crate) region: Option<String>,
    /// Only print the best N products
    #[arg(long)]
    pub(crate) top: Option<usize>,
    /// Print the per-criterion breakdown for each product
    #[arg(long)]
    pub(crate) breakdown: bool,
    /// Emit a JSON report instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Region consulted by region-specific context rules
    #[arg(long)]
    pub(crate) region: Option<String>,
    /// Print the per-criterion breakdown for each product
    #[arg(long)]
    pub(crate) breakdown: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankReport {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) category_id: String,
    pub(crate) context_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) region: Option<String>,
    pub(crate) rankings: Vec<RankedProduct>,
}

pub(crate) fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let RankArgs {
        category,
        products,
        category_dir,
        category_file,
        contexts,
        region,
        top,
        breakdown,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    let registry = match category_file {
        Some(path) => {
            CategoryRegistry::from_profiles(vec![CategoryRegistry::read_profile(&path)?])?
        }
        None => CategoryRegistry::load_dir(category_dir.unwrap_or(config.scoring.category_dir))?,
    };
    let service = ScoringService::new(registry);
    let records = CatalogImporter::from_path(&products)?;

    let request = ScoreRequest {
        context_ids: contexts,
        comparison_sample: Vec::new(),
        settings: ScoringSettings { region },
    };
    let mut rankings = service.rank(&category, &records, &request)?;
    if let Some(limit) = top {
        rankings.truncate(limit);
    }

    let report = RankReport {
        generated_at: Utc::now(),
        category_id: category,
        context_ids: request.context_ids,
        region: request.settings.region,
        rankings,
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Ranking payload unavailable: {err}"),
        }
    } else {
        render_report(&report, breakdown);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { region, breakdown } = args;

    let service = ScoringService::new(sample_registry()?);
    let records = sample_catalog()?;
    let settings = ScoringSettings { region };

    println!("Product scoring demo");
    println!(
        "Bundled catalog: {} robot vacuums scored against '{}'",
        records.len(),
        DEMO_CATEGORY
    );

    let scenarios: [&[&str]; 4] = [&[], &["apartment"], &["large_house", "pets"], &["nursery"]];
    for scenario in scenarios {
        let request = ScoreRequest {
            context_ids: scenario.iter().map(|id| id.to_string()).collect(),
            comparison_sample: Vec::new(),
            settings: settings.clone(),
        };
        let rankings = service.rank(DEMO_CATEGORY, &records, &request)?;
        println!();
        render_report(
            &RankReport {
                generated_at: Utc::now(),
                category_id: DEMO_CATEGORY.to_string(),
                context_ids: request.context_ids,
                region: settings.region.clone(),
                rankings,
            },
            breakdown,
        );
    }

    println!("\nConflicting selection (apartment + large_house)");
    let conflicting = ScoreRequest {
        context_ids: vec!["apartment".to_string(), "large_house".to_string()],
        comparison_sample: Vec::new(),
        settings,
    };
    match service.rank(DEMO_CATEGORY, &records, &conflicting) {
        Err(ScoringServiceError::Conflict(conflict)) => println!(
            "  Rejected: pick one of [{}] and retry",
            conflict.conflicting_contexts.join(", ")
        ),
        Err(err) => return Err(err.into()),
        Ok(_) => println!("  Unexpectedly accepted"),
    }

    Ok(())
}

pub(crate) fn render_report(report: &RankReport, breakdown: bool) {
    let contexts = if report.context_ids.is_empty() {
        "no context".to_string()
    } else {
        report.context_ids.join(", ")
    };
    match &report.region {
        Some(region) => println!(
            "Ranking for {} ({} | region {})",
            report.category_id, contexts, region
        ),
        None => println!("Ranking for {} ({})", report.category_id, contexts),
    }

    if report.rankings.is_empty() {
        println!("  No products to rank");
        return;
    }

    for ranked in &report.rankings {
        let result = &ranked.result;
        println!(
            "  {:>2}. {:<16} {:>5.2}  {}",
            ranked.rank,
            ranked.product_id,
            result.final_score,
            result.summary()
        );

        for penalty in &result.penalties {
            println!("      ! {}", penalty.reason);
        }
        if !result.strengths.is_empty() {
            let labels: Vec<&str> = result
                .strengths
                .iter()
                .map(|highlight| highlight.label.as_str())
                .collect();
            println!("      + {}", labels.join(", "));
        }
        if !result.weaknesses.is_empty() {
            let labels: Vec<&str> = result
                .weaknesses
                .iter()
                .map(|highlight| highlight.label.as_str())
                .collect();
            println!("      - {}", labels.join(", "));
        }

        if breakdown {
            for entry in &result.breakdown {
                let raw = entry
                    .raw_value
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "missing".to_string());
                println!(
                    "      {:<18} raw={:<10} x'={:>5.2} w={:.3}{}{}",
                    entry.label,
                    raw,
                    entry.normalized_value,
                    entry.weight,
                    if entry.imputed { " imputed" } else { "" },
                    if entry.is_vetoed { " VETO" } else { "" }
                );
            }
            if !result.excluded_criteria.is_empty() {
                println!("      excluded: {}", result.excluded_criteria.join(", "));
            }
        }
    }
}
