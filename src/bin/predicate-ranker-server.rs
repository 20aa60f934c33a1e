//! Predicate ranker HTTP server binary

use chrono::{Datelike, Local};
use predicate_ranker::config;
use predicate_ranker::server::{run_server, AppState};
use predicate_ranker::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    println!("Predicate Ranker");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = EngineConfig::from_env()?;
    println!(
        "✓ Weights: text/feature {:.2}/{:.2}, similarity/risk {:.2}/{:.2}",
        config.similarity_weights.text,
        config.similarity_weights.feature,
        config.ranking_weights.similarity,
        config.ranking_weights.risk
    );
    println!(
        "✓ Age ceiling: {} years, top_n: {}",
        config.max_age_years, config.top_n
    );

    let source: Box<dyn CandidateSource> = match std::env::var("PREDICATE_POOL_PATH") {
        Ok(path) => {
            println!("✓ Pool: {}", path);
            Box::new(JsonFileSource::new(path))
        }
        Err(_) => {
            println!("✓ Pool: built-in demo candidates");
            println!("   (set PREDICATE_POOL_PATH to load a JSON pool)");
            Box::new(StaticSource::new(demo_candidates()))
        }
    };
    let pool = source.load()?;
    println!("✓ Loaded {} candidates via {}", pool.len(), source.name());

    let port = config::port_from_env()?;

    let state = Arc::new(AppState {
        engine: PredicateEngine::new(config)?,
        pool,
    });

    println!("✓ Starting HTTP server on port {}...", port);
    println!();

    run_server(state, port).await?;

    Ok(())
}

/// Small coronary catheter pool for local evaluation
fn demo_candidates() -> Vec<CandidateDevice> {
    let year = Local::now().date_naive().year();

    vec![
        CandidateDevice {
            k_number: "K-DEMO-001".to_string(),
            classification_code: "DQY".to_string(),
            device_name: "Rapid exchange PTCA balloon catheter".to_string(),
            applicant: "Demo Cardio Inc.".to_string(),
            decision_description: "Percutaneous coronary catheter for balloon angioplasty of \
                stenotic coronary arteries."
                .to_string(),
            summary_text: "Nylon balloon on a Pebax shaft with PTFE liner. Ethylene oxide \
                sterilized. Biocompatibility per ISO 10993-1."
                .to_string(),
            decision_date: format!("{}-04-12", year - 1),
            recall_count: 0,
            adverse_event_trend: AdverseEventTrend::Excellent,
            clinical_data_history: ClinicalDataHistory::No,
            acceptability: Acceptability::Acceptable,
            passed_validation: true,
            special_controls: false,
        },
        CandidateDevice {
            k_number: "K-DEMO-002".to_string(),
            classification_code: "DQY".to_string(),
            device_name: "Over-the-wire dilatation catheter".to_string(),
            applicant: "Example Vascular LLC".to_string(),
            decision_description: "Balloon dilatation catheter for peripheral and coronary \
                angioplasty."
                .to_string(),
            summary_text: "Polyurethane shaft, gamma irradiated. Tested to ISO 10555-4."
                .to_string(),
            decision_date: format!("{}-09-30", year - 7),
            recall_count: 1,
            adverse_event_trend: AdverseEventTrend::Average,
            clinical_data_history: ClinicalDataHistory::Probable,
            acceptability: Acceptability::ReviewRequired,
            passed_validation: true,
            special_controls: false,
        },
        CandidateDevice {
            k_number: "K-DEMO-003".to_string(),
            classification_code: "OVE".to_string(),
            device_name: "Intervertebral body fusion device".to_string(),
            applicant: "Sample Spine Co.".to_string(),
            decision_description: "PEEK interbody cage for lumbar fusion.".to_string(),
            summary_text: "Steam sterilized, ASTM F2077 mechanical testing.".to_string(),
            decision_date: format!("{}-01-15", year - 3),
            recall_count: 0,
            adverse_event_trend: AdverseEventTrend::Good,
            clinical_data_history: ClinicalDataHistory::No,
            acceptability: Acceptability::Acceptable,
            passed_validation: true,
            special_controls: true,
        },
    ]
}
