//! The `adaptquiz mistakes` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use adaptquiz_analytics::config::{create_clients, load_config_from};
use adaptquiz_core::engine::AssessmentEngine;
use adaptquiz_core::model::FetchStatus;

pub async fn execute(days: Option<u32>, config_path: Option<PathBuf>, format: String) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    if config.services.mistakes.is_none() {
        anyhow::bail!(
            "no mistake analytics service configured. Add [services.mistakes] to adaptquiz.toml \
             or run `adaptquiz init`"
        );
    }

    let (behavior, mistakes) = create_clients(&config)?;
    let mut engine = AssessmentEngine::new(None, config.engine.clone(), behavior, mistakes);

    let pending = engine.begin_history_refresh(days);
    let response = pending.run().await;
    let refresh = engine.complete_history_refresh(response)?;

    if !refresh.analysis_loaded && !refresh.plan_loaded {
        let reason = match engine.mistakes().status() {
            FetchStatus::Failed(e) => e.clone(),
            _ => "unknown error".to_string(),
        };
        anyhow::bail!("failed to fetch mistake analytics: {reason}");
    }

    let aggregator = engine.mistakes();
    let planner = engine.remediation();

    match format.as_str() {
        "json" => {
            let out = serde_json::json!({
                "windowDays": aggregator.window_days(),
                "analysis": aggregator.analysis(),
                "analysisStatus": aggregator.status(),
                "remediationPlan": planner.plan(),
                "remediationStatus": planner.status(),
                "topItems": planner.top_items(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            if refresh.analysis_loaded {
                println!(
                    "Mistakes in the last {} days: {}",
                    aggregator.window_days(),
                    aggregator.total_mistakes()
                );
                if let Some(share) = aggregator.most_common_mistake_type() {
                    println!(
                        "Most common type: {} ({:.1}%)",
                        share.kind, share.percentage
                    );
                }
                let categories = aggregator.top_mistake_categories();
                if !categories.is_empty() {
                    println!("Problem categories: {}", categories.join(", "));
                }
            } else {
                eprintln!("Mistake analysis unavailable");
            }

            if refresh.plan_loaded {
                let items = planner.top_items();
                if items.is_empty() {
                    println!("\nNo remediation needed.");
                } else {
                    let mut table = Table::new();
                    table.set_header(vec!["Category", "Priority", "Sessions"]);
                    for item in items {
                        table.add_row(vec![
                            Cell::new(&item.category),
                            Cell::new(format!("{:.2}", item.priority)),
                            Cell::new(item.recommended_sessions),
                        ]);
                    }
                    println!("\n{table}");
                    println!(
                        "Estimated time to mastery: {:.1}h",
                        planner.estimated_time_to_mastery_hours()
                    );
                }
            } else {
                eprintln!("Remediation plan unavailable");
            }
        }
    }

    Ok(())
}
