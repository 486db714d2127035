//! The `adaptquiz simulate` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use adaptquiz_analytics::config::{create_behavior_client, create_mistake_client};
use adaptquiz_analytics::MockBehaviorAnalytics;
use adaptquiz_core::engine::{AnswerOutcome, AssessmentEngine};
use adaptquiz_core::model::{BehaviorSignals, DifficultyLevel};
use adaptquiz_core::traits::{AdaptedConfigOptions, BehaviorAnalytics, MidQuizAdjustments};

/// Time recorded for an answer when `--times` is not given.
const DEFAULT_TIME_MS: u64 = 30_000;

pub struct SimulateArgs {
    pub answers: String,
    pub times: Option<String>,
    pub initial: Option<DifficultyLevel>,
    pub session_id: Option<String>,
    pub script: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub async fn execute(args: SimulateArgs) -> Result<()> {
    let answers = parse_answers(&args.answers)?;
    let times = match &args.times {
        Some(raw) => parse_times(raw, answers.len())?,
        None => vec![DEFAULT_TIME_MS; answers.len()],
    };

    let config = adaptquiz_analytics::config::load_config_from(args.config.as_deref())?;
    let mut engine_config = config.engine.clone();
    if let Some(level) = args.initial {
        engine_config.initial_difficulty = level;
    }

    let behavior_service = config.services.behavior.as_ref();
    let behavior: Arc<dyn BehaviorAnalytics> = match (&args.script, behavior_service) {
        (Some(path), None) => Arc::new(MockBehaviorAnalytics::new(load_script(path)?)),
        (Some(_), Some(_)) => {
            tracing::warn!("--script ignored: a behavior service is configured");
            create_behavior_client(behavior_service)?
        }
        (None, _) => create_behavior_client(behavior_service)?,
    };
    let mistakes = create_mistake_client(config.services.mistakes.as_ref())?;

    let session_id = args
        .session_id
        .unwrap_or_else(|| format!("sim-{}", uuid::Uuid::new_v4()));
    tracing::info!(
        session_id = %session_id,
        behavior = behavior.name(),
        mistakes = mistakes.name(),
        "starting simulation"
    );

    let mut engine = AssessmentEngine::new(Some(session_id), engine_config, behavior, mistakes);

    if behavior_service.is_some() && args.initial.is_none() {
        let options = AdaptedConfigOptions {
            question_count: u32::try_from(answers.len()).ok(),
            ..Default::default()
        };
        if let Some(level) = engine.apply_adapted_config(&options).await {
            println!("Adapted config: starting at {level}");
        }
    }

    let mut table = Table::new();
    table.set_header(vec![
        "#",
        "Answer",
        "Time",
        "Accuracy",
        "Difficulty",
        "Change",
        "Suggestions",
    ]);

    for (&is_correct, &time_ms) in answers.iter().zip(&times) {
        let outcome = engine
            .answer(is_correct, time_ms, BehaviorSignals::default())
            .await;
        table.add_row(row(&outcome));
    }

    let refresh = engine.refresh_history().await;
    let report = engine.report();

    println!("{table}");
    println!();
    println!(
        "Answered {} | accuracy {}% | difficulty {} -> {} | trend {}",
        report.questions_answered,
        report.accuracy,
        report.initial_difficulty,
        report.final_difficulty,
        report.trend
    );
    println!("Difficulty changes: {}", report.events.len());
    if report.break_reminder {
        println!("Break recommended");
    }
    if refresh.analysis_loaded && report.total_mistakes > 0 {
        println!("Historical mistakes: {}", report.total_mistakes);
    }
    if refresh.plan_loaded && !report.top_remediation.is_empty() {
        let categories: Vec<&str> = report
            .top_remediation
            .iter()
            .map(|item| item.category.as_str())
            .collect();
        println!("Focus areas: {}", categories.join(", "));
    }

    if let Some(path) = &args.output {
        report.save_json(path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn row(outcome: &AnswerOutcome) -> Vec<Cell> {
    let change = outcome
        .transition
        .as_ref()
        .map(|e| format!("{} -> {} ({})", e.from, e.to, e.reason));
    let forced = outcome
        .adjustments
        .as_ref()
        .and_then(|a| a.forced_difficulty)
        .map(|level| format!("forced {level}"));
    let change = match (change, forced) {
        (Some(c), Some(f)) => format!("{c}; {f}"),
        (Some(c), None) => c,
        (None, Some(f)) => f,
        (None, None) => String::new(),
    };

    let suggestions = outcome
        .adjustments
        .as_ref()
        .map(|a| {
            a.suggestions
                .iter()
                .map(|s| s.kind.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    vec![
        Cell::new(outcome.question_number),
        Cell::new(if outcome.record.is_correct { "C" } else { "W" }),
        Cell::new(format!("{}ms", outcome.record.time_spent_ms)),
        Cell::new(format!("{}%", outcome.accuracy)),
        Cell::new(outcome.difficulty),
        Cell::new(change),
        Cell::new(suggestions),
    ]
}

/// Parse an answer script such as `"CCW WCC"`; separators are ignored.
fn parse_answers(raw: &str) -> Result<Vec<bool>> {
    let answers = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c.to_ascii_uppercase() {
            'C' | '1' => Ok(true),
            'W' | '0' => Ok(false),
            other => Err(anyhow::anyhow!(
                "invalid answer '{other}' (expected C or W)"
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!answers.is_empty(), "--answers must contain at least one answer");
    Ok(answers)
}

fn parse_times(raw: &str, expected: usize) -> Result<Vec<u64>> {
    let times = raw
        .split(',')
        .map(|t| {
            t.trim()
                .parse::<u64>()
                .with_context(|| format!("invalid time '{}'", t.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(
        times.len() == expected,
        "--times has {} entries but --answers has {expected}",
        times.len()
    );
    Ok(times)
}

fn load_script(path: &Path) -> Result<Vec<MidQuizAdjustments>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse script: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_parse_case_insensitive() {
        assert_eq!(
            parse_answers("cCw W,1 0").unwrap(),
            vec![true, true, false, false, true, false]
        );
    }

    #[test]
    fn answers_reject_unknown_marks() {
        let err = parse_answers("CCX").unwrap_err();
        assert!(err.to_string().contains("invalid answer 'X'"));
        assert!(parse_answers("  ").is_err());
    }

    #[test]
    fn times_must_match_answers() {
        assert_eq!(parse_times("100, 200", 2).unwrap(), vec![100, 200]);
        assert!(parse_times("100", 2).is_err());
        assert!(parse_times("abc,1", 2).is_err());
    }
}
