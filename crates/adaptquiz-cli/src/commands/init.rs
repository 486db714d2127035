//! The `adaptquiz init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    let path = std::path::Path::new("adaptquiz.toml");
    if path.exists() {
        println!("adaptquiz.toml already exists, skipping.");
        return Ok(());
    }

    std::fs::write(path, SAMPLE_CONFIG)?;
    println!("Created adaptquiz.toml");

    println!("\nNext steps:");
    println!("  1. Set base_url for your analytics services and export ADAPTQUIZ_API_TOKEN");
    println!("  2. Run: adaptquiz simulate --answers CCCCCWCCCC");
    println!("  3. Run: adaptquiz mistakes --days 30");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptquiz configuration

# Remove a [services.*] table to run against the offline mock instead.
[services.behavior]
base_url = "http://localhost:3000"
auth_token = "${ADAPTQUIZ_API_TOKEN}"
timeout_secs = 30

[services.mistakes]
base_url = "http://localhost:3000"
auth_token = "${ADAPTQUIZ_API_TOKEN}"
timeout_secs = 30

[engine]
initial_difficulty = "beginner"
window_size = 10
promote_threshold = 0.8
demote_threshold = 0.5
check_interval = 5
max_suggestions = 2
max_remediation_items = 3
presentation_order = "received"
mistake_window_days = 30
"#;
