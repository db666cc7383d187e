mod analyzer;
mod models;
mod report;
mod scraper;

use analyzer::AllotmentAnalyzer;
use anyhow::Result;
use chrono::Local;
use clap::{Arg, Command};
use models::{Config, DataSourceMode, SubscriptionStatus};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("ipo-allotment-analyzer")
        .version("1.0")
        .about("Analyzes IPO allotment probabilities from oversubscription data")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .get_matches();

    let config_file = matches.get_one::<String>("config").unwrap();

    // Load or create configuration
    let config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        println!(
            "⚠️  Please review {} (data source mode, status URL), then run the program again.",
            config_file
        );
        return Ok(());
    };

    let output_dir = config.output_directory.as_deref().unwrap_or("output");

    // Create output directory if it doesn't exist
    fs::create_dir_all(output_dir)?;

    // Clean up previous results
    clean_output_directory(output_dir)?;

    // Resolve the oversubscription factor from the configured source
    let scraper = scraper::SubscriptionScraper::new();

    let (subscription_factor, status) = match config.data_source_mode {
        DataSourceMode::Manual => {
            let raw = prompt_line(
                "Enter the IPO oversubscription factor (can be < 1 for undersubscription): ",
            )?;
            match models::parse_subscription_factor(&raw) {
                Ok(factor) => (factor, None),
                Err(e) => {
                    println!("❌ {}", e);
                    return Ok(());
                }
            }
        }
        DataSourceMode::Internet => {
            let url = match config.status_url.as_deref() {
                Some(url) if !url.is_empty() => url,
                _ => {
                    println!("❌ Error: status_url is not set in {}", config_file);
                    return Ok(());
                }
            };
            match scraper.scrape_url(url).await {
                Ok(status) => match check_issue_window(&status) {
                    Some(status) => (status.rii_subscription, Some(status)),
                    None => return Ok(()),
                },
                Err(e) => {
                    println!("❌ Retrieval failed: {:#}", e);
                    return Ok(());
                }
            }
        }
        DataSourceMode::Local => {
            let file = match config.data_file.as_deref() {
                Some(file) if !file.is_empty() => file,
                _ => {
                    println!("❌ Error: data_file is not set in {}", config_file);
                    return Ok(());
                }
            };
            println!("📄 Reading subscription status from: {}", file);
            match scraper.scrape_file(file) {
                Ok(status) => match check_issue_window(&status) {
                    Some(status) => (status.rii_subscription, Some(status)),
                    None => return Ok(()),
                },
                Err(e) => {
                    println!("❌ Retrieval failed: {:#}", e);
                    return Ok(());
                }
            }
        }
    };

    // Application count comes from configuration when set, otherwise prompt.
    // A configured zero is rejected by the analyzer below.
    let max_applications = match config.max_applications {
        Some(max) => max,
        None => {
            let raw = prompt_line("Enter the maximum number of applications: ")?;
            match models::parse_max_applications(&raw) {
                Ok(max) => max,
                Err(e) => {
                    println!("❌ {}", e);
                    return Ok(());
                }
            }
        }
    };

    let analyzer = AllotmentAnalyzer::new(subscription_factor);
    let rows = match analyzer.calculate_probabilities(max_applications) {
        Ok(rows) => rows,
        Err(e) => {
            println!("❌ {}", e);
            return Ok(());
        }
    };

    println!(
        "\n📊 Allotment probabilities for a {}x subscribed issue:\n",
        subscription_factor
    );
    report::print_probability_table(&rows);

    report::write_probability_text_report(subscription_factor, &rows, output_dir)?;
    report::write_probability_csv(&rows, output_dir)?;

    if let Some(status) = &status {
        report::write_subscription_report(status)?;
        println!("\n📄 Subscription report written to: ipo_subscription_report.html");
    }

    println!("\n✅ Analysis complete!");
    println!("📂 Results: {}", output_dir);
    Ok(())
}

/// Subscription figures are only live while the issue is open; outside the
/// window the calculation is declined.
fn check_issue_window(status: &SubscriptionStatus) -> Option<SubscriptionStatus> {
    let today = Local::now().date_naive();
    if status.is_open_on(today) {
        Some(status.clone())
    } else {
        println!(
            "❌ Issue window {} to {} does not include today ({}); figures are not live",
            status.issue_open.format("%B %d, %Y"),
            status.issue_close.format("%B %d, %Y"),
            today.format("%B %d, %Y")
        );
        None
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

// Clean up previous results from output directory
fn clean_output_directory(output_dir: &str) -> Result<()> {
    let output_path = Path::new(output_dir);

    if !output_path.exists() {
        return Ok(());
    }

    let items_to_clean = ["allotment_probabilities.txt", "allotment_probabilities.csv"];

    for item in &items_to_clean {
        let item_path = output_path.join(item);

        if item_path.is_file() {
            fs::remove_file(&item_path)?;
        }
    }

    Ok(())
}
