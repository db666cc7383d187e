use crate::models::{ProbabilityRow, SubscriptionStatus};
use anyhow::Result;
use std::fs;
use std::path::Path;

const SEPARATOR_WIDTH: usize = 80;

/// Lay the probability table out as fixed-width text with a header row and
/// a dashed separator.
pub fn format_probability_table(rows: &[ProbabilityRow]) -> String {
    let mut content = String::new();

    content.push_str(&format!(
        "{:<20} {:<30} {:<30}\n",
        "No. of Applications",
        "Probability of No Allotment (%)",
        "Probability of At Least 1 Allotment (%)"
    ));
    content.push_str(&"-".repeat(SEPARATOR_WIDTH));
    content.push('\n');

    for row in rows {
        content.push_str(&format!(
            "{:<20} {:<30.2} {:<30.2}\n",
            row.applications, row.no_allotment_pct, row.at_least_one_pct
        ));
    }

    content
}

pub fn print_probability_table(rows: &[ProbabilityRow]) {
    print!("{}", format_probability_table(rows));
}

pub fn write_probability_text_report(
    subscription_factor: f64,
    rows: &[ProbabilityRow],
    output_dir: &str,
) -> Result<()> {
    let mut content = String::new();
    content.push_str("IPO Allotment Probability Analysis\n");
    content.push_str("==================================\n\n");
    content.push_str(&format!("Oversubscription factor: {}\n\n", subscription_factor));
    content.push_str(&format_probability_table(rows));

    fs::write(
        Path::new(output_dir).join("allotment_probabilities.txt"),
        content,
    )?;
    Ok(())
}

pub fn write_probability_csv(rows: &[ProbabilityRow], output_dir: &str) -> Result<()> {
    let csv_path = Path::new(output_dir).join("allotment_probabilities.csv");
    fs::write(csv_path, probability_csv(rows)?)?;
    Ok(())
}

fn probability_csv(rows: &[ProbabilityRow]) -> Result<String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(Vec::new());

    writer.write_record(&["Applications", "No_Allotment_Pct", "At_Least_One_Pct"])?;

    for row in rows {
        writer.write_record(&[
            row.applications.to_string(),
            format!("{:.2}", row.no_allotment_pct),
            format!("{:.2}", row.at_least_one_pct),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

/// Render the static subscription report: the retail subscription rate plus
/// the issue window dates, nothing else. No templating engine; the values are
/// trusted to be well formed.
pub fn render_subscription_report(rate: f64, issue_open: &str, issue_close: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
        <html>\n\
        <head>\n\
        <meta charset=\"utf-8\">\n\
        <title>IPO Subscription Report</title>\n\
        </head>\n\
        <body>\n\
        <h1>IPO Subscription Report</h1>\n\
        <p>Retail (RII) subscription rate: <b>{rate}x</b></p>\n\
        <p>Issue open: <i>{issue_open}</i></p>\n\
        <p>Issue close: <i>{issue_close}</i></p>\n\
        </body>\n\
        </html>\n"
    )
}

/// Written to the working directory, next to wherever the tool was run.
pub fn write_subscription_report(status: &SubscriptionStatus) -> Result<()> {
    let html = render_subscription_report(
        status.rii_subscription,
        &status.issue_open.format("%B %d, %Y").to_string(),
        &status.issue_close.format("%B %d, %Y").to_string(),
    );
    fs::write("ipo_subscription_report.html", html)?;
    Ok(())
}
