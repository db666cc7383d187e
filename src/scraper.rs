use crate::models::{parse_issue_date, parse_subscription_factor, SubscriptionStatus};
use anyhow::{Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use std::fs;

/// Scrapes the RII subscription factor and the issue window from a public
/// subscription-status page. The page URL comes from configuration; nothing
/// here assumes a particular host.
pub struct SubscriptionScraper {
    client: reqwest::Client,
}

impl SubscriptionScraper {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn scrape_file(&self, file_path: &str) -> Result<SubscriptionStatus> {
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read file: {}", file_path))?;

        self.parse_html_content(&content, Some(file_path))
    }

    pub async fn scrape_url(&self, url: &str) -> Result<SubscriptionStatus> {
        println!("🌐 Fetching subscription status from: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP request failed with status: {}",
                response.status()
            ));
        }

        let content = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {}", url))?;

        self.parse_html_content(&content, Some(url))
    }

    fn parse_html_content(&self, content: &str, source: Option<&str>) -> Result<SubscriptionStatus> {
        let document = Html::parse_document(content);

        let rii_subscription = self.extract_rii_subscription(&document)?;
        let (issue_open, issue_close) = self.extract_issue_window(&document)?;

        if let Some(src) = source {
            println!(
                "   ✅ RII subscription {}x (issue open {} to {}) from {}",
                rii_subscription, issue_open, issue_close, src
            );
        }

        Ok(SubscriptionStatus {
            rii_subscription,
            issue_open,
            issue_close,
        })
    }

    /// Locate the retail category row in the subscription table and take its
    /// rightmost numeric cell as the subscription factor.
    fn extract_rii_subscription(&self, document: &Html) -> Result<f64> {
        let status_selector = Selector::parse("table.subscription-status").unwrap();

        let table = match document.select(&status_selector).next() {
            Some(table) => table,
            None => {
                println!("   ⚠️  No subscription-status table found, falling back to first table");
                let any_table = Selector::parse("table").unwrap();
                document
                    .select(&any_table)
                    .next()
                    .context("No table found in document")?
            }
        };

        let row_selector = Selector::parse("tr").unwrap();
        for row in table.select(&row_selector) {
            let cells: Vec<_> = row.select(&Selector::parse("td").unwrap()).collect();

            if cells.len() < 2 {
                continue; // Skip header and spacer rows
            }

            let category = cells[0].text().collect::<String>();
            if !is_rii_category(&category) {
                continue;
            }

            // Columns vary by page; the factor is the last cell that reads
            // as a number, e.g. "4.56" or "4.56x".
            for cell in cells[1..].iter().rev() {
                let text = cell.text().collect::<String>();
                if let Some(factor) = extract_factor(&text) {
                    return Ok(factor);
                }
            }

            return Err(anyhow::anyhow!(
                "Retail row found but no numeric subscription cell in it"
            ));
        }

        Err(anyhow::anyhow!(
            "No retail (RII) row found in subscription table"
        ))
    }

    fn extract_issue_window(
        &self,
        document: &Html,
    ) -> Result<(chrono::NaiveDate, chrono::NaiveDate)> {
        let text = document.root_element().text().collect::<String>();

        let open_regex = Regex::new(r"Issue\s+Open:?\s*([A-Za-z]+\s+\d{1,2},\s+\d{4})").unwrap();
        let close_regex = Regex::new(r"Issue\s+Close:?\s*([A-Za-z]+\s+\d{1,2},\s+\d{4})").unwrap();

        let open_raw = open_regex
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .context("Issue open date not found on page")?;
        let close_raw = close_regex
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .context("Issue close date not found on page")?;

        let issue_open = parse_issue_date(open_raw)
            .with_context(|| format!("Unparseable issue open date: {}", open_raw))?;
        let issue_close = parse_issue_date(close_raw)
            .with_context(|| format!("Unparseable issue close date: {}", close_raw))?;

        if issue_close < issue_open {
            return Err(anyhow::anyhow!(
                "Issue close date {} precedes open date {}",
                issue_close,
                issue_open
            ));
        }

        Ok((issue_open, issue_close))
    }
}

fn is_rii_category(category: &str) -> bool {
    let category = category.to_lowercase();
    category.contains("retail") || category.contains("rii")
}

fn extract_factor(cell_text: &str) -> Option<f64> {
    let trimmed = cell_text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let numeric = Regex::new(r"^\d+(\.\d+)?\s*[xX]?$").unwrap();
    if !numeric.is_match(trimmed) {
        return None;
    }

    parse_subscription_factor(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const STATUS_PAGE: &str = r#"
        <html><body>
        <h1>Acme Industries IPO</h1>
        <p>Issue Open: <i>May 06, 2026</i></p>
        <p>Issue Close: <i>May 09, 2026</i></p>
        <table class="subscription-status">
            <tr><th>Category</th><th>Shares Offered</th><th>Shares Bid</th><th>Subscription</th></tr>
            <tr><td>QIB</td><td>1,000,000</td><td>12,000,000</td><td>12.00x</td></tr>
            <tr><td>NII</td><td>500,000</td><td>4,000,000</td><td>8.00x</td></tr>
            <tr><td>Retail Individual Investor (RII)</td><td>2,000,000</td><td>9,120,000</td><td>4.56x</td></tr>
            <tr><td>Total</td><td>3,500,000</td><td>25,120,000</td><td>7.18x</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn extracts_status_from_well_formed_page() {
        let scraper = SubscriptionScraper::new();
        let status = scraper.parse_html_content(STATUS_PAGE, None).unwrap();

        assert_eq!(status.rii_subscription, 4.56);
        assert_eq!(status.issue_open, NaiveDate::from_ymd_opt(2026, 5, 6).unwrap());
        assert_eq!(status.issue_close, NaiveDate::from_ymd_opt(2026, 5, 9).unwrap());
    }

    #[test]
    fn accepts_bare_numeric_subscription_cell() {
        let page = STATUS_PAGE.replace("4.56x", "4.56");
        let scraper = SubscriptionScraper::new();
        let status = scraper.parse_html_content(&page, None).unwrap();
        assert_eq!(status.rii_subscription, 4.56);
    }

    #[test]
    fn falls_back_to_first_table_without_class() {
        let page = STATUS_PAGE.replace(r#" class="subscription-status""#, "");
        let scraper = SubscriptionScraper::new();
        let status = scraper.parse_html_content(&page, None).unwrap();
        assert_eq!(status.rii_subscription, 4.56);
    }

    #[test]
    fn missing_rii_row_is_an_error() {
        let page = STATUS_PAGE.replace("Retail Individual Investor (RII)", "Employee");
        let scraper = SubscriptionScraper::new();
        let err = scraper.parse_html_content(&page, None).unwrap_err();
        assert!(err.to_string().contains("retail"));
    }

    #[test]
    fn missing_close_date_is_an_error() {
        let page = STATUS_PAGE.replace("Issue Close", "Listing");
        let scraper = SubscriptionScraper::new();
        let err = scraper.parse_html_content(&page, None).unwrap_err();
        assert!(err.to_string().contains("close date"));
    }

    #[test]
    fn inverted_issue_window_is_an_error() {
        let page = STATUS_PAGE.replace("May 09, 2026", "May 01, 2026");
        let scraper = SubscriptionScraper::new();
        assert!(scraper.parse_html_content(&page, None).is_err());
    }

    #[test]
    fn non_numeric_cells_are_skipped() {
        assert_eq!(extract_factor("4.56x"), Some(4.56));
        assert_eq!(extract_factor("12"), Some(12.0));
        assert_eq!(extract_factor("9,120,000"), None);
        assert_eq!(extract_factor("pending"), None);
        assert_eq!(extract_factor(""), None);
    }
}
