//! EU registry adapter (clinicaltrialsregister.eu search page).
//!
//! The search page renders each trial as a `table.result` block in which
//! every field is a `span.label` followed by a bare text node:
//!
//! ```html
//! <table class="result">
//!   <tr><td><span class="label">EudraCT Number:</span> 2004-000001-11</td></tr>
//!   <tr><td><span class="label">Full Title:</span> An example trial</td></tr>
//! </table>
//! ```
//!
//! The page is fetched with a bounded number of attempts and a constant delay
//! between them; when every attempt fails the adapter returns an empty page.

use std::{sync::LazyLock, time::Duration};

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use trialsync_core::study::EuStudy;

use crate::Fetch;

pub const DEFAULT_URL: &str = "https://www.clinicaltrialsregister.eu/ctr-search/search?query=";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;

pub const LABEL_EUDRACT_NUMBER: &str = "EudraCT Number:";
pub const LABEL_SPONSOR_PROTOCOL_NUMBER: &str = "Sponsor Protocol Number:";
pub const LABEL_SPONSOR_NAME: &str = "Sponsor Name:";
pub const LABEL_FULL_TITLE: &str = "Full Title:";
pub const LABEL_MEDICAL_CONDITION: &str = "Medical condition:";

static RESULT_BLOCK: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("table.result").expect("static result selector"));
static LABEL_SPAN: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("span.label").expect("static label selector"));

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EuConfig {
  pub url:            String,
  pub max_attempts:   u32,
  pub retry_delay_ms: u64,
}

impl Default for EuConfig {
  fn default() -> Self {
    Self {
      url:            DEFAULT_URL.to_owned(),
      max_attempts:   DEFAULT_MAX_ATTEMPTS,
      retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
    }
  }
}

impl EuConfig {
  pub fn retry_delay(&self) -> Duration { Duration::from_millis(self.retry_delay_ms) }
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// Fetches the EU registry search page.
pub struct EuSource<F> {
  fetcher: F,
  config:  EuConfig,
}

impl<F: Fetch> EuSource<F> {
  pub fn new(fetcher: F, config: EuConfig) -> Self { Self { fetcher, config } }

  /// Fetch the search page, making at most `max_attempts` attempts.
  ///
  /// Sleeps `retry_delay` between attempts (not after the last). Returns an
  /// empty string once every attempt has failed.
  pub async fn fetch_with_retry(&self) -> String {
    let max_attempts = self.config.max_attempts;
    let delay = self.config.retry_delay();

    for attempt in 1..=max_attempts {
      match self.fetcher.get(&self.config.url).await {
        Ok(body) => {
          tracing::info!(attempt, bytes = body.len(), "fetched eu search page");
          return body;
        }
        Err(e) => {
          tracing::warn!(attempt, max_attempts, error = %e, "eu fetch failed");
          if attempt < max_attempts {
            tokio::time::sleep(delay).await;
          }
        }
      }
    }

    tracing::error!(max_attempts, "eu fetch attempts exhausted; continuing with an empty page");
    String::new()
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Text following the `span.label` whose text is exactly `label`.
///
/// Only sibling text nodes count; the first non-blank one is returned
/// trimmed. The scan stops at the next label span, so a label with no value
/// never picks up its neighbour's.
fn label_value(scope: ElementRef<'_>, label: &str) -> Option<String> {
  let span = scope
    .select(&LABEL_SPAN)
    .find(|span| span.text().collect::<String>().trim() == label)?;

  span
    .next_siblings()
    .take_while(|node| !ElementRef::wrap(*node).is_some_and(|el| LABEL_SPAN.matches(&el)))
    .filter_map(|node| node.value().as_text())
    .map(|text| text.trim())
    .find(|text| !text.is_empty())
    .map(str::to_owned)
}

/// Look up `label` in an HTML fragment. Never fails; a missing label or a
/// label with no text after it yields `None`.
pub fn extract_label(fragment: &str, label: &str) -> Option<String> {
  let doc = Html::parse_fragment(fragment);
  label_value(doc.root_element(), label)
}

fn parse_block(block: ElementRef<'_>) -> EuStudy {
  EuStudy {
    eudract_number:          label_value(block, LABEL_EUDRACT_NUMBER),
    sponsor_protocol_number: label_value(block, LABEL_SPONSOR_PROTOCOL_NUMBER),
    sponsor_name:            label_value(block, LABEL_SPONSOR_NAME),
    full_title:              label_value(block, LABEL_FULL_TITLE),
    medical_condition:       label_value(block, LABEL_MEDICAL_CONDITION),
  }
}

/// One [`EuStudy`] per `table.result` block, in document order, including
/// blocks in which no label was found.
pub fn parse_trials(html: &str) -> Vec<EuStudy> {
  let doc = Html::parse_document(html);
  doc.select(&RESULT_BLOCK).map(parse_block).collect()
}
