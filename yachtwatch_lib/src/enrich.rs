//! Multi-source enrichment pipeline.
//!
//! Fills descriptive gaps in snapshot records from three sources in fixed
//! order: the rendered tracker detail page, the encyclopedia (infobox plus
//! lead extract), and an optional generative-model fallback. All writes are
//! fill-only-if-missing; a later, lower-trust source never overwrites an
//! earlier one. Vessels are processed strictly sequentially with per-source
//! pacing delays, and the snapshot is checkpointed periodically so an
//! interrupted run keeps its progress.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use yachtwatch_api::{LlmClient, RenderClient, WikiClient};

use crate::config::EnrichConfig;
use crate::extract::{
    self, first_json_object, parse_detail_markdown, parse_infobox, parse_lead_extract,
    parse_owner_profile, select_owner_page, select_vessel_page, LlmFacts, WikiFacts,
};
use crate::model::{Category, Vessel, LENGTH_SENTINEL};
use crate::store::{SnapshotStore, StoreError};

/// Upper bound on extract text quoted to the generative model, in chars.
const FACT_SHEET_EXTRACT_CHARS: usize = 1500;

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("snapshot store: {0}")]
    Store(#[from] StoreError),
}

/// Run-level knobs, mapped one-to-one from operator flags.
#[derive(Debug, Clone, Default)]
pub struct EnrichOptions {
    /// Process at most this many vessels.
    pub limit: Option<usize>,
    /// Skip vessels with a confident length below this many meters.
    /// Unknown-length vessels always pass.
    pub min_length: u32,
    /// Re-process vessels that already look complete.
    pub refetch_all: bool,
    /// Full pipeline, no snapshot writes.
    pub dry_run: bool,
    /// Only work vessels with a missing or unresolved owner, skipping
    /// the tracker detail stage.
    pub owners_only: bool,
    /// Enable the generative-model fallback for still-missing fields.
    pub use_llm: bool,
}

/// Counters for the end-of-run summary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichReport {
    pub selected: usize,
    pub processed: usize,
    pub detail_hits: usize,
    pub detail_misses: usize,
    pub wiki_pages_found: usize,
    pub owners_resolved: usize,
    pub llm_enriched: usize,
    pub checkpoints: usize,
}

pub struct Enricher<'a> {
    render: &'a RenderClient,
    wiki: &'a WikiClient,
    llm: Option<&'a LlmClient>,
    config: EnrichConfig,
}

impl<'a> Enricher<'a> {
    pub fn new(
        render: &'a RenderClient,
        wiki: &'a WikiClient,
        llm: Option<&'a LlmClient>,
        config: EnrichConfig,
    ) -> Self {
        Self {
            render,
            wiki,
            llm,
            config,
        }
    }

    /// Loads the snapshot, enriches the selected vessels in place, and
    /// writes the result back (checkpointing along the way) unless
    /// `dry_run` is set. Per-vessel source failures degrade to warnings;
    /// only snapshot I/O is fatal.
    pub async fn run(
        &self,
        store: &SnapshotStore,
        opts: &EnrichOptions,
    ) -> Result<EnrichReport, EnrichError> {
        let mut vessels = store.load()?;
        let selected = select_candidates(&vessels, opts);
        let mut report = EnrichReport {
            selected: selected.len(),
            ..Default::default()
        };
        info!(
            total = vessels.len(),
            selected = selected.len(),
            dry_run = opts.dry_run,
            "starting enrichment pass"
        );

        for idx in selected {
            let name = vessels[idx].name.clone();
            info!(vessel = %name, n = report.processed + 1, "enriching");
            self.enrich_vessel(&mut vessels[idx], opts, &mut report)
                .await;
            report.processed += 1;

            if report.processed % self.config.checkpoint_every == 0 && !opts.dry_run {
                store.save(&vessels)?;
                report.checkpoints += 1;
                debug!(processed = report.processed, "checkpoint written");
            }
        }

        if !opts.dry_run {
            store.save(&vessels)?;
        }
        Ok(report)
    }

    async fn enrich_vessel(
        &self,
        vessel: &mut Vessel,
        opts: &EnrichOptions,
        report: &mut EnrichReport,
    ) {
        if !opts.owners_only {
            self.detail_stage(vessel, report).await;
        }
        let lead_extract = self.wiki_stage(vessel, opts, report).await;

        self.owner_stage(vessel, report).await;

        if opts.use_llm {
            self.llm_stage(vessel, lead_extract.as_deref(), report).await;
        }
    }

    /// Tracker detail page, rendered to markdown through the proxy.
    async fn detail_stage(&self, vessel: &mut Vessel, report: &mut EnrichReport) {
        if vessel.vessel_id.is_empty() {
            return;
        }
        match self.render.fetch_detail_markdown(&vessel.vessel_id).await {
            Ok(Some(markdown)) => {
                let fields = parse_detail_markdown(&markdown);
                if fields.is_empty() {
                    report.detail_misses += 1;
                } else {
                    report.detail_hits += 1;
                    apply_detail(vessel, fields);
                }
            }
            Ok(None) => report.detail_misses += 1,
            Err(err) => {
                report.detail_misses += 1;
                warn!(vessel = %vessel.name, error = %err, "detail page fetch failed");
            }
        }
        sleep(self.config.detail_delay).await;
    }

    /// Encyclopedia lookup: infobox wikitext plus plain-text lead extract.
    /// Returns the extract for possible reuse by the model fallback.
    /// Owner-mode runs skip the length floor; an owner can surface from
    /// any page regardless of vessel size.
    async fn wiki_stage(
        &self,
        vessel: &mut Vessel,
        opts: &EnrichOptions,
        report: &mut EnrichReport,
    ) -> Option<String> {
        if !opts.owners_only
            && below_wiki_floor(vessel.effective_length(), self.config.wiki_min_length)
        {
            return None;
        }

        let (title, via_search) = match self.resolve_wiki_title(vessel).await {
            Some(resolved) => resolved,
            None => return None,
        };
        if via_search {
            report.wiki_pages_found += 1;
        }
        if vessel.wikipedia_url.is_empty() {
            vessel.wikipedia_url = self.wiki.page_url(&title);
        }

        let infobox = match self.wiki.wikitext(&title).await {
            Ok(Some(wikitext)) => parse_infobox(&wikitext),
            Ok(None) => WikiFacts::default(),
            Err(err) => {
                warn!(vessel = %vessel.name, error = %err, "wikitext fetch failed");
                WikiFacts::default()
            }
        };
        sleep(self.config.wiki_delay).await;

        let extract = match self.wiki.lead_extract(&title).await {
            Ok(extract) => extract,
            Err(err) => {
                warn!(vessel = %vessel.name, error = %err, "extract fetch failed");
                None
            }
        };
        sleep(self.config.wiki_delay).await;

        let from_extract = extract
            .as_deref()
            .map(parse_lead_extract)
            .unwrap_or_default();
        apply_wiki_facts(vessel, WikiFacts::merged(infobox, from_extract));
        extract
    }

    /// Title from the stored page URL when present, otherwise fresh
    /// searches with the candidate-page guards. Two query variants run
    /// in turn; the broad one only fires when the quoted yacht query
    /// yields no acceptable page. The flag reports whether a search
    /// (rather than the stored URL) produced the title.
    async fn resolve_wiki_title(&self, vessel: &Vessel) -> Option<(String, bool)> {
        if let Some(title) = title_from_wikipedia_url(&vessel.wikipedia_url) {
            return Some((title, false));
        }
        if vessel.name.is_empty() {
            return None;
        }
        let queries = [
            format!("\"{}\" yacht", vessel.name),
            format!("\"{}\" superyacht motor vessel", vessel.name),
        ];
        for query in &queries {
            let hits = match self.wiki.search(query, 5).await {
                Ok(hits) => hits,
                Err(err) => {
                    warn!(vessel = %vessel.name, error = %err, "page search failed");
                    Vec::new()
                }
            };
            sleep(self.config.wiki_delay).await;
            if let Some(hit) = select_vessel_page(&hits, &vessel.name) {
                return Some((hit.title.clone(), true));
            }
        }
        None
    }

    /// Resolves the owner's biography page and fills the business summary
    /// and net-worth figure. Requires a known owner name; never touches
    /// already-known owner fields.
    async fn owner_stage(&self, vessel: &mut Vessel, report: &mut EnrichReport) {
        if vessel.owner.name.is_empty() || !vessel.owner.business_summary.is_empty() {
            return;
        }
        let owner_name = vessel.owner.name.clone();

        let hits = match self.wiki.search(&owner_name, 5).await {
            Ok(hits) => hits,
            Err(err) => {
                warn!(owner = %owner_name, error = %err, "owner search failed");
                return;
            }
        };
        sleep(self.config.owner_delay).await;

        let Some(page) = select_owner_page(&hits, &owner_name) else {
            debug!(owner = %owner_name, "no matching biography page");
            return;
        };
        let title = page.title.clone();
        if vessel.owner.wikipedia_url.is_empty() {
            vessel.owner.wikipedia_url = self.wiki.page_url(&title);
        }

        let extract = match self.wiki.lead_extract(&title).await {
            Ok(extract) => extract,
            Err(err) => {
                warn!(owner = %owner_name, error = %err, "owner extract fetch failed");
                None
            }
        };
        sleep(self.config.owner_delay).await;

        if let Some(extract) = extract {
            let profile = parse_owner_profile(&extract);
            let mut resolved = false;
            if let Some(business) = profile.business_summary {
                vessel.owner.business_summary = business;
                resolved = true;
            }
            if vessel.owner.net_worth.is_none() && profile.net_worth.is_some() {
                vessel.owner.net_worth = profile.net_worth;
                resolved = true;
            }
            if resolved {
                report.owners_resolved += 1;
            }
        }
    }

    /// Generative-model fallback for fields every deterministic source
    /// left blank. Responses are parsed strictly as JSON; anything else is
    /// discarded.
    async fn llm_stage(
        &self,
        vessel: &mut Vessel,
        lead_extract: Option<&str>,
        report: &mut EnrichReport,
    ) {
        let Some(llm) = self.llm else {
            return;
        };
        if below_wiki_floor(vessel.effective_length(), self.config.wiki_min_length) {
            return;
        }
        if !llm_has_work(vessel) {
            return;
        }

        let prompt = build_prompt(vessel, lead_extract);
        let response = match llm.complete(&prompt).await {
            Ok(response) => response,
            Err(err) => {
                warn!(vessel = %vessel.name, error = %err, "model completion failed");
                return;
            }
        };
        match first_json_object(&response).and_then(|json| serde_json::from_str(json).ok()) {
            Some(facts) => {
                let had_owner = !vessel.owner.name.is_empty();
                apply_llm_facts(vessel, facts);
                report.llm_enriched += 1;
                // A model-discovered owner still deserves the biography
                // lookup for the summary, page URL, and net worth.
                if !had_owner && !vessel.owner.name.is_empty() {
                    self.owner_stage(vessel, report).await;
                }
            }
            None => warn!(vessel = %vessel.name, "model response carried no usable JSON"),
        }
    }
}

/// A vessel still worth a full-source pass: any of the cheap-to-verify
/// descriptive anchors is missing.
pub fn needs_enrichment(vessel: &Vessel) -> bool {
    vessel.imo.is_empty() || vessel.builder.is_empty() || vessel.year_built == 0
}

/// No owner named yet, or a named owner whose biography is still
/// unresolved.
pub fn needs_owner_enrichment(vessel: &Vessel) -> bool {
    vessel.owner.name.is_empty() || vessel.owner.business_summary.is_empty()
}

/// A confident length below the floor; unknown lengths always pass.
fn below_wiki_floor(length: u32, floor: u32) -> bool {
    length != 0 && length < floor
}

/// Indices of the vessels a run will touch, in snapshot order.
/// Tenders are never enriched.
pub fn select_candidates(vessels: &[Vessel], opts: &EnrichOptions) -> Vec<usize> {
    let eligible = vessels.iter().enumerate().filter(|(_, vessel)| {
        if vessel.is_tender() {
            return false;
        }
        let length = vessel.effective_length();
        if length != 0 && length < opts.min_length {
            return false;
        }
        if opts.owners_only {
            needs_owner_enrichment(vessel)
        } else {
            opts.refetch_all || needs_enrichment(vessel)
        }
    });
    match opts.limit {
        Some(limit) => eligible.take(limit).map(|(idx, _)| idx).collect(),
        None => eligible.map(|(idx, _)| idx).collect(),
    }
}

/// Recovers a page title from a stored encyclopedia URL.
pub fn title_from_wikipedia_url(url: &str) -> Option<String> {
    let idx = url.find("/wiki/")?;
    let raw = url[idx + "/wiki/".len()..]
        .split(['#', '?'])
        .next()
        .unwrap_or_default();
    let decoded = percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .ok()?;
    let title = decoded.replace('_', " ").trim().to_string();
    (!title.is_empty()).then_some(title)
}

fn fill_str(slot: &mut String, value: Option<String>) {
    if slot.is_empty() {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *slot = value;
        }
    }
}

fn fill_num(slot: &mut u32, value: Option<u32>) {
    if *slot == 0 {
        if let Some(value) = value.filter(|v| *v != 0) {
            *slot = value;
        }
    }
}

/// Length fills over the sentinel as well as over 0.
fn fill_length(slot: &mut u32, value: Option<u32>) {
    if *slot == 0 || *slot == LENGTH_SENTINEL {
        if let Some(value) = value.filter(|v| *v != 0) {
            *slot = value;
        }
    }
}

fn apply_detail(vessel: &mut Vessel, fields: extract::DetailFields) {
    fill_str(&mut vessel.imo, fields.imo);
    fill_str(&mut vessel.mmsi, fields.mmsi);
    fill_str(&mut vessel.flag, fields.flag);
    fill_str(&mut vessel.builder, fields.builder);
    fill_str(&mut vessel.detailed_type, fields.detailed_type);
    fill_str(&mut vessel.photo_url, fields.photo_url);
    fill_str(&mut vessel.call_sign, fields.call_sign);
    fill_num(&mut vessel.year_built, fields.year_built);
    fill_num(&mut vessel.gross_tonnage, fields.gross_tonnage);
    fill_num(&mut vessel.beam_meters, fields.beam_meters);
    fill_num(&mut vessel.deadweight, fields.deadweight);
    fill_length(&mut vessel.length_meters, fields.length_meters);
    if let Some(Category::Sailing) = fields.category {
        vessel.category = Category::Sailing;
    }
}

fn apply_wiki_facts(vessel: &mut Vessel, facts: WikiFacts) {
    fill_str(&mut vessel.builder, facts.builder);
    fill_num(&mut vessel.year_built, facts.year_built);
    fill_length(&mut vessel.length_meters, facts.length_meters);
    if vessel.owner.name.is_empty() {
        if let Some(owner_name) = facts.owner_name.filter(|n| !n.is_empty()) {
            vessel.owner.name = owner_name;
        }
    }
    if facts.sailing {
        vessel.category = Category::Sailing;
    }
}

fn apply_llm_facts(vessel: &mut Vessel, facts: LlmFacts) {
    if vessel.owner.name.is_empty() {
        fill_str(&mut vessel.owner.name, facts.owner_name);
    }
    fill_str(&mut vessel.owner.business_summary, facts.owner_business);
    fill_str(&mut vessel.builder, facts.builder);
    fill_num(&mut vessel.year_built, facts.year_built);
    fill_str(&mut vessel.notable_info, facts.notable_info);
}

fn llm_has_work(vessel: &Vessel) -> bool {
    vessel.owner.name.is_empty()
        || vessel.owner.business_summary.is_empty()
        || vessel.builder.is_empty()
        || vessel.year_built == 0
}

/// Known facts plus a bounded quote of the encyclopedia extract, with a
/// strict JSON-only response contract.
fn build_prompt(vessel: &Vessel, lead_extract: Option<&str>) -> String {
    let mut sheet = format!("Vessel name: {}\n", vessel.name);
    let length = vessel.effective_length();
    if length != 0 {
        sheet.push_str(&format!("Length: {} m\n", length));
    }
    if !vessel.builder.is_empty() {
        sheet.push_str(&format!("Builder: {}\n", vessel.builder));
    }
    if vessel.year_built != 0 {
        sheet.push_str(&format!("Year built: {}\n", vessel.year_built));
    }
    if !vessel.flag.is_empty() {
        sheet.push_str(&format!("Flag: {}\n", vessel.flag));
    }
    if !vessel.detailed_type.is_empty() {
        sheet.push_str(&format!("Type: {}\n", vessel.detailed_type));
    }
    if !vessel.owner.name.is_empty() {
        sheet.push_str(&format!("Known owner: {}\n", vessel.owner.name));
    }
    if let Some(extract) = lead_extract {
        sheet.push_str("Encyclopedia extract:\n");
        sheet.push_str(truncate_chars(extract, FACT_SHEET_EXTRACT_CHARS));
        sheet.push('\n');
    }

    format!(
        "Given the following facts about a luxury yacht, identify anything \
         publicly known that is missing.\n\n{sheet}\n\
         Respond with ONLY a JSON object, no prose, using exactly these keys \
         (omit any key you cannot source): \
         {{\"ownerName\": string, \"ownerBusiness\": string, \
         \"builder\": string, \"yearBuilt\": number, \
         \"notableInfo\": string}}. \
         Do not guess; only include facts you are confident about."
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
