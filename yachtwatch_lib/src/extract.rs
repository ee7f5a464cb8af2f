//! Pattern extractors for semi-structured source text.
//!
//! Three text families feed the enrichment pipeline: markdown renderings of
//! tracker detail pages (labeled table rows with inline fallbacks),
//! encyclopedia infobox wikitext, and plain-text encyclopedia extracts.
//! Every extractor is independently optional; absence of a match is not an
//! error. False positives are mitigated by the candidate-page guards here
//! but accepted as a residual risk.

use regex::Regex;

use yachtwatch_api::WikiSearchHit;

use crate::model::Category;

/// Fields parsed from a rendered detail page.
#[derive(Debug, Default, PartialEq)]
pub struct DetailFields {
    pub imo: Option<String>,
    pub mmsi: Option<String>,
    pub flag: Option<String>,
    pub year_built: Option<u32>,
    pub builder: Option<String>,
    pub gross_tonnage: Option<u32>,
    pub length_meters: Option<u32>,
    pub beam_meters: Option<u32>,
    pub detailed_type: Option<String>,
    pub category: Option<Category>,
    pub photo_url: Option<String>,
    pub deadweight: Option<u32>,
    pub call_sign: Option<String>,
}

impl DetailFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Vessel facts parsed from encyclopedia text (infobox or lead extract).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WikiFacts {
    pub builder: Option<String>,
    pub year_built: Option<u32>,
    pub owner_name: Option<String>,
    pub length_meters: Option<u32>,
    pub sailing: bool,
}

impl WikiFacts {
    /// Merges infobox facts over extract facts: the infobox wins on
    /// conflict, the extract fills infobox gaps.
    pub fn merged(infobox: Self, extract: Self) -> Self {
        Self {
            builder: infobox.builder.or(extract.builder),
            year_built: infobox.year_built.or(extract.year_built),
            owner_name: infobox.owner_name.or(extract.owner_name),
            length_meters: infobox.length_meters.or(extract.length_meters),
            sailing: infobox.sailing || extract.sailing,
        }
    }
}

/// Biographical facts about an owner, parsed from their page extract.
#[derive(Debug, Default, PartialEq)]
pub struct OwnerProfile {
    pub business_summary: Option<String>,
    pub net_worth: Option<String>,
}

/// Optional fields returned by the generative-model fallback.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmFacts {
    pub owner_name: Option<String>,
    pub owner_business: Option<String>,
    pub builder: Option<String>,
    pub year_built: Option<u32>,
    pub notable_info: Option<String>,
}

// --- Detail page markdown ---

/// Runs the labeled-field extractors over a detail-page rendering.
/// Table-row form (`| Label | Value |`) is preferred, inline
/// (`Label: Value`) is the fallback.
pub fn parse_detail_markdown(md: &str) -> DetailFields {
    let mut fields = DetailFields::default();

    fields.imo = capture(md, &[r"\|\s*IMO\s*\|\s*(\d{7})\s*\|", r"(?i)IMO[:\s]*(\d{7})"]);
    fields.mmsi = capture(md, &[r"\|\s*MMSI\s*\|\s*(\d{9})\s*\|", r"(?i)MMSI[:\s]*(\d{9})"]);
    fields.flag = capture(
        md,
        &[
            r"\|\s*Flag\s*\|\s*([A-Z][A-Z\s]+?)\s*\|",
            r"flag of \*\*([A-Z][A-Z\s]+?)\*\*",
        ],
    );
    fields.year_built = capture(
        md,
        &[
            r"(?i)\|\s*Year\s*built\s*\|\s*(\d{4})\s*\|",
            r"(?i)(?:Year\s*Built|Build\s*Year)[:\s]*(\d{4})",
        ],
    )
    .and_then(|s| s.parse().ok());
    fields.builder = capture(
        md,
        &[
            r"(?i)\|\s*(?:Builder|Shipyard)\s*\|\s*([^|]+?)\s*\|",
            r"(?i)(?:Builder|Shipyard|Built\s*by)[:\s]*([A-ZÀ-ÿ][A-Za-zÀ-ÿ&\s\+\-'.]+?)(?:\n|,|\||\[)",
        ],
    )
    .filter(|b| !is_upsell_text(b));
    fields.gross_tonnage = capture(
        md,
        &[
            r"(?i)\|\s*(?:Gross\s*Tonnage|GT)\s*\|\s*([\d,]+)\s*\|",
            r"(?i)(?:Gross\s*Tonnage|GT)[:\s]*([\d,]+)",
        ],
    )
    .and_then(parse_grouped_u32);
    fields.length_meters = capture(
        md,
        &[
            r"(?i)LOA\)\s*is\s*([\d.]+)\s*meter",
            r"(?i)length[^.]*?is\s*([\d.]+)\s*meter",
            r"(?i)\|\s*(?:Length|LOA)\s*\|\s*([\d.]+)\s*m",
            r"(?i)(?:Length(?:\s*Overall)?|LOA)[:\s]*([\d.]+)\s*(?:m\b|meter)",
        ],
    )
    .and_then(parse_meters);
    fields.beam_meters = capture(
        md,
        &[
            r"(?i)width[^.]*?is\s*([\d.]+)\s*meter",
            r"(?i)\|\s*(?:Beam|Width)\s*\|\s*([\d.]+)\s*m",
            r"(?i)(?:Beam|Width)[:\s]*([\d.]+)\s*(?:m\b|meter)",
        ],
    )
    .and_then(parse_meters);

    if let Some(detailed) = capture(
        md,
        &[
            r"(?i)\|\s*Detailed vessel type\s*\|\s*([^|]+?)\s*\|",
            r"(?i)\|\s*General vessel type\s*\|\s*([^|]+?)\s*\|",
        ],
    )
    .filter(|t| !is_upsell_text(t))
    {
        fields.category = if contains_ci(&detailed, "sail") {
            Some(Category::Sailing)
        } else if contains_ci(&detailed, "yacht") {
            Some(Category::Motor)
        } else {
            None
        };
        fields.detailed_type = Some(detailed);
    }

    fields.photo_url = capture(
        md,
        &[
            r"!\[[^\]]*?Vessel[^\]]*?image\]\((https://www\.marinetraffic\.com/getAssetDefaultPhoto[^\s)]+)\)",
            r"!\[[^\]]*?\]\((https://photos\.marinetraffic\.com/[^\s)]+)\)",
        ],
    );
    fields.deadweight = capture(
        md,
        &[
            r"(?i)\|\s*(?:Deadweight|DWT)\s*\|\s*([\d,]+)\s*\|",
            r"(?i)(?:Deadweight|DWT)[:\s]*([\d,]+)",
        ],
    )
    .and_then(parse_grouped_u32);
    fields.call_sign = capture(md, &[r"(?i)\|\s*Call sign\s*\|\s*([A-Z0-9]+)\s*\|"]);

    fields
}

/// Paywalled detail pages replace field values with upsell links.
fn is_upsell_text(s: &str) -> bool {
    contains_ci(s, "upgrade") || contains_ci(s, "unlock")
}

// --- Encyclopedia infobox wikitext ---

/// Owner values that mean "no real owner named".
const OWNER_PLACEHOLDERS: &[&str] = &["unknown", "undisclosed", "private", "various"];

pub fn parse_infobox(wikitext: &str) -> WikiFacts {
    let mut facts = WikiFacts::default();

    facts.owner_name = capture(
        wikitext,
        &[
            r"(?im)\|\s*(?:Ship\s*owner|Owner)\s*=\s*\[\[([^\]|]+)",
            r"(?im)\|\s*(?:Ship\s*owner|Owner)\s*=\s*([A-ZÀ-ÿ][A-Za-zÀ-ÿ\s\-'.]+?)(?:\n|\||\[|<)",
        ],
    )
    .map(|s| s.split("]]").next().unwrap_or(&s).trim().to_string())
    .filter(|name| name.len() > 2 && !is_owner_placeholder(name));

    facts.builder = capture(
        wikitext,
        &[
            r"(?im)\|\s*(?:Ship\s*builder|Builder|Ship\s*yard)\s*=\s*\[\[([^\]|]+)",
            r"(?im)\|\s*(?:Ship\s*builder|Builder|Ship\s*yard)\s*=\s*([A-ZÀ-ÿ][A-Za-zÀ-ÿ&\s\+\-'.]+?)(?:\n|\||\[|<)",
        ],
    )
    .filter(|b| b.len() > 2);

    facts.year_built = capture(
        wikitext,
        &[r"(?im)\|\s*(?:Ship\s*completed|Ship\s*launched|Ship\s*christened|Ship\s*delivered)\s*=\s*[^\n]*?(\d{4})"],
    )
    .and_then(|s| s.parse().ok());

    facts.length_meters = capture(
        wikitext,
        &[r"(?im)\|\s*Ship\s*length\s*=\s*[^\n]*?([\d.]+)\s*(?:m\b|metres|meters)"],
    )
    .and_then(parse_meters);

    facts
}

fn is_owner_placeholder(name: &str) -> bool {
    OWNER_PLACEHOLDERS
        .iter()
        .any(|p| contains_ci(name, p))
}

// --- Encyclopedia lead extract ---

pub fn parse_lead_extract(extract: &str) -> WikiFacts {
    let mut facts = WikiFacts::default();

    facts.builder = capture(
        extract,
        &[r"(?i)(?:built by|constructed by|built at|shipyard|builder)[:\s]+([A-Z][A-Za-zÀ-ÿ&\s\+\-']+?)(?:[,.\n]|in \d)"],
    );
    facts.year_built = capture(
        extract,
        &[r"(?i)(?:built in|launched in|completed in|delivered in)\s+(\d{4})"],
    )
    .and_then(|s| s.parse().ok());
    facts.owner_name = capture(
        extract,
        &[r"(?i)(?:owned by|owner is|belongs to|commissioned by)\s+([A-Z][A-Za-zÀ-ÿ\s\-']+?)[,.\n]"],
    );
    facts.length_meters = capture(
        extract,
        &[r"(?i)(?:length|LOA)[^\d\n]{0,12}([\d.]+)\s*(?:m\b|metres|meters)"],
    )
    .and_then(parse_meters);
    facts.sailing = matches_any(extract, &[r"(?i)sailing yacht|sailing vessel|sailboat"]);

    facts
}

// --- Candidate page selection ---

/// Lowercased words of a name worth matching on (length > 1, punctuation
/// stripped).
pub fn significant_words(name: &str) -> Vec<String> {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.len() > 1)
        .map(str::to_string)
        .collect()
}

/// Picks the first search hit that plausibly is the vessel's own page.
///
/// List and disambiguation pages are skipped, as are military-vessel pages
/// whose prefix the query itself does not carry. The surviving candidate
/// must carry most of the name's significant words in its title (or all of
/// them in its snippet) and vessel-domain vocabulary in either.
pub fn select_vessel_page<'a>(
    hits: &'a [WikiSearchHit],
    vessel_name: &str,
) -> Option<&'a WikiSearchHit> {
    let name_words = significant_words(vessel_name);
    if name_words.is_empty() {
        return None;
    }
    let name_has_naval_prefix = vessel_name.contains("USS ") || vessel_name.contains("HMS ");

    hits.iter().find(|hit| {
        let title = hit.title.to_lowercase();
        let snippet = strip_tags(&hit.snippet).to_lowercase();

        if title.starts_with("list of ") || title.contains("disambiguation") {
            return false;
        }
        if (hit.title.contains("USS ") || hit.title.contains("HMS ")) && !name_has_naval_prefix {
            return false;
        }

        let title_hits = name_words.iter().filter(|w| title.contains(*w)).count();
        let name_in_title = title_hits >= (name_words.len().saturating_sub(1)).max(1);
        let name_in_snippet = name_words.iter().all(|w| snippet.contains(w));
        if !name_in_title && !name_in_snippet {
            return false;
        }

        is_vessel_vocabulary(&title, &snippet)
    })
}

fn is_vessel_vocabulary(title: &str, snippet: &str) -> bool {
    ["yacht", "ship", "vessel"]
        .iter()
        .any(|w| title.contains(w))
        || [
            "yacht",
            "superyacht",
            "motor yacht",
            "sailing yacht",
            "luxury vessel",
            "megayacht",
            "ship",
            "vessel",
        ]
        .iter()
        .any(|w| snippet.contains(w))
}

/// Picks the first search hit whose title contains every significant word of
/// the owner's name.
pub fn select_owner_page<'a>(
    hits: &'a [WikiSearchHit],
    owner_name: &str,
) -> Option<&'a WikiSearchHit> {
    let words: Vec<String> = owner_name
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return None;
    }
    hits.iter().find(|hit| {
        let title = hit.title.to_lowercase();
        words.iter().all(|w| title.contains(w))
    })
}

/// Strips HTML tags from a search snippet.
pub fn strip_tags(snippet: &str) -> String {
    match Regex::new(r"<[^>]+>") {
        Ok(re) => re.replace_all(snippet, "").into_owned(),
        Err(_) => snippet.to_string(),
    }
}

// --- Owner biography ---

const ROLE_NOUNS: &str =
    "billionaire|entrepreneur|businessman|businesswoman|investor|executive|magnate|tycoon";

/// Derives a one-line business/role summary and a net-worth figure from an
/// owner's page extract.
pub fn parse_owner_profile(extract: &str) -> OwnerProfile {
    let mut profile = OwnerProfile::default();

    let first_sentence = split_first_sentence(extract);
    let business_patterns = [
        format!(r"(?i)(?:is|was)\s+(?:an?\s+)?([A-Za-z\s,\-]+?)\s+(?:{})", ROLE_NOUNS),
        format!(r"(?i)(?:is|was)\s+(?:an?\s+)?(?:[A-Za-z\s]+?\s+)?({})", ROLE_NOUNS),
        r"(?i)(?:is|was)\s+(?:an?\s+)?([A-Za-z\s,\-]+?)(?:\.|who\b|known\b|He\b|She\b)".to_string(),
    ];
    for pattern in &business_patterns {
        if let Some(candidate) = capture(first_sentence, &[pattern.as_str()]) {
            if candidate.len() > 3 && candidate.len() < 120 {
                profile.business_summary = Some(candidate);
                break;
            }
        }
    }

    // Fall back to company affiliations when no role sentence matched.
    if profile.business_summary.is_none() {
        let companies = company_affiliations(extract);
        if !companies.is_empty() {
            profile.business_summary = Some(companies[..companies.len().min(2)].join(", "));
        }
    }

    profile.net_worth = capture(
        extract,
        &[r"(?i)net\s*worth[^.]*?\$\s*([\d.]+\s*(?:billion|million|B|M))"],
    )
    .map(|amount| format!("${}", amount))
    .or_else(|| {
        let re = Regex::new(r"(?i)(?:Forbes|estimated|worth)[^.]*?\$\s*([\d.]+)\s*(billion|million)")
            .ok()?;
        let caps = re.captures(extract)?;
        Some(format!("${} {}", &caps[1], &caps[2]))
    });

    profile
}

fn split_first_sentence(extract: &str) -> &str {
    match Regex::new(r"\.\s").ok().and_then(|re| re.find(extract)) {
        Some(m) => &extract[..m.start() + 1],
        None => extract,
    }
}

fn company_affiliations(extract: &str) -> Vec<String> {
    let patterns = [
        r"(?:founder|co-founder|CEO|chairman|owner)\s+(?:of\s+)?(?:the\s+)?([A-Z][A-Za-z\s&\-'.]+?)[,.\n]",
        r"(?:founded|co-founded|leads?|runs?|heads?)\s+([A-Z][A-Za-z\s&\-'.]+?)[,.\n]",
    ];
    let mut companies = Vec::new();
    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        for caps in re.captures_iter(extract) {
            let company = caps[1].trim().to_string();
            let pronoun_noise = ["He ", "She ", "His ", "Her ", "The "]
                .iter()
                .any(|p| company.contains(p));
            if company.len() > 2 && company.len() < 60 && !pronoun_noise {
                companies.push(company);
            }
        }
    }
    companies
}

// --- Generative-model response ---

/// Extracts the first balanced JSON object substring from free text,
/// ignoring surrounding prose. String literals with escaped quotes and
/// braces are handled.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0;
    let mut in_str = false;
    let mut escape = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_str {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_str = false;
            }
            continue;
        }
        match ch {
            '"' => in_str = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses the generative-model response into facts; anything non-JSON or
/// unparsable is simply no enrichment.
pub fn parse_llm_response(text: &str) -> Option<LlmFacts> {
    let json = first_json_object(text)?;
    serde_json::from_str(json).ok()
}

// --- Shared helpers ---

/// First capture group of the first pattern that matches, trimmed.
/// Mirrors the `match(a) || match(b)` fallback chains of pattern scraping.
fn capture(text: &str, patterns: &[&str]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        let caps = re.captures(text)?;
        caps.get(1)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn matches_any(text: &str, patterns: &[&str]) -> bool {
    patterns
        .iter()
        .any(|p| Regex::new(p).map(|re| re.is_match(text)).unwrap_or(false))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn parse_grouped_u32(raw: String) -> Option<u32> {
    raw.replace(',', "").parse().ok()
}

fn parse_meters(raw: String) -> Option<u32> {
    raw.parse::<f64>().ok().map(|f| f.round() as u32)
}
