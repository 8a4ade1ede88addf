//! Label rewrite pipelines.
//!
//! Route long names, trip headsigns and stop names each go through an ordered
//! list of pattern substitutions; each rule's output feeds the next. The rule
//! lists are built once at normalizer construction and are plain values, so a
//! test can run a pipeline with an injected subset. Ordering is significant:
//! the dash-to-space rule must run before the facing-phrase rules, which are
//! anchored on the surrounding spaces it produces.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// One pattern substitution step.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
}

impl Rule {
    pub fn new(pattern: &str, replacement: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid rewrite pattern"),
            replacement: replacement.to_string(),
        }
    }

    fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }
}

/// An ordered rewrite pipeline.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn apply(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |text, rule| rule.apply(&text))
    }
}

/// The agency's label normalizer: one pipeline per label kind.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    route_long_name: RuleSet,
    trip_headsign: RuleSet,
    stop_name: RuleSet,
}

impl TextNormalizer {
    pub fn citla() -> Self {
        Self::with_rules(
            route_long_name_rules(),
            trip_headsign_rules(),
            stop_name_rules(),
        )
    }

    pub fn with_rules(route_long_name: RuleSet, trip_headsign: RuleSet, stop_name: RuleSet) -> Self {
        Self {
            route_long_name,
            trip_headsign,
            stop_name,
        }
    }

    pub fn clean_route_long_name(&self, raw: &str) -> String {
        clean_label(&self.route_long_name.apply(raw))
    }

    pub fn clean_trip_headsign(&self, raw: &str) -> String {
        clean_label_fr(&self.trip_headsign.apply(raw))
    }

    pub fn clean_stop_name(&self, raw: &str) -> String {
        clean_label_fr(&self.stop_name.apply(raw))
    }
}

fn route_long_name_rules() -> RuleSet {
    let rules = vec![
        Rule::new(r"(?i)\bsainte\b", "Ste"),
        Rule::new(r"(?i)\bsaint\b", "St"),
        // Single-letter abbreviation periods ("P. Tremblay" -> "P Tremblay").
        Rule::new(r"\b(\w)\.", "${1}"),
        Rule::new(r"(?i) et ", " & "),
        Rule::new(r"(?i)\(métro ", "("),
        Rule::new(r"(?i)secteurs? ", ""),
        Rule::new(r"(?i)- des? ", "- "),
        Rule::new(
            r"(?i)Boisbriand Sud Vers Boisbriand Nord",
            "Boisbriand Sud => Nord",
        ),
        Rule::new(
            r"(?i)Boisbriand Nord Vers Boisbriand Sud",
            "Boisbriand Nord => Sud",
        ),
    ];
    RuleSet::new(rules)
}

fn trip_headsign_rules() -> RuleSet {
    let mut rules = vec![
        Rule::new(r"(?i)direction ", ""),
        Rule::new(r"(?i)express ", ""),
        Rule::new(r"(?i)secteurs? ", ""),
        Rule::new(r"(?i)(^|\W)civique +#?(\d+)", "${1}#${2}"),
        // Lowercase only: a capitalized "Via" is part of the label and is what
        // the merge table keys on.
        Rule::new(r" via .*", ""),
        Rule::new(r" - ", "<>"),
        // Bilingual labels carry an unspaced slash; keep the French side.
        // Spaced slashes ("Terminus / St-Eustache") are structural.
        Rule::new(r"^(.*?\S)/\S.*", "${1}"),
        Rule::new(r"\b(\w)\.", "${1}"),
    ];
    rules.extend(street_type_rules());
    RuleSet::new(rules)
}

fn stop_name_rules() -> RuleSet {
    let mut rules = vec![
        Rule::new(r" - ", " "),
        Rule::new(r"(?i)\bdevant\b", ""),
        Rule::new(r"(?i)(^|\W)civique +#?(\d+)", "${1}#${2}"),
        // Start-anchored facing phrases first, then mid-string; the longer
        // alternatives must run before the bare "face ".
        Rule::new(r"(?i)^face à ", " "),
        Rule::new(r"(?i)^face au ", " "),
        Rule::new(r"(?i)^face ", " "),
        Rule::new(r"(?i) face à ", " "),
        Rule::new(r"(?i) face au ", " "),
        Rule::new(r"(?i) face ", " "),
        // A bare house number left at the front by facing-phrase removal.
        Rule::new(r"^\s*(\d+)\b", "#${1}"),
    ];
    rules.extend(street_type_rules());
    RuleSet::new(rules)
}

/// FR-CA street type abbreviations, applied word-bounded.
const STREET_TYPES_FR_CA: &[(&str, &str)] = &[
    ("avenue", "av."),
    ("boulevard", "boul."),
    ("chemin", "ch."),
    ("montée", "mtée"),
    ("autoroute", "aut."),
    ("place", "pl."),
    ("terrasse", "tsse"),
    ("promenade", "prom."),
];

fn street_type_rules() -> Vec<Rule> {
    STREET_TYPES_FR_CA
        .iter()
        .map(|(word, abbrev)| Rule::new(&format!(r"(?i)\b{word}\b"), abbrev))
        .collect()
}

/// Generic label cleanup: collapse whitespace, fix parenthesis spacing, trim.
pub fn clean_label(input: &str) -> String {
    let collapsed = WHITESPACE.replace_all(input, " ");
    collapsed.replace("( ", "(").replace(" )", ")").trim().to_string()
}

/// French label cleanup: apostrophe normalization on top of [`clean_label`],
/// and an uppercased first letter.
pub fn clean_label_fr(input: &str) -> String {
    let apostrophes = input.replace('\u{2019}', "'").replace("' ", "'");
    uppercase_first(&clean_label(&apostrophes))
}

fn uppercase_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
