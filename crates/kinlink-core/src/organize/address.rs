//! Address organizer
//!
//! Addresses are parsed into street, unit, city, state and ZIP. Street words
//! are mapped to USPS abbreviations so that "123 North Main Street" and
//! "123 N Main St" share one canonical form:
//!
//! ```text
//! STREET[ UNIT], CITY, ST ZIP5
//! ```
//!
//! A state written without a ZIP ("COLUMBUS OH") is split off the city part.
//! Inputs that do not split on commas fall back to peeling a trailing ZIP and
//! state off the line, then cutting the city after the last street suffix.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{group_values, sort_by_confidence, OrganizedAddress};
use crate::candidate::PersonCandidate;
use crate::confidence::WeightTable;
use crate::geo::{is_state_code, state_code_for_name};

/// Per-source points for an address
pub const ADDRESS_WEIGHTS: WeightTable = WeightTable {
    public_records: 40,
    user_input: 30,
    phone_api: 15,
    web_mention: 10,
    social_media: 10,
    verified_email: 5,
};

const USPS_ABBREVIATIONS: &[(&str, &str)] = &[
    ("STREET", "ST"),
    ("AVENUE", "AVE"),
    ("ROAD", "RD"),
    ("DRIVE", "DR"),
    ("LANE", "LN"),
    ("BOULEVARD", "BLVD"),
    ("COURT", "CT"),
    ("PLACE", "PL"),
    ("TERRACE", "TER"),
    ("CIRCLE", "CIR"),
    ("PARKWAY", "PKWY"),
    ("HIGHWAY", "HWY"),
    ("SQUARE", "SQ"),
    ("TRAIL", "TRL"),
    ("PIKE", "PIKE"),
    ("NORTH", "N"),
    ("SOUTH", "S"),
    ("EAST", "E"),
    ("WEST", "W"),
    ("NORTHEAST", "NE"),
    ("NORTHWEST", "NW"),
    ("SOUTHEAST", "SE"),
    ("SOUTHWEST", "SW"),
    ("APARTMENT", "APT"),
    ("SUITE", "STE"),
    ("BUILDING", "BLDG"),
    ("FLOOR", "FL"),
];

const STREET_SUFFIXES: &[&str] = &[
    "ST", "AVE", "RD", "DR", "LN", "BLVD", "CT", "PL", "TER", "CIR", "PKWY", "HWY", "SQ", "TRL",
    "PIKE", "WAY",
];

const DIRECTIONALS: &[&str] = &["N", "S", "E", "W", "NE", "NW", "SE", "SW"];

const UNIT_DESIGNATORS: &[&str] = &["APT", "UNIT", "STE", "BLDG", "FL", "RM", "LOT", "#"];

const BUSINESS_KEYWORDS: &[&str] = &[
    "STE", "BLDG", "FL", "LLC", "INC", "CORP", "OFFICE", "PLAZA", "INDUSTRIAL",
];

lazy_static! {
    static ref PO_BOX: Regex =
        Regex::new(r"\b(?:POST OFFICE BOX|P\s*O\s+BOX|POB)\b").expect("valid po box regex");
    static ref ZIP_ONLY: Regex = Regex::new(r"^(\d{5})(?:-\d{4})?$").expect("valid zip regex");
    static ref STATE_ZIP: Regex =
        Regex::new(r"^([A-Z][A-Z ]*?)\s+(\d{5})(?:-\d{4})?$").expect("valid state zip regex");
    static ref TRAILING_UNIT: Regex = Regex::new(
        r"\s+(?:(APT|UNIT|STE|BLDG|FL|RM|LOT)\s+([A-Z0-9-]+)|(#)\s*([A-Z0-9-]+))$"
    )
    .expect("valid unit regex");
    static ref TRAILING_ZIP: Regex =
        Regex::new(r"^(.*?)\s+(\d{5})(?:-\d{4})?$").expect("valid trailing zip regex");
}

/// Parsed pieces of one address, upper-cased and abbreviated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub street: Option<String>,
    pub unit: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl AddressComponents {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.unit.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip.is_none()
    }
}

/// Upper-case, drop periods, replace stray punctuation with spaces and
/// collapse whitespace. Commas survive as part separators.
fn clean(raw: &str) -> String {
    let mapped: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ',' | '#' | '-' | '/') {
                c
            } else {
                ' '
            }
        })
        .collect();
    let spaced = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    PO_BOX.replace_all(&spaced, "PO BOX").into_owned()
}

fn abbreviate(words: &str) -> String {
    words
        .split_whitespace()
        .map(|word| {
            USPS_ABBREVIATIONS
                .iter()
                .find(|(long, _)| *long == word)
                .map(|(_, short)| *short)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// State code for a code or an upper-case full name
fn resolve_state(value: &str, allow_full_name: bool) -> Option<String> {
    if is_state_code(value) {
        return Some(value.to_string());
    }
    if allow_full_name {
        return state_code_for_name(value).map(str::to_string);
    }
    None
}

/// Split a trailing state code or full state name off a run of words.
/// Longer names win, so "WEST VIRGINIA" is not read as "VIRGINIA".
fn split_trailing_state(text: &str) -> Option<(String, String)> {
    let words: Vec<&str> = text.split_whitespace().collect();
    (1..=words.len().min(3)).rev().find_map(|n| {
        let split = words.len() - n;
        resolve_state(&words[split..].join(" "), true)
            .map(|state| (words[..split].join(" "), state))
    })
}

/// Cut the city off a street line after its last street suffix, keeping a
/// directional or unit that follows the suffix on the street side.
fn split_city(line: &str) -> (String, Option<String>) {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(suffix) = words
        .iter()
        .rposition(|word| STREET_SUFFIXES.contains(word))
        .filter(|&index| index > 0)
    else {
        return (line.to_string(), None);
    };

    let mut end = suffix + 1;
    if words.get(end).is_some_and(|word| DIRECTIONALS.contains(word)) {
        end += 1;
    }
    match words.get(end) {
        Some(word) if UNIT_DESIGNATORS.contains(word) => end += 2,
        Some(word) if word.starts_with('#') => end += 1,
        _ => {}
    }

    if end >= words.len() {
        return (line.to_string(), None);
    }
    (words[..end].join(" "), Some(words[end..].join(" ")))
}

/// "APT 4", "STE 200", "#5"
fn format_unit(designator: &str, id: &str) -> String {
    if designator == "#" {
        format!("#{}", id)
    } else {
        format!("{} {}", designator, id)
    }
}

/// Split a trailing unit designator off a street line
fn split_unit(street: &str) -> (String, Option<String>) {
    match TRAILING_UNIT.captures(street) {
        Some(caps) => {
            let start = caps.get(0).map_or(street.len(), |m| m.start());
            let designator = caps.get(1).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            let id = caps.get(2).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
            let unit = format_unit(designator, id);
            (street[..start].trim().to_string(), Some(unit))
        }
        None => (street.to_string(), None),
    }
}

/// A whole comma part that is only a unit, e.g. "APT 4" or "#12"
fn unit_part(part: &str) -> Option<String> {
    let abbreviated = abbreviate(part);
    let (designator, id) = match abbreviated.strip_prefix('#') {
        Some(rest) => ("#", rest.trim().to_string()),
        None => {
            let mut words = abbreviated.splitn(2, ' ');
            let designator = words.next()?;
            let id = words.next()?.trim().to_string();
            (
                UNIT_DESIGNATORS.iter().find(|d| **d == designator).copied()?,
                id,
            )
        }
    };
    (!id.is_empty() && !id.contains(' ')).then(|| format_unit(designator, &id))
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Parse an address into components. Missing pieces stay `None`.
pub fn parse_address(raw: &str) -> AddressComponents {
    let cleaned = clean(raw);
    let mut parts: Vec<String> = cleaned
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return AddressComponents::default();
    }

    let mut components = AddressComponents::default();

    if parts.len() == 1 {
        return parse_single_line(&parts[0]);
    }

    // Trailing "43215", "OH 43215", "COLUMBUS OH 43215", "COLUMBUS OH" or "OH"
    let trailing_zip = parts
        .last()
        .and_then(|last| ZIP_ONLY.captures(last))
        .map(|caps| caps[1].to_string());
    if trailing_zip.is_some() {
        components.zip = trailing_zip;
        parts.pop();
    }
    if let Some(last) = parts.last().cloned() {
        let (region, zip) = match STATE_ZIP.captures(&last) {
            Some(caps) => (caps[1].trim().to_string(), Some(caps[2].to_string())),
            None => (last.clone(), None),
        };
        if zip.is_some() || parts.len() > 1 {
            if let Some((city, state)) = split_trailing_state(&region) {
                components.state = Some(state);
                if zip.is_some() {
                    components.zip = zip;
                }
                parts.pop();
                if !city.is_empty() {
                    parts.push(city);
                }
            }
        }
    }

    match parts.len() {
        0 => {}
        1 => {
            let only = abbreviate(&parts[0]);
            if only.chars().any(|c| c.is_ascii_digit()) {
                let (street, unit) = split_unit(&only);
                components.street = non_empty(street);
                components.unit = unit;
            } else {
                components.city = Some(only);
            }
        }
        _ => {
            let street_line = abbreviate(&parts[0]);
            let (street, mut unit) = split_unit(&street_line);
            components.street = non_empty(street);
            let city_index = parts.len() - 1;
            components.city = non_empty(abbreviate(&parts[city_index]));
            for middle in &parts[1..city_index] {
                match unit_part(middle) {
                    Some(found) if unit.is_none() => unit = Some(found),
                    Some(_) => {}
                    None => {
                        let extra = abbreviate(middle);
                        components.street = Some(match components.street.take() {
                            Some(street) => format!("{} {}", street, extra),
                            None => extra,
                        });
                    }
                }
            }
            components.unit = unit;
        }
    }

    components
}

/// Best-effort parse of an address written without commas
fn parse_single_line(line: &str) -> AddressComponents {
    let mut components = AddressComponents::default();

    if let Some(caps) = ZIP_ONLY.captures(line) {
        components.zip = Some(caps[1].to_string());
        return components;
    }

    // "9 PINE RD MARIETTA OH 45750". State names are matched before
    // abbreviation so "WEST VIRGINIA" stays whole. Without a ZIP the city
    // must be found too, so "12 OAK CT" keeps its suffix.
    let (rest, zip) = match TRAILING_ZIP.captures(line) {
        Some(caps) => (caps[1].trim().to_string(), Some(caps[2].to_string())),
        None => (line.to_string(), None),
    };
    if let Some((head, state)) = split_trailing_state(&rest).filter(|(head, _)| !head.is_empty()) {
        let (street_line, city) = split_city(&abbreviate(&head));
        if zip.is_some() || city.is_some() {
            let (street, unit) = split_unit(&street_line);
            components.street = non_empty(street);
            components.unit = unit;
            components.city = city;
            components.state = Some(state);
            components.zip = zip;
            return components;
        }
    }

    let abbreviated = abbreviate(line);
    if abbreviated.chars().any(|c| c.is_ascii_digit()) {
        let (street, unit) = split_unit(&abbreviated);
        components.street = non_empty(street);
        components.unit = unit;
    } else if let Some(state) = resolve_state(line, true) {
        components.state = Some(state);
    } else {
        components.city = Some(abbreviated);
    }
    components
}

/// Canonical comparable form, `None` when nothing parses
pub fn normalize_address(raw: &str) -> Option<String> {
    let c = parse_address(raw);
    if c.is_empty() {
        return None;
    }

    let mut pieces: Vec<String> = Vec::new();
    match (&c.street, &c.unit) {
        (Some(street), Some(unit)) => pieces.push(format!("{} {}", street, unit)),
        (Some(street), None) => pieces.push(street.clone()),
        (None, Some(unit)) => pieces.push(unit.clone()),
        (None, None) => {}
    }
    if let Some(city) = &c.city {
        pieces.push(city.clone());
    }
    let region = [c.state.as_deref(), c.zip.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !region.is_empty() {
        pieces.push(region);
    }

    Some(pieces.join(", "))
}

/// Coarse use classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    PoBox,
    Business,
    Residential,
    #[default]
    Unknown,
}

impl AddressType {
    pub fn classify(components: &AddressComponents) -> Self {
        let street = components.street.as_deref().unwrap_or_default();
        if street.starts_with("PO BOX") || street.contains(" PO BOX") {
            return Self::PoBox;
        }

        let unit_designator = components
            .unit
            .as_deref()
            .and_then(|u| u.split_whitespace().next());
        let business_word = street
            .split_whitespace()
            .chain(unit_designator)
            .any(|word| BUSINESS_KEYWORDS.contains(&word));
        if business_word {
            return Self::Business;
        }

        let numbered = street.chars().next().is_some_and(|c| c.is_ascii_digit());
        if numbered || components.unit.is_some() {
            Self::Residential
        } else {
            Self::Unknown
        }
    }
}

/// Structural metadata for one address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetails {
    #[serde(flatten)]
    pub components: AddressComponents,
    pub address_type: AddressType,
}

/// Deduplicates and scores a candidate's addresses
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressOrganizer;

impl AddressOrganizer {
    pub fn new() -> Self {
        Self
    }

    pub fn organize(&self, candidate: &PersonCandidate) -> Vec<OrganizedAddress> {
        let groups = group_values(&candidate.addresses, |raw| {
            normalize_address(raw).unwrap_or_default()
        });

        let mut organized: Vec<OrganizedAddress> = groups
            .into_iter()
            .map(|group| {
                let components = parse_address(&group.value);
                let details = AddressDetails {
                    address_type: AddressType::classify(&components),
                    components,
                };
                group.into_attribute(&ADDRESS_WEIGHTS, &[], details)
            })
            .collect();

        sort_by_confidence(&mut organized);
        organized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ConfidenceBand;
    use crate::finding::SourceTag;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_full_address() {
        let c = parse_address("123 North Main Street, Apt. 4, Columbus, Ohio 43215-1234");
        assert_eq!(
            c,
            AddressComponents {
                street: Some("123 N MAIN ST".into()),
                unit: Some("APT 4".into()),
                city: Some("COLUMBUS".into()),
                state: Some("OH".into()),
                zip: Some("43215".into()),
            }
        );
    }

    #[test]
    fn spellings_share_a_canonical_form() {
        let a = normalize_address("123 N. Main St, Columbus, OH 43215");
        let b = normalize_address("123 north main street,  columbus , oh 43215");
        assert_eq!(a.as_deref(), Some("123 N MAIN ST, COLUMBUS, OH 43215"));
        assert_eq!(a, b);
    }

    #[test]
    fn unit_on_street_line() {
        let c = parse_address("55 Elm Ave Suite 200, Dayton, OH");
        assert_eq!(c.street.as_deref(), Some("55 ELM AVE"));
        assert_eq!(c.unit.as_deref(), Some("STE 200"));
        assert_eq!(c.state.as_deref(), Some("OH"));
        assert_eq!(c.zip, None);
    }

    #[test]
    fn single_line_fallback() {
        let c = parse_address("9 Pine Rd Marietta OH 45750");
        assert_eq!(c.street.as_deref(), Some("9 PINE RD"));
        assert_eq!(c.city.as_deref(), Some("MARIETTA"));
        assert_eq!(c.state.as_deref(), Some("OH"));
        assert_eq!(c.zip.as_deref(), Some("45750"));
        assert_eq!(
            normalize_address("9 Pine Rd Marietta OH 45750"),
            normalize_address("9 Pine Rd, Marietta, OH 45750")
        );
    }

    #[test]
    fn single_line_keeps_units_and_multiword_cities() {
        let c = parse_address("55 Elm Ave NW Apt 4 New Lexington Ohio");
        assert_eq!(c.street.as_deref(), Some("55 ELM AVE NW"));
        assert_eq!(c.unit.as_deref(), Some("APT 4"));
        assert_eq!(c.city.as_deref(), Some("NEW LEXINGTON"));
        assert_eq!(c.state.as_deref(), Some("OH"));

        // a court is not Connecticut without a city or ZIP around it
        let court = parse_address("12 Oak Ct");
        assert_eq!(court.street.as_deref(), Some("12 OAK CT"));
        assert_eq!(court.state, None);
    }

    #[test]
    fn bare_state_splits_off_the_city() {
        let c = parse_address("123 Main St, Columbus OH");
        assert_eq!(c.street.as_deref(), Some("123 MAIN ST"));
        assert_eq!(c.city.as_deref(), Some("COLUMBUS"));
        assert_eq!(c.state.as_deref(), Some("OH"));
        assert_eq!(c.zip, None);

        let named = parse_address("456 Oak Ave, Los Angeles California");
        assert_eq!(named.city.as_deref(), Some("LOS ANGELES"));
        assert_eq!(named.state.as_deref(), Some("CA"));

        let zipped = parse_address("7 Ash Dr, Wheeling West Virginia 26003");
        assert_eq!(zipped.city.as_deref(), Some("WHEELING"));
        assert_eq!(zipped.state.as_deref(), Some("WV"));
        assert_eq!(zipped.zip.as_deref(), Some("26003"));

        assert_eq!(
            normalize_address("123 Main St, Columbus OH"),
            normalize_address("123 Main Street, Columbus, Ohio")
        );
    }

    #[test]
    fn po_box_spellings() {
        let a = normalize_address("P.O. Box 12, Athens, OH 45701");
        let b = normalize_address("Post Office Box 12, Athens, OH 45701");
        assert_eq!(a.as_deref(), Some("PO BOX 12, ATHENS, OH 45701"));
        assert_eq!(a, b);
        let c = parse_address("PO Box 12, Athens, OH 45701");
        assert_eq!(AddressType::classify(&c), AddressType::PoBox);
    }

    #[test]
    fn classification() {
        let business = parse_address("1 Commerce Plaza Ste 300, Toledo, OH 43604");
        assert_eq!(AddressType::classify(&business), AddressType::Business);
        let home = parse_address("42 Oak Ln, Zanesville, OH 43701");
        assert_eq!(AddressType::classify(&home), AddressType::Residential);
        let vague = parse_address("Columbus, OH");
        assert_eq!(AddressType::classify(&vague), AddressType::Unknown);
    }

    #[test]
    fn empty_input_does_not_normalize() {
        assert_eq!(normalize_address("  , , "), None);
        assert!(parse_address("").is_empty());
    }

    #[test]
    fn organizer_groups_and_scores() {
        let mut c = PersonCandidate::new("John Smith");
        c.add_address("123 N. Main St, Columbus, OH 43215", SourceTag::UserInput);
        c.add_address("123 North Main Street, Columbus, OH 43215", SourceTag::PublicRecords);
        c.add_address("PO Box 9, Athens, OH 45701", SourceTag::WebMention);

        let addresses = AddressOrganizer::new().organize(&c);
        assert_eq!(addresses.len(), 2);
        // 40 + 30 sources, +10 for the second spelling
        assert_eq!(addresses[0].confidence_score, 80);
        assert_eq!(addresses[0].confidence, ConfidenceBand::High);
        assert_eq!(addresses[0].details.address_type, AddressType::Residential);
        assert_eq!(addresses[0].details.components.city.as_deref(), Some("COLUMBUS"));
        assert_eq!(addresses[1].details.address_type, AddressType::PoBox);
        assert_eq!(addresses[1].confidence, ConfidenceBand::Low);
    }
}
