//! Region codes and geographic adjacency
//!
//! Merges are refused between candidates whose known regions are neither
//! equal nor neighboring. Regions are US state (and DC) postal codes.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::candidate::PersonCandidate;
use crate::organize::parse_address;

/// Postal code and full name for every state and DC
pub const STATES: &[(&str, &str)] = &[
    ("AL", "ALABAMA"),
    ("AK", "ALASKA"),
    ("AZ", "ARIZONA"),
    ("AR", "ARKANSAS"),
    ("CA", "CALIFORNIA"),
    ("CO", "COLORADO"),
    ("CT", "CONNECTICUT"),
    ("DE", "DELAWARE"),
    ("DC", "DISTRICT OF COLUMBIA"),
    ("FL", "FLORIDA"),
    ("GA", "GEORGIA"),
    ("HI", "HAWAII"),
    ("ID", "IDAHO"),
    ("IL", "ILLINOIS"),
    ("IN", "INDIANA"),
    ("IA", "IOWA"),
    ("KS", "KANSAS"),
    ("KY", "KENTUCKY"),
    ("LA", "LOUISIANA"),
    ("ME", "MAINE"),
    ("MD", "MARYLAND"),
    ("MA", "MASSACHUSETTS"),
    ("MI", "MICHIGAN"),
    ("MN", "MINNESOTA"),
    ("MS", "MISSISSIPPI"),
    ("MO", "MISSOURI"),
    ("MT", "MONTANA"),
    ("NE", "NEBRASKA"),
    ("NV", "NEVADA"),
    ("NH", "NEW HAMPSHIRE"),
    ("NJ", "NEW JERSEY"),
    ("NM", "NEW MEXICO"),
    ("NY", "NEW YORK"),
    ("NC", "NORTH CAROLINA"),
    ("ND", "NORTH DAKOTA"),
    ("OH", "OHIO"),
    ("OK", "OKLAHOMA"),
    ("OR", "OREGON"),
    ("PA", "PENNSYLVANIA"),
    ("RI", "RHODE ISLAND"),
    ("SC", "SOUTH CAROLINA"),
    ("SD", "SOUTH DAKOTA"),
    ("TN", "TENNESSEE"),
    ("TX", "TEXAS"),
    ("UT", "UTAH"),
    ("VT", "VERMONT"),
    ("VA", "VIRGINIA"),
    ("WA", "WASHINGTON"),
    ("WV", "WEST VIRGINIA"),
    ("WI", "WISCONSIN"),
    ("WY", "WYOMING"),
];

/// Land borders. Read in both directions by [`are_neighbors`].
const ADJACENCY: &[(&str, &[&str])] = &[
    ("AL", &["FL", "GA", "MS", "TN"]),
    ("AZ", &["CA", "CO", "NV", "NM", "UT"]),
    ("AR", &["LA", "MS", "MO", "OK", "TN", "TX"]),
    ("CA", &["AZ", "NV", "OR"]),
    ("CO", &["AZ", "KS", "NE", "NM", "OK", "UT", "WY"]),
    ("CT", &["MA", "NY", "RI"]),
    ("DE", &["MD", "NJ", "PA"]),
    ("DC", &["MD", "VA"]),
    ("FL", &["AL", "GA"]),
    ("GA", &["AL", "FL", "NC", "SC", "TN"]),
    ("ID", &["MT", "NV", "OR", "UT", "WA", "WY"]),
    ("IL", &["IN", "IA", "KY", "MO", "WI"]),
    ("IN", &["IL", "KY", "MI", "OH"]),
    ("IA", &["IL", "MN", "MO", "NE", "SD", "WI"]),
    ("KS", &["CO", "MO", "NE", "OK"]),
    ("KY", &["IL", "IN", "MO", "OH", "TN", "VA", "WV"]),
    ("LA", &["AR", "MS", "TX"]),
    ("ME", &["NH"]),
    ("MD", &["DE", "PA", "VA", "WV", "DC"]),
    ("MA", &["CT", "NH", "NY", "RI", "VT"]),
    ("MI", &["IN", "OH", "WI"]),
    ("MN", &["IA", "ND", "SD", "WI"]),
    ("MS", &["AL", "AR", "LA", "TN"]),
    ("MO", &["AR", "IL", "IA", "KS", "KY", "NE", "OK", "TN"]),
    ("MT", &["ID", "ND", "SD", "WY"]),
    ("NE", &["CO", "IA", "KS", "MO", "SD", "WY"]),
    ("NV", &["AZ", "CA", "ID", "OR", "UT"]),
    ("NH", &["ME", "MA", "VT"]),
    ("NJ", &["DE", "NY", "PA"]),
    ("NM", &["AZ", "CO", "OK", "TX", "UT"]),
    ("NY", &["CT", "MA", "NJ", "PA", "VT"]),
    ("NC", &["GA", "SC", "TN", "VA"]),
    ("ND", &["MN", "MT", "SD"]),
    ("OH", &["IN", "KY", "MI", "PA", "WV"]),
    ("OK", &["AR", "CO", "KS", "MO", "NM", "TX"]),
    ("OR", &["CA", "ID", "NV", "WA"]),
    ("PA", &["DE", "MD", "NJ", "NY", "OH", "WV"]),
    ("RI", &["CT", "MA"]),
    ("SC", &["GA", "NC"]),
    ("SD", &["IA", "MN", "MT", "NE", "ND", "WY"]),
    ("TN", &["AL", "AR", "GA", "KY", "MS", "MO", "NC", "VA"]),
    ("TX", &["AR", "LA", "NM", "OK"]),
    ("UT", &["AZ", "CO", "ID", "NV", "NM", "WY"]),
    ("VT", &["MA", "NH", "NY"]),
    ("VA", &["KY", "MD", "NC", "TN", "WV", "DC"]),
    ("WA", &["ID", "OR"]),
    ("WV", &["KY", "MD", "OH", "PA", "VA"]),
    ("WI", &["IL", "IA", "MI", "MN"]),
    ("WY", &["CO", "ID", "MT", "NE", "SD", "UT"]),
];

lazy_static! {
    /// ", OH" or ", Pittsburgh PA 15213" inside free text. A code must follow
    /// a comma or a comma and city, so "Parcel ID 04512" is not Idaho.
    static ref REGION_IN_TEXT: Regex = Regex::new(
        r",\s*([A-Z]{2})\b|,\s*[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*\s+([A-Z]{2})\s+\d{5}\b"
    )
    .expect("valid region regex");
}

pub fn is_state_code(code: &str) -> bool {
    STATES.iter().any(|(c, _)| *c == code)
}

/// Postal code for an upper-case full state name
pub fn state_code_for_name(name: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(_, full)| *full == name)
        .map(|(code, _)| *code)
}

/// Canonical two-letter code for a code or full name in any case
pub fn canonical_region(value: &str) -> Option<&'static str> {
    let upper = value.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
    STATES
        .iter()
        .find(|(code, full)| *code == upper || *full == upper)
        .map(|(code, _)| *code)
}

/// True when two distinct regions share a border
pub fn are_neighbors(a: &str, b: &str) -> bool {
    let listed = |from: &str, to: &str| {
        ADJACENCY
            .iter()
            .any(|(state, borders)| *state == from && borders.contains(&to))
    };
    listed(a, b) || listed(b, a)
}

/// Two region sets are compatible unless both are known and no pair of
/// regions is equal or neighboring.
pub fn compatible(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    a.iter()
        .any(|ra| b.iter().any(|rb| ra == rb || are_neighbors(ra, rb)))
}

/// Region codes written inside free text
pub fn regions_in_text(text: &str) -> BTreeSet<String> {
    REGION_IN_TEXT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .filter(|code| is_state_code(code))
        .map(str::to_string)
        .collect()
}

/// Every region a candidate's addresses and public records mention
pub fn candidate_regions(candidate: &PersonCandidate) -> BTreeSet<String> {
    let mut regions = BTreeSet::new();

    for value in &candidate.addresses {
        if let Some(state) = parse_address(&value.value).state {
            regions.insert(state);
        }
    }

    for record in &candidate.public_records {
        if let Some(code) = record.state.as_deref().and_then(canonical_region) {
            regions.insert(code.to_string());
        }
        for address in record.all_addresses() {
            if let Some(state) = parse_address(address).state {
                regions.insert(state);
            }
        }
        regions.extend(regions_in_text(&record.text_blob()));
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{PublicRecord, SourceTag};

    fn set(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn adjacency_is_symmetric() {
        for (state, borders) in ADJACENCY {
            for border in *borders {
                assert!(are_neighbors(border, state), "{} <-> {}", state, border);
            }
        }
        assert!(are_neighbors("OH", "PA"));
        assert!(!are_neighbors("OH", "CA"));
        assert!(!are_neighbors("HI", "AK"));
    }

    #[test]
    fn every_adjacency_entry_is_a_state() {
        for (state, borders) in ADJACENCY {
            assert!(is_state_code(state));
            assert!(borders.iter().all(|b| is_state_code(b)));
        }
    }

    #[test]
    fn compatibility_rules() {
        assert!(compatible(&set(&["OH"]), &set(&["OH"])));
        assert!(compatible(&set(&["OH"]), &set(&["PA"])));
        assert!(compatible(&set(&["OH", "CA"]), &set(&["NV"])));
        assert!(!compatible(&set(&["OH"]), &set(&["CA"])));
        assert!(compatible(&set(&[]), &set(&["CA"])));
    }

    #[test]
    fn canonical_region_accepts_names_and_codes() {
        assert_eq!(canonical_region("oh"), Some("OH"));
        assert_eq!(canonical_region(" new  york "), Some("NY"));
        assert_eq!(canonical_region("Ontario"), None);
    }

    #[test]
    fn regions_from_text_patterns() {
        assert_eq!(
            regions_in_text("Deed recorded in Columbus, OH; mailing 4 Elm St, Pittsburgh PA 15213"),
            set(&["OH", "PA"])
        );
        assert!(regions_in_text("JOHN SMITH, JR").is_empty());
        assert!(regions_in_text("Parcel ID 04512 assessed").is_empty());
        assert!(regions_in_text("mailing PA 15213").is_empty());
    }

    #[test]
    fn record_identifiers_are_not_regions() {
        let mut c = PersonCandidate::new("John Smith");
        c.add_address("12 Oak St, Columbus, OH 43215", SourceTag::UserInput);
        c.add_public_record(PublicRecord {
            record_type: Some("Property".into()),
            text: Some("Parcel ID 04512 assessed".into()),
            ..PublicRecord::default()
        });
        assert_eq!(candidate_regions(&c), set(&["OH"]));
    }

    #[test]
    fn candidate_regions_cover_addresses_and_records() {
        let mut c = PersonCandidate::new("John Smith");
        c.add_address("12 Oak St, Columbus, OH 43215", SourceTag::UserInput);
        c.add_public_record(PublicRecord {
            state: Some("Kentucky".into()),
            ..PublicRecord::default()
        });
        assert_eq!(candidate_regions(&c), set(&["KY", "OH"]));
    }
}
