//! End-to-end tests: bundle JSON in, organized persons out

use std::sync::Arc;

use kinlink_core::{
    ConfidenceBand, ConfidenceScorer, CrossReference, FixedClock, LinkageEngine, PersonCandidate,
    PublicRecord, ResultsBundle, SearchParams, SharedData, SourceTag,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const JAN_1_2024: i64 = 1_704_067_200_000;

fn engine() -> LinkageEngine {
    LinkageEngine::default().with_clock(Arc::new(FixedClock::from_millis(JAN_1_2024)))
}

fn bundle(value: Value) -> ResultsBundle {
    serde_json::from_value(value).unwrap()
}

fn candidate(
    name: &str,
    phone: Option<&str>,
    email: Option<&str>,
    state: Option<&str>,
) -> PersonCandidate {
    let mut c = PersonCandidate::new(name);
    c.add_source(SourceTag::PublicRecords);
    if let Some(phone) = phone {
        c.add_phone(phone, SourceTag::PublicRecords);
    }
    if let Some(email) = email {
        c.add_email(email, SourceTag::PublicRecords);
    }
    if let Some(state) = state {
        c.add_public_record(PublicRecord {
            name: Some(name.to_string()),
            state: Some(state.to_string()),
            ..PublicRecord::default()
        });
    }
    c
}

#[test]
fn empty_collections_yield_only_the_subject() {
    let results = engine().organize_with_relationships(&bundle(json!({
        "search_params": {"name": "John Smith"},
        "official_results": {"county_records": null, "phone_validation": null},
        "web_results": {}
    })));

    assert_eq!(results.total_persons_found, 1);
    let person = &results.persons[0];
    assert_eq!(person.name, "John Smith");
    assert_eq!(person.overall_confidence_score, 30);
    assert_eq!(person.overall_confidence_band, ConfidenceBand::Low);
    assert_eq!(results.relationships.unwrap().total_edges, 0);
    assert_eq!(results.summary.unattributed_findings, 0);
}

#[test]
fn phone_spellings_collapse_into_one_number() {
    let results = engine().organize(&bundle(json!({
        "search_params": {"name": "John Smith", "phone": "740-827-6423"},
        "official_results": {
            "county_records": [{
                "search_name": "John Smith",
                "phone": "(740) 827-6423",
                "address": "12 Oak St, Marietta, OH 45750"
            }]
        },
        "web_results": {
            "phone_mentions": [{"name": "John Smith", "phone": "+1 740.827.6423"}]
        }
    })));

    assert_eq!(results.total_persons_found, 1);
    let person = &results.persons[0];
    assert_eq!(person.phones.len(), 3);
    assert_eq!(person.organized_phones.len(), 1);

    let phone = &person.organized_phones[0];
    assert_eq!(phone.normalized, "7408276423");
    assert_eq!(phone.variants.len(), 3);
    assert_eq!(
        phone.sources,
        vec![SourceTag::UserInput, SourceTag::PublicRecords, SourceTag::WebMention]
    );

    // 30 + 25 + 3 for sources, 3 for the record
    assert_eq!(person.overall_confidence_score, 61);
    assert_eq!(person.overall_confidence_band, ConfidenceBand::Medium);
}

#[test]
fn unnamed_findings_without_subject_are_counted() {
    let results = engine().organize(&bundle(json!({
        "web_results": {
            "web_mentions": [{"title": "Anonymous page"}],
            "social_media": [{"name": "Ann Lee", "platform": "example"}]
        }
    })));
    assert_eq!(results.total_persons_found, 1);
    assert_eq!(results.persons[0].name, "Ann Lee");
    assert_eq!(results.summary.unattributed_findings, 1);
}

#[test]
fn distant_regions_refuse_the_merge_but_cross_reference() {
    let results = engine().organize_candidates(
        SearchParams::named("John Smith"),
        vec![
            candidate("John Smith", Some("740-827-6423"), None, Some("OH")),
            candidate("John Smith", Some("(740) 827-6423"), None, Some("CA")),
        ],
    );

    assert_eq!(results.total_persons_found, 2);
    for person in &results.persons {
        assert_eq!(
            person.cross_references,
            vec![CrossReference::new("John Smith", vec![SharedData::Phone])]
        );
        assert_eq!(person.merged_from_sources, 0);
    }
    assert_eq!(results.summary.cross_referenced_persons, 2);
}

#[test]
fn states_written_after_the_city_refuse_the_merge() {
    let located = |address: &str| {
        let mut c = PersonCandidate::new("John Smith");
        c.add_source(SourceTag::PublicRecords);
        c.add_phone("740-827-6423", SourceTag::PublicRecords);
        c.add_address(address, SourceTag::PublicRecords);
        c
    };
    let results = engine().organize_candidates(
        SearchParams::named("John Smith"),
        vec![
            located("123 Main St, Columbus OH"),
            located("456 Oak Ave, Los Angeles CA"),
        ],
    );

    assert_eq!(results.total_persons_found, 2);
    for person in &results.persons {
        assert_eq!(
            person.cross_references,
            vec![CrossReference::new("John Smith", vec![SharedData::Phone])]
        );
    }
}

#[test]
fn a_record_without_a_region_does_not_join_distant_people() {
    let results = engine().organize_candidates(
        SearchParams::default(),
        vec![
            candidate("Mary Jones", Some("614-555-0101"), None, Some("OH")),
            candidate("Mary Jones", Some("614-555-0101"), Some("mj@example.com"), None),
            candidate("Mary Jones", None, Some("mj@example.com"), Some("CA")),
        ],
    );
    assert_eq!(results.total_persons_found, 3);
    assert!(results.persons.iter().all(|p| p.merged_from_sources == 0));
    assert!(results.persons.iter().all(|p| !p.cross_references.is_empty()));
}

#[test]
fn neighboring_regions_merge() {
    let results = engine().organize_candidates(
        SearchParams::named("John Smith"),
        vec![
            candidate("John Smith", Some("740-827-6423"), None, Some("OH")),
            candidate("JOHN SMITH", Some("740.827.6423"), None, Some("West Virginia")),
        ],
    );
    assert_eq!(results.total_persons_found, 1);
    assert_eq!(results.persons[0].merged_from_sources, 1);
    assert_eq!(results.persons[0].public_records.len(), 2);
}

#[test]
fn merges_chain_through_shared_identifiers() {
    let results = engine().organize_candidates(
        SearchParams::default(),
        vec![
            candidate("Mary Jones", Some("614-555-0101"), None, Some("OH")),
            candidate("Mary Jones", Some("614-555-0101"), Some("mj@example.com"), None),
            candidate("Mary  Jones", None, Some("MJ@example.com"), Some("OH")),
        ],
    );
    assert_eq!(results.total_persons_found, 1);
    let person = &results.persons[0];
    assert_eq!(person.merged_from_sources, 2);
    assert_eq!(person.name, "Mary Jones");
    assert_eq!(person.organized_emails.len(), 1);
    assert_eq!(person.organized_phones.len(), 1);
}

#[test]
fn deduplication_does_not_depend_on_input_order() {
    let a = candidate("Mary Jones", Some("614-555-0101"), None, Some("OH"));
    let b = candidate("Mary Jones", Some("614-555-0101"), Some("mj@example.com"), None);
    let c = candidate("Mary Jones", None, Some("mj@example.com"), Some("OH"));
    let d = candidate("Mary Jones", Some("212-555-0199"), None, Some("NY"));

    let shape = |candidates: Vec<PersonCandidate>| -> Vec<(usize, u32)> {
        let mut shape: Vec<(usize, u32)> = engine()
            .organize_candidates(SearchParams::default(), candidates)
            .persons
            .iter()
            .map(|p| (p.organized_phones.len(), p.merged_from_sources))
            .collect();
        shape.sort();
        shape
    };

    let expected = shape(vec![a.clone(), b.clone(), c.clone(), d.clone()]);
    assert_eq!(expected, vec![(1, 0), (1, 2)]);
    assert_eq!(shape(vec![d.clone(), c.clone(), b.clone(), a.clone()]), expected);
    assert_eq!(shape(vec![c.clone(), a.clone(), d.clone(), b.clone()]), expected);
    assert_eq!(shape(vec![b, d, a, c]), expected);
}

#[test]
fn scoring_is_stable_and_monotonic() {
    let scorer = ConfidenceScorer::new();
    let mut c = candidate("John Smith", Some("740-827-6423"), None, Some("OH"));

    let first = scorer.score(&c);
    assert_eq!(scorer.score(&c), first);

    let mut previous = first;
    for source in SourceTag::ALL {
        c.add_source(source);
        let next = scorer.score(&c);
        assert!(next >= previous, "{} lowered the score", source);
        previous = next;
    }
    c.add_phone("212-555-0199", SourceTag::WebMention);
    c.add_email("js@example.com", SourceTag::WebMention);
    assert!(scorer.score(&c) >= previous);
    assert!(scorer.score(&c) <= 100);
}

#[test]
fn json_boundary_accepts_collector_aliases() {
    let out = engine().organize_json(
        &json!({
            "search_params": {"name": "Jane Doe"},
            "official_results": {
                "public_records": [{
                    "name": "Jane Doe",
                    "birth_date": "1980-04-02",
                    "snippet": "Voter registration"
                }],
                "phone_validation": {"number": "7405550100", "is_valid": true, "line_type": "mobile"}
            }
        })
        .to_string(),
    );
    let value: Value = serde_json::from_str(&out).unwrap();
    assert!(value.get("error").is_none(), "{}", out);

    let person = &value["persons"][0];
    assert_eq!(person["name"], "Jane Doe");
    assert_eq!(person["organized_phones"][0]["normalized"], "7405550100");
    assert_eq!(person["phone_validation"]["line_type"], "mobile");
    assert_eq!(
        person["confidence_sources"],
        json!(["user_input", "public_records", "phone_api"])
    );
}
