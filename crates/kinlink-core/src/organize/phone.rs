//! Phone organizer

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{group_values, sort_by_confidence, OrganizedPhone};
use crate::candidate::PersonCandidate;
use crate::confidence::WeightTable;
use crate::finding::SourceTag;

/// Per-source points for a phone number
pub const PHONE_WEIGHTS: WeightTable = WeightTable {
    phone_api: 40,
    public_records: 30,
    user_input: 20,
    web_mention: 10,
    social_media: 10,
    verified_email: 5,
};

const TOLL_FREE: &[&str] = &["800", "833", "844", "855", "866", "877", "888"];

/// Non-geographic personal-communication codes, commonly virtual numbers
const NON_GEOGRAPHIC: &[&str] = &[
    "500", "521", "522", "523", "524", "525", "526", "527", "528", "529", "533", "544", "566",
    "577", "588",
];

const VOIP_CARRIER_HINTS: &[&str] = &[
    "voip",
    "google voice",
    "bandwidth",
    "twilio",
    "onvoy",
    "textnow",
    "pinger",
    "vonage",
    "inteliquent",
    "level 3",
];

const SPAM_KEYWORDS: &[&str] = &[
    "spam",
    "scam",
    "robocall",
    "telemarketer",
    "telemarketing",
    "fraud",
    "harass",
    "unwanted call",
    "debt collector",
];

/// Area codes by state
const AREA_CODES: &[(&str, &[&str])] = &[
    ("AL", &["205", "251", "256", "334", "938"]),
    ("AK", &["907"]),
    ("AZ", &["480", "520", "602", "623", "928"]),
    ("AR", &["479", "501", "870"]),
    (
        "CA",
        &[
            "209", "213", "310", "323", "408", "415", "424", "510", "530", "559", "562", "619",
            "626", "650", "657", "661", "707", "714", "747", "760", "805", "818", "831", "858",
            "909", "916", "925", "949", "951",
        ],
    ),
    ("CO", &["303", "719", "720", "970"]),
    ("CT", &["203", "475", "860", "959"]),
    ("DE", &["302"]),
    ("DC", &["202"]),
    (
        "FL",
        &[
            "239", "305", "321", "352", "386", "407", "561", "727", "754", "772", "786", "813",
            "850", "863", "904", "941", "954",
        ],
    ),
    ("GA", &["229", "404", "470", "478", "678", "706", "762", "770", "912"]),
    ("HI", &["808"]),
    ("ID", &["208", "986"]),
    (
        "IL",
        &[
            "217", "224", "309", "312", "331", "618", "630", "708", "773", "779", "815", "847",
            "872",
        ],
    ),
    ("IN", &["219", "260", "317", "463", "574", "765", "812", "930"]),
    ("IA", &["319", "515", "563", "641", "712"]),
    ("KS", &["316", "620", "785", "913"]),
    ("KY", &["270", "364", "502", "606", "859"]),
    ("LA", &["225", "318", "337", "504", "985"]),
    ("ME", &["207"]),
    ("MD", &["240", "301", "410", "443", "667"]),
    ("MA", &["339", "351", "413", "508", "617", "774", "781", "857", "978"]),
    (
        "MI",
        &[
            "231", "248", "269", "313", "517", "586", "616", "734", "810", "906", "947", "989",
        ],
    ),
    ("MN", &["218", "320", "507", "612", "651", "763", "952"]),
    ("MS", &["228", "601", "662", "769"]),
    ("MO", &["314", "417", "573", "636", "660", "816"]),
    ("MT", &["406"]),
    ("NE", &["308", "402", "531"]),
    ("NV", &["702", "725", "775"]),
    ("NH", &["603"]),
    (
        "NJ",
        &[
            "201", "551", "609", "640", "732", "848", "856", "862", "908", "973",
        ],
    ),
    ("NM", &["505", "575"]),
    (
        "NY",
        &[
            "212", "315", "332", "347", "516", "518", "585", "607", "631", "646", "680", "716",
            "718", "838", "845", "914", "917", "929", "934",
        ],
    ),
    ("NC", &["252", "336", "704", "743", "828", "910", "919", "980", "984"]),
    ("ND", &["701"]),
    (
        "OH",
        &[
            "216", "220", "234", "283", "326", "330", "380", "419", "440", "513", "567", "614",
            "740", "937",
        ],
    ),
    ("OK", &["405", "539", "580", "918"]),
    ("OR", &["458", "503", "541", "971"]),
    (
        "PA",
        &[
            "215", "223", "267", "272", "412", "445", "484", "570", "610", "717", "724", "814",
            "878",
        ],
    ),
    ("RI", &["401"]),
    ("SC", &["803", "839", "843", "854", "864"]),
    ("SD", &["605"]),
    ("TN", &["423", "615", "629", "731", "865", "901", "931"]),
    (
        "TX",
        &[
            "210", "214", "254", "281", "325", "346", "361", "409", "430", "432", "469", "512",
            "682", "713", "726", "737", "806", "817", "830", "832", "903", "915", "936", "940",
            "956", "972", "979",
        ],
    ),
    ("UT", &["385", "435", "801"]),
    ("VT", &["802"]),
    ("VA", &["276", "434", "540", "571", "703", "757", "804"]),
    ("WA", &["206", "253", "360", "425", "509", "564"]),
    ("WV", &["304", "681"]),
    ("WI", &["262", "414", "534", "608", "715", "920"]),
    ("WY", &["307"]),
];

lazy_static! {
    /// Extension after the number only, so "Fax 740-..." keeps its digits
    static ref EXTENSION: Regex =
        Regex::new(r"(?i)\s*(?:extension|ext\.?|x|#)\s*\d{1,6}\s*$")
            .expect("valid extension regex");
}

/// Strip an extension suffix such as "x12" or "ext. 12"
fn strip_extension(raw: &str) -> &str {
    match EXTENSION.find(raw) {
        Some(found) => &raw[..found.start()],
        None => raw,
    }
}

/// Canonical 10-digit form: digits only, leading country code `1` removed.
/// `None` when the input does not contain a NANP-length number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = strip_extension(raw)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    match digits.len() {
        10 => Some(digits),
        11 if digits.starts_with('1') => Some(digits[1..].to_string()),
        _ => None,
    }
}

/// "(740) 827-6423" for a 10-digit number, otherwise the input unchanged
pub fn format_phone(normalized: &str) -> String {
    if normalized.len() == 10 && normalized.chars().all(|c| c.is_ascii_digit()) {
        format!(
            "({}) {}-{}",
            &normalized[..3],
            &normalized[3..6],
            &normalized[6..]
        )
    } else {
        normalized.to_string()
    }
}

/// State an area code is assigned to
pub fn area_code_region(area_code: &str) -> Option<&'static str> {
    AREA_CODES
        .iter()
        .find(|(_, codes)| codes.contains(&area_code))
        .map(|(state, _)| *state)
}

/// Structural metadata for one phone number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneDetails {
    pub formatted: String,
    pub area_code: Option<String>,
    /// State the area code belongs to
    pub region: Option<String>,
    pub line_type: Option<String>,
    pub carrier: Option<String>,
    pub location: Option<String>,
    pub valid_format: bool,
    pub api_validated: bool,
    pub is_toll_free: bool,
    pub is_voip: bool,
    pub spam_flagged: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spam_keywords: Vec<String>,
}

/// Deduplicates and scores a candidate's phone numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneOrganizer;

impl PhoneOrganizer {
    pub fn new() -> Self {
        Self
    }

    pub fn organize(&self, candidate: &PersonCandidate) -> Vec<OrganizedPhone> {
        let groups = group_values(&candidate.phones, |raw| {
            normalize_phone(raw).unwrap_or_else(|| {
                // Keep malformed numbers visible, keyed by their digits
                raw.chars().filter(|c| c.is_ascii_digit()).collect()
            })
        });

        let mut organized: Vec<OrganizedPhone> = groups
            .into_iter()
            .map(|group| {
                let details = self.details(&group.normalized, candidate);
                let extra: &[SourceTag] = if details.api_validated {
                    &[SourceTag::PhoneApi]
                } else {
                    &[]
                };
                group.into_attribute(&PHONE_WEIGHTS, extra, details)
            })
            .collect();

        sort_by_confidence(&mut organized);
        organized
    }

    fn details(&self, normalized: &str, candidate: &PersonCandidate) -> PhoneDetails {
        let valid_format = normalized.len() == 10;
        let area_code = valid_format.then(|| normalized[..3].to_string());
        let region = area_code
            .as_deref()
            .and_then(area_code_region)
            .map(str::to_string);
        let is_toll_free = area_code
            .as_deref()
            .is_some_and(|code| TOLL_FREE.contains(&code));

        let mut details = PhoneDetails {
            formatted: format_phone(normalized),
            area_code,
            region,
            valid_format,
            is_toll_free,
            ..PhoneDetails::default()
        };

        if let Some(validation) = candidate
            .phone_validation
            .as_ref()
            .filter(|v| v.phone.as_deref().and_then(normalize_phone).as_deref() == Some(normalized))
        {
            details.api_validated = validation.is_usable();
            details.line_type = validation.line_type.clone();
            details.carrier = validation.carrier.clone();
            details.location = validation.location.clone();
        }

        if details.line_type.is_none() && is_toll_free {
            details.line_type = Some("toll_free".to_string());
        }

        let carrier_hint = details
            .carrier
            .as_deref()
            .map(|c| c.to_lowercase())
            .is_some_and(|c| VOIP_CARRIER_HINTS.iter().any(|hint| c.contains(hint)));
        let line_type_voip = details
            .line_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains("voip"));
        let non_geographic = details
            .area_code
            .as_deref()
            .is_some_and(|code| NON_GEOGRAPHIC.contains(&code));
        details.is_voip = carrier_hint || line_type_voip || non_geographic;

        details.spam_keywords = spam_keywords_for(normalized, candidate);
        details.spam_flagged = !details.spam_keywords.is_empty();
        details
    }
}

/// Spam keywords appearing in mentions that reference this number
fn spam_keywords_for(normalized: &str, candidate: &PersonCandidate) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for sourced in &candidate.mentions {
        let mention = &sourced.mention;
        let text = mention.text_blob();
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        let references_number = mention.phone.as_deref().and_then(normalize_phone).as_deref()
            == Some(normalized)
            || (normalized.len() == 10 && digits.contains(normalized));
        if !references_number {
            continue;
        }
        let lower = text.to_lowercase();
        for keyword in SPAM_KEYWORDS {
            if lower.contains(keyword) && !found.iter().any(|k| k == keyword) {
                found.push(keyword.to_string());
            }
        }
    }
    found
}
