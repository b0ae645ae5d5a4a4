//! Municipal corporation registry.
//!
//! One canonical table of corporations keyed by six-digit code. State and
//! region tags are derived from the corporation name by substring matching
//! against an ordered table; the first state whose city list matches wins.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::schema::MunicipalCorporation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorporationEntry {
    pub code: &'static str,
    pub name: &'static str,
}

impl From<&CorporationEntry> for MunicipalCorporation {
    fn from(entry: &CorporationEntry) -> Self {
        MunicipalCorporation {
            name: entry.name.to_string(),
            code: entry.code.to_string(),
        }
    }
}

macro_rules! corporations {
    ($(($code:literal, $name:literal),)*) => {
        &[$(CorporationEntry { code: $code, name: $name },)*]
    };
}

pub static MUNICIPAL_CORPORATIONS: &[CorporationEntry] = corporations![
    ("100001", "Abohar Municipal Corporation"),
    ("100002", "Adityapur Municipal Corporation"),
    ("100003", "Agartala Municipal Corporation"),
    ("100004", "Agra Municipal Corporation"),
    ("100005", "Ahmedabad Municipal Corporation"),
    ("100006", "Ahmednagar Municipal Corporation"),
    ("100007", "Aizawl Municipal Corporation"),
    ("100008", "Ajmer Municipal Corporation"),
    ("100009", "Akola Municipal Corporation"),
    ("100010", "Aligarh Municipal Corporation"),
    ("100011", "Alwar Municipal Corporation"),
    ("100012", "Ambala Municipal Corporation"),
    ("100013", "Ambikapur Municipal Corporation"),
    ("100014", "Amravati Municipal Corporation"),
    ("100015", "Amritsar Municipal Corporation"),
    ("100016", "Anantapur Municipal Corporation"),
    ("100017", "Anuppur Nagar Nigam"),
    ("100018", "Arrah Municipal Corporation"),
    ("100019", "Asansol Municipal Corporation"),
    ("100020", "Ashoknagar Nagar Nigam"),
    ("100021", "Aurangabad Municipal Corporation"),
    ("100022", "Avadi Municipal Corporation"),
    ("100023", "Ayodhya Municipal Corporation"),
    ("100024", "Badangpet Municipal Corporation"),
    ("100025", "Baddi Municipal Corporation"),
    ("100026", "Ballari Municipal Corporation"),
    ("100027", "Bandlaguda Jagir Municipal Corporation"),
    ("100028", "Bareilly Municipal Corporation"),
    ("100029", "Batala Municipal Corporation"),
    ("100030", "Bathinda Municipal Corporation"),
    ("100031", "Begusarai Municipal Corporation"),
    ("100032", "Belagavi Municipal Corporation"),
    ("100033", "Berhampur Municipal Corporation"),
    ("100034", "Betul Nagar Nigam"),
    ("100035", "Bhagalpur Municipal Corporation"),
    ("100036", "Bharatpur Municipal Corporation"),
    ("100037", "Bhavnagar Municipal Corporation"),
    ("100038", "Bhilai Charoda Municipal Corporation"),
    ("100039", "Bhilai Municipal Corporation"),
    ("100040", "Bhind Nagar Nigam"),
    ("100041", "Bhiwandi-Nizampur Municipal Corporation"),
    ("100042", "Bhopal Nagar Nigam"),
    ("100043", "Bhubaneswar Municipal Corporation"),
    ("100044", "Bidhannagar Municipal Corporation"),
    ("100045", "Bihar Sharif Municipal Corporation"),
    ("100046", "Bikaner Municipal Corporation"),
    ("100047", "Birgaon Municipal Corporation"),
    ("100048", "Boduppal Municipal Corporation"),
    ("100049", "Brihanmumbai Municipal Corporation"),
    ("100050", "Bruhat Bengaluru Mahanagara Palike (BBMP)"),
    ("100051", "Burhanpur Nagar Nigam"),
    ("100052", "Chandernagore Municipal Corporation"),
    ("100053", "Chandigarh Municipal Corporation"),
    ("100054", "Chandrapur City Municipal Corporation"),
    ("100055", "Chas Municipal Corporation"),
    ("100056", "Chhindwara Nagar Nigam"),
    ("100057", "Chirmiri Municipal Corporation"),
    ("100058", "Chittoor Municipal Corporation"),
    ("100059", "Coimbatore Municipal Corporation"),
    ("100060", "Corporation of the City of Panaji"),
    ("100061", "Cuddalore Municipal Corporation"),
    ("100062", "Cuttack Municipal Corporation"),
    ("100063", "Darbhanga Municipal Corporation"),
    ("100064", "Datia Nagar Nigam"),
    ("100065", "Davangere Municipal Corporation"),
    ("100066", "Dehradun Municipal Corporation"),
    ("100067", "Deoghar Municipal Corporation"),
    ("100068", "Dewas Nagar Nigam"),
    ("100069", "Dhamtari Municipal Corporation"),
    ("100070", "Dharamshala Municipal Corporation"),
    ("100071", "Dhule Municipal Corporation"),
    ("100072", "Dimapur Municipal Council"),
    ("100073", "Dindigul Municipal Corporation"),
    ("100074", "Durg Municipal Corporation"),
    ("100075", "Durgapur Municipal Corporation"),
    ("100076", "Eluru Municipal Corporation"),
    ("100077", "Erode Municipal Corporation"),
    ("100078", "Faridabad Municipal Corporation"),
    ("100079", "Firozabad Municipal Corporation"),
    ("100080", "Gandhinagar Municipal Corporation"),
    ("100081", "Gangtok Municipal Corporation"),
    ("100082", "Gaya Municipal Corporation"),
    ("100083", "Ghaziabad Municipal Corporation"),
    ("100084", "Giridih Municipal Corporation"),
    ("100085", "Gorakhpur Municipal Corporation"),
    ("100086", "Greater Chennai Corporation"),
    ("100087", "Greater Hyderabad Municipal Corporation (GHMC)"),
    ("100088", "Greater Mumbai Municipal Corporation"),
    ("100089", "Greater Noida Municipal Corporation"),
    ("100090", "Gurugram Municipal Corporation"),
    ("100091", "Guwahati Municipal Corporation"),
    ("100092", "Gwalior Municipal Corporation"),
    ("100093", "Haldia Municipal Corporation"),
    ("100094", "Haridwar Municipal Corporation"),
    ("100095", "Hazaribagh Municipal Corporation"),
    ("100096", "Hospet Municipal Corporation"),
    ("100097", "Hubli-Dharwad Municipal Corporation"),
    ("100098", "Hyderabad Municipal Corporation"),
    ("100099", "Indore Municipal Corporation"),
    ("100100", "Jabalpur Municipal Corporation"),
    ("100101", "Jaipur Municipal Corporation"),
    ("100102", "Jalandhar Municipal Corporation"),
    ("100103", "Jalgaon Municipal Corporation"),
    ("100104", "Jammu Municipal Corporation"),
    ("100105", "Jamnagar Municipal Corporation"),
    ("100106", "Jamshedpur Municipal Corporation"),
    ("100107", "Jhansi Municipal Corporation"),
    ("100108", "Jodhpur Municipal Corporation"),
    ("100109", "Kakinada Municipal Corporation"),
    ("100110", "Kalyan-Dombivli Municipal Corporation"),
    ("100111", "Kanpur Municipal Corporation"),
    ("100112", "Karnal Municipal Corporation"),
    ("100113", "Kochi Municipal Corporation"),
    ("100114", "Kolhapur Municipal Corporation"),
    ("100115", "Kolkata Municipal Corporation"),
    ("100116", "Kollam Municipal Corporation"),
    ("100117", "Kozhikode Municipal Corporation"),
    ("100118", "Kurnool Municipal Corporation"),
    ("100119", "Lucknow Municipal Corporation"),
    ("100120", "Ludhiana Municipal Corporation"),
    ("100121", "Madurai Municipal Corporation"),
    ("100122", "Mangalore Municipal Corporation"),
    ("100123", "Meerut Municipal Corporation"),
    ("100124", "Mira-Bhayandar Municipal Corporation"),
    ("100125", "Mysore Municipal Corporation"),
    ("100126", "Nagpur Municipal Corporation"),
    ("100127", "Nashik Municipal Corporation"),
    ("100128", "Navi Mumbai Municipal Corporation"),
    ("100129", "Nellore Municipal Corporation"),
    ("100130", "Noida Municipal Corporation"),
    ("100131", "Patna Municipal Corporation"),
    ("100132", "Pimpri-Chinchwad Municipal Corporation"),
    ("100133", "Pune Municipal Corporation"),
    ("100134", "Puri Municipal Corporation"),
    ("100135", "Raipur Municipal Corporation"),
    ("100136", "Rajkot Municipal Corporation"),
    ("100137", "Ranchi Municipal Corporation"),
    ("100138", "Salem Municipal Corporation"),
    ("100139", "Shimla Municipal Corporation"),
    ("100140", "Siliguri Municipal Corporation"),
    ("100141", "Solapur Municipal Corporation"),
    ("100142", "Srinagar Municipal Corporation"),
    ("100143", "Surat Municipal Corporation"),
    ("100144", "Thane Municipal Corporation"),
    ("100145", "Thiruvananthapuram Municipal Corporation"),
    ("100146", "Thrissur Municipal Corporation"),
    ("100147", "Tiruchirappalli Municipal Corporation"),
    ("100148", "Tiruppur Municipal Corporation"),
    ("100149", "Udaipur Municipal Corporation"),
    ("100150", "Vadodara Municipal Corporation"),
    ("100151", "Varanasi Municipal Corporation"),
    ("100152", "Vasai-Virar Municipal Corporation"),
    ("100153", "Vijayawada Municipal Corporation"),
    ("100154", "Visakhapatnam Municipal Corporation"),
    ("100155", "Warangal Municipal Corporation"),
];

static STATE_CITIES: &[(&str, &[&str])] = &[
    ("Maharashtra", &["Mumbai", "Pune", "Nagpur", "Nashik", "Aurangabad", "Solapur", "Thane", "Navi Mumbai", "Mira-Bhayandar", "Vasai-Virar", "Pimpri-Chinchwad", "Kolhapur", "Jalgaon", "Amravati", "Ahmednagar", "Dhule"]),
    ("Karnataka", &["Bangalore", "Mysore", "Mangalore", "Hubli-Dharwad", "Belagavi", "Davangere", "Ballari", "Hospet"]),
    ("Tamil Nadu", &["Chennai", "Coimbatore", "Madurai", "Salem", "Tiruchirappalli", "Tiruppur", "Cuddalore", "Dindigul", "Erode", "Kollam", "Thiruvananthapuram", "Thrissur", "Kozhikode"]),
    ("Telangana", &["Hyderabad", "Warangal"]),
    ("Andhra Pradesh", &["Visakhapatnam", "Vijayawada", "Kakinada", "Nellore", "Kurnool", "Anantapur", "Eluru"]),
    ("Gujarat", &["Ahmedabad", "Surat", "Vadodara", "Rajkot", "Jamnagar", "Bhavnagar", "Gandhinagar", "Bhiwandi-Nizampur"]),
    ("Uttar Pradesh", &["Lucknow", "Kanpur", "Varanasi", "Agra", "Ghaziabad", "Noida", "Greater Noida", "Bareilly", "Aligarh", "Jhansi", "Gorakhpur", "Ayodhya", "Firozabad"]),
    ("Delhi", &["Delhi"]),
    ("West Bengal", &["Kolkata", "Siliguri", "Haldia", "Chandernagore", "Bidhannagar"]),
    ("Rajasthan", &["Jaipur", "Jodhpur", "Bikaner", "Udaipur", "Ajmer", "Alwar", "Bharatpur", "Bathinda", "Batala"]),
    ("Punjab", &["Amritsar", "Ludhiana", "Jalandhar", "Patiala", "Bathinda", "Batala"]),
    ("Haryana", &["Gurugram", "Faridabad", "Ambala", "Karnal", "Yamunanagar"]),
    ("Madhya Pradesh", &["Bhopal", "Indore", "Jabalpur", "Gwalior", "Ujjain", "Bhind", "Betul", "Chhindwara", "Burhanpur", "Dewas", "Dhamtari"]),
    ("Bihar", &["Patna", "Gaya", "Bhagalpur", "Darbhanga", "Bihar Sharif", "Arrah", "Begusarai", "Giridih", "Hazaribagh"]),
    ("Odisha", &["Bhubaneswar", "Cuttack", "Berhampur", "Puri", "Rourkela"]),
    ("Jharkhand", &["Ranchi", "Jamshedpur", "Dhanbad", "Bokaro", "Hazaribagh", "Giridih"]),
    ("Assam", &["Guwahati"]),
    ("Uttarakhand", &["Dehradun", "Haridwar", "Shimla"]),
    ("Himachal Pradesh", &["Shimla", "Dharamshala"]),
    ("Jammu & Kashmir", &["Srinagar", "Jammu"]),
    ("Chhattisgarh", &["Raipur", "Bhilai", "Bhilai Charoda", "Durg", "Bilaspur", "Korba", "Rajnandgaon"]),
    ("Goa", &["Panaji"]),
    ("Kerala", &["Kochi", "Thiruvananthapuram", "Kozhikode", "Thrissur", "Kollam"]),
    ("Manipur", &["Imphal"]),
    ("Mizoram", &["Aizawl"]),
    ("Nagaland", &["Dimapur"]),
    ("Tripura", &["Agartala"]),
    ("Sikkim", &["Gangtok"]),
    ("Arunachal Pradesh", &["Itanagar"]),
    ("Meghalaya", &["Shillong"]),
];

pub const UNKNOWN_STATE: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::Central,
    ];

    fn for_state(state: &str) -> Region {
        match state {
            "Delhi" | "Uttar Pradesh" | "Punjab" | "Haryana" | "Himachal Pradesh"
            | "Uttarakhand" | "Jammu & Kashmir" => Region::North,
            "Karnataka" | "Tamil Nadu" | "Andhra Pradesh" | "Telangana" | "Kerala" => {
                Region::South
            }
            "West Bengal" | "Bihar" | "Odisha" | "Jharkhand" | "Assam" | "Manipur"
            | "Mizoram" | "Nagaland" | "Tripura" | "Sikkim" | "Arunachal Pradesh"
            | "Meghalaya" => Region::East,
            "Maharashtra" | "Gujarat" | "Rajasthan" | "Madhya Pradesh" | "Chhattisgarh"
            | "Goa" => Region::West,
            _ => Region::Central,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
            Region::Central => "Central",
        };
        write!(f, "{value}")
    }
}

impl std::str::FromStr for Region {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.to_string().eq_ignore_ascii_case(value))
            .ok_or_else(|| RegistryError::UnknownRegion(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Neither code nor name found")]
    NotFound,
    #[error("Code and name do not match")]
    Mismatch,
    #[error("Unknown region: {0}")]
    UnknownRegion(String),
}

/// A corporation with its derived classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedCorporation {
    pub code: &'static str,
    pub name: &'static str,
    pub state: &'static str,
    pub region: Region,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: Vec<String>,
}

impl MappingReport {
    pub fn all_valid(&self) -> bool {
        self.invalid == 0
    }
}

pub fn corporation_by_code(code: &str) -> Option<&'static CorporationEntry> {
    MUNICIPAL_CORPORATIONS.iter().find(|corp| corp.code == code)
}

pub fn corporation_by_name(name: &str) -> Option<&'static CorporationEntry> {
    MUNICIPAL_CORPORATIONS.iter().find(|corp| corp.name == name)
}

pub fn municipal_code_by_name(name: &str) -> Option<&'static str> {
    corporation_by_name(name).map(|corp| corp.code)
}

pub fn municipal_name_by_code(code: &str) -> Option<&'static str> {
    corporation_by_code(code).map(|corp| corp.name)
}

pub fn is_valid_municipal_code(code: &str) -> bool {
    MUNICIPAL_CORPORATIONS.iter().any(|corp| corp.code == code)
}

pub fn corporation_names() -> Vec<&'static str> {
    MUNICIPAL_CORPORATIONS.iter().map(|corp| corp.name).collect()
}

pub fn corporation_codes() -> Vec<&'static str> {
    MUNICIPAL_CORPORATIONS.iter().map(|corp| corp.code).collect()
}

/// Either side may be unknown as long as the known side resolves; when both
/// resolve they must name the same entry.
pub fn validate_code_and_name(
    code: &str,
    name: &str,
) -> Result<&'static CorporationEntry, RegistryError> {
    match (corporation_by_code(code), corporation_by_name(name)) {
        (None, None) => Err(RegistryError::NotFound),
        (Some(by_code), Some(by_name)) if by_code.code != by_name.code => {
            Err(RegistryError::Mismatch)
        }
        (Some(entry), _) | (None, Some(entry)) => Ok(entry),
    }
}

pub fn state_for_name(name: &str) -> &'static str {
    STATE_CITIES
        .iter()
        .find(|(_, cities)| cities.iter().any(|city| name.contains(city)))
        .map(|(state, _)| *state)
        .unwrap_or(UNKNOWN_STATE)
}

pub fn region_for_name(name: &str) -> Region {
    Region::for_state(state_for_name(name))
}

pub fn classify(entry: &'static CorporationEntry) -> ClassifiedCorporation {
    ClassifiedCorporation {
        code: entry.code,
        name: entry.name,
        state: state_for_name(entry.name),
        region: region_for_name(entry.name),
    }
}

pub fn all_with_regions() -> Vec<ClassifiedCorporation> {
    MUNICIPAL_CORPORATIONS.iter().map(classify).collect()
}

pub fn corporations_by_state(state: &str) -> Vec<&'static CorporationEntry> {
    MUNICIPAL_CORPORATIONS
        .iter()
        .filter(|corp| state_for_name(corp.name) == state)
        .collect()
}

pub fn corporations_by_region(region: Region) -> Vec<&'static CorporationEntry> {
    MUNICIPAL_CORPORATIONS
        .iter()
        .filter(|corp| region_for_name(corp.name) == region)
        .collect()
}

/// Case-insensitive match on the name, or a substring of the code.
pub fn search(query: &str) -> Vec<&'static CorporationEntry> {
    let needle = query.to_lowercase();
    MUNICIPAL_CORPORATIONS
        .iter()
        .filter(|corp| corp.name.to_lowercase().contains(&needle) || corp.code.contains(&needle))
        .collect()
}

/// Round-trips every entry through both lookups.
pub fn check_mappings() -> MappingReport {
    let mut report = MappingReport {
        total: MUNICIPAL_CORPORATIONS.len(),
        ..MappingReport::default()
    };
    for corp in MUNICIPAL_CORPORATIONS {
        let code_by_name = municipal_code_by_name(corp.name);
        let name_by_code = municipal_name_by_code(corp.code);
        if code_by_name == Some(corp.code) && name_by_code == Some(corp.name) {
            report.valid += 1;
        } else {
            report.invalid += 1;
            report.errors.push(format!(
                "{} ({}): codeByName={code_by_name:?}, nameByCode={name_by_code:?}",
                corp.name, corp.code
            ));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_round_trips() {
        for corp in MUNICIPAL_CORPORATIONS {
            assert_eq!(municipal_code_by_name(corp.name), Some(corp.code));
            assert_eq!(municipal_name_by_code(corp.code), Some(corp.name));
        }
        let report = check_mappings();
        assert!(report.all_valid(), "{:?}", report.errors);
        assert_eq!(report.total, 155);
    }

    #[test]
    fn codes_are_unique_six_digit_and_sequential() {
        for (index, corp) in MUNICIPAL_CORPORATIONS.iter().enumerate() {
            assert_eq!(corp.code, format!("{}", 100_001 + index));
            assert_eq!(corp.code.len(), 6);
        }
    }

    #[test]
    fn name_and_code_lists_follow_table_order() {
        let names = corporation_names();
        let codes = corporation_codes();
        assert_eq!(names.len(), 155);
        assert_eq!(codes.len(), 155);
        assert_eq!(codes.first(), Some(&"100001"));
        assert_eq!(codes.last(), Some(&"100155"));
        for (name, code) in names.iter().zip(&codes) {
            assert_eq!(municipal_code_by_name(name), Some(*code));
        }
    }

    #[test]
    fn known_lookups() {
        assert_eq!(municipal_name_by_code("100133"), Some("Pune Municipal Corporation"));
        assert_eq!(municipal_name_by_code("100049"), Some("Brihanmumbai Municipal Corporation"));
        assert_eq!(municipal_code_by_name("Atlantis Municipal Corporation"), None);
        assert!(is_valid_municipal_code("100021"));
        assert!(!is_valid_municipal_code("999999"));
    }

    #[test]
    fn validation_distinguishes_missing_and_mismatched() {
        assert_eq!(
            validate_code_and_name("999999", "Nowhere"),
            Err(RegistryError::NotFound)
        );
        assert_eq!(
            validate_code_and_name("100133", "Surat Municipal Corporation"),
            Err(RegistryError::Mismatch)
        );
        let entry = validate_code_and_name("100133", "Pune Municipal Corporation").unwrap();
        assert_eq!(entry.code, "100133");
        let entry = validate_code_and_name("999999", "Pune Municipal Corporation").unwrap();
        assert_eq!(entry.code, "100133");
    }

    #[test]
    fn state_classification_is_first_match() {
        assert_eq!(state_for_name("Pune Municipal Corporation"), "Maharashtra");
        assert_eq!(state_for_name("Navi Mumbai Municipal Corporation"), "Maharashtra");
        // Listed under both Rajasthan and Punjab; the earlier entry wins.
        assert_eq!(state_for_name("Bathinda Municipal Corporation"), "Rajasthan");
        assert_eq!(state_for_name("Abohar Municipal Corporation"), UNKNOWN_STATE);
    }

    #[test]
    fn region_follows_state() {
        assert_eq!(region_for_name("Lucknow Municipal Corporation"), Region::North);
        assert_eq!(region_for_name("Kochi Municipal Corporation"), Region::South);
        assert_eq!(region_for_name("Guwahati Municipal Corporation"), Region::East);
        assert_eq!(region_for_name("Surat Municipal Corporation"), Region::West);
        assert_eq!(region_for_name("Abohar Municipal Corporation"), Region::Central);
        assert_eq!("north".parse::<Region>().unwrap(), Region::North);
    }

    #[test]
    fn grouping_by_state_and_region() {
        let maharashtra = corporations_by_state("Maharashtra");
        assert!(maharashtra.iter().any(|corp| corp.code == "100133"));
        assert!(maharashtra.iter().all(|corp| state_for_name(corp.name) == "Maharashtra"));

        let classified = all_with_regions();
        assert_eq!(classified.len(), MUNICIPAL_CORPORATIONS.len());
        let south = corporations_by_region(Region::South);
        assert_eq!(
            south.len(),
            classified.iter().filter(|corp| corp.region == Region::South).count()
        );
    }

    #[test]
    fn search_matches_name_or_code() {
        let hits = search("pune");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "100133");

        let hits = search("10015");
        assert_eq!(hits.len(), 6);
        assert!(hits.iter().all(|corp| corp.code.starts_with("10015")));
    }
}
