use std::collections::HashMap;

use once_cell::sync::Lazy;

const FIFA_COUNTRY_NAMES: &[(&str, &str)] = &[
    ("AFG", "Afghanistan"), ("AIA", "Anguilla"), ("ALB", "Albania"), ("ALG", "Algeria"),
    ("AND", "Andorra"), ("ANG", "Angola"), ("ANT", "Netherlands Antilles"),
    ("ARG", "Argentina"), ("ARM", "Armenia"), ("ARU", "Aruba"), ("ASA", "American Samoa"),
    ("ATG", "Antigua and Barbuda"), ("AUS", "Australia"), ("AUT", "Austria"),
    ("AZE", "Azerbaijan"), ("BAH", "Bahamas"), ("BAN", "Bangladesh"), ("BDI", "Burundi"),
    ("BEL", "Belgium"), ("BEN", "Benin"), ("BER", "Bermuda"), ("BFA", "Burkina Faso"),
    ("BGD", "Bangladesh"), ("BGR", "Bulgaria"), ("BHR", "Bahrain"), ("BHU", "Bhutan"),
    ("BIH", "Bosnia and Herzegovina"), ("BLR", "Belarus"), ("BLZ", "Belize"),
    ("BOL", "Bolivia"), ("BOT", "Botswana"), ("BRA", "Brazil"), ("BRB", "Barbados"),
    ("BRU", "Brunei Darussalam"), ("BUL", "Bulgaria"), ("CAM", "Cambodia"),
    ("CAN", "Canada"), ("CAY", "Cayman Islands"), ("CGO", "Congo"), ("CHA", "Chad"),
    ("CHI", "Chile"), ("CHN", "China PR"), ("CIV", "Côte d'Ivoire"), ("CMR", "Cameroon"),
    ("COD", "DR Congo"), ("COK", "Cook Islands"), ("COL", "Colombia"), ("COM", "Comoros"),
    ("CPV", "Cape Verde"), ("CRC", "Costa Rica"), ("CRO", "Croatia"),
    ("CTA", "Central African Republic"), ("CUB", "Cuba"), ("CUW", "Curaçao"),
    ("CYP", "Cyprus"), ("CZE", "Czech Republic"), ("DEN", "Denmark"), ("DJI", "Djibouti"),
    ("DMA", "Dominica"), ("DOM", "Dominican Republic"), ("ECU", "Ecuador"),
    ("EGY", "Egypt"), ("ENG", "England"), ("EQG", "Equatorial Guinea"),
    ("ERI", "Eritrea"), ("ESP", "Spain"), ("EST", "Estonia"), ("ETH", "Ethiopia"),
    ("FIJ", "Fiji"), ("FIN", "Finland"), ("FRA", "France"), ("FRO", "Faroe Islands"),
    ("GAB", "Gabon"), ("GAM", "Gambia"), ("GEO", "Georgia"), ("GER", "Germany"),
    ("GHA", "Ghana"), ("GIB", "Gibraltar"), ("GNB", "Guinea-Bissau"), ("GRE", "Greece"),
    ("GRN", "Grenada"), ("GUA", "Guatemala"), ("GUI", "Guinea"), ("GUM", "Guam"),
    ("GUY", "Guyana"), ("HAI", "Haiti"), ("HKG", "Hong Kong"), ("HON", "Honduras"),
    ("HUN", "Hungary"), ("IDN", "Indonesia"), ("IND", "India"),
    ("IRL", "Republic of Ireland"), ("IRN", "Iran"), ("IRQ", "Iraq"), ("ISL", "Iceland"),
    ("ISR", "Israel"), ("ITA", "Italy"), ("JAM", "Jamaica"), ("JOR", "Jordan"),
    ("JPN", "Japan"), ("KAZ", "Kazakhstan"), ("KEN", "Kenya"), ("KGZ", "Kyrgyzstan"),
    ("KOR", "Korea Republic"), ("KOS", "Kosovo"), ("KSA", "Saudi Arabia"),
    ("KUW", "Kuwait"), ("KVX", "Kosovo"), ("LAO", "Laos"), ("LBN", "Lebanon"),
    ("LBR", "Liberia"), ("LBY", "Libya"), ("LCA", "Saint Lucia"), ("LES", "Lesotho"),
    ("LIE", "Liechtenstein"), ("LTU", "Lithuania"), ("LUX", "Luxembourg"),
    ("LVA", "Latvia"), ("MAC", "Macau"), ("MAD", "Madagascar"), ("MAR", "Morocco"),
    ("MAS", "Malaysia"), ("MDA", "Moldova"), ("MDV", "Maldives"), ("MEX", "Mexico"),
    ("MGL", "Mongolia"), ("MKD", "North Macedonia"), ("MLI", "Mali"), ("MLT", "Malta"),
    ("MNE", "Montenegro"), ("MOZ", "Mozambique"), ("MRI", "Mauritius"),
    ("MSR", "Montserrat"), ("MTN", "Mauritania"), ("MWI", "Malawi"), ("MYA", "Myanmar"),
    ("NAM", "Namibia"), ("NCA", "Nicaragua"), ("NCL", "New Caledonia"),
    ("NED", "Netherlands"), ("NEP", "Nepal"), ("NGA", "Nigeria"), ("NIG", "Niger"),
    ("NIR", "Northern Ireland"), ("NOR", "Norway"), ("NZL", "New Zealand"),
    ("OMA", "Oman"), ("PAK", "Pakistan"), ("PAN", "Panama"), ("PAR", "Paraguay"),
    ("PER", "Peru"), ("PHI", "Philippines"), ("PLE", "Palestine"),
    ("PNG", "Papua New Guinea"), ("POL", "Poland"), ("POR", "Portugal"),
    ("PRK", "Korea DPR"), ("PUR", "Puerto Rico"), ("QAT", "Qatar"), ("ROU", "Romania"),
    ("RSA", "South Africa"), ("RUS", "Russia"), ("RWA", "Rwanda"), ("SAM", "Samoa"),
    ("SCO", "Scotland"), ("SEN", "Senegal"), ("SEY", "Seychelles"), ("SGP", "Singapore"),
    ("SKN", "Saint Kitts and Nevis"), ("SLE", "Sierra Leone"), ("SLV", "El Salvador"),
    ("SMR", "San Marino"), ("SOL", "Solomon Islands"), ("SOM", "Somalia"),
    ("SRB", "Serbia"), ("SRI", "Sri Lanka"), ("SSD", "South Sudan"),
    ("STP", "São Tomé and Príncipe"), ("SUD", "Sudan"), ("SUI", "Switzerland"),
    ("SUR", "Suriname"), ("SVK", "Slovakia"), ("SVN", "Slovenia"), ("SWE", "Sweden"),
    ("SWZ", "Eswatini"), ("SYR", "Syria"), ("TAH", "Tahiti"), ("TAN", "Tanzania"),
    ("TCA", "Turks and Caicos Islands"), ("TGA", "Tonga"), ("THA", "Thailand"),
    ("TJK", "Tajikistan"), ("TKM", "Turkmenistan"), ("TLS", "Timor-Leste"),
    ("TOG", "Togo"), ("TPE", "Chinese Taipei"), ("TRI", "Trinidad and Tobago"),
    ("TUN", "Tunisia"), ("TUR", "Turkey"), ("UAE", "United Arab Emirates"),
    ("UGA", "Uganda"), ("UKR", "Ukraine"), ("URU", "Uruguay"), ("USA", "United States"),
    ("UZB", "Uzbekistan"), ("VAN", "Vanuatu"), ("VEN", "Venezuela"),
    ("VGB", "British Virgin Islands"), ("VIE", "Vietnam"),
    ("VIN", "Saint Vincent and the Grenadines"), ("VIR", "US Virgin Islands"),
    ("WAL", "Wales"), ("YEM", "Yemen"), ("ZAM", "Zambia"), ("ZIM", "Zimbabwe"),
];

// Flag codes for web display. Home nations use their subdivision codes.
const FIFA_TO_FLAG_CODE: &[(&str, &str)] = &[
    ("AFG", "af"), ("ALB", "al"), ("ALG", "dz"), ("AND", "ad"), ("ANG", "ao"),
    ("ARG", "ar"), ("ARM", "am"), ("ARU", "aw"), ("ASA", "as"), ("ATG", "ag"),
    ("AUS", "au"), ("AUT", "at"), ("AZE", "az"), ("BAH", "bs"), ("BAN", "bd"),
    ("BDI", "bi"), ("BEL", "be"), ("BEN", "bj"), ("BER", "bm"), ("BFA", "bf"),
    ("BHR", "bh"), ("BHU", "bt"), ("BIH", "ba"), ("BLR", "by"), ("BLZ", "bz"),
    ("BOL", "bo"), ("BOT", "bw"), ("BRA", "br"), ("BRB", "bb"), ("BRU", "bn"),
    ("BUL", "bg"), ("CAM", "kh"), ("CAN", "ca"), ("CAY", "ky"), ("CGO", "cg"),
    ("CHA", "td"), ("CHI", "cl"), ("CHN", "cn"), ("CIV", "ci"), ("CMR", "cm"),
    ("COD", "cd"), ("COK", "ck"), ("COL", "co"), ("COM", "km"), ("CPV", "cv"),
    ("CRC", "cr"), ("CRO", "hr"), ("CTA", "cf"), ("CUB", "cu"), ("CUW", "cw"),
    ("CYP", "cy"), ("CZE", "cz"), ("DEN", "dk"), ("DJI", "dj"), ("DMA", "dm"),
    ("DOM", "do"), ("ECU", "ec"), ("EGY", "eg"), ("ENG", "gb-eng"), ("EQG", "gq"),
    ("ERI", "er"), ("ESP", "es"), ("EST", "ee"), ("ETH", "et"), ("FIJ", "fj"),
    ("FIN", "fi"), ("FRA", "fr"), ("FRO", "fo"), ("GAB", "ga"), ("GAM", "gm"),
    ("GEO", "ge"), ("GER", "de"), ("GHA", "gh"), ("GIB", "gi"), ("GNB", "gw"),
    ("GRE", "gr"), ("GRN", "gd"), ("GUA", "gt"), ("GUI", "gn"), ("GUM", "gu"),
    ("GUY", "gy"), ("HAI", "ht"), ("HKG", "hk"), ("HON", "hn"), ("HUN", "hu"),
    ("IDN", "id"), ("IND", "in"), ("IRL", "ie"), ("IRN", "ir"), ("IRQ", "iq"),
    ("ISL", "is"), ("ISR", "il"), ("ITA", "it"), ("JAM", "jm"), ("JOR", "jo"),
    ("JPN", "jp"), ("KAZ", "kz"), ("KEN", "ke"), ("KGZ", "kg"), ("KOR", "kr"),
    ("KOS", "xk"), ("KSA", "sa"), ("KUW", "kw"), ("LAO", "la"), ("LBN", "lb"),
    ("LBR", "lr"), ("LBY", "ly"), ("LCA", "lc"), ("LES", "ls"), ("LIE", "li"),
    ("LTU", "lt"), ("LUX", "lu"), ("LVA", "lv"), ("MAC", "mo"), ("MAD", "mg"),
    ("MAR", "ma"), ("MAS", "my"), ("MDA", "md"), ("MDV", "mv"), ("MEX", "mx"),
    ("MGL", "mn"), ("MKD", "mk"), ("MLI", "ml"), ("MLT", "mt"), ("MNE", "me"),
    ("MOZ", "mz"), ("MRI", "mu"), ("MSR", "ms"), ("MTN", "mr"), ("MWI", "mw"),
    ("MYA", "mm"), ("NAM", "na"), ("NCA", "ni"), ("NCL", "nc"), ("NED", "nl"),
    ("NEP", "np"), ("NGA", "ng"), ("NIG", "ne"), ("NIR", "gb-nir"), ("NOR", "no"),
    ("NZL", "nz"), ("OMA", "om"), ("PAK", "pk"), ("PAN", "pa"), ("PAR", "py"),
    ("PER", "pe"), ("PHI", "ph"), ("PLE", "ps"), ("PNG", "pg"), ("POL", "pl"),
    ("POR", "pt"), ("PRK", "kp"), ("PUR", "pr"), ("QAT", "qa"), ("ROU", "ro"),
    ("RSA", "za"), ("RUS", "ru"), ("RWA", "rw"), ("SAM", "ws"), ("SCO", "gb-sct"),
    ("SEN", "sn"), ("SEY", "sc"), ("SGP", "sg"), ("SKN", "kn"), ("SLE", "sl"),
    ("SMR", "sm"), ("SOL", "sb"), ("SOM", "so"), ("SRB", "rs"), ("SRI", "lk"),
    ("SSD", "ss"), ("STP", "st"), ("SUD", "sd"), ("SUI", "ch"), ("SUR", "sr"),
    ("SVK", "sk"), ("SVN", "si"), ("SWE", "se"), ("SWZ", "sz"), ("SYR", "sy"),
    ("TAH", "pf"), ("TAN", "tz"), ("TCA", "tc"), ("TGA", "to"), ("THA", "th"),
    ("TJK", "tj"), ("TKM", "tm"), ("TLS", "tl"), ("TOG", "tg"), ("TPE", "tw"),
    ("TRI", "tt"), ("TUN", "tn"), ("TUR", "tr"), ("UAE", "ae"), ("UGA", "ug"),
    ("UKR", "ua"), ("URU", "uy"), ("USA", "us"), ("UZB", "uz"), ("VAN", "vu"),
    ("VEN", "ve"), ("VGB", "vg"), ("VIE", "vn"), ("VIN", "vc"), ("VIR", "vi"),
    ("WAL", "gb-wls"), ("YEM", "ye"), ("ZAM", "zm"), ("ZIM", "zw"),
];

static COUNTRY_NAMES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FIFA_COUNTRY_NAMES.iter().copied().collect());

static FLAG_CODES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FIFA_TO_FLAG_CODE.iter().copied().collect());

/// Nationality resolved from a three-letter FIFA code cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nationality {
    pub fifa_code: String,
    pub name: String,
    pub iso: String,
}

/// Resolves a FIFA code. Unknown codes keep the raw cell text as the name and
/// fall back to the lower-cased first two letters for the flag code.
pub fn resolve_nationality(raw: &str) -> Nationality {
    let fifa_code = raw.trim().to_uppercase();
    let name = COUNTRY_NAMES
        .get(fifa_code.as_str())
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| raw.trim().to_string());
    let iso = match FLAG_CODES.get(fifa_code.as_str()) {
        Some(code) => (*code).to_string(),
        None => fifa_code.chars().take(2).collect::<String>().to_lowercase(),
    };
    Nationality {
        fifa_code,
        name,
        iso,
    }
}

pub fn country_name(fifa_code: &str) -> Option<&'static str> {
    COUNTRY_NAMES.get(fifa_code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_codes() {
        let nat = resolve_nationality("eng");
        assert_eq!(nat.fifa_code, "ENG");
        assert_eq!(nat.name, "England");
        assert_eq!(nat.iso, "gb-eng");

        assert_eq!(resolve_nationality("BRA").iso, "br");
        assert_eq!(country_name("SCO"), Some("Scotland"));
    }

    #[test]
    fn unknown_code_falls_back_to_raw() {
        let nat = resolve_nationality("Xyz");
        assert_eq!(nat.fifa_code, "XYZ");
        assert_eq!(nat.name, "Xyz");
        assert_eq!(nat.iso, "xy");
    }
}
