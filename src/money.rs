use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Symbol assumed when a non-zero amount carries no recognisable currency.
pub const DEFAULT_SYMBOL: &str = "$";

// Symbols and short codes seen in exports across every supported game language.
// Bare K/M/k/m are deliberately absent: they are magnitude suffixes.
const CURRENCY_SYMBOLS: &[&str] = &[
    "£", "$", "€", "¥", "₹", "₽", "₺", "₩", "₪", "₫", "₱", "₦", "₴", "₸", "₼", "₾", "₿", "฿",
    "₡", "₲", "₵", "₭", "₮", "₨", "₳", "₥", "₧", "₯", "₠", "₢", "₣", "₤", "¢", "﷼", "៛",
    "R$", "A$", "AU$", "C$", "CA$", "NZ$", "HK$", "S$", "SG$", "US$", "Mex$", "MX$", "NT$",
    "RD$", "TT$", "J$", "BZ$", "B$", "Bds$", "EC$", "FJ$", "SI$", "WS$", "T$", "G$", "L$",
    "N$", "Z$", "CUC$", "$U", "$b", "COL$", "CLP$", "ARS$", "AR$", "CL$", "CO$", "UY$", "E£",
    "LE", "L.E.", "LL", "S£", "SS£", "FK£", "GI£", "CHF", "Fr.", "SFr.", "fr.", "Fr", "FCFA",
    "CFA", "CFPF", "kr.", "kr", "Kr", "zł", "Kč", "Ft", "lei", "Lei", "лв", "лв.", "ден",
    "дин.", "din.", "RSD", "KM", "Br", "руб", "руб.", "грн", "сом", "сўм", "ман.", "TL",
    "RM", "Rp", "Rs", "Rs.", "₨.", "Tk", "৳", "රු", "रू", "Nu.", "Rf", "MVR", "K.D.", "KD",
    "د.ك", "د.إ", "ر.س", "ر.ق", "د.ب", "ر.ع.", "د.ا", "د.ج", "د.م.", "د.ت", "ل.د", "ج.م",
    "ل.ل", "ع.د", "DH", "Dh", "MAD", "TND", "DA", "DZD", "TSh", "KSh", "USh", "RF", "FBu",
    "Le", "GH₵", "GHS", "D", "Birr", "Nfk", "Kz", "MT", "MTn", "ZK", "P", "E", "Ar", "MK",
    "UM", "Db", "Esc", "Bs.", "Bs", "Bs.S", "S/.", "S/", "Gs", "Q", "L", "C", "B/.", "R",
    "ƒ", "Afl.", "NAf.", "Af", "؋", "TMT", "ЅМ", "soʻm", "Ks", "NZD", "AUD", "CAD",
];

static SYMBOLS_LONGEST_FIRST: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut symbols = CURRENCY_SYMBOLS.to_vec();
    symbols.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    symbols.dedup();
    symbols
});

const WAGE_PERIODS: &[(&str, WagePeriod)] = &[
    ("p/w", WagePeriod::Weekly),
    ("p/m", WagePeriod::Monthly),
    ("p/a", WagePeriod::Annual),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagePeriod {
    Weekly,
    Monthly,
    Annual,
}

/// A parsed monetary cell. `display` is the cell text as it appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyValue {
    pub display: String,
    pub amount: i64,
    pub symbol: String,
    pub period: Option<WagePeriod>,
}

/// Parses a transfer value or wage cell such as `£10M - £15M` or `€45K p/w`.
///
/// Ranges resolve to their upper bound, `K`/`M` suffixes scale the number,
/// and anything unparseable yields an amount of zero.
pub fn parse_money(raw: &str) -> MoneyValue {
    let display = raw.trim().to_string();
    let symbol = detect_symbol(&display);

    let mut period = None;
    let mut cleaned = display.clone();
    for (suffix, kind) in WAGE_PERIODS {
        if let Some(pos) = cleaned.to_ascii_lowercase().rfind(suffix) {
            cleaned.replace_range(pos..pos + suffix.len(), "");
            period = Some(*kind);
            break;
        }
    }

    for sym in SYMBOLS_LONGEST_FIRST.iter() {
        if cleaned.contains(sym) {
            cleaned = cleaned.replace(sym, "");
        }
    }

    let upper = cleaned.rsplit('-').next().unwrap_or("");
    let amount = parse_scaled_amount(upper).unwrap_or(0);

    let symbol = match symbol {
        Some(sym) => sym.to_string(),
        None if amount != 0 => DEFAULT_SYMBOL.to_string(),
        None => String::new(),
    };

    MoneyValue {
        display,
        amount,
        symbol,
        period,
    }
}

/// Returns the longest catalog symbol written next to the amount in `raw`.
///
/// A symbol counts only when a digit follows or precedes it (spaces allowed)
/// and it is not part of a longer word, so `Loan` or `Free` carry no symbol.
pub fn detect_symbol(raw: &str) -> Option<&'static str> {
    if !raw.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    SYMBOLS_LONGEST_FIRST.iter().copied().find(|sym| {
        raw.match_indices(sym)
            .any(|(start, _)| touches_amount(raw, start, start + sym.len()))
    })
}

fn touches_amount(raw: &str, start: usize, end: usize) -> bool {
    let before = &raw[..start];
    let after = &raw[end..];

    let mut prev = before.chars().rev();
    let word_before = match prev.next() {
        // `5M Kč` style: a magnitude suffix straight after the number is fine.
        Some('K' | 'k' | 'M' | 'm') => !prev.next().is_some_and(|c| c.is_ascii_digit()),
        Some(c) => c.is_alphabetic(),
        None => false,
    };
    let word_after = after.chars().next().is_some_and(char::is_alphabetic);
    if word_before || word_after {
        return false;
    }

    let digit_after = after
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit());
    let mut back = before.trim_end().chars().rev();
    let digit_before = match back.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('K' | 'k' | 'M' | 'm') => back.next().is_some_and(|d| d.is_ascii_digit()),
        _ => false,
    };
    digit_after || digit_before
}

fn parse_scaled_amount(raw: &str) -> Option<i64> {
    let compact = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect::<String>();
    if compact.is_empty() {
        return None;
    }

    let (number, multiplier) = match compact.chars().last() {
        Some('M' | 'm') => (&compact[..compact.len() - 1], 1_000_000.0),
        Some('K' | 'k') => (&compact[..compact.len() - 1], 1_000.0),
        _ => (compact.as_str(), 1.0),
    };
    let value = number.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value * multiplier).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_takes_upper_bound() {
        let value = parse_money("£10M - £15M");
        assert_eq!(value.amount, 15_000_000);
        assert_eq!(value.symbol, "£");
        assert_eq!(value.display, "£10M - £15M");
    }

    #[test]
    fn suffixes_are_case_insensitive() {
        assert_eq!(parse_money("€450k").amount, 450_000);
        assert_eq!(parse_money("€1.5M").amount, 1_500_000);
        assert_eq!(parse_money("$2,500").amount, 2_500);
    }

    #[test]
    fn longest_symbol_wins() {
        let value = parse_money("R$3.2M");
        assert_eq!(value.symbol, "R$");
        assert_eq!(value.amount, 3_200_000);
    }

    #[test]
    fn wage_period_is_stripped() {
        let value = parse_money("£45K p/w");
        assert_eq!(value.amount, 45_000);
        assert_eq!(value.period, Some(WagePeriod::Weekly));
    }

    #[test]
    fn bare_number_defaults_symbol() {
        let value = parse_money("12000");
        assert_eq!(value.amount, 12_000);
        assert_eq!(value.symbol, DEFAULT_SYMBOL);
    }

    #[test]
    fn unparseable_is_zero() {
        let value = parse_money("Not for Sale");
        assert_eq!(value.amount, 0);
        assert!(value.symbol.is_empty());
        assert_eq!(parse_money("-").amount, 0);
    }

    #[test]
    fn status_words_carry_no_symbol() {
        for raw in ["Loan", "Free", "Released", "Expired", "Not for Sale"] {
            let value = parse_money(raw);
            assert_eq!(value.amount, 0, "{raw}");
            assert!(value.symbol.is_empty(), "{raw} gave {:?}", value.symbol);
        }
        assert_eq!(detect_symbol("Loan"), None);
        assert_eq!(detect_symbol("Free Transfer 2025"), None);
    }

    #[test]
    fn symbol_must_sit_next_to_the_amount() {
        assert_eq!(detect_symbol("R$ 2.5M"), Some("R$"));
        assert_eq!(detect_symbol("100 kr"), Some("kr"));
        assert_eq!(detect_symbol("5M Kč"), Some("Kč"));
        assert_eq!(detect_symbol("Rp1.2M"), Some("Rp"));
        assert_eq!(detect_symbol("Loan 5M"), None);

        let value = parse_money("CHF 450K p/w");
        assert_eq!(value.symbol, "CHF");
        assert_eq!(value.amount, 450_000);
    }
}
