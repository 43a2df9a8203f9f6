use std::collections::BTreeMap;

use logmerge_engine::FieldValue;

// ADIF 3.1.0 field properties: Integer / PositiveInteger fields.
const INTEGER_FIELDS: &[&str] = &[
    "K_INDEX",
    "NR_BURSTS",
    "NR_PINGS",
    "SFI",
    "SRX",
    "STX",
    "CQZ",
    "FISTS",
    "FISTS_CC",
    "IOTA_ISLAND_ID",
    "ITUZ",
    "MY_CQ_ZONE",
    "MY_FISTS",
    "MY_IOTA_ISLAND_ID",
    "MY_ITU_ZONE",
    "TEN_TEN",
    "UKMSG",
];

// ADIF "Number" fields.
const NUMBER_FIELDS: &[&str] = &[
    "AGE", "A_INDEX", "ANT_AZ", "ANT_EL", "DISTANCE", "FREQ", "FREQ_RX", "MAX_BURSTS", "RX_PWR",
    "TX_PWR",
];

/// Zone fields are written zero-padded to two digits.
pub const ZONE_FIELDS: &[&str] = &["MY_CQ_ZONE", "CQZ", "MY_ITU_ZONE", "ITUZ"];

/// Pre-process one raw record and fix common logger mistakes, coercing
/// typed fields along the way.
pub fn fixup(raw: BTreeMap<String, String>) -> BTreeMap<String, FieldValue> {
    let mut fields: BTreeMap<String, String> = raw
        .into_iter()
        .map(|(k, v)| (k, v.trim().to_string()))
        .collect();

    // WSJT-X era misreporting of FT4: it is a submode of MFSK.
    if fields.get("MODE").map(String::as_str) == Some("FT4") {
        fields.insert("MODE".into(), "MFSK".into());
        fields.insert("SUBMODE".into(), "FT4".into());
    }

    // Power fields should be bare numbers: strip a trailing W, drop NaN.
    for name in ["TX_PWR", "RX_PWR"] {
        if let Some(value) = fields.get(name) {
            if value == "NaN" {
                fields.remove(name);
            } else if let Some(stripped) = strip_watts(value) {
                fields.insert(name.into(), stripped);
            }
        }
    }

    // Band is always uppercase.
    for name in ["BAND", "BAND_RX"] {
        if let Some(value) = fields.get(name) {
            fields.insert(name.into(), value.to_uppercase());
        }
    }

    // Some log sources replace / with _ in calls; restore it.
    for name in ["CALL", "MYCALL"] {
        if let Some(value) = fields.get(name) {
            fields.insert(name.into(), value.replace('_', "/").to_uppercase());
        }
    }

    // Gridsquares read best as AA00xx: first four upper, rest lower.
    for name in ["GRIDSQUARE", "MY_GRIDSQUARE"] {
        if let Some(value) = fields.get(name) {
            fields.insert(name.into(), caseify_grid(value));
        }
    }

    // Null-island style LAT/LON entries carry no information.
    for name in ["LAT", "LON"] {
        if let Some(value) = fields.get(name) {
            if value.get(1..) == Some("000 00.000") {
                fields.remove(name);
            }
        }
    }

    // Coerce typed fields; anything unparseable stays text.
    fields
        .into_iter()
        .map(|(name, value)| {
            let coerced = coerce(&name, &value);
            (name, coerced)
        })
        .collect()
}

fn coerce(name: &str, value: &str) -> FieldValue {
    if INTEGER_FIELDS.contains(&name) {
        if let Ok(n) = value.parse::<i64>() {
            return FieldValue::Integer(n);
        }
    }
    if NUMBER_FIELDS.contains(&name) {
        if let Ok(n) = value.parse::<f64>() {
            // Frequencies to 3 digits; other whole numbers stay integral.
            if name == "FREQ" || name == "FREQ_RX" {
                return FieldValue::Number((n * 1000.0).round() / 1000.0);
            }
            if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                return FieldValue::Integer(n as i64);
            }
            return FieldValue::Number(n);
        }
    }
    FieldValue::Text(value.to_string())
}

/// "25W" / "25.5w" -> numeric part; None when not of that shape.
fn strip_watts(value: &str) -> Option<String> {
    let stripped = value.strip_suffix(['W', 'w'])?;
    let number = stripped.trim_end();
    if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        Some(number.to_string())
    } else {
        None
    }
}

fn caseify_grid(value: &str) -> String {
    let head: String = value.chars().take(4).collect::<String>().to_uppercase();
    let tail: String = value.chars().skip(4).collect::<String>().to_lowercase();
    format!("{head}{tail}")
}
