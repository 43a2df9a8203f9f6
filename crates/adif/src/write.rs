use logmerge_engine::{FieldValue, MergedRecord};

use crate::error::AdifError;
use crate::fixup::ZONE_FIELDS;

/// WSJT-X generated fields, written first and forming the minimal set.
pub const FIELD_ORDER: &[&str] = &[
    "CALL",
    "GRIDSQUARE",
    "MODE",
    "SUBMODE",
    "RST_SENT",
    "RST_RCVD",
    "QSO_DATE",
    "TIME_ON",
    "QSO_DATE_OFF",
    "TIME_OFF",
    "BAND",
    "FREQ",
    "STATION_CALLSIGN",
    "MY_GRIDSQUARE",
    "TX_PWR",
    "COMMENT",
    "NAME",
];

fn push_field(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!(
        "<{}:{}>{} ",
        name.to_lowercase(),
        value.chars().count(),
        value
    ));
}

fn render(name: &str, value: &FieldValue) -> String {
    if ZONE_FIELDS.contains(&name) {
        if let Some(n) = value.as_number() {
            return format!("{:02}", n as i64);
        }
    }
    value.render()
}

/// Write merged records as an ADIF 3.1.0 document. With `minimal`, only the
/// preferred field set is emitted; otherwise remaining fields follow in
/// alphabetical order.
pub fn write(qsos: &[MergedRecord], minimal: bool) -> String {
    let mut out = String::new();
    push_field(&mut out, "adif_ver", "3.1.0");
    push_field(
        &mut out,
        "created_timestamp",
        &chrono::Utc::now().format("%Y%m%d %H%M%S").to_string(),
    );
    push_field(&mut out, "programid", "logmerge");
    push_field(&mut out, "programversion", env!("CARGO_PKG_VERSION"));
    out.push_str("<eoh>\n");

    for qso in qsos {
        for name in FIELD_ORDER {
            if let Some(value) = qso.fields.get(*name) {
                push_field(&mut out, name, &render(name, value));
            }
        }
        if !minimal {
            // BTreeMap iteration gives the alphabetical tail for free.
            for (name, value) in &qso.fields {
                if !FIELD_ORDER.contains(&name.as_str()) {
                    push_field(&mut out, name, &render(name, value));
                }
            }
        }
        out.push_str("<eor>\n");
    }

    out
}

fn date_wsjt(native: &str) -> String {
    if native.len() == 8 {
        format!("{}-{}-{}", &native[0..4], &native[4..6], &native[6..8])
    } else {
        String::new()
    }
}

fn time_wsjt(native: &str) -> String {
    match native.len() {
        6 => format!("{}:{}:{}", &native[0..2], &native[2..4], &native[4..6]),
        4 => format!("{}:{}:00", &native[0..2], &native[2..4]),
        _ => String::new(),
    }
}

/// Write merged records as a WSJT-X compatible `.log` CSV.
pub fn write_wsjtx_csv(qsos: &[MergedRecord]) -> Result<String, AdifError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    let text = |qso: &MergedRecord, name: &str| -> String {
        qso.fields.get(name).map(FieldValue::render).unwrap_or_default()
    };

    for qso in qsos {
        let mode = {
            let submode = text(qso, "SUBMODE");
            if submode.is_empty() {
                text(qso, "MODE")
            } else {
                submode
            }
        };
        writer
            .write_record([
                date_wsjt(&text(qso, "QSO_DATE")),
                time_wsjt(&text(qso, "TIME_ON")),
                date_wsjt(&text(qso, "QSO_DATE_OFF")),
                time_wsjt(&text(qso, "TIME_OFF")),
                text(qso, "CALL"),
                text(qso, "GRIDSQUARE"),
                text(qso, "FREQ"),
                mode,
                text(qso, "RST_SENT"),
                text(qso, "RST_RCVD"),
                text(qso, "TX_PWR"),
                text(qso, "COMMENT"),
                text(qso, "NAME"),
            ])
            .map_err(|e| AdifError::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AdifError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AdifError::Csv(e.to_string()))
}
