use std::collections::BTreeMap;

use crate::error::AdifError;

/// Decode raw ADIF file bytes. LoTW exports are sometimes ISO-8859-1
/// rather than UTF-8, so fall back to a Latin-1 decode when UTF-8 fails.
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse an ADIF document into one raw field map per record.
///
/// Fields are `<name:length[:type]>data`; names fold to uppercase and the
/// optional type indicator is ignored. When the document carries a header,
/// everything before `<eoh>` is skipped. Records end at `<eor>`; trailing
/// fields with no `<eor>` are dropped, matching common writer behavior.
pub fn parse(text: &str) -> Result<Vec<BTreeMap<String, String>>, AdifError> {
    // Only documents containing <eoh> have a header to skip.
    let mut in_header = text.to_lowercase().contains("<eoh>");

    let mut records = Vec::new();
    let mut current: BTreeMap<String, String> = BTreeMap::new();
    let mut rest = text;

    loop {
        let Some(open) = rest.find('<') else { break };
        rest = &rest[open + 1..];
        let Some(close) = rest.find('>') else {
            return Err(AdifError::Tag("unterminated tag".into()));
        };
        let tag = &rest[..close];
        rest = &rest[close + 1..];

        let mut parts = tag.splitn(3, ':');
        let name = parts.next().unwrap_or("").trim().to_ascii_uppercase();

        match name.as_str() {
            "EOH" => {
                in_header = false;
                continue;
            }
            "EOR" => {
                if !in_header && !current.is_empty() {
                    records.push(std::mem::take(&mut current));
                }
                continue;
            }
            _ => {}
        }

        // Tags without a length (e.g. <adif_ver> written bare) carry no data.
        let Some(len_str) = parts.next() else { continue };
        let len: usize = len_str
            .trim()
            .parse()
            .map_err(|_| AdifError::Tag(format!("bad length in <{tag}>")))?;

        // Length counts characters; records may contain non-ASCII text.
        let end = match rest.char_indices().nth(len) {
            Some((i, _)) => i,
            None => {
                if rest.chars().count() < len {
                    return Err(AdifError::Truncated { field: name });
                }
                rest.len()
            }
        };
        let value = &rest[..end];
        rest = &rest[end..];

        if !in_header && !name.is_empty() {
            current.insert(name, value.to_string());
        }
    }

    Ok(records)
}
