//! Header block parsing (`name: value;` lines).

use winnow::prelude::*;
use winnow::token::{rest, take_till};

use crate::score::{Header, OfficePart};

type PResult<T> = winnow::ModalResult<T>;

/// Parse one `key: value;` line. The value keeps any inner colons.
fn field(input: &mut &str) -> PResult<(String, String)> {
    let key = take_till(1.., ':').parse_next(input)?;
    ':'.parse_next(input)?;
    let value = rest.parse_next(input)?;
    Ok((
        key.trim().to_string(),
        value.replace([';', '\r'], "").trim().to_string(),
    ))
}

/// Parse the header section. Lines without a colon are ignored.
pub fn parse_header(section: &str) -> Header {
    let fields: Vec<(String, String)> = section
        .lines()
        .filter_map(|line| {
            let mut input = line;
            field.parse_next(&mut input).ok()
        })
        .filter(|(key, _)| !key.is_empty())
        .collect();

    let office_part = fields
        .iter()
        .find(|(k, _)| k == "office-part")
        .map_or(OfficePart::Varia, |(_, v)| OfficePart::normalize(v));

    Header {
        fields,
        office_part,
    }
}
