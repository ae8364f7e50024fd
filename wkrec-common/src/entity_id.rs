//! Entity identifier utilities
//!
//! Structured-data items are addressed as `Q<digits>` in the upstream APIs and
//! stored as the bare integer in the ranking store. Both directions are pure
//! string transforms.

use crate::{Error, Result};

/// Prefix used by structured-data items
pub const ITEM_PREFIX: char = 'Q';

/// Prefix used by media-info entities (file captions)
pub const MEDIA_PREFIX: char = 'M';

/// Strip the item prefix and parse the numeric part
///
/// Accepts `Q123` or a bare `123`. Leading zeros are rejected so that the
/// transform stays lossless.
pub fn strip_prefix(id: &str) -> Result<i64> {
    let digits = id.strip_prefix(ITEM_PREFIX).unwrap_or(id);

    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return Err(Error::InvalidInput(format!("Malformed entity id: {:?}", id)));
    }

    digits
        .parse::<i64>()
        .map_err(|_| Error::InvalidInput(format!("Entity id out of range: {:?}", id)))
}

/// Render a numeric item id in its display form (`Q123`)
pub fn display_form(numeric: i64) -> String {
    format!("{}{}", ITEM_PREFIX, numeric)
}

/// Media-info entity id for a file page id (`M123`)
pub fn media_entity_id(page_id: u64) -> String {
    format!("{}{}", MEDIA_PREFIX, page_id)
}
