//! Opaque pagination cursors
//!
//! A cursor records the sort position of the last item on a page. The next
//! page resumes strictly after that position, so items inserted between
//! requests never shift items that were already on either side of it.

use super::filter::{SortDirection, SortKey};
use crate::app::models::Item;
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Total order position of an item under a sort key
///
/// `primary` is `None` for id ordering and `(seconds, nanos)` since the
/// Unix epoch for datetime ordering, which orders correctly for every
/// representable year. Items without a time carry `None` and sort before
/// timed items.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SortPosition {
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<(i64, u32)>,
    #[serde(rename = "i")]
    pub item_id: String,
    #[serde(rename = "c")]
    pub collection_id: String,
}

impl SortPosition {
    pub fn of(item: &Item, sort: SortKey) -> Self {
        let primary = match (sort, &item.time) {
            (SortKey::Datetime, Some(time)) => {
                let start = time.start();
                Some((start.timestamp(), start.timestamp_subsec_nanos()))
            }
            _ => None,
        };

        Self {
            primary,
            item_id: item.id().to_string(),
            collection_id: item.collection().unwrap_or_default().to_string(),
        }
    }

    /// Ordering in traversal direction
    pub fn cmp_directed(&self, other: &Self, direction: SortDirection) -> Ordering {
        match direction {
            SortDirection::Asc => self.cmp(other),
            SortDirection::Desc => other.cmp(self),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorToken {
    #[serde(rename = "s")]
    sort: SortKey,
    #[serde(rename = "d")]
    direction: SortDirection,
    #[serde(flatten)]
    position: SortPosition,
}

/// Encode the position of the last returned item as a URL-safe token
pub fn encode(
    sort: SortKey,
    direction: SortDirection,
    position: &SortPosition,
) -> Result<String> {
    let token = CursorToken {
        sort,
        direction,
        position: position.clone(),
    };
    let json = serde_json::to_vec(&token)
        .map_err(|e| Error::serialization("Failed to encode pagination cursor", e))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token, rejecting malformed input and tokens from another ordering
pub fn decode(cursor: &str, sort: SortKey, direction: SortDirection) -> Result<SortPosition> {
    let invalid = || Error::validation(format!("Invalid pagination cursor '{}'", cursor));

    let bytes = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| invalid())?;
    let token: CursorToken = serde_json::from_slice(&bytes).map_err(|_| invalid())?;

    if token.sort != sort || token.direction != direction {
        return Err(Error::validation(format!(
            "Cursor was issued for sort '{} {}', not '{} {}'",
            token.sort, token.direction, sort, direction
        )));
    }

    Ok(token.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(primary: Option<(i64, u32)>, item: &str, collection: &str) -> SortPosition {
        SortPosition {
            primary,
            item_id: item.to_string(),
            collection_id: collection.to_string(),
        }
    }

    #[test]
    fn test_cursor_decodes_what_it_encodes() {
        let p = position(None, "scene-7", "sat-2024");
        let token = encode(SortKey::Id, SortDirection::Asc, &p).unwrap();
        assert!(!token.contains('='));
        assert_eq!(decode(&token, SortKey::Id, SortDirection::Asc).unwrap(), p);

        let timed = position(Some((-62_000_000_000, 500)), "old", "c");
        let token = encode(SortKey::Datetime, SortDirection::Desc, &timed).unwrap();
        assert_eq!(
            decode(&token, SortKey::Datetime, SortDirection::Desc).unwrap(),
            timed
        );
    }

    #[test]
    fn test_cursor_from_other_ordering_rejected() {
        let token = encode(SortKey::Id, SortDirection::Asc, &position(None, "a", "c")).unwrap();
        assert!(
            decode(&token, SortKey::Datetime, SortDirection::Asc)
                .unwrap_err()
                .is_validation()
        );
        assert!(
            decode(&token, SortKey::Id, SortDirection::Desc)
                .unwrap_err()
                .is_validation()
        );
    }

    #[test]
    fn test_garbage_cursor_rejected() {
        assert!(decode("not a cursor!", SortKey::Id, SortDirection::Asc).is_err());
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(decode(&not_json, SortKey::Id, SortDirection::Asc).is_err());
    }

    #[test]
    fn test_positions_order_by_primary_then_ids() {
        let early = position(Some((1_704_067_200, 0)), "z", "c");
        let late = position(Some((1_717_200_000, 0)), "a", "c");
        assert!(early < late);
        assert_eq!(early.cmp_directed(&late, SortDirection::Desc), Ordering::Greater);

        let untimed = position(None, "zz", "c");
        assert!(untimed < early);

        let same_id_a = position(None, "x", "a");
        let same_id_b = position(None, "x", "b");
        assert!(same_id_a < same_id_b);
    }

    #[test]
    fn test_datetime_positions_order_across_year_widths() {
        use crate::app::models::{ItemSpec, ItemTime};
        use chrono::{TimeZone, Utc};

        let at = |id: &str, year: i32| {
            let time = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
            let item = Item::from_spec(ItemSpec::new(id).with_time(ItemTime::Instant(time)))
                .unwrap();
            SortPosition::of(&item, SortKey::Datetime)
        };

        let ancient = at("ancient", -2);
        let bc = at("bc", -1);
        let now = at("now", 2024);
        let far = at("far", 10000);
        assert!(ancient < bc);
        assert!(bc < now);
        assert!(now < far);
    }
}
