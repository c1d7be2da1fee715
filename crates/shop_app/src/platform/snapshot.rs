//! Item snapshot files: the JSON export of the item aggregator.
//!
//! ```json
//! { "items": [
//!     { "name": "Tabula Rasa",
//!       "price": { "kind": "buyout", "amount": "5", "currency": "chaos" },
//!       "location": { "tab": "Shop", "league": "Standard", "x": 0, "y": 3 } }
//! ] }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use shop_core::{Item, ItemLocation, ItemSnapshot, Price, PriceKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read item snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed item snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    items: Vec<ItemRecord>,
}

#[derive(Debug, Deserialize)]
struct ItemRecord {
    name: String,
    #[serde(default)]
    price: Option<PriceRecord>,
    #[serde(default)]
    location: Option<LocationRecord>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    kind: PriceKindRecord,
    amount: String,
    currency: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PriceKindRecord {
    #[serde(alias = "~b/o", alias = "b/o")]
    Buyout,
    #[serde(alias = "~price", alias = "price")]
    FixedPrice,
    #[serde(alias = "~c/o", alias = "c/o")]
    CurrentOffer,
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    tab: String,
    league: String,
    x: u32,
    y: u32,
}

pub fn load_snapshot(path: &Path) -> Result<ItemSnapshot, SnapshotError> {
    let content = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_snapshot(&content)
}

pub fn parse_snapshot(json: &str) -> Result<ItemSnapshot, SnapshotError> {
    let file: SnapshotFile = serde_json::from_str(json)?;
    Ok(file.items.into_iter().map(Item::from).collect::<Vec<_>>().into())
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Item {
            name: record.name,
            price: record
                .price
                .map(|price| Price::new(price.kind.into(), price.amount, price.currency)),
            location: record.location.map(|loc| ItemLocation {
                tab: loc.tab,
                league: loc.league,
                x: loc.x,
                y: loc.y,
            }),
            note: record.note.filter(|note| !note.trim().is_empty()),
        }
    }
}

impl From<PriceKindRecord> for PriceKind {
    fn from(kind: PriceKindRecord) -> Self {
        match kind {
            PriceKindRecord::Buyout => PriceKind::Buyout,
            PriceKindRecord::FixedPrice => PriceKind::FixedPrice,
            PriceKindRecord::CurrentOffer => PriceKind::CurrentOffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn items_keep_order_and_fields() {
        let snapshot = parse_snapshot(
            r#"{ "items": [
                { "name": "Kaom's Heart",
                  "price": { "kind": "~b/o", "amount": "2", "currency": "divine" },
                  "location": { "tab": "Shop", "league": "Standard", "x": 1, "y": 2 } },
                { "name": "Scroll of Wisdom" },
                { "name": "Goldrim",
                  "price": { "kind": "current_offer", "amount": "1", "currency": "chaos" },
                  "note": "  " }
            ] }"#,
        )
        .unwrap();

        let items: Vec<&Item> = snapshot.iter().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(
            *items[0],
            Item::new("Kaom's Heart")
                .with_price(Price::new(PriceKind::Buyout, "2", "divine"))
                .at(ItemLocation {
                    tab: "Shop".to_string(),
                    league: "Standard".to_string(),
                    x: 1,
                    y: 2,
                })
        );
        assert!(!items[1].is_listed());
        assert_eq!(items[2].price.as_ref().map(|p| p.kind), Some(PriceKind::CurrentOffer));
        assert_eq!(items[2].note, None);
        assert_eq!(snapshot.listed_count(), 2);
    }

    #[test]
    fn empty_object_is_an_empty_snapshot() {
        assert!(parse_snapshot("{}").unwrap().is_empty());
    }

    #[test]
    fn unknown_price_kind_is_rejected() {
        let err = parse_snapshot(
            r#"{ "items": [
                { "name": "x", "price": { "kind": "swap", "amount": "1", "currency": "c" } }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_snapshot(Path::new("/nonexistent/items.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/items.json"));
    }
}
