#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceKind {
    Buyout,
    FixedPrice,
    CurrentOffer,
}

impl PriceKind {
    /// Forum price tag recognised by trade indexers.
    pub fn tag(self) -> &'static str {
        match self {
            PriceKind::Buyout => "~b/o",
            PriceKind::FixedPrice => "~price",
            PriceKind::CurrentOffer => "~c/o",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub kind: PriceKind,
    pub amount: String,
    pub currency: String,
}

impl Price {
    pub fn new(kind: PriceKind, amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            kind,
            amount: amount.into(),
            currency: currency.into(),
        }
    }

    /// Price tag as posted. Surrounding whitespace in amount and currency is
    /// not part of the price, so an edit that only changes it renders the same.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.kind.tag(), self.amount.trim(), self.currency.trim())
    }
}

/// Where the item sits in the stash, used to build a linked item tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLocation {
    pub tab: String,
    pub league: String,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub price: Option<Price>,
    pub location: Option<ItemLocation>,
    pub note: Option<String>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: None,
            location: None,
            note: None,
        }
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn at(mut self, location: ItemLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_listed(&self) -> bool {
        self.price.is_some()
    }
}

/// Ordered item list handed over by the item-aggregation stage. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemSnapshot {
    items: Vec<Item>,
}

impl ItemSnapshot {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn listed_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_listed()).count()
    }
}

impl From<Vec<Item>> for ItemSnapshot {
    fn from(items: Vec<Item>) -> Self {
        Self::new(items)
    }
}
