use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::InventoryError;
use crate::types::{MonthlySeries, Percent, Units, Weeks};

// ---------------------------------------------------------------------------
// Account keys and categories
// ---------------------------------------------------------------------------

/// Category group an account rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Clothing,
    Accessory,
}

impl Category {
    /// Canonical display order of the two groups.
    pub const ALL: [Category; 2] = [Category::Clothing, Category::Accessory];

    /// Leaf accounts belonging to this group, in table order.
    pub fn accounts(self) -> &'static [AccountKey] {
        match self {
            Category::Clothing => &AccountKey::CLOTHING,
            Category::Accessory => &AccountKey::ACCESSORY,
        }
    }
}

/// One leaf inventory account: a clothing season or an accessory category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKey {
    /// Current-year fall season
    CurrentFall,
    /// Current-year spring season
    CurrentSpring,
    /// One year past its season
    Year1Carryover,
    /// Two years past its season
    Year2Carryover,
    /// Pre-loaded stock for the upcoming season
    NextSeason,
    /// Older than two years
    OffSeason,
    Shoes,
    Hats,
    Bags,
    Other,
}

impl AccountKey {
    pub const CLOTHING: [AccountKey; 6] = [
        AccountKey::CurrentFall,
        AccountKey::CurrentSpring,
        AccountKey::Year1Carryover,
        AccountKey::Year2Carryover,
        AccountKey::NextSeason,
        AccountKey::OffSeason,
    ];

    pub const ACCESSORY: [AccountKey; 4] = [
        AccountKey::Shoes,
        AccountKey::Hats,
        AccountKey::Bags,
        AccountKey::Other,
    ];

    /// Every leaf account, clothing first, in table order.
    pub const ALL: [AccountKey; 10] = [
        AccountKey::CurrentFall,
        AccountKey::CurrentSpring,
        AccountKey::Year1Carryover,
        AccountKey::Year2Carryover,
        AccountKey::NextSeason,
        AccountKey::OffSeason,
        AccountKey::Shoes,
        AccountKey::Hats,
        AccountKey::Bags,
        AccountKey::Other,
    ];

    pub fn category(self) -> Category {
        match self {
            AccountKey::CurrentFall
            | AccountKey::CurrentSpring
            | AccountKey::Year1Carryover
            | AccountKey::Year2Carryover
            | AccountKey::NextSeason
            | AccountKey::OffSeason => Category::Clothing,
            AccountKey::Shoes | AccountKey::Hats | AccountKey::Bags | AccountKey::Other => {
                Category::Accessory
            }
        }
    }

    pub fn is_clothing(self) -> bool {
        self.category() == Category::Clothing
    }

    /// Stable identifier used on the wire and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            AccountKey::CurrentFall => "current-fall",
            AccountKey::CurrentSpring => "current-spring",
            AccountKey::Year1Carryover => "year1-carryover",
            AccountKey::Year2Carryover => "year2-carryover",
            AccountKey::NextSeason => "next-season",
            AccountKey::OffSeason => "off-season",
            AccountKey::Shoes => "shoes",
            AccountKey::Hats => "hats",
            AccountKey::Bags => "bags",
            AccountKey::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountKey::CurrentFall => "Current F",
            AccountKey::CurrentSpring => "Current S",
            AccountKey::Year1Carryover => "1st Year",
            AccountKey::Year2Carryover => "2nd Year",
            AccountKey::NextSeason => "Next Season",
            AccountKey::OffSeason => "Off Season",
            AccountKey::Shoes => "Shoes",
            AccountKey::Hats => "Hats",
            AccountKey::Bags => "Bags",
            AccountKey::Other => "Other",
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for AccountKey {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountKey::ALL
            .iter()
            .copied()
            .find(|k| k.slug() == s)
            .ok_or_else(|| InventoryError::InvalidInput {
                field: "key".into(),
                reason: format!("Unknown account key '{s}'"),
            })
    }
}

// ---------------------------------------------------------------------------
// Row keys
// ---------------------------------------------------------------------------

/// Which supply figure sell-through is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellThroughBasis {
    /// Purchased units only (total and accessory rows)
    SellIn,
    /// Brought-forward stock plus purchases (clothing rows)
    OpeningPlusSellIn,
}

impl SellThroughBasis {
    pub fn denominator(self, opening: Units, sell_in_total: Units) -> Units {
        match self {
            SellThroughBasis::SellIn => sell_in_total,
            SellThroughBasis::OpeningPlusSellIn => opening.saturating_add(sell_in_total),
        }
    }
}

/// Identifier of any row in a table: a leaf account, a category subtotal or the grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RowKey {
    Leaf(AccountKey),
    Subtotal(Category),
    Total,
}

impl RowKey {
    pub fn label(self) -> &'static str {
        match self {
            RowKey::Leaf(k) => k.label(),
            RowKey::Subtotal(Category::Clothing) => "Clothing Total",
            RowKey::Subtotal(Category::Accessory) => "ACC Total",
            RowKey::Total => "Inventory Total",
        }
    }

    pub fn account(self) -> Option<AccountKey> {
        match self {
            RowKey::Leaf(k) => Some(k),
            _ => None,
        }
    }

    /// Clothing rows carry more brought-forward stock, so their sell-through
    /// includes opening inventory in the denominator.
    pub fn sell_through_basis(self) -> SellThroughBasis {
        match self {
            RowKey::Total => SellThroughBasis::SellIn,
            RowKey::Subtotal(Category::Clothing) => SellThroughBasis::OpeningPlusSellIn,
            RowKey::Subtotal(Category::Accessory) => SellThroughBasis::SellIn,
            RowKey::Leaf(k) => match k.category() {
                Category::Clothing => SellThroughBasis::OpeningPlusSellIn,
                Category::Accessory => SellThroughBasis::SellIn,
            },
        }
    }
}

impl From<AccountKey> for RowKey {
    fn from(k: AccountKey) -> Self {
        RowKey::Leaf(k)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Leaf(k) => f.write_str(k.slug()),
            RowKey::Subtotal(Category::Clothing) => f.write_str("clothing-total"),
            RowKey::Subtotal(Category::Accessory) => f.write_str("accessory-total"),
            RowKey::Total => f.write_str("total"),
        }
    }
}

impl FromStr for RowKey {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(RowKey::Total),
            "clothing-total" => Ok(RowKey::Subtotal(Category::Clothing)),
            "accessory-total" => Ok(RowKey::Subtotal(Category::Accessory)),
            other => other.parse().map(RowKey::Leaf),
        }
    }
}

impl From<RowKey> for String {
    fn from(k: RowKey) -> Self {
        k.to_string()
    }
}

impl TryFrom<String> for RowKey {
    type Error = InventoryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Rows and tables
// ---------------------------------------------------------------------------

/// Raw inputs for one leaf account over one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub key: AccountKey,
    /// Stock brought forward from the prior year's close
    pub opening: Units,
    /// Inbound stock per month (dealer: shipment from HQ, HQ: purchases)
    pub sell_in: MonthlySeries,
    /// Outbound stock per month (dealer: POS sales, HQ: shipment to dealer)
    pub sell_out: MonthlySeries,
    pub closing: Units,
    /// Demand series used for the WOI weekly rate; falls back to `sell_out`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woi_sell_out: Option<MonthlySeries>,
}

impl RawRow {
    pub fn woi_basis(&self) -> MonthlySeries {
        self.woi_sell_out.unwrap_or(self.sell_out)
    }
}

/// A fully derived table row. Serialized with `label` and the
/// `is_leaf`/`is_subtotal`/`is_total` flags for the presentation layer;
/// those are derived from `key` and ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComputedRow {
    pub key: RowKey,
    pub opening: Units,
    pub sell_in: MonthlySeries,
    pub sell_in_total: Units,
    pub sell_out: MonthlySeries,
    pub sell_out_total: Units,
    pub closing: Units,
    /// closing - opening
    pub delta: Units,
    pub sell_through: Percent,
    pub woi: Weeks,
    pub woi_sell_out: MonthlySeries,
}

impl ComputedRow {
    pub fn label(&self) -> &'static str {
        self.key.label()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.key, RowKey::Leaf(_))
    }

    pub fn is_subtotal(&self) -> bool {
        matches!(self.key, RowKey::Subtotal(_))
    }

    pub fn is_total(&self) -> bool {
        self.key == RowKey::Total
    }
}

impl Serialize for ComputedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ComputedRow", 15)?;
        s.serialize_field("key", &self.key)?;
        s.serialize_field("label", self.label())?;
        s.serialize_field("is_total", &self.is_total())?;
        s.serialize_field("is_subtotal", &self.is_subtotal())?;
        s.serialize_field("is_leaf", &self.is_leaf())?;
        s.serialize_field("opening", &self.opening)?;
        s.serialize_field("sell_in", &self.sell_in)?;
        s.serialize_field("sell_in_total", &self.sell_in_total)?;
        s.serialize_field("sell_out", &self.sell_out)?;
        s.serialize_field("sell_out_total", &self.sell_out_total)?;
        s.serialize_field("closing", &self.closing)?;
        s.serialize_field("delta", &self.delta)?;
        s.serialize_field("sell_through", &self.sell_through)?;
        s.serialize_field("woi", &self.woi)?;
        s.serialize_field("woi_sell_out", &self.woi_sell_out)?;
        s.end()
    }
}

/// Ordered rows: total, clothing subtotal, clothing leaves, accessory subtotal, accessory leaves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<ComputedRow>,
}

impl Table {
    pub fn row(&self, key: RowKey) -> Option<&ComputedRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn leaf(&self, key: AccountKey) -> Option<&ComputedRow> {
        self.row(RowKey::Leaf(key))
    }

    pub fn total(&self) -> Option<&ComputedRow> {
        self.row(RowKey::Total)
    }

    pub fn subtotal(&self, category: Category) -> Option<&ComputedRow> {
        self.row(RowKey::Subtotal(category))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &ComputedRow> {
        self.rows.iter().filter(|r| r.is_leaf())
    }
}

/// The two parallel ledgers of one period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodTables {
    pub dealer: Table,
    pub hq: Table,
}

/// Raw inputs for both tiers of one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRaw {
    pub year: i32,
    pub dealer: Vec<RawRow>,
    pub hq: Vec<RawRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_category_membership_is_partitioned() {
        for k in AccountKey::CLOTHING {
            assert_eq!(k.category(), Category::Clothing);
        }
        for k in AccountKey::ACCESSORY {
            assert_eq!(k.category(), Category::Accessory);
        }
        assert_eq!(
            AccountKey::CLOTHING.len() + AccountKey::ACCESSORY.len(),
            AccountKey::ALL.len()
        );
    }

    #[test]
    fn test_sell_through_basis_by_row() {
        assert_eq!(
            RowKey::Leaf(AccountKey::CurrentFall).sell_through_basis(),
            SellThroughBasis::OpeningPlusSellIn
        );
        assert_eq!(
            RowKey::Subtotal(Category::Clothing).sell_through_basis(),
            SellThroughBasis::OpeningPlusSellIn
        );
        assert_eq!(
            RowKey::Leaf(AccountKey::Bags).sell_through_basis(),
            SellThroughBasis::SellIn
        );
        assert_eq!(
            RowKey::Subtotal(Category::Accessory).sell_through_basis(),
            SellThroughBasis::SellIn
        );
        assert_eq!(RowKey::Total.sell_through_basis(), SellThroughBasis::SellIn);
    }

    #[test]
    fn test_row_key_string_roundtrip() {
        let keys = AccountKey::ALL
            .iter()
            .map(|k| RowKey::Leaf(*k))
            .chain([
                RowKey::Total,
                RowKey::Subtotal(Category::Clothing),
                RowKey::Subtotal(Category::Accessory),
            ]);
        for key in keys {
            let parsed: RowKey = key.to_string().parse().unwrap();
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = "scarves".parse::<AccountKey>().unwrap_err();
        assert!(matches!(err, InventoryError::InvalidInput { .. }));
    }

    #[test]
    fn test_account_key_serde_matches_slug() {
        for k in AccountKey::ALL {
            let json = serde_json::to_string(&k).unwrap();
            assert_eq!(json, format!("\"{}\"", k.slug()));
        }
    }

    #[test]
    fn test_woi_basis_defaults_to_sell_out() {
        let mut raw = RawRow {
            key: AccountKey::Hats,
            opening: Decimal::ZERO,
            sell_in: [Decimal::ONE; 12],
            sell_out: [Decimal::TWO; 12],
            closing: Decimal::ZERO,
            woi_sell_out: None,
        };
        assert_eq!(raw.woi_basis(), [Decimal::TWO; 12]);
        raw.woi_sell_out = Some([Decimal::TEN; 12]);
        assert_eq!(raw.woi_basis(), [Decimal::TEN; 12]);
    }
}
