//! Batch price adjustment applied to imported rows before upload.
//!
//! This is an operator tool, not a normalization step: applying a
//! non-identity transform twice compounds.

use crate::models::InventoryItem;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceTransform {
    pub multiplier: f64,
    /// Round to the nearest whole unit, then subtract one cent.
    pub round_to_99: bool,
}

impl Default for PriceTransform {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            round_to_99: false,
        }
    }
}

impl PriceTransform {
    /// A zero, NaN or infinite multiplier is replaced with `1.0`.
    pub fn new(multiplier: f64, round_to_99: bool) -> Self {
        let multiplier = if multiplier.is_finite() && multiplier != 0.0 {
            multiplier
        } else {
            1.0
        };
        Self {
            multiplier,
            round_to_99,
        }
    }

    /// Build from operator text input such as `"1.10"`. Text that does not
    /// parse is treated as `1.0`.
    pub fn from_input(multiplier: &str, round_to_99: bool) -> Self {
        Self::new(multiplier.trim().parse().unwrap_or(1.0), round_to_99)
    }

    pub fn is_identity(&self) -> bool {
        self.multiplier == 1.0 && !self.round_to_99
    }

    /// Transform a single price.
    pub fn apply_price(&self, price: f64) -> f64 {
        let scaled = price * self.multiplier;
        if self.round_to_99 {
            // Halves round up.
            ((scaled + 0.5).floor() - 0.01).max(0.0)
        } else {
            scaled
        }
    }

    /// Transform every item's current price, writing the result into
    /// `for_sale_price` and mirroring it into the legacy `price`. Items with
    /// no price at all pass through unchanged.
    pub fn apply(&self, items: &[InventoryItem]) -> Vec<InventoryItem> {
        items
            .iter()
            .map(|item| {
                let mut next = item.clone();
                if let Some(current) = item.current_price() {
                    let p = self.apply_price(current);
                    next.for_sale_price = Some(p);
                    next.price = Some(p);
                }
                next
            })
            .collect()
    }
}

/// Convenience wrapper over [`PriceTransform::apply`].
pub fn apply_transforms(
    items: &[InventoryItem],
    multiplier: f64,
    round_to_99: bool,
) -> Vec<InventoryItem> {
    PriceTransform::new(multiplier, round_to_99).apply(items)
}
