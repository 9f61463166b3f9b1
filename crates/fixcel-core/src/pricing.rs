//! # Pricing Module
//!
//! The pure pricing phase of a sale: totals, historical snapshots, and the
//! flattened stock reservation plan.
//!
//! ## Where This Sits In A Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   register_sale control flow                        │
//! │                                                                     │
//! │  validate request ──► resolve products & combos (I/O, fixcel-db)    │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  price_sale(...)  ◄── THIS MODULE: pure, no I/O, no mutation        │
//! │       │                                                             │
//! │       │  PricedSale { lines, combo_lines, totals, decrements }      │
//! │       ▼                                                             │
//! │  pre-check stock ──► reserve + commit (fixcel-db engine)            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keeping pricing pure means the arithmetic and the combo flattening can
//! be tested without a database, and the reservation phase receives one
//! already-final decrement map instead of re-deriving quantities.

use crate::money::Money;
use crate::types::{Combo, ComboLine, DecrementMap, Product, SaleLine};

/// A combo line with its catalog data fully resolved.
///
/// `item_products[i]` is the product backing `combo.items[i]`; the engine
/// guarantees the alignment when it resolves the request.
#[derive(Debug, Clone)]
pub struct ResolvedComboLine {
    pub combo: Combo,
    pub item_products: Vec<Product>,
    pub quantity: i64,
}

/// The outcome of the pure pricing phase.
#[derive(Debug, Clone)]
pub struct PricedSale {
    /// Per-product snapshot lines.
    pub lines: Vec<SaleLine>,
    /// Per-combo snapshot lines.
    pub combo_lines: Vec<ComboLine>,
    pub total_before_discount: Money,
    /// Requested discount clamped to ≥ 0.
    pub discount: Money,
    /// `max(0, total_before_discount - discount)`.
    pub total_sale: Money,
    pub total_cost: Money,
    /// `total_sale - total_cost`; may be negative.
    pub net_profit: Money,
    /// Flattened reservation plan: product id → total quantity to decrement,
    /// accumulated across standalone lines and expanded combo items.
    pub decrements: DecrementMap,
}

/// Prices a sale from resolved catalog data. Pure computation, no mutation.
///
/// For each product line: `subtotal += sell_price × qty`,
/// `cost += cost × qty`, snapshot a [`SaleLine`].
///
/// For each combo line: the combo cost is `Σ(item product cost × item qty)`;
/// `subtotal += combo sell_price × qty`, `cost += combo cost × qty`,
/// snapshot a [`ComboLine`], and fold `item qty × line qty` for every item
/// into the decrement map.
pub fn price_sale(
    product_lines: &[(Product, i64)],
    combo_lines: &[ResolvedComboLine],
    discount_cents: i64,
) -> PricedSale {
    let mut total_before_discount = Money::zero();
    let mut total_cost = Money::zero();
    let mut lines = Vec::with_capacity(product_lines.len());
    let mut combo_snapshots = Vec::with_capacity(combo_lines.len());
    let mut decrements = DecrementMap::new();

    for (product, quantity) in product_lines {
        total_before_discount += product.sell_price * *quantity;
        total_cost += product.cost * *quantity;

        lines.push(SaleLine {
            product_id: product.id.clone(),
            quantity: *quantity,
            sell_price_at_sale: product.sell_price,
            cost_at_sale: product.cost,
        });

        *decrements.entry(product.id.clone()).or_insert(0) += *quantity;
    }

    for resolved in combo_lines {
        let mut combo_cost = Money::zero();
        for (item, product) in resolved.combo.items.iter().zip(&resolved.item_products) {
            combo_cost += product.cost * item.quantity;
            *decrements.entry(product.id.clone()).or_insert(0) +=
                item.quantity * resolved.quantity;
        }

        total_before_discount += resolved.combo.sell_price * resolved.quantity;
        total_cost += combo_cost * resolved.quantity;

        combo_snapshots.push(ComboLine {
            combo_id: resolved.combo.id.clone(),
            quantity: resolved.quantity,
            sell_price_at_sale: resolved.combo.sell_price,
            cost_at_sale: combo_cost,
        });
    }

    let discount = Money::from_cents(discount_cents).max_zero();
    let total_sale = (total_before_discount - discount).max_zero();
    let net_profit = total_sale - total_cost;

    PricedSale {
        lines,
        combo_lines: combo_snapshots,
        total_before_discount,
        discount,
        total_sale,
        total_cost,
        net_profit,
        decrements,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComboItem;
    use chrono::Utc;

    fn product(id: &str, cost: i64, sell_price: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category_id: "cat-1".to_string(),
            barcode: None,
            internal_code: None,
            cost: Money::from_cents(cost),
            sell_price: Money::from_cents(sell_price),
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn combo(id: &str, sell_price: i64, items: Vec<ComboItem>) -> Combo {
        Combo {
            id: id.to_string(),
            name: format!("Combo {id}"),
            sell_price: Money::from_cents(sell_price),
            items,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_single_product_line_totals() {
        // cost $10, price $20, qty 2 → subtotal $40, cost $20, profit $20
        let p = product("p1", 1000, 2000, 5);
        let priced = price_sale(&[(p, 2)], &[], 0);

        assert_eq!(priced.total_before_discount.cents(), 4000);
        assert_eq!(priced.total_sale.cents(), 4000);
        assert_eq!(priced.total_cost.cents(), 2000);
        assert_eq!(priced.net_profit.cents(), 2000);
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].sell_price_at_sale.cents(), 2000);
        assert_eq!(priced.lines[0].cost_at_sale.cents(), 1000);
        assert_eq!(priced.decrements.get("p1"), Some(&2));
    }

    #[test]
    fn test_combo_cost_snapshot() {
        // Combo of 3 × p1 (cost $10 each), bundle price $100
        let p = product("p1", 1000, 2000, 5);
        let c = combo(
            "c1",
            10000,
            vec![ComboItem {
                product_id: "p1".to_string(),
                quantity: 3,
            }],
        );
        let resolved = ResolvedComboLine {
            combo: c,
            item_products: vec![p],
            quantity: 1,
        };

        let priced = price_sale(&[], &[resolved], 0);

        assert_eq!(priced.combo_lines.len(), 1);
        assert_eq!(priced.combo_lines[0].cost_at_sale.cents(), 3000);
        assert_eq!(priced.total_before_discount.cents(), 10000);
        assert_eq!(priced.total_cost.cents(), 3000);
        assert_eq!(priced.decrements.get("p1"), Some(&3));
    }

    #[test]
    fn test_flattening_accumulates_standalone_and_combo() {
        // p1 standalone qty 2, plus a combo containing 3 × p1 at combo qty 1
        // → single combined decrement of 5
        let p = product("p1", 1000, 2000, 10);
        let c = combo(
            "c1",
            5000,
            vec![ComboItem {
                product_id: "p1".to_string(),
                quantity: 3,
            }],
        );
        let resolved = ResolvedComboLine {
            combo: c,
            item_products: vec![p.clone()],
            quantity: 1,
        };

        let priced = price_sale(&[(p, 2)], &[resolved], 0);

        assert_eq!(priced.decrements.len(), 1);
        assert_eq!(priced.decrements.get("p1"), Some(&5));
    }

    #[test]
    fn test_combo_quantity_multiplies_item_decrements() {
        // 2 × (combo of 3 × p1) → decrement 6
        let p = product("p1", 1000, 2000, 10);
        let c = combo(
            "c1",
            5000,
            vec![ComboItem {
                product_id: "p1".to_string(),
                quantity: 3,
            }],
        );
        let resolved = ResolvedComboLine {
            combo: c,
            item_products: vec![p],
            quantity: 2,
        };

        let priced = price_sale(&[], &[resolved], 0);

        assert_eq!(priced.decrements.get("p1"), Some(&6));
        // combo cost snapshot is per bundle; total cost multiplies by qty
        assert_eq!(priced.combo_lines[0].cost_at_sale.cents(), 3000);
        assert_eq!(priced.total_cost.cents(), 6000);
    }

    #[test]
    fn test_discount_clamps_total_to_zero() {
        // subtotal $40, discount $100 → total clamps to 0, profit negative
        let p = product("p1", 1000, 2000, 5);
        let priced = price_sale(&[(p, 2)], &[], 10000);

        assert_eq!(priced.total_before_discount.cents(), 4000);
        assert_eq!(priced.discount.cents(), 10000);
        assert_eq!(priced.total_sale.cents(), 0);
        assert_eq!(priced.net_profit.cents(), -2000);
    }

    #[test]
    fn test_negative_discount_clamps_to_zero() {
        let p = product("p1", 1000, 2000, 5);
        let priced = price_sale(&[(p, 1)], &[], -500);

        assert_eq!(priced.discount, Money::zero());
        assert_eq!(priced.total_sale.cents(), 2000);
    }

    #[test]
    fn test_invariants_hold_for_mixed_cart() {
        let p1 = product("p1", 1000, 2000, 10);
        let p2 = product("p2", 500, 900, 10);
        let c = combo(
            "c1",
            2500,
            vec![
                ComboItem {
                    product_id: "p1".to_string(),
                    quantity: 1,
                },
                ComboItem {
                    product_id: "p2".to_string(),
                    quantity: 2,
                },
            ],
        );
        let resolved = ResolvedComboLine {
            combo: c,
            item_products: vec![p1.clone(), p2.clone()],
            quantity: 2,
        };

        let priced = price_sale(&[(p1, 1), (p2, 3)], &[resolved], 700);

        assert_eq!(
            priced.total_sale,
            (priced.total_before_discount - priced.discount).max_zero()
        );
        assert_eq!(priced.net_profit, priced.total_sale - priced.total_cost);
        // p1: 1 standalone + 1×2 in combo = 3; p2: 3 standalone + 2×2 = 7
        assert_eq!(priced.decrements.get("p1"), Some(&3));
        assert_eq!(priced.decrements.get("p2"), Some(&7));
    }
}
