//! Checkout subtotal/total arithmetic.

use crate::status::DiscountType;

/// One priced line of a checkout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineItem {
    pub amount: f64,
    /// Defaults to 1 when absent.
    pub qty: Option<f64>,
}

/// Computed checkout amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub total: f64,
}

/// Compute subtotal and discounted total for a set of line items.
///
/// The discount is capped at the subtotal and the total is floored at zero;
/// callers apply cent rounding when comparing against thresholds.
pub fn compute_totals(
    items: &[LineItem],
    discount_type: Option<DiscountType>,
    discount_value: f64,
) -> Totals {
    let subtotal: f64 = items
        .iter()
        .map(|item| item.amount * item.qty.unwrap_or(1.0))
        .sum();

    let discount = match discount_type {
        Some(DiscountType::Pct) => (subtotal * discount_value / 100.0).min(subtotal),
        Some(DiscountType::Value) => discount_value.min(subtotal),
        None => 0.0,
    }
    .max(0.0);

    Totals {
        subtotal,
        total: (subtotal - discount).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(amount: f64) -> LineItem {
        LineItem { amount, qty: None }
    }

    #[test]
    fn test_subtotal_sums_qty() {
        let totals = compute_totals(
            &[
                LineItem {
                    amount: 50.0,
                    qty: Some(2.0),
                },
                item(30.0),
            ],
            None,
            0.0,
        );
        assert_eq!(totals.subtotal, 130.0);
        assert_eq!(totals.total, 130.0);
    }

    #[test]
    fn test_pct_discount_capped_at_subtotal() {
        let totals = compute_totals(&[item(100.0)], Some(DiscountType::Pct), 150.0);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn test_value_discount_clamped_to_zero_floor() {
        let totals = compute_totals(&[item(200.0)], Some(DiscountType::Value), 250.0);
        assert_eq!(totals.subtotal, 200.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn test_pct_discount_partial() {
        let totals = compute_totals(&[item(200.0)], Some(DiscountType::Pct), 10.0);
        assert_eq!(totals.total, 180.0);
    }

    #[test]
    fn test_deterministic() {
        let items = [item(99.9), item(0.1)];
        let first = compute_totals(&items, Some(DiscountType::Value), 25.0);
        let second = compute_totals(&items, Some(DiscountType::Value), 25.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_items() {
        let totals = compute_totals(&[], Some(DiscountType::Value), 50.0);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.total, 0.0);
    }
}
