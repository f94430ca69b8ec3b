// src/services/pricing.rs

use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::order::{Gst, GstInput},
};

/// Largest accepted gap between client and server totals.
pub const TOTALS_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    /// Sum of quantity × unit price before discount and tax.
    pub total: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
}

/// Normalizes the GST block. When tax is enabled the amount must be a
/// non-negative number; numeric strings are accepted.
pub fn normalize_gst(input: &GstInput) -> Result<Gst, AppError> {
    let percentage = input.percentage.unwrap_or(Decimal::ZERO);
    if !input.status {
        return Ok(Gst { status: false, percentage, amount: Decimal::ZERO });
    }

    let amount = input
        .amount
        .as_ref()
        .and_then(parse_amount)
        .ok_or_else(|| AppError::BadRequest("gst.amount must be a number when GST is enabled.".into()))?;
    if amount < Decimal::ZERO {
        return Err(AppError::BadRequest("gst.amount cannot be negative.".into()));
    }
    Ok(Gst { status: true, percentage, amount })
}

fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `lines` are `(unit price, quantity)` pairs. Discount is a percentage of the
/// pre-tax total; the GST amount is added on top of the discounted total.
pub fn compute_totals(lines: &[(Decimal, i32)], discount_pct: Decimal, gst: &Gst) -> Result<Totals, AppError> {
    let mut total = Decimal::ZERO;
    for (price, quantity) in lines {
        total = price
            .checked_mul(Decimal::from(*quantity))
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(out_of_range)?;
    }
    let discount_amount = total
        .checked_mul(discount_pct)
        .and_then(|d| d.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(out_of_range)?;
    let mut grand_total = total.checked_sub(discount_amount).ok_or_else(out_of_range)?;
    if gst.status {
        grand_total = grand_total.checked_add(gst.amount).ok_or_else(out_of_range)?;
    }
    Ok(Totals { total, discount_amount, grand_total })
}

fn out_of_range() -> AppError {
    AppError::BadRequest("Order amounts are out of range.".into())
}

/// Rejects client-computed totals that drift from the server's by more than a cent.
pub fn verify_client_totals(
    computed: &Totals,
    client_total: Decimal,
    client_grand_total: Decimal,
) -> Result<(), AppError> {
    if (computed.total - client_total).abs() > TOTALS_TOLERANCE {
        return Err(AppError::TotalsMismatch {
            field: "total",
            expected: computed.total,
            received: client_total,
        });
    }
    if (computed.grand_total - client_grand_total).abs() > TOTALS_TOLERANCE {
        return Err(AppError::TotalsMismatch {
            field: "grandTotal",
            expected: computed.grand_total,
            received: client_grand_total,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn no_gst() -> Gst {
        Gst { status: false, percentage: Decimal::ZERO, amount: Decimal::ZERO }
    }

    #[test]
    fn sparkler_order_without_gst() {
        // two sparklers at 50, 10 % off
        let totals = compute_totals(&[(dec("50"), 2)], dec("10"), &no_gst()).unwrap();
        assert_eq!(totals.total, dec("100"));
        assert_eq!(totals.discount_amount, dec("10"));
        assert_eq!(totals.grand_total, dec("90"));
    }

    #[test]
    fn gst_amount_is_added_after_discount() {
        let gst = Gst { status: true, percentage: dec("18"), amount: dec("16.2") };
        let totals = compute_totals(&[(dec("50"), 2)], dec("10"), &gst).unwrap();
        assert_eq!(totals.grand_total, dec("106.2"));
    }

    #[test]
    fn gift_boxes_and_products_sum_together() {
        let totals = compute_totals(&[(dec("50"), 2), (dec("450"), 1)], Decimal::ZERO, &no_gst()).unwrap();
        assert_eq!(totals.total, dec("550"));
        assert_eq!(totals.grand_total, dec("550"));
    }

    #[test]
    fn gst_amount_accepts_numeric_strings() {
        let gst = normalize_gst(&GstInput {
            status: true,
            percentage: Some(dec("18")),
            amount: Some(json!("16.20")),
        })
        .unwrap();
        assert_eq!(gst.amount, dec("16.20"));
    }

    #[test]
    fn enabled_gst_requires_a_non_negative_amount() {
        for amount in [None, Some(json!("abc")), Some(json!(-1)), Some(json!(true))] {
            let input = GstInput { status: true, percentage: None, amount };
            assert!(matches!(normalize_gst(&input), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn disabled_gst_ignores_the_amount() {
        let gst = normalize_gst(&GstInput { status: false, percentage: None, amount: Some(json!("junk")) })
            .unwrap();
        assert_eq!(gst.amount, Decimal::ZERO);
    }

    #[test]
    fn client_totals_within_a_cent_are_accepted() {
        let totals = compute_totals(&[(dec("33.333"), 3)], Decimal::ZERO, &no_gst()).unwrap();
        assert!(verify_client_totals(&totals, dec("100.00"), dec("100.00")).is_ok());
    }

    #[test]
    fn drifting_grand_total_is_rejected() {
        let totals = compute_totals(&[(dec("50"), 2)], dec("10"), &no_gst()).unwrap();
        let err = verify_client_totals(&totals, dec("100"), dec("95")).unwrap_err();
        assert!(matches!(err, AppError::TotalsMismatch { field: "grandTotal", .. }));
    }

    #[test]
    fn overflowing_amounts_are_a_bad_request() {
        let huge = Decimal::MAX;
        let err = compute_totals(&[(dec("50"), 2)], huge, &no_gst()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let gst = Gst { status: true, percentage: dec("18"), amount: huge };
        let err = compute_totals(&[(huge, 1)], Decimal::ZERO, &gst).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = compute_totals(&[(huge, 2)], Decimal::ZERO, &no_gst()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
