//! Consumption-tax aggregation: line items in, per-rate summaries and
//! document totals out. Pure, no validation, never fails.

use crate::model::{InvoiceTotals, LineItem, TaxRate, TaxSummary};

/// Derive [`InvoiceTotals`] from an ordered item list.
///
/// Line totals are `quantity * unit_price` with no rounding at line level.
/// Tax is rounded once per rate per document: `floor(taxable * rate)`, the
/// Japanese consumption-tax convention. A rate bucket is emitted only when
/// its taxable amount is strictly positive; the exempt bucket therefore
/// appears with a tax amount of zero when exempt items sum above zero.
/// Negative figures (discount lines) flow through untouched, and so does
/// NaN; callers parse and coerce text input before it reaches this point.
pub fn aggregate(items: &[LineItem]) -> InvoiceTotals {
    let mut subtotal = 0.0_f64;
    let mut by_rate = [0.0_f64; 3];

    for item in items {
        let line_total = item.quantity * item.unit_price;
        subtotal += line_total;
        by_rate[bucket_index(item.tax_rate)] += line_total;
    }

    let mut tax_summaries = Vec::new();
    let mut total_tax = 0.0_f64;
    for rate in TaxRate::ALL {
        let taxable_amount = by_rate[bucket_index(rate)];
        if taxable_amount > 0.0 {
            let tax_amount = (taxable_amount * rate.rate()).floor();
            total_tax += tax_amount;
            tax_summaries.push(TaxSummary {
                rate: rate.rate(),
                taxable_amount,
                tax_amount,
            });
        }
    }

    InvoiceTotals {
        subtotal,
        total_tax,
        grand_total: subtotal + total_tax,
        tax_summaries,
    }
}

fn bucket_index(rate: TaxRate) -> usize {
    match rate {
        TaxRate::Standard => 0,
        TaxRate::Reduced => 1,
        TaxRate::Exempt => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: f64, unit_price: f64, tax_rate: TaxRate) -> LineItem {
        LineItem {
            id: "1".to_string(),
            description: String::new(),
            quantity,
            unit_price,
            unit: "式".to_string(),
            tax_rate,
        }
    }

    #[test]
    fn empty_items_yield_zero_totals() {
        let totals = aggregate(&[]);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.total_tax, 0.0);
        assert_eq!(totals.grand_total, 0.0);
        assert!(totals.tax_summaries.is_empty());
    }

    #[test]
    fn tax_rounds_down_once_per_rate() {
        // 3 x 333 = 999; 10% of 999 floors to 99, never 100.
        let totals = aggregate(&[item(3.0, 333.0, TaxRate::Standard)]);
        assert_eq!(totals.subtotal, 999.0);
        assert_eq!(totals.total_tax, 99.0);
        assert_eq!(totals.grand_total, 1098.0);
    }

    #[test]
    fn rates_are_bucketed_independently() {
        let totals = aggregate(&[
            item(1.0, 1000.0, TaxRate::Standard),
            item(1.0, 1000.0, TaxRate::Reduced),
        ]);
        assert_eq!(totals.tax_summaries.len(), 2);
        assert_eq!(totals.tax_summaries[0].rate, 0.10);
        assert_eq!(totals.tax_summaries[0].tax_amount, 100.0);
        assert_eq!(totals.tax_summaries[1].rate, 0.08);
        assert_eq!(totals.tax_summaries[1].tax_amount, 80.0);
        assert_eq!(totals.total_tax, 180.0);
        assert_eq!(totals.grand_total, 2180.0);
    }

    #[test]
    fn rounding_happens_per_document_not_per_line() {
        // Two 99-yen standard lines: floor(198 * 0.10) = 19, while
        // per-line rounding would give floor(9.9) + floor(9.9) = 18.
        let totals = aggregate(&[
            item(1.0, 99.0, TaxRate::Standard),
            item(1.0, 99.0, TaxRate::Standard),
        ]);
        assert_eq!(totals.total_tax, 19.0);
    }

    #[test]
    fn exempt_bucket_is_listed_with_zero_tax() {
        let totals = aggregate(&[item(1.0, 5000.0, TaxRate::Exempt)]);
        assert_eq!(totals.subtotal, 5000.0);
        assert_eq!(totals.total_tax, 0.0);
        assert_eq!(totals.grand_total, 5000.0);
        assert_eq!(totals.tax_summaries.len(), 1);
        assert_eq!(totals.tax_summaries[0].rate, 0.0);
        assert_eq!(totals.tax_summaries[0].taxable_amount, 5000.0);
        assert_eq!(totals.tax_summaries[0].tax_amount, 0.0);
    }

    #[test]
    fn summaries_keep_declaration_order() {
        let totals = aggregate(&[
            item(1.0, 100.0, TaxRate::Exempt),
            item(1.0, 100.0, TaxRate::Reduced),
            item(1.0, 100.0, TaxRate::Standard),
        ]);
        let rates: Vec<f64> = totals.tax_summaries.iter().map(|s| s.rate).collect();
        assert_eq!(rates, vec![0.10, 0.08, 0.00]);
    }

    #[test]
    fn totals_identity_holds() {
        let items = vec![
            item(2.0, 450.0, TaxRate::Standard),
            item(1.5, 333.0, TaxRate::Reduced),
            item(3.0, 70.0, TaxRate::Exempt),
            item(1.0, -500.0, TaxRate::Standard),
        ];
        let totals = aggregate(&items);
        let summed_taxable: f64 = totals.tax_summaries.iter().map(|s| s.taxable_amount).sum();
        let summed_tax: f64 = totals.tax_summaries.iter().map(|s| s.tax_amount).sum();
        assert_eq!(totals.grand_total, totals.subtotal + totals.total_tax);
        assert_eq!(totals.total_tax, summed_tax);
        // Every bucket is positive here, so the emitted summaries cover the
        // whole subtotal.
        assert!((totals.subtotal - summed_taxable).abs() < 1e-9);
    }

    #[test]
    fn negative_buckets_are_suppressed_but_still_counted_in_subtotal() {
        let totals = aggregate(&[
            item(1.0, -300.0, TaxRate::Standard),
            item(1.0, 100.0, TaxRate::Reduced),
        ]);
        assert_eq!(totals.subtotal, -200.0);
        assert_eq!(totals.tax_summaries.len(), 1);
        assert_eq!(totals.tax_summaries[0].rate, 0.08);
        assert_eq!(totals.total_tax, 8.0);
        assert_eq!(totals.grand_total, -192.0);
    }

    #[test]
    fn zero_quantity_items_contribute_nothing() {
        let totals = aggregate(&[item(0.0, 9999.0, TaxRate::Standard)]);
        assert_eq!(totals.subtotal, 0.0);
        assert!(totals.tax_summaries.is_empty());
    }

    #[test]
    fn nan_propagates_without_panicking() {
        let totals = aggregate(&[item(f64::NAN, 100.0, TaxRate::Standard)]);
        assert!(totals.subtotal.is_nan());
        assert!(totals.grand_total.is_nan());
        // NaN > 0 is false, so the poisoned bucket is never emitted.
        assert!(totals.tax_summaries.is_empty());
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let items = vec![
            item(3.0, 333.0, TaxRate::Standard),
            item(2.0, 125.0, TaxRate::Reduced),
        ];
        let a = aggregate(&items);
        let b = aggregate(&items);
        assert_eq!(a, b);
    }
}
