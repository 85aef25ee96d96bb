//! Derived aggregates for dashboards and sales reports.
//!
//! Pure computations over already-fetched rows; nothing here reads from a
//! repository or is treated as authoritative.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::LedgerEntry;
use crate::movement::MovementKind;
use crate::product::{Product, ProductId};

/// Headline stock figures for one business unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockSummary {
    pub total_products: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    /// Total inventory value at cost, in centavos.
    pub value_at_cost: i64,
    /// Total inventory value at selling price, in centavos.
    pub value_at_sale: i64,
}

pub fn stock_summary(products: &[Product]) -> StockSummary {
    let mut summary = StockSummary {
        total_products: products.len(),
        ..Default::default()
    };
    for product in products {
        if product.is_out_of_stock() {
            summary.out_of_stock += 1;
        } else if product.is_low_stock() {
            summary.low_stock += 1;
        }
        summary.value_at_cost += product.value_at_cost();
        summary.value_at_sale += product.value_at_sale();
    }
    summary
}

/// Movement quantity totals by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MovementTotals {
    pub stock_in: i64,
    pub stock_out: i64,
    pub adjustments: usize,
}

pub fn movement_totals(entries: &[LedgerEntry]) -> MovementTotals {
    let mut totals = MovementTotals::default();
    for entry in entries {
        match entry.kind {
            MovementKind::StockIn => totals.stock_in += entry.quantity,
            MovementKind::StockOut => totals.stock_out += entry.quantity,
            // A recount has no meaningful magnitude to total; count it.
            MovementKind::Adjustment => totals.adjustments += 1,
        }
    }
    totals
}

/// One sale derived from a `stock_out` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesLine {
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub quantity: i64,
    /// Revenue in centavos (quantity x selling price at report time).
    pub amount: i64,
    pub voucher_number: Option<String>,
    pub customer_name: Option<String>,
}

/// Project `stock_out` entries into sales lines.
///
/// `price_of` looks up the selling price for a product; entries whose product
/// is unknown (e.g. filtered out upstream) are skipped. The sale date falls
/// back to the entry's creation date when no explicit date of sale was
/// captured.
pub fn sales_lines<F>(entries: &[LedgerEntry], price_of: F) -> Vec<SalesLine>
where
    F: Fn(ProductId) -> Option<i64>,
{
    entries
        .iter()
        .filter(|e| e.kind == MovementKind::StockOut)
        .filter_map(|e| {
            let price = price_of(e.product_id)?;
            Some(SalesLine {
                product_id: e.product_id,
                date: e.date_of_sale.unwrap_or_else(|| e.created_at.date_naive()),
                quantity: e.quantity,
                amount: e.quantity * price,
                voucher_number: e.voucher_number.clone(),
                customer_name: e.customer_name.clone(),
            })
        })
        .collect()
}

/// Group sales revenue by day (time-bucketed total, in centavos).
pub fn sales_by_day(lines: &[SalesLine]) -> BTreeMap<NaiveDate, i64> {
    let mut buckets = BTreeMap::new();
    for line in lines {
        *buckets.entry(line.date).or_insert(0) += line.amount;
    }
    buckets
}
