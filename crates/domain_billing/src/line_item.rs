//! Invoice line items
//!
//! A line item is one priced row on an invoice: a service or a retail
//! product, with the unit price captured at invoice-creation time. Later
//! catalog price changes never retroactively alter an issued invoice.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CatalogItemId, LineItemId, Money, Rate};

use crate::error::BillingError;

/// What kind of billable row this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineItemKind {
    /// A performed service (treatment, class, session)
    Service,
    /// A retail product sold at the desk
    Product,
}

/// A line item on an invoice, owned exclusively by that invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique identifier
    pub id: LineItemId,
    /// Priced catalog entry this row was created from, if any
    pub catalog_item_id: Option<CatalogItemId>,
    /// Row kind
    pub kind: LineItemKind,
    /// Free-text label shown on the invoice
    pub description: String,
    /// Billed quantity, at least 1
    pub quantity: u32,
    /// Unit price captured at creation time
    pub unit_price: Money,
    /// Per-line tax rate
    pub tax_rate: Rate,
}

impl LineItem {
    /// Creates a new line item
    ///
    /// # Errors
    ///
    /// Returns a validation error if quantity is zero, the unit price is
    /// negative, or the tax rate is negative.
    pub fn new(
        kind: LineItemKind,
        description: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        tax_rate: Rate,
    ) -> Result<Self, BillingError> {
        if quantity == 0 {
            return Err(BillingError::validation("Line item quantity must be at least 1"));
        }
        if unit_price.is_negative() {
            return Err(BillingError::validation("Line item unit price must not be negative"));
        }
        if tax_rate.as_decimal().is_sign_negative() {
            return Err(BillingError::validation("Line item tax rate must not be negative"));
        }

        Ok(Self {
            id: LineItemId::new_v7(),
            catalog_item_id: None,
            kind,
            description: description.into(),
            quantity,
            unit_price,
            tax_rate,
        })
    }

    /// Links this row to the catalog entry it was priced from
    pub fn with_catalog_item(mut self, catalog_item_id: CatalogItemId) -> Self {
        self.catalog_item_id = Some(catalog_item_id);
        self
    }

    /// Line subtotal: unit price × quantity
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(Decimal::from(self.quantity))
    }

    /// Per-line tax: line subtotal × tax rate
    pub fn tax(&self) -> Money {
        self.tax_rate.apply(&self.subtotal())
    }
}
