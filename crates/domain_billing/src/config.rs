//! Billing configuration snapshot
//!
//! Rates are read once at startup and injected into the recalculation
//! path as an immutable snapshot, never consulted through global state.

use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Rate};

/// Read-only configuration consumed by invoice recalculation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Ledger currency for all invoices
    pub currency: Currency,
    /// VAT applied on (subtotal + service charge)
    pub vat_rate: Rate,
    /// Service charge applied on the subtotal
    pub service_charge_rate: Rate,
}

impl BillingConfig {
    pub fn new(currency: Currency, vat_rate: Rate, service_charge_rate: Rate) -> Self {
        Self {
            currency,
            vat_rate,
            service_charge_rate,
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            vat_rate: Rate::zero(),
            service_charge_rate: Rate::zero(),
        }
    }
}
