//! Property-based tests for the engine's derivation guarantees
//!
//! Every invoice the engine produces, for any mix of line items and
//! rates, must satisfy the ledger invariants.

use std::sync::Arc;

use chrono::{Duration, Utc};
use proptest::prelude::*;

use core_kernel::{Currency, GuestId};
use domain_billing::BillingConfig;
use ledger_engine::{CreateInvoice, LedgerEngine, LedgerStore, NewLineItem};
use test_utils::assertions::assert_invoice_consistent;
use test_utils::builders::TestInvoiceBuilder;
use test_utils::generators::{line_item_strategy, rate_strategy};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn engine_created_invoices_satisfy_ledger_invariants(
        lines in proptest::collection::vec(line_item_strategy(), 1..5),
        vat in rate_strategy(),
        service_charge in rate_strategy(),
    ) {
        let invoice = runtime().block_on(async move {
            let config = BillingConfig::new(Currency::USD, vat, service_charge);
            let engine = LedgerEngine::new(Arc::new(LedgerStore::new()), config);
            engine
                .create_invoice(CreateInvoice {
                    guest_id: GuestId::new_v7(),
                    reservation_id: None,
                    due_date: Utc::now().date_naive() + Duration::days(7),
                    lines: lines
                        .into_iter()
                        .map(|item| NewLineItem {
                            catalog_item_id: item.catalog_item_id,
                            kind: item.kind,
                            description: item.description,
                            quantity: item.quantity,
                            unit_price: item.unit_price,
                            tax_rate: item.tax_rate,
                        })
                        .collect(),
                })
                .await
                .expect("generated invoices are valid")
        });
        assert_invoice_consistent(&invoice);
    }

    #[test]
    fn recalculating_a_seeded_invoice_derives_consistent_totals(
        lines in proptest::collection::vec(line_item_strategy(), 1..5),
    ) {
        let invoice = runtime().block_on(async move {
            let engine = LedgerEngine::new(
                Arc::new(LedgerStore::new()),
                BillingConfig::default(),
            );
            let mut seeded = TestInvoiceBuilder::new().build();
            for line in lines {
                seeded.add_item(line).expect("generated lines share the currency");
            }
            engine.store().insert_invoice(seeded.clone()).await;
            engine.recalculate(seeded.id).await.expect("seeded invoice recalculates")
        });
        assert_invoice_consistent(&invoice);
    }
}
