//! Property tests for the stock model and sale reconciliation.

use proptest::prelude::*;

use pharmacy_ledger_core::{
    Category, Ledger, LedgerConfig, LedgerError, MedicineInput, MemoryStore, SaleLine,
    SaleRequest, Stock,
};

fn tablet_stock() -> impl Strategy<Value = Stock> {
    (0u64..500, 0u64..60, 1u32..30)
        .prop_map(|(strips, loose, per_strip)| Stock::tablets(strips, loose, per_strip))
}

fn any_stock() -> impl Strategy<Value = Stock> {
    prop_oneof![tablet_stock(), (0u64..5000).prop_map(Stock::flat)]
}

fn flat_ledger(quantity: u64) -> (Ledger<MemoryStore>, String) {
    let (mut ledger, _) = Ledger::open(MemoryStore::new(), LedgerConfig::default());
    let med = ledger
        .add_medicine(MedicineInput::units("Syrup", "C-1", Category::Syrup, 2.5, quantity))
        .unwrap();
    (ledger, med.id)
}

fn line(id: &str, quantity: i64) -> SaleLine {
    SaleLine {
        medicine_id: id.to_string(),
        name: "Syrup".into(),
        quantity,
        price: 2.5,
    }
}

proptest! {
    #[test]
    fn prop_decrement_never_goes_negative(stock in any_stock(), units in 0u64..20_000) {
        let available = stock.available_units();
        match stock.apply_decrement(units) {
            Ok(next) => {
                prop_assert!(units <= available);
                prop_assert_eq!(next.available_units(), available - units);
                prop_assert!(next.is_canonical());
                prop_assert_eq!(next.tablets_per_strip(), stock.tablets_per_strip());
            }
            Err(_) => prop_assert!(units > available),
        }
    }

    #[test]
    fn prop_tablet_stock_is_canonical(stock in tablet_stock()) {
        prop_assert!(stock.is_canonical());
        if let Stock::DecomposedTablet { strips, loose_tablets, tablets_per_strip } = stock {
            prop_assert_eq!(
                stock.available_units(),
                strips * u64::from(tablets_per_strip) + loose_tablets
            );
        }
    }

    #[test]
    fn prop_increment_then_decrement_restores(stock in any_stock(), units in 0u64..10_000) {
        let restocked = stock.apply_increment(units).unwrap();
        let back = restocked.apply_decrement(units).unwrap();
        prop_assert_eq!(back, stock);
    }

    #[test]
    fn prop_split_lines_aggregate(quantity in 1u64..50, split in 0u64..50) {
        let first = split.min(quantity);
        let second = quantity - first;

        let (mut ledger, id) = flat_ledger(quantity);
        let before = ledger.catalog().to_vec();

        // One unit over, spread across two lines
        let over = SaleRequest {
            customer_name: "Asha".into(),
            items: vec![line(&id, first as i64), line(&id, second as i64 + 1)],
        };
        let rejected = matches!(
            ledger.create_sale(&over),
            Err(LedgerError::InsufficientStock(_)) | Err(LedgerError::InvalidQuantity { .. })
        );
        prop_assert!(rejected);
        prop_assert_eq!(ledger.catalog(), before.as_slice());

        let mut items = vec![line(&id, second as i64)];
        if first > 0 {
            items.push(line(&id, first as i64));
        }
        let exact = SaleRequest { customer_name: "Asha".into(), items };
        if second > 0 {
            ledger.create_sale(&exact).unwrap();
            prop_assert_eq!(ledger.medicine(&id).unwrap().available_units(), 0);
        }
    }

    #[test]
    fn prop_total_is_sum_of_lines(quantities in proptest::collection::vec(1i64..20, 1..6)) {
        let (mut ledger, id) = flat_ledger(1000);
        let request = SaleRequest {
            customer_name: "Asha".into(),
            items: quantities.iter().map(|q| line(&id, *q)).collect(),
        };

        let record = ledger.create_sale(&request).unwrap();
        let expected: f64 = quantities.iter().map(|q| *q as f64 * 2.5).sum();
        prop_assert!((record.total_amount - expected).abs() < 1e-9);
        prop_assert!((record.computed_total() - record.total_amount).abs() < 1e-9);
    }

    #[test]
    fn prop_rejection_is_repeatable(extra in 1u64..100) {
        let (mut ledger, id) = flat_ledger(10);
        let request = SaleRequest {
            customer_name: "Asha".into(),
            items: vec![line(&id, (10 + extra) as i64)],
        };

        let first = ledger.create_sale(&request).unwrap_err().to_string();
        let second = ledger.create_sale(&request).unwrap_err().to_string();
        prop_assert_eq!(first, second);
        prop_assert!(ledger.sales().is_empty());
        prop_assert_eq!(ledger.medicine(&id).unwrap().available_units(), 10);
    }
}
