//! Stock validation rules gating a row before it joins the queued batch.
//!
//! Reduction contexts validate against the branch's own stock and overdraw
//! is a hard failure. Addition contexts validate against central-warehouse
//! stock: overdraw is admitted with a warning and confirmed at submit time,
//! except during HR review where it becomes a hard failure.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::PendingRow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockContext {
    Reduction,
    Addition { hr_review: bool },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RowRejection {
    #[error("barang `{code}` sudah ada dalam daftar")]
    DuplicateItem { code: String },
    #[error("jumlah `{raw}` bukan bilangan bulat positif")]
    InvalidQuantity { raw: String },
    #[error("jumlah {requested} melebihi stok cabang saat ini ({available})")]
    ExceedsAvailable { requested: i64, available: i64 },
    #[error("jumlah {requested} melebihi stok pusat saat ini ({available})")]
    ExceedsCentral { requested: i64, available: i64 },
    #[error("barang `{code}` tidak ada dalam daftar stok cabang")]
    UnknownItem { code: String },
}

/// Outcome of an admitted row. `warn_exceeds_central` marks rows that must
/// be re-confirmed by the user at submit time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowAdmission {
    pub warn_exceeds_central: bool,
}

/// Form inputs arrive as text; only positive integers are quantities.
pub fn parse_quantity(raw: &str) -> Result<i64, RowRejection> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or_else(|| RowRejection::InvalidQuantity { raw: raw.trim().to_owned() })
}

pub fn can_add_row(
    context: StockContext,
    code: &str,
    quantity: i64,
    available: i64,
    queued_codes: &[String],
) -> Result<RowAdmission, RowRejection> {
    if queued_codes.iter().any(|queued| queued == code) {
        return Err(RowRejection::DuplicateItem { code: code.to_owned() });
    }
    if quantity <= 0 {
        return Err(RowRejection::InvalidQuantity { raw: quantity.to_string() });
    }

    match context {
        StockContext::Reduction if quantity > available => {
            Err(RowRejection::ExceedsAvailable { requested: quantity, available })
        }
        StockContext::Addition { hr_review: true } if quantity > available => {
            Err(RowRejection::ExceedsCentral { requested: quantity, available })
        }
        StockContext::Addition { hr_review: false } if quantity > available => {
            Ok(RowAdmission { warn_exceeds_central: true })
        }
        _ => Ok(RowAdmission::default()),
    }
}

/// Batch total as `sum(unit_price * quantity)`. Prices already normalized by
/// [`crate::money::Money`], whichever wire representation they arrived in.
pub fn total_price(rows: &[PendingRow]) -> Decimal {
    rows.iter().map(|row| row.unit_price.amount() * Decimal::from(row.quantity)).sum()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::PendingRow;
    use crate::money::Money;

    use super::{can_add_row, parse_quantity, total_price, RowRejection, StockContext};

    #[test]
    fn rejects_duplicate_item_in_the_same_batch() {
        let queued = vec!["A".to_owned()];
        let error = can_add_row(StockContext::Reduction, "A", 5, 10, &queued).unwrap_err();
        assert_eq!(error, RowRejection::DuplicateItem { code: "A".to_owned() });
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let queued = vec!["A".to_owned()];
        let error = can_add_row(StockContext::Reduction, "B", -1, 10, &queued).unwrap_err();
        assert_eq!(error, RowRejection::InvalidQuantity { raw: "-1".to_owned() });

        let zero = can_add_row(StockContext::Addition { hr_review: false }, "B", 0, 10, &[]);
        assert!(zero.is_err());
    }

    #[test]
    fn reduction_overdraw_is_a_hard_failure() {
        let error = can_add_row(StockContext::Reduction, "B", 11, 10, &[]).unwrap_err();
        assert_eq!(error, RowRejection::ExceedsAvailable { requested: 11, available: 10 });
    }

    #[test]
    fn addition_overdraw_is_admitted_with_a_warning() {
        let admission =
            can_add_row(StockContext::Addition { hr_review: false }, "B", 11, 5, &[]).unwrap();
        assert!(admission.warn_exceeds_central);
    }

    #[test]
    fn hr_review_promotes_central_overdraw_to_a_hard_failure() {
        let error =
            can_add_row(StockContext::Addition { hr_review: true }, "B", 11, 5, &[]).unwrap_err();
        assert_eq!(error, RowRejection::ExceedsCentral { requested: 11, available: 5 });
    }

    #[test]
    fn within_stock_rows_admit_cleanly_in_every_context() {
        for context in [
            StockContext::Reduction,
            StockContext::Addition { hr_review: false },
            StockContext::Addition { hr_review: true },
        ] {
            let admission = can_add_row(context, "B", 5, 10, &[]).unwrap();
            assert!(!admission.warn_exceeds_central);
        }
    }

    #[test]
    fn quantity_parsing_accepts_only_positive_integers() {
        assert_eq!(parse_quantity(" 7 "), Ok(7));
        assert!(parse_quantity("0").is_err());
        assert!(parse_quantity("-3").is_err());
        assert!(parse_quantity("2.5").is_err());
        assert!(parse_quantity("banyak").is_err());
    }

    #[test]
    fn total_price_normalizes_mixed_price_representations() {
        let rows = vec![
            PendingRow {
                code: "A".to_owned(),
                name: "Kertas".to_owned(),
                quantity: 2,
                unit_price: Money::parse("Rp 1.500").expect("currency string"),
            },
            PendingRow {
                code: "B".to_owned(),
                name: "Pulpen".to_owned(),
                quantity: 1,
                unit_price: Money::from(1000),
            },
        ];

        assert_eq!(total_price(&rows), Decimal::from(4000));
    }

    #[test]
    fn total_price_of_an_empty_batch_is_zero() {
        assert_eq!(total_price(&[]), Decimal::ZERO);
    }
}
