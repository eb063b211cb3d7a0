//! Order Evaluation
//!
//! Cost breakdown and minimum-order validation for a sequence of offers. The offers do not
//! need to cover every product, so the same functions serve partial and complete assignments.

use std::borrow::Borrow;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::catalog::{Catalog, PriceOffer, ProductId, SellerId};

/// Errors that can occur while evaluating offers against a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    /// An offer refers to a product the catalog does not contain.
    #[error("offer refers to unknown product {0}")]
    UnknownProduct(ProductId),

    /// An offer refers to a seller the catalog does not contain.
    #[error("offer refers to unknown seller {0}")]
    UnknownSeller(SellerId),

    /// A monetary value overflowed `i64` minor units.
    #[error("monetary value overflowed while evaluating offers")]
    Overflow,
}

/// Accumulated purchase value per seller, in first-use order.
pub type SellerValues = SmallVec<[(SellerId, i64); 8]>;

/// Cost breakdown of a sequence of offers, all values in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Evaluation {
    sellers: SmallVec<[SellerId; 8]>,
    shipping_total: i64,
    product_total: i64,
    total: i64,
}

impl Evaluation {
    /// Distinct sellers used, in the order they first appear
    pub fn sellers(&self) -> &[SellerId] {
        &self.sellers
    }

    /// Sum of the flat shipping fee of each distinct seller
    pub fn shipping_total(&self) -> i64 {
        self.shipping_total
    }

    /// Sum of unit price x quantity over the offers
    pub fn product_total(&self) -> i64 {
        self.product_total
    }

    /// Shipping total plus product total
    pub fn total(&self) -> i64 {
        self.total
    }
}

/// Value of buying a product's full required quantity through `offer`.
///
/// # Errors
///
/// Returns an [`EvaluationError`] if the product is unknown or the value overflows.
pub fn line_value(catalog: &Catalog, offer: &PriceOffer) -> Result<i64, EvaluationError> {
    let product = catalog
        .product(offer.product())
        .ok_or(EvaluationError::UnknownProduct(offer.product()))?;

    offer
        .unit_price()
        .checked_mul(i64::from(product.quantity()))
        .ok_or(EvaluationError::Overflow)
}

/// Compute the cost breakdown of `offers`.
///
/// # Errors
///
/// Returns an [`EvaluationError`] if an offer refers to an unknown product or seller, or a
/// total overflows.
pub fn evaluate<O: Borrow<PriceOffer>>(
    catalog: &Catalog,
    offers: &[O],
) -> Result<Evaluation, EvaluationError> {
    let values = seller_values(catalog, offers)?;

    let mut evaluation = Evaluation::default();

    for &(seller_id, value) in &values {
        let seller = catalog
            .seller(seller_id)
            .ok_or(EvaluationError::UnknownSeller(seller_id))?;

        evaluation.sellers.push(seller_id);

        evaluation.shipping_total = evaluation
            .shipping_total
            .checked_add(seller.shipping())
            .ok_or(EvaluationError::Overflow)?;

        evaluation.product_total = evaluation
            .product_total
            .checked_add(value)
            .ok_or(EvaluationError::Overflow)?;
    }

    evaluation.total = evaluation
        .shipping_total
        .checked_add(evaluation.product_total)
        .ok_or(EvaluationError::Overflow)?;

    Ok(evaluation)
}

/// Check that every seller appearing in `offers` receives at least its minimum order.
///
/// Only what is bought through `offers` counts towards a seller's minimum.
///
/// # Errors
///
/// Returns an [`EvaluationError`] if an offer refers to an unknown product or seller, or a
/// value overflows.
pub fn is_valid<O: Borrow<PriceOffer>>(
    catalog: &Catalog,
    offers: &[O],
) -> Result<bool, EvaluationError> {
    for (seller_id, value) in seller_values(catalog, offers)? {
        let seller = catalog
            .seller(seller_id)
            .ok_or(EvaluationError::UnknownSeller(seller_id))?;

        if value < seller.minimum_order() {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Accumulate the purchase value attributed to each seller in `offers`.
///
/// # Errors
///
/// Returns an [`EvaluationError`] if an offer refers to an unknown product or a value
/// overflows.
pub fn seller_values<O: Borrow<PriceOffer>>(
    catalog: &Catalog,
    offers: &[O],
) -> Result<SellerValues, EvaluationError> {
    let mut values = SellerValues::new();
    let mut positions: FxHashMap<SellerId, usize> = FxHashMap::default();

    for offer in offers {
        let offer = offer.borrow();
        let value = line_value(catalog, offer)?;

        let position = *positions.entry(offer.seller()).or_insert_with(|| {
            values.push((offer.seller(), 0));
            values.len() - 1
        });

        let (_, accumulated) = values
            .get_mut(position)
            .ok_or(EvaluationError::UnknownSeller(offer.seller()))?;

        *accumulated = accumulated
            .checked_add(value)
            .ok_or(EvaluationError::Overflow)?;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::catalog::SellerTerms;

    use super::*;

    /// Three products stocked pairwise: seller 100 stocks everything with pricier shipping.
    fn pairwise_catalog() -> Result<Catalog, crate::catalog::CatalogError> {
        Catalog::new(
            &[
                vec![Some(10), Some(10), None, None],
                vec![Some(10), None, Some(10), None],
                vec![Some(10), None, None, Some(10)],
            ],
            &[1, 1, 1],
            &[
                SellerTerms::new(10, 20),
                SellerTerms::new(10, 10),
                SellerTerms::new(10, 10),
                SellerTerms::new(10, 10),
            ],
            GBP,
        )
    }

    #[test]
    fn shipping_is_charged_once_per_seller() -> TestResult {
        let catalog = pairwise_catalog()?;
        let offers = [
            PriceOffer::new(SellerId(100), ProductId(0), 10),
            PriceOffer::new(SellerId(100), ProductId(1), 10),
            PriceOffer::new(SellerId(100), ProductId(2), 10),
        ];

        let evaluation = evaluate(&catalog, &offers)?;

        assert_eq!(evaluation.sellers(), &[SellerId(100)]);
        assert_eq!(evaluation.shipping_total(), 20);
        assert_eq!(evaluation.product_total(), 30);
        assert_eq!(evaluation.total(), 50);

        Ok(())
    }

    #[test]
    fn split_orders_pay_each_sellers_shipping() -> TestResult {
        let catalog = pairwise_catalog()?;
        let offers = [
            PriceOffer::new(SellerId(101), ProductId(0), 10),
            PriceOffer::new(SellerId(102), ProductId(1), 10),
            PriceOffer::new(SellerId(103), ProductId(2), 10),
        ];

        let evaluation = evaluate(&catalog, &offers)?;

        assert_eq!(
            evaluation.sellers(),
            &[SellerId(101), SellerId(102), SellerId(103)]
        );
        assert_eq!(evaluation.shipping_total(), 30);
        assert_eq!(evaluation.total(), 60);

        Ok(())
    }

    #[test]
    fn product_total_uses_required_quantity() -> TestResult {
        let catalog = Catalog::new(&[vec![Some(10)]], &[4], &[SellerTerms::new(20, 10)], GBP)?;
        let offers = catalog.offers_for(ProductId(0));

        let evaluation = evaluate(&catalog, &offers)?;

        assert_eq!(evaluation.product_total(), 40);
        assert_eq!(evaluation.total(), 50);
        assert!(is_valid(&catalog, &offers)?);

        Ok(())
    }

    #[test]
    fn empty_offers_cost_nothing_and_are_valid() -> TestResult {
        let catalog = pairwise_catalog()?;
        let offers: [PriceOffer; 0] = [];

        assert_eq!(evaluate(&catalog, &offers)?, Evaluation::default());
        assert!(is_valid(&catalog, &offers)?);

        Ok(())
    }

    #[test]
    fn minimum_counts_only_offers_in_the_assignment() -> TestResult {
        let catalog = Catalog::new(
            &[vec![Some(10)], vec![Some(10)]],
            &[1, 1],
            &[SellerTerms::new(20, 0)],
            GBP,
        )?;

        let partial = [PriceOffer::new(SellerId(100), ProductId(0), 10)];
        let full = [
            PriceOffer::new(SellerId(100), ProductId(0), 10),
            PriceOffer::new(SellerId(100), ProductId(1), 10),
        ];

        assert!(!is_valid(&catalog, &partial)?);
        assert!(is_valid(&catalog, &full)?);

        Ok(())
    }

    #[test]
    fn seller_values_accumulate_in_first_use_order() -> TestResult {
        let catalog = pairwise_catalog()?;
        let offers = [
            PriceOffer::new(SellerId(102), ProductId(1), 10),
            PriceOffer::new(SellerId(100), ProductId(0), 10),
            PriceOffer::new(SellerId(100), ProductId(2), 10),
        ];

        let values = seller_values(&catalog, &offers)?;

        assert_eq!(values.as_slice(), &[(SellerId(102), 10), (SellerId(100), 20)]);

        Ok(())
    }

    #[test]
    fn unknown_references_are_errors() -> TestResult {
        let catalog = pairwise_catalog()?;

        assert_eq!(
            evaluate(&catalog, &[PriceOffer::new(SellerId(100), ProductId(9), 1)]),
            Err(EvaluationError::UnknownProduct(ProductId(9)))
        );

        assert_eq!(
            is_valid(&catalog, &[PriceOffer::new(SellerId(900), ProductId(0), 1)]),
            Err(EvaluationError::UnknownSeller(SellerId(900)))
        );

        Ok(())
    }

    #[test]
    fn overflow_is_reported() -> TestResult {
        let catalog = Catalog::new(&[vec![Some(i64::MAX)]], &[2], &[SellerTerms::default()], GBP)?;

        assert_eq!(
            evaluate(&catalog, catalog.offers()),
            Err(EvaluationError::Overflow)
        );

        Ok(())
    }
}
