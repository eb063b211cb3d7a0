//! Order

use std::{borrow::Borrow, io};

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    catalog::{Catalog, PriceOffer, ProductId, SellerId},
    evaluation::{Evaluation, EvaluationError, evaluate, line_value, seller_values},
};

/// Errors that can occur when turning offers into an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The offers do not cover every product in the catalog.
    #[error("order covers {covered} of {expected} products")]
    Incomplete {
        /// Number of products in the catalog
        expected: usize,

        /// Number of offers supplied
        covered: usize,
    },

    /// The catalog has no such offer, or records a different unit price for it.
    #[error("seller {seller} has no offer for product {product} at that price")]
    UnknownOffer {
        /// Product the offer is for
        product: ProductId,

        /// Seller making the offer
        seller: SellerId,
    },

    /// More than one offer was supplied for the same product.
    #[error("product {0} appears more than once in the order")]
    DuplicateProduct(ProductId),

    /// A seller would receive less than its minimum order.
    #[error("seller {seller} receives {value}, below its minimum order of {minimum}")]
    BelowMinimum {
        /// Seller whose minimum is not met
        seller: SellerId,

        /// Value bought from the seller, in minor units
        value: i64,

        /// The seller's minimum order, in minor units
        minimum: i64,
    },

    /// Wrapped evaluation error.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// IO error while rendering the order.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A complete, valid choice of one offer per product with its cost breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Chosen offers, one per product in ascending product order
    offers: SmallVec<[PriceOffer; 8]>,

    /// Cost breakdown of the chosen offers
    evaluation: Evaluation,

    /// Currency used for all monetary values
    currency: &'static Currency,
}

impl Order {
    /// Build an order from one offer per product.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if an offer is not in the catalog, the offers are not
    /// exactly one per product, a seller's minimum order is not met, or evaluation fails.
    pub fn from_offers<O: Borrow<PriceOffer>>(
        catalog: &Catalog,
        offers: &[O],
    ) -> Result<Self, OrderError> {
        if offers.len() != catalog.product_count() {
            return Err(OrderError::Incomplete {
                expected: catalog.product_count(),
                covered: offers.len(),
            });
        }

        let mut seen = FxHashSet::default();

        for offer in offers {
            let offer = offer.borrow();
            let product = offer.product();

            if catalog.unit_price(product, offer.seller()) != Some(offer.unit_price()) {
                return Err(OrderError::UnknownOffer {
                    product,
                    seller: offer.seller(),
                });
            }

            if !seen.insert(product) {
                return Err(OrderError::DuplicateProduct(product));
            }
        }

        for (seller_id, value) in seller_values(catalog, offers)? {
            let minimum = catalog
                .seller(seller_id)
                .ok_or(EvaluationError::UnknownSeller(seller_id))?
                .minimum_order();

            if value < minimum {
                return Err(OrderError::BelowMinimum {
                    seller: seller_id,
                    value,
                    minimum,
                });
            }
        }

        let evaluation = evaluate(catalog, offers)?;

        Ok(Self::from_parts(offers, evaluation, catalog.currency()))
    }

    /// Assemble an order from offers that have already been checked and evaluated.
    pub(crate) fn from_parts<O: Borrow<PriceOffer>>(
        offers: &[O],
        evaluation: Evaluation,
        currency: &'static Currency,
    ) -> Self {
        let mut offers: SmallVec<[PriceOffer; 8]> =
            offers.iter().map(|offer| *offer.borrow()).collect();

        offers.sort_by_key(PriceOffer::product);

        Self {
            offers,
            evaluation,
            currency,
        }
    }

    /// Chosen offers in ascending product order
    pub fn offers(&self) -> &[PriceOffer] {
        &self.offers
    }

    /// The offer chosen for a product
    pub fn offer_for(&self, product: ProductId) -> Option<&PriceOffer> {
        self.offers.iter().find(|offer| offer.product() == product)
    }

    /// Distinct sellers used, in the order they were first chosen
    pub fn sellers(&self) -> &[SellerId] {
        self.evaluation.sellers()
    }

    /// Shipping paid, once per seller used
    pub fn shipping_total(&self) -> Money<'static, Currency> {
        Money::from_minor(self.evaluation.shipping_total(), self.currency)
    }

    /// Cost of the products themselves
    pub fn product_total(&self) -> Money<'static, Currency> {
        Money::from_minor(self.evaluation.product_total(), self.currency)
    }

    /// Shipping plus products
    pub fn total(&self) -> Money<'static, Currency> {
        Money::from_minor(self.evaluation.total(), self.currency)
    }

    /// Cost breakdown in minor units
    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Currency used for all monetary values
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Render the order as a table followed by its totals.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if a line cannot be evaluated or writing fails.
    pub fn write_to(&self, mut out: impl io::Write, catalog: &Catalog) -> Result<(), OrderError> {
        let mut builder = Builder::default();

        builder.push_record(["Product", "Qty", "Seller", "Unit Price", "Line Total"]);

        for offer in &self.offers {
            let quantity = catalog
                .product(offer.product())
                .ok_or(EvaluationError::UnknownProduct(offer.product()))?
                .quantity();

            builder.push_record([
                offer.product().to_string(),
                quantity.to_string(),
                offer.seller().to_string(),
                Money::from_minor(offer.unit_price(), self.currency).to_string(),
                Money::from_minor(line_value(catalog, offer)?, self.currency).to_string(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(3..5), Alignment::right());

        writeln!(out, "\n{table}")?;
        writeln!(out, " Products: {}", self.product_total())?;
        writeln!(out, " Shipping: {}", self.shipping_total())?;
        writeln!(out, " Total:    {}", self.total())?;

        let sellers: Vec<String> = self.sellers().iter().map(ToString::to_string).collect();

        writeln!(out, " Sellers:  {}", sellers.join(", "))?;

        Ok(())
    }
}
