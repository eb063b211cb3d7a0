//! Catalog
//!
//! Immutable snapshot of the products in a cart, the sellers that can supply them and
//! the sparse seller x product price table.

use std::fmt;

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

/// Offset added to a seller's position to form its [`SellerId`].
///
/// Keeps seller ids numerically apart from product ids when they show up side by side
/// in logs.
pub const SELLER_ID_OFFSET: usize = 100;

/// Offers of a single product, in the order they were recorded.
pub type ProductOffers<'c> = SmallVec<[&'c PriceOffer; 8]>;

/// Errors that can occur while building a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The number of price rows differs from the number of products.
    #[error("expected {products} price rows (one per product), got {rows}")]
    RowCountMismatch {
        /// Number of products (quantities)
        products: usize,

        /// Number of price rows supplied
        rows: usize,
    },

    /// A price row does not have one entry per seller.
    #[error("price row for product {product} has {len} entries, expected {sellers}")]
    RowLengthMismatch {
        /// Position of the offending row
        product: usize,

        /// Length of the offending row
        len: usize,

        /// Number of sellers
        sellers: usize,
    },

    /// A product was requested with a quantity of zero.
    #[error("product {0} has a required quantity of zero")]
    ZeroQuantity(usize),

    /// A stocked unit price was zero or negative.
    #[error("product {product} has non-positive unit price {price} at seller {seller}")]
    NonPositivePrice {
        /// Position of the product
        product: usize,

        /// Id of the seller
        seller: SellerId,

        /// Offending price in minor units
        price: i64,
    },

    /// A seller's minimum order or shipping fee is negative.
    #[error("seller {0} has a negative minimum order or shipping fee")]
    NegativeSellerTerm(SellerId),
}

/// Product identifier: the product's position in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(pub usize);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Seller identifier: the seller's position plus [`SELLER_ID_OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SellerId(pub usize);

impl SellerId {
    /// Build the id of the seller at `position` in the seller list.
    pub const fn from_position(position: usize) -> Self {
        Self(position + SELLER_ID_OFFSET)
    }

    /// Position of this seller in the seller list, if the id is in the seller id space.
    pub const fn position(self) -> Option<usize> {
        self.0.checked_sub(SELLER_ID_OFFSET)
    }
}

impl fmt::Display for SellerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A cart line: a product and the quantity that must be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    quantity: u32,
}

impl Product {
    /// Product id
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Required quantity
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Trading terms of a seller, in minor units of the catalog currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SellerTerms {
    /// Minimum value that must be bought from the seller for it to accept the order
    pub minimum_order: i64,

    /// Flat shipping fee charged once if the seller is used at all
    pub shipping: i64,
}

impl SellerTerms {
    /// Create seller terms from a minimum order and a shipping fee.
    pub const fn new(minimum_order: i64, shipping: i64) -> Self {
        Self {
            minimum_order,
            shipping,
        }
    }
}

/// A seller with its id and terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seller {
    id: SellerId,
    terms: SellerTerms,
}

impl Seller {
    /// Seller id
    pub fn id(&self) -> SellerId {
        self.id
    }

    /// Minimum order value in minor units
    pub fn minimum_order(&self) -> i64 {
        self.terms.minimum_order
    }

    /// Flat shipping fee in minor units
    pub fn shipping(&self) -> i64 {
        self.terms.shipping
    }
}

/// A seller stocking a product at a unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceOffer {
    seller: SellerId,
    product: ProductId,
    unit_price: i64,
}

impl PriceOffer {
    /// Create a new offer. Unit price is in minor units.
    pub const fn new(seller: SellerId, product: ProductId, unit_price: i64) -> Self {
        Self {
            seller,
            product,
            unit_price,
        }
    }

    /// Seller making the offer
    pub fn seller(&self) -> SellerId {
        self.seller
    }

    /// Product being offered
    pub fn product(&self) -> ProductId {
        self.product
    }

    /// Unit price in minor units
    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }
}

/// Read-only snapshot of products, sellers and offers for one planning run.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    sellers: Vec<Seller>,
    offers: Vec<PriceOffer>,

    /// Product id -> position in `products`
    product_index: FxHashMap<ProductId, usize>,

    /// Seller id -> position in `sellers`
    seller_index: FxHashMap<SellerId, usize>,

    /// Product id -> positions in `offers`
    offer_index: FxHashMap<ProductId, SmallVec<[usize; 8]>>,

    currency: &'static Currency,
}

impl Catalog {
    /// Build a catalog from the raw input tables.
    ///
    /// `prices` holds one row per product and one entry per seller; `None` marks a product
    /// the seller does not stock. All money values are minor units of `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the table dimensions disagree or a value is out of range.
    pub fn new(
        prices: &[Vec<Option<i64>>],
        quantities: &[u32],
        sellers: &[SellerTerms],
        currency: &'static Currency,
    ) -> Result<Self, CatalogError> {
        if prices.len() != quantities.len() {
            return Err(CatalogError::RowCountMismatch {
                products: quantities.len(),
                rows: prices.len(),
            });
        }

        let products = quantities
            .iter()
            .enumerate()
            .map(|(position, &quantity)| {
                if quantity == 0 {
                    return Err(CatalogError::ZeroQuantity(position));
                }

                Ok(Product {
                    id: ProductId(position),
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sellers = sellers
            .iter()
            .enumerate()
            .map(|(position, terms)| {
                let id = SellerId::from_position(position);

                if terms.minimum_order < 0 || terms.shipping < 0 {
                    return Err(CatalogError::NegativeSellerTerm(id));
                }

                Ok(Seller { id, terms: *terms })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut offers = Vec::new();
        let mut offer_index: FxHashMap<ProductId, SmallVec<[usize; 8]>> = FxHashMap::default();

        for (position, row) in prices.iter().enumerate() {
            if row.len() != sellers.len() {
                return Err(CatalogError::RowLengthMismatch {
                    product: position,
                    len: row.len(),
                    sellers: sellers.len(),
                });
            }

            let product = ProductId(position);
            let indexes = offer_index.entry(product).or_default();

            for (seller, price) in sellers.iter().zip(row) {
                // Unstocked entries never become offers.
                let Some(price) = *price else {
                    continue;
                };

                if price <= 0 {
                    return Err(CatalogError::NonPositivePrice {
                        product: position,
                        seller: seller.id,
                        price,
                    });
                }

                indexes.push(offers.len());
                offers.push(PriceOffer::new(seller.id, product, price));
            }
        }

        let product_index = products
            .iter()
            .enumerate()
            .map(|(position, product)| (product.id, position))
            .collect();

        let seller_index = sellers
            .iter()
            .enumerate()
            .map(|(position, seller)| (seller.id, position))
            .collect();

        Ok(Self {
            products,
            sellers,
            offers,
            product_index,
            seller_index,
            offer_index,
            currency,
        })
    }

    /// Products in ascending id order
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Sellers in ascending id order
    pub fn sellers(&self) -> &[Seller] {
        &self.sellers
    }

    /// All offers, grouped by product and then in seller order
    pub fn offers(&self) -> &[PriceOffer] {
        &self.offers
    }

    /// Number of products
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Number of sellers
    pub fn seller_count(&self) -> usize {
        self.sellers.len()
    }

    /// Currency of every monetary value in the catalog
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Look up a product by id.
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        let &position = self.product_index.get(&id)?;

        self.products.get(position)
    }

    /// Look up a seller by id.
    pub fn seller(&self, id: SellerId) -> Option<&Seller> {
        let &position = self.seller_index.get(&id)?;

        self.sellers.get(position)
    }

    /// Position of a seller in [`Catalog::sellers`].
    pub fn seller_index(&self, id: SellerId) -> Option<usize> {
        self.seller_index.get(&id).copied()
    }

    /// Offers for a product, in the order they were recorded.
    ///
    /// Empty if the product is unknown or nobody stocks it.
    pub fn offers_for(&self, id: ProductId) -> ProductOffers<'_> {
        self.offer_index
            .get(&id)
            .map(|indexes| {
                indexes
                    .iter()
                    .filter_map(|&index| self.offers.get(index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Unit price a seller charges for a product, if stocked.
    pub fn unit_price(&self, product: ProductId, seller: SellerId) -> Option<i64> {
        self.offers_for(product)
            .iter()
            .find(|offer| offer.seller() == seller)
            .map(|offer| offer.unit_price())
    }

    /// Wrap an amount in minor units as money in the catalog currency.
    pub fn money(&self, minor_units: i64) -> Money<'static, Currency> {
        Money::from_minor(minor_units, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn two_product_catalog() -> Result<Catalog, CatalogError> {
        Catalog::new(
            &[vec![Some(1), Some(2), None], vec![None, Some(2), Some(3)]],
            &[10, 20],
            &[
                SellerTerms::new(88, 10),
                SellerTerms::new(1, 10),
                SellerTerms::new(10, 10),
            ],
            GBP,
        )
    }

    #[test]
    fn assigns_ids_from_positions() -> TestResult {
        let catalog = two_product_catalog()?;

        assert_eq!(catalog.product_count(), 2);
        assert_eq!(catalog.products().first().map(Product::id), Some(ProductId(0)));
        assert_eq!(catalog.products().first().map(Product::quantity), Some(10));
        assert_eq!(catalog.sellers().first().map(Seller::id), Some(SellerId(100)));
        assert_eq!(catalog.sellers().first().map(Seller::minimum_order), Some(88));
        assert_eq!(catalog.sellers().first().map(Seller::shipping), Some(10));

        Ok(())
    }

    #[test]
    fn skips_unstocked_entries() -> TestResult {
        let catalog = two_product_catalog()?;

        assert_eq!(catalog.offers().len(), 4);
        assert_eq!(
            catalog.offers().first(),
            Some(&PriceOffer::new(SellerId(100), ProductId(0), 1))
        );

        let sellers: Vec<SellerId> = catalog
            .offers_for(ProductId(1))
            .iter()
            .map(|offer| offer.seller())
            .collect();

        assert_eq!(sellers, [SellerId(101), SellerId(102)]);

        Ok(())
    }

    #[test]
    fn lookups_by_id() -> TestResult {
        let catalog = two_product_catalog()?;

        assert_eq!(catalog.product(ProductId(1)).map(Product::quantity), Some(20));
        assert_eq!(catalog.seller(SellerId(102)).map(Seller::minimum_order), Some(10));
        assert_eq!(catalog.seller_index(SellerId(101)), Some(1));
        assert_eq!(catalog.unit_price(ProductId(1), SellerId(102)), Some(3));
        assert_eq!(catalog.unit_price(ProductId(1), SellerId(100)), None);

        assert!(catalog.product(ProductId(2)).is_none());
        assert!(catalog.seller(SellerId(2)).is_none());
        assert!(catalog.offers_for(ProductId(7)).is_empty());

        Ok(())
    }

    #[test]
    fn seller_id_position_round_trips() {
        assert_eq!(SellerId::from_position(3), SellerId(103));
        assert_eq!(SellerId(103).position(), Some(3));
        assert_eq!(SellerId(3).position(), None);
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let result = Catalog::new(&[vec![Some(1)]], &[1, 2], &[SellerTerms::default()], GBP);

        assert_eq!(
            result.err(),
            Some(CatalogError::RowCountMismatch {
                products: 2,
                rows: 1
            })
        );
    }

    #[test]
    fn rejects_row_length_mismatch() {
        let result = Catalog::new(
            &[vec![Some(1), None], vec![Some(1)]],
            &[1, 1],
            &[SellerTerms::default(), SellerTerms::default()],
            GBP,
        );

        assert_eq!(
            result.err(),
            Some(CatalogError::RowLengthMismatch {
                product: 1,
                len: 1,
                sellers: 2
            })
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        let terms = [SellerTerms::new(0, 0)];

        assert_eq!(
            Catalog::new(&[vec![Some(1)]], &[0], &terms, GBP).err(),
            Some(CatalogError::ZeroQuantity(0))
        );

        assert_eq!(
            Catalog::new(&[vec![Some(0)]], &[1], &terms, GBP).err(),
            Some(CatalogError::NonPositivePrice {
                product: 0,
                seller: SellerId(100),
                price: 0
            })
        );

        assert_eq!(
            Catalog::new(&[vec![Some(1)]], &[1], &[SellerTerms::new(-1, 0)], GBP).err(),
            Some(CatalogError::NegativeSellerTerm(SellerId(100)))
        );
    }

    #[test]
    fn money_uses_catalog_currency() -> TestResult {
        let catalog = two_product_catalog()?;

        assert_eq!(catalog.money(250), Money::from_minor(250, GBP));

        Ok(())
    }
}
