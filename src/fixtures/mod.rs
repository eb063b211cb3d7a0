//! Fixtures
//!
//! Catalogs described in YAML. A fixture lists the sellers' terms and, per product, the
//! required quantity and one price entry per seller (`~` for not stocked):
//!
//! ```yaml
//! currency: GBP
//! sellers:
//!   - minimum_order: "0.20 GBP"
//!     shipping: "0.10 GBP"
//! products:
//!   - quantity: 4
//!     prices: ["0.10 GBP"]
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, SellerTerms};

pub mod prices;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A price is not in the fixture's currency
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// The fixture describes an invalid catalog
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Catalog as written in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// ISO currency code shared by every price in the fixture
    pub currency: String,

    /// Sellers, in id order
    pub sellers: Vec<SellerFixture>,

    /// Products, in id order
    pub products: Vec<ProductFixture>,
}

/// Seller terms as written in YAML
#[derive(Debug, Deserialize)]
pub struct SellerFixture {
    /// Minimum order value (e.g., "20.00 GBP")
    pub minimum_order: String,

    /// Flat shipping fee (e.g., "4.99 GBP")
    pub shipping: String,
}

/// Cart line as written in YAML
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Required quantity
    pub quantity: u32,

    /// Unit price per seller; `None` where the seller does not stock the product
    pub prices: Vec<Option<String>>,
}

impl TryFrom<CatalogFixture> for Catalog {
    type Error = FixtureError;

    fn try_from(fixture: CatalogFixture) -> Result<Self, Self::Error> {
        let currency = prices::parse_currency(&fixture.currency)?;

        let sellers = fixture
            .sellers
            .iter()
            .map(|seller| {
                Ok(SellerTerms::new(
                    prices::parse_price_in(&seller.minimum_order, currency)?,
                    prices::parse_price_in(&seller.shipping, currency)?,
                ))
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        let rows = fixture
            .products
            .iter()
            .map(|product| {
                product
                    .prices
                    .iter()
                    .map(|price| {
                        price
                            .as_deref()
                            .map(|price| prices::parse_price_in(price, currency))
                            .transpose()
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let quantities: Vec<u32> = fixture
            .products
            .iter()
            .map(|product| product.quantity)
            .collect();

        Ok(Catalog::new(&rows, &quantities, &sellers, currency)?)
    }
}

/// A catalog loaded from a fixture file
#[derive(Debug)]
pub struct Fixture {
    /// Where the fixture was loaded from, if it came from a file
    path: Option<PathBuf>,

    catalog: Catalog,
}

impl Fixture {
    /// Base path for named fixture sets
    pub const BASE_PATH: &'static str = "./fixtures";

    /// Load the named fixture set from [`Fixture::BASE_PATH`].
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture file cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_path(Path::new(Self::BASE_PATH).join(format!("{name}.yml")))
    }

    /// Load a fixture from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or describes an invalid catalog.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let path = path.into();
        let contents = fs::read_to_string(&path)?;

        let mut fixture = Self::from_yaml(&contents)?;
        fixture.path = Some(path);

        Ok(fixture)
    }

    /// Parse a fixture from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or describes an invalid catalog.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        Ok(Self {
            path: None,
            catalog: fixture.try_into()?,
        })
    }

    /// File the fixture was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The loaded catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Consume the fixture, returning its catalog
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }
}
