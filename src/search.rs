//! Exhaustive Search
//!
//! Depth-first enumeration of every single-seller-per-product assignment. Products are
//! visited in ascending id order and each product's offers in the order the catalog
//! recorded them. The cheapest complete assignment that satisfies every seller's minimum
//! order wins; on equal totals the first one found is kept.
//!
//! The number of assignments is the product of the per-product offer counts, so this is
//! only practical for small carts. [`SearchLimits`] bounds the work done.

use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, PriceOffer, ProductId, ProductOffers},
    evaluation::{EvaluationError, evaluate, is_valid},
    order::Order,
};

/// Errors that abort a search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The node budget ran out before the search space was exhausted.
    #[error("search stopped after visiting {visited} nodes (budget exhausted)")]
    NodeBudgetExhausted {
        /// Nodes visited before stopping
        visited: u64,
    },

    /// Wrapped evaluation error.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Why no order could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasibility {
    /// No seller stocks this product, so the cart can never be filled.
    UnstockedProduct(ProductId),

    /// Every complete assignment breaks at least one seller's minimum order.
    NoValidCombination,
}

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The cheapest valid order.
    Found(Box<Order>),

    /// No valid order exists.
    Infeasible(Infeasibility),
}

impl SearchOutcome {
    /// The order found, if any
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Found(order) => Some(order.as_ref()),
            Self::Infeasible(_) => None,
        }
    }

    /// Consume the outcome, returning the order found, if any
    pub fn into_order(self) -> Option<Order> {
        match self {
            Self::Found(order) => Some(*order),
            Self::Infeasible(_) => None,
        }
    }
}

/// Counters collected while searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Recursive calls made, including the root
    pub nodes: u64,

    /// Complete assignments examined
    pub complete: u64,

    /// Complete assignments rejected by a seller's minimum order
    pub below_minimum: u64,

    /// Times the best order was replaced by a strictly cheaper one
    pub improvements: u64,
}

/// Outcome of a search together with its counters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// What the search found
    pub outcome: SearchOutcome,

    /// Work done to find it
    pub stats: SearchStats,
}

/// Bounds on the work a search may do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of nodes to visit; unlimited if `None`
    pub max_nodes: Option<u64>,
}

impl SearchLimits {
    /// No limits
    pub const fn unlimited() -> Self {
        Self { max_nodes: None }
    }

    /// Stop after visiting `max_nodes` nodes
    pub const fn with_max_nodes(max_nodes: u64) -> Self {
        Self {
            max_nodes: Some(max_nodes),
        }
    }
}

/// Cheapest complete assignment seen so far.
#[derive(Debug)]
struct Best<'c> {
    total: i64,
    offers: SmallVec<[&'c PriceOffer; 16]>,
}

/// Brute-force search for the cheapest valid order.
#[derive(Debug)]
pub struct ExhaustiveSearch<'c> {
    catalog: &'c Catalog,

    /// Offers per product, indexed by depth
    legs: Vec<ProductOffers<'c>>,

    limits: SearchLimits,
}

impl<'c> ExhaustiveSearch<'c> {
    /// Prepare a search over `catalog` with no limits.
    pub fn new(catalog: &'c Catalog) -> Self {
        let legs = catalog
            .products()
            .iter()
            .map(|product| catalog.offers_for(product.id()))
            .collect();

        Self {
            catalog,
            legs,
            limits: SearchLimits::unlimited(),
        }
    }

    /// Set the limits for this search.
    #[must_use]
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Run the search.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the node budget runs out or an offer cannot be evaluated.
    pub fn run(&self) -> Result<SearchReport, SearchError> {
        let mut stats = SearchStats::default();

        // A product nobody stocks empties every branch below it.
        if let Some(product) = self.unstocked_product() {
            info!(%product, "product is not stocked by any seller");

            return Ok(SearchReport {
                outcome: SearchOutcome::Infeasible(Infeasibility::UnstockedProduct(product)),
                stats,
            });
        }

        let mut assignment: SmallVec<[&'c PriceOffer; 16]> =
            SmallVec::with_capacity(self.legs.len());
        let mut best: Option<Best<'c>> = None;

        self.crunch(&mut assignment, &mut best, &mut stats)?;

        let outcome = match best {
            Some(best) => {
                let evaluation = evaluate(self.catalog, &best.offers)?;

                SearchOutcome::Found(Box::new(Order::from_parts(
                    &best.offers,
                    evaluation,
                    self.catalog.currency(),
                )))
            }
            None => SearchOutcome::Infeasible(Infeasibility::NoValidCombination),
        };

        info!(
            nodes = stats.nodes,
            complete = stats.complete,
            below_minimum = stats.below_minimum,
            improvements = stats.improvements,
            found = outcome.order().is_some(),
            "exhaustive search finished"
        );

        Ok(SearchReport { outcome, stats })
    }

    fn unstocked_product(&self) -> Option<ProductId> {
        self.catalog
            .products()
            .iter()
            .zip(&self.legs)
            .find(|(_, offers)| offers.is_empty())
            .map(|(product, _)| product.id())
    }

    /// Extend `assignment` with each offer for the next product and recurse.
    ///
    /// `assignment` is restored to its length on entry before returning, so sibling
    /// branches never see each other's choices.
    fn crunch(
        &self,
        assignment: &mut SmallVec<[&'c PriceOffer; 16]>,
        best: &mut Option<Best<'c>>,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError> {
        stats.nodes += 1;

        if self
            .limits
            .max_nodes
            .is_some_and(|max_nodes| stats.nodes > max_nodes)
        {
            return Err(SearchError::NodeBudgetExhausted {
                visited: stats.nodes - 1,
            });
        }

        let Some(offers) = self.legs.get(assignment.len()) else {
            return self.save_if_cheapest(assignment, best, stats);
        };

        for &offer in offers {
            assignment.push(offer);
            let result = self.crunch(assignment, best, stats);
            assignment.pop();

            result?;
        }

        Ok(())
    }

    fn save_if_cheapest(
        &self,
        assignment: &[&'c PriceOffer],
        best: &mut Option<Best<'c>>,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError> {
        stats.complete += 1;

        if !is_valid(self.catalog, assignment)? {
            stats.below_minimum += 1;
            return Ok(());
        }

        let total = evaluate(self.catalog, assignment)?.total();

        if best.as_ref().is_some_and(|best| best.total <= total) {
            return Ok(());
        }

        debug!(total, complete = stats.complete, "found cheaper order");

        stats.improvements += 1;

        *best = Some(Best {
            total,
            offers: assignment.iter().copied().collect(),
        });

        Ok(())
    }
}

impl Catalog {
    /// Find the cheapest valid order with an unlimited exhaustive search.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if an offer cannot be evaluated.
    pub fn cheapest_order(&self) -> Result<SearchOutcome, SearchError> {
        Ok(ExhaustiveSearch::new(self).run()?.outcome)
    }
}
