//! cartsplit prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{
        Catalog, CatalogError, PriceOffer, Product, ProductId, SELLER_ID_OFFSET, Seller,
        SellerId, SellerTerms,
    },
    evaluation::{Evaluation, EvaluationError, evaluate, is_valid},
    fixtures::{Fixture, FixtureError},
    order::{Order, OrderError},
    relaxation::{
        Bound, ConstraintSystem, GoodLpSolver, LinearRelaxation, LpError, LpOutcome, LpSolution,
        LpSolver, RelaxationError,
    },
    search::{
        ExhaustiveSearch, Infeasibility, SearchError, SearchLimits, SearchOutcome, SearchReport,
        SearchStats,
    },
};
