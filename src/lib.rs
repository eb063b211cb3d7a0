//! cartsplit
//!
//! cartsplit finds the cheapest way to buy a cart of products when every product can come
//! from one of several sellers, each seller charges flat shipping once it is used, and each
//! seller only accepts orders above a minimum value.
//!
//! Two strategies consume the same [`catalog::Catalog`]:
//!
//! - [`search::ExhaustiveSearch`] enumerates every single-seller-per-product order and
//!   returns the cheapest one that meets every seller's minimum.
//! - [`relaxation::LinearRelaxation`] formulates a continuous relaxation (no shipping,
//!   products may be split) and hands it to an [`relaxation::LpSolver`].

pub mod catalog;
pub mod cli;
pub mod evaluation;
pub mod fixtures;
pub mod logging;
pub mod order;
pub mod prelude;
pub mod relaxation;
pub mod search;
