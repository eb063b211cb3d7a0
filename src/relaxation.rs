//! Linear Relaxation
//!
//! Continuous relaxation of the sourcing problem. Decision variable `x[i][j]` is the
//! (possibly fractional) quantity of product `i` bought from seller `j`, flattened
//! product-major to index `i * sellers + j`.
//!
//! This is a different problem from the exhaustive search: a product may be split across
//! sellers, shipping is not part of the objective, and every seller's minimum order applies
//! whether or not the seller ends up being used. It gives a scalable approximation, not an
//! exact answer, and its fractional point is never turned back into an
//! [`Order`](crate::order::Order).

use good_lp::{Expression, ProblemVariables, ResolutionError, Solution, SolverModel, variable};
use num_traits::ToPrimitive;
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::catalog::{Catalog, ProductId, SellerId};

/// Errors that can occur while formulating the relaxation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelaxationError {
    /// Money amount in minor units cannot be represented exactly as a solver coefficient.
    #[error(
        "money amount in minor units cannot be represented exactly as a solver coefficient: {minor_units}"
    )]
    NotRepresentable {
        /// Money amount in minor units
        minor_units: i64,
    },
}

/// Errors reported by the `good_lp` backend other than infeasibility or unboundedness.
#[derive(Debug, Error)]
pub enum LpError {
    /// Wrapped solver resolution error
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// A system of linear constraints, one dense row per constraint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstraintSystem {
    rows: Vec<Vec<f64>>,
    rhs: Vec<f64>,
}

impl ConstraintSystem {
    /// Coefficient rows
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Right-hand side, one value per row
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// Number of constraints
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no constraints
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over `(row, rhs)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        self.rows
            .iter()
            .map(Vec::as_slice)
            .zip(self.rhs.iter().copied())
    }

    fn push(&mut self, row: Vec<f64>, rhs: f64) {
        self.rows.push(row);
        self.rhs.push(rhs);
    }
}

/// Lower and upper bound of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    /// Lower bound
    pub lower: f64,

    /// Upper bound; unbounded if `None`
    pub upper: Option<f64>,
}

impl Bound {
    /// `x >= 0`
    pub const NON_NEGATIVE: Self = Self {
        lower: 0.0,
        upper: None,
    };

    /// `x == 0`, used for products a seller does not stock
    pub const ZERO: Self = Self {
        lower: 0.0,
        upper: Some(0.0),
    };
}

/// An optimal point of the relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// Value of every decision variable, in variable index order
    pub point: Vec<f64>,

    /// Objective value at `point`, in minor units
    pub objective: f64,
}

/// What the LP solver reported.
#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    /// An optimal feasible point was found.
    Optimal(LpSolution),

    /// No point satisfies every constraint.
    Infeasible,

    /// The objective can decrease without limit.
    Unbounded,
}

/// External linear program solver.
pub trait LpSolver {
    /// Errors the solver reports besides infeasibility and unboundedness
    type Error;

    /// Minimise the relaxation's objective subject to its constraints and bounds.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the solver fails for a reason other than the problem being
    /// infeasible or unbounded.
    fn solve(&self, relaxation: &LinearRelaxation) -> Result<LpOutcome, Self::Error>;
}

/// The sourcing problem in standard LP form: minimise `c.x` subject to `A_ub.x <= b_ub`,
/// `A_eq.x == b_eq` and per-variable bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRelaxation {
    products: usize,
    sellers: usize,
    objective: Vec<f64>,
    inequalities: ConstraintSystem,
    equalities: ConstraintSystem,
    bounds: Vec<Bound>,
}

impl LinearRelaxation {
    /// Build the relaxation of `catalog`.
    ///
    /// # Errors
    ///
    /// Returns a [`RelaxationError`] if a money amount cannot be represented exactly as an
    /// `f64` coefficient.
    pub fn formulate(catalog: &Catalog) -> Result<Self, RelaxationError> {
        let products = catalog.product_count();
        let sellers = catalog.seller_count();

        // Unit price per variable; `None` where the seller does not stock the product.
        let prices = catalog
            .products()
            .iter()
            .flat_map(|product| {
                catalog
                    .sellers()
                    .iter()
                    .map(move |seller| catalog.unit_price(product.id(), seller.id()))
            })
            .map(|price| price.map(minor_units_to_f64).transpose())
            .collect::<Result<Vec<Option<f64>>, _>>()?;

        let objective = prices.iter().map(|price| price.unwrap_or(0.0)).collect();

        // Each product's quantity must be covered exactly.
        let mut equalities = ConstraintSystem::default();

        for (i, product) in catalog.products().iter().enumerate() {
            let row = (0..prices.len())
                .map(|k| if k / sellers == i { 1.0 } else { 0.0 })
                .collect();

            equalities.push(row, f64::from(product.quantity()));
        }

        // Each seller's minimum order, negated into `<=` form.
        let mut inequalities = ConstraintSystem::default();

        for (j, seller) in catalog.sellers().iter().enumerate() {
            let row = prices
                .iter()
                .enumerate()
                .map(|(k, price)| match price {
                    Some(price) if k % sellers == j => -price,
                    _ => 0.0,
                })
                .collect();

            inequalities.push(row, -minor_units_to_f64(seller.minimum_order())?);
        }

        let bounds = prices
            .iter()
            .map(|price| {
                if price.is_some() {
                    Bound::NON_NEGATIVE
                } else {
                    Bound::ZERO
                }
            })
            .collect();

        debug!(
            products,
            sellers,
            variables = prices.len(),
            "formulated linear relaxation"
        );

        Ok(Self {
            products,
            sellers,
            objective,
            inequalities,
            equalities,
            bounds,
        })
    }

    /// Hand the relaxation to `solver` and return its result unchanged.
    ///
    /// # Errors
    ///
    /// Returns the solver's error if it fails.
    pub fn solve_with<S: LpSolver>(&self, solver: &S) -> Result<LpOutcome, S::Error> {
        solver.solve(self)
    }

    /// Number of decision variables
    pub fn variable_count(&self) -> usize {
        self.products * self.sellers
    }

    /// Index of the variable for buying `product` from `seller`.
    pub fn variable_index(&self, product: ProductId, seller: SellerId) -> Option<usize> {
        let j = seller.position().filter(|&j| j < self.sellers)?;

        (product.0 < self.products).then(|| product.0 * self.sellers + j)
    }

    /// Objective coefficients (unit prices)
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    /// Negated seller minimum-order constraints, one row per seller
    pub fn inequalities(&self) -> &ConstraintSystem {
        &self.inequalities
    }

    /// Product coverage constraints, one row per product
    pub fn equalities(&self) -> &ConstraintSystem {
        &self.equalities
    }

    /// Bounds, one per variable
    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }
}

/// [`LpSolver`] backed by `good_lp` (`microlp` by default, `HiGHS` with `solver-highs`).
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl LpSolver for GoodLpSolver {
    type Error = LpError;

    fn solve(&self, relaxation: &LinearRelaxation) -> Result<LpOutcome, LpError> {
        let mut vars = ProblemVariables::new();

        let x: Vec<_> = relaxation
            .bounds()
            .iter()
            .map(|bound| {
                let definition = variable().min(bound.lower);

                vars.add(match bound.upper {
                    Some(upper) => definition.max(upper),
                    None => definition,
                })
            })
            .collect();

        let linear = |row: &[f64]| {
            x.iter()
                .zip(row)
                .filter(|&(_, &coefficient)| coefficient != 0.0)
                .fold(Expression::default(), |mut expression, (&var, &coefficient)| {
                    expression += var * coefficient;
                    expression
                })
        };

        let mut model = vars
            .minimise(linear(relaxation.objective()))
            .using(default_solver);

        // Rows without any coefficient are decided here; an empty row that cannot hold
        // makes the whole problem infeasible.
        for (row, rhs) in relaxation.inequalities().iter() {
            if is_zero_row(row) {
                if rhs < 0.0 {
                    return Ok(LpOutcome::Infeasible);
                }
                continue;
            }

            model = model.with(linear(row).leq(rhs));
        }

        for (row, rhs) in relaxation.equalities().iter() {
            if is_zero_row(row) {
                if rhs != 0.0 {
                    return Ok(LpOutcome::Infeasible);
                }
                continue;
            }

            model = model.with(linear(row).eq(rhs));
        }

        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => return Ok(LpOutcome::Infeasible),
            Err(ResolutionError::Unbounded) => return Ok(LpOutcome::Unbounded),
            Err(err) => return Err(err.into()),
        };

        let point: Vec<f64> = x.iter().map(|&var| solution.value(var)).collect();

        let objective = point
            .iter()
            .zip(relaxation.objective())
            .map(|(value, coefficient)| value * coefficient)
            .sum();

        debug!(objective, "linear relaxation solved");

        Ok(LpOutcome::Optimal(LpSolution { point, objective }))
    }
}

fn is_zero_row(row: &[f64]) -> bool {
    row.iter().all(|&coefficient| coefficient == 0.0)
}

/// Convert minor units to an `f64` solver coefficient.
///
/// `good_lp` stores coefficients as `f64`. Only integers with absolute value <= 2^53 can be
/// represented exactly, so anything larger is rejected rather than silently rounded.
fn minor_units_to_f64(minor_units: i64) -> Result<f64, RelaxationError> {
    minor_units
        .to_f64()
        .filter(|coefficient| coefficient.to_i64() == Some(minor_units))
        .ok_or(RelaxationError::NotRepresentable { minor_units })
}
