//! cartsplit
//!
//! Loads a catalog fixture, plans the order with the chosen strategy and prints the result.
//!
//! Use `-f` to point at a fixture file
//! Use `-s relaxed` to solve the continuous relaxation instead of enumerating orders
//! Use `--max-nodes` to bound the exhaustive search

use std::{
    io::{self, Write},
    time::Instant,
};

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cartsplit::{
    catalog::Catalog,
    cli::{PlanArgs, Strategy},
    fixtures::Fixture,
    logging::init_subscriber,
    relaxation::{GoodLpSolver, LinearRelaxation, LpOutcome},
    search::{ExhaustiveSearch, SearchLimits, SearchOutcome},
};

/// cartsplit entry point
pub fn main() -> Result<()> {
    let args = PlanArgs::parse();

    init_subscriber(&args.logging)?;

    let fixture = Fixture::from_path(&args.fixture)?;
    let catalog = fixture.catalog();

    info!(
        fixture = %args.fixture.display(),
        products = catalog.product_count(),
        sellers = catalog.seller_count(),
        offers = catalog.offers().len(),
        "loaded catalog"
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let start = Instant::now();

    match args.strategy {
        Strategy::Exhaustive => {
            let limits = SearchLimits {
                max_nodes: args.max_nodes,
            };

            let report = ExhaustiveSearch::new(catalog).with_limits(limits).run()?;

            match &report.outcome {
                SearchOutcome::Found(order) => order.write_to(&mut handle, catalog)?,
                SearchOutcome::Infeasible(reason) => {
                    writeln!(handle, "\nNo feasible order: {reason:?}")?;
                }
            }

            writeln!(
                handle,
                " Nodes: {} ({} complete, {} below a minimum order)",
                report.stats.nodes, report.stats.complete, report.stats.below_minimum
            )?;
        }
        Strategy::Relaxed => {
            let relaxation = LinearRelaxation::formulate(catalog)?;
            let outcome = relaxation.solve_with(&GoodLpSolver)?;

            write_relaxed(&mut handle, catalog, &relaxation, &outcome)?;
        }
    }

    writeln!(handle, " Solved in {}s", start.elapsed().as_secs_f32())?;

    Ok(())
}

fn write_relaxed(
    out: &mut impl Write,
    catalog: &Catalog,
    relaxation: &LinearRelaxation,
    outcome: &LpOutcome,
) -> Result<()> {
    let solution = match outcome {
        LpOutcome::Optimal(solution) => solution,
        LpOutcome::Infeasible => {
            writeln!(out, "\nRelaxation is infeasible")?;
            return Ok(());
        }
        LpOutcome::Unbounded => {
            writeln!(out, "\nRelaxation is unbounded")?;
            return Ok(());
        }
    };

    writeln!(out, "\nFractional allocation (shipping excluded):")?;

    for product in catalog.products() {
        for seller in catalog.sellers() {
            let quantity = relaxation
                .variable_index(product.id(), seller.id())
                .and_then(|index| solution.point.get(index))
                .copied()
                .unwrap_or_default();

            if quantity > 1e-9 {
                writeln!(out, " {} <- {}: {quantity:.3}", product.id(), seller.id())?;
            }
        }
    }

    writeln!(
        out,
        " Objective: {:.2} minor units of {}",
        solution.objective,
        catalog.currency().iso_alpha_code
    )?;

    Ok(())
}
