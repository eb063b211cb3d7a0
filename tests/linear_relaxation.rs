//! Integration tests for the linear relaxation solved through `good_lp`.

use testresult::TestResult;

use cartsplit::{
    catalog::{ProductId, SellerId},
    fixtures::Fixture,
    relaxation::{GoodLpSolver, LinearRelaxation, LpOutcome, LpSolution},
};

const TOLERANCE: f64 = 1e-6;

fn optimal(outcome: LpOutcome) -> TestResult<LpSolution> {
    match outcome {
        LpOutcome::Optimal(solution) => Ok(solution),
        other @ (LpOutcome::Infeasible | LpOutcome::Unbounded) => {
            Err(format!("expected an optimal solution, got {other:?}").into())
        }
    }
}

#[test]
fn covers_every_product_quantity() -> TestResult {
    let fixture = Fixture::from_set("large")?;
    let catalog = fixture.catalog();

    let relaxation = LinearRelaxation::formulate(catalog)?;
    let solution = optimal(relaxation.solve_with(&GoodLpSolver)?)?;

    for product in catalog.products() {
        let covered: f64 = catalog
            .sellers()
            .iter()
            .filter_map(|seller| relaxation.variable_index(product.id(), seller.id()))
            .filter_map(|index| solution.point.get(index))
            .sum();

        assert!((covered - f64::from(product.quantity())).abs() < TOLERANCE);
    }

    Ok(())
}

#[test]
fn never_allocates_unstocked_pairs() -> TestResult {
    // Seller 100 does not stock product 0; its zero objective coefficient must not attract
    // any allocation.
    let fixture = Fixture::from_yaml(
        r#"
currency: GBP
sellers:
  - minimum_order: "0 GBP"
    shipping: "1 GBP"
  - minimum_order: "0 GBP"
    shipping: "1 GBP"
products:
  - quantity: 3
    prices: [~, "5 GBP"]
  - quantity: 1
    prices: ["1 GBP", "2 GBP"]
"#,
    )?;
    let catalog = fixture.catalog();

    let relaxation = LinearRelaxation::formulate(catalog)?;
    let solution = optimal(relaxation.solve_with(&GoodLpSolver)?)?;

    let unstocked = relaxation
        .variable_index(ProductId(0), SellerId(100))
        .ok_or("missing variable")?;

    assert!(solution.point.get(unstocked).is_some_and(|x| x.abs() < TOLERANCE));
    assert!((solution.objective - 1600.0).abs() < TOLERANCE);

    Ok(())
}

#[test]
fn requires_every_sellers_minimum() -> TestResult {
    // Seller 102's minimum of 200 can never be met by a cart worth at most 80.
    let fixture = Fixture::from_set("minimum_order")?;

    let outcome = LinearRelaxation::formulate(fixture.catalog())?.solve_with(&GoodLpSolver)?;

    assert_eq!(outcome, LpOutcome::Infeasible);

    Ok(())
}

#[test]
fn unconstrained_sellers_give_cheapest_unit_prices() -> TestResult {
    // With no minimums every product goes to its cheapest seller: 9 units at 10 and 9 at 50.
    let fixture = Fixture::from_set("large")?;

    let relaxation = LinearRelaxation::formulate(fixture.catalog())?;
    let solution = optimal(relaxation.solve_with(&GoodLpSolver)?)?;

    assert!((solution.objective - 54_000.0).abs() < TOLERANCE);

    Ok(())
}
