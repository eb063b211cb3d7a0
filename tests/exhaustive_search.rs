//! Integration tests for the exhaustive search over fixture catalogs.
//!
//! Fixture prices are whole pounds, so totals below are in pence.

use testresult::TestResult;

use cartsplit::{
    catalog::{PriceOffer, ProductId, SellerId},
    fixtures::Fixture,
    order::Order,
    search::{
        ExhaustiveSearch, Infeasibility, SearchError, SearchLimits, SearchOutcome, SearchReport,
    },
};

fn solve(set: &str) -> TestResult<(Fixture, SearchReport)> {
    let fixture = Fixture::from_set(set)?;
    let report = ExhaustiveSearch::new(fixture.catalog()).run()?;

    Ok((fixture, report))
}

fn found(report: &SearchReport) -> TestResult<&Order> {
    Ok(report.outcome.order().ok_or("expected an order")?)
}

#[test]
fn takes_orders() -> TestResult {
    let (_, report) = solve("takes_orders")?;
    let order = found(&report)?;

    assert_eq!(order.shipping_total().to_minor_units(), 1000);
    assert_eq!(order.product_total().to_minor_units(), 4000);
    assert_eq!(order.total().to_minor_units(), 5000);

    Ok(())
}

#[test]
fn chooses_best_seller() -> TestResult {
    let (_, report) = solve("cheapest_seller")?;

    assert_eq!(found(&report)?.total().to_minor_units(), 5000);
    assert_eq!(found(&report)?.sellers(), &[SellerId(102)]);

    Ok(())
}

#[test]
fn respects_minimum_order() -> TestResult {
    let (_, report) = solve("minimum_order")?;

    // 10 x 4 = 40 is below seller 102's minimum of 200, so seller 101 wins: 60 + 10.
    assert_eq!(found(&report)?.total().to_minor_units(), 7000);
    assert_eq!(found(&report)?.sellers(), &[SellerId(101)]);

    Ok(())
}

#[test]
fn considers_shipping() -> TestResult {
    let (_, report) = solve("shipping")?;

    assert_eq!(found(&report)?.total().to_minor_units(), 8000);
    assert_eq!(found(&report)?.sellers(), &[SellerId(101)]);

    Ok(())
}

#[test]
fn pricy_shipping_beats_splitting_over_many_sellers() -> TestResult {
    let (_, report) = solve("pricy_shipping")?;
    let order = found(&report)?;

    assert_eq!(order.shipping_total().to_minor_units(), 2000);
    assert_eq!(order.product_total().to_minor_units(), 3000);
    assert_eq!(order.total().to_minor_units(), 5000);
    assert_eq!(order.sellers(), &[SellerId(100)]);

    Ok(())
}

#[test]
fn minimum_order_can_override_unit_price() -> TestResult {
    let (_, report) = solve("hidden_minimum")?;
    let order = found(&report)?;

    assert_eq!(order.shipping_total().to_minor_units(), 5000);
    assert_eq!(order.product_total().to_minor_units(), 9000);
    assert_eq!(order.total().to_minor_units(), 14000);

    for product in 0..3 {
        assert_eq!(
            order.offer_for(ProductId(product)).map(PriceOffer::seller),
            Some(SellerId(100))
        );
    }

    Ok(())
}

#[test]
fn unstocked_product_has_no_order() -> TestResult {
    let (_, report) = solve("unstocked")?;

    assert_eq!(
        report.outcome,
        SearchOutcome::Infeasible(Infeasibility::UnstockedProduct(ProductId(1)))
    );

    Ok(())
}

#[test]
fn large_cart_respects_node_budget() -> TestResult {
    let fixture = Fixture::from_set("large")?;

    let result = ExhaustiveSearch::new(fixture.catalog())
        .with_limits(SearchLimits::with_max_nodes(10_000))
        .run();

    assert_eq!(
        result,
        Err(SearchError::NodeBudgetExhausted { visited: 10_000 })
    );

    Ok(())
}

#[test]
fn cheapest_order_matches_search_report() -> TestResult {
    let (fixture, report) = solve("pricy_shipping")?;

    let outcome = fixture.catalog().cheapest_order()?;

    assert_eq!(outcome, report.outcome);

    Ok(())
}
