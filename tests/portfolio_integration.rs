use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stock_advisor::{
    AdvisorConfig, Adjustment, EnrichedPosition, PortfolioSummary, Quote, RoundTo,
    SimulationSettings, StockPosition, index_quotes, merge_quotes, normalize_symbol,
    quotes_from_reader, summarize, to_multiple,
};
use std::collections::BTreeMap;

fn stock(symbol: &str, cost_price: Decimal, position: u64) -> StockPosition {
    StockPosition::new(symbol, symbol, cost_price, position)
}

fn merge_one(stock: StockPosition, price: Decimal) -> EnrichedPosition {
    let quotes = index_quotes([Quote::new(&stock.symbol, price)]);
    merge_quotes(&[stock], &quotes, &AdvisorConfig::default())
        .pop()
        .expect("one position")
}

#[test]
fn losing_position_gets_buy_more_advice() {
    let item = merge_one(stock("sh600036", dec!(10), 1000), dec!(8));

    assert_eq!(item.price, Some(dec!(8)));
    assert_eq!(item.earn_rate, Some(dec!(-0.2)));
    let adjustment = item.adjustment.as_ref().unwrap();
    assert!(adjustment.is_buy_more());
    assert_eq!(
        adjustment.formula().to_string(),
        "1-(8000.00+8x)/(10000.00+8x)"
    );

    let advice = item.advice.as_ref().expect("advice for a 20% loss");
    assert_eq!(advice.approximation.x, dec!(3800));
    assert_eq!(advice.approximation.target_value, dec!(0.05));
    assert_eq!(advice.approximation.step, dec!(100));
    assert_eq!(advice.amount, dec!(30400.00));
}

#[test]
fn small_loss_gets_no_advice() {
    let item = merge_one(stock("sz000651", dec!(10), 1000), dec!(9.5));
    assert!(matches!(item.adjustment, Some(Adjustment::BuyMore(_))));
    assert_eq!(item.earn_rate, Some(dec!(-0.05)));
    assert!(item.advice.is_none());
}

#[test]
fn equal_price_selects_reduce_formula() {
    let item = merge_one(stock("sh601012", dec!(10), 1000), dec!(10));
    assert!(matches!(item.adjustment, Some(Adjustment::Reduce(_))));
    assert_eq!(item.earn_rate, Some(Decimal::ZERO));
    assert!(item.advice.is_none());
}

#[test]
fn profitable_position_selects_reduce_formula() {
    let item = merge_one(stock("sh601012", dec!(10), 1000), dec!(12));
    let Some(Adjustment::Reduce(formula)) = &item.adjustment else {
        panic!("expected reduce formula");
    };
    assert_eq!(formula.to_string(), "(12000.00+12x)/(10000.00+12x)-1");
    assert_eq!(formula.eval(Decimal::ZERO).unwrap(), dec!(0.2));
}

#[test]
fn formula_branch_follows_strict_comparison() {
    let cases = [
        (dec!(10), dec!(9.99), true),
        (dec!(10), dec!(10), false),
        (dec!(10), dec!(10.01), false),
        (dec!(0.5), dec!(0.25), true),
    ];
    for (cost, price, buy_more) in cases {
        let item = merge_one(stock("sh600000", cost, 100), price);
        assert_eq!(
            item.adjustment.as_ref().map(Adjustment::is_buy_more),
            Some(buy_more),
            "cost {cost}, price {price}"
        );
    }
}

#[test]
fn zero_cost_price_is_not_computable() {
    let item = merge_one(stock("sh600000", Decimal::ZERO, 100), dec!(5));
    assert_eq!(item.earn_rate, None);
    assert!(item.advice.is_none());
    assert!(item.adjustment.is_some());
}

#[test]
fn unquoted_position_passes_through() {
    let stored = vec![stock("sh600036", dec!(10), 1000), stock("hk00700", dec!(300), 100)];
    let quotes = index_quotes([Quote::new("sh600036", dec!(11))]);
    let merged = merge_quotes(&stored, &quotes, &AdvisorConfig::default());

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[1], EnrichedPosition::unpriced(stored[1].clone()));
    assert_eq!(merged[1].stock, stored[1]);
    assert_eq!(merged[0].stock, stored[0]);
}

#[test]
fn quote_name_wins() {
    let stored = [stock("sh600036", dec!(10), 1000)];
    let quotes = index_quotes([Quote {
        symbol: "sh600036".to_string(),
        name: Some("招商银行".to_string()),
        price: dec!(11),
    }]);
    let merged = merge_quotes(&stored, &quotes, &AdvisorConfig::default());
    assert_eq!(merged[0].stock.name, "招商银行");
    assert_eq!(merged[0].stock.cost_price, dec!(10));
}

#[test]
fn custom_thresholds_change_advice() {
    let config = AdvisorConfig::new().advice_loss_rate(dec!(-0.01));
    let stored = [stock("sz000651", dec!(10), 1000)];
    let quotes = index_quotes([Quote::new("sz000651", dec!(9.5))]);
    let merged = merge_quotes(&stored, &quotes, &config);
    let advice = merged[0].advice.as_ref().expect("advice under custom threshold");
    assert!(advice.amount > Decimal::ZERO);
}

#[test]
fn exhausted_search_leaves_advice_empty() {
    let config = AdvisorConfig::new().cycle_count(0);
    let stored = [stock("loss", dec!(10), 1000), stock("gain", dec!(5), 200)];
    let quotes = index_quotes([Quote::new("loss", dec!(8)), Quote::new("gain", dec!(6))]);
    let merged = merge_quotes(&stored, &quotes, &config);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].price, Some(dec!(8)));
    assert_eq!(merged[0].earn_rate, Some(dec!(-0.2)));
    assert!(merged[0].adjustment.as_ref().is_some_and(Adjustment::is_buy_more));
    assert!(merged[0].advice.is_none());
    assert!(merged[1].advice.is_none());
}

#[test]
fn oversized_position_keeps_quote_without_formula() {
    let item = merge_one(
        stock("huge", dec!(20000000000), u64::MAX),
        dec!(10000000000),
    );

    assert_eq!(item.price, Some(dec!(10000000000)));
    assert_eq!(item.earn_rate, Some(dec!(-0.5)));
    assert!(item.adjustment.is_none());
    assert!(item.advice.is_none());
}

#[test]
fn summarize_empty_is_zero() {
    assert_eq!(summarize(&[]), PortfolioSummary::default());
    let unpriced = [EnrichedPosition::unpriced(stock("sh600036", dec!(10), 10))];
    assert_eq!(summarize(&unpriced), PortfolioSummary::default());
}

#[test]
fn summarize_uses_exact_decimal_totals() {
    let stored = vec![stock("a", dec!(10.00), 3000), stock("b", dec!(21.00), 1500)];
    let quotes = index_quotes([Quote::new("a", dec!(10.01)), Quote::new("b", dec!(20.03))]);
    let merged = merge_quotes(&stored, &quotes, &AdvisorConfig::default());
    let summary = summarize(&merged);

    assert_eq!(summary.market_value, dec!(60075.00));
    assert_eq!(summary.cost_value, dec!(61500.00));
    assert_eq!(summary.earn_money, dec!(-1425.00));
    assert_eq!(summary.earn_rate, dec!(-0.0232));
    assert_eq!(summary.advice.hot_money, Decimal::ZERO);

    assert_eq!(summary.earn.max_rate, dec!(0.001));
    assert_eq!(summary.earn.max_money, dec!(30.00));
    assert!(summary.earn.min_rate < Decimal::ZERO);
    assert_eq!(summary.earn.min_money, dec!(-1455.00));
    assert_eq!(summary.earn.max_abs_rate, summary.earn.min_rate.abs());

    // Порядок входных позиций не меняется.
    assert_eq!(merged[0].stock.symbol, "a");
    assert_eq!(merged[1].stock.symbol, "b");
}

#[test]
fn summarize_sums_advice_into_hot_money() {
    let stored = vec![stock("loss", dec!(10), 1000), stock("gain", dec!(5), 200)];
    let quotes = index_quotes([Quote::new("loss", dec!(8)), Quote::new("gain", dec!(6))]);
    let merged = merge_quotes(&stored, &quotes, &AdvisorConfig::default());
    let summary = summarize(&merged);

    assert_eq!(summary.advice.hot_money, dec!(30400.00));
    assert_eq!(summary.earn.min_rate, dec!(-0.2));
    assert_eq!(summary.earn.max_rate, dec!(0.2));
    assert_eq!(summary.earn.min_money, dec!(-2000.00));
    assert_eq!(summary.earn.max_money, dec!(200.00));
    assert_eq!(summary.earn.max_abs_rate, dec!(0.2));
}

#[test]
fn summarize_skips_positions_that_overflow_totals() {
    let big = merge_one(stock("big", dec!(4200000000), u64::MAX), dec!(4000000000));
    let market = Decimal::from(u64::MAX) * dec!(4000000000);
    let cost = Decimal::from(u64::MAX) * dec!(4200000000);
    assert!(big.adjustment.is_some());

    let summary = summarize(&[big.clone(), big]);
    assert_eq!(summary.market_value, market);
    assert_eq!(summary.cost_value, cost);
    assert_eq!(summary.earn_money, market - cost);
    assert_eq!(summary.earn.min_rate, summary.earn.max_rate);
}

#[test]
fn summarize_keeps_stable_order_for_equal_rates() {
    let stored = vec![stock("a", dec!(10), 100), stock("b", dec!(10), 300)];
    let quotes = index_quotes([Quote::new("a", dec!(11)), Quote::new("b", dec!(11))]);
    let merged = merge_quotes(&stored, &quotes, &AdvisorConfig::default());
    let summary = summarize(&merged);

    assert_eq!(summary.earn.min_money, dec!(100.00));
    assert_eq!(summary.earn.max_money, dec!(300.00));
}

#[test]
fn reads_quotes_as_list_or_map() {
    let list = r#"[{"symbol": "sh600036", "price": 36.8}, {"symbol": "sz000651", "name": "格力电器", "price": 40.1}]"#;
    let book = quotes_from_reader(list.as_bytes()).unwrap();
    assert_eq!(book.len(), 2);
    assert_eq!(book["sh600036"].price, dec!(36.8));
    assert_eq!(book["sz000651"].name.as_deref(), Some("格力电器"));

    let map = r#"{"0600036": {"symbol": "sh600036", "price": 37}}"#;
    let book = quotes_from_reader(map.as_bytes()).unwrap();
    assert_eq!(book["sh600036"].price, dec!(37));

    assert!(quotes_from_reader("not json".as_bytes()).is_err());
}

#[test]
fn enriched_position_serializes_with_formula_key() {
    let item = merge_one(stock("sh600036", dec!(10), 1000), dec!(8));
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["symbol"], "sh600036");
    assert_eq!(value["bcFn"], "1-(8000.00+8x)/(10000.00+8x)");
    assert!(value.get("jcFn").is_none());
    assert!(value.get("costPrice").is_some());
    assert!(value.get("earnRate").is_some());
    assert!(value["advice"].get("approValue").is_some());
    assert!(value["advice"].get("amount").is_some());

    let unpriced = serde_json::to_value(EnrichedPosition::unpriced(stock("x", dec!(1), 1))).unwrap();
    assert!(unpriced.get("advice").is_none());
    assert!(unpriced.get("bcFn").is_none());
}

#[test]
fn normalizes_exchange_codes() {
    assert_eq!(normalize_symbol("600036"), "0600036");
    assert_eq!(normalize_symbol("000651"), "1000651");
    assert_eq!(normalize_symbol("sh600036"), "0600036");
    assert_eq!(normalize_symbol("SZ000651"), "1000651");
    assert_eq!(normalize_symbol("us_aapl"), "US_AAPL");
    assert_eq!(normalize_symbol("hk00700"), "hk00700");
    assert_eq!(normalize_symbol(""), "");
}

#[test]
fn rounds_to_lot_multiples() {
    assert_eq!(to_multiple(dec!(7), dec!(5), RoundTo::default()), Some(dec!(10)));
    assert_eq!(to_multiple(dec!(10), dec!(5), RoundTo::Ceil), Some(dec!(10)));
    assert_eq!(to_multiple(dec!(7), dec!(5), RoundTo::Floor), Some(dec!(5)));
    assert_eq!(to_multiple(dec!(5), dec!(5), RoundTo::Floor), Some(dec!(5)));
    assert_eq!(to_multiple(dec!(7), Decimal::ZERO, RoundTo::Ceil), None);
}

#[test]
fn estimates_target_prices() {
    let position = StockPosition {
        pe: 10.0,
        eps: 2.5,
        profits: 1000.0,
        issue: 100.0,
        ..stock("sh600036", dec!(10), 100)
    };
    assert_eq!(position.target_price_by_profits(), Some(100.0));
    assert_eq!(position.target_price_by_eps(), 25.0);
    assert_eq!(stock("x", dec!(1), 1).target_price_by_profits(), None);
}

#[test]
fn simulation_settings_require_all_fields() {
    let mut form = BTreeMap::from([
        ("down_threshold".to_string(), 5.0),
        ("down_position".to_string(), 100.0),
        ("up_threshold".to_string(), 10.0),
        ("up_position".to_string(), 300.0),
        ("note".to_string(), 1.0),
    ]);
    let settings = SimulationSettings::from_flat(&form).unwrap();
    assert_eq!(settings.down.threshold, -0.05);
    assert_eq!(settings.down.position, 100.0);
    assert_eq!(settings.up.threshold, 0.1);
    assert_eq!(settings.up.position, -300.0);

    form.remove("up_position");
    assert!(SimulationSettings::from_flat(&form).is_err());
}
