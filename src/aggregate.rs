//! Слияние хранимых позиций с котировками и сводка по портфелю.

use crate::approx::SearchOptions;
use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::formula::Expr;
use crate::types::{
    Adjustment, Advice, EnrichedPosition, Money, PortfolioSummary, Quote, QuoteBook, Rate,
    StockPosition,
};
use crate::utils::{round_fixed, round_money};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// Котировки приходят списком или объектом с произвольными ключами.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuotePayload {
    List(Vec<Quote>),
    Map(BTreeMap<String, Quote>),
}

/// Индексирует котировки по тикеру; при повторе побеждает последняя.
pub fn index_quotes<I>(quotes: I) -> QuoteBook
where
    I: IntoIterator<Item = Quote>,
{
    quotes
        .into_iter()
        .map(|quote| (quote.symbol.clone(), quote))
        .collect()
}

/// Читает котировки в JSON из произвольного `Read`.
pub fn quotes_from_reader<R: Read>(reader: R) -> Result<QuoteBook, AdvisorError> {
    let book = match serde_json::from_reader(reader)? {
        QuotePayload::List(quotes) => index_quotes(quotes),
        QuotePayload::Map(quotes) => index_quotes(quotes.into_values()),
    };
    Ok(book)
}

/// Дополняет позиции котировками, доходностью, формулами и советами.
///
/// Позиции без котировки возвращаются без изменений, порядок сохраняется.
pub fn merge_quotes(
    stored: &[StockPosition],
    quotes: &QuoteBook,
    config: &AdvisorConfig,
) -> Vec<EnrichedPosition> {
    stored
        .iter()
        .map(|stock| match quotes.get(&stock.symbol) {
            Some(quote) => enrich(stock, quote, config),
            None => {
                log::debug!("no quote for {}, passed through", stock.symbol);
                EnrichedPosition::unpriced(stock.clone())
            }
        })
        .collect()
}

/// Рассчитывает производные поля одной позиции по котировке.
pub fn enrich(stock: &StockPosition, quote: &Quote, config: &AdvisorConfig) -> EnrichedPosition {
    let mut stock = stock.clone();
    if let Some(name) = &quote.name {
        stock.name.clone_from(name);
    }

    let price = quote.price;
    let earn_rate = earn_rate(stock.cost_price, price);
    let adjustment = adjustment_formula(stock.cost_price, price, stock.position);
    if adjustment.is_none() {
        log::warn!("{}: position value overflows, no formula", stock.symbol);
    }

    let advice = match (earn_rate, &adjustment) {
        (Some(rate), Some(adjustment)) if rate < config.advice_loss_rate => {
            advise(&stock.symbol, adjustment.formula(), price, config)
        }
        _ => None,
    };

    EnrichedPosition {
        stock,
        price: Some(price),
        earn_rate,
        adjustment,
        advice,
    }
}

/// `price / cost_price - 1`; при нулевой цене покупки не вычисляется.
pub fn earn_rate(cost_price: Money, price: Money) -> Option<Rate> {
    price.checked_div(cost_price)?.checked_sub(Decimal::ONE)
}

/// Строит формулу доходности после сделки на `x` акций по текущей цене.
///
/// Цена ниже средней даёт формулу докупки
/// `1-(market+price*x)/(cost+price*x)`, иначе формулу сокращения
/// `(market+price*x)/(cost+price*x)-1`. Стоимости округлены до копеек;
/// `None`, если они не помещаются в `Decimal`.
pub fn adjustment_formula(cost_price: Money, price: Money, position: u64) -> Option<Adjustment> {
    let shares = Decimal::from(position);
    let market = round_money(shares.checked_mul(price)?);
    let cost = round_money(cost_price.checked_mul(shares)?);
    let coefficient = price.normalize();

    let numerator = Expr::constant(market) + Expr::constant(coefficient) * Expr::var();
    let denominator = Expr::constant(cost) + Expr::constant(coefficient) * Expr::var();
    let ratio = numerator / denominator;

    let adjustment = if cost_price > price {
        Adjustment::BuyMore(Expr::constant(Decimal::ONE) - ratio)
    } else {
        Adjustment::Reduce(ratio - Expr::constant(Decimal::ONE))
    };
    Some(adjustment)
}

fn advise(symbol: &str, formula: &Expr, price: Money, config: &AdvisorConfig) -> Option<Advice> {
    let options = SearchOptions::new()
        .step(config.advice_step)
        .cycle_count(config.cycle_count);

    match formula.find_approx(-config.expect_loss_rate, options) {
        Ok(approximation) => {
            let Some(amount) = approximation.x.checked_mul(price).map(round_money) else {
                log::warn!("{symbol}: advice amount overflows, skipped");
                return None;
            };
            log::debug!("{symbol}: advice x = {}, amount {amount}", approximation.x);
            Some(Advice {
                approximation,
                amount,
            })
        }
        Err(err) => {
            log::warn!("{symbol}: no advice available: {err}");
            None
        }
    }
}

/// Считает сводку по портфелю.
///
/// Учитываются только позиции с котировкой. Крайние значения доходности
/// берутся из отсортированной копии, входной срез не меняется. Позиция,
/// на которой суммы переполняют `Decimal`, пропускается целиком.
pub fn summarize(positions: &[EnrichedPosition]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    let mut rated: Vec<(Rate, Money)> = Vec::with_capacity(positions.len());

    for item in positions {
        if item.price.is_none() {
            continue;
        }
        let Some(totals) = accumulate(&summary, item) else {
            log::warn!("{}: position overflows summary totals, skipped", item.stock.symbol);
            continue;
        };
        summary.market_value = totals.market_value;
        summary.cost_value = totals.cost_value;
        summary.earn_money = totals.earn_money;
        summary.advice.hot_money = totals.hot_money;
        rated.extend(totals.rated);
    }

    if let Some(rate) = summary
        .market_value
        .checked_div(summary.cost_value)
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
    {
        summary.earn_rate = round_fixed(rate, 4);
    }

    rated.sort_by_key(|&(rate, _)| rate);
    if let (Some(&(min_rate, min_money)), Some(&(max_rate, max_money))) =
        (rated.first(), rated.last())
    {
        summary.earn.min_rate = min_rate;
        summary.earn.max_rate = max_rate;
        summary.earn.min_money = min_money;
        summary.earn.max_money = max_money;
        summary.earn.max_abs_rate = min_rate.abs().max(max_rate.abs());
    }

    log::debug!(
        "summary over {} priced positions: market {}, cost {}",
        rated.len(),
        summary.market_value,
        summary.cost_value
    );
    summary
}

/// Итоги сводки с учётом ещё одной позиции.
struct Totals {
    market_value: Money,
    cost_value: Money,
    earn_money: Money,
    hot_money: Money,
    rated: Option<(Rate, Money)>,
}

fn accumulate(summary: &PortfolioSummary, item: &EnrichedPosition) -> Option<Totals> {
    let price = item.price?;
    let shares = Decimal::from(item.stock.position);
    let market_value = summary
        .market_value
        .checked_add(price.checked_mul(shares)?)?;
    let cost_value = summary
        .cost_value
        .checked_add(item.stock.cost_price.checked_mul(shares)?)?;
    let earn_money = market_value.checked_sub(cost_value)?;
    let hot_money = match &item.advice {
        Some(advice) => summary.advice.hot_money.checked_add(advice.amount)?,
        None => summary.advice.hot_money,
    };
    let rated = match item.earn_rate {
        Some(rate) => Some((rate, position_result(rate, item)?)),
        None => None,
    };
    Some(Totals {
        market_value,
        cost_value,
        earn_money,
        hot_money,
        rated,
    })
}

fn position_result(rate: Rate, item: &EnrichedPosition) -> Option<Money> {
    rate.checked_mul(item.stock.cost_price)?
        .checked_mul(Decimal::from(item.stock.position))
        .map(round_money)
}
