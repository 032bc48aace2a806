//! Вспомогательные функции: округление денег, коды бирж, кратность лотам.

use crate::types::Money;
use rust_decimal::{Decimal, RoundingStrategy};

/// Округляет до `dp` знаков (половина от нуля) и фиксирует масштаб.
pub(crate) fn round_fixed(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

/// Округляет денежное значение до копеек.
#[inline]
pub(crate) fn round_money(value: Money) -> Money {
    round_fixed(value, 2)
}

/// Переводит код бумаги в формат источника котировок.
///
/// Американские коды (`us_`) приводятся к верхнему регистру, гонконгские
/// (`hk`) не меняются, префиксы `sz`/`sh` заменяются на `1`/`0`. Код из
/// одних цифр получает префикс `0` для Шанхая (начинается с `6`) и `1`
/// для Шэньчжэня.
///
/// ```
/// # use stock_advisor::normalize_symbol;
/// assert_eq!(normalize_symbol("600036"), "0600036");
/// assert_eq!(normalize_symbol("sz000651"), "1000651");
/// assert_eq!(normalize_symbol("us_aapl"), "US_AAPL");
/// ```
pub fn normalize_symbol(code: &str) -> String {
    match code.chars().next() {
        Some(first) if first.is_ascii_digit() => {
            let prefix = if first == '6' { '0' } else { '1' };
            format!("{prefix}{code}")
        }
        _ => {
            if code.to_lowercase().contains("us_") {
                code.to_uppercase()
            } else if code.contains("hk") {
                code.to_string()
            } else {
                code.to_lowercase().replacen("sz", "1", 1).replacen("sh", "0", 1)
            }
        }
    }
}

/// Нормализует список кодов.
pub fn normalize_symbols<'a, I>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    codes.into_iter().map(normalize_symbol).collect()
}

/// Направление округления в [`to_multiple`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundTo {
    /// Вверх.
    #[default]
    Ceil,
    /// Вниз.
    Floor,
}

/// Округляет `n` до ближайшего кратного `m` в заданную сторону.
///
/// Кратное значение возвращается как есть. Для `m == 0` результата нет.
///
/// ```
/// # use stock_advisor::{to_multiple, RoundTo};
/// # use rust_decimal::Decimal;
/// let lot = Decimal::from(100);
/// assert_eq!(to_multiple(Decimal::from(250), lot, RoundTo::Ceil), Some(Decimal::from(300)));
/// assert_eq!(to_multiple(Decimal::from(250), lot, RoundTo::Floor), Some(Decimal::from(200)));
/// ```
pub fn to_multiple(n: Decimal, m: Decimal, mode: RoundTo) -> Option<Decimal> {
    if m.is_zero() {
        return None;
    }
    if n.checked_rem(m)?.is_zero() {
        return Some(n);
    }
    let times = n.checked_div(m)?.floor();
    let times = match mode {
        RoundTo::Ceil => times.checked_add(Decimal::ONE)?,
        RoundTo::Floor => times,
    };
    times.checked_mul(m)
}
