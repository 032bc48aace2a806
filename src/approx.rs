//! Приближённое решение `f(x) = target` перебором значений `x` с шагом.

use crate::error::FormulaError;
use crate::formula::{Expr, VARIABLE, evaluate};
use crate::substitute::substitute;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Параметры перебора.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Шаг по `x`.
    pub step: Decimal,
    /// Начало диапазона; первая точка равна `start_x + step`.
    pub start_x: Decimal,
    /// Конец диапазона; задаёт число итераций `end_x - start_x + 1`.
    /// Нулевой `end_x` считается незаданным.
    pub end_x: Option<Decimal>,
    /// Число итераций, если `end_x` не задан.
    pub cycle_count: u32,
}

impl SearchOptions {
    /// Шаг 1, старт с нуля, 300 итераций.
    pub const fn new() -> Self {
        Self {
            step: Decimal::ONE,
            start_x: Decimal::ZERO,
            end_x: None,
            cycle_count: 300,
        }
    }

    /// Задаёт шаг.
    ///
    /// ```
    /// # use stock_advisor::SearchOptions;
    /// # use rust_decimal::Decimal;
    /// let options = SearchOptions::new().step(Decimal::ONE_HUNDRED).cycle_count(50);
    /// assert_eq!(options.iterations(), 50);
    /// ```
    #[inline]
    pub const fn step(mut self, step: Decimal) -> Self {
        self.step = step;
        self
    }

    /// Задаёт начало диапазона.
    #[inline]
    pub const fn start_x(mut self, start_x: Decimal) -> Self {
        self.start_x = start_x;
        self
    }

    /// Задаёт конец диапазона.
    #[inline]
    pub const fn end_x(mut self, end_x: Decimal) -> Self {
        self.end_x = Some(end_x);
        self
    }

    /// Задаёт число итераций.
    #[inline]
    pub const fn cycle_count(mut self, cycle_count: u32) -> Self {
        self.cycle_count = cycle_count;
        self
    }

    /// Сколько точек будет проверено.
    pub fn iterations(&self) -> u64 {
        match self.end_x {
            Some(end_x) if !end_x.is_zero() => end_x
                .checked_sub(self.start_x)
                .and_then(|span| span.checked_add(Decimal::ONE))
                .and_then(|count| count.floor().to_u64())
                .unwrap_or(0),
            _ => u64::from(self.cycle_count),
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Лучшая найденная точка.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Approximation {
    /// Исходная формула.
    pub formula: String,
    /// Найденный `x`.
    pub x: Decimal,
    /// Значение формулы в `x`.
    pub y: Decimal,
    /// Целевое значение.
    pub target_value: Decimal,
    /// Приближённое значение (равно `y`).
    pub appro_value: Decimal,
    /// Шаг перебора.
    pub step: Decimal,
}

/// Ищет `x`, при котором текстовая формула ближе всего к `target`.
///
/// Каждая точка подставляется в формулу текстом и вычисляется безопасным
/// вычислителем. Точки с делением на ноль пропускаются, ошибка разбора
/// формулы прерывает поиск.
///
/// ```
/// # use stock_advisor::{find_approx, SearchOptions};
/// # use rust_decimal::Decimal;
/// let found = find_approx("1/x", Decimal::new(1, 1), SearchOptions::new().cycle_count(50)).unwrap();
/// assert_eq!(found.x, Decimal::TEN);
/// ```
pub fn find_approx(
    formula: &str,
    target: Decimal,
    options: SearchOptions,
) -> Result<Approximation, FormulaError> {
    let (x, y) = scan(target, &options, |x| {
        evaluate(&substitute(formula, VARIABLE, x))
    })?;
    Ok(Approximation {
        formula: formula.to_string(),
        x,
        y,
        target_value: target,
        appro_value: y,
        step: options.step,
    })
}

impl Expr {
    /// Тот же перебор, что и [`find_approx`], но по дереву формулы.
    pub fn find_approx(
        &self,
        target: Decimal,
        options: SearchOptions,
    ) -> Result<Approximation, FormulaError> {
        let (x, y) = scan(target, &options, |x| self.eval(x))?;
        Ok(Approximation {
            formula: self.to_string(),
            x,
            y,
            target_value: target,
            appro_value: y,
            step: options.step,
        })
    }
}

/// Полный перебор; при равной близости побеждает первая точка.
fn scan<F>(
    target: Decimal,
    options: &SearchOptions,
    mut eval: F,
) -> Result<(Decimal, Decimal), FormulaError>
where
    F: FnMut(Decimal) -> Result<Decimal, FormulaError>,
{
    let mut best: Option<(Decimal, Decimal, Decimal)> = None;
    let mut x = options.start_x;

    for _ in 0..options.iterations() {
        let Some(next) = x.checked_add(options.step) else {
            log::debug!("x overflowed after {x}, scan stopped");
            break;
        };
        x = next;
        let y = match eval(x) {
            Ok(y) => y,
            Err(FormulaError::DivisionByZero | FormulaError::Overflow) => {
                log::trace!("x = {x} is not computable, skipped");
                continue;
            }
            Err(err) => return Err(err),
        };
        let Some(delta) = y.checked_sub(target).map(|d| d.abs()) else {
            continue;
        };
        if best.is_none_or(|(best_delta, _, _)| delta < best_delta) {
            best = Some((delta, x, y));
        }
    }

    best.map(|(_, x, y)| (x, y)).ok_or(FormulaError::NoCandidate)
}
