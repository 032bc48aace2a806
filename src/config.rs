//! Пороговые значения для советов и стартовый набор позиций.

use crate::error::AdvisorError;
use crate::types::{Rate, StockPosition};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

const ENV_EXPECT_LOSS_RATE: &str = "STOCK_ADVISOR_EXPECT_LOSS_RATE";
const ENV_ADVICE_LOSS_RATE: &str = "STOCK_ADVISOR_ADVICE_LOSS_RATE";
const ENV_ADVICE_STEP: &str = "STOCK_ADVISOR_ADVICE_STEP";
const ENV_CYCLE_COUNT: &str = "STOCK_ADVISOR_CYCLE_COUNT";

/// Настройки расчёта советов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvisorConfig {
    /// Допустимая доходность после усреднения (отрицательная для убытка).
    /// Перебор ищет точку, где формула равна `-expect_loss_rate`.
    pub expect_loss_rate: Rate,
    /// Доходность, ниже которой позиция получает совет.
    pub advice_loss_rate: Rate,
    /// Шаг перебора, акций.
    pub advice_step: Decimal,
    /// Число итераций перебора.
    pub cycle_count: u32,
}

impl AdvisorConfig {
    /// Значения по умолчанию: цель -5%, совет при убытке больше 10%.
    pub const fn new() -> Self {
        Self {
            expect_loss_rate: dec!(-0.05),
            advice_loss_rate: dec!(-0.10),
            advice_step: Decimal::ONE_HUNDRED,
            cycle_count: 300,
        }
    }

    /// Задаёт целевую доходность.
    ///
    /// ```
    /// # use stock_advisor::AdvisorConfig;
    /// # use rust_decimal::Decimal;
    /// let config = AdvisorConfig::new()
    ///     .expect_loss_rate(Decimal::new(-3, 2))
    ///     .advice_step(Decimal::TEN);
    /// assert_eq!(config.cycle_count, 300);
    /// ```
    #[inline]
    pub const fn expect_loss_rate(mut self, rate: Rate) -> Self {
        self.expect_loss_rate = rate;
        self
    }

    /// Задаёт порог для советов.
    #[inline]
    pub const fn advice_loss_rate(mut self, rate: Rate) -> Self {
        self.advice_loss_rate = rate;
        self
    }

    /// Задаёт шаг перебора.
    #[inline]
    pub const fn advice_step(mut self, step: Decimal) -> Self {
        self.advice_step = step;
        self
    }

    /// Задаёт число итераций перебора.
    #[inline]
    pub const fn cycle_count(mut self, cycle_count: u32) -> Self {
        self.cycle_count = cycle_count;
        self
    }

    /// Читает переопределения из переменных окружения `STOCK_ADVISOR_*`.
    #[inline]
    pub fn from_env() -> Result<Self, AdvisorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Читает переопределения через произвольный источник ключей.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AdvisorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(value) = lookup(ENV_EXPECT_LOSS_RATE) {
            config.expect_loss_rate = parse_value(ENV_EXPECT_LOSS_RATE, &value)?;
        }
        if let Some(value) = lookup(ENV_ADVICE_LOSS_RATE) {
            config.advice_loss_rate = parse_value(ENV_ADVICE_LOSS_RATE, &value)?;
        }
        if let Some(value) = lookup(ENV_ADVICE_STEP) {
            let step: Decimal = parse_value(ENV_ADVICE_STEP, &value)?;
            if step <= Decimal::ZERO {
                return Err(AdvisorError::Config {
                    key: ENV_ADVICE_STEP,
                    value,
                });
            }
            config.advice_step = step;
        }
        if let Some(value) = lookup(ENV_CYCLE_COUNT) {
            config.cycle_count = parse_value(ENV_CYCLE_COUNT, &value)?;
        }
        log::debug!("advisor config: {config:?}");
        Ok(config)
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, AdvisorError> {
    value.trim().parse().map_err(|_| AdvisorError::Config {
        key,
        value: value.to_string(),
    })
}

/// Позиции, которыми заполняется пустое хранилище при первом запуске.
pub fn default_stocks() -> Vec<StockPosition> {
    vec![
        StockPosition {
            pe: 6.2,
            eps: 5.56,
            profits: 1.38e11,
            issue: 2.52e10,
            ..StockPosition::new("sh600036", "招商银行", dec!(36.50), 1000)
        },
        StockPosition {
            pe: 8.1,
            eps: 4.28,
            profits: 2.46e10,
            issue: 5.6e9,
            ..StockPosition::new("sz000651", "格力电器", dec!(42.80), 500)
        },
        StockPosition {
            pe: 24.5,
            eps: 7.35,
            profits: 3.5e10,
            issue: 4.5e9,
            ..StockPosition::new("sh601012", "隆基绿能", dec!(28.16), 800)
        },
    ]
}
