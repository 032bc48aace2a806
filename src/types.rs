//! Доменные типы: позиции, котировки, обогащённые позиции и сводка.

use crate::approx::Approximation;
use crate::formula::Expr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Денежное значение, используем `Decimal` для точных расчётов.
pub type Money = Decimal;

/// Доля (доходность, отношение стоимостей), тоже в `Decimal`.
pub type Rate = Decimal;

/// Котировки, проиндексированные по тикеру.
pub type QuoteBook = BTreeMap<String, Quote>;

/// Позиция пользователя в том виде, в каком она хранится.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPosition {
    /// Тикер, ключ позиции.
    pub symbol: String,
    /// Название бумаги.
    pub name: String,
    /// Средняя цена покупки.
    pub cost_price: Money,
    /// Количество акций.
    pub position: u64,
    /// P/E.
    #[serde(default)]
    pub pe: f64,
    /// Прибыль на акцию.
    #[serde(default)]
    pub eps: f64,
    /// Чистая прибыль компании.
    #[serde(default)]
    pub profits: f64,
    /// Количество выпущенных акций.
    #[serde(default)]
    pub issue: f64,
}

impl StockPosition {
    /// Создаёт позицию без фундаментальных показателей.
    pub fn new(symbol: &str, name: &str, cost_price: Money, position: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            cost_price,
            position,
            pe: 0.0,
            eps: 0.0,
            profits: 0.0,
            issue: 0.0,
        }
    }

    /// Целевая цена по прибыли: `profits * pe / issue`.
    ///
    /// Возвращает `None`, если число акций не задано.
    #[allow(clippy::float_cmp)]
    pub fn target_price_by_profits(&self) -> Option<f64> {
        if self.issue == 0.0 {
            return None;
        }
        Some(self.profits * self.pe / self.issue)
    }

    /// Целевая цена по прибыли на акцию: `eps * pe`.
    #[inline]
    pub fn target_price_by_eps(&self) -> f64 {
        self.eps * self.pe
    }
}

/// Частичное обновление хранимой позиции.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    /// Новое название.
    pub name: Option<String>,
    /// Новая средняя цена.
    pub cost_price: Option<Money>,
    /// Новое количество.
    pub position: Option<u64>,
    /// Новый P/E.
    pub pe: Option<f64>,
    /// Новый EPS.
    pub eps: Option<f64>,
    /// Новая прибыль.
    pub profits: Option<f64>,
    /// Новое число акций.
    pub issue: Option<f64>,
}

impl StockUpdate {
    /// Переносит заданные поля на позицию.
    pub fn apply(&self, stock: &mut StockPosition) {
        if let Some(name) = &self.name {
            stock.name.clone_from(name);
        }
        if let Some(cost_price) = self.cost_price {
            stock.cost_price = cost_price;
        }
        if let Some(position) = self.position {
            stock.position = position;
        }
        if let Some(pe) = self.pe {
            stock.pe = pe;
        }
        if let Some(eps) = self.eps {
            stock.eps = eps;
        }
        if let Some(profits) = self.profits {
            stock.profits = profits;
        }
        if let Some(issue) = self.issue {
            stock.issue = issue;
        }
    }
}

/// Котировка от внешнего источника рыночных данных.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Тикер.
    pub symbol: String,
    /// Название, если источник его отдаёт.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Текущая цена.
    pub price: Money,
}

impl Quote {
    /// Создаёт котировку без названия.
    pub fn new(symbol: &str, price: Money) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: None,
            price,
        }
    }
}

/// Формула корректировки позиции от количества докупаемых акций `x`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Adjustment {
    /// Цена ниже средней: формула усреднения (докупить).
    #[serde(rename = "bcFn")]
    BuyMore(Expr),
    /// Цена не ниже средней: формула сокращения позиции.
    #[serde(rename = "jcFn")]
    Reduce(Expr),
}

impl Adjustment {
    /// Формула независимо от направления.
    #[inline]
    pub const fn formula(&self) -> &Expr {
        match self {
            Self::BuyMore(expr) | Self::Reduce(expr) => expr,
        }
    }

    /// `true`, если это формула докупки.
    #[inline]
    pub const fn is_buy_more(&self) -> bool {
        matches!(self, Self::BuyMore(_))
    }
}

/// Совет по сделке: найденное количество акций и сумма.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advice {
    /// Результат перебора.
    #[serde(flatten)]
    pub approximation: Approximation,
    /// Сумма сделки `x * price`, округлённая до копеек.
    pub amount: Money,
}

/// Позиция после слияния с котировкой и расчёта производных полей.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPosition {
    /// Хранимые поля (название может быть заменено котировкой).
    #[serde(flatten)]
    pub stock: StockPosition,
    /// Текущая цена, если котировка найдена.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    /// `price / costPrice - 1`; `None`, если не вычислима.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earn_rate: Option<Rate>,
    /// Формула докупки или сокращения.
    #[serde(flatten)]
    pub adjustment: Option<Adjustment>,
    /// Совет, если убыток превысил порог.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<Advice>,
}

impl EnrichedPosition {
    /// Позиция без котировки: передаётся без изменений.
    pub const fn unpriced(stock: StockPosition) -> Self {
        Self {
            stock,
            price: None,
            earn_rate: None,
            adjustment: None,
            advice: None,
        }
    }
}

/// Рекомендации по портфелю в целом.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryAdvice {
    /// Рекомендуемый объём свободных средств (сумма советов).
    pub hot_money: Money,
}

/// Статистика распределения доходности.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnStats {
    /// Минимальная доходность.
    pub min_rate: Rate,
    /// Максимальная доходность.
    pub max_rate: Rate,
    /// Результат позиции с минимальной доходностью.
    pub min_money: Money,
    /// Результат позиции с максимальной доходностью.
    pub max_money: Money,
    /// Максимум модуля доходности среди крайних позиций.
    pub max_abs_rate: Rate,
}

/// Сводка по портфелю.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    /// Рыночная стоимость.
    pub market_value: Money,
    /// Стоимость по цене покупки.
    pub cost_value: Money,
    /// Прибыль или убыток в деньгах.
    pub earn_money: Money,
    /// Общая доходность, 4 знака.
    pub earn_rate: Rate,
    /// Рекомендации.
    pub advice: SummaryAdvice,
    /// Распределение доходности.
    pub earn: EarnStats,
}
