//! Настройки моделирования: разбор плоской формы `down_threshold`, `up_position`...

use crate::error::AdvisorError;
use std::collections::BTreeMap;

/// Правило для одного направления движения цены.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationLeg {
    /// Порог изменения цены, доля.
    pub threshold: f64,
    /// Изменение позиции, акций (отрицательное значит продажу).
    pub position: f64,
}

/// Правила моделирования для падения и роста цены.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationSettings {
    /// Падение цены: докупка.
    pub down: SimulationLeg,
    /// Рост цены: продажа.
    pub up: SimulationLeg,
}

impl SimulationSettings {
    /// Собирает настройки из значений формы.
    ///
    /// Пороги вводятся в процентах: порог падения становится отрицательной
    /// долей, порог роста положительной. Объём при росте продаётся, поэтому
    /// знак меняется. Ключи без `_` и с неизвестным префиксом пропускаются.
    ///
    /// ```
    /// # use stock_advisor::SimulationSettings;
    /// # use std::collections::BTreeMap;
    /// let form = BTreeMap::from([
    ///     ("down_threshold".to_string(), 10.0),
    ///     ("down_position".to_string(), 100.0),
    ///     ("up_threshold".to_string(), 20.0),
    ///     ("up_position".to_string(), 200.0),
    /// ]);
    /// let settings = SimulationSettings::from_flat(&form).unwrap();
    /// assert_eq!(settings.down.threshold, -0.1);
    /// assert_eq!(settings.up.position, -200.0);
    /// ```
    pub fn from_flat(values: &BTreeMap<String, f64>) -> Result<Self, AdvisorError> {
        let mut grouped: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
        for (key, value) in values {
            let Some((group, field)) = key.split_once('_') else {
                continue;
            };
            grouped.entry(group).or_default().insert(field, *value);
        }

        let field = |group: &str, name: &str, label: &'static str| {
            grouped
                .get(group)
                .and_then(|fields| fields.get(name))
                .copied()
                .ok_or(AdvisorError::MissingField { field: label })
        };

        Ok(Self {
            down: SimulationLeg {
                threshold: -field("down", "threshold", "down_threshold")? / 100.0,
                position: field("down", "position", "down_position")?,
            },
            up: SimulationLeg {
                threshold: field("up", "threshold", "up_threshold")? / 100.0,
                position: -field("up", "position", "up_position")?,
            },
        })
    }
}
