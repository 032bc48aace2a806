//! Ошибки разбора формул, поиска советов и работы с хранилищем.

/// Ошибка разбора или вычисления формулы.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// Во входной строке встретился недопустимый символ.
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedChar {
        /// Сам символ.
        ch: char,
        /// Байтовое смещение в строке.
        position: usize,
    },
    /// Выражение оборвалось раньше, чем ожидалось.
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    /// После полного выражения остались лишние токены.
    #[error("Unexpected token at position {position}")]
    TrailingInput {
        /// Байтовое смещение первого лишнего токена.
        position: usize,
    },
    /// Слишком глубокая вложенность скобок или унарных знаков.
    #[error("Expression nested too deeply at position {position}")]
    TooDeep {
        /// Байтовое смещение, на котором превышен предел.
        position: usize,
    },
    /// Числовой литерал не помещается в `Decimal`.
    #[error("Invalid number literal '{value}'")]
    Number {
        /// Исходный литерал.
        value: String,
    },
    /// Переменная встретилась там, где её значение не задано.
    #[error("Variable '{name}' is not bound")]
    UnboundVariable {
        /// Имя переменной.
        name: char,
    },
    /// Деление на ноль при вычислении.
    #[error("Division by zero")]
    DivisionByZero,
    /// Переполнение `Decimal` при вычислении.
    #[error("Arithmetic overflow")]
    Overflow,
    /// Ни одна точка перебора не дала вычислимого значения.
    #[error("No computable candidate in search range")]
    NoCandidate,
}

/// Ошибка работы с портфелем, хранилищем или настройками.
#[derive(thiserror::Error, Debug)]
pub enum AdvisorError {
    /// Ошибка ввода-вывода файлового хранилища.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Ошибка (де)сериализации JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Ошибка формулы.
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),
    /// Некорректное значение параметра конфигурации.
    #[error("Invalid config value '{value}' for '{key}'")]
    Config {
        /// Имя параметра.
        key: &'static str,
        /// Некорректное значение.
        value: String,
    },
    /// Отсутствует обязательное поле.
    #[error("Required field '{field}' missing")]
    MissingField {
        /// Имя пропавшего поля.
        field: &'static str,
    },
}
