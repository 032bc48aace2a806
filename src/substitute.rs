//! Текстовая подстановка значения переменной в формулу.

use rust_decimal::Decimal;

/// Подставляет `value` вместо каждого вхождения `variable` (без учёта регистра).
///
/// Вхождения заменяются слева направо, после каждой замены строка
/// просматривается заново. Цифра перед переменной означает умножение:
/// `2x` превращается в `2*5`, цифра после неё даёт `5*2`. Если
/// переменной в формуле нет, формула возвращается без изменений.
///
/// ```
/// # use stock_advisor::substitute;
/// # use rust_decimal::Decimal;
/// assert_eq!(substitute("2x+3", 'x', Decimal::from(5)), "2*5+3");
/// assert_eq!(substitute("x2+3", 'x', Decimal::from(5)), "5*2+3");
/// ```
pub fn substitute(formula: &str, variable: char, value: Decimal) -> String {
    let occurrences = formula
        .chars()
        .filter(|ch| ch.eq_ignore_ascii_case(&variable))
        .count();
    if occurrences == 0 {
        log::trace!("variable '{variable}' not found in '{formula}'");
        return formula.to_string();
    }

    let value = value.to_string();
    let mut output = formula.to_string();

    for _ in 0..occurrences {
        let Some((idx, ch)) = output
            .char_indices()
            .find(|(_, ch)| ch.eq_ignore_ascii_case(&variable))
        else {
            break;
        };
        let end = idx + ch.len_utf8();

        let prev_is_digit = output[..idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());
        let next_is_digit = output[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());

        let replacement = if prev_is_digit {
            format!("*{value}")
        } else if next_is_digit {
            format!("{value}*")
        } else {
            value.clone()
        };
        output.replace_range(idx..end, &replacement);
    }

    output
}
