//! Арифметические формулы с одной переменной `x`: разбор, вычисление и вывод.
//!
//! Разбираются только десятичные литералы, `+ - * /`, степень `^` (или `**`),
//! унарные знаки, скобки и переменная `x`. Литерал перед `x` или `(`
//! означает умножение: `8x`, `x2`, `2(x+1)`. Всё остальное отклоняется.

use crate::error::FormulaError;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops;
use std::str::FromStr;
use std::sync::LazyLock;

/// Имя единственной свободной переменной.
pub const VARIABLE: char = 'x';

/// Предельная глубина дерева при разборе: скобки, унарные знаки и цепочки
/// бинарных операций.
pub const MAX_DEPTH: usize = 256;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?P<num>[0-9]+(?:\.[0-9]+)?|\.[0-9]+)|(?P<op>\*\*|[-+*/^()])|(?P<var>[xX]))")
        .expect("valid token regex")
});

/// Бинарная операция узла формулы.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Сложение.
    Add,
    /// Вычитание.
    Sub,
    /// Умножение.
    Mul,
    /// Деление.
    Div,
    /// Возведение в степень.
    Pow,
}

impl BinaryOp {
    const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 4,
        }
    }

    const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        }
    }

    fn apply(self, lhs: Decimal, rhs: Decimal) -> Result<Decimal, FormulaError> {
        let value = match self {
            Self::Add => lhs.checked_add(rhs),
            Self::Sub => lhs.checked_sub(rhs),
            Self::Mul => lhs.checked_mul(rhs),
            Self::Div => {
                if rhs.is_zero() {
                    return Err(FormulaError::DivisionByZero);
                }
                lhs.checked_div(rhs)
            }
            Self::Pow => return power(lhs, rhs),
        };
        value.ok_or(FormulaError::Overflow)
    }
}

/// Целые показатели считаются точно, дробные через `powd`.
fn power(base: Decimal, exponent: Decimal) -> Result<Decimal, FormulaError> {
    if base.is_zero() && exponent.is_sign_negative() {
        return Err(FormulaError::DivisionByZero);
    }
    let value = if exponent.is_integer() {
        let exp = exponent.to_i64().ok_or(FormulaError::Overflow)?;
        base.checked_powi(exp)
    } else {
        base.checked_powd(exponent)
    };
    value.ok_or(FormulaError::Overflow)
}

/// Узел дерева формулы.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Числовая константа.
    Const(Decimal),
    /// Переменная `x`.
    Var,
    /// Унарный минус.
    Neg(Box<Expr>),
    /// Бинарная операция.
    Binary {
        /// Операция.
        op: BinaryOp,
        /// Левый операнд.
        lhs: Box<Expr>,
        /// Правый операнд.
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Константа.
    #[inline]
    pub const fn constant(value: Decimal) -> Self {
        Self::Const(value)
    }

    /// Переменная `x`.
    #[inline]
    pub const fn var() -> Self {
        Self::Var
    }

    /// Узел бинарной операции.
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Разбирает формулу из строки.
    ///
    /// # Пример
    ///
    /// ```
    /// # use stock_advisor::Expr;
    /// # use rust_decimal::Decimal;
    /// let expr = Expr::parse("1-(800+8x)/(1000+8x)").unwrap();
    /// assert_eq!(expr.to_string(), "1-(800+8x)/(1000+8x)");
    /// assert_eq!(expr.eval(Decimal::from(125)).unwrap(), Decimal::new(1, 1));
    /// ```
    pub fn parse(src: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(src)?;
        let mut parser = Parser {
            src,
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.expr()?;
        match parser.tokens.get(parser.pos) {
            Some(&(_, position)) => Err(FormulaError::TrailingInput { position }),
            None => Ok(expr),
        }
    }

    /// Вычисляет формулу при заданном `x`.
    #[inline]
    pub fn eval(&self, x: Decimal) -> Result<Decimal, FormulaError> {
        self.eval_with(Some(x))
    }

    /// `true`, если в формуле есть переменная.
    pub fn has_variable(&self) -> bool {
        match self {
            Self::Const(_) => false,
            Self::Var => true,
            Self::Neg(inner) => inner.has_variable(),
            Self::Binary { lhs, rhs, .. } => lhs.has_variable() || rhs.has_variable(),
        }
    }

    pub(crate) fn eval_with(&self, x: Option<Decimal>) -> Result<Decimal, FormulaError> {
        match self {
            Self::Const(value) => Ok(*value),
            Self::Var => x.ok_or(FormulaError::UnboundVariable { name: VARIABLE }),
            Self::Neg(inner) => Ok(-inner.eval_with(x)?),
            Self::Binary { op, lhs, rhs } => op.apply(lhs.eval_with(x)?, rhs.eval_with(x)?),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Neg(_) => 3,
            Self::Const(value) if value.is_sign_negative() => 3,
            Self::Const(_) | Self::Var => 5,
        }
    }
}

/// Вычисляет арифметическое выражение без переменных.
///
/// ```
/// # use stock_advisor::evaluate;
/// # use rust_decimal::Decimal;
/// assert_eq!(evaluate("2*5+3").unwrap(), Decimal::from(13));
/// assert!(evaluate("alert(1)").is_err());
/// ```
pub fn evaluate(expression: &str) -> Result<Decimal, FormulaError> {
    Expr::parse(expression)?.eval_with(None)
}

impl FromStr for Expr {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Add, self, rhs)
    }
}

impl ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Sub, self, rhs)
    }
}

impl ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Mul, self, rhs)
    }
}

impl ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Div, self, rhs)
    }
}

impl ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        Self::Neg(Box::new(self))
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{value}"),
            Self::Var => write!(f, "{VARIABLE}"),
            Self::Neg(inner) => {
                f.write_str("-")?;
                write_operand(f, inner, inner.precedence() < 3)
            }
            Self::Binary { op, lhs, rhs } => {
                // Коэффициент перед переменной пишем слитно: `8x`.
                if let (BinaryOp::Mul, Self::Const(value), Self::Var) = (op, &**lhs, &**rhs) {
                    if !value.is_sign_negative() {
                        return write!(f, "{value}{VARIABLE}");
                    }
                }
                let prec = op.precedence();
                let (lhs_parens, rhs_parens) = match op {
                    BinaryOp::Pow => (lhs.precedence() <= prec, rhs.precedence() < 3),
                    _ => (lhs.precedence() < prec, rhs.precedence() <= prec),
                };
                write_operand(f, lhs, lhs_parens)?;
                write!(f, "{}", op.symbol())?;
                write_operand(f, rhs, rhs_parens)
            }
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Decimal),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Var,
}

/// Разбивает строку на токены, запоминая байтовое смещение каждого.
fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < src.len() {
        let rest = &src[offset..];
        let Some(caps) = TOKEN_RE.captures(rest) else {
            let trimmed = rest.trim_start();
            if let Some(ch) = trimmed.chars().next() {
                return Err(FormulaError::UnexpectedChar {
                    ch,
                    position: offset + rest.len() - trimmed.len(),
                });
            }
            break;
        };

        let token = if let Some(num) = caps.name("num") {
            let value = Decimal::from_str(num.as_str()).map_err(|_| FormulaError::Number {
                value: num.as_str().to_string(),
            })?;
            (Token::Num(value), offset + num.start())
        } else if let Some(op) = caps.name("op") {
            let kind = match op.as_str() {
                "+" => Token::Plus,
                "-" => Token::Minus,
                "*" => Token::Star,
                "/" => Token::Slash,
                "(" => Token::LParen,
                ")" => Token::RParen,
                _ => Token::Caret,
            };
            (kind, offset + op.start())
        } else {
            let start = caps.name("var").map_or(0, |m| m.start());
            (Token::Var, offset + start)
        };

        tokens.push(token);
        offset += caps.get(0).map_or(rest.len(), |m| m.end());
    }

    Ok(tokens)
}

struct Parser<'a> {
    src: &'a str,
    tokens: &'a [(Token, usize)],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|&(token, _)| token)
    }

    fn bump(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn previous_is_var(&self) -> bool {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .is_some_and(|&(token, _)| token == Token::Var)
    }

    fn unexpected(&self, position: usize) -> FormulaError {
        match self.src[position..].chars().next() {
            Some(ch) => FormulaError::UnexpectedChar { ch, position },
            None => FormulaError::UnexpectedEnd,
        }
    }

    /// Глубина дерева ограничена [`MAX_DEPTH`], иначе рекурсивное
    /// вычисление и вывод исчерпают стек.
    fn deepen(&mut self) -> Result<(), FormulaError> {
        if self.depth >= MAX_DEPTH {
            let position = self
                .tokens
                .get(self.pos)
                .map_or(self.src.len(), |&(_, position)| position);
            return Err(FormulaError::TooDeep { position });
        }
        self.depth += 1;
        Ok(())
    }

    fn descend<T, F>(&mut self, parse: F) -> Result<T, FormulaError>
    where
        F: FnOnce(&mut Self) -> Result<T, FormulaError>,
    {
        self.deepen()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let base = self.depth;
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => {
                    self.depth = base;
                    return Ok(lhs);
                }
            };
            // Каждая операция цепочки углубляет левую ветвь.
            self.deepen()?;
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let base = self.depth;
        let mut lhs = self.unary()?;
        loop {
            let (op, explicit) = match self.peek() {
                Some(Token::Star) => (BinaryOp::Mul, true),
                Some(Token::Slash) => (BinaryOp::Div, true),
                Some(Token::Var | Token::LParen) => (BinaryOp::Mul, false),
                Some(Token::Num(_)) if self.previous_is_var() => (BinaryOp::Mul, false),
                _ => {
                    self.depth = base;
                    return Ok(lhs);
                }
            };
            self.deepen()?;
            let rhs = if explicit {
                self.bump();
                self.unary()?
            } else {
                self.power()?
            };
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        self.descend(|parser| match parser.peek() {
            Some(Token::Minus) => {
                parser.bump();
                Ok(-parser.unary()?)
            }
            Some(Token::Plus) => {
                parser.bump();
                parser.unary()
            }
            _ => parser.power(),
        })
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Caret) {
            self.bump();
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.bump() {
            Some((Token::Num(value), _)) => Ok(Expr::Const(value)),
            Some((Token::Var, _)) => Ok(Expr::Var),
            Some((Token::LParen, _)) => {
                let inner = self.descend(Self::expr)?;
                match self.bump() {
                    Some((Token::RParen, _)) => Ok(inner),
                    Some((_, position)) => Err(self.unexpected(position)),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some((_, position)) => Err(self.unexpected(position)),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}
