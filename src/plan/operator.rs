use std::fmt;

use strum::{Display, EnumString};

/// Comparison and logical operators carried by boolean binary expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperator {
    /// Equality (=)
    Equal,
    NotEqual,

    /// Logical AND
    And,
    /// Logical OR
    Or,

    /// Greater than (>)
    GreaterThan,
    GreaterThanEqual,

    /// Less than (<)
    LessThan,
    LessThanEqual,
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_symbol())
    }
}

impl BooleanOperator {
    pub fn to_symbol(self) -> &'static str {
        match self {
            BooleanOperator::Equal => "=",
            BooleanOperator::NotEqual => "!=",
            BooleanOperator::And => "AND",
            BooleanOperator::Or => "OR",
            BooleanOperator::GreaterThan => ">",
            BooleanOperator::GreaterThanEqual => ">=",
            BooleanOperator::LessThan => "<",
            BooleanOperator::LessThanEqual => "<=",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BooleanOperator::And | BooleanOperator::Or)
    }

    /// Returns the binding power (precedence) of this operator.
    ///
    /// Operators with a higher number bind tighter. Used when rendering
    /// nested expressions to decide where parentheses are needed.
    pub fn precedence(self) -> u8 {
        match self {
            BooleanOperator::Or => 2,
            BooleanOperator::And => 3,
            BooleanOperator::NotEqual
            | BooleanOperator::Equal
            | BooleanOperator::LessThan
            | BooleanOperator::LessThanEqual
            | BooleanOperator::GreaterThan
            | BooleanOperator::GreaterThanEqual => 5,
        }
    }
}

/// Arithmetic operators carried by math expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl fmt::Display for MathOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_symbol())
    }
}

impl MathOperator {
    pub fn to_symbol(self) -> &'static str {
        match self {
            MathOperator::Add => "+",
            MathOperator::Subtract => "-",
            MathOperator::Multiply => "*",
            MathOperator::Divide => "/",
            MathOperator::Modulo => "%",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            MathOperator::Add | MathOperator::Subtract => 7,
            MathOperator::Multiply | MathOperator::Divide | MathOperator::Modulo => 10,
        }
    }
}

/// Aggregation functions usable inside an aggregate plan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AggregateFunction {
    Sum,
    Count,
    Min,
    Max,
    Avg,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_symbols() {
        assert_eq!(BooleanOperator::GreaterThanEqual.to_string(), ">=");
        assert_eq!(BooleanOperator::And.to_string(), "AND");
        assert_eq!(MathOperator::Modulo.to_string(), "%");
    }

    #[test]
    fn test_precedence_orders_operators() {
        assert!(BooleanOperator::Or.precedence() < BooleanOperator::And.precedence());
        assert!(BooleanOperator::Equal.precedence() < MathOperator::Add.precedence());
        assert!(MathOperator::Add.precedence() < MathOperator::Multiply.precedence());
    }

    #[test]
    fn test_aggregate_function_names() {
        assert_eq!(AggregateFunction::Avg.to_string(), "AVG");
        assert_eq!(
            AggregateFunction::from_str("count").unwrap(),
            AggregateFunction::Count
        );
    }
}
