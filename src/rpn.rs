use crate::ast::{Expr, LiteralValue};
use crate::ast_printer::AstPrinter;
use crate::value::Value;

/// Reverse Polish rendering of arithmetic: `(1 + 2) * 3` ⇒ `1 2 + 3 *`.
/// Unary operators follow their operand (`-x` ⇒ `x -`).
pub struct RpnConverter;

impl RpnConverter {
    pub fn convert(expr: &Expr) -> String {
        match expr {
            Expr::Literal(LiteralValue::Number(n)) => Value::Number(*n).to_string(),
            Expr::Literal(LiteralValue::Str(s)) => s.clone(),
            Expr::Literal(LiteralValue::True) => "true".into(),
            Expr::Literal(LiteralValue::False) => "false".into(),
            Expr::Literal(LiteralValue::Nil) => "nil".into(),

            Expr::Grouping(inner) => Self::convert(inner),

            Expr::Unary { operator, right } => {
                format!("{} {}", Self::convert(right), operator.lexeme)
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                Self::convert(left),
                Self::convert(right),
                operator.lexeme
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            other => AstPrinter::print_expr(other),
        }
    }
}
