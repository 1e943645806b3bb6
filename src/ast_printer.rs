use crate::expr::{Expr, LiteralValue};
use crate::stmt::FunctionDecl;

/// Renders expressions in parenthesised prefix form, e.g. `(* (- 1.0) 2.0)`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => format!("({} {} {})", operator, self.print(left), self.print(right)),

            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => format!("({} {} {})", operator, self.print(left), self.print(right)),

            Expr::Unary {
                operator, right, ..
            } => format!("({} {})", operator, self.print(right)),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(?: {} {} {})",
                self.print(condition),
                self.print(then_branch),
                self.print(else_branch)
            ),

            Expr::Literal { value, .. } => match value {
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                LiteralValue::Str(s) => s.to_string(),

                LiteralValue::True => "true".to_string(),

                LiteralValue::False => "false".to_string(),

                LiteralValue::Nil => "nil".to_string(),
            },

            Expr::Grouping(expr) => format!("(group {})", self.print(expr)),

            Expr::Variable { name, .. } => name.name.clone(),

            Expr::Assign { name, value, .. } => format!("(= {} {})", name, self.print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out: String = format!("(call {}", self.print(callee));
                for argument in arguments {
                    out.push(' ');
                    out.push_str(&self.print(argument));
                }
                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                self.print(object),
                name,
                self.print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Lambda(decl) => self.print_lambda(decl),
        }
    }

    fn print_lambda(&self, decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();

        format!("(fun ({}) ...)", params.join(" "))
    }
}
