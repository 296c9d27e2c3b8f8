//! Query expression parsing
//!
//! Free-text filters such as `Expense and not (payee Joe or Favor)` are
//! converted to postfix with a shunting-yard pass and then folded into a
//! [`Query`]. Adjacent terms without a connective are joined with an
//! implicit `or`.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::query::Query;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(|\)|@|[^\s()@]+").unwrap());

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Unbalanced parentheses in '{expression}'")]
    UnbalancedParens { expression: String },

    #[error("Malformed expression: {reason}")]
    MalformedExpression { reason: String },

    #[error("payee expects a plain pattern, got '{operand}'")]
    InvalidPayeeOperand { operand: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

fn precedence(operator: &str) -> u8 {
    match operator {
        "and" | "or" => 1,
        "not" | "payee" | "@" => 2,
        _ => 0,
    }
}

fn is_unary(token: &str) -> bool {
    matches!(token, "not" | "payee" | "@")
}

fn is_operator(token: &str) -> bool {
    matches!(token, "and" | "or") || is_unary(token)
}

pub fn tokenize_expression(expression: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(expression).map(|m| m.as_str()).collect()
}

/// Push `operator` after moving every operator it does not bind tighter
/// than to the output. Unary operators bind to the right, so only strictly
/// tighter operators are flushed for them.
fn push_operator<'a>(operator: &'a str, stack: &mut Vec<&'a str>, output: &mut Vec<String>) {
    let incoming = precedence(operator);
    while let Some(&top) = stack.last() {
        let top_precedence = precedence(top);
        let flush = if is_unary(operator) {
            top_precedence > incoming
        } else {
            top_precedence >= incoming
        };
        if !flush || top == "(" {
            break;
        }
        output.push(top.to_string());
        stack.pop();
    }
    stack.push(operator);
}

/// Convert an infix expression to postfix tokens
pub fn build_postfix_expression(expression: &str) -> Result<Vec<String>, ExpressionError> {
    let unbalanced = || ExpressionError::UnbalancedParens {
        expression: expression.to_string(),
    };

    let mut stack: Vec<&str> = Vec::new();
    let mut output = Vec::new();
    let mut last_was_operand = false;

    for token in tokenize_expression(expression) {
        match token {
            "(" => {
                if last_was_operand {
                    push_operator("or", &mut stack, &mut output);
                }
                stack.push("(");
            }
            ")" => loop {
                match stack.pop() {
                    Some("(") => break,
                    Some(op) => output.push(op.to_string()),
                    None => return Err(unbalanced()),
                }
            },
            op if is_operator(op) => push_operator(op, &mut stack, &mut output),
            term => {
                if last_was_operand {
                    push_operator("or", &mut stack, &mut output);
                }
                output.push(term.to_string());
            }
        }
        last_was_operand = !is_operator(token) && token != "(";
    }

    while let Some(op) = stack.pop() {
        if op == "(" {
            return Err(unbalanced());
        }
        output.push(op.to_string());
    }

    Ok(output)
}

/// Fold postfix tokens into a query tree
pub fn build_expr_from_postfix<S: AsRef<str>>(postfix: &[S]) -> Result<Query, ExpressionError> {
    let mut operands: Vec<Query> = Vec::new();

    fn pop(operands: &mut Vec<Query>, operator: &str) -> Result<Query, ExpressionError> {
        operands.pop().ok_or_else(|| ExpressionError::MalformedExpression {
            reason: format!("'{}' is missing an operand", operator),
        })
    }

    for token in postfix.iter().map(AsRef::as_ref) {
        match token {
            "and" | "or" => {
                let right = pop(&mut operands, token)?;
                let left = pop(&mut operands, token)?;
                operands.push(if token == "and" {
                    Query::And(vec![left, right])
                } else {
                    Query::Or(vec![left, right])
                });
            }
            "not" => {
                let child = pop(&mut operands, token)?;
                operands.push(Query::Not(Box::new(child)));
            }
            "payee" | "@" => match pop(&mut operands, token)? {
                Query::RegexMatch(regex) => operands.push(Query::PayeeMatch(regex)),
                other => {
                    return Err(ExpressionError::InvalidPayeeOperand {
                        operand: other.to_string(),
                    })
                }
            },
            term => operands.push(Query::regex(term)?),
        }
    }

    match operands.len() {
        1 => Ok(operands.remove(0)),
        0 => Err(ExpressionError::MalformedExpression {
            reason: "empty expression".to_string(),
        }),
        n => Err(ExpressionError::MalformedExpression {
            reason: format!("{} operands left without an operator", n),
        }),
    }
}

/// Parse a filter expression into a query
pub fn build_expression(expression: &str) -> Result<Query, ExpressionError> {
    let postfix = build_postfix_expression(expression)?;
    let query = build_expr_from_postfix(&postfix)?;
    log::debug!("Built query {} from '{}'", query, expression);
    Ok(query)
}
