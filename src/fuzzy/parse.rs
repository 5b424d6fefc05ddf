//! Rule text parser
//!
//! Parses rule text into an antecedent tree and a consequent.
//!
//! # Syntax
//!
//! ```text
//! rule        := IF expr THEN consequent
//! consequent  := proposition | "(" proposition ")"
//! expr        := and_expr (OR and_expr)*
//! and_expr    := unary (AND unary)*
//! unary       := NOT unary | "(" expr ")" | proposition
//! proposition := NAME IS NAME
//! ```
//!
//! Keywords are case-insensitive. Names are runs of letters, digits and `_`.

use thiserror::Error;

use super::rule::{Antecedent, Proposition};

/// Rule text syntax error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleSyntaxError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Unexpected end of rule text: {expected}")]
    UnexpectedEnd { expected: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    If,
    Then,
    Is,
    And,
    Or,
    Not,
    Open,
    Close,
    Name(&'a str),
}

impl Token<'_> {
    fn describe(&self) -> String {
        match self {
            Token::If => "'IF'".to_string(),
            Token::Then => "'THEN'".to_string(),
            Token::Is => "'IS'".to_string(),
            Token::And => "'AND'".to_string(),
            Token::Or => "'OR'".to_string(),
            Token::Not => "'NOT'".to_string(),
            Token::Open => "'('".to_string(),
            Token::Close => "')'".to_string(),
            Token::Name(name) => format!("name '{}'", name),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token<'_>)>, RuleSyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        match c {
            '(' => {
                chars.next();
                tokens.push((start, Token::Open));
            }
            ')' => {
                chars.next();
                tokens.push((start, Token::Close));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &input[start..end];
                let token = match word.to_ascii_uppercase().as_str() {
                    "IF" => Token::If,
                    "THEN" => Token::Then,
                    "IS" => Token::Is,
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Name(word),
                };
                tokens.push((start, token));
            }
            other => {
                return Err(RuleSyntaxError::Syntax {
                    position: start,
                    message: format!("unexpected character '{}'", other),
                });
            }
        }
    }

    Ok(tokens)
}

struct RuleParser<'a> {
    tokens: Vec<(usize, Token<'a>)>,
    pos: usize,
}

impl<'a> RuleParser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token<'a>)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<(), RuleSyntaxError> {
        match self.next() {
            Some((_, ref t)) if *t == expected => Ok(()),
            Some((position, t)) => Err(RuleSyntaxError::Syntax {
                position,
                message: format!("expected {} but found {}", expected.describe(), t.describe()),
            }),
            None => Err(RuleSyntaxError::UnexpectedEnd {
                expected: expected.describe(),
            }),
        }
    }

    fn name(&mut self) -> Result<&'a str, RuleSyntaxError> {
        match self.next() {
            Some((_, Token::Name(name))) => Ok(name),
            Some((position, t)) => Err(RuleSyntaxError::Syntax {
                position,
                message: format!("expected a name but found {}", t.describe()),
            }),
            None => Err(RuleSyntaxError::UnexpectedEnd {
                expected: "a name".to_string(),
            }),
        }
    }

    fn proposition(&mut self) -> Result<Proposition, RuleSyntaxError> {
        let variable = self.name()?;
        self.expect(Token::Is)?;
        let term = self.name()?;
        Ok(Proposition::new(variable, term))
    }

    fn expr(&mut self) -> Result<Antecedent, RuleSyntaxError> {
        let mut items = vec![self.and_expr()?];
        while self.peek() == Some(&Token::Or) {
            self.next();
            items.push(self.and_expr()?);
        }
        Ok(collapse(items, Antecedent::Or))
    }

    fn and_expr(&mut self) -> Result<Antecedent, RuleSyntaxError> {
        let mut items = vec![self.unary()?];
        while self.peek() == Some(&Token::And) {
            self.next();
            items.push(self.unary()?);
        }
        Ok(collapse(items, Antecedent::And))
    }

    fn unary(&mut self) -> Result<Antecedent, RuleSyntaxError> {
        match self.peek() {
            Some(Token::Not) => {
                self.next();
                Ok(self.unary()?.negate())
            }
            Some(Token::Open) => {
                self.next();
                let inner = self.expr()?;
                self.expect(Token::Close)?;
                Ok(inner)
            }
            _ => Ok(Antecedent::Is(self.proposition()?)),
        }
    }

    fn consequent(&mut self) -> Result<Proposition, RuleSyntaxError> {
        if self.peek() == Some(&Token::Open) {
            self.next();
            let prop = self.proposition()?;
            self.expect(Token::Close)?;
            Ok(prop)
        } else {
            self.proposition()
        }
    }
}

fn collapse(mut items: Vec<Antecedent>, wrap: fn(Vec<Antecedent>) -> Antecedent) -> Antecedent {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

/// Parse `IF <expr> THEN <Variable> IS <Term>`
pub fn parse_rule(text: &str) -> Result<(Antecedent, Proposition), RuleSyntaxError> {
    let tokens = tokenize(text)?;
    let mut parser = RuleParser { tokens, pos: 0 };

    parser.expect(Token::If)?;
    let antecedent = parser.expr()?;
    parser.expect(Token::Then)?;
    let consequent = parser.consequent()?;

    if let Some((position, t)) = parser.next() {
        return Err(RuleSyntaxError::Syntax {
            position,
            message: format!("unexpected {} after consequent", t.describe()),
        });
    }

    Ok((antecedent, consequent))
}
