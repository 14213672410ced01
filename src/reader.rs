//! The reader is responsible for parsing the input string into a list of expressions. The reader
//! main function is [read].

use std::{fmt::Display, iter::Peekable, str::Chars};

use crate::error::ReadError;
use crate::symbol::SymbolTable;
use crate::value::Value;

type Result<T> = std::result::Result<T, ReadError>;

/// A location is a position in a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub file: Option<String>,
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file)?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A prefix is a symbol that can be at the beggining of an expression. It is used to create quote
/// and unquote expressions.
#[derive(Clone, Copy)]
enum Prefix {
    Quote,
    SyntaxQuote,
    Unquote,
    UnquoteSplicing,
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prefix::Quote => write!(f, "quote"),
            Prefix::SyntaxQuote => write!(f, "syntax-quote"),
            Prefix::Unquote => write!(f, "unquote"),
            Prefix::UnquoteSplicing => write!(f, "unquote-splicing"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Paren,
    Bracket,
    Brace,
}

fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\t' | ' ' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';'
    )
}

/// A state is a mutable object that is used to keep track of the current state of the reader.
struct State<'a> {
    peekable: Peekable<Chars<'a>>,
    symbols: &'a mut SymbolTable,
    stack: Vec<Value>,
    indices: Vec<(usize, Delimiter, Location)>,
    prefix: Vec<(Prefix, Location, usize)>,
    position: Location,
}

impl<'a> State<'a> {
    fn new(input: &'a str, file: Option<String>, symbols: &'a mut SymbolTable) -> Self {
        Self {
            peekable: input.chars().peekable(),
            symbols,
            stack: Vec::new(),
            prefix: Vec::new(),
            indices: Vec::new(),
            position: Location {
                line: 1,
                column: 0,
                file,
            },
        }
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.peekable.next()?;

        match char {
            '\n' => {
                self.position.line += 1;
                self.position.column = 0;
            }
            _ => self.position.column += 1,
        }

        Some(char)
    }

    fn symbol(&mut self, name: &str) -> Value {
        Value::Symbol(self.symbols.intern(name))
    }

    fn open(&mut self, delimiter: Delimiter) {
        self.indices
            .push((self.stack.len(), delimiter, self.position.clone()));
    }

    fn close(&mut self, delimiter: Delimiter) -> Result<()> {
        let Some((index, opened, _)) = self.indices.pop() else {
            return Err(ReadError::UnmatchedParenthesis(self.position.clone()));
        };

        if opened != delimiter {
            return Err(ReadError::UnmatchedParenthesis(self.position.clone()));
        }

        let values = self.stack.split_off(index);

        let expr = match delimiter {
            Delimiter::Paren => Value::list_from(values),
            Delimiter::Bracket => Value::array(values),
            Delimiter::Brace => {
                let head = self.symbol("hash");
                Value::cons(head, Value::list_from(values))
            }
        };

        self.stack.push(expr);
        Ok(())
    }

    fn prefix(&mut self, start: Location, prefix: Prefix) {
        self.prefix.push((prefix, start, self.indices.len()));
    }

    fn prefix_close(&mut self) -> Result<()> {
        while let Some((prefix, loc, depth)) = self.prefix.pop() {
            if self.indices.len() != depth {
                self.prefix.push((prefix, loc, depth));
                break;
            }

            let Some(expr) = self.stack.pop() else {
                return Err(ReadError::UnmatchedQuote(loc));
            };

            let head = self.symbol(&prefix.to_string());
            self.stack.push(Value::list_from([head, expr]));
        }
        Ok(())
    }

    fn accumulate_while<F>(&mut self, chr: char, mut f: F) -> String
    where
        F: FnMut(char) -> bool,
    {
        let mut string: String = chr.into();

        while let Some(char) = self.peekable.next_if(|&c| f(c)) {
            self.position.column += 1;
            string.push(char);
        }

        string
    }

    fn read(&mut self) -> Result<Vec<Value>> {
        while let Some(chr) = self.advance() {
            let start = self.position.clone();
            match chr {
                ' ' | '\n' | '\r' | '\t' | ',' => continue,
                '\'' => {
                    self.prefix(start, Prefix::Quote);
                    continue;
                }
                '`' => {
                    self.prefix(start, Prefix::SyntaxQuote);
                    continue;
                }
                '~' if self.peekable.peek() == Some(&'@') => {
                    self.advance();
                    self.prefix(start, Prefix::UnquoteSplicing);
                    continue;
                }
                '~' => {
                    self.prefix(start, Prefix::Unquote);
                    continue;
                }
                ';' => {
                    self.parse_comment();
                    continue;
                }
                '(' => {
                    self.open(Delimiter::Paren);
                    continue;
                }
                '[' => {
                    self.open(Delimiter::Bracket);
                    continue;
                }
                '{' => {
                    self.open(Delimiter::Brace);
                    continue;
                }
                ')' => self.close(Delimiter::Paren)?,
                ']' => self.close(Delimiter::Bracket)?,
                '}' => self.close(Delimiter::Brace)?,
                '"' => self.parse_string(&start)?,
                '#' => self.parse_char(start)?,
                _ => self.parse_rest(chr),
            }
            self.prefix_close()?;
        }

        if let Some((_, loc, _)) = self.prefix.last() {
            return Err(ReadError::UnmatchedQuote(loc.clone()));
        }

        if let Some((_, _, loc)) = self.indices.last() {
            return Err(ReadError::UnclosedParenthesis(loc.clone()));
        }

        Ok(std::mem::take(&mut self.stack))
    }

    fn parse_rest(&mut self, chr: char) {
        let string = self.accumulate_while(chr, |c| !is_delimiter(c));

        let float = || string.parse::<f64>().ok().filter(|_| looks_numeric(&string));

        let value = if let Ok(int) = string.parse::<i64>() {
            Value::Int(int)
        } else if let Some(float) = float() {
            Value::Float(float)
        } else {
            match string.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "nil" => Value::Null,
                _ => self.symbol(&string),
            }
        };

        self.stack.push(value);
    }

    fn parse_char(&mut self, start: Location) -> Result<()> {
        let name = self.accumulate_while('#', |c| !is_delimiter(c));
        let chr = match &name[1..] {
            "space" => ' ',
            "newline" => '\n',
            "tab" => '\t',
            rest => {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(chr), None) => chr,
                    _ => return Err(ReadError::InvalidChar(start)),
                }
            }
        };
        self.stack.push(Value::Char(chr));
        Ok(())
    }

    fn parse_comment(&mut self) {
        self.accumulate_while(';', |c| c != '\n');
        self.advance();
    }

    fn parse_string(&mut self, start: &Location) -> Result<()> {
        let mut raw = String::new();

        loop {
            match self.advance() {
                None => return Err(ReadError::UnclosedString(start.clone())),
                Some('"') => break,
                Some('\\') => {
                    raw.push('\\');
                    match self.advance() {
                        Some(chr) => raw.push(chr),
                        None => return Err(ReadError::UnclosedString(start.clone())),
                    }
                }
                Some(chr) => raw.push(chr),
            }
        }

        let Some(string) = unescape::unescape(&raw) else {
            return Err(ReadError::InvalidEscape(start.clone()));
        };

        self.stack.push(Value::str(string));
        Ok(())
    }
}

fn looks_numeric(string: &str) -> bool {
    let digits = string.trim_start_matches(['-', '+']);
    digits.starts_with(|c: char| c.is_ascii_digit())
        || (digits.starts_with('.') && digits[1..].starts_with(|c: char| c.is_ascii_digit()))
}

/// Read a string and return a list of expressions.
pub fn read(input: &str, file: Option<String>, symbols: &mut SymbolTable) -> Result<Vec<Value>> {
    let mut state = State::new(input, file, symbols);
    state.read()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(input: &str) -> Value {
        let mut symbols = SymbolTable::new();
        let mut values = read(input, None, &mut symbols).unwrap();
        assert_eq!(values.len(), 1);
        values.remove(0)
    }

    #[test]
    fn reads_atoms() {
        assert_eq!(read_one("42"), Value::Int(42));
        assert_eq!(read_one("-7"), Value::Int(-7));
        assert_eq!(read_one("2.5"), Value::Float(2.5));
        assert_eq!(read_one("nil"), Value::Null);
        assert_eq!(read_one("#a"), Value::Char('a'));
        assert_eq!(read_one("#space"), Value::Char(' '));
        assert_eq!(read_one("\"a\\nb\""), Value::str("a\nb"));
        assert_eq!(read_one("nan").to_string(), "nan");
    }

    #[test]
    fn reads_collections() {
        assert_eq!(read_one("(a [1 2] {b 3})").to_string(), "(a [1 2] (hash b 3))");
    }

    #[test]
    fn reads_prefixes() {
        assert_eq!(read_one("'x").to_string(), "(quote x)");
        assert_eq!(
            read_one("`(a ~b ~@c)").to_string(),
            "(syntax-quote (a (unquote b) (unquote-splicing c)))"
        );
        assert_eq!(read_one("''x").to_string(), "(quote (quote x))");
    }

    #[test]
    fn comments_are_skipped() {
        let mut symbols = SymbolTable::new();
        let values = read("; one\n1 ; two\n2", None, &mut symbols).unwrap();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn reports_unbalanced_input() {
        let mut symbols = SymbolTable::new();
        assert!(matches!(
            read("(a b", None, &mut symbols),
            Err(ReadError::UnclosedParenthesis(_))
        ));
        assert!(matches!(
            read("a)", None, &mut symbols),
            Err(ReadError::UnmatchedParenthesis(_))
        ));
        assert!(matches!(
            read("(a]", None, &mut symbols),
            Err(ReadError::UnmatchedParenthesis(_))
        ));
        assert!(matches!(
            read("\"abc", None, &mut symbols),
            Err(ReadError::UnclosedString(_))
        ));
        assert!(matches!(read("'", None, &mut symbols), Err(ReadError::UnmatchedQuote(_))));
    }
}
