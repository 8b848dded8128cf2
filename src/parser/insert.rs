//! INSERT statement row parser.
//!
//! Parses `INSERT INTO t (cols) VALUES (...), (...)` into typed literals so
//! that generated load scripts can be inspected without a database.

/// A literal value inside a VALUES tuple
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    /// Numeric literal kept as written (`42`, `-1`, `123.45`)
    Number(String),
    /// Unescaped string contents
    Text(String),
}

impl Literal {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Number(n) => n.parse().ok(),
            _ => None,
        }
    }
}

/// A parsed multi-row INSERT
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Literal>>,
}

pub struct InsertParser<'a> {
    stmt: &'a [u8],
    pos: usize,
}

impl<'a> InsertParser<'a> {
    pub fn new(stmt: &'a str) -> Self {
        Self {
            stmt: stmt.as_bytes(),
            pos: 0,
        }
    }

    pub fn parse(&mut self) -> anyhow::Result<InsertStatement> {
        self.skip_whitespace();
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.parse_identifier()?;

        self.skip_whitespace();
        let columns = if self.peek() == Some(b'(') {
            self.parse_column_list()?
        } else {
            Vec::new()
        };

        self.expect_keyword("VALUES")?;

        let mut rows = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'(') => {
                    let row = self.parse_row()?;
                    if !columns.is_empty() && row.len() != columns.len() {
                        anyhow::bail!(
                            "row {} of {} has {} values for {} columns",
                            rows.len() + 1,
                            table,
                            row.len(),
                            columns.len()
                        );
                    }
                    rows.push(row);
                }
                Some(b',') => self.pos += 1,
                Some(b';') | None => break,
                Some(other) => anyhow::bail!(
                    "unexpected '{}' at byte {} in VALUES list",
                    other as char,
                    self.pos
                ),
            }
        }

        if rows.is_empty() {
            anyhow::bail!("INSERT into {} has no VALUES tuples", table);
        }

        Ok(InsertStatement {
            table,
            columns,
            rows,
        })
    }

    fn expect_keyword(&mut self, keyword: &str) -> anyhow::Result<()> {
        self.skip_whitespace();
        let end = self.pos + keyword.len();
        if end <= self.stmt.len() && self.stmt[self.pos..end].eq_ignore_ascii_case(keyword.as_bytes())
        {
            self.pos = end;
            Ok(())
        } else {
            anyhow::bail!("expected {} at byte {}", keyword, self.pos)
        }
    }

    fn parse_identifier(&mut self) -> anyhow::Result<String> {
        self.skip_whitespace();
        if self.peek() == Some(b'"') {
            self.pos += 1;
            let start = self.pos;
            while self.pos < self.stmt.len() && self.stmt[self.pos] != b'"' {
                self.pos += 1;
            }
            let name = String::from_utf8_lossy(&self.stmt[start..self.pos]).into_owned();
            self.pos += 1;
            return Ok(name);
        }

        let start = self.pos;
        while self.pos < self.stmt.len() {
            let b = self.stmt[self.pos];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            anyhow::bail!("expected identifier at byte {}", start);
        }
        Ok(String::from_utf8_lossy(&self.stmt[start..self.pos]).into_owned())
    }

    fn parse_column_list(&mut self) -> anyhow::Result<Vec<String>> {
        self.pos += 1; // '('
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_identifier()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(columns);
                }
                _ => anyhow::bail!("unterminated column list"),
            }
        }
    }

    /// Parse a single row "(val1, val2, ...)"
    fn parse_row(&mut self) -> anyhow::Result<Vec<Literal>> {
        self.pos += 1; // '('
        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            values.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(values);
                }
                _ => anyhow::bail!("unterminated VALUES tuple at byte {}", self.pos),
            }
        }
    }

    fn parse_value(&mut self) -> anyhow::Result<Literal> {
        match self.peek() {
            Some(b'\'') => self.parse_string_value(),
            Some(b) if b == b'-' || b.is_ascii_digit() => Ok(self.parse_number_value()),
            Some(_) => {
                let end = self.pos + 4;
                if end <= self.stmt.len() && self.stmt[self.pos..end].eq_ignore_ascii_case(b"NULL") {
                    self.pos = end;
                    Ok(Literal::Null)
                } else {
                    anyhow::bail!("unsupported literal at byte {}", self.pos)
                }
            }
            None => anyhow::bail!("unexpected end of statement"),
        }
    }

    /// Parse a string literal 'value', where '' is an embedded quote
    fn parse_string_value(&mut self) -> anyhow::Result<Literal> {
        self.pos += 1;
        let mut value = Vec::new();

        while self.pos < self.stmt.len() {
            let b = self.stmt[self.pos];
            if b == b'\'' {
                if self.stmt.get(self.pos + 1) == Some(&b'\'') {
                    value.push(b'\'');
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                return Ok(Literal::Text(String::from_utf8_lossy(&value).into_owned()));
            }
            value.push(b);
            self.pos += 1;
        }

        anyhow::bail!("unterminated string literal")
    }

    fn parse_number_value(&mut self) -> Literal {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.pos < self.stmt.len() {
            let b = self.stmt[self.pos];
            if b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Literal::Number(String::from_utf8_lossy(&self.stmt[start..self.pos]).into_owned())
    }

    fn peek(&self) -> Option<u8> {
        self.stmt.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.stmt.len() && self.stmt[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multi_row_insert() {
        let sql = "INSERT INTO patients (patient_id, last_name, mrn) VALUES\n(1, 'O''Brien', 'MRNab123'),\n(2, NULL, 'MRNzz999');";
        let parsed = InsertParser::new(sql).parse().unwrap();

        assert_eq!(parsed.table, "patients");
        assert_eq!(parsed.columns, vec!["patient_id", "last_name", "mrn"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0][1], Literal::Text("O'Brien".to_string()));
        assert_eq!(parsed.rows[1][1], Literal::Null);
        assert_eq!(parsed.rows[1][0].as_i64(), Some(2));
    }

    #[test]
    fn test_decimal_and_negative() {
        let parsed = InsertParser::new("INSERT INTO billing (a, b) VALUES (123.45, -7)")
            .parse()
            .unwrap();
        assert_eq!(parsed.rows[0][0], Literal::Number("123.45".to_string()));
        assert_eq!(parsed.rows[0][1].as_i64(), Some(-7));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let err = InsertParser::new("INSERT INTO t (a, b) VALUES (1)").parse();
        assert!(err.is_err());
    }

    #[test]
    fn test_not_an_insert() {
        assert!(InsertParser::new("SELECT 1").parse().is_err());
    }

    #[test]
    fn test_unterminated_string() {
        assert!(InsertParser::new("INSERT INTO t (a) VALUES ('abc)").parse().is_err());
    }
}
