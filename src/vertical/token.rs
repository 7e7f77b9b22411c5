//! Token rows and their syntactic view.

use crate::config::SyntaxProps;

/// One token line of a vertical file, split into its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    /// 1-based line number in the source file.
    pub line: usize,
    /// All columns, the word form being column 0.
    pub columns: Vec<String>,
}

impl TokenRow {
    pub fn new(line: usize, columns: Vec<String>) -> Self {
        TokenRow { line, columns }
    }

    /// Split a raw line at tabs.
    pub fn parse(line: usize, raw: &str) -> Self {
        TokenRow {
            line,
            columns: raw.split('\t').map(str::to_string).collect(),
        }
    }

    pub fn column(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The syntactic attributes of a token, borrowed from its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub lemma: &'a str,
    pub upos: &'a str,
    /// Possibly a multi-value expression such as `obj|iobj`.
    pub deprel: &'a str,
    pub p_lemma: &'a str,
    pub p_upos: &'a str,
}

/// Column positions of the syntactic attributes, resolved from a corpus'
/// [`SyntaxProps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLayout {
    lemma: usize,
    upos: usize,
    deprel: usize,
    p_lemma: usize,
    p_upos: usize,
    min_columns: usize,
}

impl TokenLayout {
    pub fn from_syntax(conf: &SyntaxProps) -> Self {
        TokenLayout {
            lemma: conf.lemma_attr.vertical_col,
            upos: conf.pos_attr.vertical_col,
            deprel: conf.func_attr.vertical_col,
            p_lemma: conf.par_lemma_attr.vertical_col,
            p_upos: conf.par_pos_attr.vertical_col,
            min_columns: conf.min_token_columns(),
        }
    }

    /// Number of columns a row needs for [`TokenLayout::token`] to succeed.
    pub fn min_columns(&self) -> usize {
        self.min_columns
    }

    /// Lemma and part of speech only; used by passes that do not look at
    /// the dependency columns.
    pub fn lemma_upos<'a>(&self, row: &'a TokenRow) -> Option<(&'a str, &'a str)> {
        if row.len() < self.min_columns {
            return None;
        }
        Some((row.column(self.lemma)?, row.column(self.upos)?))
    }

    /// Extract the syntactic view of a row, or `None` if the row has too
    /// few columns.
    pub fn token<'a>(&self, row: &'a TokenRow) -> Option<Token<'a>> {
        if row.len() < self.min_columns {
            return None;
        }
        Some(Token {
            lemma: row.column(self.lemma)?,
            upos: row.column(self.upos)?,
            deprel: row.column(self.deprel)?,
            p_lemma: row.column(self.p_lemma)?,
            p_upos: row.column(self.p_upos)?,
        })
    }
}
