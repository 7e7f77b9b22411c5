//! Line-oriented reader of vertical files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::error::{Result, SyncollError};
use crate::vertical::token::TokenRow;

/// One meaningful line of a vertical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerticalLine {
    Token(TokenRow),
    /// Opening (or self-closing) structure tag, e.g. `<doc id="x">`.
    StructOpen { line: usize, name: String },
    /// Closing structure tag, e.g. `</doc>`.
    StructClose { line: usize, name: String },
}

/// Consumer of a vertical file. Structure callbacks default to no-ops.
pub trait TokenProcessor {
    /// Process one token row. Rows the processor cannot use should be
    /// skipped with a warning rather than reported as an error.
    fn proc_token(&mut self, row: &TokenRow) -> Result<()>;

    fn proc_struct(&mut self, _name: &str, _line: usize) -> Result<()> {
        Ok(())
    }

    fn proc_struct_close(&mut self, _name: &str, _line: usize) -> Result<()> {
        Ok(())
    }
}

/// Counts collected while driving a processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub tokens: usize,
    pub structures: usize,
}

/// Iterator over the lines of a vertical file. Empty lines are skipped.
pub struct VerticalReader<R: BufRead> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl VerticalReader<BufReader<File>> {
    /// Open a vertical file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            SyncollError::malformed(format!(
                "failed to open vertical file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Ok(VerticalReader::new(BufReader::new(file)))
    }
}

impl<R: BufRead> VerticalReader<R> {
    pub fn new(reader: R) -> Self {
        VerticalReader {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }

    fn classify(line_no: usize, raw: &str) -> VerticalLine {
        let is_tag = raw.starts_with('<') && raw.ends_with('>') && !raw.contains('\t');
        if !is_tag {
            return VerticalLine::Token(TokenRow::parse(line_no, raw));
        }
        if let Some(rest) = raw.strip_prefix("</") {
            let name = rest.trim_end_matches('>').trim().to_string();
            return VerticalLine::StructClose {
                line: line_no,
                name,
            };
        }
        let name = raw[1..]
            .trim_end_matches('>')
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        VerticalLine::StructOpen {
            line: line_no,
            name,
        }
    }
}

impl<R: BufRead> Iterator for VerticalReader<R> {
    type Item = Result<VerticalLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    self.line_no += 1;
                    let raw = self.buf.trim_end_matches(['\n', '\r']);
                    if raw.trim().is_empty() {
                        continue;
                    }
                    return Some(Ok(Self::classify(self.line_no, raw)));
                }
                Err(e) => {
                    return Some(Err(SyncollError::malformed(format!(
                        "failed to read line {}: {e}",
                        self.line_no + 1
                    ))));
                }
            }
        }
    }
}

/// Drive `proc` over an already opened vertical stream.
pub fn parse_vertical_reader<R: BufRead>(
    reader: VerticalReader<R>,
    proc: &mut dyn TokenProcessor,
) -> Result<ParseStats> {
    let mut stats = ParseStats::default();
    for line in reader {
        stats.lines += 1;
        match line? {
            VerticalLine::Token(row) => {
                stats.tokens += 1;
                proc.proc_token(&row)?;
            }
            VerticalLine::StructOpen { line, name } => {
                stats.structures += 1;
                proc.proc_struct(&name, line)?;
            }
            VerticalLine::StructClose { line, name } => {
                proc.proc_struct_close(&name, line)?;
            }
        }
    }
    debug!(
        "vertical parsed: {} lines, {} tokens, {} structures",
        stats.lines, stats.tokens, stats.structures
    );
    Ok(stats)
}

/// Open the vertical file at `path` and drive `proc` over it.
pub fn parse_vertical<P: AsRef<Path>>(path: P, proc: &mut dyn TokenProcessor) -> Result<ParseStats> {
    parse_vertical_reader(VerticalReader::open(path)?, proc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[derive(Default)]
    struct Recorder {
        tokens: Vec<(usize, String)>,
        opened: Vec<String>,
        closed: Vec<String>,
    }

    impl TokenProcessor for Recorder {
        fn proc_token(&mut self, row: &TokenRow) -> Result<()> {
            self.tokens.push((row.line, row.columns[0].clone()));
            Ok(())
        }

        fn proc_struct(&mut self, name: &str, _line: usize) -> Result<()> {
            self.opened.push(name.to_string());
            Ok(())
        }

        fn proc_struct_close(&mut self, name: &str, _line: usize) -> Result<()> {
            self.closed.push(name.to_string());
            Ok(())
        }
    }

    const SAMPLE: &str = "<doc id=\"d1\">\n<s>\nThe\tthe\tDET\nteam\tteam\tNOUN\n\n</s>\n<g/>\n.\t.\tPUNCT\n</doc>\n";

    #[test]
    fn test_classification() {
        let lines: Vec<_> = VerticalReader::new(Cursor::new(SAMPLE))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(lines.len(), 8);
        assert_eq!(
            lines[0],
            VerticalLine::StructOpen {
                line: 1,
                name: "doc".to_string()
            }
        );
        assert!(matches!(&lines[2], VerticalLine::Token(row) if row.line == 3 && row.len() == 3));
        assert_eq!(
            lines[4],
            VerticalLine::StructClose {
                line: 6,
                name: "s".to_string()
            }
        );
        assert_eq!(
            lines[5],
            VerticalLine::StructOpen {
                line: 7,
                name: "g".to_string()
            }
        );
    }

    #[test]
    fn test_tab_separated_angle_bracket_is_a_token() {
        let lines: Vec<_> = VerticalReader::new(Cursor::new("<\t<\tPUNCT\n"))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert!(matches!(&lines[0], VerticalLine::Token(_)));
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();
        file.flush().unwrap();

        let mut recorder = Recorder::default();
        let stats = parse_vertical(file.path(), &mut recorder).unwrap();

        assert_eq!(stats.tokens, 3);
        assert_eq!(stats.structures, 3);
        assert_eq!(
            recorder.tokens,
            vec![
                (3, "The".to_string()),
                (4, "team".to_string()),
                (8, ".".to_string())
            ]
        );
        assert_eq!(recorder.opened, vec!["doc", "s", "g"]);
        assert_eq!(recorder.closed, vec!["s", "doc"]);
    }

    #[test]
    fn test_missing_file() {
        let mut recorder = Recorder::default();
        let err = parse_vertical("/nonexistent/file.vrt", &mut recorder).unwrap_err();
        assert!(matches!(err, SyncollError::MalformedInput(_)));
    }
}
