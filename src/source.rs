//! Parse-tree input of the assembler, and a small reader that produces it
//! from assembly text.
//!
//! Text form: `#` comments run to end of line, `;` ends an instruction,
//! `;;` ends a bundle, and a leading `name:` labels the bundle.
//!
//! ```text
//! start: set lr0 0x10; ldr r0 lr0 cr0;;
//!        incr lr0 1; bne lr0 lr1 start;;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Location};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceToken {
    pub text: String,
    pub loc: Location,
}

impl SourceToken {
    pub fn new(text: impl Into<String>, loc: Location) -> Self {
        Self { text: text.into(), loc }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInst {
    pub opcode: SourceToken,
    #[serde(default)]
    pub operands: Vec<SourceToken>,
}

/// One bundle worth of source: an optional label and its instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    #[serde(default)]
    pub label: Option<SourceToken>,
    #[serde(default)]
    pub instructions: Vec<SourceInst>,
}

#[derive(Default)]
struct Pending {
    line: SourceLine,
    words: Vec<SourceToken>,
    touched: bool,
}

impl Pending {
    fn end_inst(&mut self) {
        let mut words = std::mem::take(&mut self.words).into_iter();
        if let Some(opcode) = words.next() {
            self.line.instructions.push(SourceInst { opcode, operands: words.collect() });
        }
    }

    fn end_bundle(&mut self, out: &mut Vec<SourceLine>) {
        self.end_inst();
        out.push(std::mem::take(&mut self.line));
        self.touched = false;
    }
}

pub fn parse_source(text: &str) -> Result<Vec<SourceLine>, AsmError> {
    let mut out = Vec::new();
    let mut cur = Pending::default();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("");
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut i = 0;
        while i < chars.len() {
            let (_, c) = chars[i];
            let loc = Location::new(lineno + 1, i + 1);
            if c.is_whitespace() || c == ',' {
                i += 1;
            } else if c == ';' {
                if chars.get(i + 1).map(|&(_, c)| c) == Some(';') {
                    cur.end_bundle(&mut out);
                    i += 2;
                } else {
                    cur.end_inst();
                    i += 1;
                }
            } else {
                let start = i;
                while i < chars.len() && !matches!(chars[i].1, ';' | ',' | ':') && !chars[i].1.is_whitespace() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                if chars.get(i).map(|&(_, c)| c) == Some(':') {
                    i += 1;
                    if word.is_empty() {
                        return Err(AsmError::Syntax { message: "empty label".into(), loc });
                    }
                    if cur.touched {
                        return Err(AsmError::Syntax {
                            message: format!("label `{word}` must start a bundle"),
                            loc,
                        });
                    }
                    cur.line.label = Some(SourceToken::new(word, loc));
                } else {
                    cur.words.push(SourceToken::new(word, loc));
                }
                cur.touched = true;
            }
        }
    }

    if cur.touched {
        if cur.words.is_empty() && cur.line.instructions.is_empty() {
            let loc = cur.line.label.as_ref().map(|l| l.loc).unwrap_or_default();
            return Err(AsmError::Syntax { message: "label without instructions".into(), loc });
        }
        cur.end_bundle(&mut out);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bundles_labels_and_comments() {
        let src = "# header\nstart: incr lr0 1; b start;;  # loop\n  bkpt;;\n";
        let lines = parse_source(src).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, Some(SourceToken::new("start", Location::new(2, 1))));
        assert_eq!(lines[0].instructions.len(), 2);
        assert_eq!(lines[0].instructions[0].opcode.text, "incr");
        assert_eq!(lines[0].instructions[0].operands[1], SourceToken::new("1", Location::new(2, 17)));
        assert_eq!(lines[0].instructions[1].operands[0].text, "start");
        assert_eq!(lines[1].instructions[0].opcode.text, "bkpt");
    }

    #[test]
    fn bundle_may_span_lines() {
        let src = "l1:\n  set lr1 5;\n  ldr r0 lr1 cr0; ;;\n";
        let lines = parse_source(src).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label.as_ref().map(|l| l.text.as_str()), Some("l1"));
        assert_eq!(lines[0].instructions.len(), 2);
    }

    #[test]
    fn trailing_bundle_without_terminator() {
        let lines = parse_source("set lr0 1; b +0").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].instructions.len(), 2);
    }

    #[test]
    fn dangling_label_is_an_error() {
        assert!(matches!(parse_source("ok: bkpt;;\nend:\n"), Err(AsmError::Syntax { .. })));
    }
}
