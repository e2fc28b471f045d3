//! Token scanner for the host document.
//!
//! Only the structure needed to find and read the alert section is
//! recognized: delimiters, assignments, line breaks, strings, numbers and
//! identifiers. Everything else becomes [`TokenKind::Other`]. Comments and
//! heredoc bodies are consumed so that braces inside them never count.

use crate::{CodecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Assign,
    Colon,
    Comma,
    Newline,
    Ident,
    Number,
    Str,
    Heredoc,
    Other,
}

/// A token and its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    LineComment,
    BlockComment { opened_at: usize },
    Str { opened_at: usize, escaped: bool },
    Ident { started_at: usize },
    Number { started_at: usize },
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut state = ScanState::Normal;
    let mut pos = 0usize;

    while pos < bytes.len() {
        let byte = bytes[pos];
        match state {
            ScanState::Normal => {
                let single = move |kind| Token {
                    kind,
                    start: pos,
                    end: pos + 1,
                };
                match byte {
                    b' ' | b'\t' | b'\r' => pos += 1,
                    b'\n' => {
                        tokens.push(single(TokenKind::Newline));
                        pos += 1;
                    }
                    b'#' => {
                        state = ScanState::LineComment;
                        pos += 1;
                    }
                    b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                        state = ScanState::LineComment;
                        pos += 2;
                    }
                    b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                        state = ScanState::BlockComment { opened_at: pos };
                        pos += 2;
                    }
                    b'"' => {
                        state = ScanState::Str {
                            opened_at: pos,
                            escaped: false,
                        };
                        pos += 1;
                    }
                    b'<' if bytes.get(pos + 1) == Some(&b'<') => {
                        let end = scan_heredoc(source, pos)?;
                        tokens.push(Token {
                            kind: TokenKind::Heredoc,
                            start: pos,
                            end,
                        });
                        pos = end;
                    }
                    b'{' => {
                        tokens.push(single(TokenKind::LBrace));
                        pos += 1;
                    }
                    b'}' => {
                        tokens.push(single(TokenKind::RBrace));
                        pos += 1;
                    }
                    b'[' => {
                        tokens.push(single(TokenKind::LBracket));
                        pos += 1;
                    }
                    b']' => {
                        tokens.push(single(TokenKind::RBracket));
                        pos += 1;
                    }
                    b'=' if bytes.get(pos + 1) != Some(&b'=') && !follows_operator(bytes, pos) => {
                        tokens.push(single(TokenKind::Assign));
                        pos += 1;
                    }
                    b':' => {
                        tokens.push(single(TokenKind::Colon));
                        pos += 1;
                    }
                    b',' => {
                        tokens.push(single(TokenKind::Comma));
                        pos += 1;
                    }
                    b'0'..=b'9' => state = ScanState::Number { started_at: pos },
                    b'-' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
                        state = ScanState::Number { started_at: pos };
                        pos += 1;
                    }
                    b'a'..=b'z' | b'A'..=b'Z' | b'_' => state = ScanState::Ident { started_at: pos },
                    b'=' => {
                        // `==`, `<=`, `>=`, `!=`: one opaque token
                        let end = if bytes.get(pos + 1) == Some(&b'=') {
                            pos + 2
                        } else {
                            pos + 1
                        };
                        tokens.push(Token {
                            kind: TokenKind::Other,
                            start: pos,
                            end,
                        });
                        pos = end;
                    }
                    _ => {
                        let width = source[pos..].chars().next().map_or(1, char::len_utf8);
                        tokens.push(Token {
                            kind: TokenKind::Other,
                            start: pos,
                            end: pos + width,
                        });
                        pos += width;
                    }
                }
            }
            ScanState::LineComment => {
                if byte == b'\n' {
                    state = ScanState::Normal;
                } else {
                    pos += 1;
                }
            }
            ScanState::BlockComment { .. } => {
                if byte == b'*' && bytes.get(pos + 1) == Some(&b'/') {
                    state = ScanState::Normal;
                    pos += 2;
                } else {
                    pos += 1;
                }
            }
            ScanState::Str { opened_at, escaped } => {
                pos += 1;
                if escaped {
                    state = ScanState::Str {
                        opened_at,
                        escaped: false,
                    };
                } else if byte == b'\\' {
                    state = ScanState::Str {
                        opened_at,
                        escaped: true,
                    };
                } else if byte == b'"' {
                    tokens.push(Token {
                        kind: TokenKind::Str,
                        start: opened_at,
                        end: pos,
                    });
                    state = ScanState::Normal;
                }
            }
            ScanState::Ident { started_at } => {
                if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.') {
                    pos += 1;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Ident,
                        start: started_at,
                        end: pos,
                    });
                    state = ScanState::Normal;
                }
            }
            ScanState::Number { started_at } => {
                let exponent_sign = matches!(byte, b'+' | b'-')
                    && pos > started_at
                    && matches!(bytes[pos - 1], b'e' | b'E');
                if byte.is_ascii_digit() || matches!(byte, b'.' | b'e' | b'E') || exponent_sign {
                    pos += 1;
                } else {
                    tokens.push(Token {
                        kind: TokenKind::Number,
                        start: started_at,
                        end: pos,
                    });
                    state = ScanState::Normal;
                }
            }
        }
    }

    match state {
        ScanState::Normal | ScanState::LineComment => {}
        ScanState::BlockComment { opened_at } => {
            return Err(CodecError::malformed(
                source,
                opened_at,
                "unterminated block comment",
            ));
        }
        ScanState::Str { opened_at, .. } => {
            return Err(CodecError::malformed(
                source,
                opened_at,
                "unterminated string literal",
            ));
        }
        ScanState::Ident { started_at } => tokens.push(Token {
            kind: TokenKind::Ident,
            start: started_at,
            end: bytes.len(),
        }),
        ScanState::Number { started_at } => tokens.push(Token {
            kind: TokenKind::Number,
            start: started_at,
            end: bytes.len(),
        }),
    }

    Ok(tokens)
}

/// `!=`, `<=`, `>=` end in `=`; the `=` there is not an assignment.
fn follows_operator(bytes: &[u8], pos: usize) -> bool {
    pos > 0 && matches!(bytes[pos - 1], b'!' | b'<' | b'>' | b'=')
}

/// Returns the byte offset just past the heredoc terminator line.
fn scan_heredoc(source: &str, start: usize) -> Result<usize> {
    let header_end = source[start..]
        .find('\n')
        .map(|idx| start + idx)
        .ok_or_else(|| CodecError::malformed(source, start, "heredoc without body"))?;
    let marker = source[start + 2..header_end]
        .trim_start_matches('-')
        .trim()
        .to_string();
    if marker.is_empty() || !marker.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CodecError::malformed(source, start, "invalid heredoc marker"));
    }

    let mut line_start = header_end + 1;
    while line_start <= source.len() {
        let line_end = source[line_start..]
            .find('\n')
            .map_or(source.len(), |idx| line_start + idx);
        if source[line_start..line_end].trim() == marker {
            return Ok(line_end);
        }
        if line_end == source.len() {
            break;
        }
        line_start = line_end + 1;
    }

    Err(CodecError::malformed(
        source,
        start,
        format!("heredoc `{marker}` is never closed"),
    ))
}
