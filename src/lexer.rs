use std::iter::Peekable;
use std::str::CharIndices;

pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/// Word characters include `.` and `$` so `table.column` and `$directive`
/// each scan as a single span.
pub fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '$')
}

pub fn is_operator(ch: char) -> bool {
    matches!(ch, '!' | '>' | '<' | '=')
}

pub fn is_bracket(ch: char) -> bool {
    matches!(ch, '(' | ')' | '[' | ']')
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SpanClass {
    Word,
    Operator,
    Bracket,
}

/// A lexical span of one line, as a byte range into that line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub class: SpanClass,
}

/// Splits a single script line into word, operator and bracket runs.
pub struct Lexer<'a> {
    line: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            chars: line.char_indices().peekable(),
        }
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.line.len())
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| is_whitespace(c)).is_some() {}
    }

    /// Consume the longest run of characters matching `class_of`.
    fn run(&mut self, class_of: fn(char) -> bool) -> Option<(usize, usize)> {
        let start = self.pos();
        while self.chars.next_if(|&(_, c)| class_of(c)).is_some() {}
        let end = self.pos();
        (end > start).then_some((start, end))
    }

    pub fn spans(&mut self) -> Vec<Span> {
        let mut spans = Vec::new();

        loop {
            self.skip_whitespace();
            if self.chars.peek().is_none() {
                break;
            }

            let classes: [(fn(char) -> bool, SpanClass); 3] = [
                (is_word, SpanClass::Word),
                (is_operator, SpanClass::Operator),
                (is_bracket, SpanClass::Bracket),
            ];

            let found = classes
                .iter()
                .find_map(|&(class_of, class)| self.run(class_of).map(|r| (r, class)));

            match found {
                Some(((start, end), class)) => spans.push(Span { start, end, class }),
                // Anything else is dropped one character at a time.
                None => {
                    self.chars.next();
                }
            }
        }

        spans
    }

    pub fn split(mut self) -> Vec<&'a str> {
        let line = self.line;
        self.spans()
            .into_iter()
            .map(|span| &line[span.start..span.end])
            .collect()
    }
}

/// Convenience wrapper around [`Lexer::split`].
pub fn split_line(line: &str) -> Vec<&str> {
    Lexer::new(line).split()
}

/// Byte offset just past the leading word of `line` and the whitespace that
/// follows it.
pub fn skip_leading_word(line: &str) -> usize {
    let after_word = line
        .char_indices()
        .find(|&(_, c)| !is_word(c))
        .map(|(i, _)| i)
        .unwrap_or(line.len());

    line[after_word..]
        .char_indices()
        .find(|&(_, c)| !is_whitespace(c))
        .map(|(i, _)| after_word + i)
        .unwrap_or(line.len())
}
