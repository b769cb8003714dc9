use std::collections::{HashMap, VecDeque};
use std::io::{Bytes, Read};
use std::mem;

use log::trace;

use crate::error::{Error, Pos, Result};
use crate::token::{Keyword, Lexeme, Token, SYMBOLS};

/// Pulls classified tokens out of a byte stream.
///
/// The scanner always holds one current token. Characters read past the end
/// of a token go back into `pushback`; tokens read ahead by [`Scanner::peek`]
/// wait in `replay` and are handed out by [`Scanner::advance`] before any new
/// character is read, so no token is scanned twice.
pub struct Scanner<R> {
    input: Bytes<R>,
    pushback: VecDeque<u8>,
    scan_pos: Pos,
    cur: Option<Lexeme>,
    replay: VecDeque<Lexeme>,
    keywords: HashMap<&'static str, Keyword>,
}

impl<R: Read> Scanner<R> {
    /// Creates a scanner positioned on the first token of `input`.
    pub fn new(input: R) -> Result<Self> {
        let keywords = Keyword::ALL.iter().map(|kw| (kw.as_str(), *kw)).collect();

        let mut s = Self {
            input: input.bytes(),
            pushback: VecDeque::new(),
            scan_pos: Pos::START,
            cur: None,
            replay: VecDeque::new(),
            keywords,
        };
        s.advance()?;

        Ok(s)
    }

    pub fn has_more(&self) -> bool {
        self.cur.is_some()
    }

    pub fn current(&self) -> Option<&Token> {
        self.cur.as_ref().map(|lx| &lx.tok)
    }

    /// Position of the current token, or of the end of input.
    pub fn pos(&self) -> Pos {
        self.cur.as_ref().map(|lx| lx.pos).unwrap_or(self.scan_pos)
    }

    /// Moves to the next token and returns the one it replaced.
    pub fn advance(&mut self) -> Result<Option<Token>> {
        let next = match self.replay.pop_front() {
            Some(lx) => Some(lx),
            None => self.next_token()?,
        };
        Ok(mem::replace(&mut self.cur, next).map(|lx| lx.tok))
    }

    /// Returns the token `n` positions after the current one without moving.
    /// `None` means the input ends first; `peek(0)` is always `None`.
    pub fn peek(&mut self, n: usize) -> Result<Option<&Token>> {
        if n == 0 {
            return Ok(None);
        }
        while self.replay.len() < n {
            match self.next_token()? {
                Some(lx) => self.replay.push_back(lx),
                None => break,
            }
        }
        Ok(self.replay.get(n - 1).map(|lx| &lx.tok))
    }

    fn getc(&mut self) -> Result<Option<u8>> {
        let c = match self.pushback.pop_front() {
            Some(c) => c,
            None => match self.input.next() {
                Some(c) => c?,
                None => return Ok(None),
            },
        };
        self.scan_pos = self.scan_pos.step(c);
        Ok(Some(c))
    }

    fn ungetc(&mut self, c: u8, at: Pos) {
        self.pushback.push_front(c);
        self.scan_pos = at;
    }

    fn peekc(&mut self) -> Result<Option<u8>> {
        let at = self.scan_pos;
        let c = self.getc()?;
        if let Some(c) = c {
            self.ungetc(c, at);
        }
        Ok(c)
    }

    fn scan(&mut self, buf: &mut Vec<u8>, accept: impl Fn(u8) -> bool) -> Result<()> {
        while let Some(c) = self.peekc()? {
            if !accept(c) {
                break;
            }
            self.getc()?;
            buf.push(c);
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(c) = self.peekc()? {
            if !c.is_ascii_whitespace() {
                break;
            }
            self.getc()?;
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) -> Result<()> {
        while let Some(c) = self.getc()? {
            if c == b'\n' {
                break;
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self, start: Pos) -> Result<()> {
        let mut prev = 0u8;
        loop {
            match self.getc()? {
                None => return Err(Error::UnterminatedComment(start)),
                Some(b'/') if prev == b'*' => return Ok(()),
                Some(c) => prev = c,
            }
        }
    }

    fn next_string(&mut self, start: Pos) -> Result<Token> {
        let mut s = Vec::new();
        loop {
            match self.getc()? {
                None => return Err(Error::UnterminatedString(start)),
                Some(b'"') => break,
                Some(c) => s.push(c),
            }
        }
        String::from_utf8(s)
            .map(Token::StringConst)
            .map_err(|_| Error::InvalidString(start))
    }

    fn next_int(&mut self, first: u8) -> Result<Token> {
        let mut digits = vec![first];
        self.scan(&mut digits, |c| c.is_ascii_digit())?;
        // range is checked by the parser; saturate so oversized runs still fail there
        let value = digits.iter().fold(0u32, |n, &d| {
            n.saturating_mul(10).saturating_add((d - b'0') as u32)
        });
        Ok(Token::IntConst(value))
    }

    fn next_ident_or_keyword(&mut self, first: u8) -> Result<Token> {
        let mut word = vec![first];
        self.scan(&mut word, |c| c.is_ascii_alphanumeric() || c == b'_')?;
        let word: String = word.into_iter().map(char::from).collect();
        Ok(self
            .keywords
            .get(word.as_str())
            .map(|kw| Token::Keyword(*kw))
            .unwrap_or(Token::Ident(word)))
    }

    fn next_token(&mut self) -> Result<Option<Lexeme>> {
        loop {
            self.skip_whitespace()?;
            let pos = self.scan_pos;
            let c = match self.getc()? {
                Some(c) => c,
                None => return Ok(None),
            };
            let tok = match c {
                b'/' => match self.peekc()? {
                    Some(b'/') => {
                        self.skip_line_comment()?;
                        continue;
                    }
                    Some(b'*') => {
                        self.getc()?;
                        self.skip_block_comment(pos)?;
                        continue;
                    }
                    _ => Token::Symbol('/'),
                },
                c if SYMBOLS.contains(&c) => Token::Symbol(c as char),
                b'"' => self.next_string(pos)?,
                c if c.is_ascii_digit() => self.next_int(c)?,
                c if c.is_ascii_alphabetic() => self.next_ident_or_keyword(c)?,
                c => return Err(Error::UnexpectedChar(pos, c as char)),
            };
            trace!("{}: {} {}", pos, tok.kind_str(), tok);
            return Ok(Some(Lexeme { tok, pos }));
        }
    }
}
