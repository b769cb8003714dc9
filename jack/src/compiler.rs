use std::io::{Read, Write};

use log::{debug, trace};

use crate::error::{Error, Pos, Result};
use crate::scanner::Scanner;
use crate::symbols::{Kind, SymbolTable};
use crate::token::{Keyword, Token};
use crate::vm::{Command, Segment, VmWriter};
use crate::Options;

const ALLOC_FUNC: &str = "Memory.alloc";
const MULTIPLY_FUNC: &str = "Math.multiply";
const DIVIDE_FUNC: &str = "Math.divide";
const STRING_NEW_FUNC: &str = "String.new";
const STRING_APPEND_FUNC: &str = "String.appendChar";

const MAX_INT: u32 = 32767;

/// How a binary operator is emitted: a native command or a call into the
/// math library.
#[derive(Clone, Copy)]
enum BinaryOp {
    Native(Command),
    Call(&'static str),
}

fn binary_op(tok: Option<&Token>) -> Option<BinaryOp> {
    let op = match tok {
        Some(Token::Symbol(c)) => *c,
        _ => return None,
    };
    let op = match op {
        '+' => BinaryOp::Native(Command::Add),
        '-' => BinaryOp::Native(Command::Sub),
        '&' => BinaryOp::Native(Command::And),
        '|' => BinaryOp::Native(Command::Or),
        '<' => BinaryOp::Native(Command::Lt),
        '>' => BinaryOp::Native(Command::Gt),
        '=' => BinaryOp::Native(Command::Eq),
        '*' => BinaryOp::Call(MULTIPLY_FUNC),
        '/' => BinaryOp::Call(DIVIDE_FUNC),
        _ => return None,
    };
    Some(op)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubKind {
    Constructor,
    Function,
    Method,
}

/// Where a resolved variable lives.
struct Storage {
    seg: Segment,
    index: u32,
    ty: String,
}

fn segment_of(kind: Kind) -> Segment {
    match kind {
        Kind::Static => Segment::Static,
        Kind::Field => Segment::This,
        Kind::Argument => Segment::Argument,
        Kind::Local => Segment::Local,
    }
}

/// Single-pass translator for one class.
///
/// Each grammar production checks and consumes its tokens, records
/// declarations in the class or subroutine scope, and writes VM
/// instructions as soon as a construct is recognized. No syntax tree is
/// built.
pub struct Compiler<R, W> {
    scanner: Scanner<R>,
    writer: VmWriter<W>,
    class_syms: SymbolTable,
    sub_syms: SymbolTable,
    cls_name: String,
    sub_name: String,
    sub_kind: SubKind,
    labels: usize,
    indent: usize,
}

impl<R: Read, W: Write> Compiler<R, W> {
    pub fn new(input: R, output: W, options: &Options) -> Result<Self> {
        Ok(Self {
            scanner: Scanner::new(input)?,
            writer: VmWriter::new(output),
            class_syms: SymbolTable::new(),
            sub_syms: SymbolTable::new(),
            cls_name: String::new(),
            sub_name: String::new(),
            sub_kind: SubKind::Function,
            labels: 0,
            indent: options.indent,
        })
    }

    /// Compiles the class and hands back the output sink.
    pub fn compile_class(mut self) -> Result<W> {
        self.class_decl()?;
        if self.scanner.has_more() {
            fatal_expected!(self.scanner, "end of input");
        }
        self.writer.flush()?;
        Ok(self.writer.into_inner())
    }

    fn consume(&mut self) -> Result<()> {
        self.scanner.advance()?;
        Ok(())
    }

    fn at_symbol(&self, c: char) -> bool {
        self.scanner.current().map_or(false, |tok| tok.is_symbol(c))
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.scanner.current().map_or(false, |tok| tok.is_keyword(kw))
    }

    fn at_any_keyword(&self, kws: &[Keyword]) -> bool {
        kws.iter().any(|kw| self.at_keyword(*kw))
    }

    fn want_symbol(&mut self, c: char) -> Result<bool> {
        if self.at_symbol(c) {
            self.consume()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_symbol(&mut self, c: char) -> Result<()> {
        if !self.want_symbol(c)? {
            fatal_expected!(self.scanner, "'{}'", c);
        }
        Ok(())
    }

    fn expect_keyword(&mut self, accept: &[Keyword]) -> Result<Keyword> {
        match self.scanner.current() {
            Some(Token::Keyword(kw)) if accept.contains(kw) => {
                let kw = *kw;
                self.consume()?;
                Ok(kw)
            }
            _ => {
                let names: Vec<_> = accept
                    .iter()
                    .map(|kw| format!("'{}'", kw.as_str()))
                    .collect();
                fatal_expected!(self.scanner, "{}", names.join(" or "))
            }
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.scanner.current() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.consume()?;
                Ok(name)
            }
            _ => fatal_expected!(self.scanner, "identifier"),
        }
    }

    fn expect_type(&mut self) -> Result<String> {
        match self.scanner.current() {
            Some(Token::Keyword(kw @ (Keyword::Int | Keyword::Char | Keyword::Boolean))) => {
                let name = kw.as_str().to_string();
                self.consume()?;
                Ok(name)
            }
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.consume()?;
                Ok(name)
            }
            _ => fatal_expected!(self.scanner, "type"),
        }
    }

    fn declare(
        table: &mut SymbolTable,
        name: &str,
        ty: &str,
        kind: Kind,
        pos: Pos,
    ) -> Result<()> {
        table
            .define(name, ty, kind)
            .map_err(|source| Error::Redefined { pos, source })?;
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Storage> {
        self.sub_syms
            .get(name)
            .or_else(|| self.class_syms.get(name))
            .map(|sym| Storage {
                seg: segment_of(sym.kind),
                index: sym.index,
                ty: sym.ty.clone(),
            })
    }

    fn resolve(&self, name: &str, pos: Pos) -> Result<Storage> {
        match self.lookup(name) {
            Some(var) => Ok(var),
            None => fatal!(Error::Undefined {
                pos,
                name: name.to_string(),
            }),
        }
    }

    fn new_label(&mut self) -> String {
        let label = format!("{}_{}", self.cls_name, self.labels);
        self.labels += 1;
        label
    }

    fn class_decl(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Class])?;
        self.cls_name = self.expect_ident()?;
        self.class_syms.reset();
        debug!("compiling class {}", self.cls_name);
        self.expect_symbol('{')?;

        while self.at_any_keyword(&[Keyword::Static, Keyword::Field]) {
            self.class_var_decl()?;
        }
        while self.at_any_keyword(&[Keyword::Constructor, Keyword::Function, Keyword::Method]) {
            self.subroutine_decl()?;
        }

        if !self.want_symbol('}')? {
            fatal_expected!(
                self.scanner,
                "'constructor', 'function', 'method' or '}}'"
            );
        }
        Ok(())
    }

    fn class_var_decl(&mut self) -> Result<()> {
        let kind = match self.expect_keyword(&[Keyword::Static, Keyword::Field])? {
            Keyword::Static => Kind::Static,
            _ => Kind::Field,
        };
        let ty = self.expect_type()?;
        loop {
            let pos = self.scanner.pos();
            let name = self.expect_ident()?;
            Self::declare(&mut self.class_syms, &name, &ty, kind, pos)?;
            if !self.want_symbol(',')? {
                break;
            }
        }
        self.expect_symbol(';')
    }

    fn subroutine_decl(&mut self) -> Result<()> {
        self.sub_syms.reset();
        self.sub_kind = match self.expect_keyword(&[
            Keyword::Constructor,
            Keyword::Function,
            Keyword::Method,
        ])? {
            Keyword::Constructor => SubKind::Constructor,
            Keyword::Method => SubKind::Method,
            _ => SubKind::Function,
        };

        if self.sub_kind == SubKind::Method {
            let pos = self.scanner.pos();
            Self::declare(&mut self.sub_syms, "this", &self.cls_name, Kind::Argument, pos)?;
        }

        match self.scanner.current() {
            Some(Token::Keyword(Keyword::Void)) => self.consume()?,
            Some(Token::Keyword(Keyword::Int | Keyword::Char | Keyword::Boolean))
            | Some(Token::Ident(_)) => {
                self.expect_type()?;
            }
            _ => fatal_expected!(self.scanner, "'void' or type"),
        }

        self.sub_name = self.expect_ident()?;
        debug!(
            "compiling {:?} {}.{}",
            self.sub_kind, self.cls_name, self.sub_name
        );
        self.expect_symbol('(')?;
        self.parameter_list()?;
        self.expect_symbol(')')?;
        self.subroutine_body()
    }

    fn parameter_list(&mut self) -> Result<()> {
        if self.at_symbol(')') {
            return Ok(());
        }
        loop {
            let ty = self.expect_type()?;
            let pos = self.scanner.pos();
            let name = self.expect_ident()?;
            Self::declare(&mut self.sub_syms, &name, &ty, Kind::Argument, pos)?;
            if !self.want_symbol(',')? {
                break Ok(());
            }
        }
    }

    fn subroutine_body(&mut self) -> Result<()> {
        self.expect_symbol('{')?;
        while self.at_keyword(Keyword::Var) {
            self.var_decl()?;
        }
        trace!(
            "{}.{} symbols:\n{}",
            self.cls_name,
            self.sub_name,
            self.sub_syms
        );

        // the local count is only known once every var declaration is read
        let name = format!("{}.{}", self.cls_name, self.sub_name);
        self.writer
            .function(&name, self.sub_syms.count_of(Kind::Local))?;
        self.writer.set_indent(self.indent);

        match self.sub_kind {
            SubKind::Method => {
                self.writer.push(Segment::Argument, 0)?;
                self.writer.pop(Segment::Pointer, 0)?;
            }
            SubKind::Constructor => {
                self.writer
                    .push(Segment::Constant, self.class_syms.count_of(Kind::Field))?;
                self.writer.call(ALLOC_FUNC, 1)?;
                self.writer.pop(Segment::Pointer, 0)?;
            }
            SubKind::Function => {}
        }

        self.statements()?;
        self.block_end()?;
        self.writer.set_indent(0);
        Ok(())
    }

    fn var_decl(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Var])?;
        let ty = self.expect_type()?;
        loop {
            let pos = self.scanner.pos();
            let name = self.expect_ident()?;
            Self::declare(&mut self.sub_syms, &name, &ty, Kind::Local, pos)?;
            if !self.want_symbol(',')? {
                break;
            }
        }
        self.expect_symbol(';')
    }

    fn block_end(&mut self) -> Result<()> {
        if !self.want_symbol('}')? {
            fatal_expected!(self.scanner, "statement or '}}'");
        }
        Ok(())
    }

    fn statements(&mut self) -> Result<()> {
        loop {
            match self.scanner.current() {
                Some(Token::Keyword(Keyword::Let)) => self.let_stmt()?,
                Some(Token::Keyword(Keyword::If)) => self.if_stmt()?,
                Some(Token::Keyword(Keyword::While)) => self.while_stmt()?,
                Some(Token::Keyword(Keyword::Do)) => self.do_stmt()?,
                Some(Token::Keyword(Keyword::Return)) => self.return_stmt()?,
                _ => break Ok(()),
            }
        }
    }

    fn let_stmt(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Let])?;
        let pos = self.scanner.pos();
        let name = self.expect_ident()?;
        let target = self.resolve(&name, pos)?;

        let is_array = self.want_symbol('[')?;
        if is_array {
            self.expr()?;
            self.writer.push(target.seg, target.index)?;
            self.writer.arithmetic(Command::Add)?;
            self.expect_symbol(']')?;
        }

        self.expect_symbol('=')?;
        self.expr()?;

        if is_array {
            self.writer.pop(Segment::Temp, 0)?;
            self.writer.pop(Segment::Pointer, 1)?;
            self.writer.push(Segment::Temp, 0)?;
            self.writer.pop(Segment::That, 0)?;
        } else {
            self.writer.pop(target.seg, target.index)?;
        }

        self.expect_symbol(';')
    }

    fn if_stmt(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::If])?;
        self.expect_symbol('(')?;

        let end_label = self.new_label();
        let else_label = self.new_label();

        self.expr()?;
        self.writer.arithmetic(Command::Not)?;
        self.writer.if_goto(&else_label)?;
        self.expect_symbol(')')?;

        self.expect_symbol('{')?;
        self.statements()?;
        self.block_end()?;

        self.writer.goto(&end_label)?;
        self.writer.label(&else_label)?;

        if self.at_keyword(Keyword::Else) {
            self.consume()?;
            self.expect_symbol('{')?;
            self.statements()?;
            self.block_end()?;
        }

        self.writer.label(&end_label)?;
        Ok(())
    }

    fn while_stmt(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::While])?;
        self.expect_symbol('(')?;

        let begin_label = self.new_label();
        let end_label = self.new_label();

        self.writer.label(&begin_label)?;
        self.expr()?;
        self.writer.arithmetic(Command::Not)?;
        self.writer.if_goto(&end_label)?;
        self.expect_symbol(')')?;

        self.expect_symbol('{')?;
        self.statements()?;
        self.block_end()?;

        self.writer.goto(&begin_label)?;
        self.writer.label(&end_label)?;
        Ok(())
    }

    fn do_stmt(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Do])?;
        self.subroutine_call()?;
        // discard the return value
        self.writer.pop(Segment::Temp, 0)?;
        self.expect_symbol(';')
    }

    fn return_stmt(&mut self) -> Result<()> {
        self.expect_keyword(&[Keyword::Return])?;
        if self.at_symbol(';') {
            self.writer.push(Segment::Constant, 0)?;
        } else {
            self.expr()?;
        }
        self.writer.ret()?;
        self.expect_symbol(';')
    }

    fn subroutine_call(&mut self) -> Result<()> {
        let name = self.expect_ident()?;

        let (callee, receiver) = if self.want_symbol('.')? {
            let sub_name = self.expect_ident()?;
            match self.lookup(&name) {
                // a variable: call the method on its class with the object as receiver
                Some(var) => {
                    self.writer.push(var.seg, var.index)?;
                    (format!("{}.{}", var.ty, sub_name), 1)
                }
                None => (format!("{}.{}", name, sub_name), 0),
            }
        } else if self.sub_kind != SubKind::Function {
            self.writer.push(Segment::Pointer, 0)?;
            (format!("{}.{}", self.cls_name, name), 1)
        } else {
            // plain functions emit the bare name, unqualified
            (name, 0)
        };

        self.expect_symbol('(')?;
        let args = self.expr_list()?;
        self.expect_symbol(')')?;

        self.writer.call(&callee, args + receiver)?;
        Ok(())
    }

    fn expr_list(&mut self) -> Result<u32> {
        if self.at_symbol(')') {
            return Ok(0);
        }
        self.expr()?;
        let mut n = 1;
        while self.want_symbol(',')? {
            self.expr()?;
            n += 1;
        }
        Ok(n)
    }

    fn expr(&mut self) -> Result<()> {
        self.term()?;
        while let Some(op) = binary_op(self.scanner.current()) {
            self.consume()?;
            self.term()?;
            match op {
                BinaryOp::Native(cmd) => self.writer.arithmetic(cmd)?,
                BinaryOp::Call(func) => self.writer.call(func, 2)?,
            }
        }
        Ok(())
    }

    fn term(&mut self) -> Result<()> {
        let pos = self.scanner.pos();
        match self.scanner.current().cloned() {
            Some(Token::Ident(name)) => {
                let next = self.scanner.peek(1)?;
                let is_index = matches!(next, Some(Token::Symbol('[')));
                let is_call = matches!(next, Some(Token::Symbol('(' | '.')));

                if is_call {
                    return self.subroutine_call();
                }

                let var = self.resolve(&name, pos)?;
                self.consume()?;
                if is_index {
                    self.expect_symbol('[')?;
                    self.expr()?;
                    self.writer.push(var.seg, var.index)?;
                    self.writer.arithmetic(Command::Add)?;
                    self.writer.pop(Segment::Pointer, 1)?;
                    self.writer.push(Segment::That, 0)?;
                    self.expect_symbol(']')?;
                } else {
                    self.writer.push(var.seg, var.index)?;
                }
            }
            Some(Token::Symbol('(')) => {
                self.consume()?;
                self.expr()?;
                self.expect_symbol(')')?;
            }
            Some(Token::Symbol(op @ ('-' | '~'))) => {
                let cmd = if op == '-' { Command::Neg } else { Command::Not };
                self.consume()?;
                self.term()?;
                self.writer.arithmetic(cmd)?;
            }
            Some(Token::IntConst(value)) => {
                if value > MAX_INT {
                    fatal!(Error::IntOutOfRange { pos, value });
                }
                self.consume()?;
                self.writer.push(Segment::Constant, value)?;
            }
            Some(Token::StringConst(s)) => {
                let chars: Vec<char> = s.chars().collect();
                if let Some(&ch) = chars.iter().find(|&&c| c as u32 > MAX_INT) {
                    fatal!(Error::CharOutOfRange { pos, ch });
                }
                let len = chars.len() as u32;
                if len > MAX_INT {
                    fatal!(Error::IntOutOfRange { pos, value: len });
                }
                self.consume()?;
                self.writer.push(Segment::Constant, len)?;
                self.writer.call(STRING_NEW_FUNC, 1)?;
                for c in chars {
                    self.writer.push(Segment::Constant, c as u32)?;
                    self.writer.call(STRING_APPEND_FUNC, 2)?;
                }
            }
            Some(Token::Keyword(
                kw @ (Keyword::True | Keyword::False | Keyword::Null | Keyword::This),
            )) => {
                self.consume()?;
                match kw {
                    Keyword::True => {
                        self.writer.push(Segment::Constant, 1)?;
                        self.writer.arithmetic(Command::Neg)?;
                    }
                    Keyword::This => self.writer.push(Segment::Pointer, 0)?,
                    _ => self.writer.push(Segment::Constant, 0)?,
                }
            }
            _ => fatal_expected!(self.scanner, "term"),
        }
        Ok(())
    }
}
