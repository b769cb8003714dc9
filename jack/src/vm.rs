use std::fmt;
use std::io::{self, Write};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq => "eq",
            Command::Gt => "gt",
            Command::Lt => "lt",
            Command::And => "and",
            Command::Or => "or",
            Command::Not => "not",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    Push(Segment, u32),
    Pop(Segment, u32),
    Arithmetic(Command),
    Label(String),
    Goto(String),
    IfGoto(String),
    Call(String, u32),
    Function(String, u32),
    Return,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(seg, i) => write!(f, "push {} {}", seg.as_str(), i),
            Instruction::Pop(seg, i) => write!(f, "pop {} {}", seg.as_str(), i),
            Instruction::Arithmetic(cmd) => f.write_str(cmd.as_str()),
            Instruction::Label(label) => write!(f, "label {}", label),
            Instruction::Goto(label) => write!(f, "goto {}", label),
            Instruction::IfGoto(label) => write!(f, "if-goto {}", label),
            Instruction::Call(name, n) => write!(f, "call {} {}", name, n),
            Instruction::Function(name, n) => write!(f, "function {} {}", name, n),
            Instruction::Return => f.write_str("return"),
        }
    }
}

/// Writes one instruction per line to `out`.
///
/// `indent` spaces prefix every line except labels, which are always flush.
pub struct VmWriter<W> {
    out: W,
    indent: usize,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, indent: 0 }
    }

    pub fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }

    pub fn i(&mut self, instr: Instruction) -> io::Result<()> {
        let indent = match instr {
            Instruction::Label(_) => 0,
            _ => self.indent,
        };
        writeln!(self.out, "{:indent$}{}", "", instr, indent = indent)
    }

    pub fn push(&mut self, seg: Segment, index: u32) -> io::Result<()> {
        self.i(Instruction::Push(seg, index))
    }

    pub fn pop(&mut self, seg: Segment, index: u32) -> io::Result<()> {
        self.i(Instruction::Pop(seg, index))
    }

    pub fn arithmetic(&mut self, cmd: Command) -> io::Result<()> {
        self.i(Instruction::Arithmetic(cmd))
    }

    pub fn label(&mut self, label: &str) -> io::Result<()> {
        self.i(Instruction::Label(label.to_string()))
    }

    pub fn goto(&mut self, label: &str) -> io::Result<()> {
        self.i(Instruction::Goto(label.to_string()))
    }

    pub fn if_goto(&mut self, label: &str) -> io::Result<()> {
        self.i(Instruction::IfGoto(label.to_string()))
    }

    pub fn call(&mut self, name: &str, args: u32) -> io::Result<()> {
        self.i(Instruction::Call(name.to_string(), args))
    }

    pub fn function(&mut self, name: &str, locals: u32) -> io::Result<()> {
        self.i(Instruction::Function(name.to_string(), locals))
    }

    pub fn ret(&mut self) -> io::Result<()> {
        self.i(Instruction::Return)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
