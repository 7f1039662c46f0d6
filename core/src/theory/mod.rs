use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use ustr::Ustr;
use uuid::Uuid;

pub mod abs;
pub mod conc;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct FileId(pub u32);

/// Source position. Lines and columns are 1-based, so a zero line marks an
/// unknown position.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Loc {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Loc {
    pub fn new(file: FileId, start: usize, end: usize, line: usize, col: usize) -> Self {
        Self {
            file,
            start,
            end,
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col + end.saturating_sub(start),
        }
    }

    pub fn is_none(&self) -> bool {
        self.start_line == 0
    }

    pub fn union(self, other: Self) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        let (first, last) = if (self.start_line, self.start_col) <= (other.start_line, other.start_col) {
            (self, other)
        } else {
            (other, self)
        };
        let (end_line, end_col) = std::cmp::max(
            (first.end_line, first.end_col),
            (last.end_line, last.end_col),
        );
        Self {
            file: self.file,
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
            start_line: first.start_line,
            start_col: first.start_col,
            end_line,
            end_col,
        }
    }
}

impl Display for Loc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

#[derive(Clone, Eq)]
pub struct Var {
    id: Uuid,
    name: Ustr,
}

impl Var {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: Ustr::from(name),
        }
    }

    pub fn unbound() -> Self {
        Self::new("_")
    }

    /// Same name, new identity.
    pub fn copy(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: self.name,
        }
    }

    pub fn name(&self) -> Ustr {
        self.name
    }

    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name.as_str())
    }
}

impl Debug for Var {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = self.id.simple().to_string();
        write!(f, "{}#{}", self.name, &id[..6])
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParamInfo {
    Explicit,
    Implicit,
}

impl ParamInfo {
    fn wrap(&self, s: String) -> String {
        match self {
            ParamInfo::Explicit => format!("({s})"),
            ParamInfo::Implicit => format!("{{{s}}}"),
        }
    }
}

pub trait Syntax: Display + Debug + Clone {
    type Clause: Display + Debug + Clone;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param<T: Syntax> {
    pub var: Var,
    pub info: ParamInfo,
    pub typ: Box<T>,
}

impl<T: Syntax> Param<T> {
    pub fn new(var: Var, info: ParamInfo, typ: T) -> Self {
        Self {
            var,
            info,
            typ: Box::new(typ),
        }
    }

    pub fn tele_to_string(tele: &Tele<T>) -> String {
        tele.iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<T: Syntax> Display for Param<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.info.wrap(format!("{} : {}", self.var, self.typ)).as_str())
    }
}

pub type Tele<T> = Vec<Param<T>>;
