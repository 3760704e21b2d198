use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// `#(place)` or `#(place, token)`.
    TokenCount {
        place: String,
        token: Option<String>,
    },
    /// `cap(place)`.
    Capacity(String),
    Floor(Box<Expr>),
    Ceil(Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Constant expressions never read the marking.
    pub fn is_constant(&self) -> bool {
        self.components().is_empty()
    }

    /// Every place the expression reads.
    pub fn components(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_components(&mut out);
        out
    }

    fn collect_components<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::TokenCount { place, .. } | Expr::Capacity(place) => {
                out.insert(place.as_str());
            }
            Expr::Floor(inner) | Expr::Ceil(inner) | Expr::Unary(_, inner) => {
                inner.collect_components(out)
            }
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_components(out);
                rhs.collect_components(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::TokenCount { place, token: None } => write!(f, "#({})", place),
            Expr::TokenCount {
                place,
                token: Some(token),
            } => write!(f, "#({}, {})", place, token),
            Expr::Capacity(place) => write!(f, "cap({})", place),
            Expr::Floor(e) => write!(f, "floor({})", e),
            Expr::Ceil(e) => write!(f, "ceil({})", e),
            Expr::Unary(UnaryOp::Neg, e) => write!(f, "-{}", e),
            Expr::Unary(UnaryOp::Not, e) => write!(f, "!{}", e),
            Expr::Binary(op, e1, e2) => write!(f, "({} {} {})", e1, op.symbol(), e2),
        }
    }
}
