use serde_json::Value;

/// Scalar value written into one report cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Number(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    /// Convert an extracted JSON scalar into a cell. Nulls and structured
    /// values (objects, arrays) become empty cells instead of errors so a
    /// partially extracted document still produces a row.
    pub fn from_value(value: &Value) -> Cell {
        match value {
            Value::String(s) => Cell::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => Cell::Number(n.as_f64().unwrap_or(0.0)),
            },
            Value::Bool(b) => Cell::Text(b.to_string()),
            _ => Cell::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Display text used for column width estimation.
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Number(x) => format!("{:.2}", x),
        }
    }
}

/// Constant value usable in a static mapping table.
#[derive(Debug, Clone, Copy)]
pub enum Literal {
    Int(i64),
    Str(&'static str),
}

impl Literal {
    pub fn to_cell(self) -> Cell {
        match self {
            Literal::Int(n) => Cell::Int(n),
            Literal::Str(s) => Cell::Text(s.to_string()),
        }
    }
}

/// Per-column mapping rule. The line-item report is driven entirely by a
/// table of these, so adding or reordering output columns never touches the
/// row builder.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Column is always empty.
    Blank,
    /// Dotted lookup against the per-row render context.
    Path(&'static str),
    /// Constant value.
    Default(Literal),
    /// Format string rendered against the context. If any placeholder is
    /// missing the template text is kept verbatim.
    Template(&'static str),
}

/// Ordered column-name -> rule table. Column order here is the column order
/// of every output row and of the report header.
pub type MappingSpec = &'static [(&'static str, Rule)];

/// One report row, cells aligned with the mapping spec column order.
pub type Row = Vec<Cell>;
