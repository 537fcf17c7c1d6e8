use crate::compiler::program::ast_nodes::TextLocation;
use colour::yellow_ln_bold;

#[derive(Clone, Debug)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: TextLocation,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: impl Into<String>, location: TextLocation, warning_kind: WarningKind) -> Self {
        CompilerWarning {
            msg: msg.into(),
            location,
            warning_kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    // A select case whose label is not a literal constant gets no
    // transition in the state graph. The graph is incomplete for such
    // parsers, so the skip is surfaced rather than silent.
    NonLiteralSelectLabel,

    // The table-level match type fell through to exact because the key
    // mixes kinds in a way none of the classification rules cover
    MatchTypeFallback,
}

pub fn print_formatted_warning(w: &CompilerWarning) {
    yellow_ln_bold!("WARNING: ");
    match w.warning_kind {
        WarningKind::NonLiteralSelectLabel => {
            println!("  {} (no transition recorded)", w.msg);
        }
        WarningKind::MatchTypeFallback => {
            println!("  {} (defaulting to exact match)", w.msg);
        }
    }
}
