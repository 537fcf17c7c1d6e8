use crate::compiler::compiler_warnings::{CompilerWarning, print_formatted_warning};
use crate::compiler::program::ast_nodes::TextLocation;
use colour::{e_dark_yellow_ln, e_magenta_ln, e_red_ln, e_yellow_ln};
use std::path::Path;

// The final set of errors and warnings emitted from the backend.
// The builder never unwinds between declarations; everything it reports
// ends up collected here and the driver decides whether output is written.
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompileError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        CompilerMessages {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorType {
    // Missing main package, missing input file name.
    // Fatal: the pass does not run after one of these.
    Config,

    // A construct the kernel target cannot express (non-bit action
    // parameters, oversized tables, unknown match kinds)
    Unsupported,

    // Conflicting or malformed annotations on otherwise valid constructs
    Invalid,

    // Reading the program bundle or writing output artifacts failed
    File,

    // Internal invariant broke. Not the user's fault.
    Compiler,
}

#[derive(Clone, Debug)]
pub struct CompileError {
    pub msg: String,
    pub location: TextLocation,
    pub error_type: ErrorType,
}

impl CompileError {
    pub fn new(msg: impl Into<String>, location: TextLocation, error_type: ErrorType) -> Self {
        CompileError {
            msg: msg.into(),
            location,
            error_type,
        }
    }

    /// Fatal configuration problem. No useful source location exists for these.
    pub fn new_config_error(msg: impl Into<String>) -> Self {
        CompileError {
            msg: msg.into(),
            location: TextLocation::default(),
            error_type: ErrorType::Config,
        }
    }

    /// A construct this target cannot support, anchored to the offending node
    pub fn new_unsupported_error(msg: impl Into<String>, location: TextLocation) -> Self {
        CompileError {
            msg: msg.into(),
            location,
            error_type: ErrorType::Unsupported,
        }
    }

    /// Conflicting annotations or properties on a declaration
    pub fn new_invalid_error(msg: impl Into<String>, location: TextLocation) -> Self {
        CompileError {
            msg: msg.into(),
            location,
            error_type: ErrorType::Invalid,
        }
    }

    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        CompileError {
            msg: format!("{} ({})", msg.into(), path.display()),
            location: TextLocation::default(),
            error_type: ErrorType::File,
        }
    }

    /// Internal backend bug, not caused by the input program
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompileError {
            msg: msg.into(),
            location: TextLocation::default(),
            error_type: ErrorType::Compiler,
        }
    }
}

pub fn print_formatted_error(e: &CompileError) {
    match e.error_type {
        ErrorType::Config => {
            e_red_ln!("Configuration Error");
        }
        ErrorType::Unsupported => {
            e_red_ln!("Unsupported On Target");
        }
        ErrorType::Invalid => {
            e_red_ln!("Invalid Program");
        }
        ErrorType::File => {
            e_dark_yellow_ln!("File Error");
        }
        ErrorType::Compiler => {
            e_magenta_ln!("Compiler Bug (not your fault, sorry)");
        }
    }

    if e.location.start_pos.line_number > 0 {
        e_yellow_ln!(
            "  at line {}, column {}",
            e.location.start_pos.line_number,
            e.location.start_pos.char_column
        );
    }

    eprintln!("  {}", e.msg);
}

pub fn print_errors(messages: &CompilerMessages) {
    for warning in &messages.warnings {
        print_formatted_warning(warning);
    }

    for error in &messages.errors {
        print_formatted_error(error);
    }

    if !messages.errors.is_empty() {
        e_red_ln!("{} error(s) reported, no output written", messages.errors.len());
    }
}
