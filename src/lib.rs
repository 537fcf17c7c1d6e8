pub mod file_output;
pub mod settings;

pub mod compiler {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod compiler_warnings;

    pub mod program {
        pub mod ast_nodes;
        pub mod type_context;
    }

    pub mod pil {
        pub mod build_pil;
        pub mod introspection;
        pub mod match_type;
        pub mod pil_nodes;
    }
}

use crate::compiler::compiler_errors::{CompileError, CompilerMessages};
use crate::compiler::compiler_warnings::CompilerWarning;
use crate::compiler::pil::build_pil::PilBuilder;
use crate::compiler::pil::pil_nodes::Pipeline;
use crate::compiler::program::ast_nodes::ProgramBundle;
use crate::settings::Config;

/// A successfully lowered program: the pipeline IR the code generator
/// consumes, plus any warnings the traversal raised along the way
#[derive(Debug)]
pub struct BackendOutput {
    pub pipeline: Pipeline,
    pub warnings: Vec<CompilerWarning>,
}

/// Run the backend IR construction pass over a typed program bundle.
///
/// Configuration problems (no main package, no input file name) stop the
/// pass before any traversal. Semantic problems inside declarations are
/// collected; when any exist the whole invocation fails and no pipeline
/// is handed out, matching the rule that nothing is serialized from a
/// failed run.
pub fn run_backend(bundle: &ProgramBundle, config: &Config) -> Result<BackendOutput, CompilerMessages> {
    let mut messages = CompilerMessages::new();

    if bundle.program.main_package.is_none() {
        messages
            .errors
            .push(CompileError::new_config_error("main is missing in the package"));
        return Err(messages);
    }

    let builder = PilBuilder::new(&bundle.types, config);
    let build = builder.build(&bundle.program);

    messages.warnings = build.warnings;
    if !build.errors.is_empty() {
        messages.errors = build.errors;
        return Err(messages);
    }

    Ok(BackendOutput {
        pipeline: build.pipeline,
        warnings: messages.warnings,
    })
}
