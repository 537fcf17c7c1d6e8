use crate::compiler::compiler_errors::CompileError;
use crate::compiler::pil::introspection::introspection_json;
use crate::compiler::pil::pil_nodes::Pipeline;
use crate::settings::Config;
use std::fs;
use std::path::Path;

/// Write the configured output artifacts for a successfully built
/// pipeline: the pipeline template text (-o) and the introspection
/// JSON (-i). Callers must not invoke this when errors were reported.
pub fn write_artifacts(pipeline: &Pipeline, config: &Config) -> Result<(), CompileError> {
    if let Some(path) = &config.output_file {
        write_output_file(path, &pipeline.to_string())?;
    }

    if let Some(path) = &config.introspec_file {
        let document_name = path.to_string_lossy();
        let document = introspection_json(pipeline, &document_name);
        let text = match serde_json::to_string_pretty(&document) {
            Ok(text) => text,
            Err(e) => {
                return Err(CompileError::compiler_error(format!(
                    "failed to serialize introspection json: {:?}",
                    e
                )));
            }
        };
        write_output_file(path, &format!("{}\n", text))?;
    }

    Ok(())
}

fn write_output_file(path: &Path, contents: &str) -> Result<(), CompileError> {
    // Create the output directory if it doesn't exist yet
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && fs::metadata(parent_dir).is_err() {
            if let Err(e) = fs::create_dir_all(parent_dir) {
                return Err(CompileError::file_error(
                    path,
                    format!("Error creating output directory: {:?}", e),
                ));
            }
        }
    }

    match fs::write(path, contents) {
        Ok(_) => Ok(()),
        Err(e) => Err(CompileError::file_error(
            path,
            format!("Error writing file: {:?}", e),
        )),
    }
}
