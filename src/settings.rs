use std::path::PathBuf;

// Numeric identifier stamped onto every pipeline produced by this stage.
// Table and action IDs are scoped to the pipeline, so a single fixed
// pipeline ID is enough until multi-pipeline programs exist.
pub const DEFAULT_PIPELINE_ID: u32 = 1;

// Entry capacity used for tables that don't declare an explicit size property
pub const DEFAULT_TABLE_ENTRIES: u64 = 2048;

// The core library's built-in no-operation action.
// Never converted, never assigned an ID.
pub const NO_ACTION_NAME: &str = "NoAction";

// Name of the parser state the introspection document points at as the
// entry node of the protocol state machine
pub const ROOT_PARSE_NODE: &str = "start";

// Extraction calls are detected by method-name suffix ("packet.extract" etc.)
pub const EXTRACT_METHOD_SUFFIX: &str = "extract";

// Annotation names recognised on a table's action references
pub const TABLE_ONLY_ANNOTATION: &str = "tableonly";
pub const DEFAULT_ONLY_ANNOTATION: &str = "defaultonly";
pub const DEFAULT_HIT_ANNOTATION: &str = "default_hit";
pub const DEFAULT_HIT_CONST_ANNOTATION: &str = "default_hit_const";

// Core library match kind names
pub const EXACT_MATCH_KIND: &str = "exact";
pub const LPM_MATCH_KIND: &str = "lpm";
pub const TERNARY_MATCH_KIND: &str = "ternary";

/// Per-invocation configuration for the backend.
///
/// The input file is the program the front end compiled; its file name
/// (directory and extension stripped) becomes the pipeline name.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub input_file: Option<PathBuf>,

    // Pipeline template text output (-o)
    pub output_file: Option<PathBuf>,

    // Introspection JSON output (-i)
    pub introspec_file: Option<PathBuf>,

    // Dumps the reconstructed parser graph to stderr (-g)
    pub debug: bool,
}

impl Config {
    pub fn new(input_file: PathBuf) -> Self {
        Config {
            input_file: Some(input_file),
            ..Default::default()
        }
    }
}
