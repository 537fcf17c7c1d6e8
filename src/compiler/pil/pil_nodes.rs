use std::fmt;

// The pipeline IR built by this stage.
//
// Everything here is created empty at the start of an invocation,
// populated by one traversal of the typed program, and then handed
// read-only to the serializer and the code generator. Discovery order is
// significant: actions and tables keep the order the builder met them in,
// which is also the order their IDs were allocated in.

#[derive(Debug, Default)]
pub struct Pipeline {
    pub name: String,
    pub id: u32,
    pub num_tables: u32,
    pub actions: Vec<PilAction>,
    pub tables: Vec<PilTable>,
    pub parser: ParserGraph,
}

#[derive(Debug)]
pub struct PilAction {
    // Unique within the pipeline, >= 1, allocated in traversal order
    pub id: u32,
    // External name: leading separator stripped, '.' normalised to '/'
    pub name: String,
    pub pipeline_name: String,
    pub params: Vec<PilActionParam>,
}

#[derive(Debug)]
pub struct PilActionParam {
    pub name: String,
    pub kind: ParamKind,
    pub bit_width: u32,
}

// Data kinds an action parameter can be lowered to. Annotation-driven
// typing would pick the richer kinds; until that lands only Bit is
// produced by the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Bit,
    Dev,
    MacAddr,
    Ipv4,
    Ipv6,
    Be16,
    Be32,
    Be64,
}

#[derive(Debug)]
pub struct PilTable {
    pub id: u32,
    pub name: String,
    pub control_name: String,
    pub pipeline_name: String,
    // Sum of the widths of all key fields, in bits
    pub key_size: u32,
    pub entries: u64,
    pub match_type: MatchType,
    pub actions: Vec<PilTableAction>,
    pub default_hit: Option<DefaultBinding>,
    pub default_miss: Option<DefaultBinding>,
}

/// Reference from a table to a converted action,
/// carrying where the action may be used
#[derive(Debug)]
pub struct PilTableAction {
    pub action_id: u32,
    pub action_name: String,
    pub usage: ActionUsage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionUsage {
    // @tableonly: valid in entries, never as a default
    TableOnly,
    // @defaultonly: valid only as a default action
    DefaultOnly,
    TableAndDefault,
}

#[derive(Debug)]
pub struct DefaultBinding {
    pub action_id: u32,
    pub action_name: String,
    // Whether the binding was declared constant and can't be
    // changed at runtime
    pub is_constant: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    Lpm,
    Ternary,
}

// -----------------------------
//       PARSER STATE GRAPH
// -----------------------------

// Reconstructed extraction/selector/transition structure describing how
// the parser walks protocol headers. All three collections are keyed by
// state name and preserve discovery order; lookups are linear scans,
// which is fine at parser-state counts.
#[derive(Debug, Default)]
pub struct ParserGraph {
    pub extracts: Vec<StateExtract>,
    pub selectors: Vec<StateSelector>,
    pub transitions: Vec<StateTransitions>,
}

#[derive(Debug)]
pub struct StateExtract {
    pub state: String,
    pub header_type: String,
    pub header_bytes: u32,
    // Printed destination expression, e.g. "hdr.ethernet"
    pub field: String,
    // Byte offset of the destination field within its enclosing header
    pub field_offset: u32,
}

/// The field a state's multi-way branch examines,
/// in bytes relative to the header that state extracted
#[derive(Debug)]
pub struct StateSelector {
    pub state: String,
    pub header_type: String,
    pub field_offset: u32,
    pub field_len: u32,
}

#[derive(Debug)]
pub struct StateTransitions {
    pub state: String,
    pub entries: Vec<TransitionEntry>,
}

#[derive(Debug)]
pub struct TransitionEntry {
    pub next_state: String,
    pub value: u128,
}

impl ParserGraph {
    pub fn extract_for(&self, state: &str) -> Option<&StateExtract> {
        self.extracts.iter().find(|e| e.state == state)
    }

    pub fn selector_for(&self, state: &str) -> Option<&StateSelector> {
        self.selectors.iter().find(|s| s.state == state)
    }

    pub fn transitions_for(&self, state: &str) -> Option<&StateTransitions> {
        self.transitions.iter().find(|t| t.state == state)
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn find_action(&self, external_name: &str) -> Option<&PilAction> {
        self.actions.iter().find(|a| a.name == external_name)
    }

    pub fn action_id(&self, external_name: &str) -> Option<u32> {
        self.find_action(external_name).map(|a| a.id)
    }

    pub fn table_id(&self, table_name: &str) -> Option<u32> {
        self.tables.iter().find(|t| t.name == table_name).map(|t| t.id)
    }

    pub fn table_key_size(&self, table_id: u32) -> Option<u32> {
        self.tables
            .iter()
            .find(|t| t.id == table_id)
            .map(|t| t.key_size)
    }
}

// -----------------------------
//      TEMPLATE RENDERING
// -----------------------------

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Exact => write!(f, "exact"),
            MatchType::Lpm => write!(f, "lpm"),
            MatchType::Ternary => write!(f, "ternary"),
        }
    }
}

impl fmt::Display for ActionUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionUsage::TableOnly => write!(f, "tableonly"),
            ActionUsage::DefaultOnly => write!(f, "defaultonly"),
            ActionUsage::TableAndDefault => write!(f, "tableanddefault"),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Bit => write!(f, "bit"),
            ParamKind::Dev => write!(f, "dev"),
            ParamKind::MacAddr => write!(f, "macaddr"),
            ParamKind::Ipv4 => write!(f, "ipv4"),
            ParamKind::Ipv6 => write!(f, "ipv6"),
            ParamKind::Be16 => write!(f, "be16"),
            ParamKind::Be32 => write!(f, "be32"),
            ParamKind::Be64 => write!(f, "be64"),
        }
    }
}

// Human-readable pipeline template, written to the -o output file.
// This is what table configuration tooling reads, so the layout is
// deliberately line-oriented and stable.
impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pipeline {} id {} numtables {}",
            self.name, self.id, self.num_tables
        )?;

        for table in &self.tables {
            writeln!(f)?;
            writeln!(
                f,
                "table {}/{}/{}",
                table.pipeline_name, table.control_name, table.name
            )?;
            writeln!(f, "    id {}", table.id)?;
            writeln!(f, "    keysize {}", table.key_size)?;
            writeln!(f, "    entries {}", table.entries)?;
            writeln!(f, "    matchtype {}", table.match_type)?;
            for action in &table.actions {
                writeln!(
                    f,
                    "    action {} id {} flags {}",
                    action.action_name, action.action_id, action.usage
                )?;
            }
            if let Some(hit) = &table.default_hit {
                writeln!(
                    f,
                    "    default_hit_action {}{}",
                    hit.action_name,
                    if hit.is_constant { " const" } else { "" }
                )?;
            }
            if let Some(miss) = &table.default_miss {
                writeln!(
                    f,
                    "    default_miss_action {}{}",
                    miss.action_name,
                    if miss.is_constant { " const" } else { "" }
                )?;
            }
        }

        for action in &self.actions {
            writeln!(f)?;
            writeln!(f, "action {} id {}", action.name, action.id)?;
            for param in &action.params {
                writeln!(
                    f,
                    "    param {} type {} size {}",
                    param.name, param.kind, param.bit_width
                )?;
            }
        }

        Ok(())
    }
}
