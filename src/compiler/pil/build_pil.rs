//! Lowers the typed program into the pipeline IR.
//!
//! One `PilBuilder` exists per compiler invocation. It walks the typed
//! program in dependency order (parsers, then actions, then tables, then
//! pipeline-level counters), allocating stable numeric IDs as it goes.
//! Semantic problems never unwind out of the traversal: they are recorded
//! and the builder moves on to the next declaration, so one run can report
//! every independent error in the program. The driver checks the error
//! list afterwards and refuses to serialize anything if it is non-empty.

use crate::compiler::compiler_errors::CompileError;
use crate::compiler::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler::pil::match_type::{
    ActionAnnotations, ActionCategory, MatchKind, classify_action_annotations,
    classify_match_type,
};
use crate::compiler::pil::pil_nodes::{
    DefaultBinding, ParamKind, PilAction, PilActionParam, PilTable, PilTableAction, Pipeline,
    StateExtract, StateSelector, StateTransitions, TransitionEntry,
};
use crate::compiler::program::ast_nodes::{
    ActionDecl, ActionRef, ControlDecl, Declaration, Expression, ExpressionKind, Keyset,
    MethodCall, ParserDecl, Program, SelectExpression, Statement, StateTransition, TableDecl,
    TypeRef,
};
use crate::compiler::program::type_context::TypeContext;
use crate::ir_log;
use crate::settings::{
    Config, DEFAULT_PIPELINE_ID, DEFAULT_TABLE_ENTRIES, EXTRACT_METHOD_SUFFIX, NO_ACTION_NAME,
};
use rustc_hash::FxHashMap;

/// Everything one traversal produced. The pipeline is only meaningful
/// when `errors` is empty.
#[derive(Debug)]
pub struct PilBuild {
    pub pipeline: Pipeline,
    pub errors: Vec<CompileError>,
    pub warnings: Vec<CompilerWarning>,
}

pub struct PilBuilder<'a> {
    ctx: &'a TypeContext,
    config: &'a Config,
    pipeline: Pipeline,

    // External name -> allocated ID for every action that consumed an ID,
    // including ones whose conversion later failed. Duplicate detection
    // has to see those too.
    action_ids: FxHashMap<String, u32>,
    action_count: u32,
    table_count: u32,

    errors: Vec<CompileError>,
    warnings: Vec<CompilerWarning>,
}

/// External name of a declaration: leading separator stripped,
/// internal separators normalised to '/'
pub fn external_name(declared: &str) -> String {
    declared.strip_prefix('.').unwrap_or(declared).replace('.', "/")
}

impl<'a> PilBuilder<'a> {
    pub fn new(ctx: &'a TypeContext, config: &'a Config) -> Self {
        PilBuilder {
            ctx,
            config,
            pipeline: Pipeline::new(),
            action_ids: FxHashMap::default(),
            action_count: 0,
            table_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn build(mut self, program: &Program) -> PilBuild {
        if let Err(e) = self.set_pipeline_name() {
            // Configuration errors are fatal before the traversal starts
            self.errors.push(e);
            return self.finish();
        }

        // Parsers first: the state graph depends only on the type context
        for declaration in &program.declarations {
            if let Declaration::Parser(parser) = declaration {
                self.convert_parser(parser);
            }
        }

        // Actions next, so tables can resolve their references by ID
        for declaration in &program.declarations {
            match declaration {
                Declaration::Action(action) => self.convert_action(action),
                Declaration::Control(control) => {
                    for action in &control.actions {
                        self.convert_action(action);
                    }
                }
                Declaration::Parser(_) => {}
            }
        }

        for declaration in &program.declarations {
            if let Declaration::Control(control) = declaration {
                for table in &control.tables {
                    self.convert_table(control, table);
                }
            }
        }

        // Pipeline-level counters are the last thing the traversal settles
        self.pipeline.id = DEFAULT_PIPELINE_ID;
        self.pipeline.num_tables = self.table_count;

        self.finish()
    }

    fn finish(self) -> PilBuild {
        PilBuild {
            pipeline: self.pipeline,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    // The pipeline is named after the compiled source file: text after the
    // last path separator, truncated at the first '.', whitespace trimmed
    fn set_pipeline_name(&mut self) -> Result<(), CompileError> {
        let path = match &self.config.input_file {
            Some(path) => path,
            None => {
                return Err(CompileError::new_config_error(
                    "filename is not given in command line option",
                ));
            }
        };

        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => path.to_string_lossy().into_owned(),
        };

        self.pipeline.name = file_name
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
            .to_owned();

        ir_log!("pipeline name '{}'", self.pipeline.name);
        Ok(())
    }

    // -----------------------------
    //      PARSER RECONSTRUCTION
    // -----------------------------

    fn convert_parser(&mut self, parser: &ParserDecl) {
        for state in &parser.states {
            for statement in &state.statements {
                let Statement::MethodCall(call) = statement else {
                    continue;
                };
                if !call.method.ends_with(EXTRACT_METHOD_SUFFIX) {
                    continue;
                }
                if let Err(e) = self.record_extract(&state.name, call) {
                    self.errors.push(e);
                }
            }

            match &state.transition {
                Some(StateTransition::Select(select)) => {
                    self.record_select(&state.name, select);
                }
                // A direct jump has no branch worth recording
                Some(StateTransition::Direct(_)) | None => {}
            }
        }
    }

    fn record_extract(&mut self, state: &str, call: &MethodCall) -> Result<(), CompileError> {
        // A state extracts at most one header; first call wins
        if self.pipeline.parser.extract_for(state).is_some() {
            return Ok(());
        }

        let (Some(header_type), Some(arg)) = (call.type_args.first(), call.args.first()) else {
            return Err(CompileError::compiler_error(format!(
                "malformed extract call in state '{}'",
                state
            )));
        };

        let ExpressionKind::Member { base, member } = &arg.kind else {
            return Err(CompileError::compiler_error(format!(
                "extract destination '{}' in state '{}' is not a header field",
                arg, state
            )));
        };
        let TypeRef::Named(enclosing) = &base.ty else {
            return Err(CompileError::compiler_error(format!(
                "extract destination '{}' in state '{}' has no enclosing header type",
                arg, state
            )));
        };

        let header_bits = self.ctx.width_bits(&TypeRef::Named(header_type.clone()))?;
        let enclosing_bytes = self.ctx.width_bits(&base.ty)? >> 3;
        let msb = self.ctx.field_msb(enclosing, member)?;
        let field_offset = enclosing_bytes - (msb >> 3) - 1;

        ir_log!(
            "state '{}' extracts {} into {} (offset {})",
            state,
            header_type,
            arg,
            field_offset
        );

        self.pipeline.parser.extracts.push(StateExtract {
            state: state.to_owned(),
            header_type: header_type.clone(),
            header_bytes: header_bits >> 3,
            field: arg.to_string(),
            field_offset,
        });
        Ok(())
    }

    fn record_select(&mut self, state: &str, select: &SelectExpression) {
        for component in &select.components {
            if let Err(e) = self.record_selector(state, component) {
                self.errors.push(e);
            }
        }

        let mut entries = Vec::new();
        for case in &select.cases {
            match &case.keyset {
                Keyset::Literal(value) => entries.push(TransitionEntry {
                    next_state: case.next_state.clone(),
                    value: *value,
                }),
                // Ranges, masks and default labels have no literal key to
                // synthesize a table entry from. Surfaced as a warning so
                // the incomplete graph doesn't go unnoticed.
                Keyset::Range { .. } | Keyset::Mask { .. } | Keyset::Default => {
                    self.warnings.push(CompilerWarning::new(
                        format!(
                            "state '{}' selects on a non-literal label for next state '{}'",
                            state, case.next_state
                        ),
                        case.location,
                        WarningKind::NonLiteralSelectLabel,
                    ));
                }
            }
        }

        if !entries.is_empty() {
            self.pipeline.parser.transitions.push(StateTransitions {
                state: state.to_owned(),
                entries,
            });
        }
    }

    // The selector is always described relative to the header this state
    // just extracted, so the extraction record must already exist
    fn record_selector(&mut self, state: &str, component: &Expression) -> Result<(), CompileError> {
        let ExpressionKind::Member { member, .. } = &component.kind else {
            // Midend simplification reduces select arguments to header
            // members; anything else cannot drive next-state selection
            return Ok(());
        };

        let (header_type, header_bytes) = match self.pipeline.parser.extract_for(state) {
            Some(extract) => (extract.header_type.clone(), extract.header_bytes),
            None => {
                return Err(CompileError::compiler_error(format!(
                    "state '{}' branches on '{}' before extracting a header",
                    state, component
                )));
            }
        };

        if self.pipeline.parser.selector_for(state).is_some() {
            return Ok(());
        }

        let msb = self.ctx.field_msb(&header_type, member)?;
        let field_len = self.ctx.width_bits(&component.ty)? >> 3;

        self.pipeline.parser.selectors.push(StateSelector {
            state: state.to_owned(),
            header_type,
            field_offset: header_bytes - (msb >> 3) - 1,
            field_len,
        });
        Ok(())
    }

    // -----------------------------
    //       ACTION CONVERSION
    // -----------------------------

    fn convert_action(&mut self, action: &ActionDecl) {
        let external = external_name(&action.name);

        // Duplicates and the built-in no-op are skipped without consuming an ID
        if self.action_ids.contains_key(&external) || external == NO_ACTION_NAME {
            return;
        }

        self.action_count += 1;
        let id = self.action_count;
        self.action_ids.insert(external.clone(), id);
        ir_log!("action '{}' -> id {}", external, id);

        let mut params = Vec::with_capacity(action.params.len());
        for param in &action.params {
            match &param.ty {
                TypeRef::Bits {
                    width,
                    signed: false,
                } => params.push(PilActionParam {
                    name: param.name.clone(),
                    kind: ParamKind::Bit,
                    bit_width: *width,
                }),
                _ => {
                    self.errors.push(CompileError::new_unsupported_error(
                        format!(
                            "parameter '{}' of action '{}' with type other than bit is not supported",
                            param.name, external
                        ),
                        param.location,
                    ));
                    // The action is dropped but its ID stays consumed
                    return;
                }
            }
        }

        self.pipeline.actions.push(PilAction {
            id,
            name: external,
            pipeline_name: self.pipeline.name.clone(),
            params,
        });
    }

    // -----------------------------
    //        TABLE CONVERSION
    // -----------------------------

    fn convert_table(&mut self, control: &ControlDecl, table: &TableDecl) {
        self.table_count += 1;
        let id = self.table_count;
        ir_log!("table '{}' -> id {}", table.name, id);

        let mut entries = DEFAULT_TABLE_ENTRIES;
        if let Some(size) = &table.size {
            match u64::try_from(size.value) {
                Ok(value) => entries = value,
                Err(_) => {
                    self.errors.push(CompileError::new_unsupported_error(
                        format!(
                            "table '{}' with size {} cannot be supported",
                            table.name, size.value
                        ),
                        size.location,
                    ));
                    return;
                }
            }
        }

        let mut key_size = 0u32;
        let mut kinds = Vec::with_capacity(table.key.len());
        for key in &table.key {
            match self.ctx.width_bits(&key.expr.ty) {
                Ok(width) => key_size += width,
                Err(e) => {
                    self.errors.push(e);
                    return;
                }
            }
            match MatchKind::from_name(&key.match_kind) {
                Some(kind) => kinds.push(kind),
                None => {
                    self.errors.push(CompileError::new_unsupported_error(
                        format!(
                            "match type {} is not supported on this target",
                            key.match_kind
                        ),
                        key.location,
                    ));
                    return;
                }
            }
        }

        let (match_type, fell_back) = classify_match_type(&kinds);
        if fell_back {
            self.warnings.push(CompilerWarning::new(
                format!(
                    "table '{}' mixes match kinds in a combination with no single discipline",
                    table.name
                ),
                table.location,
                WarningKind::MatchTypeFallback,
            ));
        }

        // Classify every action reference up front; nothing is applied to
        // the table until the whole list is conflict-free
        let mut classified: Vec<(&ActionRef, ActionAnnotations)> =
            Vec::with_capacity(table.actions.len());
        for action_ref in &table.actions {
            match classify_action_annotations(&action_ref.annotations) {
                Ok(annotations) => classified.push((action_ref, annotations)),
                Err(conflict) => {
                    let list = conflict
                        .iter()
                        .map(|name| format!("'@{}'", name))
                        .collect::<Vec<_>>()
                        .join(" and ");
                    self.errors.push(CompileError::new_invalid_error(
                        format!(
                            "table '{}' has an action reference '{}' which is annotated with {}",
                            table.name, action_ref.name, list
                        ),
                        action_ref.location,
                    ));
                    return;
                }
            }
        }

        let mut table_actions = Vec::new();
        for (action_ref, annotations) in &classified {
            let external = external_name(&action_ref.name);
            if let Some(action) = self.pipeline.find_action(&external) {
                table_actions.push(PilTableAction {
                    action_id: action.id,
                    action_name: action.name.clone(),
                    usage: annotations.usage(),
                });
            }
        }

        let default_hit = match self.resolve_default_hit(table, &classified) {
            Ok(binding) => binding,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        let default_miss = self.resolve_default_miss(table);

        self.pipeline.tables.push(PilTable {
            id,
            name: table.name.clone(),
            control_name: control.name.clone(),
            pipeline_name: self.pipeline.name.clone(),
            key_size,
            entries,
            match_type,
            actions: table_actions,
            default_hit,
            default_miss,
        });
    }

    /// The default-hit action comes from the per-reference annotations:
    /// at most one `@default_hit` or `@default_hit_const` action may exist
    /// in the whole list, and never both kinds at once
    fn resolve_default_hit(
        &self,
        table: &TableDecl,
        classified: &[(&ActionRef, ActionAnnotations)],
    ) -> Result<Option<DefaultBinding>, CompileError> {
        let mut hits = 0;
        let mut hit_consts = 0;
        let mut candidate: Option<(&ActionRef, bool)> = None;

        for (action_ref, annotations) in classified {
            match annotations.category {
                ActionCategory::DefaultHit => {
                    hits += 1;
                    candidate = Some((action_ref, false));
                }
                ActionCategory::DefaultHitConst => {
                    hit_consts += 1;
                    candidate = Some((action_ref, true));
                }
                ActionCategory::TableOnly | ActionCategory::Unrestricted => {}
            }
        }

        if hits > 0 && hit_consts > 0 {
            return Err(CompileError::new_invalid_error(
                format!(
                    "table '{}' cannot have both '@default_hit' action and '@default_hit_const' action",
                    table.name
                ),
                table.location,
            ));
        }
        if hits > 1 {
            return Err(CompileError::new_invalid_error(
                format!("table '{}' can have only one '@default_hit' action", table.name),
                table.location,
            ));
        }
        if hit_consts > 1 {
            return Err(CompileError::new_invalid_error(
                format!(
                    "table '{}' can have only one '@default_hit_const' action",
                    table.name
                ),
                table.location,
            ));
        }

        let Some((action_ref, is_constant)) = candidate else {
            return Ok(None);
        };
        let external = external_name(&action_ref.name);
        if external == NO_ACTION_NAME {
            return Ok(None);
        }

        Ok(self.pipeline.find_action(&external).map(|action| DefaultBinding {
            action_id: action.id,
            action_name: action.name.clone(),
            is_constant,
        }))
    }

    /// The default-miss action is the table's declared default action
    /// property, when it names a real action
    fn resolve_default_miss(&self, table: &TableDecl) -> Option<DefaultBinding> {
        let property = table.default_action.as_ref()?;
        let external = external_name(&property.name);
        if external == NO_ACTION_NAME {
            return None;
        }

        let action = self.pipeline.find_action(&external)?;
        Some(DefaultBinding {
            action_id: action.id,
            action_name: action.name.clone(),
            is_constant: property.is_constant,
        })
    }
}
