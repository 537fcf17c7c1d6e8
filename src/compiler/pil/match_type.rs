use crate::compiler::pil::pil_nodes::{ActionUsage, MatchType};
use crate::compiler::program::ast_nodes::Annotation;
use crate::settings::{
    DEFAULT_HIT_ANNOTATION, DEFAULT_HIT_CONST_ANNOTATION, DEFAULT_ONLY_ANNOTATION,
    EXACT_MATCH_KIND, LPM_MATCH_KIND, TABLE_ONLY_ANNOTATION, TERNARY_MATCH_KIND,
};

// Pure classification helpers for table conversion. Nothing in this
// module touches the pipeline being built; the builder calls these first
// and applies side effects only on the Ok paths.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Lpm,
    Ternary,
}

impl MatchKind {
    /// Parse a resolved match-kind name from the core library.
    /// Anything else is unsupported on this target.
    pub fn from_name(name: &str) -> Option<MatchKind> {
        match name {
            EXACT_MATCH_KIND => Some(MatchKind::Exact),
            LPM_MATCH_KIND => Some(MatchKind::Lpm),
            TERNARY_MATCH_KIND => Some(MatchKind::Ternary),
            _ => None,
        }
    }
}

/// Fold the per-field match kinds of one table key into the single
/// discipline the kernel target applies to the whole key.
///
/// The second value reports whether the fallback rule fired: multiple
/// fields, no ternary, not all exact, and not a single trailing lpm.
/// Such keys default to exact but the combination was never validated,
/// so the caller surfaces a warning for it.
pub fn classify_match_type(kinds: &[MatchKind]) -> (MatchType, bool) {
    // Keyless tables and single-field keys take the field's own kind
    match kinds {
        [] => return (MatchType::Exact, false),
        [single] => {
            let match_type = match single {
                MatchKind::Exact => MatchType::Exact,
                MatchKind::Lpm => MatchType::Lpm,
                MatchKind::Ternary => MatchType::Ternary,
            };
            return (match_type, false);
        }
        _ => {}
    }

    let exact_keys = kinds.iter().filter(|k| **k == MatchKind::Exact).count();
    let lpm_keys = kinds.iter().filter(|k| **k == MatchKind::Lpm).count();
    let ternary_keys = kinds.iter().filter(|k| **k == MatchKind::Ternary).count();

    if ternary_keys >= 1 || lpm_keys > 1 {
        // A wildcard anywhere, or several prefixes, forces the whole key
        // into ternary matching
        (MatchType::Ternary, false)
    } else if exact_keys == kinds.len() {
        (MatchType::Exact, false)
    } else if lpm_keys == 1 && kinds.last() == Some(&MatchKind::Lpm) {
        (MatchType::Lpm, false)
    } else {
        // Exact keys with one lpm field that isn't last. No rule covers
        // this, so fall back to exact and let the caller warn.
        (MatchType::Exact, true)
    }
}

// -----------------------------
//   ACTION REFERENCE CATEGORY
// -----------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionCategory {
    TableOnly,
    DefaultHit,
    DefaultHitConst,
    Unrestricted,
}

/// The classified annotations of one action reference inside a table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionAnnotations {
    pub category: ActionCategory,
    pub default_only: bool,
}

impl ActionAnnotations {
    pub fn usage(&self) -> ActionUsage {
        if self.category == ActionCategory::TableOnly {
            ActionUsage::TableOnly
        } else if self.default_only {
            ActionUsage::DefaultOnly
        } else {
            ActionUsage::TableAndDefault
        }
    }
}

/// Classify the annotations on one of a table's action references.
///
/// `@tableonly`, `@default_hit` and `@default_hit_const` are mutually
/// exclusive; carrying more than one is a conflict and the error lists
/// the clashing annotation names.
pub fn classify_action_annotations(
    annotations: &[Annotation],
) -> Result<ActionAnnotations, Vec<&'static str>> {
    let mut table_only = false;
    let mut default_hit = false;
    let mut default_hit_const = false;
    let mut default_only = false;

    for annotation in annotations {
        match annotation.name.as_str() {
            TABLE_ONLY_ANNOTATION => table_only = true,
            DEFAULT_ONLY_ANNOTATION => default_only = true,
            DEFAULT_HIT_ANNOTATION => default_hit = true,
            DEFAULT_HIT_CONST_ANNOTATION => default_hit_const = true,
            // Unknown annotations belong to other passes
            _ => {}
        }
    }

    let mut conflicting = Vec::new();
    if table_only {
        conflicting.push(TABLE_ONLY_ANNOTATION);
    }
    if default_hit {
        conflicting.push(DEFAULT_HIT_ANNOTATION);
    }
    if default_hit_const {
        conflicting.push(DEFAULT_HIT_CONST_ANNOTATION);
    }
    if conflicting.len() > 1 {
        return Err(conflicting);
    }

    let category = if table_only {
        ActionCategory::TableOnly
    } else if default_hit {
        ActionCategory::DefaultHit
    } else if default_hit_const {
        ActionCategory::DefaultHitConst
    } else {
        ActionCategory::Unrestricted
    };

    Ok(ActionAnnotations {
        category,
        default_only,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use MatchKind::*;

    #[test]
    fn empty_and_single_field_keys() {
        assert_eq!(classify_match_type(&[]), (MatchType::Exact, false));
        assert_eq!(classify_match_type(&[Exact]), (MatchType::Exact, false));
        assert_eq!(classify_match_type(&[Lpm]), (MatchType::Lpm, false));
        assert_eq!(classify_match_type(&[Ternary]), (MatchType::Ternary, false));
    }

    #[test]
    fn all_exact_keys_stay_exact() {
        assert_eq!(
            classify_match_type(&[Exact, Exact, Exact]),
            (MatchType::Exact, false)
        );
    }

    #[test]
    fn any_ternary_field_forces_ternary() {
        assert_eq!(
            classify_match_type(&[Exact, Ternary, Exact]),
            (MatchType::Ternary, false)
        );
        assert_eq!(
            classify_match_type(&[Ternary, Lpm]),
            (MatchType::Ternary, false)
        );
    }

    #[test]
    fn two_lpm_fields_force_ternary() {
        assert_eq!(
            classify_match_type(&[Lpm, Exact, Lpm]),
            (MatchType::Ternary, false)
        );
    }

    #[test]
    fn single_trailing_lpm_is_lpm() {
        assert_eq!(
            classify_match_type(&[Exact, Exact, Lpm]),
            (MatchType::Lpm, false)
        );
    }

    #[test]
    fn non_trailing_lpm_falls_back_to_exact() {
        assert_eq!(
            classify_match_type(&[Lpm, Exact, Exact]),
            (MatchType::Exact, true)
        );
    }

    #[test]
    fn annotation_categories() {
        let anns = classify_action_annotations(&[Annotation::new("tableonly")]).unwrap();
        assert_eq!(anns.category, ActionCategory::TableOnly);
        assert_eq!(anns.usage(), ActionUsage::TableOnly);

        let anns = classify_action_annotations(&[Annotation::new("defaultonly")]).unwrap();
        assert_eq!(anns.category, ActionCategory::Unrestricted);
        assert_eq!(anns.usage(), ActionUsage::DefaultOnly);

        let anns = classify_action_annotations(&[Annotation::new("default_hit_const")]).unwrap();
        assert_eq!(anns.category, ActionCategory::DefaultHitConst);
        assert_eq!(anns.usage(), ActionUsage::TableAndDefault);

        // Annotations from other passes are ignored
        let anns = classify_action_annotations(&[Annotation::new("name")]).unwrap();
        assert_eq!(anns.category, ActionCategory::Unrestricted);
    }

    #[test]
    fn conflicting_annotations_list_every_clash() {
        let conflict = classify_action_annotations(&[
            Annotation::new("tableonly"),
            Annotation::new("default_hit"),
        ])
        .unwrap_err();
        assert_eq!(conflict, vec!["tableonly", "default_hit"]);

        let conflict = classify_action_annotations(&[
            Annotation::new("tableonly"),
            Annotation::new("default_hit"),
            Annotation::new("default_hit_const"),
        ])
        .unwrap_err();
        assert_eq!(conflict.len(), 3);
    }
}
