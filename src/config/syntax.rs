//! Per-corpus naming of positional attributes and relation literals.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncollError};

/// A positional attribute: its name in search queries and its column
/// in the vertical file (0 = the word column).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosAttrProps {
    pub name: String,
    pub vertical_col: usize,
}

impl PosAttrProps {
    pub fn new<S: Into<String>>(name: S, vertical_col: usize) -> Self {
        PosAttrProps {
            name: name.into(),
            vertical_col,
        }
    }
}

/// Describes where the syntactic information lives in a corpus and
/// which literal values denote the categories we aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxProps {
    /// Relative position of the parent token.
    pub parent_idx_attr: PosAttrProps,

    /// Lemma (e.g. `lemma`).
    pub lemma_attr: PosAttrProps,

    /// Lemma of the parent (e.g. `p_lemma`).
    pub par_lemma_attr: PosAttrProps,

    /// Part of speech (e.g. `upos`).
    pub pos_attr: PosAttrProps,

    /// Part of speech of the parent (e.g. `p_upos`).
    pub par_pos_attr: PosAttrProps,

    /// Dependency relation (e.g. `deprel`).
    pub func_attr: PosAttrProps,

    /// e.g. `NOUN`
    #[serde(rename = "nounPosValue")]
    pub noun_value: String,

    /// e.g. `VERB`
    #[serde(rename = "verbPosValue")]
    pub verb_value: String,

    /// e.g. `nmod`
    pub noun_modified_value: String,

    /// e.g. `nsubj`
    pub noun_subject_value: String,

    /// e.g. `obj|iobj`
    pub noun_object_value: String,
}

impl SyntaxProps {
    /// Check that every attribute and category literal is set.
    pub fn validate(&self, conf_context: &str) -> Result<()> {
        let attrs = [
            ("parentIdxAttr", &self.parent_idx_attr),
            ("lemmaAttr", &self.lemma_attr),
            ("parLemmaAttr", &self.par_lemma_attr),
            ("posAttr", &self.pos_attr),
            ("parPosAttr", &self.par_pos_attr),
            ("funcAttr", &self.func_attr),
        ];
        for (key, attr) in attrs {
            if attr.name.is_empty() {
                return Err(SyncollError::config(format!(
                    "missing `{conf_context}.{key}`"
                )));
            }
        }
        let values = [
            ("nounPosValue", &self.noun_value),
            ("verbPosValue", &self.verb_value),
            ("nounModifiedValue", &self.noun_modified_value),
            ("nounSubjectValue", &self.noun_subject_value),
            ("nounObjectValue", &self.noun_object_value),
        ];
        for (key, value) in values {
            if value.is_empty() {
                return Err(SyncollError::config(format!(
                    "missing `{conf_context}.{key}`"
                )));
            }
        }
        Ok(())
    }

    /// Relation literals of the three aggregated relation classes.
    pub fn relation_values(&self) -> [&str; 3] {
        [
            &self.noun_modified_value,
            &self.noun_subject_value,
            &self.noun_object_value,
        ]
    }

    /// Minimum number of columns a token row must have so that every
    /// configured attribute can be read.
    pub fn min_token_columns(&self) -> usize {
        [
            self.parent_idx_attr.vertical_col,
            self.lemma_attr.vertical_col,
            self.par_lemma_attr.vertical_col,
            self.pos_attr.vertical_col,
            self.par_pos_attr.vertical_col,
            self.func_attr.vertical_col,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Layout of UD-annotated corpora as used by the intercorp_v13ud family
    /// (word, lemma, ..., upos, ..., deprel, parent offset, p_lemma, p_upos).
    pub fn universal_dependencies() -> Self {
        SyntaxProps {
            parent_idx_attr: PosAttrProps::new("parent", 10),
            lemma_attr: PosAttrProps::new("lemma", 1),
            par_lemma_attr: PosAttrProps::new("p_lemma", 11),
            pos_attr: PosAttrProps::new("upos", 3),
            par_pos_attr: PosAttrProps::new("p_upos", 12),
            func_attr: PosAttrProps::new("deprel", 9),
            noun_value: "NOUN".to_string(),
            verb_value: "VERB".to_string(),
            noun_modified_value: "nmod".to_string(),
            noun_subject_value: "nsubj".to_string(),
            noun_object_value: "obj|iobj".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ud_layout_is_valid() {
        let props = SyntaxProps::universal_dependencies();
        assert!(props.validate("corpora").is_ok());
        assert_eq!(props.min_token_columns(), 13);
    }

    #[test]
    fn test_missing_attr_is_reported() {
        let mut props = SyntaxProps::universal_dependencies();
        props.par_pos_attr.name.clear();
        let err = props.validate("corpora").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: missing `corpora.parPosAttr`"
        );
    }

    #[test]
    fn test_missing_value_is_reported() {
        let mut props = SyntaxProps::universal_dependencies();
        props.noun_object_value.clear();
        assert!(props.validate("corpora").is_err());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(SyntaxProps::universal_dependencies()).unwrap();
        assert_eq!(json["nounPosValue"], "NOUN");
        assert_eq!(json["lemmaAttr"]["verticalCol"], 1);
        assert_eq!(json["nounObjectValue"], "obj|iobj");
    }
}
