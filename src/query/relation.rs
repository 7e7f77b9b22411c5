//! Relation classes served by the query engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregation::RelationClass;
use crate::config::SyntaxProps;
use crate::error::SyncollError;

/// What the candidates are with respect to the query word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The query word is the child; candidates are its parents.
    Parents,
    /// The query word is the parent; candidates are its children.
    Children,
}

/// A relation class with a fixed direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    /// Nouns the query word modifies: `[lemma=w & deprel=nmod & p_upos=NOUN]`.
    NounsModifiedBy,
    /// Nouns modifying the query word: `[p_lemma=w & deprel=nmod & upos=NOUN]`.
    ModifiersOf,
    /// Verbs having the query word as subject.
    VerbsSubject,
    /// Verbs having the query word as object.
    VerbsObject,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::NounsModifiedBy,
        Relation::ModifiersOf,
        Relation::VerbsSubject,
        Relation::VerbsObject,
    ];

    pub fn direction(&self) -> Direction {
        match self {
            Relation::ModifiersOf => Direction::Children,
            _ => Direction::Parents,
        }
    }

    /// The configured relation expression, e.g. `obj|iobj`.
    pub fn deprel_value<'a>(&self, conf: &'a SyntaxProps) -> &'a str {
        match self {
            Relation::NounsModifiedBy | Relation::ModifiersOf => &conf.noun_modified_value,
            Relation::VerbsSubject => &conf.noun_subject_value,
            Relation::VerbsObject => &conf.noun_object_value,
        }
    }

    /// Relation values matched in storage. Edges are stored under their
    /// class value, so a multi-value class is a single key.
    pub fn deprels(&self, conf: &SyntaxProps) -> Vec<String> {
        vec![RelationClass::new(self.deprel_value(conf)).value().to_string()]
    }

    /// Part of speech every candidate must have.
    pub fn candidate_upos<'a>(&self, conf: &'a SyntaxProps) -> &'a str {
        match self {
            Relation::NounsModifiedBy | Relation::ModifiersOf => &conf.noun_value,
            Relation::VerbsSubject | Relation::VerbsObject => &conf.verb_value,
        }
    }

    /// Path segment of the HTTP endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Relation::NounsModifiedBy => "noun-modified-by",
            Relation::ModifiersOf => "modifiers-of",
            Relation::VerbsSubject => "verbs-subject",
            Relation::VerbsObject => "verbs-object",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for Relation {
    type Err = SyncollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|r| r.endpoint() == s)
            .ok_or_else(|| SyncollError::invalid_argument(format!("unknown relation `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_mapping() {
        let conf = SyntaxProps::universal_dependencies();
        assert_eq!(Relation::ModifiersOf.direction(), Direction::Children);
        assert_eq!(Relation::VerbsObject.direction(), Direction::Parents);
        assert_eq!(Relation::VerbsObject.deprels(&conf), vec!["obj|iobj"]);
        assert_eq!(Relation::ModifiersOf.deprels(&conf), vec!["nmod"]);
        assert_eq!(Relation::VerbsSubject.candidate_upos(&conf), "VERB");
        assert_eq!(Relation::ModifiersOf.candidate_upos(&conf), "NOUN");
    }

    #[test]
    fn test_parse() {
        for rel in Relation::ALL {
            assert_eq!(rel.endpoint().parse::<Relation>().unwrap(), rel);
        }
        assert!("verbs".parse::<Relation>().is_err());
    }
}
