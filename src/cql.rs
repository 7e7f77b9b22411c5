//! Example search queries for a relation.
//!
//! The generated expression is a single-token CQL query such as
//! `[lemma="team" & p_lemma="%s" & deprel="nmod" & p_upos="NOUN"]`, with
//! one placeholder standing for the candidate word.

use crate::config::SyntaxProps;
use crate::query::{Relation, Word};

/// Quote a value for use inside a double-quoted CQL string.
pub fn quote(value: &str) -> String {
    let mut ans = String::with_capacity(value.len() + 2);
    ans.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            ans.push('\\');
        }
        ans.push(c);
    }
    ans.push('"');
    ans
}

struct Clauses(Vec<String>);

impl Clauses {
    fn new() -> Self {
        Clauses(Vec::with_capacity(5))
    }

    fn add(&mut self, attr: &str, value: &str) -> &mut Self {
        self.0.push(format!("{attr}={}", quote(value)));
        self
    }

    fn add_if(&mut self, cond: bool, attr: &str, value: &str) -> &mut Self {
        if cond {
            self.add(attr, value);
        }
        self
    }

    fn render(&self) -> String {
        format!("[{}]", self.0.join(" & "))
    }
}

/// Build the example query of `relation` for `word`. `candidate` is put
/// in verbatim (quoted) so that callers may pass a placeholder such as
/// `%s`. The POS clause is omitted when the word has no POS.
pub fn example_query(conf: &SyntaxProps, relation: Relation, word: &Word, candidate: &str) -> String {
    let has_pos = word.pos().is_some();
    let mut q = Clauses::new();
    match relation {
        Relation::NounsModifiedBy => {
            q.add(&conf.lemma_attr.name, &word.v)
                .add_if(has_pos, &conf.pos_attr.name, &word.pos)
                .add(&conf.par_lemma_attr.name, candidate)
                .add(&conf.func_attr.name, &conf.noun_modified_value)
                .add(&conf.par_pos_attr.name, &conf.noun_value);
        }
        Relation::ModifiersOf => {
            q.add(&conf.par_lemma_attr.name, &word.v)
                .add_if(has_pos, &conf.par_pos_attr.name, &word.pos)
                .add(&conf.func_attr.name, &conf.noun_modified_value)
                .add(&conf.pos_attr.name, &conf.noun_value)
                .add(&conf.lemma_attr.name, candidate);
        }
        Relation::VerbsSubject | Relation::VerbsObject => {
            let deprel = if relation == Relation::VerbsSubject {
                &conf.noun_subject_value
            } else {
                &conf.noun_object_value
            };
            q.add(&conf.lemma_attr.name, &word.v)
                .add_if(has_pos, &conf.pos_attr.name, &word.pos)
                .add(&conf.func_attr.name, deprel)
                .add(&conf.par_pos_attr.name, &conf.verb_value)
                .add(&conf.par_lemma_attr.name, candidate);
        }
    }
    q.render()
}
