//! Multi-value dependency relations (`obj|iobj`).

/// Expand a relation expression into its atomic relations followed by the
/// original expression. A plain relation expands to itself.
pub fn expand_deprel_multivalue(value: &str) -> Vec<&str> {
    let atoms = deprel_atoms(value);
    if atoms.len() <= 1 {
        return vec![value];
    }
    let mut ans = atoms;
    ans.push(value);
    ans
}

/// The atomic relations of an expression, without duplicates or empty
/// parts.
pub fn deprel_atoms(value: &str) -> Vec<&str> {
    let mut atoms: Vec<&str> = Vec::with_capacity(2);
    for atom in value.split('|').map(str::trim) {
        if !atom.is_empty() && !atoms.contains(&atom) {
            atoms.push(atom);
        }
    }
    atoms
}

/// A configured relation class such as `nmod` or `obj|iobj`.
///
/// Edges are stored under the class value, so a token is counted once per
/// class it falls into, however many of the class' atoms its own relation
/// mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationClass {
    value: String,
    atoms: Vec<String>,
}

impl RelationClass {
    pub fn new(value: &str) -> Self {
        RelationClass {
            value: value.to_string(),
            atoms: deprel_atoms(value).into_iter().map(str::to_string).collect(),
        }
    }

    /// The configured expression; the `deprel` stored for matching edges.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether a token relation (possibly multi-value) falls into the class.
    pub fn matches(&self, deprel: &str) -> bool {
        expand_deprel_multivalue(deprel)
            .into_iter()
            .any(|item| item == self.value || self.atoms.iter().any(|atom| atom == item))
    }
}

/// Relation classes of several configured expressions, without duplicates.
pub fn relation_classes<S: AsRef<str>>(values: &[S]) -> Vec<RelationClass> {
    let mut ans: Vec<RelationClass> = Vec::with_capacity(values.len());
    for value in values {
        let class = RelationClass::new(value.as_ref());
        if !class.atoms.is_empty() && !ans.contains(&class) {
            ans.push(class);
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value() {
        assert_eq!(expand_deprel_multivalue("nmod"), vec!["nmod"]);
        assert_eq!(deprel_atoms("nmod"), vec!["nmod"]);
    }

    #[test]
    fn test_multi_value() {
        assert_eq!(
            expand_deprel_multivalue("obj|iobj"),
            vec!["obj", "iobj", "obj|iobj"]
        );
        assert_eq!(
            expand_deprel_multivalue("a|b|c"),
            vec!["a", "b", "c", "a|b|c"]
        );
        assert_eq!(deprel_atoms("obj||iobj|obj"), vec!["obj", "iobj"]);
    }

    #[test]
    fn test_class_matching() {
        let object = RelationClass::new("obj|iobj");
        assert!(object.matches("obj"));
        assert!(object.matches("iobj"));
        assert!(object.matches("obj|iobj"));
        assert!(object.matches("nsubj|iobj"));
        assert!(!object.matches("nsubj"));
        assert!(!object.matches("objx"));

        // a token relation with several atoms still matches a plain class
        let obj = RelationClass::new("obj");
        assert!(obj.matches("obj|iobj"));
        assert!(!obj.matches("iobj"));
    }

    #[test]
    fn test_configured_classes() {
        let classes = relation_classes(&["nmod", "nsubj", "obj|iobj", "nmod", ""]);
        let values: Vec<_> = classes.iter().map(RelationClass::value).collect();
        assert_eq!(values, vec!["nmod", "nsubj", "obj|iobj"]);
    }
}
