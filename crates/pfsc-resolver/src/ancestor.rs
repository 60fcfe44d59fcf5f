//! Resolves `contra`, `alternate`, `cf`, and `doc` references against
//! ancestor scopes (spec §4.4 step 3): a bare name is looked up in the node
//! declaring it, then successively in each enclosing deduction/module until
//! found or the root is reached.

use pfsc_errors::PfscError;

/// A lexical scope: something that may directly declare `name`, and that
/// has (at most) one enclosing scope.
pub trait Scope {
    fn declares(&self, name: &str) -> Option<String>;
    fn parent_scope(&self) -> Option<&dyn Scope>;
    fn libpath(&self) -> &str;
}

/// Walks from `start` outward through enclosing scopes looking for `name`,
/// returning the libpath it resolves to.
pub fn resolve_against_ancestors(start: &dyn Scope, name: &str) -> Result<String, PfscError> {
    let mut scope = start;
    loop {
        if let Some(resolved) = scope.declares(name) {
            return Ok(resolved);
        }
        match scope.parent_scope() {
            Some(p) => scope = p,
            None => {
                return Err(PfscError::RelativeLibpathCannotBeResolved(format!(
                    "'{name}' not found in any ancestor scope of {}",
                    start.libpath()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestScope {
        libpath: String,
        decls: HashMap<String, String>,
        parent: Option<Box<TestScope>>,
    }

    impl Scope for TestScope {
        fn declares(&self, name: &str) -> Option<String> {
            self.decls.get(name).cloned()
        }
        fn parent_scope(&self) -> Option<&dyn Scope> {
            self.parent.as_deref().map(|p| p as &dyn Scope)
        }
        fn libpath(&self) -> &str {
            &self.libpath
        }
    }

    #[test]
    fn finds_name_in_immediate_scope() {
        let mut decls = HashMap::new();
        decls.insert("x".to_string(), "a.b.x".to_string());
        let scope = TestScope { libpath: "a.b".to_string(), decls, parent: None };
        assert_eq!(resolve_against_ancestors(&scope, "x").unwrap(), "a.b.x");
    }

    #[test]
    fn finds_name_in_ancestor_scope() {
        let mut parent_decls = HashMap::new();
        parent_decls.insert("y".to_string(), "a.y".to_string());
        let parent = TestScope { libpath: "a".to_string(), decls: parent_decls, parent: None };
        let child = TestScope { libpath: "a.b".to_string(), decls: HashMap::new(), parent: Some(Box::new(parent)) };
        assert_eq!(resolve_against_ancestors(&child, "y").unwrap(), "a.y");
    }

    #[test]
    fn unresolved_name_is_an_error() {
        let scope = TestScope { libpath: "a.b".to_string(), decls: HashMap::new(), parent: None };
        assert!(resolve_against_ancestors(&scope, "nope").is_err());
    }
}
