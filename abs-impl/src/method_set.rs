use abs_grammar::nodes::MethodImpl;

/// Ordered set of methods keyed by name.
///
/// Insertion order is kept, replacement keeps the replaced method's position
/// and removal closes the gap, so composition results are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    methods: Vec<MethodImpl>,
}

impl MethodSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&MethodImpl> {
        self.methods.iter().find(|m| m.name() == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name() == name)
    }

    /// Adds `method`, handing it back if the name is taken.
    pub fn insert(&mut self, method: MethodImpl) -> Result<(), MethodImpl> {
        if self.contains(method.name()) {
            return Err(method);
        }
        self.methods.push(method);
        Ok(())
    }

    /// Puts `method` in place of the method of the same name and returns the
    /// replaced one. Appends when there is none.
    pub fn replace(&mut self, method: MethodImpl) -> Option<MethodImpl> {
        match self.position(method.name()) {
            Some(i) => Some(std::mem::replace(&mut self.methods[i], method)),
            None => {
                self.methods.push(method);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<MethodImpl> {
        self.position(name).map(|i| self.methods.remove(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodImpl> {
        self.methods.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.methods.iter().map(MethodImpl::name).collect()
    }

    pub fn into_vec(self) -> Vec<MethodImpl> {
        self.methods
    }
}

impl IntoIterator for MethodSet {
    type Item = MethodImpl;
    type IntoIter = std::vec::IntoIter<MethodImpl>;

    fn into_iter(self) -> Self::IntoIter {
        self.methods.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abs_grammar::nodes::{Block, MethodSig, TypeUse};

    fn method(name: &str) -> MethodImpl {
        MethodImpl::new(MethodSig::new(name, TypeUse::named("Unit")), Block::default())
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut set = MethodSet::new();
        assert!(set.insert(method("a")).is_ok());
        let rejected = set.insert(method("a")).unwrap_err();
        assert_eq!(rejected.name(), "a");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut set = MethodSet::new();
        for n in ["a", "b", "c"] {
            set.insert(method(n)).unwrap();
        }
        let mut b2 = method("b");
        b2.sig.return_type = TypeUse::named("Int");
        let old = set.replace(b2).unwrap();
        assert_eq!(old.sig.return_type.name, "Unit");
        assert_eq!(set.names(), vec!["a", "b", "c"]);
        assert_eq!(set.get("b").unwrap().sig.return_type.name, "Int");
    }

    #[test]
    fn test_replace_missing_appends() {
        let mut set = MethodSet::new();
        set.insert(method("a")).unwrap();
        assert!(set.replace(method("z")).is_none());
        assert_eq!(set.names(), vec!["a", "z"]);
    }

    #[test]
    fn test_remove_closes_gap() {
        let mut set = MethodSet::new();
        for n in ["a", "b", "c"] {
            set.insert(method(n)).unwrap();
        }
        assert!(set.remove("b").is_some());
        assert!(set.remove("b").is_none());
        assert_eq!(set.names(), vec!["a", "c"]);
    }
}
