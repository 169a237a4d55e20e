use std::collections::HashMap;

use crate::expr::Sym;

/// Interned symbol table, alive for the whole process. Every textual
/// occurrence of a name resolves to one canonical `Sym`, which is what
/// makes identity-based variable lookup work at all.
pub struct SymbolTable {
    name_to_id: HashMap<String, Sym>,
    id_to_name: Vec<String>,
}

/// Well-known ids, pre-interned at startup.
/// The order MUST match the names in `SymbolTable::new`.
pub mod sym {
    use crate::expr::Sym;

    pub const QUOTE: Sym = Sym(0);
    pub const IF: Sym = Sym(1);
    pub const LAMBDA: Sym = Sym(2);
    pub const DEFINE: Sym = Sym(3);
    pub const CALL_CC: Sym = Sym(4);
    pub const T: Sym = Sym(5);
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        let mut table = SymbolTable {
            name_to_id: HashMap::new(),
            id_to_name: Vec::new(),
        };
        for name in &["quote", "if", "lambda", "define", "call/cc", "#t"] {
            table.intern(name);
        }
        table
    }

    /// Intern a name, returning the existing id if already present.
    pub fn intern(&mut self, name: &str) -> Sym {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = Sym(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_owned(), id);
        self.id_to_name.push(name.to_owned());
        id
    }

    pub fn name(&self, id: Sym) -> &str {
        &self.id_to_name[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_canonical() {
        let mut table = SymbolTable::new();
        let a = table.intern("alpha");
        let b = table.intern("beta");
        assert_eq!(a, table.intern("alpha"));
        assert_ne!(a, b);
        assert_eq!(table.name(a), "alpha");
    }

    #[test]
    fn well_known_ids_are_stable() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern("quote"), sym::QUOTE);
        assert_eq!(table.intern("if"), sym::IF);
        assert_eq!(table.intern("lambda"), sym::LAMBDA);
        assert_eq!(table.intern("define"), sym::DEFINE);
        assert_eq!(table.intern("call/cc"), sym::CALL_CC);
        assert_eq!(table.intern("#t"), sym::T);
    }
}
