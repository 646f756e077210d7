//! Scope stack used by the checker
//!
//! Each scope maps identifier text to the [`TypeId`] of its declaration.
//! Scopes only index declarations owned by the AST; popping a scope drops
//! the index, never the declarations.

use crate::types::TypeId;

const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

const INITIAL_CAPACITY: usize = 16;

/// 64-bit FNV-1a hash of a string
pub fn fnv1a(key: &str) -> u64 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone)]
struct Slot<V> {
    hash: u64,
    key: String,
    value: V,
}

/// Open-addressing map with linear probing.
///
/// Entries are never removed individually, so probing needs no tombstones.
/// The table doubles once it would pass 75% occupancy.
#[derive(Debug, Clone)]
pub struct ScopeMap<V> {
    slots: Vec<Option<Slot<V>>>,
    len: usize,
}

impl<V> ScopeMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot holding `key`, or of the empty slot where it belongs
    fn probe(&self, key: &str, hash: u64) -> usize {
        let mask = self.slots.len() - 1;
        let mut index = (hash as usize) & mask;
        loop {
            match &self.slots[index] {
                Some(slot) if slot.hash == hash && slot.key == key => return index,
                Some(_) => index = (index + 1) & mask,
                None => return index,
            }
        }
    }

    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if (self.len + 1) * 4 > self.slots.len() * 3 {
            self.grow();
        }

        let hash = fnv1a(&key);
        let index = self.probe(&key, hash);
        match &mut self.slots[index] {
            Some(slot) => Some(std::mem::replace(&mut slot.value, value)),
            empty => {
                *empty = Some(Slot { hash, key, value });
                self.len += 1;
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let index = self.probe(key, fnv1a(key));
        self.slots[index].as_ref().map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let index = self.probe(key, fnv1a(key));
        self.slots[index].as_mut().map(|slot| &mut slot.value)
    }

    fn grow(&mut self) {
        let new_capacity = self.slots.len() * 2;
        let old = std::mem::replace(
            &mut self.slots,
            std::iter::repeat_with(|| None).take(new_capacity).collect(),
        );
        for slot in old.into_iter().flatten() {
            let index = self.probe(&slot.key, slot.hash);
            self.slots[index] = Some(slot);
        }
        log::trace!("scope map grown to {} slots", new_capacity);
    }
}

impl<V> Default for ScopeMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound name. A poisoned symbol was declared with a type that has
/// already been reported as invalid; it still occupies its name but uses of
/// it resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Symbol {
    ty: TypeId,
    poisoned: bool,
}

/// One level of the scope stack
#[derive(Debug, Clone, Default)]
struct Scope {
    symbols: ScopeMap<Symbol>,
    /// Return type of the enclosing function, inherited by nested scopes
    return_type: Option<TypeId>,
}

/// Symbol table with nested scopes
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self) {
        let return_type = self.return_type();
        self.scopes.push(Scope {
            symbols: ScopeMap::new(),
            return_type,
        });
        log::trace!("enter scope (depth {})", self.scopes.len());
    }

    /// Exit the current scope. The global scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            log::trace!("exit scope (depth {})", self.scopes.len());
        }
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Bind a name in the current scope, returning any previous binding
    /// from the same scope
    pub fn bind(&mut self, name: &str, ty: TypeId) -> Option<TypeId> {
        let symbol = Symbol { ty, poisoned: false };
        self.current()
            .symbols
            .insert(name, symbol)
            .map(|previous| previous.ty)
    }

    /// Mark the binding of `name` in the current scope as poisoned
    pub fn poison(&mut self, name: &str) {
        if let Some(symbol) = self.current().symbols.get_mut(name) {
            symbol.poisoned = true;
        }
    }

    fn resolve(&self, name: &str) -> Option<Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name).copied())
    }

    /// Look up a name, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.resolve(name).map(|symbol| symbol.ty)
    }

    /// Whether the innermost binding of `name` is poisoned
    pub fn is_poisoned(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|symbol| symbol.poisoned)
    }

    /// Look up a name only in the current scope
    pub fn lookup_local(&self, name: &str) -> Option<TypeId> {
        self.scopes
            .last()
            .and_then(|scope| scope.symbols.get(name))
            .map(|symbol| symbol.ty)
    }

    /// Set the return type for the current scope and everything nested in it
    pub fn bind_return_type(&mut self, ty: TypeId) {
        self.current().return_type = Some(ty);
    }

    pub fn return_type(&self) -> Option<TypeId> {
        self.scopes.last().and_then(|scope| scope.return_type)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntType, TypeArena, TypeKind};

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(""), 0xcbf29ce484222325);
        assert_eq!(fnv1a("a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a("foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_scope_map_grows_past_load_factor() {
        let mut map = ScopeMap::with_capacity(4);
        for i in 0..100 {
            assert_eq!(map.insert(format!("name{}", i), i), None);
        }

        assert_eq!(map.len(), 100);
        assert!(map.len() * 4 <= map.capacity() * 3);
        for i in 0..100 {
            assert_eq!(map.get(&format!("name{}", i)), Some(&i));
        }
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_scope_map_replaces_existing_key() {
        let mut map = ScopeMap::new();
        map.insert("x", 1);
        assert_eq!(map.insert("x", 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x"), Some(&2));
    }

    #[test]
    fn test_shadowing_and_scope_exit() {
        let mut types = TypeArena::new();
        let outer = types.int(IntType::I32);
        let inner = types.int(IntType::I64);
        let mut table = SymbolTable::new();

        table.bind("x", outer);
        table.enter_scope();
        assert_eq!(table.lookup("x"), Some(outer));
        assert_eq!(table.lookup_local("x"), None);

        table.bind("x", inner);
        assert_eq!(table.lookup("x"), Some(inner));

        table.exit_scope();
        assert_eq!(table.lookup("x"), Some(outer));
    }

    #[test]
    fn test_return_type_is_inherited() {
        let mut types = TypeArena::new();
        let ret = types.int(IntType::U64);
        let mut table = SymbolTable::new();

        assert_eq!(table.return_type(), None);
        table.enter_scope();
        table.bind_return_type(ret);
        table.enter_scope();
        table.enter_scope();
        assert_eq!(table.return_type(), Some(ret));
        table.exit_scope();
        table.exit_scope();
        table.exit_scope();
        assert_eq!(table.return_type(), None);
    }

    #[test]
    fn test_poisoned_binding_is_shadowable() {
        let mut types = TypeArena::new();
        let void = types.alloc(TypeKind::Void);
        let int = types.int(IntType::I32);
        let mut table = SymbolTable::new();

        table.bind("v", void);
        table.poison("v");
        assert_eq!(table.lookup("v"), Some(void));
        assert!(table.is_poisoned("v"));

        table.enter_scope();
        table.bind("v", int);
        assert!(!table.is_poisoned("v"));
        table.exit_scope();
        assert!(table.is_poisoned("v"));
        assert!(!table.is_poisoned("missing"));
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut types = TypeArena::new();
        let ty = types.int(IntType::I32);
        let mut table = SymbolTable::new();
        table.bind("g", ty);
        table.exit_scope();
        assert_eq!(table.lookup("g"), Some(ty));
    }
}
