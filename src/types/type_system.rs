//! Type System for letc
//!
//! Every type node lives in a [`TypeArena`] and is referred to by a
//! [`TypeId`] handle. Declarations, expressions and scope entries share
//! handles freely; the arena is dropped together with the program, so no
//! node needs to know who else points at it.

use std::fmt::Write;

/// Handle to a type node inside a [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bit width of an integer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    W32,
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// An integer type: width and signedness queried independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntType {
    pub width: IntWidth,
    pub signedness: Signedness,
}

impl IntType {
    pub const I32: IntType = IntType::new(IntWidth::W32, Signedness::Signed);
    pub const I64: IntType = IntType::new(IntWidth::W64, Signedness::Signed);
    pub const U32: IntType = IntType::new(IntWidth::W32, Signedness::Unsigned);
    pub const U64: IntType = IntType::new(IntWidth::W64, Signedness::Unsigned);

    pub const fn new(width: IntWidth, signedness: Signedness) -> Self {
        Self { width, signedness }
    }

    /// Smallest integer type able to hold a literal value
    pub fn smallest_fit(value: i64) -> Self {
        if i32::try_from(value).is_ok() {
            Self::I32
        } else {
            Self::I64
        }
    }

    /// Widen to `wider`'s width, keeping this type's own signedness
    pub fn widened_to(&self, wider: IntType) -> IntType {
        IntType::new(wider.width, self.signedness)
    }

    pub fn name(&self) -> &'static str {
        match (self.width, self.signedness) {
            (IntWidth::W32, Signedness::Signed) => "i32",
            (IntWidth::W64, Signedness::Signed) => "i64",
            (IntWidth::W32, Signedness::Unsigned) => "u32",
            (IntWidth::W64, Signedness::Unsigned) => "u64",
        }
    }
}

/// Declaration modifier, carried on the declared type node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modifier {
    #[default]
    Default,
    Const,
    /// Prototype whose definition has not been seen yet
    Proto,
    /// Prototype that has been matched by a later definition
    ProtoDefined,
}

/// A name paired with its type: declarations, parameters and fields
#[derive(Debug, Clone, PartialEq)]
pub struct TypedSymbol {
    pub name: String,
    pub ty: TypeId,
}

impl TypedSymbol {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self { name: name.into(), ty }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Bool,
    Void,
    Char,
    Int(IntType),
    /// `T*`, or `T@` when `is_const`
    Pointer { pointee: TypeId, is_const: bool },
    /// `(a: T, ...) -> R`
    Function { params: Vec<TypedSymbol>, ret: TypeId },
    /// A struct definition has `name: None` and `fields: Some`, a
    /// reference `struct Name` has `name: Some` and `fields: None`
    Struct {
        name: Option<String>,
        fields: Option<Vec<TypedSymbol>>,
    },
}

/// A type node
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub modifier: Modifier,
}

/// Owner of every type node of one program
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    types: Vec<Type>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Allocation ====================

    pub fn alloc(&mut self, kind: TypeKind) -> TypeId {
        self.alloc_with(kind, Modifier::Default)
    }

    pub fn alloc_with(&mut self, kind: TypeKind, modifier: Modifier) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type { kind, modifier });
        id
    }

    pub fn int(&mut self, int: IntType) -> TypeId {
        self.alloc(TypeKind::Int(int))
    }

    pub fn pointer_to(&mut self, pointee: TypeId, is_const: bool) -> TypeId {
        self.alloc(TypeKind::Pointer { pointee, is_const })
    }

    /// Independent copy of a whole type tree
    pub fn deep_copy(&mut self, id: TypeId) -> TypeId {
        let Type { kind, modifier } = self.get(id).clone();
        let kind = match kind {
            TypeKind::Pointer { pointee, is_const } => TypeKind::Pointer {
                pointee: self.deep_copy(pointee),
                is_const,
            },
            TypeKind::Function { params, ret } => TypeKind::Function {
                params: self.copy_symbols(params),
                ret: self.deep_copy(ret),
            },
            TypeKind::Struct { name, fields } => TypeKind::Struct {
                name,
                fields: fields.map(|f| self.copy_symbols(f)),
            },
            other => other,
        };
        self.alloc_with(kind, modifier)
    }

    fn copy_symbols(&mut self, symbols: Vec<TypedSymbol>) -> Vec<TypedSymbol> {
        symbols
            .into_iter()
            .map(|sym| {
                let ty = self.deep_copy(sym.ty);
                TypedSymbol::new(sym.name, ty)
            })
            .collect()
    }

    // ==================== Access ====================

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.get(id).kind
    }

    pub fn kind_mut(&mut self, id: TypeId) -> &mut TypeKind {
        &mut self.types[id.index()].kind
    }

    pub fn modifier(&self, id: TypeId) -> Modifier {
        self.get(id).modifier
    }

    pub fn set_modifier(&mut self, id: TypeId, modifier: Modifier) {
        self.types[id.index()].modifier = modifier;
    }

    pub fn int_type(&self, id: TypeId) -> Option<IntType> {
        match self.kind(id) {
            TypeKind::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn is_int(&self, id: TypeId) -> bool {
        self.int_type(id).is_some()
    }

    pub fn is_bool(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Bool)
    }

    pub fn is_char(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Char)
    }

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Void)
    }

    pub fn is_function(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Function { .. })
    }

    pub fn is_struct(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Struct { .. })
    }

    pub fn is_struct_definition(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Struct { name: None, fields: Some(_) })
    }

    /// Pointee of a pointer or const pointer
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Pointer { pointee, .. } => Some(*pointee),
            _ => None,
        }
    }

    /// `void*` (non-const), the type of `null`
    pub fn is_void_pointer(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Pointer { pointee, is_const: false } => self.is_void(*pointee),
            _ => false,
        }
    }

    // ==================== Relations ====================

    /// Structural equality. Loose mode treats integers of equal width as the
    /// same type regardless of signedness; parameter lists always compare
    /// strictly.
    pub fn equals(&self, a: TypeId, b: TypeId, strict: bool) -> bool {
        if a == b {
            return true;
        }
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Bool, TypeKind::Bool)
            | (TypeKind::Void, TypeKind::Void)
            | (TypeKind::Char, TypeKind::Char) => true,
            (TypeKind::Int(x), TypeKind::Int(y)) => {
                if strict {
                    x == y
                } else {
                    x.width == y.width
                }
            }
            (
                TypeKind::Pointer { pointee: pa, is_const: ca },
                TypeKind::Pointer { pointee: pb, is_const: cb },
            ) => ca == cb && self.equals(*pa, *pb, strict),
            (
                TypeKind::Function { params: pa, ret: ra },
                TypeKind::Function { params: pb, ret: rb },
            ) => self.symbols_equal(pa, pb, false) && self.equals(*ra, *rb, strict),
            (
                TypeKind::Struct { name: na, fields: fa },
                TypeKind::Struct { name: nb, fields: fb },
            ) => {
                na == nb
                    && match (fa, fb) {
                        (None, None) => true,
                        (Some(fa), Some(fb)) => self.symbols_equal(fa, fb, true),
                        _ => false,
                    }
            }
            _ => false,
        }
    }

    pub fn loose_eq(&self, a: TypeId, b: TypeId) -> bool {
        self.equals(a, b, false)
    }

    pub fn strict_eq(&self, a: TypeId, b: TypeId) -> bool {
        self.equals(a, b, true)
    }

    fn symbols_equal(&self, a: &[TypedSymbol], b: &[TypedSymbol], compare_names: bool) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| {
                (!compare_names || x.name == y.name) && self.strict_eq(x.ty, y.ty)
            })
    }

    /// Whether a value of type `right` may be stored into a location of
    /// type `left` through an inserted cast: integer widening, or `void*`
    /// into any pointer.
    pub fn can_cast_implicitly(&self, left: TypeId, right: TypeId) -> bool {
        match (self.kind(left), self.kind(right)) {
            (TypeKind::Int(l), TypeKind::Int(r)) => l.width > r.width,
            (TypeKind::Pointer { .. }, _) => self.is_void_pointer(right),
            _ => false,
        }
    }

    // ==================== Display ====================

    /// Render a type in source syntax
    pub fn display(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id);
        out
    }

    pub fn write_type(&self, out: &mut String, id: TypeId) {
        match self.kind(id) {
            TypeKind::Bool => out.push_str("bool"),
            TypeKind::Void => out.push_str("void"),
            TypeKind::Char => out.push_str("char"),
            TypeKind::Int(int) => out.push_str(int.name()),
            TypeKind::Pointer { pointee, is_const } => {
                self.write_type(out, *pointee);
                out.push(if *is_const { '@' } else { '*' });
            }
            TypeKind::Function { params, ret } => {
                out.push('(');
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: ", param.name);
                    self.write_type(out, param.ty);
                }
                out.push_str(") -> ");
                self.write_type(out, *ret);
            }
            TypeKind::Struct { name: Some(name), .. } => {
                let _ = write!(out, "struct {}", name);
            }
            TypeKind::Struct { name: None, .. } => out.push_str("struct"),
        }
    }
}
