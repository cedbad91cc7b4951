//! Types and unification.
//!
//! Every occurrence of a type is a [`TypeHandle`], a cell that points at a
//! representative type in the environment's arena. Unifying a type variable
//! with another type redirects every cell pointing at the variable, so all
//! the expressions sharing it see the result at once.

mod typing;

use std::collections::HashSet;

pub use self::typing::{Constraint, Typing};
use crate::errors::{SemanticError, Span};

/// Rendering stops descending past this depth. Without the occurs check,
/// unification can build types that contain themselves.
const MAX_DISPLAY_DEPTH: usize = 8;

/// One occurrence of a type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TypeHandle(usize);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct ReprId(usize);

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// Not yet known.
    Variable(u32),
    Boolean,
    Function {
        params: Vec<TypeHandle>,
        ret: TypeHandle,
    },
    /// A record of columns, in declaration order. Names are unique.
    Table(Vec<(String, TypeHandle)>),
    /// A column of the named primitive type, like `int`.
    Column(String),
}

#[derive(Clone, Debug)]
struct Representative {
    ty: Type,
    /// Every cell currently pointing at this representative.
    cells: Vec<TypeHandle>,
}

/// Holds every type of one compilation.
#[derive(Clone, Debug)]
pub struct TypeEnvironment {
    cells: Vec<ReprId>,
    representatives: Vec<Representative>,
    /// Shared by every `bool` in the environment.
    boolean: ReprId,
    next_type_var_id: u32,
    occurs_check: bool,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        let boolean = Representative {
            ty: Type::Boolean,
            cells: Vec::new(),
        };

        Self {
            cells: Vec::new(),
            representatives: vec![boolean],
            boolean: ReprId(0),
            next_type_var_id: 0,
            occurs_check: false,
        }
    }

    /// Reject unifications that would make a type contain itself.
    pub fn set_occurs_check(&mut self, enabled: bool) {
        self.occurs_check = enabled;
    }

    fn add_cell(&mut self, repr: ReprId) -> TypeHandle {
        let handle = TypeHandle(self.cells.len());
        self.cells.push(repr);
        self.representatives[repr.0].cells.push(handle);
        handle
    }

    /// Adds a new representative and returns a handle to it.
    pub fn add_type(&mut self, ty: Type) -> TypeHandle {
        self.representatives.push(Representative {
            ty,
            cells: Vec::new(),
        });

        self.add_cell(ReprId(self.representatives.len() - 1))
    }

    pub fn add_new_type_variable(&mut self) -> TypeHandle {
        let ty = Type::Variable(self.next_type_var_id);
        self.next_type_var_id += 1;
        self.add_type(ty)
    }

    pub fn boolean(&mut self) -> TypeHandle {
        self.add_cell(self.boolean)
    }

    pub fn column(&mut self, primitive: &str) -> TypeHandle {
        self.add_type(Type::Column(primitive.to_owned()))
    }

    pub fn function(&mut self, params: Vec<TypeHandle>, ret: TypeHandle) -> TypeHandle {
        self.add_type(Type::Function { params, ret })
    }

    pub fn table(&mut self, columns: Vec<(String, TypeHandle)>) -> TypeHandle {
        self.add_type(Type::Table(columns))
    }

    /// A new occurrence of the same type as `handle`.
    pub fn alias(&mut self, handle: TypeHandle) -> TypeHandle {
        self.add_cell(self.cells[handle.0])
    }

    /// The type `handle` currently stands for.
    pub fn get_type(&self, handle: TypeHandle) -> &Type {
        &self.representatives[self.cells[handle.0].0].ty
    }

    /// Whether two handles point at the very same representative.
    pub fn same(&self, first: TypeHandle, second: TypeHandle) -> bool {
        self.cells[first.0] == self.cells[second.0]
    }

    /// Unify two types, asserting that they must be equal.
    pub fn unify(
        &mut self,
        first: TypeHandle,
        second: TypeHandle,
        span: Span,
    ) -> Result<(), SemanticError> {
        self.unify_handles(first, second, span, &mut HashSet::new())
    }

    /// `in_progress` holds the pairs already being unified further up. Types
    /// that contain themselves lead back to one of them, and that pair is
    /// taken as unified.
    fn unify_handles(
        &mut self,
        first: TypeHandle,
        second: TypeHandle,
        span: Span,
        in_progress: &mut HashSet<(ReprId, ReprId)>,
    ) -> Result<(), SemanticError> {
        let first = self.cells[first.0];
        let second = self.cells[second.0];
        self.unify_representatives(first, second, span, false, in_progress)
    }

    /// Applies the rule for `first`'s kind. Kinds without a rule for the
    /// pair get one more try from `second`'s side before giving up.
    fn unify_representatives(
        &mut self,
        first: ReprId,
        second: ReprId,
        span: Span,
        swapped: bool,
        in_progress: &mut HashSet<(ReprId, ReprId)>,
    ) -> Result<(), SemanticError> {
        if first == second || (!swapped && !in_progress.insert((first, second))) {
            return Ok(());
        }

        // Cloned so that the arms below can mutate the environment.
        let first_ty = self.representatives[first.0].ty.clone();
        let second_ty = self.representatives[second.0].ty.clone();

        match (first_ty, second_ty) {
            (Type::Variable(_), _) => {
                if self.occurs_check && self.occurs_in(first, second) {
                    return Err(SemanticError::InfiniteType {
                        variable: self.display_repr(first, 0),
                        ty: self.display_repr(second, 0),
                        span,
                    });
                }

                self.replace(first, second);
                Ok(())
            },

            (
                Type::Function {
                    params: first_params,
                    ret: first_ret,
                },
                Type::Function {
                    params: second_params,
                    ret: second_ret,
                },
            ) => {
                if first_params.len() != second_params.len() {
                    return Err(SemanticError::ArityMismatch {
                        expected: first_params.len(),
                        found: second_params.len(),
                        span,
                    });
                }

                for (own, other) in first_params.into_iter().zip(second_params) {
                    self.unify_handles(own, other, span, in_progress)?;
                }

                self.unify_handles(first_ret, second_ret, span, in_progress)
            },

            (Type::Column(first_name), Type::Column(second_name)) => {
                if first_name == second_name {
                    Ok(())
                } else {
                    Err(SemanticError::TypeMismatch {
                        expected: first_name,
                        found: second_name,
                        span,
                    })
                }
            },

            // Report in the order the caller asked for.
            _ if swapped => Err(SemanticError::UnificationError {
                first: self.display_repr(second, 0),
                second: self.display_repr(first, 0),
                span,
            }),

            _ => self.unify_representatives(second, first, span, true, in_progress),
        }
    }

    /// Points every cell of `old` at `new`. `old` is unreachable afterwards.
    fn replace(&mut self, old: ReprId, new: ReprId) {
        let cells = std::mem::take(&mut self.representatives[old.0].cells);

        for &cell in &cells {
            self.cells[cell.0] = new;
        }

        self.representatives[new.0].cells.extend(cells);
    }

    /// Whether `variable` appears anywhere inside `ty`.
    fn occurs_in(&self, variable: ReprId, ty: ReprId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![ty];

        while let Some(repr) = stack.pop() {
            if repr == variable {
                return true;
            }

            if !seen.insert(repr) {
                continue;
            }

            match &self.representatives[repr.0].ty {
                Type::Function { params, ret } => {
                    stack.extend(params.iter().map(|handle| self.cells[handle.0]));
                    stack.push(self.cells[ret.0]);
                },

                Type::Table(columns) => {
                    stack.extend(columns.iter().map(|(_, handle)| self.cells[handle.0]));
                },

                Type::Variable(_) | Type::Boolean | Type::Column(_) => {},
            }
        }

        false
    }

    /// Returns a string, suitable for display, that represents this type.
    pub fn display(&self, handle: TypeHandle) -> String {
        self.display_repr(self.cells[handle.0], 0)
    }

    fn display_repr(&self, repr: ReprId, depth: usize) -> String {
        if depth > MAX_DISPLAY_DEPTH {
            return "...".to_owned();
        }

        let nested = |handle: &TypeHandle| self.display_repr(self.cells[handle.0], depth + 1);

        match &self.representatives[repr.0].ty {
            Type::Variable(id) => format!("{{type variable #{}}}", id),
            Type::Boolean => "bool".to_owned(),
            Type::Column(name) => name.clone(),

            Type::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(nested).collect();
                format!("({}) -> {}", params.join(", "), nested(ret))
            },

            Type::Table(columns) => {
                let columns: Vec<String> = columns
                    .iter()
                    .map(|(name, handle)| format!("{} {}", name, nested(handle)))
                    .collect();

                format!("table({})", columns.join(", "))
            },
        }
    }
}

impl Default for TypeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
