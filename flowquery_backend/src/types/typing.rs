use std::collections::HashMap;

use super::{TypeEnvironment, TypeHandle};
use crate::{
    ast::NodeId,
    errors::{SemanticError, Span},
};

/// A pending assertion that two types are equal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraint {
    pub first: TypeHandle,
    pub second: TypeHandle,
    /// Where the constraint came from, for diagnostics.
    pub span: Span,
}

/// The type slot of every node, along with the environment the slots
/// point into.
#[derive(Clone, Debug, Default)]
pub struct Typing {
    env: TypeEnvironment,
    node_types: HashMap<NodeId, TypeHandle>,
}

impl Typing {
    pub fn new(env: TypeEnvironment) -> Self {
        Self {
            env,
            node_types: HashMap::new(),
        }
    }

    pub fn env(&self) -> &TypeEnvironment {
        &self.env
    }

    pub(crate) fn env_mut(&mut self) -> &mut TypeEnvironment {
        &mut self.env
    }

    pub fn type_of(&self, node: NodeId) -> Option<TypeHandle> {
        self.node_types.get(&node).copied()
    }

    /// The current type of `node`, rendered for display.
    pub fn display(&self, node: NodeId) -> Option<String> {
        self.type_of(node).map(|handle| self.env.display(handle))
    }

    /// The type slot of `node`, creating a fresh type variable for it if
    /// nothing has been assigned yet.
    pub(crate) fn slot(&mut self, node: NodeId) -> TypeHandle {
        let Self { env, node_types } = self;
        *node_types
            .entry(node)
            .or_insert_with(|| env.add_new_type_variable())
    }

    /// Fills the type slot of `node` with `ty`. A slot that was already
    /// created by an earlier reference is kept, and the returned constraint
    /// ties it to `ty` instead.
    pub(crate) fn assign(&mut self, node: NodeId, ty: TypeHandle, span: Span) -> Option<Constraint> {
        match self.node_types.get(&node) {
            Some(&existing) => Some(Constraint {
                first: existing,
                second: ty,
                span,
            }),

            None => {
                self.node_types.insert(node, ty);
                None
            },
        }
    }

    /// Applies every constraint in order, stopping at the first one that
    /// can't be satisfied.
    pub fn solve(&mut self, constraints: &[Constraint]) -> Result<(), SemanticError> {
        for constraint in constraints {
            self.env
                .unify(constraint.first, constraint.second, constraint.span)?;
        }

        Ok(())
    }
}
