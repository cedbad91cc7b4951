use std::collections::HashMap;

use crate::{
    ast::NodeId,
    errors::{SemanticError, Span},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ScopeId(usize);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VariableId(usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeKind {
    /// The single scope without a parent.
    Global,
    /// A function body.
    Local,
    /// The columns of a table, visible inside a `where` clause.
    /// Record scopes are filled when they're created and can't be
    /// defined into afterwards.
    Record,
}

/// A name and everything known about it.
#[derive(Clone, Debug)]
pub struct Variable {
    name: String,
    scope: ScopeId,
    definition: Option<NodeId>,
    references: Vec<NodeId>,
}

impl Variable {
    fn new(name: &str, scope: ScopeId) -> Self {
        Self {
            name: name.to_owned(),
            scope,
            definition: None,
            references: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The defining node. `None` only for a forward reference that
    /// hasn't been matched with a definition (yet).
    pub fn definition(&self) -> Option<NodeId> {
        self.definition
    }

    pub fn references(&self) -> &[NodeId] {
        &self.references
    }
}

/// One lexical scope, also known as a variable binding.
#[derive(Clone, Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    locals: HashMap<String, VariableId>,
}

/// Every scope and variable of a file, plus the variable each defining or
/// referencing node resolved to.
#[derive(Clone, Debug)]
pub struct VariableTable {
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    node_variables: HashMap<NodeId, VariableId>,
}

impl VariableTable {
    pub(crate) fn new() -> Self {
        let global = Scope {
            parent: None,
            kind: ScopeKind::Global,
            locals: HashMap::new(),
        };

        Self {
            scopes: vec![global],
            variables: Vec::new(),
            node_variables: HashMap::new(),
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope_kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0].kind
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Opens a function scope nested in `parent`.
    pub(crate) fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.add_scope(parent, ScopeKind::Local)
    }

    /// Opens a record scope nested in `parent` holding one already-defined
    /// variable per field.
    pub(crate) fn push_record_scope(
        &mut self,
        parent: ScopeId,
        fields: impl IntoIterator<Item = (String, NodeId)>,
    ) -> ScopeId {
        let scope = self.add_scope(parent, ScopeKind::Record);

        for (name, node) in fields {
            let mut variable = Variable::new(&name, scope);
            variable.definition = Some(node);
            let id = self.add_variable(variable);
            self.scopes[scope.0].locals.insert(name, id);
        }

        scope
    }

    fn add_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            locals: HashMap::new(),
        });

        ScopeId(self.scopes.len() - 1)
    }

    fn add_variable(&mut self, variable: Variable) -> VariableId {
        self.variables.push(variable);
        VariableId(self.variables.len() - 1)
    }

    /// Binds `name` to its defining `node` in `scope`.
    /// A name can be defined only once per scope; a second definition
    /// fails and leaves the first in place.
    pub(crate) fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        node: NodeId,
        span: Span,
    ) -> Result<VariableId, SemanticError> {
        if self.scope_kind(scope) == ScopeKind::Record {
            return Err(SemanticError::RecordScopeDefinition {
                name: name.to_owned(),
            });
        }

        let id = match self.scopes[scope.0].locals.get(name) {
            Some(&id) => id,

            None => {
                let id = self.add_variable(Variable::new(name, scope));
                self.scopes[scope.0].locals.insert(name.to_owned(), id);
                id
            },
        };

        let variable = &mut self.variables[id.0];

        if variable.definition.is_some() {
            return Err(SemanticError::DuplicateVariable {
                name: name.to_owned(),
                span,
            });
        }

        variable.definition = Some(node);
        self.node_variables.insert(node, id);
        Ok(id)
    }

    /// Resolves a use of `name` in `scope` and records `node` as one of its
    /// references. Names that can't be found yet become forward references
    /// in the global scope, to be filled in by a later definition.
    pub(crate) fn reference(
        &mut self,
        scope: ScopeId,
        name: &str,
        node: NodeId,
        span: Span,
    ) -> Result<VariableId, SemanticError> {
        let id = match self.lookup(scope, name, span)? {
            Some(id) => id,

            None => {
                let global = self.global();
                let id = self.add_variable(Variable::new(name, global));
                self.scopes[global.0].locals.insert(name.to_owned(), id);
                id
            },
        };

        self.variables[id.0].references.push(node);
        self.node_variables.insert(node, id);
        Ok(id)
    }

    /// Searches `scope` and then its ancestors for `name`.
    /// A name found in a scope must not also be bound by that scope's
    /// immediate parent. Scopes further apart may reuse names.
    fn lookup(
        &self,
        scope: ScopeId,
        name: &str,
        span: Span,
    ) -> Result<Option<VariableId>, SemanticError> {
        let mut current = Some(scope);

        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.0];

            if let Some(&id) = scope.locals.get(name) {
                let in_parent = scope
                    .parent
                    .map_or(false, |parent| self.scopes[parent.0].locals.contains_key(name));

                if in_parent {
                    return Err(SemanticError::AmbiguousVariable {
                        name: name.to_owned(),
                        span,
                    });
                }

                return Ok(Some(id));
            }

            current = scope.parent;
        }

        Ok(None)
    }

    /// Every variable that was referenced but never defined, in the order
    /// they were first seen.
    pub fn undefined(&self) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|variable| variable.definition.is_none())
            .collect()
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Looks up a top-level definition by name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.scopes[self.global().0]
            .locals
            .get(name)
            .map(|&id| self.variable(id))
    }

    /// The variable a defining or referencing node was bound to.
    pub fn variable_of(&self, node: NodeId) -> Option<&Variable> {
        self.node_variables.get(&node).map(|&id| self.variable(id))
    }
}
