use super::{DependencyGraph, DependencyId};
use crate::{
    ast::{NodeId, NodeKind, SyntaxTree},
    errors::SemanticError,
    name_resolution::{ScopeKind, Variable, VariableTable},
    types::{TypeEnvironment, TypeHandle, Typing},
};

struct GraphBuilder<'a> {
    tree: &'a SyntaxTree,
    variables: &'a VariableTable,
    graph: DependencyGraph,
    typing: Typing,
}

impl<'a> GraphBuilder<'a> {
    fn new(tree: &'a SyntaxTree, variables: &'a VariableTable, env: TypeEnvironment) -> Self {
        Self {
            tree,
            variables,
            graph: DependencyGraph::new(),
            typing: Typing::new(env),
        }
    }

    fn build(mut self) -> Result<(DependencyGraph, Typing), SemanticError> {
        if let Some(root) = self.tree.root() {
            self.visit(root)?;
        }

        Ok((self.graph, self.typing))
    }

    fn visit(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let tree = self.tree;

        match tree.kind(node) {
            NodeKind::File { .. } => {
                for definition in tree.ordered_definitions() {
                    self.graph.next_subgraph(tree.signature(definition));
                    self.visit(definition)?;
                }
            },

            NodeKind::TableDef { columns, .. } => {
                let mut column_types = Vec::with_capacity(columns.len());

                for &column in columns {
                    self.visit(column)?;

                    if let Some(name) = tree.declared_name(column) {
                        let ty = self.alias_of(column);
                        column_types.push((name.to_owned(), ty));
                    }
                }

                let ty = self.env().table(column_types);
                self.set_type(node, ty);
            },

            NodeKind::ColumnDecl { name, ty } => {
                self.graph
                    .add_vertex(node, Some(format!("{} {}", name, ty)), None)?;

                let ty = self.env().column(ty);
                self.set_type(node, ty);
            },

            NodeKind::FunctionDef { name, params, body } => {
                for &param in params {
                    self.visit(param)?;
                }

                self.visit(*body)?;
                self.graph.add_vertex(node, Some(name.clone()), None)?;
                self.graph.add_edge(*body, node, None)?;

                let param_types = params.iter().map(|&param| self.alias_of(param)).collect();
                let ret = self.alias_of(*body);
                let ty = self.env().function(param_types, ret);
                self.set_type(node, ty);
            },

            NodeKind::ParamDecl { name, ty } => {
                self.graph.add_vertex(node, Some(name.clone()), None)?;
                let slot = self.typing.slot(node);

                if let Some(annotation) = ty {
                    let annotation = self.env().column(annotation);
                    self.graph
                        .add_constraint(Some(slot), Some(annotation), tree.span(node))?;
                }
            },

            NodeKind::Paren(inner) => {
                self.visit(*inner)?;
                self.graph.alias(node, *inner)?;

                let ty = self.alias_of(*inner);
                self.set_type(node, ty);
            },

            NodeKind::Application {
                head,
                argument_lists,
            } => self.visit_application(node, *head, argument_lists)?,

            NodeKind::VariableRef(name) => {
                let variable = self.variable_of(node)?;
                let definition = variable.definition().ok_or_else(|| {
                    SemanticError::InternalGraphError(format!("unresolved variable {}", name))
                })?;

                match self.variables.scope_kind(variable.scope()) {
                    // Kept local to each subgraph so that recursion doesn't
                    // close a cycle.
                    ScopeKind::Global => {
                        self.graph.add_vertex(node, Some(name.clone()), None)?;
                    },

                    ScopeKind::Record => {
                        self.graph.add_vertex(node, Some(name.clone()), None)?;
                        self.graph.add_edge(definition, node, None)?;
                    },

                    ScopeKind::Local => {
                        let id = self.graph.dependency_id(definition).ok_or_else(|| {
                            SemanticError::InternalGraphError(format!("untracked variable {}", name))
                        })?;

                        self.graph.set_dependency_id(node, id);
                    },
                }

                // A definition that hasn't been visited yet gets its slot
                // here, and is constrained against it once it is.
                let ty = self.alias_of(definition);
                self.set_type(node, ty);
            },

            NodeKind::Equals(lhs, rhs) => {
                self.visit(*lhs)?;
                self.visit(*rhs)?;

                let label = tree.display(node).to_string();
                self.graph.add_vertex(node, Some(label), None)?;
                self.graph.add_edge(*lhs, node, None)?;
                self.graph.add_edge(*rhs, node, None)?;

                let (lhs_ty, rhs_ty) = (self.typing.type_of(*lhs), self.typing.type_of(*rhs));
                self.graph.add_constraint(lhs_ty, rhs_ty, tree.span(node))?;

                let ty = self.env().boolean();
                self.set_type(node, ty);
            },

            NodeKind::Select {
                columns,
                source,
                predicate,
            } => {
                self.visit(*source)?;

                match predicate {
                    Some(predicate) => {
                        self.visit(*predicate)?;

                        let params = vec!["source".to_owned(), "predicate".to_owned()];
                        self.graph
                            .add_vertex(node, Some("filter".to_owned()), Some(params))?;
                        self.graph.add_edge(*source, node, Some(0))?;
                        self.graph.add_edge(*predicate, node, Some(1))?;

                        let predicate_ty = self.typing.type_of(*predicate);
                        let boolean = self.env().boolean();
                        self.graph
                            .add_constraint(predicate_ty, Some(boolean), tree.span(*predicate))?;
                    },

                    None => {
                        self.graph.alias(node, *source)?;
                    },
                }

                let ty = match columns {
                    Some(projected) => self.projection(*source, projected)?,
                    None => self.alias_of(*source),
                };

                self.set_type(node, ty);
            },
        }

        Ok(())
    }

    /// Gives each argument list of `head(...)(...)` its own vertex, chained
    /// from the head through every intermediate result.
    fn visit_application(
        &mut self,
        node: NodeId,
        head: NodeId,
        argument_lists: &[Vec<NodeId>],
    ) -> Result<(), SemanticError> {
        let tree = self.tree;
        let span = tree.span(node);

        self.visit(head)?;

        let mut previous = self.graph.require_id(head)?;
        let mut callee_ty = self.typing.type_of(head);
        let mut callee_text = tree.display(head).to_string();
        let known_function = self.called_function(head);

        for (link, arguments) in argument_lists.iter().enumerate() {
            for &argument in arguments {
                self.visit(argument)?;
            }

            let (label, params) = match known_function {
                Some(function) if link == 0 => (
                    tree.declared_name(function).map(str::to_owned),
                    tree.param_names(function),
                ),

                _ => {
                    let params = (0..arguments.len())
                        .map(|index| format!("arg{}", index))
                        .collect();

                    (Some(callee_text.clone()), Some(params))
                },
            };

            let is_last = link + 1 == argument_lists.len();
            let id: DependencyId = if is_last {
                self.graph.add_vertex(node, label, params)?
            } else {
                self.graph.add_anonymous_vertex(node, label, params)?
            };

            self.graph.add_edge_between(previous, id, None)?;

            for (index, &argument) in arguments.iter().enumerate() {
                let argument_id = self.graph.require_id(argument)?;
                self.graph.add_edge_between(argument_id, id, Some(index))?;
            }

            let argument_types = arguments
                .iter()
                .map(|&argument| self.typing.type_of(argument))
                .collect::<Option<Vec<TypeHandle>>>();

            let result = self.env().add_new_type_variable();
            let expected = argument_types.map(|types| self.env().function(types, result));
            self.graph.add_constraint(callee_ty, expected, span)?;

            let argument_text: Vec<String> = arguments
                .iter()
                .map(|&argument| tree.display(argument).to_string())
                .collect();

            callee_text = format!("{}({})", callee_text, argument_text.join(", "));
            callee_ty = Some(result);
            previous = id;
        }

        if let Some(result) = callee_ty {
            self.set_type(node, result);
        }

        Ok(())
    }

    /// The function definition `head` names, if it names one directly.
    fn called_function(&self, head: NodeId) -> Option<NodeId> {
        let definition = self.variables.variable_of(head)?.definition()?;

        match self.tree.kind(definition) {
            NodeKind::FunctionDef { .. } => Some(definition),
            _ => None,
        }
    }

    /// A new table type holding just the `projected` columns of the table
    /// `source` refers to.
    /// Binding has already checked that the source is a table with every
    /// projected column.
    fn projection(&mut self, source: NodeId, projected: &[String]) -> Result<TypeHandle, SemanticError> {
        let table = self
            .variable_of(source)?
            .definition()
            .ok_or_else(|| SemanticError::InternalGraphError("select from an unresolved table".to_owned()))?;

        let columns = match self.tree.kind(table) {
            NodeKind::TableDef { columns, .. } => columns,

            _ => {
                return Err(SemanticError::InternalGraphError(format!(
                    "select from {}, which is not a table",
                    self.tree.display(source)
                )))
            },
        };

        let mut column_types = Vec::with_capacity(projected.len());

        for name in projected {
            let column = columns
                .iter()
                .copied()
                .find(|&column| self.tree.declared_name(column) == Some(name.as_str()))
                .ok_or_else(|| {
                    SemanticError::InternalGraphError(format!("select of the unbound column {}", name))
                })?;

            let ty = self.alias_of(column);
            column_types.push((name.clone(), ty));
        }

        Ok(self.env().table(column_types))
    }

    fn variable_of(&self, node: NodeId) -> Result<&'a Variable, SemanticError> {
        self.variables.variable_of(node).ok_or_else(|| {
            SemanticError::InternalGraphError(format!("node {} was never bound", node))
        })
    }

    fn env(&mut self) -> &mut TypeEnvironment {
        self.typing.env_mut()
    }

    /// A new handle sharing the type of `node`.
    fn alias_of(&mut self, node: NodeId) -> TypeHandle {
        let slot = self.typing.slot(node);
        self.env().alias(slot)
    }

    fn set_type(&mut self, node: NodeId, ty: TypeHandle) {
        if let Some(constraint) = self.typing.assign(node, ty, self.tree.span(node)) {
            self.graph.push_constraint(constraint);
        }
    }
}

/// Walks every definition of `tree` in binding order, producing its data-flow
/// graph along with a type slot for every visited node.
/// `variables` must be the result of resolving the same tree.
pub fn build(
    tree: &SyntaxTree,
    variables: &VariableTable,
    env: TypeEnvironment,
) -> Result<(DependencyGraph, Typing), SemanticError> {
    GraphBuilder::new(tree, variables, env).build()
}
