//! Binds every defining occurrence of a name and resolves every reference
//! to one.

mod scopes;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

pub use self::scopes::{ScopeId, ScopeKind, Variable, VariableId, VariableTable};
use crate::{
    ast::{NodeId, NodeKind, SyntaxTree},
    errors::SemanticError,
};

struct Resolver<'tree> {
    tree: &'tree SyntaxTree,
    table: VariableTable,
}

impl<'tree> Resolver<'tree> {
    fn new(tree: &'tree SyntaxTree) -> Self {
        Self {
            tree,
            table: VariableTable::new(),
        }
    }

    fn resolve(mut self) -> Result<VariableTable, SemanticError> {
        if let Some(root) = self.tree.root() {
            let global = self.table.global();
            self.bind(root, global)?;
        }

        let undefined = self.table.undefined();

        if !undefined.is_empty() {
            let names = undefined
                .iter()
                .map(|variable| variable.name().to_owned())
                .collect();

            let spans = undefined
                .iter()
                .map(|variable| {
                    variable
                        .references()
                        .first()
                        .map(|&node| self.tree.span(node))
                        .unwrap_or_default()
                })
                .collect();

            return Err(SemanticError::UndefinedVariable { names, spans });
        }

        Ok(self.table)
    }

    fn bind(&mut self, node: NodeId, scope: ScopeId) -> Result<(), SemanticError> {
        let tree = self.tree;
        let span = tree.span(node);

        match tree.kind(node) {
            // Tables go first, so a select never sees a table that's defined
            // further down the file as undefined.
            NodeKind::File { .. } => {
                for definition in tree.ordered_definitions() {
                    self.bind(definition, scope)?;
                }
            },

            NodeKind::TableDef { name, columns } => {
                self.table.define(scope, name, node, span)?;
                let mut seen = HashSet::new();

                for &column in columns {
                    if let NodeKind::ColumnDecl { name, .. } = tree.kind(column) {
                        if !seen.insert(name.as_str()) {
                            return Err(SemanticError::DuplicateColumn {
                                name: name.clone(),
                                span: tree.span(column),
                            });
                        }
                    }
                }
            },

            // Columns are only ever bound through the record scope of a
            // `where` clause.
            NodeKind::ColumnDecl { .. } => {},

            NodeKind::FunctionDef { name, params, body } => {
                self.table.define(scope, name, node, span)?;
                let inner = self.table.push_scope(scope);

                for &param in params {
                    self.bind(param, inner)?;
                }

                self.bind(*body, inner)?;
            },

            NodeKind::ParamDecl { name, .. } => {
                self.table.define(scope, name, node, span)?;
            },

            NodeKind::Paren(inner) => self.bind(*inner, scope)?,

            NodeKind::Application {
                head,
                argument_lists,
            } => {
                self.bind(*head, scope)?;

                for &argument in argument_lists.iter().flatten() {
                    self.bind(argument, scope)?;
                }
            },

            NodeKind::VariableRef(name) => {
                self.table.reference(scope, name, node, span)?;
            },

            NodeKind::Equals(lhs, rhs) => {
                self.bind(*lhs, scope)?;
                self.bind(*rhs, scope)?;
            },

            NodeKind::Select {
                columns,
                source,
                predicate,
            } => {
                self.bind(*source, scope)?;
                let table = self.table_for(*source)?;
                let table_columns = self.columns_of(table);

                if let Some(projected) = columns {
                    for column in projected {
                        if !table_columns.iter().any(|(name, _)| name == column) {
                            return Err(SemanticError::UnknownColumn {
                                name: column.clone(),
                                span,
                            });
                        }
                    }
                }

                if let Some(predicate) = predicate {
                    let record = self.table.push_record_scope(scope, table_columns);
                    self.bind(*predicate, record)?;
                }
            },
        }

        Ok(())
    }

    /// The table definition a select's source resolved to.
    fn table_for(&self, source: NodeId) -> Result<NodeId, SemanticError> {
        let definition = self
            .table
            .variable_of(source)
            .and_then(Variable::definition);

        match definition {
            Some(definition) if self.tree.is_table(definition) => Ok(definition),

            _ => Err(SemanticError::UndefinedTable {
                name: self.tree.display(source).to_string(),
                span: self.tree.span(source),
            }),
        }
    }

    fn columns_of(&self, table: NodeId) -> Vec<(String, NodeId)> {
        match self.tree.kind(table) {
            NodeKind::TableDef { columns, .. } => columns
                .iter()
                .filter_map(|&column| {
                    self.tree
                        .declared_name(column)
                        .map(|name| (name.to_owned(), column))
                })
                .collect(),

            _ => Vec::new(),
        }
    }
}

/// Builds the variable table for a file. Fails on the first duplicate or
/// ambiguous name, or with every undefined name at once.
pub fn resolve(tree: &SyntaxTree) -> Result<VariableTable, SemanticError> {
    Resolver::new(tree).resolve()
}
