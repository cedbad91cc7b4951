//! The syntax tree handed to the front end by the parser.
//!
//! Nodes live in an arena owned by [`SyntaxTree`] and refer to their
//! children by [`NodeId`]. The tree is purely structural: resolved
//! variables, dependency ids and types are kept in side tables by the
//! stages that compute them.

use std::fmt;

use crate::errors::Span;

/// Identifies a node within one [`SyntaxTree`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A whole query file, `def; def; ...`.
    File { definitions: Vec<NodeId> },

    /// `create table name (column type, ...)`.
    /// Every entry of `columns` is a [`ColumnDecl`](NodeKind::ColumnDecl).
    TableDef { name: String, columns: Vec<NodeId> },

    /// `name type`, inside a table definition.
    ColumnDecl { name: String, ty: String },

    /// `name(param, ...) = body`.
    /// Every entry of `params` is a [`ParamDecl`](NodeKind::ParamDecl).
    FunctionDef {
        name: String,
        params: Vec<NodeId>,
        body: NodeId,
    },

    /// A function parameter, optionally annotated with a primitive type
    /// (`int x`).
    ParamDecl { name: String, ty: Option<String> },

    /// `(expression)`.
    Paren(NodeId),

    /// `head(args)(args)...`. Always has at least one argument list.
    Application {
        head: NodeId,
        argument_lists: Vec<Vec<NodeId>>,
    },

    /// A bare name used as a value.
    VariableRef(String),

    /// `lhs = rhs` inside an expression.
    Equals(NodeId, NodeId),

    /// `select columns from source [where predicate]`.
    /// `columns` is `None` for `select *`.
    Select {
        columns: Option<Vec<String>>,
        source: NodeId,
        predicate: Option<NodeId>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Arena holding every node of one query file.
#[derive(Clone, Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to the arena. Children must already have been added.
    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });

        if let NodeKind::File { .. } = self.nodes[id.index()].kind {
            self.root = Some(id);
        }

        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The most recently added file node.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The top-level definitions in source order.
    pub fn definitions(&self) -> &[NodeId] {
        match self.root.map(|root| self.kind(root)) {
            Some(NodeKind::File { definitions }) => definitions,
            _ => &[],
        }
    }

    /// The top-level definitions with every table ahead of every function.
    /// Both stages walk the file in this order so that a select can always
    /// see the columns of its table.
    pub fn ordered_definitions(&self) -> Vec<NodeId> {
        let (mut tables, functions): (Vec<NodeId>, Vec<NodeId>) = self
            .definitions()
            .iter()
            .copied()
            .partition(|&id| matches!(self.kind(id), NodeKind::TableDef { .. }));

        tables.extend(functions);
        tables
    }

    pub fn is_table(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::TableDef { .. })
    }

    /// The declared name of a definition, parameter or column.
    pub fn declared_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::TableDef { name, .. }
            | NodeKind::ColumnDecl { name, .. }
            | NodeKind::FunctionDef { name, .. }
            | NodeKind::ParamDecl { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// The parameter names of a function definition.
    pub fn param_names(&self, id: NodeId) -> Option<Vec<String>> {
        match self.kind(id) {
            NodeKind::FunctionDef { params, .. } => Some(
                params
                    .iter()
                    .filter_map(|&param| self.declared_name(param))
                    .map(str::to_owned)
                    .collect(),
            ),

            _ => None,
        }
    }

    /// Label of the subgraph for a table or function definition:
    /// `name(param, ...)` or `name(column, ...)`.
    pub fn signature(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::FunctionDef { name, params, .. } => {
                format!("{}({})", name, self.join(params, ", "))
            },

            NodeKind::TableDef { name, columns } => {
                let column_names: Vec<&str> = columns
                    .iter()
                    .filter_map(|&column| self.declared_name(column))
                    .collect();

                format!("{}({})", name, column_names.join(", "))
            },

            _ => self.display(id).to_string(),
        }
    }

    /// Returns a [`Display`](fmt::Display)able view of a node that prints it
    /// back as query text.
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { tree: self, id }
    }

    fn join(&self, ids: &[NodeId], separator: &str) -> String {
        ids.iter()
            .map(|&id| self.display(id).to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Convenience constructors, one per node kind. Leaves are added without a
/// source position, and expressions cover the spans of their operands.
/// Parsers that track positions use [`SyntaxTree::add`] for the leaves.
impl SyntaxTree {
    pub fn file(&mut self, definitions: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::File { definitions }, Span::empty())
    }

    pub fn table(&mut self, name: &str, columns: Vec<NodeId>) -> NodeId {
        let name = name.to_owned();
        self.add(NodeKind::TableDef { name, columns }, Span::empty())
    }

    pub fn column(&mut self, name: &str, ty: &str) -> NodeId {
        let kind = NodeKind::ColumnDecl {
            name: name.to_owned(),
            ty: ty.to_owned(),
        };

        self.add(kind, Span::empty())
    }

    pub fn function(&mut self, name: &str, params: Vec<NodeId>, body: NodeId) -> NodeId {
        let name = name.to_owned();
        self.add(NodeKind::FunctionDef { name, params, body }, Span::empty())
    }

    pub fn param(&mut self, name: &str) -> NodeId {
        let name = name.to_owned();
        self.add(NodeKind::ParamDecl { name, ty: None }, Span::empty())
    }

    /// A parameter with a type annotation, `ty name`.
    pub fn typed_param(&mut self, ty: &str, name: &str) -> NodeId {
        let kind = NodeKind::ParamDecl {
            name: name.to_owned(),
            ty: Some(ty.to_owned()),
        };

        self.add(kind, Span::empty())
    }

    pub fn paren(&mut self, inner: NodeId) -> NodeId {
        self.add(NodeKind::Paren(inner), Span::empty())
    }

    pub fn apply(&mut self, head: NodeId, argument_lists: Vec<Vec<NodeId>>) -> NodeId {
        debug_assert!(!argument_lists.is_empty());
        let span = argument_lists
            .iter()
            .flatten()
            .fold(self.span(head), |span, &argument| span.to(self.span(argument)));

        self.add(NodeKind::Application { head, argument_lists }, span)
    }

    /// `name(args)`, the common single-list application of a named function.
    pub fn call(&mut self, name: &str, arguments: Vec<NodeId>) -> NodeId {
        let head = self.variable(name);
        self.apply(head, vec![arguments])
    }

    pub fn variable(&mut self, name: &str) -> NodeId {
        self.add(NodeKind::VariableRef(name.to_owned()), Span::empty())
    }

    pub fn equals(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        let span = self.span(lhs).to(self.span(rhs));
        self.add(NodeKind::Equals(lhs, rhs), span)
    }

    /// `select * from table [where predicate]`.
    pub fn select(&mut self, table: &str, predicate: Option<NodeId>) -> NodeId {
        let source = self.variable(table);
        let kind = NodeKind::Select {
            columns: None,
            source,
            predicate,
        };

        self.add(kind, Span::empty())
    }

    /// `select column, ... from table [where predicate]`.
    pub fn select_columns(
        &mut self,
        columns: &[&str],
        table: &str,
        predicate: Option<NodeId>,
    ) -> NodeId {
        let source = self.variable(table);
        let kind = NodeKind::Select {
            columns: Some(columns.iter().map(|&column| column.to_owned()).collect()),
            source,
            predicate,
        };

        self.add(kind, Span::empty())
    }
}

pub struct NodeDisplay<'tree> {
    tree: &'tree SyntaxTree,
    id: NodeId,
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree;

        match tree.kind(self.id) {
            NodeKind::File { definitions } => write!(f, "{}", tree.join(definitions, "; ")),

            NodeKind::TableDef { name, columns } => {
                write!(f, "create table {} ({})", name, tree.join(columns, ", "))
            },

            NodeKind::ColumnDecl { name, ty } => write!(f, "{} {}", name, ty),

            NodeKind::FunctionDef { body, .. } => {
                write!(f, "{} = {}", tree.signature(self.id), tree.display(*body))
            },

            NodeKind::ParamDecl { name, ty: Some(ty) } => write!(f, "{} {}", ty, name),
            NodeKind::ParamDecl { name, ty: None } => write!(f, "{}", name),
            NodeKind::Paren(inner) => write!(f, "({})", tree.display(*inner)),

            NodeKind::Application {
                head,
                argument_lists,
            } => {
                write!(f, "{}", tree.display(*head))?;

                for arguments in argument_lists {
                    write!(f, "({})", tree.join(arguments, ", "))?;
                }

                Ok(())
            },

            NodeKind::VariableRef(name) => write!(f, "{}", name),
            NodeKind::Equals(lhs, rhs) => write!(f, "{} = {}", tree.display(*lhs), tree.display(*rhs)),

            NodeKind::Select {
                columns,
                source,
                predicate,
            } => {
                match columns {
                    Some(columns) => write!(f, "select {}", columns.join(", "))?,
                    None => write!(f, "select *")?,
                }

                write!(f, " from {}", tree.display(*source))?;

                match predicate {
                    Some(predicate) => write!(f, " where {}", tree.display(*predicate)),
                    None => Ok(()),
                }
            },
        }
    }
}
