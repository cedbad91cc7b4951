//! Runs the front end over one query file: bind, build the dependency graph,
//! then unify. Each stage runs at most once and its result is kept.


use flowquery_log::*;

use crate::{
    ast::{NodeId, SyntaxTree},
    dependency_graph::{self, DependencyGraph},
    errors::SemanticError,
    features::UnstableFeatures,
    name_resolution::{self, VariableTable},
    types::{TypeEnvironment, Typing},
};

/// The state of compiling one [`SyntaxTree`].
#[derive(Debug)]
pub struct Compilation {
    tree: SyntaxTree,
    features: UnstableFeatures,
    trace: bool,
    variables: Option<VariableTable>,
    dependencies: Option<DependencyGraph>,
    /// Types as the graph builder left them, before any unification.
    built_types: Option<Typing>,
    types: Option<Typing>,
}

impl Compilation {
    pub fn new(tree: SyntaxTree) -> Self {
        Self::with_features(tree, UnstableFeatures::default())
    }

    pub fn with_features(tree: SyntaxTree, features: UnstableFeatures) -> Self {
        Self {
            tree,
            features,
            trace: false,
            variables: None,
            dependencies: None,
            built_types: None,
            types: None,
        }
    }

    /// Log the progress of each stage.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Resolves every name in the file.
    pub fn variables(&mut self) -> Result<&VariableTable, SemanticError> {
        self.bind()?;
        self.variables.as_ref().ok_or_else(|| missing("bind"))
    }

    /// Builds the dependency graph, binding names first if needed.
    pub fn dependencies(&mut self) -> Result<&DependencyGraph, SemanticError> {
        self.build()?;
        self.dependencies.as_ref().ok_or_else(|| missing("build"))
    }

    /// The final type of every node, running every stage that hasn't run yet.
    pub fn types(&mut self) -> Result<&Typing, SemanticError> {
        self.unify()?;
        self.types.as_ref().ok_or_else(|| missing("unify"))
    }

    /// Runs the whole pipeline. Calling this again returns the cached
    /// results.
    pub fn compile(&mut self) -> Result<(&VariableTable, &DependencyGraph), SemanticError> {
        self.unify()?;

        match (&self.variables, &self.dependencies) {
            (Some(variables), Some(dependencies)) => Ok((variables, dependencies)),
            _ => Err(missing("compile")),
        }
    }

    /// The rendered final type of `node`, or `None` for nodes that don't
    /// have one, like the file itself.
    pub fn type_of(&mut self, node: NodeId) -> Result<Option<String>, SemanticError> {
        Ok(self.types()?.display(node))
    }

    fn bind(&mut self) -> Result<(), SemanticError> {
        if self.variables.is_some() {
            return Ok(());
        }

        if self.trace {
            trace!("binding {} definitions", self.tree.definitions().len());
        }

        let variables = name_resolution::resolve(&self.tree)?;

        if self.trace {
            trace!("bound {} variables", variables.variables().count());
        }

        self.variables = Some(variables);
        Ok(())
    }

    fn build(&mut self) -> Result<(), SemanticError> {
        self.bind()?;

        if self.dependencies.is_some() {
            return Ok(());
        }

        let variables = self.variables.as_ref().ok_or_else(|| missing("bind"))?;
        let mut env = TypeEnvironment::new();
        env.set_occurs_check(self.features.occurs_check);

        let (graph, typing) = dependency_graph::build(&self.tree, variables, env)?;

        if self.trace {
            trace!(
                "built {} subgraphs with {} vertices, {} edges and {} type constraints",
                graph.subgraphs().len(),
                graph.vertex_count(),
                graph.edge_count(),
                graph.constraints().len()
            );
        }

        self.dependencies = Some(graph);
        self.built_types = Some(typing);
        Ok(())
    }

    fn unify(&mut self) -> Result<(), SemanticError> {
        self.build()?;

        if self.types.is_some() {
            return Ok(());
        }

        let (graph, built) = match (&self.dependencies, &self.built_types) {
            (Some(graph), Some(built)) => (graph, built),
            _ => return Err(missing("build")),
        };

        // Work on a copy so that a failure leaves no half-unified types.
        let mut typing = built.clone();
        typing.solve(graph.constraints())?;

        if self.trace {
            trace!("unified {} type constraints", graph.constraints().len());
        }

        self.types = Some(typing);
        Ok(())
    }
}

fn missing(stage: &str) -> SemanticError {
    SemanticError::InternalGraphError(format!("the {} stage produced no result", stage))
}
