use super::*;
use crate::ast::SyntaxTree;

/// `create table users (id int, name text)`
fn users_table(tree: &mut SyntaxTree) -> NodeId {
    let id = tree.column("id", "int");
    let name = tree.column("name", "text");
    tree.table("users", vec![id, name])
}

fn duplicate(name: &str) -> SemanticError {
    SemanticError::DuplicateVariable {
        name: name.to_owned(),
        span: Default::default(),
    }
}

fn ambiguous(name: &str) -> SemanticError {
    SemanticError::AmbiguousVariable {
        name: name.to_owned(),
        span: Default::default(),
    }
}

#[test]
fn binds_parameters_and_references() {
    let mut tree = SyntaxTree::new();
    let x = tree.param("x");
    let body = tree.variable("x");
    let f = tree.function("f", vec![x], body);
    tree.file(vec![f]);

    let table = resolve(&tree).unwrap();
    let param = table.variable_of(body).unwrap();
    assert_eq!(param.name(), "x");
    assert_eq!(param.definition(), Some(x));
    assert_eq!(param.references(), &[body]);
    assert_eq!(table.scope_kind(param.scope()), ScopeKind::Local);
    assert_eq!(table.parent(param.scope()), Some(table.global()));

    let function = table.get("f").unwrap();
    assert_eq!(function.definition(), Some(f));
    assert!(function.references().is_empty());
    assert!(table.get("x").is_none());
}

#[test]
fn duplicate_function() {
    // f(x) = x; f(y) = y
    let mut tree = SyntaxTree::new();
    let x = tree.param("x");
    let x_ref = tree.variable("x");
    let first = tree.function("f", vec![x], x_ref);
    let y = tree.param("y");
    let y_ref = tree.variable("y");
    let second = tree.function("f", vec![y], y_ref);
    tree.file(vec![first, second]);

    assert_eq!(resolve(&tree).unwrap_err(), duplicate("f"));
}

#[test]
fn duplicate_parameter() {
    // foo(int x, int x) = x
    let mut tree = SyntaxTree::new();
    let first = tree.typed_param("int", "x");
    let second = tree.typed_param("int", "x");
    let body = tree.variable("x");
    let foo = tree.function("foo", vec![first, second], body);
    tree.file(vec![foo]);

    assert_eq!(resolve(&tree).unwrap_err(), duplicate("x"));
}

#[test]
fn table_and_function_share_a_namespace() {
    // create table users (id int, name text); users(x) = x
    let mut tree = SyntaxTree::new();
    let x = tree.param("x");
    let body = tree.variable("x");
    let function = tree.function("users", vec![x], body);
    let table = users_table(&mut tree);
    tree.file(vec![function, table]);

    // Tables are bound first, so the function is the duplicate.
    assert_eq!(resolve(&tree).unwrap_err(), duplicate("users"));
}

#[test]
fn parameter_shadowing_its_function_is_ambiguous() {
    // f(int f) = f
    let mut tree = SyntaxTree::new();
    let param = tree.typed_param("int", "f");
    let body = tree.variable("f");
    let f = tree.function("f", vec![param], body);
    tree.file(vec![f]);

    assert_eq!(resolve(&tree).unwrap_err(), ambiguous("f"));
}

#[test]
fn shadowing_the_grandparent_resolves() {
    // create table t (x int); g(y) = select * from t where x = y; x(z) = z
    // Inside the where clause `x` is a column, and the global `x` is two
    // scopes up.
    let mut tree = SyntaxTree::new();
    let column = tree.column("x", "int");
    let t = tree.table("t", vec![column]);

    let y = tree.param("y");
    let x_ref = tree.variable("x");
    let y_ref = tree.variable("y");
    let predicate = tree.equals(x_ref, y_ref);
    let body = tree.select("t", Some(predicate));
    let g = tree.function("g", vec![y], body);

    let z = tree.param("z");
    let z_ref = tree.variable("z");
    let x = tree.function("x", vec![z], z_ref);
    tree.file(vec![t, x, g]);

    let table = resolve(&tree).unwrap();
    let resolved = table.variable_of(x_ref).unwrap();
    assert_eq!(resolved.definition(), Some(column));
    assert_eq!(table.scope_kind(resolved.scope()), ScopeKind::Record);
    assert_eq!(table.get("x").unwrap().definition(), Some(x));
}

#[test]
fn column_shadowing_a_parameter_is_ambiguous() {
    // create table users (user_id int); user_info(int user_id) =
    //     select * from users where user_id = user_id
    let mut tree = SyntaxTree::new();
    let column = tree.column("user_id", "int");
    let users = tree.table("users", vec![column]);
    let param = tree.typed_param("int", "user_id");
    let lhs = tree.variable("user_id");
    let rhs = tree.variable("user_id");
    let predicate = tree.equals(lhs, rhs);
    let body = tree.select("users", Some(predicate));
    let user_info = tree.function("user_info", vec![param], body);
    tree.file(vec![users, user_info]);

    assert_eq!(resolve(&tree).unwrap_err(), ambiguous("user_id"));
}

#[test]
fn predicate_sees_columns_and_parameters() {
    // user_info(int user_id) = select * from users where id = user_id
    let mut tree = SyntaxTree::new();
    let users = users_table(&mut tree);
    let param = tree.typed_param("int", "user_id");
    let column_ref = tree.variable("id");
    let param_ref = tree.variable("user_id");
    let predicate = tree.equals(column_ref, param_ref);
    let body = tree.select("users", Some(predicate));
    let user_info = tree.function("user_info", vec![param], body);
    tree.file(vec![user_info, users]);

    let table = resolve(&tree).unwrap();
    let column = table.variable_of(column_ref).unwrap();
    assert_eq!(table.scope_kind(column.scope()), ScopeKind::Record);
    assert_eq!(column.references(), &[column_ref]);

    let param_var = table.variable_of(param_ref).unwrap();
    assert_eq!(param_var.definition(), Some(param));
    assert_eq!(table.scope_kind(param_var.scope()), ScopeKind::Local);

    let users_var = table.get("users").unwrap();
    assert_eq!(users_var.definition(), Some(users));
    assert_eq!(users_var.references().len(), 1);
}

#[test]
fn undefined_variables_are_collected() {
    // f(x) = g(y, z)
    let mut tree = SyntaxTree::new();
    let x = tree.param("x");
    let y = tree.variable("y");
    let z = tree.variable("z");
    let body = tree.call("g", vec![y, z]);
    let f = tree.function("f", vec![x], body);
    tree.file(vec![f]);

    match resolve(&tree) {
        Err(SemanticError::UndefinedVariable { names, spans }) => {
            assert_eq!(names, vec!["g", "y", "z"]);
            assert_eq!(spans.len(), 3);
        },

        other => panic!("expected undefined variables, got {:?}", other),
    }
}

#[test]
fn unknown_column_in_predicate_is_undefined() {
    // users_where(x) = select * from users where unknown_column = x
    let mut tree = SyntaxTree::new();
    let users = users_table(&mut tree);
    let x = tree.param("x");
    let unknown = tree.variable("unknown_column");
    let x_ref = tree.variable("x");
    let predicate = tree.equals(unknown, x_ref);
    let body = tree.select("users", Some(predicate));
    let f = tree.function("users_where", vec![x], body);
    tree.file(vec![users, f]);

    let err = resolve(&tree).unwrap_err();
    assert_eq!(err.to_string(), "undefined variable: unknown_column");
}

#[test]
fn selecting_from_a_function() {
    // foo(x) = x; bar(y) = select * from foo
    let mut tree = SyntaxTree::new();
    let x = tree.param("x");
    let x_ref = tree.variable("x");
    let foo = tree.function("foo", vec![x], x_ref);
    let y = tree.param("y");
    let body = tree.select("foo", None);
    let bar = tree.function("bar", vec![y], body);
    tree.file(vec![foo, bar]);

    let err = resolve(&tree).unwrap_err();
    assert_eq!(err.to_string(), "undefined table: foo");
}

#[test]
fn selecting_from_a_later_function() {
    // bar(y) = select * from foo; foo(x) = x
    // The function hasn't been bound yet when the select is.
    let mut tree = SyntaxTree::new();
    let y = tree.param("y");
    let body = tree.select("foo", None);
    let bar = tree.function("bar", vec![y], body);
    let x = tree.param("x");
    let x_ref = tree.variable("x");
    let foo = tree.function("foo", vec![x], x_ref);
    tree.file(vec![bar, foo]);

    let err = resolve(&tree).unwrap_err();
    assert!(matches!(err, SemanticError::UndefinedTable { ref name, .. } if name == "foo"));
}

#[test]
fn duplicate_column() {
    let mut tree = SyntaxTree::new();
    let first = tree.column("id", "int");
    let second = tree.column("id", "text");
    let t = tree.table("t", vec![first, second]);
    tree.file(vec![t]);

    let err = resolve(&tree).unwrap_err();
    assert_eq!(err.to_string(), "duplicate column: id");
}

#[test]
fn projected_columns_must_exist() {
    // names() = select name, email from users
    let mut tree = SyntaxTree::new();
    let users = users_table(&mut tree);
    let body = tree.select_columns(&["name", "email"], "users", None);
    let names = tree.function("names", vec![], body);
    tree.file(vec![users, names]);

    let err = resolve(&tree).unwrap_err();
    assert!(matches!(err, SemanticError::UnknownColumn { ref name, .. } if name == "email"));
}

#[test]
fn mutual_recursion() {
    // one(int x) = two(x); two(int x) = one(x)
    let mut tree = SyntaxTree::new();
    let x1 = tree.typed_param("int", "x");
    let x1_ref = tree.variable("x");
    let call_two = tree.call("two", vec![x1_ref]);
    let one = tree.function("one", vec![x1], call_two);
    let x2 = tree.typed_param("int", "x");
    let x2_ref = tree.variable("x");
    let call_one = tree.call("one", vec![x2_ref]);
    let two = tree.function("two", vec![x2], call_one);
    tree.file(vec![one, two]);

    let table = resolve(&tree).unwrap();
    assert!(table.undefined().is_empty());

    let two_var = table.get("two").unwrap();
    assert_eq!(two_var.definition(), Some(two));
    assert_eq!(two_var.references().len(), 1);
    assert_eq!(table.scope_kind(two_var.scope()), ScopeKind::Global);

    // Each `x` resolves to its own function's parameter.
    assert_eq!(table.variable_of(x1_ref).unwrap().definition(), Some(x1));
    assert_eq!(table.variable_of(x2_ref).unwrap().definition(), Some(x2));
}

#[test]
fn record_scopes_reject_definitions() {
    let mut table = VariableTable::new();
    let mut tree = SyntaxTree::new();
    let column = tree.column("id", "int");
    let param = tree.param("id");

    let record = table.push_record_scope(table.global(), vec![("id".to_owned(), column)]);
    let err = table.define(record, "id", param, Default::default()).unwrap_err();

    assert_eq!(err, SemanticError::RecordScopeDefinition {
        name: "id".to_owned(),
    });
    assert!(err.is_internal());
}

#[test]
fn first_definition_is_kept() {
    let mut table = VariableTable::new();
    let mut tree = SyntaxTree::new();
    let first = tree.param("a");
    let second = tree.param("a");
    let global = table.global();

    table.define(global, "a", first, Default::default()).unwrap();
    assert!(table.define(global, "a", second, Default::default()).is_err());
    assert_eq!(table.get("a").unwrap().definition(), Some(first));
    assert_eq!(table.variable_of(second).map(Variable::name), None);
}
