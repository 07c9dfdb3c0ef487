use abs_grammar::nodes::*;

fn parse_file(path: &str) -> CompilationUnit {
    let source =
        std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path}: {e}"));
    abs_grammar::parse_unit(Some(path), &source)
        .unwrap_or_else(|e| panic!("Failed to parse {path}: {e}"))
}

#[test]
fn account_product_line() {
    let unit = parse_file("tests/programs/account.abs");
    let module = &unit.modules[0];
    assert_eq!(module.name, "Account");
    assert_eq!(module.interfaces().count(), 1);
    assert_eq!(module.deltas().count(), 2);
    assert_eq!(module.products().count(), 3);

    let overdraft = module.deltas().find(|d| d.name == "DOverdraft").unwrap();
    assert_eq!(overdraft.after, vec!["DFee"]);
    let features = ["Overdraft".to_string()].into_iter().collect();
    assert!(overdraft.condition.as_ref().unwrap().holds(&features));

    let class = module.classes().next().unwrap();
    assert_eq!(class.params[0].name, "initial");
    assert!(class.init.is_some());
}

#[test]
fn trait_declarations() {
    let unit = parse_file("tests/programs/traits.abs");
    let module = &unit.modules[0];
    let scaled = module.traits().find(|t| t.name == "Scaled").unwrap();
    assert!(matches!(scaled.expr, TraitExpr::Removes(_, _)));
    assert_eq!(scaled.expr.references(), vec!["Squared"]);

    let square = module.classes().next().unwrap();
    assert_eq!(square.trait_uses.len(), 2);
    assert!(square.method("area").is_some());
    assert!(square.method("isSquare").is_none());
}

#[test]
fn statements_and_futures() {
    let unit = parse_file("tests/programs/statements.abs");
    let class = unit.modules[0].classes().next().unwrap();
    let count = class.method("countTo").unwrap();
    assert_eq!(count.body.stmts.len(), 4);
    assert!(matches!(count.body.stmts[2].kind, StmtKind::While { .. }));

    let run = class.run_method().unwrap();
    assert!(matches!(
        &run.body.stmts[2].kind,
        StmtKind::VarDecl { init: Some(Expr { kind: ExprKind::Get(_), .. }), .. }
    ));
}

#[test]
fn locations_point_into_file() {
    let unit = parse_file("tests/programs/traits.abs");
    let square = unit.modules[0].classes().next().unwrap();
    let location = square.location.as_ref().unwrap();
    assert_eq!(location.file.as_deref(), Some("tests/programs/traits.abs"));
    assert_eq!(location.line, 20);
}

#[test]
fn unbalanced_braces_are_rejected() {
    let source = std::fs::read_to_string("tests/programs/missing_brace.abs").unwrap();
    let err = abs_grammar::parse_unit(Some("missing_brace.abs"), &source).unwrap_err();
    let location = err.location.unwrap();
    assert_eq!(location.file.as_deref(), Some("missing_brace.abs"));
    assert!(location.line >= 6);
}

#[test]
fn stdlib_merges_with_user_units() {
    let stdlib = abs_grammar::std_lib::stdlib_unit().unwrap();
    let user = parse_file("tests/programs/account.abs");
    let model = Model::new(vec![stdlib, user]);
    let table = abs_grammar::symbol_table::SymbolTable::new(&model);
    assert!(table.interface(None, "Printer").is_ok());
    assert!(table.interface(None, "Account.Account").is_ok());
}
