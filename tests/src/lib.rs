#[cfg(test)]
mod tests {
    use abs::abs_grammar::diagnostics::{Diagnostic, DiagnosticKind};
    use abs::abs_grammar::nodes::{ClassDecl, Expr, Model};
    use abs::abs_grammar::parse_unit;
    use abs::abs_impl::eval::{Interpreter, Value};
    use abs::abs_impl::extension::{AnnotationValue, ExtensionContext, NodeRef};
    use abs::abs_impl::location_types::{LocationTypeOptions, EXTENSION_NAME};
    use abs::abs_impl::types::Type;
    use abs::{compile, compile_with, flatten, CompilerOptions, ExtensionRegistry, ProductConfig};
    use abs::{SourceFile, TypeSystemExtension};
    use std::cell::RefCell;
    use std::rc::Rc;

    const SCENARIO: &str = include_str!("../programs/scenario.abs");
    const BANK: &str = include_str!("../programs/bank.abs");

    fn model(source: &str) -> Model {
        Model::new(vec![parse_unit(None, source).unwrap()])
    }

    fn options(product: &str) -> CompilerOptions {
        CompilerOptions {
            product: Some(product.to_string()),
            ..CompilerOptions::default()
        }
    }

    fn run(model: &Model, class: &str, method: &str, args: Vec<Value>) -> Value {
        let mut interp = Interpreter::new(model);
        let object = interp.instantiate(class, vec![]).unwrap();
        interp.call(object, method, args).unwrap()
    }

    #[test]
    fn composed_trait_negates_base() {
        let c = compile(&[SourceFile::new("scenario.abs", SCENARIO)], &options("Plain")).unwrap();
        assert!(c.succeeded(), "{:?}", c.diagnostics);
        let model = c.model.unwrap();
        assert_eq!(run(&model, "C", "f", vec![]), Value::Bool(true));
    }

    #[test]
    fn removing_a_composed_method_breaks_the_interface_once() {
        let c = compile(&[SourceFile::new("scenario.abs", SCENARIO)], &options("WithoutF")).unwrap();
        assert_eq!(c.diagnostics.error_count(), 1, "{:?}", c.diagnostics);
        assert_eq!(c.diagnostics.count_of(DiagnosticKind::MissingInterfaceMethod), 1);
        let model = c.model.unwrap();
        let class = model.classes().find(|c| c.name == "C").unwrap();
        assert!(class.method("f").is_none());
    }

    #[test]
    fn remove_then_readd_restores_the_interface() {
        let c = compile(&[SourceFile::new("scenario.abs", SCENARIO)], &options("Full")).unwrap();
        assert!(c.succeeded(), "{:?}", c.diagnostics);
        assert_eq!(c.product.unwrap().deltas, vec!["DRemoveF", "DReAddF"]);
        let model = c.model.unwrap();
        let f = model.classes().find(|c| c.name == "C").unwrap().method("f").unwrap();
        assert_eq!(f.modification_depth(), 0);
        assert_eq!(run(&model, "C", "f", vec![]), Value::Bool(true));
    }

    #[test]
    fn double_negation_cancels() {
        let flat = flatten(&model(SCENARIO), &ProductConfig::empty()).unwrap();
        assert!(flat.diagnostics.is_empty(), "{:?}", flat.diagnostics);
        let f = flat.model.classes().find(|c| c.name == "D").unwrap().method("f").unwrap();
        assert_eq!(f.modification_depth(), 2);
        assert_eq!(run(&flat.model, "D", "f", vec![]), Value::Bool(false));
    }

    #[test]
    fn products_chain_modifications() {
        let source = [SourceFile::new("bank.abs", BANK)];
        for (product, expected) in [("Basic", 220), ("Charged", 218), ("Promotional", 228)] {
            let c = compile(&source, &options(product)).unwrap();
            assert!(c.succeeded(), "{}: {:?}", product, c.diagnostics);
            let model = c.model.unwrap();
            assert_eq!(
                run(&model, "Teller", "open", vec![Value::Int(100)]),
                Value::Int(expected),
                "{}",
                product
            );
        }
    }

    #[test]
    fn flatten_is_deterministic_and_idempotent() {
        let m = model(BANK);
        let config = ProductConfig::new(Some("Promotional".into()), vec!["DFee".into(), "DBonus".into()]);
        let first = flatten(&m, &config).unwrap();
        let second = flatten(&m, &config).unwrap();
        assert_eq!(first, second);

        let plain = flatten(&m, &ProductConfig::empty()).unwrap();
        assert_eq!(plain.model, m);
        let composed = flatten(&model(SCENARIO), &ProductConfig::empty()).unwrap();
        let recomposed = flatten(&composed.model, &ProductConfig::empty()).unwrap();
        assert_eq!(recomposed.model, composed.model);
    }

    #[test]
    fn concurrent_flattening_shares_the_base_tree() {
        let m = model(BANK);
        let configs = [
            ProductConfig::empty(),
            ProductConfig::new(None, vec!["DFee".into()]),
            ProductConfig::new(None, vec!["DFee".into(), "DBonus".into()]),
        ];
        let depths: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = configs
                .iter()
                .map(|config| {
                    let m = &m;
                    s.spawn(move || {
                        let flat = flatten(m, config).unwrap();
                        let class = flat.model.classes().find(|c| c.name == "AccountImpl").unwrap();
                        class.method("deposit").unwrap().modification_depth()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(depths, vec![0, 1, 2]);
        assert_eq!(m, model(BANK));
    }

    /// Annotates every expression and records whatever it can see of other
    /// extensions' annotations on the same node.
    struct Tagger {
        name: &'static str,
        value: AnnotationValue,
        seen: Rc<RefCell<Vec<AnnotationValue>>>,
    }

    impl TypeSystemExtension for Tagger {
        fn name(&self) -> &str {
            self.name
        }

        fn check_expression(&mut self, cx: &mut ExtensionContext<'_>, _expr: &Expr, _ty: &Type, node: &NodeRef) {
            if let Some(v) = cx.annotation(node) {
                self.seen.borrow_mut().push(v.clone());
            }
            cx.annotate(node.clone(), self.value.clone());
        }
    }

    #[test]
    fn extensions_only_see_their_own_annotations() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ExtensionRegistry::new();
        registry
            .register(Box::new(Tagger {
                name: "first",
                value: AnnotationValue::Int(1),
                seen: Rc::clone(&seen),
            }))
            .unwrap();
        registry
            .register(Box::new(Tagger {
                name: "second",
                value: AnnotationValue::Flag(true),
                seen: Rc::clone(&seen),
            }))
            .unwrap();

        let opts = CompilerOptions {
            stdlib: false,
            ..options("Basic")
        };
        let c = compile_with(&[SourceFile::new("bank.abs", BANK)], &opts, registry).unwrap();
        assert!(c.succeeded(), "{:?}", c.diagnostics);
        assert!(seen.borrow().is_empty(), "{:?}", seen.borrow());

        let first: Vec<_> = c.annotations.for_extension("first").collect();
        let second: Vec<_> = c.annotations.for_extension("second").collect();
        assert!(!first.is_empty());
        assert_eq!(first.len(), second.len());
        for (node, value) in first {
            assert_eq!(value, &AnnotationValue::Int(1));
            assert_eq!(c.annotations.get("second", node), Some(&AnnotationValue::Flag(true)));
        }
    }

    /// Traces every class and reports one informational finding at the end.
    struct Logger;

    impl TypeSystemExtension for Logger {
        fn name(&self) -> &str {
            "logger"
        }

        fn before_class(&mut self, cx: &mut ExtensionContext<'_>, class: &ClassDecl) {
            tracing::debug!(class = %class.name, module = ?cx.module(), "visiting class");
        }

        fn finish(&mut self, cx: &mut ExtensionContext<'_>) {
            cx.report(Diagnostic::info(DiagnosticKind::Extension, "logger finished"));
        }
    }

    #[test]
    fn another_extension_leaves_location_types_unchanged() {
        let source = [SourceFile::new("bank.abs", BANK)];
        let opts = CompilerOptions {
            location_types: Some(LocationTypeOptions {
                statistics: true,
                ..LocationTypeOptions::default()
            }),
            ..options("Promotional")
        };

        let alone = compile(&source, &opts).unwrap();
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Logger)).unwrap();
        let together = compile_with(&source, &opts, registry).unwrap();

        let inferred: Vec<_> = alone.annotations.for_extension(EXTENSION_NAME).collect();
        assert!(!inferred.is_empty());
        assert_eq!(inferred, together.annotations.for_extension(EXTENSION_NAME).collect::<Vec<_>>());

        let own = |d: &&Diagnostic| d.origin.as_deref() != Some("logger");
        assert_eq!(together.diagnostics.iter().filter(|d| !own(d)).count(), 1);
        assert_eq!(
            alone.diagnostics.iter().collect::<Vec<_>>(),
            together.diagnostics.iter().filter(own).collect::<Vec<_>>()
        );
    }
}
