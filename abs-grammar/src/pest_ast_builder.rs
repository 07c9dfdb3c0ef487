#![forbid(unsafe_code)]

use crate::nodes::*;
use crate::parser::Rule;
use pest::iterators::{Pair, Pairs};

/// Builder converting Pest parse trees into the program tree.
pub struct PestAstBuilder {
    file: Option<String>,
}

fn expect<'i>(inner: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>, String> {
    inner.next().ok_or_else(|| format!("Missing {}", what))
}

fn first_inner<'i>(pair: Pair<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>, String> {
    expect(&mut pair.into_inner(), what)
}

fn names(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

impl PestAstBuilder {
    pub fn new(file: Option<String>) -> Self {
        Self { file }
    }

    fn location(&self, pair: &Pair<Rule>) -> Option<Location> {
        let (line, column) = pair.as_span().start_pos().line_col();
        Some(Location::new(self.file.clone(), line, column))
    }

    /// Build a compilation unit from the top-level `unit` rule
    pub fn build_unit(&self, pairs: Pairs<Rule>) -> Result<CompilationUnit, String> {
        let mut modules = Vec::new();

        for pair in pairs {
            match pair.as_rule() {
                Rule::unit => {
                    for inner in pair.into_inner() {
                        match inner.as_rule() {
                            Rule::module_decl => modules.push(self.build_module(inner)?),
                            Rule::EOI => {}
                            rule => return Err(format!("Unexpected rule in unit: {:?}", rule)),
                        }
                    }
                }
                rule => return Err(format!("Expected unit rule, got: {:?}", rule)),
            }
        }

        Ok(CompilationUnit {
            file: self.file.clone(),
            modules,
        })
    }

    fn build_module(&self, pair: Pair<Rule>) -> Result<ModuleDecl, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let name = expect(&mut inner, "module name")?.as_str().to_string();

        let mut decls = Vec::new();
        for d in inner {
            let decl = match d.as_rule() {
                Rule::interface_decl => Decl::Interface(self.build_interface(d)?),
                Rule::class_decl => Decl::Class(self.build_class(d)?),
                Rule::trait_decl => Decl::Trait(self.build_trait(d)?),
                Rule::delta_decl => Decl::Delta(self.build_delta(d)?),
                Rule::product_decl => Decl::Product(self.build_product(d)?),
                rule => return Err(format!("Unexpected declaration: {:?}", rule)),
            };
            decls.push(decl);
        }

        Ok(ModuleDecl {
            name,
            decls,
            location,
        })
    }

    fn build_interface(&self, pair: Pair<Rule>) -> Result<InterfaceDecl, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let mut decl = InterfaceDecl::new(expect(&mut inner, "interface name")?.as_str());
        decl.location = location;

        for p in inner {
            match p.as_rule() {
                Rule::extends_clause => decl.extends = names(p),
                Rule::method_sig => decl.methods.push(self.build_method_sig(p)?),
                rule => return Err(format!("Unexpected rule in interface: {:?}", rule)),
            }
        }
        Ok(decl)
    }

    fn build_type_use(&self, pair: Pair<Rule>) -> Result<TypeUse, String> {
        let mut ty = TypeUse::named("");
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::annotation => ty
                    .annotations
                    .push(first_inner(p, "annotation name")?.as_str().to_string()),
                Rule::qualified_name => ty.name = p.as_str().to_string(),
                Rule::type_use => ty.args.push(self.build_type_use(p)?),
                rule => return Err(format!("Unexpected rule in type: {:?}", rule)),
            }
        }
        Ok(ty)
    }

    fn build_param(&self, pair: Pair<Rule>) -> Result<Param, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let ty = self.build_type_use(expect(&mut inner, "parameter type")?)?;
        let name = expect(&mut inner, "parameter name")?.as_str().to_string();
        Ok(Param { name, ty, location })
    }

    fn build_method_sig(&self, pair: Pair<Rule>) -> Result<MethodSig, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let return_type = self.build_type_use(expect(&mut inner, "return type")?)?;
        let name = expect(&mut inner, "method name")?.as_str().to_string();
        let params = inner
            .map(|p| self.build_param(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MethodSig {
            name,
            return_type,
            params,
            location,
        })
    }

    fn build_method_impl(&self, pair: Pair<Rule>) -> Result<MethodImpl, String> {
        let mut inner = pair.into_inner();
        let sig = self.build_method_sig(expect(&mut inner, "method signature")?)?;
        let body = self.build_block(expect(&mut inner, "method body")?)?;
        Ok(MethodImpl::new(sig, body))
    }

    fn build_field(&self, pair: Pair<Rule>) -> Result<FieldDecl, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let ty = self.build_type_use(expect(&mut inner, "field type")?)?;
        let name = expect(&mut inner, "field name")?.as_str().to_string();
        let init = inner.next().map(|p| self.build_expr(p)).transpose()?;
        Ok(FieldDecl {
            name,
            ty,
            init,
            location,
        })
    }

    fn build_class(&self, pair: Pair<Rule>) -> Result<ClassDecl, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let mut class = ClassDecl::new(expect(&mut inner, "class name")?.as_str());
        class.location = location;

        for p in inner {
            match p.as_rule() {
                Rule::class_params => {
                    class.params = p
                        .into_inner()
                        .map(|param| self.build_param(param))
                        .collect::<Result<Vec<_>, _>>()?;
                }
                Rule::implements_clause => class.implements = names(p),
                Rule::trait_use => class.trait_uses.push(self.build_trait_use(p)?),
                Rule::init_block => {
                    if class.init.is_some() {
                        return Err(format!("Class {} has more than one init block", class.name));
                    }
                    class.init = Some(self.build_block(first_inner(p, "init block")?)?);
                }
                Rule::recover_block => {
                    if class.recover.is_some() {
                        return Err(format!(
                            "Class {} has more than one recover block",
                            class.name
                        ));
                    }
                    class.recover = Some(self.build_block(first_inner(p, "recover block")?)?);
                }
                Rule::method_impl => class.methods.push(self.build_method_impl(p)?),
                Rule::field_decl => class.fields.push(self.build_field(p)?),
                rule => return Err(format!("Unexpected rule in class: {:?}", rule)),
            }
        }
        Ok(class)
    }

    fn build_trait_use(&self, pair: Pair<Rule>) -> Result<TraitUse, String> {
        let inner = first_inner(pair, "trait use")?;
        match inner.as_rule() {
            Rule::trait_use_modifies => Ok(TraitUse::Modifies(
                self.build_trait_expr(first_inner(inner, "trait expression")?)?,
            )),
            Rule::trait_use_removes => Ok(TraitUse::Removes(
                self.build_sig_set(first_inner(inner, "signatures")?)?,
            )),
            Rule::trait_expr => Ok(TraitUse::Adds(self.build_trait_expr(inner)?)),
            rule => Err(format!("Unexpected rule in uses clause: {:?}", rule)),
        }
    }

    fn build_sig_set(&self, pair: Pair<Rule>) -> Result<Vec<MethodSig>, String> {
        pair.into_inner()
            .map(|p| self.build_method_sig(p))
            .collect()
    }

    fn build_trait(&self, pair: Pair<Rule>) -> Result<TraitDecl, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let name = expect(&mut inner, "trait name")?.as_str().to_string();
        let expr = self.build_trait_expr(expect(&mut inner, "trait expression")?)?;
        Ok(TraitDecl {
            name,
            expr,
            location,
        })
    }

    /// Trait operators associate to the left: `T adds A modifies B` is
    /// `Modifies(Adds(T, A), B)`.
    fn build_trait_expr(&self, pair: Pair<Rule>) -> Result<TraitExpr, String> {
        let mut inner = pair.into_inner();
        let mut expr = self.build_trait_atom(expect(&mut inner, "trait operand")?)?;

        for op in inner {
            expr = match op.as_rule() {
                Rule::trait_adds => TraitExpr::Adds(
                    Box::new(expr),
                    Box::new(self.build_trait_atom(first_inner(op, "added trait")?)?),
                ),
                Rule::trait_modifies => TraitExpr::Modifies(
                    Box::new(expr),
                    Box::new(self.build_trait_atom(first_inner(op, "modifying trait")?)?),
                ),
                Rule::trait_removes => TraitExpr::Removes(
                    Box::new(expr),
                    self.build_sig_set(first_inner(op, "removed signatures")?)?,
                ),
                rule => return Err(format!("Unexpected trait operator: {:?}", rule)),
            };
        }
        Ok(expr)
    }

    fn build_trait_atom(&self, pair: Pair<Rule>) -> Result<TraitExpr, String> {
        match pair.as_rule() {
            Rule::method_set => Ok(TraitExpr::Set(
                pair.into_inner()
                    .map(|p| self.build_method_impl(p))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Rule::trait_ref => {
                let location = self.location(&pair);
                let name = first_inner(pair, "trait name")?.as_str().to_string();
                Ok(TraitExpr::Ref { name, location })
            }
            rule => Err(format!("Unexpected trait operand: {:?}", rule)),
        }
    }

    fn build_delta(&self, pair: Pair<Rule>) -> Result<DeltaDecl, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let mut delta = DeltaDecl::new(expect(&mut inner, "delta name")?.as_str());
        delta.location = location;

        for p in inner {
            match p.as_rule() {
                Rule::delta_after => delta.after.extend(names(p)),
                Rule::delta_before => delta.before.extend(names(p)),
                Rule::delta_when => {
                    delta.condition = Some(self.build_app_cond(first_inner(p, "condition")?)?)
                }
                Rule::delta_uses => {
                    delta.uses = Some(first_inner(p, "module name")?.as_str().to_string())
                }
                Rule::delta_adds => delta.ops.push(self.build_delta_adds(p)?),
                Rule::delta_removes => delta.ops.push(self.build_delta_removes(p)?),
                Rule::modifies_class => delta
                    .ops
                    .push(DeltaOp::ModifyClass(self.build_class_modifier(p)?)),
                Rule::modifies_interface => delta
                    .ops
                    .push(DeltaOp::ModifyInterface(self.build_interface_modifier(p)?)),
                Rule::modifies_trait => {
                    let location = self.location(&p);
                    let mut parts = p.into_inner();
                    let name = expect(&mut parts, "trait name")?.as_str().to_string();
                    let expr = self.build_trait_expr(expect(&mut parts, "trait expression")?)?;
                    delta.ops.push(DeltaOp::ModifyTrait {
                        name,
                        expr,
                        location,
                    });
                }
                rule => return Err(format!("Unexpected rule in delta: {:?}", rule)),
            }
        }
        Ok(delta)
    }

    fn build_app_cond(&self, pair: Pair<Rule>) -> Result<AppCond, String> {
        match pair.as_rule() {
            Rule::app_cond | Rule::app_and => {
                let is_or = pair.as_rule() == Rule::app_cond;
                let mut inner = pair.into_inner();
                let mut cond = self.build_app_cond(expect(&mut inner, "condition")?)?;
                for p in inner {
                    let rhs = Box::new(self.build_app_cond(p)?);
                    cond = if is_or {
                        AppCond::Or(Box::new(cond), rhs)
                    } else {
                        AppCond::And(Box::new(cond), rhs)
                    };
                }
                Ok(cond)
            }
            Rule::app_not => Ok(AppCond::Not(Box::new(
                self.build_app_cond(first_inner(pair, "negated condition")?)?,
            ))),
            Rule::app_feature => Ok(AppCond::Feature(pair.as_str().trim().to_string())),
            rule => Err(format!("Unexpected rule in condition: {:?}", rule)),
        }
    }

    fn build_delta_adds(&self, pair: Pair<Rule>) -> Result<DeltaOp, String> {
        let inner = first_inner(pair, "added declaration")?;
        match inner.as_rule() {
            Rule::interface_decl => Ok(DeltaOp::AddInterface(self.build_interface(inner)?)),
            Rule::class_decl => Ok(DeltaOp::AddClass(self.build_class(inner)?)),
            Rule::trait_decl => Ok(DeltaOp::AddTrait(self.build_trait(inner)?)),
            rule => Err(format!("Unexpected added declaration: {:?}", rule)),
        }
    }

    fn build_delta_removes(&self, pair: Pair<Rule>) -> Result<DeltaOp, String> {
        let inner = first_inner(pair, "removed declaration")?;
        let location = self.location(&inner);
        let rule = inner.as_rule();
        let name = first_inner(inner, "removed name")?.as_str().to_string();
        match rule {
            Rule::removes_class => Ok(DeltaOp::RemoveClass { name, location }),
            Rule::removes_interface => Ok(DeltaOp::RemoveInterface { name, location }),
            Rule::removes_trait => Ok(DeltaOp::RemoveTrait { name, location }),
            rule => Err(format!("Unexpected removed declaration: {:?}", rule)),
        }
    }

    fn build_class_modifier(&self, pair: Pair<Rule>) -> Result<ClassModifier, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let name = expect(&mut inner, "class name")?.as_str().to_string();
        let mut modifier = ClassModifier {
            name,
            add_implements: Vec::new(),
            ops: Vec::new(),
            location,
        };

        for p in inner {
            let op = match p.as_rule() {
                Rule::added_interfaces => {
                    modifier.add_implements.extend(names(p));
                    continue;
                }
                Rule::trait_use => ClassOp::AddTraitUse(self.build_trait_use(p)?),
                Rule::class_adds => {
                    let added = first_inner(p, "added member")?;
                    match added.as_rule() {
                        Rule::method_impl => ClassOp::AddMethod(self.build_method_impl(added)?),
                        Rule::field_decl => ClassOp::AddField(self.build_field(added)?),
                        rule => return Err(format!("Unexpected added member: {:?}", rule)),
                    }
                }
                Rule::class_modifies => {
                    ClassOp::ModifyMethod(self.build_method_impl(first_inner(p, "method")?)?)
                }
                Rule::class_removes => {
                    let removed = first_inner(p, "removed member")?;
                    match removed.as_rule() {
                        Rule::removed_method => ClassOp::RemoveMethod(
                            self.build_method_sig(first_inner(removed, "method signature")?)?,
                        ),
                        Rule::removed_field => {
                            let location = self.location(&removed);
                            let mut parts = removed.into_inner();
                            let _ty = expect(&mut parts, "field type")?;
                            let name = expect(&mut parts, "field name")?.as_str().to_string();
                            ClassOp::RemoveField { name, location }
                        }
                        rule => return Err(format!("Unexpected removed member: {:?}", rule)),
                    }
                }
                rule => return Err(format!("Unexpected class modifier: {:?}", rule)),
            };
            modifier.ops.push(op);
        }
        Ok(modifier)
    }

    fn build_interface_modifier(&self, pair: Pair<Rule>) -> Result<InterfaceModifier, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let name = expect(&mut inner, "interface name")?.as_str().to_string();
        let mut ops = Vec::new();
        for p in inner {
            let rule = p.as_rule();
            let sig = self.build_method_sig(first_inner(p, "method signature")?)?;
            ops.push(match rule {
                Rule::interface_adds => InterfaceOp::AddMethod(sig),
                Rule::interface_removes => InterfaceOp::RemoveMethod(sig),
                rule => return Err(format!("Unexpected interface modifier: {:?}", rule)),
            });
        }
        Ok(InterfaceModifier {
            name,
            ops,
            location,
        })
    }

    fn build_product(&self, pair: Pair<Rule>) -> Result<ProductDecl, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let name = expect(&mut inner, "product name")?.as_str().to_string();
        let features = inner.map(|p| p.as_str().to_string()).collect();
        Ok(ProductDecl {
            name,
            features,
            location,
        })
    }

    fn build_block(&self, pair: Pair<Rule>) -> Result<Block, String> {
        let stmts = pair
            .into_inner()
            .map(|p| self.build_stmt(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Block { stmts })
    }

    fn build_stmt(&self, pair: Pair<Rule>) -> Result<Stmt, String> {
        let location = self.location(&pair);
        let rule = pair.as_rule();
        let mut inner = pair.into_inner();

        let kind = match rule {
            Rule::var_decl => {
                let ty = self.build_type_use(expect(&mut inner, "variable type")?)?;
                let name = expect(&mut inner, "variable name")?.as_str().to_string();
                let init = inner.next().map(|p| self.build_expr(p)).transpose()?;
                StmtKind::VarDecl { ty, name, init }
            }
            Rule::assign_stmt => {
                let target_pair = expect(&mut inner, "assignment target")?;
                let target = match target_pair.as_rule() {
                    Rule::this_field => LValue::Field(
                        first_inner(target_pair, "field name")?.as_str().to_string(),
                    ),
                    Rule::var_ref => LValue::Var(target_pair.as_str().trim().to_string()),
                    rule => return Err(format!("Unexpected assignment target: {:?}", rule)),
                };
                let value = self.build_expr(expect(&mut inner, "assigned value")?)?;
                StmtKind::Assign { target, value }
            }
            Rule::expr_stmt => StmtKind::Expr(self.build_expr(expect(&mut inner, "expression")?)?),
            Rule::return_stmt => {
                StmtKind::Return(self.build_expr(expect(&mut inner, "returned value")?)?)
            }
            Rule::skip_stmt => StmtKind::Skip,
            Rule::if_stmt => {
                let cond = self.build_expr(expect(&mut inner, "condition")?)?;
                let then = self.build_block(expect(&mut inner, "then branch")?)?;
                let otherwise = inner.next().map(|p| self.build_block(p)).transpose()?;
                StmtKind::If {
                    cond,
                    then,
                    otherwise,
                }
            }
            Rule::while_stmt => {
                let cond = self.build_expr(expect(&mut inner, "condition")?)?;
                let body = self.build_block(expect(&mut inner, "loop body")?)?;
                StmtKind::While { cond, body }
            }
            rule => return Err(format!("Unexpected statement: {:?}", rule)),
        };
        Ok(Stmt { kind, location })
    }

    fn build_args(&self, pairs: Pairs<Rule>) -> Result<Vec<Expr>, String> {
        pairs.map(|p| self.build_expr(p)).collect()
    }

    fn build_expr(&self, pair: Pair<Rule>) -> Result<Expr, String> {
        let location = self.location(&pair);
        let kind = match pair.as_rule() {
            Rule::or_expr => return self.build_binary_chain(pair, Some(BinaryOp::Or)),
            Rule::and_expr => return self.build_binary_chain(pair, Some(BinaryOp::And)),
            Rule::eq_expr | Rule::rel_expr | Rule::add_expr | Rule::mul_expr => {
                return self.build_binary_chain(pair, None)
            }
            Rule::unary_expr => return self.build_unary(pair),
            Rule::postfix_expr => return self.build_postfix(pair),
            Rule::new_expr => {
                let mut local = false;
                let mut class = String::new();
                let mut args = Vec::new();
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::local_kw => local = true,
                        Rule::qualified_name => class = p.as_str().to_string(),
                        _ => args.push(self.build_expr(p)?),
                    }
                }
                ExprKind::New { class, args, local }
            }
            Rule::original_call => ExprKind::Original(self.build_args(pair.into_inner())?),
            Rule::this_field => ExprKind::Field(first_inner(pair, "field name")?.as_str().to_string()),
            Rule::this_expr => ExprKind::This,
            Rule::bool_lit => ExprKind::Bool(pair.as_str() == "true"),
            Rule::null_lit => ExprKind::Null,
            Rule::var_ref => ExprKind::Var(pair.as_str().trim().to_string()),
            Rule::int_lit => ExprKind::Int(
                pair.as_str()
                    .parse::<i64>()
                    .map_err(|e| format!("Invalid integer literal {}: {}", pair.as_str(), e))?,
            ),
            Rule::string_lit => ExprKind::Str(first_inner(pair, "string")?.as_str().to_string()),
            rule => return Err(format!("Unexpected expression: {:?}", rule)),
        };
        Ok(Expr { kind, location })
    }

    /// Left-associative chain. `implicit` is the operator of rules whose
    /// operator token is not captured (`||`, `&&`).
    fn build_binary_chain(
        &self,
        pair: Pair<Rule>,
        implicit: Option<BinaryOp>,
    ) -> Result<Expr, String> {
        let location = self.location(&pair);
        let mut inner = pair.into_inner();
        let mut lhs = self.build_expr(expect(&mut inner, "operand")?)?;

        while let Some(next) = inner.next() {
            let (op, rhs_pair) = match implicit {
                Some(op) => (op, next),
                None => {
                    let op = BinaryOp::from_symbol(next.as_str())
                        .ok_or_else(|| format!("Unknown operator: {}", next.as_str()))?;
                    (op, expect(&mut inner, "right operand")?)
                }
            };
            let rhs = self.build_expr(rhs_pair)?;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                location: location.clone(),
            };
        }
        Ok(lhs)
    }

    fn build_unary(&self, pair: Pair<Rule>) -> Result<Expr, String> {
        let location = self.location(&pair);
        let mut ops = Vec::new();
        let mut operand = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::unary_op => ops.push(if p.as_str() == "!" {
                    UnaryOp::Not
                } else {
                    UnaryOp::Neg
                }),
                _ => operand = Some(self.build_expr(p)?),
            }
        }

        let mut expr = operand.ok_or_else(|| "Missing operand".to_string())?;
        for op in ops.into_iter().rev() {
            expr = Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(expr),
                },
                location: location.clone(),
            };
        }
        Ok(expr)
    }

    fn build_postfix(&self, pair: Pair<Rule>) -> Result<Expr, String> {
        let mut inner = pair.into_inner();
        let mut expr = self.build_expr(expect(&mut inner, "primary expression")?)?;

        for p in inner {
            let location = self.location(&p);
            let kind = match p.as_rule() {
                Rule::sync_call | Rule::async_call => {
                    let asynchronous = p.as_rule() == Rule::async_call;
                    let mut parts = p.into_inner();
                    let method = expect(&mut parts, "method name")?.as_str().to_string();
                    ExprKind::Call {
                        target: Box::new(expr),
                        method,
                        args: self.build_args(parts)?,
                        asynchronous,
                    }
                }
                Rule::get_suffix => ExprKind::Get(Box::new(expr)),
                rule => return Err(format!("Unexpected postfix: {:?}", rule)),
            };
            expr = Expr { kind, location };
        }
        Ok(expr)
    }
}
