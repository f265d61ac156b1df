//! Statement and declaration attribution.

use std::sync::Arc;

use jtemplate_core::{ClassType, JavaType, MethodType, PrimitiveKind};
use jtemplate_parser::ast::{
    Assert, Block, ClassDecl, ClassKind as DeclKind, DoWhile, Else, ExprStmt, ForEach, ForLoop, If, MethodDecl,
    Modifiers, Padded, ParenCond, Params, Return, Stmt, StmtKind, Throw, TypeList, VarDeclarator, VarDecls, VarInit,
    While, modifier_flags,
};
use tracing::trace;

use super::{Attributor, known, map_container};
use crate::inference::upper_bound;
use crate::type_resolver::resolve_type_params;

const ITERABLE: &str = "java.lang.Iterable";

fn rebuilt(stmt: &Stmt, kind: StmtKind) -> Arc<Stmt> {
    Arc::new(Stmt {
        id: stmt.id,
        prefix: stmt.prefix.clone(),
        kind,
    })
}

impl Attributor<'_> {
    pub(super) fn stmt(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let kind = match &stmt.kind {
            StmtKind::Block(block) => {
                let was_static = block.static_init.is_some().then(|| self.scope.set_static(true));
                self.scope.push_frame();
                let stmts = block.stmts.iter().map(|s| self.stmt(s)).collect();
                self.scope.pop_frame();
                if let Some(was_static) = was_static {
                    self.scope.set_static(was_static);
                }
                StmtKind::Block(Block {
                    stmts,
                    ..block.clone()
                })
            }
            StmtKind::Variables(vars) => StmtKind::Variables(self.var_decls(vars, None, true)),
            StmtKind::Expr(e) => StmtKind::Expr(ExprStmt {
                expr: self.expr(&e.expr, None),
                semi: e.semi.clone(),
            }),
            StmtKind::If(s) => {
                let cond = self.cond(&s.cond);
                let then_stmt = self.stmt(&s.then_stmt);
                let else_branch = s.else_branch.as_ref().map(|e| Else {
                    keyword: e.keyword.clone(),
                    stmt: self.stmt(&e.stmt),
                });
                StmtKind::If(If {
                    cond,
                    then_stmt,
                    else_branch,
                })
            }
            StmtKind::While(s) => StmtKind::While(While {
                cond: self.cond(&s.cond),
                body: self.stmt(&s.body),
            }),
            StmtKind::DoWhile(s) => {
                let body = self.stmt(&s.body);
                StmtKind::DoWhile(DoWhile {
                    body,
                    cond: self.cond(&s.cond),
                    ..s.clone()
                })
            }
            StmtKind::For(s) => {
                self.scope.push_frame();
                let init = self.stmt(&s.init);
                let boolean = JavaType::Primitive(PrimitiveKind::Boolean);
                let cond = s.cond.as_ref().map(|c| self.expr(c, Some(&boolean)));
                let update = map_container(&s.update, |u| self.expr(u, None));
                let body = self.stmt(&s.body);
                self.scope.pop_frame();
                StmtKind::For(ForLoop {
                    init,
                    cond,
                    update,
                    body,
                    ..s.clone()
                })
            }
            StmtKind::ForEach(s) => {
                self.scope.push_frame();
                let iterable = self.expr(&s.iterable, None);
                let elem = self.element_type(&iterable.java_type());
                let var = match s.var.as_variables() {
                    Some(vars) => rebuilt(&s.var, StmtKind::Variables(self.var_decls(vars, Some(&elem), true))),
                    None => self.stmt(&s.var),
                };
                let body = self.stmt(&s.body);
                self.scope.pop_frame();
                StmtKind::ForEach(ForEach {
                    var,
                    iterable,
                    body,
                    ..s.clone()
                })
            }
            StmtKind::Return(s) => {
                let expected = self.returns.last().filter(|r| !r.is_void() && !r.is_unknown()).cloned();
                StmtKind::Return(Return {
                    expr: s.expr.as_ref().map(|e| self.expr(e, expected.as_ref())),
                    semi: s.semi.clone(),
                })
            }
            StmtKind::Throw(s) => StmtKind::Throw(Throw {
                expr: self.expr(&s.expr, None),
                semi: s.semi.clone(),
            }),
            StmtKind::Assert(s) => {
                let boolean = JavaType::Primitive(PrimitiveKind::Boolean);
                StmtKind::Assert(Assert {
                    cond: self.expr(&s.cond, Some(&boolean)),
                    detail: s.detail.as_ref().map(|(colon, e)| (colon.clone(), self.expr(e, None))),
                    semi: s.semi.clone(),
                })
            }
            StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty => return stmt.clone(),
            StmtKind::Method(method) => StmtKind::Method(self.method_decl(method)),
            StmtKind::Class(class) => StmtKind::Class(self.class_decl(class)),
        };
        rebuilt(stmt, kind)
    }

    fn cond(&mut self, cond: &ParenCond) -> ParenCond {
        let boolean = JavaType::Primitive(PrimitiveKind::Boolean);
        ParenCond {
            expr: self.expr(&cond.expr, Some(&boolean)),
            ..cond.clone()
        }
    }

    /// Element type of a for-each loop over `iterable`.
    fn element_type(&self, iterable: &JavaType) -> JavaType {
        match self.scope.upper_bound(iterable) {
            JavaType::Array(component) => *component,
            JavaType::Class(class) => match self.table.as_super(&class, ITERABLE) {
                Some(iterable) => iterable.args.first().map(upper_bound).unwrap_or_else(JavaType::object),
                None => JavaType::Unknown,
            },
            _ => JavaType::Unknown,
        }
    }

    /// Attribute variable declarations. `fallback` types declarators written
    /// without a type (inferred lambda parameters, for-each variables).
    pub(super) fn var_decls(&mut self, vars: &VarDecls, fallback: Option<&JavaType>, declare: bool) -> VarDecls {
        let mut decls = Vec::with_capacity(vars.vars.len());
        for var in &vars.vars {
            let ty = match (&vars.type_tree, fallback) {
                (None, Some(fallback)) => fallback.clone(),
                _ => self.resolver().resolve_declarator(vars, &var.elem),
            };
            let init = var.elem.init.as_ref().map(|init| VarInit {
                eq: init.eq.clone(),
                value: self.expr(&init.value, Some(&ty)),
            });
            if declare {
                self.scope.declare(var.elem.name.as_str(), ty.clone());
            }
            decls.push(Padded {
                elem: VarDeclarator {
                    init,
                    ty: known(ty),
                    ..var.elem.clone()
                },
                after: var.after.clone(),
            });
        }
        VarDecls {
            modifiers: self.modifiers(&vars.modifiers),
            type_tree: vars.type_tree.as_ref().map(|t| self.attribute_type(t)),
            vars: decls,
            ..vars.clone()
        }
    }

    /// Declare method or lambda parameters in the current frame. `inferred`
    /// gives the types of parameters written without one.
    pub(super) fn params(&mut self, params: &Params, inferred: &[JavaType]) -> Params {
        let mut index = 0;
        map_container(params, |param| {
            let attributed = match param.as_variables() {
                Some(vars) => {
                    let vars = self.var_decls(vars, Some(inferred.get(index).unwrap_or(&JavaType::Unknown)), true);
                    rebuilt(param, StmtKind::Variables(vars))
                }
                None => param.clone(),
            };
            index += 1;
            attributed
        })
    }

    fn type_list(&self, list: &TypeList) -> TypeList {
        TypeList {
            keyword: list.keyword.clone(),
            types: list
                .types
                .iter()
                .map(|t| Padded {
                    elem: self.attribute_type(&t.elem),
                    after: t.after.clone(),
                })
                .collect(),
        }
    }

    fn method_decl(&mut self, method: &MethodDecl) -> MethodDecl {
        let type_params = resolve_type_params(
            self.table,
            &self.imports,
            &mut self.scope,
            None,
            method.type_params.as_ref(),
        );
        self.scope.push_type_params(type_params);
        let flags = method.flags();
        let is_static = flags.contains(Modifiers::STATIC);
        let was_static = self.scope.set_static(is_static);
        self.scope.push_frame();

        let modifiers = self.modifiers(&method.modifiers);
        let params = self.params(&method.params, &[]);
        let param_types: Vec<JavaType> = params
            .iter()
            .filter_map(|p| p.as_variables())
            .flat_map(|v| v.vars.iter().map(|d| d.elem.ty.clone().unwrap_or(JavaType::Unknown)))
            .collect();
        let is_varargs = params
            .iter()
            .filter_map(|p| p.as_variables())
            .last()
            .is_some_and(|v| v.varargs.is_some());
        let return_type_tree = method.return_type.as_ref().map(|t| self.attribute_type(t));
        let return_type = match &return_type_tree {
            Some(tree) => tree.ty.clone().unwrap_or(JavaType::Unknown),
            None => JavaType::Primitive(PrimitiveKind::Void),
        };
        let throws = method.throws.as_ref().map(|t| self.type_list(t));

        self.returns.push(return_type.clone());
        let body = method.body.as_ref().map(|b| self.stmt(b));
        self.returns.pop();

        self.scope.pop_frame();
        self.scope.set_static(was_static);
        self.scope.pop_type_params();

        let method_type = self.scope.enclosing_class().map(|class| MethodType {
            declaring: class.ty.fqn.clone(),
            name: if method.is_constructor() {
                MethodType::CONSTRUCTOR.to_string()
            } else {
                method.name.as_str().to_string()
            },
            params: param_types,
            return_type,
            type_args: Vec::new(),
            is_static,
            is_varargs,
        });
        MethodDecl {
            modifiers,
            return_type: return_type_tree,
            params,
            throws,
            body,
            method_type,
            ..method.clone()
        }
    }

    fn class_decl(&mut self, decl: &ClassDecl) -> ClassDecl {
        let name = decl.name.as_str();
        let fqn = match (self.scope.enclosing_class(), &self.imports.package) {
            (Some(outer), _) => format!("{}.{name}", outer.ty.fqn),
            (None, Some(package)) => format!("{package}.{name}"),
            (None, None) => name.to_string(),
        };
        let type_params = match self.table.get(&fqn) {
            Some(info) => info.type_params.clone(),
            None => {
                trace!(class = %fqn, "attributing unregistered class");
                resolve_type_params(self.table, &self.imports, &mut self.scope, None, decl.type_params.as_ref())
            }
        };
        let this = ClassType {
            fqn,
            args: type_params.iter().map(|p| JavaType::TypeVar(p.name.clone())).collect(),
        };

        let modifiers = self.modifiers(&decl.modifiers);
        let nested_static = decl.kind == DeclKind::Interface || decl.flags().contains(Modifiers::STATIC);
        let outer_static = nested_static.then(|| self.scope.set_static(true));
        self.scope.push_type_params(type_params);
        self.scope.push_class(this.clone(), false);

        let extends = decl.extends.as_ref().map(|t| self.type_list(t));
        let implements = decl.implements.as_ref().map(|t| self.type_list(t));
        let body = self.class_body(&decl.body);

        self.scope.pop_class();
        self.scope.pop_type_params();
        if let Some(was_static) = outer_static {
            self.scope.set_static(was_static);
        }

        ClassDecl {
            modifiers,
            extends,
            implements,
            body,
            ty: Some(JavaType::Class(this)),
            ..decl.clone()
        }
    }

    /// Attribute a class body block member by member.
    pub(super) fn class_body(&mut self, body: &Arc<Stmt>) -> Arc<Stmt> {
        match body.as_block() {
            Some(block) => {
                let stmts = block.stmts.iter().map(|m| self.member(m)).collect();
                rebuilt(
                    body,
                    StmtKind::Block(Block {
                        stmts,
                        ..block.clone()
                    }),
                )
            }
            None => self.stmt(body),
        }
    }

    pub(super) fn member(&mut self, member: &Arc<Stmt>) -> Arc<Stmt> {
        match &member.kind {
            StmtKind::Variables(vars) => {
                let is_static = self.in_interface() || modifier_flags(&vars.modifiers).contains(Modifiers::STATIC);
                let was_static = self.scope.set_static(is_static);
                let vars = self.var_decls(vars, None, false);
                self.scope.set_static(was_static);
                rebuilt(member, StmtKind::Variables(vars))
            }
            _ => self.stmt(member),
        }
    }

    fn in_interface(&self) -> bool {
        self.scope
            .enclosing_class()
            .and_then(|c| self.table.get(&c.ty.fqn))
            .is_some_and(|info| info.is_interface())
    }
}
