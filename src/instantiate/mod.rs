//! Template instantiation.
//!
//! [`JavaTemplate::apply`] renders the template with one argument per
//! placeholder, parses the result in the shape the coordinates need,
//! attributes it, and splices it into a new version of the cursor's file.
//!
//! Tree arguments are rendered as stub identifiers typed like the argument
//! and swapped for the argument itself after attribution, so the argument
//! keeps its exact formatting. Text arguments are rendered verbatim.

mod substitution;

use std::sync::Arc;

use jtemplate_compiler::{Attributor, Binding, Inference, is_assignable};
use jtemplate_core::{JavaType, TemplateInstantiationError};
use jtemplate_parser::Parser;
use jtemplate_parser::ast::fold::{self, Fold, FreshIds};
use jtemplate_parser::ast::{Expr, ExprKind, MethodCall, NewClass, Print};
use jtemplate_registry::TypeTable;
use rustc_hash::FxHashSet;
use tracing::debug;

pub use substitution::Substitution;

use crate::coordinates::{Coordinates, Reindent, SpliceContext};
use crate::matcher::is_literal;
use crate::template::{JavaTemplate, Placeholder, PlaceholderKind, TemplateScope};
use crate::{Cursor, SourceFile};

impl JavaTemplate {
    /// Render the template with `args` and splice it at `coordinates`
    /// relative to the cursor's node.
    ///
    /// The cursor's file is left untouched; the returned file shares every
    /// subtree off the edited path with it. A call whose generic constraints
    /// the arguments cannot satisfy is spliced with no resolved method.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn apply(
        &self,
        cursor: &Cursor,
        coordinates: Coordinates,
        args: &[Substitution],
    ) -> Result<SourceFile, TemplateInstantiationError> {
        if args.len() != self.parameter_count() {
            return Err(TemplateInstantiationError::ArgumentCount {
                expected: self.parameter_count(),
                found: args.len(),
            });
        }
        let shape = coordinates.shape(cursor)?;
        let environment = self.environment(cursor.file().table());
        let table = environment.table.as_ref();
        let mut template_scope = TemplateScope::new(self, table, Some(cursor));

        let actual = self.argument_types(args, cursor, table)?;
        let scope_params = template_scope.scope.type_params();
        for (index, actual) in actual.iter().enumerate() {
            let (Some(expected), Some(actual)) = (&template_scope.types[index], actual) else {
                continue;
            };
            if template_scope.is_generic(index) || is_assignable(actual, expected, table, &scope_params) {
                continue;
            }
            return Err(TemplateInstantiationError::IncompatibleArgument {
                index,
                expected: expected.to_string(),
                found: actual.to_string(),
            });
        }
        let unresolved = unsatisfied_generics(&template_scope, &actual, table);

        for (index, ty) in actual.iter().enumerate() {
            let declared = ty
                .clone()
                .or_else(|| template_scope.types[index].clone())
                .unwrap_or(JavaType::Unknown);
            template_scope.scope.declare(Placeholder::stub_name(index), declared);
        }

        let rendered = self.scanned().render(|index| match &args[index] {
            Substitution::Tree(_) => Placeholder::stub_name(index),
            Substitution::Text(text) => text.clone(),
        });
        let fragment = shape
            .parse(&rendered)
            .map_err(|errors| coordinates.shape_error(shape, errors))?;

        let TemplateScope { imports, scope, .. } = template_scope;
        let mut attributor = Attributor::new(table, imports).with_scope(scope);
        let mut fragment = fragment.attribute(&mut attributor);
        if !unresolved.is_empty() {
            fragment = fragment.fold(&mut Unresolve { stubs: &unresolved });
        }
        let indent = coordinates.indent(cursor, self.format_options());
        let fragment = fragment.fold(&mut Reindent::new(&indent));
        let trees: Vec<Option<Arc<Expr>>> = args.iter().map(|a| a.as_tree().cloned()).collect();
        let fragment = fragment.fold(&mut StubReplacer { trees: &trees });

        let mut imports = cursor.imports();
        imports.extend(&self.template_imports());
        let context = SpliceContext {
            table,
            imports,
            format: self.format_options(),
        };
        let unit = coordinates.splice(cursor, fragment, &context)?;
        debug!(
            coordinates = coordinates.name(),
            node = cursor.value().kind_name(),
            arguments = args.len(),
            "applied template"
        );
        if coordinates.changes_declarations(shape) {
            return Ok(cursor.file().redeclared(unit)?);
        }
        Ok(cursor.file().with_unit(unit))
    }

    /// The static type of each argument, where one is known.
    ///
    /// Text is parsed as an expression and attributed in the cursor's scope;
    /// text that is not an expression is only accepted by untyped holes.
    fn argument_types(
        &self,
        args: &[Substitution],
        cursor: &Cursor,
        table: &TypeTable,
    ) -> Result<Vec<Option<JavaType>>, TemplateInstantiationError> {
        let mut attributor: Option<Attributor<'_>> = None;
        let mut types = Vec::with_capacity(args.len());
        for (index, (arg, placeholder)) in args.iter().zip(self.placeholders()).enumerate() {
            let literal = placeholder.kind == PlaceholderKind::Literal;
            let expr = match arg {
                Substitution::Tree(tree) => tree.clone(),
                Substitution::Text(text) => match Parser::parse_expression(text) {
                    Ok(expr) => attributor
                        .get_or_insert_with(|| Attributor::new(table, cursor.imports()).with_scope(cursor.scope()))
                        .attribute_expr(&expr),
                    Err(errors) if literal || placeholder.constraint.is_some() => {
                        return Err(TemplateInstantiationError::InvalidArgument { index, errors });
                    }
                    Err(_) => {
                        types.push(None);
                        continue;
                    }
                },
            };
            if literal && !is_literal(&expr) {
                return Err(TemplateInstantiationError::IncompatibleArgument {
                    index,
                    expected: "a literal".into(),
                    found: expr.print().trim().to_string(),
                });
            }
            types.push(expr.ty.clone().filter(|ty| !ty.is_unknown()));
        }
        Ok(types)
    }
}

/// Generic holes whose arguments violate the template's type variable
/// bounds; empty when every binding is consistent.
fn unsatisfied_generics(
    template_scope: &TemplateScope,
    actual: &[Option<JavaType>],
    table: &TypeTable,
) -> FxHashSet<usize> {
    let holes: Vec<(usize, &JavaType, &JavaType)> = actual
        .iter()
        .enumerate()
        .filter(|(index, _)| template_scope.is_generic(*index))
        .filter_map(|(index, actual)| {
            let expected = template_scope.types[index].as_ref()?;
            Some((index, expected, actual.as_ref()?))
        })
        .collect();
    if holes.is_empty() {
        return FxHashSet::default();
    }
    let mut inference = Inference::new(&template_scope.generics, table, Binding::Fixed);
    let unified = holes.iter().all(|(_, expected, actual)| inference.unify(expected, actual));
    if unified && inference.finish().is_some() {
        return FxHashSet::default();
    }
    debug!(holes = holes.len(), "generic constraints not satisfied by the arguments");
    holes.iter().map(|(index, _, _)| *index).collect()
}

/// Swaps stub identifiers for the tree arguments they stand for.
///
/// Each placement is a renumbered copy, so an argument used twice, or one
/// that still sits elsewhere in the file, never shares ids with another
/// node.
struct StubReplacer<'a> {
    trees: &'a [Option<Arc<Expr>>],
}

impl Fold for StubReplacer<'_> {
    fn fold_expr(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        let tree = expr
            .ident_name()
            .and_then(Placeholder::stub_index)
            .and_then(|index| self.trees.get(index))
            .and_then(Option::as_ref);
        match tree {
            Some(tree) => Arc::new(FreshIds.fold_expr(tree).with_prefix(expr.prefix.clone())),
            None => fold::walk_expr(self, expr),
        }
    }
}

/// Drops the resolved signature of calls taking an argument whose generic
/// constraint failed.
struct Unresolve<'a> {
    stubs: &'a FxHashSet<usize>,
}

impl Unresolve<'_> {
    fn is_stub(&self, expr: &Expr) -> bool {
        expr.ident_name()
            .and_then(Placeholder::stub_index)
            .is_some_and(|index| self.stubs.contains(&index))
    }
}

impl Fold for Unresolve<'_> {
    fn fold_expr(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        let folded = fold::walk_expr(self, expr);
        let kind = match &folded.kind {
            ExprKind::MethodCall(call)
                if call.args.iter().any(|a| self.is_stub(a))
                    || call.select.as_ref().is_some_and(|s| self.is_stub(&s.elem)) =>
            {
                ExprKind::MethodCall(MethodCall {
                    method_type: None,
                    ..call.clone()
                })
            }
            ExprKind::NewClass(new) if new.args.iter().any(|a| self.is_stub(a)) => ExprKind::NewClass(NewClass {
                constructor_type: None,
                ..new.clone()
            }),
            _ => return folded,
        };
        Arc::new(Expr {
            kind,
            ty: None,
            ..(*folded).clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "\
class A {
    void m(int n, String s) {
        System.out.println(n);
    }
}
";

    fn target(file: &SourceFile) -> Cursor {
        file.find_expr("n").unwrap()
    }

    #[test]
    fn argument_count_must_match() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let template = JavaTemplate::builder("#{} + #{}").build().unwrap();
        let err = template
            .apply(&target(&file), Coordinates::Replace, &[Substitution::from("1")])
            .unwrap_err();
        assert_eq!(err, TemplateInstantiationError::ArgumentCount { expected: 2, found: 1 });
    }

    #[test]
    fn text_arguments_are_rendered_verbatim() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let template = JavaTemplate::builder("#{any(long)} * 2").build().unwrap();
        let applied = template
            .apply(&target(&file), Coordinates::Replace, &[Substitution::from("0x1FL")])
            .unwrap();
        assert!(applied.print().contains("System.out.println(0x1FL * 2);"));
        // The original file is unchanged.
        assert_eq!(file.print(), SOURCE);
    }

    #[test]
    fn tree_arguments_keep_their_formatting() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let cursor = target(&file);
        let n = cursor.value().as_expr().unwrap().clone();
        let template = JavaTemplate::builder("(#{any(int)} + 1)").build().unwrap();
        let applied = template.apply(&cursor, Coordinates::Replace, &[Substitution::Tree(n)]).unwrap();
        assert!(applied.print().contains("System.out.println((n + 1));"));
    }

    #[test]
    fn repeated_tree_arguments_are_edited_independently() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let cursor = target(&file);
        let n = cursor.value().as_expr().unwrap().clone();
        let twice = JavaTemplate::builder("#{a:any(int)} + #{a}").build().unwrap();
        let applied = twice.apply(&cursor, Coordinates::Replace, &[Substitution::Tree(n)]).unwrap();
        assert!(applied.print().contains("System.out.println(n + n);"));

        let zero = JavaTemplate::builder("0").build().unwrap();
        let edited = zero
            .apply(&applied.find_expr("n").unwrap(), Coordinates::Replace, &[])
            .unwrap();
        assert!(edited.print().contains("System.out.println(0 + n);"));
    }

    #[test]
    fn copied_statements_do_not_alias_the_original() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let stmt = file.find_stmt("System.out.println(n);").unwrap();
        let n = target(&file).value().as_expr().unwrap().clone();
        let log = JavaTemplate::builder("log(#{any(int)});").build().unwrap();
        let copied = log.apply(&stmt, Coordinates::Before, &[Substitution::Tree(n)]).unwrap();

        let zero = JavaTemplate::builder("0").build().unwrap();
        let edited = zero
            .apply(&copied.find_expr("n").unwrap(), Coordinates::Replace, &[])
            .unwrap();
        let printed = edited.print();
        assert!(printed.contains("log(0);"));
        assert!(printed.contains("System.out.println(n);"));
    }

    #[test]
    fn supplementary_chars_do_not_fill_char_holes() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let clef = Substitution::from('\u{1D11E}');
        let err = JavaTemplate::builder("#{any(char)}")
            .build()
            .unwrap()
            .apply(&target(&file), Coordinates::Replace, std::slice::from_ref(&clef))
            .unwrap_err();
        assert_eq!(
            err,
            TemplateInstantiationError::IncompatibleArgument {
                index: 0,
                expected: "char".into(),
                found: "java.lang.String".into(),
            }
        );

        let applied = JavaTemplate::builder("#{any(String)}")
            .build()
            .unwrap()
            .apply(&target(&file), Coordinates::Replace, &[clef])
            .unwrap();
        assert!(applied.print().contains("System.out.println(\"\\uD834\\uDD1E\");"));
    }

    #[test]
    fn incompatible_arguments_are_rejected() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let template = JavaTemplate::builder("#{any(int)} + 1").build().unwrap();
        let err = template
            .apply(&target(&file), Coordinates::Replace, &[Substitution::from("\"text\"")])
            .unwrap_err();
        assert_eq!(
            err,
            TemplateInstantiationError::IncompatibleArgument {
                index: 0,
                expected: "int".into(),
                found: "java.lang.String".into(),
            }
        );

        let literal = JavaTemplate::builder("#{literal}").build().unwrap();
        assert!(matches!(
            literal.apply(&target(&file), Coordinates::Replace, &[Substitution::from("s")]),
            Err(TemplateInstantiationError::IncompatibleArgument { index: 0, .. })
        ));
        assert!(matches!(
            template.apply(&target(&file), Coordinates::Replace, &[Substitution::from("1 +")]),
            Err(TemplateInstantiationError::InvalidArgument { index: 0, .. })
        ));
    }

    #[test]
    fn fragments_must_have_the_required_shape() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let template = JavaTemplate::builder("return;").build().unwrap();
        assert!(matches!(
            template.apply(&target(&file), Coordinates::Replace, &[]),
            Err(TemplateInstantiationError::FragmentShape {
                coordinates: "replace",
                expected: "an expression",
                ..
            })
        ));
    }
}
