use jtemplate::{
    Coordinates, JavaTemplate, SourceFile, Substitution, TemplateCache, TemplateInstantiationError,
};
use pretty_assertions::assert_eq;

fn parse(source: &str) -> SourceFile {
    SourceFile::parse(source).unwrap_or_else(|err| panic!("parse failed: {err}"))
}

fn template(source: &str) -> JavaTemplate {
    JavaTemplate::builder(source).build().unwrap()
}

#[test]
fn test_match_then_render_is_identity() {
    let file = parse("class A { int f(int a, int b) { return a + b; } }");
    let cursor = file.find_expr("a + b").unwrap();
    let sum = template("#{any(int)} + #{any(int)}");

    let found = sum.matches(&cursor).expect("should match");
    let applied = sum.apply(&cursor, Coordinates::Replace, &found.substitutions()).unwrap();
    assert_eq!(applied.print(), file.print());
}

#[test]
fn test_literals_keep_their_source_text() {
    let file = parse("class A {\n    Object[] m() {\n        return null;\n    }\n}\n");
    let cursor = file.find_expr("null").unwrap();
    let array = template("new Object[] { #{}, #{}, #{}, #{}, #{}, #{}, #{} }");
    let args = vec![
        Substitution::from(true),
        Substitution::from(1),
        Substitution::from("2L"),
        Substitution::from(2.5),
        Substitution::from("3.5f"),
        Substitution::from(32767i16),
        Substitution::from('c'),
    ];

    let applied = array.apply(&cursor, Coordinates::Replace, &args).unwrap();
    assert_eq!(
        applied.print(),
        "class A {\n    Object[] m() {\n        return new Object[] { true, 1, 2L, 2.5, 3.5f, 32767, 'c' };\n    }\n}\n"
    );
}

#[test]
fn test_replacing_a_statement_preserves_surrounding_formatting() {
    let file = parse("class Test { int n; void test(){ assert n==0; } }");
    let cursor = file.find_stmt("assert n==0;").unwrap();
    let condition = file.find_expr("n==0").unwrap().value().as_expr().unwrap().clone();
    let check = template("check(#{any(boolean)});");

    let applied = check
        .apply(&cursor, Coordinates::Replace, &[Substitution::Tree(condition)])
        .unwrap();
    assert_eq!(applied.print(), "class Test { int n; void test(){ check(n==0); } }");
}

#[test]
fn test_unsatisfiable_generic_bound_leaves_call_unresolved() {
    let file = parse(
        "class A {\n    void m(Object o, String s) {\n        o.hashCode();\n        s.hashCode();\n    }\n}\n",
    );
    let foo = JavaTemplate::builder("G.foo(#{any(T)});")
        .generic_types(["T extends String"])
        .depends_on(["class G { static <T extends String> void foo(T t) {} }"])
        .build()
        .unwrap();

    let object = file.find_expr("o").unwrap().value().as_expr().unwrap().clone();
    let applied = foo
        .apply(
            &file.find_stmt("o.hashCode();").unwrap(),
            Coordinates::Replace,
            &[Substitution::Tree(object)],
        )
        .unwrap();
    let call = applied.find_expr("G.foo(o)").unwrap();
    let call = call.value().as_expr().unwrap().as_method_call().unwrap();
    assert!(call.method_type.is_none());

    let string = file.find_expr("s").unwrap().value().as_expr().unwrap().clone();
    let applied = foo
        .apply(
            &file.find_stmt("s.hashCode();").unwrap(),
            Coordinates::Replace,
            &[Substitution::Tree(string)],
        )
        .unwrap();
    let call = applied.find_expr("G.foo(s)").unwrap();
    let call = call.value().as_expr().unwrap().as_method_call().unwrap();
    assert!(call.method_type.is_some());
}

#[test]
fn test_replace_arguments() {
    let file = parse("class A {{ B.foo(0, 1); }}\nclass B { static void foo(int a, int b, int c) {} }\n");
    let cursor = file.find_expr("B.foo(0, 1)").unwrap();
    let call = cursor.value().as_expr().unwrap().as_method_call().unwrap();
    let args: Vec<Substitution> = call.args.iter().map(Substitution::from).collect();

    let applied = template("#{any(int)}, -1, #{any(int)}")
        .apply(&cursor, Coordinates::ReplaceArguments, &args)
        .unwrap();
    assert_eq!(
        applied.print(),
        "class A {{ B.foo(0, -1, 1); }}\nclass B { static void foo(int a, int b, int c) {} }\n"
    );
    let call = applied.find_expr("B.foo(0, -1, 1)").unwrap();
    let call = call.value().as_expr().unwrap().as_method_call().unwrap();
    assert!(call.method_type.is_some());
}

#[test]
fn test_first_and_last_statement() {
    let file = parse("class A {\n    void m() {\n        a();\n    }\n}\n");
    let file = template("start();")
        .apply(&file.find_method("m").unwrap(), Coordinates::FirstStatement, &[])
        .unwrap();
    let file = template("end();")
        .apply(&file.find_method("m").unwrap(), Coordinates::LastStatement, &[])
        .unwrap();
    assert_eq!(
        file.print(),
        "class A {\n    void m() {\n        start();\n        a();\n        end();\n    }\n}\n"
    );
}

#[test]
fn test_multi_line_templates_are_reindented() {
    let file = parse("class A {\n    void m() {\n        a();\n    }\n}\n");
    let applied = template("if (ready()) {\n    go();\n}")
        .apply(&file.find_method("m").unwrap(), Coordinates::FirstStatement, &[])
        .unwrap();
    assert_eq!(
        applied.print(),
        "class A {\n    void m() {\n        if (ready()) {\n            go();\n        }\n        a();\n    }\n}\n"
    );
}

#[test]
fn test_replace_body_of_an_empty_method() {
    let file = parse("class A {\n    void m() {}\n}\n");
    let applied = template("a();\nb();")
        .apply(&file.find_method("m").unwrap(), Coordinates::ReplaceBody, &[])
        .unwrap();
    assert_eq!(applied.print(), "class A {\n    void m() {\n        a();\n        b();\n    }\n}\n");
}

#[test]
fn test_before_and_after() {
    let file = parse("class A {\n    void m() {\n        a();\n        b();\n    }\n}\n");
    let file = template("x();")
        .apply(&file.find_stmt("b();").unwrap(), Coordinates::Before, &[])
        .unwrap();
    let file = template("y();")
        .apply(&file.find_stmt("a();").unwrap(), Coordinates::After, &[])
        .unwrap();
    assert_eq!(
        file.print(),
        "class A {\n    void m() {\n        a();\n        y();\n        x();\n        b();\n    }\n}\n"
    );
}

#[test]
fn test_add_annotation_in_order() {
    let file = parse("class A {\n    @Deprecated\n    public void run() {\n    }\n}\n");
    let applied = template("@Override")
        .apply(&file.find_method("run").unwrap(), Coordinates::add_annotation(), &[])
        .unwrap();
    assert_eq!(
        applied.print(),
        "class A {\n    @Deprecated\n    @Override\n    public void run() {\n    }\n}\n"
    );

    let applied = template("@Beta")
        .apply(&applied.find_method("run").unwrap(), Coordinates::add_annotation(), &[])
        .unwrap();
    assert!(applied.print().contains("    @Beta\n    @Deprecated\n    @Override\n    public void run()"));
}

#[test]
fn test_replace_annotations() {
    let file = parse(
        "class A {\n    @Deprecated\n    @SuppressWarnings(\"all\")\n    public void run() {\n    }\n}\n",
    );
    let method = file.find_method("run").unwrap();

    let applied = template("@Override @Beta")
        .apply(&method, Coordinates::ReplaceAnnotations, &[])
        .unwrap();
    assert_eq!(
        applied.print(),
        "class A {\n    @Override\n    @Beta\n    public void run() {\n    }\n}\n"
    );

    let applied = template("").apply(&method, Coordinates::ReplaceAnnotations, &[]).unwrap();
    assert_eq!(applied.print(), "class A {\n    public void run() {\n    }\n}\n");
}

#[test]
fn test_remove_annotations_without_keywords() {
    let file = parse("@Deprecated\nclass A {\n    @Deprecated\n    void run() {}\n}\n");
    let applied = template("")
        .apply(&file.find_method("run").unwrap(), Coordinates::ReplaceAnnotations, &[])
        .unwrap();
    assert_eq!(applied.print(), "@Deprecated\nclass A {\n    void run() {}\n}\n");

    let applied = template("")
        .apply(&applied.find_class("A").unwrap(), Coordinates::ReplaceAnnotations, &[])
        .unwrap();
    assert_eq!(applied.print(), "class A {\n    void run() {}\n}\n");
}

#[test]
fn test_replace_throws() {
    let file = parse("class A { void m() throws java.io.IOException {} }");
    let method = file.find_method("m").unwrap();

    let applied = template("Exception, RuntimeException")
        .apply(&method, Coordinates::ReplaceThrows, &[])
        .unwrap();
    assert_eq!(applied.print(), "class A { void m() throws Exception, RuntimeException {} }");

    let applied = template("").apply(&method, Coordinates::ReplaceThrows, &[]).unwrap();
    assert_eq!(applied.print(), "class A { void m() {} }");
}

#[test]
fn test_replace_parameters() {
    let file = parse("class A { void m(int x) {} }");
    let applied = template("String s, long n")
        .apply(&file.find_method("m").unwrap(), Coordinates::ReplaceParameters, &[])
        .unwrap();
    assert_eq!(applied.print(), "class A { void m(String s, long n) {} }");
}

#[test]
fn test_edited_signatures_are_used_by_later_edits() {
    let file = parse("class A {\n    void m(int x) {}\n    void n() {\n        m(1);\n    }\n}\n");
    let file = template("String s")
        .apply(&file.find_method("m").unwrap(), Coordinates::ReplaceParameters, &[])
        .unwrap();
    let applied = template("m(\"a\")")
        .apply(&file.find_expr("m(1)").unwrap(), Coordinates::Replace, &[])
        .unwrap();

    let call = applied.find_expr("m(\"a\")").unwrap();
    let call = call.value().as_expr().unwrap().as_method_call().unwrap();
    assert!(call.method_type.is_some());
}

#[test]
fn test_added_members_are_registered() {
    let file = parse("class A {\n    void n() {\n        run();\n    }\n}\n");
    let file = template("void helper(long v) {}")
        .apply(&file.find_class("A").unwrap(), Coordinates::LastStatement, &[])
        .unwrap();
    assert!(file.table().get("A").is_some_and(|a| a.methods.iter().any(|m| m.name == "helper")));

    let applied = template("helper(#{any(int)})")
        .apply(&file.find_expr("run()").unwrap(), Coordinates::Replace, &[Substitution::from(3)])
        .unwrap();
    let call = applied.find_expr("helper(3)").unwrap();
    let call = call.value().as_expr().unwrap().as_method_call().unwrap();
    assert!(call.method_type.is_some());
}

#[test]
fn test_expression_edits_keep_the_table() {
    let file = parse("class A { int f(int a) { return a; } }");
    let applied = template("a + 1")
        .apply(&file.find_expr("a").unwrap(), Coordinates::Replace, &[])
        .unwrap();
    assert!(std::sync::Arc::ptr_eq(file.table(), applied.table()));
}

#[test]
fn test_incompatible_coordinates() {
    let file = parse("class A { int f(int a) { return a; } }");
    let err = template("b")
        .apply(&file.find_expr("a").unwrap(), Coordinates::ReplaceBody, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateInstantiationError::IncompatibleCoordinates {
            coordinates: "replace body",
            ..
        }
    ));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = "java.util.Objects.requireNonNull(#{x:any(T)})";
    let build = || {
        JavaTemplate::builder(source)
            .generic_types(["T extends CharSequence"])
            .build()
            .unwrap()
    };
    let (first, second) = (build(), build());
    assert_eq!(first.stubbed_source(), second.stubbed_source());
    assert_eq!(first.segments(), second.segments());
    assert_eq!(first.parameter_count(), 1);

    let file = parse("import java.util.*;\nclass A { void m() { Objects.requireNonNull(\"s\"); } }");
    let cursor = file.find_expr("Objects.requireNonNull(\"s\")").unwrap();
    let a = first.matches(&cursor).expect("should match");
    let b = second.matches(&cursor).expect("should match");
    assert_eq!(a.type_var("T"), b.type_var("T"));
    assert!(a.type_var("T").is_some());
}

#[test]
fn test_original_file_is_unchanged_and_shared() {
    let file = parse("class A {\n    void m() {\n        a();\n    }\n}\nclass B {\n    void n() {}\n}\n");
    let applied = template("b();")
        .apply(&file.find_stmt("a();").unwrap(), Coordinates::Replace, &[])
        .unwrap();
    assert!(file.print().contains("a();"));
    assert!(applied.print().contains("b();"));

    let untouched = |f: &SourceFile| f.find_class("B").unwrap().value().as_stmt().unwrap().clone();
    assert!(std::sync::Arc::ptr_eq(&untouched(&file), &untouched(&applied)));
}

#[test]
fn test_cached_templates_are_shared() {
    let cache = TemplateCache::new();
    let a = cache.get_or_compile(JavaTemplate::builder("#{any(int)} * 2")).unwrap();
    let b = cache.get_or_compile(JavaTemplate::builder("#{any(int)} * 2")).unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));

    let file = parse("class A { int f(int x) { return x * 2; } }");
    assert!(b.matches(&file.find_expr("x * 2").unwrap()).is_some());
}
