use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use filter_compiler::alias::AliasRegistry;
use filter_compiler::lexer::tokenize;
use filter_compiler::parser::Parser;
use filter_compiler::shape::{FieldKind, Shape};
use filter_compiler::{compile_filter, FilterConfig, PredicateCompiler};
use std::hint::black_box;

const TEST_CASES: [(&str, &str); 4] = [
    ("simple", r#"Title == "Lamb Stew""#),
    ("medium", r#"Title @=* "stew" && Rating >= 4 || HaveMadeItMyself == true"#),
    (
        "complex",
        r#"(Title _= "Lamb" || Title =_ "Stew") && Rating > 3 && DateOfOrigin < 2022-01-01 && Visibility ^^* ["public", "friendsonly"]"#,
    ),
    (
        "collections",
        r#"Tags == "vegan" && Ingredients.Name @= "lamb" && Ingredients.Preparations.Text != "raw""#,
    ),
];

fn recipe_shape() -> Shape {
    let preparation = Shape::new().field("Text", FieldKind::String);
    let ingredient = Shape::new()
        .field("Name", FieldKind::String)
        .field("Quantity", FieldKind::Number)
        .field("Preparations", FieldKind::collection(FieldKind::object(preparation)));

    Shape::new()
        .field("Title", FieldKind::String)
        .field("Rating", FieldKind::Number)
        .field("DateOfOrigin", FieldKind::Date)
        .field("HaveMadeItMyself", FieldKind::Boolean)
        .field("Visibility", FieldKind::enumeration(["Public", "Private", "FriendsOnly"]))
        .field("Tags", FieldKind::collection(FieldKind::String))
        .field("Ingredients", FieldKind::collection(FieldKind::object(ingredient)))
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let registry = AliasRegistry::default();
    let mut group = c.benchmark_group("lexer_performance");

    for (name, filter) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &filter, |b, &filter| {
            b.iter(|| black_box(tokenize(black_box(filter), &registry).expect("分词应该成功")))
        });
    }

    group.finish();
}

// 基准测试：语法分析性能
fn benchmark_parser(c: &mut Criterion) {
    let registry = AliasRegistry::default();
    let mut group = c.benchmark_group("parser_performance");

    for (name, filter) in TEST_CASES {
        // 预先词法分析
        let tokens = tokenize(filter, &registry).expect("分词应该成功");

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| {
                let mut parser = Parser::new(black_box(tokens));
                match parser.parse() {
                    Ok(ast) => black_box(ast),
                    Err(_) => panic!("解析失败"),
                }
            })
        });
    }

    group.finish();
}

// 基准测试：谓词编译性能
fn benchmark_compiler(c: &mut Criterion) {
    let registry = AliasRegistry::default();
    let shape = recipe_shape();
    let compiler = PredicateCompiler::default();
    let mut group = c.benchmark_group("compiler_performance");

    for (name, filter) in TEST_CASES {
        let tokens = tokenize(filter, &registry).expect("分词应该成功");
        let ast = Parser::new(&tokens).parse().expect("解析应该成功");

        group.bench_with_input(BenchmarkId::new("compile", name), &ast, |b, ast| {
            b.iter(|| match compiler.compile(black_box(ast), &shape) {
                Ok(predicate) => black_box(predicate),
                Err(_) => panic!("编译失败"),
            })
        });
    }

    group.finish();
}

// 基准测试：完整的端到端处理, 包括自定义别名
fn benchmark_end_to_end(c: &mut Criterion) {
    let shape = recipe_shape();
    let configs = [
        ("default", FilterConfig::default()),
        (
            "word_aliases",
            FilterConfig::configure(|s| {
                s.comparison_aliases.equals_operator = "eq".to_string();
                s.logical_aliases.and_operator = "and".to_string();
            })
            .expect("配置应该有效"),
        ),
    ];
    let filters = [
        ("default", r#"Title == "Lamb Stew" && Rating > 3"#),
        ("word_aliases", r#"Title eq "Lamb Stew" and Rating > 3"#),
    ];

    let mut group = c.benchmark_group("end_to_end_performance");

    for ((name, config), (_, filter)) in configs.iter().zip(filters) {
        group.bench_with_input(BenchmarkId::new("full_pipeline", name), &filter, |b, &filter| {
            b.iter(|| black_box(compile_filter(black_box(filter), config, &shape).expect("编译应该成功")))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_compiler,
    benchmark_end_to_end
);
criterion_main!(benches);
