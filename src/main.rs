use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use filter_compiler::ast::{CompOp, LogicalOp};
use filter_compiler::lexer::tokenize;
use filter_compiler::shape::{FieldKind, Shape};
use filter_compiler::{parse_filter, FilterConfig, PredicateCompiler};

#[derive(Parser)]
#[command(name = "filter_compiler", version, about = "Filter 查询编译器交互终端")]
struct Cli {
    /// 运算符别名等设置 (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// 目标类型的字段描述 (JSON), 默认使用内置的 Recipe 示例
    #[arg(long)]
    shape: Option<PathBuf>,

    /// 额外输出谓词树的 JSON 形式
    #[arg(long)]
    json: bool,
}

/// 内置示例类型
fn recipe_shape() -> Shape {
    let preparation = Shape::new().field("Text", FieldKind::String);
    let ingredient = Shape::new()
        .field("Name", FieldKind::String)
        .field("Quantity", FieldKind::Number)
        .field(
            "Preparations",
            FieldKind::collection(FieldKind::object(preparation)),
        );

    Shape::new()
        .field("Title", FieldKind::String)
        .field("Rating", FieldKind::Number)
        .field("DateOfOrigin", FieldKind::Date)
        .field("HaveMadeItMyself", FieldKind::Boolean)
        .field(
            "Visibility",
            FieldKind::enumeration(["Public", "Private", "FriendsOnly"]),
        )
        .field("Tags", FieldKind::collection(FieldKind::String))
        .field(
            "Ingredients",
            FieldKind::collection(FieldKind::object(ingredient)),
        )
}

fn load_config(cli: &Cli) -> Result<FilterConfig> {
    match &cli.settings {
        Some(path) => FilterConfig::from_json_file(path)
            .with_context(|| format!("加载设置失败: {}", path.display())),
        None => Ok(FilterConfig::default()),
    }
}

fn load_shape(cli: &Cli) -> Result<Shape> {
    match &cli.shape {
        Some(path) => Shape::from_json_file(path)
            .with_context(|| format!("加载字段描述失败: {}", path.display())),
        None => Ok(recipe_shape()),
    }
}

/// 打印分词结果
fn print_tokens(input: &str, config: &FilterConfig) {
    match tokenize(input, config.registry()) {
        Ok(tokens) => {
            for token in tokens {
                println!("  {:>8}  {}", token.span.to_string(), token.kind);
            }
        }
        Err(e) => println!("✗ {}", filter_compiler::FilterError::from(e).render(input)),
    }
}

/// 打印当前配置的运算符符号
fn print_operators(config: &FilterConfig) {
    let registry = config.registry();
    for op in CompOp::ALL {
        println!("  {:<20} {}", op.name(), registry.comparison_token(op));
    }
    for op in [LogicalOp::And, LogicalOp::Or] {
        println!("  {:<20} {}", format!("{:?}", op), registry.logical_token(op));
    }
    println!("  {:<20} {}", "CaseInsensitive", registry.appendix());
}

/// 匹配 `:command` 形式的命令, 返回其后的参数
fn command_arg<'l>(line: &'l str, command: &str) -> Option<&'l str> {
    let rest = line.strip_prefix(command)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// 解析并编译一行输入
fn run_filter(input: &str, config: &FilterConfig, shape: &Shape, json: bool) {
    let ast = match parse_filter(input, config) {
        Ok(ast) => ast,
        Err(e) => {
            println!("✗ {}", e.render(input));
            return;
        }
    };
    println!("[AST]: {}", ast);

    let compiler = PredicateCompiler::new(config.settings());
    match compiler.compile(&ast, shape) {
        Ok(predicate) => {
            println!("[谓词]: {}", predicate);
            println!("{:#?}", predicate);
            if json {
                match serde_json::to_string_pretty(&predicate) {
                    Ok(text) => println!("{}", text),
                    Err(e) => warn!("序列化谓词失败: {}", e),
                }
            }
        }
        Err(e) => println!("✗ {}", filter_compiler::FilterError::from(e).render(input)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let shape = load_shape(&cli)?;
    info!(fields = shape.len(), "loaded shape");

    println!("--- Filter 查询编译器 ---");
    println!("输入过滤表达式, `:tokens <filter>` 查看分词, `:ops` 查看运算符, `:quit` 退出\n");

    let mut editor = DefaultEditor::new().context("无法初始化行编辑器")?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if line == ":quit" || line == ":q" {
                    break;
                }
                if line == ":ops" {
                    print_operators(&config);
                    continue;
                }
                if let Some(filter) = command_arg(line, ":tokens") {
                    print_tokens(filter, &config);
                    continue;
                }
                run_filter(line, &config, &shape, cli.json);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("读取输入失败"),
        }
    }

    Ok(())
}
